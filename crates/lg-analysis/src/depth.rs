//! Traversal depth normalization

use lg_core::MAX_DEPTH;

/// Normalize a requested traversal depth.
///
/// Non-finite values and values below 1 fall back to `default`; everything
/// else is floored and capped at [`MAX_DEPTH`].
pub fn normalize_depth(value: f64, default: usize) -> usize {
    if !value.is_finite() || value < 1.0 {
        return default.clamp(1, MAX_DEPTH);
    }
    let floored = value.floor();
    if floored >= MAX_DEPTH as f64 {
        MAX_DEPTH
    } else {
        floored as usize
    }
}

/// Normalize an optional depth (absent means `default`)
pub fn resolve_depth(value: Option<f64>, default: usize) -> usize {
    match value {
        Some(v) => normalize_depth(v, default),
        None => default.clamp(1, MAX_DEPTH),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_and_negative_use_default() {
        assert_eq!(normalize_depth(0.0, 5), 5);
        assert_eq!(normalize_depth(-3.0, 7), 7);
        assert_eq!(normalize_depth(0.99, 4), 4);
    }

    #[test]
    fn test_non_finite_uses_default() {
        assert_eq!(normalize_depth(f64::NAN, 5), 5);
        assert_eq!(normalize_depth(f64::INFINITY, 5), 5);
        assert_eq!(normalize_depth(f64::NEG_INFINITY, 5), 5);
    }

    #[test]
    fn test_floor_and_cap() {
        assert_eq!(normalize_depth(3.7, 5), 3);
        assert_eq!(normalize_depth(1.0, 5), 1);
        assert_eq!(normalize_depth(20.0, 5), 20);
        assert_eq!(normalize_depth(999.0, 5), 20);
    }

    #[test]
    fn test_resolve_depth() {
        assert_eq!(resolve_depth(None, 5), 5);
        assert_eq!(resolve_depth(Some(2.0), 5), 2);
        assert_eq!(resolve_depth(None, 0), 1);
    }
}
