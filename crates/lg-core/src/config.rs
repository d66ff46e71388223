//! Configuration types and parsing for lineage.yml

use crate::error::{CoreError, CoreResult};
use crate::model::NodeType;
use lg_sql::SqlDialect;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File names probed by [`Config::load_from_dir`], in order
pub const CONFIG_FILE_NAMES: [&str; 2] = ["lineage.yml", "lineage.yaml"];

/// Upper bound for every traversal depth
pub const MAX_DEPTH: usize = 20;

/// Workspace configuration from lineage.yml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Optional workspace name (shown in CLI output)
    #[serde(default)]
    pub name: Option<String>,

    /// SQL dialect for parsing
    #[serde(default)]
    pub dialect: SqlDialect,

    /// Directories (relative to the workspace root) scanned for `.sql` files
    #[serde(default = "default_sql_paths")]
    pub sql_paths: Vec<String>,

    /// Directories or files skipped during discovery
    #[serde(default = "default_exclude_paths")]
    pub exclude_paths: Vec<String>,

    /// Relations defined outside the indexed SQL (always `external` nodes)
    #[serde(default)]
    pub external_tables: Vec<String>,

    /// Traversal bounds
    #[serde(default)]
    pub traversal: TraversalConfig,

    /// Rebuild scheduling
    #[serde(default)]
    pub rebuild: RebuildConfig,

    /// Impact scoring policy
    #[serde(default)]
    pub impact: ImpactConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: None,
            dialect: SqlDialect::default(),
            sql_paths: default_sql_paths(),
            exclude_paths: default_exclude_paths(),
            external_tables: Vec::new(),
            traversal: TraversalConfig::default(),
            rebuild: RebuildConfig::default(),
            impact: ImpactConfig::default(),
        }
    }
}

fn default_sql_paths() -> Vec<String> {
    vec![".".to_string()]
}

fn default_exclude_paths() -> Vec<String> {
    vec!["target".to_string(), ".git".to_string()]
}

/// Traversal bounds shared by flow, column and impact queries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TraversalConfig {
    /// Depth used when a request omits one or sends an invalid value
    #[serde(default = "default_depth")]
    pub default_depth: usize,

    /// Maximum number of column paths returned per direction
    #[serde(default = "default_max_paths")]
    pub max_paths: usize,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            default_depth: default_depth(),
            max_paths: default_max_paths(),
        }
    }
}

fn default_depth() -> usize {
    5
}

fn default_max_paths() -> usize {
    256
}

/// Rebuild scheduling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RebuildConfig {
    /// Quiet window that must elapse after the last file event
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for RebuildConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

fn default_debounce_ms() -> u64 {
    300
}

/// Impact scoring policy
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImpactConfig {
    #[serde(default)]
    pub weights: ImpactWeights,

    #[serde(default)]
    pub thresholds: SeverityThresholds,

    #[serde(default)]
    pub change_factors: ChangeFactors,
}

/// Score contributed by each affected entity of a kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImpactWeights {
    #[serde(default = "weight_table")]
    pub table: u32,
    #[serde(default = "weight_view")]
    pub view: u32,
    #[serde(default = "weight_one")]
    pub cte: u32,
    #[serde(default = "weight_one")]
    pub external: u32,
    #[serde(default = "weight_one")]
    pub query: u32,
    #[serde(default = "weight_one")]
    pub file: u32,
}

impl Default for ImpactWeights {
    fn default() -> Self {
        Self {
            table: weight_table(),
            view: weight_view(),
            cte: weight_one(),
            external: weight_one(),
            query: weight_one(),
            file: weight_one(),
        }
    }
}

impl ImpactWeights {
    /// Weight of one affected node of the given type
    pub fn for_node_type(&self, node_type: NodeType) -> u32 {
        match node_type {
            NodeType::Table => self.table,
            NodeType::View => self.view,
            NodeType::Cte => self.cte,
            NodeType::External => self.external,
            NodeType::Column => 0,
        }
    }
}

fn weight_table() -> u32 {
    3
}

fn weight_view() -> u32 {
    2
}

fn weight_one() -> u32 {
    1
}

/// Minimum score for each severity band above `low`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeverityThresholds {
    #[serde(default = "threshold_medium")]
    pub medium: u32,
    #[serde(default = "threshold_high")]
    pub high: u32,
    #[serde(default = "threshold_critical")]
    pub critical: u32,
}

impl Default for SeverityThresholds {
    fn default() -> Self {
        Self {
            medium: threshold_medium(),
            high: threshold_high(),
            critical: threshold_critical(),
        }
    }
}

fn threshold_medium() -> u32 {
    4
}

fn threshold_high() -> u32 {
    12
}

fn threshold_critical() -> u32 {
    30
}

/// Score multiplier per change type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChangeFactors {
    #[serde(default = "factor_modify")]
    pub modify: u32,
    #[serde(default = "factor_breaking")]
    pub rename: u32,
    #[serde(default = "factor_breaking")]
    pub drop: u32,
}

impl Default for ChangeFactors {
    fn default() -> Self {
        Self {
            modify: factor_modify(),
            rename: factor_breaking(),
            drop: factor_breaking(),
        }
    }
}

fn factor_modify() -> u32 {
    1
}

fn factor_breaking() -> u32 {
    2
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::parse(&content).map_err(|e| match e {
            CoreError::YamlParse(err) => CoreError::ConfigParseError {
                message: format!("{}: {}", path.display(), err),
            },
            other => other,
        })
    }

    /// Parse and validate configuration from YAML text
    pub fn parse(content: &str) -> CoreResult<Self> {
        // An empty file means "all defaults"
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a workspace directory.
    ///
    /// Looks for lineage.yml or lineage.yaml; when neither exists the
    /// defaults are used.
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        if !dir.is_dir() {
            return Err(CoreError::WorkspaceNotFound {
                path: dir.display().to_string(),
            });
        }
        match Self::find_in_dir(dir) {
            Some(path) => Self::load(&path),
            None => {
                log::debug!(
                    "No {} in {}, using defaults",
                    CONFIG_FILE_NAMES[0],
                    dir.display()
                );
                Ok(Self::default())
            }
        }
    }

    /// Path of the configuration file in `dir`, if one exists
    pub fn find_in_dir(dir: &Path) -> Option<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|p| p.exists())
    }

    /// Validate the configuration
    fn validate(&self) -> CoreResult<()> {
        if self.sql_paths.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "At least one sql_paths entry must be specified".to_string(),
            });
        }

        let depth = self.traversal.default_depth;
        if depth == 0 || depth > MAX_DEPTH {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "traversal.default_depth must be between 1 and {}, got {}",
                    MAX_DEPTH, depth
                ),
            });
        }

        if self.traversal.max_paths == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "traversal.max_paths must be at least 1".to_string(),
            });
        }

        let t = &self.impact.thresholds;
        if !(t.medium < t.high && t.high < t.critical) {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "impact.thresholds must be strictly increasing (medium {} < high {} < critical {})",
                    t.medium, t.high, t.critical
                ),
            });
        }

        Ok(())
    }

    /// Get absolute SQL paths relative to a workspace root
    pub fn sql_paths_absolute(&self, root: &Path) -> Vec<PathBuf> {
        self.sql_paths.iter().map(|p| root.join(p)).collect()
    }

    /// Get absolute exclude paths relative to a workspace root
    pub fn exclude_paths_absolute(&self, root: &Path) -> Vec<PathBuf> {
        self.exclude_paths.iter().map(|p| root.join(p)).collect()
    }

    /// Check if a relation name is declared external (case-insensitive)
    pub fn is_external_table(&self, name: &str) -> bool {
        self.external_tables
            .iter()
            .any(|t| t.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
