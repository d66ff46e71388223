//! Relation dependency extraction from SQL AST

use crate::expr::object_name_to_string;
use sqlparser::ast::{visit_relations, Statement};
use std::collections::BTreeSet;
use std::ops::ControlFlow;

/// Extract every relation name referenced by the statements
///
/// Uses `visit_relations` to walk the AST and collect all `ObjectName`
/// references from FROM clauses, JOINs, subqueries and DML targets. CTE
/// names are included; callers that know the CTE scope filter them.
pub fn extract_dependencies(statements: &[Statement]) -> BTreeSet<String> {
    let mut deps = BTreeSet::new();

    for stmt in statements {
        let _ = visit_relations(stmt, |relation| {
            deps.insert(object_name_to_string(relation));
            ControlFlow::<()>::Continue(())
        });
    }

    deps
}

/// Last dotted segment of a relation name (`db.schema.t` -> `t`)
pub fn last_segment(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}
