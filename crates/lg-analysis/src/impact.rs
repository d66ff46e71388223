//! Change-impact analysis
//!
//! Direct impacts are the one-hop downstream consumers of the target;
//! transitive impacts are everything further out, grouped by hop distance.
//! The score is a weighted count of what is affected, multiplied by a
//! change-type factor, and banded into a [`Severity`].

use crate::error::{AnalysisError, AnalysisResult};
use crate::flow::{FlowAnalyzer, FlowTarget};
use lg_core::{ImpactConfig, LineageGraph, LineageNode, NodeType, SeverityThresholds};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Proposed change to an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Modify,
    Drop,
    Rename,
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeType::Modify => write!(f, "modify"),
            ChangeType::Drop => write!(f, "drop"),
            ChangeType::Rename => write!(f, "rename"),
        }
    }
}

impl std::str::FromStr for ChangeType {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "modify" => Ok(ChangeType::Modify),
            "drop" => Ok(ChangeType::Drop),
            "rename" => Ok(ChangeType::Rename),
            other => Err(AnalysisError::InvalidRequest {
                message: format!("unknown change type '{other}' (expected modify, drop or rename)"),
            }),
        }
    }
}

/// Impact severity, ordered
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Band a score against the configured cutoffs
    pub fn from_score(score: u64, thresholds: &SeverityThresholds) -> Self {
        if score >= u64::from(thresholds.critical) {
            Severity::Critical
        } else if score >= u64::from(thresholds.high) {
            Severity::High
        } else if score >= u64::from(thresholds.medium) {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// An affected node
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactedEntity {
    pub node_id: String,
    pub name: String,
    pub node_type: NodeType,
    pub depth: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
}

impl ImpactedEntity {
    fn new(node: &LineageNode, depth: usize) -> Self {
        Self {
            node_id: node.id.clone(),
            name: node.name.clone(),
            node_type: node.node_type,
            depth,
            file_path: node.metadata.file_path.clone(),
        }
    }
}

/// Transitive impacts at one hop distance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImpactLevel {
    pub depth: usize,
    pub entities: Vec<ImpactedEntity>,
}

/// Counts over everything affected
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactSummary {
    pub total_affected: usize,
    pub tables_affected: usize,
    pub views_affected: usize,
    pub ctes_affected: usize,
    pub externals_affected: usize,
    pub queries_affected: usize,
    pub files_affected: usize,
}

/// Result of an impact analysis
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactReport {
    pub target: ImpactedEntity,
    pub change_type: ChangeType,
    pub direct_impacts: Vec<ImpactedEntity>,
    pub transitive_impacts: Vec<ImpactLevel>,
    pub summary: ImpactSummary,
    pub score: u64,
    pub severity: Severity,
    pub suggestions: Vec<String>,
}

/// Impact analysis over one snapshot
#[derive(Debug, Clone, Copy)]
pub struct ImpactAnalyzer<'g> {
    graph: &'g LineageGraph,
    config: &'g ImpactConfig,
    max_depth: usize,
}

impl<'g> ImpactAnalyzer<'g> {
    pub fn new(graph: &'g LineageGraph, config: &'g ImpactConfig, max_depth: usize) -> Self {
        Self {
            graph,
            config,
            max_depth: max_depth.max(1),
        }
    }

    /// Analyze a change to the entity `name` of type `entity_type`
    pub fn analyze(
        &self,
        entity_type: NodeType,
        name: &str,
        change_type: ChangeType,
    ) -> AnalysisResult<ImpactReport> {
        let target = self
            .graph
            .find_node(entity_type, name)
            .ok_or_else(|| AnalysisError::EntityNotFound {
                entity_type: entity_type.to_string(),
                name: name.to_string(),
            })?;
        Ok(self.analyze_node(target, change_type))
    }

    /// Analyze a change to a node already looked up
    pub fn analyze_node(&self, target: &LineageNode, change_type: ChangeType) -> ImpactReport {
        let flow = FlowAnalyzer::new(self.graph)
            .downstream(&FlowTarget::Node(target.id.clone()), self.max_depth);

        let mut direct = Vec::new();
        let mut levels: BTreeMap<usize, Vec<ImpactedEntity>> = BTreeMap::new();
        for (node, path) in flow.nodes.iter().zip(&flow.paths) {
            if node.id == target.id {
                continue;
            }
            let entity = ImpactedEntity::new(node, path.hops());
            if entity.depth == 1 {
                direct.push(entity);
            } else {
                levels.entry(entity.depth).or_default().push(entity);
            }
        }
        let transitive: Vec<ImpactLevel> = levels
            .into_iter()
            .map(|(depth, entities)| ImpactLevel { depth, entities })
            .collect();

        let summary = self.summarize(target, &direct, &transitive);
        let score = self.score(&summary, change_type);
        let severity = Severity::from_score(score, &self.config.thresholds);
        let target_entity = ImpactedEntity::new(target, 0);
        let suggestions = suggestions(&target_entity, change_type, severity, &summary, transitive.len());

        log::debug!(
            "Impact of {} on {}: {} affected, score {}, {}",
            change_type,
            target.id,
            summary.total_affected,
            score,
            severity
        );

        ImpactReport {
            target: target_entity,
            change_type,
            direct_impacts: direct,
            transitive_impacts: transitive,
            summary,
            score,
            severity,
            suggestions,
        }
    }

    fn summarize(
        &self,
        target: &LineageNode,
        direct: &[ImpactedEntity],
        transitive: &[ImpactLevel],
    ) -> ImpactSummary {
        let affected: Vec<&ImpactedEntity> = direct
            .iter()
            .chain(transitive.iter().flat_map(|l| l.entities.iter()))
            .collect();

        let mut summary = ImpactSummary {
            total_affected: affected.len(),
            ..ImpactSummary::default()
        };
        for entity in &affected {
            match entity.node_type {
                NodeType::Table => summary.tables_affected += 1,
                NodeType::View => summary.views_affected += 1,
                NodeType::Cte => summary.ctes_affected += 1,
                NodeType::External => summary.externals_affected += 1,
                NodeType::Column => {}
            }
        }

        let mut ids: BTreeSet<String> = affected.iter().map(|e| e.node_id.clone()).collect();
        ids.insert(target.id.clone());

        let mut files: BTreeSet<&str> = BTreeSet::new();
        for entity in &affected {
            if let Some(node) = self.graph.node(&entity.node_id) {
                files.extend(node.metadata.defined_in.iter().map(String::as_str));
            }
        }
        let mut queries = 0;
        for statement in self.graph.statements_reading(&ids) {
            queries += 1;
            files.insert(statement.file_path.as_str());
        }
        summary.queries_affected = queries;
        summary.files_affected = files.len();
        summary
    }

    fn score(&self, summary: &ImpactSummary, change_type: ChangeType) -> u64 {
        let weights = &self.config.weights;
        let weighted = [
            (summary.tables_affected, weights.table),
            (summary.views_affected, weights.view),
            (summary.ctes_affected, weights.cte),
            (summary.externals_affected, weights.external),
            (summary.queries_affected, weights.query),
            (summary.files_affected, weights.file),
        ]
        .iter()
        .map(|&(count, weight)| count as u64 * u64::from(weight))
        .sum::<u64>();

        let factors = &self.config.change_factors;
        let factor = match change_type {
            ChangeType::Modify => factors.modify,
            ChangeType::Drop => factors.drop,
            ChangeType::Rename => factors.rename,
        };
        weighted.saturating_mul(u64::from(factor))
    }
}

fn suggestions(
    target: &ImpactedEntity,
    change_type: ChangeType,
    severity: Severity,
    summary: &ImpactSummary,
    transitive_levels: usize,
) -> Vec<String> {
    let name = &target.name;
    let mut out = Vec::new();

    if summary.total_affected == 0 {
        out.push(format!(
            "No downstream dependencies found; {} can be changed in isolation.",
            name
        ));
        if summary.queries_affected > 0 {
            out.push(format!(
                "{} statement(s) still read {}; re-run them after the change.",
                summary.queries_affected, name
            ));
        }
        return out;
    }

    match change_type {
        ChangeType::Drop => {
            if summary.views_affected > 0 {
                out.push(format!(
                    "Update or recreate the {} dependent view(s) before dropping {}.",
                    summary.views_affected, name
                ));
            }
            if summary.tables_affected > 0 {
                out.push(format!(
                    "Rewrite the statements that populate the {} dependent table(s) from another source.",
                    summary.tables_affected
                ));
            }
            out.push(format!(
                "Consider deprecating {} for a release before dropping it.",
                name
            ));
        }
        ChangeType::Rename => {
            out.push(format!(
                "Update references to {} in {} file(s).",
                name, summary.files_affected
            ));
            out.push(format!(
                "Keep a compatibility view named {} while consumers migrate.",
                name
            ));
        }
        ChangeType::Modify => {
            out.push(format!(
                "Check that column changes in {} stay compatible with its consumers.",
                name
            ));
            if summary.views_affected > 0 {
                out.push(format!(
                    "Re-validate the {} dependent view(s) after the change.",
                    summary.views_affected
                ));
            }
        }
    }

    if severity >= Severity::High {
        out.push(format!(
            "Review the transitive impact ({} entities over {} level(s)) and roll the change out in stages.",
            summary.total_affected,
            transitive_levels + 1
        ));
    }
    if severity == Severity::Critical {
        out.push("Coordinate with the owners of the affected files before applying this change.".to_string());
    }
    out
}

#[cfg(test)]
#[path = "impact_test.rs"]
mod tests;
