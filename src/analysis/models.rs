//! Analysis report structures

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-kind digest in the component summary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindSummary {
    pub count: usize,
    /// Models only: entries with at least one relation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub with_relationships: Option<usize>,
    /// Controllers only: sum of action counts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_actions: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl KindSummary {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            count: 0,
            error: Some(error.into()),
            ..Default::default()
        }
    }
}

/// One target of a relationship entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedComponent {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Relation method for model relations (`hasMany`, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<String>,
}

impl RelatedComponent {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            relation: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipEntry {
    #[serde(rename = "type")]
    pub kind: String,
    pub relates_to: Vec<RelatedComponent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyGraphNode {
    pub component: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub dependencies: Vec<String>,
    pub dependency_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchitecturePatterns {
    pub detected: Vec<String>,
    pub confidence: String,
    pub status: String,
}

impl Default for ArchitecturePatterns {
    fn default() -> Self {
        Self {
            detected: Vec::new(),
            confidence: "low".to_string(),
            status: "not_detected".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexityMetrics {
    pub total_components: usize,
    pub coupling_score: String,
}

/// Snapshot produced by one relationship analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub component_summary: BTreeMap<String, KindSummary>,
    pub relationships: BTreeMap<String, RelationshipEntry>,
    pub dependency_graph: BTreeMap<String, DependencyGraphNode>,
    pub architecture_patterns: ArchitecturePatterns,
    pub complexity_metrics: ComplexityMetrics,
    pub recommendations: Vec<String>,
}
