//! Exporters
//!
//! An [`Exporter`] renders an [`ExportPayload`] into one output format.
//! The manager keeps exporters as factories so every export starts from a
//! fresh instance configured through [`Exporter::set_config`].
//!
//! The [`CanonicalDocument`] is the JSON intermediate written by the
//! intelligent HTML path and read back by [`Exporter::render_from_file`].

pub mod html;
pub mod json;
pub mod markdown;

pub use html::HtmlExporter;
pub use json::JsonExporter;
pub use markdown::MarkdownExporter;

use crate::analysis::AnalysisReport;
use crate::error::Result;
use crate::mapper::{ComponentDetails, ComponentRecord, ScanResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Builds a fresh exporter instance
pub type ExporterFactory = Arc<dyn Fn() -> Box<dyn Exporter> + Send + Sync>;

/// What gets rendered
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "scope", content = "result", rename_all = "snake_case")]
pub enum ExportPayload {
    Single(ScanResult),
    Multi(BTreeMap<String, ScanResult>),
    Analysis(Box<AnalysisReport>),
}

impl ExportPayload {
    /// Scan results in kind order; empty for analysis payloads
    pub fn results(&self) -> Vec<&ScanResult> {
        match self {
            Self::Single(result) => vec![result],
            Self::Multi(results) => results.values().collect(),
            Self::Analysis(_) => Vec::new(),
        }
    }

    pub fn component_count(&self) -> usize {
        match self {
            Self::Analysis(report) => report.complexity_metrics.total_components,
            _ => self.results().iter().map(|r| r.count()).sum(),
        }
    }

    pub fn has_flow_data(&self) -> bool {
        self.results().iter().any(|r| r.has_flow_data())
    }
}

/// Options passed to an exporter before rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// The payload aggregates several kinds
    pub multi_type: bool,
    pub pretty: bool,
    pub title: Option<String>,
    /// Exporter-specific options
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            multi_type: false,
            pretty: true,
            title: None,
            extra: BTreeMap::new(),
        }
    }
}

impl ExportConfig {
    pub fn title_or(&self, fallback: &str) -> String {
        self.title.clone().unwrap_or_else(|| fallback.to_string())
    }
}

/// JSON intermediate shared by the manager and the presentation exporters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalDocument {
    pub generator: String,
    pub generated_at: DateTime<Utc>,
    pub multi_type: bool,
    pub payload: ExportPayload,
}

impl CanonicalDocument {
    pub fn new(payload: ExportPayload, multi_type: bool) -> Self {
        Self {
            generator: format!("code-atlas {}", env!("CARGO_PKG_VERSION")),
            generated_at: Utc::now(),
            multi_type,
            payload,
        }
    }

    pub fn read(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        std::fs::write(path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }
}

/// Renders payloads into one format
pub trait Exporter: Send {
    fn format(&self) -> &str;

    fn set_config(&mut self, config: ExportConfig);

    fn export(&self, payload: &ExportPayload) -> Result<String>;

    /// Render a canonical document previously written to disk
    fn render_from_file(&self, path: &Path) -> Result<String> {
        let document = CanonicalDocument::read(path)?;
        self.export(&document.payload)
    }
}

/// One-line digest of a record's kind-specific details
pub(crate) fn record_summary(record: &ComponentRecord) -> String {
    let mut parts = Vec::new();
    match &record.details {
        ComponentDetails::Model(m) => {
            if let Some(table) = &m.table {
                parts.push(format!("table {}", table));
            }
            if !m.relationships.is_empty() {
                let relations: Vec<String> = m
                    .relationships
                    .iter()
                    .map(|r| format!("{} {}", r.relation_type, r.related))
                    .collect();
                parts.push(relations.join(", "));
            }
        }
        ComponentDetails::Route(r) => {
            parts.push(format!("{} {}", r.methods.join("|"), r.uri));
            if let Some(action) = r.action.as_ref().or(r.view.as_ref()).or(r.redirect.as_ref()) {
                parts.push(format!("→ {}", action));
            }
        }
        ComponentDetails::Controller(c) => parts.push(format!("{} actions", c.actions.len())),
        ComponentDetails::Job(j) => {
            if let Some(queue) = &j.queue {
                parts.push(format!("queue {}", queue));
            }
            if j.should_queue {
                parts.push("queued".to_string());
            }
        }
        ComponentDetails::Event(e) if e.broadcasts => parts.push("broadcasts".to_string()),
        ComponentDetails::Command(c) => {
            if let Some(signature) = &c.signature {
                parts.push(signature.clone());
            }
        }
        ComponentDetails::Policy(p) => parts.push(p.abilities.join(", ")),
        ComponentDetails::Resource(r) => parts.push(r.fields.join(", ")),
        ComponentDetails::Notification(n) => parts.push(n.channels.join(", ")),
        ComponentDetails::Request(r) => parts.push(format!("{} rules", r.rules.len())),
        _ => {}
    }
    if !record.dependencies.is_empty() {
        parts.push(format!("uses {}", record.dependencies.join(", ")));
    }
    parts.retain(|p| !p.is_empty());
    parts.join("; ")
}

/// The built-in exporters keyed by format
pub fn default_exporters() -> BTreeMap<String, ExporterFactory> {
    let mut exporters: BTreeMap<String, ExporterFactory> = BTreeMap::new();
    exporters.insert(
        "json".to_string(),
        Arc::new(|| Box::new(JsonExporter::default()) as Box<dyn Exporter>),
    );
    exporters.insert(
        "markdown".to_string(),
        Arc::new(|| Box::new(MarkdownExporter::default()) as Box<dyn Exporter>),
    );
    exporters.insert(
        "html".to_string(),
        Arc::new(|| Box::new(HtmlExporter::default()) as Box<dyn Exporter>),
    );
    exporters
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{records, service_record};

    #[test]
    fn test_canonical_document_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        let payload = ExportPayload::Single(ScanResult::new(
            "services",
            records(vec![service_record("BillingService", &["ChargeCustomer"])]),
        ));
        let document = CanonicalDocument::new(payload, false);
        document.write(&path).unwrap();

        let back = CanonicalDocument::read(&path).unwrap();
        assert_eq!(back, document);
        assert!(back.payload.has_flow_data());
        assert_eq!(back.payload.component_count(), 1);
    }

    #[test]
    fn test_default_exporters() {
        let exporters = default_exporters();
        let keys: Vec<&str> = exporters.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["html", "json", "markdown"]);
        for (format, factory) in &exporters {
            assert_eq!(factory().format(), format);
        }
    }
}
