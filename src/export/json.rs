use super::{CanonicalDocument, ExportConfig, ExportPayload, Exporter};
use crate::error::{AtlasError, Result};

/// Renders the canonical document as JSON
#[derive(Debug, Default)]
pub struct JsonExporter {
    config: ExportConfig,
}

impl Exporter for JsonExporter {
    fn format(&self) -> &str {
        "json"
    }

    fn set_config(&mut self, config: ExportConfig) {
        self.config = config;
    }

    fn export(&self, payload: &ExportPayload) -> Result<String> {
        let document = CanonicalDocument::new(payload.clone(), self.config.multi_type);
        let rendered = if self.config.pretty {
            serde_json::to_string_pretty(&document)
        } else {
            serde_json::to_string(&document)
        };
        rendered.map_err(|e| AtlasError::render("json", e))
    }
}
