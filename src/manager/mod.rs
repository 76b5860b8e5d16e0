//! Atlas manager
//!
//! Resolves mappers and exporters by name and drives the three entry
//! points: `scan` (one kind), `export` (one kind or `"all"`, one format)
//! and `generate` (several kinds aggregated into one document).
//!
//! HTML output with flow data, or covering several kinds, goes through the
//! intelligent path: the canonical JSON document is written to a uniquely
//! named temporary file and the HTML exporter renders from that file. The
//! file is removed on every exit path by [`TempArtifact`].

mod temp;

pub use temp::TempArtifact;

use crate::analysis::AnalysisReport;
use crate::error::{AtlasError, Result};
use crate::export::{
    default_exporters, CanonicalDocument, ExportConfig, ExportPayload, Exporter, ExporterFactory,
};
use crate::mapper::{Mapper, MapperRegistry, ScanOptions, ScanResult};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Kind name that selects every registered kind
pub const ALL_KINDS: &str = "all";

const INTELLIGENT_FORMAT: &str = "html";

/// Scan and render options for `export` / `generate`
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    pub scan: ScanOptions,
    pub config: ExportConfig,
}

impl ExportOptions {
    pub fn with_scan(scan: ScanOptions) -> Self {
        Self {
            scan,
            ..Default::default()
        }
    }
}

/// Façade over the mapper registry and the exporter table
pub struct AtlasManager {
    registry: MapperRegistry,
    exporters: BTreeMap<String, ExporterFactory>,
    base_path: PathBuf,
    temp_dir: PathBuf,
}

impl AtlasManager {
    /// Manager with every built-in mapper and exporter, rooted at `base_path`
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self::with_registry(MapperRegistry::with_defaults(), base_path)
    }

    pub fn with_registry(registry: MapperRegistry, base_path: impl Into<PathBuf>) -> Self {
        Self {
            registry,
            exporters: default_exporters(),
            base_path: base_path.into(),
            temp_dir: std::env::temp_dir(),
        }
    }

    /// Directory for intelligent-path intermediates
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = dir.into();
        self
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    pub fn registry(&self) -> &MapperRegistry {
        &self.registry
    }

    /// Registered kinds in sorted order
    pub fn kinds(&self) -> Vec<String> {
        self.registry.kinds()
    }

    pub fn formats(&self) -> Vec<String> {
        self.exporters.keys().cloned().collect()
    }

    // ========================================================================
    // Resolution and registration
    // ========================================================================

    pub fn mapper(&self, kind: &str) -> Result<Arc<dyn Mapper>> {
        self.registry
            .get(kind)
            .ok_or_else(|| AtlasError::UnknownComponentKind(kind.to_string()))
    }

    /// A fresh exporter instance for `format`
    pub fn exporter(&self, format: &str) -> Result<Box<dyn Exporter>> {
        self.exporters
            .get(format)
            .map(|factory| factory())
            .ok_or_else(|| AtlasError::UnknownExportFormat(format.to_string()))
    }

    pub fn register_mapper(&mut self, kind: impl Into<String>, mapper: Arc<dyn Mapper>) {
        self.registry.insert(kind, mapper);
    }

    pub fn register_exporter<F>(&mut self, format: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn Exporter> + Send + Sync + 'static,
    {
        self.exporters.insert(format.into(), Arc::new(factory));
    }

    // ========================================================================
    // Scanning
    // ========================================================================

    /// Scan one kind. A missing or relative `root` is resolved against the
    /// manager's base path.
    pub fn scan(&self, kind: &str, options: &ScanOptions) -> Result<ScanResult> {
        let mapper = self.mapper(kind)?;
        let mut options = options.clone();
        options.root = Some(match options.root.take() {
            Some(root) if root.is_absolute() => root,
            Some(root) => self.base_path.join(root),
            None => self.base_path.clone(),
        });

        tracing::debug!("Scanning {} under {:?}", kind, options.root);
        mapper.scan(&options)
    }

    /// Scan several kinds; a failing kind is kept as an error record
    pub fn scan_many(
        &self,
        kinds: &[String],
        options: &ScanOptions,
    ) -> Result<BTreeMap<String, ScanResult>> {
        let mut results = BTreeMap::new();
        for kind in kinds {
            let result = match self.scan(kind, options) {
                Ok(result) => result,
                Err(e @ AtlasError::UnknownComponentKind(_)) => return Err(e),
                Err(e) => {
                    tracing::warn!("Scan of {} failed: {}", kind, e);
                    ScanResult::failed(kind.clone(), e.to_string())
                }
            };
            results.insert(kind.clone(), result);
        }
        Ok(results)
    }

    // ========================================================================
    // Export
    // ========================================================================

    /// Scan `kind` (or every kind for `"all"`) and render it as `format`
    pub fn export(&self, kind: &str, format: &str, options: &ExportOptions) -> Result<String> {
        if kind == ALL_KINDS {
            let results = self.scan_many(&self.kinds(), &options.scan)?;
            let mut config = options.config.clone();
            config.multi_type = true;
            return self.render(ExportPayload::Multi(results), format, config, true);
        }

        let result = self.scan(kind, &options.scan)?;
        let intelligent = result.has_flow_data();
        self.render(
            ExportPayload::Single(result),
            format,
            options.config.clone(),
            intelligent,
        )
    }

    /// Aggregate several kinds into one document
    pub fn generate(&self, kinds: &[String], format: &str, options: &ExportOptions) -> Result<String> {
        match kinds {
            [] => Err(AtlasError::UnknownComponentKind(String::new())),
            [kind] => self.export(kind, format, options),
            _ => {
                let results = self.scan_many(kinds, &options.scan)?;
                let mut config = options.config.clone();
                config.multi_type = true;
                tracing::info!("Generating {} for {} kinds", format, results.len());
                self.render(ExportPayload::Multi(results), format, config, true)
            }
        }
    }

    /// Render an analysis report
    pub fn export_analysis(
        &self,
        report: AnalysisReport,
        format: &str,
        config: ExportConfig,
    ) -> Result<String> {
        self.render(ExportPayload::Analysis(Box::new(report)), format, config, false)
    }

    fn render(
        &self,
        payload: ExportPayload,
        format: &str,
        config: ExportConfig,
        intelligent: bool,
    ) -> Result<String> {
        if intelligent && format == INTELLIGENT_FORMAT {
            return self.export_intelligent_html(payload, config);
        }

        let mut exporter = self.exporter(format)?;
        exporter.set_config(config);
        let output = exporter.export(&payload)?;
        tracing::info!(
            "Exported {} components as {}",
            payload.component_count(),
            format
        );
        Ok(output)
    }

    /// Canonical JSON → temporary file → HTML; the file never outlives the call
    fn export_intelligent_html(&self, payload: ExportPayload, config: ExportConfig) -> Result<String> {
        let mut exporter = self.exporter(INTELLIGENT_FORMAT)?;
        let artifact = TempArtifact::new(&self.temp_dir)?;

        let count = payload.component_count();
        CanonicalDocument::new(payload, config.multi_type).write(artifact.path())?;
        tracing::debug!("Wrote canonical document to {}", artifact.path().display());

        exporter.set_config(config);
        let output = exporter.render_from_file(artifact.path())?;
        tracing::info!("Exported {} components as html (intelligent)", count);
        Ok(output)
    }
}

impl std::fmt::Debug for AtlasManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AtlasManager")
            .field("kinds", &self.kinds())
            .field("formats", &self.formats())
            .field("base_path", &self.base_path)
            .field("temp_dir", &self.temp_dir)
            .finish()
    }
}
