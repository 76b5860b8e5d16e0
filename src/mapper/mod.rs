//! Component mappers
//!
//! A [`Mapper`] discovers every component of one kind under a set of
//! paths and returns a [`ScanResult`]. Class-based kinds share the same
//! scan pipeline ([`ClassMapper`]) and only differ in how they recognise a
//! class ([`ClassKind::qualifies`]) and what they extract from it
//! ([`ClassKind::details`]).

pub mod flow;
pub mod index;
pub mod kinds;
pub mod models;
pub mod registry;

pub use index::ClassIndex;
pub use models::*;
pub use registry::MapperRegistry;

use crate::error::Result;
use crate::parser::php::is_class_type;
use crate::parser::{short_name, PhpClass};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Discovers all components of one kind
pub trait Mapper: Send + Sync {
    /// Registry key (`models`, `routes`, ...)
    fn kind(&self) -> &str;

    /// Conventional directories, relative to the project root
    fn default_paths(&self) -> Vec<PathBuf>;

    /// Scan the given paths (or the defaults) and classify what is found
    fn scan(&self, options: &ScanOptions) -> Result<ScanResult>;
}

/// How a class-based kind recognises and describes its classes
pub trait ClassKind: Send + Sync {
    fn kind(&self) -> &'static str;

    fn default_paths(&self) -> Vec<PathBuf>;

    /// Structural check, with the conventional namespace as fallback
    fn qualifies(&self, class: &PhpClass, index: &ClassIndex) -> bool;

    fn details(&self, class: &PhpClass, index: &ClassIndex) -> ComponentDetails;

    fn dependencies(&self, class: &PhpClass) -> Vec<String> {
        constructor_dependencies(class)
    }
}

/// Short names of the class-typed constructor parameters, in declaration order
pub fn constructor_dependencies(class: &PhpClass) -> Vec<String> {
    let mut deps = Vec::new();
    if let Some(ctor) = class.constructor() {
        push_class_params(&mut deps, ctor.params.iter().filter_map(|p| p.type_name.as_deref()));
    }
    deps
}

/// Constructor dependencies plus the class-typed parameters of `method`
/// (container-injected `handle()` arguments on jobs and commands)
pub fn injected_dependencies(class: &PhpClass, method: &str) -> Vec<String> {
    let mut deps = constructor_dependencies(class);
    if let Some(m) = class.method(method) {
        push_class_params(&mut deps, m.params.iter().filter_map(|p| p.type_name.as_deref()));
    }
    deps
}

fn push_class_params<'a>(deps: &mut Vec<String>, types: impl Iterator<Item = &'a str>) {
    for type_name in types {
        let type_name = type_name.trim_start_matches('?');
        if !is_class_type(type_name) {
            continue;
        }
        let short = short_name(type_name).to_string();
        if !deps.contains(&short) {
            deps.push(short);
        }
    }
}

/// Adapts a [`ClassKind`] into a [`Mapper`]
pub struct ClassMapper<K>(pub K);

impl<K: ClassKind> ClassMapper<K> {
    /// Build records for every qualifying class of an index
    pub fn collect(&self, index: &ClassIndex) -> BTreeMap<String, ComponentRecord> {
        let kind = &self.0;
        let mut data = BTreeMap::new();

        for class in index.classes() {
            if class.is_abstract || !kind.qualifies(class, index) {
                continue;
            }
            let record = ComponentRecord {
                name: class.name.clone(),
                fqcn: class.fqcn.clone(),
                kind: kind.kind().to_string(),
                file: Some(class.file_path.clone()),
                description: class.docstring.clone(),
                dependencies: kind.dependencies(class),
                details: kind.details(class, index),
            };
            if let Some(previous) = data.insert(class.name.clone(), record) {
                tracing::warn!(
                    "Duplicate {} name {}: {} replaced by {}",
                    kind.kind(),
                    class.name,
                    previous.fqcn,
                    class.fqcn
                );
            }
        }

        data
    }
}

impl<K: ClassKind> Mapper for ClassMapper<K> {
    fn kind(&self) -> &str {
        self.0.kind()
    }

    fn default_paths(&self) -> Vec<PathBuf> {
        self.0.default_paths()
    }

    fn scan(&self, options: &ScanOptions) -> Result<ScanResult> {
        let kind = self.0.kind();
        let index = build_index(kind, &self.0.default_paths(), options)?;
        let data = self.collect(&index);

        tracing::info!(
            "Scanned {}: {} components ({} files skipped)",
            kind,
            data.len(),
            index.skipped()
        );
        Ok(ScanResult::new(kind, data))
    }
}

/// Resolve roots, discover files and parse them
pub fn build_index(kind: &str, defaults: &[PathBuf], options: &ScanOptions) -> Result<ClassIndex> {
    let roots = index::resolve_roots(kind, defaults, &options.paths, options.root.as_deref())?;
    if roots.is_empty() {
        tracing::debug!("No {} directories found, nothing to scan", kind);
        return Ok(ClassIndex::default());
    }
    let files = index::discover_files(
        kind,
        &roots,
        options.recursive,
        options.max_depth,
        options.include_vendors,
    )?;
    tracing::debug!("Found {} PHP files for {}", files.len(), kind);
    ClassIndex::from_files(&files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::PhpParser;
    use std::path::Path;

    #[test]
    fn test_constructor_dependencies_skip_primitives() {
        let mut parser = PhpParser::new().unwrap();
        let parsed = parser
            .parse_file(
                Path::new("ReportJob.php"),
                r#"<?php
namespace App\Jobs;

use App\Services\ReportService;
use Psr\Log\LoggerInterface;

class ReportJob
{
    public function __construct(private ?ReportService $reports, int $id, string|int $mixed) {}

    public function handle(LoggerInterface $logger, ReportService $again) {}
}
"#,
            )
            .unwrap();
        let class = &parsed.classes[0];

        assert_eq!(constructor_dependencies(class), vec!["ReportService"]);
        assert_eq!(
            injected_dependencies(class, "handle"),
            vec!["ReportService", "LoggerInterface"]
        );
    }
}
