//! Source discovery and the class index.
//!
//! The index stands in for a class loader: it parses every PHP file found
//! under the scan roots and answers structural questions (ancestry,
//! interfaces, traits) across the files it has seen.

use crate::error::{AtlasError, Result};
use crate::parser::{is_php_source, short_name, PhpClass, PhpParser, RouteDefinition};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const SKIPPED_DIRS: &[&str] = &["vendor", "node_modules", ".git", "storage"];

/// Resolve the roots a mapper should read.
///
/// Empty `paths` means the kind's conventional directories under the
/// project root; missing conventional directories are ignored. Explicit
/// paths must exist.
pub fn resolve_roots(
    kind: &str,
    defaults: &[PathBuf],
    paths: &[PathBuf],
    root: Option<&Path>,
) -> Result<Vec<PathBuf>> {
    let base = root.unwrap_or_else(|| Path::new("."));
    let absolutize = |p: &PathBuf| {
        if p.is_absolute() {
            p.clone()
        } else {
            base.join(p)
        }
    };

    if paths.is_empty() {
        return Ok(defaults
            .iter()
            .map(absolutize)
            .filter(|p| p.exists())
            .collect());
    }

    let mut roots = Vec::with_capacity(paths.len());
    for path in paths {
        let resolved = absolutize(path);
        if !resolved.exists() {
            return Err(AtlasError::scan(
                kind,
                format!("path does not exist: {}", resolved.display()),
            ));
        }
        roots.push(resolved);
    }
    Ok(roots)
}

/// Walk the roots and list PHP source files in a stable order
pub fn discover_files(
    kind: &str,
    roots: &[PathBuf],
    recursive: bool,
    max_depth: Option<usize>,
    include_vendors: bool,
) -> Result<Vec<PathBuf>> {
    let mut files = BTreeSet::new();

    for root in roots {
        if root.is_file() {
            if is_php_source(root) {
                files.insert(root.clone());
            }
            continue;
        }

        let depth = if recursive {
            max_depth.unwrap_or(usize::MAX)
        } else {
            1
        };

        let walker = WalkDir::new(root)
            .follow_links(true)
            .max_depth(depth)
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0
                    || !e.file_type().is_dir()
                    || include_vendors
                    || !e
                        .file_name()
                        .to_str()
                        .map(|n| SKIPPED_DIRS.contains(&n))
                        .unwrap_or(false)
            });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => return Err(AtlasError::scan(kind, e)),
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                    continue;
                }
            };
            if entry.file_type().is_file() && is_php_source(entry.path()) {
                files.insert(entry.into_path());
            }
        }
    }

    Ok(files.into_iter().collect())
}

/// Classes and routes parsed from a set of files
#[derive(Debug, Default)]
pub struct ClassIndex {
    classes: BTreeMap<String, PhpClass>,
    routes: Vec<RouteDefinition>,
    skipped: usize,
}

impl ClassIndex {
    /// Parse every file; files that cannot be read or parsed are skipped
    pub fn from_files(files: &[PathBuf]) -> Result<Self> {
        let mut parser = PhpParser::new().map_err(|e| AtlasError::Parser(e.to_string()))?;
        let mut index = Self::default();

        for file in files {
            match parser.parse_path(file) {
                Ok(parsed) => {
                    tracing::debug!(
                        "Parsed {}: {} classes, {} routes",
                        file.display(),
                        parsed.classes.len(),
                        parsed.routes.len()
                    );
                    for class in parsed.classes {
                        index.classes.insert(class.fqcn.clone(), class);
                    }
                    index.routes.extend(parsed.routes);
                }
                Err(e) => {
                    tracing::warn!("Skipping {}: {:#}", file.display(), e);
                    index.skipped += 1;
                }
            }
        }

        Ok(index)
    }

    /// Build an index from already-parsed classes
    pub fn from_classes(classes: impl IntoIterator<Item = PhpClass>) -> Self {
        Self {
            classes: classes.into_iter().map(|c| (c.fqcn.clone(), c)).collect(),
            routes: Vec::new(),
            skipped: 0,
        }
    }

    pub fn classes(&self) -> impl Iterator<Item = &PhpClass> {
        self.classes.values()
    }

    pub fn get(&self, fqcn: &str) -> Option<&PhpClass> {
        self.classes.get(fqcn)
    }

    pub fn routes(&self) -> &[RouteDefinition] {
        &self.routes
    }

    /// Number of files that could not be read or parsed
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Fully-qualified parent chain, nearest first. The chain ends at the
    /// first parent that is not part of the index.
    pub fn ancestors(&self, class: &PhpClass) -> Vec<String> {
        let mut chain = Vec::new();
        let mut current = class.extends.clone();
        while let Some(parent) = current {
            if chain.contains(&parent) || parent == class.fqcn {
                break;
            }
            current = self.classes.get(&parent).and_then(|p| p.extends.clone());
            chain.push(parent);
        }
        chain
    }

    /// Whether any ancestor has one of the given short names
    pub fn extends_any(&self, class: &PhpClass, bases: &[&str]) -> bool {
        self.ancestors(class)
            .iter()
            .any(|a| bases.contains(&short_name(a)))
    }

    /// Interfaces implemented by the class or any indexed ancestor
    pub fn interfaces(&self, class: &PhpClass) -> BTreeSet<String> {
        self.collect_along_chain(class, |c| &c.implements)
    }

    /// Traits used by the class or any indexed ancestor
    pub fn traits(&self, class: &PhpClass) -> BTreeSet<String> {
        self.collect_along_chain(class, |c| &c.traits)
    }

    pub fn implements_any(&self, class: &PhpClass, interfaces: &[&str]) -> bool {
        self.interfaces(class)
            .iter()
            .any(|i| interfaces.contains(&short_name(i)))
    }

    pub fn uses_any(&self, class: &PhpClass, traits: &[&str]) -> bool {
        self.traits(class)
            .iter()
            .any(|t| traits.contains(&short_name(t)))
    }

    fn collect_along_chain(
        &self,
        class: &PhpClass,
        field: impl Fn(&PhpClass) -> &Vec<String>,
    ) -> BTreeSet<String> {
        let mut names: BTreeSet<String> = field(class).iter().cloned().collect();
        for ancestor in self.ancestors(class) {
            if let Some(parent) = self.classes.get(&ancestor) {
                names.extend(field(parent).iter().cloned());
            }
        }
        names
    }
}
