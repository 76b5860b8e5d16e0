//! Tree-sitter based PHP parser
//!
//! Produces the structural class metadata the mappers classify on, standing
//! in for runtime reflection.

pub mod helpers;
pub mod models;
pub mod php;
pub mod routes;

pub use models::*;

use anyhow::{Context, Result};
use std::path::Path;
use tree_sitter::Parser;

const PHP_EXTENSIONS: &[&str] = &["php", "phtml", "php5", "php7", "php8"];

/// Whether a path looks like a PHP source file (Blade templates excluded)
pub fn is_php_source(path: &Path) -> bool {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_lowercase();
    if !PHP_EXTENSIONS.contains(&ext.as_str()) {
        return false;
    }
    !path
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.ends_with(".blade.php"))
        .unwrap_or(false)
}

/// PHP parser using tree-sitter
pub struct PhpParser {
    parser: Parser,
}

impl PhpParser {
    /// Create a new parser
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_php::LANGUAGE_PHP.into())
            .context("Failed to set language for PHP")?;
        Ok(Self { parser })
    }

    /// Read and parse a file from disk
    pub fn parse_path(&mut self, path: &Path) -> Result<ParsedFile> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        self.parse_file(path, &content)
    }

    /// Parse file content and extract classes and routes
    pub fn parse_file(&mut self, path: &Path, content: &str) -> Result<ParsedFile> {
        let tree = self
            .parser
            .parse(content, None)
            .context("Failed to parse file")?;

        let root = tree.root_node();
        let mut parsed = ParsedFile {
            path: path.to_string_lossy().to_string(),
            ..Default::default()
        };

        php::extract(&root, content, &mut parsed)?;

        Ok(parsed)
    }
}
