use super::{record_summary, ExportConfig, ExportPayload, Exporter};
use crate::analysis::AnalysisReport;
use crate::error::Result;
use crate::mapper::ScanResult;
use std::fmt::Write;

/// Renders payloads as GitHub-flavoured Markdown
#[derive(Debug, Default)]
pub struct MarkdownExporter {
    config: ExportConfig,
}

fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

impl MarkdownExporter {
    fn render_result(&self, out: &mut String, result: &ScanResult, level: &str) {
        let _ = writeln!(out, "{} {} ({})\n", level, result.kind(), result.count());
        if let Some(error) = result.error() {
            let _ = writeln!(out, "> **Error:** {}\n", error);
            return;
        }
        if result.count() == 0 {
            out.push_str("_No components found._\n\n");
            return;
        }
        out.push_str("| Name | Class | Details |\n|---|---|---|\n");
        for record in result.records() {
            let _ = writeln!(
                out,
                "| {} | `{}` | {} |",
                cell(&record.name),
                cell(&record.fqcn),
                cell(&record_summary(record))
            );
        }
        out.push('\n');
    }

    fn render_analysis(&self, out: &mut String, report: &AnalysisReport) {
        out.push_str("## Summary\n\n| Kind | Count | Notes |\n|---|---|---|\n");
        for (kind, summary) in &report.component_summary {
            let mut notes = Vec::new();
            if let Some(n) = summary.with_relationships {
                notes.push(format!("{} with relationships", n));
            }
            if let Some(n) = summary.total_actions {
                notes.push(format!("{} actions", n));
            }
            if let Some(error) = &summary.error {
                notes.push(format!("error: {}", error));
            }
            let _ = writeln!(out, "| {} | {} | {} |", kind, summary.count, cell(&notes.join(", ")));
        }

        out.push_str("\n## Relationships\n\n");
        if report.relationships.is_empty() {
            out.push_str("_None detected._\n");
        }
        for (name, entry) in &report.relationships {
            let _ = writeln!(out, "- **{}** ({})", name, entry.kind);
            for target in &entry.relates_to {
                match &target.relation {
                    Some(relation) => {
                        let _ = writeln!(out, "  - {} `{}` via {}", target.kind, target.name, relation);
                    }
                    None => {
                        let _ = writeln!(out, "  - {} `{}`", target.kind, target.name);
                    }
                }
            }
        }

        out.push_str("\n## Dependencies\n\n| Component | Kind | Dependencies |\n|---|---|---|\n");
        for node in report.dependency_graph.values() {
            let _ = writeln!(
                out,
                "| {} | {} | {} |",
                cell(&node.component),
                node.kind,
                cell(&node.dependencies.join(", "))
            );
        }

        let _ = writeln!(
            out,
            "\n## Metrics\n\n- Total components: {}\n- Coupling: {}\n- Architecture patterns: {} ({} confidence)",
            report.complexity_metrics.total_components,
            report.complexity_metrics.coupling_score,
            report.architecture_patterns.status,
            report.architecture_patterns.confidence,
        );
    }
}

impl Exporter for MarkdownExporter {
    fn format(&self) -> &str {
        "markdown"
    }

    fn set_config(&mut self, config: ExportConfig) {
        self.config = config;
    }

    fn export(&self, payload: &ExportPayload) -> Result<String> {
        let mut out = String::new();
        let _ = writeln!(out, "# {}\n", self.config.title_or("Component Atlas"));

        match payload {
            ExportPayload::Single(result) => self.render_result(&mut out, result, "##"),
            ExportPayload::Multi(results) => {
                let _ = writeln!(
                    out,
                    "{} kinds, {} components\n",
                    results.len(),
                    payload.component_count()
                );
                for result in results.values() {
                    self.render_result(&mut out, result, "##");
                }
            }
            ExportPayload::Analysis(report) => self.render_analysis(&mut out, report),
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{model_record, records};

    #[test]
    fn test_markdown_table_and_error_section() {
        let exporter = MarkdownExporter::default();
        let mut results = std::collections::BTreeMap::new();
        results.insert(
            "models".to_string(),
            ScanResult::new(
                "models",
                records(vec![model_record("Post", &[("comments", "Comment", "hasMany")])]),
            ),
        );
        results.insert("jobs".to_string(), ScanResult::failed("jobs", "boom"));

        let output = exporter.export(&ExportPayload::Multi(results)).unwrap();
        assert!(output.starts_with("# Component Atlas"));
        assert!(output.contains("## models (1)"));
        assert!(output.contains("| Post | `App\\Models\\Post` | hasMany Comment |"));
        assert!(output.contains("> **Error:** boom"));
    }
}
