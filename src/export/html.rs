use super::{record_summary, CanonicalDocument, ExportConfig, ExportPayload, Exporter};
use crate::analysis::AnalysisReport;
use crate::error::Result;
use crate::mapper::ScanResult;
use std::fmt::Write;
use std::path::Path;

const STYLE: &str = "body{font-family:system-ui,sans-serif;margin:2rem;color:#222}\
table{border-collapse:collapse;width:100%;margin-bottom:1.5rem}\
th,td{border:1px solid #ddd;padding:.4rem .6rem;text-align:left;vertical-align:top}\
th{background:#f4f4f4}code{font-size:.9em}.error{color:#b00020}\
.flow li{margin:.15rem 0}";

/// Renders a self-contained HTML page
#[derive(Debug, Default)]
pub struct HtmlExporter {
    config: ExportConfig,
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

impl HtmlExporter {
    fn render_page(&self, payload: &ExportPayload, connections: bool) -> String {
        let title = escape(&self.config.title_or("Component Atlas"));
        let mut body = String::new();

        match payload {
            ExportPayload::Single(result) => render_result(&mut body, result),
            ExportPayload::Multi(results) => {
                let _ = writeln!(
                    body,
                    "<p>{} kinds, {} components</p>",
                    results.len(),
                    payload.component_count()
                );
                for result in results.values() {
                    render_result(&mut body, result);
                }
            }
            ExportPayload::Analysis(report) => render_analysis(&mut body, report),
        }

        if connections {
            render_connections(&mut body, payload);
        }

        format!(
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n<h1>{title}</h1>\n{body}</body>\n</html>\n"
        )
    }
}

fn render_result(out: &mut String, result: &ScanResult) {
    let kind = escape(result.kind());
    let _ = writeln!(
        out,
        "<section id=\"{kind}\">\n<h2>{kind} <small>({})</small></h2>",
        result.count()
    );
    if let Some(error) = result.error() {
        let _ = writeln!(out, "<p class=\"error\">{}</p>\n</section>", escape(error));
        return;
    }
    out.push_str("<table>\n<tr><th>Name</th><th>Class</th><th>Details</th></tr>\n");
    for record in result.records() {
        let _ = writeln!(
            out,
            "<tr><td>{}</td><td><code>{}</code></td><td>{}</td></tr>",
            escape(&record.name),
            escape(&record.fqcn),
            escape(&record_summary(record))
        );
    }
    out.push_str("</table>\n</section>\n");
}

fn render_analysis(out: &mut String, report: &AnalysisReport) {
    out.push_str("<section id=\"summary\">\n<h2>Summary</h2>\n<table>\n");
    out.push_str("<tr><th>Kind</th><th>Count</th><th>Error</th></tr>\n");
    for (kind, summary) in &report.component_summary {
        let _ = writeln!(
            out,
            "<tr><td>{}</td><td>{}</td><td class=\"error\">{}</td></tr>",
            escape(kind),
            summary.count,
            escape(summary.error.as_deref().unwrap_or_default())
        );
    }
    out.push_str("</table>\n</section>\n");

    out.push_str("<section id=\"relationships\">\n<h2>Relationships</h2>\n<ul>\n");
    for (name, entry) in &report.relationships {
        let targets: Vec<String> = entry
            .relates_to
            .iter()
            .map(|t| format!("{} {}", escape(&t.kind), escape(&t.name)))
            .collect();
        let _ = writeln!(
            out,
            "<li><strong>{}</strong> ({}): {}</li>",
            escape(name),
            escape(&entry.kind),
            targets.join(", ")
        );
    }
    out.push_str("</ul>\n</section>\n");
}

/// Who reaches which jobs, events, notifications, models and services
fn render_connections(out: &mut String, payload: &ExportPayload) {
    let mut rows = String::new();
    for result in payload.results() {
        for record in result.records() {
            let Some(flow) = record.flow().filter(|f| !f.is_empty()) else {
                continue;
            };
            let _ = writeln!(rows, "<li><strong>{}</strong> <ul>", escape(&record.name));
            for (category, names) in flow.categories() {
                if names.is_empty() {
                    continue;
                }
                let _ = writeln!(
                    rows,
                    "<li>{}: {}</li>",
                    category,
                    escape(&names.join(", "))
                );
            }
            rows.push_str("</ul></li>\n");
        }
    }
    if rows.is_empty() {
        return;
    }
    let _ = write!(
        out,
        "<section id=\"connections\">\n<h2>Connections</h2>\n<ul class=\"flow\">\n{}</ul>\n</section>\n",
        rows
    );
}

impl Exporter for HtmlExporter {
    fn format(&self) -> &str {
        "html"
    }

    fn set_config(&mut self, config: ExportConfig) {
        self.config = config;
    }

    fn export(&self, payload: &ExportPayload) -> Result<String> {
        Ok(self.render_page(payload, false))
    }

    fn render_from_file(&self, path: &Path) -> Result<String> {
        let document = CanonicalDocument::read(path)?;
        tracing::debug!(
            "Rendering HTML from {} (generated {})",
            path.display(),
            document.generated_at
        );
        Ok(self.render_page(&document.payload, true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{records, service_record};

    #[test]
    fn test_escape() {
        assert_eq!(escape("<a href=\"x\">&</a>"), "&lt;a href=&quot;x&quot;&gt;&amp;&lt;/a&gt;");
    }

    #[test]
    fn test_connections_only_when_rendered_from_file() {
        let payload = ExportPayload::Single(ScanResult::new(
            "services",
            records(vec![service_record("BillingService", &["ChargeCustomer"])]),
        ));
        let exporter = HtmlExporter::default();

        let direct = exporter.export(&payload).unwrap();
        assert!(direct.contains("<h2>services <small>(1)</small></h2>"));
        assert!(!direct.contains("Connections"));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        CanonicalDocument::new(payload, false).write(&path).unwrap();
        let from_file = exporter.render_from_file(&path).unwrap();
        assert!(from_file.contains("<h2>Connections</h2>"));
        assert!(from_file.contains("<li>jobs: ChargeCustomer</li>"));
    }
}
