//! Code Atlas - CLI
//!
//! Scans a Laravel-style PHP project and exports its component atlas.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use code_atlas::analysis::AnalysisEngine;
use code_atlas::export::ExportConfig;
use code_atlas::manager::{ExportOptions, ALL_KINDS};
use code_atlas::status::StatusEntry;
use code_atlas::{AtlasContext, Config};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "code-atlas")]
#[command(about = "Component atlas for Laravel-style PHP applications")]
struct Cli {
    /// Project root
    #[arg(long, env = "ATLAS_ROOT", default_value = ".", global = true)]
    root: PathBuf,

    /// Config file (defaults to atlas.yaml in the current directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan one component kind and print the result as JSON
    Scan {
        /// Component kind (models, routes, jobs, ...)
        kind: String,

        /// Directories to scan instead of the conventional ones
        #[arg(short, long)]
        path: Vec<PathBuf>,

        /// Only read files directly inside each path
        #[arg(long)]
        no_recursive: bool,
    },

    /// Export one kind, several kinds (comma separated) or `all`
    Export {
        #[arg(short = 't', long = "type", default_value = ALL_KINDS)]
        kind: String,

        #[arg(short, long, default_value = "json")]
        format: String,

        /// Output file; prints to stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write the atlas for several kinds into the output directory
    Generate {
        /// Comma separated kinds; every kind when omitted
        #[arg(short, long)]
        types: Option<String>,

        /// Single format; every configured format when omitted
        #[arg(short, long)]
        format: Option<String>,

        /// Output directory (overrides generation.output_path)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Analyze relationships across every kind
    Analyze {
        #[arg(short, long)]
        path: Vec<PathBuf>,

        /// Render through an exporter instead of printing raw JSON
        #[arg(short, long)]
        format: Option<String>,
    },

    /// List what a mapper finds, for humans
    Debug { kind: String },

    /// Show the generation history
    Status,
}

fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,code_atlas=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config::from_yaml_and_env(cli.config.as_deref())?;
    let root = cli
        .root
        .canonicalize()
        .with_context(|| format!("Project root {} not found", cli.root.display()))?;
    let ctx = AtlasContext::new(config, root);

    match cli.command {
        Commands::Scan {
            kind,
            path,
            no_recursive,
        } => run_scan(&ctx, &kind, path, !no_recursive),
        Commands::Export {
            kind,
            format,
            output,
        } => {
            let kinds = split_kinds(&kind);
            tracked(&ctx, "export", &kinds, &format, output.as_deref(), || {
                run_export(&ctx, &kinds, &format, output.as_deref())
            })
        }
        Commands::Generate {
            types,
            format,
            output,
        } => run_generate(&ctx, types.as_deref(), format, output),
        Commands::Analyze { path, format } => run_analyze(&ctx, path, format.as_deref()),
        Commands::Debug { kind } => run_debug(&ctx, &kind),
        Commands::Status => run_status(&ctx),
    }
}

fn split_kinds(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn extension(format: &str) -> &str {
    match format {
        "markdown" => "md",
        other => other,
    }
}

fn export_options(ctx: &AtlasContext) -> ExportOptions {
    ExportOptions::with_scan(ctx.config.scan_options(vec![]))
}

/// Run an export step and append its outcome to the status history
fn tracked<F>(
    ctx: &AtlasContext,
    command: &str,
    kinds: &[String],
    format: &str,
    output: Option<&Path>,
    run: F,
) -> Result<()>
where
    F: FnOnce() -> Result<usize>,
{
    ctx.ensure_enabled()?;
    let mut entry = StatusEntry::new(command, kinds, format);
    entry.output = output.map(|p| p.display().to_string());

    let outcome = run();
    let entry = match &outcome {
        Ok(bytes) => {
            entry.bytes = *bytes;
            entry
        }
        Err(e) => entry.failed(format!("{:#}", e)),
    };
    if let Err(e) = ctx.status.record(entry) {
        tracing::warn!("Failed to record status: {}", e);
    }
    outcome.map(|_| ())
}

fn write_output(output: Option<&Path>, rendered: &str) -> Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            std::fs::write(path, rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!("Wrote {}", path.display());
        }
        None => println!("{}", rendered),
    }
    Ok(())
}

fn run_scan(ctx: &AtlasContext, kind: &str, paths: Vec<PathBuf>, recursive: bool) -> Result<()> {
    let mut options = ctx.config.scan_options(paths);
    options.recursive = recursive;
    let result = ctx.manager.scan(kind, &options)?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn run_export(
    ctx: &AtlasContext,
    kinds: &[String],
    format: &str,
    output: Option<&Path>,
) -> Result<usize> {
    let options = export_options(ctx);
    let rendered = ctx.manager.generate(kinds, format, &options)?;
    write_output(output, &rendered)?;
    Ok(rendered.len())
}

fn run_generate(
    ctx: &AtlasContext,
    types: Option<&str>,
    format: Option<String>,
    output: Option<PathBuf>,
) -> Result<()> {
    let kinds = match types {
        Some(list) => split_kinds(list),
        None => ctx.manager.kinds(),
    };
    let formats = match format {
        Some(format) => vec![format],
        None => ctx.config.formats.clone(),
    };
    let dir = output.unwrap_or_else(|| ctx.output_dir());

    for format in &formats {
        let path = dir.join(format!("atlas.{}", extension(format)));
        tracked(ctx, "generate", &kinds, format, Some(&path), || {
            let rendered = ctx.manager.generate(&kinds, format, &export_options(ctx))?;
            write_output(Some(&path), &rendered)?;
            Ok(rendered.len())
        })?;
    }

    tracing::info!(
        "Generated {} format(s) for {} kinds in {}",
        formats.len(),
        kinds.len(),
        dir.display()
    );
    Ok(())
}

fn run_analyze(ctx: &AtlasContext, paths: Vec<PathBuf>, format: Option<&str>) -> Result<()> {
    let paths = if paths.is_empty() {
        ctx.config.scan_paths.clone()
    } else {
        paths
    };
    let engine = AnalysisEngine::new(&ctx.manager);
    let report = engine.analyze_with(&ctx.config.scan_options(paths));

    let rendered = match format {
        Some(format) => ctx
            .manager
            .export_analysis(report, format, ExportConfig::default())?,
        None => serde_json::to_string_pretty(&report)?,
    };
    println!("{}", rendered);
    Ok(())
}

fn run_debug(ctx: &AtlasContext, kind: &str) -> Result<()> {
    let result = ctx.manager.scan(kind, &ctx.config.scan_options(vec![]))?;

    println!("{} ({} found)", result.kind(), result.count());
    for record in result.records() {
        println!();
        println!("  {}  [{}]", record.name, record.fqcn);
        if let Some(file) = &record.file {
            println!("    file: {}", file);
        }
        if let Some(description) = &record.description {
            println!("    about: {}", description);
        }
        if !record.dependencies.is_empty() {
            println!("    depends on: {}", record.dependencies.join(", "));
        }
        let details = serde_json::to_value(&record.details)?;
        if let Some(fields) = details.as_object() {
            for (key, value) in fields {
                if key == "shape" || value.is_null() || value == &serde_json::json!([]) {
                    continue;
                }
                println!("    {}: {}", key, value);
            }
        }
    }
    Ok(())
}

fn run_status(ctx: &AtlasContext) -> Result<()> {
    if !ctx.status.is_enabled() {
        println!("Status tracking is disabled");
        return Ok(());
    }
    let history = ctx.status.history()?;
    if history.is_empty() {
        println!("No generation runs recorded in {}", ctx.status.path().display());
        return Ok(());
    }
    for entry in history {
        let outcome = if entry.success { "ok" } else { "failed" };
        println!(
            "{}  {:<8} {:<8} {:<6} {} {}",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            entry.command,
            entry.format,
            outcome,
            entry.types.join(","),
            entry
                .error
                .or(entry.output)
                .unwrap_or_default()
        );
    }
    Ok(())
}
