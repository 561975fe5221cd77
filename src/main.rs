use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;

mod archive;
mod class;
mod classfile;
mod constant_pool;
mod descriptor;
mod emit;
mod error;
mod flags;
mod graph;
mod mutf8;
mod pipeline;
mod reader;
mod telemetry;
#[cfg(test)]
mod test_support;

use crate::emit::all_backends;
use crate::pipeline::{ConversionOptions, DEFAULT_REFERENCE, DEFAULT_TARGET, convert};
use crate::telemetry::{Telemetry, init_logging};

/// CLI arguments for caffeinator execution.
#[derive(Parser, Debug)]
#[command(
    name = "caffeinator",
    about = "Convert JVM class archives into a target-runtime module.",
    version
)]
struct Cli {
    /// Jar or zip archives to convert; later archives win on duplicate classes.
    #[arg(value_name = "ARCHIVE", required_unless_present = "list_targets")]
    archives: Vec<PathBuf>,
    /// Output path; defaults to the first archive's name with the target's extension.
    #[arg(short, long, value_name = "PATH")]
    out: Option<PathBuf>,
    /// Reference module handed to the backend; repeatable.
    #[arg(short, long = "reference", value_name = "NAME", default_value = DEFAULT_REFERENCE)]
    references: Vec<String>,
    /// Emission backend.
    #[arg(short, long, value_name = "ID", default_value = DEFAULT_TARGET)]
    target: String,
    #[arg(short, long)]
    verbose: bool,
    /// OTLP/HTTP endpoint receiving trace spans.
    #[arg(long, value_name = "URL")]
    otel: Option<String>,
    #[arg(long)]
    quiet: bool,
    #[arg(long)]
    timing: bool,
    /// List the available backends and exit.
    #[arg(long)]
    list_targets: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    run(cli)
}

fn run(cli: Cli) -> Result<()> {
    if cli.list_targets {
        for backend in all_backends() {
            let metadata = backend.metadata();
            println!("{:<8} .{:<5} {}", metadata.id, metadata.extension, metadata.description);
        }
        return Ok(());
    }
    init_logging(cli.verbose);
    let telemetry = cli.otel.as_deref().map(Telemetry::new).transpose()?;

    let options = ConversionOptions {
        archives: cli.archives,
        output: cli.out,
        references: cli.references,
        target: cli.target,
    };
    let result = convert(&options, telemetry.as_ref());
    if let Some(telemetry) = &telemetry {
        telemetry.shutdown()?;
    }
    let summary = result?;

    info!(
        module = %summary.module.name,
        output = %summary.module.output.display(),
        types = summary.emitted_types,
        fields = summary.emitted_fields,
        methods = summary.emitted_methods,
        "module written"
    );
    if summary.archives_skipped > 0 && !cli.quiet {
        eprintln!(
            "warning: {} archive(s) could not be read and were skipped",
            summary.archives_skipped
        );
    }
    if cli.timing && !cli.quiet {
        eprintln!(
            "timing: total_ms={} load_ms={} graph_ms={} emit_ms={} archives={} classes={} nodes={}",
            summary.load_ms + summary.graph_ms + summary.emit_ms,
            summary.load_ms,
            summary.graph_ms,
            summary.emit_ms,
            summary.archives_read,
            summary.class_files,
            summary.graph_nodes
        );
    }
    Ok(())
}
