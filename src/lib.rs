pub mod cli;
pub mod error;
pub mod model;
pub mod parser;
pub mod processor;
pub mod writer;

use std::path::Path;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use crate::model::Project;

pub fn run() -> anyhow::Result<()> {
    let args = cli::Cli::parse();
    convert(&args)
}

/// Load the input and join any appended projects to its right.
fn load_all(args: &cli::Cli) -> anyhow::Result<Project> {
    let mut joined = load_one(&args.input)?;
    for path in &args.append {
        let project = load_one(path)?;
        joined = joined
            .append(&project)
            .with_context(|| format!("Appending {}", path.display()))?;
    }
    Ok(joined)
}

fn load_one(path: &Path) -> anyhow::Result<Project> {
    let project = parser::load(path).with_context(|| format!("Loading {}", path.display()))?;
    info!(
        "Loaded {}: {} chars, {} tiles, {}x{} map",
        path.display(),
        project.num_chars(),
        project.num_tiles(),
        project.map_width,
        project.map_height
    );
    Ok(project)
}

pub fn convert(args: &cli::Cli) -> anyhow::Result<()> {
    // 1. ── Parse ──────────────────────────────────────────────────────
    let project = load_all(args)?;

    // 2. ── Process ────────────────────────────────────────────────────
    let processed = processor::run(&project).with_context(|| "Converting char tile map")?;
    if !processed.validation.is_within_budget() {
        info!(
            "{} window positions over budget",
            processed.validation.violations.len()
        );
    }

    // 3. ── Write outputs ──────────────────────────────────────────────
    if let Some(output) = &args.output {
        writer::asm::emit(&processed, output)
            .with_context(|| format!("Writing {}", output.display()))?;
        info!("Wrote {}", output.display());
    }
    if let Some(report) = &args.report {
        writer::report::emit(&processed, report)
            .with_context(|| format!("Writing {}", report.display()))?;
    }

    Ok(())
}
