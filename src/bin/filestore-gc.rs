use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use worker_entrypoint::cli::GcCli;
use worker_entrypoint::filestore::{self, SweepReport};
use worker_entrypoint::logging;

fn main() -> Result<()> {
    let cli = GcCli::parse();
    logging::init();

    info!(mount = %cli.mount_path.display(), dry_run = cli.dry_run, "sweeping filestore");
    let report = filestore::sweep(&cli.mount_path, cli.dry_run)?;

    if cli.json {
        render_json(&report)?;
    } else {
        render_human(&report);
    }
    Ok(())
}

fn render_human(report: &SweepReport) {
    let verb = if report.dry_run { "Would delete" } else { "Deleted" };
    println!(
        "{verb} {} entr{} under {}.",
        report.deleted.len(),
        if report.deleted.len() == 1 { "y" } else { "ies" },
        report.mount_path.display()
    );
    for failure in &report.failed {
        println!("Failed: {} ({})", failure.path.display(), failure.error);
    }
}

fn render_json(report: &SweepReport) -> Result<()> {
    let rendered =
        serde_json::to_string_pretty(report).context("failed to serialize sweep report")?;
    println!("{rendered}");
    Ok(())
}
