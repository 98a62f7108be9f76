//! `convert` subcommand.

use anyhow::Result;

use super::ConvertArgs;
use crate::{
    config::ThemeConfig,
    log,
    pipeline::{self, ConvertOptions},
};

/// Run one conversion with command-line overrides applied.
pub fn run_convert(mut config: ThemeConfig, args: &ConvertArgs) -> Result<()> {
    config.override_paths(args.input.as_deref(), args.output.as_deref())?;
    let report = pipeline::convert(&config, &ConvertOptions::from(args))?;

    for failed in &report.failed {
        log!("warning"; "{}: {}", failed.path, failed.reason);
    }
    if report.conflicts > 0 {
        log!(
            "warning";
            "{} conflicts recorded in {}",
            report.conflicts,
            config.build.state_dir.join("conflicts.txt").display()
        );
    }
    Ok(())
}
