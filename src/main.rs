//! prototheme - convert static HTML prototypes into a templated theme package.

mod adapter;
mod analyze;
mod cache;
mod cli;
mod config;
mod dom;
mod freshness;
mod ingest;
mod logger;
mod mapper;
mod pipeline;
mod utils;

use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::ThemeConfig;

fn main() {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    if let Err(err) = run(&cli) {
        log!("error"; "{:#}", err);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = ThemeConfig::load(&cli.config)?;
    match &cli.command {
        Commands::Convert { args } => cli::convert::run_convert(config, args),
    }
}
