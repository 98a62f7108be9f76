//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::CONFIG_FILE;
use crate::pipeline::ConvertOptions;

/// Convert static HTML prototypes into a templated theme package
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path
    #[arg(short = 'C', long, global = true, default_value = CONFIG_FILE, value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Convert the prototype tree into a theme package
    #[command(visible_alias = "c")]
    Convert {
        #[command(flatten)]
        args: ConvertArgs,
    },
}

/// Convert command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct ConvertArgs {
    /// Prototype directory (relative to project root)
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub input: Option<PathBuf>,

    /// Theme output directory (relative to project root)
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub output: Option<PathBuf>,

    /// Wrap visible text and allow-listed attributes in translation calls
    #[arg(long)]
    pub i18n: bool,

    /// Client id whose placeholder map overlays the base map
    #[arg(long)]
    pub client: Option<String>,

    /// Remove inline event handlers and plaintext external scripts
    #[arg(short, long)]
    pub sanitize: bool,

    /// Extract components shared by several pages into partials
    #[arg(short, long)]
    pub partialize: bool,

    /// Leave outputs of unchanged pages untouched
    #[arg(short = 'k', long)]
    pub skip_unchanged: bool,

    /// Reference theme used to categorize partials
    #[arg(short, long)]
    pub baseline: Option<String>,
}

impl From<&ConvertArgs> for ConvertOptions {
    fn from(args: &ConvertArgs) -> Self {
        Self {
            i18n: args.i18n,
            client: args.client.clone(),
            sanitize: args.sanitize,
            partialize: args.partialize,
            skip_unchanged: args.skip_unchanged,
            baseline: args.baseline.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_convert_flags() {
        let cli = Cli::parse_from([
            "prototheme",
            "convert",
            "--i18n",
            "--client",
            "acme",
            "-p",
            "-k",
            "--output",
            "dist",
        ]);
        let Commands::Convert { args } = &cli.command;
        let options = ConvertOptions::from(args);
        assert!(options.i18n && options.partialize && options.skip_unchanged);
        assert!(!options.sanitize);
        assert_eq!(options.client.as_deref(), Some("acme"));
        assert_eq!(args.output, Some(PathBuf::from("dist")));
        assert_eq!(cli.config, PathBuf::from(CONFIG_FILE));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["prototheme", "c", "--verbose", "-C", "site.toml"]);
        assert!(cli.verbose);
        assert_eq!(cli.config, PathBuf::from("site.toml"));
    }

    #[test]
    fn test_short_verbose_and_version_flags() {
        let cli = Cli::parse_from(["prototheme", "-v", "convert"]);
        assert!(cli.verbose);

        let err = Cli::try_parse_from(["prototheme", "-V"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
