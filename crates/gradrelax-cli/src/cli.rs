use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "gradrelax developers",
    version,
    about = "gradrelax CLI - inspect force-field parameter tables and validate relaxation settings.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load the parameter tables and report what they contain.
    Params(ParamsArgs),
    /// Validate the relaxation settings and print the effective configuration.
    Check(CheckArgs),
}

/// Arguments for the `params` subcommand.
#[derive(Args, Debug)]
pub struct ParamsArgs {
    /// Path to the configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the hydrogen/orbital coordinate table.
    #[arg(long, value_name = "PATH")]
    pub coordinate_table: Option<PathBuf>,

    /// Override the hydrogen-bond property table.
    #[arg(long, value_name = "PATH")]
    pub hbond_table: Option<PathBuf>,

    /// Extra override patches in TOML format.
    #[arg(long, value_name = "PATH")]
    pub overrides: Option<PathBuf>,

    /// Print the entries of one residue (three-letter code).
    #[arg(short, long, value_name = "CODE")]
    pub residue: Option<String>,

    /// Restrict the printed entries to one atom; requires --residue.
    #[arg(short, long, value_name = "NAME", requires = "residue")]
    pub atom: Option<String>,
}

/// Arguments for the `check` subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Path to the configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the number of epochs.
    #[arg(short, long, value_name = "INT")]
    pub epochs: Option<usize>,

    /// Override the initial learning rate.
    #[arg(short = 'l', long, value_name = "FLOAT")]
    pub learning_rate: Option<f64>,

    /// Let backbone translations take part from the first epoch.
    #[arg(long, conflicts_with = "unlock_backbone_after")]
    pub backbone_rotation: bool,

    /// Keep the backbone frozen for this many epochs, then unlock it.
    #[arg(long, value_name = "EPOCH")]
    pub unlock_backbone_after: Option<usize>,

    /// Abort on a non-finite loss.
    #[arg(long)]
    pub divergence_check: bool,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S optimization.epochs=100
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["gradrelax", "check", "-vv", "--log-file", "run.log"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.log_file, Some(PathBuf::from("run.log")));
        assert!(matches!(cli.command, Commands::Check(_)));
    }

    #[test]
    fn atom_requires_residue() {
        let result = Cli::try_parse_from(["gradrelax", "params", "--atom", "N"]);
        assert!(result.is_err());
    }

    #[test]
    fn backbone_flags_are_mutually_exclusive() {
        let result = Cli::try_parse_from([
            "gradrelax",
            "check",
            "--backbone-rotation",
            "--unlock-backbone-after",
            "20",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn set_values_accumulate() {
        let cli = Cli::parse_from([
            "gradrelax",
            "check",
            "-S",
            "optimization.epochs=10",
            "-S",
            "optimization.learning-rate=0.5",
        ]);
        let Commands::Check(args) = cli.command else {
            panic!("Expected 'check' subcommand");
        };
        assert_eq!(args.set_values.len(), 2);
    }
}
