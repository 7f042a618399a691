//! Command-line configuration with environment fallbacks

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// World Cup standings backed by an on-device SQLite store
#[derive(Debug, Parser)]
#[command(name = "worldcup")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// SQLite database file
    #[arg(long, env = "WORLDCUP_DB", default_value = "worldcup.db")]
    pub db: PathBuf,

    /// Seed file to use instead of the bundled one
    #[arg(long, env = "WORLDCUP_SEED")]
    pub seed: Option<PathBuf>,

    #[command(flatten)]
    pub logging: LoggingArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    pub fn selected_command(&self) -> Command {
        self.command.unwrap_or(Command::Ui)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Interactive standings table (default)
    Ui,

    /// Seed an empty store and exit
    Import,

    /// Print the grouped standings and exit
    Show,
}

#[derive(Debug, Clone, Args)]
pub struct LoggingArgs {
    /// Filter directive, e.g. "info" or "worldcup=debug"
    #[arg(long = "log-level", env = "WORLDCUP_LOG", default_value = "info")]
    pub level: String,

    #[arg(long = "log-format", env = "WORLDCUP_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub format: LogFormat,

    /// Write logs here instead of stderr
    #[arg(long = "log-file", env = "WORLDCUP_LOG_FILE")]
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}
