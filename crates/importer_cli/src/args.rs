use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::platform::logging::LogDestination;

/// Create tracker issues from a tabular workspace export and its
/// companion documents.
#[derive(Debug, Clone, Parser)]
#[command(name = "importer", version)]
pub struct Args {
    /// Job configuration file (RON)
    #[arg(
        short = 'c',
        long = "config",
        value_name = "PATH",
        default_value = "importer.ron",
        global = true
    )]
    pub config: PathBuf,

    /// Personal access token; overrides the token in the config file
    #[arg(long, env = "IMPORTER_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,

    /// Where log output goes
    #[arg(long = "log", value_enum, default_value_t = LogDestination::File, global = true)]
    pub log: LogDestination,

    /// Log at debug level
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Validate the export against the tracker and print one line per record
    Preview,
    /// Validate, then create issues for every submittable record
    Submit,
    /// Write the results CSV from the saved submission state
    Export,
    /// Delete the saved submission state
    Reset,
}
