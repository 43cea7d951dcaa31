use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "mrusift",
    version,
    about = "Sift recently-opened Office document records out of registry hives"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    pub json: bool,
    #[arg(
        long,
        global = true,
        help = "Read from a captured hive snapshot instead of the live registry"
    )]
    pub snapshot: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Recover recently-used document records across all user hives
    Harvest {
        #[arg(long, help = "Recency window in days (default 7, or 30 with --full)")]
        days: Option<u32>,
        #[arg(long, default_value_t = false, help = "Use the wide unfiltered window")]
        full: bool,
        #[arg(
            long,
            default_value_t = false,
            help = "Temporarily loosen the macro-access gates and pull macro source"
        )]
        check_macros: bool,
        #[arg(long, help = "Macro extraction command (receives the document path)")]
        macro_tool: Option<String>,
    },
    /// Inspect the macro-access gates without changing anything
    Policy {
        #[command(subcommand)]
        command: PolicyCommands,
    },
    /// Decode a single raw MRU value
    Decode { value: String },
}

#[derive(Subcommand, Debug)]
pub enum PolicyCommands {
    Status,
}
