use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod domain;
mod registry;
mod services;

use cli::{Cli, Commands, PolicyCommands};
use domain::models::{ErrorBody, ErrorOut};
use registry::RegistryError;
use services::config::{load_config, ConfigError};

fn main() {
    let cli = Cli::parse();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    if let Err(e) = run(&cli) {
        if cli.json {
            let out = ErrorOut {
                ok: false,
                error: ErrorBody {
                    code: error_code(&e).to_string(),
                    message: format!("{e:#}"),
                },
            };
            match serde_json::to_string_pretty(&out) {
                Ok(body) => println!("{body}"),
                Err(_) => eprintln!("error: {e:#}"),
            }
        } else {
            eprintln!("error: {e:#}");
        }
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = load_config()?;

    match &cli.command {
        Commands::Harvest {
            days,
            full,
            check_macros,
            macro_tool,
        } => commands::handle_harvest(
            cli,
            *days,
            *full,
            *check_macros,
            macro_tool.as_deref(),
            &config,
        ),
        Commands::Policy { command } => match command {
            PolicyCommands::Status => commands::handle_policy_status(cli),
        },
        Commands::Decode { value } => commands::handle_decode(cli, value),
    }
}

fn error_code(e: &anyhow::Error) -> &'static str {
    if e.downcast_ref::<ConfigError>().is_some() {
        "CONFIG"
    } else if e.downcast_ref::<RegistryError>().is_some() {
        "REGISTRY"
    } else {
        "INTERNAL"
    }
}
