// ABOUTME: Entry point for the switchyard CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use std::env;
use switchyard::config::{self, Config};
use switchyard::error::{Error, Result};
use switchyard::output::{Output, OutputMode};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins over the verbose flag when set.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mode = if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };

    if let Err(e) = run(cli, mode).await {
        let output = Output::new(mode);
        output.error(&e.to_string());
        if let Error::Runtime(runtime) = &e {
            output.hint(runtime.hint());
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli, mode: OutputMode) -> Result<()> {
    let cwd = env::current_dir()?;
    let output = Output::new(mode);

    match cli.command.unwrap_or(Commands::Deploy(cli.deploy)) {
        Commands::Init { force } => {
            config::init_config(&cwd, force)?;
            output.success(&format!("Created {}", config::CONFIG_FILENAME));
            Ok(())
        }
        Commands::Deploy(args) => {
            let options = args.options()?;
            let config = Config::resolve(cli.config.as_deref(), &cwd)?;
            commands::deploy(config, options, args.force_unlock, output).await
        }
        Commands::Status => {
            let config = Config::resolve(cli.config.as_deref(), &cwd)?;
            commands::status(config, output).await
        }
        Commands::Render { color } => {
            let config = Config::resolve(cli.config.as_deref(), &cwd)?;
            commands::render(&config, color)
        }
    }
}
