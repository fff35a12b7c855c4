mod cli;
mod commands;
mod mcp;
mod output;
mod page_range;
mod pdf;
mod pipeline;
mod registry;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use simplelog::{ColorChoice, ConfigBuilder, LevelFilter, TermLogger, TerminalMode};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.log_level.as_deref())?;

    match cli.command {
        Commands::Mcp { release_delay_ms } => {
            let config = pipeline::PipelineConfig {
                release_delay: Duration::from_millis(release_delay_ms),
            };
            mcp::run_server(config).await?;
        }
        Commands::Trim(args) => {
            commands::trim::run(args).await?;
        }
        Commands::Info { inputs } => {
            commands::info::run(&inputs)?;
        }
        Commands::Pages { expression, total } => {
            commands::pages::run(&expression, total)?;
        }
    }

    Ok(())
}

/// Log to stderr so stdout stays free for command output and the MCP transport.
fn init_logging(verbose: u8, level: Option<&str>) -> Result<()> {
    let level = match level {
        Some(name) => name
            .parse::<LevelFilter>()
            .map_err(|_| anyhow::anyhow!("Invalid log level: {}", name))?,
        None => match verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            _ => LevelFilter::Debug,
        },
    };

    let config = ConfigBuilder::new()
        .add_filter_allow_str(env!("CARGO_CRATE_NAME"))
        .build();

    TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto)
        .context("Failed to initialize logger")
}
