//! RFP Extract CLI - Pull requirements and risks out of tender documents.

use anyhow::Context;
use clap::Parser;
use rfp_cli::commands;
use rfp_cli::{Cli, Command, Config, Formatter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Log to stderr so JSON on stdout stays clean
    let default_level = if cli.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;

    let format = cli.format.map(Into::into).unwrap_or(config.settings.format);
    let color_enabled = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color_enabled);

    match cli.command {
        Command::Extract(args) => {
            let input = args.input.display().to_string();
            commands::execute_extract(args, &config, &formatter)
                .await
                .with_context(|| format!("extraction from {} failed", input))?;
        }
        Command::Match(args) => {
            commands::execute_match(args, &formatter).await?;
        }
        Command::Config => {
            commands::execute_show_config(&config).await?;
        }
    }

    Ok(())
}
