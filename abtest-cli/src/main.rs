use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;
mod commands;
mod config;
mod context;
mod output;

use cli::{Cli, Commands};
use context::Context;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays parseable with -o json/yaml
    let default_filter = if cli.verbose { "abtest=debug" } else { "abtest=info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(!cli.no_color)
                .with_target(false),
        )
        .init();

    let ctx = Context::new(&cli)?;
    tracing::debug!("Output format: {}", ctx.output.format());

    match cli.command {
        Commands::Analyze(args) => commands::analyze::execute(&ctx, args),
        Commands::Describe(args) => commands::describe::execute(&ctx, args),
        Commands::Ztest(args) => commands::ztest::execute(&ctx, args),
        Commands::Config(cmd) => commands::config::execute(&ctx, cmd),
    }
}
