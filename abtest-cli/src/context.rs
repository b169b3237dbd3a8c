//! CLI execution context

use anyhow::Result;

use crate::cli::Cli;
use crate::config::Settings;
use crate::output::OutputWriter;

/// Execution context for CLI commands
pub struct Context {
    /// Settings merged from config files and environment, before flags
    pub settings: Settings,

    /// Output writer
    pub output: OutputWriter,
}

impl Context {
    /// Create a new context from CLI arguments
    pub fn new(cli: &Cli) -> Result<Self> {
        let settings = Settings::load(cli.config.as_deref())?;
        let output = OutputWriter::new(cli.output, cli.no_color);

        Ok(Self { settings, output })
    }
}
