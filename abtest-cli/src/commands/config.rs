//! Configuration commands

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;

use crate::config::{Settings, ENV_PREFIX, LOCAL_CONFIG};
use crate::context::Context;
use crate::output::{print_field, print_section, TableDisplay};

/// Configuration commands
#[derive(Debug, Args)]
pub struct ConfigCommands {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigSubcommand {
    /// Show the effective configuration
    Show,

    /// Show where configuration is read from
    Path,
}

/// Execute configuration commands
pub fn execute(ctx: &Context, cmd: ConfigCommands) -> Result<()> {
    match cmd.command {
        ConfigSubcommand::Show => ctx.output.write(&ctx.settings),
        ConfigSubcommand::Path => {
            show_paths();
            Ok(())
        }
    }
}

impl TableDisplay for Settings {
    fn display_table(&self) {
        let path = |p: &Option<std::path::PathBuf>| {
            p.as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "-".dimmed().to_string())
        };

        print_section("Source");
        print_field("workbook", &path(&self.source.workbook));
        print_field("control_sheet", &self.source.control_sheet);
        print_field("test_sheet", &self.source.test_sheet);
        print_field("control_csv", &path(&self.source.control_csv));
        print_field("test_csv", &path(&self.source.test_csv));

        let analysis = &self.analysis;
        let list = |items: Vec<String>| items.join(", ");
        print_section("Analysis");
        print_field("alpha", &analysis.alpha.to_string());
        print_field(
            "percentiles",
            &list(analysis.percentiles.iter().map(f64::to_string).collect()),
        );
        print_field("head_rows", &analysis.head_rows.to_string());
        print_field("metric_column", &analysis.metric_column);
        print_field("trials_column", &analysis.trials_column);
        print_field("revenue_column", &analysis.revenue_column);
        print_field("confidence_level", &analysis.confidence_level.to_string());
        print_field("density_points", &analysis.density_points.to_string());
        print_field("min_group_size", &analysis.min_group_size.to_string());
        print_field(
            "enforce_min_group_size",
            &analysis.enforce_min_group_size.to_string(),
        );
        print_field("compare_columns", &list(analysis.compare_columns.clone()));
    }
}

fn show_paths() {
    println!("{}", "Configuration layers (later wins)".bold().underline());
    match Settings::user_config_path() {
        Some(path) => print_field("user", &path.display().to_string()),
        None => print_field("user", &"unavailable".dimmed().to_string()),
    }
    print_field("local", &format!("./{}.toml", LOCAL_CONFIG));
    print_field("explicit", "--config <FILE>");
    print_field("environment", &format!("{}__<SECTION>__<KEY>", ENV_PREFIX));
}
