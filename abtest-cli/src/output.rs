//! Report rendering: tables and text plots, or JSON / YAML

use abtest_metrics::{Decision, DensityCurve};
use anyhow::Result;
use clap::ValueEnum;
use colored::{ColoredString, Colorize};
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};
use serde::Serialize;
use std::fmt;

/// How reports are printed
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// Tables and text plots
    #[default]
    Table,
    /// Pretty-printed JSON
    Json,
    /// YAML
    Yaml,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_possible_value() {
            Some(value) => f.write_str(value.get_name()),
            None => Ok(()),
        }
    }
}

pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    pub fn new(format: OutputFormat, no_color: bool) -> Self {
        if no_color {
            colored::control::set_override(false);
        }
        Self { format }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Print `report` as tables, or serialized in the selected format
    pub fn write<T: Serialize + TableDisplay>(&self, report: &T) -> Result<()> {
        let text = match self.format {
            OutputFormat::Table => {
                report.display_table();
                return Ok(());
            }
            OutputFormat::Json => serde_json::to_string_pretty(report)?,
            OutputFormat::Yaml => serde_yaml::to_string(report)?,
        };
        println!("{}", text.trim_end());
        Ok(())
    }

    /// Notices stay off stdout when it carries JSON or YAML
    pub fn warning(&self, message: &str) {
        match self.format {
            OutputFormat::Table => println!("{} {}", "warning:".yellow().bold(), message),
            OutputFormat::Json | OutputFormat::Yaml => eprintln!("warning: {}", message),
        }
    }
}

/// Human-readable rendering of a report
pub trait TableDisplay {
    fn display_table(&self);
}

/// Rounded UTF-8 table with cyan headers, plain when colors are off
pub fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(headers.iter().map(|h| Cell::new(h).fg(Color::Cyan)));
    if !colored::control::SHOULD_COLORIZE.should_colorize() {
        table.force_no_tty();
    }
    table
}

/// Print a key-value pair in detail format
pub fn print_field(key: &str, value: &str) {
    println!("  {}: {}", key.cyan(), value);
}

/// Print a section header
pub fn print_section(title: &str) {
    println!("\n{}", title.bold().underline());
}

pub fn format_timestamp(dt: &chrono::DateTime<chrono::Utc>) -> String {
    dt.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

pub fn format_number(value: f64) -> String {
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value != 0.0 && (value.abs() >= 1e7 || value.abs() < 1e-3) {
        format!("{:.4e}", value)
    } else {
        format!("{:.4}", value)
    }
}

pub fn format_optional(value: Option<f64>) -> String {
    value.map(format_number).unwrap_or_else(|| "-".to_string())
}

pub fn format_p_value(p: f64) -> String {
    if p > 0.0 && p < 1e-4 {
        format!("{:.3e}", p)
    } else {
        format!("{:.4}", p)
    }
}

pub fn decision_badge(decision: Decision) -> ColoredString {
    match decision {
        Decision::Reject => decision.to_string().red().bold(),
        Decision::FailToReject => decision.to_string().green(),
    }
}

/// Width available for density bars
pub fn bar_width() -> usize {
    console::Term::stdout()
        .size_checked()
        .map(|(_, cols)| (cols as usize).saturating_sub(20).clamp(10, 60))
        .unwrap_or(40)
}

/// Draw a density curve as `rows` horizontal bars, the peak `width` wide
pub fn density_bars(curve: &DensityCurve, rows: usize, width: usize) -> Vec<String> {
    let points = &curve.points;
    if points.is_empty() || rows == 0 {
        return Vec::new();
    }

    let peak = points.iter().map(|p| p.density).fold(0.0_f64, f64::max);
    let rows = rows.min(points.len());
    let step = if rows > 1 {
        (points.len() - 1) as f64 / (rows - 1) as f64
    } else {
        0.0
    };

    (0..rows)
        .map(|i| {
            let point = points[((i as f64) * step).round() as usize];
            let length = if peak > 0.0 {
                ((point.density / peak) * width as f64).round() as usize
            } else {
                0
            };
            format!("{:>12.2} │ {}", point.x, "█".repeat(length))
        })
        .collect()
}
