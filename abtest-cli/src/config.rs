//! Layered CLI configuration

use abtest_core::{AnalysisConfig, Group, SampleSource};
use abtest_storage::{CsvSource, WorkbookSource};
use anyhow::{bail, Context as _, Result};
use config::{Config as ConfigLoader, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cli::{AnalysisArgs, SourceArgs};

/// Name of the per-directory config file, any format the config crate reads
pub const LOCAL_CONFIG: &str = "abtest";

/// Prefix of environment overrides, e.g. `ABTEST__ANALYSIS__ALPHA=0.01`
pub const ENV_PREFIX: &str = "ABTEST";

/// Effective settings after every layer is merged
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub source: SourceSettings,
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SourceSettings {
    pub workbook: Option<PathBuf>,
    pub control_sheet: String,
    pub test_sheet: String,
    pub control_csv: Option<PathBuf>,
    pub test_csv: Option<PathBuf>,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            workbook: None,
            control_sheet: Group::Control.label().to_string(),
            test_sheet: Group::Test.label().to_string(),
            control_csv: None,
            test_csv: None,
        }
    }
}

impl Settings {
    /// Merge defaults, the user config file, `./abtest.*`, `explicit` and
    /// `ABTEST__*` environment variables, later layers winning.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        Self::load_with(Self::user_config_path(), explicit)
    }

    pub fn load_with(user_config: Option<PathBuf>, explicit: Option<&Path>) -> Result<Self> {
        let mut builder = ConfigLoader::builder();

        if let Some(path) = user_config {
            tracing::debug!("User config file: {}", path.display());
            builder = builder.add_source(File::from(path).required(false));
        }
        builder = builder.add_source(File::with_name(LOCAL_CONFIG).required(false));
        if let Some(path) = explicit {
            if !path.exists() {
                bail!("Config file not found: {}", path.display());
            }
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let settings: Settings = builder
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Failed to parse configuration")?;

        settings
            .analysis
            .validate()
            .context("Invalid [analysis] configuration")?;
        Ok(settings)
    }

    /// Platform config file, e.g. `~/.config/abtest/config.toml` on Linux
    pub fn user_config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "abtest", "abtest")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Apply command line overrides, the last layer
    pub fn apply_args(&mut self, source: &SourceArgs, analysis: &AnalysisArgs) -> Result<()> {
        if let Some(workbook) = &source.workbook {
            self.source.workbook = Some(workbook.clone());
            self.source.control_csv = None;
            self.source.test_csv = None;
        }
        if let Some(sheet) = &source.control_sheet {
            self.source.control_sheet = sheet.clone();
        }
        if let Some(sheet) = &source.test_sheet {
            self.source.test_sheet = sheet.clone();
        }
        if source.control_csv.is_some() || source.test_csv.is_some() {
            self.source.control_csv = source.control_csv.clone();
            self.source.test_csv = source.test_csv.clone();
            self.source.workbook = None;
        }

        if let Some(alpha) = analysis.alpha {
            self.analysis.alpha = alpha;
        }
        if let Some(metric) = &analysis.metric {
            self.analysis.metric_column = metric.clone();
        }
        if let Some(trials) = &analysis.trials {
            self.analysis.trials_column = trials.clone();
        }

        self.analysis
            .validate()
            .context("Invalid analysis options")?;
        Ok(())
    }
}

impl SourceSettings {
    /// Build the sample source, preferring a CSV pair over a workbook
    pub fn open(&self) -> Result<Box<dyn SampleSource>> {
        match (&self.control_csv, &self.test_csv, &self.workbook) {
            (Some(control), Some(test), _) => {
                Ok(Box::new(CsvSource::new(control.clone(), test.clone())))
            }
            (Some(_), None, _) | (None, Some(_), _) => {
                bail!("Both control and test CSV files are required")
            }
            (None, None, Some(path)) => Ok(Box::new(
                WorkbookSource::new(path.clone())
                    .with_sheets(self.control_sheet.as_str(), self.test_sheet.as_str()),
            )),
            (None, None, None) => bail!(
                "No input data: pass --workbook or --control-csv/--test-csv, or set [source] in the config"
            ),
        }
    }
}
