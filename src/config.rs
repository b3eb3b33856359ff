//! Configuration file handling.
//!
//! Loads `rentscope.toml` and merges command-line overrides into it.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cli::Args;

pub const CONFIG_FILE: &str = "rentscope.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Input data files.
    #[serde(default)]
    pub data: DataConfig,

    /// Default selections of the pages.
    #[serde(default)]
    pub view: ViewConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_rent_file")]
    pub rent_file: PathBuf,

    #[serde(default = "default_salary_file")]
    pub salary_file: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            rent_file: default_rent_file(),
            salary_file: default_salary_file(),
        }
    }
}

fn default_rent_file() -> PathBuf {
    PathBuf::from("data/processed/miete_processed.xlsx")
}

fn default_salary_file() -> PathBuf {
    PathBuf::from("data/processed/monthly_salary_processed.xlsx")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    #[serde(default = "default_change_from_year")]
    pub change_from_year: i32,

    #[serde(default = "default_change_to_year")]
    pub change_to_year: i32,

    /// Cantons preselected on the price trends page.
    #[serde(default = "default_canton_count")]
    pub default_canton_count: usize,

    #[serde(default)]
    pub normalize: bool,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            change_from_year: default_change_from_year(),
            change_to_year: default_change_to_year(),
            default_canton_count: default_canton_count(),
            normalize: false,
        }
    }
}

fn default_change_from_year() -> i32 {
    2019
}

fn default_change_to_year() -> i32 {
    2022
}

fn default_canton_count() -> usize {
    5
}

impl Config {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Explicit `--config` file, else `rentscope.toml` if present, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_from_file(path),
            None => {
                let local = Path::new(CONFIG_FILE);
                if local.exists() {
                    Self::load_from_file(local)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn merge_with_args(&mut self, args: &Args) {
        if let Some(path) = &args.rent_file {
            self.data.rent_file = path.clone();
        }
        if let Some(path) = &args.salary_file {
            self.data.salary_file = path.clone();
        }
        if let Some(year) = args.from_year {
            self.view.change_from_year = year;
        }
        if let Some(year) = args.to_year {
            self.view.change_to_year = year;
        }
        if args.normalize {
            self.view.normalize = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.view.change_from_year, 2019);
        assert_eq!(config.view.change_to_year, 2022);
        assert_eq!(config.view.default_canton_count, 5);
        assert!(config.data.rent_file.ends_with("miete_processed.xlsx"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [data]
            rent_file = "rent.csv"

            [view]
            change_from_year = 2015
            "#,
        )
        .unwrap();
        assert_eq!(config.data.rent_file, PathBuf::from("rent.csv"));
        assert!(config.data.salary_file.ends_with("monthly_salary_processed.xlsx"));
        assert_eq!(config.view.change_from_year, 2015);
        assert_eq!(config.view.change_to_year, 2022);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[view]\ndefault_canton_count = 3\nnormalize = true").unwrap();
        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.view.default_canton_count, 3);
        assert!(config.view.normalize);
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[view\nnormalize = ").unwrap();
        assert!(Config::load_from_file(file.path()).is_err());
    }

    #[test]
    fn test_args_override_config() {
        let args = Args::try_parse_from([
            "rentscope",
            "--rent-file",
            "miete.csv",
            "--from-year",
            "2010",
            "--normalize",
        ])
        .unwrap();
        let mut config = Config::default();
        config.merge_with_args(&args);
        assert_eq!(config.data.rent_file, PathBuf::from("miete.csv"));
        assert_eq!(config.view.change_from_year, 2010);
        assert_eq!(config.view.change_to_year, 2022);
        assert!(config.view.normalize);
    }
}
