//! Command-line interface argument parsing.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::Level;

/// rentscope - Swiss rental price & salary survey explorer
///
/// Browse rent and salary statistics per canton and region (2010-2022).
///
/// Examples:
///   rentscope --page general-facts
///   rentscope --page price-trends --cantons Zürich,Bern,Genf
///   rentscope --page salary-rent --region Zurich --normalize
///   rentscope --page salary-trends --format json
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Page to show
    #[arg(short, long, value_enum, default_value = "general-facts")]
    pub page: Page,

    /// Rent table (xlsx, xls, ods or csv)
    #[arg(long, value_name = "FILE", env = "RENTSCOPE_RENT_FILE")]
    pub rent_file: Option<PathBuf>,

    /// Salary table (xlsx, xls, ods or csv)
    #[arg(long, value_name = "FILE", env = "RENTSCOPE_SALARY_FILE")]
    pub salary_file: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for rentscope.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Region for the salary/rent comparison (defaults to the first one)
    #[arg(short, long, value_name = "REGION")]
    pub region: Option<String>,

    /// Cantons for the price trends page (comma-separated)
    #[arg(long, value_name = "CANTONS", value_delimiter = ',')]
    pub cantons: Option<Vec<String>>,

    /// First year of the price change comparison
    #[arg(long, value_name = "YEAR")]
    pub from_year: Option<i32>,

    /// Second year of the price change comparison
    #[arg(long, value_name = "YEAR")]
    pub to_year: Option<i32>,

    /// Scale rent and salary to [0, 1] on the comparison page
    #[arg(long)]
    pub normalize: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Dashboard pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Page {
    GeneralFacts,
    PriceTrends,
    SalaryRent,
    SalaryTrends,
}

impl Page {
    pub fn title(self) -> &'static str {
        match self {
            Page::GeneralFacts => "Overview of Swiss Rental Prices 2010 - 2022",
            Page::PriceTrends => "Price Trends Over Years",
            Page::SalaryRent => "Salary vs Rent Comparison",
            Page::SalaryTrends => "Salary Trends Across Regions",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn log_level(&self) -> Level {
        if self.verbose {
            Level::DEBUG
        } else if self.quiet {
            Level::WARN
        } else {
            Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["rentscope"]).unwrap();
        assert_eq!(args.page, Page::GeneralFacts);
        assert_eq!(args.format, OutputFormat::Text);
        assert!(!args.normalize);
        assert_eq!(args.log_level(), Level::INFO);
    }

    #[test]
    fn test_page_and_cantons() {
        let args = Args::try_parse_from([
            "rentscope",
            "--page",
            "price-trends",
            "--cantons",
            "Zürich,Bern",
            "-v",
        ])
        .unwrap();
        assert_eq!(args.page, Page::PriceTrends);
        assert_eq!(
            args.cantons,
            Some(vec!["Zürich".to_string(), "Bern".to_string()])
        );
        assert_eq!(args.log_level(), Level::DEBUG);
    }

    #[test]
    fn test_verbose_and_quiet_conflict() {
        assert!(Args::try_parse_from(["rentscope", "-v", "-q"]).is_err());
    }

    #[test]
    fn test_unknown_page_rejected() {
        assert!(Args::try_parse_from(["rentscope", "--page", "settings"]).is_err());
    }
}
