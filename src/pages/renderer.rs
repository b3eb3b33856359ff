//! Page Renderer
//! Prints a computed page as plain-text tables or JSON.

use std::fmt::Write;

use super::{PageView, Section};
use crate::cli::OutputFormat;
use crate::stats::{ColumnSummary, Trend};

pub struct PageRenderer;

fn money(value: Option<f64>) -> String {
    value
        .map(|v| format!("{v:.2}"))
        .unwrap_or_else(|| "-".to_string())
}

fn stat(value: f64) -> String {
    if value.is_finite() {
        format!("{value:.2}")
    } else {
        "-".to_string()
    }
}

impl PageRenderer {
    pub fn render(view: &PageView, format: OutputFormat) -> serde_json::Result<String> {
        match format {
            OutputFormat::Text => Ok(Self::render_text(view)),
            OutputFormat::Json => serde_json::to_string_pretty(view),
        }
    }

    pub fn render_text(view: &PageView) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", view.title);
        let _ = writeln!(out, "{}", "=".repeat(view.title.chars().count()));

        for section in &view.sections {
            out.push('\n');
            Self::render_section(&mut out, section);
        }
        out
    }

    fn heading(out: &mut String, text: &str) {
        let _ = writeln!(out, "{text}");
        let _ = writeln!(out, "{}", "-".repeat(text.chars().count()));
    }

    fn render_section(out: &mut String, section: &Section) {
        match section {
            Section::PriceChange {
                from_year,
                to_year,
                changes,
            } => {
                Self::heading(
                    out,
                    &format!("Price Change from {from_year} to {to_year} by Canton"),
                );
                let _ = writeln!(
                    out,
                    "{:<24} {:>10} {:>10} {:>12}",
                    "Canton", from_year, to_year, "Change (CHF)"
                );
                for c in changes {
                    let _ = writeln!(
                        out,
                        "{:<24} {:>10} {:>10} {:>12}",
                        c.canton,
                        money(c.price_from),
                        money(c.price_to),
                        money(c.change)
                    );
                }
            }
            Section::PriceExtremes(extremes) => {
                Self::heading(out, "Highest vs Lowest Average Rent");
                for (label, e) in [("Highest", &extremes.highest), ("Lowest", &extremes.lowest)] {
                    let _ = writeln!(
                        out,
                        "{:<8} {:>10.2} CHF  {} ({})",
                        label, e.price, e.canton, e.year
                    );
                }
            }
            Section::Describe { columns } => {
                Self::heading(out, "Descriptive Statistics");
                Self::render_describe(out, columns);
            }
            Section::CantonTrends { trends } => {
                Self::heading(out, "Rental Price Trends by Canton");
                Self::render_trends(out, trends);
            }
            Section::PeriodAverages { averages } => {
                Self::heading(out, "Average Rental Prices by Construction Period");
                for a in averages {
                    let _ = writeln!(out, "{:<24} {:>10.2}", a.period, a.average);
                }
            }
            Section::Comparison(c) => {
                let title = if c.normalized {
                    format!("Rent vs Salary Trends in {} (normalized)", c.region)
                } else {
                    format!("Rent vs Salary Trends in {}", c.region)
                };
                Self::heading(out, &title);
                let _ = writeln!(out, "{:<6} {:>12} {:>12}", "Year", "Rent", "Salary");
                for y in &c.yearly {
                    let (rent, salary) = if c.normalized {
                        (y.rent_scaled, y.salary_scaled)
                    } else {
                        (y.rent, Some(y.salary))
                    };
                    let _ = writeln!(out, "{:<6} {:>12} {:>12}", y.year, money(rent), money(salary));
                }
                let _ = writeln!(
                    out,
                    "\nRent increase from {} to {}: {:.2}%",
                    c.start_year, c.end_year, c.rent_increase
                );
                let _ = writeln!(
                    out,
                    "Salary increase from {} to {}: {:.2}%",
                    c.start_year, c.end_year, c.salary_increase
                );
            }
            Section::SalaryTrends { trends } => {
                Self::heading(out, "Salary Trends Across Regions");
                Self::render_trends(out, trends);
            }
            Section::RegionalGrowth(growth) => {
                Self::heading(
                    out,
                    &format!(
                        "Salary increases from {} to {} by region",
                        growth.start_year, growth.end_year
                    ),
                );
                for r in &growth.increases {
                    let _ = writeln!(out, "{:<24} {:>8.2}%", r.region, r.increase);
                }
            }
            Section::NoData { heading, message } => {
                Self::heading(out, heading);
                let _ = writeln!(out, "No data available: {message}");
            }
        }
    }

    fn render_trends(out: &mut String, trends: &[Trend]) {
        for trend in trends {
            let points: Vec<String> = trend
                .points
                .iter()
                .map(|p| format!("{}: {}", p.year, money(p.value)))
                .collect();
            if points.is_empty() {
                let _ = writeln!(out, "{:<24} (no data)", trend.name);
            } else {
                let _ = writeln!(out, "{:<24} {}", trend.name, points.join(", "));
            }
        }
    }

    fn render_describe(out: &mut String, columns: &[ColumnSummary]) {
        let _ = writeln!(
            out,
            "{:<24} {:>6} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
            "", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
        );
        for s in columns {
            let _ = writeln!(
                out,
                "{:<24} {:>6} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
                s.column,
                s.count,
                stat(s.mean),
                stat(s.std),
                stat(s.min),
                stat(s.p25),
                stat(s.p50),
                stat(s.p75),
                stat(s.max)
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{RegionIncrease, RegionalGrowth, RentSalaryComparison, YearlyComparison};

    fn comparison() -> RentSalaryComparison {
        RentSalaryComparison {
            region: "Zurich".to_string(),
            normalized: false,
            rows: Vec::new(),
            yearly: vec![
                YearlyComparison {
                    year: 2010,
                    rent: Some(1500.0),
                    salary: 6000.0,
                    rent_scaled: None,
                    salary_scaled: None,
                },
                YearlyComparison {
                    year: 2022,
                    rent: Some(1800.0),
                    salary: 7200.0,
                    rent_scaled: None,
                    salary_scaled: None,
                },
            ],
            start_year: 2010,
            end_year: 2022,
            rent_increase: 20.0,
            salary_increase: 19.999999999999996,
        }
    }

    #[test]
    fn test_comparison_text_shows_percentages() {
        let view = PageView {
            title: "Salary vs Rent Comparison".to_string(),
            sections: vec![Section::Comparison(comparison())],
        };
        let text = PageRenderer::render_text(&view);
        assert!(text.contains("Rent increase from 2010 to 2022: 20.00%"));
        assert!(text.contains("Salary increase from 2010 to 2022: 20.00%"));
    }

    #[test]
    fn test_no_data_text_never_prints_nan() {
        let view = PageView {
            title: "Salary vs Rent Comparison".to_string(),
            sections: vec![Section::NoData {
                heading: "Rent vs Salary Trends".to_string(),
                message: "no rent and salary figures for region 'Atlantis'".to_string(),
            }],
        };
        let text = PageRenderer::render_text(&view);
        assert!(text.contains("No data available"));
        assert!(!text.contains("nan"));
    }

    #[test]
    fn test_json_output_is_tagged() {
        let view = PageView {
            title: "Salary Trends Across Regions".to_string(),
            sections: vec![Section::RegionalGrowth(RegionalGrowth {
                start_year: 2010,
                end_year: 2022,
                increases: vec![RegionIncrease {
                    region: "Zurich".to_string(),
                    increase: 20.0,
                }],
            })],
        };
        let json = PageRenderer::render(&view, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["sections"][0]["kind"], "regional_growth");
        assert_eq!(value["sections"][0]["increases"][0]["region"], "Zurich");
    }

    #[test]
    fn test_missing_values_render_as_dash() {
        assert_eq!(money(None), "-");
        assert_eq!(stat(f64::NAN), "-");
        assert_eq!(money(Some(1500.0)), "1500.00");
    }
}
