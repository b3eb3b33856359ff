//! Derived Metrics Module
//! Turns the cleaned rent and salary tables into the views shown per page.

use polars::prelude::PolarsError;
use rayon::prelude::*;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use thiserror::Error;
use tracing::debug;

use super::calculator::{ColumnSummary, StatsCalculator};
use crate::data::schema::{self, period_label};
use crate::data::{DataProcessor, RentRecord, RentTable, SalaryTable};

#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("No data: {0}")]
    NoData(String),
    #[error("No gross salary for region '{region}' in {year}")]
    MissingValue { region: String, year: i32 },
    #[error("Table error: {0}")]
    Polars(#[from] PolarsError),
}

/// Price change of one canton between two survey years.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CantonPriceChange {
    pub canton: String,
    pub price_from: Option<f64>,
    pub price_to: Option<f64>,
    pub change: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceExtreme {
    pub canton: String,
    pub region: String,
    pub year: i32,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceExtremes {
    pub highest: PriceExtreme,
    pub lowest: PriceExtreme,
}

/// One rent row joined with the salary of its region in the same year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub year: i32,
    pub region: String,
    pub canton: String,
    pub rent: Option<f64>,
    pub salary: f64,
    pub rent_scaled: Option<f64>,
    pub salary_scaled: Option<f64>,
}

/// Per-year averages of the joined rows of one region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearlyComparison {
    pub year: i32,
    pub rent: Option<f64>,
    pub salary: f64,
    pub rent_scaled: Option<f64>,
    pub salary_scaled: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RentSalaryComparison {
    pub region: String,
    pub normalized: bool,
    pub rows: Vec<ComparisonRow>,
    pub yearly: Vec<YearlyComparison>,
    pub start_year: i32,
    pub end_year: i32,
    pub rent_increase: f64,
    pub salary_increase: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionIncrease {
    pub region: String,
    pub increase: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionalGrowth {
    pub start_year: i32,
    pub end_year: i32,
    pub increases: Vec<RegionIncrease>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub year: i32,
    pub value: Option<f64>,
}

/// A named yearly series (canton rent trend, region salary trend).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trend {
    pub name: String,
    pub points: Vec<SeriesPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodAverage {
    pub period: String,
    pub average: f64,
}

/// Descending order, missing values last; equal keys keep their order when
/// used with a stable sort.
fn descending_missing_last(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn distinct_in_order<'a>(labels: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    labels
        .filter(|label| seen.insert(*label))
        .map(str::to_string)
        .collect()
}

/// Read-only computations over the two loaded tables.
pub struct MetricsEngine<'a> {
    rent: &'a RentTable,
    salary: &'a SalaryTable,
}

impl<'a> MetricsEngine<'a> {
    pub fn new(rent: &'a RentTable, salary: &'a SalaryTable) -> Self {
        Self { rent, salary }
    }

    /// `price(year_to) - price(year_from)` for every canton present in both
    /// years, largest increase first. Cantons missing a year are left out.
    pub fn price_change_by_canton(&self, year_from: i32, year_to: i32) -> Vec<CantonPriceChange> {
        let later: HashMap<&str, &RentRecord> = self
            .rent
            .records()
            .iter()
            .filter(|r| r.year == year_to)
            .map(|r| (r.canton.as_str(), r))
            .collect();

        let mut changes: Vec<CantonPriceChange> = self
            .rent
            .records()
            .iter()
            .filter(|r| r.year == year_from)
            .filter_map(|earlier| {
                let later = later.get(earlier.canton.as_str())?;
                let change = match (earlier.total_avg_price, later.total_avg_price) {
                    (Some(from), Some(to)) => Some(to - from),
                    _ => None,
                };
                Some(CantonPriceChange {
                    canton: earlier.canton.clone(),
                    price_from: earlier.total_avg_price,
                    price_to: later.total_avg_price,
                    change,
                })
            })
            .collect();

        changes.sort_by(|a, b| descending_missing_last(a.change, b.change));
        debug!(
            "Price change {} -> {}: {} cantons",
            year_from,
            year_to,
            changes.len()
        );
        changes
    }

    /// Highest and lowest total average price over all cantons and years.
    /// Ties go to the row that comes first in the table.
    pub fn price_extremes(&self) -> Result<PriceExtremes, MetricsError> {
        let mut highest: Option<(&RentRecord, f64)> = None;
        let mut lowest: Option<(&RentRecord, f64)> = None;

        for record in self.rent.records() {
            let Some(price) = record.total_avg_price else {
                continue;
            };
            if highest.map_or(true, |(_, max)| price > max) {
                highest = Some((record, price));
            }
            if lowest.map_or(true, |(_, min)| price < min) {
                lowest = Some((record, price));
            }
        }

        let extreme = |(record, price): (&RentRecord, f64)| PriceExtreme {
            canton: record.canton.clone(),
            region: record.region.clone(),
            year: record.year,
            price,
        };

        match (highest, lowest) {
            (Some(high), Some(low)) => Ok(PriceExtremes {
                highest: extreme(high),
                lowest: extreme(low),
            }),
            _ => Err(MetricsError::NoData(
                "the rent table has no average prices".to_string(),
            )),
        }
    }

    /// Rent rows joined with salaries on (year, region), in rent table order.
    fn join_rent_salary(&self) -> Vec<ComparisonRow> {
        let mut salaries: HashMap<(&str, i32), Vec<f64>> = HashMap::new();
        for record in self.salary.records() {
            salaries
                .entry((record.region.as_str(), record.year))
                .or_default()
                .push(record.gross_salary);
        }

        self.rent
            .records()
            .iter()
            .flat_map(|rent| {
                salaries
                    .get(&(rent.region.as_str(), rent.year))
                    .into_iter()
                    .flatten()
                    .map(move |&salary| ComparisonRow {
                        year: rent.year,
                        region: rent.region.clone(),
                        canton: rent.canton.clone(),
                        rent: rent.total_avg_price,
                        salary,
                        rent_scaled: None,
                        salary_scaled: None,
                    })
            })
            .collect()
    }

    /// Regions that have both rent and salary data, in join order.
    pub fn comparison_regions(&self) -> Vec<String> {
        let rows = self.join_rent_salary();
        distinct_in_order(rows.iter().map(|r| r.region.as_str()))
    }

    /// Rent against salary for one region. With `normalize`, both series are
    /// min-max scaled over the whole joined table before the region is
    /// selected. Growth rates always use the raw yearly averages.
    pub fn rent_salary_comparison(
        &self,
        region: &str,
        normalize: bool,
    ) -> Result<RentSalaryComparison, MetricsError> {
        let mut joined = self.join_rent_salary();

        if normalize {
            let rents: Vec<Option<f64>> = joined.iter().map(|r| r.rent).collect();
            let salaries: Vec<Option<f64>> = joined.iter().map(|r| Some(r.salary)).collect();
            let rents = StatsCalculator::min_max_scale(&rents);
            let salaries = StatsCalculator::min_max_scale(&salaries);
            for ((row, rent), salary) in joined.iter_mut().zip(rents).zip(salaries) {
                row.rent_scaled = rent;
                row.salary_scaled = salary;
            }
        }

        let rows: Vec<ComparisonRow> = joined.into_iter().filter(|r| r.region == region).collect();
        if rows.is_empty() {
            return Err(MetricsError::NoData(format!(
                "no rent and salary figures for region '{region}'"
            )));
        }

        let mut by_year: BTreeMap<i32, Vec<&ComparisonRow>> = BTreeMap::new();
        for row in &rows {
            by_year.entry(row.year).or_default().push(row);
        }

        let yearly: Vec<YearlyComparison> = by_year
            .iter()
            .map(|(&year, group)| YearlyComparison {
                year,
                rent: StatsCalculator::mean_present(group.iter().map(|r| r.rent)),
                salary: group.iter().map(|r| r.salary).sum::<f64>() / group.len() as f64,
                rent_scaled: StatsCalculator::mean_present(group.iter().map(|r| r.rent_scaled)),
                salary_scaled: StatsCalculator::mean_present(
                    group.iter().map(|r| r.salary_scaled),
                ),
            })
            .collect();

        // `rows` is non-empty, so `yearly` has a first and last entry
        let (first, last) = match (yearly.first(), yearly.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => {
                return Err(MetricsError::NoData(format!(
                    "no years recorded for region '{region}'"
                )))
            }
        };

        let growth = |start: Option<f64>, end: Option<f64>, metric: &str| {
            start
                .zip(end)
                .and_then(|(s, e)| StatsCalculator::percent_increase(s, e))
                .ok_or_else(|| {
                    MetricsError::NoData(format!(
                        "{metric} for region '{region}' is missing or zero in {} or {}",
                        first.year, last.year
                    ))
                })
        };
        let rent_increase = growth(first.rent, last.rent, "average rent")?;
        let salary_increase = growth(Some(first.salary), Some(last.salary), "gross salary")?;

        debug!(
            "Rent vs salary for {}: {} rows over {} years",
            region,
            rows.len(),
            yearly.len()
        );

        Ok(RentSalaryComparison {
            region: region.to_string(),
            normalized: normalize,
            start_year: first.year,
            end_year: last.year,
            rent_increase,
            salary_increase,
            rows,
            yearly,
        })
    }

    /// Salary growth of every region between the first and last survey year
    /// of the whole salary table, largest increase first.
    pub fn regional_salary_growth(&self) -> Result<RegionalGrowth, MetricsError> {
        let records = self.salary.records();
        let years = records.iter().map(|r| r.year);
        let (start_year, end_year) = match (years.clone().min(), years.max()) {
            (Some(start), Some(end)) => (start, end),
            _ => {
                return Err(MetricsError::NoData(
                    "the salary table is empty".to_string(),
                ))
            }
        };

        let lookup = |region: &str, year: i32| {
            records
                .iter()
                .find(|r| r.region == region && r.year == year)
                .map(|r| r.gross_salary)
                .ok_or_else(|| MetricsError::MissingValue {
                    region: region.to_string(),
                    year,
                })
        };

        let regions = distinct_in_order(records.iter().map(|r| r.region.as_str()));
        let results: Vec<Result<RegionIncrease, MetricsError>> = regions
            .par_iter()
            .map(|region| {
                let start = lookup(region, start_year)?;
                let end = lookup(region, end_year)?;
                let increase = StatsCalculator::percent_increase(start, end).ok_or_else(|| {
                    MetricsError::MissingValue {
                        region: region.clone(),
                        year: start_year,
                    }
                })?;
                Ok(RegionIncrease {
                    region: region.clone(),
                    increase,
                })
            })
            .collect();

        let mut increases = results.into_iter().collect::<Result<Vec<_>, _>>()?;
        increases.sort_by(|a, b| descending_missing_last(Some(a.increase), Some(b.increase)));

        Ok(RegionalGrowth {
            start_year,
            end_year,
            increases,
        })
    }

    /// Cantons in order of first appearance.
    pub fn cantons(&self) -> Vec<String> {
        distinct_in_order(self.rent.records().iter().map(|r| r.canton.as_str()))
    }

    /// Distinct survey years of the rent table, ascending.
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.rent.records().iter().map(|r| r.year).collect();
        years.sort_unstable();
        years.dedup();
        years
    }

    /// Yearly total average price of each requested canton.
    pub fn canton_price_trends(&self, cantons: &[String]) -> Vec<Trend> {
        cantons
            .iter()
            .map(|canton| {
                let mut points: Vec<SeriesPoint> = self
                    .rent
                    .records()
                    .iter()
                    .filter(|r| &r.canton == canton)
                    .map(|r| SeriesPoint {
                        year: r.year,
                        value: r.total_avg_price,
                    })
                    .collect();
                points.sort_by_key(|p| p.year);
                Trend {
                    name: canton.clone(),
                    points,
                }
            })
            .collect()
    }

    /// Mean price per construction period over all rows, highest first.
    pub fn construction_period_averages(&self) -> Vec<PeriodAverage> {
        let columns = &self.rent.schema().period_columns;
        let mut averages: Vec<PeriodAverage> = columns
            .iter()
            .enumerate()
            .filter_map(|(idx, column)| {
                let values = self
                    .rent
                    .records()
                    .iter()
                    .map(|r| r.period_prices.get(idx).and_then(|p| p.price));
                StatsCalculator::mean_present(values).map(|average| PeriodAverage {
                    period: period_label(column).to_string(),
                    average,
                })
            })
            .collect();

        averages.sort_by(|a, b| descending_missing_last(Some(a.average), Some(b.average)));
        averages
    }

    /// Descriptive statistics of every numeric column of the rent table.
    pub fn describe(&self) -> Result<Vec<ColumnSummary>, MetricsError> {
        let frame = self.rent.frame();
        let columns: Vec<String> = frame
            .get_columns()
            .iter()
            .filter(|c| {
                c.name().as_str() == schema::YEAR || DataProcessor::is_numeric_column(c)
            })
            .map(|c| c.name().to_string())
            .collect();

        let summaries = columns
            .par_iter()
            .map(|name| -> Result<ColumnSummary, MetricsError> {
                let values: Vec<Option<f64>> = if name == schema::YEAR {
                    self.rent
                        .records()
                        .iter()
                        .map(|r| Some(r.year as f64))
                        .collect()
                } else {
                    DataProcessor::optional_numbers(frame, name)?
                };
                Ok(StatsCalculator::summarize(name, &values))
            })
            .collect::<Result<Vec<_>, MetricsError>>()?;

        Ok(summaries)
    }

    /// Yearly gross salary of every region, regions in order of appearance.
    pub fn salary_trends(&self) -> Vec<Trend> {
        let records = self.salary.records();
        distinct_in_order(records.iter().map(|r| r.region.as_str()))
            .into_iter()
            .map(|region| {
                let mut points: Vec<SeriesPoint> = records
                    .iter()
                    .filter(|r| r.region == region)
                    .map(|r| SeriesPoint {
                        year: r.year,
                        value: Some(r.gross_salary),
                    })
                    .collect();
                points.sort_by_key(|p| p.year);
                Trend {
                    name: region,
                    points,
                }
            })
            .collect()
    }
}
