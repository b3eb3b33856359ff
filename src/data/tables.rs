//! Typed survey tables.

use polars::prelude::*;
use std::collections::HashSet;
use std::path::Path;

use super::loader::{DataIntegrityError, LoadError, SurveyTable};
use super::processor::DataProcessor;
use super::schema::{self, RentSchema, SalarySchema};

/// A price cell keyed by its column name ("Price 1919-1945", "Intervall <1000").
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledPrice {
    pub label: String,
    pub price: Option<f64>,
}

/// One row of the rent table: a canton in a given year.
#[derive(Debug, Clone, PartialEq)]
pub struct RentRecord {
    pub canton: String,
    pub region: String,
    pub year: i32,
    pub total_avg_price: Option<f64>,
    pub period_prices: Vec<LabeledPrice>,
    pub interval_prices: Vec<LabeledPrice>,
}

/// One row of the salary table: a region in a given year.
#[derive(Debug, Clone, PartialEq)]
pub struct SalaryRecord {
    pub region: String,
    pub year: i32,
    pub gross_salary: f64,
}

/// Cleaned rent table. Price-like columns of `frame` are Float64 with nulls
/// for values that could not be parsed.
#[derive(Debug, Clone)]
pub struct RentTable {
    frame: DataFrame,
    schema: RentSchema,
    records: Vec<RentRecord>,
}

impl RentTable {
    pub fn records(&self) -> &[RentRecord] {
        &self.records
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn schema(&self) -> &RentSchema {
        &self.schema
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn labeled_columns(
    frame: &DataFrame,
    columns: &[String],
) -> PolarsResult<Vec<(String, Vec<Option<f64>>)>> {
    columns
        .iter()
        .map(|name| Ok((name.clone(), DataProcessor::optional_numbers(frame, name)?)))
        .collect()
}

fn labeled_row(columns: &[(String, Vec<Option<f64>>)], row: usize) -> Vec<LabeledPrice> {
    columns
        .iter()
        .map(|(label, values)| LabeledPrice {
            label: label.clone(),
            price: values[row],
        })
        .collect()
}

impl SurveyTable for RentTable {
    const KIND: &'static str = "rent";

    fn from_frame(raw: DataFrame, source: &Path) -> Result<Self, LoadError> {
        let columns: Vec<String> = raw
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        let layout = RentSchema::from_columns(&columns, source)?;
        let frame = DataProcessor::clean_price_columns(raw, &layout.price_columns)?;

        let cantons = DataProcessor::required_labels(&frame, schema::CANTON)?;
        let regions = DataProcessor::required_labels(&frame, schema::REGION)?;
        let years = DataProcessor::required_years(&frame, schema::YEAR)?;
        let totals = DataProcessor::optional_numbers(&frame, schema::TOTAL_AVG_PRICE)?;
        let periods = labeled_columns(&frame, &layout.period_columns)?;
        let intervals = labeled_columns(&frame, &layout.interval_columns)?;

        let mut seen: HashSet<(String, i32)> = HashSet::with_capacity(frame.height());
        let mut records = Vec::with_capacity(frame.height());

        for (row, ((canton, region), year)) in cantons
            .into_iter()
            .zip(regions)
            .zip(years)
            .enumerate()
        {
            if !seen.insert((canton.clone(), year)) {
                return Err(DataIntegrityError::DuplicateRecord { canton, year }.into());
            }
            records.push(RentRecord {
                canton,
                region,
                year,
                total_avg_price: totals[row],
                period_prices: labeled_row(&periods, row),
                interval_prices: labeled_row(&intervals, row),
            });
        }

        Ok(Self {
            frame,
            schema: layout,
            records,
        })
    }
}

/// Cleaned salary table; `Year` and `Gross Salary` are complete.
#[derive(Debug, Clone)]
pub struct SalaryTable {
    frame: DataFrame,
    records: Vec<SalaryRecord>,
}

impl SalaryTable {
    pub fn records(&self) -> &[SalaryRecord] {
        &self.records
    }

    #[cfg(test)]
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl SurveyTable for SalaryTable {
    const KIND: &'static str = "salary";

    fn from_frame(raw: DataFrame, source: &Path) -> Result<Self, LoadError> {
        let columns: Vec<String> = raw
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        SalarySchema::check(&columns, source)?;

        let regions = DataProcessor::required_labels(&raw, schema::REGION)?;
        let years = DataProcessor::required_years(&raw, schema::YEAR)?;
        let salaries = DataProcessor::required_numbers(&raw, schema::GROSS_SALARY)?;

        let mut frame = raw;
        frame.with_column(Column::new(schema::YEAR.into(), years.clone()))?;
        DataProcessor::replace_with_numbers(&mut frame, schema::GROSS_SALARY, salaries.clone())?;

        let records = regions
            .into_iter()
            .zip(years)
            .zip(salaries)
            .map(|((region, year), gross_salary)| SalaryRecord {
                region,
                year,
                gross_salary,
            })
            .collect();

        Ok(Self { frame, records })
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_rent_records_follow_source_order() {
        let table = rent_table(&[
            ("Zürich", "Zurich", 2019, Some(1500.0)),
            ("Bern", "Espace Mittelland", 2019, None),
        ]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.records()[0].canton, "Zürich");
        assert_eq!(table.records()[1].total_avg_price, None);
    }

    #[test]
    fn test_every_price_is_numeric_or_missing() {
        let frame = DataFrame::new(vec![
            Column::new("Kanton".into(), vec!["Genf", "Genf", "Jura"]),
            Column::new("Region".into(), vec!["Genferseeregion"; 3]),
            Column::new("Year".into(), vec!["2010", "2011", "2010"]),
            Column::new("Total AVG Price".into(), vec!["1'800", "CHF 1850.5", "--"]),
            Column::new("Price pre-1919".into(), vec![Some("1,700"), None, Some("x")]),
        ])
        .unwrap();
        let table = RentTable::from_frame(frame, Path::new("rent.csv")).unwrap();

        let totals: Vec<Option<f64>> = table.records().iter().map(|r| r.total_avg_price).collect();
        assert_eq!(totals, vec![Some(1800.0), Some(1850.5), None]);
        for record in table.records() {
            for cell in &record.period_prices {
                assert!(cell.price.map_or(true, f64::is_finite));
            }
        }
        assert_eq!(table.records()[0].period_prices[0].price, Some(1700.0));
        assert_eq!(table.records()[2].period_prices[0].price, None);
    }

    #[test]
    fn test_duplicate_canton_year_is_rejected() {
        let frame = DataFrame::new(vec![
            Column::new("Kanton".into(), vec!["Bern", "Bern"]),
            Column::new("Region".into(), vec!["Espace Mittelland"; 2]),
            Column::new("Year".into(), vec![2019i32, 2019]),
            Column::new("Total AVG Price".into(), vec![1200.0, 1250.0]),
        ])
        .unwrap();
        let err = RentTable::from_frame(frame, Path::new("rent.csv")).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Integrity(DataIntegrityError::DuplicateRecord { year: 2019, .. })
        ));
    }

    #[test]
    fn test_salary_frame_is_numeric() {
        let frame = DataFrame::new(vec![
            Column::new("Region".into(), vec!["Zurich", "Zurich"]),
            Column::new("Year".into(), vec!["2010", "2022"]),
            Column::new("Gross Salary".into(), vec!["6000", "7200"]),
        ])
        .unwrap();
        let table = SalaryTable::from_frame(frame, Path::new("salary.csv")).unwrap();
        assert_eq!(table.records()[1].gross_salary, 7200.0);
        assert_eq!(table.frame().column("Year").unwrap().dtype(), &DataType::Int32);
        assert_eq!(
            table.frame().column("Gross Salary").unwrap().dtype(),
            &DataType::Float64
        );
    }

    #[test]
    fn test_salary_missing_year_is_fatal() {
        let frame = DataFrame::new(vec![
            Column::new("Region".into(), vec!["Zurich", "Zurich"]),
            Column::new("Year".into(), vec![Some(2010i64), None]),
            Column::new("Gross Salary".into(), vec![6000.0, 7200.0]),
        ])
        .unwrap();
        assert!(SalaryTable::from_frame(frame, Path::new("salary.csv")).is_err());
    }
}
