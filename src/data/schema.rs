//! Column Schema Module
//! Fixed column names of the two survey tables and header validation.

use std::path::Path;

use super::loader::LoadError;

pub const CANTON: &str = "Kanton";
pub const YEAR: &str = "Year";
pub const REGION: &str = "Region";
pub const TOTAL_AVG_PRICE: &str = "Total AVG Price";
pub const GROSS_SALARY: &str = "Gross Salary";

/// Prefix of the per-construction-period price columns ("Price 1919-1945").
pub const PERIOD_PREFIX: &str = "Price";
pub const TOTAL_PREFIX: &str = "Total AVG";
pub const INTERVAL_PREFIX: &str = "Intervall";

/// What a rent table column carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    Total,
    Period,
    Interval,
    Other,
}

impl ColumnRole {
    pub fn of(name: &str) -> Self {
        if name.starts_with(TOTAL_PREFIX) {
            ColumnRole::Total
        } else if name.starts_with(PERIOD_PREFIX) {
            ColumnRole::Period
        } else if name.starts_with(INTERVAL_PREFIX) {
            ColumnRole::Interval
        } else {
            ColumnRole::Other
        }
    }

    /// Price-like columns get the lenient currency coercion.
    pub fn is_price(self) -> bool {
        !matches!(self, ColumnRole::Other)
    }
}

/// Header layout of a validated rent table.
#[derive(Debug, Clone, Default)]
pub struct RentSchema {
    pub price_columns: Vec<String>,
    pub period_columns: Vec<String>,
    pub interval_columns: Vec<String>,
}

impl RentSchema {
    pub const REQUIRED: [&'static str; 4] = [CANTON, YEAR, REGION, TOTAL_AVG_PRICE];

    pub fn from_columns(columns: &[String], source: &Path) -> Result<Self, LoadError> {
        require(columns, &Self::REQUIRED, source)?;

        let mut schema = RentSchema::default();
        for name in columns {
            let role = ColumnRole::of(name);
            if role.is_price() {
                schema.price_columns.push(name.clone());
            }
            match role {
                ColumnRole::Period => schema.period_columns.push(name.clone()),
                ColumnRole::Interval => schema.interval_columns.push(name.clone()),
                ColumnRole::Total | ColumnRole::Other => {}
            }
        }
        Ok(schema)
    }
}

pub struct SalarySchema;

impl SalarySchema {
    pub const REQUIRED: [&'static str; 3] = [REGION, YEAR, GROSS_SALARY];

    pub fn check(columns: &[String], source: &Path) -> Result<(), LoadError> {
        require(columns, &Self::REQUIRED, source)
    }
}

fn require(columns: &[String], required: &[&str], source: &Path) -> Result<(), LoadError> {
    match required
        .iter()
        .find(|name| !columns.iter().any(|c| c == *name))
    {
        Some(missing) => Err(LoadError::SchemaMismatch {
            path: source.to_path_buf(),
            column: missing.to_string(),
            found: columns.to_vec(),
        }),
        None => Ok(()),
    }
}

/// Strip the "Price " prefix to get the construction period label.
pub fn period_label(column: &str) -> &str {
    column
        .strip_prefix(PERIOD_PREFIX)
        .map(str::trim_start)
        .unwrap_or(column)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(cols: &[&str]) -> Vec<String> {
        cols.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_column_roles() {
        assert_eq!(ColumnRole::of("Total AVG Price"), ColumnRole::Total);
        assert_eq!(ColumnRole::of("Price pre-1919"), ColumnRole::Period);
        assert_eq!(ColumnRole::of("Intervall 1000-1500"), ColumnRole::Interval);
        assert_eq!(ColumnRole::of("Kanton"), ColumnRole::Other);
        assert!(!ColumnRole::Other.is_price());
    }

    #[test]
    fn test_rent_schema_groups_columns() {
        let cols = names(&[
            "Kanton",
            "Year",
            "Region",
            "Total AVG Price",
            "Price pre-1919",
            "Price 1919-1945",
            "Intervall <1000",
        ]);
        let schema = RentSchema::from_columns(&cols, Path::new("rent.csv")).unwrap();
        assert_eq!(schema.price_columns.len(), 4);
        assert_eq!(schema.period_columns, names(&["Price pre-1919", "Price 1919-1945"]));
        assert_eq!(schema.interval_columns, names(&["Intervall <1000"]));
    }

    #[test]
    fn test_missing_column_is_schema_mismatch() {
        let cols = names(&["Kanton", "Year", "Total AVG Price"]);
        let err = RentSchema::from_columns(&cols, Path::new("rent.csv")).unwrap_err();
        match err {
            LoadError::SchemaMismatch { column, .. } => assert_eq!(column, "Region"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_salary_schema() {
        let ok = names(&["Region", "Year", "Gross Salary"]);
        assert!(SalarySchema::check(&ok, Path::new("salary.csv")).is_ok());
        let bad = names(&["Region", "Year"]);
        assert!(SalarySchema::check(&bad, Path::new("salary.csv")).is_err());
    }

    #[test]
    fn test_period_label() {
        assert_eq!(period_label("Price 1919-1945"), "1919-1945");
        assert_eq!(period_label("Other"), "Other");
    }
}
