//! Survey Data Loader Module
//! Reads the rent and salary spreadsheets (xlsx/xls/ods via calamine, CSV via
//! Polars) and memoizes each cleaned table on first access.

use calamine::{open_workbook_auto, Data, Reader};
use once_cell::sync::OnceCell;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use super::processor::parse_price_text;
use super::schema::ColumnRole;
use super::tables::{RentTable, SalaryTable};

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Data file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Unsupported data file type: {}", .0.display())]
    UnsupportedFormat(PathBuf),
    #[error("Failed to read workbook {}: {source}", .path.display())]
    Workbook {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },
    #[error("No worksheet with a header row in {}", .0.display())]
    EmptySheet(PathBuf),
    #[error("Failed to load table: {0}")]
    Polars(#[from] PolarsError),
    #[error("Column '{column}' missing from {} (found: {})", .path.display(), .found.join(", "))]
    SchemaMismatch {
        path: PathBuf,
        column: String,
        found: Vec<String>,
    },
    #[error(transparent)]
    Integrity(#[from] DataIntegrityError),
}

/// A value the downstream joins rely on is absent or malformed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataIntegrityError {
    #[error("Invalid or missing value '{value}' in column '{column}' at row {row}")]
    InvalidValue {
        column: String,
        /// 1-based data row (header excluded).
        row: usize,
        value: String,
    },
    #[error("Duplicate record for canton '{canton}' in year {year}")]
    DuplicateRecord { canton: String, year: i32 },
}

/// A table built from a raw spreadsheet frame.
pub trait SurveyTable: Sized {
    const KIND: &'static str;

    fn from_frame(raw: DataFrame, source: &Path) -> Result<Self, LoadError>;
}

/// Loads one survey table lazily and keeps it for the rest of the session.
pub struct TableLoader<T> {
    path: PathBuf,
    cache: OnceCell<T>,
}

pub type RentLoader = TableLoader<RentTable>;
pub type SalaryLoader = TableLoader<SalaryTable>;

impl<T: SurveyTable> TableLoader<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: OnceCell::new(),
        }
    }

    /// Read, validate and clean the table on first call; later calls return
    /// the cached table.
    pub fn load(&self) -> Result<&T, LoadError> {
        self.cache.get_or_try_init(|| {
            info!("Loading {} table from {}", T::KIND, self.path.display());
            let raw = read_table(&self.path)?;
            debug!(
                "Read {} rows x {} columns from {}",
                raw.height(),
                raw.width(),
                self.path.display()
            );
            T::from_frame(raw, &self.path)
        })
    }
}

/// Read a spreadsheet into a raw DataFrame, picking the reader by extension.
pub fn read_table(path: &Path) -> Result<DataFrame, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("csv") => read_csv(path),
        Some("xlsx" | "xlsm" | "xlsb" | "xls" | "ods") => read_workbook(path),
        _ => Err(LoadError::UnsupportedFormat(path.to_path_buf())),
    }
}

fn read_csv(path: &Path) -> Result<DataFrame, LoadError> {
    let path_str = path.to_string_lossy().to_string();

    let df = LazyCsvReader::new(&path_str)
        .with_infer_schema_length(Some(10000))
        .finish()?
        .collect()?;

    Ok(df)
}

static EMPTY_CELL: Data = Data::Empty;

/// Read the first worksheet; its first row is the header.
fn read_workbook(path: &Path) -> Result<DataFrame, LoadError> {
    let workbook_error = |source: calamine::Error| LoadError::Workbook {
        path: path.to_path_buf(),
        source,
    };

    let mut workbook = open_workbook_auto(path).map_err(workbook_error)?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| LoadError::EmptySheet(path.to_path_buf()))?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(workbook_error)?;

    let mut rows = range.rows();
    let header = rows
        .next()
        .ok_or_else(|| LoadError::EmptySheet(path.to_path_buf()))?;
    let names: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(idx, cell)| match cell.to_string().trim() {
            "" => format!("column_{}", idx + 1),
            name => name.to_string(),
        })
        .collect();

    // Blank trailing rows are common in exported sheets
    let body: Vec<&[Data]> = rows
        .filter(|row| row.iter().any(|cell| !matches!(cell, Data::Empty)))
        .collect();

    let columns: Vec<Column> = names
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let cells: Vec<&Data> = body
                .iter()
                .map(|row| row.get(idx).unwrap_or(&EMPTY_CELL))
                .collect();
            sheet_column(name, &cells)
        })
        .collect();

    Ok(DataFrame::new(columns)?)
}

/// Build a column from one worksheet column.
///
/// Price-like columns are always Float64: numeric cells keep their value and
/// only text cells go through currency stripping. Other columns are Float64
/// when every non-empty cell is numeric, String otherwise.
fn sheet_column(name: &str, cells: &[&Data]) -> Column {
    if ColumnRole::of(name).is_price() {
        let values: Vec<Option<f64>> = cells.iter().map(|cell| sheet_price(cell)).collect();
        return Column::new(name.into(), values);
    }

    let all_numeric = cells
        .iter()
        .all(|cell| matches!(cell, Data::Int(_) | Data::Float(_) | Data::Empty));

    if all_numeric {
        let values: Vec<Option<f64>> = cells
            .iter()
            .map(|cell| match cell {
                Data::Int(i) => Some(*i as f64),
                Data::Float(f) => Some(*f),
                _ => None,
            })
            .collect();
        Column::new(name.into(), values)
    } else {
        let values: Vec<Option<String>> = cells
            .iter()
            .map(|cell| match cell {
                Data::Empty => None,
                other => Some(other.to_string()),
            })
            .collect();
        Column::new(name.into(), values)
    }
}

/// Booleans count as 0/1; errors, dates and blanks are missing.
fn sheet_price(cell: &Data) -> Option<f64> {
    match cell {
        Data::Int(i) => Some(*i as f64),
        Data::Float(f) => Some(*f).filter(|v| v.is_finite()),
        Data::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Data::String(text) => parse_price_text(text),
        _ => None,
    }
}

/// Session-wide access to both survey tables. Built once in `main` and
/// passed by reference; each table is read on first use and never mutated.
pub struct DataStore {
    rent: RentLoader,
    salary: SalaryLoader,
}

impl DataStore {
    pub fn new(rent_path: impl Into<PathBuf>, salary_path: impl Into<PathBuf>) -> Self {
        Self {
            rent: RentLoader::new(rent_path),
            salary: SalaryLoader::new(salary_path),
        }
    }

    pub fn rent(&self) -> Result<&RentTable, LoadError> {
        self.rent.load()
    }

    pub fn salary(&self) -> Result<&SalaryTable, LoadError> {
        self.salary.load()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataProcessor;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn csv_file(content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    const RENT_CSV: &str = "Kanton,Region,Year,Total AVG Price,Price pre-1919,Intervall <1000\n\
Zürich,Zurich,2019,\"1'500\",1400,12\n\
Zürich,Zurich,2022,1600,n/a,10\n\
Bern,Espace Mittelland,2019,1200,\"CHF 1,100\",20\n";

    const SALARY_CSV: &str = "Region,Year,Gross Salary\n\
Zurich,2019,7000\n\
Zurich,2022,7200\n";

    #[test]
    fn test_missing_file_is_not_found() {
        let err = read_table(Path::new("/nonexistent/miete.xlsx")).unwrap_err();
        assert!(matches!(err, LoadError::NotFound(_)));
    }

    #[test]
    fn test_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        let err = read_table(file.path()).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_rent_loader_coerces_prices() {
        let file = csv_file(RENT_CSV);
        let loader = RentLoader::new(file.path());
        let table = loader.load().unwrap();

        assert_eq!(table.len(), 3);
        let first = &table.records()[0];
        assert_eq!(first.canton, "Zürich");
        assert_eq!(first.total_avg_price, Some(1500.0));
        assert_eq!(table.records()[1].period_prices[0].price, None);
        assert_eq!(table.records()[2].period_prices[0].price, Some(1100.0));

        for name in &table.schema().price_columns {
            assert_eq!(table.frame().column(name).unwrap().dtype(), &DataType::Float64);
        }
    }

    #[test]
    fn test_loader_memoizes() {
        let file = csv_file(RENT_CSV);
        let loader = RentLoader::new(file.path());
        let first = loader.load().unwrap() as *const RentTable;
        drop(file);
        // the file is gone, so a second read would fail
        let second = loader.load().unwrap() as *const RentTable;
        assert_eq!(first, second);
    }

    #[test]
    fn test_salary_loader_rejects_non_numeric() {
        let file = csv_file("Region,Year,Gross Salary\nZurich,2019,7000\nZurich,2022,unknown\n");
        let loader = SalaryLoader::new(file.path());
        let err = loader.load().unwrap_err();
        assert!(matches!(
            err,
            LoadError::Integrity(DataIntegrityError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_salary_schema_mismatch() {
        let file = csv_file("Region,Jahr,Gross Salary\nZurich,2019,7000\n");
        let err = SalaryLoader::new(file.path()).load().unwrap_err();
        assert!(matches!(err, LoadError::SchemaMismatch { ref column, .. } if column == "Year"));
    }

    #[test]
    fn test_data_store_loads_both_tables() {
        let rent = csv_file(RENT_CSV);
        let salary = csv_file(SALARY_CSV);
        let store = DataStore::new(rent.path(), salary.path());
        assert_eq!(store.rent().unwrap().len(), 3);
        assert_eq!(store.salary().unwrap().len(), 2);
    }

    #[test]
    fn test_sheet_column_types() {
        let cells = [Data::Int(2019), Data::Empty, Data::Float(1500.5)];
        let refs: Vec<&Data> = cells.iter().collect();
        let column = sheet_column("Year", &refs);
        assert_eq!(column.dtype(), &DataType::Float64);
        assert_eq!(column.null_count(), 1);

        let cells = [Data::String("A".to_string()), Data::Int(3)];
        let refs: Vec<&Data> = cells.iter().collect();
        let column = sheet_column("Kanton", &refs);
        assert_eq!(column.dtype(), &DataType::String);
    }

    #[test]
    fn test_mixed_price_column_keeps_numeric_cells() {
        let cells = [
            Data::String("1'500".to_string()),
            Data::Float(-50.0),
            Data::Int(1200),
            Data::Bool(true),
            Data::String("n/a".to_string()),
            Data::Empty,
        ];
        let refs: Vec<&Data> = cells.iter().collect();
        let column = sheet_column("Intervall <1000", &refs);
        assert_eq!(column.dtype(), &DataType::Float64);

        let values: Vec<Option<f64>> = column.f64().unwrap().into_iter().collect();
        assert_eq!(
            values,
            vec![Some(1500.0), Some(-50.0), Some(1200.0), Some(1.0), None, None]
        );

        // the cleaned column passes through price coercion unchanged
        let coerced = DataProcessor::coerce_price_column(&column).unwrap();
        let values: Vec<Option<f64>> = coerced.f64().unwrap().into_iter().collect();
        assert_eq!(values[1], Some(-50.0));
    }
}
