//! Data Processor Module
//! Numeric coercion of raw survey columns and typed column extraction.

use polars::prelude::*;

use super::loader::{DataIntegrityError, LoadError};

/// Parse a currency-like cell ("CHF 1'520.50") by keeping only ASCII digits
/// and decimal points. Anything that still fails to parse becomes missing.
pub fn parse_price_text(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Strict numeric parse used for salary and year cells.
pub fn parse_strict_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Float32
            | DataType::Float64
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}

/// Handles column cleaning for the rent and salary tables.
pub struct DataProcessor;

impl DataProcessor {
    pub fn is_numeric_column(column: &Column) -> bool {
        is_numeric_dtype(column.dtype())
    }

    /// Coerce one price-like column to Float64, text cells via `parse_price_text`.
    pub fn coerce_price_column(column: &Column) -> PolarsResult<Column> {
        let name = column.name().clone();
        let values: Float64Chunked = if is_numeric_dtype(column.dtype()) {
            let as_f64 = column.cast(&DataType::Float64)?;
            as_f64
                .f64()?
                .into_iter()
                .map(|v| v.filter(|x| x.is_finite()))
                .collect()
        } else {
            let as_str = column.cast(&DataType::String)?;
            as_str
                .str()?
                .into_iter()
                .map(|cell| cell.and_then(parse_price_text))
                .collect()
        };

        Ok(Column::from(values.with_name(name).into_series()))
    }

    /// Replace every listed price column with its coerced Float64 version.
    pub fn clean_price_columns(
        mut df: DataFrame,
        price_columns: &[String],
    ) -> PolarsResult<DataFrame> {
        for name in price_columns {
            let cleaned = Self::coerce_price_column(df.column(name)?)?;
            df.with_column(cleaned)?;
        }
        Ok(df)
    }

    /// Numeric values of a column that must be complete. The first cell that
    /// is empty or not a number stops the load.
    pub fn required_numbers(df: &DataFrame, name: &str) -> Result<Vec<f64>, LoadError> {
        let column = df.column(name)?;

        let parsed: Vec<Option<f64>> = if is_numeric_dtype(column.dtype()) {
            let as_f64 = column.cast(&DataType::Float64)?;
            as_f64.f64()?.into_iter().collect()
        } else {
            let as_str = column.cast(&DataType::String)?;
            as_str
                .str()?
                .into_iter()
                .map(|cell| cell.and_then(parse_strict_number))
                .collect()
        };

        parsed
            .into_iter()
            .enumerate()
            .map(|(i, value)| match value {
                Some(v) if v.is_finite() => Ok(v),
                _ => Err(integrity_error(column, name, i)),
            })
            .collect()
    }

    /// Integral years of a column that must be complete.
    pub fn required_years(df: &DataFrame, name: &str) -> Result<Vec<i32>, LoadError> {
        let column = df.column(name)?;
        Self::required_numbers(df, name)?
            .into_iter()
            .enumerate()
            .map(|(i, v)| {
                if v.fract() == 0.0 && v >= i32::MIN as f64 && v <= i32::MAX as f64 {
                    Ok(v as i32)
                } else {
                    Err(integrity_error(column, name, i))
                }
            })
            .collect()
    }

    /// Text labels (canton, region) of a column that must be complete.
    pub fn required_labels(df: &DataFrame, name: &str) -> Result<Vec<String>, LoadError> {
        let column = df.column(name)?;
        let as_str = column.cast(&DataType::String)?;
        as_str
            .str()?
            .into_iter()
            .enumerate()
            .map(|(i, cell)| match cell.map(str::trim) {
                Some(label) if !label.is_empty() => Ok(label.to_string()),
                _ => Err(integrity_error(column, name, i)),
            })
            .collect()
    }

    /// Values of an already coerced Float64 column, missing as `None`.
    pub fn optional_numbers(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<f64>>> {
        let as_f64 = df.column(name)?.cast(&DataType::Float64)?;
        Ok(as_f64
            .f64()?
            .into_iter()
            .map(|v| v.filter(|x| x.is_finite()))
            .collect())
    }

    /// Overwrite a column with complete Float64 values.
    pub fn replace_with_numbers(
        df: &mut DataFrame,
        name: &str,
        values: Vec<f64>,
    ) -> PolarsResult<()> {
        df.with_column(Column::new(name.into(), values))?;
        Ok(())
    }
}

fn integrity_error(column: &Column, name: &str, row: usize) -> LoadError {
    let value = column
        .get(row)
        .ok()
        .filter(|v| !v.is_null())
        .map(|v| v.to_string().trim_matches('"').to_string())
        .unwrap_or_default();

    LoadError::Integrity(DataIntegrityError::InvalidValue {
        column: name.to_string(),
        row: row + 1,
        value,
    })
}
