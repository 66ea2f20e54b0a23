//! Polars helpers shared by the loaders.

use polars::prelude::*;
use solera_traits::types::DATE_ID_COLUMN;
use solera_traits::{DateId, Result, SoleraError};
use std::path::Path;

/// Reads a CSV file with a header row.
pub fn read_csv(path: impl AsRef<Path>) -> Result<DataFrame> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(SoleraError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("missing {}", path.display()),
        )));
    }
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    Ok(df)
}

/// Whether `df` has a column called `name`.
pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_columns().iter().any(|c| c.name().as_str() == name)
}

/// Column names in file order.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .map(|c| c.name().to_string())
        .collect()
}

/// A numeric column as `f64`. Nulls and unparsable cells become NaN.
pub fn f64_values(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let series = column(df, name)?
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    Ok(series
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect())
}

/// An integer column. Nulls are kept as `None`.
pub fn i64_values(df: &DataFrame, name: &str) -> Result<Vec<Option<i64>>> {
    let series = column(df, name)?
        .as_materialized_series()
        .cast(&DataType::Int64)?;
    Ok(series.i64()?.into_iter().collect())
}

/// A text column. Nulls are kept as `None`.
pub fn string_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let series = column(df, name)?
        .as_materialized_series()
        .cast(&DataType::String)?;
    Ok(series
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

/// The `date_id` column. Every row must carry one.
pub fn date_ids(df: &DataFrame) -> Result<Vec<DateId>> {
    i64_values(df, DATE_ID_COLUMN)?
        .into_iter()
        .enumerate()
        .map(|(row, d)| {
            d.ok_or_else(|| SoleraError::InvalidData(format!("row {row} has no {DATE_ID_COLUMN}")))
        })
        .collect()
}

fn column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column> {
    if !has_column(df, name) {
        return Err(SoleraError::MissingColumn(name.to_string()));
    }
    Ok(df.column(name)?)
}
