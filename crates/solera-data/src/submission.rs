//! Submission writer.
//!
//! A submission is the output table as a frame: the `date_id` column first,
//! then one `target_N` column per predicted target in index order.

use polars::prelude::*;
use solera_sim::OutputTable;
use solera_traits::types::{DATE_ID_COLUMN, target_column};
use solera_traits::{DateTable, Result};
use std::fs::File;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::info;

/// On-disk submission format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionFormat {
    /// Apache Parquet
    Parquet,
    /// Comma-separated values with a header row
    Csv,
}

impl SubmissionFormat {
    /// Format implied by the file extension. Anything but `.csv` is Parquet.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Self::Csv,
            _ => Self::Parquet,
        }
    }
}

/// Builds the submission frame from a dense table.
pub fn submission_frame(table: &DateTable) -> Result<DataFrame> {
    let mut columns = Vec::with_capacity(table.targets().len() + 1);
    columns.push(Column::new(DATE_ID_COLUMN.into(), table.dates().to_vec()));
    for (position, &target) in table.targets().iter().enumerate() {
        let values: Vec<f64> = table.values().column(position).to_vec();
        columns.push(Column::new(target_column(target).into(), values));
    }
    Ok(DataFrame::new(columns)?)
}

/// Writes `output` to `path`, choosing the format from the extension.
///
/// The frame is written to a temporary file beside `path` and renamed into
/// place, so a failed write never leaves a partial submission.
pub fn write_submission(output: &OutputTable, path: impl AsRef<Path>) -> Result<SubmissionFormat> {
    let path = path.as_ref();
    let table = output.to_date_table()?;
    let mut df = submission_frame(&table)?;

    let format = SubmissionFormat::from_path(path);
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    match format {
        SubmissionFormat::Parquet => {
            ParquetWriter::new(tmp.as_file_mut()).finish(&mut df)?;
        }
        SubmissionFormat::Csv => {
            CsvWriter::new(tmp.as_file_mut())
                .include_header(true)
                .finish(&mut df)?;
        }
    }
    tmp.persist(path).map_err(|e| e.error)?;

    info!(
        path = %path.display(),
        rows = df.height(),
        columns = df.width(),
        ?format,
        "wrote submission"
    );
    Ok(format)
}

/// Reads a submission (Parquet or CSV) back into a dense table.
pub fn read_submission(path: impl AsRef<Path>) -> Result<DateTable> {
    let path = path.as_ref();
    let df = match SubmissionFormat::from_path(path) {
        SubmissionFormat::Csv => crate::frame::read_csv(path)?,
        SubmissionFormat::Parquet => ParquetReader::new(File::open(path)?).finish()?,
    };
    crate::labels::label_table_from_frame(&df, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use solera_traits::{RecordedPrediction, TargetValues};

    fn output() -> OutputTable {
        let mut output = OutputTable::new();
        output
            .push(RecordedPrediction {
                date_id: 3,
                values: [(2, 0.2), (0, 0.1)].into_iter().collect(),
            })
            .unwrap();
        output
            .push(RecordedPrediction {
                date_id: 4,
                values: TargetValues::filled([0, 1, 2], 0.5),
            })
            .unwrap();
        output
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            SubmissionFormat::from_path(Path::new("out/submission.CSV")),
            SubmissionFormat::Csv
        );
        assert_eq!(
            SubmissionFormat::from_path(Path::new("submission.parquet")),
            SubmissionFormat::Parquet
        );
        assert_eq!(
            SubmissionFormat::from_path(Path::new("submission")),
            SubmissionFormat::Parquet
        );
    }

    #[test]
    fn test_frame_layout() {
        let df = submission_frame(&output().to_date_table().unwrap()).unwrap();
        let names: Vec<String> = df
            .get_columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        assert_eq!(names, vec!["date_id", "target_0", "target_1", "target_2"]);
        assert_eq!(df.height(), 2);
    }

    #[test]
    fn test_parquet_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("submission.parquet");
        assert_eq!(
            write_submission(&output(), &path).unwrap(),
            SubmissionFormat::Parquet
        );

        let table = read_submission(&path).unwrap();
        assert_eq!(table.dates(), &[3, 4]);
        assert_eq!(table.targets(), &[0, 1, 2]);
        assert!(table.get(3, 1).unwrap().is_nan());
        assert_relative_eq!(table.get(4, 2).unwrap(), 0.5);
    }

    #[test]
    fn test_csv_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("submission.csv");
        write_submission(&output(), &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("date_id,target_0,target_1,target_2"));
        assert_eq!(read_submission(&path).unwrap().len(), 2);
    }

    #[test]
    fn test_failed_write_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        // A directory in the way makes the final rename fail
        let path = dir.path().join("submission.csv");
        std::fs::create_dir(&path).unwrap();

        assert!(write_submission(&output(), &path).is_err());
        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("submission.csv")]);
        assert!(path.is_dir());
    }

    #[test]
    fn test_overwrites_existing_submission() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("submission.csv");
        std::fs::write(&path, "stale").unwrap();

        write_submission(&output(), &path).unwrap();
        assert_eq!(read_submission(&path).unwrap().len(), 2);
    }
}
