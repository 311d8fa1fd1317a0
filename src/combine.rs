use std::io::Read;
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use serde::Serialize;

use crate::domain::Row;
use crate::error::ChargeError;
use crate::export;

/// Header union and rows of several CSV files.
#[derive(Debug, Clone, Default)]
pub struct CombinedDataset {
    pub header: Vec<String>,
    pub rows: Vec<Row>,
}

impl CombinedDataset {
    /// Appends one CSV's columns (those not seen yet, in order) and its rows.
    /// `name` identifies the input in errors. Short records leave trailing
    /// columns absent; records longer than the header are rejected.
    pub fn extend_from_reader<R: Read>(
        &mut self,
        name: &str,
        reader: R,
    ) -> Result<(), ChargeError> {
        let mut csv_reader = ReaderBuilder::new().flexible(true).from_reader(reader);
        let header = csv_reader
            .headers()?
            .iter()
            .map(str::to_string)
            .collect::<Vec<_>>();

        for record in csv_reader.records() {
            let record = record?;
            if record.len() > header.len() {
                return Err(ChargeError::RaggedRecord {
                    file: name.to_string(),
                    line: record.position().map_or(0, |position| position.line()),
                    found: record.len(),
                    expected: header.len(),
                });
            }
            let row = header
                .iter()
                .zip(record.iter())
                .map(|(field, value)| (field.as_str(), value))
                .collect::<Row>();
            self.rows.push(row);
        }

        for field in header {
            if !self.header.contains(&field) {
                self.header.push(field);
            }
        }
        Ok(())
    }

    pub fn extend_from_path(&mut self, path: &Path) -> Result<(), ChargeError> {
        let file = std::fs::File::open(path)
            .map_err(|err| ChargeError::Filesystem(format!("open {}: {err}", path.display())))?;
        self.extend_from_reader(&path.display().to_string(), file)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CombineStats {
    pub inputs: Vec<PathBuf>,
    pub columns: usize,
    pub rows_written: usize,
}

/// Reads every input fully.
pub fn combine_fields_and_rows<P: AsRef<Path>>(
    paths: &[P],
) -> Result<CombinedDataset, ChargeError> {
    let mut dataset = CombinedDataset::default();
    for path in paths {
        dataset.extend_from_path(path.as_ref())?;
        tracing::debug!(
            path = %path.as_ref().display(),
            columns = dataset.header.len(),
            rows = dataset.rows.len(),
            "merged dataset"
        );
    }
    Ok(dataset)
}

/// Merges `inputs` into one CSV at `output`.
///
/// Every input is held in memory until the output is written; fine for the
/// per-country files this is run on, not for arbitrarily large ones.
pub fn combine_files<P: AsRef<Path>>(
    output: &Path,
    inputs: &[P],
) -> Result<CombineStats, ChargeError> {
    let dataset = combine_fields_and_rows(inputs)?;
    let columns = dataset.header.len();
    let rows = dataset.rows.into_iter().map(Ok);
    let rows_written = export::export_csv(output, &dataset.header, rows)?;
    Ok(CombineStats {
        inputs: inputs.iter().map(|path| path.as_ref().to_path_buf()).collect(),
        columns,
        rows_written,
    })
}
