// Acquisition log ingestion
// Loads the multi-channel DAQ table (column 0 = time) from a folder of .dat files

use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs;
use std::path::{Path, PathBuf};

use super::AcquisitionError;

/// Multi-channel acquisition table, row-major
#[derive(Debug, Clone)]
pub struct AcquisitionLog {
    /// Samples, `rows * columns` values
    data: Vec<f64>,

    /// Number of channels per row, timestamp column included
    columns: usize,

    /// Files the rows were read from, in load order
    pub sources: Vec<PathBuf>,
}

impl AcquisitionLog {
    /// Build a log from rows that all have the same width
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, AcquisitionError> {
        let columns = rows.first().map(|r| r.len()).ok_or(AcquisitionError::EmptyLog)?;
        if columns == 0 {
            return Err(AcquisitionError::EmptyLog);
        }

        let mut data = Vec::with_capacity(rows.len() * columns);
        for (row_idx, row) in rows.into_iter().enumerate() {
            if row.len() != columns {
                return Err(AcquisitionError::RaggedRow {
                    file: "<memory>".to_string(),
                    row: row_idx,
                    found: row.len(),
                    expected: columns,
                });
            }
            data.extend(row);
        }

        Ok(AcquisitionLog {
            data,
            columns,
            sources: Vec::new(),
        })
    }

    pub fn rows(&self) -> usize {
        self.data.len() / self.columns
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Copy one channel out as a contiguous trace
    pub fn channel(&self, channel: usize) -> Result<Vec<f64>, AcquisitionError> {
        if channel >= self.columns {
            return Err(AcquisitionError::ChannelOutOfRange {
                channel,
                columns: self.columns,
            });
        }

        Ok(self
            .data
            .chunks_exact(self.columns)
            .map(|row| row[channel])
            .collect())
    }

    /// Median spacing of the timestamp column in seconds
    /// Returns None with fewer than two rows
    pub fn sample_interval(&self, timestamp_column: usize) -> Result<Option<f64>, AcquisitionError> {
        let timestamps = self.channel(timestamp_column)?;
        if timestamps.len() < 2 {
            return Ok(None);
        }

        let mut deltas: Vec<f64> = timestamps.windows(2).map(|w| w[1] - w[0]).collect();
        deltas.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        Ok(Some(deltas[deltas.len() / 2]))
    }
}

/// Load every `.dat` file in `folder` (sorted by name) into one table
/// Records are split on `delimiter`; records that do not parse as numbers (file headers) are skipped
pub fn load_acquisition_log(folder: &Path, delimiter: u8) -> Result<AcquisitionLog, AcquisitionError> {
    let mut files: Vec<PathBuf> = fs::read_dir(folder)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().map(|ext| ext == "dat").unwrap_or(false))
        .collect();
    files.sort();

    let mut data = Vec::new();
    let mut columns: Option<usize> = None;

    for file in &files {
        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .from_path(file)?;

        for record in reader.records() {
            let record = record?;
            let Some(row) = numeric_record(&record) else {
                continue;
            };

            let expected = *columns.get_or_insert(row.len());
            if row.len() != expected {
                return Err(AcquisitionError::RaggedRow {
                    file: file.display().to_string(),
                    row: record.position().map_or(0, |p| p.line() as usize),
                    found: row.len(),
                    expected,
                });
            }
            data.extend(row);
        }
    }

    let columns = columns.ok_or(AcquisitionError::EmptyLog)?;

    log::info!(
        "Loaded acquisition log: {} files, {} rows, {} columns",
        files.len(),
        data.len() / columns,
        columns
    );

    Ok(AcquisitionLog {
        data,
        columns,
        sources: files,
    })
}

/// Every non-empty field of `record` as a number, or None if any field is not one
fn numeric_record(record: &StringRecord) -> Option<Vec<f64>> {
    let row: Option<Vec<f64>> = record
        .iter()
        .filter(|field| !field.is_empty())
        .map(|field| field.parse::<f64>().ok())
        .collect();
    row.filter(|values| !values.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_numeric_record() {
        let record = StringRecord::from(vec!["0.001", "1", "0", ""]);
        assert_eq!(numeric_record(&record), Some(vec![0.001, 1.0, 0.0]));
        assert_eq!(numeric_record(&StringRecord::from(vec!["Time", "v0"])), None);
        assert_eq!(numeric_record(&StringRecord::from(vec![""])), None);
    }

    #[test]
    fn test_channel_extraction() {
        let log = AcquisitionLog::from_rows(vec![
            vec![0.0, 1.0, 10.0],
            vec![0.1, 2.0, 20.0],
            vec![0.2, 3.0, 30.0],
        ])
        .unwrap();

        assert_eq!(log.rows(), 3);
        assert_eq!(log.channel(2).unwrap(), vec![10.0, 20.0, 30.0]);
        assert!(matches!(
            log.channel(3),
            Err(AcquisitionError::ChannelOutOfRange { channel: 3, columns: 3 })
        ));
    }

    #[test]
    fn test_sample_interval() {
        let log = AcquisitionLog::from_rows(vec![
            vec![0.0, 0.0],
            vec![0.001, 0.0],
            vec![0.002, 0.0],
            vec![0.010, 0.0],
        ])
        .unwrap();

        let dt = log.sample_interval(0).unwrap().unwrap();
        assert!((dt - 0.001).abs() < 1e-12);
    }

    #[test]
    fn test_load_folder_skips_headers_and_sorts_files() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("b.dat"),
            "header line\nTime\tv0\n0.2\t1\n0.3\t0\n",
        )
        .unwrap();
        std::fs::write(temp_dir.path().join("a.dat"), "Time\tv0\n0.0\t0\n0.1\t1\n").unwrap();
        std::fs::write(temp_dir.path().join("notes.txt"), "1 2 3\n").unwrap();

        let log = load_acquisition_log(temp_dir.path(), b'\t').unwrap();
        assert_eq!(log.rows(), 4);
        assert_eq!(log.channel(0).unwrap(), vec![0.0, 0.1, 0.2, 0.3]);
        assert_eq!(log.sources.len(), 2);
    }

    #[test]
    fn test_ragged_file_rejected() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("a.dat"), "0.0\t1\n0.1\t1\t2\n").unwrap();
        assert!(matches!(
            load_acquisition_log(temp_dir.path(), b'\t'),
            Err(AcquisitionError::RaggedRow { .. })
        ));
    }

    #[test]
    fn test_space_delimited_log() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("a.dat"), "Time v0\n0.0 1\n0.1 0\n").unwrap();
        let log = load_acquisition_log(temp_dir.path(), b' ').unwrap();
        assert_eq!(log.channel(1).unwrap(), vec![1.0, 0.0]);
    }

    #[test]
    fn test_empty_folder_rejected() {
        let temp_dir = TempDir::new().unwrap();
        assert!(matches!(
            load_acquisition_log(temp_dir.path(), b'\t'),
            Err(AcquisitionError::EmptyLog)
        ));
    }
}
