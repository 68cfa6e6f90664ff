// Pose-estimation tables
// Per-frame keypoint coordinates and confidences, addressed by (bodypart, feature)

use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::AcquisitionError;

/// Untracked frames are exported as empty fields and become NaN
fn parse_field(field: &str, row: usize, key: &(String, String)) -> Result<f64, AcquisitionError> {
    if field.is_empty() {
        return Ok(f64::NAN);
    }
    field.parse::<f64>().map_err(|_| {
        AcquisitionError::MalformedPose(format!(
            "data row {} column ({}, {}): '{}' is not a number",
            row, key.0, key.1, field
        ))
    })
}

/// Column-oriented pose table
///
/// Layout follows the DeepLabCut CSV export: three header rows (`scorer`,
/// `bodyparts`, `coords`) followed by one row per frame whose first field is
/// the frame index.
#[derive(Debug, Clone)]
pub struct PoseTable {
    columns: HashMap<(String, String), Vec<f64>>,
    frame_count: usize,
}

impl PoseTable {
    pub fn load(path: &Path) -> Result<Self, AcquisitionError> {
        let contents = fs::read_to_string(path)?;
        let table = Self::parse(&contents)?;
        log::info!(
            "Loaded pose table {}: {} frames, {} columns",
            path.display(),
            table.frame_count,
            table.columns.len()
        );
        Ok(table)
    }

    pub fn parse(contents: &str) -> Result<Self, AcquisitionError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(contents.as_bytes());
        let mut records = reader.records();

        let mut header = |name: &str| -> Result<StringRecord, AcquisitionError> {
            records
                .next()
                .transpose()?
                .ok_or_else(|| AcquisitionError::MalformedPose(format!("missing '{}' row", name)))
        };
        let _scorer = header("scorer")?;
        let bodyparts = header("bodyparts")?;
        let coords = header("coords")?;

        if bodyparts.len() != coords.len() {
            return Err(AcquisitionError::MalformedPose(format!(
                "bodyparts row has {} fields, coords row has {}",
                bodyparts.len(),
                coords.len()
            )));
        }

        // Field 0 of every row is the frame index column
        let keys: Vec<(String, String)> = bodyparts
            .iter()
            .zip(coords.iter())
            .skip(1)
            .map(|(b, c)| (b.to_string(), c.to_string()))
            .collect();

        let mut values: Vec<Vec<f64>> = vec![Vec::new(); keys.len()];
        let mut frame_count = 0;

        for (row, record) in records.enumerate() {
            let record = record?;
            if record.len() != keys.len() + 1 {
                return Err(AcquisitionError::MalformedPose(format!(
                    "data row {} has {} fields, expected {}",
                    row,
                    record.len(),
                    keys.len() + 1
                )));
            }

            for ((column, key), field) in values.iter_mut().zip(&keys).zip(record.iter().skip(1)) {
                column.push(parse_field(field, row, key)?);
            }
            frame_count += 1;
        }

        let columns = keys.into_iter().zip(values).collect();
        Ok(PoseTable {
            columns,
            frame_count,
        })
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// One feature trace (e.g. `("spout", "likelihood")`) across all frames
    pub fn column(&self, bodypart: &str, feature: &str) -> Result<&[f64], AcquisitionError> {
        self.columns
            .get(&(bodypart.to_string(), feature.to_string()))
            .map(|v| v.as_slice())
            .ok_or_else(|| AcquisitionError::MissingPoseColumn {
                bodypart: bodypart.to_string(),
                feature: feature.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
scorer,DLC_resnet50,DLC_resnet50,DLC_resnet50,DLC_resnet50,DLC_resnet50,DLC_resnet50
bodyparts,spout,spout,spout,tongue,tongue,tongue
coords,x,y,likelihood,x,y,likelihood
0,10.0,20.0,0.99,1.0,2.0,0.10
1,10.5,20.5,0.05,1.5,2.5,0.95
2,11.0,21.0,0.98,,2.0,0.20
";

    #[test]
    fn test_parse_columns() {
        let table = PoseTable::parse(SAMPLE).unwrap();
        assert_eq!(table.frame_count(), 3);
        assert_eq!(table.column("spout", "likelihood").unwrap(), &[0.99, 0.05, 0.98]);
        assert_eq!(table.column("tongue", "y").unwrap(), &[2.0, 2.5, 2.0]);
    }

    #[test]
    fn test_blank_field_is_nan() {
        let table = PoseTable::parse(SAMPLE).unwrap();
        assert!(table.column("tongue", "x").unwrap()[2].is_nan());
    }

    #[test]
    fn test_unparsable_field_is_error() {
        let text = "scorer,a,a\nbodyparts,spout,spout\ncoords,x,likelihood\n0,1.0,0.9x9\n";
        match PoseTable::parse(text) {
            Err(AcquisitionError::MalformedPose(msg)) => {
                assert!(msg.contains("likelihood"));
                assert!(msg.contains("0.9x9"));
            }
            other => panic!("expected malformed pose error, got {:?}", other),
        }
    }

    #[test]
    fn test_quoted_header_field_stays_whole() {
        let text = "scorer,\"DLC_resnet50,x\",\"DLC_resnet50,x\"\n\
                    bodyparts,spout,spout\n\
                    coords,x,likelihood\n\
                    0,1.0,0.5\n";
        let table = PoseTable::parse(text).unwrap();
        assert_eq!(table.column("spout", "likelihood").unwrap(), &[0.5]);
    }

    #[test]
    fn test_missing_column() {
        let table = PoseTable::parse(SAMPLE).unwrap();
        assert!(matches!(
            table.column("nose", "x"),
            Err(AcquisitionError::MissingPoseColumn { .. })
        ));
    }

    #[test]
    fn test_truncated_header() {
        let result = PoseTable::parse("scorer,a\nbodyparts,spout\n");
        assert!(matches!(result, Err(AcquisitionError::MalformedPose(_))));
    }

    #[test]
    fn test_short_data_row() {
        let text = "scorer,a,a\nbodyparts,spout,spout\ncoords,x,y\n0,1.0\n";
        assert!(matches!(PoseTable::parse(text), Err(AcquisitionError::MalformedPose(_))));
    }
}
