// Stimulus metadata log
// One header line, then one line per presented probe starting with its contrast value

use std::fs;
use std::path::Path;

use super::AcquisitionError;

/// Parse contrast labels from metadata text
///
/// Each value is the text before the first `delimiter` on its line (the whole
/// line when the delimiter is absent), trimmed. At most `limit` values are
/// returned so the labels stay parallel to the detected probes.
pub fn parse_contrast_values(contents: &str, delimiter: &str, limit: usize) -> Vec<String> {
    contents
        .lines()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let value = match line.find(delimiter) {
                Some(stop) => &line[..stop],
                None => line,
            };
            value.trim().to_string()
        })
        .take(limit)
        .collect()
}

/// Read and parse a metadata file
pub fn load_contrast_values(
    path: &Path,
    delimiter: &str,
    limit: usize,
) -> Result<Vec<String>, AcquisitionError> {
    let contents = fs::read_to_string(path)?;
    let values = parse_contrast_values(&contents, delimiter, limit);

    if values.len() < limit {
        log::warn!(
            "Metadata {} lists {} contrasts for {} probes",
            path.display(),
            values.len(),
            limit
        );
    }

    Ok(values)
}
