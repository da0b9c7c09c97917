use std::fs;

use camino::Utf8Path;

use crate::domain::CoordinateRecord;
use crate::error::CatalogError;

const MISSING_TOKENS: &[&str] = &["", "NA", "N/A", "NaN", "nan", "null", "None", "<NA>"];
const MAX_COLUMNS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// `.txt`: columns separated by runs of whitespace.
    Whitespace,
    /// `.csv`: comma separated, blanks around values ignored.
    Comma,
}

impl InputFormat {
    pub fn from_path(path: &Utf8Path) -> Result<Self, CatalogError> {
        match path.extension() {
            Some(ext) if ext.eq_ignore_ascii_case("txt") => Ok(InputFormat::Whitespace),
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Ok(InputFormat::Comma),
            _ => Err(CatalogError::UnsupportedInputExtension(path.to_string())),
        }
    }

    fn split(self, line: &str) -> Vec<&str> {
        match self {
            InputFormat::Whitespace => line.split_whitespace().collect(),
            InputFormat::Comma => line.split(',').map(str::trim).collect(),
        }
    }
}

/// Loads the coordinate list. The extension is checked before the file is
/// opened so an unsupported input fails without touching the disk.
pub fn load_records(path: &Utf8Path, header: bool) -> Result<Vec<CoordinateRecord>, CatalogError> {
    let format = InputFormat::from_path(path)?;
    let content = fs::read_to_string(path.as_std_path())
        .map_err(|_| CatalogError::InputRead(path.to_path_buf()))?;
    let records = parse_records(&content, format, header)?;
    tracing::debug!(path = %path, rows = records.len(), "loaded coordinate list");
    Ok(records)
}

pub fn parse_records(
    content: &str,
    format: InputFormat,
    header: bool,
) -> Result<Vec<CoordinateRecord>, CatalogError> {
    let mut records = Vec::new();
    let mut header_pending = header;

    for (idx, raw) in content.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if header_pending {
            header_pending = false;
            continue;
        }

        let fields = format.split(line);
        if fields.len() > MAX_COLUMNS {
            return Err(CatalogError::InputParse {
                line: line_no,
                message: format!("expected at most {MAX_COLUMNS} columns, found {}", fields.len()),
            });
        }

        let field = |i: usize| fields.get(i).copied().filter(|value| !is_missing(value));

        let ra = parse_coordinate(field(0), "ra", line_no)?;
        let dec = parse_coordinate(field(1), "dec", line_no)?;
        let size = field(2)
            .map(|value| parse_size(value, line_no))
            .transpose()?
            .flatten();
        let name = field(3).map(str::to_string);

        records.push(CoordinateRecord { ra, dec, size, name });
    }

    Ok(records)
}

fn is_missing(value: &str) -> bool {
    MISSING_TOKENS.contains(&value.trim())
}

fn parse_coordinate(value: Option<&str>, column: &str, line: usize) -> Result<f64, CatalogError> {
    let value = value.ok_or_else(|| CatalogError::InputParse {
        line,
        message: format!("missing {column}"),
    })?;
    value
        .parse::<f64>()
        .ok()
        .filter(|parsed| parsed.is_finite())
        .ok_or_else(|| CatalogError::InputParse {
            line,
            message: format!("invalid {column}: {value}"),
        })
}

fn parse_size(value: &str, line: usize) -> Result<Option<f64>, CatalogError> {
    let parsed = value.parse::<f64>().map_err(|_| CatalogError::InputParse {
        line,
        message: format!("invalid size: {value}"),
    })?;
    if parsed.is_nan() {
        return Ok(None);
    }
    if !parsed.is_finite() || parsed <= 0.0 {
        return Err(CatalogError::InputParse {
            line,
            message: format!("size must be a positive number: {value}"),
        });
    }
    Ok(Some(parsed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_rows_with_gaps() {
        let content = "150.0 2.0 0.05 galaxy.fits\n10.0   -5.0\n";
        let records = parse_records(content, InputFormat::Whitespace, false).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].size, Some(0.05));
        assert_eq!(records[0].name.as_deref(), Some("galaxy.fits"));
        assert_eq!(records[1].size, None);
        assert_eq!(records[1].name, None);
    }

    #[test]
    fn nan_size_is_absent() {
        let records = parse_records("1.0 2.0 NaN NA", InputFormat::Whitespace, false).unwrap();
        assert_eq!(records[0].size, None);
        assert_eq!(records[0].name, None);
    }
}
