use super::error::ParamLoadError;
use crate::core::models::residue::{ResidueType, VIRTUAL_BACKBONE_CODE};
use nalgebra::Vector3;
use std::io;
use std::path::Path;
use tracing::debug;

/// Number of tab-separated columns in a coordinate table row.
pub const COORDINATE_TABLE_COLUMNS: usize = 10;

const RESIDUE_COLUMN: usize = 0;
const ATOM_COLUMN: usize = 1;
const FIRST_PARTNER_COLUMN: usize = 2;
const SECOND_PARTNER_COLUMN: usize = 4;
const LABEL_COLUMN: usize = 6;
const OFFSET_COLUMNS: [usize; 3] = [7, 8, 9];

/// Label used by rows that carry no hydrogen or orbital position.
pub const NO_LABEL: &str = "_";

/// One row of the hydrogen-bond coordinate table.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateRow {
    pub line: u64,
    pub residue: String,
    pub atom: String,
    pub first_partner: String,
    pub second_partner: String,
    pub label: String,
    /// Present only on labelled rows; anchor rows carry placeholders instead.
    pub offset: Option<Vector3<f64>>,
}

impl CoordinateRow {
    pub fn is_virtual_backbone(&self) -> bool {
        self.residue == VIRTUAL_BACKBONE_CODE
    }

    pub fn has_label(&self) -> bool {
        self.label != NO_LABEL
    }
}

pub fn read_coordinate_table(path: &Path) -> Result<Vec<CoordinateRow>, ParamLoadError> {
    let file = std::fs::File::open(path).map_err(|e| ParamLoadError::Io {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;
    parse_coordinate_rows(file, &path.to_string_lossy())
}

/// Parses coordinate rows from any reader.
///
/// Rows whose first column is neither a standard residue code nor the virtual backbone
/// code are skipped. Recognized rows with any column count other than
/// [`COORDINATE_TABLE_COLUMNS`] abort the whole load, as does a non-numeric offset on a
/// labelled row. Offset columns of unlabelled (`_`) rows are not read.
pub fn parse_coordinate_rows<R: io::Read>(
    reader: R,
    path_for_error: &str,
) -> Result<Vec<CoordinateRow>, ParamLoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .comment(Some(b'#'))
        .flexible(true)
        .quoting(false)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for result in reader.records() {
        let record = result.map_err(|e| ParamLoadError::Csv {
            path: path_for_error.to_string(),
            source: e,
        })?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();

        let residue = record.get(RESIDUE_COLUMN).unwrap_or_default();
        if residue != VIRTUAL_BACKBONE_CODE && !ResidueType::is_standard_code(residue) {
            skipped += 1;
            continue;
        }

        if record.len() != COORDINATE_TABLE_COLUMNS {
            return Err(ParamLoadError::ColumnCount {
                path: path_for_error.to_string(),
                line,
                expected: COORDINATE_TABLE_COLUMNS,
                found: record.len(),
            });
        }

        let label = &record[LABEL_COLUMN];
        let offset = if label == NO_LABEL {
            None
        } else {
            let mut offset = Vector3::zeros();
            for (axis, &column) in OFFSET_COLUMNS.iter().enumerate() {
                let value = &record[column];
                offset[axis] = value
                    .parse::<f64>()
                    .map_err(|_| ParamLoadError::InvalidCoordinate {
                        path: path_for_error.to_string(),
                        line,
                        column,
                        value: value.to_string(),
                    })?;
            }
            Some(offset)
        };

        rows.push(CoordinateRow {
            line,
            residue: residue.to_string(),
            atom: record[ATOM_COLUMN].to_string(),
            first_partner: record[FIRST_PARTNER_COLUMN].to_string(),
            second_partner: record[SECOND_PARTNER_COLUMN].to_string(),
            label: label.to_string(),
            offset,
        });
    }

    debug!(
        rows = rows.len(),
        skipped, "Parsed coordinate table '{}'.", path_for_error
    );
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const TABLE: &str = "#aa\tatom\tp1\t-\tp2\t-\tlabel\tx\ty\tz\n\
GLY\tN\tCA\t0\tC\t0\tHN\t0.1\t0.2\t0.3\n\
\n\
ooo\tN\tCA\t0\tC\t0\tHN\t1.0\t0.0\t-1.0\n\
HOH\tO\t_\t_\t_\t_\t_\tbad\n\
SER\tOG\tCB\t0\tCA\t0\t_\t0.0\t0.0\t0.0\n";

    #[test]
    fn parse_keeps_standard_and_virtual_rows() {
        let rows = parse_coordinate_rows(TABLE.as_bytes(), "mem").unwrap();
        assert_eq!(rows.len(), 3);

        assert_eq!(rows[0].residue, "GLY");
        assert_eq!(rows[0].atom, "N");
        assert_eq!(rows[0].first_partner, "CA");
        assert_eq!(rows[0].second_partner, "C");
        assert_eq!(rows[0].label, "HN");
        assert_eq!(rows[0].offset, Some(Vector3::new(0.1, 0.2, 0.3)));

        assert!(rows[1].is_virtual_backbone());
        assert!(!rows[2].has_label());
        assert_eq!(rows[2].offset, None);
    }

    #[test]
    fn unlabelled_rows_may_hold_placeholder_offsets() {
        let table = "SER\tCB\tCA\t0\tN\t0\t_\t_\t_\t_\n\
SER\tOG\tCB\t0\tCA\t0\tHG\t0.0\t0.0\t1.0\n";
        let rows = parse_coordinate_rows(table.as_bytes(), "mem").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].offset, None);
        assert_eq!(rows[1].label, "HG");
        assert_eq!(rows[1].offset, Some(Vector3::new(0.0, 0.0, 1.0)));
    }

    #[test]
    fn parse_rejects_long_recognized_rows() {
        let table = "ALA\tCB\tCA\t0\tN\t0\tHB\t0.0\t0.0\t0.0\t9.9\n";
        let result = parse_coordinate_rows(table.as_bytes(), "mem");
        assert!(matches!(
            result,
            Err(ParamLoadError::ColumnCount {
                expected: COORDINATE_TABLE_COLUMNS,
                found: 11,
                ..
            })
        ));
    }

    #[test]
    fn parse_rejects_short_recognized_rows() {
        let table = "ALA\tCB\tCA\t0\tN\n";
        let result = parse_coordinate_rows(table.as_bytes(), "mem");
        assert!(matches!(
            result,
            Err(ParamLoadError::ColumnCount {
                expected: COORDINATE_TABLE_COLUMNS,
                found: 5,
                ..
            })
        ));
    }

    #[test]
    fn parse_rejects_non_numeric_offsets() {
        let table = "ALA\tCB\tCA\t0\tN\t0\tHB\t0.0\tnope\t0.0\n";
        let result = parse_coordinate_rows(table.as_bytes(), "mem");
        assert!(matches!(
            result,
            Err(ParamLoadError::InvalidCoordinate { column: 8, .. })
        ));
    }

    #[test]
    fn read_fails_for_missing_file() {
        let dir = tempdir().unwrap();
        let result = read_coordinate_table(&dir.path().join("absent.txt"));
        assert!(matches!(result, Err(ParamLoadError::Io { .. })));
    }

    #[test]
    fn read_parses_file_on_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("coords.txt");
        fs::write(&path, TABLE).unwrap();
        let rows = read_coordinate_table(&path).unwrap();
        assert_eq!(rows.len(), 3);
    }
}
