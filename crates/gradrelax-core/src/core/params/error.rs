use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParamLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("CSV parsing error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Malformed row on line {line} of '{path}': expected {expected} columns, found {found}")]
    ColumnCount {
        path: String,
        line: u64,
        expected: usize,
        found: usize,
    },
    #[error("Invalid coordinate '{value}' in column {column} on line {line} of '{path}'")]
    InvalidCoordinate {
        path: String,
        line: u64,
        column: usize,
        value: String,
    },
    #[error("Property table '{path}' does not declare a '{column}' column")]
    MissingColumn { path: String, column: &'static str },
    #[error("Unknown residue code '{code}' in override table")]
    UnknownResidue { code: String },
    #[error("Override template '{residue}/{atom}/{label}' is missing from the {table} table")]
    MissingTemplate {
        table: &'static str,
        residue: String,
        atom: String,
        label: String,
    },
}
