use super::error::ParamLoadError;
use phf::{Map, phf_map};
use std::collections::HashMap;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use tracing::{debug, warn};

const RESIDUE_COLUMN: &str = "aa";
const ATOM_COLUMN: &str = "atom";
const LEVEL_COLUMN: &str = "level";
const HYBRIDIZATION_COLUMN: &str = "hybridation";
const DONOR_COLUMN: &str = "donor";
const ACCEPTOR_COLUMN: &str = "acceptor";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hybridization {
    None,
    Sp2NitrogenOneHydrogen,
    Sp2NitrogenTwoHydrogens,
    Sp2NitrogenOneOrbital,
    Sp2NitrogenTwoOrbitals,
    Sp3NitrogenThreeHydrogens,
    Sp3OxygenHydrogenTwoOrbitals,
    Sp2OxygenTwoOrbitals,
}

impl Hybridization {
    /// Integer code used by the energy terms.
    pub fn code(self) -> u8 {
        match self {
            Hybridization::None => 0,
            Hybridization::Sp2NitrogenOneHydrogen => 1,
            Hybridization::Sp2NitrogenTwoHydrogens => 2,
            Hybridization::Sp2NitrogenOneOrbital => 3,
            Hybridization::Sp2NitrogenTwoOrbitals => 4,
            Hybridization::Sp3NitrogenThreeHydrogens => 5,
            Hybridization::Sp3OxygenHydrogenTwoOrbitals => 6,
            Hybridization::Sp2OxygenTwoOrbitals => 7,
        }
    }
}

static HYBRIDIZATION_TOKENS: Map<&'static str, Hybridization> = phf_map! {
    "NO_HYBRID" => Hybridization::None,
    "SP2_N_H1" => Hybridization::Sp2NitrogenOneHydrogen,
    "SP2_N_H2" => Hybridization::Sp2NitrogenTwoHydrogens,
    "SP2_N_ORB1" => Hybridization::Sp2NitrogenOneOrbital,
    "SP2_N_ORB2" => Hybridization::Sp2NitrogenTwoOrbitals,
    "SP3_N_H3" => Hybridization::Sp3NitrogenThreeHydrogens,
    "SP3_O_H1ORB2" => Hybridization::Sp3OxygenHydrogenTwoOrbitals,
    "SP2_O_ORB2" => Hybridization::Sp2OxygenTwoOrbitals,
};

static LEVEL_TOKENS: Map<&'static str, i8> = phf_map! {
    "LEVEL_N" => 0,
    "LEVEL_A" => 1,
    "LEVEL_O" => -1,
    "LEVEL_B" => 2,
    "LEVEL_G" => 3,
    "LEVEL_D" => 4,
    "LEVEL_E" => 5,
    "LEVEL_Z" => 6,
    "LEVEL_H" => 7,
    "LEVEL_I" => 8,
    "LEVEL_K" => 9,
};

/// A single typed cell of the property table.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Number(f64),
    Level(i8),
    Hybridization(Hybridization),
    /// Token that did not parse as the column's type.
    Text(String),
}

impl PropertyValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(value) => Some(*value),
            PropertyValue::Level(level) => Some(f64::from(*level)),
            PropertyValue::Hybridization(h) => Some(f64::from(h.code())),
            PropertyValue::Text(_) => None,
        }
    }
}

/// Property columns of one (residue, atom) row, keyed by header name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AtomProperties {
    values: HashMap<String, PropertyValue>,
}

impl AtomProperties {
    pub fn get(&self, column: &str) -> Option<&PropertyValue> {
        self.values.get(column)
    }

    pub fn number(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(PropertyValue::as_number)
    }

    pub fn is_donor(&self) -> bool {
        self.number(DONOR_COLUMN).is_some_and(|v| v != 0.0)
    }

    pub fn is_acceptor(&self) -> bool {
        self.number(ACCEPTOR_COLUMN).is_some_and(|v| v != 0.0)
    }

    pub fn level(&self) -> Option<i8> {
        match self.get(LEVEL_COLUMN) {
            Some(PropertyValue::Level(level)) => Some(*level),
            _ => None,
        }
    }

    pub fn hybridization(&self) -> Option<Hybridization> {
        match self.get(HYBRIDIZATION_COLUMN) {
            Some(PropertyValue::Hybridization(h)) => Some(*h),
            _ => None,
        }
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A token kept as text because it did not parse as its column's type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fallback {
    pub line: usize,
    pub column: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseDiagnostics {
    pub fallbacks: Vec<Fallback>,
}

impl ParseDiagnostics {
    pub fn fallback_count(&self) -> usize {
        self.fallbacks.len()
    }

    pub fn is_clean(&self) -> bool {
        self.fallbacks.is_empty()
    }
}

/// Hydrogen-bond properties: residue code → atom name → properties.
///
/// Residue keys are kept verbatim, so protonation variants such as `H1S` coexist with
/// the standard codes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HBondTable {
    entries: HashMap<String, HashMap<String, AtomProperties>>,
}

impl HBondTable {
    pub fn load(path: &Path) -> Result<(Self, ParseDiagnostics), ParamLoadError> {
        let file = std::fs::File::open(path).map_err(|e| ParamLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Self::parse(BufReader::new(file), &path.to_string_lossy())
    }

    /// Parses the comma-separated property table.
    ///
    /// Every `#` line declares one column header, in order. Data rows are stripped of
    /// quotes and whitespace and must have exactly one value per declared header.
    pub fn parse<R: BufRead>(
        reader: R,
        path_for_error: &str,
    ) -> Result<(Self, ParseDiagnostics), ParamLoadError> {
        let mut header: Vec<String> = Vec::new();
        let mut table = Self::default();
        let mut diagnostics = ParseDiagnostics::default();

        for (index, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| io_error(path_for_error, e))?;
            let line_number = index + 1;

            if let Some(column) = line.strip_prefix('#') {
                header.push(column.trim().replace('#', ""));
                continue;
            }
            if line.trim().is_empty() {
                continue;
            }

            let cleaned: String = line
                .trim()
                .chars()
                .filter(|c| !matches!(c, '"' | ' ' | '\t'))
                .collect();
            let cells: Vec<&str> = cleaned.trim_matches(',').split(',').collect();
            if cells.len() != header.len() {
                return Err(ParamLoadError::ColumnCount {
                    path: path_for_error.to_string(),
                    line: line_number as u64,
                    expected: header.len(),
                    found: cells.len(),
                });
            }

            let mut residue = None;
            let mut atom = None;
            let mut properties = AtomProperties::default();
            for (column, &cell) in header.iter().zip(&cells) {
                match column.as_str() {
                    RESIDUE_COLUMN => residue = Some(cell),
                    ATOM_COLUMN => atom = Some(cell),
                    _ => {
                        let value = typed_value(column, cell);
                        if let PropertyValue::Text(text) = &value {
                            warn!(
                                line = line_number,
                                column = column.as_str(),
                                "Kept untyped token '{}' in '{}'.",
                                text,
                                path_for_error
                            );
                            diagnostics.fallbacks.push(Fallback {
                                line: line_number,
                                column: column.clone(),
                                value: text.clone(),
                            });
                        }
                        properties.values.insert(column.clone(), value);
                    }
                }
            }

            let residue = residue.ok_or_else(|| missing_column(path_for_error, RESIDUE_COLUMN))?;
            let atom = atom.ok_or_else(|| missing_column(path_for_error, ATOM_COLUMN))?;
            table
                .entries
                .entry(residue.to_string())
                .or_default()
                .insert(atom.to_string(), properties);
        }

        debug!(
            residues = table.entries.len(),
            fallbacks = diagnostics.fallback_count(),
            "Parsed property table '{}'.",
            path_for_error
        );
        Ok((table, diagnostics))
    }

    pub fn get(&self, residue: &str, atom: &str) -> Option<&AtomProperties> {
        self.entries.get(residue).and_then(|atoms| atoms.get(atom))
    }

    pub fn residue(&self, residue: &str) -> Option<&HashMap<String, AtomProperties>> {
        self.entries.get(residue)
    }

    pub fn residues(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of (residue, atom) rows.
    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn typed_value(column: &str, cell: &str) -> PropertyValue {
    let typed = match column {
        LEVEL_COLUMN => LEVEL_TOKENS.get(cell).copied().map(PropertyValue::Level),
        HYBRIDIZATION_COLUMN => HYBRIDIZATION_TOKENS
            .get(cell)
            .copied()
            .map(PropertyValue::Hybridization),
        _ => cell.parse::<f64>().ok().map(PropertyValue::Number),
    };
    typed.unwrap_or_else(|| PropertyValue::Text(cell.to_string()))
}

fn io_error(path: &str, source: io::Error) -> ParamLoadError {
    ParamLoadError::Io {
        path: path.to_string(),
        source,
    }
}

fn missing_column(path: &str, column: &'static str) -> ParamLoadError {
    ParamLoadError::MissingColumn {
        path: path.to_string(),
        column,
    }
}
