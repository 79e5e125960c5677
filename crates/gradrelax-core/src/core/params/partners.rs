use super::table::CoordinateRow;
use crate::core::models::residue::ResidueType;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// An atom referenced relative to the residue that owns the partnered atom.
///
/// `residue_offset` is `-1` for the preceding residue in the chain, `0` for the same one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartnerRef {
    pub atom: String,
    pub residue_offset: i32,
}

impl PartnerRef {
    pub fn new(atom: impl Into<String>, residue_offset: i32) -> Self {
        Self {
            atom: atom.into(),
            residue_offset,
        }
    }

    pub fn same_residue(atom: impl Into<String>) -> Self {
        Self::new(atom, 0)
    }
}

impl fmt::Display for PartnerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.atom, self.residue_offset)
    }
}

/// Bonded partners of every (residue, atom) that anchors a hydrogen or orbital.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartnerTable {
    entries: HashMap<ResidueType, HashMap<String, [PartnerRef; 2]>>,
}

impl PartnerTable {
    /// Collects partners from labelled rows of standard residues.
    ///
    /// Later rows for the same atom overwrite earlier ones.
    pub fn from_rows(rows: &[CoordinateRow]) -> Self {
        let mut table = Self::default();
        for row in rows {
            if !row.has_label() {
                continue;
            }
            let Ok(residue) = ResidueType::from_str(&row.residue) else {
                continue;
            };
            table.set(
                residue,
                &row.atom,
                [
                    PartnerRef::same_residue(row.first_partner.as_str()),
                    PartnerRef::same_residue(row.second_partner.as_str()),
                ],
            );
        }
        table
    }

    pub fn set(&mut self, residue: ResidueType, atom: &str, partners: [PartnerRef; 2]) {
        self.entries
            .entry(residue)
            .or_default()
            .insert(atom.to_string(), partners);
    }

    pub fn get(&self, residue: ResidueType, atom: &str) -> Option<&[PartnerRef; 2]> {
        self.entries.get(&residue).and_then(|atoms| atoms.get(atom))
    }

    pub fn residue(&self, residue: ResidueType) -> Option<&HashMap<String, [PartnerRef; 2]>> {
        self.entries.get(&residue)
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
