use super::table::CoordinateRow;
use nalgebra::Vector3;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

/// Which labelled positions a [`LabeledPositions`] map collects from the coordinate table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PositionKind {
    /// Rows whose label starts with `H`.
    Hydrogen,
    /// Acceptor orbital rows whose label starts with `FO`; stored with an `X` prefix.
    FreeOrbital,
}

impl PositionKind {
    pub fn table_name(self) -> &'static str {
        match self {
            PositionKind::Hydrogen => "hydrogen",
            PositionKind::FreeOrbital => "free-orbital",
        }
    }

    fn accepts(self, label: &str) -> bool {
        match self {
            PositionKind::Hydrogen => label.starts_with('H'),
            PositionKind::FreeOrbital => label.starts_with("FO"),
        }
    }

    fn stored_label(self, label: &str) -> String {
        match self {
            PositionKind::Hydrogen => label.to_string(),
            // PDB atom names are limited to four characters.
            PositionKind::FreeOrbital => format!("X{}", &label[2..]),
        }
    }
}

/// Picks the first free `label_N` key, starting from `label_0`.
pub fn unique_label<V>(existing: &BTreeMap<String, V>, label: &str) -> String {
    let mut index = 0usize;
    loop {
        let candidate = format!("{label}_{index}");
        if !existing.contains_key(&candidate) {
            return candidate;
        }
        index += 1;
    }
}

/// Offsets of labelled pseudo-atoms: residue code → atom name → label → offset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabeledPositions {
    kind: Option<PositionKind>,
    entries: HashMap<String, HashMap<String, BTreeMap<String, Vector3<f64>>>>,
}

impl LabeledPositions {
    pub fn new(kind: PositionKind) -> Self {
        Self {
            kind: Some(kind),
            entries: HashMap::new(),
        }
    }

    /// Collects every row of `kind`, virtual backbone rows included.
    pub fn from_rows(rows: &[CoordinateRow], kind: PositionKind) -> Self {
        let mut positions = Self::new(kind);
        for row in rows {
            let Some(offset) = row.offset.filter(|_| kind.accepts(&row.label)) else {
                continue;
            };
            positions.insert_unique(&row.residue, &row.atom, &kind.stored_label(&row.label), offset);
        }
        positions
    }

    pub fn kind(&self) -> Option<PositionKind> {
        self.kind
    }

    /// Inserts `offset` under a disambiguated form of `label` and returns the key used.
    pub fn insert_unique(
        &mut self,
        residue: &str,
        atom: &str,
        label: &str,
        offset: Vector3<f64>,
    ) -> String {
        let labels = self
            .entries
            .entry(residue.to_string())
            .or_default()
            .entry(atom.to_string())
            .or_default();
        let key = unique_label(labels, label);
        labels.insert(key.clone(), offset);
        key
    }

    /// Replaces every label of `residue/atom` with `labels`.
    pub fn replace_atom(
        &mut self,
        residue: &str,
        atom: &str,
        labels: BTreeMap<String, Vector3<f64>>,
    ) {
        self.entries
            .entry(residue.to_string())
            .or_default()
            .insert(atom.to_string(), labels);
    }

    pub fn remove_residue(
        &mut self,
        residue: &str,
    ) -> Option<HashMap<String, BTreeMap<String, Vector3<f64>>>> {
        self.entries.remove(residue)
    }

    pub fn atom(&self, residue: &str, atom: &str) -> Option<&BTreeMap<String, Vector3<f64>>> {
        self.entries.get(residue).and_then(|atoms| atoms.get(atom))
    }

    pub fn offset(&self, residue: &str, atom: &str, label: &str) -> Option<&Vector3<f64>> {
        self.atom(residue, atom).and_then(|labels| labels.get(label))
    }

    pub fn residue(&self, residue: &str) -> Option<&HashMap<String, BTreeMap<String, Vector3<f64>>>> {
        self.entries.get(residue)
    }

    pub fn residues(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn contains_residue(&self, residue: &str) -> bool {
        self.entries.contains_key(residue)
    }

    /// Total number of labelled positions across all residues and atoms.
    pub fn len(&self) -> usize {
        self.entries
            .values()
            .flat_map(|atoms| atoms.values())
            .map(BTreeMap::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(residue: &str, atom: &str, label: &str, offset: [f64; 3]) -> CoordinateRow {
        CoordinateRow {
            line: 0,
            residue: residue.to_string(),
            atom: atom.to_string(),
            first_partner: "CA".to_string(),
            second_partner: "C".to_string(),
            label: label.to_string(),
            offset: (label != "_").then(|| Vector3::from(offset)),
        }
    }

    #[test]
    fn repeated_labels_get_distinct_suffixes() {
        let rows = vec![
            row("GLY", "N", "HN", [1.0, 0.0, 0.0]),
            row("GLY", "N", "HN", [0.0, 1.0, 0.0]),
        ];
        let positions = LabeledPositions::from_rows(&rows, PositionKind::Hydrogen);
        assert_eq!(
            positions.offset("GLY", "N", "HN_0"),
            Some(&Vector3::new(1.0, 0.0, 0.0))
        );
        assert_eq!(
            positions.offset("GLY", "N", "HN_1"),
            Some(&Vector3::new(0.0, 1.0, 0.0))
        );
        assert_eq!(positions.len(), 2);
    }

    #[test]
    fn suffix_search_skips_every_taken_index() {
        let mut positions = LabeledPositions::new(PositionKind::Hydrogen);
        for expected in ["HB_0", "HB_1", "HB_2", "HB_3"] {
            let key = positions.insert_unique("ALA", "CB", "HB", Vector3::zeros());
            assert_eq!(key, expected);
        }
    }

    #[test]
    fn unique_label_fills_first_gap() {
        let mut existing = BTreeMap::new();
        existing.insert("HG_0".to_string(), ());
        existing.insert("HG_2".to_string(), ());
        assert_eq!(unique_label(&existing, "HG"), "HG_1");
    }

    #[test]
    fn hydrogen_kind_ignores_orbitals_and_unlabelled_rows() {
        let rows = vec![
            row("SER", "OG", "HG", [0.0; 3]),
            row("SER", "OG", "FO1", [0.0; 3]),
            row("SER", "CB", "_", [0.0; 3]),
        ];
        let positions = LabeledPositions::from_rows(&rows, PositionKind::Hydrogen);
        assert_eq!(positions.len(), 1);
        assert!(positions.offset("SER", "OG", "HG_0").is_some());
    }

    #[test]
    fn free_orbital_labels_are_renamed_with_x_prefix() {
        let rows = vec![
            row("ooo", "O", "FO1", [0.5, 0.5, 0.0]),
            row("ooo", "O", "FO2", [-0.5, 0.5, 0.0]),
        ];
        let positions = LabeledPositions::from_rows(&rows, PositionKind::FreeOrbital);
        assert_eq!(
            positions.offset("ooo", "O", "X1_0"),
            Some(&Vector3::new(0.5, 0.5, 0.0))
        );
        assert!(positions.offset("ooo", "O", "X2_0").is_some());
        assert_eq!(positions.kind(), Some(PositionKind::FreeOrbital));
    }

    #[test]
    fn replace_atom_discards_previous_labels() {
        let mut positions = LabeledPositions::new(PositionKind::Hydrogen);
        positions.insert_unique("ALA", "N", "H", Vector3::zeros());
        let mut replacement = BTreeMap::new();
        replacement.insert("HN_0".to_string(), Vector3::new(1.0, 2.0, 3.0));
        positions.replace_atom("ALA", "N", replacement);
        let labels: Vec<_> = positions.atom("ALA", "N").unwrap().keys().collect();
        assert_eq!(labels, vec!["HN_0"]);
    }
}
