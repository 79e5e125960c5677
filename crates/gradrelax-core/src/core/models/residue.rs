use phf::{Map, phf_map};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResidueType {
    // --- Aliphatic, Nonpolar ---
    Alanine,    // ALA
    Glycine,    // GLY
    Isoleucine, // ILE
    Leucine,    // LEU
    Proline,    // PRO
    Valine,     // VAL

    // --- Aromatic ---
    Phenylalanine, // PHE
    Tryptophan,    // TRP
    Tyrosine,      // TYR

    // --- Polar, Uncharged ---
    Asparagine, // ASN
    Cysteine,   // CYS
    Glutamine,  // GLN
    Serine,     // SER
    Threonine,  // THR
    Methionine, // MET

    // --- Positively Charged ---
    Arginine,  // ARG
    Histidine, // HIS
    Lysine,    // LYS

    // --- Negatively Charged ---
    AsparticAcid, // ASP
    GlutamicAcid, // GLU
}

static THREE_LETTER_CODES: Map<&'static str, ResidueType> = phf_map! {
    "ALA" => ResidueType::Alanine,
    "GLY" => ResidueType::Glycine,
    "ILE" => ResidueType::Isoleucine,
    "LEU" => ResidueType::Leucine,
    "PRO" => ResidueType::Proline,
    "VAL" => ResidueType::Valine,
    "PHE" => ResidueType::Phenylalanine,
    "TRP" => ResidueType::Tryptophan,
    "TYR" => ResidueType::Tyrosine,
    "ASN" => ResidueType::Asparagine,
    "CYS" => ResidueType::Cysteine,
    "GLN" => ResidueType::Glutamine,
    "SER" => ResidueType::Serine,
    "THR" => ResidueType::Threonine,
    "MET" => ResidueType::Methionine,
    "ARG" => ResidueType::Arginine,
    "HIS" => ResidueType::Histidine,
    "LYS" => ResidueType::Lysine,
    "ASP" => ResidueType::AsparticAcid,
    "GLU" => ResidueType::GlutamicAcid,
};

/// Residue code of the virtual backbone amide used as a template by the parameter tables.
pub const VIRTUAL_BACKBONE_CODE: &str = "ooo";

impl ResidueType {
    pub const ALL: [ResidueType; 20] = [
        ResidueType::Alanine,
        ResidueType::Glycine,
        ResidueType::Isoleucine,
        ResidueType::Leucine,
        ResidueType::Proline,
        ResidueType::Valine,
        ResidueType::Phenylalanine,
        ResidueType::Tryptophan,
        ResidueType::Tyrosine,
        ResidueType::Asparagine,
        ResidueType::Cysteine,
        ResidueType::Glutamine,
        ResidueType::Serine,
        ResidueType::Threonine,
        ResidueType::Methionine,
        ResidueType::Arginine,
        ResidueType::Histidine,
        ResidueType::Lysine,
        ResidueType::AsparticAcid,
        ResidueType::GlutamicAcid,
    ];

    pub fn to_three_letter(&self) -> &'static str {
        match self {
            ResidueType::Alanine => "ALA",
            ResidueType::Glycine => "GLY",
            ResidueType::Isoleucine => "ILE",
            ResidueType::Leucine => "LEU",
            ResidueType::Proline => "PRO",
            ResidueType::Valine => "VAL",
            ResidueType::Phenylalanine => "PHE",
            ResidueType::Tryptophan => "TRP",
            ResidueType::Tyrosine => "TYR",
            ResidueType::Asparagine => "ASN",
            ResidueType::Cysteine => "CYS",
            ResidueType::Glutamine => "GLN",
            ResidueType::Serine => "SER",
            ResidueType::Threonine => "THR",
            ResidueType::Methionine => "MET",
            ResidueType::Arginine => "ARG",
            ResidueType::Histidine => "HIS",
            ResidueType::Lysine => "LYS",
            ResidueType::AsparticAcid => "ASP",
            ResidueType::GlutamicAcid => "GLU",
        }
    }

    /// Proline's ring closes on the backbone nitrogen, leaving it without an amide hydrogen.
    pub fn has_backbone_amide_hydrogen(&self) -> bool {
        !matches!(self, ResidueType::Proline)
    }

    pub fn is_standard_code(code: &str) -> bool {
        THREE_LETTER_CODES.contains_key(code)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown residue code '{0}'")]
pub struct ParseResidueTypeError(pub String);

impl FromStr for ResidueType {
    type Err = ParseResidueTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        THREE_LETTER_CODES
            .get(s.trim())
            .copied()
            .ok_or_else(|| ParseResidueTypeError(s.to_string()))
    }
}

impl fmt::Display for ResidueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_three_letter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_str_parses_every_standard_code() {
        for residue_type in ResidueType::ALL {
            let code = residue_type.to_three_letter();
            assert_eq!(ResidueType::from_str(code), Ok(residue_type));
        }
    }

    #[test]
    fn from_str_rejects_virtual_and_unknown_codes() {
        assert!(ResidueType::from_str(VIRTUAL_BACKBONE_CODE).is_err());
        assert_eq!(
            ResidueType::from_str("XYZ"),
            Err(ParseResidueTypeError("XYZ".to_string()))
        );
    }

    #[test]
    fn from_str_trims_whitespace() {
        assert_eq!(ResidueType::from_str(" TYR "), Ok(ResidueType::Tyrosine));
    }

    #[test]
    fn only_proline_lacks_amide_hydrogen() {
        let without: Vec<_> = ResidueType::ALL
            .iter()
            .filter(|r| !r.has_backbone_amide_hydrogen())
            .collect();
        assert_eq!(without, vec![&ResidueType::Proline]);
    }

    #[test]
    fn display_uses_three_letter_code() {
        assert_eq!(ResidueType::Phenylalanine.to_string(), "PHE");
    }
}
