//! Hand-maintained patches applied on top of the bulk-parsed tables.
//!
//! Two kinds of patch exist: copying template positions from the virtual backbone
//! residue onto real residues, and pinning the bonded partners of specific atoms.

use super::error::ParamLoadError;
use super::partners::{PartnerRef, PartnerTable};
use super::positions::{LabeledPositions, PositionKind};
use crate::core::models::residue::{ResidueType, VIRTUAL_BACKBONE_CODE};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct OverrideTable {
    #[serde(default)]
    pub inherit: Vec<InheritedPositions>,
    #[serde(default)]
    pub partners: Vec<PartnerOverride>,
}

/// Copies `atom/labels` of the virtual backbone residue onto every real residue.
///
/// The atom's previous labels on the receiving residue are discarded.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct InheritedPositions {
    pub table: PositionKind,
    pub atom: String,
    pub labels: Vec<String>,
    #[serde(default)]
    pub except: Vec<String>,
}

/// Fixes the partners of `atom` on the listed residues (all when `residues` is empty).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PartnerOverride {
    #[serde(default)]
    pub residues: Vec<String>,
    #[serde(default)]
    pub except: Vec<String>,
    pub atom: String,
    pub partners: [PartnerSpec; 2],
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PartnerSpec {
    pub atom: String,
    #[serde(default)]
    pub offset: i32,
}

impl From<&PartnerSpec> for PartnerRef {
    fn from(spec: &PartnerSpec) -> Self {
        PartnerRef::new(spec.atom.as_str(), spec.offset)
    }
}

impl OverrideTable {
    /// The patches every parameter set needs: inherited backbone amide hydrogen and
    /// carbonyl orbitals, backbone partners, the arginine guanidinium anchor and the
    /// aromatic ring centroids.
    pub fn builtin() -> Self {
        let inherit = vec![
            InheritedPositions {
                table: PositionKind::Hydrogen,
                atom: "N".to_string(),
                labels: vec!["HN_0".to_string()],
                except: vec!["PRO".to_string()],
            },
            InheritedPositions {
                table: PositionKind::FreeOrbital,
                atom: "O".to_string(),
                labels: vec!["X1_0".to_string(), "X2_0".to_string()],
                except: Vec::new(),
            },
        ];
        let partners = vec![
            partner_override(&[], &["PRO"], "N", [("C", -1), ("O", -1)]),
            partner_override(&[], &[], "C", [("CA", 0), ("N", 0)]),
            partner_override(&[], &[], "O", [("C", 0), ("CA", 0)]),
            partner_override(&["ARG"], &[], "CZ", [("NE", 0), ("NH1", 0)]),
            partner_override(&["PHE", "TYR"], &[], "RC", [("CG", 0), ("CD1", 0)]),
        ];
        Self { inherit, partners }
    }

    pub fn load(path: &Path) -> Result<Self, ParamLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| ParamLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ParamLoadError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })
    }

    /// Appends `other`'s patches; they run after the existing ones.
    pub fn extend(&mut self, other: OverrideTable) {
        self.inherit.extend(other.inherit);
        self.partners.extend(other.partners);
    }

    pub fn len(&self) -> usize {
        self.inherit.len() + self.partners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Applies every patch in order, then drops the virtual backbone residue from both
    /// position maps.
    pub fn apply(
        &self,
        hydrogens: &mut LabeledPositions,
        free_orbitals: &mut LabeledPositions,
        partners: &mut PartnerTable,
    ) -> Result<(), ParamLoadError> {
        for patch in &self.inherit {
            let positions = match patch.table {
                PositionKind::Hydrogen => &mut *hydrogens,
                PositionKind::FreeOrbital => &mut *free_orbitals,
            };
            apply_inherit(patch, positions)?;
        }

        for patch in &self.partners {
            let refs = [
                PartnerRef::from(&patch.partners[0]),
                PartnerRef::from(&patch.partners[1]),
            ];
            for residue in target_residues(&patch.residues, &patch.except)? {
                partners.set(residue, &patch.atom, refs.clone());
            }
        }

        hydrogens.remove_residue(VIRTUAL_BACKBONE_CODE);
        free_orbitals.remove_residue(VIRTUAL_BACKBONE_CODE);
        debug!(patches = self.len(), "Applied parameter overrides.");
        Ok(())
    }
}

fn apply_inherit(
    patch: &InheritedPositions,
    positions: &mut LabeledPositions,
) -> Result<(), ParamLoadError> {
    let mut labels = BTreeMap::new();
    for label in &patch.labels {
        let offset = positions
            .offset(VIRTUAL_BACKBONE_CODE, &patch.atom, label)
            .copied()
            .ok_or_else(|| ParamLoadError::MissingTemplate {
                table: patch.table.table_name(),
                residue: VIRTUAL_BACKBONE_CODE.to_string(),
                atom: patch.atom.clone(),
                label: label.clone(),
            })?;
        labels.insert(label.clone(), offset);
    }

    for residue in target_residues(&[], &patch.except)? {
        positions.replace_atom(residue.to_three_letter(), &patch.atom, labels.clone());
    }
    Ok(())
}

fn target_residues(
    residues: &[String],
    except: &[String],
) -> Result<Vec<ResidueType>, ParamLoadError> {
    let excluded = parse_residues(except)?;
    let included = if residues.is_empty() {
        ResidueType::ALL.to_vec()
    } else {
        parse_residues(residues)?
    };
    Ok(included
        .into_iter()
        .filter(|residue| !excluded.contains(residue))
        .collect())
}

fn parse_residues(codes: &[String]) -> Result<Vec<ResidueType>, ParamLoadError> {
    codes
        .iter()
        .map(|code| {
            ResidueType::from_str(code).map_err(|_| ParamLoadError::UnknownResidue {
                code: code.clone(),
            })
        })
        .collect()
}

fn partner_override(
    residues: &[&str],
    except: &[&str],
    atom: &str,
    partners: [(&str, i32); 2],
) -> PartnerOverride {
    let to_strings =
        |codes: &[&str]| -> Vec<String> { codes.iter().map(|c| c.to_string()).collect() };
    PartnerOverride {
        residues: to_strings(residues),
        except: to_strings(except),
        atom: atom.to_string(),
        partners: partners.map(|(atom, offset)| PartnerSpec {
            atom: atom.to_string(),
            offset,
        }),
    }
}
