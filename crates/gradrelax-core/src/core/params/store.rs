use super::error::ParamLoadError;
use super::hbond::{AtomProperties, HBondTable, ParseDiagnostics};
use super::overrides::OverrideTable;
use super::partners::{PartnerRef, PartnerTable};
use super::positions::{LabeledPositions, PositionKind};
use super::table::read_coordinate_table;
use crate::core::models::residue::ResidueType;
use nalgebra::Vector3;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterPaths {
    /// Tab-separated hydrogen/orbital coordinate table.
    pub coordinate_table: PathBuf,
    /// Comma-separated hydrogen-bond property table.
    pub hbond_table: PathBuf,
    /// Extra override patches appended after the built-in ones.
    pub overrides: Option<PathBuf>,
}

/// Read-only per-residue constants, built once and shared by reference afterwards.
#[derive(Debug, Clone)]
pub struct ParameterStore {
    pub hydrogens: LabeledPositions,
    pub free_orbitals: LabeledPositions,
    pub hbond: HBondTable,
    pub partners: PartnerTable,
    pub diagnostics: ParseDiagnostics,
}

impl ParameterStore {
    pub fn load(paths: &ParameterPaths) -> Result<Self, ParamLoadError> {
        let rows = read_coordinate_table(&paths.coordinate_table)?;
        let mut hydrogens = LabeledPositions::from_rows(&rows, PositionKind::Hydrogen);
        let mut free_orbitals = LabeledPositions::from_rows(&rows, PositionKind::FreeOrbital);
        let mut partners = PartnerTable::from_rows(&rows);

        let mut overrides = OverrideTable::builtin();
        if let Some(path) = &paths.overrides {
            overrides.extend(OverrideTable::load(path)?);
        }
        overrides.apply(&mut hydrogens, &mut free_orbitals, &mut partners)?;

        let (hbond, diagnostics) = HBondTable::load(&paths.hbond_table)?;

        info!(
            hydrogens = hydrogens.len(),
            free_orbitals = free_orbitals.len(),
            hbond_rows = hbond.len(),
            partners = partners.len(),
            fallbacks = diagnostics.fallback_count(),
            "Parameter store loaded."
        );

        Ok(Self {
            hydrogens,
            free_orbitals,
            hbond,
            partners,
            diagnostics,
        })
    }

    pub fn hydrogen_offset(
        &self,
        residue: ResidueType,
        atom: &str,
        label: &str,
    ) -> Option<&Vector3<f64>> {
        self.hydrogens.offset(residue.to_three_letter(), atom, label)
    }

    pub fn hydrogens_of(
        &self,
        residue: ResidueType,
        atom: &str,
    ) -> Option<&BTreeMap<String, Vector3<f64>>> {
        self.hydrogens.atom(residue.to_three_letter(), atom)
    }

    pub fn free_orbital_offset(
        &self,
        residue: ResidueType,
        atom: &str,
        label: &str,
    ) -> Option<&Vector3<f64>> {
        self.free_orbitals.offset(residue.to_three_letter(), atom, label)
    }

    pub fn free_orbitals_of(
        &self,
        residue: ResidueType,
        atom: &str,
    ) -> Option<&BTreeMap<String, Vector3<f64>>> {
        self.free_orbitals.atom(residue.to_three_letter(), atom)
    }

    /// Property lookup by raw residue code, so protonation variants resolve too.
    pub fn properties(&self, residue: &str, atom: &str) -> Option<&AtomProperties> {
        self.hbond.get(residue, atom)
    }

    pub fn partners_of(&self, residue: ResidueType, atom: &str) -> Option<&[PartnerRef; 2]> {
        self.partners.get(residue, atom)
    }
}
