//! Small differentiable collaborators for exercising the relaxation loop.
//!
//! The structure holds one atom per residue. The transform adds the first three rotation
//! angles of each residue to its atom, plus the backbone translation when enabled.

use super::collaborators::{EnergyModel, StructureTransform};
use crate::core::models::info::{AtomField, StructureInfo};
use candle_core::{DType, Device, Tensor};

pub(crate) fn linear_chain_info(residues: usize, device: &Device) -> StructureInfo {
    let rows: Vec<i64> = (0..residues as i64)
        .flat_map(|r| [0, 0, r, 0, r, 0])
        .collect();
    let description = Tensor::from_vec(rows, (residues, AtomField::FIELD_COUNT), device).unwrap();
    let atom_number = Tensor::new(&[residues as i64], device).unwrap();
    let indexing = Tensor::arange(0i64, residues as i64, device).unwrap();
    let empty = Tensor::zeros((0, 2), DType::I64, device).unwrap();
    let mask = Tensor::ones((residues, 1), DType::U8, device).unwrap();
    StructureInfo::new(
        atom_number,
        description,
        indexing,
        empty.clone(),
        empty,
        mask,
    )
}

pub(crate) fn coords(values: &[[f32; 3]], device: &Device) -> Tensor {
    let flat: Vec<f32> = values.iter().flatten().copied().collect();
    Tensor::from_vec(flat, (values.len(), 3), device).unwrap()
}

/// `sum((coords - target)^2)`, optionally kept per residue as `[1, 1, n]`.
pub(crate) struct HarmonicRestraint {
    pub target: Tensor,
    pub per_residue: bool,
}

impl EnergyModel for HarmonicRestraint {
    fn evaluate(&self, coords: &Tensor, _info: &StructureInfo) -> candle_core::Result<Tensor> {
        let squared = coords.sub(&self.target)?.sqr()?;
        if self.per_residue {
            let n = squared.dim(0)?;
            squared.sum(1)?.reshape((1, 1, n))
        } else {
            squared.sum_all()
        }
    }
}

/// `sum(log(coords - floor))`: pulls coordinates down and turns NaN once one crosses `floor`.
pub(crate) struct LogAttractor {
    pub floor: f64,
}

impl EnergyModel for LogAttractor {
    fn evaluate(&self, coords: &Tensor, _info: &StructureInfo) -> candle_core::Result<Tensor> {
        (coords - self.floor)?.log()?.sum_all()
    }
}

pub(crate) struct OffsetTransform;

impl StructureTransform for OffsetTransform {
    fn apply(
        &self,
        base: &Tensor,
        _info: &StructureInfo,
        rotation_angles: &Tensor,
        translation: &Tensor,
        backbone_enabled: bool,
    ) -> candle_core::Result<Tensor> {
        let n = base.dim(0)?;
        let side_chain = rotation_angles.reshape((n, 8))?.narrow(1, 0, 3)?;
        let moved = base.add(&side_chain)?;
        if backbone_enabled {
            moved.add(&translation.reshape((n, 3))?)
        } else {
            Ok(moved)
        }
    }
}
