use crate::core::models::info::StructureInfo;
use candle_core::Tensor;

/// A differentiable energy function over atomic coordinates.
///
/// The returned tensor may be a scalar or carry per-residue structure; the relaxation
/// loop reduces it with a plain sum. When its leading dimensions are
/// `(batch, chains, residues)` the loop also tracks per-residue stagnation.
pub trait EnergyModel {
    fn evaluate(&self, coords: &Tensor, info: &StructureInfo) -> candle_core::Result<Tensor>;
}

/// Applies side-chain rotations and optional backbone translations to a reference structure.
///
/// Implementations must build a new tensor from `base` without mutating it, and must
/// ignore `translation` entirely when `backbone_enabled` is false.
pub trait StructureTransform {
    fn apply(
        &self,
        base: &Tensor,
        info: &StructureInfo,
        rotation_angles: &Tensor,
        translation: &Tensor,
        backbone_enabled: bool,
    ) -> candle_core::Result<Tensor>;
}

impl<T: EnergyModel + ?Sized> EnergyModel for &T {
    fn evaluate(&self, coords: &Tensor, info: &StructureInfo) -> candle_core::Result<Tensor> {
        (**self).evaluate(coords, info)
    }
}

impl<T: StructureTransform + ?Sized> StructureTransform for &T {
    fn apply(
        &self,
        base: &Tensor,
        info: &StructureInfo,
        rotation_angles: &Tensor,
        translation: &Tensor,
        backbone_enabled: bool,
    ) -> candle_core::Result<Tensor> {
        (**self).apply(base, info, rotation_angles, translation, backbone_enabled)
    }
}
