//! Trainable conformational degrees of freedom.
//!
//! Each (batch, chain, residue, alternate) slot owns an 8-component rotation vector and a
//! 3-component backbone translation. Both are unconstrained and start at zero; rotations
//! are folded into `[-π, π]` by [`squash_angles`] every time they are read.

use super::models::shape::ConformationShape;
use candle_core::{DType, Device, Tensor, Var};
use std::f64::consts::PI;

/// Maps unconstrained parameters to bounded angles with `sin(raw) * π`.
///
/// Unlike clamping, the sine keeps a non-zero gradient almost everywhere and still reaches
/// the whole angular range.
pub fn squash_angles(raw: &Tensor) -> candle_core::Result<Tensor> {
    raw.sin()?.affine(PI, 0.0)
}

#[derive(Debug, Clone)]
pub struct ConformationParams {
    shape: ConformationShape,
    rotation: Var,
    translation: Var,
}

impl ConformationParams {
    /// Allocates zero-initialized rotation and translation variables for `shape`.
    pub fn zeros(shape: ConformationShape, device: &Device) -> candle_core::Result<Self> {
        let rotation = Var::zeros(shape.rotation_dims(), DType::F32, device)?;
        let translation = Var::zeros(shape.translation_dims(), DType::F32, device)?;
        Ok(Self {
            shape,
            rotation,
            translation,
        })
    }

    pub fn shape(&self) -> ConformationShape {
        self.shape
    }

    /// Raw (unsquashed) rotation parameters.
    pub fn rotation(&self) -> &Var {
        &self.rotation
    }

    pub fn translation(&self) -> &Var {
        &self.translation
    }

    /// Rotation angles for the current raw values, recomputed on every call.
    pub fn rotation_angles(&self) -> candle_core::Result<Tensor> {
        squash_angles(self.rotation.as_tensor())
    }

    /// Variables handed to the optimizer, translation first.
    pub fn trainable_vars(&self) -> Vec<Var> {
        vec![self.translation.clone(), self.rotation.clone()]
    }
}
