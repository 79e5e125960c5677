//! # Core Module
//!
//! Stateless building blocks shared by the optimization engine.
//!
//! - **Structural data** ([`models`]) - The metadata bundle describing atoms, residue types,
//!   and the shape of the per-residue parameter space derived from it.
//! - **Static parameters** ([`params`]) - Hydrogen, free-orbital, hydrogen-bond and
//!   bonded-partner tables keyed by residue type and atom name.
//! - **Trainable state** ([`conformation`]) - Rotation and translation tensors and the
//!   periodic squashing that keeps rotation angles inside `[-π, π]`.

pub mod conformation;
pub mod models;
pub mod params;
