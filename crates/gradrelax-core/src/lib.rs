//! # gradrelax Core Library
//!
//! Gradient-based relaxation of protein conformations against a differentiable force field.
//! Per-residue side-chain rotations and backbone translations are trained with an adaptive
//! optimizer so that the energy predicted for the transformed structure goes down.
//!
//! ## Architectural Philosophy
//!
//! The library keeps a strict three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data: the structural metadata bundle, the
//!   shape derivation over the batch/chain/residue/alternate index space, the trainable
//!   conformation parameters, and the static parameter store loaded from flat tables.
//!
//! - **[`engine`]: The Logic Core.** The pieces the optimization loop is assembled from:
//!   the collaborator traits (`EnergyModel`, `StructureTransform`), the AMSGrad optimizer,
//!   the plateau learning-rate scheduler, per-residue stagnation tracking, configuration,
//!   errors and progress reporting.
//!
//! - **[`workflows`]: The Public API.** [`workflows::relax::run`] drives the epoch loop end
//!   to end and returns the final energy, coordinates and trained parameters.

pub mod core;
pub mod engine;
pub mod workflows;
