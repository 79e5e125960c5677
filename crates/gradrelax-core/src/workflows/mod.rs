//! High-level entry points that tie the parameter layer and the engine together.
//!
//! - [`relax`] - Gradient-based relaxation of side-chain rotations and backbone translations

pub mod relax;
