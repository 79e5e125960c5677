//! Structural data consumed by the optimization loop.
//!
//! - [`residue`] - Amino acid residue types and their three-letter codes
//! - [`info`] - The six-tensor structural metadata bundle
//! - [`shape`] - Derivation of the (batch, chain, residue, alternate) parameter shape

pub mod info;
pub mod residue;
pub mod shape;
