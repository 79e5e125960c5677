//! # Parameter Store
//!
//! Static per-residue geometry and chemistry loaded from flat tables.
//!
//! ## Key Components
//!
//! - [`table`] - Tab-separated coordinate table reader shared by the position and partner maps
//! - [`positions`] - Hydrogen and free-orbital offsets keyed by residue, atom and label
//! - [`hbond`] - Donor/acceptor/hybridization properties with lenient typed parsing
//! - [`partners`] - Bonded partners used to rebuild local geometry
//! - [`overrides`] - Hand-maintained patches applied after bulk parsing
//! - [`store`] - The [`store::ParameterStore`] tying everything together
//!
//! ## Usage
//!
//! ```ignore
//! use gradrelax::core::params::store::{ParameterPaths, ParameterStore};
//!
//! let store = ParameterStore::load(&paths)?;
//! let amide = store.hydrogen_offset(ResidueType::Glycine, "N", "HN_0");
//! ```

pub mod error;
pub mod hbond;
pub mod overrides;
pub mod partners;
pub mod positions;
pub mod store;
pub mod table;
