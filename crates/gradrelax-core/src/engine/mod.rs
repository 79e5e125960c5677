//! # Engine Module
//!
//! The stateful machinery behind gradient-based relaxation: the capabilities the loop
//! consumes, the optimizer and learning-rate schedule it drives, and the bookkeeping it
//! produces.
//!
//! ## Architecture
//!
//! - **Collaborators** ([`collaborators`]) - The energy model and structure transform capabilities
//! - **Optimizer** ([`optimizer`]) - Adam with the AMSGrad correction over candle variables
//! - **Scheduling** ([`scheduler`]) - Plateau-driven learning-rate decay
//! - **Convergence** ([`convergence`]) - Per-residue stagnation tracking and early-stop policies
//! - **Configuration** ([`config`]) - Validated run settings and their builder
//! - **State Tracking** ([`state`]) - Epoch records, termination reasons and run results
//! - **Progress Monitoring** ([`progress`]) - Optional callback-based progress events
//! - **Error Handling** ([`error`]) - Engine-level error type

pub mod collaborators;
pub mod config;
pub mod convergence;
pub mod error;
pub mod optimizer;
pub mod progress;
pub mod scheduler;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;
