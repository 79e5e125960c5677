use thiserror::Error;

use super::config::ConfigError;
use crate::core::models::shape::ShapeError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Invalid structure metadata: {source}")]
    Shape {
        #[from]
        source: ShapeError,
    },

    #[error("Tensor operation failed: {source}")]
    Tensor {
        #[from]
        source: candle_core::Error,
    },

    #[error("Loss diverged at epoch {epoch}: {loss}")]
    Divergence { epoch: usize, loss: f64 },
}
