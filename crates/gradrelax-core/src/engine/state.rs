use crate::core::conformation::ConformationParams;
use candle_core::Tensor;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct EpochRecord {
    pub epoch: usize,
    pub loss: f64,
    /// Learning rate the epoch's update was taken with.
    pub learning_rate: f64,
    pub backbone_enabled: bool,
    pub duration: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    EpochsExhausted,
    /// The early-stop policy fired after this epoch.
    EarlyStopped { epoch: usize },
    /// The stop flag was observed after this epoch.
    Cancelled { epoch: usize },
}

/// Everything a relaxation run hands back to its caller.
#[derive(Debug, Clone)]
pub struct RelaxResult {
    /// Energy tensor of the last completed epoch, as returned by the model.
    pub energy: Tensor,
    /// Transformed coordinates of the last completed epoch.
    pub coords: Tensor,
    pub params: ConformationParams,
    pub history: Vec<EpochRecord>,
    pub termination: Termination,
}

impl RelaxResult {
    pub fn epochs_run(&self) -> usize {
        self.history.len()
    }

    pub fn initial_loss(&self) -> Option<f64> {
        self.history.first().map(|record| record.loss)
    }

    pub fn final_loss(&self) -> Option<f64> {
        self.history.last().map(|record| record.loss)
    }

    /// Lowest loss seen and the epoch it was reached in.
    pub fn best(&self) -> Option<(usize, f64)> {
        self.history
            .iter()
            .filter(|record| !record.loss.is_nan())
            .min_by(|a, b| a.loss.total_cmp(&b.loss))
            .map(|record| (record.epoch, record.loss))
    }

    pub fn total_duration(&self) -> Duration {
        self.history.iter().map(|record| record.duration).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::shape::ConformationShape;
    use candle_core::Device;

    fn result(losses: &[f64]) -> RelaxResult {
        let device = Device::Cpu;
        let shape = ConformationShape::new(1, 1, 1, 1);
        let history = losses
            .iter()
            .enumerate()
            .map(|(epoch, &loss)| EpochRecord {
                epoch,
                loss,
                learning_rate: 0.1,
                backbone_enabled: false,
                duration: Duration::from_millis(2),
            })
            .collect();
        RelaxResult {
            energy: Tensor::new(0.0f32, &device).unwrap(),
            coords: Tensor::zeros((1, 3), candle_core::DType::F32, &device).unwrap(),
            params: ConformationParams::zeros(shape, &device).unwrap(),
            history,
            termination: Termination::EpochsExhausted,
        }
    }

    #[test]
    fn summary_accessors_follow_history() {
        let result = result(&[4.0, 2.0, 3.0]);
        assert_eq!(result.epochs_run(), 3);
        assert_eq!(result.initial_loss(), Some(4.0));
        assert_eq!(result.final_loss(), Some(3.0));
        assert_eq!(result.best(), Some((1, 2.0)));
        assert_eq!(result.total_duration(), Duration::from_millis(6));
    }

    #[test]
    fn best_skips_nan_losses() {
        let result = result(&[f64::NAN, 1.0]);
        assert_eq!(result.best(), Some((1, 1.0)));
    }
}
