use crate::core::models::shape::ConformationShape;
use candle_core::{DType, Tensor};

/// Counts, per (batch, chain, residue), how many consecutive epochs passed without the
/// residue's energy improving on its best value.
///
/// Tracking only happens when the energy tensor's leading dimensions match the residue
/// index space; trailing dimensions are summed per residue.
#[derive(Debug, Clone, PartialEq)]
pub struct StagnationTracker {
    dims: (usize, usize, usize),
    best: Vec<f64>,
    stalled: Vec<u32>,
    updates: usize,
}

impl StagnationTracker {
    pub fn new(shape: &ConformationShape) -> Self {
        let slots = shape.residue_slots();
        Self {
            dims: (shape.batch, shape.chains, shape.residues),
            best: vec![f64::INFINITY; slots],
            stalled: vec![0; slots],
            updates: 0,
        }
    }

    /// Folds one epoch's energy into the counters.
    ///
    /// Returns `Ok(false)` without touching any state when the energy is not per-residue.
    pub fn update(&mut self, energy: &Tensor) -> candle_core::Result<bool> {
        let dims = energy.dims();
        if dims.len() < 3 || (dims[0], dims[1], dims[2]) != self.dims {
            return Ok(false);
        }
        let per_residue = if dims.len() > 3 {
            energy.flatten_from(3)?.sum(3)?
        } else {
            energy.clone()
        };
        let values = per_residue
            .detach()
            .to_dtype(DType::F64)?
            .flatten_all()?
            .to_vec1::<f64>()?;

        for ((value, best), stalled) in values
            .into_iter()
            .zip(self.best.iter_mut())
            .zip(self.stalled.iter_mut())
        {
            if value < *best {
                *best = value;
                *stalled = 0;
            } else {
                *stalled += 1;
            }
        }
        self.updates += 1;
        Ok(true)
    }

    pub fn is_active(&self) -> bool {
        self.updates > 0
    }

    pub fn counters(&self) -> &[u32] {
        &self.stalled
    }

    pub fn stalled_epochs(&self, batch: usize, chain: usize, residue: usize) -> Option<u32> {
        let (_, chains, residues) = self.dims;
        if chain >= chains || residue >= residues {
            return None;
        }
        self.stalled
            .get((batch * chains + chain) * residues + residue)
            .copied()
    }

    /// Smallest counter across all residues; zero while tracking is inactive.
    pub fn min_stalled(&self) -> u32 {
        if !self.is_active() {
            return 0;
        }
        self.stalled.iter().copied().min().unwrap_or(0)
    }

    pub fn reset(&mut self) {
        self.best.fill(f64::INFINITY);
        self.stalled.fill(0);
        self.updates = 0;
    }
}

/// Decides after each epoch whether the loop may end before its epoch budget.
pub trait EarlyStopPolicy {
    fn should_stop(&self, epoch: usize, tracker: &StagnationTracker) -> bool;
}

/// Built-in early-stop policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EarlyStop {
    /// Always run the full epoch budget.
    #[default]
    Never,
    /// Stop once every residue has gone `patience` epochs without improving.
    AllResiduesStagnant { patience: u32 },
}

impl EarlyStopPolicy for EarlyStop {
    fn should_stop(&self, _epoch: usize, tracker: &StagnationTracker) -> bool {
        match self {
            EarlyStop::Never => false,
            EarlyStop::AllResiduesStagnant { patience } => {
                tracker.is_active() && tracker.min_stalled() >= *patience
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;

    fn shape() -> ConformationShape {
        ConformationShape::new(1, 1, 2, 1)
    }

    fn energy(values: [f32; 2]) -> Tensor {
        Tensor::new(&values, &Device::Cpu)
            .unwrap()
            .reshape((1, 1, 2))
            .unwrap()
    }

    #[test]
    fn counters_reset_on_improvement() {
        let mut tracker = StagnationTracker::new(&shape());
        assert!(tracker.update(&energy([5.0, 5.0])).unwrap());
        tracker.update(&energy([4.0, 5.0])).unwrap();
        tracker.update(&energy([4.0, 5.0])).unwrap();
        assert_eq!(tracker.counters(), &[1, 2]);

        tracker.update(&energy([4.0, 1.0])).unwrap();
        assert_eq!(tracker.stalled_epochs(0, 0, 0), Some(2));
        assert_eq!(tracker.stalled_epochs(0, 0, 1), Some(0));
        assert_eq!(tracker.min_stalled(), 0);
    }

    #[test]
    fn trailing_dimensions_are_summed_per_residue() {
        let mut tracker = StagnationTracker::new(&shape());
        let first = Tensor::new(&[[1.0f32, 1.0], [2.0, 2.0]], &Device::Cpu)
            .unwrap()
            .reshape((1, 1, 2, 2))
            .unwrap();
        // Residue 0 total drops from 2 to 1.5, residue 1 total rises from 4 to 4.5.
        let second = Tensor::new(&[[1.0f32, 0.5], [2.0, 2.5]], &Device::Cpu)
            .unwrap()
            .reshape((1, 1, 2, 2))
            .unwrap();
        tracker.update(&first).unwrap();
        tracker.update(&second).unwrap();
        assert_eq!(tracker.counters(), &[0, 1]);
    }

    #[test]
    fn scalar_energy_leaves_tracker_inactive() {
        let mut tracker = StagnationTracker::new(&shape());
        let scalar = Tensor::new(3.0f32, &Device::Cpu).unwrap();
        assert!(!tracker.update(&scalar).unwrap());
        assert!(!tracker.is_active());
        let policy = EarlyStop::AllResiduesStagnant { patience: 0 };
        assert!(!policy.should_stop(10, &tracker));
    }

    #[test]
    fn all_residues_stagnant_waits_for_every_residue() {
        let mut tracker = StagnationTracker::new(&shape());
        let policy = EarlyStop::AllResiduesStagnant { patience: 2 };
        tracker.update(&energy([1.0, 1.0])).unwrap();
        tracker.update(&energy([1.0, 0.5])).unwrap();
        tracker.update(&energy([1.0, 0.5])).unwrap();
        assert!(!policy.should_stop(3, &tracker));
        tracker.update(&energy([1.0, 0.5])).unwrap();
        assert!(policy.should_stop(4, &tracker));
        assert!(!EarlyStop::Never.should_stop(4, &tracker));
    }

    #[test]
    fn reset_clears_history() {
        let mut tracker = StagnationTracker::new(&shape());
        tracker.update(&energy([1.0, 1.0])).unwrap();
        tracker.update(&energy([1.0, 1.0])).unwrap();
        tracker.reset();
        assert!(!tracker.is_active());
        assert_eq!(tracker.counters(), &[0, 0]);
    }
}
