use tracing::debug;

/// Relative improvement test used by [`ReduceLrOnPlateau`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlateauParams {
    /// Multiplier applied to the learning rate on each reduction, in `(0, 1)`.
    pub factor: f64,
    /// Number of non-improving epochs tolerated before a reduction.
    pub patience: usize,
    /// A loss counts as an improvement only below `best * (1 - threshold)`.
    pub threshold: f64,
    /// Epochs to wait after a reduction before counting bad epochs again.
    pub cooldown: usize,
    pub min_lr: f64,
    /// Reductions smaller than this are skipped.
    pub eps: f64,
}

impl Default for PlateauParams {
    fn default() -> Self {
        Self {
            factor: 0.9,
            patience: 10,
            threshold: 1e-4,
            cooldown: 0,
            min_lr: 0.0,
            eps: 1e-8,
        }
    }
}

/// Multiplies the learning rate by `factor` once the loss has failed to improve for more
/// than `patience` consecutive epochs.
#[derive(Debug, Clone)]
pub struct ReduceLrOnPlateau {
    params: PlateauParams,
    lr: f64,
    best: f64,
    num_bad_epochs: usize,
    cooldown_counter: usize,
    reductions: usize,
}

impl ReduceLrOnPlateau {
    pub fn new(initial_lr: f64, params: PlateauParams) -> Self {
        Self {
            params,
            lr: initial_lr,
            best: f64::INFINITY,
            num_bad_epochs: 0,
            cooldown_counter: 0,
            reductions: 0,
        }
    }

    /// Records one epoch's loss and returns the learning rate for the next epoch.
    pub fn step(&mut self, loss: f64) -> f64 {
        if self.is_better(loss) {
            self.best = loss;
            self.num_bad_epochs = 0;
        } else {
            self.num_bad_epochs += 1;
        }

        if self.cooldown_counter > 0 {
            self.cooldown_counter -= 1;
            self.num_bad_epochs = 0;
        }

        if self.num_bad_epochs > self.params.patience {
            self.reduce();
            self.cooldown_counter = self.params.cooldown;
            self.num_bad_epochs = 0;
        }
        self.lr
    }

    pub fn learning_rate(&self) -> f64 {
        self.lr
    }

    pub fn best(&self) -> f64 {
        self.best
    }

    pub fn reductions(&self) -> usize {
        self.reductions
    }

    fn is_better(&self, loss: f64) -> bool {
        loss < self.best * (1.0 - self.params.threshold)
    }

    fn reduce(&mut self) {
        let new_lr = (self.lr * self.params.factor).max(self.params.min_lr);
        if self.lr - new_lr > self.params.eps {
            debug!(old = self.lr, new = new_lr, "Reducing learning rate on plateau.");
            self.lr = new_lr;
            self.reductions += 1;
        }
    }
}
