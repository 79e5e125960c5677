use super::convergence::EarlyStop;
use super::optimizer::ParamsAdam;
use super::scheduler::PlateauParams;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Epoch count must be at least 1, got {0}")]
    InvalidEpochs(usize),

    #[error("Learning rate must be positive and finite, got {0}")]
    InvalidLearningRate(f64),

    #[error("Invalid optimizer parameter '{name}': {value}")]
    InvalidOptimizerParameter { name: &'static str, value: f64 },

    #[error("Invalid scheduler parameter '{name}': {value}")]
    InvalidSchedulerParameter { name: &'static str, value: f64 },
}

/// When backbone translations take part in the transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackbonePolicy {
    /// Side-chain rotations only.
    #[default]
    Frozen,
    /// Backbone translations active from the first epoch.
    Enabled,
    /// Frozen for epochs `0..=epoch`, enabled afterwards.
    UnlockAfter { epoch: usize },
}

impl BackbonePolicy {
    pub fn from_flag(enabled: bool) -> Self {
        if enabled {
            BackbonePolicy::Enabled
        } else {
            BackbonePolicy::Frozen
        }
    }

    pub fn is_enabled_at(&self, epoch: usize) -> bool {
        match self {
            BackbonePolicy::Frozen => false,
            BackbonePolicy::Enabled => true,
            BackbonePolicy::UnlockAfter { epoch: unlock } => epoch > *unlock,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelaxConfig {
    pub epochs: usize,
    pub optimizer: ParamsAdam,
    pub scheduler: PlateauParams,
    pub backbone: BackbonePolicy,
    pub early_stop: EarlyStop,
    /// Emit per-epoch diagnostics at `info` instead of `debug`.
    pub verbose: bool,
    /// Abort with an error on a non-finite loss.
    pub divergence_check: bool,
}

impl RelaxConfig {
    pub fn learning_rate(&self) -> f64 {
        self.optimizer.lr
    }

    /// Checks every value range; fields are public, so configs not built through
    /// [`RelaxConfigBuilder`] are re-checked before a run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.epochs == 0 {
            return Err(ConfigError::InvalidEpochs(self.epochs));
        }
        let opt = &self.optimizer;
        if !(opt.lr.is_finite() && opt.lr > 0.0) {
            return Err(ConfigError::InvalidLearningRate(opt.lr));
        }
        check_optimizer("beta1", opt.beta1, (0.0..1.0).contains(&opt.beta1))?;
        check_optimizer("beta2", opt.beta2, (0.0..1.0).contains(&opt.beta2))?;
        check_optimizer("eps", opt.eps, opt.eps.is_finite() && opt.eps > 0.0)?;
        check_optimizer(
            "weight_decay",
            opt.weight_decay,
            opt.weight_decay.is_finite() && opt.weight_decay >= 0.0,
        )?;

        let sched = &self.scheduler;
        check_scheduler("factor", sched.factor, sched.factor > 0.0 && sched.factor < 1.0)?;
        check_scheduler(
            "threshold",
            sched.threshold,
            sched.threshold.is_finite() && sched.threshold >= 0.0,
        )?;
        check_scheduler(
            "min_lr",
            sched.min_lr,
            sched.min_lr.is_finite() && sched.min_lr >= 0.0,
        )
    }
}

#[derive(Default)]
pub struct RelaxConfigBuilder {
    epochs: Option<usize>,
    learning_rate: Option<f64>,
    betas: Option<(f64, f64)>,
    eps: Option<f64>,
    amsgrad: Option<bool>,
    weight_decay: Option<f64>,
    scheduler: Option<PlateauParams>,
    backbone: Option<BackbonePolicy>,
    early_stop: Option<EarlyStop>,
    verbose: bool,
    divergence_check: bool,
}

impl RelaxConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn epochs(mut self, epochs: usize) -> Self {
        self.epochs = Some(epochs);
        self
    }
    pub fn learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = Some(lr);
        self
    }
    pub fn betas(mut self, beta1: f64, beta2: f64) -> Self {
        self.betas = Some((beta1, beta2));
        self
    }
    pub fn eps(mut self, eps: f64) -> Self {
        self.eps = Some(eps);
        self
    }
    pub fn amsgrad(mut self, enabled: bool) -> Self {
        self.amsgrad = Some(enabled);
        self
    }
    pub fn weight_decay(mut self, weight_decay: f64) -> Self {
        self.weight_decay = Some(weight_decay);
        self
    }
    pub fn scheduler(mut self, params: PlateauParams) -> Self {
        self.scheduler = Some(params);
        self
    }
    pub fn backbone_rotation(mut self, enabled: bool) -> Self {
        self.backbone = Some(BackbonePolicy::from_flag(enabled));
        self
    }
    pub fn backbone_policy(mut self, policy: BackbonePolicy) -> Self {
        self.backbone = Some(policy);
        self
    }
    pub fn early_stop(mut self, policy: EarlyStop) -> Self {
        self.early_stop = Some(policy);
        self
    }
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
    pub fn divergence_check(mut self, enabled: bool) -> Self {
        self.divergence_check = enabled;
        self
    }

    pub fn build(self) -> Result<RelaxConfig, ConfigError> {
        let epochs = self.epochs.ok_or(ConfigError::MissingParameter("epochs"))?;
        let lr = self
            .learning_rate
            .ok_or(ConfigError::MissingParameter("learning_rate"))?;

        let defaults = ParamsAdam::default();
        let (beta1, beta2) = self.betas.unwrap_or((defaults.beta1, defaults.beta2));
        let config = RelaxConfig {
            epochs,
            optimizer: ParamsAdam {
                lr,
                beta1,
                beta2,
                eps: self.eps.unwrap_or(defaults.eps),
                weight_decay: self.weight_decay.unwrap_or(defaults.weight_decay),
                amsgrad: self.amsgrad.unwrap_or(defaults.amsgrad),
            },
            scheduler: self.scheduler.unwrap_or_default(),
            backbone: self.backbone.unwrap_or_default(),
            early_stop: self.early_stop.unwrap_or_default(),
            verbose: self.verbose,
            divergence_check: self.divergence_check,
        };
        config.validate()?;
        Ok(config)
    }
}

fn check_optimizer(name: &'static str, value: f64, valid: bool) -> Result<(), ConfigError> {
    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidOptimizerParameter { name, value })
    }
}

fn check_scheduler(name: &'static str, value: f64, valid: bool) -> Result<(), ConfigError> {
    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidSchedulerParameter { name, value })
    }
}
