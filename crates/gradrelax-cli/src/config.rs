use crate::cli::{CheckArgs, ParamsArgs};
use crate::error::{CliError, Result};
use gradrelax::core::params::store::ParameterPaths;
use gradrelax::engine::config::{BackbonePolicy, RelaxConfig, RelaxConfigBuilder};
use gradrelax::engine::convergence::EarlyStop;
use gradrelax::engine::scheduler::PlateauParams;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

pub const DEFAULT_EPOCHS: usize = 5;
pub const DEFAULT_LEARNING_RATE: f64 = 0.1;

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialParametersConfig {
    coordinate_table: Option<PathBuf>,
    hbond_table: Option<PathBuf>,
    overrides: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialSchedulerConfig {
    factor: Option<f64>,
    patience: Option<usize>,
    threshold: Option<f64>,
    cooldown: Option<usize>,
    min_lr: Option<f64>,
    eps: Option<f64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialEarlyStopConfig {
    patience: Option<u32>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialOptimizationConfig {
    epochs: Option<usize>,
    learning_rate: Option<f64>,
    backbone_rotation: Option<bool>,
    unlock_backbone_after: Option<usize>,
    betas: Option<[f64; 2]>,
    eps: Option<f64>,
    amsgrad: Option<bool>,
    weight_decay: Option<f64>,
    verbose: Option<bool>,
    divergence_check: Option<bool>,
    scheduler: Option<PartialSchedulerConfig>,
    early_stop: Option<PartialEarlyStopConfig>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialConfig {
    parameters: Option<PartialParametersConfig>,
    optimization: Option<PartialOptimizationConfig>,
    /// Directory relative file paths are resolved against.
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

impl PartialConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Resolves the parameter table locations; CLI paths win over file paths.
    pub fn parameter_paths(mut self, args: &ParamsArgs) -> Result<ParameterPaths> {
        let file = self.parameters.take().unwrap_or_default();

        let coordinate_table = self.pick_path(
            args.coordinate_table.as_ref(),
            file.coordinate_table,
            "parameters.coordinate-table",
        )?;
        let hbond_table = self.pick_path(
            args.hbond_table.as_ref(),
            file.hbond_table,
            "parameters.hbond-table",
        )?;
        let overrides = match (args.overrides.as_ref(), file.overrides) {
            (None, None) => None,
            (cli, from_file) => Some(self.pick_path(cli, from_file, "parameters.overrides")?),
        };

        Ok(ParameterPaths {
            coordinate_table,
            hbond_table,
            overrides,
        })
    }

    pub fn merge_with_cli(mut self, args: &CheckArgs) -> Result<RelaxConfig> {
        self.apply_set_values(&args.set_values)?;
        let opt = self.optimization.take().unwrap_or_default();

        let backbone = if args.backbone_rotation {
            BackbonePolicy::Enabled
        } else if let Some(epoch) = args.unlock_backbone_after.or(opt.unlock_backbone_after) {
            BackbonePolicy::UnlockAfter { epoch }
        } else {
            BackbonePolicy::from_flag(opt.backbone_rotation.unwrap_or(false))
        };

        let mut builder = RelaxConfigBuilder::new()
            .epochs(args.epochs.or(opt.epochs).unwrap_or(DEFAULT_EPOCHS))
            .learning_rate(
                args.learning_rate
                    .or(opt.learning_rate)
                    .unwrap_or(DEFAULT_LEARNING_RATE),
            )
            .backbone_policy(backbone)
            .verbose(opt.verbose.unwrap_or(false))
            .divergence_check(args.divergence_check || opt.divergence_check.unwrap_or(false))
            .scheduler(Self::merge_scheduler(opt.scheduler));

        if let Some([beta1, beta2]) = opt.betas {
            builder = builder.betas(beta1, beta2);
        }
        if let Some(eps) = opt.eps {
            builder = builder.eps(eps);
        }
        if let Some(amsgrad) = opt.amsgrad {
            builder = builder.amsgrad(amsgrad);
        }
        if let Some(weight_decay) = opt.weight_decay {
            builder = builder.weight_decay(weight_decay);
        }
        if let Some(patience) = opt.early_stop.and_then(|e| e.patience) {
            builder = builder.early_stop(EarlyStop::AllResiduesStagnant { patience });
        }

        Ok(builder.build()?)
    }

    fn merge_scheduler(partial: Option<PartialSchedulerConfig>) -> PlateauParams {
        let partial = partial.unwrap_or_default();
        let defaults = PlateauParams::default();
        PlateauParams {
            factor: partial.factor.unwrap_or(defaults.factor),
            patience: partial.patience.unwrap_or(defaults.patience),
            threshold: partial.threshold.unwrap_or(defaults.threshold),
            cooldown: partial.cooldown.unwrap_or(defaults.cooldown),
            min_lr: partial.min_lr.unwrap_or(defaults.min_lr),
            eps: partial.eps.unwrap_or(defaults.eps),
        }
    }

    fn pick_path(
        &self,
        cli: Option<&PathBuf>,
        from_file: Option<PathBuf>,
        key: &str,
    ) -> Result<PathBuf> {
        let path = match (cli, from_file) {
            (Some(path), _) => path.clone(),
            (None, Some(path)) => match &self.base_dir {
                Some(dir) if path.is_relative() => dir.join(path),
                _ => path,
            },
            (None, None) => {
                return Err(CliError::Config(format!(
                    "A value for '{}' is required either in the config file or via CLI argument.",
                    key
                )));
            }
        };
        if !path.exists() {
            return Err(CliError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Provided path does not exist: {}", path.display()),
            )));
        }
        Ok(path)
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value)) = kv_pair.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };
            let opt = self.optimization.get_or_insert_with(Default::default);

            match key {
                "optimization.epochs" => opt.epochs = Some(parse_value(key, value)?),
                "optimization.learning-rate" => opt.learning_rate = Some(parse_value(key, value)?),
                "optimization.eps" => opt.eps = Some(parse_value(key, value)?),
                "optimization.amsgrad" => opt.amsgrad = Some(parse_value(key, value)?),
                "optimization.weight-decay" => opt.weight_decay = Some(parse_value(key, value)?),
                "optimization.backbone-rotation" => {
                    opt.backbone_rotation = Some(parse_value(key, value)?)
                }
                "optimization.unlock-backbone-after" => {
                    opt.unlock_backbone_after = Some(parse_value(key, value)?)
                }
                "optimization.verbose" => opt.verbose = Some(parse_value(key, value)?),
                "optimization.divergence-check" => {
                    opt.divergence_check = Some(parse_value(key, value)?)
                }
                "optimization.early-stop.patience" => {
                    opt.early_stop
                        .get_or_insert_with(Default::default)
                        .patience = Some(parse_value(key, value)?)
                }
                _ => {
                    let Some(field) = key.strip_prefix("optimization.scheduler.") else {
                        return Err(unsupported_key(key));
                    };
                    let scheduler = opt.scheduler.get_or_insert_with(Default::default);
                    match field {
                        "factor" => scheduler.factor = Some(parse_value(key, value)?),
                        "patience" => scheduler.patience = Some(parse_value(key, value)?),
                        "threshold" => scheduler.threshold = Some(parse_value(key, value)?),
                        "cooldown" => scheduler.cooldown = Some(parse_value(key, value)?),
                        "min-lr" => scheduler.min_lr = Some(parse_value(key, value)?),
                        "eps" => scheduler.eps = Some(parse_value(key, value)?),
                        _ => return Err(unsupported_key(key)),
                    }
                }
            }
        }
        Ok(())
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        CliError::Config(format!(
            "Invalid {} value for {}: {}",
            std::any::type_name::<T>(),
            key,
            value
        ))
    })
}

fn unsupported_key(key: &str) -> CliError {
    CliError::Config(format!(
        "Unsupported configuration key for --set: '{}'",
        key
    ))
}
