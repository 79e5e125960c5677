use crate::core::conformation::ConformationParams;
use crate::core::models::info::StructureInfo;
use crate::core::models::shape::ConformationShape;
use crate::engine::collaborators::{EnergyModel, StructureTransform};
use crate::engine::config::{ConfigError, RelaxConfig};
use crate::engine::convergence::{EarlyStopPolicy, StagnationTracker};
use crate::engine::error::EngineError;
use crate::engine::optimizer::AdamAmsGrad;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::scheduler::ReduceLrOnPlateau;
use crate::engine::state::{EpochRecord, RelaxResult, Termination};
use candle_core::{DType, Tensor};
use candle_nn::Optimizer;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// Caller-supplied extras that do not affect the numerics of a run.
#[derive(Default)]
pub struct RelaxOptions<'a> {
    /// Atom names co-indexed with the coordinates, used only in diagnostics.
    pub atom_names: Option<&'a [String]>,
    /// Checked after every completed epoch; raising it ends the run early.
    pub stop_flag: Option<Arc<AtomicBool>>,
    /// Replaces the configured early-stop policy.
    pub early_stop: Option<&'a dyn EarlyStopPolicy>,
}

/// Relaxes `base` by gradient descent on the energy predicted by `model`.
///
/// Per-residue rotation and translation parameters are created at zero, pushed through
/// `transform` every epoch, and updated from the gradient of the summed energy. The
/// returned result carries the energy and coordinates of the last completed epoch.
#[instrument(skip_all, name = "relax_workflow")]
pub fn run<E, T>(
    model: &E,
    transform: &T,
    base: &Tensor,
    info: &StructureInfo,
    config: &RelaxConfig,
    options: &RelaxOptions,
    reporter: &ProgressReporter,
) -> Result<RelaxResult, EngineError>
where
    E: EnergyModel + ?Sized,
    T: StructureTransform + ?Sized,
{
    config.validate()?;

    // === Phase 0: Parametrization ===
    reporter.report(Progress::PhaseStart {
        name: "Preparation",
    });
    let shape = ConformationShape::from_info(info)?;
    let params = ConformationParams::zeros(shape, base.device())?;
    let mut optimizer = AdamAmsGrad::new(params.trainable_vars(), config.optimizer)?;
    let mut scheduler = ReduceLrOnPlateau::new(config.optimizer.lr, config.scheduler);
    let mut tracker = StagnationTracker::new(&shape);
    let early_stop: &dyn EarlyStopPolicy = match options.early_stop {
        Some(policy) => policy,
        None => &config.early_stop,
    };
    let atom_names = usable_atom_names(options.atom_names, base);
    info!(
        batch = shape.batch,
        chains = shape.chains,
        residues = shape.residues,
        alternates = shape.alternates,
        epochs = config.epochs,
        lr = config.optimizer.lr,
        "Starting structure relaxation."
    );
    reporter.report(Progress::PhaseFinish);

    // === Phase 1: Epoch loop ===
    reporter.report(Progress::PhaseStart { name: "Relaxation" });
    reporter.report(Progress::RunStart {
        epochs: config.epochs,
    });

    let mut history = Vec::with_capacity(config.epochs);
    let mut last = None;
    let mut termination = Termination::EpochsExhausted;

    for epoch in 0..config.epochs {
        let started = Instant::now();
        let backbone_enabled = config.backbone.is_enabled_at(epoch);
        if epoch > 0 && backbone_enabled && !config.backbone.is_enabled_at(epoch - 1) {
            info!(epoch, "Backbone translations unlocked.");
            reporter.report(Progress::BackboneUnlocked { epoch });
        }

        let angles = params.rotation_angles()?;
        let coords = transform.apply(
            base,
            info,
            &angles,
            params.translation().as_tensor(),
            backbone_enabled,
        )?;
        let energy = model.evaluate(&coords, info)?;
        let loss = energy.sum_all()?;
        let loss_value = loss.to_dtype(DType::F64)?.to_scalar::<f64>()?;
        if config.divergence_check && !loss_value.is_finite() {
            return Err(EngineError::Divergence {
                epoch,
                loss: loss_value,
            });
        }

        let learning_rate = optimizer.learning_rate();
        optimizer.backward_step(&loss)?;
        optimizer.set_learning_rate(scheduler.step(loss_value));
        tracker.update(&energy)?;

        let record = EpochRecord {
            epoch,
            loss: loss_value,
            learning_rate,
            backbone_enabled,
            duration: started.elapsed(),
        };
        log_epoch(config.verbose, &record, atom_names, base, &coords);
        reporter.report(Progress::Epoch {
            epoch,
            loss: loss_value,
            learning_rate,
        });
        history.push(record);
        last = Some((energy.detach(), coords.detach()));

        if early_stop.should_stop(epoch, &tracker) {
            info!(epoch, "Every residue has stagnated; stopping early.");
            termination = Termination::EarlyStopped { epoch };
            break;
        }
        if let Some(flag) = &options.stop_flag {
            if flag.load(Ordering::Relaxed) {
                info!(epoch, "Stop requested; ending relaxation.");
                termination = Termination::Cancelled { epoch };
                break;
            }
        }
    }

    reporter.report(Progress::RunFinish {
        epochs_run: history.len(),
        termination,
    });
    reporter.report(Progress::PhaseFinish);

    let Some((energy, coords)) = last else {
        return Err(ConfigError::InvalidEpochs(config.epochs).into());
    };
    let total: Duration = history.iter().map(|r: &EpochRecord| r.duration).sum();
    info!(
        epochs_run = history.len(),
        final_loss = history.last().map(|r| r.loss),
        lr_reductions = scheduler.reductions(),
        elapsed_ms = total.as_millis() as u64,
        "Relaxation complete."
    );

    Ok(RelaxResult {
        energy,
        coords,
        params,
        history,
        termination,
    })
}

fn usable_atom_names<'a>(names: Option<&'a [String]>, base: &Tensor) -> Option<&'a [String]> {
    let names = names?;
    let atoms = atom_count(base);
    if names.len() == atoms {
        Some(names)
    } else {
        warn!(
            names = names.len(),
            atoms, "Atom name list does not match the coordinates; ignoring it."
        );
        None
    }
}

fn atom_count(coords: &Tensor) -> usize {
    let dims = coords.dims();
    match dims.split_last() {
        Some((_, leading)) => leading.iter().product(),
        None => 0,
    }
}

/// Index and distance of the atom that moved furthest from `base`.
fn max_displacement(base: &Tensor, coords: &Tensor) -> candle_core::Result<Option<(usize, f64)>> {
    let diff = coords.sub(base)?;
    let last_dim = diff.rank().saturating_sub(1);
    let distances = diff
        .sqr()?
        .sum(last_dim)?
        .sqrt()?
        .flatten_all()?
        .to_dtype(DType::F64)?
        .to_vec1::<f64>()?;
    Ok(distances
        .into_iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(&b.1)))
}

fn log_epoch(
    verbose: bool,
    record: &EpochRecord,
    atom_names: Option<&[String]>,
    base: &Tensor,
    coords: &Tensor,
) {
    let elapsed_ms = record.duration.as_secs_f64() * 1000.0;
    if !verbose {
        debug!(
            epoch = record.epoch,
            loss = record.loss,
            lr = record.learning_rate,
            elapsed_ms,
            "Epoch complete."
        );
        return;
    }

    info!(
        epoch = record.epoch,
        loss = record.loss,
        lr = record.learning_rate,
        elapsed_ms,
        "Optimizing epoch {}: loss {:.4}.",
        record.epoch,
        record.loss
    );
    if let Some(names) = atom_names {
        // Diagnostics never fail the run.
        if let Ok(Some((index, distance))) = max_displacement(base, coords) {
            if let Some(name) = names.get(index) {
                info!(
                    epoch = record.epoch,
                    atom = name.as_str(),
                    index,
                    distance,
                    "Largest displacement from the input structure."
                );
            }
        }
    }
}
