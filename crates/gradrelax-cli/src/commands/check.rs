use crate::cli::CheckArgs;
use crate::config::PartialConfig;
use crate::error::Result;
use gradrelax::engine::config::{BackbonePolicy, RelaxConfig};
use gradrelax::engine::convergence::EarlyStop;
use std::fmt::Write;
use tracing::{debug, info};

pub fn run(args: CheckArgs) -> Result<()> {
    let config = PartialConfig::load(args.config.as_deref())?.merge_with_cli(&args)?;
    debug!("Effective relaxation config: {:?}", config);
    info!(epochs = config.epochs, "Relaxation settings are valid.");

    print!("{}", render(&config));
    Ok(())
}

fn render(config: &RelaxConfig) -> String {
    let opt = &config.optimizer;
    let sched = &config.scheduler;
    let mut out = String::new();

    let _ = writeln!(out, "Relaxation settings:");
    let _ = writeln!(out, "  epochs:           {}", config.epochs);
    let _ = writeln!(out, "  learning rate:    {}", opt.lr);
    let _ = writeln!(
        out,
        "  optimizer:        {} (betas {}/{}, eps {}, weight decay {})",
        if opt.amsgrad { "AMSGrad" } else { "Adam" },
        opt.beta1,
        opt.beta2,
        opt.eps,
        opt.weight_decay
    );
    let _ = writeln!(
        out,
        "  scheduler:        x{} after {} stalled epoch(s) (threshold {}, cooldown {}, min lr {})",
        sched.factor, sched.patience, sched.threshold, sched.cooldown, sched.min_lr
    );
    let backbone = match config.backbone {
        BackbonePolicy::Frozen => "frozen".to_string(),
        BackbonePolicy::Enabled => "enabled".to_string(),
        BackbonePolicy::UnlockAfter { epoch } => format!("frozen through epoch {}", epoch),
    };
    let _ = writeln!(out, "  backbone:         {}", backbone);
    let early_stop = match config.early_stop {
        EarlyStop::Never => "off".to_string(),
        EarlyStop::AllResiduesStagnant { patience } => {
            format!("when every residue stalls for {} epoch(s)", patience)
        }
    };
    let _ = writeln!(out, "  early stop:       {}", early_stop);
    let _ = writeln!(
        out,
        "  divergence check: {}",
        if config.divergence_check { "on" } else { "off" }
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use gradrelax::engine::config::RelaxConfigBuilder;

    #[test]
    fn render_shows_every_setting() {
        let config = RelaxConfigBuilder::new()
            .epochs(40)
            .learning_rate(0.05)
            .backbone_policy(BackbonePolicy::UnlockAfter { epoch: 10 })
            .early_stop(EarlyStop::AllResiduesStagnant { patience: 3 })
            .build()
            .unwrap();
        let text = render(&config);
        assert!(text.contains("epochs:           40"));
        assert!(text.contains("learning rate:    0.05"));
        assert!(text.contains("AMSGrad"));
        assert!(text.contains("frozen through epoch 10"));
        assert!(text.contains("stalls for 3 epoch(s)"));
        assert!(text.contains("divergence check: off"));
    }
}
