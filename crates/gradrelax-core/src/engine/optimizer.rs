//! Adam over candle variables, with the AMSGrad running maximum of the second moment.
//!
//! Updates follow the bias-corrected form
//! `θ ← θ - lr / (1 - β1^t) · m / (sqrt(v̂ / (1 - β2^t)) + ε)`, where `v̂` is the running
//! maximum of `v` when AMSGrad is on and `v` itself otherwise. Weight decay, when non-zero,
//! is added to the gradient as an L2 term.

use candle_core::backprop::GradStore;
use candle_core::{Result, Var};
use candle_nn::Optimizer;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamsAdam {
    pub lr: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub eps: f64,
    pub weight_decay: f64,
    pub amsgrad: bool,
}

impl Default for ParamsAdam {
    fn default() -> Self {
        Self {
            lr: 0.001,
            beta1: 0.9,
            beta2: 0.999,
            eps: 0.1,
            weight_decay: 0.0,
            amsgrad: true,
        }
    }
}

#[derive(Debug)]
struct VarAdam {
    var: Var,
    first_moment: Var,
    second_moment: Var,
    max_second_moment: Option<Var>,
}

#[derive(Debug)]
pub struct AdamAmsGrad {
    vars: Vec<VarAdam>,
    step_t: usize,
    params: ParamsAdam,
}

impl AdamAmsGrad {
    pub fn params(&self) -> &ParamsAdam {
        &self.params
    }

    /// Number of completed update steps.
    pub fn step_count(&self) -> usize {
        self.step_t
    }
}

impl Optimizer for AdamAmsGrad {
    type Config = ParamsAdam;

    fn new(vars: Vec<Var>, params: ParamsAdam) -> Result<Self> {
        let vars = vars
            .into_iter()
            .filter(|var| var.dtype().is_float())
            .map(|var| {
                let dtype = var.dtype();
                let shape = var.shape();
                let device = var.device();
                let first_moment = Var::zeros(shape, dtype, device)?;
                let second_moment = Var::zeros(shape, dtype, device)?;
                let max_second_moment = if params.amsgrad {
                    Some(Var::zeros(shape, dtype, device)?)
                } else {
                    None
                };
                Ok(VarAdam {
                    var,
                    first_moment,
                    second_moment,
                    max_second_moment,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            vars,
            step_t: 0,
            params,
        })
    }

    fn learning_rate(&self) -> f64 {
        self.params.lr
    }

    fn set_learning_rate(&mut self, lr: f64) {
        self.params.lr = lr;
    }

    fn step(&mut self, grads: &GradStore) -> Result<()> {
        self.step_t += 1;
        let ParamsAdam {
            lr,
            beta1,
            beta2,
            eps,
            weight_decay,
            ..
        } = self.params;
        let scale_m = 1.0 / (1.0 - beta1.powi(self.step_t as i32));
        let scale_v = 1.0 / (1.0 - beta2.powi(self.step_t as i32));

        for var in &self.vars {
            let theta = &var.var;
            // Variables outside the loss graph keep their value and moments.
            let Some(grad) = grads.get(theta.as_tensor()) else {
                continue;
            };
            let grad = if weight_decay != 0.0 {
                (grad + (theta.as_tensor() * weight_decay)?)?
            } else {
                grad.clone()
            };

            let m = ((var.first_moment.as_tensor() * beta1)? + (&grad * (1.0 - beta1))?)?;
            let v = ((var.second_moment.as_tensor() * beta2)? + (grad.sqr()? * (1.0 - beta2))?)?;
            let v_hat = match &var.max_second_moment {
                Some(max_v) => {
                    let max = max_v.as_tensor().maximum(&v)?;
                    max_v.set(&max)?;
                    max
                }
                None => v.clone(),
            };

            let denom = ((v_hat * scale_v)?.sqrt()? + eps)?;
            let update = ((&m * (lr * scale_m))? / denom)?;
            let next = theta.as_tensor().sub(&update)?;
            theta.set(&next)?;
            var.first_moment.set(&m)?;
            var.second_moment.set(&v)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{Device, Tensor};

    fn value(var: &Var) -> Vec<f32> {
        var.as_tensor().flatten_all().unwrap().to_vec1::<f32>().unwrap()
    }

    fn linear_loss(var: &Var, slope: f64) -> Tensor {
        (var.as_tensor() * slope).unwrap().sum_all().unwrap()
    }

    #[test]
    fn first_step_matches_bias_corrected_update() {
        let x = Var::new(&[1.0f32], &Device::Cpu).unwrap();
        let params = ParamsAdam {
            lr: 0.1,
            ..Default::default()
        };
        let mut opt = AdamAmsGrad::new(vec![x.clone()], params).unwrap();
        opt.backward_step(&linear_loss(&x, 1.0)).unwrap();

        // m̂ = 1, sqrt(v̂) = 1, so the step is lr / (1 + eps).
        let expected = 1.0 - 0.1 / 1.1;
        assert!((value(&x)[0] - expected as f32).abs() < 1e-6);
        assert_eq!(opt.step_count(), 1);
    }

    #[test]
    fn amsgrad_keeps_the_largest_second_moment() {
        let with = Var::new(&[0.0f32], &Device::Cpu).unwrap();
        let without = Var::new(&[0.0f32], &Device::Cpu).unwrap();
        let mut opt_with = AdamAmsGrad::new(vec![with.clone()], ParamsAdam::default()).unwrap();
        let mut opt_without = AdamAmsGrad::new(
            vec![without.clone()],
            ParamsAdam {
                amsgrad: false,
                ..Default::default()
            },
        )
        .unwrap();

        for slope in [100.0, 0.01, 0.01] {
            opt_with.backward_step(&linear_loss(&with, slope)).unwrap();
            opt_without.backward_step(&linear_loss(&without, slope)).unwrap();
        }
        // The maximum keeps the denominator large once the gradient shrinks.
        assert_ne!(value(&with)[0], value(&without)[0]);
        assert!(value(&with)[0] < 0.0);
        assert!(value(&without)[0] < 0.0);
    }

    #[test]
    fn variables_without_gradient_are_untouched() {
        let used = Var::new(&[1.0f32, 2.0], &Device::Cpu).unwrap();
        let unused = Var::new(&[3.0f32, 4.0], &Device::Cpu).unwrap();
        let mut opt =
            AdamAmsGrad::new(vec![unused.clone(), used.clone()], ParamsAdam::default()).unwrap();
        opt.backward_step(&linear_loss(&used, 1.0)).unwrap();
        assert_eq!(value(&unused), vec![3.0, 4.0]);
        assert!(value(&used)[0] < 1.0);
    }

    #[test]
    fn learning_rate_can_be_changed_between_steps() {
        let x = Var::new(&[1.0f32], &Device::Cpu).unwrap();
        let mut opt = AdamAmsGrad::new(vec![x], ParamsAdam::default()).unwrap();
        assert_eq!(opt.learning_rate(), 0.001);
        opt.set_learning_rate(0.5);
        assert_eq!(opt.learning_rate(), 0.5);
        assert_eq!(opt.params().lr, 0.5);
    }
}
