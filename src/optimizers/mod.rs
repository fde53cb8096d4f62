//! The module that contains the optimizers a Network can be trained with.
//!
//! The update rules themselves live in candle, an Optimizer here only decides which one is used
//! and with what hyper parameters.

use candle_core::{Tensor, Var};
use candle_nn::{AdamW, Optimizer as CandleOptimizer, ParamsAdamW, SGD};
use savefile_derive::Savefile;
use tfnn_macros::FromForAllUnnamedVariants;

#[derive(Debug, Clone, Copy, PartialEq, Savefile)]
/// Plain gradient descent, subtracts the gradients scaled by the learning rate.
pub struct GradientDescent {
    /// The scale applied to the gradients.
    pub learning_rate: f64,
}

impl GradientDescent {
    /// Creates a new gradient descent optimizer.
    pub fn new(learning_rate: f64) -> Self {
        GradientDescent { learning_rate }
    }
}

impl Default for GradientDescent {
    fn default() -> Self {
        Self::new(0.001)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Savefile)]
/// An optimizer that works well with pretty much everything. It keeps a running average of the
/// gradients and of their squares, and scales every update by both.
pub struct Adam {
    /// The step size.
    pub learning_rate: f64,
    /// The decay of the running average of the gradients.
    pub beta1: f64,
    /// The decay of the running average of the squared gradients.
    pub beta2: f64,
    /// Keeps the updates from dividing by zero.
    pub epsilon: f64,
}

impl Adam {
    /// Creates a new Adam optimizer with the usual 0.9, 0.999 and 1e-8 hyper parameters.
    pub fn new(learning_rate: f64) -> Self {
        Adam {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
        }
    }
}

impl Default for Adam {
    fn default() -> Self {
        Self::new(0.001)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Savefile, FromForAllUnnamedVariants)]
/// All of the optimizers a Network can use.
#[allow(missing_docs)]
pub enum Optimizer {
    GradientDescent(GradientDescent),
    Adam(Adam),
}

impl Default for Optimizer {
    fn default() -> Self {
        Optimizer::GradientDescent(GradientDescent::default())
    }
}

impl Optimizer {
    /// The learning rate of the optimizer.
    pub fn learning_rate(&self) -> f64 {
        match self {
            Optimizer::GradientDescent(optimizer) => optimizer.learning_rate,
            Optimizer::Adam(optimizer) => optimizer.learning_rate,
        }
    }

    /// Creates the train op that minimizes losses with respect to `vars`.
    pub fn minimize(&self, vars: Vec<Var>) -> candle_core::Result<TrainOp> {
        Ok(match self {
            Optimizer::GradientDescent(optimizer) => {
                TrainOp::GradientDescent(SGD::new(vars, optimizer.learning_rate)?)
            }
            Optimizer::Adam(optimizer) => TrainOp::Adam(AdamW::new(
                vars,
                ParamsAdamW {
                    lr: optimizer.learning_rate,
                    beta1: optimizer.beta1,
                    beta2: optimizer.beta2,
                    eps: optimizer.epsilon,
                    weight_decay: 0.0,
                },
            )?),
        })
    }
}

/// The state of an optimizer bound to the variables of a Session.
pub enum TrainOp {
    /// candle's SGD.
    GradientDescent(SGD),
    /// candle's AdamW without weight decay.
    Adam(AdamW),
}

impl std::fmt::Debug for TrainOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrainOp::GradientDescent(_) => write!(f, "TrainOp::GradientDescent"),
            TrainOp::Adam(_) => write!(f, "TrainOp::Adam"),
        }
    }
}

impl TrainOp {
    /// Computes the gradients of the loss and applies one update to every variable.
    pub fn backward_step(&mut self, loss: &Tensor) -> candle_core::Result<()> {
        match self {
            TrainOp::GradientDescent(optimizer) => optimizer.backward_step(loss),
            TrainOp::Adam(optimizer) => optimizer.backward_step(loss),
        }
    }
}

#[cfg(test)]
mod tests {
    use candle_core::{Device, Var};

    use super::{Adam, GradientDescent, Optimizer};

    fn step_towards_three(optimizer: Optimizer) -> f32 {
        let w = Var::new(0.0f32, &Device::Cpu).unwrap();
        let mut train_op = optimizer.minimize(vec![w.clone()]).unwrap();

        let loss = w.as_tensor().affine(1.0, -3.0).unwrap().sqr().unwrap();
        train_op.backward_step(&loss).unwrap();

        w.as_tensor().to_scalar::<f32>().unwrap()
    }

    #[test]
    fn default_optimizer_should_be_gradient_descent_with_0_001() {
        assert_eq!(
            Optimizer::default(),
            Optimizer::GradientDescent(GradientDescent::new(0.001))
        );
        assert_eq!(Optimizer::default().learning_rate(), 0.001);
    }

    #[test]
    fn gradient_descent_should_move_against_the_gradient() {
        // d/dw (w - 3)^2 = -6 at w = 0
        let w = step_towards_three(GradientDescent::new(0.1).into());

        assert!((w - 0.6).abs() < 1e-6);
    }

    #[test]
    fn adam_should_move_by_about_the_learning_rate() {
        let w = step_towards_three(Adam::new(0.1).into());

        assert!((w - 0.1).abs() < 1e-4);
    }
}
