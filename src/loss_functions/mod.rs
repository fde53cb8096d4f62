//! The losses a Network is trained on, every one of them written as framework tensor operations
//! so that the gradients come from candle's autodiff.

use candle_core::{DType, Device, Tensor, D};

use crate::types::NetworkType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// A function for computing the loss of a Network on some batch.
pub enum LossFunction {
    /// The mean of the squared differences over every output of every sample.
    MeanSquared,
    /// The cross entropy between the softmax of the outputs and one-hot targets, averaged over
    /// the samples.
    SoftmaxCrossEntropy,
}

impl LossFunction {
    /// The loss a Network of some type is trained on.
    pub fn for_network(network_type: NetworkType) -> Self {
        match network_type {
            NetworkType::Regression => LossFunction::MeanSquared,
            NetworkType::Classification => LossFunction::SoftmaxCrossEntropy,
        }
    }

    /// Computes the loss of a (samples, outputs) batch as a scalar tensor.
    pub fn compute_loss(&self, outputs: &Tensor, targets: &Tensor) -> candle_core::Result<Tensor> {
        match self {
            LossFunction::MeanSquared => candle_nn::loss::mse(outputs, targets),
            LossFunction::SoftmaxCrossEntropy => {
                let log_probabilities = candle_nn::ops::log_softmax(outputs, D::Minus1)?;

                targets
                    .mul(&log_probabilities)?
                    .sum(D::Minus1)?
                    .neg()?
                    .mean_all()
            }
        }
    }
}

/// The L2 penalty `lambda * sum(||W||^2 / 2)` over the weights of every layer.
pub fn l2_penalty(weights: &[&Tensor], lambda: f32, device: &Device) -> candle_core::Result<Tensor> {
    let mut penalty: Option<Tensor> = None;

    for w in weights {
        let half_squared_norm = w.sqr()?.sum_all()?.affine(0.5, 0.0)?;
        penalty = Some(match penalty {
            Some(penalty) => penalty.add(&half_squared_norm)?,
            None => half_squared_norm,
        });
    }

    match penalty {
        Some(penalty) => penalty.affine(lambda as f64, 0.0),
        None => Tensor::zeros((), DType::F32, device),
    }
}

#[cfg(test)]
mod tests {
    use candle_core::{Device, Tensor};

    use super::{l2_penalty, LossFunction};
    use crate::types::NetworkType;

    #[test]
    fn should_pick_the_loss_by_network_type() {
        assert_eq!(
            LossFunction::for_network(NetworkType::Regression),
            LossFunction::MeanSquared
        );
        assert_eq!(
            LossFunction::for_network(NetworkType::Classification),
            LossFunction::SoftmaxCrossEntropy
        );
    }

    #[test]
    fn mean_squared_should_average_every_output() {
        let outputs = Tensor::new(&[[1.0f32, 2.0], [3.0, 4.0]], &Device::Cpu).unwrap();
        let targets = Tensor::new(&[[1.0f32, 0.0], [0.0, 4.0]], &Device::Cpu).unwrap();

        let loss = LossFunction::MeanSquared
            .compute_loss(&outputs, &targets)
            .unwrap()
            .to_scalar::<f32>()
            .unwrap();

        // (0 + 4 + 9 + 0) / 4
        assert!((loss - 3.25).abs() < 1e-6);
    }

    #[test]
    fn cross_entropy_of_equal_outputs_should_be_ln_of_the_classes() {
        let outputs = Tensor::zeros((3, 4), candle_core::DType::F32, &Device::Cpu).unwrap();
        let targets = Tensor::new(
            &[
                [1.0f32, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
            &Device::Cpu,
        )
        .unwrap();

        let loss = LossFunction::SoftmaxCrossEntropy
            .compute_loss(&outputs, &targets)
            .unwrap()
            .to_scalar::<f32>()
            .unwrap();

        assert!((loss - 4.0f32.ln()).abs() < 1e-5);
    }

    #[test]
    fn l2_penalty_should_be_half_the_squared_norms_scaled() {
        let first = Tensor::new(&[[1.0f32, 2.0]], &Device::Cpu).unwrap();
        let second = Tensor::new(&[3.0f32], &Device::Cpu).unwrap();

        let penalty = l2_penalty(&[&first, &second], 0.1, &Device::Cpu)
            .unwrap()
            .to_scalar::<f32>()
            .unwrap();

        // 0.1 * (5 / 2 + 9 / 2)
        assert!((penalty - 0.7).abs() < 1e-6);
    }
}
