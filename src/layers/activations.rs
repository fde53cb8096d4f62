//! The activators a layer can apply to its `wx_plus_b`, each one expressed as framework tensor
//! operations so gradients flow through them.

use candle_core::Tensor;
use savefile_derive::Savefile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Savefile)]
/// An element-wise activation function.
pub enum Activator {
    /// max(0, x)
    Relu,
    /// 1 / (1 + e^-x)
    Sigmoid,
    /// The hyperbolic tangent.
    Tanh,
    /// ln(1 + e^x)
    Softplus,
    /// x for positive values, e^x - 1 otherwise.
    Elu,
}

impl Activator {
    /// Applies the activator to every value of the tensor.
    pub fn activate(&self, x: &Tensor) -> candle_core::Result<Tensor> {
        match self {
            Activator::Relu => x.relu(),
            Activator::Sigmoid => x.neg()?.exp()?.affine(1.0, 1.0)?.recip(),
            Activator::Tanh => x.tanh(),
            // relu(x) + ln(1 + e^-|x|) does not overflow for large inputs
            Activator::Softplus => {
                let tail = x.abs()?.neg()?.exp()?.affine(1.0, 1.0)?.log()?;
                x.relu()?.add(&tail)
            }
            Activator::Elu => x.elu(1.0),
        }
    }
}
