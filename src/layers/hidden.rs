//! The module that defines the hidden layer

use candle_core::Tensor;
use savefile_derive::Savefile;

use super::{
    dense::{construct_dense, propagate_dense, ConstructedDense},
    DenseOptions, Layer, LayerConfig, LayerResults, LayerType, LayersConfigs, VariableSpec,
};
use crate::{
    feed::RunFeeds,
    session::Variables,
    types::{LayerConstructionError, LayerPropagationError, NetworkLayer},
};

#[derive(Debug, Clone, Savefile)]
/// A dense layer for original or simple neural networks, it multiplies its flat inputs by its
/// weights, adds its biases and applies its activator.
///
/// A hidden layer cannot follow a conv layer, a [FcLayer](super::FcLayer) flattens the images
/// first.
///
/// # Examples
///
/// ```rust
/// use tfnn::layers::{Activator, DenseOptions, HiddenLayer};
///
/// let layer = HiddenLayer::new_raw(10, DenseOptions::new().activator(Activator::Tanh));
/// assert_eq!(layer.n_neurons, 10);
/// ```
pub struct HiddenLayer {
    /// The amount of outputs of the layer.
    pub n_neurons: usize,
    /// The options the layer was created with.
    pub options: DenseOptions,

    #[savefile_ignore]
    #[savefile_introspect_ignore]
    constructed: Option<ConstructedDense>,
}

impl HiddenLayer {
    /// Creates a new Hidden layer ready to be built into a Network.
    pub fn new(n_neurons: usize, options: DenseOptions) -> NetworkLayer {
        Self::new_raw(n_neurons, options).into()
    }

    /// Creates a new raw Hidden layer.
    pub fn new_raw(n_neurons: usize, options: DenseOptions) -> Self {
        HiddenLayer {
            n_neurons,
            options,
            constructed: None,
        }
    }
}

impl Layer for HiddenLayer {
    fn layer_type(&self) -> LayerType {
        LayerType::Hidden
    }

    fn construct(&mut self, configs: &LayersConfigs) -> Result<(), LayerConstructionError> {
        self.constructed = Some(construct_dense(
            LayerType::Hidden,
            self.n_neurons,
            &self.options,
            configs,
        )?);

        Ok(())
    }

    fn config(&self) -> Option<&LayerConfig> {
        self.constructed.as_ref().map(|constructed| &constructed.config)
    }

    fn weights(&self) -> Option<&VariableSpec> {
        self.constructed.as_ref().map(|constructed| &constructed.weights)
    }

    fn biases(&self) -> Option<&VariableSpec> {
        self.constructed.as_ref().map(|constructed| &constructed.biases)
    }

    fn propagate(
        &self,
        inputs: &Tensor,
        variables: &Variables,
        feeds: &RunFeeds,
    ) -> Result<LayerResults, LayerPropagationError> {
        propagate_dense(self.constructed.as_ref(), &self.options, inputs, variables, feeds)
    }
}
