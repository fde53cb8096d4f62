//! The module that defines the fully connected layer

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
/// A dense layer that can follow a conv layer, images that come in get flattened in height,
/// width, channels order before being multiplied by the weights.
///
/// # Examples
///
/// ```rust
/// use tfnn::layers::{DenseOptions, FcLayer};
///
/// let layer = FcLayer::new_raw(64, DenseOptions::new().name("fc"));
/// assert_eq!(layer.options.name.as_deref(), Some("fc"));
/// ```
pub struct FcLayer {
    /// The amount of outputs of the layer.
    pub n_neurons: usize,
    /// The options the layer was created with.
    pub options: DenseOptions,

    #[savefile_ignore]
    #[savefile_introspect_ignore]
    constructed: Option<ConstructedDense>,
}

impl FcLayer {
    /// Creates a new Fully Connected layer ready to be built into a Network.
    pub fn new(n_neurons: usize, options: DenseOptions) -> NetworkLayer {
        Self::new_raw(n_neurons, options).into()
    }

    /// Creates a new raw Fully Connected layer.
    pub fn new_raw(n_neurons: usize, options: DenseOptions) -> Self {
        FcLayer {
            n_neurons,
            options,
            constructed: None,
        }
    }
}

impl Layer for FcLayer {
    fn layer_type(&self) -> LayerType {
        LayerType::FullyConnected
    }

    fn construct(&mut self, configs: &LayersConfigs) -> Result<(), LayerConstructionError> {
        self.constructed = Some(construct_dense(
            LayerType::FullyConnected,
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
