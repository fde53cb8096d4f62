//! The module that defines the output layer

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
/// The last layer of a Network, a dense layer with as many neurons as the Network has outputs.
///
/// Once it is built the Network initializes its loss and nothing else can be added after it.
/// Classification networks apply the softmax on top of its outputs, so it usually has no
/// activator.
pub struct OutputLayer {
    /// The options the layer was created with.
    pub options: DenseOptions,

    #[savefile_ignore]
    #[savefile_introspect_ignore]
    constructed: Option<ConstructedDense>,
}

impl OutputLayer {
    /// Creates a new Output layer ready to be built into a Network.
    pub fn new(options: DenseOptions) -> NetworkLayer {
        Self::new_raw(options).into()
    }

    /// Creates a new raw Output layer.
    pub fn new_raw(options: DenseOptions) -> Self {
        OutputLayer {
            options,
            constructed: None,
        }
    }
}

impl Layer for OutputLayer {
    fn layer_type(&self) -> LayerType {
        LayerType::Output
    }

    fn construct(&mut self, configs: &LayersConfigs) -> Result<(), LayerConstructionError> {
        let n_neurons = configs.net_in_out().output_size;

        self.constructed = Some(construct_dense(
            LayerType::Output,
            n_neurons,
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
