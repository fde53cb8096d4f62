//! The parts shared by the three dense layers: hidden, fully connected and output.

use candle_core::{Tensor, D};
use log::debug;
use savefile_derive::Savefile;

use super::{
    apply_dropout, check_can_follow,
    initializers::{bias_initializer, Fan},
    layer_name, Activator, Initializer, LayerConfig, LayerParams, LayerResults, LayerType,
    LayersConfigs, NeuralStructure, VariableSpec,
};
use crate::{
    feed::RunFeeds,
    session::Variables,
    types::{LayerConstructionError, LayerPropagationError},
};

#[derive(Debug, Clone, PartialEq, Default, Savefile)]
/// The options of a hidden, fully connected or output layer.
///
/// # Examples
///
/// ```rust
/// use tfnn::layers::{Activator, DenseOptions};
///
/// let options = DenseOptions::new().activator(Activator::Relu).name("encoder");
/// assert_eq!(options.activator, Some(Activator::Relu));
/// ```
pub struct DenseOptions {
    /// The activator applied to `wx_plus_b`, none keeps it linear.
    pub activator: Option<Activator>,
    /// Weather or not the outputs of the layer go through dropout, needs a dropout Network.
    pub dropout_layer: bool,
    /// How the weights are initialized.
    pub w_initial: Initializer,
    /// The unique name of the layer, a numbered default is used when missing.
    pub name: Option<String>,
}

impl DenseOptions {
    /// Options with no activator, no dropout, Xavier weights and a default name.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the activator.
    pub fn activator(mut self, activator: Activator) -> Self {
        self.activator = Some(activator);
        self
    }

    /// Flags the layer for dropout.
    pub fn dropout_layer(mut self) -> Self {
        self.dropout_layer = true;
        self
    }

    /// Sets how the weights are initialized.
    pub fn w_initial(mut self, initializer: impl Into<Initializer>) -> Self {
        self.w_initial = initializer.into();
        self
    }

    /// Sets the name of the layer.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
/// What a dense layer knows after being constructed.
pub(crate) struct ConstructedDense {
    pub config: LayerConfig,
    pub weights: VariableSpec,
    pub biases: VariableSpec,
    /// Set when the previous layer gives out images that must be flattened first.
    pub flatten_inputs: bool,
}

/// Constructs a dense layer of some type with `n_neurons` outputs on top of the configuration
/// table.
pub(crate) fn construct_dense(
    layer_type: LayerType,
    n_neurons: usize,
    options: &DenseOptions,
    configs: &LayersConfigs,
) -> Result<ConstructedDense, LayerConstructionError> {
    check_can_follow(configs, options.dropout_layer)?;

    if n_neurons == 0 {
        return Err(LayerConstructionError::ZeroSized("the amount of neurons"));
    }

    let previous = configs.last();
    let flatten_inputs = previous.layer_type == LayerType::Conv;

    if flatten_inputs && layer_type == LayerType::Hidden {
        return Err(LayerConstructionError::DenseAfterConv);
    }

    let input_size = previous.neural_structure.output_size();
    let name = layer_name(configs, layer_type, options.name.as_deref())?;
    let fan = Fan::new(input_size, n_neurons);

    debug!(
        "constructing {} with {} inputs and {} outputs",
        name, input_size, n_neurons
    );

    Ok(ConstructedDense {
        weights: VariableSpec {
            name: format!("{}/weights", name),
            shape: vec![input_size, n_neurons],
            initializer: options.w_initial.clone(),
            fan,
        },
        biases: VariableSpec {
            name: format!("{}/biases", name),
            shape: vec![n_neurons],
            initializer: bias_initializer(),
            fan,
        },
        config: LayerConfig {
            layer_type,
            name,
            neural_structure: NeuralStructure::Dense {
                input_size,
                output_size: n_neurons,
            },
            para: LayerParams::Dense(options.clone()),
            net_in_out: None,
        },
        flatten_inputs,
    })
}

/// Flattens images coming out of a conv layer (samples, channels, height, width) into one row
/// per sample in height, width, channels order.
pub(crate) fn flatten_images(images: &Tensor) -> candle_core::Result<Tensor> {
    images.permute((0, 2, 3, 1))?.contiguous()?.flatten_from(1)
}

/// The forward pass of a dense layer.
pub(crate) fn propagate_dense(
    constructed: Option<&ConstructedDense>,
    options: &DenseOptions,
    inputs: &Tensor,
    variables: &Variables,
    feeds: &RunFeeds,
) -> Result<LayerResults, LayerPropagationError> {
    let constructed = constructed.ok_or(LayerPropagationError::NotConstructed)?;

    let weights = variables
        .get(&constructed.weights.name)
        .ok_or_else(|| LayerPropagationError::MissingVariable(constructed.weights.name.clone()))?;
    let biases = variables
        .get(&constructed.biases.name)
        .ok_or_else(|| LayerPropagationError::MissingVariable(constructed.biases.name.clone()))?;

    let inputs = if constructed.flatten_inputs || inputs.rank() > 2 {
        flatten_images(inputs)?
    } else {
        inputs.clone()
    };

    let wx_plus_b = inputs
        .matmul(weights.as_tensor())?
        .broadcast_add(biases.as_tensor())?;

    let activated = match options.activator {
        Some(activator) => activator.activate(&wx_plus_b)?,
        None => wx_plus_b.clone(),
    };

    let dropped = apply_dropout(&activated, options.dropout_layer, feeds)?;

    Ok(LayerResults {
        wx_plus_b: Some(wx_plus_b),
        activated: Some(activated),
        pooled: None,
        dropped: Some(dropped.clone()),
        output: Some(dropped),
    })
}

/// The index of the largest value of every row.
pub(crate) fn argmax_rows(outputs: &Tensor) -> candle_core::Result<Vec<u32>> {
    outputs.argmax(D::Minus1)?.to_vec1::<u32>()
}
