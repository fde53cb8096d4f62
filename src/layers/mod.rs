//! The module that contains everything needed to describe the layers of a Network, their
//! configuration and result tables and the trait that every layer implements.

use candle_core::Tensor;
use savefile_derive::Savefile;

use crate::{
    feed::RunFeeds,
    session::Variables,
    types::{LayerConstructionError, LayerPropagationError, NetworkType, Regularization},
};

pub mod activations;
pub mod conv;
pub mod dense;
pub mod fully_connected;
pub mod hidden;
pub mod initializers;
pub mod output;

pub use activations::Activator;
pub use conv::{ConvLayer, ConvOptions, Padding, Pooling};
pub use dense::DenseOptions;
pub use fully_connected::FcLayer;
pub use hidden::HiddenLayer;
pub use initializers::Initializer;
pub use output::OutputLayer;

use initializers::Fan;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// The kind of a row in the configuration table.
pub enum LayerType {
    /// The first row, created with the Network itself.
    Input,
    /// A dense layer for simple networks.
    Hidden,
    /// A dense layer that is able to follow a conv layer.
    FullyConnected,
    /// A 2D convolution with optional pooling.
    Conv,
    /// The last dense layer, the Network's loss is computed on its outputs.
    Output,
}

impl LayerType {
    /// The prefix used to name layers of this type when no name was given.
    pub fn default_name_prefix(&self) -> &'static str {
        match self {
            LayerType::Input => "input_layer",
            LayerType::Hidden => "hidden_layer",
            LayerType::FullyConnected => "fc_layer",
            LayerType::Conv => "conv_layer",
            LayerType::Output => "output_layer",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Savefile)]
/// The shape of an image going through conv layers.
pub struct ImageShape {
    /// The amount of rows of the image.
    pub height: usize,
    /// The amount of columns of the image.
    pub width: usize,
    /// The amount of values per pixel.
    pub channels: usize,
}

impl ImageShape {
    /// Creates a new image shape.
    pub fn new(height: usize, width: usize, channels: usize) -> Self {
        ImageShape {
            height,
            width,
            channels,
        }
    }

    /// The amount of values in one image of this shape.
    pub fn volume(&self) -> usize {
        self.height * self.width * self.channels
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// The amount of values a layer receives and gives out.
pub enum NeuralStructure {
    /// Flat inputs and outputs.
    Dense {
        /// The amount of inputs per sample.
        input_size: usize,
        /// The amount of outputs per sample.
        output_size: usize,
    },
    /// Image inputs and outputs.
    Conv {
        /// The shape of the images that come in.
        input_shape: ImageShape,
        /// The shape of the images that come out, after pooling.
        output_shape: ImageShape,
    },
}

impl NeuralStructure {
    /// The amount of values per sample that come out of the layer.
    pub fn output_size(&self) -> usize {
        match self {
            NeuralStructure::Dense { output_size, .. } => *output_size,
            NeuralStructure::Conv { output_shape, .. } => output_shape.volume(),
        }
    }

    /// The image shape that comes out of the layer, only for conv layers.
    pub fn output_shape(&self) -> Option<ImageShape> {
        match self {
            NeuralStructure::Dense { .. } => None,
            NeuralStructure::Conv { output_shape, .. } => Some(*output_shape),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// The parameters of the input row.
pub struct InputParams {
    /// The regularization mode of the Network.
    pub regularization: Regularization,
    /// The name of the scalar placeholder the regularization needs, if any.
    pub placeholder: Option<String>,
    /// The type of the Network.
    pub network_type: NetworkType,
}

#[derive(Debug, Clone, PartialEq)]
/// The `para` column of the configuration table.
pub enum LayerParams {
    /// The network wide parameters stored in the input row.
    Input(InputParams),
    /// The options of a hidden, fully connected or output layer.
    Dense(DenseOptions),
    /// The options of a conv layer.
    Conv(ConvOptions),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// The sizes of the whole Network.
pub struct NetInOut {
    /// The amount of inputs per sample.
    pub input_size: usize,
    /// The amount of outputs per sample.
    pub output_size: usize,
}

#[derive(Debug, Clone, PartialEq)]
/// One row of the configuration table.
pub struct LayerConfig {
    /// What kind of layer the row describes.
    pub layer_type: LayerType,
    /// The unique name of the layer.
    pub name: String,
    /// The inputs and outputs of the layer.
    pub neural_structure: NeuralStructure,
    /// The parameters the layer was built with.
    pub para: LayerParams,
    /// Only present in the input row.
    pub net_in_out: Option<NetInOut>,
}

#[derive(Debug, Clone)]
/// The configuration table, one row per layer in construction order, the first row always being
/// the input layer.
pub struct LayersConfigs {
    rows: Vec<LayerConfig>,
}

impl LayersConfigs {
    /// Starts the table with the input row.
    pub fn new(input_row: LayerConfig) -> Self {
        LayersConfigs {
            rows: vec![input_row],
        }
    }

    pub(crate) fn push(&mut self, row: LayerConfig) {
        self.rows.push(row);
    }

    /// The amount of rows, including the input row.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Never true since the input row is always there.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The row at some index.
    pub fn get(&self, index: usize) -> Option<&LayerConfig> {
        self.rows.get(index)
    }

    /// The input row.
    pub fn input(&self) -> &LayerConfig {
        &self.rows[0]
    }

    /// The last row that was appended.
    pub fn last(&self) -> &LayerConfig {
        &self.rows[self.rows.len() - 1]
    }

    /// Iterates over the rows in construction order.
    pub fn iter(&self) -> std::slice::Iter<'_, LayerConfig> {
        self.rows.iter()
    }

    /// The `type` column.
    pub fn layer_types(&self) -> Vec<LayerType> {
        self.rows.iter().map(|row| row.layer_type).collect()
    }

    /// How many rows of some type there are.
    pub fn count_of(&self, layer_type: LayerType) -> usize {
        self.rows
            .iter()
            .filter(|row| row.layer_type == layer_type)
            .count()
    }

    /// Weather or not some row already has this name.
    pub fn contains_name(&self, name: &str) -> bool {
        self.rows.iter().any(|row| row.name == name)
    }

    /// The network wide parameters of the input row.
    pub fn input_params(&self) -> Option<&InputParams> {
        match &self.input().para {
            LayerParams::Input(params) => Some(params),
            _ => None,
        }
    }

    /// The regularization mode stored in the input row.
    pub fn regularization(&self) -> Regularization {
        self.input_params()
            .map(|params| params.regularization)
            .unwrap_or(Regularization::None)
    }

    /// The sizes of the whole Network stored in the input row.
    pub fn net_in_out(&self) -> NetInOut {
        self.input().net_in_out.unwrap_or(NetInOut {
            input_size: self.input().neural_structure.output_size(),
            output_size: self.input().neural_structure.output_size(),
        })
    }
}

#[derive(Debug, Clone, Default)]
/// One row of the result table, holding the tensors of the last forward pass through a layer.
pub struct LayerResults {
    /// The inputs times the weights plus the biases, or the convolution plus the biases.
    pub wx_plus_b: Option<Tensor>,
    /// `wx_plus_b` after the activator.
    pub activated: Option<Tensor>,
    /// `activated` after pooling, conv layers only.
    pub pooled: Option<Tensor>,
    /// The values after dropout.
    pub dropped: Option<Tensor>,
    /// What goes into the next layer.
    pub output: Option<Tensor>,
}

#[derive(Debug, Clone, Default)]
/// The result table, one row per row of the configuration table.
pub struct LayersResults {
    rows: Vec<LayerResults>,
}

impl LayersResults {
    /// Starts the table with an empty input row.
    pub fn new() -> Self {
        LayersResults {
            rows: vec![LayerResults::default()],
        }
    }

    pub(crate) fn push(&mut self, row: LayerResults) {
        self.rows.push(row);
    }

    pub(crate) fn record(&mut self, index: usize, row: LayerResults) {
        if let Some(existing) = self.rows.get_mut(index) {
            *existing = row;
        }
    }

    pub(crate) fn record_input(&mut self, inputs: Tensor) {
        self.record(
            0,
            LayerResults {
                output: Some(inputs),
                ..LayerResults::default()
            },
        );
    }

    /// The amount of rows, including the input row.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Weather or not there are no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The row at some index.
    pub fn get(&self, index: usize) -> Option<&LayerResults> {
        self.rows.get(index)
    }

    /// Iterates over the rows in construction order.
    pub fn iter(&self) -> std::slice::Iter<'_, LayerResults> {
        self.rows.iter()
    }
}

#[derive(Debug, Clone, PartialEq)]
/// Everything needed to create a variable once a Session initializes its variables.
pub struct VariableSpec {
    /// The unique name of the variable.
    pub name: String,
    /// The shape of the variable.
    pub shape: Vec<usize>,
    /// How its initial values are generated.
    pub initializer: Initializer,
    /// The fan in and fan out of the layer owning the variable.
    pub fan: Fan,
}

impl VariableSpec {
    /// The amount of values in the variable.
    pub fn elements_amount(&self) -> usize {
        self.shape.iter().product()
    }

    /// Generates the initial values of the variable.
    pub fn initial_values(&self) -> Vec<f32> {
        use initializers::InitializerTrait;

        self.initializer
            .initialize_1d(self.elements_amount(), self.fan)
    }
}

/// A layer is one stage of a Network, it gets constructed on top of the configuration rows of the
/// layers that came before it and then propagates tensors through the wrapped framework.
pub trait Layer {
    /// The type of row this layer appends to the configuration table.
    fn layer_type(&self) -> LayerType;

    /// Fixes the structure of the layer based on the rows that came before it, this is where
    /// the layer decides its name, its input and output sizes and the specs of its variables.
    fn construct(&mut self, configs: &LayersConfigs) -> Result<(), LayerConstructionError>;

    /// The configuration row of the layer, only available after `construct`.
    fn config(&self) -> Option<&LayerConfig>;

    /// The spec of the weights of the layer, only available after `construct`.
    fn weights(&self) -> Option<&VariableSpec>;

    /// The spec of the biases of the layer, only available after `construct`.
    fn biases(&self) -> Option<&VariableSpec>;

    /// Computes the result row of the layer for the outputs of the previous layer.
    fn propagate(
        &self,
        inputs: &Tensor,
        variables: &Variables,
        feeds: &RunFeeds,
    ) -> Result<LayerResults, LayerPropagationError>;
}

/// Checks the rules every layer follows when it is appended to the configuration table.
pub(crate) fn check_can_follow(
    configs: &LayersConfigs,
    dropout_layer: bool,
) -> Result<(), LayerConstructionError> {
    if configs.last().layer_type == LayerType::Output {
        return Err(LayerConstructionError::LayerAfterOutput);
    }

    if dropout_layer && configs.regularization() != Regularization::Dropout {
        return Err(LayerConstructionError::DropoutNotEnabled);
    }

    Ok(())
}

/// The name given to a layer, either the one asked for or a numbered default. No other row may
/// already have it.
pub(crate) fn layer_name(
    configs: &LayersConfigs,
    layer_type: LayerType,
    name: Option<&str>,
) -> Result<String, LayerConstructionError> {
    let name = match (name, layer_type) {
        (Some(name), _) => name.to_string(),
        (None, LayerType::Output) => layer_type.default_name_prefix().to_string(),
        (None, _) => format!(
            "{}_{}",
            layer_type.default_name_prefix(),
            configs.count_of(layer_type) + 1
        ),
    };

    if configs.contains_name(&name) {
        return Err(LayerConstructionError::DuplicateName(name));
    }

    Ok(name)
}

/// Drops values of a layer flagged for dropout when a keep probability under one is fed.
pub(crate) fn apply_dropout(
    values: &Tensor,
    dropout_layer: bool,
    feeds: &RunFeeds,
) -> candle_core::Result<Tensor> {
    match feeds.keep_prob {
        Some(keep_prob) if dropout_layer && keep_prob < 1.0 => {
            candle_nn::ops::dropout(values, 1.0 - keep_prob)
        }
        _ => Ok(values.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        check_can_follow, layer_name, InputParams, LayerConfig, LayerParams, LayerType,
        LayersConfigs, NetInOut, NeuralStructure,
    };
    use crate::types::{LayerConstructionError, NetworkType, Regularization};

    fn input_configs(regularization: Regularization) -> LayersConfigs {
        LayersConfigs::new(LayerConfig {
            layer_type: LayerType::Input,
            name: "input_layer".to_string(),
            neural_structure: NeuralStructure::Dense {
                input_size: 4,
                output_size: 4,
            },
            para: LayerParams::Input(InputParams {
                regularization,
                placeholder: None,
                network_type: NetworkType::Regression,
            }),
            net_in_out: Some(NetInOut {
                input_size: 4,
                output_size: 2,
            }),
        })
    }

    #[test]
    fn should_number_default_names_by_type() {
        let configs = input_configs(Regularization::None);

        assert_eq!(
            layer_name(&configs, LayerType::Hidden, None).unwrap(),
            "hidden_layer_1"
        );
        assert_eq!(
            layer_name(&configs, LayerType::Conv, None).unwrap(),
            "conv_layer_1"
        );
        assert_eq!(
            layer_name(&configs, LayerType::Output, None).unwrap(),
            "output_layer"
        );
        assert_eq!(
            layer_name(&configs, LayerType::Hidden, Some("mine")).unwrap(),
            "mine"
        );
    }

    #[test]
    fn should_refuse_dropout_layers_without_dropout() {
        let configs = input_configs(Regularization::L2);

        assert_eq!(
            check_can_follow(&configs, true),
            Err(LayerConstructionError::DropoutNotEnabled)
        );
        assert_eq!(check_can_follow(&configs, false), Ok(()));
    }

    #[test]
    fn should_refuse_duplicate_names() {
        let configs = input_configs(Regularization::None);

        assert_eq!(
            layer_name(&configs, LayerType::Hidden, Some("input_layer")),
            Err(LayerConstructionError::DuplicateName(
                "input_layer".to_string()
            ))
        );
    }

    #[test]
    fn default_names_should_be_unique_too() {
        let mut configs = input_configs(Regularization::None);
        let mut row = configs.input().clone();
        row.layer_type = LayerType::Conv;
        row.name = "conv_layer_2".to_string();
        configs.push(row);

        assert_eq!(
            layer_name(&configs, LayerType::Conv, None),
            Err(LayerConstructionError::DuplicateName(
                "conv_layer_2".to_string()
            ))
        );
    }

    #[test]
    fn should_read_network_wide_values_from_the_input_row() {
        let configs = input_configs(Regularization::Dropout);

        assert_eq!(configs.regularization(), Regularization::Dropout);
        assert_eq!(configs.net_in_out().output_size, 2);
        assert_eq!(configs.layer_types(), vec![LayerType::Input]);
    }
}
