//! The module that defines the convolutional layer

use candle_core::Tensor;
use log::debug;
use savefile_derive::Savefile;

use super::{
    apply_dropout, check_can_follow,
    initializers::{bias_initializer, Fan},
    layer_name, Activator, ImageShape, Initializer, Layer, LayerConfig, LayerParams,
    LayerResults, LayerType, LayersConfigs, NeuralStructure, VariableSpec,
};
use crate::{
    feed::RunFeeds,
    session::Variables,
    types::{LayerConstructionError, LayerPropagationError, NetworkLayer},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Savefile)]
/// How the borders of an image are handled by a convolution or a pooling.
pub enum Padding {
    /// The image is padded so that the output has `ceil(input / stride)` values per dimension.
    Same,
    /// No padding, the kernel only goes where it fits.
    Valid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Savefile)]
/// The pooling applied after the activator of a conv layer.
pub enum Pooling {
    /// Keeps the largest value of every window.
    Max,
    /// Keeps the mean of every window.
    Average,
}

#[derive(Debug, Clone, PartialEq, Savefile)]
/// The options of a conv layer.
///
/// Pairs are given as (height, width): `patch_x` is the height of the kernel, `patch_y` its
/// width, and the first value of `strides`, `pool_strides` and `pool_k` goes along the height.
pub struct ConvOptions {
    /// The height of the kernel.
    pub patch_x: usize,
    /// The width of the kernel.
    pub patch_y: usize,
    /// The amount of kernels, which is the amount of channels that come out.
    pub n_filters: usize,
    /// The activator applied to the convolution plus the biases.
    pub activator: Option<Activator>,
    /// The strides of the convolution.
    pub strides: (usize, usize),
    /// The padding of the convolution.
    pub padding: Padding,
    /// The pooling after the activator, none skips it.
    pub pooling: Option<Pooling>,
    /// The strides of the pooling.
    pub pool_strides: (usize, usize),
    /// The window size of the pooling.
    pub pool_k: (usize, usize),
    /// The padding of the pooling.
    pub pool_padding: Padding,
    /// The shape of the network inputs, needed when the layer directly follows the input layer.
    pub image_shape: Option<ImageShape>,
    /// Weather or not the outputs of the layer go through dropout, needs a dropout Network.
    pub dropout_layer: bool,
    /// How the kernels are initialized.
    pub w_initial: Initializer,
    /// The unique name of the layer, a numbered default is used when missing.
    pub name: Option<String>,
}

impl ConvOptions {
    /// Options for `n_filters` kernels of `patch_x` by `patch_y` with unit strides, same padding
    /// and a 2 by 2 max pooling of stride 2.
    pub fn new(patch_x: usize, patch_y: usize, n_filters: usize) -> Self {
        ConvOptions {
            patch_x,
            patch_y,
            n_filters,
            activator: None,
            strides: (1, 1),
            padding: Padding::Same,
            pooling: Some(Pooling::Max),
            pool_strides: (2, 2),
            pool_k: (2, 2),
            pool_padding: Padding::Same,
            image_shape: None,
            dropout_layer: false,
            w_initial: Initializer::default(),
            name: None,
        }
    }

    /// Sets the activator.
    pub fn activator(mut self, activator: Activator) -> Self {
        self.activator = Some(activator);
        self
    }

    /// Sets the shape the network inputs are reshaped into.
    pub fn image_shape(mut self, image_shape: ImageShape) -> Self {
        self.image_shape = Some(image_shape);
        self
    }

    /// Sets the pooling, none disables it.
    pub fn pooling(mut self, pooling: Option<Pooling>) -> Self {
        self.pooling = pooling;
        self
    }

    /// Sets the name of the layer.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// The amount of values along one dimension after a kernel passes through it.
pub(crate) fn output_length(
    input: usize,
    kernel: usize,
    stride: usize,
    padding: Padding,
) -> Option<usize> {
    match padding {
        Padding::Same => Some((input + stride - 1) / stride),
        Padding::Valid if kernel <= input => Some((input - kernel) / stride + 1),
        Padding::Valid => None,
    }
}

/// The amount of values added before and after one dimension so that a kernel gives out
/// `output_length` values, more goes after when the total is odd.
pub(crate) fn padding_amounts(
    input: usize,
    kernel: usize,
    stride: usize,
    padding: Padding,
) -> (usize, usize) {
    match padding {
        Padding::Valid => (0, 0),
        Padding::Same => {
            let output = (input + stride - 1) / stride;
            let total = ((output.max(1) - 1) * stride + kernel).saturating_sub(input);
            (total / 2, total - total / 2)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// The geometry of one kernel pass (convolution or pooling) over an image.
pub(crate) struct KernelPass {
    pub kernel: (usize, usize),
    pub strides: (usize, usize),
    pub padding_height: (usize, usize),
    pub padding_width: (usize, usize),
    pub output: (usize, usize),
}

impl KernelPass {
    fn new(
        input: (usize, usize),
        kernel: (usize, usize),
        strides: (usize, usize),
        padding: Padding,
    ) -> Result<Self, LayerConstructionError> {
        if kernel.0 == 0 || kernel.1 == 0 {
            return Err(LayerConstructionError::ZeroSized("the kernel"));
        }

        if strides.0 == 0 || strides.1 == 0 {
            return Err(LayerConstructionError::ZeroSized("the strides"));
        }

        let too_large = LayerConstructionError::KernelTooLarge { kernel, input };
        let height = output_length(input.0, kernel.0, strides.0, padding).ok_or(too_large.clone())?;
        let width = output_length(input.1, kernel.1, strides.1, padding).ok_or(too_large)?;

        Ok(KernelPass {
            kernel,
            strides,
            padding_height: padding_amounts(input.0, kernel.0, strides.0, padding),
            padding_width: padding_amounts(input.1, kernel.1, strides.1, padding),
            output: (height, width),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
/// What a conv layer knows after being constructed.
pub(crate) struct ConstructedConv {
    pub config: LayerConfig,
    pub weights: VariableSpec,
    pub biases: VariableSpec,
    pub input_shape: ImageShape,
    pub convolution: KernelPass,
    pub pooling: Option<KernelPass>,
}

#[derive(Debug, Clone, Savefile)]
/// A layer that passes `n_filters` kernels through images, adds a bias per kernel, applies its
/// activator and then pools the result.
///
/// When it directly follows the input layer the flat network inputs are reshaped into
/// `image_shape` (height, width, channels), otherwise it takes the images of the conv layer
/// before it. Kernels are stored as (filters, input channels, height, width).
///
/// # Examples
///
/// ```rust
/// use tfnn::layers::{Activator, ConvLayer, ConvOptions, ImageShape};
///
/// // 5x5 kernels going through 28x28 gray images
/// let layer = ConvLayer::new_raw(
///     ConvOptions::new(5, 5, 32)
///         .activator(Activator::Relu)
///         .image_shape(ImageShape::new(28, 28, 1)),
/// );
/// assert_eq!(layer.options.n_filters, 32);
/// ```
pub struct ConvLayer {
    /// The options the layer was created with.
    pub options: ConvOptions,

    #[savefile_ignore]
    #[savefile_introspect_ignore]
    constructed: Option<ConstructedConv>,
}

impl ConvLayer {
    /// Creates a new Conv layer ready to be built into a Network.
    pub fn new(options: ConvOptions) -> NetworkLayer {
        Self::new_raw(options).into()
    }

    /// Creates a new raw Conv layer.
    pub fn new_raw(options: ConvOptions) -> Self {
        ConvLayer {
            options,
            constructed: None,
        }
    }

    /// The shape of the images that come out of the layer, only available after `construct`.
    pub fn output_shape(&self) -> Option<ImageShape> {
        self.constructed
            .as_ref()
            .and_then(|constructed| constructed.config.neural_structure.output_shape())
    }

    fn input_shape(&self, configs: &LayersConfigs) -> Result<ImageShape, LayerConstructionError> {
        let previous = configs.last();

        match previous.layer_type {
            LayerType::Input => {
                let image_shape = self
                    .options
                    .image_shape
                    .ok_or(LayerConstructionError::MissingImageShape)?;
                let input_size = previous.neural_structure.output_size();

                if image_shape.volume() != input_size {
                    return Err(LayerConstructionError::ImageShapeMismatch {
                        expected: input_size,
                        found: image_shape.volume(),
                    });
                }

                Ok(image_shape)
            }
            LayerType::Conv => previous
                .neural_structure
                .output_shape()
                .ok_or(LayerConstructionError::ConvAfterDense),
            _ => Err(LayerConstructionError::ConvAfterDense),
        }
    }
}

impl Layer for ConvLayer {
    fn layer_type(&self) -> LayerType {
        LayerType::Conv
    }

    fn construct(&mut self, configs: &LayersConfigs) -> Result<(), LayerConstructionError> {
        let options = &self.options;
        check_can_follow(configs, options.dropout_layer)?;

        if options.n_filters == 0 {
            return Err(LayerConstructionError::ZeroSized("the amount of filters"));
        }

        let input_shape = self.input_shape(configs)?;

        let convolution = KernelPass::new(
            (input_shape.height, input_shape.width),
            (options.patch_x, options.patch_y),
            options.strides,
            options.padding,
        )?;

        let pooling = match options.pooling {
            Some(_) => Some(KernelPass::new(
                convolution.output,
                options.pool_k,
                options.pool_strides,
                options.pool_padding,
            )?),
            None => None,
        };

        let (height, width) = pooling.map(|pass| pass.output).unwrap_or(convolution.output);
        let output_shape = ImageShape::new(height, width, options.n_filters);

        let name = layer_name(configs, LayerType::Conv, options.name.as_deref())?;
        let receptive_field = options.patch_x * options.patch_y;
        let fan = Fan::new(
            receptive_field * input_shape.channels,
            receptive_field * options.n_filters,
        );

        debug!(
            "constructing {} going from {:?} to {:?}",
            name, input_shape, output_shape
        );

        self.constructed = Some(ConstructedConv {
            weights: VariableSpec {
                name: format!("{}/weights", name),
                shape: vec![
                    options.n_filters,
                    input_shape.channels,
                    options.patch_x,
                    options.patch_y,
                ],
                initializer: options.w_initial.clone(),
                fan,
            },
            biases: VariableSpec {
                name: format!("{}/biases", name),
                shape: vec![options.n_filters],
                initializer: bias_initializer(),
                fan,
            },
            config: LayerConfig {
                layer_type: LayerType::Conv,
                name,
                neural_structure: NeuralStructure::Conv {
                    input_shape,
                    output_shape,
                },
                para: LayerParams::Conv(options.clone()),
                net_in_out: None,
            },
            input_shape,
            convolution,
            pooling,
        });

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
        let constructed = self
            .constructed
            .as_ref()
            .ok_or(LayerPropagationError::NotConstructed)?;

        let kernels = variables
            .get(&constructed.weights.name)
            .ok_or_else(|| LayerPropagationError::MissingVariable(constructed.weights.name.clone()))?;
        let biases = variables
            .get(&constructed.biases.name)
            .ok_or_else(|| LayerPropagationError::MissingVariable(constructed.biases.name.clone()))?;

        // flat network inputs are (samples, height * width * channels)
        let images = if inputs.rank() == 2 {
            let shape = constructed.input_shape;
            inputs
                .reshape((inputs.dim(0)?, shape.height, shape.width, shape.channels))?
                .permute((0, 3, 1, 2))?
                .contiguous()?
        } else {
            inputs.clone()
        };

        let convolution = &constructed.convolution;
        let padded = images
            .pad_with_zeros(2, convolution.padding_height.0, convolution.padding_height.1)?
            .pad_with_zeros(3, convolution.padding_width.0, convolution.padding_width.1)?;

        let convolved = if convolution.strides.0 == convolution.strides.1 {
            padded.conv2d(kernels.as_tensor(), 0, convolution.strides.0, 1, 1)?
        } else {
            let dense = padded.conv2d(kernels.as_tensor(), 0, 1, 1, 1)?;
            let rows = subsample(&dense, 2, convolution.strides.0, convolution.output.0)?;
            subsample(&rows, 3, convolution.strides.1, convolution.output.1)?
        };

        let wx_plus_b = convolved.broadcast_add(&biases.as_tensor().reshape((
            1,
            self.options.n_filters,
            1,
            1,
        ))?)?;

        let activated = match self.options.activator {
            Some(activator) => activator.activate(&wx_plus_b)?,
            None => wx_plus_b.clone(),
        };

        let pooled = match (self.options.pooling, constructed.pooling) {
            (Some(pooling), Some(pass)) => Some(pool(&activated, pooling, &pass)?),
            _ => None,
        };

        let dropped = apply_dropout(
            pooled.as_ref().unwrap_or(&activated),
            self.options.dropout_layer,
            feeds,
        )?;

        Ok(LayerResults {
            wx_plus_b: Some(wx_plus_b),
            activated: Some(activated),
            pooled,
            dropped: Some(dropped.clone()),
            output: Some(dropped),
        })
    }
}

/// Keeps `count` values of a dimension, one every `step`.
fn subsample(values: &Tensor, dim: usize, step: usize, count: usize) -> candle_core::Result<Tensor> {
    let indexes = Tensor::arange_step(0u32, (count * step) as u32, step as u32, values.device())?;
    values.index_select(&indexes, dim)
}

/// Pools images. Max pooling pads by repeating the edge values so padding never wins, average
/// pooling only averages the cells that are inside of the image.
fn pool(images: &Tensor, pooling: Pooling, pass: &KernelPass) -> candle_core::Result<Tensor> {
    match pooling {
        Pooling::Max => images
            .pad_with_same(2, pass.padding_height.0, pass.padding_height.1)?
            .pad_with_same(3, pass.padding_width.0, pass.padding_width.1)?
            .contiguous()?
            .max_pool2d_with_stride(pass.kernel, pass.strides),
        Pooling::Average => {
            let sums = zero_pad(images, pass)?.avg_pool2d_with_stride(pass.kernel, pass.strides)?;

            let (_, _, height, width) = images.dims4()?;
            let inside = Tensor::ones((1, 1, height, width), images.dtype(), images.device())?;
            let counts = zero_pad(&inside, pass)?.avg_pool2d_with_stride(pass.kernel, pass.strides)?;

            sums.broadcast_div(&counts)
        }
    }
}

fn zero_pad(images: &Tensor, pass: &KernelPass) -> candle_core::Result<Tensor> {
    images
        .pad_with_zeros(2, pass.padding_height.0, pass.padding_height.1)?
        .pad_with_zeros(3, pass.padding_width.0, pass.padding_width.1)?
        .contiguous()
}

#[cfg(test)]
mod tests {
    use candle_core::{Device, Tensor};

    use super::{output_length, padding_amounts, pool, KernelPass, Padding, Pooling};
    use crate::utils::approx_eq::assert_approx_equal_distance;

    fn pool_row(row: &[f32], pooling: Pooling, window: usize) -> Vec<f32> {
        let images = Tensor::new(row, &Device::Cpu)
            .unwrap()
            .reshape((1, 1, 1, row.len()))
            .unwrap();
        let pass = KernelPass::new((1, row.len()), (1, window), (1, 1), Padding::Same).unwrap();

        pool(&images, pooling, &pass)
            .unwrap()
            .flatten_all()
            .unwrap()
            .to_vec1::<f32>()
            .unwrap()
    }

    #[test]
    fn average_pooling_should_only_count_cells_inside_the_image() {
        assert_approx_equal_distance(
            &pool_row(&[1.0, 3.0, 5.0], Pooling::Average, 3),
            &[2.0, 3.0, 4.0],
            1e-6,
        );
    }

    #[test]
    fn max_pooling_should_never_pick_the_padding() {
        assert_eq!(
            pool_row(&[-1.0, -3.0, -5.0], Pooling::Max, 3),
            vec![-1.0, -1.0, -3.0]
        );
    }

    #[test]
    fn same_padding_should_keep_the_size_with_unit_strides() {
        assert_eq!(output_length(28, 5, 1, Padding::Same), Some(28));
        assert_eq!(padding_amounts(28, 5, 1, Padding::Same), (2, 2));
    }

    #[test]
    fn same_padding_should_divide_by_the_stride_rounding_up() {
        assert_eq!(output_length(7, 2, 2, Padding::Same), Some(4));
        // (4 - 1) * 2 + 2 - 7 = 1, the extra value goes after
        assert_eq!(padding_amounts(7, 2, 2, Padding::Same), (0, 1));
    }

    #[test]
    fn valid_padding_should_only_fit_the_kernel() {
        assert_eq!(output_length(28, 5, 1, Padding::Valid), Some(24));
        assert_eq!(output_length(10, 3, 2, Padding::Valid), Some(4));
        assert_eq!(output_length(2, 3, 1, Padding::Valid), None);
        assert_eq!(padding_amounts(28, 5, 1, Padding::Valid), (0, 0));
    }
}
