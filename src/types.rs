//! A module containing the shared data types of tfnn, mostly the network level enums and every
//! error that the network operations can give back.

use std::{fmt, path::PathBuf};

use savefile_derive::Savefile;
use tfnn_macros::{EnumLayer, FromForAllUnnamedVariants};

use crate::layers::{ConvLayer, FcLayer, HiddenLayer, OutputLayer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Savefile)]
/// What kind of targets a Network is trained against, decides the loss and how predictions are
/// given back.
pub enum NetworkType {
    /// Continuous targets, trained with the mean squared error.
    Regression,
    /// One-hot encoded classes, trained with the softmax cross entropy.
    Classification,
}

impl fmt::Display for NetworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkType::Regression => write!(f, "regression"),
            NetworkType::Classification => write!(f, "classification"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Savefile)]
/// The regularization mode chosen when a Network is created, they are mutually exclusive.
pub enum Regularization {
    /// No regularization at all.
    None,
    /// Layers flagged with `dropout_layer` drop their outputs based on a fed `keep_prob`.
    Dropout,
    /// The loss gets a penalty on the weights of every layer scaled by a fed `l2_lambda`.
    L2,
}

impl Regularization {
    /// Picks the mode out of the two flags a Network is created with.
    pub fn from_flags(do_dropout: bool, do_l2: bool) -> Result<Self, NetworkError> {
        match (do_dropout, do_l2) {
            (true, true) => Err(NetworkError::ConflictingRegularization),
            (true, false) => Ok(Regularization::Dropout),
            (false, true) => Ok(Regularization::L2),
            (false, false) => Ok(Regularization::None),
        }
    }
}

impl fmt::Display for Regularization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Regularization::None => write!(f, "none"),
            Regularization::Dropout => write!(f, "dropout"),
            Regularization::L2 => write!(f, "l2"),
        }
    }
}

#[derive(Debug, Clone, Savefile, EnumLayer, FromForAllUnnamedVariants)]
/// All of the possible layers that a Network can have after its input layer.
#[allow(missing_docs)]
pub enum NetworkLayer {
    Hidden(HiddenLayer),
    FullyConnected(FcLayer),
    Conv(ConvLayer),
    Output(OutputLayer),
}

#[derive(Debug, Clone, PartialEq)]
/// An error that happens when a layer cannot be constructed on top of the layers that came before
/// it.
pub enum LayerConstructionError {
    /// The network already ends in an output layer.
    LayerAfterOutput,
    /// A hidden layer needs flat inputs, a fully connected layer should be used after a conv layer.
    DenseAfterConv,
    /// A conv layer needs image inputs, but the previous layer is a dense one.
    ConvAfterDense,
    /// The conv layer follows the input layer but no image shape was given.
    MissingImageShape,
    /// The image shape does not have the same volume as the input size of the network.
    ImageShapeMismatch {
        /// The input size of the network.
        expected: usize,
        /// The volume of the image shape that was given.
        found: usize,
    },
    /// A `Valid` convolution or pooling with a kernel larger than its input.
    KernelTooLarge {
        /// The kernel size as height and width.
        kernel: (usize, usize),
        /// The input size as height and width.
        input: (usize, usize),
    },
    /// Layers, kernels and strides must have sizes larger than zero.
    ZeroSized(&'static str),
    /// The layer asks for dropout but the network was not created with dropout.
    DropoutNotEnabled,
    /// There already is a layer with this name.
    DuplicateName(String),
}

impl fmt::Display for LayerConstructionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LayerAfterOutput => write!(f, "cannot add a layer after the output layer"),
            Self::DenseAfterConv => write!(
                f,
                "a hidden layer cannot follow a conv layer, use a fully connected layer"
            ),
            Self::ConvAfterDense => write!(f, "a conv layer cannot follow a dense layer"),
            Self::MissingImageShape => write!(
                f,
                "the first conv layer needs an image shape to reshape the network inputs"
            ),
            Self::ImageShapeMismatch { expected, found } => write!(
                f,
                "the image shape has a volume of {} but the network inputs have {} values",
                found, expected
            ),
            Self::KernelTooLarge { kernel, input } => write!(
                f,
                "a {}x{} kernel does not fit a {}x{} input without padding",
                kernel.0, kernel.1, input.0, input.1
            ),
            Self::ZeroSized(what) => write!(f, "{} must be larger than zero", what),
            Self::DropoutNotEnabled => write!(
                f,
                "dropout layers need a network created with dropout"
            ),
            Self::DuplicateName(name) => write!(f, "there already is a layer named '{}'", name),
        }
    }
}

impl std::error::Error for LayerConstructionError {}

#[derive(Debug, FromForAllUnnamedVariants)]
/// An error that happens during the forward pass of a layer.
pub enum LayerPropagationError {
    /// The layer was never constructed on top of a network.
    NotConstructed,
    /// Some variable of the layer is not in the session.
    MissingVariable(String),
    /// The wrapped framework failed to run an operation.
    Candle(candle_core::Error),
}

impl fmt::Display for LayerPropagationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConstructed => write!(f, "the layer has not been constructed"),
            Self::MissingVariable(name) => write!(f, "the variable '{}' is not in the session", name),
            Self::Candle(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for LayerPropagationError {}

#[derive(Debug, FromForAllUnnamedVariants)]
/// An error that happens when filling up the placeholders of a network.
pub enum FeedError {
    /// A placeholder that the run needs was not fed.
    MissingFeed(String),
    /// The fed value does not match the shape of the placeholder.
    ShapeMismatch {
        /// The name of the placeholder.
        placeholder: String,
        /// The shape of the placeholder, `None` being any size.
        expected: Vec<Option<usize>>,
        /// The shape that was fed.
        found: Vec<usize>,
    },
    /// Some sample does not have the same amount of values as the first one.
    RaggedSamples {
        /// The index of the sample.
        sample_index: usize,
        /// The amount of values of the first sample.
        expected: usize,
        /// The amount of values of this sample.
        found: usize,
    },
    /// No samples were fed.
    EmptyBatch,
    /// The inputs and the targets of a run do not have the same amount of samples.
    BatchSizeMismatch {
        /// The amount of input samples.
        inputs: usize,
        /// The amount of target samples.
        targets: usize,
    },
    /// The wrapped framework failed to create the tensor.
    Candle(candle_core::Error),
}

impl fmt::Display for FeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingFeed(name) => write!(f, "the placeholder '{}' was not fed", name),
            Self::ShapeMismatch {
                placeholder,
                expected,
                found,
            } => write!(
                f,
                "cannot feed a value of shape {:?} to '{}' which has shape {:?}",
                found, placeholder, expected
            ),
            Self::RaggedSamples {
                sample_index,
                expected,
                found,
            } => write!(
                f,
                "sample {} has {} values but the first sample has {}",
                sample_index, found, expected
            ),
            Self::EmptyBatch => write!(f, "cannot feed an empty batch"),
            Self::BatchSizeMismatch { inputs, targets } => write!(
                f,
                "cannot feed {} input samples with {} target samples",
                inputs, targets
            ),
            Self::Candle(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for FeedError {}

#[derive(Debug, FromForAllUnnamedVariants)]
/// An error that happens inside of a Session.
pub enum SessionError {
    /// The session was closed.
    Closed,
    /// The variables were not initialized yet.
    NotInitialized,
    /// There is no variable with this name.
    MissingVariable(String),
    /// A restored value does not fit the shape of its variable.
    RestoredShapeMismatch {
        /// The name of the variable.
        name: String,
        /// The shape of the variable.
        expected: Vec<usize>,
        /// The shape of the restored value.
        found: Vec<usize>,
    },
    /// The wrapped framework failed while running something.
    Candle(candle_core::Error),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "attempted to use a closed session"),
            Self::NotInitialized => write!(f, "the variables of the session are not initialized"),
            Self::MissingVariable(name) => write!(f, "there is no variable named '{}'", name),
            Self::RestoredShapeMismatch {
                name,
                expected,
                found,
            } => write!(
                f,
                "the restored value of '{}' has shape {:?} but the variable has {:?}",
                name, found, expected
            ),
            Self::Candle(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for SessionError {}

#[derive(Debug, FromForAllUnnamedVariants)]
/// An error that happens when saving or restoring a network.
pub enum SaveError {
    /// The target file exists and `replace` was not set.
    AlreadyExists(PathBuf),
    /// Creating the target directory failed.
    Io(std::io::Error),
    /// Writing or reading the savefile failed.
    Savefile(savefile::SavefileError),
}

impl fmt::Display for SaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyExists(path) => write!(
                f,
                "'{}' already exists, pass replace to overwrite it",
                path.display()
            ),
            Self::Io(err) => write!(f, "{}", err),
            Self::Savefile(err) => write!(f, "{:?}", err),
        }
    }
}

impl std::error::Error for SaveError {}

#[derive(Debug, Clone, PartialEq)]
/// An error that happens when batching a dataset.
pub enum DataError {
    /// The inputs and targets do not have the same amount of samples.
    LengthMismatch {
        /// The amount of input samples.
        inputs: usize,
        /// The amount of target samples.
        targets: usize,
    },
    /// There are no samples.
    Empty,
    /// A batch of zero samples was asked for.
    ZeroBatchSize,
    /// Every sample was already given out and looping is off.
    Exhausted,
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LengthMismatch { inputs, targets } => write!(
                f,
                "there are {} input samples but {} target samples",
                inputs, targets
            ),
            Self::Empty => write!(f, "the dataset has no samples"),
            Self::ZeroBatchSize => write!(f, "the batch size must be larger than zero"),
            Self::Exhausted => write!(f, "every sample was already given out"),
        }
    }
}

impl std::error::Error for DataError {}

#[derive(Debug, FromForAllUnnamedVariants)]
/// Every error that a Network operation can give back.
pub enum NetworkError {
    /// Dropout and L2 were both asked for.
    ConflictingRegularization,
    /// The optimizer can only be set once the network ends with an output layer.
    MissingOutputLayer,
    /// There is no layer at this index.
    LayerIndexOutOfRange {
        /// The index that was asked for.
        index: usize,
        /// The amount of layers after the input layer.
        layers_amount: usize,
    },
    /// A dropout network needs `keep_prob` for this run.
    MissingKeepProb,
    /// A L2 network needs `l2` for this run.
    MissingL2Lambda,
    /// The keep probability must be in `(0, 1]`.
    InvalidKeepProb(f32),
    /// The learning rate must be finite and larger than zero.
    InvalidLearningRate(f64),
    /// The session is only opened by `set_optimizer`.
    SessionNotStarted,
    /// The operation only makes sense for classification networks.
    NotAClassifier,
    /// A layer could not be constructed.
    Construction(LayerConstructionError),
    /// The forward pass of a layer failed.
    Propagation(LayerPropagationError),
    /// The fed values are not valid.
    Feed(FeedError),
    /// The session failed.
    Session(SessionError),
    /// Saving or restoring failed.
    Save(SaveError),
    /// Batching the training data failed.
    Data(DataError),
    /// The wrapped framework failed.
    Candle(candle_core::Error),
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConflictingRegularization => write!(
                f,
                "cannot do dropout and l2 at once, choose only one of them"
            ),
            Self::MissingOutputLayer => write!(f, "please add an output layer first"),
            Self::LayerIndexOutOfRange {
                index,
                layers_amount,
            } => write!(
                f,
                "there is no layer {}, the network has {} layers",
                index, layers_amount
            ),
            Self::MissingKeepProb => write!(f, "a keep_prob is needed to run a dropout network"),
            Self::MissingL2Lambda => write!(f, "a l2 lambda is needed to run a l2 network"),
            Self::InvalidKeepProb(keep_prob) => {
                write!(f, "keep_prob must be in (0, 1], got {}", keep_prob)
            }
            Self::InvalidLearningRate(learning_rate) => write!(
                f,
                "the learning rate must be a positive number, got {}",
                learning_rate
            ),
            Self::SessionNotStarted => {
                write!(f, "there is no session, set an optimizer first")
            }
            Self::NotAClassifier => write!(f, "only classification networks can do this"),
            Self::Construction(err) => write!(f, "{}", err),
            Self::Propagation(err) => write!(f, "{}", err),
            Self::Feed(err) => write!(f, "{}", err),
            Self::Session(err) => write!(f, "{}", err),
            Self::Save(err) => write!(f, "{}", err),
            Self::Data(err) => write!(f, "{}", err),
            Self::Candle(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for NetworkError {}
