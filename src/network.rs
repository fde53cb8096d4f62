//! The module that defines the Network, the object every other part of tfnn is wired through.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use candle_core::{Device, Tensor, D};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};

use crate::{
    datasets::{Data, Normalizer},
    feed::{samples_to_tensor, tensor_to_samples, FeedDict, IntoSamples, Placeholders, RunFeeds},
    layers::{
        dense::argmax_rows, ConvLayer, ConvOptions, DenseOptions, FcLayer, HiddenLayer,
        InputParams, Layer, LayerConfig, LayerParams, LayerResults, LayerType, LayersConfigs,
        LayersResults, NetInOut, NeuralStructure, OutputLayer, VariableSpec,
    },
    loss_functions::{l2_penalty, LossFunction},
    optimizers::Optimizer,
    saver::{NetworkSaver, NetworkSnapshot, SavedVariable},
    session::Session,
    types::{
        DataError, FeedError, LayerConstructionError, LayerPropagationError, NetworkError,
        NetworkLayer, NetworkType, Regularization,
    },
};

/// The log target summaries of scalar values are written to.
pub const SUMMARY_TARGET: &str = "tfnn::summary";

#[derive(Debug, Clone, Copy, PartialEq)]
/// The options of [Network::fit].
pub struct FitOptions {
    /// The amount of training steps, one batch each.
    pub steps: usize,
    /// The amount of samples per batch.
    pub batch_size: usize,
    /// The keep probability fed to dropout networks.
    pub keep_prob: Option<f32>,
    /// The L2 lambda fed to L2 networks.
    pub l2: Option<f32>,
    /// Weather or not the samples are shuffled every epoch.
    pub shuffle: bool,
    /// Weather or not a progress bar is shown.
    pub verbose: bool,
    /// Weather or not the loss on all of the samples is computed once training is done.
    pub compute_loss: bool,
}

impl Default for FitOptions {
    fn default() -> Self {
        FitOptions {
            steps: 2000,
            batch_size: 100,
            keep_prob: None,
            l2: None,
            shuffle: false,
            verbose: false,
            compute_loss: false,
        }
    }
}

/// What comes out of a forward pass.
struct RunOutput {
    outputs: Tensor,
    loss: Option<Tensor>,
}

#[derive(Debug)]
/// A feed-forward neural network built layer by layer.
///
/// # Examples
///
/// ```rust
/// use tfnn::{
///     layers::{Activator, DenseOptions},
///     Network, NetworkType,
/// };
///
/// let mut network = Network::new(2, 1, false, false, NetworkType::Regression).unwrap();
///
/// network
///     .add_hidden_layer(3, DenseOptions::new().activator(Activator::Tanh))
///     .unwrap()
///     .add_output_layer(DenseOptions::new())
///     .unwrap();
///
/// assert_eq!(network.layers().len(), 2);
/// assert_eq!(network.layers_configs().len(), 3);
/// ```
pub struct Network {
    input_size: usize,
    output_size: usize,
    regularization: Regularization,
    network_type: NetworkType,
    placeholders: Placeholders,

    layers: Vec<NetworkLayer>,
    layers_configs: LayersConfigs,
    layers_results: LayersResults,

    loss_function: Option<LossFunction>,
    learning_rate: Option<f64>,
    session: Option<Session>,
    saver: Option<NetworkSaver>,
    restored: Option<HashMap<String, SavedVariable>>,

    normalizer: Normalizer,
    global_step: usize,
    device: Device,
}

impl Network {
    /// Creates a Network with only its input layer.
    ///
    /// Dropout and L2 cannot be asked for at once. The regularization chosen decides which extra
    /// value has to be fed on every run.
    pub fn new(
        input_size: usize,
        output_size: usize,
        do_dropout: bool,
        do_l2: bool,
        network_type: NetworkType,
    ) -> Result<Self, NetworkError> {
        let regularization = Regularization::from_flags(do_dropout, do_l2)?;

        if input_size == 0 {
            return Err(LayerConstructionError::ZeroSized("the input size").into());
        }

        if output_size == 0 {
            return Err(LayerConstructionError::ZeroSized("the output size").into());
        }

        let placeholders = Placeholders::new(input_size, output_size, regularization);

        if let Some(placeholder) = placeholders.regularization() {
            debug!(
                target: SUMMARY_TARGET,
                "{} is fed on every run", placeholder.name
            );
        }

        let input_row = LayerConfig {
            layer_type: LayerType::Input,
            name: LayerType::Input.default_name_prefix().to_string(),
            neural_structure: NeuralStructure::Dense {
                input_size,
                output_size: input_size,
            },
            para: LayerParams::Input(InputParams {
                regularization,
                placeholder: placeholders
                    .regularization()
                    .map(|placeholder| placeholder.name.clone()),
                network_type,
            }),
            net_in_out: Some(NetInOut {
                input_size,
                output_size,
            }),
        };

        Ok(Network {
            input_size,
            output_size,
            regularization,
            network_type,
            placeholders,

            layers: Vec::new(),
            layers_configs: LayersConfigs::new(input_row),
            layers_results: LayersResults::new(),

            loss_function: None,
            learning_rate: None,
            session: None,
            saver: None,
            restored: None,

            normalizer: Normalizer::default(),
            global_step: 0,
            device: Device::Cpu,
        })
    }

    /// The amount of inputs per sample.
    pub fn input_size(&self) -> usize {
        self.input_size
    }

    /// The amount of outputs per sample.
    pub fn output_size(&self) -> usize {
        self.output_size
    }

    /// The regularization mode chosen when the Network was created.
    pub fn regularization(&self) -> Regularization {
        self.regularization
    }

    /// The type of the Network.
    pub fn network_type(&self) -> NetworkType {
        self.network_type
    }

    /// The placeholders that get fed on every run.
    pub fn placeholders(&self) -> &Placeholders {
        &self.placeholders
    }

    /// The layers after the input layer in the order they were built.
    pub fn layers(&self) -> &[NetworkLayer] {
        &self.layers
    }

    /// The configuration table.
    pub fn layers_configs(&self) -> &LayersConfigs {
        &self.layers_configs
    }

    /// The result table of the last forward pass.
    pub fn layers_results(&self) -> &LayersResults {
        &self.layers_results
    }

    /// The loss, only there once the output layer was built.
    pub fn loss_function(&self) -> Option<LossFunction> {
        self.loss_function
    }

    /// The learning rate of the optimizer that was set, if any.
    pub fn learning_rate(&self) -> Option<f64> {
        self.learning_rate
    }

    /// The amount of training steps run so far.
    pub fn global_step(&self) -> usize {
        self.global_step
    }

    /// The Session opened by `set_optimizer`.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// The feature scaling kept and saved along with the Network.
    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// The feature scaling kept and saved along with the Network.
    pub fn normalizer_mut(&mut self) -> &mut Normalizer {
        &mut self.normalizer
    }

    /// Constructs a layer on top of the last one and appends it to the tables.
    pub fn build_layer(&mut self, mut layer: NetworkLayer) -> Result<&mut Self, NetworkError> {
        layer.construct(&self.layers_configs)?;

        let config = layer
            .config()
            .cloned()
            .ok_or(LayerPropagationError::NotConstructed)?;
        let is_output = config.layer_type == LayerType::Output;

        debug!("built {} as layer {}", config.name, self.layers.len());

        self.layers_configs.push(config);
        self.layers_results.push(LayerResults::default());
        self.layers.push(layer);

        if is_output {
            self.init_loss();
        }

        Ok(self)
    }

    /// Constructs many layers in order.
    pub fn build_layers(
        &mut self,
        layers: impl IntoIterator<Item = NetworkLayer>,
    ) -> Result<&mut Self, NetworkError> {
        for layer in layers {
            self.build_layer(layer)?;
        }

        Ok(self)
    }

    /// Adds a dense layer with `n_neurons` outputs.
    pub fn add_hidden_layer(
        &mut self,
        n_neurons: usize,
        options: DenseOptions,
    ) -> Result<&mut Self, NetworkError> {
        self.build_layer(HiddenLayer::new(n_neurons, options))
    }

    /// Adds a dense layer with `n_neurons` outputs that can follow a conv layer.
    pub fn add_fc_layer(
        &mut self,
        n_neurons: usize,
        options: DenseOptions,
    ) -> Result<&mut Self, NetworkError> {
        self.build_layer(FcLayer::new(n_neurons, options))
    }

    /// Adds a conv layer.
    pub fn add_conv_layer(&mut self, options: ConvOptions) -> Result<&mut Self, NetworkError> {
        self.build_layer(ConvLayer::new(options))
    }

    /// Adds the output layer, nothing can be added after it.
    pub fn add_output_layer(&mut self, options: DenseOptions) -> Result<&mut Self, NetworkError> {
        self.build_layer(OutputLayer::new(options))
    }

    fn init_loss(&mut self) {
        let loss_function = LossFunction::for_network(self.network_type);
        debug!(target: SUMMARY_TARGET, "loss is {:?}", loss_function);

        self.loss_function = Some(loss_function);
    }

    /// Opens a Session that trains with `optimizer`, gradient descent with a learning rate of
    /// 0.001 when none is given.
    ///
    /// When a Session was already running its variable values are carried over to the new one.
    pub fn set_optimizer(&mut self, optimizer: Option<Optimizer>) -> Result<&mut Self, NetworkError> {
        if self.layers_configs.last().layer_type != LayerType::Output {
            return Err(NetworkError::MissingOutputLayer);
        }

        let optimizer = optimizer.unwrap_or_default();
        let learning_rate = optimizer.learning_rate();

        if !learning_rate.is_finite() || learning_rate <= 0.0 {
            return Err(NetworkError::InvalidLearningRate(learning_rate));
        }

        if let Some(previous) = self.session.as_ref() {
            if previous.is_initialized() {
                let values = variable_values(previous)?;
                self.restored = Some(
                    values
                        .into_iter()
                        .map(|variable| (variable.name.clone(), variable))
                        .collect(),
                );
            }
        }

        if let Some(mut previous) = self.session.take() {
            previous.close();
        }

        debug!(target: SUMMARY_TARGET, "learning_rate = {}", learning_rate);

        self.learning_rate = Some(learning_rate);
        self.session = Some(Session::new(optimizer, self.device.clone()));

        Ok(self)
    }

    /// Creates the variables of every layer in the Session, from restored values when there
    /// are any. Running the Network does this on its own the first time.
    pub fn initialize_variables(&mut self) -> Result<(), NetworkError> {
        let session = self
            .session
            .as_mut()
            .ok_or(NetworkError::SessionNotStarted)?;

        if session.is_initialized() {
            return Ok(());
        }

        let specs: Vec<&VariableSpec> = self
            .layers
            .iter()
            .flat_map(|layer| layer.weights().into_iter().chain(layer.biases()))
            .collect();

        session.initialize_all_variables(&specs, self.restored.as_ref())?;
        self.restored = None;

        Ok(())
    }

    /// Checks the regularization values of a training run and picks the one that gets fed.
    fn training_feed(
        &self,
        keep_prob: Option<f32>,
        l2: Option<f32>,
    ) -> Result<Option<f32>, NetworkError> {
        match self.regularization {
            Regularization::Dropout => {
                if l2.is_some() {
                    warn!("ignoring the l2 lambda given to a dropout network");
                }

                let keep_prob = keep_prob.ok_or(NetworkError::MissingKeepProb)?;
                if !(keep_prob > 0.0 && keep_prob <= 1.0) {
                    return Err(NetworkError::InvalidKeepProb(keep_prob));
                }

                Ok(Some(keep_prob))
            }
            Regularization::L2 => {
                if keep_prob.is_some() {
                    warn!("ignoring the keep_prob given to a l2 network");
                }

                Ok(Some(l2.ok_or(NetworkError::MissingL2Lambda)?))
            }
            Regularization::None => {
                if keep_prob.is_some() || l2.is_some() {
                    warn!("ignoring the regularization values given to a network without any");
                }

                Ok(None)
            }
        }
    }

    /// The regularization value fed when evaluating, nothing dropped and no penalty.
    fn evaluation_feed(&self) -> Option<f32> {
        match self.regularization {
            Regularization::Dropout => Some(1.0),
            Regularization::L2 => Some(0.0),
            Regularization::None => None,
        }
    }

    fn feed_dict(
        &self,
        xs: &[Vec<f32>],
        ys: Option<&[Vec<f32>]>,
        regularization_value: Option<f32>,
        device: &Device,
    ) -> Result<FeedDict, NetworkError> {
        let mut feed_dict = FeedDict::new();

        feed_dict.feed(&self.placeholders.data, samples_to_tensor(xs, device)?)?;

        if let Some(ys) = ys {
            if ys.len() != xs.len() {
                return Err(FeedError::BatchSizeMismatch {
                    inputs: xs.len(),
                    targets: ys.len(),
                }
                .into());
            }

            feed_dict.feed(&self.placeholders.target, samples_to_tensor(ys, device)?)?;
        }

        if let (Some(placeholder), Some(value)) =
            (self.placeholders.regularization(), regularization_value)
        {
            feed_dict.feed_scalar(placeholder, value, device)?;
        }

        Ok(feed_dict)
    }

    /// Runs a forward pass, filling the result table, and computes the loss when targets are
    /// given.
    fn run(
        &mut self,
        xs: &[Vec<f32>],
        ys: Option<&[Vec<f32>]>,
        regularization_value: Option<f32>,
    ) -> Result<RunOutput, NetworkError> {
        self.initialize_variables()?;

        let session = self
            .session
            .as_ref()
            .ok_or(NetworkError::SessionNotStarted)?;
        let device = session.device().clone();
        let variables = session.variables()?;

        let feed_dict = self.feed_dict(xs, ys, regularization_value, &device)?;
        let feeds = RunFeeds::from_feed_dict(&self.placeholders, &feed_dict)?;

        let inputs = feed_dict.get(&self.placeholders.data)?.clone();
        let mut outputs = inputs.clone();
        let mut rows = Vec::with_capacity(self.layers.len());

        for layer in &self.layers {
            let row = layer.propagate(&outputs, variables, &feeds)?;
            if let Some(layer_outputs) = &row.output {
                outputs = layer_outputs.clone();
            }
            rows.push(row);
        }

        let loss = match ys {
            Some(_) => {
                let targets = feed_dict.get(&self.placeholders.target)?;
                let loss_function = self
                    .loss_function
                    .ok_or(NetworkError::MissingOutputLayer)?;
                let mut loss = loss_function.compute_loss(&outputs, targets)?;

                if let Some(lambda) = feeds.l2_lambda {
                    let weights: Vec<&Tensor> = self
                        .layers
                        .iter()
                        .filter_map(|layer| layer.weights())
                        .filter_map(|spec| variables.get(&spec.name))
                        .map(|var| var.as_tensor())
                        .collect();
                    loss = loss.add(&l2_penalty(&weights, lambda, &device)?)?;
                }

                Some(loss)
            }
            None => None,
        };

        self.layers_results.record_input(inputs);
        for (index, row) in rows.into_iter().enumerate() {
            self.layers_results.record(index + 1, row);
        }

        Ok(RunOutput { outputs, loss })
    }

    /// Runs one training step on a batch: forward pass, loss, backward pass and one optimizer
    /// update. A single sample is treated as a batch of one.
    ///
    /// Dropout networks need `keep_prob` and L2 networks need `l2`, the value of the mode the
    /// Network does not use is ignored. Gives back the loss of the batch before the update.
    pub fn run_step(
        &mut self,
        xs: impl IntoSamples,
        ys: impl IntoSamples,
        keep_prob: Option<f32>,
        l2: Option<f32>,
    ) -> Result<f32, NetworkError> {
        if self.session.is_none() {
            return Err(NetworkError::SessionNotStarted);
        }

        let regularization_value = self.training_feed(keep_prob, l2)?;
        let xs = xs.into_samples();
        let ys = ys.into_samples();

        let run = self.run(&xs, Some(ys.as_slice()), regularization_value)?;
        let loss = run.loss.ok_or(NetworkError::MissingOutputLayer)?;

        self.session
            .as_mut()
            .ok_or(NetworkError::SessionNotStarted)?
            .minimize(&loss)?;
        self.global_step += 1;

        Ok(loss.to_scalar::<f32>()?)
    }

    /// Trains the Network on batches drawn in a loop from the samples.
    ///
    /// Gives back the loss on all of the samples when `compute_loss` is set.
    pub fn fit(
        &mut self,
        xs: &[Vec<f32>],
        ys: &[Vec<f32>],
        options: FitOptions,
    ) -> Result<Option<f32>, NetworkError> {
        if self.session.is_none() {
            return Err(NetworkError::SessionNotStarted);
        }

        let mut data = Data::new(xs.to_vec(), ys.to_vec())?;
        if options.shuffle {
            data = data.shuffled();
        }

        let progress_bar = if options.verbose {
            let progress_bar = ProgressBar::new(options.steps as u64);
            if let Ok(style) =
                ProgressStyle::with_template("[{elapsed_precise}] [{bar:40}] {pos}/{len} {msg}")
            {
                progress_bar.set_style(style.progress_chars("=> "));
            }
            Some(progress_bar)
        } else {
            None
        };

        for _ in 0..options.steps {
            let (batch_xs, batch_ys) = data.next_batch(options.batch_size, true)?;
            let loss = self.run_step(&batch_xs, &batch_ys, options.keep_prob, options.l2)?;

            if let Some(progress_bar) = &progress_bar {
                progress_bar.set_message(format!("loss {:.6}", loss));
                progress_bar.inc(1);
            }
        }

        if let Some(progress_bar) = progress_bar {
            progress_bar.finish();
        }

        info!(
            "trained for {} steps, {} epochs completed",
            options.steps,
            data.epochs_completed()
        );

        if options.compute_loss {
            Ok(Some(self.get_loss(xs, ys)?))
        } else {
            Ok(None)
        }
    }

    /// The loss on some samples with nothing dropped and no L2 penalty.
    pub fn get_loss(&mut self, xs: impl IntoSamples, ys: impl IntoSamples) -> Result<f32, NetworkError> {
        let xs = xs.into_samples();
        let ys = ys.into_samples();
        let regularization_value = self.evaluation_feed();

        let run = self.run(&xs, Some(ys.as_slice()), regularization_value)?;
        let loss = run.loss.ok_or(NetworkError::MissingOutputLayer)?;

        Ok(loss.to_scalar::<f32>()?)
    }

    fn outputs(&mut self, xs: impl IntoSamples) -> Result<Tensor, NetworkError> {
        let xs = xs.into_samples();
        let regularization_value = self.evaluation_feed();

        Ok(self.run(&xs, None, regularization_value)?.outputs)
    }

    /// The outputs of the Network, for classification networks a one-hot encoding of the class
    /// with the largest output.
    pub fn predict(&mut self, xs: impl IntoSamples) -> Result<Vec<Vec<f32>>, NetworkError> {
        let outputs = self.outputs(xs)?;

        match self.network_type {
            NetworkType::Regression => Ok(tensor_to_samples(&outputs)?),
            NetworkType::Classification => Ok(argmax_rows(&outputs)?
                .into_iter()
                .map(|class| {
                    let mut one_hot = vec![0.0; self.output_size];
                    one_hot[class as usize] = 1.0;
                    one_hot
                })
                .collect()),
        }
    }

    /// The softmax probabilities of every class, classification networks only.
    pub fn predict_prob(&mut self, xs: impl IntoSamples) -> Result<Vec<Vec<f32>>, NetworkError> {
        if self.network_type != NetworkType::Classification {
            return Err(NetworkError::NotAClassifier);
        }

        let outputs = self.outputs(xs)?;
        let probabilities = candle_nn::ops::softmax(&outputs, D::Minus1)?;

        Ok(tensor_to_samples(&probabilities)?)
    }

    /// The share of samples whose largest output is the class of their target, classification
    /// networks only.
    pub fn accuracy(&mut self, xs: impl IntoSamples, ys: impl IntoSamples) -> Result<f32, NetworkError> {
        if self.network_type != NetworkType::Classification {
            return Err(NetworkError::NotAClassifier);
        }

        let xs = xs.into_samples();
        let ys = ys.into_samples();

        if xs.len() != ys.len() {
            return Err(DataError::LengthMismatch {
                inputs: xs.len(),
                targets: ys.len(),
            }
            .into());
        }

        let predicted = argmax_rows(&self.outputs(xs)?)?;
        let expected = argmax_rows(&samples_to_tensor(&ys, &self.device)?)?;

        let correct = predicted
            .iter()
            .zip(&expected)
            .filter(|(predicted, expected)| predicted == expected)
            .count();

        Ok(correct as f32 / expected.len() as f32)
    }

    fn layer(&self, n_layer: usize) -> Result<&NetworkLayer, NetworkError> {
        self.layers
            .get(n_layer)
            .ok_or(NetworkError::LayerIndexOutOfRange {
                index: n_layer,
                layers_amount: self.layers.len(),
            })
    }

    fn fetch(&self, spec: Option<&VariableSpec>) -> Result<Tensor, NetworkError> {
        let spec = spec.ok_or(LayerPropagationError::NotConstructed)?;
        let session = self
            .session
            .as_ref()
            .ok_or(NetworkError::SessionNotStarted)?;

        Ok(session.fetch(&spec.name)?)
    }

    /// The current weights of the layer `n_layer`, layer 0 being the first one after the input
    /// layer.
    pub fn get_w(&self, n_layer: usize) -> Result<Tensor, NetworkError> {
        self.fetch(self.layer(n_layer)?.weights())
    }

    /// The current weights of every layer.
    pub fn get_all_w(&self) -> Result<Vec<Tensor>, NetworkError> {
        self.layers
            .iter()
            .map(|layer| self.fetch(layer.weights()))
            .collect()
    }

    /// The current biases of the layer `n_layer`.
    pub fn get_b(&self, n_layer: usize) -> Result<Tensor, NetworkError> {
        self.fetch(self.layer(n_layer)?.biases())
    }

    /// The current biases of every layer.
    pub fn get_all_b(&self) -> Result<Vec<Tensor>, NetworkError> {
        self.layers
            .iter()
            .map(|layer| self.fetch(layer.biases()))
            .collect()
    }

    /// The shape of the weights of the layer `n_layer`, no Session needed.
    pub fn get_w_shape(&self, n_layer: usize) -> Result<Vec<usize>, NetworkError> {
        Ok(spec_shape(self.layer(n_layer)?.weights()))
    }

    /// The shapes of the weights of every layer.
    pub fn get_all_w_shapes(&self) -> Vec<Vec<usize>> {
        self.layers
            .iter()
            .map(|layer| spec_shape(layer.weights()))
            .collect()
    }

    /// The shape of the biases of the layer `n_layer`, no Session needed.
    pub fn get_b_shape(&self, n_layer: usize) -> Result<Vec<usize>, NetworkError> {
        Ok(spec_shape(self.layer(n_layer)?.biases()))
    }

    /// The shapes of the biases of every layer.
    pub fn get_all_b_shapes(&self) -> Vec<Vec<usize>> {
        self.layers
            .iter()
            .map(|layer| spec_shape(layer.biases()))
            .collect()
    }

    /// Saves the Network to `<path>/<name>[-<global_step>].tfnn`, `path` being
    /// `saved_networks` when none is given. Gives back the path of the file written.
    pub fn save(
        &mut self,
        name: &str,
        path: Option<&Path>,
        global_step: Option<usize>,
        replace: bool,
    ) -> Result<PathBuf, NetworkError> {
        let saver = self
            .saver
            .get_or_insert_with(NetworkSaver::default)
            .clone();

        saver.save(self, name, path, global_step, replace)
    }

    /// Closes the Session, running or fetching from the Network fails after this.
    pub fn close(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.close();
        }
    }

    /// Everything a saved Network holds, the variables must be initialized.
    pub(crate) fn snapshot(&self) -> Result<NetworkSnapshot, NetworkError> {
        let session = self
            .session
            .as_ref()
            .ok_or(NetworkError::SessionNotStarted)?;

        Ok(NetworkSnapshot {
            input_size: self.input_size,
            output_size: self.output_size,
            regularization: self.regularization,
            network_type: self.network_type,
            layers: self.layers.clone(),
            variables: variable_values(session)?,
            normalizer: self.normalizer.clone(),
            global_step: self.global_step,
        })
    }

    /// Builds a Network back from what was saved, the saved values wait for the next variable
    /// initialization.
    pub(crate) fn from_snapshot(snapshot: NetworkSnapshot) -> Result<Self, NetworkError> {
        let restored = snapshot.variables_by_name();
        let NetworkSnapshot {
            input_size,
            output_size,
            regularization,
            network_type,
            layers,
            normalizer,
            global_step,
            ..
        } = snapshot;

        let mut network = Network::new(
            input_size,
            output_size,
            regularization == Regularization::Dropout,
            regularization == Regularization::L2,
            network_type,
        )?;

        network.build_layers(layers)?;
        network.normalizer = normalizer;
        network.global_step = global_step;
        network.restored = Some(restored);

        Ok(network)
    }
}

fn spec_shape(spec: Option<&VariableSpec>) -> Vec<usize> {
    spec.map(|spec| spec.shape.clone()).unwrap_or_default()
}

/// The current value of every variable of a Session.
fn variable_values(session: &Session) -> Result<Vec<SavedVariable>, NetworkError> {
    let variables = session.variables()?;

    variables
        .names()
        .iter()
        .map(|name| -> Result<SavedVariable, NetworkError> {
            let tensor = session.fetch(name)?;

            Ok(SavedVariable {
                name: name.clone(),
                shape: tensor.dims().to_vec(),
                values: tensor.flatten_all()?.to_vec1::<f32>()?,
            })
        })
        .collect()
}
