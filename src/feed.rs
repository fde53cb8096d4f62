//! Placeholders and the feed dictionaries that fill them, this is how samples coming from the
//! caller get into the wrapped framework.

use std::collections::HashMap;

use candle_core::{Device, Tensor};
use rayon::prelude::*;

use crate::types::{FeedError, Regularization};

/// The name of the input placeholder.
pub const DATA_PLACEHOLDER: &str = "x_input";
/// The name of the target placeholder.
pub const TARGET_PLACEHOLDER: &str = "y_input";
/// The name of the dropout keep probability placeholder.
pub const KEEP_PROB_PLACEHOLDER: &str = "keep_prob";
/// The name of the L2 lambda placeholder.
pub const L2_LAMBDA_PLACEHOLDER: &str = "l2_lambda";

#[derive(Debug, Clone, PartialEq, Eq)]
/// A named slot with a shape that gets filled at run time, a `None` dimension accepts any size.
pub struct Placeholder {
    /// The name the slot is fed by.
    pub name: String,
    /// The shape of the slot, empty for scalars.
    pub shape: Vec<Option<usize>>,
}

impl Placeholder {
    /// Creates a new Placeholder.
    pub fn new(name: impl Into<String>, shape: Vec<Option<usize>>) -> Self {
        Placeholder {
            name: name.into(),
            shape,
        }
    }

    /// Creates a Placeholder for a single value.
    pub fn scalar(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }

    /// Creates a Placeholder for a batch of any amount of samples with `width` values each.
    pub fn batch(name: impl Into<String>, width: usize) -> Self {
        Self::new(name, vec![None, Some(width)])
    }

    /// Weather or not a value of this shape can fill the placeholder.
    pub fn accepts(&self, shape: &[usize]) -> bool {
        self.shape.len() == shape.len()
            && self
                .shape
                .iter()
                .zip(shape)
                .all(|(expected, found)| expected.map_or(true, |expected| expected == *found))
    }

    /// Checks the shape of a value that is about to be fed.
    pub fn check(&self, value: &Tensor) -> Result<(), FeedError> {
        if self.accepts(value.dims()) {
            Ok(())
        } else {
            Err(FeedError::ShapeMismatch {
                placeholder: self.name.clone(),
                expected: self.shape.clone(),
                found: value.dims().to_vec(),
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Every placeholder of a Network.
pub struct Placeholders {
    /// The inputs, `[None, input_size]`.
    pub data: Placeholder,
    /// The targets, `[None, output_size]`.
    pub target: Placeholder,
    /// The keep probability, only in dropout networks.
    pub keep_prob: Option<Placeholder>,
    /// The L2 lambda, only in L2 networks.
    pub l2_lambda: Option<Placeholder>,
}

impl Placeholders {
    /// Creates the placeholders a Network with these sizes and this regularization needs.
    pub fn new(input_size: usize, output_size: usize, regularization: Regularization) -> Self {
        Placeholders {
            data: Placeholder::batch(DATA_PLACEHOLDER, input_size),
            target: Placeholder::batch(TARGET_PLACEHOLDER, output_size),
            keep_prob: match regularization {
                Regularization::Dropout => Some(Placeholder::scalar(KEEP_PROB_PLACEHOLDER)),
                _ => None,
            },
            l2_lambda: match regularization {
                Regularization::L2 => Some(Placeholder::scalar(L2_LAMBDA_PLACEHOLDER)),
                _ => None,
            },
        }
    }

    /// The placeholder of the regularization, if any.
    pub fn regularization(&self) -> Option<&Placeholder> {
        self.keep_prob.as_ref().or(self.l2_lambda.as_ref())
    }
}

#[derive(Debug, Clone, Default)]
/// The values of one run, by placeholder name.
pub struct FeedDict {
    values: HashMap<String, Tensor>,
}

impl FeedDict {
    /// Creates an empty FeedDict.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a value to a placeholder after checking its shape.
    pub fn feed(&mut self, placeholder: &Placeholder, value: Tensor) -> Result<&mut Self, FeedError> {
        placeholder.check(&value)?;
        self.values.insert(placeholder.name.clone(), value);

        Ok(self)
    }

    /// Feeds a single value to a scalar placeholder.
    pub fn feed_scalar(
        &mut self,
        placeholder: &Placeholder,
        value: f32,
        device: &Device,
    ) -> Result<&mut Self, FeedError> {
        self.feed(placeholder, Tensor::new(value, device)?)
    }

    /// The value fed to a placeholder.
    pub fn get(&self, placeholder: &Placeholder) -> Result<&Tensor, FeedError> {
        self.values
            .get(&placeholder.name)
            .ok_or_else(|| FeedError::MissingFeed(placeholder.name.clone()))
    }

    /// The single value fed to a scalar placeholder.
    pub fn scalar(&self, placeholder: &Placeholder) -> Result<f32, FeedError> {
        Ok(self.get(placeholder)?.to_scalar::<f32>()?)
    }

    /// Weather or not nothing was fed.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
/// The scalar values layers read while propagating.
pub struct RunFeeds {
    /// The fed keep probability, dropout networks only.
    pub keep_prob: Option<f32>,
    /// The fed L2 lambda, L2 networks only.
    pub l2_lambda: Option<f32>,
}

impl RunFeeds {
    /// Reads the scalar values out of a FeedDict, the keep probability of a dropout network
    /// must always be fed while the L2 lambda is only needed by the loss.
    pub fn from_feed_dict(placeholders: &Placeholders, feed_dict: &FeedDict) -> Result<Self, FeedError> {
        let keep_prob = match &placeholders.keep_prob {
            Some(placeholder) => Some(feed_dict.scalar(placeholder)?),
            None => None,
        };

        let l2_lambda = placeholders
            .l2_lambda
            .as_ref()
            .and_then(|placeholder| feed_dict.scalar(placeholder).ok());

        Ok(RunFeeds {
            keep_prob,
            l2_lambda,
        })
    }
}

/// Things that can be fed as a batch of samples. A single sample becomes a batch of one.
pub trait IntoSamples {
    /// Turns the value into one Vec per sample.
    fn into_samples(self) -> Vec<Vec<f32>>;
}

impl IntoSamples for &[f32] {
    fn into_samples(self) -> Vec<Vec<f32>> {
        vec![self.to_vec()]
    }
}

impl IntoSamples for &Vec<f32> {
    fn into_samples(self) -> Vec<Vec<f32>> {
        vec![self.to_vec()]
    }
}

impl IntoSamples for &[Vec<f32>] {
    fn into_samples(self) -> Vec<Vec<f32>> {
        self.to_vec()
    }
}

impl IntoSamples for &Vec<Vec<f32>> {
    fn into_samples(self) -> Vec<Vec<f32>> {
        self.to_vec()
    }
}

impl IntoSamples for Vec<Vec<f32>> {
    fn into_samples(self) -> Vec<Vec<f32>> {
        self
    }
}

/// Stacks samples into a (samples, values) tensor, every sample must have the same amount of
/// values.
pub fn samples_to_tensor(samples: &[Vec<f32>], device: &Device) -> Result<Tensor, FeedError> {
    let width = samples.first().ok_or(FeedError::EmptyBatch)?.len();

    if let Some((sample_index, sample)) = samples
        .iter()
        .enumerate()
        .find(|(_, sample)| sample.len() != width)
    {
        return Err(FeedError::RaggedSamples {
            sample_index,
            expected: width,
            found: sample.len(),
        });
    }

    let flattened: Vec<f32> = samples
        .par_iter()
        .flat_map(|sample| sample.par_iter().copied())
        .collect();

    Ok(Tensor::from_vec(flattened, (samples.len(), width), device)?)
}

/// Turns a (samples, values) tensor back into one Vec per sample.
pub fn tensor_to_samples(values: &Tensor) -> Result<Vec<Vec<f32>>, FeedError> {
    Ok(values.to_vec2::<f32>()?)
}

#[cfg(test)]
mod tests {
    use candle_core::{Device, Tensor};

    use super::{samples_to_tensor, FeedDict, IntoSamples, Placeholder, Placeholders, RunFeeds};
    use crate::types::{FeedError, Regularization};

    #[test]
    fn should_promote_a_single_sample_to_a_batch() {
        let sample = vec![1.0, 2.0, 3.0];

        assert_eq!((&sample).into_samples(), vec![vec![1.0, 2.0, 3.0]]);
        assert_eq!(sample.as_slice().into_samples().len(), 1);
    }

    #[test]
    fn should_accept_any_amount_of_samples() {
        let placeholder = Placeholder::batch("x_input", 3);

        assert!(placeholder.accepts(&[1, 3]));
        assert!(placeholder.accepts(&[250, 3]));
        assert!(!placeholder.accepts(&[5, 2]));
        assert!(!placeholder.accepts(&[3]));
    }

    #[test]
    fn should_refuse_feeds_of_the_wrong_shape() {
        let placeholder = Placeholder::batch("x_input", 3);
        let value = Tensor::zeros((2, 4), candle_core::DType::F32, &Device::Cpu).unwrap();

        let result = FeedDict::new().feed(&placeholder, value).map(|_| ());

        assert!(matches!(result, Err(FeedError::ShapeMismatch { .. })));
    }

    #[test]
    fn should_refuse_ragged_samples() {
        let samples = vec![vec![1.0, 2.0], vec![1.0]];

        assert!(matches!(
            samples_to_tensor(&samples, &Device::Cpu),
            Err(FeedError::RaggedSamples {
                sample_index: 1,
                expected: 2,
                found: 1
            })
        ));
        assert!(matches!(
            samples_to_tensor(&[], &Device::Cpu),
            Err(FeedError::EmptyBatch)
        ));
    }

    #[test]
    fn should_keep_the_order_of_the_samples() {
        let samples = vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]];
        let tensor = samples_to_tensor(&samples, &Device::Cpu).unwrap();

        assert_eq!(tensor.to_vec2::<f32>().unwrap(), samples);
    }

    #[test]
    fn dropout_networks_should_need_a_keep_prob() {
        let placeholders = Placeholders::new(2, 1, Regularization::Dropout);
        let mut feed_dict = FeedDict::new();

        assert!(matches!(
            RunFeeds::from_feed_dict(&placeholders, &feed_dict),
            Err(FeedError::MissingFeed(_))
        ));

        feed_dict
            .feed_scalar(placeholders.keep_prob.as_ref().unwrap(), 0.5, &Device::Cpu)
            .unwrap();

        let feeds = RunFeeds::from_feed_dict(&placeholders, &feed_dict).unwrap();
        assert_eq!(feeds.keep_prob, Some(0.5));
        assert_eq!(feeds.l2_lambda, None);
    }
}
