//! The module that contains all the available variable initializers for tfnn

use log::warn;
use rand::prelude::*;
use rand_distr::{Normal, Uniform};
use savefile_derive::Savefile;
use tfnn_macros::FromForAllUnnamedVariants;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// The amount of inputs and outputs that feed into a variable, used by initializers that scale
/// based on the size of the layer.
pub struct Fan {
    /// The amount of values that contribute to one output of the layer.
    pub fan_in: usize,
    /// The amount of outputs one input of the layer contributes to.
    pub fan_out: usize,
}

impl Fan {
    /// Creates a new Fan.
    pub fn new(fan_in: usize, fan_out: usize) -> Self {
        Fan { fan_in, fan_out }
    }
}

/// A trait that is implemented for all tfnn variable initializers.
pub trait InitializerTrait
where
    Self: std::fmt::Debug,
{
    /// Generates just one number based on the Initializer's implementation
    fn initialize_0d(&self, fan: Fan) -> f32;

    /// Generates a Vec of numbers initialized based on the Initializer's implementation
    fn initialize_1d(&self, count: usize, fan: Fan) -> Vec<f32> {
        (0..count).map(|_| self.initialize_0d(fan)).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Savefile)]
/// A Initializer that pretty much just initializes all values of a variable with a constant value
/// provided by the **new** method
pub struct ConstantInitializer {
    /// The constant that all the values will be
    pub constant: f32,
}

impl ConstantInitializer {
    /// Creates a new Constant initializer
    pub fn new(constant: f32) -> Self {
        ConstantInitializer { constant }
    }
}

impl InitializerTrait for ConstantInitializer {
    fn initialize_0d(&self, _: Fan) -> f32 {
        self.constant
    }

    fn initialize_1d(&self, count: usize, _: Fan) -> Vec<f32> {
        vec![self.constant; count]
    }
}

#[derive(Debug, Clone, PartialEq, Savefile)]
/// A Initializer that generates random numbers in a normal distribution based on a **mean** and a
/// **standard deviation** provided by the `new` method
pub struct NormalRandomInitializer {
    /// The mean for the Normal distribution
    pub mean: f32,
    /// The standard deviation for the Normal distribution
    pub standard_deviation: f32,
}

impl NormalRandomInitializer {
    /// Creates a new Normal Random initializer
    pub fn new(mean: f32, std_dev: f32) -> Self {
        NormalRandomInitializer {
            mean,
            standard_deviation: std_dev,
        }
    }
}

impl InitializerTrait for NormalRandomInitializer {
    fn initialize_0d(&self, fan: Fan) -> f32 {
        self.initialize_1d(1, fan)[0]
    }

    fn initialize_1d(&self, count: usize, _: Fan) -> Vec<f32> {
        // rand_distr only refuses standard deviations that are not finite
        if self.standard_deviation.is_nan() || self.standard_deviation < 0.0 {
            warn!(
                "invalid standard deviation {}, initializing with the mean {}",
                self.standard_deviation, self.mean
            );
            return vec![self.mean; count];
        }

        match Normal::new(self.mean, self.standard_deviation) {
            Ok(distribution) => {
                let mut rng = thread_rng();
                (0..count).map(|_| distribution.sample(&mut rng)).collect()
            }
            Err(err) => {
                warn!(
                    "invalid normal distribution ({}), initializing with the mean {}",
                    err, self.mean
                );
                vec![self.mean; count]
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Savefile)]
/// A Initializer that generates random numbers in a uniform distribution between **low** and
/// **high** provided by the `new` method
pub struct UniformRandomInitializer {
    /// The inclusive lower bound of the distribution
    pub low: f32,
    /// The exclusive upper bound of the distribution
    pub high: f32,
}

impl UniformRandomInitializer {
    /// Creates a new Uniform Random initializer
    pub fn new(low: f32, high: f32) -> Self {
        UniformRandomInitializer { low, high }
    }
}

impl InitializerTrait for UniformRandomInitializer {
    fn initialize_0d(&self, fan: Fan) -> f32 {
        self.initialize_1d(1, fan)[0]
    }

    fn initialize_1d(&self, count: usize, _: Fan) -> Vec<f32> {
        if self.low >= self.high {
            return vec![self.low; count];
        }

        let distribution = Uniform::new(self.low, self.high);
        let mut rng = thread_rng();
        (0..count).map(|_| distribution.sample(&mut rng)).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Savefile)]
/// A Initializer that generates random numbers in a uniform distribution based on a range
/// calculated using the fan in and fan out of the layer the initializer is being used on.
/// It is defined in a range of [-limit, limit] where
/// limit = sqrt(6.0 / (fan_in + fan_out))
pub struct XavierInitializer();

impl XavierInitializer {
    /// Creates a new Xavier initializer
    pub fn new() -> Self {
        XavierInitializer()
    }

    /// The bound of the uniform distribution for some fan.
    pub fn limit(fan: Fan) -> f32 {
        let fan_sum = (fan.fan_in + fan.fan_out).max(1) as f32;
        (6.0 / fan_sum).sqrt()
    }
}

impl Default for XavierInitializer {
    fn default() -> Self {
        Self::new()
    }
}

impl InitializerTrait for XavierInitializer {
    fn initialize_0d(&self, fan: Fan) -> f32 {
        self.initialize_1d(1, fan)[0]
    }

    fn initialize_1d(&self, count: usize, fan: Fan) -> Vec<f32> {
        let limit = Self::limit(fan);
        let distribution = Uniform::new_inclusive(-limit, limit);
        let mut rng = thread_rng();
        (0..count).map(|_| distribution.sample(&mut rng)).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Savefile, FromForAllUnnamedVariants)]
/// The enum that contains all of the possible Initializers, this is the `w_initial` of a layer.
pub enum Initializer {
    /// The Constant initializer
    Constant(ConstantInitializer),
    /// The Normal Random initializer
    RandomNormal(NormalRandomInitializer),
    /// The Uniform Random initializer
    RandomUniform(UniformRandomInitializer),
    /// The Xavier (Glorot uniform) initializer
    Xavier(XavierInitializer),
}

impl InitializerTrait for Initializer {
    fn initialize_0d(&self, fan: Fan) -> f32 {
        match self {
            Initializer::Constant(i) => i.initialize_0d(fan),
            Initializer::RandomNormal(i) => i.initialize_0d(fan),
            Initializer::RandomUniform(i) => i.initialize_0d(fan),
            Initializer::Xavier(i) => i.initialize_0d(fan),
        }
    }

    fn initialize_1d(&self, count: usize, fan: Fan) -> Vec<f32> {
        match self {
            Initializer::Constant(i) => i.initialize_1d(count, fan),
            Initializer::RandomNormal(i) => i.initialize_1d(count, fan),
            Initializer::RandomUniform(i) => i.initialize_1d(count, fan),
            Initializer::Xavier(i) => i.initialize_1d(count, fan),
        }
    }
}

impl Default for Initializer {
    fn default() -> Self {
        Self::Xavier(XavierInitializer::new())
    }
}

/// The initializer of every bias in tfnn.
pub(crate) fn bias_initializer() -> Initializer {
    ConstantInitializer::new(0.1).into()
}

#[cfg(test)]
mod tests {
    use super::{
        Fan, Initializer, InitializerTrait, NormalRandomInitializer, UniformRandomInitializer,
        XavierInitializer,
    };

    #[test]
    fn xavier_should_stay_inside_its_limit() {
        let fan = Fan::new(30, 10);
        let limit = XavierInitializer::limit(fan);

        assert!((limit - (6.0f32 / 40.0).sqrt()).abs() <= 1e-6);

        let values = Initializer::default().initialize_1d(500, fan);

        assert_eq!(values.len(), 500);
        assert!(values.iter().all(|value| value.abs() <= limit));
    }

    #[test]
    fn uniform_should_stay_inside_its_interval() {
        let values = UniformRandomInitializer::new(-0.5, 0.25).initialize_1d(300, Fan::new(1, 1));

        assert!(values.iter().all(|value| *value >= -0.5 && *value < 0.25));
    }

    #[test]
    fn invalid_normal_should_fall_back_to_the_mean() {
        let negative = NormalRandomInitializer::new(0.3, -1.0).initialize_1d(4, Fan::new(1, 1));
        let not_a_number =
            NormalRandomInitializer::new(0.3, f32::NAN).initialize_1d(4, Fan::new(1, 1));

        assert_eq!(negative, vec![0.3; 4]);
        assert_eq!(not_a_number, vec![0.3; 4]);
    }

    #[test]
    fn bias_initializer_should_be_a_constant() {
        assert_eq!(
            super::bias_initializer().initialize_1d(3, Fan::new(2, 3)),
            vec![0.1, 0.1, 0.1]
        );
    }
}
