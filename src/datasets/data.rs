//! A mini-batch iterator over the samples a Network is trained on.

use log::debug;
use rand::seq::SliceRandom;

use crate::types::DataError;

/// A batch of inputs and the targets that go with them.
pub type Batch = (Vec<Vec<f32>>, Vec<Vec<f32>>);

#[derive(Debug, Clone)]
/// Inputs and targets that are given out batch by batch in order, or in a new random order every
/// epoch when shuffling is on.
pub struct Data {
    xs: Vec<Vec<f32>>,
    ys: Vec<Vec<f32>>,
    order: Vec<usize>,
    cursor: usize,
    epochs_completed: usize,
    shuffle: bool,
}

impl Data {
    /// Creates a new Data, both sides must have the same amount of samples.
    pub fn new(xs: Vec<Vec<f32>>, ys: Vec<Vec<f32>>) -> Result<Self, DataError> {
        if xs.len() != ys.len() {
            return Err(DataError::LengthMismatch {
                inputs: xs.len(),
                targets: ys.len(),
            });
        }

        if xs.is_empty() {
            return Err(DataError::Empty);
        }

        Ok(Data {
            order: (0..xs.len()).collect(),
            xs,
            ys,
            cursor: 0,
            epochs_completed: 0,
            shuffle: false,
        })
    }

    /// Shuffles the samples now and again every time an epoch is completed.
    pub fn shuffled(mut self) -> Self {
        self.shuffle = true;
        self.order.shuffle(&mut rand::thread_rng());
        self
    }

    /// The amount of samples.
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    /// Never true, a Data always has samples.
    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    /// How many times every sample was given out.
    pub fn epochs_completed(&self) -> usize {
        self.epochs_completed
    }

    /// Every input and every target in the original order.
    pub fn all(&self) -> (&[Vec<f32>], &[Vec<f32>]) {
        (&self.xs, &self.ys)
    }

    fn complete_epoch(&mut self) {
        self.epochs_completed += 1;
        self.cursor = 0;

        if self.shuffle {
            self.order.shuffle(&mut rand::thread_rng());
        }

        debug!("completed epoch {}", self.epochs_completed);
    }

    /// Gives out the next `batch_size` samples.
    ///
    /// With `loop_` every batch is complete, going back to the first sample when the last one is
    /// reached. Without it the last batch of the epoch may be shorter and asking for more after
    /// that gives back `DataError::Exhausted`.
    pub fn next_batch(&mut self, batch_size: usize, loop_: bool) -> Result<Batch, DataError> {
        if batch_size == 0 {
            return Err(DataError::ZeroBatchSize);
        }

        if !loop_ && self.cursor >= self.len() {
            return Err(DataError::Exhausted);
        }

        let mut xs = Vec::with_capacity(batch_size);
        let mut ys = Vec::with_capacity(batch_size);

        while xs.len() < batch_size {
            if self.cursor >= self.len() {
                if !loop_ {
                    break;
                }
                self.complete_epoch();
            }

            let index = self.order[self.cursor];
            xs.push(self.xs[index].clone());
            ys.push(self.ys[index].clone());
            self.cursor += 1;
        }

        if !loop_ && self.cursor >= self.len() {
            self.epochs_completed += 1;
        }

        Ok((xs, ys))
    }
}
