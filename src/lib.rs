//! A layer-by-layer builder for **feed-forward neural networks** that leaves every numerical
//! concern to [candle](https://github.com/huggingface/candle): tensors, automatic differentiation
//! and the optimizers all come from it.
//!
//! A Network starts with only its input layer, hidden, fully connected and conv layers get
//! chained on top of it and an output layer closes it. Setting an optimizer opens a Session and
//! from then on the Network can be trained batch by batch with `run_step` or with a whole
//! training loop through `fit`.
//!
//! tfnn itself only keeps the bookkeeping: the configuration and result tables of the layers,
//! the placeholders that get fed on every run and the regularization mode of the Network.

#![deny(missing_docs)]

pub mod datasets;
pub mod feed;
pub mod layers;
pub mod loss_functions;
pub mod network;
pub mod optimizers;
pub mod saver;
pub mod session;
pub mod types;
mod utils;

pub use network::{FitOptions, Network};
pub use optimizers::Optimizer;
pub use saver::NetworkSaver;
pub use types::{NetworkError, NetworkLayer, NetworkType, Regularization};

#[cfg(test)]
mod tests;
