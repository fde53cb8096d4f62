//! The module for the data handling features of tfnn.
//!
//! Currently contains the following.
//! - Data, a mini-batch iterator over inputs and their targets
//! - Normalizer, a per column feature scaling

pub mod data;
pub mod normalizer;

pub use data::Data;
pub use normalizer::{ColumnScale, Normalizer};
