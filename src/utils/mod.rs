//! Just a module with a few utilities that make writing tests easier through out tfnn

pub mod approx_eq;
