pub mod config;
pub mod distributions;
pub mod env;
pub mod error;
pub mod mlp;
pub mod policies;
pub mod rng;
pub mod tensors;

pub use error::{Result, SdeError};
