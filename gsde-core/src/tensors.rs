use candle_core::Tensor;
use derive_more::{Deref, DerefMut, Display};

/// Log-density summed over action dimensions, shape `(batch,)`.
#[derive(Deref, DerefMut, Debug, Display, Clone)]
pub struct Logp(pub Tensor);

/// Entropy summed over action dimensions, shape `(batch,)`.
#[derive(Deref, DerefMut, Debug, Display, Clone)]
pub struct Entropy(pub Tensor);

#[derive(Deref, DerefMut, Debug, Display, Clone)]
pub struct Values(pub Tensor);
