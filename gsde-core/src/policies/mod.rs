pub mod policy_value_network;

use crate::tensors::{Entropy, Logp, Values};
use candle_core::Tensor;

/// Everything the training loop needs from one forward pass.
#[derive(Debug, Clone)]
pub struct ActionAndValue {
    pub action: Tensor,
    pub log_prob: Logp,
    /// `None` when the action distribution has no closed form entropy (squashed gSDE).
    pub entropy: Option<Entropy>,
    pub value: Values,
}
