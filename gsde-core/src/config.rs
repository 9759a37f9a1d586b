use serde::{Deserialize, Serialize};

/// Knobs of the state dependent exploration distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GsdeConfig {
    /// One std per (latent feature, action) pair instead of one per action.
    pub full_std: bool,
    /// Use `expln` instead of `exp` to keep the std positive without letting it explode.
    pub use_expln: bool,
    /// Squash samples through `tanh` so actions stay inside `[-1, 1]`.
    pub squash_output: bool,
    /// Let gradients flow back into the latent features.
    pub learn_features: bool,
    pub epsilon: f64,
    pub log_std_init: f64,
}

impl Default for GsdeConfig {
    fn default() -> Self {
        Self {
            full_std: true,
            use_expln: false,
            squash_output: false,
            learn_features: true,
            epsilon: 1e-6,
            log_std_init: 0.,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ExplorationKind {
    StateDependent(GsdeConfig),
    DiagGaussian { log_std_init: f64 },
}

impl Default for ExplorationKind {
    fn default() -> Self {
        Self::StateDependent(GsdeConfig::default())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyOptions {
    pub policy_layers: Vec<usize>,
    pub value_layers: Vec<usize>,
    /// Width of a learned projection used as gSDE latent. The raw observation is used when unset.
    pub features_dim: Option<usize>,
    pub exploration: ExplorationKind,
}

impl Default for PolicyOptions {
    fn default() -> Self {
        Self {
            policy_layers: vec![64, 64],
            value_layers: vec![64, 64],
            features_dim: None,
            exploration: ExplorationKind::default(),
        }
    }
}
