use candle_core::{DType, Device};
use candle_nn::{VarBuilder, VarMap};
use gsde_core::{
    Result,
    config::{ExplorationKind, GsdeConfig, PolicyOptions},
    env::EnvironmentDescription,
    policies::policy_value_network::PolicyValueNetwork,
    rng::RngHandle,
};

/// A network together with the variables backing it.
pub struct BuiltPolicy {
    pub network: PolicyValueNetwork,
    pub varmap: VarMap,
    pub rng: RngHandle,
}

pub struct PolicyBuilder {
    pub options: PolicyOptions,
    pub seed: u64,
    pub dtype: DType,
}

impl Default for PolicyBuilder {
    fn default() -> Self {
        Self {
            options: PolicyOptions::default(),
            seed: 0,
            dtype: DType::F32,
        }
    }
}

impl PolicyBuilder {
    pub fn state_dependent(config: GsdeConfig) -> Self {
        Self {
            options: PolicyOptions {
                exploration: ExplorationKind::StateDependent(config),
                ..PolicyOptions::default()
            },
            ..Self::default()
        }
    }

    pub fn diag_gaussian(log_std_init: f64) -> Self {
        Self {
            options: PolicyOptions {
                exploration: ExplorationKind::DiagGaussian { log_std_init },
                ..PolicyOptions::default()
            },
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_features_dim(mut self, features_dim: usize) -> Self {
        self.options.features_dim = Some(features_dim);
        self
    }

    pub fn build(
        &self,
        env_description: &EnvironmentDescription,
        device: &Device,
    ) -> Result<BuiltPolicy> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, self.dtype, device);
        let rng = RngHandle::seeded(self.seed);
        let network = PolicyValueNetwork::build(env_description, &self.options, &vb, rng.clone())?;
        Ok(BuiltPolicy {
            network,
            varmap,
            rng,
        })
    }
}
