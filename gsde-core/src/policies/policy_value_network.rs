use super::ActionAndValue;
use crate::{
    config::{ExplorationKind, GsdeConfig, PolicyOptions},
    distributions::{
        ActionDistribution, Distribution, diagonal_distribution::DiagGaussianDistribution,
        noise_sampler::NoiseSampler, state_dependent_distribution::StateDependentNoiseDistribution,
        std_transform::StdTransform,
    },
    env::EnvironmentDescription,
    error::{Result, SdeError},
    mlp::{Activation, Mlp, build_mlp},
    rng::RngHandle,
    tensors::{Entropy, Logp, Values},
};
use candle_core::Tensor;
use candle_nn::{Init, Linear, Module, VarBuilder, linear};

#[derive(Debug, Clone)]
enum Exploration {
    StateDependent {
        config: GsdeConfig,
        sampler: NoiseSampler,
    },
    DiagGaussian,
}

/// Actor-critic producing `(mean, log_std, value)` from an observation batch and wrapping the
/// mean in either a gSDE or a plain diagonal Gaussian distribution.
#[derive(Debug, Clone)]
pub struct PolicyValueNetwork {
    actor_mean: Mlp,
    critic: Mlp,
    features: Option<Linear>,
    log_std: Tensor,
    exploration: Exploration,
    rng: RngHandle,
    observation_dim: usize,
    action_dim: usize,
}

impl PolicyValueNetwork {
    pub fn build(
        env_description: &EnvironmentDescription,
        options: &PolicyOptions,
        vb: &VarBuilder,
        rng: RngHandle,
    ) -> Result<Self> {
        env_description.ensure_continous_actions()?;
        let observation_dim = env_description.observation_size();
        let action_dim = env_description.action_size();
        let policy_layers = [&options.policy_layers[..], &[action_dim]].concat();
        let value_layers = [&options.value_layers[..], &[1]].concat();
        let actor_mean = build_mlp(
            observation_dim,
            &policy_layers,
            Activation::Tanh,
            vb,
            "actor_mean",
        )?;
        let critic = build_mlp(observation_dim, &value_layers, Activation::Tanh, vb, "critic")?;
        let features = options
            .features_dim
            .map(|dim| linear(observation_dim, dim, vb.pp("latent_sde")))
            .transpose()?;
        let latent_dim = options.features_dim.unwrap_or(observation_dim);
        let (log_std, exploration) = match options.exploration {
            ExplorationKind::StateDependent(config) => {
                let shape = StdTransform::new(&config, latent_dim, action_dim).log_std_shape();
                let log_std =
                    vb.get_with_hints(shape, "log_std", Init::Const(config.log_std_init))?;
                let sampler = NoiseSampler::new(&config, latent_dim, action_dim, rng.clone());
                (log_std, Exploration::StateDependent { config, sampler })
            }
            ExplorationKind::DiagGaussian { log_std_init } => {
                let log_std = vb.get_with_hints(action_dim, "log_std", Init::Const(log_std_init))?;
                (log_std, Exploration::DiagGaussian)
            }
        };
        tracing::debug!(
            observation_dim,
            action_dim,
            latent_dim,
            log_std_shape = ?log_std.dims(),
            state_dependent = matches!(exploration, Exploration::StateDependent { .. }),
            "built policy value network"
        );
        Ok(Self {
            actor_mean,
            critic,
            features,
            log_std,
            exploration,
            rng,
            observation_dim,
            action_dim,
        })
    }

    pub fn log_std(&self) -> &Tensor {
        &self.log_std
    }

    pub fn action_dim(&self) -> usize {
        self.action_dim
    }

    pub fn is_state_dependent(&self) -> bool {
        matches!(self.exploration, Exploration::StateDependent { .. })
    }

    pub fn noise_sampler(&self) -> Option<&NoiseSampler> {
        match &self.exploration {
            Exploration::StateDependent { sampler, .. } => Some(sampler),
            Exploration::DiagGaussian => None,
        }
    }

    fn check_observation(&self, x: &Tensor) -> Result<()> {
        match x.dims() {
            [_, dim] if *dim == self.observation_dim => Ok(()),
            dims => Err(SdeError::shape_mismatch(
                "observation batch",
                &[dims.first().copied().unwrap_or(1), self.observation_dim],
                dims,
            )),
        }
    }

    pub fn get_value(&self, x: &Tensor) -> Result<Values> {
        self.check_observation(x)?;
        Ok(Values(self.critic.forward(x)?.squeeze(1)?))
    }

    /// Latent features feeding the state dependent noise: the raw observation, or its learned
    /// projection when one is configured.
    pub fn latent_features(&self, x: &Tensor) -> Result<Tensor> {
        match &self.features {
            Some(features) => Ok(features.forward(x)?),
            None => Ok(x.clone()),
        }
    }

    /// Redraws the gSDE exploration weights. A no-op for the plain Gaussian, which draws fresh
    /// noise on every sample anyway.
    pub fn reset_noise(&mut self, batch_size: usize) -> Result<()> {
        match &mut self.exploration {
            Exploration::StateDependent { sampler, .. } => {
                sampler.sample_weights(&self.log_std, batch_size)
            }
            Exploration::DiagGaussian => Ok(()),
        }
    }

    /// Builds the action distribution for `x`. Exploration weights are drawn on first use and kept
    /// until the next `reset_noise`.
    pub fn distribution(&mut self, x: &Tensor) -> Result<ActionDistribution> {
        self.check_observation(x)?;
        let mean_actions = self.actor_mean.forward(x)?;
        match &mut self.exploration {
            Exploration::StateDependent { config, sampler } => {
                if !sampler.has_weights() {
                    sampler.sample_weights(&self.log_std, x.dim(0)?)?;
                }
                let latent = match &self.features {
                    Some(features) => features.forward(x)?,
                    None => x.clone(),
                };
                let distribution = StateDependentNoiseDistribution::new(
                    config,
                    sampler.clone(),
                    self.log_std.clone(),
                    mean_actions,
                    latent,
                )?;
                Ok(distribution.into())
            }
            Exploration::DiagGaussian => {
                let distribution = DiagGaussianDistribution::new(
                    mean_actions,
                    self.log_std.clone(),
                    self.rng.clone(),
                )?;
                Ok(distribution.into())
            }
        }
    }

    /// Samples an action when none is given, then scores it against the distribution built for
    /// this very call. A given action is scored without drawing new noise.
    pub fn get_action_and_value(
        &mut self,
        x: &Tensor,
        action: Option<&Tensor>,
    ) -> Result<ActionAndValue> {
        let mut distribution = self.distribution(x)?;
        let action = match action {
            Some(action) => {
                distribution.build()?;
                action.clone()
            }
            None => distribution.sample()?.detach(),
        };
        let log_prob = Logp(distribution.log_prob(&action)?);
        let entropy = distribution.entropy()?.map(Entropy);
        let value = self.get_value(x)?;
        Ok(ActionAndValue {
            action,
            log_prob,
            entropy,
            value,
        })
    }

    pub fn predict(&mut self, x: &Tensor, deterministic: bool) -> Result<Tensor> {
        let mut distribution = self.distribution(x)?;
        if deterministic {
            distribution.build()?;
            Ok(distribution.mode()?.detach())
        } else {
            Ok(distribution.sample()?.detach())
        }
    }

    /// Mean of the transformed std, handy for logging exploration over training.
    pub fn mean_std(&self) -> Result<f32> {
        let std = match &self.exploration {
            Exploration::StateDependent { sampler, .. } => {
                sampler.std_transform().std(&self.log_std)?
            }
            Exploration::DiagGaussian => self.log_std.exp()?,
        };
        Ok(std.mean_all()?.to_dtype(candle_core::DType::F32)?.to_scalar::<f32>()?)
    }
}
