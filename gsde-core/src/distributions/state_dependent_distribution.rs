use super::{
    Distribution, DistributionState, bijector::TanhBijector, ensure_finite, gaussian_entropy,
    gaussian_log_prob, noise_sampler::NoiseSampler, sum_independent_dims,
};
use crate::{
    config::GsdeConfig,
    error::{Result, SdeError},
};
use candle_core::Tensor;

/// Generalized state dependent exploration.
///
/// Exploration noise is `latent · W` where `W` is a weight matrix held by the [`NoiseSampler`].
/// The matching Gaussian has mean `mean_actions` and variance `latent² · std²` (plus epsilon), so
/// the spread grows with the magnitude of the features and with the learned std.
///
/// Paper: <https://arxiv.org/abs/2005.05719>
#[derive(Debug, Clone)]
pub struct StateDependentNoiseDistribution {
    sampler: NoiseSampler,
    bijector: Option<TanhBijector>,
    epsilon: f64,
    log_std: Tensor,
    mean_actions: Tensor,
    latent: Tensor,
    state: DistributionState,
}

impl StateDependentNoiseDistribution {
    pub fn new(
        config: &GsdeConfig,
        sampler: NoiseSampler,
        log_std: Tensor,
        mean_actions: Tensor,
        latent: Tensor,
    ) -> Result<Self> {
        let transform = sampler.std_transform();
        transform.check_log_std(&log_std)?;
        let (batch, action_dim) = mean_actions.dims2()?;
        if action_dim != transform.action_dim() {
            return Err(SdeError::shape_mismatch(
                "mean actions",
                &[batch, transform.action_dim()],
                mean_actions.dims(),
            ));
        }
        if latent.rank() != 2
            || latent.dim(0)? != batch
            || latent.dim(1)? != transform.latent_dim()
        {
            return Err(SdeError::shape_mismatch(
                "latent features",
                &[batch, transform.latent_dim()],
                latent.dims(),
            ));
        }
        Ok(Self {
            sampler,
            bijector: config
                .squash_output
                .then(|| TanhBijector::new(config.epsilon)),
            epsilon: config.epsilon,
            log_std,
            mean_actions,
            latent,
            state: DistributionState::Uninitialized,
        })
    }

    pub fn state(&self) -> &DistributionState {
        &self.state
    }

    pub fn bijector(&self) -> Option<&TanhBijector> {
        self.bijector.as_ref()
    }

    pub fn sampler(&self) -> &NoiseSampler {
        &self.sampler
    }

    /// Noise added by the last `sample`.
    pub fn noise(&self) -> Option<&Tensor> {
        match &self.state {
            DistributionState::Ready { noise, .. } => noise.as_ref(),
            DistributionState::Uninitialized => None,
        }
    }

    /// `variance[b, k] = Σ_j latent[b, j]² · std[j, k]²`
    pub fn variance(&self) -> Result<Tensor> {
        let latent = self.sampler.prepare_latent(&self.latent)?;
        let std = self.sampler.std_transform().std(&self.log_std)?;
        Ok(latent.sqr()?.matmul(&std.sqr()?)?)
    }

    fn proba_distribution(&mut self, noise: Option<Tensor>) -> Result<()> {
        let variance = self.variance()?;
        ensure_finite(&variance, "variance")?;
        let std = (variance + self.epsilon)?.sqrt()?;
        ensure_finite(&std, "std")?;
        self.state = DistributionState::Ready {
            mean: self.mean_actions.clone(),
            std,
            noise,
        };
        Ok(())
    }

    /// Deterministic actions when `deterministic`, sampled ones otherwise.
    pub fn actions_from_params(&mut self, deterministic: bool) -> Result<Tensor> {
        if deterministic {
            self.build()?;
            self.mode()
        } else {
            self.sample()
        }
    }

    /// Samples actions and scores them against the state they were drawn from.
    pub fn log_prob_from_params(&mut self) -> Result<(Tensor, Tensor)> {
        let actions = self.actions_from_params(false)?;
        let log_prob = self.log_prob(&actions)?;
        Ok((actions, log_prob))
    }
}

impl Distribution for StateDependentNoiseDistribution {
    fn build(&mut self) -> Result<()> {
        self.proba_distribution(None)
    }

    fn sample(&mut self) -> Result<Tensor> {
        let noise = self.sampler.get_noise(&self.latent)?;
        self.proba_distribution(Some(noise.clone()))?;
        let actions = (&self.mean_actions + noise)?;
        match &self.bijector {
            Some(bijector) => bijector.forward(&actions),
            None => Ok(actions),
        }
    }

    fn log_prob(&self, actions: &Tensor) -> Result<Tensor> {
        let (mean, std) = self.state.gaussian("log_prob")?;
        let gaussian_actions = match &self.bijector {
            Some(bijector) => bijector.inverse(actions)?,
            None => actions.clone(),
        };
        let log_prob = sum_independent_dims(&gaussian_log_prob(&gaussian_actions, mean, std)?)?;
        match &self.bijector {
            Some(bijector) => {
                let correction =
                    sum_independent_dims(&bijector.log_prob_correction(&gaussian_actions)?)?;
                Ok((log_prob - correction)?)
            }
            None => Ok(log_prob),
        }
    }

    fn entropy(&self) -> Result<Option<Tensor>> {
        if let Some(bijector) = &self.bijector {
            return Ok(bijector.entropy());
        }
        let (_, std) = self.state.gaussian("entropy")?;
        Ok(Some(sum_independent_dims(&gaussian_entropy(std)?)?))
    }

    fn mode(&self) -> Result<Tensor> {
        let (mean, _) = self.state.gaussian("mode")?;
        match &self.bijector {
            Some(bijector) => bijector.forward(mean),
            None => Ok(mean.clone()),
        }
    }
}
