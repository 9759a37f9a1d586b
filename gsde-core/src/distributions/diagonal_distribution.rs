use super::{
    Distribution, DistributionState, ensure_finite, gaussian_entropy, gaussian_log_prob,
    sum_independent_dims,
};
use crate::{
    error::{Result, SdeError},
    rng::RngHandle,
};
use candle_core::Tensor;

/// Diagonal Gaussian with a state independent std, drawing fresh noise on every sample.
#[derive(Debug, Clone)]
pub struct DiagGaussianDistribution {
    mean_actions: Tensor,
    log_std: Tensor,
    rng: RngHandle,
    state: DistributionState,
}

impl DiagGaussianDistribution {
    pub fn new(mean_actions: Tensor, log_std: Tensor, rng: RngHandle) -> Result<Self> {
        let (_, action_dim) = mean_actions.dims2()?;
        if log_std.elem_count() != action_dim {
            return Err(SdeError::shape_mismatch(
                "log_std",
                &[action_dim],
                log_std.dims(),
            ));
        }
        Ok(Self {
            mean_actions,
            log_std,
            rng,
            state: DistributionState::Uninitialized,
        })
    }

    pub fn state(&self) -> &DistributionState {
        &self.state
    }
}

impl Distribution for DiagGaussianDistribution {
    fn build(&mut self) -> Result<()> {
        let std = self
            .log_std
            .flatten_all()?
            .exp()?
            .unsqueeze(0)?
            .broadcast_as(self.mean_actions.shape())?;
        ensure_finite(&std, "std")?;
        self.state = DistributionState::Ready {
            mean: self.mean_actions.clone(),
            std,
            noise: None,
        };
        Ok(())
    }

    fn sample(&mut self) -> Result<Tensor> {
        self.build()?;
        let (mean, std) = self.state.gaussian("sample")?;
        let noise = self
            .rng
            .standard_normal(mean.dims(), mean.dtype(), mean.device())?;
        let actions = (mean + (std * &noise)?)?;
        if let DistributionState::Ready { noise: slot, .. } = &mut self.state {
            *slot = Some(noise);
        }
        Ok(actions)
    }

    fn log_prob(&self, actions: &Tensor) -> Result<Tensor> {
        let (mean, std) = self.state.gaussian("log_prob")?;
        sum_independent_dims(&gaussian_log_prob(actions, mean, std)?)
    }

    fn entropy(&self) -> Result<Option<Tensor>> {
        let (_, std) = self.state.gaussian("entropy")?;
        Ok(Some(sum_independent_dims(&gaussian_entropy(std)?)?))
    }

    fn mode(&self) -> Result<Tensor> {
        let (mean, _) = self.state.gaussian("mode")?;
        Ok(mean.clone())
    }
}
