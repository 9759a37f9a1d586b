pub mod bijector;
pub mod diagonal_distribution;
pub mod noise_sampler;
pub mod state_dependent_distribution;
pub mod std_transform;

use crate::error::{Result, SdeError};
use candle_core::{DType, Tensor};
use diagonal_distribution::DiagGaussianDistribution;
use enum_dispatch::enum_dispatch;
use state_dependent_distribution::StateDependentNoiseDistribution;
use std::f64::consts::PI;

/// Action distribution for one forward pass. Probability queries are answered against the state
/// produced by the latest `build` or `sample`.
#[enum_dispatch]
pub trait Distribution {
    /// Builds the Gaussian for the current inputs without drawing anything.
    fn build(&mut self) -> Result<()>;
    /// Builds the Gaussian and draws a `(batch, action_dim)` action from it.
    fn sample(&mut self) -> Result<Tensor>;
    /// Log-density summed over action dimensions, `(batch,)`.
    fn log_prob(&self, actions: &Tensor) -> Result<Tensor>;
    /// Entropy summed over action dimensions, `None` when no closed form exists.
    fn entropy(&self) -> Result<Option<Tensor>>;
    fn mode(&self) -> Result<Tensor>;
}

#[enum_dispatch(Distribution)]
#[derive(Debug, Clone)]
pub enum ActionDistribution {
    StateDependent(StateDependentNoiseDistribution),
    DiagGaussian(DiagGaussianDistribution),
}

/// Lifecycle of a distribution within one step.
#[derive(Debug, Clone, Default)]
pub enum DistributionState {
    #[default]
    Uninitialized,
    Ready {
        mean: Tensor,
        std: Tensor,
        noise: Option<Tensor>,
    },
}

impl DistributionState {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }

    pub(crate) fn gaussian(&self, operation: &'static str) -> Result<(&Tensor, &Tensor)> {
        match self {
            Self::Ready { mean, std, .. } => Ok((mean, std)),
            Self::Uninitialized => Err(SdeError::Precondition { operation }),
        }
    }
}

/// Elementwise Gaussian log-density.
pub(crate) fn gaussian_log_prob(x: &Tensor, mean: &Tensor, std: &Tensor) -> Result<Tensor> {
    let log_sqrt_2pi = (2. * PI).sqrt().ln();
    let var = std.sqr()?;
    let sq_dist = (x - mean)?.sqr()?;
    let log_prob = ((sq_dist / (var * 2.)?)?.neg()? - std.log()?)?;
    Ok((log_prob - log_sqrt_2pi)?)
}

/// Elementwise Gaussian entropy, `0.5 + 0.5 * ln(2π) + ln(σ)`.
pub(crate) fn gaussian_entropy(std: &Tensor) -> Result<Tensor> {
    let half_log_2pi_e = 0.5 * ((2. * PI).ln() + 1.);
    Ok((std.log()? + half_log_2pi_e)?)
}

/// Sums over the action dimension assuming the dimensions are independent.
pub(crate) fn sum_independent_dims(t: &Tensor) -> Result<Tensor> {
    if t.rank() > 1 {
        Ok(t.sum(1)?)
    } else {
        Ok(t.sum_all()?)
    }
}

/// Fails with `NumericGuard` when `t` holds a NaN or an infinity.
pub(crate) fn ensure_finite(t: &Tensor, what: &'static str) -> Result<()> {
    let total = t
        .abs()?
        .sum_all()?
        .to_dtype(DType::F64)?
        .to_scalar::<f64>()?;
    if total.is_finite() {
        Ok(())
    } else {
        tracing::warn!(what, "numeric guard tripped");
        Err(SdeError::NumericGuard { what })
    }
}

/// Machine epsilon of the tensor's floating point type.
pub(crate) fn dtype_epsilon(dtype: DType) -> f64 {
    match dtype {
        DType::F64 => f64::EPSILON,
        DType::F16 => 9.765625e-4,
        DType::BF16 => 7.8125e-3,
        _ => f32::EPSILON as f64,
    }
}
