use super::dtype_epsilon;
use crate::error::Result;
use candle_core::Tensor;

/// Invertible `tanh` squashing of unbounded samples into `(-1, 1)`.
#[derive(Debug, Clone, Copy)]
pub struct TanhBijector {
    epsilon: f64,
}

impl TanhBijector {
    pub fn new(epsilon: f64) -> Self {
        Self { epsilon }
    }

    pub fn forward(&self, x: &Tensor) -> Result<Tensor> {
        Ok(x.tanh()?)
    }

    /// `atanh` of `y` clipped just inside the open interval, computed as
    /// `0.5 * (log1p(y) - log1p(-y))`.
    pub fn inverse(&self, y: &Tensor) -> Result<Tensor> {
        let eps = dtype_epsilon(y.dtype());
        let y = y.clamp(-1. + eps, 1. - eps)?;
        let log1p_y = y.affine(1., 1.)?.log()?;
        let log1p_neg_y = y.affine(-1., 1.)?.log()?;
        Ok(((log1p_y - log1p_neg_y)? * 0.5)?)
    }

    /// Log of the Jacobian of `tanh` at `x`, elementwise.
    pub fn log_prob_correction(&self, x: &Tensor) -> Result<Tensor> {
        let one_minus_sq = x.tanh()?.sqr()?.affine(-1., 1.)?;
        Ok((one_minus_sq + self.epsilon)?.log()?)
    }

    /// The squashed Gaussian has no analytical entropy. Estimate it with `-log_prob.mean()`.
    pub fn entropy(&self) -> Option<Tensor> {
        None
    }
}
