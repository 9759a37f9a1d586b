use crate::{
    config::GsdeConfig,
    error::{Result, SdeError},
};
use candle_core::Tensor;

/// Maps the learned log-scale parameter to a strictly positive std of shape
/// `(latent_dim, action_dim)`.
///
/// With `use_expln` the positive half grows like `log1p(x) + 1` instead of `exp(x)`. Both halves
/// are blended with multiplicative masks, so the gradient exists on either side of zero.
#[derive(Debug, Clone, Copy)]
pub struct StdTransform {
    use_expln: bool,
    full_std: bool,
    epsilon: f64,
    latent_dim: usize,
    action_dim: usize,
}

impl StdTransform {
    pub fn new(config: &GsdeConfig, latent_dim: usize, action_dim: usize) -> Self {
        Self {
            use_expln: config.use_expln,
            full_std: config.full_std,
            epsilon: config.epsilon,
            latent_dim,
            action_dim,
        }
    }

    pub fn latent_dim(&self) -> usize {
        self.latent_dim
    }

    pub fn action_dim(&self) -> usize {
        self.action_dim
    }

    /// Shape the log-std parameter must have for this configuration.
    pub fn log_std_shape(&self) -> Vec<usize> {
        if self.full_std {
            vec![self.latent_dim, self.action_dim]
        } else {
            vec![self.action_dim]
        }
    }

    pub fn check_log_std(&self, log_std: &Tensor) -> Result<()> {
        let expected = self.log_std_shape();
        if log_std.dims() != expected.as_slice() {
            return Err(SdeError::shape_mismatch("log_std", &expected, log_std.dims()));
        }
        Ok(())
    }

    pub fn std(&self, log_std: &Tensor) -> Result<Tensor> {
        self.check_log_std(log_std)?;
        let std = if self.use_expln {
            self.expln(log_std)?
        } else {
            log_std.exp()?
        };
        if self.full_std {
            return Ok(std);
        }
        let ones = Tensor::ones(
            (self.latent_dim, self.action_dim),
            log_std.dtype(),
            log_std.device(),
        )?;
        Ok(ones.broadcast_mul(&std)?)
    }

    fn expln(&self, log_std: &Tensor) -> Result<Tensor> {
        let zeros = log_std.zeros_like()?;
        let below_mask = log_std.le(&zeros)?.to_dtype(log_std.dtype())?;
        let above_mask = log_std.gt(&zeros)?.to_dtype(log_std.dtype())?;
        // mask before exp, large entries must never reach `inf * 0`
        let below = (log_std * &below_mask)?.exp()?.mul(&below_mask)?;
        let safe_log_std = ((log_std * &above_mask)? + self.epsilon)?;
        let above = (safe_log_std.affine(1., 1.)?.log()? + 1.)?.mul(&above_mask)?;
        Ok((below + above)?)
    }
}
