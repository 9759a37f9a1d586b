use super::std_transform::StdTransform;
use crate::{
    config::GsdeConfig,
    error::{Result, SdeError},
    rng::RngHandle,
};
use candle_core::Tensor;

/// Exploration weights drawn by one `sample_weights` call.
#[derive(Debug, Clone)]
pub struct ExplorationWeights {
    /// `(latent_dim, action_dim)`, shared by every row of a batch.
    pub matrix: Tensor,
    /// `(batch, latent_dim, action_dim)`, one independent draw per batch row.
    pub matrices: Tensor,
}

impl ExplorationWeights {
    pub fn batch_size(&self) -> usize {
        self.matrices.dims()[0]
    }
}

/// Draws exploration weight matrices and turns latent features into state dependent noise.
///
/// Weights are kept until the next `sample_weights` call, so a whole trajectory can be explored
/// with the same matrix.
#[derive(Debug, Clone)]
pub struct NoiseSampler {
    std_transform: StdTransform,
    learn_features: bool,
    rng: RngHandle,
    weights: Option<ExplorationWeights>,
}

impl NoiseSampler {
    pub fn new(config: &GsdeConfig, latent_dim: usize, action_dim: usize, rng: RngHandle) -> Self {
        Self {
            std_transform: StdTransform::new(config, latent_dim, action_dim),
            learn_features: config.learn_features,
            rng,
            weights: None,
        }
    }

    pub fn std_transform(&self) -> &StdTransform {
        &self.std_transform
    }

    pub fn has_weights(&self) -> bool {
        self.weights.is_some()
    }

    pub fn weights(&self) -> Option<&ExplorationWeights> {
        self.weights.as_ref()
    }

    pub fn exploration_matrix(&self) -> Option<&Tensor> {
        self.weights.as_ref().map(|w| &w.matrix)
    }

    pub fn exploration_matrices(&self) -> Option<&Tensor> {
        self.weights.as_ref().map(|w| &w.matrices)
    }

    /// Draws one shared matrix and `batch_size` independent ones from `N(0, std)`. The draws are
    /// reparameterized as `std * ε` so gradients reach `log_std`.
    pub fn sample_weights(&mut self, log_std: &Tensor, batch_size: usize) -> Result<()> {
        if batch_size == 0 {
            return Err(SdeError::Configuration(
                "exploration weights need a batch size of at least one".into(),
            ));
        }
        let std = self.std_transform.std(log_std)?;
        let (latent_dim, action_dim) = std.dims2()?;
        let eps = self
            .rng
            .standard_normal((latent_dim, action_dim), std.dtype(), std.device())?;
        let matrix = (&std * eps)?;
        let eps = self.rng.standard_normal(
            (batch_size, latent_dim, action_dim),
            std.dtype(),
            std.device(),
        )?;
        let matrices = std.unsqueeze(0)?.broadcast_mul(&eps)?;
        tracing::debug!(batch_size, latent_dim, action_dim, "resampled exploration weights");
        self.weights = Some(ExplorationWeights { matrix, matrices });
        Ok(())
    }

    /// Stops the gradient at the latent features unless they are learned.
    pub fn prepare_latent(&self, latent: &Tensor) -> Result<Tensor> {
        let (_, latent_dim) = latent.dims2()?;
        if latent_dim != self.std_transform.latent_dim() {
            return Err(SdeError::shape_mismatch(
                "latent features",
                &[latent.dim(0)?, self.std_transform.latent_dim()],
                latent.dims(),
            ));
        }
        if self.learn_features {
            Ok(latent.clone())
        } else {
            Ok(latent.detach())
        }
    }

    /// `(batch, action_dim)` noise for `(batch, latent_dim)` features.
    ///
    /// A single row, or a batch that does not line up with the per-row matrices, uses the shared
    /// matrix for every row.
    pub fn get_noise(&self, latent: &Tensor) -> Result<Tensor> {
        let weights = self.weights.as_ref().ok_or(SdeError::Precondition {
            operation: "get_noise",
        })?;
        let latent = self.prepare_latent(latent)?;
        let batch = latent.dim(0)?;
        if batch == 1 || batch != weights.batch_size() {
            return Ok(latent.matmul(&weights.matrix)?);
        }
        let noise = latent.unsqueeze(1)?.matmul(&weights.matrices)?;
        Ok(noise.squeeze(1)?)
    }
}
