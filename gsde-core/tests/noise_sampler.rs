use candle_core::{DType, Device, Tensor, Var};
use gsde_core::{
    Result, SdeError, config::GsdeConfig, distributions::noise_sampler::NoiseSampler,
    rng::RngHandle,
};

const LATENT_DIM: usize = 3;
const ACTION_DIM: usize = 2;

fn sampler(config: &GsdeConfig) -> NoiseSampler {
    NoiseSampler::new(config, LATENT_DIM, ACTION_DIM, RngHandle::seeded(42))
}

fn latent(batch: usize) -> Result<Tensor> {
    let data: Vec<f32> = (0..batch * LATENT_DIM).map(|i| i as f32 * 0.1 - 0.4).collect();
    Ok(Tensor::from_vec(data, (batch, LATENT_DIM), &Device::Cpu)?)
}

fn log_std() -> Result<Tensor> {
    Ok(Tensor::zeros((LATENT_DIM, ACTION_DIM), DType::F32, &Device::Cpu)?)
}

#[test]
fn noise_needs_weights() -> Result<()> {
    let sampler = sampler(&GsdeConfig::default());
    assert!(matches!(
        sampler.get_noise(&latent(2)?),
        Err(SdeError::Precondition {
            operation: "get_noise"
        })
    ));
    Ok(())
}

#[test]
fn sample_weights_shapes() -> Result<()> {
    let mut sampler = sampler(&GsdeConfig::default());
    sampler.sample_weights(&log_std()?, 5)?;
    assert_eq!(
        sampler.exploration_matrix().map(|m| m.dims().to_vec()),
        Some(vec![LATENT_DIM, ACTION_DIM])
    );
    assert_eq!(
        sampler.exploration_matrices().map(|m| m.dims().to_vec()),
        Some(vec![5, LATENT_DIM, ACTION_DIM])
    );
    Ok(())
}

#[test]
fn mismatched_batches_fall_back_to_the_shared_matrix() -> Result<()> {
    let mut sampler = sampler(&GsdeConfig::default());
    sampler.sample_weights(&log_std()?, 4)?;
    let matrix = sampler.exploration_matrix().cloned().expect("weights were sampled");
    for batch in [1, 2, 7] {
        let latent = latent(batch)?;
        let noise = sampler.get_noise(&latent)?;
        assert_eq!(noise.dims(), &[batch, ACTION_DIM]);
        let expected = latent.matmul(&matrix)?;
        let diff = (noise - expected)?.abs()?.sum_all()?.to_scalar::<f32>()?;
        assert!(diff < 1e-6);
    }
    Ok(())
}

#[test]
fn matching_batch_uses_one_matrix_per_row() -> Result<()> {
    let mut sampler = sampler(&GsdeConfig::default());
    sampler.sample_weights(&log_std()?, 3)?;
    let matrices = sampler
        .exploration_matrices()
        .cloned()
        .expect("weights were sampled");
    let latent = latent(3)?;
    let noise = sampler.get_noise(&latent)?;
    assert_eq!(noise.dims(), &[3, ACTION_DIM]);
    for row in 0..3 {
        let expected = latent.narrow(0, row, 1)?.matmul(&matrices.get(row)?)?;
        let diff = (noise.narrow(0, row, 1)? - expected)?
            .abs()?
            .sum_all()?
            .to_scalar::<f32>()?;
        assert!(diff < 1e-6);
    }
    Ok(())
}

#[test]
fn weights_are_reused_until_resampled() -> Result<()> {
    let mut sampler = sampler(&GsdeConfig::default());
    sampler.sample_weights(&log_std()?, 1)?;
    let latent = latent(1)?;
    let first = sampler.get_noise(&latent)?.to_vec2::<f32>()?;
    let second = sampler.get_noise(&latent)?.to_vec2::<f32>()?;
    assert_eq!(first, second);
    sampler.sample_weights(&log_std()?, 1)?;
    let third = sampler.get_noise(&latent)?.to_vec2::<f32>()?;
    assert_ne!(first, third);
    Ok(())
}

#[test]
fn latent_dim_mismatch_is_rejected() -> Result<()> {
    let mut sampler = sampler(&GsdeConfig::default());
    sampler.sample_weights(&log_std()?, 2)?;
    let latent = Tensor::zeros((2, LATENT_DIM + 1), DType::F32, &Device::Cpu)?;
    assert!(matches!(
        sampler.get_noise(&latent),
        Err(SdeError::ShapeMismatch {
            what: "latent features",
            ..
        })
    ));
    Ok(())
}

#[test]
fn frozen_features_receive_no_gradient() -> Result<()> {
    for learn_features in [true, false] {
        let config = GsdeConfig {
            learn_features,
            ..GsdeConfig::default()
        };
        let mut sampler = sampler(&config);
        sampler.sample_weights(&log_std()?, 2)?;
        let latent = Var::from_tensor(&latent(2)?)?;
        let noise = sampler.get_noise(latent.as_tensor())?;
        let grads = noise.sum_all()?.backward()?;
        assert_eq!(grads.get(latent.as_tensor()).is_some(), learn_features);
    }
    Ok(())
}

#[test]
fn weights_carry_the_std_gradient() -> Result<()> {
    let mut sampler = sampler(&GsdeConfig::default());
    let log_std = Var::zeros((LATENT_DIM, ACTION_DIM), DType::F32, &Device::Cpu)?;
    sampler.sample_weights(log_std.as_tensor(), 1)?;
    let noise = sampler.get_noise(&latent(1)?)?;
    let grads = noise.sqr()?.sum_all()?.backward()?;
    assert!(grads.get(log_std.as_tensor()).is_some());
    Ok(())
}
