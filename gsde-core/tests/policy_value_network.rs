use candle_core::{DType, Device, Tensor};
use candle_nn::{VarBuilder, VarMap};
use gsde_core::{
    Result, SdeError,
    config::{ExplorationKind, GsdeConfig, PolicyOptions},
    env::{EnvironmentDescription, Space},
    policies::policy_value_network::PolicyValueNetwork,
    rng::RngHandle,
};

const OBS_DIM: usize = 5;
const ACTION_DIM: usize = 2;

fn continous_env() -> EnvironmentDescription {
    EnvironmentDescription::new(
        Space::continous_from_dims(vec![OBS_DIM]),
        Space::continous_from_dims(vec![ACTION_DIM]),
    )
}

fn build_network(options: &PolicyOptions) -> Result<(VarMap, PolicyValueNetwork)> {
    let varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
    let network = PolicyValueNetwork::build(&continous_env(), options, &vb, RngHandle::seeded(11))?;
    Ok((varmap, network))
}

fn observations(batch: usize) -> Result<Tensor> {
    let data: Vec<f32> = (0..batch * OBS_DIM)
        .map(|i| ((i * 7) % 11) as f32 / 11. - 0.5)
        .collect();
    Ok(Tensor::from_vec(data, (batch, OBS_DIM), &Device::Cpu)?)
}

#[test]
fn discrete_action_space_is_rejected() -> Result<()> {
    let varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
    let env = EnvironmentDescription::new(
        Space::continous_from_dims(vec![OBS_DIM]),
        Space::Discrete(3),
    );
    let network = PolicyValueNetwork::build(
        &env,
        &PolicyOptions::default(),
        &vb,
        RngHandle::seeded(0),
    );
    assert!(matches!(network, Err(SdeError::Configuration(_))));
    Ok(())
}

#[test]
fn action_and_value_shapes() -> Result<()> {
    let (_, mut network) = build_network(&PolicyOptions::default())?;
    let out = network.get_action_and_value(&observations(6)?, None)?;
    assert_eq!(out.action.dims(), &[6, ACTION_DIM]);
    assert_eq!(out.log_prob.dims(), &[6]);
    assert_eq!(out.value.dims(), &[6]);
    let entropy = out.entropy.expect("unsquashed gSDE entropy");
    assert_eq!(entropy.dims(), &[6]);
    assert!(out.log_prob.to_vec1::<f32>()?.iter().all(|lp| lp.is_finite()));
    assert_eq!(network.get_value(&observations(6)?)?.dims(), &[6]);
    Ok(())
}

#[test]
fn given_action_is_scored_against_the_same_state() -> Result<()> {
    let (_, mut network) = build_network(&PolicyOptions::default())?;
    let obs = observations(4)?;
    let sampled = network.get_action_and_value(&obs, None)?;
    let rescored = network.get_action_and_value(&obs, Some(&sampled.action))?;
    assert_eq!(rescored.action.to_vec2::<f32>()?, sampled.action.to_vec2::<f32>()?);
    let diff = (&*rescored.log_prob - &*sampled.log_prob)?
        .abs()?
        .sum_all()?
        .to_scalar::<f32>()?;
    assert!(diff < 1e-5);
    Ok(())
}

#[test]
fn exploration_noise_is_reused_until_reset() -> Result<()> {
    let (_, mut network) = build_network(&PolicyOptions::default())?;
    let obs = observations(1)?;
    let first = network.predict(&obs, false)?.to_vec2::<f32>()?;
    let second = network.predict(&obs, false)?.to_vec2::<f32>()?;
    assert_eq!(first, second);
    network.reset_noise(1)?;
    let third = network.predict(&obs, false)?.to_vec2::<f32>()?;
    assert_ne!(first, third);
    Ok(())
}

#[test]
fn deterministic_prediction_is_the_mean() -> Result<()> {
    let (_, mut network) = build_network(&PolicyOptions::default())?;
    let obs = observations(3)?;
    let a = network.predict(&obs, true)?.to_vec2::<f32>()?;
    network.reset_noise(3)?;
    let b = network.predict(&obs, true)?.to_vec2::<f32>()?;
    assert_eq!(a, b);
    Ok(())
}

#[test]
fn squashed_policy_reports_no_entropy() -> Result<()> {
    let options = PolicyOptions {
        exploration: ExplorationKind::StateDependent(GsdeConfig {
            squash_output: true,
            ..GsdeConfig::default()
        }),
        ..PolicyOptions::default()
    };
    let (_, mut network) = build_network(&options)?;
    let out = network.get_action_and_value(&observations(3)?, None)?;
    assert!(out.entropy.is_none());
    let actions = out.action.to_vec2::<f32>()?;
    assert!(actions.iter().flatten().all(|a| a.abs() <= 1.));
    Ok(())
}

#[test]
fn learned_features_set_the_log_std_shape() -> Result<()> {
    let options = PolicyOptions {
        features_dim: Some(8),
        ..PolicyOptions::default()
    };
    let (_, mut network) = build_network(&options)?;
    assert_eq!(network.log_std().dims(), &[8, ACTION_DIM]);
    assert_eq!(network.latent_features(&observations(2)?)?.dims(), &[2, 8]);
    let out = network.get_action_and_value(&observations(2)?, None)?;
    assert_eq!(out.action.dims(), &[2, ACTION_DIM]);

    let reduced = PolicyOptions {
        exploration: ExplorationKind::StateDependent(GsdeConfig {
            full_std: false,
            ..GsdeConfig::default()
        }),
        ..PolicyOptions::default()
    };
    let (_, network) = build_network(&reduced)?;
    assert_eq!(network.log_std().dims(), &[ACTION_DIM]);
    Ok(())
}

#[test]
fn log_prob_gradient_reaches_log_std() -> Result<()> {
    let (_, mut network) = build_network(&PolicyOptions::default())?;
    let out = network.get_action_and_value(&observations(4)?, None)?;
    let grads = out.log_prob.mean_all()?.backward()?;
    let grad = grads
        .get(network.log_std())
        .expect("log_std is a trainable variable");
    let total = grad.abs()?.sum_all()?.to_scalar::<f32>()?;
    assert!(total.is_finite() && total > 0.);
    Ok(())
}

#[test]
fn diag_gaussian_policy() -> Result<()> {
    let options = PolicyOptions {
        exploration: ExplorationKind::DiagGaussian { log_std_init: 0. },
        ..PolicyOptions::default()
    };
    let (_, mut network) = build_network(&options)?;
    assert!(!network.is_state_dependent());
    assert!(network.noise_sampler().is_none());
    let out = network.get_action_and_value(&observations(3)?, None)?;
    assert_eq!(out.action.dims(), &[3, ACTION_DIM]);
    let entropy = out.entropy.expect("diagonal Gaussian entropy").to_vec1::<f32>()?;
    let expected = ACTION_DIM as f32 * 0.5 * (2. * std::f32::consts::PI * std::f32::consts::E).ln();
    for e in entropy {
        assert!((e - expected).abs() < 1e-5);
    }
    assert!((network.mean_std()? - 1.).abs() < 1e-6);
    Ok(())
}

#[test]
fn observation_width_is_checked() -> Result<()> {
    let (_, mut network) = build_network(&PolicyOptions::default())?;
    let obs = Tensor::zeros((2, OBS_DIM + 1), DType::F32, &Device::Cpu)?;
    assert!(matches!(
        network.get_action_and_value(&obs, None),
        Err(SdeError::ShapeMismatch { .. })
    ));
    Ok(())
}
