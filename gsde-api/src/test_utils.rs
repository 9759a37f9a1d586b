use candle_core::{Device, Tensor};
use gsde_core::{
    Result,
    env::{Env, EnvironmentDescription, SnapShot, Space, StepInfo},
};

/// Deterministic environment: the observation after step `t` is filled with `t + 1`, the reward is
/// `-‖action‖²` and the episode truncates after `horizon` steps.
pub struct DummyEnv {
    pub observation_dim: usize,
    pub action_dim: usize,
    pub horizon: usize,
    pub t: usize,
    pub last_seed: Option<u64>,
}

impl DummyEnv {
    pub fn new(observation_dim: usize, action_dim: usize, horizon: usize) -> Self {
        Self {
            observation_dim,
            action_dim,
            horizon,
            t: 0,
            last_seed: None,
        }
    }

    fn observation(&self) -> Result<Tensor> {
        Ok(Tensor::full(
            self.t as f32,
            self.observation_dim,
            &Device::Cpu,
        )?)
    }
}

impl Env for DummyEnv {
    fn reset(&mut self, seed: Option<u64>) -> Result<Tensor> {
        self.t = 0;
        self.last_seed = seed;
        self.observation()
    }

    fn step(&mut self, action: &Tensor) -> Result<SnapShot> {
        self.t += 1;
        let reward = -action.sqr()?.sum_all()?.to_scalar::<f32>()?;
        Ok(SnapShot {
            state: self.observation()?,
            reward,
            terminated: false,
            truncated: self.t >= self.horizon,
            info: StepInfo::default(),
        })
    }

    fn env_description(&self) -> EnvironmentDescription {
        let bounds = |value: f32, size: usize| Tensor::full(value, size, &Device::Cpu).ok();
        EnvironmentDescription::new(
            Space::Continous {
                min: bounds(-10., self.observation_dim),
                max: bounds(10., self.observation_dim),
                size: self.observation_dim,
            },
            Space::Continous {
                min: bounds(-1., self.action_dim),
                max: bounds(1., self.action_dim),
                size: self.action_dim,
            },
        )
    }
}
