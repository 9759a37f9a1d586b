use crate::error::{Result, SdeError};
use candle_core::Tensor;

#[derive(Debug, Clone)]
pub enum Space {
    Discrete(usize),
    Continous {
        min: Option<Tensor>,
        max: Option<Tensor>,
        size: usize,
    },
}

impl Space {
    pub fn continous_from_dims(dims: Vec<usize>) -> Self {
        Self::Continous {
            min: None,
            max: None,
            size: dims.iter().product(),
        }
    }

    pub fn size(&self) -> usize {
        match &self {
            Self::Discrete(size) => *size,
            Self::Continous { size, .. } => *size,
        }
    }

    pub fn is_continous(&self) -> bool {
        matches!(self, Self::Continous { .. })
    }
}

#[derive(Debug, Clone)]
pub struct EnvironmentDescription {
    pub observation_space: Space,
    pub action_space: Space,
}

impl EnvironmentDescription {
    pub fn new(observation_space: Space, action_space: Space) -> Self {
        Self {
            observation_space,
            action_space,
        }
    }

    pub fn action_size(&self) -> usize {
        self.action_space.size()
    }

    pub fn observation_size(&self) -> usize {
        self.observation_space.size()
    }

    /// Only continuous action spaces can drive a Gaussian policy.
    pub fn ensure_continous_actions(&self) -> Result<()> {
        match self.action_space {
            Space::Continous { .. } => Ok(()),
            Space::Discrete(n) => Err(SdeError::Configuration(format!(
                "discrete action space with {n} actions is not supported, expected a continuous space"
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepInfo {
    pub continuity_cost: Option<f32>,
}

#[derive(Debug, Clone)]
pub struct SnapShot {
    pub state: Tensor,
    pub reward: f32,
    pub terminated: bool,
    pub truncated: bool,
    pub info: StepInfo,
}

impl SnapShot {
    pub fn done(&self) -> bool {
        self.terminated || self.truncated
    }
}

pub trait Env {
    fn reset(&mut self, seed: Option<u64>) -> Result<Tensor>;
    fn step(&mut self, action: &Tensor) -> Result<SnapShot>;
    fn env_description(&self) -> EnvironmentDescription;
}
