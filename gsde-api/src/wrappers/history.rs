use candle_core::{DType, Device, Tensor};
use gsde_core::{
    Result, SdeError,
    env::{Env, EnvironmentDescription, SnapShot, Space},
};
use std::collections::VecDeque;

/// Keeps the last `steps` `(observation ‖ action)` pairs and hands them out flattened as the
/// observation. Slots before the first step are zero-filled.
///
/// With the continuity cost enabled, `beta * ‖a_t - a_{t-1}‖²` is subtracted from the reward and
/// reported in [`StepInfo::continuity_cost`].
pub struct HistoryWrapper<E: Env> {
    env: E,
    steps: usize,
    use_continuity_cost: bool,
    beta: f32,
    observation_dim: usize,
    action_dim: usize,
    history: VecDeque<Tensor>,
    device: Device,
    dtype: DType,
}

impl<E: Env> HistoryWrapper<E> {
    pub fn new(env: E, steps: usize, use_continuity_cost: bool, device: &Device) -> Result<Self> {
        if steps <= 1 {
            return Err(SdeError::Configuration(format!(
                "history needs more than one step, got {steps}"
            )));
        }
        let description = env.env_description();
        description.ensure_continous_actions()?;
        let mut wrapper = Self {
            env,
            steps,
            use_continuity_cost,
            beta: 1.,
            observation_dim: description.observation_size(),
            action_dim: description.action_size(),
            history: VecDeque::with_capacity(steps),
            device: device.clone(),
            dtype: DType::F32,
        };
        wrapper.history = wrapper.make_history()?;
        Ok(wrapper)
    }

    /// Weight of the continuity cost.
    pub fn with_beta(mut self, beta: f32) -> Self {
        self.beta = beta;
        self
    }

    pub fn inner(&self) -> &E {
        &self.env
    }

    fn step_dim(&self) -> usize {
        self.observation_dim + self.action_dim
    }

    fn make_history(&self) -> Result<VecDeque<Tensor>> {
        let zeros = Tensor::zeros(self.step_dim(), self.dtype, &self.device)?;
        Ok(std::iter::repeat_n(zeros, self.steps).collect())
    }

    /// History as a `(steps, obs_dim + action_dim)` matrix, oldest row first.
    pub fn history(&self) -> Result<Tensor> {
        let rows = self.history.iter().cloned().collect::<Vec<_>>();
        Ok(Tensor::stack(&rows, 0)?)
    }

    fn flattened(&self) -> Result<Tensor> {
        let rows = self.history.iter().cloned().collect::<Vec<_>>();
        Ok(Tensor::cat(&rows, 0)?)
    }

    fn push(&mut self, observation: &Tensor, action: &Tensor) -> Result<()> {
        let observation = observation.flatten_all()?.to_dtype(self.dtype)?;
        let action = action.flatten_all()?.to_dtype(self.dtype)?;
        if observation.dim(0)? != self.observation_dim || action.dim(0)? != self.action_dim {
            return Err(SdeError::shape_mismatch(
                "history entry",
                &[self.observation_dim, self.action_dim],
                &[observation.dim(0)?, action.dim(0)?],
            ));
        }
        self.history.pop_front();
        self.history
            .push_back(Tensor::cat(&[observation, action], 0)?);
        Ok(())
    }

    /// `obs ‖ action` bounds repeated once per slot, when the wrapped env knows them.
    fn history_bounds(&self, inner: &EnvironmentDescription) -> Result<Option<(Tensor, Tensor)>> {
        match (&inner.observation_space, &inner.action_space) {
            (
                Space::Continous {
                    min: Some(obs_min),
                    max: Some(obs_max),
                    ..
                },
                Space::Continous {
                    min: Some(act_min),
                    max: Some(act_max),
                    ..
                },
            ) => {
                let low = Tensor::cat(&[obs_min.flatten_all()?, act_min.flatten_all()?], 0)?;
                let high = Tensor::cat(&[obs_max.flatten_all()?, act_max.flatten_all()?], 0)?;
                Ok(Some((
                    Tensor::cat(&vec![low; self.steps], 0)?,
                    Tensor::cat(&vec![high; self.steps], 0)?,
                )))
            }
            _ => Ok(None),
        }
    }

    /// Squared distance between the actions of the two most recent slots.
    fn continuity_cost(&self) -> Result<f32> {
        let last = &self.history[self.steps - 1];
        let previous = &self.history[self.steps - 2];
        let action = last.narrow(0, self.observation_dim, self.action_dim)?;
        let last_action = previous.narrow(0, self.observation_dim, self.action_dim)?;
        let cost = (action - last_action)?
            .sqr()?
            .sum_all()?
            .to_dtype(DType::F32)?
            .to_scalar::<f32>()?;
        Ok(cost)
    }
}

impl<E: Env> Env for HistoryWrapper<E> {
    fn reset(&mut self, seed: Option<u64>) -> Result<Tensor> {
        self.history = self.make_history()?;
        let observation = self.env.reset(seed)?;
        let no_action = Tensor::zeros(self.action_dim, self.dtype, &self.device)?;
        self.push(&observation, &no_action)?;
        self.flattened()
    }

    fn step(&mut self, action: &Tensor) -> Result<SnapShot> {
        let SnapShot {
            state,
            mut reward,
            terminated,
            truncated,
            mut info,
        } = self.env.step(action)?;
        self.push(&state, action)?;
        if self.use_continuity_cost {
            let continuity_cost = self.continuity_cost()?;
            reward -= self.beta * continuity_cost;
            info.continuity_cost = Some(continuity_cost);
            tracing::trace!(continuity_cost, reward, "applied continuity cost");
        }
        Ok(SnapShot {
            state: self.flattened()?,
            reward,
            terminated,
            truncated,
            info,
        })
    }

    fn env_description(&self) -> EnvironmentDescription {
        let inner = self.env.env_description();
        let (min, max) = match self.history_bounds(&inner) {
            Ok(Some((min, max))) => (Some(min), Some(max)),
            Ok(None) => (None, None),
            Err(err) => {
                tracing::warn!(%err, "could not tile history bounds");
                (None, None)
            }
        };
        EnvironmentDescription::new(
            Space::Continous {
                min,
                max,
                size: self.steps * self.step_dim(),
            },
            inner.action_space,
        )
    }
}
