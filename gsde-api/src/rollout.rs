use gsde_core::{Result, env::Env, policies::policy_value_network::PolicyValueNetwork};

#[derive(Debug, Clone, Copy)]
pub struct RolloutOptions {
    pub max_steps: usize,
    /// Redraw the gSDE exploration weights every `n` steps. `None` keeps one draw for the whole
    /// episode.
    pub sde_sample_freq: Option<usize>,
    pub deterministic: bool,
    pub seed: Option<u64>,
}

impl Default for RolloutOptions {
    fn default() -> Self {
        Self {
            max_steps: 1000,
            sde_sample_freq: None,
            deterministic: false,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EpisodeSummary {
    pub steps: usize,
    pub total_reward: f32,
    pub total_continuity_cost: f32,
    pub done: bool,
}

/// Drives one episode with `network`, a single observation at a time.
pub fn run_episode<E: Env>(
    env: &mut E,
    network: &mut PolicyValueNetwork,
    options: RolloutOptions,
) -> Result<EpisodeSummary> {
    let mut summary = EpisodeSummary::default();
    network.reset_noise(1)?;
    let mut state = env.reset(options.seed)?;
    while summary.steps < options.max_steps {
        if let Some(freq) = options.sde_sample_freq {
            if freq > 0 && summary.steps > 0 && summary.steps % freq == 0 {
                network.reset_noise(1)?;
            }
        }
        let action = network
            .predict(&state.unsqueeze(0)?, options.deterministic)?
            .squeeze(0)?;
        let snapshot = env.step(&action)?;
        summary.steps += 1;
        summary.total_reward += snapshot.reward;
        summary.total_continuity_cost += snapshot.info.continuity_cost.unwrap_or(0.);
        if snapshot.done() {
            summary.done = true;
            break;
        }
        state = snapshot.state;
    }
    tracing::debug!(
        steps = summary.steps,
        total_reward = summary.total_reward,
        done = summary.done,
        "finished episode"
    );
    Ok(summary)
}
