// Builds a policy from the command line (or a JSON options file), feeds it synthetic observations
// and logs how the exploration distribution behaves. No environment is simulated.

use anyhow::Context;
use candle_core::{DType, Device};
use clap::Parser;
use gsde_api::{builders::policies::PolicyBuilder, checkpoint::CheckpointStore};
use gsde_core::{
    config::{ExplorationKind, GsdeConfig, PolicyOptions},
    env::{EnvironmentDescription, Space},
    rng::RngHandle,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Probe a gSDE policy with synthetic observations")]
struct Args {
    #[arg(long, default_value_t = 8)]
    obs_dim: usize,

    #[arg(long, default_value_t = 2)]
    action_dim: usize,

    #[arg(long, default_value_t = 16)]
    batch: usize,

    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Redraw the exploration weights every `n` iterations.
    #[arg(long, default_value_t = 4)]
    resample_every: usize,

    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// JSON file with `PolicyOptions`. Missing fields keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    squash_output: bool,

    #[arg(long)]
    use_expln: bool,

    /// Write the final parameters below this directory.
    #[arg(long)]
    checkpoint_dir: Option<PathBuf>,
}

fn policy_options(args: &Args) -> anyhow::Result<PolicyOptions> {
    let mut options = match &args.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str::<PolicyOptions>(&raw)
                .with_context(|| format!("parsing {}", path.display()))?
        }
        None => PolicyOptions::default(),
    };
    if let ExplorationKind::StateDependent(config) = &mut options.exploration {
        *config = GsdeConfig {
            squash_output: config.squash_output || args.squash_output,
            use_expln: config.use_expln || args.use_expln,
            ..*config
        };
    }
    Ok(options)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let device = Device::Cpu;
    let env_description = EnvironmentDescription::new(
        Space::continous_from_dims(vec![args.obs_dim]),
        Space::continous_from_dims(vec![args.action_dim]),
    );
    let builder = PolicyBuilder {
        options: policy_options(&args)?,
        seed: args.seed,
        dtype: DType::F32,
    };
    tracing::info!(options = ?builder.options, "building policy");
    let mut built = builder.build(&env_description, &device)?;
    // separate stream so observations do not shift the exploration noise
    let observations_rng = RngHandle::seeded(args.seed.wrapping_add(1));

    for iteration in 0..args.iterations {
        if args.resample_every > 0 && iteration % args.resample_every == 0 {
            built.network.reset_noise(args.batch)?;
        }
        let observations =
            observations_rng.standard_normal((args.batch, args.obs_dim), DType::F32, &device)?;
        let output = built.network.get_action_and_value(&observations, None)?;
        let log_prob = output.log_prob.mean_all()?.to_scalar::<f32>()?;
        let value = output.value.mean_all()?.to_scalar::<f32>()?;
        let entropy = match &output.entropy {
            Some(entropy) => Some(entropy.mean_all()?.to_scalar::<f32>()?),
            None => None,
        };
        tracing::info!(
            iteration,
            log_prob,
            ?entropy,
            value,
            mean_std = built.network.mean_std()?,
            "probed policy"
        );
    }

    if let Some(dir) = &args.checkpoint_dir {
        let store = CheckpointStore::new(dir);
        let path = store.save(&built.varmap, args.iterations)?;
        println!("{}", path.display());
    }
    Ok(())
}
