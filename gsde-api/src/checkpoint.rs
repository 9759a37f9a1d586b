use candle_core::Device;
use candle_nn::VarMap;
use chrono::{DateTime, Local};
use gsde_core::{Result, SdeError};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const CHECKPOINT_DIR: &str = "checkpoints";
pub const MODEL_DIR: &str = "models";

/// `checkpoint_<epoch>_<YYYY_MM_DD_HH_MM_SS>`
pub fn checkpoint_name(epoch: usize, now: &DateTime<Local>) -> String {
    format!("checkpoint_{epoch}_{}", now.format("%Y_%m_%d_%H_%M_%S"))
}

/// Writes network parameters as safetensors blobs. Periodic checkpoints and named "best" models go
/// to separate directories under one root.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    checkpoint_dir: PathBuf,
    model_dir: PathBuf,
}

impl CheckpointStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            checkpoint_dir: root.join(CHECKPOINT_DIR),
            model_dir: root.join(MODEL_DIR),
        }
    }

    pub fn checkpoint_dir(&self) -> &Path {
        &self.checkpoint_dir
    }

    pub fn model_dir(&self) -> &Path {
        &self.model_dir
    }

    fn ensure_dir(dir: &Path) -> Result<()> {
        if !dir.exists() {
            fs::create_dir_all(dir)?;
            tracing::info!(dir = %dir.display(), "created missing directory");
        }
        Ok(())
    }

    fn write(varmap: &VarMap, dir: &Path, name: &str) -> Result<PathBuf> {
        Self::ensure_dir(dir)?;
        let path = dir.join(name);
        varmap.save(&path)?;
        tracing::info!(path = %path.display(), "saved parameters");
        Ok(path)
    }

    pub fn save(&self, varmap: &VarMap, epoch: usize) -> Result<PathBuf> {
        let name = checkpoint_name(epoch, &Local::now());
        Self::write(varmap, &self.checkpoint_dir, &name)
    }

    pub fn save_model(&self, varmap: &VarMap, file_name: &str) -> Result<PathBuf> {
        Self::write(varmap, &self.model_dir, file_name)
    }

    /// Restores every variable of `varmap` from `path`. Read errors are returned as they come
    /// from the file system.
    pub fn load(&self, varmap: &VarMap, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        tracing::info!(path = %path.display(), "loading parameters");
        let bytes = fs::read(path)?;
        let tensors = candle_core::safetensors::load_buffer(&bytes, &Device::Cpu)?;
        let vars = varmap
            .data()
            .lock()
            .map_err(|_| SdeError::Configuration("variable map lock poisoned".into()))?;
        for (name, var) in vars.iter() {
            let tensor = tensors.get(name).ok_or_else(|| {
                SdeError::Configuration(format!(
                    "{} has no entry for variable {name}",
                    path.display()
                ))
            })?;
            var.set(&tensor.to_device(var.device())?)?;
        }
        Ok(())
    }
}
