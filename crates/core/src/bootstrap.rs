use crate::documents::seed_sample_document;
use crate::layout::ensure_directories;
use crate::probe::find_executable;
use crate::{LaunchError, LauncherConfig, Result};
use std::env;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupReport {
    pub interpreter: PathBuf,
    pub environment: PathBuf,
    pub requirements_installed: bool,
    pub models_downloaded: bool,
    pub directories: Vec<PathBuf>,
    pub sample_document: Option<PathBuf>,
}

/// Prepares a host for running the assistant. Every step is fatal: the
/// first failure aborts the remaining ones.
pub struct Bootstrapper {
    config: LauncherConfig,
}

impl Bootstrapper {
    pub fn new(config: LauncherConfig) -> Self {
        Self { config }
    }

    pub fn require_interpreter(&self) -> Result<PathBuf> {
        find_executable(&self.config.python, env::var_os("PATH").as_deref())
            .ok_or_else(|| LaunchError::MissingRuntime(self.config.python.clone()))
    }

    pub async fn create_environment(&self, interpreter: &Path) -> Result<PathBuf> {
        let venv = self.config.paths.venv();
        info!(path = %venv.display(), "creating dependency environment");
        self.run_step(
            interpreter.as_os_str(),
            [OsStr::new("-m"), OsStr::new("venv"), venv.as_os_str()],
        )
        .await?;
        Ok(venv)
    }

    pub async fn install_requirements(&self, venv: &Path) -> Result<bool> {
        let requirements = self.config.paths.requirements();
        if !requirements.is_file() {
            warn!(path = %requirements.display(), "no requirements file, nothing to install");
            return Ok(false);
        }

        let pip = venv.join("bin").join("pip");
        info!(path = %requirements.display(), "installing dependencies");
        self.run_step(
            pip.as_os_str(),
            [OsStr::new("install"), OsStr::new("-r"), requirements.as_os_str()],
        )
        .await?;
        Ok(true)
    }

    pub async fn download_models(&self, venv: &Path) -> Result<bool> {
        let script = self.config.paths.model_download_script();
        if !script.is_file() {
            warn!(path = %script.display(), "no model download script, skipping");
            return Ok(false);
        }

        let python = venv.join("bin").join("python");
        info!(path = %script.display(), "downloading models");
        self.run_step(python.as_os_str(), [script.as_os_str()]).await?;
        Ok(true)
    }

    pub async fn run(&self) -> Result<SetupReport> {
        let interpreter = self.require_interpreter()?;
        info!(interpreter = %interpreter.display(), "runtime interpreter found");
        fs::create_dir_all(&self.config.paths.root)?;

        let environment = self.create_environment(&interpreter).await?;
        let requirements_installed = self.install_requirements(&environment).await?;
        let models_downloaded = self.download_models(&environment).await?;
        let directories = ensure_directories(&self.config.paths)?;
        let sample_document = seed_sample_document(&self.config.paths.documents)?;

        Ok(SetupReport {
            interpreter,
            environment,
            requirements_installed,
            models_downloaded,
            directories,
            sample_document,
        })
    }

    async fn run_step<'a, I>(&self, program: &OsStr, args: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a OsStr>,
    {
        let label = program.to_string_lossy().to_string();
        let status = Command::new(program)
            .args(args)
            .current_dir(&self.config.paths.root)
            .envs(self.config.locale.env_vars())
            .status()
            .await
            .map_err(|source| LaunchError::Spawn {
                program: label.clone(),
                source,
            })?;

        if !status.success() {
            return Err(LaunchError::CommandFailed {
                program: label,
                status: status.to_string(),
            });
        }
        Ok(())
    }
}
