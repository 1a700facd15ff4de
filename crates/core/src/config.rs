use crate::{LaunchError, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

pub const DEFAULT_APP_ROOT: &str = "/app";
pub const DEFAULT_WEB_PORT: u16 = 8501;
pub const DEFAULT_MODEL_SERVER_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "llama3.2:3b";
pub const DEFAULT_LOCALE: &str = "ta_IN.UTF-8";
pub const DEFAULT_TIMEZONE: &str = "Asia/Kolkata";

/// Filesystem layout shared by setup, the entrypoint and the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub root: PathBuf,
    pub documents: PathBuf,
    pub audio_cache: PathBuf,
    pub chroma_db: PathBuf,
    pub logs: PathBuf,
}

impl AppPaths {
    pub fn under(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let data = root.join("data");
        Self {
            documents: data.join("documents"),
            audio_cache: data.join("audio_cache"),
            chroma_db: data.join("chroma_db"),
            logs: root.join("logs"),
            root,
        }
    }

    /// The directories that must exist before the main process starts.
    pub fn runtime_directories(&self) -> [&Path; 4] {
        [
            self.documents.as_path(),
            self.audio_cache.as_path(),
            self.chroma_db.as_path(),
            self.logs.as_path(),
        ]
    }

    pub fn venv(&self) -> PathBuf {
        self.root.join("venv")
    }

    pub fn requirements(&self) -> PathBuf {
        self.root.join("requirements.txt")
    }

    pub fn model_download_script(&self) -> PathBuf {
        self.root.join("models").join("download_models.py")
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::under(DEFAULT_APP_ROOT)
    }
}

#[derive(Debug, Clone)]
pub struct ModelServerConfig {
    pub binary: String,
    pub base_url: String,
    pub model: String,
    pub ready_timeout: Duration,
    pub request_timeout: Duration,
}

impl ModelServerConfig {
    pub fn new(
        binary: impl Into<String>,
        base_url: &str,
        model: impl Into<String>,
        ready_timeout: Duration,
    ) -> Result<Self> {
        let parsed = Url::parse(base_url)?;
        if parsed.cannot_be_a_base() {
            return Err(LaunchError::InvalidArgument(format!(
                "model server url cannot be used as a base: {base_url}"
            )));
        }

        Ok(Self {
            binary: binary.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.into(),
            ready_timeout,
            request_timeout: Duration::from_secs(5),
        })
    }

    /// Resolves `path` below the base URL, keeping any path prefix the base
    /// carries (`http://proxy/ollama` + `api/tags`).
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        let base = Url::parse(&format!("{}/", self.base_url))?;
        Ok(base.join(path.trim_start_matches('/'))?)
    }
}

impl Default for ModelServerConfig {
    fn default() -> Self {
        Self {
            binary: "ollama".to_string(),
            base_url: DEFAULT_MODEL_SERVER_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            ready_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(5),
        }
    }
}

/// Locale variables exported to every child process and the exec'd command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleSettings {
    pub lang: String,
    pub timezone: String,
}

impl LocaleSettings {
    pub fn env_vars(&self) -> Vec<(&'static str, String)> {
        vec![
            ("LANG", self.lang.clone()),
            ("LC_ALL", self.lang.clone()),
            ("TZ", self.timezone.clone()),
        ]
    }
}

impl Default for LocaleSettings {
    fn default() -> Self {
        Self {
            lang: DEFAULT_LOCALE.to_string(),
            timezone: DEFAULT_TIMEZONE.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LauncherConfig {
    pub paths: AppPaths,
    pub model_server: ModelServerConfig,
    pub locale: LocaleSettings,
    pub python: String,
    pub audio_probe: String,
    pub web_port: u16,
}

impl LauncherConfig {
    pub fn web_url(&self) -> String {
        format!("http://localhost:{}", self.web_port)
    }
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            paths: AppPaths::default(),
            model_server: ModelServerConfig::default(),
            locale: LocaleSettings::default(),
            python: "python3".to_string(),
            audio_probe: "arecord".to_string(),
            web_port: DEFAULT_WEB_PORT,
        }
    }
}
