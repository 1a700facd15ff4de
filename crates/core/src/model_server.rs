use crate::traits::ModelRuntime;
use crate::{LaunchError, ModelServerConfig, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::Retry;
use tracing::{debug, info};

const READINESS_PATH: &str = "api/tags";
const PULL_PATH: &str = "api/pull";
const PULL_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Supervises an Ollama server: readiness over HTTP instead of process-name
/// matching, bounded backoff instead of a fixed sleep.
pub struct OllamaServer {
    config: ModelServerConfig,
    client: Client,
    child_env: Vec<(&'static str, String)>,
}

impl OllamaServer {
    pub fn new(config: ModelServerConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            config,
            client,
            child_env: Vec::new(),
        })
    }

    /// Environment applied to the spawned server process.
    pub fn with_env(mut self, vars: Vec<(&'static str, String)>) -> Self {
        self.child_env = vars;
        self
    }

    async fn probe(&self) -> Result<()> {
        let response = self
            .client
            .get(self.config.endpoint(READINESS_PATH)?)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(LaunchError::BackendResponse {
                backend: "ollama".to_string(),
                details: response.status().to_string(),
            });
        }
        Ok(())
    }

    /// Names of the models the server reports as installed.
    pub async fn installed_models(&self) -> Result<Vec<String>> {
        let response = self
            .client
            .get(self.config.endpoint(READINESS_PATH)?)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(LaunchError::BackendResponse {
                backend: "ollama".to_string(),
                details: response.status().to_string(),
            });
        }

        let parsed: Value = response.json().await?;
        Ok(parsed
            .pointer("/models")
            .and_then(Value::as_array)
            .map(|models| {
                models
                    .iter()
                    .filter_map(|model| model.pointer("/name").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[async_trait]
impl ModelRuntime for OllamaServer {
    async fn is_ready(&self) -> bool {
        self.probe().await.is_ok()
    }

    async fn launch(&self) -> Result<Option<u32>> {
        let child = Command::new(&self.config.binary)
            .arg("serve")
            .envs(self.child_env.iter().map(|(key, value)| (*key, value.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| LaunchError::Spawn {
                program: self.config.binary.clone(),
                source,
            })?;

        let pid = child.id();
        info!(binary = %self.config.binary, pid = ?pid, "model server launched");
        // dropping the handle leaves the server running; it outlives the exec
        drop(child);
        Ok(pid)
    }

    async fn wait_until_ready(&self) -> Result<()> {
        let strategy = ExponentialBackoff::from_millis(2)
            .factor(100)
            .max_delay(Duration::from_secs(2))
            .map(jitter);

        let attempts = Retry::start(strategy, || async {
            let outcome = self.probe().await;
            if let Err(error) = &outcome {
                debug!(%error, "model server not ready yet");
            }
            outcome
        });

        match tokio::time::timeout(self.config.ready_timeout, attempts).await {
            Ok(result) => result,
            Err(_) => Err(LaunchError::NotReady(format!(
                "{} did not answer within {:?}",
                self.config.base_url, self.config.ready_timeout
            ))),
        }
    }

    async fn pull_model(&self, model: &str) -> Result<()> {
        let response = self
            .client
            .post(self.config.endpoint(PULL_PATH)?)
            .timeout(PULL_TIMEOUT)
            .json(&json!({ "model": model, "name": model, "stream": false }))
            .send()
            .await?;

        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);

        if let Some(error) = body.pointer("/error").and_then(Value::as_str) {
            return Err(LaunchError::BackendResponse {
                backend: "ollama".to_string(),
                details: error.to_string(),
            });
        }

        if !status.is_success() {
            return Err(LaunchError::BackendResponse {
                backend: "ollama".to_string(),
                details: status.to_string(),
            });
        }

        info!(model = %model, "model pulled");
        Ok(())
    }
}
