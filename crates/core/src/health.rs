use crate::{LaunchError, LauncherConfig, Result};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthTarget {
    pub name: &'static str,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthStatus {
    pub target: HealthTarget,
    pub healthy: bool,
    pub detail: String,
}

/// Liveness targets: the web interface always, the model API on request.
pub fn health_targets(config: &LauncherConfig, include_model_api: bool) -> Result<Vec<HealthTarget>> {
    let mut targets = vec![HealthTarget {
        name: "web",
        url: format!("http://127.0.0.1:{}/", config.web_port),
    }];

    if include_model_api {
        targets.push(HealthTarget {
            name: "model-api",
            url: config.model_server.endpoint("api/tags")?.to_string(),
        });
    }
    Ok(targets)
}

pub async fn check_health(targets: &[HealthTarget]) -> Result<Vec<HealthStatus>> {
    let client = Client::builder().timeout(PROBE_TIMEOUT).build()?;
    let mut statuses = Vec::with_capacity(targets.len());

    for target in targets {
        let status = match client.get(&target.url).send().await {
            Ok(response) if response.status().is_success() => HealthStatus {
                target: target.clone(),
                healthy: true,
                detail: response.status().to_string(),
            },
            Ok(response) => HealthStatus {
                target: target.clone(),
                healthy: false,
                detail: response.status().to_string(),
            },
            Err(error) => HealthStatus {
                target: target.clone(),
                healthy: false,
                detail: LaunchError::from(error).to_string(),
            },
        };
        debug!(probe = status.target.name, healthy = status.healthy, detail = %status.detail, "health probe");
        statuses.push(status);
    }

    Ok(statuses)
}

pub fn all_healthy(statuses: &[HealthStatus]) -> bool {
    statuses.iter().all(|status| status.healthy)
}
