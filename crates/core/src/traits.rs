use crate::LaunchError;
use async_trait::async_trait;
use std::path::Path;

/// Turns a folder of documents into a persisted vector index.
#[async_trait]
pub trait KnowledgeBaseBuilder {
    async fn build(&self, documents_dir: &Path, db_dir: &Path) -> Result<(), LaunchError>;
}

/// A local model-serving process reachable over HTTP.
#[async_trait]
pub trait ModelRuntime {
    async fn is_ready(&self) -> bool;

    /// Starts the server in the background and returns its pid, if known.
    async fn launch(&self) -> Result<Option<u32>, LaunchError>;

    async fn wait_until_ready(&self) -> Result<(), LaunchError>;

    async fn pull_model(&self, model: &str) -> Result<(), LaunchError>;
}
