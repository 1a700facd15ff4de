use crate::traits::KnowledgeBaseBuilder;
use crate::vector_store::is_populated;
use crate::{KnowledgeBaseOutcome, LaunchError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{info, warn};

const BUILD_SNIPPET: &str = "import sys\n\
from src.knowledge_base import TamilKnowledgeBase\n\
TamilKnowledgeBase(sys.argv[1], sys.argv[2]).build_knowledge_base()\n";

/// Runs the application's `TamilKnowledgeBase` builder in a Python
/// subprocess. Paths travel through `sys.argv`, never through the source.
#[derive(Debug, Clone)]
pub struct PythonKnowledgeBaseBuilder {
    interpreter: String,
    app_root: PathBuf,
    env: Vec<(&'static str, String)>,
}

impl PythonKnowledgeBaseBuilder {
    pub fn new(interpreter: impl Into<String>, app_root: impl Into<PathBuf>) -> Self {
        Self {
            interpreter: interpreter.into(),
            app_root: app_root.into(),
            env: Vec::new(),
        }
    }

    pub fn with_env(mut self, vars: Vec<(&'static str, String)>) -> Self {
        self.env = vars;
        self
    }

    pub fn command(&self, documents_dir: &Path, db_dir: &Path) -> Command {
        let mut command = Command::new(&self.interpreter);
        command
            .arg("-c")
            .arg(BUILD_SNIPPET)
            .arg(documents_dir)
            .arg(db_dir)
            .current_dir(&self.app_root)
            .envs(self.env.iter().map(|(key, value)| (*key, value.as_str())));
        command
    }
}

#[async_trait]
impl KnowledgeBaseBuilder for PythonKnowledgeBaseBuilder {
    async fn build(&self, documents_dir: &Path, db_dir: &Path) -> Result<()> {
        let status = self
            .command(documents_dir, db_dir)
            .status()
            .await
            .map_err(|source| LaunchError::Spawn {
                program: self.interpreter.clone(),
                source,
            })?;

        if !status.success() {
            return Err(LaunchError::CommandFailed {
                program: format!("{} (knowledge base builder)", self.interpreter),
                status: status.to_string(),
            });
        }
        Ok(())
    }
}

/// Builds the knowledge base only when the vector store is missing or empty.
/// Failures are logged and reported, never returned: the assistant can run
/// without a knowledge base.
pub async fn ensure_knowledge_base<B>(
    builder: &B,
    documents_dir: &Path,
    db_dir: &Path,
) -> KnowledgeBaseOutcome
where
    B: KnowledgeBaseBuilder + Sync + ?Sized,
{
    match is_populated(db_dir) {
        Ok(true) => {
            info!(path = %db_dir.display(), "vector store present, skipping knowledge base build");
            return KnowledgeBaseOutcome::AlreadyPresent;
        }
        Ok(false) => {}
        // an unreadable store counts as empty; the builder gets a chance to fix it
        Err(error) => {
            warn!(path = %db_dir.display(), %error, "cannot inspect vector store, treating it as empty");
        }
    }

    info!(documents = %documents_dir.display(), "building knowledge base");
    match builder.build(documents_dir, db_dir).await {
        Ok(()) => KnowledgeBaseOutcome::Built,
        Err(error) => {
            warn!(%error, "knowledge base build failed, continuing without it");
            KnowledgeBaseOutcome::Failed {
                reason: error.to_string(),
            }
        }
    }
}

/// Unconditional rebuild; errors propagate.
pub async fn rebuild_knowledge_base<B>(builder: &B, documents_dir: &Path, db_dir: &Path) -> Result<()>
where
    B: KnowledgeBaseBuilder + Sync + ?Sized,
{
    info!(documents = %documents_dir.display(), db = %db_dir.display(), "rebuilding knowledge base");
    builder.build(documents_dir, db_dir).await
}
