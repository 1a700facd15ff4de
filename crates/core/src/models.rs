use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Txt,
    Pdf,
    Docx,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 3] = [DocumentKind::Txt, DocumentKind::Pdf, DocumentKind::Docx];

    pub fn extension(self) -> &'static str {
        match self {
            DocumentKind::Txt => "txt",
            DocumentKind::Pdf => "pdf",
            DocumentKind::Docx => "docx",
        }
    }

    /// Case-sensitive, the same way `*.txt` matches in a shell glob.
    pub fn from_extension(extension: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.extension() == extension)
    }
}

#[derive(Debug, Clone)]
pub struct DocumentInfo {
    pub name: String,
    pub path: PathBuf,
    pub kind: DocumentKind,
    pub size_bytes: u64,
    pub modified: Option<DateTime<Utc>>,
}

/// Written by the knowledge-base builder next to its index as `metadata.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KnowledgeBaseMetadata {
    pub created_at: String,
    #[serde(default)]
    pub last_updated: Option<String>,
    #[serde(default)]
    pub document_count: u64,
    #[serde(default)]
    pub chunk_count: u64,
    #[serde(default)]
    pub documents: Vec<IndexedDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexedDocument {
    pub name: String,
    #[serde(default)]
    pub chunks: u64,
    #[serde(default)]
    pub added_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelServerOutcome {
    AlreadyRunning,
    Started { pid: Option<u32> },
    Unavailable { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelPullOutcome {
    Pulled { model: String },
    Failed { model: String, reason: String },
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KnowledgeBaseOutcome {
    AlreadyPresent,
    Built,
    Failed { reason: String },
}

impl KnowledgeBaseOutcome {
    pub fn is_degraded(&self) -> bool {
        matches!(self, KnowledgeBaseOutcome::Failed { .. })
    }
}

/// What the startup sequence did before handing over to the main command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupReport {
    pub directories: Vec<PathBuf>,
    pub model_server: ModelServerOutcome,
    pub model_pull: ModelPullOutcome,
    pub knowledge_base: KnowledgeBaseOutcome,
    pub document_count: usize,
    pub audio_capture: Option<PathBuf>,
}

impl StartupReport {
    pub fn is_degraded(&self) -> bool {
        matches!(self.model_server, ModelServerOutcome::Unavailable { .. })
            || matches!(self.model_pull, ModelPullOutcome::Failed { .. })
            || self.knowledge_base.is_degraded()
    }
}

impl fmt::Display for ModelServerOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelServerOutcome::AlreadyRunning => write!(f, "already running"),
            ModelServerOutcome::Started { pid: Some(pid) } => write!(f, "started (pid {pid})"),
            ModelServerOutcome::Started { pid: None } => write!(f, "started"),
            ModelServerOutcome::Unavailable { reason } => write!(f, "unavailable: {reason}"),
        }
    }
}

impl fmt::Display for ModelPullOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelPullOutcome::Pulled { model } => write!(f, "{model} ready"),
            ModelPullOutcome::Failed { model, reason } => {
                write!(f, "⚠️ {model} download failed: {reason}")
            }
            ModelPullOutcome::Skipped => write!(f, "skipped"),
        }
    }
}

impl fmt::Display for KnowledgeBaseOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KnowledgeBaseOutcome::AlreadyPresent => write!(f, "existing index reused"),
            KnowledgeBaseOutcome::Built => write!(f, "built"),
            KnowledgeBaseOutcome::Failed { reason } => write!(f, "not available: {reason}"),
        }
    }
}
