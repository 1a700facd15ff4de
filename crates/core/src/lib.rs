pub mod bootstrap;
pub mod config;
pub mod documents;
pub mod entrypoint;
pub mod error;
pub mod health;
pub mod knowledge_base;
pub mod layout;
pub mod model_server;
pub mod models;
pub mod probe;
pub mod traits;
pub mod vector_store;

pub use bootstrap::{Bootstrapper, SetupReport};
pub use config::{AppPaths, LauncherConfig, LocaleSettings, ModelServerConfig};
pub use documents::{count_documents, discover_documents, list_documents, seed_sample_document};
pub use entrypoint::{build_exec_command, exec, start_model_server, Entrypoint};
pub use error::{LaunchError, Result};
pub use health::{all_healthy, check_health, health_targets, HealthStatus, HealthTarget};
pub use knowledge_base::{ensure_knowledge_base, rebuild_knowledge_base, PythonKnowledgeBaseBuilder};
pub use layout::{ensure_directories, ensure_directory};
pub use model_server::OllamaServer;
pub use models::{
    DocumentInfo, DocumentKind, IndexedDocument, KnowledgeBaseMetadata, KnowledgeBaseOutcome,
    ModelPullOutcome, ModelServerOutcome, StartupReport,
};
pub use probe::{find_executable, probe_audio_capture};
pub use traits::{KnowledgeBaseBuilder, ModelRuntime};
pub use vector_store::{is_populated, read_metadata};
