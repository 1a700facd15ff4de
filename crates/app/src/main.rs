use chrono::Utc;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tamil_assistant_core::{
    all_healthy, check_health, ensure_directories, exec, health_targets, is_populated,
    list_documents, probe_audio_capture, read_metadata, rebuild_knowledge_base,
    seed_sample_document, AppPaths, Bootstrapper, Entrypoint, LauncherConfig, LocaleSettings,
    ModelRuntime, ModelServerConfig, OllamaServer, PythonKnowledgeBaseBuilder,
};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "tamil-assistant", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Application root holding data/, logs/ and the Python sources
    #[arg(long, env = "TAMIL_APP_ROOT", default_value = "/app")]
    app_root: PathBuf,

    /// Python interpreter used for setup and the knowledge base builder
    #[arg(long, env = "TAMIL_PYTHON", default_value = "python3")]
    python: String,

    /// Model server executable
    #[arg(long, env = "TAMIL_MODEL_SERVER_BIN", default_value = "ollama")]
    model_server_bin: String,

    /// Model server base URL
    #[arg(long, env = "TAMIL_MODEL_SERVER_URL", default_value = "http://localhost:11434")]
    model_server_url: String,

    /// Model pulled after the server starts
    #[arg(long, env = "TAMIL_LLM_MODEL", default_value = "llama3.2:3b")]
    model: String,

    /// Port of the web interface
    #[arg(long, env = "TAMIL_WEB_PORT", default_value = "8501")]
    web_port: u16,

    /// How long to wait for a freshly started model server
    #[arg(long, env = "TAMIL_READY_TIMEOUT_SECS", default_value = "30")]
    ready_timeout_secs: u64,

    /// Audio capture binary looked up on PATH
    #[arg(long, env = "TAMIL_AUDIO_PROBE", default_value = "arecord")]
    audio_probe: String,

    /// Value for LANG and LC_ALL in child processes
    #[arg(long, env = "TAMIL_LOCALE", default_value = "ta_IN.UTF-8")]
    lang: String,

    /// Value for TZ in child processes
    #[arg(long, env = "TAMIL_TZ", default_value = "Asia/Kolkata")]
    tz: String,
}

#[derive(Subcommand)]
enum Command {
    /// Create the Python environment, install dependencies, fetch models and seed data.
    Setup,
    /// Create the data directories and the sample document only.
    Seed,
    /// Container entrypoint: prepare everything, then exec the given command.
    Start {
        /// Command that replaces this process once start-up is done.
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        command: Vec<String>,
    },
    /// Build the knowledge base from the documents folder.
    BuildKb {
        /// Rebuild even when the vector store already has content.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    /// Show documents, knowledge base and model server state.
    Status,
    /// Exit 0 when the web interface answers, 1 otherwise.
    Healthcheck {
        /// Also require the model server API to answer.
        #[arg(long, default_value_t = false)]
        include_model_api: bool,
    },
}

impl Cli {
    fn launcher_config(&self) -> anyhow::Result<LauncherConfig> {
        let model_server = ModelServerConfig::new(
            &self.model_server_bin,
            &self.model_server_url,
            &self.model,
            Duration::from_secs(self.ready_timeout_secs),
        )?;

        Ok(LauncherConfig {
            paths: AppPaths::under(&self.app_root),
            model_server,
            locale: LocaleSettings {
                lang: self.lang.clone(),
                timezone: self.tz.clone(),
            },
            python: self.python.clone(),
            audio_probe: self.audio_probe.clone(),
            web_port: self.web_port,
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = cli.launcher_config()?;

    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        root = %config.paths.root.display(),
        "tamil-assistant boot"
    );

    match cli.command {
        Command::Setup => {
            let report = Bootstrapper::new(config).run().await?;

            println!("interpreter: {}", report.interpreter.display());
            println!("environment: {}", report.environment.display());
            if !report.requirements_installed {
                println!("requirements: none declared");
            }
            if !report.models_downloaded {
                println!("models: no download script");
            }
            for dir in &report.directories {
                println!("directory ready: {}", dir.display());
            }
            if let Some(sample) = report.sample_document {
                println!("sample document: {}", sample.display());
            }
            println!("✅ அமைப்பு முடிந்தது (setup complete)");
        }
        Command::Seed => {
            for dir in ensure_directories(&config.paths)? {
                println!("directory ready: {}", dir.display());
            }
            match seed_sample_document(&config.paths.documents)? {
                Some(sample) => println!("sample document: {}", sample.display()),
                None => println!("sample document already present"),
            }
        }
        Command::Start { command } => {
            let env = config.locale.env_vars();
            let runtime = OllamaServer::new(config.model_server.clone())?.with_env(env.clone());
            let builder =
                PythonKnowledgeBaseBuilder::new(&config.python, &config.paths.root).with_env(env);
            let entrypoint = Entrypoint::new(config, runtime, builder);

            let report = entrypoint.prepare().await?;
            for line in entrypoint.banner_lines(&report) {
                println!("{line}");
            }

            let main_command = entrypoint.exec_command(&command)?;
            std::io::stdout().flush()?;
            return Err(exec(main_command).into());
        }
        Command::BuildKb { force } => {
            let paths = &config.paths;
            if !force && is_populated(&paths.chroma_db)? {
                println!(
                    "vector store already populated at {} (use --force to rebuild)",
                    paths.chroma_db.display()
                );
                return Ok(());
            }

            let builder = PythonKnowledgeBaseBuilder::new(&config.python, &paths.root)
                .with_env(config.locale.env_vars());
            rebuild_knowledge_base(&builder, &paths.documents, &paths.chroma_db).await?;
            println!("knowledge base built at {}", paths.chroma_db.display());
        }
        Command::Status => {
            let paths = &config.paths;

            let documents = list_documents(&paths.documents).unwrap_or_else(|error| {
                warn!(path = %paths.documents.display(), %error, "cannot list documents");
                Vec::new()
            });
            println!("documents: {} in {}", documents.len(), paths.documents.display());
            for document in &documents {
                let modified = document
                    .modified
                    .map(|at| at.to_rfc3339())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "  {} kind={:?} bytes={} modified={}",
                    document.name, document.kind, document.size_bytes, modified
                );
            }

            let populated = is_populated(&paths.chroma_db).unwrap_or(false);
            println!(
                "vector store: {} ({})",
                paths.chroma_db.display(),
                if populated { "populated" } else { "empty" }
            );
            match read_metadata(&paths.chroma_db) {
                Some(metadata) => {
                    println!(
                        "  documents={} chunks={} created_at={} last_updated={}",
                        metadata.document_count,
                        metadata.chunk_count,
                        metadata.created_at,
                        metadata.last_updated.as_deref().unwrap_or("-")
                    );
                    for indexed in metadata.documents {
                        println!("  indexed: {} chunks={}", indexed.name, indexed.chunks);
                    }
                }
                None => println!("  no metadata"),
            }

            let server = OllamaServer::new(config.model_server.clone())?;
            if server.is_ready().await {
                println!("model server: {} (ready)", config.model_server.base_url);
                match server.installed_models().await {
                    Ok(models) => {
                        let wanted = &config.model_server.model;
                        let present = models.iter().any(|name| name == wanted);
                        println!("  models: {}", models.join(", "));
                        println!("  {wanted}: {}", if present { "installed" } else { "missing" });
                    }
                    Err(error) => warn!(%error, "cannot list installed models"),
                }
            } else {
                println!("model server: {} (not reachable)", config.model_server.base_url);
            }

            match probe_audio_capture(&config.audio_probe) {
                Some(path) => println!("audio capture: {}", path.display()),
                None => println!("audio capture: {} not found", config.audio_probe),
            }
        }
        Command::Healthcheck { include_model_api } => {
            let targets = health_targets(&config, include_model_api)?;
            let statuses = check_health(&targets).await?;

            for status in &statuses {
                println!(
                    "{} {} {}",
                    status.target.name,
                    if status.healthy { "ok" } else { "fail" },
                    status.detail
                );
            }

            if !all_healthy(&statuses) {
                anyhow::bail!("assistant is unhealthy");
            }
        }
    }

    Ok(())
}
