use crate::knowledge_base::ensure_knowledge_base;
use crate::layout::ensure_directories;
use crate::probe::probe_audio_capture;
use crate::traits::{KnowledgeBaseBuilder, ModelRuntime};
use crate::{
    count_documents, LaunchError, LauncherConfig, ModelPullOutcome, ModelServerOutcome, Result,
    StartupReport,
};
use std::os::unix::process::CommandExt;
use std::process::Command;
use tracing::{info, warn};

/// The container start-up sequence: directories, model server, knowledge
/// base, inventory. Runs once, in order, then hands over to `exec`.
pub struct Entrypoint<M, B>
where
    M: ModelRuntime,
    B: KnowledgeBaseBuilder,
{
    config: LauncherConfig,
    runtime: M,
    builder: B,
}

impl<M, B> Entrypoint<M, B>
where
    M: ModelRuntime + Send + Sync,
    B: KnowledgeBaseBuilder + Send + Sync,
{
    pub fn new(config: LauncherConfig, runtime: M, builder: B) -> Self {
        Self {
            config,
            runtime,
            builder,
        }
    }

    /// Only directory preparation is fatal. Model server and knowledge base
    /// problems leave the assistant in a degraded state.
    pub async fn prepare(&self) -> Result<StartupReport> {
        let paths = &self.config.paths;
        let directories = ensure_directories(paths)?;

        let (model_server, model_pull) =
            start_model_server(&self.runtime, &self.config.model_server.model).await;

        let knowledge_base =
            ensure_knowledge_base(&self.builder, &paths.documents, &paths.chroma_db).await;

        let document_count = count_documents(&paths.documents);
        info!(path = %paths.documents.display(), count = document_count, "documents found");

        let audio_capture = probe_audio_capture(&self.config.audio_probe);
        info!(probe = %self.config.audio_probe, available = audio_capture.is_some(), "audio capture probe");

        let report = StartupReport {
            directories,
            model_server,
            model_pull,
            knowledge_base,
            document_count,
            audio_capture,
        };

        if report.is_degraded() {
            warn!("starting in degraded mode");
        }
        Ok(report)
    }

    pub fn banner_lines(&self, report: &StartupReport) -> Vec<String> {
        let rule = "=".repeat(50);
        let audio = match &report.audio_capture {
            Some(path) => format!("கிடைக்கிறது ({})", path.display()),
            None => "கிடைக்கவில்லை, உரை பயன்முறை மட்டும்".to_string(),
        };

        vec![
            rule.clone(),
            "🎙️  தமிழ் குரல் உதவியாளர் (Tamil Voice Assistant)".to_string(),
            rule.clone(),
            format!("📄 ஆவணங்கள்: {}", report.document_count),
            format!("🧠 அறிவுத் தளம்: {}", report.knowledge_base),
            format!("🤖 மாதிரி சேவையகம்: {}", report.model_server),
            format!("📥 மாதிரி பதிவிறக்கம்: {}", report.model_pull),
            format!("🎤 ஒலிப்பதிவு: {audio}"),
            format!("🌐 இணைய இடைமுகம்: {}", self.config.web_url()),
            format!("🔌 மாதிரி API: {}", self.config.model_server.base_url),
            "💡 குரல் கட்டளைகள்: 'உதவி' (help), 'நிறுத்து' (stop), 'வெளியேறு' (exit)".to_string(),
            rule,
        ]
    }

    pub fn exec_command(&self, argv: &[String]) -> Result<Command> {
        build_exec_command(argv, &self.config.locale.env_vars())
    }
}

/// Starts the model server if it is not already answering, then pulls the
/// configured model. Never fails.
pub async fn start_model_server<M>(runtime: &M, model: &str) -> (ModelServerOutcome, ModelPullOutcome)
where
    M: ModelRuntime + Sync + ?Sized,
{
    if runtime.is_ready().await {
        info!("model server already running");
        return (ModelServerOutcome::AlreadyRunning, ModelPullOutcome::Skipped);
    }

    let pid = match runtime.launch().await {
        Ok(pid) => pid,
        Err(error) => {
            warn!(%error, "could not launch model server, continuing without it");
            return (
                ModelServerOutcome::Unavailable {
                    reason: error.to_string(),
                },
                ModelPullOutcome::Skipped,
            );
        }
    };

    if let Err(error) = runtime.wait_until_ready().await {
        warn!(%error, "model server did not become ready, continuing without it");
        return (
            ModelServerOutcome::Unavailable {
                reason: error.to_string(),
            },
            ModelPullOutcome::Skipped,
        );
    }

    let pull = match runtime.pull_model(model).await {
        Ok(()) => ModelPullOutcome::Pulled {
            model: model.to_string(),
        },
        Err(error) => {
            warn!(model = %model, %error, "model download failed, continuing");
            ModelPullOutcome::Failed {
                model: model.to_string(),
                reason: error.to_string(),
            }
        }
    };

    (ModelServerOutcome::Started { pid }, pull)
}

pub fn build_exec_command(argv: &[String], env: &[(&'static str, String)]) -> Result<Command> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| LaunchError::InvalidArgument("no command given to exec".to_string()))?;

    let mut command = Command::new(program);
    command
        .args(args)
        .envs(env.iter().map(|(key, value)| (*key, value.as_str())));
    Ok(command)
}

/// Replaces the current process image. Only returns if `exec` failed.
pub fn exec(mut command: Command) -> LaunchError {
    let program = command.get_program().to_string_lossy().to_string();
    info!(%program, "handing over to main command");
    let source = command.exec();
    LaunchError::Spawn { program, source }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge_base::tests::RecordingBuilder;
    use crate::{AppPaths, KnowledgeBaseOutcome};
    use async_trait::async_trait;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tempfile::tempdir;

    #[derive(Default)]
    struct FakeRuntime {
        running: AtomicBool,
        launch_fails: bool,
        never_ready: bool,
        pull_fails: bool,
        launches: AtomicUsize,
        pulls: AtomicUsize,
    }

    #[async_trait]
    impl ModelRuntime for FakeRuntime {
        async fn is_ready(&self) -> bool {
            self.running.load(Ordering::SeqCst)
        }

        async fn launch(&self) -> Result<Option<u32>> {
            self.launches.fetch_add(1, Ordering::SeqCst);
            if self.launch_fails {
                return Err(LaunchError::Spawn {
                    program: "ollama".to_string(),
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                });
            }
            if !self.never_ready {
                self.running.store(true, Ordering::SeqCst);
            }
            Ok(Some(4242))
        }

        async fn wait_until_ready(&self) -> Result<()> {
            if self.running.load(Ordering::SeqCst) {
                Ok(())
            } else {
                Err(LaunchError::NotReady("timed out".to_string()))
            }
        }

        async fn pull_model(&self, _model: &str) -> Result<()> {
            self.pulls.fetch_add(1, Ordering::SeqCst);
            if self.pull_fails {
                return Err(LaunchError::BackendResponse {
                    backend: "ollama".to_string(),
                    details: "pull model manifest: file does not exist".to_string(),
                });
            }
            Ok(())
        }
    }

    fn config_under(root: &std::path::Path) -> LauncherConfig {
        LauncherConfig {
            paths: AppPaths::under(root),
            audio_probe: "tamil-assistant-no-such-recorder".to_string(),
            ..LauncherConfig::default()
        }
    }

    #[tokio::test]
    async fn running_server_is_not_relaunched() {
        let runtime = FakeRuntime {
            running: AtomicBool::new(true),
            ..FakeRuntime::default()
        };

        let (server, pull) = start_model_server(&runtime, "llama3.2:3b").await;

        assert_eq!(server, ModelServerOutcome::AlreadyRunning);
        assert_eq!(pull, ModelPullOutcome::Skipped);
        assert_eq!(runtime.launches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn launched_server_pulls_model() {
        let runtime = FakeRuntime::default();

        let (server, pull) = start_model_server(&runtime, "llama3.2:3b").await;

        assert_eq!(server, ModelServerOutcome::Started { pid: Some(4242) });
        assert_eq!(
            pull,
            ModelPullOutcome::Pulled {
                model: "llama3.2:3b".to_string()
            }
        );
    }

    #[tokio::test]
    async fn unready_server_skips_pull() {
        let runtime = FakeRuntime {
            never_ready: true,
            ..FakeRuntime::default()
        };

        let (server, pull) = start_model_server(&runtime, "llama3.2:3b").await;

        assert!(matches!(server, ModelServerOutcome::Unavailable { .. }));
        assert_eq!(pull, ModelPullOutcome::Skipped);
        assert_eq!(runtime.pulls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn pull_failure_still_builds_knowledge_base() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let runtime = FakeRuntime {
            pull_fails: true,
            ..FakeRuntime::default()
        };
        let builder = RecordingBuilder::default();
        let entrypoint = Entrypoint::new(config_under(dir.path()), runtime, builder);

        let report = entrypoint.prepare().await?;

        assert!(matches!(report.model_pull, ModelPullOutcome::Failed { .. }));
        assert_eq!(report.knowledge_base, KnowledgeBaseOutcome::Built);
        assert_eq!(entrypoint.builder.calls(), 1);
        assert!(entrypoint.exec_command(&["python".to_string(), "main.py".to_string()]).is_ok());
        Ok(())
    }

    #[tokio::test]
    async fn builder_failure_still_reaches_exec() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let runtime = FakeRuntime {
            launch_fails: true,
            ..FakeRuntime::default()
        };
        let entrypoint = Entrypoint::new(
            config_under(dir.path()),
            runtime,
            RecordingBuilder::failing(),
        );

        let report = entrypoint.prepare().await?;
        let command = entrypoint.exec_command(&["python".to_string(), "main.py".to_string()])?;

        assert!(report.is_degraded());
        assert!(report.knowledge_base.is_degraded());
        assert!(matches!(report.model_server, ModelServerOutcome::Unavailable { .. }));
        assert_eq!(command.get_program(), "python");
        Ok(())
    }

    #[tokio::test]
    async fn banner_shows_failed_model_download() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let runtime = FakeRuntime {
            pull_fails: true,
            ..FakeRuntime::default()
        };
        let entrypoint = Entrypoint::new(config_under(dir.path()), runtime, RecordingBuilder::default());

        let report = entrypoint.prepare().await?;
        let banner = entrypoint.banner_lines(&report).join("\n");

        assert!(report.is_degraded());
        assert!(banner.contains("மாதிரி சேவையகம்: started (pid 4242)"));
        assert!(banner.contains("மாதிரி பதிவிறக்கம்: ⚠️ llama3.2:3b download failed"));
        Ok(())
    }

    #[tokio::test]
    async fn rerun_with_populated_store_skips_builder() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let config = config_under(dir.path());
        fs::create_dir_all(&config.paths.chroma_db)?;
        fs::write(config.paths.chroma_db.join("chroma.sqlite3"), b"index")?;
        let entrypoint = Entrypoint::new(config, FakeRuntime::default(), RecordingBuilder::default());

        let first = entrypoint.prepare().await?;
        let second = entrypoint.prepare().await?;

        assert_eq!(first.knowledge_base, KnowledgeBaseOutcome::AlreadyPresent);
        assert_eq!(second.knowledge_base, KnowledgeBaseOutcome::AlreadyPresent);
        assert_eq!(entrypoint.builder.calls(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn report_counts_documents_and_prepares_directories() -> Result<(), Box<dyn std::error::Error>>
    {
        let dir = tempdir()?;
        let config = config_under(dir.path());
        fs::create_dir_all(&config.paths.documents)?;
        for name in ["plans.txt", "budget.pdf", "notes.docx", "draft.odt"] {
            fs::write(config.paths.documents.join(name), b"x")?;
        }
        let entrypoint = Entrypoint::new(config, FakeRuntime::default(), RecordingBuilder::default());

        let report = entrypoint.prepare().await?;

        assert_eq!(report.document_count, 3);
        assert_eq!(report.audio_capture, None);
        for path in &report.directories {
            assert_eq!(fs::metadata(path)?.permissions().mode() & 0o777, 0o755);
        }
        let banner = entrypoint.banner_lines(&report).join("\n");
        assert!(banner.contains("http://localhost:8501"));
        assert!(banner.contains("ஆவணங்கள்: 3"));
        assert!(banner.contains("மாதிரி பதிவிறக்கம்: llama3.2:3b ready"));
        Ok(())
    }

    #[test]
    fn exec_command_carries_locale() -> Result<(), Box<dyn std::error::Error>> {
        let env = vec![("LANG", "ta_IN.UTF-8".to_string())];
        let command = build_exec_command(
            &["streamlit".to_string(), "run".to_string(), "app.py".to_string()],
            &env,
        )?;

        let args: Vec<_> = command.get_args().collect();
        assert_eq!(command.get_program(), "streamlit");
        assert_eq!(args, vec!["run", "app.py"]);
        assert!(command
            .get_envs()
            .any(|(key, value)| key == "LANG" && value.is_some_and(|v| v == "ta_IN.UTF-8")));
        Ok(())
    }

    #[test]
    fn empty_command_is_rejected() {
        assert!(matches!(
            build_exec_command(&[], &[]),
            Err(LaunchError::InvalidArgument(_))
        ));
    }
}
