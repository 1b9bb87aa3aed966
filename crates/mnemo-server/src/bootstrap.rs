//! Wires the collaborators together and runs both transports.

use crate::transport::{http, telegram};
use anyhow::{Context, Result};
use mnemo_application::{
    InMemorySessionStore, InsightAdapter, InteractiveAdapter, StorageApplier,
    WorkflowOrchestrator,
};
use mnemo_core::config::AppConfig;
use mnemo_core::session::Identity;
use mnemo_core::tree::VersionControl;
use mnemo_infrastructure::{FsTreeStore, GitVersionControl, NoopVersionControl};
use mnemo_interaction::{OpenRouterAnalyzer, TelegramClient, WhisperTranscriber};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub async fn run(config: AppConfig, shutdown: CancellationToken) -> Result<()> {
    let token = config
        .telegram
        .token
        .clone()
        .context("telegram token is not configured")?;
    let allowed = config
        .telegram
        .allowed_user_id
        .context("allowed user id is not configured")?;

    let repo = &config.repository;
    let tree = Arc::new(FsTreeStore::new(repo.path.clone()));
    let vcs: Arc<dyn VersionControl> = if repo.sync {
        Arc::new(GitVersionControl::new(
            repo.path.clone(),
            Duration::from_secs(repo.git_timeout_secs),
        ))
    } else {
        tracing::info!("[Bootstrap] Repository sync disabled");
        Arc::new(NoopVersionControl)
    };
    let applier = Arc::new(StorageApplier::new(tree, vcs));

    let analyzer = Arc::new(OpenRouterAnalyzer::from_config(&config.analysis)?);
    let transcriber = Arc::new(WhisperTranscriber::from_config(&config.speech)?);

    let orchestrator = Arc::new(
        WorkflowOrchestrator::new(Arc::new(InMemorySessionStore::new()), analyzer, applier)
            .with_analysis_timeout(Duration::from_secs(config.analysis.timeout_secs))
            .with_pending_input(config.workflow.pending_input),
    );

    let poll_timeout = Duration::from_secs(config.telegram.poll_timeout_secs);
    let client = TelegramClient::new(token, poll_timeout)?;
    let interactive = Arc::new(InteractiveAdapter::new(
        Identity(allowed),
        orchestrator.clone(),
        transcriber,
    ));

    tracing::info!(
        "[Bootstrap] Repository at {}, model {}",
        repo.path.display(),
        config.analysis.model
    );

    let polling = telegram::run_polling(client.clone(), interactive, poll_timeout, shutdown.clone());

    if config.insight.enabled {
        let delivery = Arc::new(telegram::TelegramReplyChannel::to_chat(client, allowed));
        let insight = Arc::new(InsightAdapter::new(
            config.insight.token.clone(),
            orchestrator,
            delivery,
        ));
        let server = http::serve(&config.insight.listen, insight, shutdown.clone());

        let ((), served) = tokio::join!(polling, async {
            let result = server.await;
            if result.is_err() {
                // A dead endpoint stops polling too.
                shutdown.cancel();
            }
            result
        });
        served
    } else {
        tracing::info!("[Bootstrap] Insight endpoint disabled");
        polling.await;
        Ok(())
    }
}

/// Human-readable summary of the effective configuration. Secrets are only
/// reported as set or not set.
pub fn describe(config: &AppConfig, source: &Path) -> String {
    fn secret(value: &Option<String>) -> &'static str {
        match value.as_deref() {
            Some(v) if !v.is_empty() => "set",
            _ => "not set",
        }
    }

    let mut lines = vec![
        format!("config file:      {}", source.display()),
        format!("telegram token:   {}", secret(&config.telegram.token)),
        format!(
            "allowed user:     {}",
            config
                .telegram
                .allowed_user_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "not set".to_string())
        ),
        format!("analysis model:   {}", config.analysis.model),
        format!("analysis key:     {}", secret(&config.analysis.api_key)),
        format!("analysis timeout: {}s", config.analysis.timeout_secs),
        format!("speech model:     {}", config.speech.model),
        format!("speech key:       {}", secret(&config.speech.api_key)),
        format!("repository:       {}", config.repository.path.display()),
        format!("repository sync:  {}", config.repository.sync),
        format!("pending input:    {:?}", config.workflow.pending_input),
    ];
    if config.insight.enabled {
        lines.push(format!("insight listen:   {}", config.insight.listen));
        lines.push(format!("insight token:    {}", secret(&config.insight.token)));
    } else {
        lines.push("insight:          disabled".to_string());
    }
    lines.join("\n")
}
