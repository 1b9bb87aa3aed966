//! Hand-written collaborators shared by the workflow tests.

#![allow(dead_code)]

use async_trait::async_trait;
use mnemo_application::{InMemorySessionStore, StorageApplier, WorkflowOrchestrator};
use mnemo_core::analysis::{AnalysisRequest, Analyzer};
use mnemo_core::proposal::{Action, ActionMode, Proposal};
use mnemo_core::reply::{Reply, ReplyChannel};
use mnemo_core::speech::{Transcriber, VoiceClip};
use mnemo_core::tree::{TreeStore, VersionControl};
use mnemo_core::{MnemoError, Result};
use mnemo_infrastructure::FsTreeStore;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

pub fn action(path: &str, mode: ActionMode, content: &str, description: &str) -> Action {
    Action {
        path: path.to_string(),
        mode,
        content: content.to_string(),
        description: description.to_string(),
    }
}

pub fn milk_proposal() -> Proposal {
    Proposal {
        actions: vec![action(
            "daily/2024/05/01.md",
            ActionMode::Append,
            "- bought milk",
            "daily log",
        )],
        summary: "Logging a daily note".to_string(),
    }
}

/// Analyzer that replays queued results and records every request.
///
/// When `gate` is set, each call waits for a notification before
/// answering, which lets tests act while a session is analyzing.
#[derive(Default)]
pub struct MockAnalyzer {
    results: Mutex<VecDeque<Result<Proposal>>>,
    pub requests: Mutex<Vec<AnalysisRequest>>,
    pub gate: Option<Arc<Notify>>,
    pub entered: Arc<Notify>,
}

impl MockAnalyzer {
    pub fn with_results(results: Vec<Result<Proposal>>) -> Self {
        Self {
            results: Mutex::new(results.into()),
            ..Default::default()
        }
    }

    pub fn gated(results: Vec<Result<Proposal>>, gate: Arc<Notify>) -> Self {
        Self {
            results: Mutex::new(results.into()),
            gate: Some(gate),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> AnalysisRequest {
        self.requests.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl Analyzer for MockAnalyzer {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<Proposal> {
        self.requests.lock().unwrap().push(request.clone());
        self.entered.notify_one();
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(MnemoError::analysis("no scripted result")))
    }
}

/// Real filesystem tree that also records each write.
pub struct RecordingTree {
    inner: FsTreeStore,
    pub writes: Mutex<Vec<(String, ActionMode, String)>>,
    pub fail_on: Option<String>,
}

impl RecordingTree {
    pub fn new(root: &Path) -> Self {
        Self {
            inner: FsTreeStore::new(root),
            writes: Mutex::new(Vec::new()),
            fail_on: None,
        }
    }

    pub fn failing_on(root: &Path, path: &str) -> Self {
        Self {
            fail_on: Some(path.to_string()),
            ..Self::new(root)
        }
    }

    pub fn write_count(&self) -> usize {
        self.writes.lock().unwrap().len()
    }
}

#[async_trait]
impl TreeStore for RecordingTree {
    async fn write(&self, path: &str, mode: ActionMode, content: &str) -> Result<()> {
        if self.fail_on.as_deref() == Some(path) {
            return Err(MnemoError::apply(path, "simulated write failure"));
        }
        self.writes
            .lock()
            .unwrap()
            .push((path.to_string(), mode, content.to_string()));
        self.inner.write(path, mode, content).await
    }

    async fn read(&self, path: &str) -> Result<Option<String>> {
        self.inner.read(path).await
    }
}

#[derive(Default)]
pub struct MockVcs {
    pub pulls: Mutex<usize>,
    pub pushes: Mutex<Vec<String>>,
    pub fail_pull: bool,
    pub fail_push: bool,
}

#[async_trait]
impl VersionControl for MockVcs {
    async fn pull(&self) -> Result<()> {
        *self.pulls.lock().unwrap() += 1;
        if self.fail_pull {
            return Err(MnemoError::sync("remote unreachable"));
        }
        Ok(())
    }

    async fn commit_and_push(&self, message: &str) -> Result<()> {
        self.pushes.lock().unwrap().push(message.to_string());
        if self.fail_push {
            return Err(MnemoError::sync("push rejected"));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingChannel {
    pub replies: Mutex<Vec<Reply>>,
}

impl RecordingChannel {
    pub fn texts(&self) -> Vec<String> {
        self.replies
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.text.clone())
            .collect()
    }

    pub fn last(&self) -> Reply {
        self.replies.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl ReplyChannel for RecordingChannel {
    async fn send(&self, reply: Reply) -> Result<()> {
        self.replies.lock().unwrap().push(reply);
        Ok(())
    }
}

/// Channel whose every send fails.
pub struct FailingChannel;

#[async_trait]
impl ReplyChannel for FailingChannel {
    async fn send(&self, _reply: Reply) -> Result<()> {
        Err(MnemoError::transport("chat unreachable"))
    }
}

pub struct StubTranscriber(pub Result<String>);

#[async_trait]
impl Transcriber for StubTranscriber {
    async fn transcribe(&self, _clip: VoiceClip) -> Result<String> {
        self.0.clone()
    }
}

/// Everything a workflow test needs, wired together.
pub struct Harness {
    pub store: Arc<InMemorySessionStore>,
    pub analyzer: Arc<MockAnalyzer>,
    pub tree: Arc<RecordingTree>,
    pub vcs: Arc<MockVcs>,
    pub orchestrator: Arc<WorkflowOrchestrator>,
}

impl Harness {
    pub fn new(analyzer: MockAnalyzer, tree: RecordingTree, vcs: MockVcs) -> Self {
        let store = Arc::new(InMemorySessionStore::new());
        let analyzer = Arc::new(analyzer);
        let tree = Arc::new(tree);
        let vcs = Arc::new(vcs);
        let applier = Arc::new(StorageApplier::new(tree.clone(), vcs.clone()));
        let orchestrator = Arc::new(WorkflowOrchestrator::new(
            store.clone(),
            analyzer.clone(),
            applier,
        ));
        Self {
            store,
            analyzer,
            tree,
            vcs,
            orchestrator,
        }
    }

    pub fn simple(root: &Path, results: Vec<Result<Proposal>>) -> Self {
        Self::new(
            MockAnalyzer::with_results(results),
            RecordingTree::new(root),
            MockVcs::default(),
        )
    }
}
