//! Test doubles for the pipeline's collaborators.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Notify;
use uuid::Uuid;

use crate::boards::{JobBoard, ScrapeError};
use crate::llm_client::{GenerateOptions, ProviderError, TextGenerator};
use crate::models::{DocumentHandle, FetchDepth, IntakeForm, JobListing, LetterStyle};
use crate::notify::{Notifier, NotifyError, RunNotice};
use crate::pipeline::snapshot::{SnapshotError, SnapshotStore};
use crate::pipeline::stage::StageKind;
use crate::render::{DocumentRenderer, MarkdownRenderer, RenderError};
use crate::scoring::ScoringConfig;
use crate::steps::Collaborators;

type Responder = dyn Fn(&str, &GenerateOptions) -> Result<String, ProviderError> + Send + Sync;

/// Language model whose answers come from a closure.
pub struct FakeGenerator {
    respond: Box<Responder>,
}

impl FakeGenerator {
    pub fn new(
        respond: impl Fn(&str, &GenerateOptions) -> Result<String, ProviderError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            respond: Box::new(respond),
        }
    }

    pub fn replying(text: &str) -> Self {
        let text = text.to_string();
        Self::new(move |_, _| Ok(text.clone()))
    }

    /// Valid keyword JSON for keyword prompts, plain prose for everything else.
    pub fn scripted() -> Self {
        Self::new(|prompt, _| {
            if prompt.contains("search keywords") {
                Ok(r#"["python", "sql"]"#.to_string())
            } else {
                Ok("Highlight the Python and SQL experience.".to_string())
            }
        })
    }
}

#[async_trait]
impl TextGenerator for FakeGenerator {
    async fn generate_text(
        &self,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<String, ProviderError> {
        (self.respond)(prompt, options)
    }
}

pub fn sample_intake() -> IntakeForm {
    IntakeForm {
        narrative: "Backend developer moving into data engineering.".to_string(),
        skills: [("python".to_string(), 5), ("sql".to_string(), 3)]
            .into_iter()
            .collect(),
        job_levels: vec!["junior".to_string()],
        job_boards: vec![],
        deep_mode: true,
        letter_count: 2,
        letter_style: LetterStyle::Professional.to_string(),
        extra_keywords: vec![],
    }
}

pub fn listing(
    discovery_index: usize,
    board: &str,
    url: &str,
    title: &str,
    description: &str,
    depth: FetchDepth,
) -> JobListing {
    JobListing {
        board: board.to_string(),
        title: title.to_string(),
        company: "Acme".to_string(),
        url: url.to_string(),
        description: description.to_string(),
        depth,
        discovery_index,
    }
}

/// Board returning the same listings for any query.
pub struct StaticBoard {
    id: String,
    listings: Vec<JobListing>,
}

impl StaticBoard {
    pub fn new(id: &str, listings: Vec<JobListing>) -> Self {
        Self {
            id: id.to_string(),
            listings,
        }
    }

    /// One Python/SQL listing and one unrelated listing, with board-specific URLs.
    pub fn sample_listings(board: &str) -> Vec<JobListing> {
        vec![
            listing(
                0,
                board,
                &format!("https://{board}.example/jobs/1"),
                "Python developer",
                "Python and SQL for our data platform",
                FetchDepth::Deep,
            ),
            listing(
                1,
                board,
                &format!("https://{board}.example/jobs/2"),
                "Product designer",
                "Figma and user research",
                FetchDepth::Deep,
            ),
        ]
    }
}

#[async_trait]
impl JobBoard for StaticBoard {
    fn id(&self) -> &str {
        &self.id
    }

    async fn search(
        &self,
        _keywords: &[String],
        _deep_mode: bool,
    ) -> Result<Vec<JobListing>, ScrapeError> {
        Ok(self.listings.clone())
    }
}

pub struct FailingBoard {
    id: String,
}

impl FailingBoard {
    pub fn new(id: &str) -> Self {
        Self { id: id.to_string() }
    }
}

#[async_trait]
impl JobBoard for FailingBoard {
    fn id(&self) -> &str {
        &self.id
    }

    async fn search(
        &self,
        _keywords: &[String],
        _deep_mode: bool,
    ) -> Result<Vec<JobListing>, ScrapeError> {
        Err(ScrapeError::Unavailable("connection refused".to_string()))
    }
}

/// Board that signals `entered` when a search starts and blocks until `release`.
pub struct GatedBoard {
    inner: StaticBoard,
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

impl GatedBoard {
    pub fn new(
        id: &str,
        listings: Vec<JobListing>,
        entered: Arc<Notify>,
        release: Arc<Notify>,
    ) -> Self {
        Self {
            inner: StaticBoard::new(id, listings),
            entered,
            release,
        }
    }
}

#[async_trait]
impl JobBoard for GatedBoard {
    fn id(&self) -> &str {
        self.inner.id()
    }

    async fn search(
        &self,
        keywords: &[String],
        deep_mode: bool,
    ) -> Result<Vec<JobListing>, ScrapeError> {
        self.entered.notify_one();
        self.release.notified().await;
        self.inner.search(keywords, deep_mode).await
    }
}

pub struct FailingRenderer;

#[async_trait]
impl DocumentRenderer for FailingRenderer {
    async fn render(&self, _text: &str, _style: LetterStyle) -> Result<DocumentHandle, RenderError> {
        Err(RenderError::EmptyDocument)
    }
}

#[derive(Default)]
pub struct CapturingNotifier {
    notices: Mutex<Vec<RunNotice>>,
    fail: bool,
}

impl CapturingNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn notices(&self) -> Vec<RunNotice> {
        self.notices.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for CapturingNotifier {
    async fn notify(&self, notice: &RunNotice) -> Result<(), NotifyError> {
        if self.fail {
            return Err(NotifyError::Rejected(503));
        }
        self.notices.lock().unwrap().push(notice.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemorySnapshotStore {
    written: Mutex<Vec<(Uuid, StageKind, Value)>>,
    fail: bool,
}

impl MemorySnapshotStore {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn written(&self) -> Vec<(Uuid, StageKind, Value)> {
        self.written.lock().unwrap().clone()
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn write(
        &self,
        run_id: Uuid,
        stage: StageKind,
        snapshot: Value,
    ) -> Result<(), SnapshotError> {
        if self.fail {
            let err = serde_json::from_str::<Value>("{").unwrap_err();
            return Err(SnapshotError::Serialization(err));
        }
        self.written.lock().unwrap().push((run_id, stage, snapshot));
        Ok(())
    }
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            llm: Arc::new(FakeGenerator::scripted()),
            boards: vec![
                Arc::new(StaticBoard::new("alpha", StaticBoard::sample_listings("alpha"))),
                Arc::new(StaticBoard::new("beta", StaticBoard::sample_listings("beta"))),
            ],
            renderer: Arc::new(MarkdownRenderer),
            notifier: Arc::new(CapturingNotifier::default()),
            scoring: ScoringConfig::default(),
        }
    }
}
