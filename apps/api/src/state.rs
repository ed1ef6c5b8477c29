use std::sync::Arc;

use crate::pipeline::RunManager;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Registry of every run this process has accepted and not yet handed back.
    pub runs: Arc<RunManager>,
}
