pub mod context;
pub mod handle;
pub mod handlers;
pub mod manager;
pub mod orchestrator;
pub mod progress;
pub mod snapshot;
pub mod stage;

pub use manager::{RunError, RunManager};
pub use orchestrator::Orchestrator;
pub use snapshot::PgSnapshotStore;
