pub mod document;
pub mod listing;
pub mod profile;
pub mod run;

pub use document::DocumentHandle;
pub use listing::{BoardFailure, FetchDepth, JobListing, ScoredListing};
pub use profile::{CandidateProfile, IntakeForm, LetterStyle, ProfilePreferences};
pub use run::{Run, RunFailure, RunStatus};
