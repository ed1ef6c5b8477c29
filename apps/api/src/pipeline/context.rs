//! Run Context: the single-writer-per-field data carrier passed through the pipeline.
//!
//! Every field is written exactly once and never removed. A `RunContext` belongs
//! to exactly one run and is never shared, so it carries no synchronisation.
//! Stages never see the raw context: they get a `StageScope` that only allows
//! reading declared inputs and writing declared outputs.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::models::{
    BoardFailure, CandidateProfile, DocumentHandle, IntakeForm, JobListing, ScoredListing,
};
use crate::pipeline::stage::StageKind;

/// Name of a stage output stored in the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ContextField {
    Intake,
    CandidateProfile,
    SearchKeywords,
    RawListings,
    BoardFailures,
    ScoredListings,
    JobReport,
    GeneratedDocument,
}

impl ContextField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Intake => "intake",
            Self::CandidateProfile => "candidateProfile",
            Self::SearchKeywords => "searchKeywords",
            Self::RawListings => "rawListings",
            Self::BoardFailures => "boardFailures",
            Self::ScoredListings => "scoredListings",
            Self::JobReport => "jobReport",
            Self::GeneratedDocument => "generatedDocument",
        }
    }
}

impl fmt::Display for ContextField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value stored under one `ContextField`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ContextValue {
    Intake(IntakeForm),
    CandidateProfile(CandidateProfile),
    SearchKeywords(Vec<String>),
    RawListings(Vec<JobListing>),
    BoardFailures(Vec<BoardFailure>),
    ScoredListings(Vec<ScoredListing>),
    JobReport(String),
    GeneratedDocument(DocumentHandle),
}

impl ContextValue {
    pub fn field(&self) -> ContextField {
        match self {
            Self::Intake(_) => ContextField::Intake,
            Self::CandidateProfile(_) => ContextField::CandidateProfile,
            Self::SearchKeywords(_) => ContextField::SearchKeywords,
            Self::RawListings(_) => ContextField::RawListings,
            Self::BoardFailures(_) => ContextField::BoardFailures,
            Self::ScoredListings(_) => ContextField::ScoredListings,
            Self::JobReport(_) => ContextField::JobReport,
            Self::GeneratedDocument(_) => ContextField::GeneratedDocument,
        }
    }
}

/// Contract violations in context usage. Always fatal for the run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error("context field '{0}' is missing")]
    MissingField(ContextField),

    #[error("context field '{0}' was already written")]
    DuplicateWrite(ContextField),

    #[error("stage '{stage}' is not allowed to write context field '{field}'")]
    UndeclaredWrite {
        stage: StageKind,
        field: ContextField,
    },
}

#[derive(Debug, Default, Serialize)]
pub struct RunContext {
    values: BTreeMap<ContextField, ContextValue>,
}

impl RunContext {
    /// Creates a context seeded with the run's intake submission.
    pub fn with_intake(intake: IntakeForm) -> Self {
        let mut values = BTreeMap::new();
        values.insert(ContextField::Intake, ContextValue::Intake(intake));
        Self { values }
    }

    /// Writes a field. Fails with `DuplicateWrite` if it is already populated.
    pub fn set(&mut self, value: ContextValue) -> Result<(), ContextError> {
        let field = value.field();
        if self.values.contains_key(&field) {
            return Err(ContextError::DuplicateWrite(field));
        }
        self.values.insert(field, value);
        Ok(())
    }

    pub fn get(&self, field: ContextField) -> Result<&ContextValue, ContextError> {
        self.values
            .get(&field)
            .ok_or(ContextError::MissingField(field))
    }

    pub fn intake(&self) -> Result<&IntakeForm, ContextError> {
        match self.get(ContextField::Intake)? {
            ContextValue::Intake(v) => Ok(v),
            _ => Err(ContextError::MissingField(ContextField::Intake)),
        }
    }

    pub fn candidate_profile(&self) -> Result<&CandidateProfile, ContextError> {
        match self.get(ContextField::CandidateProfile)? {
            ContextValue::CandidateProfile(v) => Ok(v),
            _ => Err(ContextError::MissingField(ContextField::CandidateProfile)),
        }
    }

    pub fn search_keywords(&self) -> Result<&[String], ContextError> {
        match self.get(ContextField::SearchKeywords)? {
            ContextValue::SearchKeywords(v) => Ok(v),
            _ => Err(ContextError::MissingField(ContextField::SearchKeywords)),
        }
    }

    pub fn raw_listings(&self) -> Result<&[JobListing], ContextError> {
        match self.get(ContextField::RawListings)? {
            ContextValue::RawListings(v) => Ok(v),
            _ => Err(ContextError::MissingField(ContextField::RawListings)),
        }
    }

    pub fn board_failures(&self) -> Result<&[BoardFailure], ContextError> {
        match self.get(ContextField::BoardFailures)? {
            ContextValue::BoardFailures(v) => Ok(v),
            _ => Err(ContextError::MissingField(ContextField::BoardFailures)),
        }
    }

    pub fn scored_listings(&self) -> Result<&[ScoredListing], ContextError> {
        match self.get(ContextField::ScoredListings)? {
            ContextValue::ScoredListings(v) => Ok(v),
            _ => Err(ContextError::MissingField(ContextField::ScoredListings)),
        }
    }

    pub fn job_report(&self) -> Result<&str, ContextError> {
        match self.get(ContextField::JobReport)? {
            ContextValue::JobReport(v) => Ok(v),
            _ => Err(ContextError::MissingField(ContextField::JobReport)),
        }
    }

    pub fn generated_document(&self) -> Result<&DocumentHandle, ContextError> {
        match self.get(ContextField::GeneratedDocument)? {
            ContextValue::GeneratedDocument(v) => Ok(v),
            _ => Err(ContextError::MissingField(ContextField::GeneratedDocument)),
        }
    }

    /// Moves the rendered document out once the caller consumes the run.
    pub fn into_document(mut self) -> Option<DocumentHandle> {
        match self.values.remove(&ContextField::GeneratedDocument) {
            Some(ContextValue::GeneratedDocument(doc)) => Some(doc),
            _ => None,
        }
    }
}

/// The view of the context handed to one stage while it executes.
pub struct StageScope<'a> {
    run_id: Uuid,
    stage: StageKind,
    context: &'a mut RunContext,
}

impl<'a> StageScope<'a> {
    pub fn new(run_id: Uuid, stage: StageKind, context: &'a mut RunContext) -> Self {
        Self {
            run_id,
            stage,
            context,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Undeclared reads are reported as missing fields: to the stage the field does not exist.
    fn check_read(&self, field: ContextField) -> Result<&RunContext, ContextError> {
        if !self.stage.inputs().contains(&field) {
            debug!(stage = %self.stage, %field, "rejected read of undeclared context field");
            return Err(ContextError::MissingField(field));
        }
        Ok(&*self.context)
    }

    pub fn set(&mut self, value: ContextValue) -> Result<(), ContextError> {
        let field = value.field();
        if !self.stage.outputs().contains(&field) {
            return Err(ContextError::UndeclaredWrite {
                stage: self.stage,
                field,
            });
        }
        self.context.set(value)
    }

    pub fn intake(&self) -> Result<&IntakeForm, ContextError> {
        self.check_read(ContextField::Intake)?.intake()
    }

    pub fn candidate_profile(&self) -> Result<&CandidateProfile, ContextError> {
        self.check_read(ContextField::CandidateProfile)?
            .candidate_profile()
    }

    pub fn search_keywords(&self) -> Result<&[String], ContextError> {
        self.check_read(ContextField::SearchKeywords)?
            .search_keywords()
    }

    pub fn raw_listings(&self) -> Result<&[JobListing], ContextError> {
        self.check_read(ContextField::RawListings)?.raw_listings()
    }

    pub fn board_failures(&self) -> Result<&[BoardFailure], ContextError> {
        self.check_read(ContextField::BoardFailures)?
            .board_failures()
    }

    pub fn scored_listings(&self) -> Result<&[ScoredListing], ContextError> {
        self.check_read(ContextField::ScoredListings)?
            .scored_listings()
    }

    pub fn job_report(&self) -> Result<&str, ContextError> {
        self.check_read(ContextField::JobReport)?.job_report()
    }

    pub fn generated_document(&self) -> Result<&DocumentHandle, ContextError> {
        self.check_read(ContextField::GeneratedDocument)?
            .generated_document()
    }
}
