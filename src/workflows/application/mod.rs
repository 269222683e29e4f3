//! Closer application form: draft state, completeness checks, the commission-only gate,
//! and delivery of finished applications to a submission sink.

pub mod controller;
pub mod domain;
pub mod router;
pub mod service;
pub mod sessions;
pub mod sink;
pub mod validation;

#[cfg(test)]
mod tests;

pub use controller::{
    ApplicationFormController, SubmissionReceipt, SubmissionStart, SubmissionState, SubmitError,
    SubmitOutcome, DISQUALIFIED_NOTICE,
};
pub use domain::{
    Application, CommissionAnswer, Country, DealSize, ExperienceType, ExperienceYears, FormField,
    FormOptions,
};
pub use router::application_router;
pub use service::{ApplicationIntakeService, EditOutcome, SubmissionAttempt};
pub use sessions::{FormSessions, FormView, SessionError, SessionId};
pub use sink::{ConfiguredSink, HttpSink, SendError, SimulatedSink, SubmissionSink};
pub use validation::{missing_fields, validate, RequiredField, ValidationError};
