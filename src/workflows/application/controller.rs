use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::domain::{Application, CommissionAnswer, ExperienceType, FormField};
use super::sink::{SendError, SubmissionSink};
use super::validation::{validate, ValidationError};

const SEND_FAILURE_MESSAGE: &str = "Submission failed. Please try again.";

/// Shown next to the commission-only question once the applicant answers "no".
pub const DISQUALIFIED_NOTICE: &str =
    "This role is strictly commission-based. Experience without a safety net is required.";

/// Lifecycle of the single draft owned by a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionState {
    Editing,
    Submitting,
    Submitted,
}

impl SubmissionState {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Editing => "editing",
            Self::Submitting => "submitting",
            Self::Submitted => "submitted",
        }
    }
}

/// Proof that the sink accepted the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub submitted_at: DateTime<Utc>,
}

/// Non-error results of a submit attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The sink accepted the draft; the controller is now read-only.
    Submitted(SubmissionReceipt),
    /// The applicant answered "no" to the commission-only question. Nothing was sent.
    Blocked,
    /// The controller was not editing, so the attempt was dropped.
    Ignored,
}

/// First half of a submit attempt, for hosts that await the sink themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionStart {
    /// Controller moved to `Submitting`; deliver this payload and report back.
    Ready(Application),
    Blocked,
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Send(#[from] SendError),
}

/// Owns one application draft and drives it through editing, submission, and retirement.
#[derive(Debug, Clone)]
pub struct ApplicationFormController {
    application: Application,
    state: SubmissionState,
    last_error: Option<String>,
    receipt: Option<SubmissionReceipt>,
}

impl Default for ApplicationFormController {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplicationFormController {
    pub fn new() -> Self {
        Self {
            application: Application::default(),
            state: SubmissionState::Editing,
            last_error: None,
            receipt: None,
        }
    }

    pub fn application(&self) -> &Application {
        &self.application
    }

    pub fn state(&self) -> SubmissionState {
        self.state
    }

    pub fn is_disqualified(&self) -> bool {
        self.application.worked_commission_only == Some(CommissionAnswer::No)
    }

    /// Whether a renderer should enable the submit button.
    pub fn can_submit(&self) -> bool {
        self.state == SubmissionState::Editing && !self.is_disqualified()
    }

    pub fn notice(&self) -> Option<&'static str> {
        self.is_disqualified().then_some(DISQUALIFIED_NOTICE)
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn receipt(&self) -> Option<&SubmissionReceipt> {
        self.receipt.as_ref()
    }

    fn editing(&self) -> bool {
        self.state == SubmissionState::Editing
    }

    /// Overwrite one field of the draft. Returns `false` when edits are closed.
    pub fn set_field(&mut self, field: FormField) -> bool {
        if !self.editing() {
            debug!(field = field.name(), state = self.state.label(), "ignoring field edit");
            return false;
        }

        debug!(field = field.name(), "field updated");
        self.application.apply(field);
        true
    }

    pub fn toggle_experience_type(&mut self, value: ExperienceType) -> bool {
        if !self.editing() {
            debug!(value = value.label(), state = self.state.label(), "ignoring toggle");
            return false;
        }

        let selected = self.application.toggle_experience_type(value);
        debug!(value = value.label(), selected, "experience type toggled");
        true
    }

    pub fn set_commission_only(&mut self, answer: CommissionAnswer) -> bool {
        if !self.editing() {
            debug!(state = self.state.label(), "ignoring commission answer");
            return false;
        }

        self.application.worked_commission_only = Some(answer);
        if self.is_disqualified() {
            info!("applicant has no commission-only experience; submission disabled");
        }
        true
    }

    /// Validate and gate the draft, moving to `Submitting` when it may be sent.
    pub fn begin_submission(&mut self) -> Result<SubmissionStart, ValidationError> {
        if !self.editing() {
            debug!(state = self.state.label(), "submit ignored outside editing");
            return Ok(SubmissionStart::Ignored);
        }

        self.last_error = None;

        if let Err(err) = validate(&self.application) {
            debug!(%err, "submit rejected");
            self.last_error = Some(err.user_message().to_string());
            return Err(err);
        }

        if self.is_disqualified() {
            debug!("submit blocked by commission-only gate");
            return Ok(SubmissionStart::Blocked);
        }

        self.state = SubmissionState::Submitting;
        info!("submitting application");
        Ok(SubmissionStart::Ready(self.application.clone()))
    }

    /// Record the sink's answer for a submission started with [`Self::begin_submission`].
    pub fn complete_submission(
        &mut self,
        result: Result<(), SendError>,
    ) -> Result<SubmitOutcome, SendError> {
        if self.state != SubmissionState::Submitting {
            warn!(state = self.state.label(), "no submission in flight");
            return Ok(SubmitOutcome::Ignored);
        }

        match result {
            Ok(()) => {
                let receipt = SubmissionReceipt {
                    submitted_at: Utc::now(),
                };
                self.state = SubmissionState::Submitted;
                self.receipt = Some(receipt.clone());
                info!(submitted_at = %receipt.submitted_at, "application submitted");
                Ok(SubmitOutcome::Submitted(receipt))
            }
            Err(err) => {
                warn!(%err, "submission failed; draft kept for retry");
                self.state = SubmissionState::Editing;
                self.last_error = Some(SEND_FAILURE_MESSAGE.to_string());
                Err(err)
            }
        }
    }

    /// Run a full submit attempt against `sink`.
    ///
    /// A disqualified draft yields `Ok(SubmitOutcome::Blocked)`, never an error. Dropping the
    /// returned future mid-send reopens the draft as a failed attempt.
    pub async fn submit<S>(&mut self, sink: &S) -> Result<SubmitOutcome, SubmitError>
    where
        S: SubmissionSink + ?Sized,
    {
        match self.begin_submission()? {
            SubmissionStart::Ready(payload) => {
                let in_flight = InFlight::new(self);
                let result = sink.send(&payload).await;
                Ok(in_flight.settle(result)?)
            }
            SubmissionStart::Blocked => Ok(SubmitOutcome::Blocked),
            SubmissionStart::Ignored => Ok(SubmitOutcome::Ignored),
        }
    }
}

/// Submission awaiting its sink. Settles as `SendError::Cancelled` if dropped unanswered.
struct InFlight<'a> {
    controller: &'a mut ApplicationFormController,
    settled: bool,
}

impl<'a> InFlight<'a> {
    fn new(controller: &'a mut ApplicationFormController) -> Self {
        Self {
            controller,
            settled: false,
        }
    }

    fn settle(mut self, result: Result<(), SendError>) -> Result<SubmitOutcome, SendError> {
        self.settled = true;
        self.controller.complete_submission(result)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            let _ = self.controller.complete_submission(Err(SendError::Cancelled));
        }
    }
}
