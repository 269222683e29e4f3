use std::sync::Arc;

use tracing::{info, warn};

use super::controller::{SubmissionStart, SubmitError, SubmitOutcome};
use super::domain::{Application, CommissionAnswer, ExperienceType, FormField, FormOptions};
use super::sessions::{lock, FormSessions, FormView, SessionError, SessionId, SharedController};
use super::sink::{SendError, SubmissionSink};

/// Result of an edit: whether it was applied, plus the session as it now stands.
#[derive(Debug, Clone)]
pub struct EditOutcome {
    pub applied: bool,
    pub view: FormView,
}

/// Result of a submit attempt plus the session view after it settled.
#[derive(Debug, Clone)]
pub struct SubmissionAttempt {
    pub outcome: Result<SubmitOutcome, SubmitError>,
    pub view: FormView,
}

/// Service composing the session registry with the configured submission sink.
pub struct ApplicationIntakeService<S> {
    sessions: FormSessions,
    sink: Arc<S>,
    options: FormOptions,
}

impl<S> ApplicationIntakeService<S>
where
    S: SubmissionSink + 'static,
{
    pub fn new(sink: Arc<S>) -> Self {
        Self::with_sessions(sink, FormSessions::default())
    }

    pub fn with_sessions(sink: Arc<S>, sessions: FormSessions) -> Self {
        Self {
            sessions,
            sink,
            options: FormOptions::standard(),
        }
    }

    pub fn options(&self) -> &FormOptions {
        &self.options
    }

    pub fn sessions(&self) -> &FormSessions {
        &self.sessions
    }

    /// Start a new, empty application draft.
    pub fn open(&self) -> Result<FormView, SessionError> {
        let view = self.sessions.open()?;
        info!(session_id = %view.session_id, "form session opened");
        Ok(view)
    }

    pub fn view(&self, id: &SessionId) -> Result<FormView, SessionError> {
        self.sessions.view(id)
    }

    pub fn set_field(
        &self,
        id: &SessionId,
        field: FormField,
    ) -> Result<EditOutcome, SessionError> {
        let (applied, view) = self
            .sessions
            .with_controller(id, |controller| controller.set_field(field))?;
        Ok(EditOutcome { applied, view })
    }

    pub fn toggle_experience_type(
        &self,
        id: &SessionId,
        value: ExperienceType,
    ) -> Result<EditOutcome, SessionError> {
        let (applied, view) = self
            .sessions
            .with_controller(id, |controller| controller.toggle_experience_type(value))?;
        Ok(EditOutcome { applied, view })
    }

    pub fn set_commission_only(
        &self,
        id: &SessionId,
        answer: CommissionAnswer,
    ) -> Result<EditOutcome, SessionError> {
        let (applied, view) = self
            .sessions
            .with_controller(id, |controller| controller.set_commission_only(answer))?;
        Ok(EditOutcome { applied, view })
    }

    /// Drop a session and its draft.
    pub fn close(&self, id: &SessionId) -> Result<(), SessionError> {
        self.sessions.close(id)?;
        info!(session_id = %id, "form session closed");
        Ok(())
    }

    /// Submit the session's draft.
    ///
    /// Delivery runs on its own task and always settles the session, even when the caller
    /// stops waiting. The controller lock is released while the sink is awaited, so edits and
    /// repeated submits that arrive meanwhile see `Submitting` and are dropped.
    pub async fn submit(&self, id: &SessionId) -> Result<SubmissionAttempt, SessionError> {
        let controller = self.sessions.controller(id)?;

        let (start, view) = {
            let mut guard = lock(&controller)?;
            let start = guard.begin_submission();
            (start, FormView::of(id, &guard))
        };

        let payload = match start {
            Ok(SubmissionStart::Ready(payload)) => payload,
            Ok(SubmissionStart::Blocked) => {
                return Ok(SubmissionAttempt {
                    outcome: Ok(SubmitOutcome::Blocked),
                    view,
                })
            }
            Ok(SubmissionStart::Ignored) => {
                return Ok(SubmissionAttempt {
                    outcome: Ok(SubmitOutcome::Ignored),
                    view,
                })
            }
            Err(err) => {
                return Ok(SubmissionAttempt {
                    outcome: Err(SubmitError::Validation(err)),
                    view,
                })
            }
        };

        info!(session_id = %id, "delivering application");
        let delivery = tokio::spawn(deliver(
            self.sink.clone(),
            controller.clone(),
            id.clone(),
            payload,
        ));

        match delivery.await {
            Ok(settled) => settled,
            Err(join_error) => {
                warn!(session_id = %id, %join_error, "delivery task failed");
                let failure = SendError::Transport(format!("delivery task failed: {join_error}"));
                let mut guard = lock(&controller)?;
                let outcome = guard.complete_submission(Err(failure));
                Ok(SubmissionAttempt {
                    outcome: outcome.map_err(SubmitError::Send),
                    view: FormView::of(id, &guard),
                })
            }
        }
    }
}

async fn deliver<S>(
    sink: Arc<S>,
    controller: SharedController,
    id: SessionId,
    payload: Application,
) -> Result<SubmissionAttempt, SessionError>
where
    S: SubmissionSink + 'static,
{
    let result = sink.send(&payload).await;
    let mut guard = lock(&controller)?;
    let outcome = guard.complete_submission(result);
    Ok(SubmissionAttempt {
        outcome: outcome.map_err(SubmitError::Send),
        view: FormView::of(&id, &guard),
    })
}
