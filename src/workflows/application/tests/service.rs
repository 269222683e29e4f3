use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::common::*;
use crate::config::SessionConfig;
use crate::workflows::application::domain::{
    Application, CommissionAnswer, ExperienceType, FormField,
};
use crate::workflows::application::sessions::{FormSessions, FormView, SessionError, SessionId};
use crate::workflows::application::sink::{SendError, SubmissionSink};
use crate::workflows::application::validation::ValidationError;
use crate::workflows::application::{
    ApplicationIntakeService, SubmissionState, SubmitError, SubmitOutcome, DISQUALIFIED_NOTICE,
};

struct PanickingSink;

#[async_trait]
impl SubmissionSink for PanickingSink {
    async fn send(&self, _application: &Application) -> Result<(), SendError> {
        panic!("sink blew up mid-delivery");
    }
}

fn bounded_service(
    idle_timeout: Duration,
    capacity: usize,
) -> ApplicationIntakeService<RecordingSink> {
    let sessions = FormSessions::from_config(&SessionConfig {
        idle_timeout,
        capacity,
    });
    ApplicationIntakeService::with_sessions(Arc::new(RecordingSink::default()), sessions)
}

async fn settled_view<S>(service: &ApplicationIntakeService<S>, id: &SessionId) -> FormView
where
    S: SubmissionSink + 'static,
{
    for _ in 0..200 {
        let view = service.view(id).expect("session exists");
        if view.state != SubmissionState::Submitting {
            return view;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("session {id} never left submitting");
}

fn fill<S>(service: &ApplicationIntakeService<S>, id: &SessionId)
where
    S: SubmissionSink + 'static,
{
    for field in complete_fields() {
        let outcome = service.set_field(id, field).expect("session exists");
        assert!(outcome.applied);
    }
    service
        .toggle_experience_type(id, ExperienceType::DmClosing)
        .expect("session exists");
    service
        .set_commission_only(id, CommissionAnswer::Yes)
        .expect("session exists");
}

#[test]
fn open_creates_independent_sessions() {
    let (service, _) = build_service();
    let first = service.open().expect("opens");
    let second = service.open().expect("opens");

    assert_ne!(first.session_id, second.session_id);
    assert_eq!(service.sessions().len(), 2);

    service
        .set_field(&first.session_id, FormField::FirstName("Jane".to_string()))
        .expect("edit applies");
    let untouched = service.view(&second.session_id).expect("view");
    assert!(untouched.application.first_name.is_empty());
}

#[test]
fn unknown_session_is_not_found() {
    let (service, _) = build_service();
    let missing = SessionId("form-missing".to_string());
    match service.view(&missing) {
        Err(SessionError::NotFound(id)) => assert_eq!(id, missing),
        other => panic!("expected not found, got {other:?}"),
    }
}

#[test]
fn view_exposes_gate_and_missing_fields() {
    let (service, _) = build_service();
    let opened = service.open().expect("opens");
    assert_eq!(opened.missing_fields.len(), 9);
    assert!(opened.can_submit);
    assert!(opened.notice.is_none());

    let outcome = service
        .set_commission_only(&opened.session_id, CommissionAnswer::No)
        .expect("edit applies");
    assert!(outcome.applied);
    assert!(outcome.view.is_disqualified);
    assert!(!outcome.view.can_submit);
    assert_eq!(outcome.view.notice.as_deref(), Some(DISQUALIFIED_NOTICE));
    assert_eq!(outcome.view.missing_fields.len(), 8);
}

#[tokio::test]
async fn submit_delivers_once_and_locks_session() {
    let (service, sink) = build_service();
    let id = service.open().expect("opens").session_id;
    fill(&service, &id);

    let attempt = service.submit(&id).await.expect("session exists");
    assert!(matches!(attempt.outcome, Ok(SubmitOutcome::Submitted(_))));
    assert_eq!(attempt.view.state, SubmissionState::Submitted);
    assert!(attempt.view.receipt.is_some());

    let again = service.submit(&id).await.expect("session exists");
    assert_eq!(again.outcome, Ok(SubmitOutcome::Ignored));
    assert_eq!(sink.sent(), vec![complete_application()]);

    let edit = service
        .set_field(&id, FormField::LastName("Roe".to_string()))
        .expect("session exists");
    assert!(!edit.applied);
    assert_eq!(edit.view.application.last_name, "Doe");
}

#[tokio::test]
async fn submit_surfaces_validation_error_in_view() {
    let (service, sink) = build_service();
    let id = service.open().expect("opens").session_id;

    let attempt = service.submit(&id).await.expect("session exists");

    assert!(matches!(
        attempt.outcome,
        Err(SubmitError::Validation(ValidationError::MissingRequiredField(_)))
    ));
    assert_eq!(attempt.view.state, SubmissionState::Editing);
    assert_eq!(attempt.view.error.as_deref(), Some("All fields are required."));
    assert!(sink.sent().is_empty());
}

#[tokio::test]
async fn submit_failure_keeps_session_editable() {
    let sink = RecordingSink::failing_once(SendError::Rejected { status: 500 });
    let service = ApplicationIntakeService::new(Arc::new(sink.clone()));
    let id = service.open().expect("opens").session_id;
    fill(&service, &id);

    let attempt = service.submit(&id).await.expect("session exists");
    assert_eq!(
        attempt.outcome,
        Err(SubmitError::Send(SendError::Rejected { status: 500 }))
    );
    assert_eq!(attempt.view.state, SubmissionState::Editing);
    assert_eq!(attempt.view.application, complete_application());

    let retry = service.submit(&id).await.expect("session exists");
    assert!(matches!(retry.outcome, Ok(SubmitOutcome::Submitted(_))));
    assert_eq!(sink.sent().len(), 2);
}

#[tokio::test]
async fn interactions_during_delivery_are_dropped() {
    let sink = GatedSink::default();
    let service = Arc::new(ApplicationIntakeService::new(Arc::new(sink.clone())));
    let id = service.open().expect("opens").session_id;
    fill(service.as_ref(), &id);

    let in_flight = {
        let service = service.clone();
        let id = id.clone();
        tokio::spawn(async move { service.submit(&id).await })
    };
    sink.entered.notified().await;

    let view = service.view(&id).expect("view");
    assert_eq!(view.state, SubmissionState::Submitting);
    assert!(!view.can_submit);

    let edit = service
        .set_field(&id, FormField::FirstName("Janet".to_string()))
        .expect("session exists");
    assert!(!edit.applied);
    let duplicate = service.submit(&id).await.expect("session exists");
    assert_eq!(duplicate.outcome, Ok(SubmitOutcome::Ignored));

    sink.release.notify_one();
    let attempt = in_flight
        .await
        .expect("task joins")
        .expect("session exists");

    assert!(matches!(attempt.outcome, Ok(SubmitOutcome::Submitted(_))));
    assert_eq!(sink.recorder.sent(), vec![complete_application()]);
}

#[tokio::test]
async fn abandoned_submit_still_settles_the_session() {
    let sink = GatedSink::default();
    let service = Arc::new(ApplicationIntakeService::new(Arc::new(sink.clone())));
    let id = service.open().expect("opens").session_id;
    fill(service.as_ref(), &id);

    let in_flight = {
        let service = service.clone();
        let id = id.clone();
        tokio::spawn(async move { service.submit(&id).await })
    };
    sink.entered.notified().await;
    in_flight.abort();
    let aborted = in_flight.await.expect_err("caller went away");
    assert!(aborted.is_cancelled());

    sink.release.notify_one();
    let view = settled_view(service.as_ref(), &id).await;
    assert_eq!(view.state, SubmissionState::Submitted);
    assert!(view.receipt.is_some());
    assert_eq!(sink.recorder.sent(), vec![complete_application()]);

    let again = service.submit(&id).await.expect("session exists");
    assert_eq!(again.outcome, Ok(SubmitOutcome::Ignored));
    assert_eq!(sink.recorder.sent().len(), 1);
}

#[tokio::test]
async fn crashed_delivery_reopens_the_draft() {
    let service = ApplicationIntakeService::new(Arc::new(PanickingSink));
    let id = service.open().expect("opens").session_id;
    fill(&service, &id);

    let attempt = service.submit(&id).await.expect("session exists");

    assert!(matches!(
        attempt.outcome,
        Err(SubmitError::Send(SendError::Transport(_)))
    ));
    assert_eq!(attempt.view.state, SubmissionState::Editing);
    assert_eq!(
        attempt.view.error.as_deref(),
        Some("Submission failed. Please try again.")
    );
    assert_eq!(attempt.view.application, complete_application());
}

#[test]
fn closed_sessions_are_forgotten() {
    let (service, _) = build_service();
    let id = service.open().expect("opens").session_id;

    service.close(&id).expect("session closes");

    assert!(service.sessions().is_empty());
    assert!(matches!(service.view(&id), Err(SessionError::NotFound(_))));
    assert!(matches!(service.close(&id), Err(SessionError::NotFound(_))));
}

#[tokio::test(start_paused = true)]
async fn idle_sessions_are_retired() {
    let service = bounded_service(Duration::from_secs(60), 100);
    let active = service.open().expect("opens").session_id;
    let idle = service.open().expect("opens").session_id;

    tokio::time::advance(Duration::from_secs(45)).await;
    service
        .set_field(&active, FormField::FirstName("Jane".to_string()))
        .expect("session exists");
    tokio::time::advance(Duration::from_secs(30)).await;

    assert_eq!(service.sessions().retire_idle().expect("sweep runs"), 1);
    assert!(matches!(service.view(&idle), Err(SessionError::NotFound(_))));
    assert_eq!(
        service.view(&active).expect("still live").application.first_name,
        "Jane"
    );
}

#[tokio::test(start_paused = true)]
async fn opening_sweeps_abandoned_drafts() {
    let service = bounded_service(Duration::from_secs(60), 10_000);
    for _ in 0..1_000 {
        service.open().expect("opens");
    }
    assert_eq!(service.sessions().len(), 1_000);

    tokio::time::advance(Duration::from_secs(61)).await;
    service.open().expect("opens");

    assert_eq!(service.sessions().len(), 1);
}

#[test]
fn open_refuses_sessions_beyond_capacity() {
    let service = bounded_service(Duration::from_secs(60), 2);
    let first = service.open().expect("opens").session_id;
    service.open().expect("opens");

    match service.open() {
        Err(SessionError::AtCapacity { capacity }) => assert_eq!(capacity, 2),
        other => panic!("expected capacity error, got {other:?}"),
    }

    service.close(&first).expect("session closes");
    service.open().expect("room after close");
    assert_eq!(service.sessions().len(), 2);
}
