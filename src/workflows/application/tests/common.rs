use std::collections::{BTreeSet, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use serde_json::Value;
use tokio::sync::Notify;

use crate::workflows::application::domain::{
    Application, CommissionAnswer, Country, DealSize, ExperienceType, ExperienceYears, FormField,
};
use crate::workflows::application::sink::{SendError, SubmissionSink};
use crate::workflows::application::{
    application_router, ApplicationFormController, ApplicationIntakeService,
};

/// The Jane Doe application used across scenarios.
pub(super) fn complete_application() -> Application {
    Application {
        first_name: "Jane".to_string(),
        last_name: "Doe".to_string(),
        country: Some(Country::Canada),
        phone_number: "+1-555-0100".to_string(),
        instagram_url: "instagram.com/jane".to_string(),
        experience_years: Some(ExperienceYears::TwoToFour),
        experience_types: BTreeSet::from([ExperienceType::DmClosing]),
        avg_deal_size: Some(DealSize::OneToThreeThousand),
        worked_commission_only: Some(CommissionAnswer::Yes),
        why_consider: "10 closed deals last quarter".to_string(),
    }
}

pub(super) fn complete_fields() -> Vec<FormField> {
    vec![
        FormField::FirstName("Jane".to_string()),
        FormField::LastName("Doe".to_string()),
        FormField::Country(Country::Canada),
        FormField::PhoneNumber("+1-555-0100".to_string()),
        FormField::InstagramUrl("instagram.com/jane".to_string()),
        FormField::ExperienceYears(ExperienceYears::TwoToFour),
        FormField::AvgDealSize(DealSize::OneToThreeThousand),
        FormField::WhyConsider("10 closed deals last quarter".to_string()),
    ]
}

/// Controller holding `complete_application()` and still editing.
pub(super) fn filled_controller() -> ApplicationFormController {
    let mut controller = ApplicationFormController::new();
    for field in complete_fields() {
        assert!(controller.set_field(field));
    }
    assert!(controller.toggle_experience_type(ExperienceType::DmClosing));
    assert!(controller.set_commission_only(CommissionAnswer::Yes));
    controller
}

/// Sink that records every payload and replays scripted results (success once exhausted).
#[derive(Default, Clone)]
pub(super) struct RecordingSink {
    sent: Arc<Mutex<Vec<Application>>>,
    scripted: Arc<Mutex<VecDeque<Result<(), SendError>>>>,
}

impl RecordingSink {
    pub(super) fn failing_once(error: SendError) -> Self {
        let sink = Self::default();
        sink.scripted
            .lock()
            .expect("script mutex poisoned")
            .push_back(Err(error));
        sink
    }

    pub(super) fn sent(&self) -> Vec<Application> {
        self.sent.lock().expect("sink mutex poisoned").clone()
    }
}

#[async_trait]
impl SubmissionSink for RecordingSink {
    async fn send(&self, application: &Application) -> Result<(), SendError> {
        self.sent
            .lock()
            .expect("sink mutex poisoned")
            .push(application.clone());
        self.scripted
            .lock()
            .expect("script mutex poisoned")
            .pop_front()
            .unwrap_or(Ok(()))
    }
}

/// Sink that parks every send until `release` is called.
#[derive(Default, Clone)]
pub(super) struct GatedSink {
    pub(super) entered: Arc<Notify>,
    pub(super) release: Arc<Notify>,
    pub(super) recorder: RecordingSink,
}

#[async_trait]
impl SubmissionSink for GatedSink {
    async fn send(&self, application: &Application) -> Result<(), SendError> {
        self.entered.notify_one();
        self.release.notified().await;
        self.recorder.send(application).await
    }
}

pub(super) fn build_service() -> (ApplicationIntakeService<RecordingSink>, RecordingSink) {
    let sink = RecordingSink::default();
    let service = ApplicationIntakeService::new(Arc::new(sink.clone()));
    (service, sink)
}

pub(super) fn router_with_sink(sink: RecordingSink) -> axum::Router {
    application_router(Arc::new(ApplicationIntakeService::new(Arc::new(sink))))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 16 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
