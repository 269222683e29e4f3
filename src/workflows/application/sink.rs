use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use super::domain::Application;

/// Outbound delivery of a completed application (review queue, spreadsheet hook, ...).
///
/// Implementations are called at most once per submit attempt and must not retry.
#[async_trait]
pub trait SubmissionSink: Send + Sync {
    async fn send(&self, application: &Application) -> Result<(), SendError>;
}

/// Delivery failure reported by a sink.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
    #[error("submission transport unavailable: {0}")]
    Transport(String),
    #[error("submission endpoint rejected the application (status {status})")]
    Rejected { status: u16 },
    #[error("submission cancelled before the sink answered")]
    Cancelled,
}

/// Stand-in sink: waits a fixed delay, logs the payload, and always succeeds.
#[derive(Debug, Clone)]
pub struct SimulatedSink {
    delay: Duration,
}

impl SimulatedSink {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for SimulatedSink {
    fn default() -> Self {
        Self::new(Duration::from_millis(2000))
    }
}

#[async_trait]
impl SubmissionSink for SimulatedSink {
    async fn send(&self, application: &Application) -> Result<(), SendError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let payload = serde_json::to_string(application)
            .map_err(|err| SendError::Transport(err.to_string()))?;
        info!(%payload, "form submitted payload");
        Ok(())
    }
}

/// Posts the application as JSON to a form-collection endpoint.
#[derive(Debug, Clone)]
pub struct HttpSink {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpSink {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, SendError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|err| SendError::Transport(err.to_string()))?;

        Ok(Self::with_client(endpoint, client))
    }

    pub fn with_client(endpoint: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            endpoint: endpoint.into(),
            client,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SubmissionSink for HttpSink {
    async fn send(&self, application: &Application) -> Result<(), SendError> {
        debug!(endpoint = %self.endpoint, "posting application");

        let response = self
            .client
            .post(&self.endpoint)
            .json(application)
            .send()
            .await
            .map_err(|err| SendError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SendError::Rejected {
                status: status.as_u16(),
            });
        }

        Ok(())
    }
}

/// Whichever sink the runtime configuration selects.
#[derive(Debug, Clone)]
pub enum ConfiguredSink {
    Simulated(SimulatedSink),
    Http(HttpSink),
}

impl ConfiguredSink {
    pub fn from_config(config: &crate::config::SubmissionConfig) -> Result<Self, SendError> {
        match &config.endpoint {
            Some(endpoint) => Ok(Self::Http(HttpSink::new(endpoint.clone())?)),
            None => Ok(Self::Simulated(SimulatedSink::new(config.delay))),
        }
    }

    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Simulated(_) => "simulated",
            Self::Http(_) => "http",
        }
    }
}

#[async_trait]
impl SubmissionSink for ConfiguredSink {
    async fn send(&self, application: &Application) -> Result<(), SendError> {
        match self {
            Self::Simulated(sink) => sink.send(application).await,
            Self::Http(sink) => sink.send(application).await,
        }
    }
}
