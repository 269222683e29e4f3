use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::SessionConfig;

use super::controller::{ApplicationFormController, SubmissionReceipt, SubmissionState};
use super::domain::Application;
use super::validation::{missing_fields, RequiredField};

/// Identifier for one form session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

static SESSION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_session_id() -> SessionId {
    let id = SESSION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    SessionId(format!("form-{id:06}"))
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("form session {0} not found")]
    NotFound(SessionId),
    #[error("form session store unavailable")]
    Unavailable,
    #[error("too many open form sessions (limit {capacity})")]
    AtCapacity { capacity: usize },
}

/// Snapshot handed to the rendering layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormView {
    pub session_id: SessionId,
    pub state: SubmissionState,
    pub application: Application,
    pub is_disqualified: bool,
    pub can_submit: bool,
    pub missing_fields: Vec<RequiredField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<SubmissionReceipt>,
}

impl FormView {
    pub fn of(session_id: &SessionId, controller: &ApplicationFormController) -> Self {
        Self {
            session_id: session_id.clone(),
            state: controller.state(),
            application: controller.application().clone(),
            is_disqualified: controller.is_disqualified(),
            can_submit: controller.can_submit(),
            missing_fields: missing_fields(controller.application()),
            notice: controller.notice().map(str::to_string),
            error: controller.last_error().map(str::to_string),
            receipt: controller.receipt().cloned(),
        }
    }
}

pub(crate) type SharedController = Arc<Mutex<ApplicationFormController>>;

#[derive(Debug)]
struct SessionEntry {
    controller: SharedController,
    last_seen: Instant,
}

/// In-memory registry holding one controller per form session.
///
/// Sessions idle for longer than the configured timeout are retired whenever a new one is
/// opened or [`FormSessions::retire_idle`] runs; the number of live sessions is capped.
#[derive(Debug)]
pub struct FormSessions {
    sessions: Mutex<HashMap<SessionId, SessionEntry>>,
    idle_timeout: Duration,
    capacity: usize,
}

impl Default for FormSessions {
    fn default() -> Self {
        Self::from_config(&SessionConfig::default())
    }
}

impl FormSessions {
    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            idle_timeout: config.idle_timeout,
            capacity: config.capacity,
        }
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    pub fn open(&self) -> Result<FormView, SessionError> {
        let now = Instant::now();
        let mut sessions = self.entries()?;
        retire_idle_entries(&mut sessions, now, self.idle_timeout);

        if sessions.len() >= self.capacity {
            warn!(capacity = self.capacity, "form session limit reached");
            return Err(SessionError::AtCapacity {
                capacity: self.capacity,
            });
        }

        let id = next_session_id();
        let controller = ApplicationFormController::new();
        let view = FormView::of(&id, &controller);
        sessions.insert(
            id,
            SessionEntry {
                controller: Arc::new(Mutex::new(controller)),
                last_seen: now,
            },
        );
        Ok(view)
    }

    /// Drop a session. A delivery already in flight still completes against its own handle.
    pub fn close(&self, id: &SessionId) -> Result<(), SessionError> {
        let mut sessions = self.entries()?;
        match sessions.remove(id) {
            Some(_) => {
                debug!(session_id = %id, "form session closed");
                Ok(())
            }
            None => Err(SessionError::NotFound(id.clone())),
        }
    }

    /// Remove every session untouched for longer than the idle timeout.
    pub fn retire_idle(&self) -> Result<usize, SessionError> {
        let mut sessions = self.entries()?;
        Ok(retire_idle_entries(
            &mut sessions,
            Instant::now(),
            self.idle_timeout,
        ))
    }

    pub fn len(&self) -> usize {
        self.sessions
            .lock()
            .map(|sessions| sessions.len())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up a session's controller and mark the session as recently used.
    pub(crate) fn controller(&self, id: &SessionId) -> Result<SharedController, SessionError> {
        let mut sessions = self.entries()?;
        let entry = sessions
            .get_mut(id)
            .ok_or_else(|| SessionError::NotFound(id.clone()))?;
        entry.last_seen = Instant::now();
        Ok(entry.controller.clone())
    }

    pub fn view(&self, id: &SessionId) -> Result<FormView, SessionError> {
        let controller = self.controller(id)?;
        let guard = lock(&controller)?;
        Ok(FormView::of(id, &guard))
    }

    /// Run `edit` against the session's controller and return its result with a fresh view.
    pub fn with_controller<T, F>(
        &self,
        id: &SessionId,
        edit: F,
    ) -> Result<(T, FormView), SessionError>
    where
        F: FnOnce(&mut ApplicationFormController) -> T,
    {
        let controller = self.controller(id)?;
        let mut guard = lock(&controller)?;
        let result = edit(&mut *guard);
        Ok((result, FormView::of(id, &guard)))
    }

    fn entries(&self) -> Result<MutexGuard<'_, HashMap<SessionId, SessionEntry>>, SessionError> {
        self.sessions.lock().map_err(|_| SessionError::Unavailable)
    }
}

fn retire_idle_entries(
    sessions: &mut HashMap<SessionId, SessionEntry>,
    now: Instant,
    idle_timeout: Duration,
) -> usize {
    let before = sessions.len();
    sessions.retain(|_, entry| now.saturating_duration_since(entry.last_seen) < idle_timeout);
    let retired = before - sessions.len();
    if retired > 0 {
        debug!(retired, remaining = sessions.len(), "retired idle form sessions");
    }
    retired
}

pub(crate) fn lock(
    controller: &Mutex<ApplicationFormController>,
) -> Result<MutexGuard<'_, ApplicationFormController>, SessionError> {
    controller.lock().map_err(|_| SessionError::Unavailable)
}
