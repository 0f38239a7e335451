//! Runtime for executing reasoning runs
//!
//! One run at a time per service. The `RunHub` holds the busy flag, the
//! snapshot of the current run and the broadcast channel SSE clients
//! subscribe to.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::{ConversationDriver, Session};
pub use traits::StepSource;

use crate::agent::Step;
use crate::credential::{CredentialError, CredentialResolver, CredentialSource};
use crate::state_machine::{RunContext, RunState};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, RwLock};

const BROADCAST_CAPACITY: usize = 128;

/// Events sent to SSE clients
#[derive(Debug, Clone)]
pub enum SseEvent {
    Init {
        snapshot: RunSnapshot,
    },
    RunStarted {
        run_id: String,
        query: String,
    },
    StateChange {
        run_id: String,
        state: RunState,
    },
    Step {
        run_id: String,
        index: usize,
        step: Step,
    },
    Error {
        run_id: String,
        message: String,
    },
    RunDone {
        run_id: String,
        state: RunState,
        steps: usize,
    },
}

/// What a client sees of the current (or most recent) run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSnapshot {
    pub run_id: Option<String>,
    pub query: Option<String>,
    pub steps: Vec<Step>,
    pub state: RunState,
    /// Last reported error; a newer one overwrites it
    pub error: Option<String>,
    pub busy: bool,
}

impl RunSnapshot {
    fn apply(&mut self, event: &SseEvent) {
        match event {
            SseEvent::Init { .. } => {}
            SseEvent::RunStarted { run_id, query } => {
                *self = RunSnapshot {
                    run_id: Some(run_id.clone()),
                    query: Some(query.clone()),
                    busy: true,
                    ..RunSnapshot::default()
                };
            }
            SseEvent::StateChange { state, .. } => self.state = state.clone(),
            SseEvent::Step { step, .. } => self.steps.push(step.clone()),
            SseEvent::Error { message, .. } => self.error = Some(message.clone()),
            SseEvent::RunDone { state, .. } => {
                self.state = state.clone();
                self.busy = false;
            }
        }
    }
}

/// Shared run status: busy flag, snapshot and event fan-out
#[derive(Clone)]
pub struct RunHub {
    broadcast_tx: broadcast::Sender<SseEvent>,
    snapshot: Arc<RwLock<RunSnapshot>>,
    busy: Arc<AtomicBool>,
}

impl RunHub {
    pub fn new() -> Self {
        let (broadcast_tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            broadcast_tx,
            snapshot: Arc::new(RwLock::new(RunSnapshot::default())),
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Claim the hub for a new run. Returns false if one is in progress.
    pub fn try_begin(&self) -> bool {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Release the busy flag; idempotent
    pub fn finish(&self) {
        self.busy.store(false, Ordering::Release);
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Fold the event into the snapshot, then broadcast it
    pub async fn publish(&self, event: SseEvent) {
        {
            let mut snapshot = self.snapshot.write().await;
            snapshot.apply(&event);
        }
        if matches!(event, SseEvent::RunDone { .. }) {
            self.finish();
        }
        // No subscribers is fine
        let _ = self.broadcast_tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SseEvent> {
        self.broadcast_tx.subscribe()
    }

    pub async fn snapshot(&self) -> RunSnapshot {
        let mut snapshot = self.snapshot.read().await.clone();
        snapshot.busy = self.is_busy();
        snapshot
    }
}

impl Default for RunHub {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("Query must not be empty")]
    EmptyQuery,
    #[error("A run is already in progress")]
    Busy,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Settings cannot change while a run is in progress")]
    Busy,
    #[error(transparent)]
    Credential(#[from] CredentialError),
}

/// Manager for the single active run
pub struct RuntimeManager {
    source: Arc<dyn StepSource>,
    credentials: Arc<CredentialResolver>,
    max_steps: Option<usize>,
    hub: RunHub,
}

impl RuntimeManager {
    pub fn new(
        source: Arc<dyn StepSource>,
        credentials: Arc<CredentialResolver>,
        max_steps: Option<usize>,
    ) -> Self {
        Self {
            source,
            credentials,
            max_steps,
            hub: RunHub::new(),
        }
    }

    /// Start a run in the background and return its id
    pub async fn start_run(&self, query: &str) -> Result<String, RunError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(RunError::EmptyQuery);
        }
        if !self.hub.try_begin() {
            return Err(RunError::Busy);
        }

        let run_id = uuid::Uuid::new_v4().to_string();
        self.hub
            .publish(SseEvent::RunStarted {
                run_id: run_id.clone(),
                query: query.to_string(),
            })
            .await;

        let driver = ConversationDriver::new(
            RunContext::new(run_id.clone(), self.max_steps),
            Session::new(query),
            self.source.clone(),
            self.hub.clone(),
        );
        let hub = self.hub.clone();
        tokio::spawn(async move {
            let outcome = driver.run().await;
            // Terminal runs released the flag with RunDone; a later start may own it now
            if !outcome.state.is_terminal() {
                tracing::error!(state = outcome.state.name(), "Run ended in a non-terminal state");
                hub.finish();
            }
        });

        Ok(run_id)
    }

    pub fn is_busy(&self) -> bool {
        self.hub.is_busy()
    }

    pub async fn snapshot(&self) -> RunSnapshot {
        self.hub.snapshot().await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SseEvent> {
        self.hub.subscribe()
    }

    pub fn credential_source(&self) -> CredentialSource {
        self.credentials.source()
    }

    pub fn store_credential(&self, api_key: &str) -> Result<(), SettingsError> {
        self.with_settings_lock(|| Ok(self.credentials.store(api_key)?))
    }

    /// Returns whether a stored key was removed
    pub fn clear_credential(&self) -> Result<bool, SettingsError> {
        self.with_settings_lock(|| Ok(self.credentials.clear()?))
    }

    /// Hold the busy flag for the duration of a settings write so no run
    /// can start with a half-changed credential
    fn with_settings_lock<T>(
        &self,
        write: impl FnOnce() -> Result<T, SettingsError>,
    ) -> Result<T, SettingsError> {
        if !self.hub.try_begin() {
            return Err(SettingsError::Busy);
        }
        let result = write();
        self.hub.finish();
        result
    }
}
