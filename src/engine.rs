use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::error::VerificationError;
use crate::request::{SessionInformation, VerificationRequest};

/// Terminal success value: the engine's opaque verification response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimCreationProof {
    pub response: serde_json::Value,
}

impl ClaimCreationProof {
    pub fn new(response: serde_json::Value) -> Self {
        Self { response }
    }
}

pub type VerificationResult = Result<ClaimCreationProof, VerificationError>;

/// Identity of one verification session, passed into every engine and display call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub session: SessionInformation,
    pub provider_id: Option<String>,
    pub app_id: Option<String>,
}

impl SessionContext {
    /// Resolve the session identity for `request`, generating a session id and
    /// a millisecond timestamp where the caller left them empty. The signature
    /// is left to the engine.
    pub fn resolve(request: &VerificationRequest) -> Self {
        let mut session = request.session().cloned().unwrap_or_default();
        if session.session_id.is_empty() {
            session.session_id = uuid::Uuid::new_v4().to_string();
        }
        if session.timestamp.is_empty() {
            session.timestamp = chrono::Utc::now().timestamp_millis().to_string();
        }

        Self {
            session,
            provider_id: request.provider_id().map(str::to_string),
            app_id: request.app_id().map(str::to_string),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session.session_id
    }
}

/// Producer half of a session's single-shot result channel.
///
/// Cloneable so both the engine and the display host can hold it; only the
/// first `complete` call is delivered.
#[derive(Clone)]
pub struct Completer {
    session_id: Arc<str>,
    sender: Arc<Mutex<Option<oneshot::Sender<VerificationResult>>>>,
}

/// Consumer half, awaited by the session controller.
pub struct CompletionReceiver {
    receiver: oneshot::Receiver<VerificationResult>,
}

pub fn completion_channel(session_id: &str) -> (Completer, CompletionReceiver) {
    let (tx, rx) = oneshot::channel();
    (
        Completer {
            session_id: Arc::from(session_id),
            sender: Arc::new(Mutex::new(Some(tx))),
        },
        CompletionReceiver { receiver: rx },
    )
}

impl Completer {
    /// Deliver the terminal result. Returns `false` if a result was already
    /// delivered or the session is no longer waiting.
    pub fn complete(&self, result: VerificationResult) -> bool {
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();

        let Some(sender) = sender else {
            tracing::warn!(
                session_id = %self.session_id,
                "Ignoring completion for already completed session"
            );
            return false;
        };

        if sender.send(result).is_err() {
            tracing::debug!(
                session_id = %self.session_id,
                "Session stopped waiting before completion arrived"
            );
            return false;
        }
        true
    }

    /// True once a result was delivered or the session stopped waiting for one
    /// (timeout, presentation failure, dropped caller).
    pub fn is_completed(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .as_ref()
            .map_or(true, |sender| sender.is_closed())
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

impl CompletionReceiver {
    /// Wait for the terminal result. If every `Completer` is dropped without
    /// completing, the session fails.
    pub async fn recv(self) -> VerificationResult {
        self.receiver.await.unwrap_or_else(|_| {
            Err(VerificationError::Failed(
                "verification engine dropped the session without completing".to_string(),
            ))
        })
    }
}

/// The external verification engine.
///
/// `initialize` prepares verification state for one session and returns; the
/// engine later reports the outcome exactly once through `completer`. An `Err`
/// from `initialize` is delivered to the caller as the session's result.
#[async_trait]
pub trait VerificationEngine: Send + Sync {
    async fn initialize(
        &self,
        request: &VerificationRequest,
        ctx: &SessionContext,
        completer: Completer,
    ) -> Result<(), VerificationError>;
}
