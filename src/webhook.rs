use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::engine::{Completer, SessionContext, VerificationEngine, VerificationResult};
use crate::error::VerificationError;
use crate::request::VerificationRequest;

/// Sessions waiting for a result delivered over the webhook, keyed by session id.
#[derive(Default)]
pub struct CompletionRegistry {
    pending: Mutex<HashMap<String, Completer>>,
}

impl CompletionRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Park `completer` under `session_id`. A session id that is already
    /// pending is rejected so one remote result cannot resolve two sessions.
    pub fn register(&self, session_id: &str, completer: Completer) -> Result<(), VerificationError> {
        let mut pending = self.lock();
        pending.retain(|_, c| !c.is_completed());
        if pending.contains_key(session_id) {
            return Err(VerificationError::Failed(format!(
                "session {} is already awaiting a webhook result",
                session_id
            )));
        }
        pending.insert(session_id.to_string(), completer);
        tracing::debug!(session_id, pending = pending.len(), "Registered webhook session");
        Ok(())
    }

    /// Deliver the result for `session_id`. Returns `false` for unknown or
    /// already resolved sessions.
    pub fn complete(&self, session_id: &str, result: VerificationResult) -> bool {
        let completer = self.lock().remove(session_id);
        match completer {
            Some(completer) => {
                let delivered = completer.complete(result);
                tracing::debug!(session_id, delivered, "Webhook result received");
                delivered
            }
            None => {
                tracing::warn!(session_id, "Webhook result for unknown or expired session");
                false
            }
        }
    }

    /// Number of sessions still waiting. Sessions resolved through another
    /// path (user dismissal, timeout) are not counted.
    pub fn pending_count(&self) -> usize {
        let mut pending = self.lock();
        pending.retain(|_, c| !c.is_completed());
        pending.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Completer>> {
        self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Engine adapter for verification flows that run remotely and report their
/// outcome to the host's webhook.
pub struct WebhookEngine {
    registry: Arc<CompletionRegistry>,
}

impl WebhookEngine {
    pub fn new(registry: Arc<CompletionRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl VerificationEngine for WebhookEngine {
    async fn initialize(
        &self,
        request: &VerificationRequest,
        ctx: &SessionContext,
        completer: Completer,
    ) -> Result<(), VerificationError> {
        self.registry.register(ctx.session_id(), completer)?;
        let webhook_url = match request {
            VerificationRequest::Params(params) => params.webhook_url.as_deref(),
            VerificationRequest::Url(_) => None,
        };
        tracing::info!(
            session_id = %ctx.session_id(),
            webhook_url = webhook_url.unwrap_or("<host default>"),
            "Awaiting webhook result"
        );
        Ok(())
    }
}
