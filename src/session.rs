use std::sync::Arc;

use tokio::sync::watch;

use crate::config::VerifierSettings;
use crate::display::{DisplayHost, Presentation};
use crate::engine::{completion_channel, SessionContext, VerificationEngine, VerificationResult};
use crate::error::VerificationError;
use crate::request::VerificationRequest;

/// Lifecycle of one verification attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    Initializing,
    Presenting,
    Completed,
    Failed,
    Dismissed,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Dismissed)
    }
}

/// Entry point for hosts: owns the engine and display seams and starts an
/// independent session per call.
#[derive(Clone)]
pub struct Verifier {
    engine: Arc<dyn VerificationEngine>,
    display: Arc<dyn DisplayHost>,
    settings: VerifierSettings,
}

impl Verifier {
    pub fn new(engine: Arc<dyn VerificationEngine>, display: Arc<dyn DisplayHost>) -> Self {
        Self {
            engine,
            display,
            settings: VerifierSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: VerifierSettings) -> Self {
        self.settings = settings;
        self
    }

    /// A fresh session in `Created` state, for callers that want to observe it.
    pub fn session(&self) -> VerificationSession {
        VerificationSession::new(self.engine.clone(), self.display.clone(), self.settings.clone())
    }

    /// Run one verification attempt to its terminal proof or error.
    ///
    /// The presented surface is always dismissed before this returns.
    pub async fn start_verification(&self, request: VerificationRequest) -> VerificationResult {
        self.session().run(request).await
    }
}

/// Drives exactly one verification attempt. Terminal states are final and
/// nothing is retried here.
pub struct VerificationSession {
    engine: Arc<dyn VerificationEngine>,
    display: Arc<dyn DisplayHost>,
    settings: VerifierSettings,
    state: watch::Sender<SessionState>,
}

impl VerificationSession {
    pub fn new(
        engine: Arc<dyn VerificationEngine>,
        display: Arc<dyn DisplayHost>,
        settings: VerifierSettings,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::Created);
        Self {
            engine,
            display,
            settings,
            state,
        }
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub async fn run(self, request: VerificationRequest) -> VerificationResult {
        let ctx = SessionContext::resolve(&request);
        self.transition(SessionState::Initializing, &ctx);

        let (completer, receiver) = completion_channel(ctx.session_id());

        // Engine preparation runs alongside the attach step.
        let init = {
            let engine = self.engine.clone();
            let ctx = ctx.clone();
            let completer = completer.clone();
            tokio::spawn(async move {
                if let Err(e) = engine.initialize(&request, &ctx, completer.clone()).await {
                    tracing::warn!(session_id = %ctx.session_id(), error = %e, "Engine initialization failed");
                    completer.complete(Err(e));
                }
            })
        };

        self.transition(SessionState::Presenting, &ctx);
        let presentation = match Presentation::acquire(self.display.clone(), &ctx, completer) {
            Ok(presentation) => presentation,
            Err(e) => {
                init.abort();
                self.transition(SessionState::Failed, &ctx);
                return Err(e);
            }
        };

        // The result is received on this task, which owns the presentation,
        // so release happens here regardless of where the engine completed.
        let outcome = match self.settings.session_timeout {
            Some(limit) => match tokio::time::timeout(limit, receiver.recv()).await {
                Ok(result) => result,
                Err(_) => {
                    init.abort();
                    tracing::warn!(
                        session_id = %ctx.session_id(),
                        timeout = ?limit,
                        "Verification session timed out"
                    );
                    Err(VerificationError::SessionExpired)
                }
            },
            None => receiver.recv().await,
        };

        presentation.release();

        let terminal = match &outcome {
            Ok(_) => SessionState::Completed,
            Err(VerificationError::Dismissed) => SessionState::Dismissed,
            Err(_) => SessionState::Failed,
        };
        self.transition(terminal, &ctx);

        if let Err(e) = &outcome {
            tracing::info!(session_id = %ctx.session_id(), kind = ?e.kind(), "Verification ended without proof: {}", e);
        }

        outcome
    }

    fn transition(&self, next: SessionState, ctx: &SessionContext) {
        tracing::info!(
            session_id = %ctx.session_id(),
            provider_id = ctx.provider_id.as_deref().unwrap_or("<url>"),
            state = ?next,
            "Verification session transition"
        );
        self.state.send_replace(next);
    }
}
