use std::sync::Arc;

use crate::engine::{Completer, SessionContext};
use crate::error::VerificationError;

/// Handle to a modal surface attached by a [`DisplayHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u64);

/// The host application's display.
///
/// `present` attaches the verification surface to the active window and hands
/// it the session's completer so user dismissal can be reported. It fails with
/// `PresentationUnavailable` when the host has no active window.
pub trait DisplayHost: Send + Sync {
    fn present(
        &self,
        ctx: &SessionContext,
        completer: Completer,
    ) -> Result<SurfaceId, VerificationError>;

    fn dismiss(&self, surface: SurfaceId);
}

/// Owns one presented surface and dismisses it exactly once, either through
/// [`Presentation::release`] or on drop.
pub struct Presentation {
    host: Arc<dyn DisplayHost>,
    surface: Option<SurfaceId>,
    session_id: String,
}

impl Presentation {
    pub fn acquire(
        host: Arc<dyn DisplayHost>,
        ctx: &SessionContext,
        completer: Completer,
    ) -> Result<Self, VerificationError> {
        let surface = host.present(ctx, completer)?;
        tracing::debug!(session_id = %ctx.session_id(), surface = surface.0, "Presented verification surface");
        Ok(Self {
            host,
            surface: Some(surface),
            session_id: ctx.session_id().to_string(),
        })
    }

    pub fn release(mut self) {
        self.dismiss();
    }

    fn dismiss(&mut self) {
        if let Some(surface) = self.surface.take() {
            self.host.dismiss(surface);
            tracing::debug!(session_id = %self.session_id, surface = surface.0, "Dismissed verification surface");
        }
    }
}

impl Drop for Presentation {
    fn drop(&mut self) {
        self.dismiss();
    }
}
