//! Host-side facade for Reclaim identity verification.
//!
//! Build a [`VerificationRequest`], hand it to a [`Verifier`], and await a
//! [`ClaimCreationProof`] or a [`VerificationError`]. The verification engine
//! and the host display are injected through the [`VerificationEngine`] and
//! [`DisplayHost`] traits.

pub mod config;
pub mod display;
pub mod engine;
pub mod error;
pub mod request;
pub mod routes;
pub mod session;
pub mod types;
pub mod webhook;

#[cfg(test)]
mod testing;

pub use config::{AppConfigStore, EnvConfig, ManifestConfig, MapConfig, VerifierSettings};
pub use display::{DisplayHost, Presentation, SurfaceId};
pub use engine::{
    completion_channel, ClaimCreationProof, Completer, CompletionReceiver, SessionContext,
    VerificationEngine, VerificationResult,
};
pub use error::{ErrorKind, VerificationError};
pub use request::{RequestParams, SessionInformation, VerificationOptions, VerificationRequest};
pub use session::{SessionState, VerificationSession, Verifier};
pub use webhook::{CompletionRegistry, WebhookEngine};
