use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Terminal failure of a verification attempt.
///
/// Every variant surfaces unchanged to the caller of
/// [`Verifier::start_verification`](crate::session::Verifier::start_verification).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    #[error("missing app configuration entry: {0}")]
    ConfigurationMissing(String),

    #[error("no active display context to present the verification surface")]
    PresentationUnavailable,

    #[error("verification was cancelled")]
    Cancelled,

    #[error("verification was dismissed by the user")]
    Dismissed,

    #[error("verification session expired")]
    SessionExpired,

    #[error("verification failed: {0}")]
    Failed(String),
}

/// Fieldless discriminant of [`VerificationError`], used on the webhook wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ConfigurationMissing,
    PresentationUnavailable,
    Cancelled,
    Dismissed,
    SessionExpired,
    Failed,
}

impl VerificationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ConfigurationMissing(_) => ErrorKind::ConfigurationMissing,
            Self::PresentationUnavailable => ErrorKind::PresentationUnavailable,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Dismissed => ErrorKind::Dismissed,
            Self::SessionExpired => ErrorKind::SessionExpired,
            Self::Failed(_) => ErrorKind::Failed,
        }
    }

    /// The diagnostic string carried by the error, if its kind has one.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::ConfigurationMissing(key) => Some(key.as_str()),
            Self::Failed(reason) => Some(reason.as_str()),
            _ => None,
        }
    }

    /// Rebuild an error from its wire form. A missing reason becomes an empty string.
    pub fn from_kind(kind: ErrorKind, reason: Option<String>) -> Self {
        match kind {
            ErrorKind::ConfigurationMissing => Self::ConfigurationMissing(reason.unwrap_or_default()),
            ErrorKind::PresentationUnavailable => Self::PresentationUnavailable,
            ErrorKind::Cancelled => Self::Cancelled,
            ErrorKind::Dismissed => Self::Dismissed,
            ErrorKind::SessionExpired => Self::SessionExpired,
            ErrorKind::Failed => Self::Failed(reason.unwrap_or_default()),
        }
    }

    /// Short message a host application shows to the end user.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Cancelled => "Cancelled",
            Self::Dismissed => "Cancelled by user",
            Self::SessionExpired => "Verification session expired, please try again",
            Self::PresentationUnavailable => "Could not open the verification screen",
            Self::ConfigurationMissing(_) => "Verification is not configured for this app",
            Self::Failed(_) => "Something went wrong",
        }
    }
}
