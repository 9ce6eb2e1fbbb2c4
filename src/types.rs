use serde::{Deserialize, Serialize};

use crate::engine::{ClaimCreationProof, VerificationResult};
use crate::error::{ErrorKind, VerificationError};

/// Body of `POST /sessions/:session_id/complete`. Exactly one of `proof` and
/// `error` must be present.
#[derive(Debug, Deserialize)]
pub struct CompletionPayload {
    pub proof: Option<serde_json::Value>,
    pub error: Option<ErrorBody>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl CompletionPayload {
    pub fn into_result(self) -> Result<VerificationResult, String> {
        match (self.proof, self.error) {
            (Some(proof), None) => Ok(Ok(ClaimCreationProof::new(proof))),
            (None, Some(error)) => Ok(Err(VerificationError::from_kind(error.kind, error.reason))),
            (Some(_), Some(_)) => Err("proof and error are mutually exclusive".to_string()),
            (None, None) => Err("one of proof or error is required".to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeliveryResponse {
    pub delivered: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub pending_sessions: usize,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
