//! Response envelopes shared by the analysis endpoints.

use serde::Serialize;

use crate::pipeline::DecodeFailure;

/// Body returned with HTTP 200 when the model reply could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SoftError {
    pub error: String,
    pub raw_response: String,
}

impl From<DecodeFailure> for SoftError {
    fn from(failure: DecodeFailure) -> Self {
        Self {
            error: failure.reason,
            raw_response: failure.raw_text,
        }
    }
}

/// Either the endpoint's shaped result or a [`SoftError`].
///
/// Serialized untagged so clients see the bare object in both cases.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Outcome<T> {
    Ready(T),
    Failed(SoftError),
}

impl<T> From<DecodeFailure> for Outcome<T> {
    fn from(failure: DecodeFailure) -> Self {
        Self::Failed(failure.into())
    }
}
