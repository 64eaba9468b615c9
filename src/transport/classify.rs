//! Retry eligibility for transfer failures

use super::TransferError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a transfer failure is worth retrying
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// Timeouts and TLS trouble, likely to clear up on a second attempt
    Transient,
    /// Everything else
    Permanent,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorClass::Transient => write!(f, "transient"),
            ErrorClass::Permanent => write!(f, "permanent"),
        }
    }
}

const TRANSIENT_MARKERS: &[&str] = &["timeout", "tls"];

/// Classify a transfer outcome. `None` means there was no error.
///
/// A classification reported by the transport wins; otherwise the message is
/// inspected with [`classify_message`].
pub fn classify(error: Option<&TransferError>) -> Option<ErrorClass> {
    error.map(|e| e.kind.unwrap_or_else(|| classify_message(&e.message)))
}

/// Message heuristic for transports without structured errors.
///
/// Any mention of TLS counts as transient, including local TLS configuration
/// mistakes.
pub fn classify_message(message: &str) -> ErrorClass {
    let message = message.to_lowercase();
    if TRANSIENT_MARKERS.iter().any(|m| message.contains(m)) {
        ErrorClass::Transient
    } else {
        ErrorClass::Permanent
    }
}

/// True only for transient failures
pub fn is_retriable(error: Option<&TransferError>) -> bool {
    classify(error) == Some(ErrorClass::Transient)
}

/// Whether the failure was a timeout, as flagged by the transport or named in the text
pub fn indicates_timeout(error: &TransferError) -> bool {
    error.timed_out || error.message.to_lowercase().contains("timeout")
}
