//! Local fallback for failed RPC sessions.
//!
//! When the transport, codec, or timeout path fails, the commit message is
//! still produced: either by classifying the diff locally or, with
//! fallback disabled, as a bounded failure string. Control never reaches
//! the caller as an error.

use crate::classifier::{self, FALLBACK_SUMMARY_CHARS};
use crate::client::ClientError;

/// Resolve a failed session into a user-visible string.
pub fn resolve(diff: &str, error: &ClientError, fallback_enabled: bool) -> String {
    if fallback_enabled {
        tracing::debug!("Using local classification fallback");
        return classifier::commit_message(diff, FALLBACK_SUMMARY_CHARS);
    }

    match error {
        ClientError::Timeout(_) => "Failed to generate commit message (timeout)".to_string(),
        other => format!("Failed to generate commit message: {other}"),
    }
}
