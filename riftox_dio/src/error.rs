//! DIO error type.

use thiserror::Error;

/// Failure of a single controller exchange.
///
/// Every exchange returns `Result<_, DioError>`; callers decide whether a
/// failure skips a tick or aborts a sequence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DioError {
    /// Nothing came back before the read timeout.
    #[error("no reply to '{0}'")]
    Timeout(String),

    /// A reply arrived but could not be interpreted.
    #[error("malformed reply to '{command}': {reply:?}")]
    MalformedResponse { command: String, reply: String },

    /// The link itself failed (I/O error, lock misuse).
    #[error("DIO link failure: {0}")]
    LinkFailure(String),

    /// The configured TTY is missing or could not be opened.
    #[error("serial port '{port}' unavailable: {reason}")]
    PortUnavailable { port: String, reason: String },
}

impl DioError {
    pub(crate) fn malformed(command: &str, reply: &str) -> Self {
        Self::MalformedResponse {
            command: command.trim().to_string(),
            reply: reply.to_string(),
        }
    }
}
