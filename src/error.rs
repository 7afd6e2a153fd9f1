use thiserror::Error;
use tide::StatusCode;

/**
 * Everything that can go wrong while serving a poll request
 */
#[derive(Debug, Error)]
pub enum PollError {
    #[error("unknown option id `{0}`")]
    InvalidOption(String),
    #[error("database unavailable: {0}")]
    DependencyUnavailable(#[source] sqlx::Error),
    #[error("database error: {0}")]
    Internal(#[source] sqlx::Error),
    #[error("bad configuration for {name}: {reason}")]
    Config { name: &'static str, reason: String },
}

/**
 * Which request the error happened in, the client-facing wording differs
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    Vote,
    Results,
}

impl PollError {
    pub fn status(&self) -> StatusCode {
        match self {
            PollError::InvalidOption(_) => StatusCode::BadRequest,
            _ => StatusCode::InternalServerError,
        }
    }

    /**
     * The message sent back to the client. Causes stay in the server log.
     */
    pub fn public_message(&self, op: Operation) -> &'static str {
        match (self, op) {
            (PollError::InvalidOption(_), _) => "Invalid option ID",
            (PollError::DependencyUnavailable(_), _) => "Database connection failed",
            (_, Operation::Vote) => "Failed to record vote",
            (_, Operation::Results) => "Failed to fetch results",
        }
    }
}
