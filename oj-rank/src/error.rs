/// Fatal failures of the ranking pipeline. Any of these aborts the current
/// contest before a single byte of the report is written.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The session is invalid or expired; the caller has to log in again.
    #[error("authentication required: {0}")]
    Auth(String),
    /// Network or HTTP failure, or a payload that doesn't match the expected schema.
    #[error("transport error: {0}")]
    Transport(String),
    #[error("unknown rule type '{0}', must be one of: ACM, OI")]
    UnknownRuleType(String),
    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}
