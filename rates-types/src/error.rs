//! Error types for the rates service.

/// Domain-level errors (validation failures at the boundary).
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("parameter {0:?} doesn't match pattern EUR/USD")]
    InvalidPairFormat(String),

    #[error("unexpected iso code {code}")]
    UnknownIsoCode { code: String, valid: Vec<String> },

    #[error("Invalid rate: {0}")]
    InvalidRate(String),

    #[error("Invalid period {0:?}, expected one of 15m, 1h, 1d, 1w, 1mo")]
    InvalidPeriod(String),
}

/// Upstream rate provider failures.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("provider request timed out")]
    Timeout,

    #[error("provider unavailable: {0}")]
    Unavailable(String),

    #[error("unexpected provider response: {0}")]
    UnexpectedResponse(String),
}

/// Repository-level errors (data access failures).
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("storage call timed out")]
    Timeout,

    /// Nothing is waiting in the staging queue. Expected, not an outage.
    #[error("queue is empty")]
    EmptyQueue,
}

/// Application-level errors (for HTTP responses).
///
/// Maps cleanly to HTTP status codes.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("unexpected iso code {code}")]
    UnknownIsoCode { code: String, valid: Vec<String> },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("queue is empty")]
    EmptyQueue,

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::UnknownIsoCode { code, valid } => AppError::UnknownIsoCode { code, valid },
            e @ (DomainError::InvalidPairFormat(_)
            | DomainError::InvalidRate(_)
            | DomainError::InvalidPeriod(_)) => AppError::BadRequest(e.to_string()),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Domain(e) => e.into(),
            RepoError::EmptyQueue => AppError::EmptyQueue,
            RepoError::Database(e) => AppError::Internal(e),
            RepoError::Transaction(e) => AppError::Internal(e),
            RepoError::Timeout => AppError::Internal("storage call timed out".into()),
        }
    }
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        AppError::Provider(err.to_string())
    }
}
