use reqwest::StatusCode;
use tokio::task::JoinError;

/// All errors that can occur while talking to the Wargaming API or running the pipeline.
///
/// The variants are fine grained for logging; [`WotError::kind`] collapses them
/// into the closed set of failures a caller has to present.
#[derive(thiserror::Error, Debug)]
pub enum WotError {
    /// The backend rejected the application id (API key).
    #[error("invalid application id: {message}")]
    InvalidCredentials { message: String },

    /// A lookup did not produce exactly one exact match.
    #[error("no unique {what} matching `{query}` ({matches} exact matches)")]
    NotFound {
        what: &'static str,
        query: String,
        matches: usize,
    },

    /// The backend returned a structured error other than an invalid key.
    #[error("api error on {endpoint}: {message}")]
    Api { endpoint: String, message: String },

    /// The payload was readable but did not have the expected shape.
    #[error("unexpected payload from {endpoint}: {context}")]
    Malformed { endpoint: String, context: String },

    /// HTTP request failed (network, DNS, TLS, timeout, etc.).
    #[error("http request failed for {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },

    /// Server returned a status code that is neither success nor an API envelope.
    #[error("unexpected status {status} for {endpoint}")]
    UnexpectedStatus {
        endpoint: String,
        status: StatusCode,
    },

    /// Failed to read the response body as text.
    #[error("failed to read response body from {endpoint}: {source}")]
    ResponseBody {
        endpoint: String,
        source: reqwest::Error,
    },

    /// The HTTP client could not be initialized.
    #[error("failed to build http client: {source}")]
    ClientBuild { source: reqwest::Error },

    /// The run was cancelled between two steps.
    #[error("run was cancelled")]
    Cancelled,

    /// The background task panicked before producing a result.
    #[error("background run aborted: {reason}")]
    Aborted { reason: String },
}

/// The failure kinds a caller distinguishes when presenting an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum FailureKind {
    InvalidCredentials,
    NotFound,
    ApiError,
    TransportError,
    Cancelled,
    /// A bug or crash, not a condition the user can fix.
    Unexpected,
}

impl WotError {
    pub fn kind(&self) -> FailureKind {
        match self {
            WotError::InvalidCredentials { .. } => FailureKind::InvalidCredentials,
            WotError::NotFound { .. } => FailureKind::NotFound,
            WotError::Api { .. } | WotError::Malformed { .. } => FailureKind::ApiError,
            WotError::Http { .. }
            | WotError::UnexpectedStatus { .. }
            | WotError::ResponseBody { .. }
            | WotError::ClientBuild { .. } => FailureKind::TransportError,
            WotError::Cancelled => FailureKind::Cancelled,
            WotError::Aborted { .. } => FailureKind::Unexpected,
        }
    }

    /// Whether another attempt of the same request may succeed.
    pub(crate) fn is_transient(&self) -> bool {
        match self {
            WotError::Http { source, .. } => !source.is_builder(),
            WotError::UnexpectedStatus { status, .. } => status.is_server_error(),
            WotError::ResponseBody { .. } => true,
            _ => false,
        }
    }
}

impl From<JoinError> for WotError {
    fn from(err: JoinError) -> Self {
        if err.is_cancelled() {
            WotError::Cancelled
        } else {
            WotError::Aborted {
                reason: err.to_string(),
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, WotError>;

/// Errors raised by the reward calculation.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RewardError {
    /// There is nobody to split the gold between.
    #[error("cannot split gold over an empty roster")]
    EmptyRoster,

    /// Every member has zero battles, so gold per battle is undefined.
    #[error("cannot split gold: {members} members played zero battles in total")]
    NoBattles { members: usize },
}

/// Errors raised while writing the reward table.
#[derive(thiserror::Error, Debug)]
pub enum ExportError {
    #[error("failed to write csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to create export file {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_panicked_task_is_unexpected() {
        let join_err = tokio::spawn(async { panic!("boom") }).await.unwrap_err();

        let err = WotError::from(join_err);
        assert!(matches!(err, WotError::Aborted { .. }));
        assert_eq!(err.kind(), FailureKind::Unexpected);
        assert!(err.to_string().contains("boom"));
    }

    #[tokio::test]
    async fn test_aborted_task_is_cancelled() {
        let task = tokio::spawn(std::future::pending::<()>());
        task.abort();
        let join_err = task.await.unwrap_err();

        let err = WotError::from(join_err);
        assert!(matches!(err, WotError::Cancelled));
        assert_eq!(err.kind(), FailureKind::Cancelled);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(FailureKind::InvalidCredentials.to_string(), "InvalidCredentials");
        assert_eq!(FailureKind::Unexpected.to_string(), "Unexpected");
    }
}
