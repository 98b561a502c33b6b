use thiserror::Error;

pub type Result<T> = std::result::Result<T, RepodocError>;

/// Failures of the external text-generation service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    /// Temporary overload of the service (HTTP 503). Retryable.
    #[error("generation service overloaded (503): {0}")]
    Overloaded(String),

    /// Quota or rate limit reached (HTTP 429). Never retried.
    #[error("generation quota exceeded (429): {0}")]
    QuotaExceeded(String),

    #[error("generation request failed: {0}")]
    Request(String),

    #[error("invalid generation response: {0}")]
    InvalidResponse(String),

    #[error("generation service did not respond after {attempts} attempts: {last_error}")]
    RetryExhausted { attempts: u32, last_error: String },
}

impl GenerationError {
    /// Classify a free-form error message by its status-like signature.
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();
        if lower.contains("429") || lower.contains("quota") {
            Self::QuotaExceeded(message)
        } else if lower.contains("503") || lower.contains("overloaded") {
            Self::Overloaded(message)
        } else {
            Self::Request(message)
        }
    }

    /// Only the overload signal is worth another attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Overloaded(_))
    }
}

#[derive(Debug, Error)]
pub enum RepodocError {
    #[error("a prompt is required")]
    EmptyPrompt,

    #[error("no repository reference (owner/name) found in: {0:?}")]
    InvalidRepository(String),

    #[error("repository {0} not found or access denied")]
    RepositoryNotFound(String),

    #[error("failed to fetch the file tree of {0}")]
    TreeUnavailable(String),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("{0}")]
    Other(String),
}

impl RepodocError {
    /// Status code reported to clients for this failure.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::EmptyPrompt | Self::InvalidRepository(_) => 400,
            Self::RepositoryNotFound(_) | Self::TreeUnavailable(_) => 404,
            Self::Generation(GenerationError::QuotaExceeded(_)) => 429,
            Self::Generation(GenerationError::Overloaded(_))
            | Self::Generation(GenerationError::RetryExhausted { .. }) => 503,
            other => status_from_signature(&other.to_string()),
        }
    }

    /// Client-facing message. Well-known failure classes get a fixed text.
    pub fn user_message(&self) -> String {
        match self.status_code() {
            429 => "The daily request quota for the AI model has been exceeded. Please try again tomorrow or upgrade your plan.".to_string(),
            503 => "The AI model is busy right now. Please try again in a moment.".to_string(),
            404 => "Repository not found. Make sure the name is correct and the repository is public.".to_string(),
            _ => self.to_string(),
        }
    }
}

fn status_from_signature(message: &str) -> u16 {
    let lower = message.to_lowercase();
    if lower.contains("429") || lower.contains("quota") {
        429
    } else if lower.contains("503") || lower.contains("overloaded") {
        503
    } else if lower.contains("not found") {
        404
    } else {
        500
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_error_classification() {
        assert!(matches!(
            GenerationError::from_message("[503 Service Unavailable] The model is overloaded"),
            GenerationError::Overloaded(_)
        ));
        assert!(matches!(
            GenerationError::from_message("429 Too Many Requests"),
            GenerationError::QuotaExceeded(_)
        ));
        assert!(matches!(
            GenerationError::from_message("You exceeded your current Quota"),
            GenerationError::QuotaExceeded(_)
        ));
        assert!(matches!(
            GenerationError::from_message("connection reset"),
            GenerationError::Request(_)
        ));
    }

    #[test]
    fn test_only_overload_is_transient() {
        assert!(GenerationError::Overloaded("busy".into()).is_transient());
        assert!(!GenerationError::QuotaExceeded("quota".into()).is_transient());
        assert!(!GenerationError::Request("boom".into()).is_transient());
        assert!(!GenerationError::RetryExhausted { attempts: 3, last_error: "503".into() }.is_transient());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(RepodocError::EmptyPrompt.status_code(), 400);
        assert_eq!(RepodocError::InvalidRepository("hello".into()).status_code(), 400);
        assert_eq!(RepodocError::RepositoryNotFound("a/b".into()).status_code(), 404);
        assert_eq!(RepodocError::TreeUnavailable("a/b".into()).status_code(), 404);
        assert_eq!(
            RepodocError::from(GenerationError::QuotaExceeded("x".into())).status_code(),
            429
        );
        assert_eq!(
            RepodocError::from(GenerationError::Overloaded("x".into())).status_code(),
            503
        );
        assert_eq!(
            RepodocError::from(GenerationError::RetryExhausted { attempts: 3, last_error: "x".into() })
                .status_code(),
            503
        );
        assert_eq!(RepodocError::Other("something broke".into()).status_code(), 500);
    }

    #[test]
    fn test_untyped_errors_use_message_signature() {
        assert_eq!(RepodocError::Other("upstream said 429".into()).status_code(), 429);
        assert_eq!(RepodocError::Other("model overloaded".into()).status_code(), 503);
        assert_eq!(
            RepodocError::from(GenerationError::Request("status 503".into())).status_code(),
            503
        );
    }

    #[test]
    fn test_user_messages() {
        let err = RepodocError::RepositoryNotFound("a/b".into());
        assert!(err.user_message().starts_with("Repository not found"));

        let err = RepodocError::Other("plain failure".into());
        assert_eq!(err.user_message(), "plain failure");
    }
}
