use thiserror::Error;

/// Failure of an external collaborator (classifier, embedder, catalog, directory).
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("intent classifier failed: {0}")]
    Classifier(String),
    #[error("embedding provider failed: {0}")]
    Embedding(String),
    #[error("service catalog failed: {0}")]
    Catalog(String),
    /// The directory answered with a non-success status. `message` is the
    /// directory's own user-facing text when it supplied one.
    #[error("directory rejected the request ({status}): {}", message.as_deref().unwrap_or("no message"))]
    Directory { status: u16, message: Option<String> },
    #[error("transport error: {0}")]
    Transport(String),
}

impl CollaboratorError {
    /// A refusal the user should see verbatim (duplicate booking, past date, ...).
    pub fn refusal_message(&self) -> Option<&str> {
        match self {
            CollaboratorError::Directory {
                status,
                message: Some(message),
            } if (400..500).contains(status) && !message.trim().is_empty() => Some(message),
            _ => None,
        }
    }

    /// True when the directory rejected the input itself (e.g. a wrong OTP),
    /// as opposed to being unreachable.
    pub fn is_rejection(&self) -> bool {
        matches!(self, CollaboratorError::Directory { status, .. } if (400..500).contains(status))
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SimilarityError {
    #[error("vector length mismatch: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
    #[error("internal engine error: {0}")]
    Internal(String),
}
