pub type Result<T> = std::result::Result<T, FailoverError>;

#[derive(Debug, thiserror::Error)]
pub enum FailoverError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("{operation} failed: {message}")]
    Upstream {
        operation: &'static str,
        message: String,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("expected exactly one {what}, found {count}")]
    Ambiguous { what: String, count: usize },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("confirmation prompt failed: {0}")]
    Prompt(String),
}

impl FailoverError {
    pub fn upstream(operation: &'static str, message: impl Into<String>) -> Self {
        FailoverError::Upstream {
            operation,
            message: message.into(),
        }
    }

    /// Appends the region to lookup and upstream errors.
    pub fn in_region(self, region: &str) -> Self {
        match self {
            FailoverError::NotFound(what) => {
                FailoverError::NotFound(format!("{} in {}", what, region))
            }
            FailoverError::Ambiguous { what, count } => FailoverError::Ambiguous {
                what: format!("{} in {}", what, region),
                count,
            },
            FailoverError::Upstream { operation, message } => FailoverError::Upstream {
                operation,
                message: format!("{} (region {})", message, region),
            },
            other => other,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, FailoverError::NotFound(_))
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(self, FailoverError::Ambiguous { .. })
    }
}
