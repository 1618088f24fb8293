use thiserror::Error;

/// Errors from talking to the usuarios API.
///
/// `Display` is the text shown to the user, either on the full-screen load
/// error or in a failure notification.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Non-2xx status without a usable message (list requests).
    #[error("HTTP error! status: {status}")]
    Http { status: u16 },

    /// Non-2xx status on a mutation; `message` comes from the body or a generic fallback.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// Network unreachable, timeout, or any other transport failure.
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// Body could not be decoded into the expected shape.
    #[error("Failed to parse response: {0}")]
    Decode(String),

    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status } | ApiError::Rejected { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            ApiError::Decode(_) | ApiError::InvalidUrl(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
