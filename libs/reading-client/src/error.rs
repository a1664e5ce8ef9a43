use thiserror::Error;

/// Failures talking to the forum API.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server responded {status}: {message}")]
    Status { status: u16, message: String },

    #[error("unexpected response body: {0}")]
    Decode(String),

    #[error("not signed in")]
    Unauthenticated,

    #[error("invalid url: {0}")]
    Url(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;
