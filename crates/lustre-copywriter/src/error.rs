use thiserror::Error;

/// Errors returned by the copywriting client.
#[derive(Debug, Error)]
pub enum CopywriterError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The completions endpoint answered with a non-2xx status.
    #[error("completions API returned {status}: {message}")]
    ApiError { status: u16, message: String },

    /// The model returned no usable text.
    #[error("completion contained no text")]
    EmptyCompletion,

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid base URL '{0}'")]
    InvalidBaseUrl(String),
}
