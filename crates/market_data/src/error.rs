use thiserror::Error;

/// Anything that kept a feed from producing data for one symbol this cycle.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("API error {code}: {msg}")]
    Api { code: i64, msg: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("no market mapping for symbol {0}")]
    UnknownSymbol(String),
}
