use thiserror::Error;

/// Why a single fetch of the signal list produced nothing usable.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Backend answered HTTP {0}")]
    Status(u16),
    #[error("Malformed signal payload: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("Invalid upstream url {url:?}: {source}")]
    InvalidUpstream {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Path {0} is not routed by any proxy rule")]
    Unrouted(String),
}
