use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Server responded with HTTP {0}")]
    HttpStatus(u16),

    #[error("Page redirects elsewhere ({0}); submit the final URL instead")]
    Redirected(String),

    #[error("Unsupported content type: {0}")]
    UnsupportedContentType(String),

    #[error("Page is larger than {limit} bytes")]
    TooLarge { limit: usize },
}
