use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("search provider returned {status}")]
    Status { status: reqwest::StatusCode },

    #[error("html parse error: {0}")]
    HtmlParse(String),
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("webdriver {command} failed: {error}: {message}")]
    WebDriver {
        command: &'static str,
        error: String,
        message: String,
    },

    #[error("unexpected webdriver response to {command}: {details}")]
    UnexpectedResponse {
        command: &'static str,
        details: String,
    },
}

#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("completion service returned {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("completion response decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("completion response had no content")]
    EmptyResponse,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("invalid response from {backend}: {details}")]
    BackendResponse { backend: String, details: String },

    #[error("invalid store configuration: {0}")]
    InvalidConfig(String),

    #[error("request signing failed: {0}")]
    Signing(String),
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("source url has no host: {0}")]
    InvalidSourceUrl(String),

    #[error("document error: {0}")]
    Document(#[from] DocumentError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Failure that stopped a research run early.
#[derive(Debug, Error)]
pub enum ResearchError {
    #[error("search for '{keyword}' failed: {source}")]
    Search {
        keyword: String,
        #[source]
        source: SearchError,
    },

    #[error("summarizing {url} for '{keyword}' failed: {source}")]
    Summarize {
        keyword: String,
        url: String,
        #[source]
        source: SummarizeError,
    },

    #[error("archiving {url} for '{keyword}' failed: {source}")]
    Archive {
        keyword: String,
        url: String,
        #[source]
        source: ArchiveError,
    },
}
