//! Error types of the definition update pipeline.
//!
//! Two families matter to callers: [`RetrievalError`] (the definition could not
//! be loaded or understood) and [`PublishError`] (downstream refused the new
//! route set). [`UpdateError`] wraps both for one service's update attempt.

use thiserror::Error;

/// Failure to load raw definition text.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("'{0}' is not a valid file path")]
    InvalidFilePath(String),

    #[error("unsupported URI scheme '{0}'")]
    UnsupportedScheme(String),
}

/// Failure to turn definition text into a document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid YAML/JSON: {0}")]
    Syntax(String),

    #[error("document root must be a mapping")]
    NotAMapping,

    #[error("document declares neither an 'openapi' nor a 'swagger' version")]
    MissingVersion,

    #[error("document has no 'paths' mapping")]
    MissingPaths,
}

/// The definition of a service could not be retrieved.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("invalid definition URI '{uri}': {source}")]
    InvalidUri {
        uri: String,
        #[source]
        source: url::ParseError,
    },

    #[error("error loading '{uri}': {source}")]
    Fetch {
        uri: String,
        #[source]
        source: FetchError,
    },

    #[error("error while parsing OpenAPI definition from '{uri}': {source}")]
    Parse {
        uri: String,
        #[source]
        source: ParseError,
    },
}

/// Downstream did not accept a requested route set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
    #[error("route set rejected: {0}")]
    Rejected(String),

    #[error("publishing failed: {0}")]
    Failed(String),
}

/// Outcome of a failed update attempt for one service.
#[derive(Debug, Error)]
pub enum UpdateError {
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    #[error("error while publishing route definitions for {service}: {source}")]
    Publish {
        service: String,
        #[source]
        source: PublishError,
    },
}

impl UpdateError {
    pub fn is_publish(&self) -> bool {
        matches!(self, UpdateError::Publish { .. })
    }
}
