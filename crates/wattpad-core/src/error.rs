// Error types for every fallible client operation.

use serde_json::Value;
use thiserror::Error;

/// Bodies longer than this are cut when an error is displayed.
const BODY_PREVIEW_LIMIT: usize = 500;

pub type Result<T> = std::result::Result<T, WattpadError>;

#[derive(Debug, Error)]
pub enum WattpadError {
    #[error("Error 404: The requested resource was not found. URL: {url}")]
    NotFound { url: String },

    /// Non-404 HTTP failure, or an error payload returned inside a JSON body.
    #[error("{message}{}", response_suffix(.response))]
    Api {
        message: String,
        response: Option<Value>,
    },

    #[error("{message}\nResponse Body (truncated): {}", preview(.body))]
    NotJson { message: String, body: String },

    #[error("Network error while fetching URL: {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("failed to parse {what}: {message}")]
    Parse { what: &'static str, message: String },

    #[error("Part {part_id} has no text URL.")]
    MissingTextUrl { part_id: u64 },

    #[error("Invalid URL{}: {url}", part_suffix(.part_id))]
    InvalidUrl { part_id: Option<u64>, url: String },

    #[error("response cache unavailable: {source}")]
    Cache {
        #[source]
        source: CacheError,
    },
}

/// Failures while opening the on-disk response cache.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("failed to create cache directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl From<CacheError> for WattpadError {
    fn from(source: CacheError) -> Self {
        WattpadError::Cache { source }
    }
}

impl WattpadError {
    pub(crate) fn api(message: impl Into<String>) -> Self {
        WattpadError::Api {
            message: message.into(),
            response: None,
        }
    }

    pub(crate) fn parse(what: &'static str, message: impl Into<String>) -> Self {
        WattpadError::Parse {
            what,
            message: message.into(),
        }
    }

    /// True for errors that mean the resource does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, WattpadError::NotFound { .. })
    }
}

fn response_suffix(response: &Option<Value>) -> String {
    match response {
        Some(v) => format!(" (API Response: {v})"),
        None => String::new(),
    }
}

fn part_suffix(part_id: &Option<u64>) -> String {
    match part_id {
        Some(id) => format!(" for part {id}"),
        None => String::new(),
    }
}

fn preview(body: &str) -> String {
    match body.char_indices().nth(BODY_PREVIEW_LIMIT) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}
