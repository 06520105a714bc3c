//! Errors raised while ingesting the event table and the country geometry.
//!
//! Row-level problems are never errors: bad rows are dropped during parsing.
//! Everything here aborts an ingestion cycle and leaves the previously
//! published table in place.

use std::fmt;
use thiserror::Error;

/// Which input resource an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Events,
    Countries,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Events => f.write_str("event table"),
            Resource::Countries => f.write_str("country geometry"),
        }
    }
}

/// Failure of a single fetch, before any parsing happens.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("server answered with status {0}")]
    Status(u16),
}

#[derive(Debug, Error)]
pub enum IngestError {
    /// A required column or geometry collection is missing.
    #[error("schema error: {0}")]
    Schema(String),

    #[error("{resource} unavailable at {location}")]
    ResourceUnavailable {
        resource: Resource,
        location: String,
        #[source]
        source: FetchError,
    },

    /// The resource was fetched but is not valid text/JSON.
    #[error("cannot decode {resource}: {message}")]
    Decode { resource: Resource, message: String },
}

impl IngestError {
    pub fn schema(message: impl Into<String>) -> Self {
        IngestError::Schema(message.into())
    }

    pub fn decode(resource: Resource, message: impl fmt::Display) -> Self {
        IngestError::Decode {
            resource,
            message: message.to_string(),
        }
    }

    /// True for failures that may succeed on a later attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, IngestError::ResourceUnavailable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_names_resource() {
        let err = IngestError::ResourceUnavailable {
            resource: Resource::Countries,
            location: "data/countries-110m.json".into(),
            source: FetchError::Status(404),
        };
        let msg = err.to_string();
        assert!(msg.contains("country geometry"));
        assert!(msg.contains("data/countries-110m.json"));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_schema_not_retryable() {
        assert!(!IngestError::schema("missing column `time`").is_retryable());
    }
}
