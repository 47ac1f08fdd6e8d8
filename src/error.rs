//! Error types for json-classgen.
//!
//! Inference itself has no failure cases: conflicting observations degrade
//! to `Anything` and names are disambiguated without bound. Everything here
//! happens at the edges (parsing, configuration, preprocessing, rendering).
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Raw text is not valid JSON. Raised before the engine sees anything.
    #[error("malformed JSON in {origin}: {source}")]
    MalformedInput {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration at {path}: {message}")]
    Config { path: String, message: String },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("jq filter failed: {0}")]
    Jq(String),

    #[error("failed to render generated code")]
    Render(#[from] std::fmt::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
