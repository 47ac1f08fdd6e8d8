//! Run configuration shared by the engine and the code writers.
//!
//! The engine reads `root_name`, `date_formats`, `dictionaries` and the
//! example flags; writers read the namespace and visibility switches. The
//! whole value is handed to both sides as-is.
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_ROOT_NAME: &str = "Root";

/// Token in `date_formats` that selects RFC 3339 parsing instead of a
/// strftime pattern.
pub const RFC3339: &str = "rfc3339";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Name of the class describing the top-level document.
    pub root_name: String,
    /// Namespace (TypeScript `module`, Rust `mod`) wrapping the root class.
    pub namespace: Option<String>,
    /// Namespace for every non-root class. Falls back to `namespace`.
    pub secondary_namespace: Option<String>,
    pub internal_visibility: bool,
    /// Accessor-pair style instead of plain public fields.
    pub use_properties: bool,
    /// Keep observed literals per field and render them as doc comments.
    pub examples_in_documentation: bool,
    pub example_limit: usize,
    /// Accepted date formats, tried in order. See [`RFC3339`].
    pub date_formats: Vec<String>,
    pub dictionaries: DictionaryDetection,
}

/// Policy knobs for classifying an object as a string-keyed map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DictionaryDetection {
    pub enabled: bool,
    /// Objects with more keys than this are treated as maps when their
    /// values are uniform.
    pub max_fields: usize,
    /// Treat objects whose keys all look like ids, hashes or dates as maps.
    pub identifier_keys: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root_name: DEFAULT_ROOT_NAME.to_string(),
            namespace: None,
            secondary_namespace: None,
            internal_visibility: false,
            use_properties: false,
            examples_in_documentation: false,
            example_limit: 5,
            date_formats: vec![
                RFC3339.to_string(),
                "%Y-%m-%dT%H:%M:%S%.f".to_string(),
                "%Y-%m-%d %H:%M:%S".to_string(),
                "%Y-%m-%d".to_string(),
            ],
            dictionaries: DictionaryDetection::default(),
        }
    }
}

impl Default for DictionaryDetection {
    fn default() -> Self {
        Self { enabled: true, max_fields: 64, identifier_keys: true }
    }
}

impl Config {
    pub fn from_json_str(src: &str) -> Result<Self> {
        let config: Self = crate::path_de::from_str_with_path(src)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = crate::path_de::from_slice_with_path(&bytes)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.root_name.trim().is_empty() {
            return Err(Error::Config {
                path: "root_name".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Namespace a class is emitted into.
    pub fn namespace_for(&self, root: bool) -> Option<&str> {
        if root {
            self.namespace.as_deref()
        } else {
            self.secondary_namespace.as_deref().or(self.namespace.as_deref())
        }
    }
}
