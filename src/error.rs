// SPDX-License-Identifier: MIT

//! Typed errors for cfn-conditions
//!
//! Only loading a template can fail. Condition resolution and evaluation are
//! total and report problems as `ConditionIssue` findings instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TemplateError {
    /// I/O errors while reading a template file
    #[error("Failed to read template {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// Document root is not a mapping
    #[error("Template root must be a mapping, found {0}")]
    NotAMapping(&'static str),

    /// YAML mapping key that cannot become a JSON object key
    #[error("Unsupported mapping key: {0}")]
    UnsupportedKey(String),
}

impl TemplateError {
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
