// SPDX-License-Identifier: MIT

//! Findings recorded while resolving conditions
//!
//! These are lint results, not failures: the resolver always returns a
//! condition and reports what it had to degrade.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConditionIssue {
    /// Requested name is not declared under `Conditions`
    #[error("Condition '{name}' is not defined")]
    UnknownCondition { name: String },

    /// Value is not a single-key mapping at all
    #[error("Condition '{name}' must be a single-key function mapping, found {found}")]
    NotAFunction { name: String, found: String },

    #[error("Condition '{name}' uses unsupported function {function}")]
    UnsupportedFunction { name: String, function: String },

    #[error("Condition '{name}' has a malformed Fn::Equals: {reason}")]
    MalformedEquals { name: String, reason: String },

    #[error("Condition '{name}' has a malformed {function}: {reason}")]
    MalformedCombinator {
        name: String,
        function: String,
        reason: String,
    },

    /// A `{"Condition": target}` child names nothing
    #[error("Condition '{name}' references undefined condition '{target}'")]
    DanglingReference { name: String, target: String },

    #[error("Circular condition reference: {}", .path.join(" -> "))]
    CircularReference { path: Vec<String> },

    #[error("Condition '{name}' exceeds the maximum nesting depth of {limit}")]
    DepthExceeded { name: String, limit: usize },

    /// Emptied because a condition below it hit a cycle or the depth limit
    #[error("Condition '{name}' is empty: {cause}")]
    Degraded {
        name: String,
        cause: Box<ConditionIssue>,
    },
}

impl ConditionIssue {
    /// Name of the condition the finding is reported against
    pub fn condition(&self) -> &str {
        match self {
            ConditionIssue::UnknownCondition { name }
            | ConditionIssue::NotAFunction { name, .. }
            | ConditionIssue::UnsupportedFunction { name, .. }
            | ConditionIssue::MalformedEquals { name, .. }
            | ConditionIssue::MalformedCombinator { name, .. }
            | ConditionIssue::DanglingReference { name, .. }
            | ConditionIssue::DepthExceeded { name, .. }
            | ConditionIssue::Degraded { name, .. } => name,
            ConditionIssue::CircularReference { path } => {
                path.first().map(String::as_str).unwrap_or_default()
            }
        }
    }

    /// Whether the finding explains the state of `name`
    ///
    /// A cycle concerns every condition on it, not only the one it is
    /// reported against.
    pub fn concerns(&self, name: &str) -> bool {
        match self {
            ConditionIssue::CircularReference { path } => path.iter().any(|n| n == name),
            other => other.condition() == name,
        }
    }
}
