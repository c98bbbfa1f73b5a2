// SPDX-License-Identifier: MIT

//! Reference canonicalization
//!
//! A `{"Ref": name}` expression is reduced to a `ReferenceToken`: the hex
//! SHA-1 of the expression's JSON text. Tokens are stable across runs, so
//! scenarios built by one tool can be replayed against trees built by another.

use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::Value;
use sha1::{Digest, Sha1};
use std::collections::HashSet;
use std::fmt;

/// Built-in references that are never declared under `Parameters`
static PSEUDO_PARAMETERS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "AWS::AccountId",
        "AWS::NotificationARNs",
        "AWS::NoValue",
        "AWS::Partition",
        "AWS::Region",
        "AWS::StackId",
        "AWS::StackName",
        "AWS::URLSuffix",
    ]
    .into_iter()
    .collect()
});

/// A reference to a parameter or pseudo-parameter by logical name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Reference {
    name: String,
}

impl Reference {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Accepts only a mapping with the single key `Ref` and a string value
    pub fn from_expression(expr: &Value) -> Option<Self> {
        let map = expr.as_object()?;
        if map.len() != 1 {
            return None;
        }
        map.get("Ref")?.as_str().map(Self::new)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_pseudo_parameter(&self) -> bool {
        PSEUDO_PARAMETERS.contains(self.name.as_str())
    }

    pub fn pseudo_parameters() -> impl Iterator<Item = Reference> {
        PSEUDO_PARAMETERS.iter().map(|name| Reference::new(*name))
    }

    /// Canonical token for this reference
    pub fn token(&self) -> ReferenceToken {
        // Same text as a key-sorted, ASCII-only `{"Ref": name}` dump with
        // default separators.
        let name = ascii_only(&Value::String(self.name.clone()).to_string());
        let canonical = format!("{{\"Ref\": {}}}", name);

        let mut hasher = Sha1::new();
        hasher.update(canonical.as_bytes());
        ReferenceToken(format!("{:x}", hasher.finalize()))
    }
}

/// Escape everything outside printable ASCII as `\uXXXX`, using surrogate
/// pairs above the basic plane
fn ascii_only(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        if c.is_ascii() && c != '\x7f' {
            out.push(c);
        } else {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{:04x}", unit));
            }
        }
    }
    out
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ref({})", self.name)
    }
}

/// Opaque, stable identifier standing in for a `Reference`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ReferenceToken(String);

impl ReferenceToken {
    /// Shorthand for `Reference::new(name).token()`
    pub fn of(name: &str) -> Self {
        Reference::new(name).token()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReferenceToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
