// SPDX-License-Identifier: MIT

//! Static reasoning over template `Conditions`
//!
//! - `template` loads the JSON/YAML document the engine reads from
//! - `condition` parses named conditions into immutable trees and
//!   evaluates them under hypothetical parameter assignments

pub mod condition;
pub mod error;
pub mod template;

pub use condition::{
    Comparand, Condition, ConditionIssue, ConditionKind, ConditionSet, EqualsClause,
    InfluenceMap, Reference, ReferenceToken, ResolveOptions, Scenario,
};
pub use error::TemplateError;
pub use template::Template;
