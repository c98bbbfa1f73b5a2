// SPDX-License-Identifier: MIT

//! Condition parsing and evaluation
//!
//! Named conditions from a template's `Conditions` section are built into
//! immutable trees:
//! - `Fn::Equals` between a `Ref` and a literal or another `Ref`
//! - `Fn::And`, `Fn::Or`, `Fn::Not` over `{"Condition": name}` children
//!
//! A tree can then be tested against a `Scenario` that assigns values to
//! reference tokens. Malformed input never fails; it yields an empty
//! condition and a `ConditionIssue`.

mod ast;
mod evaluator;
mod influence;
mod issue;
mod parser;
mod reference;
mod resolver;
mod scenario;
mod set;

pub use ast::{Comparand, Condition, ConditionKind, EqualsClause};
pub use evaluator::evaluate;
pub use influence::InfluenceMap;
pub use issue::ConditionIssue;
pub use parser::{equals_rejection, parse_equals, FN_AND, FN_EQUALS, FN_NOT, FN_OR};
pub use reference::{Reference, ReferenceToken};
pub use resolver::{ResolveOptions, Resolver, DEFAULT_MAX_DEPTH, MAX_DEPTH_ENV};
pub use scenario::{Assignment, Scenario};
pub use set::ConditionSet;
