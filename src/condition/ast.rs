// SPDX-License-Identifier: MIT

//! Condition tree types

use super::influence::InfluenceMap;
use super::reference::ReferenceToken;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Right-hand side of an equality, or a value assigned in a scenario
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparand {
    /// Scalar in canonical string form
    Literal(String),
    /// Symbolic stand-in for another reference's value
    Reference(ReferenceToken),
}

impl From<&str> for Comparand {
    fn from(s: &str) -> Self {
        Comparand::Literal(s.to_string())
    }
}

impl From<String> for Comparand {
    fn from(s: String) -> Self {
        Comparand::Literal(s)
    }
}

impl From<ReferenceToken> for Comparand {
    fn from(token: ReferenceToken) -> Self {
        Comparand::Reference(token)
    }
}

impl fmt::Display for Comparand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Comparand::Literal(s) => write!(f, "{:?}", s),
            Comparand::Reference(token) => write!(f, "@{}", token),
        }
    }
}

/// `Fn::Equals` reduced to a subject token and what it is compared against
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EqualsClause {
    pub subject: ReferenceToken,
    pub comparand: Comparand,
}

/// The single semantic shape of a condition
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionKind {
    Equals(EqualsClause),
    And(Vec<Arc<Condition>>),
    Or(Vec<Arc<Condition>>),
    Not(Arc<Condition>),
    /// Malformed or unsupported input
    Empty,
}

impl ConditionKind {
    pub fn label(&self) -> &'static str {
        match self {
            ConditionKind::Equals(_) => "Fn::Equals",
            ConditionKind::And(_) => "Fn::And",
            ConditionKind::Or(_) => "Fn::Or",
            ConditionKind::Not(_) => "Fn::Not",
            ConditionKind::Empty => "empty",
        }
    }
}

/// A named, fully resolved condition
///
/// Built once by the resolver and never mutated afterwards. Children are
/// shared through `Arc`, so a tree can be evaluated from several threads.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    name: String,
    kind: ConditionKind,
    influence: InfluenceMap,
}

impl Condition {
    pub(crate) fn from_kind(name: impl Into<String>, kind: ConditionKind) -> Self {
        let influence = InfluenceMap::build(&kind);
        Self {
            name: name.into(),
            kind,
            influence,
        }
    }

    pub(crate) fn empty(name: impl Into<String>) -> Self {
        Self::from_kind(name, ConditionKind::Empty)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &ConditionKind {
        &self.kind
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.kind, ConditionKind::Empty)
    }

    pub fn equals(&self) -> Option<&EqualsClause> {
        match &self.kind {
            ConditionKind::Equals(clause) => Some(clause),
            _ => None,
        }
    }

    pub fn and(&self) -> &[Arc<Condition>] {
        match &self.kind {
            ConditionKind::And(children) => children,
            _ => &[],
        }
    }

    pub fn or(&self) -> &[Arc<Condition>] {
        match &self.kind {
            ConditionKind::Or(children) => children,
            _ => &[],
        }
    }

    /// Zero or one element
    pub fn not(&self) -> &[Arc<Condition>] {
        match &self.kind {
            ConditionKind::Not(child) => std::slice::from_ref(child),
            _ => &[],
        }
    }

    /// Every token and value compared anywhere in this tree
    pub fn influence(&self) -> &InfluenceMap {
        &self.influence
    }

    /// Indented, one node per line
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out, 0);
        out
    }

    fn render_into(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        match &self.kind {
            ConditionKind::Equals(clause) => {
                out.push_str(&format!(
                    "{}{}: {} == {}\n",
                    indent, self.name, clause.subject, clause.comparand
                ));
            }
            ConditionKind::And(children) | ConditionKind::Or(children) => {
                out.push_str(&format!("{}{}: {}\n", indent, self.name, self.kind.label()));
                for child in children {
                    child.render_into(out, depth + 1);
                }
            }
            ConditionKind::Not(child) => {
                out.push_str(&format!("{}{}: Fn::Not\n", indent, self.name));
                child.render_into(out, depth + 1);
            }
            ConditionKind::Empty => {
                out.push_str(&format!("{}{}: <empty>\n", indent, self.name));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn equals(name: &str, param: &str, value: &str) -> Arc<Condition> {
        Arc::new(Condition::from_kind(
            name,
            ConditionKind::Equals(EqualsClause {
                subject: ReferenceToken::of(param),
                comparand: value.into(),
            }),
        ))
    }

    #[test]
    fn test_field_presence_view() {
        let leaf = equals("IsProd", "Env", "prod");
        assert!(leaf.equals().is_some());
        assert!(leaf.and().is_empty());
        assert!(leaf.or().is_empty());
        assert!(leaf.not().is_empty());

        let negated = Condition::from_kind("NotProd", ConditionKind::Not(leaf.clone()));
        assert!(negated.equals().is_none());
        assert_eq!(negated.not().len(), 1);
        assert_eq!(negated.not()[0], leaf);
    }

    #[test]
    fn test_empty_condition() {
        let empty = Condition::empty("Broken");
        assert!(empty.is_empty());
        assert!(empty.influence().is_empty());
        assert_eq!(empty.kind().label(), "empty");
    }

    #[test]
    fn test_literal_and_reference_comparands_differ() {
        let token = ReferenceToken::of("Other");
        let literal = Comparand::from(token.as_str());
        assert_ne!(literal, Comparand::from(token));
    }

    #[test]
    fn test_render() {
        let or = Condition::from_kind(
            "AnyUs",
            ConditionKind::Or(vec![
                equals("East", "AWS::Region", "us-east-1"),
                equals("West", "AWS::Region", "us-west-1"),
            ]),
        );
        let rendered = or.render();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "AnyUs: Fn::Or");
        assert!(lines[1].starts_with("  East: "));
        assert!(lines[2].ends_with("== \"us-west-1\""));
    }
}
