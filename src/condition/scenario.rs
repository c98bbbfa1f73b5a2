// SPDX-License-Identifier: MIT

//! Hypothetical parameter assignments

use super::ast::Comparand;
use super::reference::{Reference, ReferenceToken};
use std::collections::HashMap;
use std::str::FromStr;

/// One hypothetical world: token → assigned value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scenario {
    values: HashMap<ReferenceToken, Comparand>,
}

impl Scenario {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style assignment
    pub fn with(mut self, token: ReferenceToken, value: impl Into<Comparand>) -> Self {
        self.assign(token, value);
        self
    }

    pub fn assign(&mut self, token: ReferenceToken, value: impl Into<Comparand>) {
        self.values.insert(token, value.into());
    }

    /// Assign by logical name instead of token
    pub fn assign_name(&mut self, name: &str, value: impl Into<Comparand>) {
        self.assign(ReferenceToken::of(name), value);
    }

    pub fn get(&self, token: &ReferenceToken) -> Option<&Comparand> {
        self.values.get(token)
    }

    pub fn contains(&self, token: &ReferenceToken) -> bool {
        self.values.contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ReferenceToken, &Comparand)> {
        self.values.iter()
    }
}

impl<V: Into<Comparand>> FromIterator<(ReferenceToken, V)> for Scenario {
    fn from_iter<I: IntoIterator<Item = (ReferenceToken, V)>>(iter: I) -> Self {
        let mut scenario = Self::new();
        for (token, value) in iter {
            scenario.assign(token, value);
        }
        scenario
    }
}

impl Extend<Assignment> for Scenario {
    fn extend<I: IntoIterator<Item = Assignment>>(&mut self, iter: I) {
        for assignment in iter {
            self.assign(assignment.target.token(), assignment.value);
        }
    }
}

/// A textual `Name=value` assignment
///
/// `Name=@Other` assigns the symbolic value of reference `Other`, which is
/// what a cross-parameter equality is satisfied by.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub target: Reference,
    pub value: Comparand,
}

impl FromStr for Assignment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, raw) = s
            .split_once('=')
            .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", s))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(format!("missing parameter name in '{}'", s));
        }

        let value = match raw.strip_prefix('@') {
            Some(other) if !other.is_empty() => Comparand::Reference(ReferenceToken::of(other)),
            Some(_) => return Err(format!("missing reference name in '{}'", s)),
            None => Comparand::Literal(raw.to_string()),
        };

        Ok(Self {
            target: Reference::new(name),
            value,
        })
    }
}
