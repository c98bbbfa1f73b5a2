// SPDX-License-Identifier: MIT

//! Influence maps: which tokens a condition compares, and against what

use super::ast::{Comparand, ConditionKind};
use super::reference::ReferenceToken;
use serde::Serialize;
use std::collections::btree_map;
use std::collections::{BTreeMap, BTreeSet};

/// Token → every value it is compared against in a condition tree
///
/// Purely structural: an `Fn::Not` contributes the same entries as its child.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct InfluenceMap(BTreeMap<ReferenceToken, BTreeSet<Comparand>>);

impl InfluenceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Aggregate over an already resolved kind
    pub(crate) fn build(kind: &ConditionKind) -> Self {
        let mut map = Self::new();
        match kind {
            ConditionKind::Equals(clause) => {
                map.insert(clause.subject.clone(), clause.comparand.clone());
            }
            ConditionKind::And(children) | ConditionKind::Or(children) => {
                for child in children {
                    map.merge(child.influence());
                }
            }
            ConditionKind::Not(child) => map.merge(child.influence()),
            ConditionKind::Empty => {}
        }
        map
    }

    pub fn insert(&mut self, token: ReferenceToken, value: Comparand) {
        self.0.entry(token).or_default().insert(value);
    }

    /// Per-key set union
    pub fn merge(&mut self, other: &InfluenceMap) {
        for (token, values) in &other.0 {
            self.0
                .entry(token.clone())
                .or_default()
                .extend(values.iter().cloned());
        }
    }

    pub fn get(&self, token: &ReferenceToken) -> Option<&BTreeSet<Comparand>> {
        self.0.get(token)
    }

    pub fn contains_token(&self, token: &ReferenceToken) -> bool {
        self.0.contains_key(token)
    }

    pub fn tokens(&self) -> impl Iterator<Item = &ReferenceToken> {
        self.0.keys()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, ReferenceToken, BTreeSet<Comparand>> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(ReferenceToken, Comparand)> for InfluenceMap {
    fn from_iter<I: IntoIterator<Item = (ReferenceToken, Comparand)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (token, value) in iter {
            map.insert(token, value);
        }
        map
    }
}

impl<'a> IntoIterator for &'a InfluenceMap {
    type Item = (&'a ReferenceToken, &'a BTreeSet<Comparand>);
    type IntoIter = btree_map::Iter<'a, ReferenceToken, BTreeSet<Comparand>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_unions_values_per_token() {
        let region = ReferenceToken::of("AWS::Region");
        let env = ReferenceToken::of("Env");

        let mut left: InfluenceMap = [
            (region.clone(), Comparand::from("us-east-1")),
            (env.clone(), Comparand::from("prod")),
        ]
        .into_iter()
        .collect();
        let right: InfluenceMap = [
            (region.clone(), Comparand::from("us-west-1")),
            (region.clone(), Comparand::from("us-east-1")),
        ]
        .into_iter()
        .collect();

        left.merge(&right);

        assert_eq!(left.len(), 2);
        assert_eq!(left.get(&region).map(|v| v.len()), Some(2));
        assert_eq!(left.get(&env).map(|v| v.len()), Some(1));
        assert!(left.contains_token(&region));
        assert!(!left.contains_token(&ReferenceToken::of("Other")));
    }

    #[test]
    fn test_empty_kind_has_no_influence() {
        assert!(InfluenceMap::build(&ConditionKind::Empty).is_empty());
    }
}
