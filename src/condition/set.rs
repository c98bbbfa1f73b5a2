// SPDX-License-Identifier: MIT

//! All named conditions of a template, resolved together

use super::ast::Condition;
use super::influence::InfluenceMap;
use super::issue::ConditionIssue;
use super::resolver::{ResolveOptions, Resolver};
use super::scenario::Scenario;
use crate::template::Template;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Every condition declared in a template, keyed by name
///
/// Sub-conditions are shared between the trees that reference them, and each
/// finding is reported once even when several trees reach it.
#[derive(Debug, Clone, Default)]
pub struct ConditionSet {
    conditions: BTreeMap<String, Arc<Condition>>,
    issues: Vec<ConditionIssue>,
}

impl ConditionSet {
    pub fn new(template: &Template, options: &ResolveOptions) -> Self {
        let mut resolver = Resolver::new(template, options.clone());
        let conditions: BTreeMap<String, Arc<Condition>> = template
            .condition_names()
            .into_iter()
            .map(|name| (name.to_string(), resolver.resolve(name)))
            .collect();

        let issues = resolver.into_issues();
        log::debug!(
            "Resolved {} conditions with {} findings",
            conditions.len(),
            issues.len()
        );

        Self { conditions, issues }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Condition>> {
        self.conditions.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.conditions.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<Condition>)> {
        self.conditions.iter().map(|(name, c)| (name.as_str(), c))
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn issues(&self) -> &[ConditionIssue] {
        &self.issues
    }

    /// Findings that explain the state of one condition
    pub fn issues_for<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a ConditionIssue> {
        self.issues.iter().filter(move |issue| issue.concerns(name))
    }

    /// Union of the influence maps of all conditions
    pub fn influence(&self) -> InfluenceMap {
        let mut map = InfluenceMap::new();
        for condition in self.conditions.values() {
            map.merge(condition.influence());
        }
        map
    }

    /// Truth value of every condition in one scenario
    pub fn evaluate(&self, scenario: &Scenario) -> BTreeMap<&str, bool> {
        self.iter()
            .map(|(name, condition)| (name, condition.test(scenario)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::reference::ReferenceToken;
    use serde_json::json;

    fn regions() -> Template {
        Template::from_value(json!({
            "Conditions": {
                "IsEast": {"Fn::Equals": [{"Ref": "AWS::Region"}, "us-east-1"]},
                "IsWest": {"Fn::Equals": [{"Ref": "AWS::Region"}, "us-west-1"]},
                "IsUs": {"Fn::Or": [{"Condition": "IsEast"}, {"Condition": "IsWest"}]},
                "IsProd": {"Fn::Equals": [{"Ref": "Env"}, "prod"]},
                "Broken": {"Fn::And": [{"Condition": "IsProd"}, {"Condition": "Nope"}]},
                "Loop": {"Fn::Not": [{"Condition": "Loop"}]},
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_resolves_every_name() {
        let set = ConditionSet::new(&regions(), &ResolveOptions::default());
        assert_eq!(set.len(), 6);
        assert_eq!(
            set.names().collect::<Vec<_>>(),
            vec!["Broken", "IsEast", "IsProd", "IsUs", "IsWest", "Loop"]
        );
        assert!(set.get("Broken").unwrap().is_empty());
        assert!(set.get("Loop").unwrap().is_empty());
        assert!(!set.get("IsUs").unwrap().is_empty());

        // IsUs shares the trees built for its children
        let is_us = set.get("IsUs").unwrap();
        assert!(Arc::ptr_eq(&is_us.or()[0], set.get("IsEast").unwrap()));
    }

    #[test]
    fn test_issues_are_reported_once() {
        let set = ConditionSet::new(&regions(), &ResolveOptions::default());
        assert_eq!(set.issues().len(), 2);
        assert_eq!(set.issues_for("Broken").count(), 1);
        assert_eq!(set.issues_for("Loop").count(), 1);
        assert_eq!(set.issues_for("IsUs").count(), 0);
    }

    #[test]
    fn test_influence_union() {
        let set = ConditionSet::new(&regions(), &ResolveOptions::default());
        let influence = set.influence();
        assert_eq!(influence.len(), 2);
        assert_eq!(
            influence
                .get(&ReferenceToken::of("AWS::Region"))
                .map(|values| values.len()),
            Some(2)
        );
    }

    #[test]
    fn test_evaluate_all() {
        let set = ConditionSet::new(&regions(), &ResolveOptions::default());
        let scenario = Scenario::new()
            .with(ReferenceToken::of("AWS::Region"), "us-west-1")
            .with(ReferenceToken::of("Env"), "prod");
        let truth = set.evaluate(&scenario);
        assert!(!truth["IsEast"]);
        assert!(truth["IsWest"]);
        assert!(truth["IsUs"]);
        assert!(truth["IsProd"]);
        assert!(!truth["Broken"]);
        assert!(!truth["Loop"]);
    }
}
