// SPDX-License-Identifier: MIT

//! Condition evaluation under a scenario

use super::ast::{Condition, ConditionKind, EqualsClause};
use super::reference::ReferenceToken;
use super::scenario::Scenario;

/// Evaluate a condition tree against one scenario
///
/// Total: an empty condition is false, and an equality whose subject is
/// not assigned is false.
pub fn evaluate(condition: &Condition, scenario: &Scenario) -> bool {
    match condition.kind() {
        ConditionKind::Equals(clause) => evaluate_equals(clause, scenario),
        ConditionKind::And(children) => children.iter().all(|c| evaluate(c, scenario)),
        ConditionKind::Or(children) => children.iter().any(|c| evaluate(c, scenario)),
        ConditionKind::Not(child) => !evaluate(child, scenario),
        ConditionKind::Empty => false,
    }
}

fn evaluate_equals(clause: &EqualsClause, scenario: &Scenario) -> bool {
    match scenario.get(&clause.subject) {
        Some(value) => *value == clause.comparand,
        None => {
            log::trace!("Scenario has no value for {}", clause.subject);
            false
        }
    }
}

impl Condition {
    /// Truth of this condition in `scenario`
    pub fn test(&self, scenario: &Scenario) -> bool {
        evaluate(self, scenario)
    }

    /// Influencing tokens the scenario leaves unassigned
    pub fn unassigned<'a>(&'a self, scenario: &Scenario) -> Vec<&'a ReferenceToken> {
        self.influence()
            .tokens()
            .filter(|token| !scenario.contains(token))
            .collect()
    }
}
