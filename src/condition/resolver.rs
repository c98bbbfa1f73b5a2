// SPDX-License-Identifier: MIT

//! Resolution of named conditions into owned trees
//!
//! Children of `Fn::And` / `Fn::Or` / `Fn::Not` are looked up by name in the
//! template's `Conditions` section and built eagerly. Each name is built at
//! most once per resolver and shared between parents.
//!
//! Failure policy:
//! - bad child shape, wrong arity or an undefined child name degrade that
//!   combinator to an empty condition
//! - a name revisited on the active path, or a path deeper than
//!   `max_depth`, degrades every condition on that path
//!
//! Every built name remembers the height of its tree, so a cached child
//! cannot stack a tree deeper than `max_depth` either. The result for a
//! name does not depend on what the resolver built before it.

use super::ast::{Condition, ConditionKind};
use super::issue::ConditionIssue;
use super::parser::{condition_reference, equals_clause, FN_AND, FN_EQUALS, FN_NOT, FN_OR};
use crate::template::{value_kind, Template};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Maximum number of nested named conditions on one resolution path
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Environment variable overriding `DEFAULT_MAX_DEPTH`
pub const MAX_DEPTH_ENV: &str = "CFN_CONDITIONS_MAX_DEPTH";

/// Resolution settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveOptions {
    pub max_depth: usize,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ResolveOptions {
    /// Defaults, with `CFN_CONDITIONS_MAX_DEPTH` applied when set
    pub fn from_env() -> Self {
        match std::env::var(MAX_DEPTH_ENV) {
            Ok(raw) => Self::default().with_max_depth_str(&raw),
            Err(_) => Self::default(),
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    fn with_max_depth_str(self, raw: &str) -> Self {
        match raw.trim().parse::<usize>() {
            Ok(depth) if depth > 0 => self.with_max_depth(depth),
            _ => {
                log::warn!(
                    "Ignoring invalid {}='{}', using {}",
                    MAX_DEPTH_ENV,
                    raw,
                    self.max_depth
                );
                self
            }
        }
    }
}

/// Resolution was abandoned because of a cycle or the depth limit
#[derive(Debug)]
struct Abort(ConditionIssue);

/// Builds condition trees from one template
pub struct Resolver<'t> {
    conditions: Option<&'t Map<String, Value>>,
    options: ResolveOptions,
    active: Vec<String>,
    /// Built trees with their height in named conditions
    built: HashMap<String, (Arc<Condition>, usize)>,
    issues: Vec<ConditionIssue>,
    seen: HashSet<ConditionIssue>,
}

impl<'t> Resolver<'t> {
    pub fn new(template: &'t Template, options: ResolveOptions) -> Self {
        Self {
            conditions: template.conditions(),
            options,
            active: Vec::new(),
            built: HashMap::new(),
            issues: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Resolve `name`, returning an empty condition if it cannot be built
    pub fn resolve(&mut self, name: &str) -> Arc<Condition> {
        match self.resolve_named(name) {
            Ok(condition) => condition,
            Err(Abort(_)) => Arc::new(Condition::empty(name)),
        }
    }

    pub fn issues(&self) -> &[ConditionIssue] {
        &self.issues
    }

    pub fn into_issues(self) -> Vec<ConditionIssue> {
        self.issues
    }

    fn report(&mut self, issue: ConditionIssue) {
        if self.seen.insert(issue.clone()) {
            log::debug!("{}", issue);
            self.issues.push(issue);
        }
    }

    fn definition(&self, name: &str) -> Option<&'t Value> {
        self.conditions.and_then(|conditions| conditions.get(name))
    }

    fn resolve_named(&mut self, name: &str) -> Result<Arc<Condition>, Abort> {
        if let Some((condition, height)) = self.built.get(name).cloned() {
            if self.active.len() + height <= self.options.max_depth {
                return Ok(condition);
            }
            return Err(self.depth_exceeded(name));
        }

        if let Some(start) = self.active.iter().position(|n| n == name) {
            let path = cycle_path(&self.active[start..]);
            log::warn!("Circular condition reference: {}", path.join(" -> "));
            let issue = ConditionIssue::CircularReference { path };
            self.report(issue.clone());
            return Err(Abort(issue));
        }

        if self.active.len() >= self.options.max_depth {
            return Err(self.depth_exceeded(name));
        }

        let Some(definition) = self.definition(name) else {
            self.report(ConditionIssue::UnknownCondition {
                name: name.to_string(),
            });
            return Ok(Arc::new(Condition::empty(name)));
        };

        self.active.push(name.to_string());
        let result = self.build(name, definition);
        self.active.pop();

        let (condition, height) = match result {
            Ok(built) => built,
            Err(Abort(cause)) => {
                if !cause.concerns(name) {
                    self.report(ConditionIssue::Degraded {
                        name: name.to_string(),
                        cause: Box::new(cause.clone()),
                    });
                }
                return Err(Abort(cause));
            }
        };
        let condition = Arc::new(condition);
        self.built.insert(name.to_string(), (condition.clone(), height));
        Ok(condition)
    }

    fn depth_exceeded(&mut self, name: &str) -> Abort {
        log::warn!(
            "Condition '{}' exceeds the maximum nesting depth of {}",
            name,
            self.options.max_depth
        );
        let issue = ConditionIssue::DepthExceeded {
            name: name.to_string(),
            limit: self.options.max_depth,
        };
        self.report(issue.clone());
        Abort(issue)
    }

    /// Builds one definition, returning the tree and its height
    fn build(&mut self, name: &str, definition: &'t Value) -> Result<(Condition, usize), Abort> {
        let function = match definition.as_object() {
            Some(map) if map.len() == 1 => map.iter().next(),
            Some(map) => {
                self.report(ConditionIssue::NotAFunction {
                    name: name.to_string(),
                    found: format!("a mapping with {} keys", map.len()),
                });
                None
            }
            None => {
                self.report(ConditionIssue::NotAFunction {
                    name: name.to_string(),
                    found: format!("a {}", value_kind(definition)),
                });
                None
            }
        };
        let Some((function, args)) = function else {
            return Ok((Condition::empty(name), 1));
        };

        let kind = match function.as_str() {
            FN_EQUALS => match equals_clause(args) {
                Ok(clause) => ConditionKind::Equals(clause),
                Err(reason) => {
                    self.report(ConditionIssue::MalformedEquals {
                        name: name.to_string(),
                        reason: reason.to_string(),
                    });
                    ConditionKind::Empty
                }
            },
            FN_AND => self
                .build_children(name, FN_AND, args)?
                .map(ConditionKind::And)
                .unwrap_or(ConditionKind::Empty),
            FN_OR => self
                .build_children(name, FN_OR, args)?
                .map(ConditionKind::Or)
                .unwrap_or(ConditionKind::Empty),
            FN_NOT => self
                .build_children(name, FN_NOT, args)?
                .and_then(|mut children| children.pop())
                .map(ConditionKind::Not)
                .unwrap_or(ConditionKind::Empty),
            other => {
                self.report(ConditionIssue::UnsupportedFunction {
                    name: name.to_string(),
                    function: other.to_string(),
                });
                ConditionKind::Empty
            }
        };

        let height = 1 + self.child_height(&kind);
        Ok((Condition::from_kind(name, kind), height))
    }

    fn child_height(&self, kind: &ConditionKind) -> usize {
        let children: &[Arc<Condition>] = match kind {
            ConditionKind::And(children) | ConditionKind::Or(children) => children.as_slice(),
            ConditionKind::Not(child) => std::slice::from_ref(child),
            ConditionKind::Equals(_) | ConditionKind::Empty => &[],
        };
        children
            .iter()
            .filter_map(|child| self.built.get(child.name()).map(|(_, height)| *height))
            .max()
            .unwrap_or(0)
    }

    /// Children of a combinator, or `None` if the combinator must degrade
    fn build_children(
        &mut self,
        name: &str,
        function: &str,
        args: &'t Value,
    ) -> Result<Option<Vec<Arc<Condition>>>, Abort> {
        let Some(items) = args.as_array() else {
            self.malformed(name, function, "expected a sequence of conditions");
            return Ok(None);
        };

        let arity_ok = if function == FN_NOT {
            items.len() == 1
        } else {
            items.len() >= 2
        };
        if !arity_ok {
            let expected = if function == FN_NOT {
                "exactly one condition"
            } else {
                "at least two conditions"
            };
            self.malformed(
                name,
                function,
                &format!("expected {}, found {}", expected, items.len()),
            );
            return Ok(None);
        }

        // Check every child before building any, so nothing is half resolved.
        let mut targets = Vec::with_capacity(items.len());
        for item in items {
            match condition_reference(item) {
                Ok(target) => targets.push(target),
                Err(reason) => {
                    self.malformed(name, function, &reason);
                    return Ok(None);
                }
            }
        }

        let dangling: Vec<&str> = targets
            .iter()
            .copied()
            .filter(|target| self.definition(target).is_none())
            .collect();
        if !dangling.is_empty() {
            for target in dangling {
                self.report(ConditionIssue::DanglingReference {
                    name: name.to_string(),
                    target: target.to_string(),
                });
            }
            return Ok(None);
        }

        let mut children = Vec::with_capacity(targets.len());
        for target in targets {
            children.push(self.resolve_named(target)?);
        }
        Ok(Some(children))
    }

    fn malformed(&mut self, name: &str, function: &str, reason: &str) {
        self.report(ConditionIssue::MalformedCombinator {
            name: name.to_string(),
            function: function.to_string(),
            reason: reason.to_string(),
        });
    }
}

/// Closed cycle path, rotated to start at its smallest name so the same
/// cycle reached from different entry points reports identically
fn cycle_path(cycle: &[String]) -> Vec<String> {
    let start = cycle
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.cmp(b.1))
        .map(|(i, _)| i)
        .unwrap_or(0);

    let mut path: Vec<String> = cycle[start..]
        .iter()
        .chain(cycle[..start].iter())
        .cloned()
        .collect();
    if let Some(first) = path.first().cloned() {
        path.push(first);
    }
    path
}

impl Condition {
    /// Build the named condition from `template`
    ///
    /// Never fails: an undefined or malformed condition comes back empty.
    pub fn new(template: &Template, name: &str) -> Condition {
        Self::resolve(template, name, &ResolveOptions::default()).0
    }

    /// Build the named condition and report what had to be degraded
    pub fn resolve(
        template: &Template,
        name: &str,
        options: &ResolveOptions,
    ) -> (Condition, Vec<ConditionIssue>) {
        let mut resolver = Resolver::new(template, options.clone());
        let condition = resolver.resolve(name);
        let condition = Arc::try_unwrap(condition).unwrap_or_else(|shared| (*shared).clone());
        (condition, resolver.into_issues())
    }
}
