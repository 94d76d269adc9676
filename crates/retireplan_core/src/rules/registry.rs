//! Rule registry
//!
//! Owns the configured rules and computes the order the engine runs them in.
//! A registry is an explicit value: build one per plan (or per test) and hand
//! it to [`RuleEngine::new`](super::RuleEngine::new).

use rustc_hash::FxHashMap;

use crate::error::{ConfigError, MissingDependency};
use crate::model::Plan;

use super::{Rule, RuleKind, StrategyRule, enabled_rules};

/// Outcome of [`RuleRegistry::validate_dependencies`]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DependencyReport {
    pub valid: bool,
    pub missing: Vec<MissingDependency>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

#[derive(Debug, Clone, Default)]
pub struct RuleRegistry {
    rules: Vec<StrategyRule>,
    /// Dependency names per rule, parallel to `rules`
    dependencies: Vec<Vec<String>>,
    enabled: Vec<bool>,
    by_name: FxHashMap<String, usize>,
}

impl RuleRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every rule the plan enables
    pub fn from_plan(plan: &Plan) -> Result<Self, ConfigError> {
        let mut registry = Self::new();
        for rule in enabled_rules(&plan.strategies) {
            registry.register(rule)?;
        }
        Ok(registry)
    }

    /// Add an enabled rule.
    ///
    /// Rejects duplicate names, incomplete metadata and out-of-bounds
    /// parameters.
    pub fn register(&mut self, rule: StrategyRule) -> Result<(), ConfigError> {
        let meta = rule.metadata();
        if meta.name.is_empty() {
            return Err(ConfigError::InvalidRule {
                name: String::new(),
                reason: "rule name is empty",
            });
        }
        if meta.description.is_empty() {
            return Err(ConfigError::InvalidRule {
                name: meta.name.to_string(),
                reason: "rule description is empty",
            });
        }
        if meta.dependencies.iter().any(|d| d.trim().is_empty()) {
            return Err(ConfigError::InvalidRule {
                name: meta.name.to_string(),
                reason: "dependency list contains an empty name",
            });
        }
        if self.by_name.contains_key(meta.name) {
            return Err(ConfigError::DuplicateRule(meta.name.to_string()));
        }
        rule.validate()?;

        tracing::debug!(rule = meta.name, dependencies = ?meta.dependencies, "registered rule");
        self.by_name.insert(meta.name.to_string(), self.rules.len());
        self.rules.push(rule);
        self.dependencies.push(meta.dependencies);
        self.enabled.push(true);
        Ok(())
    }

    /// Enable or disable a registered rule
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> Result<(), ConfigError> {
        let idx = self
            .index_of(name)
            .ok_or_else(|| ConfigError::UnknownRule(name.to_string()))?;
        self.enabled[idx] = enabled;
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&StrategyRule> {
        self.index_of(name).map(|idx| &self.rules[idx])
    }

    #[must_use]
    pub fn contains(&self, kind: RuleKind) -> bool {
        self.by_name.contains_key(kind.name())
    }

    /// Names of enabled rules in registration order
    #[must_use]
    pub fn enabled_names(&self) -> Vec<&str> {
        self.rules
            .iter()
            .zip(&self.enabled)
            .filter(|(_, on)| **on)
            .map(|(rule, _)| rule.name())
            .collect()
    }

    pub(crate) fn rule_at(&self, idx: usize) -> &StrategyRule {
        &self.rules[idx]
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// For each rule named in `enabled`, list dependencies missing from `enabled`
    #[must_use]
    pub fn validate_dependencies(&self, enabled: &[&str]) -> DependencyReport {
        let mut missing = Vec::new();
        for name in enabled {
            let Some(idx) = self.index_of(name) else {
                continue;
            };
            let absent: Vec<String> = self.dependencies[idx]
                .iter()
                .filter(|dep| !enabled.contains(&dep.as_str()))
                .cloned()
                .collect();
            if !absent.is_empty() {
                missing.push(MissingDependency {
                    rule: name.to_string(),
                    missing: absent,
                });
            }
        }
        DependencyReport {
            valid: missing.is_empty(),
            missing,
        }
    }

    /// Every cycle reachable in the dependency graph of registered rules.
    ///
    /// Each cycle is the path from its entry rule back to itself, e.g.
    /// `["a", "b", "c", "a"]`. Diagnostic only; never fails.
    #[must_use]
    pub fn detect_circular_dependencies(&self) -> Vec<Vec<String>> {
        let mut marks = vec![Mark::Unvisited; self.rules.len()];
        let mut stack = Vec::new();
        let mut cycles = Vec::new();
        for start in 0..self.rules.len() {
            if marks[start] == Mark::Unvisited {
                self.find_cycles(start, &mut marks, &mut stack, &mut cycles);
            }
        }
        cycles
    }

    fn find_cycles(
        &self,
        node: usize,
        marks: &mut [Mark],
        stack: &mut Vec<usize>,
        cycles: &mut Vec<Vec<String>>,
    ) {
        marks[node] = Mark::InProgress;
        stack.push(node);

        for dep in &self.dependencies[node] {
            let Some(next) = self.index_of(dep) else {
                continue;
            };
            match marks[next] {
                Mark::Unvisited => self.find_cycles(next, marks, stack, cycles),
                Mark::InProgress => {
                    if let Some(pos) = stack.iter().position(|&n| n == next) {
                        let mut cycle: Vec<String> = stack[pos..]
                            .iter()
                            .map(|&n| self.rules[n].name().to_string())
                            .collect();
                        cycle.push(self.rules[next].name().to_string());
                        cycles.push(cycle);
                    }
                }
                Mark::Done => {}
            }
        }

        stack.pop();
        marks[node] = Mark::Done;
    }

    /// Enabled rules ordered so every rule follows its enabled dependencies.
    ///
    /// Depth-first post-order over edges between enabled rules. Fails with
    /// [`ConfigError::CircularDependency`] on the first cycle met.
    pub fn execution_order(&self) -> Result<Vec<&str>, ConfigError> {
        Ok(self
            .ordered_indices()?
            .into_iter()
            .map(|idx| self.rules[idx].name())
            .collect())
    }

    pub(crate) fn ordered_indices(&self) -> Result<Vec<usize>, ConfigError> {
        let mut marks = vec![Mark::Unvisited; self.rules.len()];
        let mut order = Vec::with_capacity(self.rules.len());
        for start in 0..self.rules.len() {
            if self.enabled[start] && marks[start] == Mark::Unvisited {
                self.visit(start, &mut marks, &mut order)?;
            }
        }
        Ok(order)
    }

    fn visit(
        &self,
        node: usize,
        marks: &mut [Mark],
        order: &mut Vec<usize>,
    ) -> Result<(), ConfigError> {
        match marks[node] {
            Mark::Done => return Ok(()),
            Mark::InProgress => {
                return Err(ConfigError::CircularDependency(
                    self.rules[node].name().to_string(),
                ));
            }
            Mark::Unvisited => {}
        }

        marks[node] = Mark::InProgress;
        for dep in &self.dependencies[node] {
            if let Some(next) = self.index_of(dep).filter(|&n| self.enabled[n]) {
                self.visit(next, marks, order)?;
            }
        }
        marks[node] = Mark::Done;
        order.push(node);
        Ok(())
    }
}
