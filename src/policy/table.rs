//! Ordered route policy table with first-match semantics

use std::fmt;

use http::Method;
use tracing::warn;

use super::pattern::PathPattern;
use super::PolicyError;
use crate::principal::Role;

/// Access requirement attached to a route rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessLevel {
    /// Unconditional allow; the token is not inspected.
    Public,
    /// Any validly authenticated principal.
    Authenticated,
    /// An authenticated principal holding the role.
    Role(Role),
}

impl AccessLevel {
    /// Whether evaluation needs a validated token
    pub fn requires_token(&self) -> bool {
        !matches!(self, AccessLevel::Public)
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessLevel::Public => f.write_str("public"),
            AccessLevel::Authenticated => f.write_str("authenticated"),
            AccessLevel::Role(role) => write!(f, "hasRole({role})"),
        }
    }
}

/// A single `(pattern, methods) -> access` rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRule {
    pattern: PathPattern,
    /// `None` matches every method
    methods: Option<Vec<Method>>,
    access: AccessLevel,
}

impl RouteRule {
    /// Rule that applies to every method
    pub fn new(pattern: PathPattern, access: AccessLevel) -> Self {
        Self {
            pattern,
            methods: None,
            access,
        }
    }

    /// Restrict the rule to the given methods
    pub fn with_methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.methods = Some(methods.into_iter().collect());
        self
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    pub fn methods(&self) -> Option<&[Method]> {
        self.methods.as_deref()
    }

    pub fn access(&self) -> &AccessLevel {
        &self.access
    }

    /// Does this rule apply to the request?
    pub fn matches(&self, method: &Method, path: &str) -> bool {
        let method_ok = self
            .methods
            .as_ref()
            .map_or(true, |methods| methods.contains(method));
        method_ok && self.pattern.matches(path)
    }

    /// True for a method-agnostic `/**` rule
    pub fn is_catch_all(&self) -> bool {
        self.methods.is_none() && self.pattern.is_catch_all()
    }

    /// Whether every request matched by `other` is also matched by `self`
    pub fn covers(&self, other: &RouteRule) -> bool {
        let methods_covered = match (&self.methods, &other.methods) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(mine), Some(theirs)) => theirs.iter().all(|m| mine.contains(m)),
        };
        methods_covered && self.pattern.covers(&other.pattern)
    }
}

/// A rule that can never match because an earlier rule swallows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shadowing {
    /// Index of the unreachable rule
    pub rule_index: usize,
    /// Index of the earlier rule that covers it
    pub shadowed_by: usize,
    /// True when the unreachable rule would have granted different access
    pub conflicting: bool,
}

/// Process-wide, read-only table consulted once per request.
#[derive(Debug, Clone, Default)]
pub struct RoutePolicyTable {
    rules: Vec<RouteRule>,
}

impl RoutePolicyTable {
    /// Build a table without totality checks. Lookups may return `None`.
    pub fn new(rules: Vec<RouteRule>) -> Self {
        Self { rules }
    }

    /// Start a checked builder
    pub fn builder() -> RoutePolicyBuilder {
        RoutePolicyBuilder::new()
    }

    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }

    /// First rule, in declared order, that applies to the request.
    pub fn classify(&self, method: &Method, path: &str) -> Option<(usize, &RouteRule)> {
        self.rules
            .iter()
            .enumerate()
            .find(|(_, rule)| rule.matches(method, path))
    }

    /// Whether the last rule guarantees every request is classified
    pub fn is_total(&self) -> bool {
        self.rules.last().is_some_and(RouteRule::is_catch_all)
    }

    /// Rules made unreachable by an earlier, broader rule.
    pub fn shadowed_rules(&self) -> Vec<Shadowing> {
        self.rules
            .iter()
            .enumerate()
            .filter_map(|(j, later)| {
                self.rules[..j]
                    .iter()
                    .position(|earlier| earlier.covers(later))
                    .map(|i| Shadowing {
                        rule_index: j,
                        shadowed_by: i,
                        conflicting: self.rules[i].access != later.access,
                    })
            })
            .collect()
    }
}

/// Declarative builder in the style of a security filter-chain DSL.
///
/// Pattern errors are collected and reported from [`build`](Self::build).
#[derive(Debug, Default)]
pub struct RoutePolicyBuilder {
    entries: Vec<(String, Option<Vec<Method>>, AccessLevel)>,
}

impl RoutePolicyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add rules for `patterns` with the given access, any method
    pub fn rule<'a>(
        mut self,
        patterns: impl IntoIterator<Item = &'a str>,
        access: AccessLevel,
    ) -> Self {
        for pattern in patterns {
            self.entries.push((pattern.to_string(), None, access.clone()));
        }
        self
    }

    /// Add rules restricted to `methods`
    pub fn method_rule<'a>(
        mut self,
        methods: &[Method],
        patterns: impl IntoIterator<Item = &'a str>,
        access: AccessLevel,
    ) -> Self {
        for pattern in patterns {
            self.entries
                .push((pattern.to_string(), Some(methods.to_vec()), access.clone()));
        }
        self
    }

    pub fn public<'a>(self, patterns: impl IntoIterator<Item = &'a str>) -> Self {
        self.rule(patterns, AccessLevel::Public)
    }

    pub fn authenticated<'a>(self, patterns: impl IntoIterator<Item = &'a str>) -> Self {
        self.rule(patterns, AccessLevel::Authenticated)
    }

    pub fn has_role<'a>(self, patterns: impl IntoIterator<Item = &'a str>, role: &str) -> Self {
        self.rule(patterns, AccessLevel::Role(Role::new(role)))
    }

    /// Trailing catch-all requiring authentication
    pub fn any_request_authenticated(self) -> Self {
        self.authenticated(["/**"])
    }

    /// Compile the table, enforcing a trailing catch-all.
    pub fn build(self) -> Result<RoutePolicyTable, PolicyError> {
        let rules = self
            .entries
            .into_iter()
            .map(|(raw, methods, access)| {
                let rule = RouteRule::new(PathPattern::parse(&raw)?, access);
                Ok(match methods {
                    Some(methods) => rule.with_methods(methods),
                    None => rule,
                })
            })
            .collect::<Result<Vec<_>, PolicyError>>()?;

        let table = RoutePolicyTable::new(rules);
        if !table.is_total() {
            return Err(PolicyError::NotTotal);
        }

        for shadow in table.shadowed_rules() {
            let rule = &table.rules[shadow.rule_index];
            let by = &table.rules[shadow.shadowed_by];
            warn!(
                rule_index = shadow.rule_index,
                pattern = %rule.pattern,
                access = %rule.access,
                shadowed_by = %by.pattern,
                effective_access = %by.access,
                conflicting = shadow.conflicting,
                "Route rule is unreachable"
            );
        }

        Ok(table)
    }
}
