//! Parameter rule trees
//!
//! A descriptor's parameter contract is a small combinator tree over
//! parameter names: `all_of` groups are mandatory, `one_of` groups are
//! alternatives, `one_of_required` groups must have at least one member
//! supplied. `extras` lists names that are always accepted but never
//! required (typically consumed by hooks rather than the request).
//!
//! The tree answers three questions: which supplied keys are unexpected,
//! which keys are missing, and how to render the contract as help text.

use crate::error::ParameterError;
use crate::suggest;

/// One node of the rule tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleNode {
    /// A single parameter name
    Key(String),
    /// Every child must be satisfied
    AllOf(Vec<RuleNode>),
    /// Alternatives; satisfied by whichever child matches best, never an
    /// error when none do
    OneOf(Vec<RuleNode>),
    /// Alternatives of which at least one must be satisfied
    OneOfRequired(Vec<RuleNode>),
}

pub fn key(name: impl Into<String>) -> RuleNode {
    RuleNode::Key(name.into())
}

pub fn all_of(children: impl IntoIterator<Item = RuleNode>) -> RuleNode {
    RuleNode::AllOf(children.into_iter().collect())
}

pub fn one_of(children: impl IntoIterator<Item = RuleNode>) -> RuleNode {
    RuleNode::OneOf(children.into_iter().collect())
}

pub fn one_of_required(children: impl IntoIterator<Item = RuleNode>) -> RuleNode {
    RuleNode::OneOfRequired(children.into_iter().collect())
}

impl RuleNode {
    /// Render the contract, e.g. `("image" and ("keypair" or "userdata"))`.
    pub fn help(&self) -> String {
        match self {
            RuleNode::Key(name) => format!("\"{}\"", name),
            RuleNode::AllOf(children) => Self::joined(children, " and "),
            RuleNode::OneOf(children) | RuleNode::OneOfRequired(children) => {
                Self::joined(children, " or ")
            }
        }
    }

    fn joined(children: &[RuleNode], sep: &str) -> String {
        let hints: Vec<String> = children.iter().map(RuleNode::help).collect();
        format!("({})", hints.join(sep))
    }

    /// True when `name` appears nowhere in the tree.
    pub fn unexpected(&self, name: &str) -> bool {
        match self {
            RuleNode::Key(key) => key != name,
            RuleNode::AllOf(children)
            | RuleNode::OneOf(children)
            | RuleNode::OneOfRequired(children) => children.iter().all(|c| c.unexpected(name)),
        }
    }

    /// Missing keys, number of satisfied keys, and group errors for the
    /// supplied key set.
    fn missings(&self, keys: &[&str]) -> (Vec<String>, usize, Vec<String>) {
        match self {
            RuleNode::Key(name) => {
                if keys.contains(&name.as_str()) {
                    (Vec::new(), 1, Vec::new())
                } else {
                    (vec![name.clone()], 0, Vec::new())
                }
            }
            RuleNode::AllOf(children) => {
                let mut missing = Vec::new();
                let mut found = 0;
                let mut errors = Vec::new();
                for child in children {
                    let (m, f, e) = child.missings(keys);
                    errors.extend(e);
                    if m.is_empty() {
                        found += f;
                    } else {
                        missing.extend(m);
                    }
                }
                (missing, found, errors)
            }
            RuleNode::OneOf(children) => {
                let (missing, found, errors) = Self::best_alternative(children, keys);
                if found == 0 {
                    // Nothing supplied from an optional group is fine.
                    return (Vec::new(), 0, errors);
                }
                (missing, found, errors)
            }
            RuleNode::OneOfRequired(children) => {
                let (missing, found, mut errors) = Self::best_alternative(children, keys);
                if found == 0 {
                    errors.push(format!("expecting {}", self.help()));
                    // The group error already names every alternative.
                    return (Vec::new(), 0, errors);
                }
                (missing, found, errors)
            }
        }
    }

    /// Alternatives resolve to the child matching the most supplied keys.
    fn best_alternative(children: &[RuleNode], keys: &[&str]) -> (Vec<String>, usize, Vec<String>) {
        let mut best: Option<(Vec<String>, usize)> = None;
        for child in children {
            let (m, f, _) = child.missings(keys);
            match &best {
                Some((_, best_found)) if f <= *best_found => {}
                _ => best = Some((m, f)),
            }
        }
        let (missing, found) = best.unwrap_or_default();
        (missing, found, Vec::new())
    }

    /// Every key named anywhere in the tree.
    pub fn all_keys(&self) -> Vec<String> {
        match self {
            RuleNode::Key(name) => vec![name.clone()],
            RuleNode::AllOf(children)
            | RuleNode::OneOf(children)
            | RuleNode::OneOfRequired(children) => {
                children.iter().flat_map(RuleNode::all_keys).collect()
            }
        }
    }

    /// Keys required regardless of which alternatives are chosen: key nodes
    /// reachable without passing through an alternative group.
    pub fn unconditional_keys(&self) -> Vec<String> {
        match self {
            RuleNode::Key(name) => vec![name.clone()],
            RuleNode::AllOf(children) => children
                .iter()
                .flat_map(RuleNode::unconditional_keys)
                .collect(),
            RuleNode::OneOf(_) | RuleNode::OneOfRequired(_) => Vec::new(),
        }
    }
}

/// A descriptor's full parameter contract: rule tree plus free extras.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamRule {
    pub tree: Option<RuleNode>,
    pub extras: Vec<String>,
}

/// Outcome of checking supplied keys against a rule.
#[derive(Debug, Default)]
pub struct RuleReport {
    /// Keys the rule still wants
    pub missing: Vec<String>,
    /// Unexpected keys and unsatisfied groups
    pub errors: Vec<ParameterError>,
}

impl ParamRule {
    pub fn new(tree: RuleNode) -> Self {
        Self {
            tree: Some(tree),
            extras: Vec::new(),
        }
    }

    pub fn with_extras(mut self, extras: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.extras.extend(extras.into_iter().map(Into::into));
        self
    }

    /// Check supplied keys; unexpected keys carry a closest-name suggestion.
    pub fn verify(&self, keys: &[&str]) -> RuleReport {
        let mut report = RuleReport::default();
        let Some(tree) = &self.tree else {
            // No contract: only extras are accepted.
            for k in keys {
                if !self.extras.iter().any(|e| e == k) {
                    report.errors.push(self.unknown(k));
                }
            }
            return report;
        };

        for k in keys {
            if tree.unexpected(k) && !self.extras.iter().any(|e| e == k) {
                report.errors.push(self.unknown(k));
            }
        }

        let (missing, _, group_errors) = tree.missings(keys);
        report.missing = missing;
        report
            .errors
            .extend(group_errors.into_iter().map(ParameterError::Rule));
        report
    }

    fn unknown(&self, name: &str) -> ParameterError {
        let candidates = self.accepted_keys();
        ParameterError::Unknown {
            name: name.to_string(),
            suggestion: suggest::closest(name, candidates.iter().map(String::as_str)),
        }
    }

    /// Every key the rule accepts, extras included.
    pub fn accepted_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .tree
            .as_ref()
            .map(RuleNode::all_keys)
            .unwrap_or_default();
        keys.extend(self.extras.iter().cloned());
        keys
    }

    /// Keys required in every case.
    pub fn required_keys(&self) -> Vec<String> {
        self.tree
            .as_ref()
            .map(RuleNode::unconditional_keys)
            .unwrap_or_default()
    }

    /// Accepted keys that are not unconditionally required.
    pub fn optional_keys(&self) -> Vec<String> {
        let required = self.required_keys();
        self.accepted_keys()
            .into_iter()
            .filter(|k| !required.contains(k))
            .collect()
    }

    pub fn help(&self) -> String {
        let tree_help = self
            .tree
            .as_ref()
            .map(RuleNode::help)
            .unwrap_or_else(|| "(none)".to_string());
        if self.extras.is_empty() {
            tree_help
        } else {
            format!(
                "{} or extra params: \"{}\"",
                tree_help,
                self.extras.join("\", \"")
            )
        }
    }
}
