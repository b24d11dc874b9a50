use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::rules::{AlphaNumRule, AlphaRule, ConstraintRule, IdRule, InRule, NumRule, Rule};

/// A placeholder constraint as written on a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// `":name:param:param"` when it starts with the delimiter, otherwise a literal regex.
    Pattern(String),
    /// `[name, param, param, ...]`.
    List(Vec<String>),
}

impl Constraint {
    /// Parse into `(rule name, params)`. `None` when no rule is named.
    fn parse(&self, delimiter: char) -> Option<(&str, Vec<String>)> {
        match self {
            Constraint::Pattern(pattern) => {
                let rest = pattern.strip_prefix(delimiter)?;
                let rest = rest.trim_start_matches(delimiter);
                let mut parts = rest.split(delimiter);
                let name = parts.next()?;
                Some((name, parts.map(str::to_owned).collect()))
            }
            Constraint::List(items) => {
                let (name, params) = items.split_first()?;
                Some((name.as_str(), params.to_vec()))
            }
        }
    }
}

impl From<&str> for Constraint {
    fn from(value: &str) -> Self {
        Constraint::Pattern(value.to_owned())
    }
}

impl From<String> for Constraint {
    fn from(value: String) -> Self {
        Constraint::Pattern(value)
    }
}

impl From<Vec<String>> for Constraint {
    fn from(value: Vec<String>) -> Self {
        Constraint::List(value)
    }
}

impl From<Vec<&str>> for Constraint {
    fn from(value: Vec<&str>) -> Self {
        Constraint::List(value.into_iter().map(str::to_owned).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Constraint {
    fn from(value: [&str; N]) -> Self {
        Constraint::List(value.iter().map(|s| (*s).to_owned()).collect())
    }
}

/// Registry of named constraint rules.
///
/// Ships with `alpha`, `num`, `alphaNum`, `id` and `in`.
#[derive(Clone)]
pub struct Constrainer {
    rules: HashMap<String, Arc<dyn ConstraintRule>>,
    inline: HashMap<String, Rule>,
    delimiter: char,
}

impl Default for Constrainer {
    fn default() -> Self {
        Self::new()
    }
}

impl Constrainer {
    #[must_use]
    pub fn new() -> Self {
        Self::with_delimiter(':')
    }

    #[must_use]
    pub fn with_delimiter(delimiter: char) -> Self {
        let mut constrainer = Self {
            rules: HashMap::new(),
            inline: HashMap::new(),
            delimiter,
        };
        constrainer
            .add_rule("alpha", AlphaRule)
            .add_rule("num", NumRule)
            .add_rule("alphaNum", AlphaNumRule)
            .add_rule("id", IdRule::default())
            .add_rule("in", InRule);
        constrainer
    }

    /// Register (or replace) a rule.
    pub fn add_rule(&mut self, name: &str, rule: impl ConstraintRule + 'static) -> &mut Self {
        self.inline.remove(name);
        self.rules.insert(name.to_owned(), Arc::new(rule));
        self
    }

    /// Start a fresh inline rule under `name`, replacing any existing one.
    pub fn rule(&mut self, name: &str) -> &mut Rule {
        self.rules.remove(name);
        self.inline.insert(name.to_owned(), Rule::new());
        self.inline.entry(name.to_owned()).or_default()
    }

    #[must_use]
    pub fn has_rule(&self, name: &str) -> bool {
        self.inline.contains_key(name) || self.rules.contains_key(name)
    }

    fn lookup(&self, name: &str) -> Option<&dyn ConstraintRule> {
        if let Some(rule) = self.inline.get(name) {
            return Some(rule as &dyn ConstraintRule);
        }
        self.rules.get(name).map(|rule| rule.as_ref())
    }

    /// Regex fragment for a constraint.
    ///
    /// An unknown rule degrades to the constraint itself used as a literal
    /// pattern; the list form has no literal reading and yields `None`.
    #[must_use]
    pub fn regex(&self, constraint: &Constraint) -> Option<String> {
        let parsed = constraint.parse(self.delimiter);
        match parsed.and_then(|(name, params)| Some((self.lookup(name)?, params))) {
            Some((rule, params)) => rule.regex(&params),
            None => match constraint {
                Constraint::Pattern(pattern) => Some(pattern.clone()),
                Constraint::List(_) => None,
            },
        }
    }

    /// Post-match check. Unknown rules accept every value.
    #[must_use]
    pub fn matches(&self, constraint: &Constraint, value: &str) -> bool {
        let Some((name, params)) = constraint.parse(self.delimiter) else {
            return true;
        };
        self.lookup(name)
            .map_or(true, |rule| rule.matches(value, &params))
    }
}

impl fmt::Debug for Constrainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self
            .rules
            .keys()
            .chain(self.inline.keys())
            .map(String::as_str)
            .collect();
        names.sort_unstable();
        f.debug_struct("Constrainer")
            .field("rules", &names)
            .field("delimiter", &self.delimiter)
            .finish()
    }
}
