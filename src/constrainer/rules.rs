use std::fmt;
use std::sync::Arc;

/// A named constraint strategy.
///
/// `params` are the values following the rule name in the constraint
/// (`":id:5:10"` → `["5", "10"]`).
pub trait ConstraintRule: Send + Sync {
    /// Regex fragment for the placeholder, `None` to keep the default capture.
    fn regex(&self, params: &[String]) -> Option<String>;

    /// Check run on a non-empty captured value.
    fn matches(&self, _value: &str, _params: &[String]) -> bool {
        true
    }
}

/// `{n}`, `{min,max}` or `{min,}` over a character class; `+` without params.
fn quantified(class: &str, params: &[String]) -> String {
    if params.is_empty() {
        return format!("{class}+");
    }
    let bounds: Vec<&str> = params.iter().take(2).map(String::as_str).collect();
    format!("{class}{{{}}}", bounds.join(","))
}

/// Letters only.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlphaRule;

impl ConstraintRule for AlphaRule {
    fn regex(&self, params: &[String]) -> Option<String> {
        Some(quantified("[a-zA-Z]", params))
    }
}

/// Digits only.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumRule;

impl ConstraintRule for NumRule {
    fn regex(&self, params: &[String]) -> Option<String> {
        Some(quantified("[0-9]", params))
    }
}

/// Letters and digits.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlphaNumRule;

impl ConstraintRule for AlphaNumRule {
    fn regex(&self, params: &[String]) -> Option<String> {
        Some(quantified("[a-zA-Z0-9]", params))
    }
}

/// Bounded unsigned identifier.
///
/// The regex limits the digit count (`params[0]`, else `max_len`); the
/// post-match check enforces a minimum value (`params[1]`, else `min_number`).
#[derive(Debug, Clone, Copy)]
pub struct IdRule {
    pub max_len: u32,
    pub min_number: u128,
}

impl Default for IdRule {
    fn default() -> Self {
        Self {
            max_len: 21,
            min_number: 1,
        }
    }
}

impl ConstraintRule for IdRule {
    fn regex(&self, params: &[String]) -> Option<String> {
        let max_len = params
            .first()
            .and_then(|p| p.parse::<u32>().ok())
            .unwrap_or(self.max_len);
        Some(format!("[0-9]{{1,{max_len}}}"))
    }

    fn matches(&self, value: &str, params: &[String]) -> bool {
        let min = params
            .get(1)
            .and_then(|p| p.parse::<u128>().ok())
            .unwrap_or(self.min_number);
        match value.parse::<u128>() {
            Ok(n) => n >= min,
            // Digit strings past u128 are larger than any minimum.
            Err(_) => !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()),
        }
    }
}

/// Membership in the listed values. Contributes no regex.
#[derive(Debug, Clone, Copy, Default)]
pub struct InRule;

impl ConstraintRule for InRule {
    fn regex(&self, _params: &[String]) -> Option<String> {
        None
    }

    fn matches(&self, value: &str, params: &[String]) -> bool {
        params.iter().any(|p| p == value)
    }
}

type RegexFn = Arc<dyn Fn(&[String]) -> Option<String> + Send + Sync>;
type MatchFn = Arc<dyn Fn(&str, &[String]) -> bool + Send + Sync>;

#[derive(Clone)]
enum RuleRegex {
    Fixed(String),
    Computed(RegexFn),
}

/// Ad-hoc rule assembled from a fixed regex or closures.
///
/// ```rust,ignore
/// router.rule("slug").regex("[a-z0-9-]+");
/// router.rule("even").regex("[0-9]+").matches(|value, _| {
///     value.parse::<u64>().is_ok_and(|n| n % 2 == 0)
/// });
/// ```
#[derive(Clone, Default)]
pub struct Rule {
    regex: Option<RuleRegex>,
    matches: Option<MatchFn>,
}

impl Rule {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn regex(&mut self, regex: impl Into<String>) -> &mut Self {
        self.regex = Some(RuleRegex::Fixed(regex.into()));
        self
    }

    /// Regex computed from the constraint params.
    pub fn regex_with<F>(&mut self, regex: F) -> &mut Self
    where
        F: Fn(&[String]) -> Option<String> + Send + Sync + 'static,
    {
        self.regex = Some(RuleRegex::Computed(Arc::new(regex)));
        self
    }

    pub fn matches<F>(&mut self, matches: F) -> &mut Self
    where
        F: Fn(&str, &[String]) -> bool + Send + Sync + 'static,
    {
        self.matches = Some(Arc::new(matches));
        self
    }
}

impl ConstraintRule for Rule {
    fn regex(&self, params: &[String]) -> Option<String> {
        match &self.regex {
            None => None,
            Some(RuleRegex::Fixed(regex)) => Some(regex.clone()),
            Some(RuleRegex::Computed(regex)) => regex(params),
        }
    }

    fn matches(&self, value: &str, params: &[String]) -> bool {
        self.matches
            .as_ref()
            .map_or(true, |matches| matches(value, params))
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let regex = match &self.regex {
            None => None,
            Some(RuleRegex::Fixed(regex)) => Some(regex.as_str()),
            Some(RuleRegex::Computed(_)) => Some("<computed>"),
        };
        f.debug_struct("Rule")
            .field("regex", &regex)
            .field("matches", &self.matches.is_some())
            .finish()
    }
}
