//! Flag-based page filtering.
//!
//! Section templates select pages by their boolean facets ("flags") with a
//! comma-separated expression:
//!
//! ```text
//! "pinned,!archived"   → has `pinned` AND does not have `archived`
//! ""                   → every page passes
//! ```
//!
//! Tokens are trimmed; empty tokens are ignored.

use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Condition {
    Has(String),
    Lacks(String),
}

impl Condition {
    fn holds(&self, flags: &[&str]) -> bool {
        match self {
            Condition::Has(flag) => flags.contains(&flag.as_str()),
            Condition::Lacks(flag) => !flags.contains(&flag.as_str()),
        }
    }
}

/// A parsed flag expression. All conditions must hold for a page to pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagFilter {
    conditions: Vec<Condition>,
}

impl FlagFilter {
    pub fn parse(expr: &str) -> Self {
        let conditions = expr
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(|token| match token.strip_prefix('!') {
                Some(flag) => Condition::Lacks(flag.trim().to_string()),
                None => Condition::Has(token.to_string()),
            })
            .collect();
        Self { conditions }
    }

    /// True when the filter has no conditions and lets everything through.
    pub fn is_identity(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn matches<S: AsRef<str>>(&self, flags: &[S]) -> bool {
        let flags: Vec<&str> = flags.iter().map(AsRef::as_ref).collect();
        self.conditions.iter().all(|c| c.holds(&flags))
    }

    /// Match a serialized page record by its `flags` array.
    ///
    /// Records without a `flags` array are treated as having no flags.
    pub fn matches_value(&self, page: &Value) -> bool {
        let flags: Vec<&str> = page
            .get("flags")
            .and_then(Value::as_array)
            .map(|flags| flags.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        self.matches(&flags)
    }
}
