//! Include/exclude table patterns

use globset::{GlobBuilder, GlobMatcher};
use regex::Regex;

use crate::error::Result;

/// `(a|b)` alternation groups, rewritten to glob brace lists
const ALTERNATION: &str = r"\(([^()]*\|[^()]*)\)";

/// A case-insensitive glob over table names.
///
/// Patterns support `*`, `?`, `{a,b}` brace lists, `(a|b)` alternation and a
/// leading `!` to negate. A pattern containing `.` is matched against
/// `schema.table`, otherwise against the bare table name.
#[derive(Debug, Clone)]
pub struct TableMatcher {
    matcher: GlobMatcher,
    negated: bool,
    qualified: bool,
}

impl TableMatcher {
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern = pattern.trim();
        let (negated, pattern) = match pattern.strip_prefix('!') {
            Some(rest) => (true, rest.trim_start()),
            None => (false, pattern),
        };

        let pattern = Regex::new(ALTERNATION)?.replace_all(pattern, |caps: &regex::Captures| {
            format!("{{{}}}", caps[1].replace('|', ","))
        });
        let matcher = GlobBuilder::new(&pattern)
            .case_insensitive(true)
            .literal_separator(false)
            .build()?
            .compile_matcher();

        Ok(Self {
            matcher,
            negated,
            qualified: pattern.contains('.'),
        })
    }

    pub fn is_match(&self, schema: Option<&str>, table: &str) -> bool {
        let matched = if self.qualified {
            match schema {
                Some(schema) => self.matcher.is_match(format!("{}.{}", schema, table)),
                None => self.matcher.is_match(table),
            }
        } else {
            self.matcher.is_match(table)
        };
        matched != self.negated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard() {
        let matcher = TableMatcher::new("user*").unwrap();
        assert!(matcher.is_match(Some("public"), "users"));
        assert!(matcher.is_match(None, "USER_ROLES"));
        assert!(!matcher.is_match(None, "accounts"));
    }

    #[test]
    fn test_schema_qualified_pattern() {
        let matcher = TableMatcher::new("public.*").unwrap();
        assert!(matcher.is_match(Some("public"), "users"));
        assert!(!matcher.is_match(Some("audit"), "users"));
    }

    #[test]
    fn test_alternation_and_braces() {
        let alternation = TableMatcher::new("(users|orders)").unwrap();
        assert!(alternation.is_match(None, "users"));
        assert!(alternation.is_match(None, "orders"));
        assert!(!alternation.is_match(None, "items"));

        let braces = TableMatcher::new("{users,orders}").unwrap();
        assert!(braces.is_match(None, "orders"));
    }

    #[test]
    fn test_negation() {
        let matcher = TableMatcher::new("!*_archive").unwrap();
        assert!(matcher.is_match(None, "users"));
        assert!(!matcher.is_match(None, "users_archive"));
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(TableMatcher::new("{unclosed").is_err());
    }
}
