//! Naming utilities for code generation

use std::collections::BTreeMap;

use heck::{ToShoutySnakeCase, ToUpperCamelCase};
use regex::Regex;

/// Kysely's camelCase mapping: every `_` is dropped and the character after
/// it is uppercased. Everything else is left untouched.
///
/// e.g., "user_status" -> "userStatus", "FooBar" -> "FooBar"
pub fn to_kysely_camel_case(value: &str) -> String {
    let mut output = String::with_capacity(value.len());
    let mut previous = None;
    for c in value.chars() {
        if c != '_' {
            if previous == Some('_') {
                output.extend(c.to_uppercase());
            } else {
                output.push(c);
            }
        }
        previous = Some(c);
    }
    output
}

/// Kysely camelCase with the first character uppercased
/// e.g., "foo_bar" -> "FooBar", "a_b" -> "AB"
pub fn to_kysely_pascal_case(value: &str) -> String {
    let camel = to_kysely_camel_case(value);
    let mut chars = camel.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Split a string into words.
///
/// Separators are any non-alphanumeric characters. Inside a run, a new word
/// starts at a lower-to-upper transition, at the last capital of an acronym
/// followed by a lowercase letter ("HTTPServer" -> "HTTP", "Server") and at
/// letter/digit transitions.
pub fn to_words(value: &str) -> Vec<String> {
    let chars: Vec<char> = value.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }

        if let Some(last) = current.chars().last() {
            let boundary = if c.is_ascii_digit() {
                !last.is_ascii_digit()
            } else if last.is_ascii_digit() {
                true
            } else if c.is_uppercase() {
                let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
                last.is_lowercase() || (last.is_uppercase() && next_is_lower)
            } else {
                false
            };
            if boundary {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }

    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// e.g., "foo_bar" -> "FooBar", "HTTPServer" -> "HttpServer"
pub fn to_pascal_case(value: &str) -> String {
    to_words(value).join("_").to_upper_camel_case()
}

/// e.g., "foo_bar" -> "FOO_BAR", "FooBar" -> "FOO_BAR"
pub fn to_screaming_snake_case(value: &str) -> String {
    to_words(value).join("_").to_shouty_snake_case()
}

/// Check whether a property key can be emitted without quotes
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Irregular plurals (common in database contexts)
const IRREGULARS: &[(&str, &str)] = &[
    ("people", "person"),
    ("children", "child"),
    ("men", "man"),
    ("women", "woman"),
    ("feet", "foot"),
    ("teeth", "tooth"),
    ("mice", "mouse"),
    ("indices", "index"),
];

/// Words that are the same in singular and plural
const UNCOUNTABLES: &[&str] = &[
    "data",
    "equipment",
    "information",
    "metadata",
    "news",
    "series",
    "species",
];

/// Suffix rules, first match wins
const SUFFIX_RULES: &[(&str, &str)] = &[
    (r"(?i)(status|alias|bus|campus)es$", "$1"),
    (r"(?i)(analy|ba|diagno|the|synop|parenthe|cri)ses$", "${1}sis"),
    (r"(?i)(hero|potato|tomato|echo|veto)es$", "$1"),
    (r"(?i)(kni|wi|li)ves$", "${1}fe"),
    (r"(?i)(lea|shel|sel|hal|cal|loa|thie)ves$", "${1}f"),
    (r"(?i)([^aeiouy]|qu)ies$", "${1}y"),
    (r"(?i)(x|ch|sh|ss|z)es$", "$1"),
    (r"(?i)(ss|us|is)$", "$1"),
    (r"(?i)s$", ""),
];

/// Turns plural table names into singular interface names.
///
/// Custom rules (regex pattern -> replacement) are tried before the
/// built-in ones.
#[derive(Debug, Clone)]
pub struct Singularizer {
    rules: Vec<(Regex, String)>,
}

impl Singularizer {
    /// Build a singularizer from user rules plus the built-in rule set
    pub fn new(custom_rules: &BTreeMap<String, String>) -> Result<Self, regex::Error> {
        let mut rules = Vec::with_capacity(custom_rules.len() + SUFFIX_RULES.len());
        for (pattern, replacement) in custom_rules {
            rules.push((Regex::new(pattern)?, replacement.clone()));
        }
        for (pattern, replacement) in SUFFIX_RULES {
            rules.push((Regex::new(pattern)?, replacement.to_string()));
        }
        Ok(Self { rules })
    }

    /// Singularize the trailing word of a (possibly qualified) name
    pub fn singularize(&self, name: &str) -> String {
        let custom = self.rules.len() - SUFFIX_RULES.len();
        for (regex, replacement) in &self.rules[..custom] {
            if regex.is_match(name) {
                return regex.replace(name, replacement.as_str()).into_owned();
            }
        }

        let lower = name.to_lowercase();
        if UNCOUNTABLES
            .iter()
            .any(|word| ends_with_word(name, &lower, word))
        {
            return name.to_string();
        }
        for (plural, singular) in IRREGULARS {
            if ends_with_word(name, &lower, plural) {
                let start = name.len() - plural.len();
                return format!("{}{}", &name[..start], match_case(&name[start..], singular));
            }
        }

        for (regex, replacement) in &self.rules[custom..] {
            if regex.is_match(name) {
                return regex.replace(name, replacement.as_str()).into_owned();
            }
        }
        name.to_string()
    }
}

/// Whether `word` is the last whole word of `name`
fn ends_with_word(name: &str, lower: &str, word: &str) -> bool {
    if !lower.ends_with(word) {
        return false;
    }
    let start = name.len() - word.len();
    if start == 0 {
        return true;
    }
    let first = name[start..].chars().next();
    let before = name[..start].chars().last();
    matches!(before, Some(b) if !b.is_alphanumeric()) || first.is_some_and(|c| c.is_uppercase())
}

fn match_case(original: &str, replacement: &str) -> String {
    if original.chars().next().is_some_and(|c| c.is_uppercase()) {
        let mut chars = replacement.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    } else {
        replacement.to_string()
    }
}
