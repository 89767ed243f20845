//! Validator factories
//!
//! A validator holds its configuration and turns a candidate value into a
//! [`Check`]: `config -> value -> check`. Both validators treat nil values as
//! failures. Whether a nil cell is validated at all is the host's gating
//! decision, not theirs.
//!
//! The email rule only looks for an `@`. That is a known limitation of the
//! import rules, kept as is.

use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt;

use super::check::Check;
use super::message::Message;
use crate::guard::Value;

/// Text of the message produced by the email validator.
pub const INVALID_EMAIL: &str = "Invalid email address.";

/// Text of the message produced by the pattern validator.
pub const INVALID_FORMAT: &str = "Value does not meet required format.";

/// Text of the message for an option cell that is not a stored key.
pub const INVALID_OPTION: &str = "Value is not one of the allowed options.";

/// Turns a candidate value into a deferred check.
pub trait Validator {
    fn check<'a>(&'a self, value: &'a Value) -> Check<'a>;
}

/// A compiled regular expression that keeps its source text.
#[derive(Clone)]
pub struct Pattern {
    regex: Regex,
}

impl Pattern {
    /// 8 to 72 characters of anything but a newline.
    pub const PASSWORD: &'static str = r"^.{8,72}$";
    /// ASCII letters and digits only, at least one.
    pub const ALPHANUMERIC: &'static str = r"^[a-zA-Z0-9]+$";

    /// Compiles `source`.
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(source)?,
        })
    }

    pub fn password() -> Self {
        Self::new(Self::PASSWORD).expect("password pattern compiles")
    }

    pub fn alphanumeric() -> Self {
        Self::new(Self::ALPHANUMERIC).expect("alphanumeric pattern compiles")
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Tests the value's text; nil values never match.
    pub fn is_match(&self, value: &Value) -> bool {
        value
            .match_text()
            .map_or(false, |text| self.regex.is_match(&text))
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.as_str()).finish()
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for Pattern {}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Fails when the value has no `@`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmailValidator;

impl Validator for EmailValidator {
    fn check<'a>(&'a self, value: &'a Value) -> Check<'a> {
        validate_email(value)
    }
}

/// Fails when the value does not match a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternValidator {
    pattern: Pattern,
}

impl PatternValidator {
    pub fn new(pattern: Pattern) -> Self {
        Self { pattern }
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }
}

impl Validator for PatternValidator {
    fn check<'a>(&'a self, value: &'a Value) -> Check<'a> {
        validate_pattern(&self.pattern, value)
    }
}

/// Email-shape check over `value`.
pub fn validate_email(value: &Value) -> Check<'_> {
    Box::new(move || {
        let has_at = value.as_str().map_or(false, |s| s.contains('@'));
        (!has_at).then(|| Message::error(INVALID_EMAIL))
    })
}

/// Pattern check of `value` against `pattern`.
pub fn validate_pattern<'a>(pattern: &'a Pattern, value: &'a Value) -> Check<'a> {
    Box::new(move || (!pattern.is_match(value)).then(|| Message::error(INVALID_FORMAT)))
}

/// Declarative validator attached to a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldValidator {
    Email,
    Pattern { pattern: Pattern },
}

impl FieldValidator {
    pub fn pattern(pattern: Pattern) -> Self {
        FieldValidator::Pattern { pattern }
    }

    /// Password length bounds.
    pub fn password() -> Self {
        Self::pattern(Pattern::password())
    }

    /// Letters and digits only.
    pub fn alphanumeric() -> Self {
        Self::pattern(Pattern::alphanumeric())
    }
}

impl Validator for FieldValidator {
    fn check<'a>(&'a self, value: &'a Value) -> Check<'a> {
        match self {
            FieldValidator::Email => validate_email(value),
            FieldValidator::Pattern { pattern } => validate_pattern(pattern, value),
        }
    }
}
