//! Prompt specifications and input validation.
//!
//! A prompt is a single-turn request for user input plus the validator
//! applied to the raw reply on the next turn. Three variants cover the
//! bots' needs: free text (optionally regex-checked), a fixed choice
//! list, and a Yes/No confirmation.

use crate::error::{ValidationError, ValidationResult};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Email format accepted by the profile backend.
const EMAIL_PATTERN: &str = r"^[a-z0-9_.-]+@[a-z0-9.-]+\.[a-z.]{2,6}$";

/// Phone format accepted by the profile backend (dashes required).
const PHONE_PATTERN: &str = r"^\d{3}-\d{3}-\d{4}$";

/// Labels used by [`PromptSpec::Confirm`].
pub const CONFIRM_LABELS: [&str; 2] = ["Yes", "No"];

/// A regex check applied to free-text input, with the corrective message
/// shown when the input does not match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextValidator {
    pattern: String,
    message: String,
}

impl TextValidator {
    /// Create a validator from a pattern and a corrective message.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern is not a valid regex.
    pub fn new(pattern: impl Into<String>, message: impl Into<String>) -> Result<Self, regex::Error> {
        let pattern = pattern.into();
        Regex::new(&pattern)?;
        Ok(Self {
            pattern,
            message: message.into(),
        })
    }

    /// Validator for email addresses (`xxx.xxx@xxx.xxx`).
    #[must_use]
    pub fn email() -> Self {
        Self {
            pattern: EMAIL_PATTERN.to_string(),
            message: "I'm sorry, but you did not provide the email address in the correct \
                      format xxx.xxx@xxx.xxx."
                .to_string(),
        }
    }

    /// Validator for phone numbers (`XXX-XXX-XXXX`).
    #[must_use]
    pub fn phone() -> Self {
        Self {
            pattern: PHONE_PATTERN.to_string(),
            message: "I'm sorry, but you did not provide the phone number in the correct \
                      format XXX-XXX-XXXX."
                .to_string(),
        }
    }

    /// The corrective message for this validator.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Check the raw input against the pattern.
    fn check(&self, raw: &str) -> ValidationResult<()> {
        // Pattern was checked at construction; a broken stored pattern is
        // treated as a format failure rather than a panic.
        let matched = Regex::new(&self.pattern)
            .map(|re| re.is_match(&raw.to_lowercase()))
            .unwrap_or(false);
        if matched {
            Ok(())
        } else {
            Err(ValidationError::Format {
                message: self.message.clone(),
            })
        }
    }
}

/// The specification of a single-turn input request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PromptSpec {
    /// Free-form text, optionally regex-validated.
    Text {
        /// Optional format check applied to the reply.
        validator: Option<TextValidator>,
    },
    /// A fixed, ordered list of labels; case-sensitive exact match.
    Choice {
        /// The offered labels, in display order.
        labels: Vec<String>,
    },
    /// Yes/No confirmation producing a boolean.
    Confirm,
}

impl PromptSpec {
    /// A free-text prompt with no format check.
    #[must_use]
    pub const fn text() -> Self {
        Self::Text { validator: None }
    }

    /// A free-text prompt validated by the given check.
    #[must_use]
    pub const fn validated(validator: TextValidator) -> Self {
        Self::Text {
            validator: Some(validator),
        }
    }

    /// A choice prompt over the given labels.
    #[must_use]
    pub fn choice<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Choice {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    /// Validate raw user input against this spec.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the input fails the format check
    /// or is not one of the offered labels.
    pub fn validate(&self, raw: &str) -> ValidationResult<PromptValue> {
        let raw = raw.trim();
        match self {
            Self::Text { validator } => {
                if let Some(v) = validator {
                    v.check(raw)?;
                }
                Ok(PromptValue::Text(raw.to_string()))
            }
            Self::Choice { labels } => {
                if labels.iter().any(|l| l == raw) {
                    Ok(PromptValue::Choice(raw.to_string()))
                } else {
                    Err(ValidationError::NotAChoice {
                        input: raw.to_string(),
                    })
                }
            }
            Self::Confirm => match raw {
                "Yes" => Ok(PromptValue::Confirmed(true)),
                "No" => Ok(PromptValue::Confirmed(false)),
                _ => Err(ValidationError::NotAChoice {
                    input: raw.to_string(),
                }),
            },
        }
    }

    /// Render the outbound message for this prompt: the prompt text plus
    /// the choice labels, if any.
    #[must_use]
    pub fn render(&self, text: &str) -> String {
        match self {
            Self::Text { .. } => text.to_string(),
            Self::Choice { labels } => render_with_labels(text, labels.iter().map(String::as_str)),
            Self::Confirm => render_with_labels(text, CONFIRM_LABELS.iter().copied()),
        }
    }
}

fn render_with_labels<'a>(text: &str, labels: impl Iterator<Item = &'a str>) -> String {
    let mut out = text.to_string();
    for (i, label) in labels.enumerate() {
        out.push_str(&format!("\n  {}. {label}", i + 1));
    }
    out
}

/// The validated value produced by a prompt.
///
/// Transient: consumed by the following step and then either stored into
/// the frame's values or discarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PromptValue {
    /// Validated free-text input.
    Text(String),
    /// The selected choice label.
    Choice(String),
    /// Result of a Yes/No confirmation.
    Confirmed(bool),
}

impl PromptValue {
    /// The value as text, when it carries text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) | Self::Choice(s) => Some(s),
            Self::Confirmed(_) => None,
        }
    }

    /// The value as a confirmation result.
    #[must_use]
    pub const fn as_confirmed(&self) -> Option<bool> {
        match self {
            Self::Confirmed(b) => Some(*b),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validator() {
        let spec = PromptSpec::validated(TextValidator::email());
        assert!(spec.validate("a.b@c.com").is_ok());
        assert!(spec.validate("a@b").is_err());
        assert!(spec.validate("a.b@c").is_err());
    }

    #[test]
    fn test_phone_validator() {
        let spec = PromptSpec::validated(TextValidator::phone());
        assert!(spec.validate("123-456-7890").is_ok());
        assert!(spec.validate("1234567890").is_err());
        assert!(spec.validate("12-345-6789").is_err());
    }

    #[test]
    fn test_choice_is_case_sensitive() {
        let spec = PromptSpec::choice(["Main Menu", "Say Goodbye"]);
        assert_eq!(
            spec.validate("Main Menu").unwrap(),
            PromptValue::Choice("Main Menu".into())
        );
        assert!(spec.validate("main menu").is_err());
        assert!(spec.validate("Quit").is_err());
    }

    #[test]
    fn test_confirm() {
        assert_eq!(
            PromptSpec::Confirm.validate("Yes").unwrap(),
            PromptValue::Confirmed(true)
        );
        assert_eq!(
            PromptSpec::Confirm.validate("No").unwrap(),
            PromptValue::Confirmed(false)
        );
        assert!(PromptSpec::Confirm.validate("maybe").is_err());
    }

    #[test]
    fn test_render_includes_labels() {
        let spec = PromptSpec::choice(["Address", "Phone", "Email"]);
        let rendered = spec.render("Please choose:");
        assert!(rendered.starts_with("Please choose:"));
        assert!(rendered.contains("1. Address"));
        assert!(rendered.contains("3. Email"));
    }

    #[test]
    fn test_free_text_trims() {
        let spec = PromptSpec::text();
        assert_eq!(
            spec.validate("  hello  ").unwrap(),
            PromptValue::Text("hello".into())
        );
    }

    #[test]
    fn test_bad_pattern_rejected() {
        assert!(TextValidator::new("(unclosed", "msg").is_err());
    }
}
