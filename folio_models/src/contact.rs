use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

/// Accepts anything shaped like `local@domain.tld`.
pub static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

/// The unsent content of the contact form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormDraft {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl FormDraft {
    pub fn get(&self, field: ContactField) -> &str {
        match field {
            ContactField::Name => &self.name,
            ContactField::Email => &self.email,
            ContactField::Subject => &self.subject,
            ContactField::Message => &self.message,
        }
    }

    pub fn set(&mut self, field: ContactField, value: String) {
        let slot = match field {
            ContactField::Name => &mut self.name,
            ContactField::Email => &mut self.email,
            ContactField::Subject => &mut self.subject,
            ContactField::Message => &mut self.message,
        };
        *slot = value;
    }

    pub fn is_empty(&self) -> bool {
        ContactField::ALL
            .iter()
            .all(|&field| self.get(field).is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactField {
    Name,
    Email,
    Subject,
    Message,
}

impl ContactField {
    pub const ALL: [Self; 4] = [Self::Name, Self::Email, Self::Subject, Self::Message];

    /// The member name used for this field in the stored draft.
    pub fn key(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Subject => "subject",
            Self::Message => "message",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SubmissionState {
    #[default]
    Idle,
    Submitting,
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSeverity {
    Ok,
    Warn,
    Max,
}

/// Soft and hard limits on the length of a message, counted in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageLengthPolicy {
    soft_limit: usize,
    hard_limit: usize,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MessageLengthPolicyError {
    #[error("The hard limit must be greater than zero.")]
    ZeroHardLimit,
    #[error("The soft limit ({soft_limit}) exceeds the hard limit ({hard_limit}).")]
    SoftAboveHard {
        soft_limit: usize,
        hard_limit: usize,
    },
}

impl MessageLengthPolicy {
    pub const DEFAULT_SOFT_LIMIT: usize = 500;
    pub const DEFAULT_HARD_LIMIT: usize = 1000;

    pub fn new(soft_limit: usize, hard_limit: usize) -> Result<Self, MessageLengthPolicyError> {
        if hard_limit == 0 {
            return Err(MessageLengthPolicyError::ZeroHardLimit);
        }
        if soft_limit > hard_limit {
            return Err(MessageLengthPolicyError::SoftAboveHard {
                soft_limit,
                hard_limit,
            });
        }
        Ok(Self {
            soft_limit,
            hard_limit,
        })
    }

    pub fn soft_limit(&self) -> usize {
        self.soft_limit
    }

    pub fn hard_limit(&self) -> usize {
        self.hard_limit
    }

    /// Truncates `message` to at most `hard_limit` characters.
    pub fn clamp(&self, mut message: String) -> String {
        if let Some((idx, _)) = message.char_indices().nth(self.hard_limit) {
            message.truncate(idx);
        }
        message
    }

    pub fn severity(&self, len: usize) -> MessageSeverity {
        if len >= self.hard_limit {
            MessageSeverity::Max
        } else if len >= self.soft_limit {
            MessageSeverity::Warn
        } else {
            MessageSeverity::Ok
        }
    }

    /// Fraction of the hard limit used by a message of length `len`, capped
    /// at `1.0`.
    pub fn fill_ratio(&self, len: usize) -> f64 {
        (len as f64 / self.hard_limit as f64).min(1.0)
    }
}

impl Default for MessageLengthPolicy {
    fn default() -> Self {
        Self {
            soft_limit: Self::DEFAULT_SOFT_LIMIT,
            hard_limit: Self::DEFAULT_HARD_LIMIT,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn clamp_truncates_at_hard_limit() {
        let policy = MessageLengthPolicy::new(3, 5).unwrap();
        for (input, expected) in [
            ("", ""),
            ("abc", "abc"),
            ("abcde", "abcde"),
            ("abcdef", "abcde"),
            ("äöüßéèà", "äöüßé"),
        ] {
            assert_eq!(policy.clamp(input.into()), expected);
        }

        let long = "x".repeat(MessageLengthPolicy::DEFAULT_HARD_LIMIT + 250);
        let clamped = MessageLengthPolicy::default().clamp(long);
        assert_eq!(clamped.chars().count(), MessageLengthPolicy::DEFAULT_HARD_LIMIT);
    }

    #[test]
    fn field_keys_match_serialized_draft() {
        let draft = FormDraft {
            name: "a".into(),
            email: "b".into(),
            subject: "c".into(),
            message: "d".into(),
        };
        let value = serde_json::to_value(&draft).unwrap();
        for field in ContactField::ALL {
            assert_eq!(value[field.key()], draft.get(field));
        }
    }

    #[test]
    fn severity_thresholds() {
        let policy = MessageLengthPolicy::default();
        assert_eq!(policy.severity(0), MessageSeverity::Ok);
        assert_eq!(policy.severity(499), MessageSeverity::Ok);
        assert_eq!(policy.severity(500), MessageSeverity::Warn);
        assert_eq!(policy.severity(999), MessageSeverity::Warn);
        assert_eq!(policy.severity(1000), MessageSeverity::Max);
    }

    #[test]
    fn fill_ratio_is_capped() {
        let policy = MessageLengthPolicy::default();
        assert_eq!(policy.fill_ratio(250), 0.25);
        assert_eq!(policy.fill_ratio(5000), 1.0);
    }

    #[test]
    fn invalid_policies() {
        assert_eq!(
            MessageLengthPolicy::new(0, 0),
            Err(MessageLengthPolicyError::ZeroHardLimit)
        );
        assert_eq!(
            MessageLengthPolicy::new(10, 5),
            Err(MessageLengthPolicyError::SoftAboveHard {
                soft_limit: 10,
                hard_limit: 5
            })
        );
    }

    #[test]
    fn email_regex() {
        for (input, expected) in [
            ("max@example.com", true),
            ("max.mustermann@mail.example.de", true),
            ("not-an-email", false),
            ("max@example", false),
            ("max @example.com", false),
            ("@example.com", false),
            ("max@@example.com", false),
        ] {
            assert_eq!(EMAIL_REGEX.is_match(input), expected, "{input}");
        }
    }

    #[test]
    fn draft_fields() {
        let mut draft = FormDraft::default();
        assert!(draft.is_empty());

        draft.set(ContactField::Subject, "Hello".into());
        assert_eq!(draft.get(ContactField::Subject), "Hello");
        assert!(!draft.is_empty());
    }
}
