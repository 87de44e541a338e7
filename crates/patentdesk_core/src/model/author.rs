//! Author sub-record model and contact validation.
//!
//! # Responsibility
//! - Define the author record keyed by `(patent_id, position_id)`.
//! - Validate contact fields before any persistence call.
//!
//! # Invariants
//! - An author entry is created or overwritten wholesale on each save;
//!   there are no field-level partial updates.
//! - Authors are deleted only as a cascade of patent deletion.

use crate::model::file_ref::FileRef;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$")
        .expect("email pattern is a valid regex")
});

static MOBILE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{10}$").expect("mobile pattern is a valid regex"));

/// Returns whether `email` matches a standard address shape.
pub fn validate_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Returns whether `mobile` is exactly ten digits.
pub fn validate_mobile(mobile: &str) -> bool {
    MOBILE_PATTERN.is_match(mobile)
}

/// Author/payment record for one position of one patent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub full_name: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub designation: String,
    #[serde(default)]
    pub college: String,
    pub email: String,
    pub mobile: String,
    /// Uploaded signature, when one has been provided.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<FileRef>,
    /// Payment amount as a display string; may be empty.
    #[serde(default)]
    pub amount: String,
    /// Outstanding amount as a display string; may be empty.
    #[serde(default)]
    pub pending_amount: String,
}

impl Author {
    /// Validates required fields and contact formats.
    pub fn validate(&self) -> Result<(), AuthorValidationError> {
        if self.full_name.trim().is_empty() {
            return Err(AuthorValidationError::MissingFullName);
        }
        if !validate_email(&self.email) {
            return Err(AuthorValidationError::InvalidEmail(self.email.clone()));
        }
        if !validate_mobile(&self.mobile) {
            return Err(AuthorValidationError::InvalidMobile(self.mobile.clone()));
        }
        Ok(())
    }
}

/// Field-level validation failure for an author record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorValidationError {
    MissingFullName,
    InvalidEmail(String),
    InvalidMobile(String),
}

impl Display for AuthorValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingFullName => write!(f, "author full name is required"),
            Self::InvalidEmail(email) => write!(f, "invalid email address `{email}`"),
            Self::InvalidMobile(mobile) => {
                write!(f, "invalid mobile number `{mobile}`; expected exactly 10 digits")
            }
        }
    }
}

impl Error for AuthorValidationError {}

#[cfg(test)]
mod tests {
    use super::{validate_email, validate_mobile, Author, AuthorValidationError};

    fn sample_author() -> Author {
        Author {
            full_name: "A. Kumar".to_string(),
            department: "Design".to_string(),
            designation: "Professor".to_string(),
            college: "NID".to_string(),
            email: "a@x.com".to_string(),
            mobile: "9876543210".to_string(),
            signature: None,
            amount: "1500".to_string(),
            pending_amount: "".to_string(),
        }
    }

    #[test]
    fn email_pattern_requires_dotted_domain() {
        assert!(!validate_email("foo@bar"));
        assert!(validate_email("foo@bar.com"));
        assert!(validate_email("first.last+tag@sub.example.org"));
        assert!(!validate_email("no-at-sign.example.com"));
    }

    #[test]
    fn mobile_pattern_requires_exactly_ten_digits() {
        assert!(validate_mobile("9876543210"));
        assert!(!validate_mobile("987654321"));
        assert!(!validate_mobile("98765432101"));
        assert!(!validate_mobile("98765x3210"));
    }

    #[test]
    fn validate_accepts_complete_record() {
        assert!(sample_author().validate().is_ok());
    }

    #[test]
    fn validate_rejects_blank_name_and_bad_contacts() {
        let mut author = sample_author();
        author.full_name = "   ".to_string();
        assert_eq!(
            author.validate(),
            Err(AuthorValidationError::MissingFullName)
        );

        let mut author = sample_author();
        author.email = "foo@bar".to_string();
        assert!(matches!(
            author.validate(),
            Err(AuthorValidationError::InvalidEmail(_))
        ));

        let mut author = sample_author();
        author.mobile = "12345".to_string();
        assert!(matches!(
            author.validate(),
            Err(AuthorValidationError::InvalidMobile(_))
        ));
    }
}
