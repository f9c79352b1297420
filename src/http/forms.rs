//! Form payloads and validation.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static EMAIL_RX: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
});

/// Collected validation failures. The first error per field wins.
#[derive(Debug, Default, Clone, Serialize)]
pub struct Validator {
    pub field_errors: BTreeMap<String, String>,
    pub non_field_errors: Vec<String>,
}

impl Validator {
    pub fn valid(&self) -> bool {
        self.field_errors.is_empty() && self.non_field_errors.is_empty()
    }

    pub fn add_field_error(&mut self, key: &str, message: &str) {
        self.field_errors
            .entry(key.to_owned())
            .or_insert_with(|| message.to_owned());
    }

    pub fn add_non_field_error(&mut self, message: &str) {
        self.non_field_errors.push(message.to_owned());
    }

    pub fn check_field(&mut self, ok: bool, key: &str, message: &str) {
        if !ok {
            self.add_field_error(key, message);
        }
    }
}

pub fn not_blank(value: &str) -> bool {
    !value.trim().is_empty()
}

pub fn max_chars(value: &str, n: usize) -> bool {
    value.chars().count() <= n
}

pub fn min_chars(value: &str, n: usize) -> bool {
    value.chars().count() >= n
}

pub fn permitted<T: PartialEq>(value: T, allowed: &[T]) -> bool {
    allowed.contains(&value)
}

pub fn is_email(value: &str) -> bool {
    EMAIL_RX
        .as_ref()
        .map(|rx| rx.is_match(value))
        .unwrap_or(false)
}

/// A form's submitted values together with its validation state, shaped the
/// way the templates read it (`form.title`, `form.field_errors.title`).
#[derive(Serialize)]
pub struct FormView<'a, T> {
    #[serde(flatten)]
    pub values: &'a T,
    pub field_errors: &'a BTreeMap<String, String>,
    pub non_field_errors: &'a [String],
}

impl<'a, T> FormView<'a, T> {
    pub fn new(values: &'a T, validator: &'a Validator) -> Self {
        Self {
            values,
            field_errors: &validator.field_errors,
            non_field_errors: &validator.non_field_errors,
        }
    }
}

pub const PERMITTED_EXPIRES: [i64; 3] = [1, 7, 365];

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SnippetCreateForm {
    pub title: String,
    pub content: String,
    pub expires: i64,
}

impl SnippetCreateForm {
    pub fn validate(&self) -> Validator {
        let mut v = Validator::default();
        v.check_field(not_blank(&self.title), "title", "This field cannot be blank");
        v.check_field(
            max_chars(&self.title, 100),
            "title",
            "This field cannot be more than 100 characters long",
        );
        v.check_field(not_blank(&self.content), "content", "This field cannot be blank");
        v.check_field(
            permitted(self.expires, &PERMITTED_EXPIRES),
            "expires",
            "This field must equal 1, 7 or 365",
        );
        v
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
}

impl SignupForm {
    pub fn validate(&self) -> Validator {
        let mut v = Validator::default();
        v.check_field(not_blank(&self.name), "name", "This field cannot be blank");
        v.check_field(not_blank(&self.email), "email", "This field cannot be blank");
        v.check_field(
            is_email(&self.email),
            "email",
            "This field must be a valid email address",
        );
        v.check_field(not_blank(&self.password), "password", "This field cannot be blank");
        v.check_field(
            min_chars(&self.password, 8),
            "password",
            "This field must be at least 8 characters long",
        );
        v
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LoginForm {
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Validator {
        let mut v = Validator::default();
        v.check_field(not_blank(&self.email), "email", "This field cannot be blank");
        v.check_field(
            is_email(&self.email),
            "email",
            "This field must be a valid email address",
        );
        v.check_field(not_blank(&self.password), "password", "This field cannot be blank");
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snippet_form_rules() {
        let ok = SnippetCreateForm {
            title: "t".into(),
            content: "c".into(),
            expires: 7,
        };
        assert!(ok.validate().valid());

        let bad = SnippetCreateForm {
            title: "x".repeat(101),
            content: "   ".into(),
            expires: 3,
        };
        let v = bad.validate();
        assert_eq!(
            v.field_errors["title"],
            "This field cannot be more than 100 characters long"
        );
        assert_eq!(v.field_errors["content"], "This field cannot be blank");
        assert_eq!(v.field_errors["expires"], "This field must equal 1, 7 or 365");
    }

    #[test]
    fn first_error_per_field_wins() {
        let form = SignupForm {
            name: "n".into(),
            email: String::new(),
            password: "longenough".into(),
        };
        assert_eq!(form.validate().field_errors["email"], "This field cannot be blank");
    }

    #[test]
    fn email_format() {
        assert!(is_email("alice@example.com"));
        assert!(is_email("a.b+c@sub.example.org"));
        assert!(!is_email("alice"));
        assert!(!is_email("alice@"));
        assert!(!is_email("@example.com"));
    }

    #[test]
    fn title_length_counts_chars_not_bytes() {
        assert!(max_chars(&"é".repeat(100), 100));
    }

    #[test]
    fn password_is_never_serialized() {
        let form = LoginForm {
            email: "a@b.com".into(),
            password: "secret".into(),
        };
        let json = serde_json::to_value(FormView::new(&form, &Validator::default())).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["email"], "a@b.com");
        assert!(json["field_errors"].as_object().unwrap().is_empty());
    }
}
