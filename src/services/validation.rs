use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;

use super::error::ServiceError;

/// Per-field validation messages collected before a request is rejected
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    errors: BTreeMap<String, String>,
}

impl FieldErrors {
    /// Record a message for `field`; the first message per field wins
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors.entry(field.to_string()).or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn into_map(self) -> HashMap<String, String> {
        self.errors.into_iter().collect()
    }

    pub fn into_result(self) -> Result<(), ServiceError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::Validation(self))
        }
    }

    /// Trimmed length must fall inside `min..=max` characters
    pub fn length(&mut self, field: &str, value: &str, min: usize, max: usize) {
        let len = value.trim().chars().count();
        if len < min {
            if min == 1 {
                self.add(field, "This field is required");
            } else {
                self.add(field, format!("Must be at least {} characters", min));
            }
        } else if len > max {
            self.add(field, format!("Must be at most {} characters", max));
        }
    }

    pub fn email(&mut self, field: &str, value: &str) {
        if !is_valid_email(value) {
            self.add(field, "Invalid email address");
        }
    }

    pub fn phone(&mut self, field: &str, value: &str) {
        if !is_valid_phone(value) {
            self.add(field, "Invalid phone number");
        }
    }

    /// Value must fit a `NUMERIC(precision, scale)` column
    pub fn numeric(&mut self, field: &str, value: Decimal, precision: u32, scale: u32) {
        let bound = Decimal::from(10i64.pow(precision - scale));
        if value.normalize().scale() > scale {
            self.add(field, format!("Must have at most {} decimal places", scale));
        } else if value.abs() >= bound {
            self.add(field, format!("Must be less than {}", bound));
        }
    }

    /// Amounts stored as NUMERIC(12,2)
    pub fn money(&mut self, field: &str, value: Decimal) {
        self.numeric(field, value, 12, 2);
    }

    pub fn password(&mut self, field: &str, value: &str, min_length: usize) {
        if value.chars().count() < min_length {
            self.add(field, format!("Password must be at least {} characters", min_length));
        }
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.errors.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// Lowercase and trim for storage and comparison
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.is_empty() || email.len() > 254 || email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|l| !l.is_empty())
}

/// 7-20 characters of digits and `+()- .`, with at least 7 digits
pub fn is_valid_phone(phone: &str) -> bool {
    let phone = phone.trim();
    let len = phone.chars().count();
    if !(7..=20).contains(&len) {
        return false;
    }
    if !phone.chars().all(|c| c.is_ascii_digit() || "+()- .".contains(c)) {
        return false;
    }
    phone.chars().filter(char::is_ascii_digit).count() >= 7
}

/// Trim optional free text, turning blanks into None
pub fn clean_optional(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails() {
        assert!(is_valid_email("tina@example.com"));
        assert!(is_valid_email("  Tina.T+rent@mail.example.co  "));
        assert!(!is_valid_email("tina@example"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("tina@@example.com"));
        assert!(!is_valid_email("ti na@example.com"));
        assert!(!is_valid_email("tina@example..com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn phones() {
        assert!(is_valid_phone("+1 (512) 555-0100"));
        assert!(is_valid_phone("5125550100"));
        assert!(!is_valid_phone("555-01"));
        assert!(!is_valid_phone("call me maybe"));
        assert!(!is_valid_phone("+++ --- ()()"));
    }

    #[test]
    fn normalizes_email() {
        assert_eq!(normalize_email("  Tina@Example.COM "), "tina@example.com");
    }

    #[test]
    fn collects_first_error_per_field() {
        let mut errors = FieldErrors::default();
        errors.length("firstName", "  ", 1, 100);
        errors.add("firstName", "second message");
        errors.email("email", "nope");
        assert_eq!(errors.get("firstName"), Some("This field is required"));
        assert_eq!(errors.get("email"), Some("Invalid email address"));
        assert!(errors.clone().into_result().is_err());
        assert_eq!(errors.to_string(), "email: Invalid email address, firstName: This field is required");
    }

    #[test]
    fn length_bounds() {
        let mut errors = FieldErrors::default();
        errors.length("name", &"x".repeat(101), 1, 100);
        errors.length("code", "ab", 3, 10);
        assert_eq!(errors.get("name"), Some("Must be at most 100 characters"));
        assert_eq!(errors.get("code"), Some("Must be at least 3 characters"));
    }

    #[test]
    fn numeric_bounds_follow_column_precision() {
        let mut errors = FieldErrors::default();
        errors.numeric("bathrooms", Decimal::new(995, 1), 3, 1);
        errors.money("rentAmount", Decimal::new(999_999_999_999, 2));
        errors.money("deposit", Decimal::new(150000, 2));
        assert!(errors.is_empty());

        errors.numeric("bathrooms", Decimal::from(100), 3, 1);
        errors.numeric("halfBath", Decimal::new(125, 2), 3, 1);
        errors.money("rentAmount", Decimal::from(100_000_000_000i64));
        errors.money("lateFee", Decimal::new(10001, 3));
        assert_eq!(errors.get("bathrooms"), Some("Must be less than 100"));
        assert_eq!(errors.get("halfBath"), Some("Must have at most 1 decimal places"));
        assert_eq!(errors.get("rentAmount"), Some("Must be less than 10000000000"));
        assert_eq!(errors.get("lateFee"), Some("Must have at most 2 decimal places"));
    }

    #[test]
    fn trailing_zeros_do_not_count_as_precision() {
        let mut errors = FieldErrors::default();
        errors.money("amount", Decimal::new(12_5000, 4));
        assert!(errors.is_empty());
    }

    #[test]
    fn clean_optional_drops_blanks() {
        assert_eq!(clean_optional(Some("  ".into())), None);
        assert_eq!(clean_optional(Some(" hi ".into())), Some("hi".into()));
        assert_eq!(clean_optional(None), None);
    }
}
