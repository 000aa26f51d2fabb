// 📐 Shape Layer - Form Validation
// Every create payload and patch is checked here before it reaches a store

use chrono::NaiveDate;

// ============================================================================
// VALIDATION RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub context: String,
}

impl ValidationError {
    pub fn new(
        context: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        ValidationError {
            field: field.into(),
            message: message.into(),
            context: context.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.context, self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// Anything that can be checked before being handed to a store.
pub trait Validate {
    fn validate(&self) -> ValidationResult;
}

// ============================================================================
// COLLECTOR
// ============================================================================

/// Accumulates every failure for one payload instead of stopping at the first.
#[derive(Debug)]
pub struct Checker {
    context: &'static str,
    errors: Vec<ValidationError>,
}

impl Checker {
    pub fn new(context: &'static str) -> Self {
        Checker {
            context,
            errors: Vec::new(),
        }
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .push(ValidationError::new(self.context, field, message));
    }

    /// Value must contain something other than whitespace.
    pub fn required(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.push(field, "Required field is empty");
        }
    }

    /// Same as `required`, but only when the field is part of a patch.
    pub fn required_if_present(&mut self, field: &str, value: Option<&str>) {
        if let Some(v) = value {
            self.required(field, v);
        }
    }

    /// Empty is allowed; anything else must be a `YYYY-MM-DD` calendar date.
    pub fn date(&mut self, field: &str, value: &str) {
        if value.is_empty() {
            return;
        }
        if NaiveDate::parse_from_str(value, "%Y-%m-%d").is_err() {
            self.push(field, format!("Expected YYYY-MM-DD, got '{}'", value));
        }
    }

    pub fn date_if_present(&mut self, field: &str, value: Option<&str>) {
        if let Some(v) = value {
            self.date(field, v);
        }
    }

    pub fn positive(&mut self, field: &str, value: i64) {
        if value <= 0 {
            self.push(field, format!("Must be greater than 0, got {}", value));
        }
    }

    pub fn at_most(&mut self, field: &str, value: i64, max: i64) {
        if value > max {
            self.push(field, format!("Must be at most {}, got {}", max, value));
        }
    }

    pub fn finish(self) -> ValidationResult {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

/// Join errors into one line for notifications and logs.
pub fn describe(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checker_collects_all_errors() {
        let mut check = Checker::new("Member");
        check.required("name", "   ");
        check.required("phone", "");
        check.positive("amount", 0);

        let errors = check.finish().unwrap_err();
        assert_eq!(errors.len(), 3);
        assert_eq!(errors[0].field, "name");
        assert_eq!(errors[1].field, "phone");
        assert_eq!(errors[2].field, "amount");
    }

    #[test]
    fn test_checker_passes_clean_input() {
        let mut check = Checker::new("Event");
        check.required("name", "Ibadah Minggu");
        check.date("date", "2026-04-20");
        check.date("birth_date", "");
        check.positive("amount", 1);

        assert!(check.finish().is_ok());
    }

    #[test]
    fn test_date_format_rejected() {
        let mut check = Checker::new("Event");
        check.date("date", "20/04/2026");
        check.date("other", "2026-02-30");

        let errors = check.finish().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].message.contains("YYYY-MM-DD"));
    }

    #[test]
    fn test_patch_helpers_skip_absent_fields() {
        let mut check = Checker::new("Member");
        check.required_if_present("name", None);
        check.date_if_present("join_date", None);
        assert!(check.finish().is_ok());

        let mut check = Checker::new("Member");
        check.required_if_present("name", Some(""));
        assert_eq!(check.finish().unwrap_err().len(), 1);
    }

    #[test]
    fn test_display_and_describe() {
        let errors = vec![
            ValidationError::new("Finance", "category", "Required field is empty"),
            ValidationError::new("Finance", "amount", "Must be greater than 0, got 0"),
        ];

        assert_eq!(
            errors[0].to_string(),
            "[Finance] category: Required field is empty"
        );
        assert_eq!(
            describe(&errors),
            "[Finance] category: Required field is empty; [Finance] amount: Must be greater than 0, got 0"
        );
    }
}
