use chrono::{NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

use crate::error::ApiError;

/// Per-field validation rules. Fields without `Required` skip their remaining
/// rules when the submitted value is empty after trimming.
#[derive(Debug, Clone)]
pub enum Rule {
    Required,
    NumericRange {
        min: Option<f64>,
        max: Option<f64>,
    },
    Regex {
        pattern: &'static str,
        message: &'static str,
    },
    MinLength(usize),
    MaxLength(usize),
    DateValid {
        not_future: bool,
        not_past: bool,
    },
    Email,
    /// Compared against the other field's submitted value, not its name
    MatchField {
        other: String,
        message: &'static str,
    },
    OneOf(&'static [&'static str]),
}

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex"));

/// Accumulates one error message per failing field. All fields are evaluated
/// independently; nothing is persisted while any field fails.
#[derive(Debug, Default)]
pub struct FormValidator {
    errors: BTreeMap<String, String>,
}

impl FormValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, field: &str, value: &str, rules: &[Rule]) -> &mut Self {
        let trimmed = value.trim();
        let required = rules.iter().any(|r| matches!(r, Rule::Required));

        if trimmed.is_empty() {
            if required {
                self.errors
                    .insert(field.to_string(), "This field is required".to_string());
            }
            return self;
        }

        for rule in rules {
            if matches!(rule, Rule::Required) {
                continue;
            }
            if let Err(message) = apply_rule(trimmed, rule) {
                self.errors.insert(field.to_string(), message);
                break;
            }
        }
        self
    }

    /// Merge an error produced outside the rule set (e.g. the async
    /// parent-ownership check) under the selecting field's name
    pub fn add_error(&mut self, field: &str, message: impl Into<String>) -> &mut Self {
        self.errors.insert(field.to_string(), message.into());
        self
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &BTreeMap<String, String> {
        &self.errors
    }

    pub fn finish(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation_error(self.errors))
        }
    }
}

fn apply_rule(value: &str, rule: &Rule) -> Result<(), String> {
    match rule {
        Rule::Required => Ok(()),

        Rule::NumericRange { min, max } => {
            let number: f64 = value
                .parse()
                .map_err(|_| "Must be a number".to_string())?;
            match (min, max) {
                (Some(lo), Some(hi)) if number < *lo || number > *hi => Err(format!(
                    "Must be between {} and {}",
                    format_bound(*lo),
                    format_bound(*hi)
                )),
                (Some(lo), None) if number < *lo => {
                    Err(format!("Must be at least {}", format_bound(*lo)))
                }
                (None, Some(hi)) if number > *hi => {
                    Err(format!("Must be at most {}", format_bound(*hi)))
                }
                _ => Ok(()),
            }
        }

        Rule::Regex { pattern, message } => {
            let re = Regex::new(pattern).map_err(|e| {
                tracing::error!("Invalid validation pattern {:?}: {}", pattern, e);
                message.to_string()
            })?;
            if re.is_match(value) {
                Ok(())
            } else {
                Err(message.to_string())
            }
        }

        Rule::MinLength(n) => {
            if value.chars().count() < *n {
                Err(format!("Must be at least {} characters", n))
            } else {
                Ok(())
            }
        }

        Rule::MaxLength(n) => {
            if value.chars().count() > *n {
                Err(format!("Must be at most {} characters", n))
            } else {
                Ok(())
            }
        }

        Rule::DateValid {
            not_future,
            not_past,
        } => {
            let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .map_err(|_| "Must be a valid date (YYYY-MM-DD)".to_string())?;
            let today = Utc::now().date_naive();
            if *not_future && date > today {
                return Err("Date cannot be in the future".to_string());
            }
            if *not_past && date < today {
                return Err("Date cannot be in the past".to_string());
            }
            Ok(())
        }

        Rule::Email => {
            if EMAIL_RE.is_match(value) {
                Ok(())
            } else {
                Err("Must be a valid email address".to_string())
            }
        }

        Rule::MatchField { other, message } => {
            if value == other {
                Ok(())
            } else {
                Err(message.to_string())
            }
        }

        Rule::OneOf(allowed) => {
            if allowed.contains(&value) {
                Ok(())
            } else {
                Err(format!("Must be one of: {}", allowed.join(", ")))
            }
        }
    }
}

fn format_bound(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_error(field: &str, value: &str, rules: &[Rule]) -> Option<String> {
        let mut v = FormValidator::new();
        v.check(field, value, rules);
        v.errors().get(field).cloned()
    }

    #[test]
    fn required_rejects_whitespace_only() {
        assert_eq!(
            single_error("name", "   ", &[Rule::Required]),
            Some("This field is required".to_string())
        );
        assert_eq!(single_error("name", "North Field", &[Rule::Required]), None);
    }

    #[test]
    fn optional_empty_field_skips_other_rules() {
        assert_eq!(
            single_error("salary", "", &[Rule::NumericRange { min: Some(0.0), max: None }]),
            None
        );
    }

    #[test]
    fn quantity_bounds_are_inclusive() {
        let rules = [
            Rule::Required,
            Rule::Regex {
                pattern: r"^[0-9]+$",
                message: "Must be a whole number",
            },
            Rule::NumericRange {
                min: Some(1.0),
                max: Some(1000.0),
            },
        ];
        assert_eq!(single_error("quantity", "1", &rules), None);
        assert_eq!(single_error("quantity", "1000", &rules), None);
        assert_eq!(
            single_error("quantity", "0", &rules),
            Some("Must be between 1 and 1000".to_string())
        );
        assert_eq!(
            single_error("quantity", "1001", &rules),
            Some("Must be between 1 and 1000".to_string())
        );
        assert_eq!(
            single_error("quantity", "12.5", &rules),
            Some("Must be a whole number".to_string())
        );
    }

    #[test]
    fn date_rules_reject_impossible_and_future_dates() {
        let rules = [Rule::DateValid {
            not_future: true,
            not_past: false,
        }];
        assert_eq!(
            single_error("hire_date", "2023-02-30", &rules),
            Some("Must be a valid date (YYYY-MM-DD)".to_string())
        );

        let today = Utc::now().date_naive();
        assert_eq!(
            single_error("hire_date", &today.format("%Y-%m-%d").to_string(), &rules),
            None
        );
        let tomorrow = today.succ_opt().unwrap();
        assert_eq!(
            single_error("hire_date", &tomorrow.format("%Y-%m-%d").to_string(), &rules),
            Some("Date cannot be in the future".to_string())
        );
    }

    #[test]
    fn email_rule_checks_shape() {
        assert_eq!(single_error("email", "jo@farm.example", &[Rule::Email]), None);
        assert!(single_error("email", "not-an-email", &[Rule::Email]).is_some());
        assert!(single_error("email", "two@at@signs", &[Rule::Email]).is_some());
    }

    #[test]
    fn match_field_compares_submitted_values() {
        let rule = [Rule::MatchField {
            other: "hunter2".to_string(),
            message: "Passwords do not match",
        }];
        assert_eq!(single_error("password_confirm", "hunter2", &rule), None);
        assert_eq!(
            single_error("password_confirm", "hunter3", &rule),
            Some("Passwords do not match".to_string())
        );
    }

    #[test]
    fn one_of_lists_allowed_values() {
        let rules = [Rule::OneOf(&["checkup", "vaccination"])];
        assert_eq!(single_error("record_type", "checkup", &rules), None);
        assert_eq!(
            single_error("record_type", "grooming", &rules),
            Some("Must be one of: checkup, vaccination".to_string())
        );
    }

    #[test]
    fn fields_are_validated_independently() {
        let mut v = FormValidator::new();
        v.check("name", "", &[Rule::Required]);
        v.check("quantity", "0", &[Rule::NumericRange { min: Some(1.0), max: Some(1000.0) }]);
        assert_eq!(v.errors().len(), 2);
        assert!(v.errors().contains_key("name"));
        assert!(v.errors().contains_key("quantity"));
    }

    #[test]
    fn first_failing_rule_wins_within_a_field() {
        let rules = [
            Rule::MinLength(5),
            Rule::NumericRange {
                min: Some(0.0),
                max: None,
            },
        ];
        assert_eq!(
            single_error("code", "abc", &rules),
            Some("Must be at least 5 characters".to_string())
        );
    }

    #[test]
    fn finish_converts_to_validation_error() {
        let mut v = FormValidator::new();
        v.check("name", "", &[Rule::Required]);
        let err = v.finish().unwrap_err();
        assert_eq!(err.status_code(), 400);
    }
}
