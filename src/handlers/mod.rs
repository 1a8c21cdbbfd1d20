// Handler tiers mirror the auth model:
// public (no auth) -> protected (Bearer JWT) -> admin (JWT + admin role)
pub mod admin;
pub mod protected;
pub mod public;

use crate::database::query::SqlParam;
use crate::error::ApiError;

/// Empty form inputs persist as NULL, not as empty strings
pub(crate) fn optional_text(value: &str) -> SqlParam {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        SqlParam::Null
    } else {
        SqlParam::Text(trimmed.to_string())
    }
}

// The parse helpers run after validation, so a failure here means the field
// skipped its rule set; surface it as a plain bad request.

pub(crate) fn parsed_f64(value: &str, field: &str) -> Result<f64, ApiError> {
    value
        .trim()
        .parse()
        .map_err(|_| ApiError::bad_request(format!("Invalid value for {}", field)))
}

pub(crate) fn parsed_i64(value: &str, field: &str) -> Result<i64, ApiError> {
    value
        .trim()
        .parse()
        .map_err(|_| ApiError::bad_request(format!("Invalid value for {}", field)))
}

pub(crate) fn parsed_i32(value: &str, field: &str) -> Result<i32, ApiError> {
    value
        .trim()
        .parse()
        .map_err(|_| ApiError::bad_request(format!("Invalid value for {}", field)))
}

pub(crate) fn parsed_date(value: &str, field: &str) -> Result<chrono::NaiveDate, ApiError> {
    chrono::NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| ApiError::bad_request(format!("Invalid value for {}", field)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_text_maps_blank_to_null() {
        assert_eq!(optional_text("  "), SqlParam::Null);
        assert_eq!(
            optional_text(" barn notes "),
            SqlParam::Text("barn notes".to_string())
        );
    }

    #[test]
    fn parsed_date_accepts_iso_only() {
        assert!(parsed_date("2024-03-01", "d").is_ok());
        assert!(parsed_date("03/01/2024", "d").is_err());
    }
}
