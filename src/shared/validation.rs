//! Validation Utilities

use validator::ValidationErrors;

use super::error::{AppError, FieldError};

/// Convert validation errors to AppError
pub fn validation_error(errors: ValidationErrors) -> AppError {
    let field_errors: Vec<FieldError> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| FieldError {
                field: field.to_string(),
                message: e.message.clone().map(|m| m.to_string()).unwrap_or_default(),
            })
        })
        .collect();

    let message = field_errors
        .first()
        .map(|e| format!("{}: {}", e.field, e.message))
        .unwrap_or_else(|| "Validation failed".into());

    AppError::Validation(message)
}

/// Parse a snowflake id sent as a string.
pub fn parse_id(raw: &str, what: &str) -> Result<i64, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid {} ID", what)))
}

/// Parse a list of ids, silently skipping blank or malformed entries.
pub fn parse_id_list<I, S>(raw: I) -> Vec<i64>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raw.into_iter()
        .flat_map(|s| {
            s.as_ref()
                .split(',')
                .filter_map(|part| part.trim().parse().ok())
                .collect::<Vec<i64>>()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id_list_skips_garbage() {
        let ids = parse_id_list(["1", " 2 ", "abc", "", "3,4"]);
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_parse_id_rejects_non_numeric() {
        assert!(matches!(parse_id("x1", "room"), Err(AppError::BadRequest(_))));
        assert_eq!(parse_id(" 42 ", "room").unwrap(), 42);
    }
}
