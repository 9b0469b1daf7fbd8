// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::fmt;

use thiserror::Error as ThisError;

use crate::model::{ColumnDescriptor, SqlType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ThisError)]
pub enum ValidationError {
    #[error("expected an integer")]
    InvalidInt,
    #[error("integer out of range for {0}")]
    IntOutOfRange(&'static str),
    #[error("expected a decimal number")]
    InvalidDecimal,
}

pub type ValidationResult<T> = std::result::Result<T, ValidationError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnIssue {
    pub column: String,
    pub error: ValidationError,
}

impl fmt::Display for ColumnIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "column '{}': {}", self.column, self.error)
    }
}

pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Comma is accepted as the decimal separator.
pub fn normalize_decimal(value: &str) -> String {
    value.trim().replace(',', ".")
}

/// Checks `value` against the parse rule of `sql_type`.
///
/// Blank input is always valid and yields `None`. Numeric input yields its
/// normalized text; anything else is returned unchanged.
pub fn validate_input(value: &str, sql_type: &SqlType) -> ValidationResult<Option<String>> {
    if is_blank(value) {
        return Ok(None);
    }
    if !sql_type.is_numeric() {
        return Ok(Some(value.to_owned()));
    }

    let normalized = normalize_decimal(value);
    match sql_type {
        SqlType::SmallInt => parse_int::<i16>(&normalized, "smallint")?,
        SqlType::Integer => parse_int::<i32>(&normalized, "integer")?,
        SqlType::BigInt => parse_int::<i64>(&normalized, "bigint")?,
        _ => parse_decimal(&normalized)?,
    }
    Ok(Some(normalized))
}

pub fn is_valid_input(value: &str, sql_type: &SqlType) -> bool {
    validate_input(value, sql_type).is_ok()
}

/// Validates one input per column and collects every failure.
pub fn validate_inputs(
    inputs: &[String],
    columns: &[ColumnDescriptor],
) -> std::result::Result<Vec<Option<String>>, Vec<ColumnIssue>> {
    let mut values = Vec::with_capacity(inputs.len());
    let mut issues = Vec::new();
    for (input, column) in inputs.iter().zip(columns) {
        match validate_input(input, &column.sql_type) {
            Ok(value) => values.push(value),
            Err(error) => issues.push(ColumnIssue {
                column: column.display_name.clone(),
                error,
            }),
        }
    }

    if issues.is_empty() {
        Ok(values)
    } else {
        Err(issues)
    }
}

fn parse_int<T>(value: &str, type_name: &'static str) -> ValidationResult<()>
where
    T: std::str::FromStr<Err = std::num::ParseIntError>,
{
    match value.parse::<T>() {
        Ok(_) => Ok(()),
        Err(error) => match error.kind() {
            std::num::IntErrorKind::PosOverflow | std::num::IntErrorKind::NegOverflow => {
                Err(ValidationError::IntOutOfRange(type_name))
            }
            _ => Err(ValidationError::InvalidInt),
        },
    }
}

fn parse_decimal(value: &str) -> ValidationResult<()> {
    let looks_numeric = value
        .chars()
        .all(|ch| ch.is_ascii_digit() || matches!(ch, '.' | '-' | '+' | 'e' | 'E'));
    if !looks_numeric {
        return Err(ValidationError::InvalidDecimal);
    }
    match value.parse::<f64>() {
        Ok(parsed) if parsed.is_finite() => Ok(()),
        _ => Err(ValidationError::InvalidDecimal),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ValidationError, is_valid_input, normalize_decimal, validate_input, validate_inputs,
    };
    use crate::model::{ColumnDescriptor, SqlType};

    fn column(name: &str, sql_type: SqlType) -> ColumnDescriptor {
        ColumnDescriptor {
            original_name: name.to_owned(),
            display_name: name.to_owned(),
            udt_name: sql_type.as_str().to_owned(),
            sql_type,
            has_default: false,
        }
    }

    #[test]
    fn comma_decimal_normalizes_to_dot() {
        assert_eq!(
            validate_input("12,5", &SqlType::Numeric),
            Ok(Some("12.5".to_owned()))
        );
        assert_eq!(normalize_decimal(" 3,25 "), "3.25");
    }

    #[test]
    fn integer_rejects_text_and_fractions() {
        assert_eq!(
            validate_input("abc", &SqlType::Integer),
            Err(ValidationError::InvalidInt)
        );
        assert!(!is_valid_input("1,5", &SqlType::Integer));
        assert!(is_valid_input("-42", &SqlType::Integer));
    }

    #[test]
    fn integer_range_follows_column_width() {
        assert_eq!(
            validate_input("40000", &SqlType::SmallInt),
            Err(ValidationError::IntOutOfRange("smallint"))
        );
        assert!(is_valid_input("40000", &SqlType::Integer));
        assert!(is_valid_input("9000000000", &SqlType::BigInt));
    }

    #[test]
    fn blank_is_valid_for_every_type() {
        for sql_type in [
            SqlType::Integer,
            SqlType::Numeric,
            SqlType::Real,
            SqlType::text(),
        ] {
            assert_eq!(validate_input("   ", &sql_type), Ok(None));
        }
    }

    #[test]
    fn decimal_rejects_non_finite_spellings() {
        assert!(!is_valid_input("NaN", &SqlType::DoublePrecision));
        assert!(!is_valid_input("inf", &SqlType::Real));
        assert!(is_valid_input("1e3", &SqlType::Real));
    }

    #[test]
    fn text_values_pass_through_untouched() {
        assert_eq!(
            validate_input(" O'Brien ", &SqlType::text()),
            Ok(Some(" O'Brien ".to_owned()))
        );
    }

    #[test]
    fn validate_inputs_aggregates_every_failure() {
        let columns = vec![
            column("name", SqlType::text()),
            column("age", SqlType::Integer),
            column("price", SqlType::Numeric),
        ];
        let inputs = vec!["Ann".to_owned(), "x".to_owned(), "y".to_owned()];

        let issues = validate_inputs(&inputs, &columns).expect_err("two columns are invalid");
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].column, "age");
        assert_eq!(issues[1].error, ValidationError::InvalidDecimal);
    }
}
