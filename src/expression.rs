//! Partial-credit sums such as `2+1,5+0,5`.
//!
//! Terms are non-negative decimals written with a comma separator and joined
//! by `+`. Any malformed piece rejects the whole expression.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExpressionError {
    #[error("expression is empty")]
    Empty,
    #[error("'{0}' is not allowed; use digits, '+' and ',' only")]
    InvalidCharacter(char),
    #[error("expression has an empty term")]
    EmptyTerm,
    #[error("'{0}' is not a number")]
    MalformedNumber(String),
}

/// Parses and sums an expression. Whitespace anywhere is ignored.
pub fn parse_expression(input: &str) -> Result<f64, ExpressionError> {
    let compact: String = input.chars().filter(|c| !c.is_whitespace()).collect();

    if compact.is_empty() {
        return Err(ExpressionError::Empty);
    }

    if let Some(bad) = compact
        .chars()
        .find(|c| !(c.is_ascii_digit() || *c == '+' || *c == ','))
    {
        return Err(ExpressionError::InvalidCharacter(bad));
    }

    compact.split('+').map(parse_term).sum()
}

fn parse_term(term: &str) -> Result<f64, ExpressionError> {
    if term.is_empty() {
        return Err(ExpressionError::EmptyTerm);
    }

    let malformed = || ExpressionError::MalformedNumber(term.to_string());

    let (whole, fraction) = match term.split_once(',') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (term, None),
    };

    if whole.is_empty() {
        return Err(malformed());
    }

    match fraction {
        None => whole.parse::<f64>().map_err(|_| malformed()),
        Some(fraction) if fraction.is_empty() || fraction.contains(',') => Err(malformed()),
        Some(fraction) => format!("{whole}.{fraction}")
            .parse::<f64>()
            .map_err(|_| malformed()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum_of_comma_decimals() {
        assert_eq!(parse_expression("2+1,5+0,5"), Ok(4.0));
    }

    #[test]
    fn test_single_term() {
        assert_eq!(parse_expression("7"), Ok(7.0));
        assert_eq!(parse_expression("0,5"), Ok(0.5));
    }

    #[test]
    fn test_whitespace_is_stripped() {
        assert_eq!(parse_expression(" 2 + 1,5\t+ 3 "), Ok(6.5));
    }

    #[test]
    fn test_dot_decimal_is_rejected() {
        assert_eq!(
            parse_expression("2+1.5"),
            Err(ExpressionError::InvalidCharacter('.'))
        );
    }

    #[test]
    fn test_other_characters_are_rejected() {
        assert_eq!(
            parse_expression("2-1"),
            Err(ExpressionError::InvalidCharacter('-'))
        );
        assert_eq!(
            parse_expression("abc"),
            Err(ExpressionError::InvalidCharacter('a'))
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(parse_expression(""), Err(ExpressionError::Empty));
        assert_eq!(parse_expression("   "), Err(ExpressionError::Empty));
    }

    #[test]
    fn test_empty_terms_are_rejected() {
        assert_eq!(parse_expression("2++1"), Err(ExpressionError::EmptyTerm));
        assert_eq!(parse_expression("+2"), Err(ExpressionError::EmptyTerm));
        assert_eq!(parse_expression("2+"), Err(ExpressionError::EmptyTerm));
    }

    #[test]
    fn test_malformed_numbers_are_rejected() {
        assert_eq!(
            parse_expression("1,5,5"),
            Err(ExpressionError::MalformedNumber("1,5,5".to_string()))
        );
        assert_eq!(
            parse_expression(",5"),
            Err(ExpressionError::MalformedNumber(",5".to_string()))
        );
        assert_eq!(
            parse_expression("2+3,"),
            Err(ExpressionError::MalformedNumber("3,".to_string()))
        );
    }

    #[test]
    fn test_no_partial_sum_on_error() {
        assert!(parse_expression("2+3+x").is_err());
    }
}
