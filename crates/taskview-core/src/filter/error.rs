//! Error types for filter parsing and compilation.

use thiserror::Error;

/// A specialized Result type for filter operations.
pub type FilterResult<T> = Result<T, FilterError>;

/// Errors that can occur while parsing or compiling a filter expression.
///
/// Every variant is a user-facing error: the caller should report it back
/// as a bad request rather than retrying.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FilterError {
    /// The filter expression is empty.
    #[error("filter expression is empty")]
    EmptyExpression,

    /// The field name does not resolve through the alias table.
    #[error("{}", format_unknown_field(field, suggestion.as_deref()))]
    InvalidFilterField {
        /// The field name as written in the filter.
        field: String,
        /// The closest known field name, if any is close enough.
        suggestion: Option<String>,
    },

    /// The value cannot be used with the field or comparator.
    #[error("invalid value '{value}' for field '{field}': {reason}")]
    InvalidFilterValue {
        /// The resolved field name.
        field: String,
        /// The offending value, as displayed.
        value: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// The comparator is not supported for this field.
    #[error("comparator '{comparator}' is not supported for field '{field}'")]
    InvalidComparator {
        /// The resolved field name.
        field: String,
        /// The comparator as written.
        comparator: String,
    },

    /// A field was not followed by a comparator.
    #[error("expected a comparator after field '{field}'")]
    MissingComparator {
        /// The field name as written.
        field: String,
    },

    /// A comparator was not followed by a value.
    #[error("missing value for field '{field}'")]
    MissingValue {
        /// The field name as written.
        field: String,
    },

    /// A value looked like a date but is not a valid calendar date.
    #[error("invalid date: {value}")]
    InvalidDate {
        /// The date text.
        value: String,
    },

    /// The timezone name is not a known IANA timezone.
    #[error("unknown timezone: {name}")]
    InvalidTimezone {
        /// The timezone name.
        name: String,
    },

    /// A quoted value was never closed.
    #[error("unterminated quote starting at position {position}")]
    UnterminatedQuote {
        /// Byte offset of the opening quote.
        position: usize,
    },

    /// An opening parenthesis was never closed.
    #[error("unclosed parenthesis")]
    UnclosedParenthesis,

    /// An unexpected token was encountered.
    #[error("unexpected token '{token}' at position {position}")]
    UnexpectedToken {
        /// The token text.
        token: String,
        /// Byte offset of the token.
        position: usize,
    },
}

impl FilterError {
    /// Creates an unknown field error.
    pub fn unknown_field(field: impl Into<String>, suggestion: Option<String>) -> Self {
        FilterError::InvalidFilterField {
            field: field.into(),
            suggestion,
        }
    }

    /// Creates an invalid value error.
    pub fn invalid_value(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        FilterError::InvalidFilterValue {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid comparator error.
    pub fn invalid_comparator(field: impl Into<String>, comparator: impl Into<String>) -> Self {
        FilterError::InvalidComparator {
            field: field.into(),
            comparator: comparator.into(),
        }
    }

    /// Creates an unexpected token error.
    pub fn unexpected_token(token: impl Into<String>, position: usize) -> Self {
        FilterError::UnexpectedToken {
            token: token.into(),
            position,
        }
    }

    /// Creates an invalid date error.
    pub fn invalid_date(value: impl Into<String>) -> Self {
        FilterError::InvalidDate {
            value: value.into(),
        }
    }
}

fn format_unknown_field(field: &str, suggestion: Option<&str>) -> String {
    let base = format!("unknown filter field '{}'", field);
    match suggestion {
        Some(s) => format!("{} (did you mean '{}'?)", base, s),
        None => base,
    }
}
