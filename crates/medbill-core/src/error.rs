//! # Errors
//!
//! ```text
//! ValidationError ──► CoreError ──► ApiError (400 / 401)
//!                                      ▲
//!                          DbError ────┘ (medbill-db)
//! ```
//!
//! Missing rows are reported by the database layer, so nothing here means
//! "not found".

use thiserror::Error;

/// Business rule violations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Unknown email, wrong password, or an account with no password set.
    /// The three cases are deliberately indistinguishable to the caller.
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("A bill needs at least one item")]
    EmptyBill,

    /// Every line priced at zero.
    #[error("Bill total must be greater than zero")]
    NonPositiveBillTotal,

    /// Arithmetic on stored amounts left the representable range. Only
    /// rows written around validation can get here.
    #[error("{0} is out of range")]
    AmountOverflow(&'static str),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Rejected request input, raised before anything is written.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be greater than zero")]
    MustBePositive { field: String },

    #[error("{field} cannot be negative")]
    MustNotBeNegative { field: String },

    /// Unparseable email, date or amount.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}
