//! # Validation Module
//!
//! Input validation for every write the API accepts.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP (serde)                                                 │
//! │  └── Type validation (deserialization)                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Trimming and required fields                                      │
//! │  └── Ranges: quantities, prices, GST 0-100%                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK constraints (quantity >= 0, ...)                            │
//! │  └── UNIQUE constraints (item code per owner, ledger per item)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! String validators return the trimmed value so callers store exactly what
//! was checked.

use rust_decimal::Decimal;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::TaxRate;
use crate::{MAX_AMOUNT_CENTS, MAX_PLAN_MONTHS, MAX_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

fn required(field: &str, value: &str, max: usize) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(value.to_string())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates an item code (the shop's SKU).
///
/// ```rust
/// use medbill_core::validation::validate_item_code;
///
/// assert_eq!(validate_item_code("  PARA-500 ").unwrap(), "PARA-500");
/// assert!(validate_item_code("   ").is_err());
/// ```
pub fn validate_item_code(code: &str) -> ValidationResult<String> {
    required("item_code", code, 50)
}

/// Validates an item name (1-200 characters after trimming).
pub fn validate_item_name(name: &str) -> ValidationResult<String> {
    required("item_name", name, 200)
}

/// Validates a bill's customer name.
pub fn validate_customer_name(name: &str) -> ValidationResult<String> {
    required("customer_name", name, 200)
}

/// Validates a unit of measure, defaulting to [`crate::DEFAULT_UOM`].
pub fn validate_uom(uom: Option<&str>) -> ValidationResult<String> {
    match uom.map(str::trim).filter(|u| !u.is_empty()) {
        None => Ok(crate::DEFAULT_UOM.to_string()),
        Some(uom) => required("uom", uom, 20),
    }
}

/// Validates a search query. Empty is allowed and means "no filter".
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

/// Validates an email address and lowercases it.
///
/// Only the shape `local@domain` is checked; deliverability is not.
pub fn validate_email(email: &str) -> ValidationResult<String> {
    let email = required("email", email, 254)?.to_lowercase();

    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
            Ok(email)
        }
        _ => Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must look like name@domain".to_string(),
        }),
    }
}

/// Validates a new account password. Not trimmed.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::Required {
            field: "password".to_string(),
        });
    }

    if password.chars().count() < 6 {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: 6,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

fn quantity_too_large(min: i64) -> ValidationError {
    ValidationError::OutOfRange {
        field: "quantity".to_string(),
        min,
        max: MAX_QUANTITY,
    }
}

/// Validates a stock quantity (zero allowed, at most [`MAX_QUANTITY`]).
pub fn validate_stock_quantity(qty: i64) -> ValidationResult<()> {
    if qty < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "quantity".to_string(),
        });
    }
    if qty > MAX_QUANTITY {
        return Err(quantity_too_large(0));
    }

    Ok(())
}

/// Validates the quantity on a bill line (1 to [`MAX_QUANTITY`]).
pub fn validate_sold_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    if qty > MAX_QUANTITY {
        return Err(quantity_too_large(1));
    }

    Ok(())
}

/// Validates an amount between zero and [`MAX_AMOUNT_CENTS`] and converts
/// it to [`Money`].
///
/// ```rust
/// use medbill_core::validation::validate_amount;
/// use rust_decimal::Decimal;
///
/// let price = validate_amount("price", Decimal::new(1099, 2)).unwrap();
/// assert_eq!(price.cents(), 1099);
/// assert!(validate_amount("price", Decimal::new(-1, 0)).is_err());
/// ```
pub fn validate_amount(field: &str, amount: Decimal) -> ValidationResult<Money> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    match Money::from_decimal(amount) {
        Some(money) if money.cents() <= MAX_AMOUNT_CENTS => Ok(money),
        _ => Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_AMOUNT_CENTS / 100,
        }),
    }
}

/// Validates a GST percentage (0 to 100 inclusive).
pub fn validate_gst_percent(pct: Decimal) -> ValidationResult<TaxRate> {
    if pct < Decimal::ZERO || pct > Decimal::ONE_HUNDRED {
        return Err(ValidationError::OutOfRange {
            field: "gst".to_string(),
            min: 0,
            max: 100,
        });
    }

    Ok(TaxRate::from_percentage(pct))
}

/// Validates a subscription plan length in months.
pub fn validate_plan_months(months: i64) -> ValidationResult<u32> {
    if !(1..=MAX_PLAN_MONTHS as i64).contains(&months) {
        return Err(ValidationError::OutOfRange {
            field: "plan_months".to_string(),
            min: 1,
            max: MAX_PLAN_MONTHS as i64,
        });
    }

    Ok(months as u32)
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates an id list for bulk operations.
pub fn validate_id_list(ids: &[i64]) -> ValidationResult<()> {
    if ids.is_empty() {
        return Err(ValidationError::Required {
            field: "ids".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
