//! Validation helpers for ledger inputs
//!
//! Shared by every write path so malformed input is rejected before any
//! row is touched.

use rust_decimal::Decimal;

// ============================================================================
// Quantity and Money Validations
// ============================================================================

/// Validate a ledger quantity: strictly positive quintals.
pub fn validate_quantity(quantity_quintal: Decimal) -> Result<(), &'static str> {
    if quantity_quintal <= Decimal::ZERO {
        return Err("Quantity must be positive");
    }
    Ok(())
}

/// Validate a per-quintal rate.
pub fn validate_rate(rate_per_quintal: Decimal) -> Result<(), &'static str> {
    if rate_per_quintal < Decimal::ZERO {
        return Err("Rate must not be negative");
    }
    Ok(())
}

/// Validate a payment amount: strictly positive.
pub fn validate_payment_amount(amount: Decimal) -> Result<(), &'static str> {
    if amount <= Decimal::ZERO {
        return Err("Payment amount must be positive");
    }
    Ok(())
}

/// Validate a cost or deduction field that may legitimately be zero.
pub fn validate_non_negative(value: Decimal) -> Result<(), &'static str> {
    if value < Decimal::ZERO {
        return Err("Value must not be negative");
    }
    Ok(())
}

/// Validate a tax percentage.
pub fn validate_tax_percentage(tax: Decimal) -> Result<(), &'static str> {
    if tax < Decimal::ZERO || tax > Decimal::from(100) {
        return Err("Tax percentage must be between 0 and 100");
    }
    Ok(())
}

/// Validate a bag count.
pub fn validate_bags(bags: Decimal) -> Result<(), &'static str> {
    if bags < Decimal::ZERO {
        return Err("Bag count must not be negative");
    }
    Ok(())
}
