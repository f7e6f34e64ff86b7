//! Settlement arithmetic: net payable, payment status, freight balances
//!
//! All comparisons use the one-currency-unit epsilon so rounding noise
//! from proportional splits never flips a settlement decision.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::{DispatchStatus, PaymentStatus, TransactionType};
use crate::types::payment_epsilon;

/// Rejections raised by the pure settlement checks. The service layer
/// attaches entity ids before surfacing these to callers.
#[derive(Debug, Error, PartialEq)]
pub enum SettlementError {
    #[error("payment of {requested} exceeds outstanding balance of {outstanding}")]
    Overpayment {
        requested: Decimal,
        outstanding: Decimal,
    },
    #[error("payments and deductions of {applied} exceed gross freight of {gross_freight}")]
    FreightOverrun {
        gross_freight: Decimal,
        applied: Decimal,
    },
}

/// Net amount owed on a transaction: gross minus shortage value and
/// deduction for sales, gross unchanged for purchases.
pub fn net_payable(
    transaction_type: TransactionType,
    total_amount: Decimal,
    shortage_quantity: Decimal,
    rate_per_quintal: Decimal,
    deduction_amount: Decimal,
) -> Decimal {
    match transaction_type {
        TransactionType::Sale => {
            total_amount - shortage_quantity * rate_per_quintal - deduction_amount
        }
        TransactionType::Purchase => total_amount,
    }
}

/// Derive payment status from amounts. Recomputed on every payment and on
/// every edit that moves the net payable; never stored stale.
pub fn derive_payment_status(amount_paid: Decimal, net_payable: Decimal) -> PaymentStatus {
    if amount_paid >= net_payable - payment_epsilon() {
        PaymentStatus::Paid
    } else if amount_paid > Decimal::ZERO {
        PaymentStatus::Partial
    } else {
        PaymentStatus::Pending
    }
}

/// Guard a payment against the outstanding balance. A payment may exceed
/// the balance by at most the epsilon.
pub fn check_payment(
    amount: Decimal,
    amount_paid: Decimal,
    net_payable: Decimal,
) -> Result<(), SettlementError> {
    let outstanding = net_payable - amount_paid;
    if amount > outstanding + payment_epsilon() {
        return Err(SettlementError::Overpayment {
            requested: amount,
            outstanding,
        });
    }
    Ok(())
}

/// Guard dispatch payments and deductions against the gross freight.
pub fn check_freight(gross_freight: Decimal, applied: Decimal) -> Result<(), SettlementError> {
    if applied > gross_freight + payment_epsilon() {
        return Err(SettlementError::FreightOverrun {
            gross_freight,
            applied,
        });
    }
    Ok(())
}

/// Derive dispatch status: cleared once the pending balance drops below
/// one currency unit, partial while any payment is recorded against a
/// remaining balance, pending otherwise.
pub fn derive_dispatch_status(
    gross_freight: Decimal,
    advance_paid: Decimal,
    delivery_paid: Decimal,
    shortage_deduction: Decimal,
    other_deduction: Decimal,
) -> DispatchStatus {
    let balance = gross_freight - advance_paid - delivery_paid - shortage_deduction - other_deduction;
    if balance < Decimal::ONE {
        DispatchStatus::Cleared
    } else if advance_paid + delivery_paid > Decimal::ZERO {
        DispatchStatus::Partial
    } else {
        DispatchStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_net_payable_sale_deductions() {
        // 100000 gross, 2 qtl short at 3000, 500 deduction
        let net = net_payable(
            TransactionType::Sale,
            dec("100000"),
            dec("2"),
            dec("3000"),
            dec("500"),
        );
        assert_eq!(net, dec("93500"));
    }

    #[test]
    fn test_net_payable_purchase_ignores_deductions() {
        let net = net_payable(
            TransactionType::Purchase,
            dec("50000"),
            dec("2"),
            dec("3000"),
            dec("500"),
        );
        assert_eq!(net, dec("50000"));
    }

    #[test]
    fn test_payment_within_epsilon_is_paid() {
        assert!(check_payment(dec("93500.5"), Decimal::ZERO, dec("93500")).is_ok());
        assert_eq!(
            derive_payment_status(dec("93500.5"), dec("93500")),
            PaymentStatus::Paid
        );
    }

    #[test]
    fn test_overpayment_rejected() {
        let err = check_payment(dec("95000"), Decimal::ZERO, dec("93500")).unwrap_err();
        assert_eq!(
            err,
            SettlementError::Overpayment {
                requested: dec("95000"),
                outstanding: dec("93500"),
            }
        );
    }

    #[test]
    fn test_dispatch_status_derivation() {
        // Nothing applied
        assert_eq!(
            derive_dispatch_status(dec("5000"), Decimal::ZERO, Decimal::ZERO, Decimal::ZERO, Decimal::ZERO),
            DispatchStatus::Pending
        );
        // Advance paid, balance remains
        assert_eq!(
            derive_dispatch_status(dec("5000"), dec("2000"), Decimal::ZERO, Decimal::ZERO, Decimal::ZERO),
            DispatchStatus::Partial
        );
        // Fully settled within a currency unit
        assert_eq!(
            derive_dispatch_status(dec("5000"), dec("2000"), dec("2999.5"), Decimal::ZERO, dec("0.6")),
            DispatchStatus::Cleared
        );
    }
}
