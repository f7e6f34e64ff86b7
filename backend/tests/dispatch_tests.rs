//! Dispatch reconciliation tests
//!
//! Tests for freight billing including:
//! - Freight overrun guard
//! - Status derivation from the pending balance
//! - Group resync after member edits and deletes

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use shared::models::DispatchStatus;
use shared::settlement::{check_freight, derive_dispatch_status, SettlementError};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_freight_within_gross_accepted() {
        assert!(check_freight(dec("5000"), dec("5000")).is_ok());
        assert!(check_freight(dec("5000"), dec("5000.5")).is_ok());
    }

    #[test]
    fn test_freight_overrun_rejected() {
        let err = check_freight(dec("5000"), dec("5200")).unwrap_err();
        assert_eq!(
            err,
            SettlementError::FreightOverrun {
                gross_freight: dec("5000"),
                applied: dec("5200"),
            }
        );
    }

    #[test]
    fn test_status_pending_without_payments() {
        let status = derive_dispatch_status(
            dec("5000"),
            Decimal::ZERO,
            Decimal::ZERO,
            Decimal::ZERO,
            Decimal::ZERO,
        );
        assert_eq!(status, DispatchStatus::Pending);
    }

    #[test]
    fn test_status_partial_with_advance() {
        let status = derive_dispatch_status(
            dec("5000"),
            dec("2000"),
            Decimal::ZERO,
            Decimal::ZERO,
            Decimal::ZERO,
        );
        assert_eq!(status, DispatchStatus::Partial);
    }

    /// Balance under one currency unit counts as cleared
    #[test]
    fn test_status_cleared_below_one_unit() {
        let status = derive_dispatch_status(
            dec("5000"),
            dec("3000"),
            dec("1500"),
            dec("400"),
            dec("99.5"),
        );
        assert_eq!(status, DispatchStatus::Cleared);
    }

    /// Deductions alone settle the freight without marking it partial
    #[test]
    fn test_deductions_only_still_pending_while_balance_remains() {
        let status = derive_dispatch_status(
            dec("5000"),
            Decimal::ZERO,
            Decimal::ZERO,
            dec("1000"),
            Decimal::ZERO,
        );
        assert_eq!(status, DispatchStatus::Pending);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for monetary amounts
    fn amount_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..=1_000_000i64).prop_map(|n| Decimal::new(n, 2))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Accepted applications never exceed gross freight past epsilon
        #[test]
        fn prop_accepted_applications_bounded(
            gross in amount_strategy(),
            applied in amount_strategy()
        ) {
            if check_freight(gross, applied).is_ok() {
                prop_assert!(applied <= gross + Decimal::ONE);
            } else {
                prop_assert!(applied > gross + Decimal::ONE);
            }
        }

        /// Cleared means the balance is under one unit, and vice versa
        #[test]
        fn prop_cleared_iff_balance_settled(
            gross in amount_strategy(),
            advance in amount_strategy(),
            delivery in amount_strategy()
        ) {
            let status = derive_dispatch_status(
                gross, advance, delivery, Decimal::ZERO, Decimal::ZERO,
            );
            let balance = gross - advance - delivery;

            if balance < Decimal::ONE {
                prop_assert_eq!(status, DispatchStatus::Cleared);
            } else {
                prop_assert!(status != DispatchStatus::Cleared);
            }
        }
    }
}

// ============================================================================
// Integration Test Helpers (for use with actual database)
// ============================================================================

#[cfg(test)]
mod integration_helpers {
    use super::*;

    /// One member line of a sale group, as the reconciler sees it.
    #[derive(Clone)]
    struct MemberLine {
        id: Uuid,
        quantity_quintal: Decimal,
        transport_cost_per_qtl: Decimal,
    }

    /// In-memory model of a sale group plus its dispatch totals,
    /// mirroring the resync and delete paths.
    struct SaleGroup {
        members: Vec<MemberLine>,
        dispatch_rate: Decimal,
        total_weight: Decimal,
        gross_freight: Decimal,
        dispatch_deleted: bool,
    }

    impl SaleGroup {
        fn new(lines: &[(&str, &str)]) -> Self {
            let members: Vec<MemberLine> = lines
                .iter()
                .map(|(qty, rate)| MemberLine {
                    id: Uuid::new_v4(),
                    quantity_quintal: dec(qty),
                    transport_cost_per_qtl: dec(rate),
                })
                .collect();
            let rate = members[0].transport_cost_per_qtl;

            let mut group = Self {
                members,
                dispatch_rate: rate,
                total_weight: Decimal::ZERO,
                gross_freight: Decimal::ZERO,
                dispatch_deleted: false,
            };
            group.resync(None);
            group
        }

        /// Recompute the dispatch totals over surviving members; a rate
        /// edit overwrites the dispatch rate, last write wins.
        fn resync(&mut self, new_rate: Option<Decimal>) {
            self.total_weight = self.members.iter().map(|m| m.quantity_quintal).sum();
            self.gross_freight = self
                .members
                .iter()
                .map(|m| m.quantity_quintal * m.transport_cost_per_qtl)
                .sum();
            if let Some(rate) = new_rate {
                self.dispatch_rate = rate;
            }
        }

        fn edit_transport_rate(&mut self, index: usize, rate: &str) {
            self.members[index].transport_cost_per_qtl = dec(rate);
            self.resync(Some(dec(rate)));
        }

        fn edit_quantity(&mut self, index: usize, qty: &str) {
            self.members[index].quantity_quintal = dec(qty);
            self.resync(None);
        }

        /// Delete a member; the dispatch goes with the last one.
        fn delete_member(&mut self, index: usize) {
            let id = self.members[index].id;
            self.members.retain(|m| m.id != id);
            if self.members.is_empty() {
                self.dispatch_deleted = true;
            }
        }
    }

    /// Editing one member's transport rate recomputes the per-line sum
    #[test]
    fn test_rate_edit_recomputes_gross_freight() {
        let mut group = SaleGroup::new(&[("10", "50"), ("30", "50")]);
        assert_eq!(group.gross_freight, dec("2000"));

        group.edit_transport_rate(0, "60");

        // 10 x 60 + 30 x 50: per-line sum, not total_weight x one rate
        assert_eq!(group.gross_freight, dec("2100"));
        assert_eq!(group.dispatch_rate, dec("60"));
    }

    /// Editing a quantity moves both totals
    #[test]
    fn test_quantity_edit_recomputes_totals() {
        let mut group = SaleGroup::new(&[("10", "50"), ("30", "50")]);

        group.edit_quantity(1, "20");

        assert_eq!(group.total_weight, dec("30"));
        assert_eq!(group.gross_freight, dec("1500"));
        // Quantity edits leave the rate alone
        assert_eq!(group.dispatch_rate, dec("50"));
    }

    /// Deleting a non-last member leaves the dispatch record in place
    #[test]
    fn test_non_last_delete_keeps_dispatch() {
        let mut group = SaleGroup::new(&[("10", "50"), ("30", "50")]);

        group.delete_member(0);

        assert!(!group.dispatch_deleted);
        assert_eq!(group.members.len(), 1);
    }

    /// Deleting the last member removes the dispatch record
    #[test]
    fn test_last_delete_removes_dispatch() {
        let mut group = SaleGroup::new(&[("10", "50"), ("30", "50")]);

        group.delete_member(0);
        group.delete_member(0);

        assert!(group.dispatch_deleted);
    }
}
