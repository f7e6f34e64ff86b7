//! Bulk-sale allocation tests
//!
//! Tests for the allocation planner including:
//! - Bag-ratio quantity distribution
//! - Per-line cost distribution (labour, transport, mandi)
//! - Quantity conservation across the split

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use shared::allocation::{
    labour_total, plan_bulk_sale, purchase_total, sale_total, AllocationError, BagAllocation,
    SaleTerms,
};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn terms(rate: &str, tax: &str, labour: &str, transport: &str, mandi: &str) -> SaleTerms {
    SaleTerms {
        rate_per_quintal: dec(rate),
        tax_percentage: dec(tax),
        labour_cost_per_bag: dec(labour),
        transport_cost_per_qtl: dec(transport),
        mandi_cost: dec(mandi),
    }
}

fn allocations(bags: &[i64]) -> Vec<BagAllocation> {
    bags.iter()
        .map(|&bags| BagAllocation {
            warehouse_id: Uuid::new_v4(),
            bags,
        })
        .collect()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// 10 and 30 bags over 4000 kg split 25%/75%: 10 and 30 quintals
    #[test]
    fn test_quantity_splits_by_bag_ratio() {
        let allocs = allocations(&[10, 30]);
        let plan =
            plan_bulk_sale(&allocs, dec("4000"), &terms("3000", "0", "3", "0", "0")).unwrap();

        assert_eq!(plan.lines[0].quantity_quintal, dec("10"));
        assert_eq!(plan.lines[1].quantity_quintal, dec("30"));
    }

    /// Allocation weight is never taken literally; only the ratio counts
    #[test]
    fn test_uneven_ratio_split() {
        let allocs = allocations(&[1, 2]);
        let plan =
            plan_bulk_sale(&allocs, dec("900"), &terms("2500", "0", "3", "0", "0")).unwrap();

        assert_eq!(plan.lines[0].quantity_quintal, dec("3"));
        assert_eq!(plan.lines[1].quantity_quintal, dec("6"));
        assert_eq!(plan.total_quantity_quintal, dec("9"));
    }

    /// Buyer-facing total is full price: qty x rate plus tax
    #[test]
    fn test_total_amount_includes_tax_not_costs() {
        let allocs = allocations(&[20]);
        let plan =
            plan_bulk_sale(&allocs, dec("1200"), &terms("3000", "5", "3", "50", "500")).unwrap();

        // 12 qtl x 3000 = 36000, +5% tax = 37800; labour/transport/mandi
        // do not reduce it
        assert_eq!(plan.lines[0].total_amount, dec("37800"));
    }

    /// Labour is bags x rate, transport is qty x rate
    #[test]
    fn test_per_line_costs() {
        let allocs = allocations(&[10, 30]);
        let plan =
            plan_bulk_sale(&allocs, dec("4000"), &terms("3000", "0", "3", "50", "0")).unwrap();

        assert_eq!(plan.lines[0].labour_cost_total, dec("30"));
        assert_eq!(plan.lines[1].labour_cost_total, dec("90"));
        assert_eq!(plan.lines[0].transport_cost_total, dec("500"));
        assert_eq!(plan.lines[1].transport_cost_total, dec("1500"));
    }

    /// Mandi is split proportionally to quantity and stays out of
    /// expenses_total
    #[test]
    fn test_mandi_distribution_excluded_from_expenses() {
        let allocs = allocations(&[10, 30]);
        let plan =
            plan_bulk_sale(&allocs, dec("4000"), &terms("3000", "0", "3", "50", "1000")).unwrap();

        assert_eq!(plan.lines[0].mandi_share, dec("250"));
        assert_eq!(plan.lines[1].mandi_share, dec("750"));

        for line in &plan.lines {
            assert_eq!(
                line.expenses_total,
                line.labour_cost_total + line.transport_cost_total
            );
        }
    }

    /// Gross freight is the per-line sum of qty x transport rate
    #[test]
    fn test_gross_freight_is_per_line_sum() {
        let allocs = allocations(&[10, 30]);
        let plan =
            plan_bulk_sale(&allocs, dec("4000"), &terms("3000", "0", "3", "50", "0")).unwrap();

        let expected: Decimal = plan
            .lines
            .iter()
            .map(|l| l.transport_cost_total)
            .sum();
        assert_eq!(plan.gross_freight, expected);
        assert_eq!(plan.gross_freight, dec("2000"));
    }

    #[test]
    fn test_empty_allocations_rejected() {
        let err = plan_bulk_sale(&[], dec("4000"), &terms("3000", "0", "3", "0", "0"));
        assert_eq!(err.unwrap_err(), AllocationError::EmptyAllocations);
    }

    #[test]
    fn test_zero_bags_rejected() {
        let allocs = allocations(&[10, 0]);
        let err = plan_bulk_sale(&allocs, dec("4000"), &terms("3000", "0", "3", "0", "0"));
        assert!(matches!(
            err.unwrap_err(),
            AllocationError::NonPositiveBags(_)
        ));
    }

    #[test]
    fn test_zero_weight_rejected() {
        let allocs = allocations(&[10]);
        let err = plan_bulk_sale(&allocs, Decimal::ZERO, &terms("3000", "0", "3", "0", "0"));
        assert_eq!(err.unwrap_err(), AllocationError::NonPositiveWeight);
    }

    /// Purchase-side rule: labour is deducted from the seller's payout
    #[test]
    fn test_purchase_total_deducts_labour() {
        let labour = labour_total(dec("200"), dec("3"));
        assert_eq!(purchase_total(dec("120"), dec("2000"), labour), dec("239400"));
    }

    /// Sale-side rule: tax on top, nothing deducted
    #[test]
    fn test_sale_total_adds_tax() {
        assert_eq!(sale_total(dec("40"), dec("3000"), dec("0")), dec("120000"));
        assert_eq!(sale_total(dec("40"), dec("3000"), dec("18")), dec("141600"));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for bag counts per warehouse
    fn bags_strategy() -> impl Strategy<Value = Vec<i64>> {
        prop::collection::vec(1i64..=500, 1..6)
    }

    /// Strategy for shipment weights in kg
    fn weight_strategy() -> impl Strategy<Value = Decimal> {
        (100i64..=1_000_000i64).prop_map(|n| Decimal::new(n, 1)) // 10.0 to 100000.0
    }

    /// Strategy for per-unit rates
    fn rate_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..=1_000_000i64).prop_map(|n| Decimal::new(n, 2))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Conservation: line quantities sum to the shipment total
        #[test]
        fn prop_quantity_conserved(
            bags in bags_strategy(),
            weight in weight_strategy()
        ) {
            let allocs = allocations(&bags);
            let plan = plan_bulk_sale(&allocs, weight, &terms("3000", "0", "3", "50", "1000"))
                .unwrap();

            let total: Decimal = plan.lines.iter().map(|l| l.quantity_quintal).sum();
            let expected = weight / Decimal::from(100);

            prop_assert!((total - expected).abs() < dec("0.0001"));
        }

        /// Each line's share matches its bag ratio
        #[test]
        fn prop_split_proportional_to_bags(
            bags in bags_strategy(),
            weight in weight_strategy()
        ) {
            let allocs = allocations(&bags);
            let plan = plan_bulk_sale(&allocs, weight, &terms("3000", "0", "3", "0", "0"))
                .unwrap();

            let total_bags: i64 = bags.iter().sum();
            for (line, bags) in plan.lines.iter().zip(&bags) {
                let expected = Decimal::from(*bags) / Decimal::from(total_bags)
                    * (weight / Decimal::from(100));
                prop_assert!((line.quantity_quintal - expected).abs() < dec("0.0001"));
            }
        }

        /// Mandi shares always add back up to the aggregate fee
        #[test]
        fn prop_mandi_shares_sum(
            bags in bags_strategy(),
            weight in weight_strategy(),
            mandi in rate_strategy()
        ) {
            let allocs = allocations(&bags);
            let mut t = terms("3000", "0", "3", "0", "0");
            t.mandi_cost = mandi;
            let plan = plan_bulk_sale(&allocs, weight, &t).unwrap();

            let sum: Decimal = plan.lines.iter().map(|l| l.mandi_share).sum();
            prop_assert!((sum - mandi).abs() < dec("0.001"));
        }

        /// Gross freight equals the per-line sum of qty x transport rate
        #[test]
        fn prop_gross_freight_matches_lines(
            bags in bags_strategy(),
            weight in weight_strategy(),
            transport in rate_strategy()
        ) {
            let allocs = allocations(&bags);
            let mut t = terms("3000", "0", "3", "0", "0");
            t.transport_cost_per_qtl = transport;
            let plan = plan_bulk_sale(&allocs, weight, &t).unwrap();

            let sum: Decimal = plan.lines.iter().map(|l| l.transport_cost_total).sum();
            prop_assert_eq!(plan.gross_freight, sum);
        }

        /// Expenses never include the mandi share
        #[test]
        fn prop_expenses_exclude_mandi(
            bags in bags_strategy(),
            weight in weight_strategy(),
            mandi in rate_strategy()
        ) {
            let allocs = allocations(&bags);
            let mut t = terms("3000", "0", "3", "50", "0");
            t.mandi_cost = mandi;
            let plan = plan_bulk_sale(&allocs, weight, &t).unwrap();

            for line in &plan.lines {
                prop_assert_eq!(
                    line.expenses_total,
                    line.labour_cost_total + line.transport_cost_total
                );
            }
        }
    }
}
