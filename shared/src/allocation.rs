//! Bulk-sale allocation planning
//!
//! Pure planning for a multi-warehouse sale: the shipment's total weight
//! is distributed across warehouses proportionally to the requested bag
//! counts, and the incidental costs (labour, transport, mandi) are
//! distributed per line. Stock validation and persistence stay with the
//! service layer; everything here is arithmetic.

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::types::quintals_from_kg;

/// Requested bags against one warehouse.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct BagAllocation {
    pub warehouse_id: Uuid,
    pub bags: i64,
}

/// Commercial terms shared by every line of the bulk sale.
#[derive(Debug, Clone)]
pub struct SaleTerms {
    pub rate_per_quintal: Decimal,
    pub tax_percentage: Decimal,
    pub labour_cost_per_bag: Decimal,
    pub transport_cost_per_qtl: Decimal,
    /// Aggregate market/yard fee for the shipment, split across lines
    /// proportionally to quantity.
    pub mandi_cost: Decimal,
}

/// One planned sale line against one warehouse.
#[derive(Debug, Clone)]
pub struct LinePlan {
    pub warehouse_id: Uuid,
    pub bags: i64,
    pub quantity_quintal: Decimal,
    /// Buyer-facing gross: quantity x rate plus tax. Internal costs do
    /// not reduce it.
    pub total_amount: Decimal,
    pub labour_cost_total: Decimal,
    pub transport_cost_total: Decimal,
    pub mandi_share: Decimal,
    /// Labour plus transport; mandi is tracked separately.
    pub expenses_total: Decimal,
}

/// The full plan for a bulk sale: one line per warehouse plus the
/// dispatch-level freight totals.
#[derive(Debug, Clone)]
pub struct BulkSalePlan {
    pub lines: Vec<LinePlan>,
    /// Sum of line quantities, in quintals.
    pub total_quantity_quintal: Decimal,
    /// Per-line sum of quantity x transport rate. Stays correct if lines
    /// later diverge to non-uniform rates.
    pub gross_freight: Decimal,
}

/// Malformed allocation requests, rejected before any computation.
#[derive(Debug, Error, PartialEq)]
pub enum AllocationError {
    #[error("at least one warehouse allocation is required")]
    EmptyAllocations,
    #[error("bag count for warehouse {0} must be positive")]
    NonPositiveBags(Uuid),
    #[error("total weight must be positive")]
    NonPositiveWeight,
    #[error("{0} must not be negative")]
    NegativeTerm(&'static str),
}

/// Plan a bulk sale.
///
/// `qty_i = (bags_i / total_bags) x (total_weight_kg / 100)`: the bag
/// ratio is the authoritative split, allocation weights are never taken
/// literally. `mandi_share_i = (qty_i / total_qty) x mandi_cost`.
pub fn plan_bulk_sale(
    allocations: &[BagAllocation],
    total_weight_kg: Decimal,
    terms: &SaleTerms,
) -> Result<BulkSalePlan, AllocationError> {
    if allocations.is_empty() {
        return Err(AllocationError::EmptyAllocations);
    }
    for alloc in allocations {
        if alloc.bags <= 0 {
            return Err(AllocationError::NonPositiveBags(alloc.warehouse_id));
        }
    }
    if total_weight_kg <= Decimal::ZERO {
        return Err(AllocationError::NonPositiveWeight);
    }
    if terms.rate_per_quintal < Decimal::ZERO {
        return Err(AllocationError::NegativeTerm("rate_per_quintal"));
    }
    if terms.tax_percentage < Decimal::ZERO {
        return Err(AllocationError::NegativeTerm("tax_percentage"));
    }
    if terms.labour_cost_per_bag < Decimal::ZERO {
        return Err(AllocationError::NegativeTerm("labour_cost_per_bag"));
    }
    if terms.transport_cost_per_qtl < Decimal::ZERO {
        return Err(AllocationError::NegativeTerm("transport_cost_per_qtl"));
    }
    if terms.mandi_cost < Decimal::ZERO {
        return Err(AllocationError::NegativeTerm("mandi_cost"));
    }

    let total_bags: i64 = allocations.iter().map(|a| a.bags).sum();
    let total_bags_dec = Decimal::from(total_bags);
    let total_quintal = quintals_from_kg(total_weight_kg);

    // Quantity split first; cost distribution needs the realized sum.
    // Multiply before dividing so exactly divisible splits stay exact.
    let quantities: Vec<Decimal> = allocations
        .iter()
        .map(|a| Decimal::from(a.bags) * total_quintal / total_bags_dec)
        .collect();
    let sum_quintal: Decimal = quantities.iter().sum();

    let mut lines = Vec::with_capacity(allocations.len());
    let mut gross_freight = Decimal::ZERO;

    for (alloc, qty) in allocations.iter().zip(quantities) {
        let subtotal = qty * terms.rate_per_quintal;
        let tax = subtotal * terms.tax_percentage / Decimal::from(100);
        let labour_cost_total = Decimal::from(alloc.bags) * terms.labour_cost_per_bag;
        let transport_cost_total = qty * terms.transport_cost_per_qtl;
        let mandi_share = if sum_quintal > Decimal::ZERO {
            qty * terms.mandi_cost / sum_quintal
        } else {
            Decimal::ZERO
        };

        gross_freight += transport_cost_total;

        lines.push(LinePlan {
            warehouse_id: alloc.warehouse_id,
            bags: alloc.bags,
            quantity_quintal: qty,
            total_amount: subtotal + tax,
            labour_cost_total,
            transport_cost_total,
            mandi_share,
            expenses_total: labour_cost_total + transport_cost_total,
        });
    }

    Ok(BulkSalePlan {
        lines,
        total_quantity_quintal: sum_quintal,
        gross_freight,
    })
}

/// Labour withheld for bagging: bags x rate per bag.
pub fn labour_total(bags: Decimal, labour_cost_per_bag: Decimal) -> Decimal {
    bags * labour_cost_per_bag
}

/// Purchase gross: quantity x rate minus the labour total withheld from
/// the seller's payout.
pub fn purchase_total(
    quantity_quintal: Decimal,
    rate_per_quintal: Decimal,
    labour_total: Decimal,
) -> Decimal {
    quantity_quintal * rate_per_quintal - labour_total
}

/// Sale gross: quantity x rate plus tax, full price to the buyer.
pub fn sale_total(
    quantity_quintal: Decimal,
    rate_per_quintal: Decimal,
    tax_percentage: Decimal,
) -> Decimal {
    let subtotal = quantity_quintal * rate_per_quintal;
    subtotal + subtotal * tax_percentage / Decimal::from(100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn terms() -> SaleTerms {
        SaleTerms {
            rate_per_quintal: dec("3000"),
            tax_percentage: Decimal::ZERO,
            labour_cost_per_bag: dec("3"),
            transport_cost_per_qtl: dec("50"),
            mandi_cost: dec("1000"),
        }
    }

    #[test]
    fn test_split_follows_bag_ratio() {
        let allocations = [
            BagAllocation {
                warehouse_id: Uuid::new_v4(),
                bags: 10,
            },
            BagAllocation {
                warehouse_id: Uuid::new_v4(),
                bags: 30,
            },
        ];
        let plan = plan_bulk_sale(&allocations, dec("4000"), &terms()).unwrap();

        assert_eq!(plan.lines[0].quantity_quintal, dec("10"));
        assert_eq!(plan.lines[1].quantity_quintal, dec("30"));
        assert_eq!(plan.total_quantity_quintal, dec("40"));
    }

    #[test]
    fn test_empty_allocations_rejected() {
        assert_eq!(
            plan_bulk_sale(&[], dec("4000"), &terms()).unwrap_err(),
            AllocationError::EmptyAllocations
        );
    }

    #[test]
    fn test_mandi_shares_sum_to_mandi_cost() {
        let allocations = [
            BagAllocation {
                warehouse_id: Uuid::new_v4(),
                bags: 7,
            },
            BagAllocation {
                warehouse_id: Uuid::new_v4(),
                bags: 13,
            },
            BagAllocation {
                warehouse_id: Uuid::new_v4(),
                bags: 5,
            },
        ];
        let plan = plan_bulk_sale(&allocations, dec("2500"), &terms()).unwrap();
        let mandi_sum: Decimal = plan.lines.iter().map(|l| l.mandi_share).sum();

        assert!((mandi_sum - dec("1000")).abs() < dec("0.0001"));
    }

    #[test]
    fn test_purchase_total_deducts_labour() {
        let labour = labour_total(dec("100"), dec("3"));
        assert_eq!(labour, dec("300"));
        assert_eq!(purchase_total(dec("60"), dec("2000"), labour), dec("119700"));
    }

    #[test]
    fn test_sale_total_includes_tax() {
        assert_eq!(sale_total(dec("10"), dec("3000"), dec("5")), dec("31500"));
    }
}
