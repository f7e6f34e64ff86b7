//! Common units and tolerances used across the platform

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Kilograms per quintal, the system's canonical quantity unit.
pub const KG_PER_QUINTAL: i64 = 100;

/// Settlement tolerance: one currency unit, absorbs rounding noise in
/// payment and freight comparisons.
pub fn payment_epsilon() -> Decimal {
    Decimal::ONE
}

/// Stock balances below this (in quintals) are treated as fully drawn down.
pub fn stock_epsilon() -> Decimal {
    Decimal::new(1, 3) // 0.001
}

/// Convert net weight in kilograms to quintals.
pub fn quintals_from_kg(weight_kg: Decimal) -> Decimal {
    weight_kg / Decimal::from(KG_PER_QUINTAL)
}

/// Convert quintals to kilograms.
pub fn kg_from_quintals(quantity_quintal: Decimal) -> Decimal {
    quantity_quintal * Decimal::from(KG_PER_QUINTAL)
}

/// A net weight broken into full standard bags plus a loose remainder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BagSplit {
    pub bags: i64,
    pub loose_kg: Decimal,
}

/// Split a net weight into full bags and loose kilograms.
///
/// `bags = floor(net / standard_bag_weight)`, `loose = net mod
/// standard_bag_weight`. A non-positive bag weight yields zero bags with
/// the full weight loose.
pub fn split_weight(net_weight_kg: Decimal, standard_bag_weight_kg: Decimal) -> BagSplit {
    if standard_bag_weight_kg <= Decimal::ZERO {
        return BagSplit {
            bags: 0,
            loose_kg: net_weight_kg,
        };
    }

    let bags = (net_weight_kg / standard_bag_weight_kg).floor();
    let loose_kg = net_weight_kg - bags * standard_bag_weight_kg;

    BagSplit {
        bags: bags.to_i64().unwrap_or(0),
        loose_kg,
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
    fn test_split_weight_exact_bags() {
        let split = split_weight(dec("600"), dec("60"));
        assert_eq!(split.bags, 10);
        assert_eq!(split.loose_kg, Decimal::ZERO);
    }

    #[test]
    fn test_split_weight_with_loose() {
        let split = split_weight(dec("625"), dec("60"));
        assert_eq!(split.bags, 10);
        assert_eq!(split.loose_kg, dec("25"));
    }

    #[test]
    fn test_split_weight_zero_bag_weight() {
        let split = split_weight(dec("100"), Decimal::ZERO);
        assert_eq!(split.bags, 0);
        assert_eq!(split.loose_kg, dec("100"));
    }

    #[test]
    fn test_quintal_round_trip() {
        let qty = dec("12.5");
        assert_eq!(quintals_from_kg(kg_from_quintals(qty)), qty);
    }
}
