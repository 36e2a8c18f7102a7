//! Seeded perturbation of a base scenario

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;

use crate::agent::Personality;
use crate::scenario::Scenario;

const PERSONALITIES: [Personality; 3] = [
    Personality::Aggressive,
    Personality::Cooperative,
    Personality::Stubborn,
];

/// Generate `count` variants of `base` with jittered seller terms.
/// The same seed always yields the same variants.
pub fn perturb(base: &Scenario, count: usize, seed: u64) -> Vec<Scenario> {
    let mut rng = StdRng::seed_from_u64(seed);

    (0..count)
        .map(|i| {
            let mut scenario = base.clone();
            scenario.name = format!("{}-{:03}", base.name, i);

            let start_pct: i64 = rng.gen_range(90..=125);
            let floor_pct: i64 = rng.gen_range(85..=115);
            let rate_pct: i64 = rng.gen_range(5..=30);
            let personality = PERSONALITIES[rng.gen_range(0..PERSONALITIES.len())];

            let seller = &mut scenario.seller;
            let start = scale(base.seller.start_price, start_pct);
            seller.start_price = start;
            seller.floor_price = scale(base.seller.floor_price, floor_pct).min(start);
            seller.concession_rate = Decimal::new(rate_pct, 2);
            seller.personality = personality;

            scenario
        })
        .collect()
}

/// Prices too large to scale up keep their base value
fn scale(value: Decimal, pct: i64) -> Decimal {
    value
        .checked_mul(Decimal::new(pct, 2))
        .unwrap_or(value)
        .round_dp(2)
        .normalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Scenario {
        Scenario::from_json(
            r#"{
                "name": "base",
                "product": {"name": "Cloves", "quantity": 20, "quality": "Export", "market_price": 100},
                "buyer": {"budget_ceiling": 90, "target_price": 70, "concession_rate": 0.2},
                "seller": {"start_price": 120, "floor_price": 80, "concession_rate": 0.15}
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_same_seed_same_variants() {
        let a = perturb(&base(), 20, 7);
        let b = perturb(&base(), 20, 7);
        assert_eq!(a, b);
        assert_eq!(a.len(), 20);
        assert_eq!(a[3].name, "base-003");
    }

    #[test]
    fn test_different_seed_different_variants() {
        let a = perturb(&base(), 20, 1);
        let b = perturb(&base(), 20, 2);
        assert_ne!(a, b);
    }

    #[test]
    fn test_scale_saturates_near_decimal_max() {
        assert_eq!(scale(Decimal::MAX, 125), Decimal::MAX);
        assert_eq!(scale(Decimal::new(120, 0), 90), Decimal::new(108, 0));
    }

    #[test]
    fn test_variants_stay_valid() {
        for scenario in perturb(&base(), 100, 42) {
            scenario.validate().unwrap();
            assert!(scenario.seller.floor_price <= scenario.seller.start_price);
            assert_eq!(scenario.buyer, base().buyer);
        }
    }
}
