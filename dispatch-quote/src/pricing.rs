use serde::{Deserialize, Serialize};

use crate::{round2, round4};

/// Rate card for the cost/price model. All values are configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateCard {
    pub handling_per_cbm: f64,
    pub storage_per_cbm_day: f64,
    pub km_cost: f64,
    pub min_margin: f64,
    pub surcharge: f64,
    pub opportunity_coeff: f64,
    /// Surge slope above 70% utilization; 0.0 disables surge.
    pub surge_k: f64,
}

impl Default for RateCard {
    fn default() -> Self {
        Self {
            handling_per_cbm: 5.0,
            storage_per_cbm_day: 0.8,
            km_cost: 10.0,
            min_margin: 0.05,
            surcharge: 0.0,
            opportunity_coeff: 0.15,
            surge_k: 0.0,
        }
    }
}

/// A priced candidate breakdown, rounded for deterministic output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub cost: f64,
    pub price_amount: f64,
    pub margin: f64,
    pub profit: f64,
}

/// Pure cost/price/margin model. No I/O, fully deterministic.
#[derive(Debug, Clone, Default)]
pub struct PricingModel {
    rates: RateCard,
}

impl PricingModel {
    pub fn new(rates: RateCard) -> Self {
        Self { rates }
    }

    pub fn rates(&self) -> &RateCard {
        &self.rates
    }

    /// True cost: handling + storage + transport + opportunity cost of the
    /// consumed capacity (the fuller the warehouse, the dearer the space).
    pub fn compute_cost(&self, volume_cbm: f64, duration_days: u32, km: f64, utilization: f64) -> f64 {
        let r = &self.rates;
        let base = r.handling_per_cbm * volume_cbm
            + r.storage_per_cbm_day * volume_cbm * duration_days as f64
            + r.km_cost * km;
        let opportunity = r.opportunity_coeff * utilization.clamp(0.0, 1.0) * volume_cbm;
        base + opportunity
    }

    /// Cost -> (price, margin ratio) via minimum margin plus flat surcharge.
    pub fn price_from_cost(&self, cost: f64) -> (f64, f64) {
        let price = cost * (1.0 + self.rates.min_margin) + self.rates.surcharge;
        (price, margin_of(price, cost))
    }

    /// Full quote for one candidate, with optional surge above 70% utilization.
    pub fn quote(&self, volume_cbm: f64, duration_days: u32, km: f64, utilization: f64) -> Quote {
        let cost = self.compute_cost(volume_cbm, duration_days, km, utilization);
        let (mut price, mut margin) = self.price_from_cost(cost);

        if self.rates.surge_k > 0.0 {
            // surge kicks in past 70% utilization
            let surge = 1.0 + self.rates.surge_k * (utilization - 0.7).max(0.0);
            price *= surge;
            margin = margin_of(price, cost);
        }

        Quote {
            cost: round2(cost),
            price_amount: round2(price),
            margin: round4(margin),
            profit: round2(price - cost),
        }
    }
}

fn margin_of(price: f64, cost: f64) -> f64 {
    if price <= 0.0 {
        0.0
    } else {
        (price - cost) / price
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cost_follows_rate_card() {
        let model = PricingModel::default();
        // 10 cbm, 3 days, 5 km, 40% utilization
        let cost = model.compute_cost(10.0, 3, 5.0, 0.4);
        let expected = 5.0 * 10.0 + 0.8 * 10.0 * 3.0 + 10.0 * 5.0 + 0.15 * 0.4 * 10.0;
        assert!((cost - expected).abs() < 1e-9);
    }

    #[test]
    fn utilization_is_clamped_in_cost() {
        let model = PricingModel::default();
        assert_eq!(model.compute_cost(10.0, 1, 0.0, 1.5), model.compute_cost(10.0, 1, 0.0, 1.0));
        assert_eq!(model.compute_cost(10.0, 1, 0.0, -0.5), model.compute_cost(10.0, 1, 0.0, 0.0));
    }

    #[test]
    fn cost_recoverable_from_price_and_margin() {
        let model = PricingModel::new(RateCard {
            surcharge: 12.5,
            ..RateCard::default()
        });
        let quote = model.quote(25.0, 7, 12.3, 0.55);
        let recovered = quote.price_amount * (1.0 - quote.margin);
        // rounding tolerance: margin is 4 dp, money 2 dp
        assert!((recovered - quote.cost).abs() < 0.05, "recovered {} vs cost {}", recovered, quote.cost);
    }

    #[test]
    fn surge_only_applies_above_threshold() {
        let flat = PricingModel::default();
        let surging = PricingModel::new(RateCard {
            surge_k: 0.5,
            ..RateCard::default()
        });

        // Below the 70% threshold, surge_k is inert.
        assert_eq!(flat.quote(10.0, 2, 4.0, 0.6), surging.quote(10.0, 2, 4.0, 0.6));

        // Above it the price rises and margin is recomputed.
        let calm = surging.quote(10.0, 2, 4.0, 0.6);
        let busy = surging.quote(10.0, 2, 4.0, 0.9);
        let calm_same_cost = flat.quote(10.0, 2, 4.0, 0.9);
        assert!(busy.price_amount > calm_same_cost.price_amount);
        assert!(busy.margin > calm.margin);
    }

    #[test]
    fn margin_zero_when_price_not_positive() {
        let model = PricingModel::new(RateCard {
            min_margin: -1.0,
            surcharge: 0.0,
            ..RateCard::default()
        });
        let quote = model.quote(10.0, 1, 0.0, 0.0);
        assert_eq!(quote.price_amount, 0.0);
        assert_eq!(quote.margin, 0.0);
    }

    #[test]
    fn money_rounded_to_cents() {
        let model = PricingModel::default();
        let quote = model.quote(3.333, 2, 1.237, 0.33);
        let cents = |v: f64| (v * 100.0 - (v * 100.0).round()).abs() < 1e-9;
        assert!(cents(quote.cost));
        assert!(cents(quote.price_amount));
        assert!(cents(quote.profit));
    }
}
