use dispatch_shared::{Candidate, Offer};
use serde::{Deserialize, Serialize};

use crate::{round4, round6};

/// Weights for the multi-criteria ranking, plus the utilization target the
/// load-balancing term pulls toward.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub profit: f64,
    pub utilbal: f64,
    pub distance: f64,
    pub sla: f64,
    pub price: f64,
    pub target_utilization: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            profit: 0.6,
            utilbal: 0.2,
            distance: 0.1,
            sla: 0.05,
            price: 0.05,
            target_utilization: 0.7,
        }
    }
}

/// Normalizes and ranks a candidate set. Pure computation, no I/O.
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    weights: ScoreWeights,
}

/// Lower-is-better normalization over [lo, hi]; a degenerate range scores 1.0.
fn norm_min_better(x: f64, lo: f64, hi: f64) -> f64 {
    if hi <= lo {
        return 1.0;
    }
    ((hi - x) / (hi - lo)).clamp(0.0, 1.0)
}

/// Higher-is-better normalization over [lo, hi]; a degenerate range scores 1.0.
fn norm_max_better(x: f64, lo: f64, hi: f64) -> f64 {
    if hi <= lo {
        return 1.0;
    }
    ((x - lo) / (hi - lo)).clamp(0.0, 1.0)
}

/// Closeness to the target utilization band: 1 - |u - t| / t, clamped.
/// Rewards balance, not emptiness.
fn util_balance_score(util: f64, target: f64) -> f64 {
    let t = target.max(1e-6);
    (1.0 - (util - t).abs() / t).clamp(0.0, 1.0)
}

impl ScoringEngine {
    pub fn new(weights: ScoreWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ScoreWeights {
        &self.weights
    }

    /// Rank with the engine's configured weights.
    pub fn rank(&self, candidates: Vec<Candidate>, offer: Option<&Offer>) -> Vec<Candidate> {
        self.rank_with(candidates, offer, &self.weights)
    }

    /// Rank with explicit per-call weights.
    ///
    /// Fills in the five sub-scores, the availability gate and the final
    /// score on every candidate, then sorts by final score descending. The
    /// sort is stable: equal scores keep their input order.
    pub fn rank_with(&self, mut candidates: Vec<Candidate>, offer: Option<&Offer>, w: &ScoreWeights) -> Vec<Candidate> {
        if candidates.is_empty() {
            return candidates;
        }

        // Resolve missing costs, then take normalization ranges over the set.
        let costs: Vec<f64> = candidates.iter().map(resolve_cost).collect();
        let profits: Vec<f64> = candidates
            .iter()
            .zip(&costs)
            .map(|(c, cost)| (c.price_amount - cost).max(0.0))
            .collect();

        let (km_lo, km_hi) = range(candidates.iter().map(|c| c.route.km));
        let (price_lo, price_hi) = range(candidates.iter().map(|c| c.price_amount));
        let (prof_lo, prof_hi) = range(profits.iter().copied());

        let vol_need = offer.map(|o| o.volume_cbm).filter(|v| *v > 0.0);

        for (idx, c) in candidates.iter_mut().enumerate() {
            c.cost = Some(costs[idx]);

            let distance_score = norm_min_better(c.route.km, km_lo, km_hi);
            let price_score = norm_min_better(c.price_amount, price_lo, price_hi);
            let profit_score = norm_max_better(profits[idx], prof_lo, prof_hi);
            let util_score = util_balance_score(c.utilization, w.target_utilization);
            let sla_score = c.sla_fit.clamp(0.0, 1.0);

            // Availability is a multiplicative safety gate, not a weighted
            // term: a warehouse without room is pushed toward zero no matter
            // how attractive it looks otherwise.
            let availability_score = match vol_need {
                Some(need) => (c.available_cbm / need).clamp(0.0, 1.0),
                None => 1.0,
            };

            let base = w.profit * profit_score
                + w.utilbal * util_score
                + w.distance * distance_score
                + w.sla * sla_score
                + w.price * price_score;

            c.distance_score = round4(distance_score);
            c.price_score = round4(price_score);
            c.profit_score = round4(profit_score);
            c.util_score = round4(util_score);
            c.sla_score = round4(sla_score);
            c.availability_score = round4(availability_score);
            c.score = round6(base * availability_score);
        }

        // Stable sort: ties deliberately preserve input order.
        candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        candidates
    }
}

/// Cost for the profit term: supplied cost, else inferred from margin
/// (`cost = price * (1 - margin)`), else a conservative 95% of price. A
/// non-positive margin carries no information here.
fn resolve_cost(c: &Candidate) -> f64 {
    if let Some(cost) = c.cost {
        return cost;
    }
    if c.margin > 0.0 {
        return c.price_amount * (1.0 - c.margin);
    }
    (c.price_amount * 0.95).max(0.0)
}

fn range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)))
}
