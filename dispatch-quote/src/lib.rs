pub mod pricing;
pub mod scoring;

pub use pricing::{PricingModel, Quote, RateCard};
pub use scoring::{ScoreWeights, ScoringEngine};

/// Round to two decimals (money amounts).
pub(crate) fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Round to four decimals (margins and sub-scores).
pub(crate) fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}

/// Round to six decimals (final scores).
pub(crate) fn round6(v: f64) -> f64 {
    (v * 1_000_000.0).round() / 1_000_000.0
}
