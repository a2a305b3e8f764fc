use dispatch_core::{DecisionRecord, DispatchStore, StoreError};
use serde::Serialize;
use std::collections::HashMap;

/// Smoothing factor for the utilization EWMA over winning candidates.
const EWMA_ALPHA: f64 = 0.3;

/// Per-warehouse KPIs aggregated from recent decision runs.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WarehouseKpi {
    pub wins: u32,
    pub bids: u32,
    pub accept_rate: f64,
    pub avg_profit: f64,
    pub avg_margin: f64,
    pub avg_price: f64,
    pub ewma_util: f64,
}

#[derive(Debug, Default)]
struct Accumulator {
    wins: u32,
    bids: u32,
    profit_sum: f64,
    margin_sum: f64,
    price_sum: f64,
    ewma_util: Option<f64>,
}

/// Roll decision history up into per-warehouse KPIs. A warehouse bids every
/// time it appears as a candidate and wins when it is chosen; the EWMA
/// tracks the utilization it was chosen at.
pub fn compute_warehouse_stats(records: &[DecisionRecord]) -> HashMap<String, WarehouseKpi> {
    let mut acc: HashMap<String, Accumulator> = HashMap::new();

    for record in records {
        let chosen = record.decision.chosen_warehouse.as_deref();

        for candidate in &record.decision.candidates {
            let entry = acc.entry(candidate.warehouse_id.clone()).or_default();
            entry.bids += 1;
            entry.profit_sum += candidate.profit;
            entry.margin_sum += candidate.margin;
            entry.price_sum += candidate.price_amount;

            if chosen == Some(candidate.warehouse_id.as_str()) {
                let util = candidate.utilization;
                entry.ewma_util = Some(match entry.ewma_util {
                    None => util,
                    Some(prev) => EWMA_ALPHA * util + (1.0 - EWMA_ALPHA) * prev,
                });
            }
        }

        if let Some(winner) = chosen {
            acc.entry(winner.to_string()).or_default().wins += 1;
        }
    }

    acc.into_iter()
        .map(|(warehouse_id, a)| {
            let denom = a.bids.max(1) as f64;
            (
                warehouse_id,
                WarehouseKpi {
                    wins: a.wins,
                    bids: a.bids,
                    accept_rate: a.wins as f64 / denom,
                    avg_profit: a.profit_sum / denom,
                    avg_margin: a.margin_sum / denom,
                    avg_price: a.price_sum / denom,
                    ewma_util: a.ewma_util.unwrap_or(0.0),
                },
            )
        })
        .collect()
}

/// KPIs over the store's recent decision runs.
pub async fn warehouse_stats(store: &dyn DispatchStore, days: u32) -> Result<HashMap<String, WarehouseKpi>, StoreError> {
    let records = store.recent_decisions(days).await?;
    Ok(compute_warehouse_stats(&records))
}
