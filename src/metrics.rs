use std::collections::BTreeMap;

use crate::filter::View;
use crate::models::MetricsSnapshot;

/// Lookback, in sorted month positions, for year-over-year growth.
const YEAR_LOOKBACK: usize = 12;

pub fn calculate_metrics(view: &View<'_>) -> MetricsSnapshot {
    let total_sales = view.total_sales();
    let total_quantity: i64 = view.iter().map(|record| record.quantity).sum();
    let total_profit: f64 = view.iter().map(|record| record.profit).sum();
    let returns = view.iter().filter(|record| record.returned).count();

    let avg_order_size = if total_quantity > 0 {
        total_sales / total_quantity as f64
    } else {
        0.0
    };

    let monthly = monthly_sales(view);

    MetricsSnapshot {
        total_sales,
        total_quantity,
        total_profit,
        avg_order_size,
        return_rate: percentage(returns as f64, view.len() as f64),
        mom_growth: positional_growth(&monthly, 1),
        yoy_growth: positional_growth(&monthly, YEAR_LOOKBACK),
    }
}

/// Sales summed per `YYYY-MM` key, ascending by key.
pub fn monthly_sales(view: &View<'_>) -> Vec<(String, f64)> {
    let mut months: BTreeMap<&str, f64> = BTreeMap::new();
    for record in view.iter() {
        *months.entry(record.year_month.as_str()).or_insert(0.0) += record.total_sales;
    }
    months
        .into_iter()
        .map(|(key, total)| (key.to_string(), total))
        .collect()
}

/// Growth of the last month over the month `lookback` positions before it.
///
/// Positions are taken from the sorted month list, so gaps in the calendar are not
/// accounted for. Returns 0 when there are not enough months or the base is zero.
pub fn positional_growth(monthly: &[(String, f64)], lookback: usize) -> f64 {
    if lookback == 0 || monthly.len() <= lookback {
        return 0.0;
    }
    let current = monthly[monthly.len() - 1].1;
    let base = monthly[monthly.len() - 1 - lookback].1;
    if base == 0.0 {
        return 0.0;
    }
    (current - base) / base * 100.0
}

/// `part / whole * 100`, or 0 when `whole` is zero.
pub fn percentage(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        0.0
    } else {
        part / whole * 100.0
    }
}
