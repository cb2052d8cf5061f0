use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::aggregate::ranked_totals;
use crate::error::{DashboardError, Result};
use crate::filter::View;
use crate::metrics::percentage;
use crate::models::TimeOfDay;
use crate::report::format_currency;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Insight {
    PeakTimeOfDay {
        time_of_day: TimeOfDay,
        share: f64,
    },
    TopProduct {
        product_id: String,
        total_sales: f64,
        share: f64,
    },
    TopRegion {
        region_id: String,
        total_sales: f64,
        share: f64,
    },
}

impl fmt::Display for Insight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Insight::PeakTimeOfDay { time_of_day, share } => write!(
                f,
                "Peak sales occur during {time_of_day}, accounting for {share:.1}% of total sales"
            ),
            Insight::TopProduct {
                product_id,
                total_sales,
                share,
            } => write!(
                f,
                "Product {product_id} is the best performer, generating {} in sales ({share:.1}% of total sales)",
                format_currency(*total_sales)
            ),
            Insight::TopRegion {
                region_id,
                total_sales,
                share,
            } => write!(
                f,
                "Region {region_id} is the best performing region, generating {} in sales ({share:.1}% of total sales)",
                format_currency(*total_sales)
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Recommendation {
    TargetTimeOfDay { time_of_day: TimeOfDay },
    FocusProduct { product_id: String, total_profit: f64 },
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recommendation::TargetTimeOfDay { time_of_day } => write!(
                f,
                "Increase marketing and sales efforts during {time_of_day} to maximize sales"
            ),
            Recommendation::FocusProduct {
                product_id,
                total_profit,
            } => write!(
                f,
                "Focus on Product {product_id} which generates the highest total profit ({})",
                format_currency(*total_profit)
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Findings {
    pub insights: Vec<Insight>,
    pub recommendations: Vec<Recommendation>,
}

/// Derives the headline findings for a view.
///
/// Fails with [`DashboardError::EmptyView`] when there is nothing to rank. Ties resolve to the
/// first candidate: chronological for time of day, ascending id otherwise.
pub fn generate_findings(view: &View<'_>) -> Result<Findings> {
    if view.is_empty() {
        return Err(DashboardError::EmptyView);
    }
    let total_sales = view.total_sales();

    let (peak_time, peak_sales) = peak_time_of_day(view).ok_or(DashboardError::EmptyView)?;

    let (product_id, product_sales) =
        top_entry(view.iter().map(|r| (r.product_id.as_str(), r.total_sales)))?;
    let (region_id, region_sales) =
        top_entry(view.iter().map(|r| (r.region_id.as_str(), r.total_sales)))?;
    let (profit_product, product_profit) =
        top_entry(view.iter().map(|r| (r.product_id.as_str(), r.profit)))?;

    Ok(Findings {
        insights: vec![
            Insight::PeakTimeOfDay {
                time_of_day: peak_time,
                share: percentage(peak_sales, total_sales),
            },
            Insight::TopProduct {
                product_id: product_id.to_string(),
                total_sales: product_sales,
                share: percentage(product_sales, total_sales),
            },
            Insight::TopRegion {
                region_id: region_id.to_string(),
                total_sales: region_sales,
                share: percentage(region_sales, total_sales),
            },
        ],
        recommendations: vec![
            Recommendation::TargetTimeOfDay {
                time_of_day: peak_time,
            },
            Recommendation::FocusProduct {
                product_id: profit_product.to_string(),
                total_profit: product_profit,
            },
        ],
    })
}

/// Best-selling time of day among those with at least one order in the view.
fn peak_time_of_day(view: &View<'_>) -> Option<(TimeOfDay, f64)> {
    let mut totals: BTreeMap<TimeOfDay, f64> = BTreeMap::new();
    for record in view.iter() {
        *totals.entry(record.time_of_day).or_insert(0.0) += record.total_sales;
    }
    totals.into_iter().reduce(|best, next| if next.1 > best.1 { next } else { best })
}

fn top_entry<'a, I>(pairs: I) -> Result<(&'a str, f64)>
where
    I: IntoIterator<Item = (&'a str, f64)>,
{
    ranked_totals(pairs)
        .into_iter()
        .next()
        .ok_or(DashboardError::EmptyView)
}
