//! Builders that reduce a view into the series behind each dashboard chart.
//!
//! Every builder reads the view independently; none depends on another's output.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::Weekday;
use serde::Serialize;

use crate::filter::View;
use crate::loader::month_name;
use crate::models::{
    HeatmapCell, MarginPoint, MonthlySales, ProductShare, RegionReturns, RepPerformance,
    ShareLabel, TimeOfDay, TimeOfDaySales,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregationOptions {
    pub top_products: usize,
    pub top_reps: usize,
}

impl Default for AggregationOptions {
    fn default() -> Self {
        Self {
            top_products: 5,
            top_reps: 10,
        }
    }
}

/// Identifies one chart and its presentation labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChartId {
    MonthlyTrend,
    HourlyHeatmap,
    TimeOfDay,
    ProductShare,
    SalesVsReturns,
    ProfitMargin,
    SalesRep,
}

impl ChartId {
    pub const ALL: [ChartId; 7] = [
        ChartId::MonthlyTrend,
        ChartId::HourlyHeatmap,
        ChartId::TimeOfDay,
        ChartId::ProductShare,
        ChartId::SalesVsReturns,
        ChartId::ProfitMargin,
        ChartId::SalesRep,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            ChartId::MonthlyTrend => "monthly-trend",
            ChartId::HourlyHeatmap => "hourly-heatmap",
            ChartId::TimeOfDay => "time-of-day",
            ChartId::ProductShare => "product-share",
            ChartId::SalesVsReturns => "sales-vs-returns",
            ChartId::ProfitMargin => "profit-margin",
            ChartId::SalesRep => "sales-rep",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ChartId::MonthlyTrend => "Monthly Sales Trend",
            ChartId::HourlyHeatmap => "Sales Heatmap by Hour and Day",
            ChartId::TimeOfDay => "Sales by Time of Day",
            ChartId::ProductShare => "Sales Share by Product",
            ChartId::SalesVsReturns => "Sales vs Returns by Region",
            ChartId::ProfitMargin => "Average Profit Margin Trend",
            ChartId::SalesRep => "Top Sales Representatives by Total Sales",
        }
    }

    /// (x axis, y axis) labels.
    pub fn axes(&self) -> (&'static str, &'static str) {
        match self {
            ChartId::MonthlyTrend => ("Month", "Total Sales"),
            ChartId::HourlyHeatmap => ("Hour of Day", "Day of Week"),
            ChartId::TimeOfDay => ("Time of Day", "Total Sales"),
            ChartId::ProductShare => ("Product", "Total Sales"),
            ChartId::SalesVsReturns => ("Region", "Count"),
            ChartId::ProfitMargin => ("Month", "Profit Margin (%)"),
            ChartId::SalesRep => ("Total Sales", "Sales Rep ID"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartDescriptor {
    pub id: &'static str,
    pub title: &'static str,
    pub x_axis: &'static str,
    pub y_axis: &'static str,
}

impl From<ChartId> for ChartDescriptor {
    fn from(chart: ChartId) -> Self {
        let (x_axis, y_axis) = chart.axes();
        ChartDescriptor {
            id: chart.id(),
            title: chart.title(),
            x_axis,
            y_axis,
        }
    }
}

/// The seven chart series for one view, in `ChartId::ALL` order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartSet {
    #[serde(rename = "monthly-trend")]
    pub monthly_trend: Vec<MonthlySales>,
    #[serde(rename = "hourly-heatmap")]
    pub hourly_heatmap: Vec<HeatmapCell>,
    #[serde(rename = "time-of-day")]
    pub time_of_day: Vec<TimeOfDaySales>,
    #[serde(rename = "product-share")]
    pub product_share: Vec<ProductShare>,
    #[serde(rename = "sales-vs-returns")]
    pub sales_vs_returns: Vec<RegionReturns>,
    #[serde(rename = "profit-margin")]
    pub profit_margin: Vec<MarginPoint>,
    #[serde(rename = "sales-rep")]
    pub rep_ranking: Vec<RepPerformance>,
}

pub fn build_charts(view: &View<'_>, options: AggregationOptions) -> ChartSet {
    ChartSet {
        monthly_trend: monthly_trend(view),
        hourly_heatmap: hourly_heatmap(view),
        time_of_day: time_of_day_distribution(view),
        product_share: product_share(view, options.top_products),
        sales_vs_returns: sales_vs_returns(view),
        profit_margin: profit_margin_trend(view),
        rep_ranking: rep_ranking(view, options.top_reps),
    }
}

pub fn monthly_trend(view: &View<'_>) -> Vec<MonthlySales> {
    let mut months: BTreeMap<(i32, u32), f64> = BTreeMap::new();
    for record in view.iter() {
        *months.entry((record.year, record.month)).or_insert(0.0) += record.total_sales;
    }

    months
        .into_iter()
        .map(|((year, month), total_sales)| MonthlySales {
            year,
            month,
            label: format!("{} {}", month_name(month).unwrap_or_default(), year),
            total_sales,
        })
        .collect()
}

/// Only combinations present in the view are emitted.
pub fn hourly_heatmap(view: &View<'_>) -> Vec<HeatmapCell> {
    let mut cells: BTreeMap<(DayKey, u8), f64> = BTreeMap::new();
    for record in view.iter() {
        let key = (DayKey::new(&record.day_of_week), record.hour);
        *cells.entry(key).or_insert(0.0) += record.total_sales;
    }

    cells
        .into_iter()
        .map(|((day, hour), total_sales)| HeatmapCell {
            day_of_week: day.label,
            hour,
            total_sales,
        })
        .collect()
}

/// Always four entries, Morning through Night.
pub fn time_of_day_distribution(view: &View<'_>) -> Vec<TimeOfDaySales> {
    TimeOfDay::ALL
        .into_iter()
        .map(|time_of_day| TimeOfDaySales {
            time_of_day,
            total_sales: view
                .iter()
                .filter(|record| record.time_of_day == time_of_day)
                .map(|record| record.total_sales)
                .sum(),
        })
        .collect()
}

pub fn product_share(view: &View<'_>, top: usize) -> Vec<ProductShare> {
    let ranked = ranked_totals(view.iter().map(|r| (r.product_id.as_str(), r.total_sales)));
    let total: f64 = ranked.iter().map(|(_, sales)| sales).sum();

    let others = if ranked.len() <= top {
        0.0
    } else {
        let kept: f64 = ranked.iter().take(top).map(|(_, sales)| sales).sum();
        (total - kept).max(0.0)
    };

    let mut shares: Vec<ProductShare> = ranked
        .into_iter()
        .take(top)
        .map(|(product, total_sales)| ProductShare {
            label: ShareLabel::Product(product.to_string()),
            total_sales,
        })
        .collect();
    shares.push(ProductShare {
        label: ShareLabel::Others,
        total_sales: others,
    });
    shares
}

pub fn sales_vs_returns(view: &View<'_>) -> Vec<RegionReturns> {
    let mut regions: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for record in view.iter() {
        let entry = regions.entry(record.region_id.as_str()).or_insert((0.0, 0));
        entry.0 += record.total_sales;
        if record.returned {
            entry.1 += 1;
        }
    }

    let mut rows: Vec<RegionReturns> = regions
        .into_iter()
        .map(|(region_id, (total_sales, returns))| RegionReturns {
            region_id: region_id.to_string(),
            total_sales,
            returns,
        })
        .collect();
    rows.sort_by(|a, b| descending(a.total_sales, b.total_sales));
    rows
}

/// Mean of row-level margins per month; rows with undefined margin are skipped.
pub fn profit_margin_trend(view: &View<'_>) -> Vec<MarginPoint> {
    let mut months: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for record in view.iter() {
        if let Some(margin) = record.profit_margin {
            let entry = months.entry(record.year_month.as_str()).or_insert((0.0, 0));
            entry.0 += margin;
            entry.1 += 1;
        }
    }

    months
        .into_iter()
        .map(|(year_month, (sum, count))| MarginPoint {
            year_month: year_month.to_string(),
            avg_profit_margin: sum / count as f64,
        })
        .collect()
}

pub fn rep_ranking(view: &View<'_>, top: usize) -> Vec<RepPerformance> {
    let mut reps: BTreeMap<&str, (f64, f64)> = BTreeMap::new();
    for record in view.iter() {
        let entry = reps.entry(record.sales_rep_id.as_str()).or_insert((0.0, 0.0));
        entry.0 += record.total_sales;
        entry.1 += record.profit;
    }

    let mut rows: Vec<RepPerformance> = reps
        .into_iter()
        .map(|(sales_rep_id, (total_sales, total_profit))| RepPerformance {
            sales_rep_id: sales_rep_id.to_string(),
            total_sales,
            total_profit,
        })
        .collect();
    rows.sort_by(|a, b| descending(a.total_sales, b.total_sales));
    rows.truncate(top);
    rows
}

/// Sums values per key and orders by total descending, ties by key ascending.
pub(crate) fn ranked_totals<'a, I>(pairs: I) -> Vec<(&'a str, f64)>
where
    I: IntoIterator<Item = (&'a str, f64)>,
{
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for (key, value) in pairs {
        *totals.entry(key).or_insert(0.0) += value;
    }
    let mut ranked: Vec<(&str, f64)> = totals.into_iter().collect();
    ranked.sort_by(|a, b| descending(a.1, b.1));
    ranked
}

fn descending(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}

/// Day-of-week sort key: weekday names and numbers in week order, anything else after.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct DayKey {
    rank: u32,
    label: String,
}

impl DayKey {
    fn new(label: &str) -> Self {
        let rank = label
            .parse::<Weekday>()
            .map(|day| day.num_days_from_monday())
            .or_else(|_| label.parse::<u32>())
            .unwrap_or(u32::MAX);
        DayKey {
            rank,
            label: label.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterPredicate;
    use crate::loader::tests::dataset_from;
    use crate::loader::Dataset;

    fn sample() -> Dataset {
        dataset_from(&[
            "2023-02-01 09:00:00,9,Wednesday,P1,R1,S1,2,100,20,false,2023,2",
            "2023-01-15 22:00:00,22,Sunday,P2,R1,S2,1,50,5,true,2023,1",
            "2023-01-16 13:00:00,13,Monday,P3,R2,S1,4,200,40,false,2023,1",
            "2022-12-30 13:00:00,13,Friday,P4,R2,S3,1,10,5,true,2022,12",
            "2023-02-02 09:00:00,9,Thursday,P5,R3,S4,1,30,3,false,2023,2",
            "2023-02-03 10:00:00,10,Friday,P6,R3,S5,1,20,1,false,2023,2",
            "2023-02-04 09:00:00,9,Saturday,P7,R3,S6,2,40,0,false,2023,2",
        ])
    }

    #[test]
    fn monthly_trend_is_chronological() {
        let dataset = sample();
        let trend = monthly_trend(&FilterPredicate::all().apply(&dataset));
        let labels: Vec<&str> = trend.iter().map(|m| m.label.as_str()).collect();
        assert_eq!(labels, vec!["December 2022", "January 2023", "February 2023"]);
        assert_eq!(trend[1].total_sales, 250.0);
    }

    #[test]
    fn time_of_day_has_fixed_order() {
        let dataset = sample();
        let view = FilterPredicate::all().with_regions(["R2"]).apply(&dataset);
        let series = time_of_day_distribution(&view);
        let order: Vec<TimeOfDay> = series.iter().map(|s| s.time_of_day).collect();
        assert_eq!(order, TimeOfDay::ALL.to_vec());
        assert_eq!(series[0].total_sales, 0.0);
        assert_eq!(series[1].total_sales, 210.0);
    }

    #[test]
    fn product_share_sums_to_total() {
        let dataset = sample();
        let view = FilterPredicate::all().apply(&dataset);
        let shares = product_share(&view, 5);
        assert_eq!(shares.len(), 6);
        assert_eq!(shares[0].label, ShareLabel::Product("P3".to_string()));
        let others = shares.last().map(|s| s.total_sales).unwrap_or(-1.0);
        assert!((others - 30.0).abs() < 1e-9);
        let sum: f64 = shares.iter().map(|s| s.total_sales).sum();
        assert!((sum - view.total_sales()).abs() < 1e-9);
    }

    #[test]
    fn product_share_with_few_products_has_zero_others() {
        let dataset = sample();
        let view = FilterPredicate::all().with_regions(["R1"]).apply(&dataset);
        let shares = product_share(&view, 5);
        assert_eq!(shares.len(), 3);
        assert_eq!(shares[2].label, ShareLabel::Others);
        assert_eq!(shares[2].total_sales, 0.0);
    }

    #[test]
    fn regions_sorted_by_sales_with_return_counts() {
        let dataset = sample();
        let rows = sales_vs_returns(&FilterPredicate::all().apply(&dataset));
        let regions: Vec<&str> = rows.iter().map(|r| r.region_id.as_str()).collect();
        assert_eq!(regions, vec!["R2", "R1", "R3"]);
        assert_eq!(rows[0].returns, 1);
        assert_eq!(rows[2].returns, 0);
    }

    #[test]
    fn margin_trend_averages_row_margins() {
        let dataset = dataset_from(&[
            "2023-01-01,9,Sunday,P1,R1,S1,1,100,50,false,2023,1",
            "2023-01-02,9,Monday,P1,R1,S1,1,900,90,false,2023,1",
            "2023-01-03,9,Tuesday,P1,R1,S1,0,0,-10,true,2023,1",
        ]);
        let trend = profit_margin_trend(&FilterPredicate::all().apply(&dataset));
        assert_eq!(trend.len(), 1);
        // (50% + 10%) / 2, not 140 / 1000
        assert!((trend[0].avg_profit_margin - 30.0).abs() < 1e-9);
    }

    #[test]
    fn rep_ranking_truncates() {
        let dataset = sample();
        let view = FilterPredicate::all().apply(&dataset);
        let reps = rep_ranking(&view, 2);
        assert_eq!(reps.len(), 2);
        assert_eq!(reps[0].sales_rep_id, "S1");
        assert_eq!(reps[0].total_sales, 300.0);
        assert_eq!(reps[0].total_profit, 60.0);
    }

    #[test]
    fn heatmap_orders_days_by_week() {
        let dataset = sample();
        let cells = hourly_heatmap(&FilterPredicate::all().apply(&dataset));
        assert_eq!(cells.len(), 7);
        assert_eq!(cells[0].day_of_week, "Monday");
        assert_eq!(cells[6].day_of_week, "Sunday");
    }

    #[test]
    fn descriptors_follow_serialized_series_order() {
        let json = serde_json::to_string(&ChartSet::default()).expect("serializable");
        let positions: Vec<usize> = ChartId::ALL
            .iter()
            .map(|chart| json.find(&format!("\"{}\"", chart.id())).expect("series key"))
            .collect();
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn empty_view_builds_empty_series() {
        let dataset = sample();
        let view = FilterPredicate::all().with_year(Some(1999)).apply(&dataset);
        let charts = build_charts(&view, AggregationOptions::default());
        assert!(charts.monthly_trend.is_empty());
        assert!(charts.hourly_heatmap.is_empty());
        assert_eq!(charts.time_of_day.len(), 4);
        assert_eq!(charts.product_share.len(), 1);
        assert_eq!(charts.product_share[0].total_sales, 0.0);
        assert!(charts.rep_ranking.is_empty());
    }
}
