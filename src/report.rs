use std::fmt::Write;

use crate::dashboard::DashboardOutput;
use crate::filter::FilterPredicate;

/// `$1,234.56`, with a leading minus for negative amounts.
pub fn format_currency(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let fixed = format!("{:.2}", value.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    format!("{sign}${}.{cents}", group_thousands(whole))
}

pub fn format_count(value: i64) -> String {
    let sign = if value < 0 { "-" } else { "" };
    format!("{sign}{}", group_thousands(&value.unsigned_abs().to_string()))
}

pub fn format_percent(value: f64) -> String {
    format!("{value:.2}%")
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

pub fn describe_filter(filter: &FilterPredicate) -> String {
    let mut parts = Vec::new();
    if !filter.regions.is_empty() {
        let regions: Vec<&str> = filter.regions.iter().map(String::as_str).collect();
        parts.push(format!("regions {}", regions.join(", ")));
    }
    if !filter.times_of_day.is_empty() {
        let times: Vec<&str> = filter.times_of_day.iter().map(|t| t.as_str()).collect();
        parts.push(times.join(", "));
    }
    if let Some(year) = filter.year {
        parts.push(format!("year {year}"));
    }
    if parts.is_empty() {
        "all sales".to_string()
    } else {
        parts.join("; ")
    }
}

pub fn build_report(output: &DashboardOutput) -> String {
    let mut report = String::new();
    let metrics = &output.metrics;

    let _ = writeln!(report, "# Sales Dashboard Report");
    let _ = writeln!(
        report,
        "Generated for {} ({} orders)",
        describe_filter(&output.filter),
        output.record_count
    );
    let _ = writeln!(report);
    let _ = writeln!(report, "## Key Performance Indicators");
    let _ = writeln!(report, "| Metric | Value |");
    let _ = writeln!(report, "| --- | --- |");
    let _ = writeln!(report, "| Total Sales | {} |", format_currency(metrics.total_sales));
    let _ = writeln!(report, "| Quantity Sold | {} |", format_count(metrics.total_quantity));
    let _ = writeln!(report, "| Total Profit | {} |", format_currency(metrics.total_profit));
    let _ = writeln!(report, "| Avg Order Size | {} |", format_currency(metrics.avg_order_size));
    let _ = writeln!(report, "| Return Rate | {} |", format_percent(metrics.return_rate));
    let _ = writeln!(report, "| MoM Growth | {} |", format_percent(metrics.mom_growth));
    let _ = writeln!(report, "| YoY Growth | {} |", format_percent(metrics.yoy_growth));

    let charts = &output.charts;

    let _ = writeln!(report);
    let _ = writeln!(report, "## Monthly Sales Trend");
    if charts.monthly_trend.is_empty() {
        let _ = writeln!(report, "No sales recorded for this selection.");
    }
    for month in &charts.monthly_trend {
        let _ = writeln!(report, "- {}: {}", month.label, format_currency(month.total_sales));
    }

    let _ = writeln!(report);
    let _ = writeln!(report, "## Sales by Time of Day");
    for slot in &charts.time_of_day {
        let _ = writeln!(report, "- {}: {}", slot.time_of_day, format_currency(slot.total_sales));
    }

    let _ = writeln!(report);
    let _ = writeln!(report, "## Busiest Hours");
    let mut cells = charts.hourly_heatmap.clone();
    cells.sort_by(|a, b| b.total_sales.total_cmp(&a.total_sales));
    if cells.is_empty() {
        let _ = writeln!(report, "No sales recorded for this selection.");
    }
    for cell in cells.iter().take(5) {
        let _ = writeln!(
            report,
            "- {} {:02}:00: {}",
            cell.day_of_week,
            cell.hour,
            format_currency(cell.total_sales)
        );
    }

    let _ = writeln!(report);
    let _ = writeln!(report, "## Sales Share by Product");
    for share in &charts.product_share {
        let _ = writeln!(report, "- {}: {}", share.label, format_currency(share.total_sales));
    }

    let _ = writeln!(report);
    let _ = writeln!(report, "## Sales vs Returns by Region");
    if charts.sales_vs_returns.is_empty() {
        let _ = writeln!(report, "No sales recorded for this selection.");
    }
    for region in &charts.sales_vs_returns {
        let _ = writeln!(
            report,
            "- Region {}: {} in sales, {} returns",
            region.region_id,
            format_currency(region.total_sales),
            region.returns
        );
    }

    let _ = writeln!(report);
    let _ = writeln!(report, "## Profit Margin Trend");
    if charts.profit_margin.is_empty() {
        let _ = writeln!(report, "No margins available for this selection.");
    }
    for point in &charts.profit_margin {
        let _ = writeln!(
            report,
            "- {}: {}",
            point.year_month,
            format_percent(point.avg_profit_margin)
        );
    }

    let _ = writeln!(report);
    let _ = writeln!(report, "## Top Sales Representatives");
    if charts.rep_ranking.is_empty() {
        let _ = writeln!(report, "No sales recorded for this selection.");
    }
    for rep in &charts.rep_ranking {
        let _ = writeln!(
            report,
            "- {}: {} in sales, {} profit",
            rep.sales_rep_id,
            format_currency(rep.total_sales),
            format_currency(rep.total_profit)
        );
    }

    let _ = writeln!(report);
    let _ = writeln!(report, "## Key Insights");
    if output.insights.is_empty() {
        let _ = writeln!(report, "No data for this selection.");
    }
    for insight in &output.insights {
        let _ = writeln!(report, "- {insight}");
    }

    let _ = writeln!(report);
    let _ = writeln!(report, "## Recommendations");
    if output.recommendations.is_empty() {
        let _ = writeln!(report, "No data for this selection.");
    }
    for recommendation in &output.recommendations {
        let _ = writeln!(report, "- {recommendation}");
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::AggregationOptions;
    use crate::dashboard::Dashboard;
    use crate::loader::tests::dataset_from;
    use crate::models::TimeOfDay;

    #[test]
    fn currency_groups_thousands() {
        assert_eq!(format_currency(1234567.891), "$1,234,567.89");
        assert_eq!(format_currency(999.5), "$999.50");
        assert_eq!(format_currency(-1500.0), "-$1,500.00");
        assert_eq!(format_currency(0.0), "$0.00");
    }

    #[test]
    fn count_and_percent_formats() {
        assert_eq!(format_count(1234), "1,234");
        assert_eq!(format_count(12), "12");
        assert_eq!(format_percent(33.3333), "33.33%");
    }

    #[test]
    fn filter_description() {
        let filter = FilterPredicate::all()
            .with_regions(["2", "1"])
            .with_times_of_day([TimeOfDay::Night])
            .with_year(Some(2023));
        assert_eq!(describe_filter(&filter), "regions 1, 2; Night; year 2023");
        assert_eq!(describe_filter(&FilterPredicate::all()), "all sales");
    }

    #[test]
    fn report_lists_sections() {
        let dataset = dataset_from(&[
            "2023-01-05 09:00:00,9,Thursday,P1,1,S1,2,1500,300,false,2023,1",
            "2023-02-06 22:00:00,22,Monday,P2,2,S2,1,50,5,true,2023,2",
        ]);
        let dashboard = Dashboard::new(dataset, AggregationOptions::default());
        let report = build_report(&dashboard.recompute(&FilterPredicate::all()));

        assert!(report.contains("| Total Sales | $1,550.00 |"));
        assert!(report.contains("- January 2023: $1,500.00"));
        assert!(report.contains("- Region 1: $1,500.00 in sales, 0 returns"));
        assert!(report.contains("Peak sales occur during Morning"));
    }

    #[test]
    fn empty_selection_still_renders() {
        let dataset = dataset_from(&["2023-01-05,9,Thursday,P1,1,S1,2,10,3,false,2023,1"]);
        let dashboard = Dashboard::new(dataset, AggregationOptions::default());
        let filter = FilterPredicate::all().with_regions(["7"]);
        let report = build_report(&dashboard.recompute(&filter));

        assert!(report.contains("| Total Sales | $0.00 |"));
        assert!(report.contains("No data for this selection."));
    }
}
