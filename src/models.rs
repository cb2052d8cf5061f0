use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Coarse part of the day an order was placed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
}

use TimeOfDay::{Afternoon, Evening, Morning, Night};

/// Category for every hour of the day. Night wraps midnight: 21-23 and 0-4.
#[rustfmt::skip]
const TIME_OF_DAY_BY_HOUR: [TimeOfDay; 24] = [
    Night, Night, Night, Night, Night, // 0-4
    Morning, Morning, Morning, Morning, Morning, Morning, Morning, // 5-11
    Afternoon, Afternoon, Afternoon, Afternoon, Afternoon, // 12-16
    Evening, Evening, Evening, Evening, // 17-20
    Night, Night, Night, // 21-23
];

impl TimeOfDay {
    /// Chronological order used by every time-of-day series.
    pub const ALL: [TimeOfDay; 4] = [Morning, Afternoon, Evening, Night];

    /// Returns `None` for hours outside 0-23.
    pub fn from_hour(hour: u8) -> Option<TimeOfDay> {
        TIME_OF_DAY_BY_HOUR.get(usize::from(hour)).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Morning => "Morning",
            Afternoon => "Afternoon",
            Evening => "Evening",
            Night => "Night",
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeOfDay {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeOfDay::ALL
            .into_iter()
            .find(|tod| tod.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!("unknown time of day `{s}` (expected morning, afternoon, evening or night)")
            })
    }
}

/// One transaction row after enrichment.
#[derive(Debug, Clone, Serialize)]
pub struct Record {
    pub order_date: NaiveDateTime,
    pub hour: u8,
    pub day_of_week: String,
    pub product_id: String,
    pub region_id: String,
    pub sales_rep_id: String,
    pub quantity: i64,
    pub total_sales: f64,
    pub profit: f64,
    pub returned: bool,
    pub year: i32,
    pub month: u32,
    pub time_of_day: TimeOfDay,
    pub month_name: &'static str,
    pub quarter: u8,
    /// `YYYY-MM`, sortable as a string.
    pub year_month: String,
    /// `profit / sales * 100`; `None` when sales is zero.
    pub profit_margin: Option<f64>,
    /// `sales / quantity`; `None` when quantity is not positive.
    pub order_size: Option<f64>,
}

/// Immutable KPI values computed for one view.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub total_sales: f64,
    pub total_quantity: i64,
    pub total_profit: f64,
    pub avg_order_size: f64,
    pub return_rate: f64,
    pub mom_growth: f64,
    pub yoy_growth: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySales {
    pub year: i32,
    pub month: u32,
    pub label: String,
    pub total_sales: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapCell {
    pub day_of_week: String,
    pub hour: u8,
    pub total_sales: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeOfDaySales {
    pub time_of_day: TimeOfDay,
    pub total_sales: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "product_id")]
pub enum ShareLabel {
    Product(String),
    Others,
}

impl fmt::Display for ShareLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShareLabel::Product(id) => f.write_str(id),
            ShareLabel::Others => f.write_str("Others"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductShare {
    pub label: ShareLabel,
    pub total_sales: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionReturns {
    pub region_id: String,
    pub total_sales: f64,
    pub returns: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarginPoint {
    pub year_month: String,
    pub avg_profit_margin: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepPerformance {
    pub sales_rep_id: String,
    pub total_sales: f64,
    pub total_profit: f64,
}

/// Values for populating the filter selectors.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterOptions {
    pub regions: Vec<String>,
    pub years: Vec<i32>,
    pub times_of_day: Vec<TimeOfDay>,
}

#[cfg(test)]
mod tests {
    use super::TimeOfDay::{Afternoon, Evening, Morning, Night};
    use super::*;

    #[test]
    fn every_hour_has_exactly_one_category() {
        for hour in 0u8..24 {
            assert!(TimeOfDay::from_hour(hour).is_some(), "hour {hour}");
        }
        assert_eq!(TimeOfDay::from_hour(24), None);
    }

    #[test]
    fn category_boundaries_follow_ranges() {
        assert_eq!(TimeOfDay::from_hour(4), Some(Night));
        assert_eq!(TimeOfDay::from_hour(5), Some(Morning));
        assert_eq!(TimeOfDay::from_hour(11), Some(Morning));
        assert_eq!(TimeOfDay::from_hour(12), Some(Afternoon));
        assert_eq!(TimeOfDay::from_hour(16), Some(Afternoon));
        assert_eq!(TimeOfDay::from_hour(17), Some(Evening));
        assert_eq!(TimeOfDay::from_hour(20), Some(Evening));
        assert_eq!(TimeOfDay::from_hour(21), Some(Night));
        assert_eq!(TimeOfDay::from_hour(0), Some(Night));
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("evening".parse::<TimeOfDay>(), Ok(Evening));
        assert_eq!(" NIGHT ".parse::<TimeOfDay>(), Ok(Night));
        assert!("dusk".parse::<TimeOfDay>().is_err());
    }
}
