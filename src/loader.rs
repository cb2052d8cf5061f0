use std::io::Read;
use std::path::Path;

use chrono::{Datelike, Month, NaiveDate, NaiveDateTime};
use log::{debug, info};
use serde::Deserialize;

use crate::error::{DashboardError, Result};
use crate::models::{Record, TimeOfDay};

pub const REQUIRED_COLUMNS: [&str; 12] = [
    "Order_Date",
    "Hour",
    "Day_of_Week",
    "Product_ID",
    "Region_ID",
    "Sales_Rep_ID",
    "Quantity_Sold",
    "Total_Sales",
    "Profit",
    "Return_Flag",
    "Year",
    "Month",
];

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(rename = "Order_Date")]
    order_date: String,
    #[serde(rename = "Hour")]
    hour: i64,
    #[serde(rename = "Day_of_Week")]
    day_of_week: String,
    #[serde(rename = "Product_ID")]
    product_id: String,
    #[serde(rename = "Region_ID")]
    region_id: String,
    #[serde(rename = "Sales_Rep_ID")]
    sales_rep_id: String,
    #[serde(rename = "Quantity_Sold")]
    quantity: i64,
    #[serde(rename = "Total_Sales")]
    total_sales: f64,
    #[serde(rename = "Profit")]
    profit: f64,
    #[serde(rename = "Return_Flag")]
    return_flag: String,
    #[serde(rename = "Year")]
    year: i32,
    #[serde(rename = "Month")]
    month: u32,
}

/// Enriched, read-only record set shared by every filter pass.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

pub fn load_csv(path: &Path) -> Result<Dataset> {
    let file = std::fs::File::open(path)?;
    let dataset = load_from_reader(file)?;
    info!("loaded {} records from {}", dataset.len(), path.display());
    Ok(dataset)
}

pub fn load_from_reader<R: Read>(source: R) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(source);
    let headers = reader.headers()?.clone();

    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|header| header == column) {
            return Err(DashboardError::MissingColumn(column));
        }
    }

    let mut records = Vec::new();
    for (index, result) in reader.deserialize::<RawRow>().enumerate() {
        let row_number = index + 1;
        let raw = result.map_err(|err| schema_error_from_csv(err, &headers, row_number))?;
        records.push(enrich(raw, row_number)?);
    }

    debug!("preprocessed {} rows", records.len());
    Ok(Dataset::new(records))
}

fn schema_error_from_csv(
    err: csv::Error,
    headers: &csv::StringRecord,
    row: usize,
) -> DashboardError {
    if let csv::ErrorKind::Deserialize { err: inner, .. } = err.kind() {
        let field = inner
            .field()
            .and_then(|index| headers.get(index as usize))
            .unwrap_or("field")
            .to_string();
        return DashboardError::Schema {
            row,
            field,
            message: inner.kind().to_string(),
        };
    }
    if let csv::ErrorKind::UnequalLengths {
        expected_len, len, ..
    } = err.kind()
    {
        return DashboardError::Schema {
            row,
            field: "record".to_string(),
            message: format!("expected {expected_len} fields, found {len}"),
        };
    }
    DashboardError::Csv(err)
}

fn enrich(raw: RawRow, row: usize) -> Result<Record> {
    let order_date = parse_timestamp(&raw.order_date).ok_or_else(|| DashboardError::Schema {
        row,
        field: "Order_Date".to_string(),
        message: format!("unrecognised timestamp `{}`", raw.order_date),
    })?;

    let (hour, time_of_day) = u8::try_from(raw.hour)
        .ok()
        .and_then(|hour| TimeOfDay::from_hour(hour).map(|tod| (hour, tod)))
        .ok_or_else(|| DashboardError::Schema {
            row,
            field: "Hour".to_string(),
            message: format!("{} is outside 0-23", raw.hour),
        })?;

    for (field, value) in [("Total_Sales", raw.total_sales), ("Profit", raw.profit)] {
        if !value.is_finite() {
            return Err(DashboardError::Schema {
                row,
                field: field.to_string(),
                message: format!("{value} is not a finite amount"),
            });
        }
    }

    if month_name(raw.month).is_none() {
        return Err(DashboardError::Schema {
            row,
            field: "Month".to_string(),
            message: format!("{} is outside 1-12", raw.month),
        });
    }

    let returned = parse_flag(&raw.return_flag).ok_or_else(|| DashboardError::Schema {
        row,
        field: "Return_Flag".to_string(),
        message: format!("cannot read `{}` as a boolean", raw.return_flag),
    })?;

    let order_month = order_date.month();
    let profit_margin = if raw.total_sales != 0.0 {
        Some(raw.profit / raw.total_sales * 100.0)
    } else {
        None
    };
    let order_size = if raw.quantity > 0 {
        Some(raw.total_sales / raw.quantity as f64)
    } else {
        None
    };

    Ok(Record {
        hour,
        time_of_day,
        day_of_week: raw.day_of_week,
        product_id: raw.product_id,
        region_id: raw.region_id,
        sales_rep_id: raw.sales_rep_id,
        quantity: raw.quantity,
        total_sales: raw.total_sales,
        profit: raw.profit,
        returned,
        year: raw.year,
        month: raw.month,
        month_name: month_name(order_month).unwrap_or_default(),
        quarter: ((order_month - 1) / 3 + 1) as u8,
        year_month: order_date.format("%Y-%m").to_string(),
        order_date,
        profit_margin,
        order_size,
    })
}

/// English month name for 1-12.
pub fn month_name(month: u32) -> Option<&'static str> {
    u8::try_from(month)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .map(|m| m.name())
}

pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" => Some(true),
        "false" | "0" | "no" | "n" => Some(false),
        _ => None,
    }
}
