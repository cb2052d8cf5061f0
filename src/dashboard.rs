use log::{debug, info, warn};
use serde::Serialize;

use crate::aggregate::{build_charts, AggregationOptions, ChartDescriptor, ChartId, ChartSet};
use crate::error::DashboardError;
use crate::filter::{filter_options, FilterPredicate};
use crate::insights::{generate_findings, Findings};
use crate::loader::Dataset;
use crate::metrics::calculate_metrics;
use crate::models::{FilterOptions, MetricsSnapshot};
use crate::report::{format_count, format_currency, format_percent};

/// KPI values rendered for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiDisplay {
    pub total_sales: String,
    pub total_quantity: String,
    pub total_profit: String,
    pub avg_order_size: String,
    pub mom_growth: String,
    pub yoy_growth: String,
    pub return_rate: String,
}

impl From<&MetricsSnapshot> for KpiDisplay {
    fn from(metrics: &MetricsSnapshot) -> Self {
        KpiDisplay {
            total_sales: format_currency(metrics.total_sales),
            total_quantity: format_count(metrics.total_quantity),
            total_profit: format_currency(metrics.total_profit),
            avg_order_size: format_currency(metrics.avg_order_size),
            mom_growth: format_percent(metrics.mom_growth),
            yoy_growth: format_percent(metrics.yoy_growth),
            return_rate: format_percent(metrics.return_rate),
        }
    }
}

/// Everything the presentation layer needs after one filter change.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardOutput {
    pub filter: FilterPredicate,
    pub record_count: usize,
    pub metrics: MetricsSnapshot,
    pub kpis: KpiDisplay,
    pub charts: ChartSet,
    pub chart_descriptors: Vec<ChartDescriptor>,
    pub findings: Findings,
    pub insights: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Owns a loaded dataset and recomputes the dashboard for any filter.
///
/// The dataset is never mutated after construction, so a `Dashboard` can be shared
/// across threads behind an `Arc` and queried concurrently.
#[derive(Debug, Clone)]
pub struct Dashboard {
    dataset: Dataset,
    options: AggregationOptions,
}

impl Dashboard {
    pub fn new(dataset: Dataset, options: AggregationOptions) -> Self {
        Self { dataset, options }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn filter_options(&self) -> FilterOptions {
        filter_options(&self.dataset)
    }

    pub fn recompute(&self, filter: &FilterPredicate) -> DashboardOutput {
        let view = filter.apply(&self.dataset);
        if view.is_empty() {
            info!("no records match {:?}", filter);
        }

        let metrics = calculate_metrics(&view);
        let charts = build_charts(&view, self.options);
        let findings = match generate_findings(&view) {
            Ok(findings) => findings,
            Err(DashboardError::EmptyView) => {
                debug!("skipping insights for empty view");
                Findings::default()
            }
            Err(err) => {
                warn!("insights unavailable: {err}");
                Findings::default()
            }
        };

        DashboardOutput {
            filter: filter.clone(),
            record_count: view.len(),
            kpis: KpiDisplay::from(&metrics),
            metrics,
            charts,
            chart_descriptors: ChartId::ALL.into_iter().map(ChartDescriptor::from).collect(),
            insights: findings.insights.iter().map(ToString::to_string).collect(),
            recommendations: findings
                .recommendations
                .iter()
                .map(ToString::to_string)
                .collect(),
            findings,
        }
    }
}
