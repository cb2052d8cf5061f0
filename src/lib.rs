//! Sales KPI pipeline: load a transaction CSV once, then recompute metrics, chart
//! series and insights for any region / time-of-day / year filter.

pub mod aggregate;
pub mod dashboard;
pub mod error;
pub mod filter;
pub mod insights;
pub mod loader;
pub mod metrics;
pub mod models;
pub mod report;

pub use dashboard::{Dashboard, DashboardOutput};
pub use error::{DashboardError, Result};
pub use filter::{FilterPredicate, View};
pub use loader::{load_csv, Dataset};
