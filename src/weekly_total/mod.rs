//! The weekly spending report.
//!
//! Expenses are grouped by the ISO 8601 week they fall in, and each week is summarised with
//! its number of expenses, total and daily average.

mod aggregation;
mod endpoint;
mod iso_week;

pub use aggregation::{WeeklyTotal, aggregate_weekly_totals};
pub use endpoint::{get_weekly_totals_endpoint, weekly_total_detail_endpoint};
pub use iso_week::{IsoWeek, iso_week_start};
