use crate::error::Error;
use crate::storage::models::StorageRecord;
use crate::storage::Database;
use chrono::{Duration, Local};
use std::collections::BTreeMap;
use tracing::debug;

/// History window the forecaster reads, in days.
pub const HISTORY_WINDOW_DAYS: i64 = 14;

/// Maximum number of trailing days in the moving average.
const MOVING_AVG_WINDOW: usize = 7;

/// Next-day occupancy prediction derived from recent history.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForecastData {
    pub current_mb: f64,
    pub predicted_mb: f64,
    /// Secant slope over the available window, in MB per day.
    pub growth_rate: f64,
    pub days_available: i64,
}

/// Read the last 14 days of history and project tomorrow's total.
pub fn project(db: &Database, current_total_mb: f64) -> Result<ForecastData, Error> {
    let history = db.get_history(HISTORY_WINDOW_DAYS, None)?;
    let data = project_from_history(&history, current_total_mb);
    debug!(
        "Forecast: {:.1} MB current, {:.1} MB predicted ({:+.2} MB/day over {} days)",
        data.current_mb, data.predicted_mb, data.growth_rate, data.days_available
    );
    Ok(data)
}

/// Persist a forecast, stamped with tomorrow's local date.
pub fn store(db: &Database, data: &ForecastData) -> Result<(), Error> {
    let tomorrow = (Local::now() + Duration::days(1)).format("%Y-%m-%d").to_string();
    db.insert_forecast(&tomorrow, data.predicted_mb)?;
    Ok(())
}

/// Moving-average-plus-trend estimator over system-wide daily totals.
///
/// History rows are collapsed to one total per date (summing all entities,
/// and summing duplicate rows from multiple cycles on the same day), so the
/// projection is independent of the granularity used at scan time. With
/// fewer than two days of history the prediction is the current total; the
/// result is clamped at zero so a large cleanup cannot produce a negative
/// forecast.
fn project_from_history(history: &[StorageRecord], current_total_mb: f64) -> ForecastData {
    let mut daily_totals: BTreeMap<&str, f64> = BTreeMap::new();
    for rec in history {
        *daily_totals.entry(rec.date.as_str()).or_default() += rec.size_mb;
    }

    let n = daily_totals.len();
    let mut data = ForecastData {
        current_mb: current_total_mb,
        days_available: n as i64,
        ..ForecastData::default()
    };

    if n <= 1 {
        data.predicted_mb = current_total_mb;
        return data;
    }

    // BTreeMap iteration is already date-ascending.
    let values: Vec<f64> = daily_totals.values().copied().collect();

    let window = MOVING_AVG_WINDOW.min(n);
    let moving_avg: f64 = values[n - window..].iter().sum::<f64>() / window as f64;

    data.growth_rate = (values[n - 1] - values[0]) / n as f64;
    data.predicted_mb = (moving_avg + data.growth_rate).max(0.0);
    data
}
