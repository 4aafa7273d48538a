// Aggregation pipeline: per-route rolling averages, retention, weekday
// statistics. Runs once per day and after manual refreshes.
use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::info;

use crate::engine::baseline::{
    self, ROLLING_WINDOW_DAYS, WEEKDAY_WINDOW_DAYS, weekday_index,
};
use crate::model::StorageError;
use crate::storage::SqliteStorage;

/// Recomputes the 30-day rolling mean of daily minimums for every route with
/// recent history and persists it as today's aggregate. Aggregates past the
/// retention horizon are dropped. Returns the number of routes updated.
pub fn aggregate(storage: &SqliteStorage) -> Result<usize, StorageError> {
    let today = Utc::now().date_naive();
    let since = today - Duration::days(ROLLING_WINDOW_DAYS as i64);

    let rows = storage.price_observations_since(since)?;
    let mut by_route: BTreeMap<(String, String), Vec<(NaiveDate, Decimal)>> = BTreeMap::new();
    for (origin, destination, day, price) in rows {
        by_route
            .entry((origin, destination))
            .or_default()
            .push((day, price));
    }

    let mut updated = 0;
    for ((origin, destination), observations) in &by_route {
        let minimums = baseline::daily_minimums(observations);
        if let Some(mean) = baseline::rolling_mean(&minimums) {
            storage.upsert_daily_avg(origin, destination, today, mean)?;
            updated += 1;
        }
    }

    let pruned = storage.prune_aggregates()?;
    info!(
        "Aggregated {} routes, pruned {} stale aggregate rows",
        updated, pruned
    );
    Ok(updated)
}

/// Rebuilds the per-(route, departure-weekday) mean table over the 90-day
/// window. Returns the number of buckets written.
pub fn refresh_weekday_averages(storage: &SqliteStorage) -> Result<usize, StorageError> {
    let today = Utc::now().date_naive();
    let since = today - Duration::days(WEEKDAY_WINDOW_DAYS);

    let offers = storage.offers_for_weekday_aggregation(since)?;
    let mut buckets: BTreeMap<(String, String, u32), Vec<Decimal>> = BTreeMap::new();
    for (origin, destination, depart_date, price) in offers {
        buckets
            .entry((origin, destination, weekday_index(depart_date)))
            .or_default()
            .push(price);
    }

    let rows: Vec<(String, String, u32, Decimal)> = buckets
        .into_iter()
        .filter_map(|((origin, destination, weekday), prices)| {
            baseline::mean(&prices).map(|mean| (origin, destination, weekday, mean))
        })
        .collect();

    storage.replace_weekday_averages(&rows)?;
    info!("Refreshed {} weekday-average buckets", rows.len());
    Ok(rows.len())
}
