// Core structs: FlightOffer, WeekdayStats, pair records, per-layer errors.
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

/// A single observed fare for a route, as returned by the price API.
///
/// Immutable once stored except for `alert_sent`, which flips false→true
/// exactly once when a steal alert goes out.
#[derive(Debug, Clone)]
pub struct FlightOffer {
    pub origin: String,
    pub destination: String,
    pub depart_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub price: Decimal,
    pub airline: String,
    pub stops: u32,
    pub total_flight_time_h: Option<f64>,
    pub max_layover_h: Option<f64>,
    pub deep_link: String,
    pub fetched_at: DateTime<Utc>,
    pub alert_sent: bool,
}

impl FlightOffer {
    /// Days between departure and return, `None` for one-way offers.
    pub fn trip_days(&self) -> Option<i64> {
        self.return_date.map(|ret| (ret - self.depart_date).num_days())
    }

    pub fn is_one_way(&self) -> bool {
        self.return_date.is_none()
    }
}

/// Departure-weekday price statistics for a route.
#[derive(Debug, Clone, PartialEq)]
pub struct WeekdayStats {
    pub mean: Decimal,
    pub std_dev: Decimal,
}

/// Candidate return leg found in the historical store.
#[derive(Debug, Clone)]
pub struct ReturnLeg {
    pub id: i64,
    pub price: Decimal,
    pub depart_date: NaiveDate,
}

/// A pair of one-way offers to be persisted as a synthetic round trip.
#[derive(Debug, Clone)]
pub struct NewPair {
    pub out_id: i64,
    pub in_id: i64,
    pub origin: String,
    pub destination: String,
    pub depart_date: NaiveDate,
    pub return_date: NaiveDate,
    pub price_total: Decimal,
    pub steal_pair: bool,
}

/// Outcome of a pair insert. `(out_id, in_id)` is unique in the store, so a
/// repeated insert is a no-op reported as `Duplicate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairInsert {
    Created(i64),
    Duplicate,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("api error: {0}")]
    Api(String),
    #[error("malformed offer payload: {0}")]
    Payload(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("telegram api error: {0}")]
    Api(String),
    #[error("telegram unreachable")]
    Unreachable,
}
