// Steal detection: three interchangeable policies behind one selector.
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::config::{AppConfig, StealPolicy};
use crate::engine::scoring;
use crate::model::{FlightOffer, WeekdayStats};

/// Historical context a steal decision is evaluated against. Computed fresh
/// for each decision; never reused across an alert cycle.
#[derive(Debug, Clone, Default)]
pub struct StealContext {
    /// Persisted 30-day rolling average for the route.
    pub rolling_avg: Option<Decimal>,
    /// Median-of-daily-minimums baseline for the route.
    pub baseline: Decimal,
    /// Departure-weekday statistics for the route, if any history exists.
    pub weekday: Option<WeekdayStats>,
    /// Date the decision is made on.
    pub today: NaiveDate,
}

/// Evaluate the configured policy for one offer.
pub fn evaluate(offer: &FlightOffer, cfg: &AppConfig, ctx: &StealContext) -> bool {
    match cfg.steal_policy {
        StealPolicy::Threshold => {
            is_threshold_steal(offer.price, ctx.rolling_avg, cfg.steal_threshold)
        }
        StealPolicy::Composite => is_good_composite(offer, cfg, ctx.baseline),
        StealPolicy::Weekday => {
            is_weekday_steal(offer.price, ctx.weekday.as_ref(), cfg.steal_threshold)
        }
    }
}

/// Fixed-percentage policy: steal iff `price <= avg * (1 - threshold)`.
/// Missing or non-positive history never produces a steal.
pub fn is_threshold_steal(price: Decimal, rolling_avg: Option<Decimal>, threshold: Decimal) -> bool {
    if price <= Decimal::ZERO {
        return false;
    }
    let Some(avg) = rolling_avg else {
        return false;
    };
    if avg <= Decimal::ZERO {
        return false;
    }
    price <= avg * (Decimal::ONE - threshold)
}

fn passes_gates(offer: &FlightOffer, cfg: &AppConfig) -> bool {
    if let Some(max_price) = cfg.max_price {
        if offer.price > max_price {
            return false;
        }
    }
    if let Some(max_total) = cfg.max_price_total {
        if offer.price * Decimal::from(cfg.passengers) > max_total {
            return false;
        }
    }
    if let Some(max_ppk) = cfg.max_price_per_km {
        if scoring::price_per_km(offer.price, &offer.origin, &offer.destination) > max_ppk {
            return false;
        }
    }
    !cfg.excluded_airlines.contains(&offer.airline)
}

/// Gate-and-score policy with the legacy weighted score: hard ceilings first,
/// then the score minimum.
pub fn is_good(offer: &FlightOffer, cfg: &AppConfig, baseline: Decimal, today: NaiveDate) -> bool {
    if offer.price <= Decimal::ZERO || baseline <= Decimal::ZERO {
        return false;
    }
    if !passes_gates(offer, cfg) {
        return false;
    }
    scoring::deal_score(offer, baseline, today) >= cfg.min_score
}

/// Gate-and-score policy with the weighted composite score.
pub fn is_good_composite(offer: &FlightOffer, cfg: &AppConfig, baseline: Decimal) -> bool {
    if offer.price <= Decimal::ZERO || baseline <= Decimal::ZERO {
        return false;
    }
    if !passes_gates(offer, cfg) {
        return false;
    }
    scoring::composite_score(offer, cfg, baseline) >= cfg.min_composite_score
}

/// Seasonal policy: steal iff `price < weekday_mean - k * weekday_stddev`.
/// No weekday row or a non-positive mean never produces a steal.
pub fn is_weekday_steal(price: Decimal, stats: Option<&WeekdayStats>, k: Decimal) -> bool {
    if price <= Decimal::ZERO {
        return false;
    }
    let Some(stats) = stats else {
        return false;
    };
    if stats.mean <= Decimal::ZERO {
        return false;
    }
    price < stats.mean - k * stats.std_dev
}
