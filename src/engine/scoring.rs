// Deal scoring: the legacy weighted score and the clamped composite score.
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::config::AppConfig;
use crate::geo;
use crate::model::FlightOffer;

const WEIGHT_PRICE: f64 = 0.6;
const WEIGHT_PRICE_PER_KM: f64 = 0.2;
const WEIGHT_LEAD_TIME: f64 = 0.2;
/// Departures about a month out score best.
const LEAD_TIME_ANCHOR_DAYS: i64 = 30;

/// Price per kilometre flown, or +inf when the distance is unknown so a
/// distance ceiling can never pass on missing data.
pub fn price_per_km(price: Decimal, origin: &str, destination: &str) -> f64 {
    let price = price.to_f64().unwrap_or(0.0);
    match geo::distance_km(origin, destination) {
        Some(dist) if dist > 0.0 => price / dist,
        _ => f64::INFINITY,
    }
}

/// Weighted deal score, higher is better. Combines the percentage below
/// baseline, the price per kilometre and the departure lead time, rounded to
/// two decimals. Non-positive price or baseline scores 0.
pub fn deal_score(offer: &FlightOffer, baseline: Decimal, today: NaiveDate) -> f64 {
    if offer.price <= Decimal::ZERO || baseline <= Decimal::ZERO {
        return 0.0;
    }

    let score_price = ((baseline - offer.price) / baseline * Decimal::ONE_HUNDRED)
        .to_f64()
        .unwrap_or(0.0);

    let ppk = price_per_km(offer.price, &offer.origin, &offer.destination);
    let score_ppk = if ppk.is_finite() { 5.0 - ppk } else { 0.0 };

    let days_until = (offer.depart_date - today).num_days();
    let score_time = 10.0 - (days_until - LEAD_TIME_ANCHOR_DAYS).abs() as f64 / 3.0;

    let score =
        WEIGHT_PRICE * score_price + WEIGHT_PRICE_PER_KM * score_ppk + WEIGHT_LEAD_TIME * score_time;
    (score * 100.0).round() / 100.0
}

fn clamp_score(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

/// Composite score: each sub-score normalized into 0–100 and combined with
/// the configured weights. Trip-duration fit is binary; an unknown trip
/// length (one-way offer) counts as fitting.
pub fn composite_score(offer: &FlightOffer, cfg: &AppConfig, baseline: Decimal) -> f64 {
    if offer.price <= Decimal::ZERO || baseline <= Decimal::ZERO {
        return 0.0;
    }

    let price = offer.price.to_f64().unwrap_or(0.0);
    let max_price = cfg
        .max_price
        .and_then(|ceiling| ceiling.to_f64())
        .unwrap_or(price);
    let price_score = if max_price > 0.0 {
        clamp_score((max_price - price) / max_price * 100.0)
    } else {
        0.0
    };

    let ppk = price_per_km(offer.price, &offer.origin, &offer.destination);
    let ppk_score = match cfg.max_price_per_km {
        Some(max_ppk) if max_ppk > 0.0 && ppk.is_finite() => {
            clamp_score((max_ppk - ppk) / max_ppk * 100.0)
        }
        _ if ppk.is_finite() => 100.0,
        _ => 0.0,
    };

    let baseline_score = clamp_score(
        ((baseline - offer.price) / baseline * Decimal::ONE_HUNDRED)
            .to_f64()
            .unwrap_or(0.0),
    );

    let days_score = match offer.trip_days() {
        None => 100.0,
        Some(days) if days < cfg.min_trip_days || days > cfg.max_trip_days => 0.0,
        Some(_) => 100.0,
    };

    cfg.weight_price * price_score
        + cfg.weight_price_per_km * ppk_score
        + cfg.weight_baseline_diff * baseline_score
        + cfg.weight_trip_duration * days_score
}
