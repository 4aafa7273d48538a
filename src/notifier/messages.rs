// Alert texts. Rendering is pure so the wording is testable without a bot.
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::engine::pairing::StealPair;
use crate::model::FlightOffer;

/// Instant steal alert for a single offer.
pub fn format_steal_alert(offer: &FlightOffer, rolling_avg: Option<Decimal>, currency: &str) -> String {
    let avg = match rolling_avg {
        Some(avg) if avg > Decimal::ZERO => avg,
        _ => offer.price,
    };
    let diff_pct = ((Decimal::ONE - offer.price / avg) * Decimal::ONE_HUNDRED)
        .to_i64()
        .unwrap_or(0);
    let dates = match offer.return_date {
        Some(ret) => format!("{} – {}", offer.depart_date, ret),
        None => format!("{} – OW", offer.depart_date),
    };
    format!(
        "✈️ STEAL!\n{} ➔ {}\n{}\n{} {} — -{}% vs 30-day average\n{}",
        offer.origin,
        offer.destination,
        dates,
        offer.price.round_dp(0),
        currency.to_uppercase(),
        diff_pct,
        offer.deep_link
    )
}

/// Instant alert for a paired one-way steal.
pub fn format_pair_alert(pair: &StealPair, currency: &str) -> String {
    let currency = currency.to_uppercase();
    format!(
        "💥 STEAL PAIR\n{}→{} {}  {}→{} {}\nOUT {} {currency} | IN {} {currency} | TOTAL {} {currency}",
        pair.origin,
        pair.destination,
        pair.depart_date,
        pair.destination,
        pair.origin,
        pair.return_date,
        pair.price_out.round_dp(0),
        pair.price_in.round_dp(0),
        pair.price_total().round_dp(0),
    )
}
