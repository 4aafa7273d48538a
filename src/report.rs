// Daily digest of the steals alerted on in the last 24 hours.
use chrono::{Duration, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::model::FlightOffer;
use crate::notifier::TelegramNotifier;
use crate::storage::SqliteStorage;

/// Renders the digest body, cheapest first. Returns `None` when there is
/// nothing to report; a quiet day produces no message at all.
pub fn render_digest(offers: &[FlightOffer], currency: &str) -> Option<String> {
    if offers.is_empty() {
        return None;
    }
    let currency = currency.to_uppercase();
    let mut lines = vec![format!("🛫 STEAL deals – last 24 h ({})", offers.len())];
    for offer in offers {
        let dates = match offer.return_date {
            Some(ret) => format!("{} – {}", offer.depart_date, ret),
            None => format!("{} – OW", offer.depart_date),
        };
        lines.push(format!(
            "{} ➔ {} | {} | {} {} | {}",
            offer.origin,
            offer.destination,
            dates,
            offer.price.round_dp(0),
            currency,
            offer.deep_link
        ));
    }
    Some(lines.join("\n"))
}

/// Collects the last 24 hours of alerted offers and sends the digest over
/// the notifier channel.
pub async fn send_daily_report(
    storage: Arc<Mutex<SqliteStorage>>,
    notifier: &TelegramNotifier,
    currency: &str,
) {
    let cutoff = Utc::now() - Duration::hours(24);
    let offers = match storage.lock().await.alerted_offers_since(cutoff) {
        Ok(offers) => offers,
        Err(e) => {
            warn!("Daily report query failed: {:?}", e);
            return;
        }
    };

    match render_digest(&offers, currency) {
        Some(body) => {
            if let Err(e) = notifier.notify_text(&body).await {
                warn!("Daily report send failed: {:?}", e);
            } else {
                info!("Daily report sent with {} deals", offers.len());
            }
        }
        None => info!("No steals in the last 24 h, skipping daily report"),
    }
}
