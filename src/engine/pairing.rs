// One-way pairing: combine a new outbound one-way offer with stored return
// legs into a synthetic round trip, gating each leg against its own route
// baseline.
use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use tracing::debug;

use crate::config::AppConfig;
use crate::model::{FlightOffer, NewPair, PairInsert, ReturnLeg, StorageError};

/// The storage surface the pairing engine needs. `SqliteStorage` implements
/// it; tests use an in-memory fake.
pub trait PairStore {
    /// Persisted 30-day rolling average for a route, if any history exists.
    fn rolling_average(&self, origin: &str, destination: &str)
    -> Result<Option<Decimal>, StorageError>;

    /// One-way offers on `origin`→`destination` departing inside the window
    /// with at most `max_stops` stops.
    fn find_return_legs(
        &self,
        origin: &str,
        destination: &str,
        window_start: NaiveDate,
        window_end: NaiveDate,
        max_stops: u32,
    ) -> Result<Vec<ReturnLeg>, StorageError>;

    /// Idempotent insert keyed by `(out_id, in_id)`.
    fn insert_pair(&self, pair: &NewPair) -> Result<PairInsert, StorageError>;
}

/// A steal pair created by [`process_outbound`], returned for alerting.
#[derive(Debug, Clone)]
pub struct StealPair {
    pub pair_id: i64,
    pub origin: String,
    pub destination: String,
    pub depart_date: NaiveDate,
    pub return_date: NaiveDate,
    pub price_out: Decimal,
    pub price_in: Decimal,
}

impl StealPair {
    pub fn price_total(&self) -> Decimal {
        self.price_out + self.price_in
    }
}

/// Pair one newly inserted outbound one-way offer with candidate return legs.
///
/// A pair is a steal only when BOTH legs clear their own route's limit
/// (`avg * (1 - threshold)`) independently; a cheap outbound cannot carry an
/// expensive inbound on the strength of the summed price. Returns the steal
/// pairs created by this call; duplicate pairs are skipped silently.
pub fn process_outbound<S: PairStore>(
    store: &S,
    offer: &FlightOffer,
    out_id: i64,
    cfg: &AppConfig,
) -> Result<Vec<StealPair>, StorageError> {
    if !cfg.combine_ow {
        return Ok(Vec::new());
    }

    let window_start = offer.depart_date + Duration::days(cfg.min_trip_days);
    let window_end = offer.depart_date + Duration::days(cfg.max_trip_days);

    let returns = store.find_return_legs(
        &offer.destination,
        &offer.origin,
        window_start,
        window_end,
        cfg.max_stops,
    )?;

    let threshold = cfg.pair_threshold();
    let mut steals = Vec::new();

    for leg in returns {
        let avg_out = store.rolling_average(&offer.origin, &offer.destination)?;
        let avg_in = store.rolling_average(&offer.destination, &offer.origin)?;

        // No history on either leg -> never a steal.
        let steal = match (avg_out, avg_in) {
            (Some(avg_out), Some(avg_in))
                if avg_out > Decimal::ZERO && avg_in > Decimal::ZERO =>
            {
                let limit_out = avg_out * (Decimal::ONE - threshold);
                let limit_in = avg_in * (Decimal::ONE - threshold);
                offer.price <= limit_out && leg.price <= limit_in
            }
            _ => false,
        };

        let pair = NewPair {
            out_id,
            in_id: leg.id,
            origin: offer.origin.clone(),
            destination: offer.destination.clone(),
            depart_date: offer.depart_date,
            return_date: leg.depart_date,
            price_total: offer.price + leg.price,
            steal_pair: steal,
        };

        match store.insert_pair(&pair)? {
            PairInsert::Created(pair_id) => {
                debug!(
                    "pair {}/{} {}→{} {} – {} total={} steal={}",
                    out_id,
                    leg.id,
                    pair.origin,
                    pair.destination,
                    pair.depart_date,
                    pair.return_date,
                    pair.price_total,
                    steal
                );
                if steal {
                    steals.push(StealPair {
                        pair_id,
                        origin: pair.origin.clone(),
                        destination: pair.destination.clone(),
                        depart_date: pair.depart_date,
                        return_date: pair.return_date,
                        price_out: offer.price,
                        price_in: leg.price,
                    });
                }
            }
            PairInsert::Duplicate => {}
        }
    }

    Ok(steals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use std::cell::RefCell;
    use std::collections::{HashMap, HashSet};

    struct FakeStore {
        averages: HashMap<(String, String), Decimal>,
        legs: Vec<ReturnLeg>,
        pairs: RefCell<HashSet<(i64, i64)>>,
        next_id: RefCell<i64>,
    }

    impl FakeStore {
        fn new(averages: &[(&str, &str, Decimal)], legs: Vec<ReturnLeg>) -> Self {
            Self {
                averages: averages
                    .iter()
                    .map(|&(o, d, avg)| ((o.to_string(), d.to_string()), avg))
                    .collect(),
                legs,
                pairs: RefCell::new(HashSet::new()),
                next_id: RefCell::new(1),
            }
        }

        fn pair_count(&self) -> usize {
            self.pairs.borrow().len()
        }
    }

    impl PairStore for FakeStore {
        fn rolling_average(
            &self,
            origin: &str,
            destination: &str,
        ) -> Result<Option<Decimal>, StorageError> {
            Ok(self
                .averages
                .get(&(origin.to_string(), destination.to_string()))
                .copied())
        }

        fn find_return_legs(
            &self,
            origin: &str,
            destination: &str,
            window_start: NaiveDate,
            window_end: NaiveDate,
            _max_stops: u32,
        ) -> Result<Vec<ReturnLeg>, StorageError> {
            let _ = (origin, destination);
            Ok(self
                .legs
                .iter()
                .filter(|leg| leg.depart_date >= window_start && leg.depart_date <= window_end)
                .cloned()
                .collect())
        }

        fn insert_pair(&self, pair: &NewPair) -> Result<PairInsert, StorageError> {
            if !self.pairs.borrow_mut().insert((pair.out_id, pair.in_id)) {
                return Ok(PairInsert::Duplicate);
            }
            let mut next = self.next_id.borrow_mut();
            let id = *next;
            *next += 1;
            Ok(PairInsert::Created(id))
        }
    }

    fn outbound(price: Decimal) -> FlightOffer {
        FlightOffer {
            origin: "WAW".into(),
            destination: "JFK".into(),
            depart_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            return_date: None,
            price,
            airline: "LO".into(),
            stops: 0,
            total_flight_time_h: None,
            max_layover_h: None,
            deep_link: "https://example.com/out".into(),
            fetched_at: Utc::now(),
            alert_sent: false,
        }
    }

    fn leg(id: i64, price: Decimal, days_after_depart: i64) -> ReturnLeg {
        ReturnLeg {
            id,
            price,
            depart_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
                + Duration::days(days_after_depart),
        }
    }

    fn pairing_config() -> AppConfig {
        serde_json::from_str(
            r#"{
                "telegram_bot_token": "t",
                "telegram_chat_id": 1,
                "origins": ["WAW"],
                "destinations": ["JFK"],
                "combine_ow": true,
                "min_trip_days": 6,
                "max_trip_days": 30
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn disabled_pairing_is_a_no_op() {
        let mut cfg = pairing_config();
        cfg.combine_ow = false;
        let store = FakeStore::new(
            &[("WAW", "JFK", dec!(1000)), ("JFK", "WAW", dec!(1000))],
            vec![leg(10, dec!(700), 7)],
        );
        let steals = process_outbound(&store, &outbound(dec!(700)), 1, &cfg).unwrap();
        assert!(steals.is_empty());
        assert_eq!(store.pair_count(), 0);
    }

    #[test]
    fn both_legs_under_limit_is_a_steal_pair() {
        let cfg = pairing_config();
        // Limits: 1000 * 0.8 = 800 each way.
        let store = FakeStore::new(
            &[("WAW", "JFK", dec!(1000)), ("JFK", "WAW", dec!(1000))],
            vec![leg(10, dec!(790), 7)],
        );
        let steals = process_outbound(&store, &outbound(dec!(780)), 1, &cfg).unwrap();
        assert_eq!(steals.len(), 1);
        assert_eq!(steals[0].price_total(), dec!(1570));
        assert_eq!(store.pair_count(), 1);
    }

    #[test]
    fn per_leg_gating_rejects_one_expensive_leg() {
        let cfg = pairing_config();
        // Outbound exactly at its limit, inbound one unit over its own.
        let store = FakeStore::new(
            &[("WAW", "JFK", dec!(1000)), ("JFK", "WAW", dec!(1000))],
            vec![leg(10, dec!(801), 7)],
        );
        let steals = process_outbound(&store, &outbound(dec!(800)), 1, &cfg).unwrap();
        assert!(steals.is_empty());
        // The pair is still recorded, just not as a steal.
        assert_eq!(store.pair_count(), 1);
    }

    #[test]
    fn missing_history_on_either_leg_is_never_a_steal() {
        let cfg = pairing_config();
        let store = FakeStore::new(&[("WAW", "JFK", dec!(1000))], vec![leg(10, dec!(100), 7)]);
        let steals = process_outbound(&store, &outbound(dec!(100)), 1, &cfg).unwrap();
        assert!(steals.is_empty());
    }

    #[test]
    fn legs_outside_the_trip_window_are_ignored() {
        let cfg = pairing_config();
        let store = FakeStore::new(
            &[("WAW", "JFK", dec!(1000)), ("JFK", "WAW", dec!(1000))],
            vec![leg(10, dec!(700), 2), leg(11, dec!(700), 45)],
        );
        let steals = process_outbound(&store, &outbound(dec!(700)), 1, &cfg).unwrap();
        assert!(steals.is_empty());
        assert_eq!(store.pair_count(), 0);
    }

    #[test]
    fn repeated_processing_is_idempotent() {
        let cfg = pairing_config();
        let store = FakeStore::new(
            &[("WAW", "JFK", dec!(1000)), ("JFK", "WAW", dec!(1000))],
            vec![leg(10, dec!(700), 7)],
        );
        let first = process_outbound(&store, &outbound(dec!(700)), 1, &cfg).unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(store.pair_count(), 1);

        let second = process_outbound(&store, &outbound(dec!(700)), 1, &cfg).unwrap();
        assert!(second.is_empty());
        assert_eq!(store.pair_count(), 1);
    }

    #[test]
    fn pair_threshold_override_applies_per_leg() {
        let mut cfg = pairing_config();
        cfg.pair_steal_threshold = Some(dec!(0.10));
        // Limits become 900 each way.
        let store = FakeStore::new(
            &[("WAW", "JFK", dec!(1000)), ("JFK", "WAW", dec!(1000))],
            vec![leg(10, dec!(890), 7)],
        );
        let steals = process_outbound(&store, &outbound(dec!(850)), 1, &cfg).unwrap();
        assert_eq!(steals.len(), 1);
    }
}
