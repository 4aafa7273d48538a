use crate::engine::baseline::{self, AGG_RETENTION_DAYS};
use crate::engine::pairing::PairStore;
use crate::model::{FlightOffer, NewPair, PairInsert, ReturnLeg, StorageError};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};

pub struct SqliteStorage {
    conn: Connection,
}

fn to_db_price(price: Decimal) -> f64 {
    price.to_f64().unwrap_or(0.0)
}

fn from_db_price(price: f64) -> Decimal {
    Decimal::from_f64(price).unwrap_or_default().round_dp(2)
}

impl SqliteStorage {
    /// Opens the database and runs migrations.
    pub fn new(db_path: &str) -> Result<Self, StorageError> {
        Self::from_connection(Connection::open(db_path)?)
    }

    #[cfg(test)]
    pub fn in_memory() -> Result<Self, StorageError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS offers_raw (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                origin TEXT NOT NULL,
                destination TEXT NOT NULL,
                depart_date TEXT NOT NULL,
                return_date TEXT,
                price REAL NOT NULL,
                airline TEXT NOT NULL,
                stops INTEGER NOT NULL,
                total_flight_time_h REAL,
                max_layover_h REAL,
                deep_link TEXT NOT NULL,
                fetched_at TEXT NOT NULL,
                alert_sent INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS offers_agg (
                origin TEXT NOT NULL,
                destination TEXT NOT NULL,
                day TEXT NOT NULL,
                mean_price REAL NOT NULL,
                PRIMARY KEY (origin, destination, day)
            );

            CREATE TABLE IF NOT EXISTS weekday_avg (
                origin TEXT NOT NULL,
                destination TEXT NOT NULL,
                weekday INTEGER NOT NULL,
                avg_price REAL NOT NULL,
                PRIMARY KEY (origin, destination, weekday)
            );

            CREATE TABLE IF NOT EXISTS offers_pair (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                out_id INTEGER NOT NULL,
                in_id INTEGER NOT NULL,
                origin TEXT NOT NULL,
                destination TEXT NOT NULL,
                depart_date TEXT NOT NULL,
                return_date TEXT NOT NULL,
                price_total REAL NOT NULL,
                steal_pair INTEGER NOT NULL,
                fetched_at TEXT NOT NULL,
                UNIQUE (out_id, in_id)
            );
            ",
        )?;

        // Upgrade path for databases created before layover tracking.
        Self::migrate_add_column_if_missing(&conn, "offers_raw", "total_flight_time_h", "REAL")?;
        Self::migrate_add_column_if_missing(&conn, "offers_raw", "max_layover_h", "REAL")?;

        Ok(Self { conn })
    }

    fn migrate_add_column_if_missing(
        conn: &Connection,
        table: &str,
        column: &str,
        column_def: &str,
    ) -> Result<(), StorageError> {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
        let existing_columns: Vec<String> = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<Result<_, _>>()?;

        if !existing_columns.iter().any(|c| c == column) {
            let alter_sql = format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, column_def);
            conn.execute(&alter_sql, [])?;
        }

        Ok(())
    }

    /// Inserts an offer, returning its row id. An identical already-stored
    /// offer is not inserted again; its existing id is returned instead.
    pub fn insert_offer(&self, offer: &FlightOffer) -> Result<i64, StorageError> {
        let existing: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM offers_raw
                  WHERE origin=?1 AND destination=?2 AND depart_date=?3
                    AND return_date IS ?4
                    AND price=?5 AND airline=?6 AND stops=?7
                    AND deep_link=?8",
                params![
                    &offer.origin,
                    &offer.destination,
                    &offer.depart_date,
                    &offer.return_date,
                    to_db_price(offer.price),
                    &offer.airline,
                    offer.stops,
                    &offer.deep_link,
                ],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(id) = existing {
            return Ok(id);
        }

        self.conn.execute(
            "INSERT INTO offers_raw (
                origin, destination, depart_date, return_date, price,
                airline, stops, total_flight_time_h, max_layover_h,
                deep_link, fetched_at, alert_sent
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                &offer.origin,
                &offer.destination,
                &offer.depart_date,
                &offer.return_date,
                to_db_price(offer.price),
                &offer.airline,
                offer.stops,
                offer.total_flight_time_h,
                offer.max_layover_h,
                &offer.deep_link,
                &offer.fetched_at,
                offer.alert_sent as i64,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Whether a steal alert already went out for this stored offer.
    pub fn is_alert_sent(&self, offer_id: i64) -> Result<bool, StorageError> {
        let sent: Option<i64> = self
            .conn
            .query_row(
                "SELECT alert_sent FROM offers_raw WHERE id=?1",
                params![offer_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(sent.unwrap_or(0) != 0)
    }

    /// Flips the once-only alert flag for an offer.
    pub fn mark_alert_sent(&self, offer_id: i64) -> Result<(), StorageError> {
        self.conn.execute(
            "UPDATE offers_raw SET alert_sent=1 WHERE id=?1",
            params![offer_id],
        )?;
        Ok(())
    }

    /// Minimum observed price per observation day for a route, oldest first.
    pub fn min_prices_by_day(
        &self,
        origin: &str,
        destination: &str,
        since: NaiveDate,
    ) -> Result<Vec<(NaiveDate, Decimal)>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT date(fetched_at) AS day, MIN(price)
               FROM offers_raw
              WHERE origin=?1 AND destination=?2
                AND date(fetched_at) >= ?3
              GROUP BY day
              ORDER BY day",
        )?;
        let rows = stmt.query_map(params![origin, destination, since], |row| {
            Ok((row.get::<_, NaiveDate>(0)?, from_db_price(row.get(1)?)))
        })?;
        rows.collect::<Result<_, _>>().map_err(Into::into)
    }

    /// Raw price observations across every route, for the aggregation
    /// pipeline (which does its own per-day grouping).
    pub fn price_observations_since(
        &self,
        since: NaiveDate,
    ) -> Result<Vec<(String, String, NaiveDate, Decimal)>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT origin, destination, date(fetched_at) AS day, price
               FROM offers_raw
              WHERE date(fetched_at) >= ?1
              ORDER BY origin, destination, day",
        )?;
        let rows = stmt.query_map(params![since], |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get::<_, NaiveDate>(2)?,
                from_db_price(row.get(3)?),
            ))
        })?;
        rows.collect::<Result<_, _>>().map_err(Into::into)
    }

    /// The persisted 30-day rolling average for a route.
    pub fn rolling_average(
        &self,
        origin: &str,
        destination: &str,
    ) -> Result<Option<Decimal>, StorageError> {
        let avg: Option<f64> = self.conn.query_row(
            "SELECT AVG(mean_price)
               FROM offers_agg
              WHERE origin=?1 AND destination=?2
                AND date(day) >= date('now', '-30 day')",
            params![origin, destination],
            |row| row.get(0),
        )?;
        Ok(avg.map(from_db_price))
    }

    /// Inserts or updates a route's aggregate for one day.
    pub fn upsert_daily_avg(
        &self,
        origin: &str,
        destination: &str,
        day: NaiveDate,
        mean_price: Decimal,
    ) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO offers_agg (origin, destination, day, mean_price)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(origin, destination, day)
             DO UPDATE SET mean_price=excluded.mean_price",
            params![origin, destination, day, to_db_price(mean_price)],
        )?;
        Ok(())
    }

    /// Drops aggregates older than the retention horizon. Returns the number
    /// of rows removed.
    pub fn prune_aggregates(&self) -> Result<usize, StorageError> {
        let removed = self.conn.execute(
            "DELETE FROM offers_agg WHERE date(day) < date('now', ?1)",
            params![format!("-{} day", AGG_RETENTION_DAYS)],
        )?;
        Ok(removed)
    }

    /// Replaces the weekday-average table wholesale.
    pub fn replace_weekday_averages(
        &self,
        rows: &[(String, String, u32, Decimal)],
    ) -> Result<(), StorageError> {
        self.conn.execute("DELETE FROM weekday_avg", [])?;
        let mut stmt = self.conn.prepare(
            "INSERT INTO weekday_avg (origin, destination, weekday, avg_price)
             VALUES (?1, ?2, ?3, ?4)",
        )?;
        for (origin, destination, weekday, avg_price) in rows {
            stmt.execute(params![origin, destination, weekday, to_db_price(*avg_price)])?;
        }
        Ok(())
    }

    /// Mean price for a route on a given departure weekday (Monday = 0).
    pub fn weekday_mean(
        &self,
        origin: &str,
        destination: &str,
        weekday: u32,
    ) -> Result<Option<Decimal>, StorageError> {
        let mean: Option<f64> = self
            .conn
            .query_row(
                "SELECT avg_price FROM weekday_avg
                  WHERE origin=?1 AND destination=?2 AND weekday=?3",
                params![origin, destination, weekday],
                |row| row.get(0),
            )
            .optional()?;
        Ok(mean.map(from_db_price))
    }

    /// Prices of offers departing on the given weekday (Monday = 0), for the
    /// weekday stddev computation. Weekday bucketing happens here so storage
    /// and lookup share the same numbering.
    pub fn recent_weekday_prices(
        &self,
        origin: &str,
        destination: &str,
        weekday: u32,
        since: NaiveDate,
    ) -> Result<Vec<Decimal>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT depart_date, price
               FROM offers_raw
              WHERE origin=?1 AND destination=?2
                AND date(fetched_at) >= ?3",
        )?;
        let rows = stmt.query_map(params![origin, destination, since], |row| {
            Ok((row.get::<_, NaiveDate>(0)?, from_db_price(row.get(1)?)))
        })?;
        let mut prices = Vec::new();
        for row in rows {
            let (depart, price) = row?;
            if baseline::weekday_index(depart) == weekday {
                prices.push(price);
            }
        }
        Ok(prices)
    }

    /// Offers departing on any weekday within the window, keyed for the
    /// weekday-average refresh.
    pub fn offers_for_weekday_aggregation(
        &self,
        since: NaiveDate,
    ) -> Result<Vec<(String, String, NaiveDate, Decimal)>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT origin, destination, depart_date, price
               FROM offers_raw
              WHERE date(fetched_at) >= ?1",
        )?;
        let rows = stmt.query_map(params![since], |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get::<_, NaiveDate>(2)?,
                from_db_price(row.get(3)?),
            ))
        })?;
        rows.collect::<Result<_, _>>().map_err(Into::into)
    }

    /// One-way offers on a route departing inside the window, for the
    /// pairing engine.
    pub fn find_return_legs(
        &self,
        origin: &str,
        destination: &str,
        window_start: NaiveDate,
        window_end: NaiveDate,
        max_stops: u32,
    ) -> Result<Vec<ReturnLeg>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, price, depart_date
               FROM offers_raw
              WHERE origin=?1 AND destination=?2
                AND return_date IS NULL
                AND depart_date BETWEEN ?3 AND ?4
                AND stops <= ?5
              ORDER BY depart_date",
        )?;
        let rows = stmt.query_map(
            params![origin, destination, window_start, window_end, max_stops],
            |row| {
                Ok(ReturnLeg {
                    id: row.get(0)?,
                    price: from_db_price(row.get(1)?),
                    depart_date: row.get(2)?,
                })
            },
        )?;
        rows.collect::<Result<_, _>>().map_err(Into::into)
    }

    /// Idempotent pair insert; `(out_id, in_id)` is unique.
    pub fn insert_pair(&self, pair: &NewPair) -> Result<PairInsert, StorageError> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO offers_pair (
                out_id, in_id, origin, destination,
                depart_date, return_date, price_total, steal_pair, fetched_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                pair.out_id,
                pair.in_id,
                &pair.origin,
                &pair.destination,
                &pair.depart_date,
                &pair.return_date,
                to_db_price(pair.price_total),
                pair.steal_pair as i64,
                Utc::now(),
            ],
        )?;
        if inserted == 0 {
            Ok(PairInsert::Duplicate)
        } else {
            Ok(PairInsert::Created(self.conn.last_insert_rowid()))
        }
    }

    /// Most recently fetched offer, for the /last command.
    pub fn get_last_offer(&self) -> Result<Option<FlightOffer>, StorageError> {
        self.conn
            .query_row(
                &format!("{} ORDER BY fetched_at DESC LIMIT 1", SELECT_OFFER),
                [],
                Self::map_offer,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Cheapest positively priced offers, for the /top5 command.
    pub fn get_top_offers(&self, limit: u32) -> Result<Vec<FlightOffer>, StorageError> {
        let mut stmt = self.conn.prepare(&format!(
            "{} WHERE price > 0 ORDER BY price ASC LIMIT ?1",
            SELECT_OFFER
        ))?;
        let rows = stmt.query_map(params![limit], Self::map_offer)?;
        rows.collect::<Result<_, _>>().map_err(Into::into)
    }

    /// Current rolling average per route, for the /avg command.
    pub fn get_rolling_averages(&self) -> Result<Vec<(String, String, Decimal)>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT origin, destination, AVG(mean_price)
               FROM offers_agg
              WHERE date(day) >= date('now', '-30 day')
              GROUP BY origin, destination
              ORDER BY origin, destination",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get(0)?, row.get(1)?, from_db_price(row.get(2)?)))
        })?;
        rows.collect::<Result<_, _>>().map_err(Into::into)
    }

    /// Latest recorded steal pairs, for the /pairs command.
    pub fn recent_steal_pairs(
        &self,
        limit: u32,
    ) -> Result<Vec<(String, String, NaiveDate, NaiveDate, Decimal)>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT origin, destination, depart_date, return_date, price_total
               FROM offers_pair
              WHERE steal_pair = 1
              ORDER BY fetched_at DESC
              LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get::<_, NaiveDate>(2)?,
                row.get::<_, NaiveDate>(3)?,
                from_db_price(row.get(4)?),
            ))
        })?;
        rows.collect::<Result<_, _>>().map_err(Into::into)
    }

    /// Offers alerted on since the cutoff, cheapest first, for the daily
    /// digest.
    pub fn alerted_offers_since(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<FlightOffer>, StorageError> {
        let mut stmt = self.conn.prepare(&format!(
            "{} WHERE alert_sent = 1 AND fetched_at >= ?1 ORDER BY price ASC",
            SELECT_OFFER
        ))?;
        let rows = stmt.query_map(params![cutoff], Self::map_offer)?;
        rows.collect::<Result<_, _>>().map_err(Into::into)
    }

    fn map_offer(row: &Row) -> Result<FlightOffer, rusqlite::Error> {
        Ok(FlightOffer {
            origin: row.get(0)?,
            destination: row.get(1)?,
            depart_date: row.get(2)?,
            return_date: row.get(3)?,
            price: from_db_price(row.get(4)?),
            airline: row.get(5)?,
            stops: row.get(6)?,
            total_flight_time_h: row.get(7)?,
            max_layover_h: row.get(8)?,
            deep_link: row.get(9)?,
            fetched_at: row.get(10)?,
            alert_sent: row.get::<_, i64>(11)? != 0,
        })
    }
}

const SELECT_OFFER: &str = "SELECT origin, destination, depart_date, return_date, price,
        airline, stops, total_flight_time_h, max_layover_h,
        deep_link, fetched_at, alert_sent
   FROM offers_raw";

impl PairStore for SqliteStorage {
    fn rolling_average(
        &self,
        origin: &str,
        destination: &str,
    ) -> Result<Option<Decimal>, StorageError> {
        SqliteStorage::rolling_average(self, origin, destination)
    }

    fn find_return_legs(
        &self,
        origin: &str,
        destination: &str,
        window_start: NaiveDate,
        window_end: NaiveDate,
        max_stops: u32,
    ) -> Result<Vec<ReturnLeg>, StorageError> {
        SqliteStorage::find_return_legs(
            self,
            origin,
            destination,
            window_start,
            window_end,
            max_stops,
        )
    }

    fn insert_pair(&self, pair: &NewPair) -> Result<PairInsert, StorageError> {
        SqliteStorage::insert_pair(self, pair)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn offer(price: Decimal, depart: NaiveDate, ret: Option<NaiveDate>) -> FlightOffer {
        FlightOffer {
            origin: "WAW".into(),
            destination: "JFK".into(),
            depart_date: depart,
            return_date: ret,
            price,
            airline: "LO".into(),
            stops: 0,
            total_flight_time_h: Some(9.5),
            max_layover_h: None,
            deep_link: format!("https://example.com/{price}"),
            fetched_at: Utc::now(),
            alert_sent: false,
        }
    }

    #[test]
    fn insert_offer_dedups_identical_offers() {
        let storage = SqliteStorage::in_memory().unwrap();
        let depart = Utc::now().date_naive() + Duration::days(30);
        let off = offer(dec!(1000), depart, None);

        let first = storage.insert_offer(&off).unwrap();
        let second = storage.insert_offer(&off).unwrap();
        assert_eq!(first, second);

        let top = storage.get_top_offers(10).unwrap();
        assert_eq!(top.len(), 1);
    }

    #[test]
    fn mark_alert_sent_feeds_the_daily_digest() {
        let storage = SqliteStorage::in_memory().unwrap();
        let depart = Utc::now().date_naive() + Duration::days(30);
        let id = storage.insert_offer(&offer(dec!(900), depart, None)).unwrap();

        let cutoff = Utc::now() - Duration::hours(24);
        assert!(storage.alerted_offers_since(cutoff).unwrap().is_empty());
        assert!(!storage.is_alert_sent(id).unwrap());

        storage.mark_alert_sent(id).unwrap();
        assert!(storage.is_alert_sent(id).unwrap());
        let alerted = storage.alerted_offers_since(cutoff).unwrap();
        assert_eq!(alerted.len(), 1);
        assert!(alerted[0].alert_sent);
    }

    #[test]
    fn min_prices_by_day_groups_per_observation_day() {
        let storage = SqliteStorage::in_memory().unwrap();
        let depart = Utc::now().date_naive() + Duration::days(30);
        for price in [dec!(300), dec!(400)] {
            let mut off = offer(price, depart, None);
            off.fetched_at = Utc::now();
            storage.insert_offer(&off).unwrap();
        }

        let since = Utc::now().date_naive() - Duration::days(10);
        let minimums = storage.min_prices_by_day("WAW", "JFK", since).unwrap();
        assert_eq!(minimums.len(), 1);
        assert_eq!(minimums[0].1, dec!(300));
    }

    #[test]
    fn upsert_daily_avg_overwrites_same_day() {
        let storage = SqliteStorage::in_memory().unwrap();
        let today = Utc::now().date_naive();

        storage.upsert_daily_avg("WAW", "JFK", today, dec!(1000)).unwrap();
        storage.upsert_daily_avg("WAW", "JFK", today, dec!(1100)).unwrap();

        assert_eq!(
            storage.rolling_average("WAW", "JFK").unwrap(),
            Some(dec!(1100))
        );
    }

    #[test]
    fn rolling_average_is_none_without_history() {
        let storage = SqliteStorage::in_memory().unwrap();
        assert_eq!(storage.rolling_average("WAW", "JFK").unwrap(), None);
    }

    #[test]
    fn prune_aggregates_drops_only_stale_rows() {
        let storage = SqliteStorage::in_memory().unwrap();
        let today = Utc::now().date_naive();

        storage.upsert_daily_avg("WAW", "JFK", today, dec!(1000)).unwrap();
        storage
            .upsert_daily_avg("WAW", "JFK", today - Duration::days(90), dec!(800))
            .unwrap();

        assert_eq!(storage.prune_aggregates().unwrap(), 1);
        assert_eq!(
            storage.rolling_average("WAW", "JFK").unwrap(),
            Some(dec!(1000))
        );
    }

    #[test]
    fn pair_insert_is_idempotent() {
        let storage = SqliteStorage::in_memory().unwrap();
        let depart = Utc::now().date_naive() + Duration::days(30);
        let pair = NewPair {
            out_id: 1,
            in_id: 2,
            origin: "WAW".into(),
            destination: "JFK".into(),
            depart_date: depart,
            return_date: depart + Duration::days(7),
            price_total: dec!(1500),
            steal_pair: true,
        };

        let first = storage.insert_pair(&pair).unwrap();
        assert!(matches!(first, PairInsert::Created(_)));
        let second = storage.insert_pair(&pair).unwrap();
        assert_eq!(second, PairInsert::Duplicate);

        assert_eq!(storage.recent_steal_pairs(10).unwrap().len(), 1);
    }

    #[test]
    fn find_return_legs_filters_window_stops_and_round_trips() {
        let storage = SqliteStorage::in_memory().unwrap();
        let depart = Utc::now().date_naive() + Duration::days(40);

        // In window.
        let mut in_window = offer(dec!(700), depart, None);
        in_window.origin = "JFK".into();
        in_window.destination = "WAW".into();
        let in_window_id = storage.insert_offer(&in_window).unwrap();

        // Outside window.
        let mut late = offer(dec!(700), depart + Duration::days(60), None);
        late.origin = "JFK".into();
        late.destination = "WAW".into();
        storage.insert_offer(&late).unwrap();

        // Too many stops.
        let mut stops = offer(dec!(650), depart, None);
        stops.origin = "JFK".into();
        stops.destination = "WAW".into();
        stops.stops = 3;
        storage.insert_offer(&stops).unwrap();

        // Round trip, not a candidate return leg.
        let mut round_trip = offer(dec!(600), depart, Some(depart + Duration::days(7)));
        round_trip.origin = "JFK".into();
        round_trip.destination = "WAW".into();
        storage.insert_offer(&round_trip).unwrap();

        let legs = storage
            .find_return_legs(
                "JFK",
                "WAW",
                depart - Duration::days(5),
                depart + Duration::days(5),
                1,
            )
            .unwrap();
        assert_eq!(legs.len(), 1);
        assert_eq!(legs[0].id, in_window_id);
        assert_eq!(legs[0].price, dec!(700));
    }

    #[test]
    fn weekday_tables_round_trip_through_monday_numbering() {
        let storage = SqliteStorage::in_memory().unwrap();
        storage
            .replace_weekday_averages(&[("WAW".into(), "JFK".into(), 2, dec!(1000))])
            .unwrap();

        assert_eq!(storage.weekday_mean("WAW", "JFK", 2).unwrap(), Some(dec!(1000)));
        assert_eq!(storage.weekday_mean("WAW", "JFK", 3).unwrap(), None);
    }

    #[test]
    fn recent_weekday_prices_bucket_by_departure_weekday() {
        let storage = SqliteStorage::in_memory().unwrap();
        // 2024-01-03 is a Wednesday (index 2).
        let wednesday = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        let thursday = NaiveDate::from_ymd_opt(2024, 1, 4).unwrap();

        for (price, depart) in [(dec!(800), wednesday), (dec!(1200), wednesday), (dec!(500), thursday)] {
            storage.insert_offer(&offer(price, depart, None)).unwrap();
        }

        let since = Utc::now().date_naive() - Duration::days(1);
        let prices = storage
            .recent_weekday_prices("WAW", "JFK", 2, since)
            .unwrap();
        assert_eq!(prices.len(), 2);
        assert!(prices.contains(&dec!(800)) && prices.contains(&dec!(1200)));
    }
}
