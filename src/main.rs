mod aggregator;
mod cli;
mod config;
mod engine;
mod fetcher;
mod geo;
mod model;
mod notifier;
mod report;
mod storage;

use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use clap::Parser;
use rand::Rng;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::{Mutex, Notify};
use tokio::time::{Duration, sleep};
use tracing::{error, info, warn};

use cli::{Cli, Command};
use config::{AppConfig, StealPolicy, load_config};
use engine::steal::{self, StealContext};
use engine::{baseline, pairing};
use fetcher::{OfferSource, TravelApiFetcher};
use model::{FlightOffer, StorageError, WeekdayStats};
use notifier::{TelegramNotifier, messages};
use storage::SqliteStorage;

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Set panic hook to log details about any panic
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("😱 Panic occurred: {:?}", panic_info);
    }));

    let args = Cli::parse();

    // Load configuration from file; validation happens once, here.
    let config: Arc<AppConfig> = match load_config(&args.config) {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            error!("Config load error: {}", e);
            return;
        }
    };

    // Initialize storage (SQLite) with async access (wrapped in a Mutex)
    let storage = match SqliteStorage::new(&args.db) {
        Ok(s) => Arc::new(Mutex::new(s)),
        Err(e) => {
            error!("Failed to initialize storage: {:?}", e);
            return;
        }
    };

    let fetcher = TravelApiFetcher::new(
        config.api_token.clone(),
        config.api_marker.clone(),
        config.currency.clone(),
    );

    match args.command.unwrap_or(Command::Run { once: false, date: None }) {
        Command::Run { once, date } => run(once, date, config, storage, fetcher).await,
        Command::Fetch { date } => fetch_only(date, &config, &fetcher).await,
        Command::Aggregate => {
            let storage_guard = storage.lock().await;
            if let Err(e) = aggregator::aggregate(&storage_guard) {
                error!("Aggregation failed: {:?}", e);
            }
            if let Err(e) = aggregator::refresh_weekday_averages(&storage_guard) {
                error!("Weekday refresh failed: {:?}", e);
            }
        }
        Command::Report => {
            {
                let storage_guard = storage.lock().await;
                if let Err(e) = aggregator::aggregate(&storage_guard) {
                    warn!("Aggregation failed: {:?}", e);
                }
                if let Err(e) = aggregator::refresh_weekday_averages(&storage_guard) {
                    warn!("Weekday refresh failed: {:?}", e);
                }
            }
            let notifier =
                TelegramNotifier::new(storage.clone(), config.clone(), Arc::new(Notify::new()));
            report::send_daily_report(storage.clone(), &notifier, &config.currency).await;
        }
    }
}

/// The scheduled fetch-and-process loop, with a Telegram command listener
/// and a once-per-day aggregation and digest pass.
async fn run(
    once: bool,
    date: Option<NaiveDate>,
    config: Arc<AppConfig>,
    storage: Arc<Mutex<SqliteStorage>>,
    fetcher: TravelApiFetcher,
) {
    let refresh_notify = Arc::new(Notify::new());
    let notifier = Arc::new(TelegramNotifier::new(
        storage.clone(),
        config.clone(),
        refresh_notify.clone(),
    ));

    if !once {
        TelegramNotifier::spawn_listener(notifier.clone());
        info!("Sending startup message...");
        if let Err(e) = notifier.notify_text("🚀 FareSniper started!").await {
            warn!("Startup notification failed: {:?}", e);
        }
    }

    let mut last_report_day: Option<NaiveDate> = None;
    loop {
        info!("Entering fetch cycle...");
        info!(
            "Routes to process: {}",
            config.origins.len() * config.destinations.len()
        );
        run_cycle(&config, &fetcher, &storage, &notifier, date).await;

        // Daily housekeeping: aggregates, weekday stats and the digest.
        let today = Utc::now().date_naive();
        if last_report_day != Some(today) {
            {
                let storage_guard = storage.lock().await;
                if let Err(e) = aggregator::aggregate(&storage_guard) {
                    warn!("Aggregation failed: {:?}", e);
                }
                if let Err(e) = aggregator::refresh_weekday_averages(&storage_guard) {
                    warn!("Weekday refresh failed: {:?}", e);
                }
            }
            report::send_daily_report(storage.clone(), &notifier, &config.currency).await;
            last_report_day = Some(today);
        }

        if once {
            info!("Single cycle finished.");
            return;
        }

        info!(
            "Waiting for timer ({}h) or manual refresh...",
            config.poll_interval_h
        );
        tokio::select! {
            _ = sleep(Duration::from_secs(config.poll_interval_h * 3600)) => {
                info!("Timer triggered.");
            }
            _ = refresh_notify.notified() => {
                info!("Manual refresh triggered.");
            }
        }
        info!("Restarting fetch cycle...");
    }
}

/// One pass over every configured route. A failing route is logged and
/// skipped; the rest of the cycle continues.
async fn run_cycle(
    cfg: &AppConfig,
    fetcher: &TravelApiFetcher,
    storage: &Arc<Mutex<SqliteStorage>>,
    notifier: &Arc<TelegramNotifier>,
    date: Option<NaiveDate>,
) {
    for origin in &cfg.origins {
        for destination in &cfg.destinations {
            process_route(cfg, fetcher, storage, notifier, origin, destination, date).await;
            // Polite jitter between API calls.
            let jitter = rand::rng().random_range(250..750u64);
            sleep(Duration::from_millis(jitter)).await;
        }
    }
}

async fn process_route(
    cfg: &AppConfig,
    fetcher: &TravelApiFetcher,
    storage: &Arc<Mutex<SqliteStorage>>,
    notifier: &Arc<TelegramNotifier>,
    origin: &str,
    destination: &str,
    date: Option<NaiveDate>,
) {
    info!("Processing route: {} ➔ {}", origin, destination);

    let mut offers = match fetcher.search_prices(origin, destination, date, false).await {
        Ok(offers) => offers,
        Err(e) => {
            warn!("Fetch error for {} ➔ {}: {:?}", origin, destination, e);
            return;
        }
    };
    if cfg.combine_ow {
        // One-way offers feed the pairing engine.
        match fetcher.search_prices(origin, destination, date, true).await {
            Ok(one_ways) => offers.extend(one_ways),
            Err(e) => warn!(
                "One-way fetch error for {} ➔ {}: {:?}",
                origin, destination, e
            ),
        }
    }
    info!("Fetched {} offers", offers.len());

    let today = Utc::now().date_naive();
    for offer in &offers {
        if offer.stops > cfg.max_stops {
            continue;
        }
        if let Some(layover) = offer.max_layover_h {
            if layover > cfg.max_layover_h {
                continue;
            }
        }
        if let Some(days) = offer.trip_days() {
            if days < cfg.min_trip_days || days > cfg.max_trip_days {
                continue;
            }
        }

        process_offer(cfg, storage, notifier, offer, today).await;
    }

    info!("Finished route: {} ➔ {}", origin, destination);
}

/// Stores one offer, runs the configured steal policy against fresh
/// historical context, and feeds one-way offers through the pairing engine.
async fn process_offer(
    cfg: &AppConfig,
    storage: &Arc<Mutex<SqliteStorage>>,
    notifier: &Arc<TelegramNotifier>,
    offer: &FlightOffer,
    today: NaiveDate,
) {
    let (offer_id, ctx) = {
        let storage_guard = storage.lock().await;
        let offer_id = match storage_guard.insert_offer(offer) {
            Ok(id) => id,
            Err(e) => {
                warn!("DB save error: {:?}", e);
                return;
            }
        };
        let ctx = match build_context(&storage_guard, cfg, offer, today) {
            Ok(ctx) => ctx,
            Err(e) => {
                warn!("Context query failed for offer {}: {:?}", offer_id, e);
                return;
            }
        };
        (offer_id, ctx)
    };

    if steal::evaluate(offer, cfg, &ctx) {
        match storage.lock().await.is_alert_sent(offer_id) {
            Ok(true) => info!("Already alerted: offer {}", offer_id),
            Ok(false) => {
                let msg = messages::format_steal_alert(offer, ctx.rolling_avg, &cfg.currency);
                if let Err(e) = notifier.notify_alert(&msg).await {
                    warn!("Steal alert failed: {:?}", e);
                } else if let Err(e) = storage.lock().await.mark_alert_sent(offer_id) {
                    warn!("Mark alert sent failed: {:?}", e);
                } else {
                    info!("Steal alert sent for offer {}", offer_id);
                }
            }
            Err(e) => warn!("Alert check failed for offer {}: {:?}", offer_id, e),
        }
    }

    if cfg.combine_ow && offer.is_one_way() {
        let steal_pairs = {
            let storage_guard = storage.lock().await;
            match pairing::process_outbound(&*storage_guard, offer, offer_id, cfg) {
                Ok(pairs) => pairs,
                Err(e) => {
                    warn!("Pairing failed for offer {}: {:?}", offer_id, e);
                    return;
                }
            }
        };
        if !steal_pairs.is_empty() {
            info!(
                "Created {} steal pairs for offer {}",
                steal_pairs.len(),
                offer_id
            );
        }
        if cfg.alert_pair {
            for pair in &steal_pairs {
                let msg = messages::format_pair_alert(pair, &cfg.currency);
                if let Err(e) = notifier.notify_alert(&msg).await {
                    warn!("Pair alert failed: {:?}", e);
                }
            }
        }
    }
}

/// Queries the historical context the configured policy needs. Each value is
/// computed for this one decision; nothing is cached across offers.
fn build_context(
    storage: &SqliteStorage,
    cfg: &AppConfig,
    offer: &FlightOffer,
    today: NaiveDate,
) -> Result<StealContext, StorageError> {
    let rolling_avg = storage.rolling_average(&offer.origin, &offer.destination)?;

    let median_baseline = match cfg.steal_policy {
        StealPolicy::Composite => {
            let since = today - ChronoDuration::days(baseline::BASELINE_WINDOW_DAYS);
            let minimums = storage.min_prices_by_day(&offer.origin, &offer.destination, since)?;
            baseline::median_of_daily_minimums(&minimums)
        }
        _ => Decimal::ZERO,
    };

    let weekday = match cfg.steal_policy {
        StealPolicy::Weekday => {
            let weekday = baseline::weekday_index(offer.depart_date);
            match storage.weekday_mean(&offer.origin, &offer.destination, weekday)? {
                Some(mean) => {
                    let since = today - ChronoDuration::days(baseline::WEEKDAY_WINDOW_DAYS);
                    let prices = storage.recent_weekday_prices(
                        &offer.origin,
                        &offer.destination,
                        weekday,
                        since,
                    )?;
                    let std_dev = baseline::population_std_dev(&prices).unwrap_or_default();
                    Some(WeekdayStats { mean, std_dev })
                }
                None => None,
            }
        }
        _ => None,
    };

    Ok(StealContext {
        rolling_avg,
        baseline: median_baseline,
        weekday,
        today,
    })
}

/// Fetch offers for every route and print them, without touching storage.
async fn fetch_only(date: Option<NaiveDate>, cfg: &AppConfig, fetcher: &TravelApiFetcher) {
    for origin in &cfg.origins {
        for destination in &cfg.destinations {
            info!("Fetching: {} ➔ {}", origin, destination);
            match fetcher.search_prices(origin, destination, date, false).await {
                Ok(offers) if offers.is_empty() => println!("No offers found"),
                Ok(offers) => {
                    for offer in offers {
                        println!("{offer:?}");
                    }
                }
                Err(e) => warn!("  Failed to fetch {} ➔ {}: {:?}", origin, destination, e),
            }
        }
    }
}
