// notifier/telegram/command_handler.rs

use crate::notifier::telegram::TelegramNotifier;
use tracing::{info, warn};

/// Handles an incoming operator command and triggers the matching action.
pub async fn handle_command(command_text: &str, notifier: &TelegramNotifier) {
    info!("Handling command: {}", command_text);
    match command_text {
        "/ping" => {
            if let Err(e) = notifier.notify_text("✅ I am online!").await {
                warn!("/ping error: {:?}", e);
            }
        }
        "/status" => {
            if let Err(e) = notifier
                .notify_text("📊 Sniper is running. Waiting for the next fetch cycle.")
                .await
            {
                warn!("/status error: {:?}", e);
            }
        }
        "/help" => {
            let help_msg = "📋 Available commands:\n\
                /ping — check connection\n\
                /status — sniper status\n\
                /help — command list\n\
                /last — most recent offer\n\
                /top5 — cheapest 5 offers\n\
                /avg — rolling averages per route\n\
                /pairs — latest steal pairs\n\
                /config — watched routes\n\
                /refresh — manual fetch cycle\n\
                /uptime — service uptime";
            if let Err(e) = notifier.notify_text(help_msg).await {
                warn!("/help error: {:?}", e);
            }
        }
        "/refresh" => {
            info!("/refresh command received, triggering fetch cycle...");
            notifier.refresh_notify.notify_one();
            if let Err(e) = notifier.notify_text("🔄 Manual fetch cycle started.").await {
                warn!("/refresh error: {:?}", e);
            }
        }
        "/uptime" => {
            let uptime = notifier.start_time.elapsed();
            let msg = format!(
                "⏱ Uptime: {:02}:{:02}:{:02}",
                uptime.as_secs() / 3600,
                (uptime.as_secs() % 3600) / 60,
                uptime.as_secs() % 60
            );
            if let Err(e) = notifier.notify_text(&msg).await {
                warn!("/uptime error: {:?}", e);
            }
        }
        "/last" => match notifier.storage.lock().await.get_last_offer() {
            Ok(Some(offer)) => {
                let dates = match offer.return_date {
                    Some(ret) => format!("{} – {}", offer.depart_date, ret),
                    None => format!("{} – OW", offer.depart_date),
                };
                let msg = format!(
                    "🕵️ Last offer:\n✈️ {} ➔ {}\n📅 {}\n💰 {} {}\n🔗 {}",
                    offer.origin,
                    offer.destination,
                    dates,
                    offer.price.round_dp(0),
                    notifier.config.currency.to_uppercase(),
                    offer.deep_link
                );
                if let Err(e) = notifier.notify_text(&msg).await {
                    warn!("/last notify error: {:?}", e);
                }
            }
            Ok(None) => {
                if let Err(e) = notifier.notify_text("📭 No offers in the database.").await {
                    warn!("/last empty notify error: {:?}", e);
                }
            }
            Err(e) => {
                if let Err(send_err) = notifier.notify_text(&format!("❌ Error: {:?}", e)).await {
                    warn!("/last send error: {:?}", send_err);
                }
            }
        },
        "/top5" => match notifier.storage.lock().await.get_top_offers(5) {
            Ok(offers) if !offers.is_empty() => {
                let currency = notifier.config.currency.to_uppercase();
                let mut msg = String::from("🏆 Cheapest offers:\n");
                for (i, offer) in offers.iter().enumerate() {
                    msg.push_str(&format!(
                        "{}. {} ➔ {} — {} {}\n📅 {}\n🔗 {}\n\n",
                        i + 1,
                        offer.origin,
                        offer.destination,
                        offer.price.round_dp(0),
                        currency,
                        offer.depart_date,
                        offer.deep_link
                    ));
                }
                if let Err(e) = notifier.notify_text(&msg).await {
                    warn!("/top5 notify error: {:?}", e);
                }
            }
            Ok(_) => {
                if let Err(e) = notifier.notify_text("📭 No offers in the database.").await {
                    warn!("/top5 empty notify error: {:?}", e);
                }
            }
            Err(e) => {
                if let Err(send_err) = notifier.notify_text(&format!("❌ Error: {:?}", e)).await {
                    warn!("/top5 send error: {:?}", send_err);
                }
            }
        },
        "/avg" => match notifier.storage.lock().await.get_rolling_averages() {
            Ok(averages) if !averages.is_empty() => {
                let currency = notifier.config.currency.to_uppercase();
                let mut msg = String::from("📊 30-day rolling averages:\n");
                for (origin, destination, avg) in averages {
                    msg.push_str(&format!(
                        "🔹 {} ➔ {} — {} {}\n",
                        origin,
                        destination,
                        avg.round_dp(0),
                        currency
                    ));
                }
                if let Err(e) = notifier.notify_text(&msg).await {
                    warn!("/avg notify error: {:?}", e);
                }
            }
            Ok(_) => {
                if let Err(e) = notifier
                    .notify_text("📭 No aggregated history yet.")
                    .await
                {
                    warn!("/avg empty notify error: {:?}", e);
                }
            }
            Err(e) => {
                if let Err(send_err) = notifier.notify_text(&format!("❌ Error: {:?}", e)).await {
                    warn!("/avg send error: {:?}", send_err);
                }
            }
        },
        "/pairs" => match notifier.storage.lock().await.recent_steal_pairs(5) {
            Ok(pairs) if !pairs.is_empty() => {
                let currency = notifier.config.currency.to_uppercase();
                let mut msg = String::from("💥 Latest steal pairs:\n");
                for (origin, destination, depart, ret, total) in pairs {
                    msg.push_str(&format!(
                        "🔹 {} ⇄ {} | {} – {} | {} {}\n",
                        origin,
                        destination,
                        depart,
                        ret,
                        total.round_dp(0),
                        currency
                    ));
                }
                if let Err(e) = notifier.notify_text(&msg).await {
                    warn!("/pairs notify error: {:?}", e);
                }
            }
            Ok(_) => {
                if let Err(e) = notifier.notify_text("📭 No steal pairs recorded.").await {
                    warn!("/pairs empty notify error: {:?}", e);
                }
            }
            Err(e) => {
                if let Err(send_err) = notifier.notify_text(&format!("❌ Error: {:?}", e)).await {
                    warn!("/pairs send error: {:?}", send_err);
                }
            }
        },
        "/config" => {
            let cfg = &notifier.config;
            if cfg.origins.is_empty() || cfg.destinations.is_empty() {
                if let Err(e) = notifier.notify_text("⚠️ No routes configured.").await {
                    warn!("/config empty error: {:?}", e);
                }
            } else {
                let mut msg = String::from("⚙️ Watched routes:\n");
                for origin in &cfg.origins {
                    for destination in &cfg.destinations {
                        msg.push_str(&format!("🔸 {} ➔ {}\n", origin, destination));
                    }
                }
                msg.push_str(&format!(
                    "Policy: {:?} | threshold {} | pairing {}\n",
                    cfg.steal_policy,
                    cfg.steal_threshold,
                    if cfg.combine_ow { "on" } else { "off" }
                ));
                if let Err(e) = notifier.notify_text(&msg).await {
                    warn!("/config notify error: {:?}", e);
                }
            }
        }
        _ => {
            if let Err(e) = notifier
                .notify_text("🤖 Unknown command. Type /help for a list of commands.")
                .await
            {
                warn!("Unknown command notify error: {:?}", e);
            }
        }
    }
}
