pub mod command_handler;
pub mod listener;
pub mod sender;

use crate::config::AppConfig;
use crate::model::NotifyError;
use crate::storage::SqliteStorage;
use reqwest::Client;
use std::sync::Arc;
use std::sync::atomic::AtomicI64;
use std::time::Instant;
use tokio::sync::{Mutex, Notify};

pub struct TelegramNotifier {
    pub bot_token: String,
    pub chat_id: i64,
    pub client: Client,
    pub offset: Arc<AtomicI64>,
    pub storage: Arc<Mutex<SqliteStorage>>,
    pub config: Arc<AppConfig>,
    pub start_time: Instant,
    pub refresh_notify: Arc<Notify>,
}

impl TelegramNotifier {
    pub fn new(
        storage: Arc<Mutex<SqliteStorage>>,
        config: Arc<AppConfig>,
        refresh_notify: Arc<Notify>,
    ) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("❗ Failed to create HTTP client");
        Self {
            bot_token: config.telegram_bot_token.clone(),
            chat_id: config.telegram_chat_id,
            client,
            offset: Arc::new(AtomicI64::new(0)),
            storage,
            config,
            start_time: Instant::now(),
            refresh_notify,
        }
    }

    /// Sends a plain-text message to the configured chat. Instant alerting
    /// can be disabled in the configuration; the daily digest and command
    /// replies still go out.
    pub async fn notify_text(&self, text: &str) -> Result<(), NotifyError> {
        sender::send_text(self, text).await
    }

    /// Sends an already-rendered alert, honoring the instant-alert switch.
    pub async fn notify_alert(&self, text: &str) -> Result<(), NotifyError> {
        if !self.config.telegram_instant {
            return Ok(());
        }
        sender::send_text(self, text).await
    }

    pub async fn listen_for_commands(&self) {
        listener::listen_for_commands(self).await;
    }

    pub async fn set_my_commands(&self) -> Result<(), reqwest::Error> {
        let url = format!("https://api.telegram.org/bot{}/setMyCommands", self.bot_token);
        let commands = serde_json::json!({
            "commands": [
                { "command": "ping", "description": "Check connection" },
                { "command": "status", "description": "Show sniper status" },
                { "command": "help", "description": "Command list" },
                { "command": "last", "description": "Most recent offer" },
                { "command": "top5", "description": "Cheapest 5 offers" },
                { "command": "avg", "description": "Rolling averages per route" },
                { "command": "pairs", "description": "Latest steal pairs" },
                { "command": "config", "description": "Watched routes" },
                { "command": "refresh", "description": "Manual fetch cycle" },
                { "command": "uptime", "description": "Service uptime" }
            ]
        });
        self.client.post(&url).json(&commands).send().await?;
        Ok(())
    }

    pub fn spawn_listener(notifier: Arc<TelegramNotifier>) {
        tokio::spawn(async move {
            tracing::info!("▶️ Starting Telegram listener...");
            if let Err(e) = notifier.set_my_commands().await {
                tracing::warn!("setMyCommands failed: {:?}", e);
            }
            notifier.listen_for_commands().await;
            tracing::info!("🛑 Telegram listener ended.");
        });
    }
}
