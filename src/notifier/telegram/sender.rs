// notifier/telegram/sender.rs

use crate::model::NotifyError;
use crate::notifier::telegram::TelegramNotifier;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, warn};

const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Sends a text message via the Telegram Bot API.
pub async fn send_text(notifier: &TelegramNotifier, text: &str) -> Result<(), NotifyError> {
    let url = format!("https://api.telegram.org/bot{}/sendMessage", notifier.bot_token);
    info!("📤 Sending Telegram message:\n{}", text);

    let response = match timeout(
        SEND_TIMEOUT,
        notifier
            .client
            .post(&url)
            .form(&[
                ("chat_id", notifier.chat_id.to_string()),
                ("text", text.to_string()),
            ])
            .send(),
    )
    .await
    {
        Ok(Ok(resp)) => resp,
        Ok(Err(e)) => {
            warn!("❌ Telegram send() failed: {:?}", e);
            return Err(NotifyError::Api(format!("Send failed: {}", e)));
        }
        Err(_) => {
            warn!("⏳ Telegram send() timed out");
            return Err(NotifyError::Unreachable);
        }
    };

    let status = response.status();
    let body = response.text().await.unwrap_or_else(|_| "unknown".into());
    if !status.is_success() {
        warn!("❌ Telegram API responded [{}]: {}", status, body);
        return Err(NotifyError::Unreachable);
    }
    info!("✅ Telegram response [{}]: {}", status, body);
    Ok(())
}
