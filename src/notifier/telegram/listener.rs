// notifier/telegram/listener.rs

use crate::notifier::telegram::TelegramNotifier;
use crate::notifier::telegram::command_handler::handle_command;
use serde::Deserialize;
use tokio::time::{Duration, sleep};

#[derive(Debug, Deserialize)]
struct TelegramApiResponse {
    result: Vec<TelegramUpdate>,
}

#[derive(Debug, Deserialize)]
struct TelegramUpdate {
    update_id: i64,
    message: Option<TelegramMessage>,
}

#[derive(Debug, Deserialize)]
struct TelegramMessage {
    chat: TelegramChat,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TelegramChat {
    id: i64,
}

/// Polls for Telegram updates and processes incoming operator commands.
/// Messages from chats other than the configured one are ignored.
pub async fn listen_for_commands(notifier: &TelegramNotifier) {
    let url = format!("https://api.telegram.org/bot{}/getUpdates", notifier.bot_token);
    loop {
        let current_offset = notifier.offset.load(std::sync::atomic::Ordering::SeqCst);
        let response = notifier
            .client
            .get(&url)
            .query(&[("offset", (current_offset + 1).to_string())])
            .send()
            .await;
        if let Ok(resp) = response {
            if let Ok(api_response) = resp.json::<TelegramApiResponse>().await {
                for update in api_response.result {
                    if let Some(message) = update.message.as_ref() {
                        if message.chat.id == notifier.chat_id {
                            if let Some(text) = message.text.as_deref() {
                                handle_command(text, notifier).await;
                            }
                        }
                    }
                    notifier
                        .offset
                        .store(update.update_id + 1, std::sync::atomic::Ordering::SeqCst);
                }
            }
        }
        sleep(Duration::from_secs(1)).await;
    }
}
