use async_trait::async_trait;
use common::config::Variant;
use common::models::{Readouts, Signal};
use teloxide::payloads::SendMessageSetters;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("telegram request failed: {0}")]
    Telegram(#[from] teloxide::RequestError),
}

/// Delivers a pre-formatted message to the configured destination.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> Result<(), DeliveryError>;
}

pub struct TelegramService {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramService {
    pub fn new(token: &str, chat_id: i64) -> Self {
        Self {
            bot: Bot::new(token),
            chat_id: ChatId(chat_id),
        }
    }
}

#[async_trait]
impl Notifier for TelegramService {
    async fn send(&self, text: &str) -> Result<(), DeliveryError> {
        self.bot
            .send_message(self.chat_id, text)
            .parse_mode(ParseMode::Html)
            .await?;
        debug!("Telegram message delivered to chat {}", self.chat_id.0);
        Ok(())
    }
}

pub fn format_startup(variant: Variant, symbols: &[String]) -> String {
    format!(
        "🧪 <b>Signal bot started</b>\nStrategy: <b>{}</b>\nSymbols: <b>{}</b>",
        variant,
        symbols.join(", ")
    )
}

/// Renders a signal as Telegram HTML.
pub fn format_signal(sig: &Signal) -> String {
    let mut text = format!(
        "🔥 <b>Signal</b>\n\n\
         Symbol: <b>{}</b>\n\
         Direction: <b>{}</b>\n\
         Entry: <b>{}</b>\n\n\
         Stop-loss: <b>{}</b> ({})\n\
         Take-profit 1: <b>{}</b> ({})\n\
         Take-profit 2: <b>{}</b> ({})\n\n\
         Leverage: <b>x{}</b>\n",
        sig.symbol,
        sig.direction,
        format_price(sig.entry),
        format_price(sig.stop_loss),
        format_offset(sig.entry, sig.stop_loss),
        format_price(sig.take_profit_1),
        format_offset(sig.entry, sig.take_profit_1),
        format_price(sig.take_profit_2),
        format_offset(sig.entry, sig.take_profit_2),
        sig.leverage,
    );

    match &sig.readouts {
        Readouts::Indicators {
            rsi,
            ema_fast,
            ema_slow,
            macd_histogram,
            volume_ok,
            trend,
        } => {
            text.push_str(&format!("RSI(14): <b>{:.1}</b>\n", rsi));
            text.push_str(&format!(
                "EMA20: <b>{}</b> | EMA50: <b>{}</b>\n",
                format_price(*ema_fast),
                format_price(*ema_slow)
            ));
            if let Some(hist) = macd_histogram {
                text.push_str(&format!("MACD hist: <b>{:.4}</b>\n", hist));
            }
            if let Some(ok) = volume_ok {
                let label = if *ok { "spike" } else { "normal" };
                text.push_str(&format!("Volume: <b>{}</b>\n", label));
            }
            if let Some(trend) = trend {
                text.push_str(&format!("Higher timeframe: <b>{}</b>\n", trend));
            }
        }
        Readouts::Leaderboard {
            buy_votes,
            sell_votes,
            total,
        } => {
            text.push_str(&format!(
                "Top traders: <b>{}</b> buy / <b>{}</b> sell of {}\n",
                buy_votes, sell_votes, total
            ));
        }
    }

    text.push_str(&format!("⏱ {} UTC", sig.time_label()));
    text
}

fn format_price(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1.0 {
        format!("{:.2}", value)
    } else if abs >= 0.01 {
        format!("{:.4}", value)
    } else {
        format!("{:.8}", value)
    }
}

fn format_offset(entry: f64, level: f64) -> String {
    if entry == 0.0 {
        return "n/a".to_string();
    }
    format!("≈ {:+.1}%", (level / entry - 1.0) * 100.0)
}
