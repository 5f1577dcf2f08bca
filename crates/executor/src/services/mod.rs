pub mod evaluator;
pub mod memo;
pub mod poll_loop;
pub mod telegram_service;

pub use evaluator::{IndicatorEvaluator, LeaderboardEvaluator, SymbolEvaluator};
pub use poll_loop::PollingLoop;
pub use telegram_service::{Notifier, TelegramService};
