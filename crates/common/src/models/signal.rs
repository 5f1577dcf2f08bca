use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Long => "LONG",
            Direction::Short => "SHORT",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Supporting values shown next to a signal. Which variant is filled depends
/// on how the signal was derived.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Readouts {
    Indicators {
        rsi: f64,
        ema_fast: f64,
        ema_slow: f64,
        macd_histogram: Option<f64>,
        volume_ok: Option<bool>,
        trend: Option<Direction>,
    },
    Leaderboard {
        buy_votes: usize,
        sell_votes: usize,
        total: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Signal {
    pub symbol: String,
    pub direction: Direction,
    pub entry: f64,
    pub stop_loss: f64,
    pub take_profit_1: f64,
    pub take_profit_2: f64,
    pub leverage: u32,
    pub readouts: Readouts,
    pub time: DateTime<Utc>,
}

impl Signal {
    /// Timestamp in the `YYYY-MM-DD HH:MM:SS` form used in chat messages.
    pub fn time_label(&self) -> String {
        self.time.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}
