use chrono::{DateTime, Utc};
use common::config::RiskProfile;
use common::models::{Direction, Readouts, Signal};

/// Exit prices derived from an entry price and a [`RiskProfile`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Levels {
    pub stop_loss: f64,
    pub take_profit_1: f64,
    pub take_profit_2: f64,
}

impl Levels {
    pub fn new(profile: &RiskProfile, direction: Direction, entry: f64) -> Self {
        match direction {
            Direction::Long => Self {
                stop_loss: entry * (1.0 - profile.sl_pct),
                take_profit_1: entry * (1.0 + profile.tp1_pct),
                take_profit_2: entry * (1.0 + profile.tp2_pct),
            },
            Direction::Short => Self {
                stop_loss: entry * (1.0 + profile.sl_pct),
                take_profit_1: entry * (1.0 - profile.tp1_pct),
                take_profit_2: entry * (1.0 - profile.tp2_pct),
            },
        }
    }
}

pub fn build_signal(
    symbol: &str,
    direction: Direction,
    entry: f64,
    profile: &RiskProfile,
    readouts: Readouts,
    time: DateTime<Utc>,
) -> Signal {
    let levels = Levels::new(profile, direction, entry);
    Signal {
        symbol: symbol.to_string(),
        direction,
        entry,
        stop_loss: levels.stop_loss,
        take_profit_1: levels.take_profit_1,
        take_profit_2: levels.take_profit_2,
        leverage: profile.leverage,
        readouts,
        time,
    }
}
