use std::str::FromStr;

use serde::Serialize;

/// Side of a top trader's open position, as reported by the leaderboard feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PositionSide {
    Buy,
    Sell,
}

impl FromStr for PositionSide {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" | "LONG" => Ok(PositionSide::Buy),
            "SELL" | "SHORT" => Ok(PositionSide::Sell),
            other => Err(format!("unknown position side: {other}")),
        }
    }
}
