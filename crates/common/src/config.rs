//! Runtime configuration, read from the process environment.
//!
//! Only the Telegram credentials are required. Everything else falls back to
//! the defaults of the selected [`Variant`].

use std::{env, fmt, str::FromStr, time::Duration};

use crate::error::ConfigError;

pub const DEFAULT_BINANCE_URL: &str = "https://api.binance.com";
pub const DEFAULT_COINGECKO_URL: &str = "https://api.coingecko.com/api/v3";
pub const DEFAULT_BYBIT_URL: &str = "https://api.bybit.com";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;

/// Which rule set drives signal generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Variant {
    /// EMA20/EMA50 crossover confirmed by RSI, on CoinGecko closes.
    #[default]
    Crossover,
    /// Crossover confirmed by RSI, MACD, higher-timeframe trend and volume, on Binance klines.
    Confirmed,
    /// Top-trader position vote on Bybit.
    Leaderboard,
}

impl Variant {
    pub fn default_symbols(&self) -> Vec<String> {
        let symbols: &[&str] = match self {
            Variant::Crossover => &["BTCUSDT", "ETHUSDT"],
            Variant::Confirmed => &["BTCUSDT", "ETHUSDT", "SOLUSDT"],
            Variant::Leaderboard => &["BTCUSDT"],
        };
        symbols.iter().map(|s| s.to_string()).collect()
    }

    pub fn default_interval(&self) -> Duration {
        match self {
            Variant::Crossover | Variant::Confirmed => Duration::from_secs(300),
            Variant::Leaderboard => Duration::from_secs(60),
        }
    }
}

impl FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "crossover" | "ema" => Ok(Variant::Crossover),
            "confirmed" | "klines" => Ok(Variant::Confirmed),
            "leaderboard" => Ok(Variant::Leaderboard),
            other => Err(format!(
                "unknown variant '{other}', expected crossover, confirmed or leaderboard"
            )),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Variant::Crossover => "crossover",
            Variant::Confirmed => "confirmed",
            Variant::Leaderboard => "leaderboard",
        };
        f.write_str(name)
    }
}

/// Percentage offsets from entry and the leverage advertised with a signal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskProfile {
    pub sl_pct: f64,
    pub tp1_pct: f64,
    pub tp2_pct: f64,
    pub leverage: u32,
}

impl Default for RiskProfile {
    fn default() -> Self {
        Self {
            sl_pct: 0.015,
            tp1_pct: 0.025,
            tp2_pct: 0.04,
            leverage: 5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub telegram_token: String,
    pub chat_id: i64,
    pub variant: Variant,
    pub symbols: Vec<String>,
    pub check_interval: Duration,
    pub http_timeout: Duration,
    pub binance_url: String,
    pub coingecko_url: String,
    pub bybit_url: String,
    pub risk: RiskProfile,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds settings from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let telegram_token = get("TELEGRAM_TOKEN")
            .or_else(|| get("TELEGRAM_BOT_TOKEN"))
            .ok_or(ConfigError::Missing("TELEGRAM_TOKEN"))?;

        let chat_id_raw = get("CHAT_ID")
            .or_else(|| get("TELEGRAM_CHAT_ID"))
            .ok_or(ConfigError::Missing("CHAT_ID"))?;
        let chat_id = parse_value("CHAT_ID", &chat_id_raw)?;

        let variant: Variant = match get("SIGNAL_VARIANT") {
            Some(raw) => parse_value("SIGNAL_VARIANT", &raw)?,
            None => Variant::default(),
        };

        let symbols = match get("SYMBOLS") {
            Some(raw) => {
                let symbols: Vec<String> = raw
                    .split(',')
                    .map(|s| s.trim().to_ascii_uppercase())
                    .filter(|s| !s.is_empty())
                    .collect();
                if symbols.is_empty() {
                    return Err(ConfigError::Invalid {
                        var: "SYMBOLS",
                        value: raw,
                        reason: "no symbols listed".to_string(),
                    });
                }
                symbols
            }
            None => variant.default_symbols(),
        };

        let check_interval = match get("CHECK_INTERVAL_SECS") {
            Some(raw) => Duration::from_secs(parse_positive("CHECK_INTERVAL_SECS", &raw)?),
            None => variant.default_interval(),
        };

        let http_timeout = match get("HTTP_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_positive("HTTP_TIMEOUT_SECS", &raw)?),
            None => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        };

        let defaults = RiskProfile::default();
        let risk = RiskProfile {
            sl_pct: optional(&get, "SL_PCT")?.unwrap_or(defaults.sl_pct),
            tp1_pct: optional(&get, "TP1_PCT")?.unwrap_or(defaults.tp1_pct),
            tp2_pct: optional(&get, "TP2_PCT")?.unwrap_or(defaults.tp2_pct),
            leverage: optional(&get, "LEVERAGE")?.unwrap_or(defaults.leverage),
        };

        Ok(Self {
            telegram_token,
            chat_id,
            variant,
            symbols,
            check_interval,
            http_timeout,
            binance_url: get("BINANCE_BASE_URL").unwrap_or_else(|| DEFAULT_BINANCE_URL.to_string()),
            coingecko_url: get("COINGECKO_BASE_URL")
                .unwrap_or_else(|| DEFAULT_COINGECKO_URL.to_string()),
            bybit_url: get("BYBIT_BASE_URL").unwrap_or_else(|| DEFAULT_BYBIT_URL.to_string()),
            risk,
        })
    }
}

fn parse_value<T>(var: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
        var,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

fn parse_positive(var: &'static str, raw: &str) -> Result<u64, ConfigError> {
    match parse_value::<u64>(var, raw)? {
        0 => Err(ConfigError::Invalid {
            var,
            value: raw.to_string(),
            reason: "must be greater than zero".to_string(),
        }),
        v => Ok(v),
    }
}

fn optional<T, G>(get: &G, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    get(var).map(|raw| parse_value(var, &raw)).transpose()
}
