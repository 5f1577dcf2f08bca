//! Closed-form indicators over close/volume series (oldest first).

use ta::Next;
use ta::indicators::ExponentialMovingAverage;

pub const RSI_PERIOD: usize = 14;
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;
/// Number of trailing closes the MACD signal line is rebuilt from.
pub const MACD_SIGNAL_WINDOW: usize = 35;
pub const VOLUME_MULTIPLIER: f64 = 1.5;

/// Every intermediate EMA value, seeded with the first sample.
///
/// Empty when `values` is empty or `period` is zero.
pub fn ema_series(values: &[f64], period: usize) -> Vec<f64> {
    let Ok(mut ema) = ExponentialMovingAverage::new(period) else {
        return Vec::new();
    };
    values.iter().map(|&v| ema.next(v)).collect()
}

/// Final EMA value. Seeded with the first sample rather than an SMA, so early
/// outputs differ from the textbook definition.
pub fn ema(values: &[f64], period: usize) -> Option<f64> {
    let mut ema = ExponentialMovingAverage::new(period).ok()?;
    values.iter().fold(None, |_, &v| Some(ema.next(v)))
}

/// Wilder RSI. The first `period` differences are averaged, the rest smoothed.
///
/// Returns `None` with fewer than `period + 1` samples and exactly `100.0`
/// when the smoothed loss is zero.
pub fn rsi(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period + 1 {
        return None;
    }

    let diffs: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();
    let p = period as f64;

    let mut avg_gain = diffs[..period]
        .iter()
        .map(|&d| if d >= 0.0 { d } else { 0.0 })
        .sum::<f64>()
        / p;
    let mut avg_loss = diffs[..period]
        .iter()
        .map(|&d| if d < 0.0 { -d } else { 0.0 })
        .sum::<f64>()
        / p;

    for &d in &diffs[period..] {
        let gain = if d > 0.0 { d } else { 0.0 };
        let loss = if d < 0.0 { -d } else { 0.0 };
        avg_gain = (avg_gain * (p - 1.0) + gain) / p;
        avg_loss = (avg_loss * (p - 1.0) + loss) / p;
    }

    if avg_loss == 0.0 {
        return Some(100.0);
    }
    let rs = avg_gain / avg_loss;
    Some(100.0 - 100.0 / (1.0 + rs))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Macd {
    pub line: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// MACD(12, 26, 9).
///
/// The line uses the whole series. The signal line is the EMA(9) of a MACD
/// series rebuilt from only the last [`MACD_SIGNAL_WINDOW`] closes, with both
/// EMAs re-seeded at the start of that window. This is an approximation of
/// the true signal line and is kept as is.
pub fn macd(values: &[f64]) -> Option<Macd> {
    let line = ema(values, MACD_FAST)? - ema(values, MACD_SLOW)?;

    let window = &values[values.len().saturating_sub(MACD_SIGNAL_WINDOW)..];
    let fast = ema_series(window, MACD_FAST);
    let slow = ema_series(window, MACD_SLOW);
    let macd_window: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
    let signal = ema(&macd_window, MACD_SIGNAL)?;

    Some(Macd {
        line,
        signal,
        histogram: line - signal,
    })
}

/// True when the latest volume exceeds `multiplier` times the mean of all
/// earlier volumes.
pub fn volume_ok(volumes: &[f64], multiplier: f64) -> bool {
    let Some((last, prior)) = volumes.split_last() else {
        return false;
    };
    if prior.is_empty() {
        return false;
    }
    let avg = prior.iter().sum::<f64>() / prior.len() as f64;
    *last > avg * multiplier
}
