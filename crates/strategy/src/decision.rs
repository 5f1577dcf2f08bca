//! EMA crossover rules with optional confirmation filters.

use common::models::{Direction, Readouts, SampleSeries};
use thiserror::Error;
use tracing::debug;

use crate::indicators::{self, RSI_PERIOD, VOLUME_MULTIPLIER};

pub const EMA_FAST: usize = 20;
pub const EMA_SLOW: usize = 50;
pub const RSI_LONG_THRESHOLD: f64 = 55.0;
pub const RSI_SHORT_THRESHOLD: f64 = 45.0;
pub const MIN_SAMPLES: usize = 60;

/// Which confirmations a crossover must pass. Every enabled filter has to agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Filters {
    pub rsi: bool,
    pub macd: bool,
    pub trend: bool,
    pub volume: bool,
}

impl Filters {
    pub const CROSSOVER: Filters = Filters {
        rsi: true,
        macd: false,
        trend: false,
        volume: false,
    };

    pub const CONFIRMED: Filters = Filters {
        rsi: true,
        macd: true,
        trend: true,
        volume: true,
    };
}

#[derive(Debug, Error, PartialEq)]
pub enum DecisionError {
    #[error("need at least {need} samples, have {have}")]
    NotEnoughSamples { have: usize, need: usize },

    #[error("volume filter enabled but the series carries no volumes")]
    MissingVolumes,

    #[error("trend filter enabled but no higher-timeframe series was supplied")]
    MissingTrend,
}

/// Indicator readings for one symbol plus the direction they support, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Confirmed direction. `None` means no signal this cycle.
    pub direction: Option<Direction>,
    /// Raw crossover before confirmation filters.
    pub crossover: Option<Direction>,
    pub entry: f64,
    pub rsi: f64,
    pub ema_fast: f64,
    pub ema_slow: f64,
    pub macd_histogram: Option<f64>,
    pub volume_ok: Option<bool>,
    pub trend: Option<Direction>,
}

impl Evaluation {
    pub fn readouts(&self) -> Readouts {
        Readouts::Indicators {
            rsi: self.rsi,
            ema_fast: self.ema_fast,
            ema_slow: self.ema_slow,
            macd_histogram: self.macd_histogram,
            volume_ok: self.volume_ok,
            trend: self.trend,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalRules {
    pub filters: Filters,
    pub min_samples: usize,
}

impl SignalRules {
    pub fn new(filters: Filters) -> Self {
        Self {
            filters,
            min_samples: MIN_SAMPLES,
        }
    }

    pub fn crossover() -> Self {
        Self::new(Filters::CROSSOVER)
    }

    pub fn confirmed() -> Self {
        Self::new(Filters::CONFIRMED)
    }

    /// Evaluates the latest sample of `series`. `trend_closes` is the same
    /// symbol on a coarser timeframe and is only required by the trend filter.
    pub fn evaluate(
        &self,
        series: &SampleSeries,
        trend_closes: Option<&[f64]>,
    ) -> Result<Evaluation, DecisionError> {
        let closes = series.closes.as_slice();
        let need = self.min_samples.max(RSI_PERIOD + 1).max(2);
        if closes.len() < need {
            return Err(DecisionError::NotEnoughSamples {
                have: closes.len(),
                need,
            });
        }

        let previous = &closes[..closes.len() - 1];
        let not_enough = || DecisionError::NotEnoughSamples {
            have: closes.len(),
            need,
        };
        let prev_fast = indicators::ema(previous, EMA_FAST).ok_or_else(not_enough)?;
        let prev_slow = indicators::ema(previous, EMA_SLOW).ok_or_else(not_enough)?;
        let ema_fast = indicators::ema(closes, EMA_FAST).ok_or_else(not_enough)?;
        let ema_slow = indicators::ema(closes, EMA_SLOW).ok_or_else(not_enough)?;
        let rsi = indicators::rsi(closes, RSI_PERIOD).ok_or_else(not_enough)?;

        let crossover = if prev_fast < prev_slow && ema_fast > ema_slow {
            Some(Direction::Long)
        } else if prev_fast > prev_slow && ema_fast < ema_slow {
            Some(Direction::Short)
        } else {
            None
        };

        let macd_histogram = if self.filters.macd {
            indicators::macd(closes).map(|m| m.histogram)
        } else {
            None
        };

        let volume_ok = match (&series.volumes, self.filters.volume) {
            (Some(volumes), _) => Some(indicators::volume_ok(volumes, VOLUME_MULTIPLIER)),
            (None, true) => return Err(DecisionError::MissingVolumes),
            (None, false) => None,
        };

        let trend = match (trend_closes, self.filters.trend) {
            (Some(trend_closes), _) => {
                if trend_closes.len() < EMA_SLOW {
                    return Err(DecisionError::NotEnoughSamples {
                        have: trend_closes.len(),
                        need: EMA_SLOW,
                    });
                }
                trend_direction(trend_closes)
            }
            (None, true) => return Err(DecisionError::MissingTrend),
            (None, false) => None,
        };

        let mut evaluation = Evaluation {
            direction: None,
            crossover,
            entry: closes[closes.len() - 1],
            rsi,
            ema_fast,
            ema_slow,
            macd_histogram,
            volume_ok,
            trend,
        };
        evaluation.direction = crossover.filter(|d| self.confirms(*d, &evaluation));

        if let (Some(candidate), None) = (crossover, evaluation.direction) {
            debug!(
                "{}: {} crossover not confirmed (RSI={:.1} MACD={:?} volume={:?} trend={:?})",
                series.symbol, candidate, rsi, macd_histogram, volume_ok, trend
            );
        }
        Ok(evaluation)
    }

    fn confirms(&self, direction: Direction, ev: &Evaluation) -> bool {
        let f = &self.filters;
        let rsi_ok = !f.rsi
            || match direction {
                Direction::Long => ev.rsi > RSI_LONG_THRESHOLD,
                Direction::Short => ev.rsi < RSI_SHORT_THRESHOLD,
            };
        let macd_ok = !f.macd
            || match (direction, ev.macd_histogram) {
                (Direction::Long, Some(h)) => h > 0.0,
                (Direction::Short, Some(h)) => h < 0.0,
                (_, None) => false,
            };
        let trend_ok = !f.trend || ev.trend == Some(direction);
        let volume_ok = !f.volume || ev.volume_ok == Some(true);

        rsi_ok && macd_ok && trend_ok && volume_ok
    }
}

/// EMA20 against EMA50 on a whole series. `None` when they are equal or undefined.
pub fn trend_direction(closes: &[f64]) -> Option<Direction> {
    let fast = indicators::ema(closes, EMA_FAST)?;
    let slow = indicators::ema(closes, EMA_SLOW)?;
    if fast > slow {
        Some(Direction::Long)
    } else if fast < slow {
        Some(Direction::Short)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 29 falling closes then a +3/-2 zigzag: EMA20 crosses EMA50 upward on the
    /// last sample with RSI near 59.5.
    fn long_crossover() -> Vec<f64> {
        zigzag(29, 3.0, 2.0)
    }

    /// Sharper recovery whose MACD histogram is positive at the crossover.
    fn strong_long_crossover() -> Vec<f64> {
        zigzag(39, 3.0, 0.5)
    }

    fn zigzag(falling: usize, up: f64, down: f64) -> Vec<f64> {
        let mut closes: Vec<f64> = (0..falling).map(|i| 100.0 - i as f64).collect();
        let mut step = 0;
        while closes.len() < 60 {
            let last = closes[closes.len() - 1];
            closes.push(if step % 2 == 0 { last + up } else { last - down });
            step += 1;
        }
        closes
    }

    fn mirrored(closes: &[f64]) -> Vec<f64> {
        closes.iter().map(|c| 200.0 - c).collect()
    }

    fn rising(n: usize) -> Vec<f64> {
        (1..=n).map(|i| i as f64).collect()
    }

    fn with_volume_spike(symbol: &str, closes: Vec<f64>, last_volume: f64) -> SampleSeries {
        let mut volumes = vec![100.0; closes.len() - 1];
        volumes.push(last_volume);
        SampleSeries::with_volumes(symbol, closes, volumes)
    }

    #[test]
    fn crossover_with_bullish_rsi_is_long() {
        let series = SampleSeries::from_closes("BTCUSDT", long_crossover());
        let ev = SignalRules::crossover().evaluate(&series, None).unwrap();

        assert_eq!(ev.crossover, Some(Direction::Long));
        assert_eq!(ev.direction, Some(Direction::Long));
        assert_eq!(ev.entry, 90.0);
        assert!(ev.rsi > 59.0 && ev.rsi < 60.0, "rsi = {}", ev.rsi);
        assert!(ev.ema_fast > ev.ema_slow);
        assert_eq!(ev.macd_histogram, None);
        assert_eq!(ev.volume_ok, None);
    }

    #[test]
    fn mirrored_crossover_is_short() {
        let series = SampleSeries::from_closes("ETHUSDT", mirrored(&long_crossover()));
        let ev = SignalRules::crossover().evaluate(&series, None).unwrap();

        assert_eq!(ev.direction, Some(Direction::Short));
        assert_eq!(ev.entry, 110.0);
        assert!(ev.rsi < RSI_SHORT_THRESHOLD);
    }

    #[test]
    fn steady_trend_has_no_crossover() {
        let series = SampleSeries::from_closes("BTCUSDT", rising(60));
        let ev = SignalRules::crossover().evaluate(&series, None).unwrap();

        assert!(ev.ema_fast > ev.ema_slow);
        assert_eq!(ev.crossover, None);
        assert_eq!(ev.direction, None);
    }

    #[test]
    fn short_history_is_rejected() {
        let series = SampleSeries::from_closes("BTCUSDT", rising(59));
        assert_eq!(
            SignalRules::crossover().evaluate(&series, None),
            Err(DecisionError::NotEnoughSamples { have: 59, need: 60 })
        );
    }

    #[test]
    fn rsi_threshold_is_strict() {
        let rules = SignalRules::crossover();
        let mut ev = Evaluation {
            direction: None,
            crossover: Some(Direction::Long),
            entry: 1.0,
            rsi: RSI_LONG_THRESHOLD,
            ema_fast: 1.0,
            ema_slow: 1.0,
            macd_histogram: None,
            volume_ok: None,
            trend: None,
        };
        assert!(!rules.confirms(Direction::Long, &ev));

        ev.rsi = 55.1;
        assert!(rules.confirms(Direction::Long, &ev));
        assert!(!rules.confirms(Direction::Short, &ev));

        ev.rsi = RSI_SHORT_THRESHOLD;
        assert!(!rules.confirms(Direction::Short, &ev));
        ev.rsi = 44.9;
        assert!(rules.confirms(Direction::Short, &ev));
    }

    #[test]
    fn confirmed_rules_need_every_filter() {
        let rules = SignalRules::confirmed();
        let trend = rising(60);

        let series = with_volume_spike("BTCUSDT", strong_long_crossover(), 200.0);
        let ev = rules.evaluate(&series, Some(&trend)).unwrap();
        assert_eq!(ev.direction, Some(Direction::Long));
        assert!(ev.macd_histogram.unwrap() > 0.0);
        assert_eq!(ev.volume_ok, Some(true));
        assert_eq!(ev.trend, Some(Direction::Long));

        let quiet = with_volume_spike("BTCUSDT", strong_long_crossover(), 120.0);
        let ev = rules.evaluate(&quiet, Some(&trend)).unwrap();
        assert_eq!(ev.crossover, Some(Direction::Long));
        assert_eq!(ev.direction, None);

        let falling_trend: Vec<f64> = trend.iter().rev().copied().collect();
        let ev = rules.evaluate(&series, Some(&falling_trend)).unwrap();
        assert_eq!(ev.trend, Some(Direction::Short));
        assert_eq!(ev.direction, None);
    }

    #[test]
    fn confirmed_rules_reject_negative_macd_for_long() {
        // this crossover has a negative histogram
        let series = with_volume_spike("BTCUSDT", long_crossover(), 200.0);
        let ev = SignalRules::confirmed()
            .evaluate(&series, Some(&rising(60)))
            .unwrap();

        assert_eq!(ev.crossover, Some(Direction::Long));
        assert!(ev.macd_histogram.unwrap() < 0.0);
        assert_eq!(ev.direction, None);
    }

    #[test]
    fn confirmed_short_mirrors_long() {
        let series = with_volume_spike("BTCUSDT", mirrored(&strong_long_crossover()), 200.0);
        let falling_trend: Vec<f64> = rising(60).into_iter().rev().collect();
        let ev = SignalRules::confirmed()
            .evaluate(&series, Some(&falling_trend))
            .unwrap();

        assert_eq!(ev.direction, Some(Direction::Short));
        assert!(ev.macd_histogram.unwrap() < 0.0);
    }

    #[test]
    fn confirmed_rules_require_their_inputs() {
        let rules = SignalRules::confirmed();
        let closes_only = SampleSeries::from_closes("BTCUSDT", strong_long_crossover());
        assert_eq!(
            rules.evaluate(&closes_only, Some(&rising(60))),
            Err(DecisionError::MissingVolumes)
        );

        let series = with_volume_spike("BTCUSDT", strong_long_crossover(), 200.0);
        assert_eq!(rules.evaluate(&series, None), Err(DecisionError::MissingTrend));
        assert_eq!(
            rules.evaluate(&series, Some(&rising(10))),
            Err(DecisionError::NotEnoughSamples { have: 10, need: 50 })
        );
    }

    #[test]
    fn direction_always_matches_current_ema_order() {
        for phase in 0..40 {
            let closes: Vec<f64> = (0..80)
                .map(|i| 100.0 + ((i + phase) as f64 * 0.15).sin() * 10.0)
                .collect();
            let series = SampleSeries::from_closes("BTCUSDT", closes);
            let ev = SignalRules::crossover().evaluate(&series, None).unwrap();

            match ev.direction {
                Some(Direction::Long) => assert!(ev.ema_fast > ev.ema_slow),
                Some(Direction::Short) => assert!(ev.ema_fast < ev.ema_slow),
                None => {}
            }
            if ev.direction.is_some() {
                assert_eq!(ev.direction, ev.crossover);
            }
        }
    }

    #[test]
    fn trend_direction_follows_ema_order() {
        assert_eq!(trend_direction(&rising(60)), Some(Direction::Long));
        let falling: Vec<f64> = rising(60).into_iter().rev().collect();
        assert_eq!(trend_direction(&falling), Some(Direction::Short));
        assert_eq!(trend_direction(&[]), None);
    }
}
