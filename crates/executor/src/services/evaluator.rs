//! Per-symbol fetch and decide step of a polling cycle.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::config::RiskProfile;
use common::models::Signal;
use market_data::{FetchError, LeaderboardFeed, PriceFeed};
use strategy::{DecisionError, SignalRules, VoteTally, build_signal};
use thiserror::Error;
use tracing::debug;

/// Signal timeframe and trend timeframe used with kline feeds.
pub const SIGNAL_INTERVAL: &str = "15m";
pub const TREND_INTERVAL: &str = "1h";
pub const KLINE_LOOKBACK: usize = 200;

#[derive(Debug, Error)]
pub enum SkipReason {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Data(#[from] DecisionError),
}

/// Result of evaluating one symbol for one cycle.
#[derive(Debug)]
pub enum SymbolOutcome {
    Signal(Signal),
    NoSignal,
    /// No usable data this cycle. The symbol is retried on the next one.
    Skipped(SkipReason),
}

impl From<Result<Option<Signal>, SkipReason>> for SymbolOutcome {
    fn from(result: Result<Option<Signal>, SkipReason>) -> Self {
        match result {
            Ok(Some(signal)) => SymbolOutcome::Signal(signal),
            Ok(None) => SymbolOutcome::NoSignal,
            Err(reason) => SymbolOutcome::Skipped(reason),
        }
    }
}

#[async_trait]
pub trait SymbolEvaluator: Send + Sync {
    async fn evaluate(&self, symbol: &str, now: DateTime<Utc>) -> SymbolOutcome;
}

/// Indicator-driven evaluation over a price feed.
pub struct IndicatorEvaluator {
    feed: Box<dyn PriceFeed>,
    rules: SignalRules,
    risk: RiskProfile,
    interval: String,
    trend_interval: Option<String>,
    limit: usize,
}

impl IndicatorEvaluator {
    /// Closes-only crossover with the RSI filter. Takes everything the feed returns.
    pub fn crossover(feed: Box<dyn PriceFeed>, risk: RiskProfile) -> Self {
        Self {
            feed,
            rules: SignalRules::crossover(),
            risk,
            interval: String::new(),
            trend_interval: None,
            limit: 0,
        }
    }

    /// Crossover confirmed by RSI, MACD, volume and the coarser timeframe.
    pub fn confirmed(feed: Box<dyn PriceFeed>, risk: RiskProfile) -> Self {
        Self {
            feed,
            rules: SignalRules::confirmed(),
            risk,
            interval: SIGNAL_INTERVAL.to_string(),
            trend_interval: Some(TREND_INTERVAL.to_string()),
            limit: KLINE_LOOKBACK,
        }
    }

    async fn try_evaluate(
        &self,
        symbol: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Signal>, SkipReason> {
        let series = self
            .feed
            .fetch_series(symbol, &self.interval, self.limit)
            .await?;

        let trend = match &self.trend_interval {
            Some(interval) => Some(
                self.feed
                    .fetch_series(symbol, interval, self.limit)
                    .await?
                    .closes,
            ),
            None => None,
        };

        let ev = self.rules.evaluate(&series, trend.as_deref())?;
        debug!(
            "{}: price={:.2} RSI={:.1} EMA20={:.2} EMA50={:.2} crossover={:?}",
            symbol, ev.entry, ev.rsi, ev.ema_fast, ev.ema_slow, ev.crossover
        );

        Ok(ev.direction.map(|direction| {
            build_signal(symbol, direction, ev.entry, &self.risk, ev.readouts(), now)
        }))
    }
}

#[async_trait]
impl SymbolEvaluator for IndicatorEvaluator {
    async fn evaluate(&self, symbol: &str, now: DateTime<Utc>) -> SymbolOutcome {
        self.try_evaluate(symbol, now).await.into()
    }
}

/// Top-trader vote evaluation. The last traded price is only fetched once a
/// side has won.
pub struct LeaderboardEvaluator {
    feed: Box<dyn LeaderboardFeed>,
    risk: RiskProfile,
}

impl LeaderboardEvaluator {
    pub fn new(feed: Box<dyn LeaderboardFeed>, risk: RiskProfile) -> Self {
        Self { feed, risk }
    }

    async fn try_evaluate(
        &self,
        symbol: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Signal>, SkipReason> {
        let sides = self.feed.fetch_sides(symbol).await?;
        let tally = VoteTally::from_sides(&sides);
        debug!(
            "{}: leaderboard BUY={} SELL={} of {}",
            symbol, tally.buy, tally.sell, tally.total
        );

        let Some(direction) = tally.direction() else {
            return Ok(None);
        };

        let entry = self.feed.fetch_last_price(symbol).await?;
        Ok(Some(build_signal(
            symbol,
            direction,
            entry,
            &self.risk,
            tally.readouts(),
            now,
        )))
    }
}

#[async_trait]
impl SymbolEvaluator for LeaderboardEvaluator {
    async fn evaluate(&self, symbol: &str, now: DateTime<Utc>) -> SymbolOutcome {
        self.try_evaluate(symbol, now).await.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use common::models::{Direction, PositionSide, Readouts, SampleSeries};
    use mockall::mock;
    use mockall::predicate::eq;

    mock! {
        pub Prices {}

        #[async_trait]
        impl PriceFeed for Prices {
            async fn fetch_series(
                &self,
                symbol: &str,
                interval: &str,
                limit: usize,
            ) -> Result<SampleSeries, FetchError>;
        }
    }

    mock! {
        pub Leaders {}

        #[async_trait]
        impl LeaderboardFeed for Leaders {
            async fn fetch_sides(&self, symbol: &str) -> Result<Vec<PositionSide>, FetchError>;
            async fn fetch_last_price(&self, symbol: &str) -> Result<f64, FetchError>;
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
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

    #[tokio::test]
    async fn crossover_produces_long_signal() {
        let mut feed = MockPrices::new();
        feed.expect_fetch_series()
            .withf(|symbol, _, limit| symbol == "BTCUSDT" && *limit == 0)
            .times(1)
            .returning(|symbol, _, _| {
                Ok(SampleSeries::from_closes(symbol, zigzag(29, 3.0, 2.0)))
            });

        let evaluator = IndicatorEvaluator::crossover(Box::new(feed), RiskProfile::default());
        match evaluator.evaluate("BTCUSDT", now()).await {
            SymbolOutcome::Signal(signal) => {
                assert_eq!(signal.symbol, "BTCUSDT");
                assert_eq!(signal.direction, Direction::Long);
                assert_eq!(signal.entry, 90.0);
                assert!((signal.stop_loss - 88.65).abs() < 1e-9);
                assert_eq!(signal.time, now());
            }
            other => panic!("expected a signal, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn fetch_error_skips_symbol() {
        let mut feed = MockPrices::new();
        feed.expect_fetch_series()
            .returning(|_, _, _| Err(FetchError::Malformed("bad body".to_string())));

        let evaluator = IndicatorEvaluator::crossover(Box::new(feed), RiskProfile::default());
        assert!(matches!(
            evaluator.evaluate("BTCUSDT", now()).await,
            SymbolOutcome::Skipped(SkipReason::Fetch(_))
        ));
    }

    #[tokio::test]
    async fn short_history_skips_symbol() {
        let mut feed = MockPrices::new();
        feed.expect_fetch_series()
            .returning(|symbol, _, _| Ok(SampleSeries::from_closes(symbol, vec![1.0; 30])));

        let evaluator = IndicatorEvaluator::crossover(Box::new(feed), RiskProfile::default());
        assert!(matches!(
            evaluator.evaluate("BTCUSDT", now()).await,
            SymbolOutcome::Skipped(SkipReason::Data(DecisionError::NotEnoughSamples { .. }))
        ));
    }

    #[tokio::test]
    async fn flat_market_has_no_signal() {
        let mut feed = MockPrices::new();
        feed.expect_fetch_series()
            .returning(|symbol, _, _| Ok(SampleSeries::from_closes(symbol, vec![10.0; 80])));

        let evaluator = IndicatorEvaluator::crossover(Box::new(feed), RiskProfile::default());
        assert!(matches!(
            evaluator.evaluate("BTCUSDT", now()).await,
            SymbolOutcome::NoSignal
        ));
    }

    #[tokio::test]
    async fn confirmed_fetches_both_timeframes() {
        let mut feed = MockPrices::new();
        feed.expect_fetch_series()
            .with(eq("SOLUSDT"), eq(SIGNAL_INTERVAL), eq(KLINE_LOOKBACK))
            .times(1)
            .returning(|symbol, _, _| {
                let closes = zigzag(39, 3.0, 0.5);
                let mut volumes = vec![100.0; closes.len() - 1];
                volumes.push(200.0);
                Ok(SampleSeries::with_volumes(symbol, closes, volumes))
            });
        feed.expect_fetch_series()
            .with(eq("SOLUSDT"), eq(TREND_INTERVAL), eq(KLINE_LOOKBACK))
            .times(1)
            .returning(|symbol, _, _| {
                let closes: Vec<f64> = (1..=60).map(|i| i as f64).collect();
                let volumes = vec![1.0; closes.len()];
                Ok(SampleSeries::with_volumes(symbol, closes, volumes))
            });

        let evaluator = IndicatorEvaluator::confirmed(Box::new(feed), RiskProfile::default());
        match evaluator.evaluate("SOLUSDT", now()).await {
            SymbolOutcome::Signal(signal) => {
                assert_eq!(signal.direction, Direction::Long);
                assert!(matches!(
                    signal.readouts,
                    Readouts::Indicators {
                        volume_ok: Some(true),
                        trend: Some(Direction::Long),
                        macd_histogram: Some(_),
                        ..
                    }
                ));
            }
            other => panic!("expected a signal, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn confirmed_skips_when_trend_fetch_fails() {
        let mut feed = MockPrices::new();
        feed.expect_fetch_series()
            .with(eq("BTCUSDT"), eq(SIGNAL_INTERVAL), eq(KLINE_LOOKBACK))
            .returning(|symbol, _, _| {
                Ok(SampleSeries::with_volumes(symbol, vec![1.0; 60], vec![1.0; 60]))
            });
        feed.expect_fetch_series()
            .with(eq("BTCUSDT"), eq(TREND_INTERVAL), eq(KLINE_LOOKBACK))
            .returning(|_, _, _| {
                Err(FetchError::Api {
                    code: -1003,
                    msg: "Too many requests".to_string(),
                })
            });

        let evaluator = IndicatorEvaluator::confirmed(Box::new(feed), RiskProfile::default());
        assert!(matches!(
            evaluator.evaluate("BTCUSDT", now()).await,
            SymbolOutcome::Skipped(SkipReason::Fetch(FetchError::Api { code: -1003, .. }))
        ));
    }

    #[tokio::test]
    async fn leaderboard_majority_uses_last_price() {
        let mut feed = MockLeaders::new();
        feed.expect_fetch_sides().returning(|_| {
            Ok(vec![
                PositionSide::Buy,
                PositionSide::Sell,
                PositionSide::Buy,
                PositionSide::Sell,
                PositionSide::Buy,
            ])
        });
        feed.expect_fetch_last_price()
            .with(eq("BTCUSDT"))
            .times(1)
            .returning(|_| Ok(100.0));

        let evaluator = LeaderboardEvaluator::new(Box::new(feed), RiskProfile::default());
        match evaluator.evaluate("BTCUSDT", now()).await {
            SymbolOutcome::Signal(signal) => {
                assert_eq!(signal.direction, Direction::Long);
                assert_eq!(signal.entry, 100.0);
                assert!((signal.take_profit_1 - 102.5).abs() < 1e-9);
                assert_eq!(
                    signal.readouts,
                    Readouts::Leaderboard {
                        buy_votes: 3,
                        sell_votes: 2,
                        total: 5
                    }
                );
            }
            other => panic!("expected a signal, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn leaderboard_tie_skips_price_lookup() {
        let mut feed = MockLeaders::new();
        feed.expect_fetch_sides().returning(|_| {
            Ok(vec![
                PositionSide::Buy,
                PositionSide::Buy,
                PositionSide::Buy,
                PositionSide::Sell,
                PositionSide::Sell,
                PositionSide::Sell,
            ])
        });
        feed.expect_fetch_last_price().never();

        let evaluator = LeaderboardEvaluator::new(Box::new(feed), RiskProfile::default());
        assert!(matches!(
            evaluator.evaluate("BTCUSDT", now()).await,
            SymbolOutcome::NoSignal
        ));
    }
}
