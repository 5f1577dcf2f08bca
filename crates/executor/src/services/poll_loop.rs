use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::services::evaluator::{SymbolEvaluator, SymbolOutcome};
use crate::services::memo::DirectionMemo;
use crate::services::telegram_service::{Notifier, format_signal};

/// Per-cycle counters, logged after every pass over the symbols.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub evaluated: usize,
    pub signals: usize,
    pub skipped: usize,
    pub sent: usize,
    pub suppressed: usize,
    pub failed: usize,
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "evaluated={} signals={} skipped={} sent={} suppressed={} failed={}",
            self.evaluated, self.signals, self.skipped, self.sent, self.suppressed, self.failed
        )
    }
}

pub struct PollingLoop {
    symbols: Vec<String>,
    evaluator: Box<dyn SymbolEvaluator>,
    notifier: Box<dyn Notifier>,
    memo: DirectionMemo,
    interval: Duration,
}

impl PollingLoop {
    pub fn new(
        symbols: Vec<String>,
        evaluator: Box<dyn SymbolEvaluator>,
        notifier: Box<dyn Notifier>,
        interval: Duration,
    ) -> Self {
        Self {
            symbols,
            evaluator,
            notifier,
            memo: DirectionMemo::new(),
            interval,
        }
    }

    /// Polls forever. Returns only when the process receives Ctrl-C.
    pub async fn run(mut self) {
        info!(
            "Polling {} symbols every {}s",
            self.symbols.len(),
            self.interval.as_secs()
        );

        loop {
            let report = self.run_cycle(Utc::now()).await;
            info!("Cycle finished: {}", report);

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received. Stopping polling loop.");
                    break;
                }
            }
        }
    }

    /// One pass over every symbol. Failures stay local to their symbol.
    ///
    /// The memo is updated before delivery, so a signal whose delivery failed
    /// is not re-sent while the direction stays the same.
    pub async fn run_cycle(&mut self, now: DateTime<Utc>) -> CycleReport {
        let mut report = CycleReport::default();

        for symbol in &self.symbols {
            report.evaluated += 1;

            let signal = match self.evaluator.evaluate(symbol, now).await {
                SymbolOutcome::Signal(signal) => signal,
                SymbolOutcome::NoSignal => {
                    debug!("{}: no signal", symbol);
                    continue;
                }
                SymbolOutcome::Skipped(reason) => {
                    warn!("{}: skipped this cycle: {}", symbol, reason);
                    report.skipped += 1;
                    continue;
                }
            };
            report.signals += 1;

            if !self.memo.update(symbol, signal.direction) {
                debug!("{}: {} unchanged, not notifying", symbol, signal.direction);
                report.suppressed += 1;
                continue;
            }

            match self.notifier.send(&format_signal(&signal)).await {
                Ok(()) => {
                    info!("Sent signal for {} {}", symbol, signal.direction);
                    report.sent += 1;
                }
                Err(e) => {
                    error!("Failed to send signal for {} {}: {}", symbol, signal.direction, e);
                    report.failed += 1;
                }
            }
        }

        report
    }
}
