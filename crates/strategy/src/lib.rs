//! Indicator math and the rules that turn it into trade signals.
//!
//! Everything here is pure: no I/O, no clocks, no shared state.

pub mod decision;
pub mod indicators;
pub mod leaderboard;
pub mod risk;

pub use decision::{DecisionError, Evaluation, Filters, SignalRules};
pub use leaderboard::VoteTally;
pub use risk::{Levels, build_signal};
