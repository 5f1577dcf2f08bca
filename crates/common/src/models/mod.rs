pub mod leaderboard;
pub mod series;
pub mod signal;

pub use leaderboard::PositionSide;
pub use series::SampleSeries;
pub use signal::{Direction, Readouts, Signal};
