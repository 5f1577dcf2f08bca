use async_trait::async_trait;
use common::models::{PositionSide, SampleSeries};

use crate::error::FetchError;

/// Converts a decoded wire payload into a domain model for `symbol`.
pub trait RemoteResponse<T> {
    fn to_model(&self, symbol: &str) -> Result<T, FetchError>;
}

/// Source of close (and possibly volume) history.
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Returns up to `limit` samples at `interval` granularity, most recent last.
    /// Feeds without interval selection ignore `interval`.
    async fn fetch_series(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> Result<SampleSeries, FetchError>;
}

/// Source of top-trader positioning for one symbol.
#[async_trait]
pub trait LeaderboardFeed: Send + Sync {
    async fn fetch_sides(&self, symbol: &str) -> Result<Vec<PositionSide>, FetchError>;

    async fn fetch_last_price(&self, symbol: &str) -> Result<f64, FetchError>;
}
