use std::time::Duration;

use async_trait::async_trait;
use common::models::PositionSide;
use reqwest::Client;
use tracing::debug;

use crate::{
    error::FetchError,
    remote::{
        http_client,
        leaderboard_response::{BybitResponse, LeaderEntry, ListResult, TickerEntry},
        read_json,
    },
    traits::{LeaderboardFeed, RemoteResponse},
};

const CATEGORY: &str = "linear";
const DEFAULT_LEADERS: usize = 10;

/// Bybit v5 public client for top-trader positions and last traded price.
#[derive(Clone)]
pub struct BybitClient {
    client: Client,
    base_url: String,
    leaders: usize,
}

impl BybitClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            leaders: DEFAULT_LEADERS,
        })
    }
}

#[async_trait]
impl LeaderboardFeed for BybitClient {
    async fn fetch_sides(&self, symbol: &str) -> Result<Vec<PositionSide>, FetchError> {
        let url = format!("{}/v5/position/leaders", self.base_url);
        let symbol = symbol.to_uppercase();
        let limit = self.leaders.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("category", CATEGORY),
                ("symbol", symbol.as_str()),
                ("limit", limit.as_str()),
            ])
            .send()
            .await?;

        let body: BybitResponse<ListResult<LeaderEntry>> = read_json(response).await?;
        let sides = body.into_result()?.to_model(&symbol)?;
        debug!("{}: {} leaderboard positions", symbol, sides.len());
        Ok(sides)
    }

    async fn fetch_last_price(&self, symbol: &str) -> Result<f64, FetchError> {
        let url = format!("{}/v5/market/tickers", self.base_url);
        let symbol = symbol.to_uppercase();

        let response = self
            .client
            .get(&url)
            .query(&[("category", CATEGORY), ("symbol", symbol.as_str())])
            .send()
            .await?;

        let body: BybitResponse<ListResult<TickerEntry>> = read_json(response).await?;
        body.into_result()?.to_model(&symbol)
    }
}
