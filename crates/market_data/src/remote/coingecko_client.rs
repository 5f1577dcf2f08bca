use std::time::Duration;

use async_trait::async_trait;
use common::models::SampleSeries;
use reqwest::Client;
use tracing::debug;

use crate::{
    error::FetchError,
    remote::{http_client, market_chart_response::MarketChartResponse, read_json},
    traits::{PriceFeed, RemoteResponse},
};

const VS_CURRENCY: &str = "usd";
const DEFAULT_DAYS: u32 = 1;

/// Maps an exchange-style ticker to its CoinGecko coin id.
pub fn coin_id(symbol: &str) -> Option<&'static str> {
    let id = match symbol.to_uppercase().as_str() {
        "BTCUSDT" => "bitcoin",
        "ETHUSDT" => "ethereum",
        "SOLUSDT" => "solana",
        "BNBUSDT" => "binancecoin",
        "XRPUSDT" => "ripple",
        "ADAUSDT" => "cardano",
        "DOGEUSDT" => "dogecoin",
        "AVAXUSDT" => "avalanche-2",
        _ => return None,
    };
    Some(id)
}

/// CoinGecko price history client. The API picks the sample granularity from
/// the requested number of days (5 minutes for one day), so `interval` is unused.
#[derive(Clone)]
pub struct CoinGeckoClient {
    client: Client,
    base_url: String,
    days: u32,
}

impl CoinGeckoClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            days: DEFAULT_DAYS,
        })
    }
}

#[async_trait]
impl PriceFeed for CoinGeckoClient {
    async fn fetch_series(
        &self,
        symbol: &str,
        _interval: &str,
        limit: usize,
    ) -> Result<SampleSeries, FetchError> {
        let id = coin_id(symbol).ok_or_else(|| FetchError::UnknownSymbol(symbol.to_string()))?;
        let url = format!("{}/coins/{}/market_chart", self.base_url, id);
        let days = self.days.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[("vs_currency", VS_CURRENCY), ("days", days.as_str())])
            .send()
            .await?;

        let chart: MarketChartResponse = read_json(response).await?;
        let mut series = chart.to_model(&symbol.to_uppercase())?;

        if limit > 0 && series.closes.len() > limit {
            let excess = series.closes.len() - limit;
            series.closes.drain(..excess);
        }

        debug!("{}: fetched {} prices from {}", series.symbol, series.len(), id);
        Ok(series)
    }
}
