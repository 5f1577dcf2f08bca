use std::time::Duration;

use async_trait::async_trait;
use common::models::SampleSeries;
use reqwest::Client;
use tracing::{debug, warn};

use crate::{
    error::FetchError,
    remote::{http_client, kline_response::KlinesResponse, read_json},
    traits::{PriceFeed, RemoteResponse},
};

const WEIGHT_HEADER: &str = "x-mbx-used-weight-1m";
const WEIGHT_WARN_LEVEL: u32 = 1000;

/// Public Binance spot REST client. Klines only, no signed endpoints.
#[derive(Clone)]
pub struct BinanceClient {
    client: Client,
    base_url: String,
}

impl BinanceClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn log_used_weight(response: &reqwest::Response) {
        let Some(used_weight) = response
            .headers()
            .get(WEIGHT_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u32>().ok())
        else {
            return;
        };

        if used_weight > WEIGHT_WARN_LEVEL {
            warn!("High API weight usage: {}", used_weight);
        } else {
            debug!("Used weights: {}/1200", used_weight);
        }
    }
}

#[async_trait]
impl PriceFeed for BinanceClient {
    async fn fetch_series(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> Result<SampleSeries, FetchError> {
        let url = format!("{}/api/v3/klines", self.base_url);
        let symbol = symbol.to_uppercase();
        let limit = limit.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("symbol", symbol.as_str()),
                ("interval", interval),
                ("limit", limit.as_str()),
            ])
            .send()
            .await?;

        Self::log_used_weight(&response);

        let klines: KlinesResponse = read_json(response).await?;
        let series = klines.to_model(&symbol)?;
        debug!("{} {}: fetched {} klines", symbol, interval, series.len());
        Ok(series)
    }
}
