use common::models::SampleSeries;
use serde::Deserialize;

use crate::{error::FetchError, remote::parse_number, traits::RemoteResponse};

/// CoinGecko `/coins/{id}/market_chart` payload. Each point is `[timestamp_ms, price]`.
#[derive(Debug, Deserialize)]
pub struct MarketChartResponse {
    #[serde(default)]
    pub prices: Vec<Vec<serde_json::Value>>,
}

impl RemoteResponse<SampleSeries> for MarketChartResponse {
    fn to_model(&self, symbol: &str) -> Result<SampleSeries, FetchError> {
        let closes = self
            .prices
            .iter()
            .map(|point| match point.get(1) {
                Some(price) => parse_number(price, "price"),
                None => Err(FetchError::Malformed(
                    "market chart point without price".to_string(),
                )),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SampleSeries::from_closes(symbol, closes))
    }
}
