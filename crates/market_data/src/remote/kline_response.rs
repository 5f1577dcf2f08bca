use common::models::SampleSeries;
use serde::Deserialize;

use crate::{error::FetchError, remote::parse_number, traits::RemoteResponse};

const CLOSE_INDEX: usize = 4;
const VOLUME_INDEX: usize = 5;

/// Binance `/api/v3/klines` payload: one array per candle,
/// `[open_time, open, high, low, close, volume, close_time, ...]`.
#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub struct KlinesResponse {
    pub rows: Vec<Vec<serde_json::Value>>,
}

impl RemoteResponse<SampleSeries> for KlinesResponse {
    fn to_model(&self, symbol: &str) -> Result<SampleSeries, FetchError> {
        let mut closes = Vec::with_capacity(self.rows.len());
        let mut volumes = Vec::with_capacity(self.rows.len());

        for (i, row) in self.rows.iter().enumerate() {
            let (Some(close), Some(volume)) = (row.get(CLOSE_INDEX), row.get(VOLUME_INDEX)) else {
                return Err(FetchError::Malformed(format!(
                    "kline {i} has {} fields, expected at least {}",
                    row.len(),
                    VOLUME_INDEX + 1
                )));
            };
            closes.push(parse_number(close, "close")?);
            volumes.push(parse_number(volume, "volume")?);
        }

        Ok(SampleSeries::with_volumes(symbol, closes, volumes))
    }
}
