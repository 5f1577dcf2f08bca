use common::models::PositionSide;
use serde::Deserialize;
use tracing::debug;

use crate::{error::FetchError, remote::parse_number, traits::RemoteResponse};

/// Bybit v5 envelope. `result` is only meaningful when `ret_code` is zero.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BybitResponse<T> {
    pub ret_code: i64,
    #[serde(default)]
    pub ret_msg: String,
    pub result: Option<T>,
}

impl<T> BybitResponse<T> {
    pub fn into_result(self) -> Result<T, FetchError> {
        if self.ret_code != 0 {
            return Err(FetchError::Api {
                code: self.ret_code,
                msg: self.ret_msg,
            });
        }
        self.result
            .ok_or_else(|| FetchError::Malformed("response without result".to_string()))
    }
}

#[derive(Debug, Deserialize)]
pub struct ListResult<T> {
    #[serde(default = "Vec::new")]
    pub list: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub struct LeaderEntry {
    #[serde(default)]
    pub side: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerEntry {
    pub symbol: String,
    pub last_price: serde_json::Value,
}

impl RemoteResponse<Vec<PositionSide>> for ListResult<LeaderEntry> {
    fn to_model(&self, symbol: &str) -> Result<Vec<PositionSide>, FetchError> {
        let sides = self
            .list
            .iter()
            .filter_map(|entry| match entry.side.parse::<PositionSide>() {
                Ok(side) => Some(side),
                Err(e) => {
                    debug!("{}: ignoring leaderboard entry: {}", symbol, e);
                    None
                }
            })
            .collect();
        Ok(sides)
    }
}

impl RemoteResponse<f64> for ListResult<TickerEntry> {
    fn to_model(&self, symbol: &str) -> Result<f64, FetchError> {
        let ticker = self
            .list
            .iter()
            .find(|t| t.symbol.eq_ignore_ascii_case(symbol))
            .ok_or_else(|| FetchError::Malformed(format!("no ticker for {symbol}")))?;
        parse_number(&ticker.last_price, "lastPrice")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn non_zero_ret_code_is_an_api_error() {
        let response: BybitResponse<ListResult<LeaderEntry>> = serde_json::from_value(json!({
            "retCode": 10001,
            "retMsg": "params error",
            "result": {}
        }))
        .unwrap();

        match response.into_result() {
            Err(FetchError::Api { code, msg }) => {
                assert_eq!(code, 10001);
                assert_eq!(msg, "params error");
            }
            other => panic!("expected api error, got {other:?}"),
        }
    }

    #[test]
    fn unknown_sides_are_not_votes() {
        let response: BybitResponse<ListResult<LeaderEntry>> = serde_json::from_value(json!({
            "retCode": 0,
            "retMsg": "OK",
            "result": {"list": [{"side": "Buy"}, {"side": "Sell"}, {"side": "None"}, {}]}
        }))
        .unwrap();

        let sides = response.into_result().unwrap().to_model("BTCUSDT").unwrap();
        assert_eq!(sides, vec![PositionSide::Buy, PositionSide::Sell]);
    }

    #[test]
    fn ticker_price_is_matched_by_symbol() {
        let result: ListResult<TickerEntry> = serde_json::from_value(json!({
            "list": [{"symbol": "BTCUSDT", "lastPrice": "64000.10"}]
        }))
        .unwrap();

        assert_eq!(result.to_model("btcusdt").unwrap(), 64000.10);
        assert!(result.to_model("ETHUSDT").is_err());
    }
}
