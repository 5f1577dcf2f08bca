use std::time::Duration;

use reqwest::{Client, Response};
use serde::{Deserialize, de::DeserializeOwned};

use crate::error::FetchError;

pub mod binance_client;
pub mod bybit_client;
pub mod coingecko_client;
pub mod kline_response;
pub mod leaderboard_response;
pub mod market_chart_response;

pub use binance_client::BinanceClient;
pub use bybit_client::BybitClient;
pub use coingecko_client::CoinGeckoClient;

const USER_AGENT: &str = "signal_bot/0.1.0";
const MAX_ERROR_BODY: usize = 256;

pub fn http_client(timeout: Duration) -> Result<Client, FetchError> {
    let client = Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()?;
    Ok(client)
}

/// Error envelope shared by the exchanges we poll (`{code,msg}` on Binance,
/// `{retCode,retMsg}` on Bybit).
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(alias = "retCode")]
    code: i64,
    #[serde(alias = "retMsg")]
    msg: String,
}

/// Checks the status line and decodes the body as `T`.
pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, FetchError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        if let Ok(err) = serde_json::from_str::<ApiErrorBody>(&body) {
            return Err(FetchError::Api {
                code: err.code,
                msg: err.msg,
            });
        }
        let mut body = body;
        if body.len() > MAX_ERROR_BODY {
            let mut cut = MAX_ERROR_BODY;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }
        return Err(FetchError::Status {
            status: status.as_u16(),
            body,
        });
    }

    Ok(serde_json::from_str(&body)?)
}

/// Reads a number that may be sent either as a JSON number or a decimal string.
pub(crate) fn parse_number(value: &serde_json::Value, field: &str) -> Result<f64, FetchError> {
    let parsed = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|v| v.is_finite())
        .ok_or_else(|| FetchError::Malformed(format!("{field} is not a number: {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_string_and_numeric_fields() {
        assert_eq!(parse_number(&json!("101.25"), "close").unwrap(), 101.25);
        assert_eq!(parse_number(&json!(7), "close").unwrap(), 7.0);
        assert!(matches!(
            parse_number(&json!(null), "close"),
            Err(FetchError::Malformed(_))
        ));
        assert!(parse_number(&json!("abc"), "close").is_err());
    }
}
