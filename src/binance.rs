use crate::error::ChronosError;
use crate::models::Candle;
use chrono::{TimeZone, Utc};
use log::debug;
use reqwest::blocking::Client;
use serde_json::Value;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Minimum positional fields per kline row: open time plus OHLCV.
const KLINE_FIELDS: usize = 6;

/// Thin client for the exchange's public spot kline endpoint. One blocking
/// request per call, fixed timeout, no retry and no pagination.
pub struct ExchangeClient {
    http: Client,
    endpoint: String,
}

impl ExchangeClient {
    pub fn new(endpoint: &str) -> Result<Self, ChronosError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    /// Downloads `limit` bars of `interval` kline data for `symbol` and
    /// normalizes them into the fixed candle columns. Any non-2xx status
    /// surfaces as [`ChronosError::RemoteFetch`] with the response body.
    pub fn fetch_klines(
        &self,
        symbol: &str,
        interval: &str,
        limit: u32,
    ) -> Result<Vec<Candle>, ChronosError> {
        debug!("GET {} symbol={symbol} interval={interval} limit={limit}", self.endpoint);
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("symbol", symbol),
                ("interval", interval),
                ("limit", &limit.to_string()),
            ])
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ChronosError::RemoteFetch { status, body });
        }

        let payload: Value = response.json()?;
        parse_klines(&payload)
    }
}

/// Parses the exchange payload: a JSON array of arrays, each with at least
/// six positional fields `[open_time_ms, open, high, low, close, volume,
/// ...]`. Extra fields are discarded; prices arrive as JSON strings and are
/// coerced to floats. Rows come back ordered by open time with duplicates
/// collapsed, keeping the first occurrence.
pub fn parse_klines(payload: &Value) -> Result<Vec<Candle>, ChronosError> {
    let rows = payload.as_array().ok_or_else(|| {
        ChronosError::InvalidResponse("expected a JSON array of kline rows".to_string())
    })?;

    let mut candles = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        let fields = row.as_array().filter(|f| f.len() >= KLINE_FIELDS).ok_or_else(|| {
            ChronosError::InvalidResponse(format!(
                "row {index} does not carry {KLINE_FIELDS} positional fields"
            ))
        })?;

        let open_time_ms = fields[0].as_i64().ok_or_else(|| {
            ChronosError::InvalidResponse(format!("row {index} open time is not an integer"))
        })?;
        let open_time = Utc.timestamp_millis_opt(open_time_ms).single().ok_or_else(|| {
            ChronosError::InvalidResponse(format!(
                "row {index} open time {open_time_ms} is out of range"
            ))
        })?;

        candles.push(Candle {
            open_time,
            open: numeric_field(&fields[1], index, "open")?,
            high: numeric_field(&fields[2], index, "high")?,
            low: numeric_field(&fields[3], index, "low")?,
            close: numeric_field(&fields[4], index, "close")?,
            volume: numeric_field(&fields[5], index, "volume")?,
        });
    }

    candles.sort_by_key(|candle| candle.open_time);
    candles.dedup_by_key(|candle| candle.open_time);
    Ok(candles)
}

fn numeric_field(value: &Value, row: usize, name: &str) -> Result<f64, ChronosError> {
    if let Some(number) = value.as_f64() {
        if number.is_finite() {
            return Ok(number);
        }
    }
    if let Some(text) = value.as_str() {
        if let Ok(parsed) = text.trim().parse::<f64>() {
            if parsed.is_finite() {
                return Ok(parsed);
            }
        }
    }
    Err(ChronosError::InvalidResponse(format!(
        "row {row} field `{name}` is not numeric: {value}"
    )))
}
