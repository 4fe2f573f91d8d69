//! ESIOS indicator client.
//!
//! Retrieves electricity demand indicators from the Spanish system operator's
//! ESIOS API. Requires an API token; see <https://www.esios.ree.es>.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use loadcast_core::{LoadcastError, Observation};

const DEFAULT_BASE_URL: &str = "https://api.esios.ree.es/indicators/";

/// ESIOS indicator fetcher.
pub struct EsiosClient {
    /// ESIOS API token (typically from the `ESIOS_API_KEY` env var).
    api_key: String,
    /// Base URL for the indicators endpoint.
    base_url: String,
}

impl EsiosClient {
    /// Create a new client with the given API token.
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Override the endpoint base URL (used for tests against a local stub).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// Fetch one indicator's values over a date range, sorted ascending.
    ///
    /// An empty payload is not an error; it is logged and yields an empty
    /// vector. Entries with unparseable timestamps or missing values are
    /// dropped with a warning.
    pub fn fetch_indicator(
        &self,
        indicator_id: u32,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Observation>> {
        if self.api_key.is_empty() {
            return Err(LoadcastError::Config(
                "no ESIOS token set; export ESIOS_API_KEY before fetching".into(),
            )
            .into());
        }

        let url = format!("{}{}", self.base_url, indicator_id);
        info!(indicator_id, start = %start, end = %end, "fetching indicator");
        let response = ureq::get(&url)
            .set("Accept", "application/json")
            .set("Content-Type", "application/json")
            .set("x-api-key", &self.api_key)
            .query("start_date", &start.to_rfc3339())
            .query("end_date", &end.to_rfc3339())
            .call()
            .context("calling ESIOS API")?;

        if response.status() != 200 {
            return Err(anyhow!("ESIOS API returned status {}", response.status()));
        }

        let body: serde_json::Value = response
            .into_json()
            .context("parsing ESIOS JSON response")?;

        let series = parse_indicator_payload(&body);
        if series.is_empty() {
            warn!(indicator_id, "empty payload from ESIOS");
        }
        Ok(series)
    }
}

/// Extract observations from an ESIOS indicator payload.
///
/// The payload shape is `{"indicator": {"values": [{"datetime": ..,
/// "value": ..}, ..]}}`. Malformed entries are skipped with a warning.
pub fn parse_indicator_payload(body: &serde_json::Value) -> Vec<Observation> {
    let mut out = Vec::new();
    let mut dropped = 0usize;
    if let Some(values) = body["indicator"]["values"].as_array() {
        for item in values {
            let timestamp = item["datetime"]
                .as_str()
                .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
                .map(|dt| dt.with_timezone(&Utc));
            let value = item["value"].as_f64();
            match (timestamp, value) {
                (Some(timestamp), Some(value)) => out.push(Observation { timestamp, value }),
                _ => dropped += 1,
            }
        }
    }
    if dropped > 0 {
        warn!(dropped, "skipped malformed indicator entries");
    }
    out.sort_by_key(|obs| obs.timestamp);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn client_keeps_token_and_default_url() {
        let client = EsiosClient::new("secret".to_string());
        assert_eq!(client.api_key, "secret");
        assert_eq!(client.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn missing_token_is_a_config_error() {
        let client = EsiosClient::new(String::new());
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let err = client
            .fetch_indicator(1293, start, start + chrono::Duration::days(1))
            .unwrap_err();
        assert!(err.to_string().contains("ESIOS token"));
    }

    #[test]
    fn payload_parses_and_sorts_values() {
        let body = json!({
            "indicator": {
                "values": [
                    {"datetime": "2024-01-01T02:00:00+00:00", "value": 22.0},
                    {"datetime": "2024-01-01T00:00:00+00:00", "value": 20.0},
                    {"datetime": "2024-01-01T01:00:00+01:00", "value": 21.0}
                ]
            }
        });
        let series = parse_indicator_payload(&body);
        assert_eq!(series.len(), 3);
        assert_eq!(series[0].value, 20.0);
        // +01:00 entry normalizes to 00:00 UTC, tied with the first one.
        assert_eq!(
            series[2].timestamp,
            Utc.with_ymd_and_hms(2024, 1, 1, 2, 0, 0).unwrap()
        );
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let body = json!({
            "indicator": {
                "values": [
                    {"datetime": "garbage", "value": 1.0},
                    {"datetime": "2024-01-01T00:00:00+00:00"},
                    {"datetime": "2024-01-01T01:00:00+00:00", "value": 5.0}
                ]
            }
        });
        let series = parse_indicator_payload(&body);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].value, 5.0);
    }

    #[test]
    fn empty_payload_yields_empty_series() {
        assert!(parse_indicator_payload(&json!({})).is_empty());
        assert!(parse_indicator_payload(&json!({"indicator": {"values": []}})).is_empty());
    }
}
