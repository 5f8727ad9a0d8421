//! Country, state and city lookup over the public REST API.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use common::{with_cancel, AppError, AppResult, GeoConfig};

const COUNTRIES_FETCH: &str = "Countries Fetch";
const STATES_FETCH: &str = "States Fetch";
const CITIES_FETCH: &str = "Cities Fetch";

/// Response wrapper used by every endpoint
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    error: bool,
    #[serde(default)]
    msg: String,
    data: T,
}

#[derive(Debug, Deserialize)]
struct CountryPosition {
    name: String,
}

#[derive(Debug, Deserialize)]
struct CountryStates {
    states: Vec<State>,
}

/// State or province of a country
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    pub name: String,
    pub state_code: String,
}

#[derive(Debug, Serialize)]
struct StatesRequest<'a> {
    country: &'a str,
}

#[derive(Debug, Serialize)]
struct CitiesRequest<'a> {
    country: &'a str,
    state: &'a str,
}

#[derive(Clone)]
pub struct GeoLookup {
    client: reqwest::Client,
    config: GeoConfig,
}

impl GeoLookup {
    pub fn new(config: GeoConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    /// Names of every country
    pub async fn countries(&self, cancel: &CancellationToken) -> AppResult<Vec<String>> {
        let request = self.client.get(&self.config.countries_url);
        let positions: Vec<CountryPosition> =
            with_cancel(cancel, fetch(request, COUNTRIES_FETCH)).await?;
        Ok(positions.into_iter().map(|c| c.name).collect())
    }

    pub async fn states(&self, country: &str, cancel: &CancellationToken) -> AppResult<Vec<State>> {
        let request = self
            .client
            .post(&self.config.states_url)
            .json(&StatesRequest { country });
        let data: CountryStates = with_cancel(cancel, fetch(request, STATES_FETCH)).await?;
        Ok(data.states)
    }

    pub async fn cities(
        &self,
        country: &str,
        state: &str,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<String>> {
        let request = self
            .client
            .post(&self.config.cities_url)
            .json(&CitiesRequest { country, state });
        with_cancel(cancel, fetch(request, CITIES_FETCH)).await
    }
}

/// Send `request` and unwrap the envelope; every failure becomes `External(name)`
async fn fetch<T: DeserializeOwned>(request: reqwest::RequestBuilder, name: &str) -> AppResult<T> {
    let failed = |reason: String| {
        warn!(lookup = name, %reason, "Geo lookup failed");
        AppError::external(name)
    };

    let response = request.send().await.map_err(|e| failed(e.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(failed(format!("status {}", status)));
    }

    let envelope: Envelope<T> = response.json().await.map_err(|e| failed(e.to_string()))?;
    if envelope.error {
        return Err(failed(envelope.msg));
    }
    Ok(envelope.data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_decoding() {
        let body = r#"{"error":false,"msg":"ok","data":{"name":"India","iso3":"IND",
            "states":[{"name":"Goa","state_code":"GA"}]}}"#;
        let envelope: Envelope<CountryStates> = serde_json::from_str(body).unwrap();
        assert_eq!(
            envelope.data.states,
            vec![State {
                name: "Goa".to_string(),
                state_code: "GA".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_external_error() {
        let geo = GeoLookup::new(GeoConfig {
            countries_url: "http://127.0.0.1:9/countries".to_string(),
            timeout_ms: 500,
            ..GeoConfig::default()
        })
        .unwrap();

        let err = geo.countries(&CancellationToken::new()).await.unwrap_err();
        assert_eq!(err, AppError::external("Countries Fetch"));
        assert_eq!(err.code(), "Unknown/Default");
    }
}
