use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

/// Capability interface for forward geocoding, so handlers never depend on a
/// concrete provider. Returns `(longitude, latitude)` of the best match, or
/// `None` when the address resolves to nothing.
#[async_trait]
pub trait GeocodeProvider: Send + Sync {
    /// Resolve a free-text address to coordinates.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is unreachable or responds with a
    /// non-success status.
    async fn lookup(&self, address: &str) -> anyhow::Result<Option<(f64, f64)>>;
}

/// Mapbox forward-geocoding client (`mapbox.places` endpoint).
pub struct MapboxGeocoder {
    client: reqwest::Client,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct GeocodeResponse {
    features: Vec<Feature>,
}

#[derive(Deserialize)]
struct Feature {
    /// Best-match coordinates as `[longitude, latitude]`.
    center: Vec<f64>,
}

impl MapboxGeocoder {
    /// Build a geocoder with a bounded request timeout. An absent API key is
    /// tolerated; lookups then resolve to `None` with a warning.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(api_key: Option<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build geocoding client: {e}"))?;
        Ok(Self { client, api_key })
    }
}

#[async_trait]
impl GeocodeProvider for MapboxGeocoder {
    async fn lookup(&self, address: &str) -> anyhow::Result<Option<(f64, f64)>> {
        let Some(ref api_key) = self.api_key else {
            tracing::warn!("MAPBOX_API_KEY not configured, skipping geocoding");
            return Ok(None);
        };

        let url = format!(
            "https://api.mapbox.com/geocoding/v5/mapbox.places/{}.json?access_token={api_key}",
            urlencoding::encode(address)
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("Geocoding request failed: {e}"))?
            .error_for_status()
            .map_err(|e| anyhow::anyhow!("Geocoding provider returned an error: {e}"))?;

        let body: GeocodeResponse = response
            .json()
            .await
            .map_err(|e| anyhow::anyhow!("Invalid geocoding response: {e}"))?;

        let coords = body.features.first().and_then(|f| {
            match (f.center.first(), f.center.get(1)) {
                (Some(&lng), Some(&lat)) => Some((lng, lat)),
                _ => None,
            }
        });

        Ok(coords)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_api_key_yields_none() {
        let geocoder = MapboxGeocoder::new(None).unwrap_or_else(|_| MapboxGeocoder {
            client: reqwest::Client::new(),
            api_key: None,
        });
        let result = geocoder.lookup("123 Main St").await.unwrap_or(Some((1.0, 1.0)));
        assert_eq!(result, None);
    }
}
