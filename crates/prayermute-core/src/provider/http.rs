use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use super::{DayRecord, TimeTableProvider};
use crate::error::{ConfigError, CoreError, FetchError, Result};
use crate::prayer::Location;
use crate::storage::ProviderSettings;

/// HTTP client for the Diyanet prayer time mirror.
pub struct HttpTimeTableProvider {
    base_url: Url,
    http_client: Client,
}

impl HttpTimeTableProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let mut base_url = Url::parse(base_url).map_err(|e| ConfigError::InvalidValue {
            key: "provider.base_url".into(),
            message: e.to_string(),
        })?;
        // Url::join drops the last path segment unless it ends with '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoreError::Fetch(FetchError::from(e)))?;
        Ok(Self {
            base_url,
            http_client,
        })
    }

    pub fn from_settings(settings: &ProviderSettings) -> Result<Self> {
        Self::new(&settings.base_url, Duration::from_secs(settings.timeout_secs))
    }

    fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, FetchError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        url.query_pairs_mut().extend_pairs(query);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        debug!(%url, "provider request");
        let body = self
            .http_client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(body)
    }
}

#[async_trait]
impl TimeTableProvider for HttpTimeTableProvider {
    async fn search_locations(&self, query: &str) -> Result<Vec<Location>, FetchError> {
        let url = self.endpoint("api/diyanet/search", &[("q", query)])?;
        self.get_json(url).await
    }

    async fn list_locations(
        &self,
        country: &str,
        city: Option<&str>,
    ) -> Result<Vec<Location>, FetchError> {
        let mut query = vec![("country", country)];
        if let Some(city) = city {
            query.push(("city", city));
        }
        let url = self.endpoint("api/diyanet/locations", &query)?;
        self.get_json(url).await
    }

    async fn prayer_times(&self, location_id: u32) -> Result<Vec<DayRecord>, FetchError> {
        let id = location_id.to_string();
        let url = self.endpoint("api/diyanet/prayertimes", &[("location_id", id.as_str())])?;
        self.get_json(url).await
    }
}
