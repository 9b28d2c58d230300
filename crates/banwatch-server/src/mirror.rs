//! Remote mirror client
//!
//! Inserts JSON records into a REST-accessible collection:
//! `POST {base_url}/rest/v1/{collection}` authenticated with the same key as
//! `apikey` header and bearer token. One attempt per call, no retries.

use std::time::Duration;

use banwatch_core::RemoteConfig;
use serde::Serialize;

use crate::error::MirrorError;

#[derive(Debug, Clone)]
pub struct RemoteMirror {
    client: reqwest::Client,
    base_url: String,
    key: String,
}

impl RemoteMirror {
    pub fn new(
        base_url: impl Into<String>,
        key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, MirrorError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            key: key.into(),
        })
    }

    /// Build a mirror from config, `None` in local-only mode
    pub fn from_config(config: &RemoteConfig) -> Result<Option<Self>, MirrorError> {
        match config.credentials() {
            Some((url, key)) => {
                Self::new(url, key, Duration::from_secs(config.timeout_secs)).map(Some)
            }
            None => Ok(None),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn collection_url(&self, collection: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, collection)
    }

    /// Insert a record, returning the remote response body on success
    pub async fn insert<T: Serialize + ?Sized>(
        &self,
        collection: &str,
        record: &T,
    ) -> Result<String, MirrorError> {
        let url = self.collection_url(collection);

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .json(record)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            tracing::debug!(%url, status = status.as_u16(), "Remote insert rejected");
            return Err(MirrorError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }
}

/// Ban event record sent to the ban collection
#[derive(Debug, Clone, Serialize)]
pub struct BanRecord {
    pub ip: String,
    pub time: String,
}

impl BanRecord {
    pub fn now(ip: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            time: banwatch_core::now_iso8601(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_url_strips_trailing_slash() {
        let mirror = RemoteMirror::new("https://remote.test/", "k", Duration::from_secs(1)).unwrap();
        assert_eq!(mirror.base_url(), "https://remote.test");
        assert_eq!(
            mirror.collection_url("banlist"),
            "https://remote.test/rest/v1/banlist"
        );
    }

    #[test]
    fn test_from_config_local_only() {
        let mirror = RemoteMirror::from_config(&RemoteConfig::disabled()).unwrap();
        assert!(mirror.is_none());

        let config = RemoteConfig::disabled().with_credentials("https://remote.test", "k");
        assert!(RemoteMirror::from_config(&config).unwrap().is_some());
    }
}
