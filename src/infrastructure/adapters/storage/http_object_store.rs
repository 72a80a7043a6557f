//! HTTP Object Store - 通过 HTTP 访问远程存储桶
//!
//! 约定：
//! - PUT/GET/HEAD/DELETE `{endpoint}/{bucket}/{key}`
//! - 可选 Bearer token
//! - 404 视为对象不存在

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use std::time::Duration;

use crate::application::ports::{ObjectStoreError, ObjectStorePort};

#[derive(Debug, Clone)]
pub struct HttpObjectStoreConfig {
    pub endpoint: String,
    pub bucket: String,
    pub access_token: Option<String>,
    pub timeout_secs: u64,
}

pub struct HttpObjectStore {
    client: Client,
    config: HttpObjectStoreConfig,
}

impl HttpObjectStore {
    pub fn new(config: HttpObjectStoreConfig) -> Result<Self, ObjectStoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ObjectStoreError::NetworkError(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn object_url(&self, key: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.endpoint.trim_end_matches('/'),
            self.config.bucket.trim_matches('/'),
            key.trim_start_matches('/')
        )
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.access_token {
            Some(token) if !token.is_empty() => request.bearer_auth(token),
            _ => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, ObjectStoreError> {
        self.authorize(request).send().await.map_err(|e| {
            if e.is_timeout() {
                ObjectStoreError::Timeout
            } else {
                ObjectStoreError::NetworkError(e.to_string())
            }
        })
    }

    fn unexpected(status: StatusCode, key: &str) -> ObjectStoreError {
        ObjectStoreError::UnexpectedStatus {
            status: status.as_u16(),
            key: key.to_string(),
        }
    }
}

#[async_trait]
impl ObjectStorePort for HttpObjectStore {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), ObjectStoreError> {
        let size = bytes.len();
        let response = self
            .send(self.client.put(self.object_url(key)).body(bytes))
            .await?;
        if !response.status().is_success() {
            return Err(Self::unexpected(response.status(), key));
        }
        tracing::debug!(key = %key, bytes = size, "Object uploaded");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, ObjectStoreError> {
        let response = self.send(self.client.get(self.object_url(key))).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let bytes = response
                    .bytes()
                    .await
                    .map_err(|e| ObjectStoreError::NetworkError(e.to_string()))?;
                Ok(Some(bytes.to_vec()))
            }
            status => Err(Self::unexpected(status, key)),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, ObjectStoreError> {
        let response = self.send(self.client.head(self.object_url(key))).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => Err(Self::unexpected(status, key)),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), ObjectStoreError> {
        let response = self.send(self.client.delete(self.object_url(key))).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(()),
            status if status.is_success() => Ok(()),
            status => Err(Self::unexpected(status, key)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(endpoint: &str) -> HttpObjectStore {
        HttpObjectStore::new(HttpObjectStoreConfig {
            endpoint: endpoint.to_string(),
            bucket: "/voices/".to_string(),
            access_token: None,
            timeout_secs: 2,
        })
        .unwrap()
    }

    #[test]
    fn test_object_url_normalizes_slashes() {
        let store = store("https://objects.example.com/");
        assert_eq!(
            store.object_url("/abc.bin"),
            "https://objects.example.com/voices/abc.bin"
        );
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_network_error() {
        let store = store("http://127.0.0.1:1");
        let err = store.get("index.json").await.unwrap_err();
        assert!(matches!(err, ObjectStoreError::NetworkError(_) | ObjectStoreError::Timeout));
    }
}
