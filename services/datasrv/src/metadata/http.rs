//! HTTP client for the manager service
//!
//! Endpoints, relative to the configured base URL:
//! - `GET /device/id/{id}`
//! - `GET /point/device_id/{id}`
//! - `GET /point/id/{id}`
//!
//! Responses use the `{success, data}` envelope. HTTP 404 and
//! `success: false` both mean the entity does not exist.

use super::MetadataLookup;
use async_trait::async_trait;
use errors::{DataError, DataResult};
use point_model::{Device, Point};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    data: Option<T>,
}

#[derive(Debug, Clone)]
pub struct HttpMetadataClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpMetadataClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> DataResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DataError::Configuration(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str, resource: String) -> DataResult<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(DataError::not_found(resource));
        }
        let response = response.error_for_status()?;
        let envelope: Envelope<T> = response.json().await?;

        match envelope {
            Envelope {
                success: true,
                data: Some(data),
            } => Ok(data),
            _ => Err(DataError::not_found(resource)),
        }
    }
}

#[async_trait]
impl MetadataLookup for HttpMetadataClient {
    async fn get_device(&self, device_id: u64) -> DataResult<Device> {
        self.fetch(
            &format!("/device/id/{}", device_id),
            format!("device {}", device_id),
        )
        .await
    }

    async fn get_points_by_device(&self, device_id: u64) -> DataResult<Vec<Point>> {
        match self
            .fetch(
                &format!("/point/device_id/{}", device_id),
                format!("points of device {}", device_id),
            )
            .await
        {
            Err(DataError::NotFound { .. }) => Ok(Vec::new()),
            other => other,
        }
    }

    async fn get_point(&self, point_id: u64) -> DataResult<Point> {
        self.fetch(
            &format!("/point/id/{}", point_id),
            format!("point {}", point_id),
        )
        .await
    }
}
