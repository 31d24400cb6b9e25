// SPDX-License-Identifier: Apache-2.0
//! `ObjectStore` implementation for DigitalOcean Spaces (S3-compatible).

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use reqwest::Client;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::sigv4::{self, Credentials};
use crate::traits::ObjectStore;

/// Configuration for a DigitalOcean Spaces bucket (`spec.md` §6 env vars).
#[derive(Debug, Clone)]
pub struct SpacesConfig {
    /// e.g. `https://nyc3.digitaloceanspaces.com` (`DO_ENDPOINT`).
    pub endpoint: String,
    /// Bucket name (`DO_SPACE_NAME`).
    pub bucket: String,
    /// Access key id (`DO_SPACE_ID`).
    pub access_key: String,
    /// Secret key (`DO_SPACE_KEY`).
    pub secret_key: String,
    /// Region code, derived from the endpoint when not set explicitly.
    pub region: String,
}

impl SpacesConfig {
    #[must_use]
    pub fn host(&self) -> String {
        let bare = self.endpoint.trim_start_matches("https://").trim_start_matches("http://");
        format!("{}.{bare}", self.bucket)
    }
}

/// S3-compatible object store client for DigitalOcean Spaces.
pub struct SpacesObjectStore {
    config: SpacesConfig,
    client: Client,
}

impl SpacesObjectStore {
    #[must_use]
    pub fn new(config: SpacesConfig, client: Client) -> Self {
        Self { config, client }
    }

    fn creds(&self) -> Credentials {
        Credentials { access_key: self.config.access_key.clone(), secret_key: self.config.secret_key.clone(), region: self.config.region.clone() }
    }

    fn canonical_uri(&self, key: &str) -> String {
        format!("/{}", key.split('/').map(urlencoding::encode).collect::<Vec<_>>().join("/"))
    }
}

#[async_trait]
impl ObjectStore for SpacesObjectStore {
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<(), StoreError> {
        let host = self.config.host();
        let uri = self.canonical_uri(key);
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let payload_hash = hex::encode(hasher.finalize());
        let now = Utc::now();
        let (authorization, amz_date, _) = sigv4::sign_request(&self.creds(), "PUT", &host, &uri, &payload_hash, now)?;

        let url = format!("https://{host}{uri}");
        debug!(%key, %url, "putting object");
        let resp = self
            .client
            .put(url)
            .header("host", host)
            .header("x-amz-date", amz_date)
            .header("x-amz-content-sha256", &payload_hash)
            .header("authorization", authorization)
            .header("content-type", content_type)
            .body(bytes)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            warn!(%key, status, "object store put failed");
            return Err(StoreError::UpstreamStatus { status, body });
        }
        Ok(())
    }

    async fn head(&self, key: &str) -> Result<bool, StoreError> {
        let host = self.config.host();
        let uri = self.canonical_uri(key);
        let empty_hash = hex::encode(Sha256::digest(b""));
        let now = Utc::now();
        let (authorization, amz_date, _) = sigv4::sign_request(&self.creds(), "HEAD", &host, &uri, &empty_hash, now)?;

        let url = format!("https://{host}{uri}");
        let resp = self
            .client
            .head(url)
            .header("host", host)
            .header("x-amz-date", amz_date)
            .header("x-amz-content-sha256", &empty_hash)
            .header("authorization", authorization)
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(false);
        }
        if !resp.status().is_success() {
            return Err(StoreError::UpstreamStatus { status: resp.status().as_u16(), body: String::new() });
        }
        Ok(true)
    }

    async fn get(&self, key: &str) -> Result<Bytes, StoreError> {
        let host = self.config.host();
        let uri = self.canonical_uri(key);
        let empty_hash = hex::encode(Sha256::digest(b""));
        let now = Utc::now();
        let (authorization, amz_date, _) = sigv4::sign_request(&self.creds(), "GET", &host, &uri, &empty_hash, now)?;

        let url = format!("https://{host}{uri}");
        let resp = self
            .client
            .get(url)
            .header("host", host)
            .header("x-amz-date", amz_date)
            .header("x-amz-content-sha256", &empty_hash)
            .header("authorization", authorization)
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(key.to_string()));
        }
        if !resp.status().is_success() {
            return Err(StoreError::UpstreamStatus { status: resp.status().as_u16(), body: String::new() });
        }
        Ok(resp.bytes().await?)
    }

    fn signed_get_url(&self, key: &str, ttl: Duration) -> Result<String, StoreError> {
        let host = self.config.host();
        let uri = self.canonical_uri(key);
        sigv4::presign_get_url(&self.creds(), &host, &uri, Utc::now(), ttl.as_secs())
    }
}
