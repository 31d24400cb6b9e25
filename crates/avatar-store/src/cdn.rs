// SPDX-License-Identifier: Apache-2.0
//! `CdnClient` implementation: plain HTTP GET against the part-sprite CDN
//! (`spec.md` §4.2, §6 `DO_SPACE_ENDPOINT`).

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use tracing::debug;

use crate::error::StoreError;
use crate::traits::CdnClient;

/// Fetches `<endpoint>/item-sprite/<item_ref>.webp`.
pub struct HttpCdnClient {
    endpoint: String,
    client: Client,
}

impl HttpCdnClient {
    #[must_use]
    pub fn new(endpoint: impl Into<String>, client: Client) -> Self {
        Self { endpoint: endpoint.into(), client }
    }
}

#[async_trait]
impl CdnClient for HttpCdnClient {
    async fn fetch_part(&self, item_ref: &str) -> Result<Bytes, StoreError> {
        let encoded = urlencoding::encode(item_ref);
        let url = format!("{}/item-sprite/{encoded}.webp", self.endpoint.trim_end_matches('/'));
        debug!(%item_ref, %url, "fetching part sprite");
        let resp = self.client.get(&url).send().await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(item_ref.to_string()));
        }
        if !resp.status().is_success() {
            return Err(StoreError::UpstreamStatus { status: resp.status().as_u16(), body: String::new() });
        }
        Ok(resp.bytes().await?)
    }
}
