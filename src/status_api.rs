use crate::{
    http_client::{build_url, handle_http_response, status_client},
    types::{DoorList, PollResult},
};
use anyhow::{Context, Result};
use log::debug;
#[cfg(any(test, feature = "mock"))]
use mockall::automock;
use reqwest::{Client, Url};
use trait_variant::make;

/// Source of doorbell availability and door listings
#[make(Send)]
#[cfg_attr(any(test, feature = "mock"), automock)]
pub trait StatusApi {
    async fn poll(&self) -> Result<PollResult>;
    async fn list_doors(&self) -> Result<DoorList>;
}

/// [`StatusApi`] backed by a running status service
#[derive(Clone)]
pub struct HttpStatusApi {
    client: Client,
    base_url: Url,
}

impl HttpStatusApi {
    const POLL_ENDPOINT: &str = "/api/v1/poll";
    const DOORS_ENDPOINT: &str = "/api/v1/doors";

    pub fn new(base_url: Url) -> Result<Self> {
        Ok(Self {
            client: status_client()?,
            base_url,
        })
    }

    async fn get(&self, path: &str) -> Result<String> {
        let url = build_url(&self.base_url, path)?;
        debug!("GET {url}");

        let res = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("failed to send GET request to {url}"))?;

        handle_http_response(res, &format!("GET {url}")).await
    }
}

impl StatusApi for HttpStatusApi {
    async fn poll(&self) -> Result<PollResult> {
        let body = self.get(Self::POLL_ENDPOINT).await?;
        serde_json::from_str(&body).context("failed to parse poll response")
    }

    async fn list_doors(&self) -> Result<DoorList> {
        let body = self.get(Self::DOORS_ENDPOINT).await?;
        serde_json::from_str(&body).context("failed to parse doors response")
    }
}
