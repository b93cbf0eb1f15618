use crate::{
    config::DoorbellConfig,
    device::{self, PROBE_TIMEOUT},
    status_api::StatusApi,
    types::{DoorList, PollResult},
    viper::ViperClient,
};
use anyhow::{Context, Result, ensure};
use log::{debug, info, warn};
#[cfg(any(test, feature = "mock"))]
use mockall::automock;
use serde_json::Value;
use std::time::Duration;
use trait_variant::make;

/// Access to the intercom as needed by the status service
#[make(Send)]
#[cfg_attr(any(test, feature = "mock"), automock)]
pub trait DoorbellClient {
    /// Whether the intercom currently accepts connections
    async fn available(&self) -> bool;
    /// The intercom's `vip` configuration, which describes its doors
    async fn doors(&self) -> Result<Value>;
}

#[derive(Clone, Debug)]
pub struct ViperDoorbell {
    address: String,
    token: String,
}

impl ViperDoorbell {
    const ADDRESSBOOKS: &str = "all";

    pub fn new(config: &DoorbellConfig) -> Self {
        Self {
            address: config.address(),
            token: config.token.clone(),
        }
    }
}

impl DoorbellClient for ViperDoorbell {
    async fn available(&self) -> bool {
        device::probe(&self.address, PROBE_TIMEOUT).await
    }

    async fn doors(&self) -> Result<Value> {
        let mut client = ViperClient::connect(&self.address).await?;

        let result = async {
            client.ensure_authorized(&self.token).await?;
            let config = client.configuration(Self::ADDRESSBOOKS).await?;
            Ok::<_, anyhow::Error>(config["vip"].clone())
        }
        .await;

        if let Err(e) = client.shutdown().await {
            warn!("failed to close doorbell connection: {e:#}");
        }

        result
    }
}

/// Wait for the intercom at `address` to come up, then register `email`
///
/// Returns the new user token. The device is probed every `retry_interval`
/// until it accepts connections.
pub async fn sign_up(address: &str, email: &str, retry_interval: Duration) -> Result<String> {
    while !device::probe(address, PROBE_TIMEOUT).await {
        debug!("doorbell {address} not reachable yet");
        tokio::time::sleep(retry_interval).await;
    }
    info!("connected to doorbell {address}");

    let mut client = ViperClient::connect(address).await?;
    let result = client.sign_up(email).await;

    if let Err(e) = client.shutdown().await {
        warn!("failed to close doorbell connection: {e:#}");
    }

    let response = result?;
    ensure!(
        response["response-code"] == 200,
        "sign up refused with response code {}",
        response["response-code"]
    );

    response["user-token"]
        .as_str()
        .map(str::to_string)
        .context("sign up response carries no user-token")
}

/// Lets the watcher talk to the intercom without a status service in between
impl StatusApi for ViperDoorbell {
    async fn poll(&self) -> Result<PollResult> {
        Ok(PollResult {
            available: self.available().await,
        })
    }

    async fn list_doors(&self) -> Result<DoorList> {
        debug!("fetching doors from {}", self.address);
        self.doors().await.map(DoorList)
    }
}
