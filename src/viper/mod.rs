//! Client for the Comelit Viper intercom protocol

mod channel;
pub mod command;
mod stream;

use anyhow::{Context, Result};
use channel::Channel;
use command::CommandKind;
use log::debug;
use rand_core::{OsRng, TryRngCore};
use serde_json::Value;
use std::fmt;
use stream::ViperStream;

/// Control bytes stay below 0x80 since the intercom adds 0x80 to them in
/// some replies
const CONTROL_START: u8 = 0x01;
const CONTROL_END: u8 = 0x80;

/// The intercom refused the user token
#[derive(Debug)]
pub struct Unauthorized {
    pub response: Value,
}

impl fmt::Display for Unauthorized {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "doorbell refused authorization with response code {}",
            self.response["response-code"]
        )
    }
}

impl std::error::Error for Unauthorized {}

pub struct ViperClient {
    stream: ViperStream,
    control: [u8; 2],
}

impl ViperClient {
    pub async fn connect(address: &str) -> Result<Self> {
        let stream = ViperStream::connect(address).await?;

        Ok(Self {
            stream,
            control: Self::random_control()?,
        })
    }

    /// UAUT: authorize with the user token
    ///
    /// Returns the raw response. Use [`ViperClient::ensure_authorized`] to turn
    /// a refusal into an [`Unauthorized`] error.
    pub async fn authorize(&mut self, token: &str) -> Result<Value> {
        self.request(CommandKind::Authorize(token.to_string()))
            .await
    }

    /// Authorize and fail with [`Unauthorized`] unless the intercom answers 200
    pub async fn ensure_authorized(&mut self, token: &str) -> Result<()> {
        let response = self.authorize(token).await?;

        if response["response-code"] != 200 {
            return Err(Unauthorized { response }.into());
        }

        Ok(())
    }

    /// UCFG: configuration for the given address books (e.g. "all" or "none")
    pub async fn configuration(&mut self, addressbooks: &str) -> Result<Value> {
        self.request(CommandKind::Configuration(addressbooks.to_string()))
            .await
    }

    /// INFO: model, firmware version and capabilities
    pub async fn info(&mut self) -> Result<Value> {
        self.request(CommandKind::Info).await
    }

    /// FRCG: face recognition parameters
    pub async fn face_recognition_params(&mut self) -> Result<Value> {
        self.request(CommandKind::FaceRecognitionParams).await
    }

    /// FACT: register `email` as a new user
    ///
    /// The intercom has to be in sign-up mode. A successful reply carries
    /// the `user-token` needed by [`ViperClient::authorize`].
    pub async fn sign_up(&mut self, email: &str) -> Result<Value> {
        self.request(CommandKind::ActivateUser(email.to_string()))
            .await
    }

    /// FACT: remove all registered users
    pub async fn remove_all_users(&mut self, requester: &str) -> Result<Value> {
        self.request(CommandKind::RemoveAllUsers(requester.to_string()))
            .await
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        self.stream.shutdown().await
    }

    async fn request(&mut self, kind: CommandKind) -> Result<Value> {
        let channel = self.channel(kind.channel_name());
        debug!("{} request", kind.channel_name());

        self.stream.execute(&channel.open()?).await?;
        let bytes = self.stream.execute(&channel.command(&kind)?).await?;
        let response = serde_json::from_slice(&bytes)
            .with_context(|| format!("failed to parse {} response", kind.channel_name()));
        self.stream.execute(&channel.close()?).await?;

        response
    }

    fn channel(&mut self, name: &'static str) -> Channel {
        self.tick();

        Channel::new(self.control, name)
    }

    // every channel needs its own control bytes
    fn tick(&mut self) {
        self.control[0] = next_control(self.control[0]);
    }

    fn random_control() -> Result<[u8; 2]> {
        let mut bytes = [0; 2];
        OsRng
            .try_fill_bytes(&mut bytes)
            .context("failed to generate control bytes")?;

        Ok(bytes.map(|b| CONTROL_START + b % (CONTROL_END - CONTROL_START)))
    }
}

fn next_control(byte: u8) -> u8 {
    CONTROL_START + (byte.saturating_sub(CONTROL_START) + 1) % (CONTROL_END - CONTROL_START)
}
