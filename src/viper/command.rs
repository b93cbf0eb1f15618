//! Frame layout of the Viper intercom protocol
//!
//! Every frame starts with an 8 byte header:
//! `[0x00, 0x06, len_lo, len_hi, c0, c1, 0x00, 0x00]`
//! where `len` is the little endian body length and `c0`/`c1` are the
//! channel control bytes (only set on command frames).

use anyhow::{Context, Result};
use serde::Serialize;

pub const HEADER_LEN: usize = 8;

const OPEN: [u8; 8] = [0xcd, 0xab, 0x01, 0x00, 0x07, 0x00, 0x00, 0x00];
const CLOSE: [u8; 8] = [0xef, 0x01, 0x03, 0x00, 0x02, 0x00, 0x00, 0x00];

/// Shown by the intercom next to users registered through `activate-user`
const USER_DESCRIPTION: &str = "viper-client";

/// Requests the intercom understands, together with their payload
#[derive(Clone, Debug, PartialEq)]
pub enum CommandKind {
    /// UAUT: authorize with a user token
    Authorize(String),
    /// UCFG: fetch the configuration for the given address books
    Configuration(String),
    /// INFO: model, firmware and capabilities
    Info,
    /// FRCG: face recognition parameters
    FaceRecognitionParams,
    /// FACT: register a new user, the reply carries its `user-token`
    ActivateUser(String),
    /// FACT: drop every registered user on behalf of `requester`
    RemoveAllUsers(String),
}

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
struct Request<'a, T: Serialize> {
    message: &'static str,
    message_type: &'static str,
    message_id: u8,
    #[serde(flatten)]
    body: &'a T,
}

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
struct AuthorizeBody<'a> {
    user_token: &'a str,
}

#[derive(Serialize)]
struct ConfigurationBody<'a> {
    addressbooks: &'a str,
}

#[derive(Serialize)]
struct ActivateUserBody<'a> {
    email: &'a str,
    description: &'static str,
}

#[derive(Serialize)]
struct RemoveAllUsersBody<'a> {
    requester: &'a str,
}

#[derive(Serialize)]
struct EmptyBody {}

impl CommandKind {
    /// Four letter channel name the command is sent on
    pub fn channel_name(&self) -> &'static str {
        match self {
            CommandKind::Authorize(_) => "UAUT",
            CommandKind::Configuration(_) => "UCFG",
            CommandKind::Info => "INFO",
            CommandKind::FaceRecognitionParams => "FRCG",
            CommandKind::ActivateUser(_) | CommandKind::RemoveAllUsers(_) => "FACT",
        }
    }

    fn message(&self) -> &'static str {
        match self {
            CommandKind::Authorize(_) => "access",
            CommandKind::Configuration(_) => "get-configuration",
            CommandKind::Info => "server-info",
            CommandKind::FaceRecognitionParams => "rcg-get-params",
            CommandKind::ActivateUser(_) => "activate-user",
            CommandKind::RemoveAllUsers(_) => "remove-all-users",
        }
    }

    /// JSON body of the command
    pub fn to_json(&self) -> Result<String> {
        let message = self.message();
        let json = match self {
            CommandKind::Authorize(token) => {
                serde_json::to_string(&request(message, &AuthorizeBody { user_token: token }))
            }
            CommandKind::Configuration(addressbooks) => serde_json::to_string(&request(
                message,
                &ConfigurationBody { addressbooks },
            )),
            CommandKind::ActivateUser(email) => serde_json::to_string(&request(
                message,
                &ActivateUserBody {
                    email,
                    description: USER_DESCRIPTION,
                },
            )),
            CommandKind::RemoveAllUsers(requester) => {
                serde_json::to_string(&request(message, &RemoveAllUsersBody { requester }))
            }
            CommandKind::Info | CommandKind::FaceRecognitionParams => {
                serde_json::to_string(&request(message, &EmptyBody {}))
            }
        };

        json.with_context(|| format!("failed to serialize {message} request"))
    }
}

fn request<'a, T: Serialize>(message: &'static str, body: &'a T) -> Request<'a, T> {
    Request {
        message,
        message_type: "request",
        message_id: 1,
        body,
    }
}

/// Body length encoded in bytes 2 and 3 of a header
pub fn buffer_length(b2: u8, b3: u8) -> usize {
    u16::from_le_bytes([b2, b3]) as usize
}

/// Frame carrying a JSON command on an already opened channel
pub fn for_kind(kind: &CommandKind, control: &[u8; 2]) -> Result<Vec<u8>> {
    let json = kind.to_json()?;
    make(json.as_bytes(), control)
}

/// Frame opening the channel `command`
pub fn open_channel(command: &str, control: &[u8; 2], extra: Option<&[u8]>) -> Result<Vec<u8>> {
    let tail = match extra {
        Some(bytes) => {
            let len = u8::try_from(bytes.len() + 1).context("channel extra data too long")?;
            [&[0, 0, len, 0, 0, 0][..], bytes, &[0][..]].concat()
        }
        None => vec![0],
    };

    let total = [&OPEN[..], command.as_bytes(), &control[..], &tail[..]].concat();

    Ok([&header(&total)?[..], &total[..]].concat())
}

/// Frame closing the channel identified by `control`
pub fn close_channel(control: &[u8; 2]) -> Result<Vec<u8>> {
    let total = [&CLOSE[..], &control[..]].concat();

    Ok([&header(&total)?[..], &total[..]].concat())
}

/// Prefix `body` with a header carrying the control bytes
pub fn make(body: &[u8], control: &[u8; 2]) -> Result<Vec<u8>> {
    let mut header = header(body)?;
    header[4] = control[0];
    header[5] = control[1];

    Ok([&header[..], body].concat())
}

fn header(body: &[u8]) -> Result<[u8; HEADER_LEN]> {
    let len = u16::try_from(body.len())
        .with_context(|| format!("frame body of {} bytes too long", body.len()))?
        .to_le_bytes();

    Ok([0x00, 0x06, len[0], len[1], 0x00, 0x00, 0x00, 0x00])
}
