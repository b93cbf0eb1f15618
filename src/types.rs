use serde::{Deserialize, Serialize};
use std::fmt;

/// Body of `GET /api/v1/poll`
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct PollResult {
    pub available: bool,
}

/// Body of `GET /api/v1/doors`
///
/// The shape is whatever the intercom reports as its `vip` configuration,
/// so it is kept as raw JSON.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DoorList(pub serde_json::Value);

/// Visual state shown to whoever watches the doorbell
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Indicator {
    Connected,
    Disconnected,
}

impl Indicator {
    pub fn color(&self) -> &'static str {
        match self {
            Indicator::Connected => "#66ff66",
            Indicator::Disconnected => "#ff6666",
        }
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Indicator::Connected => write!(f, "connected"),
            Indicator::Disconnected => write!(f, "disconnected"),
        }
    }
}
