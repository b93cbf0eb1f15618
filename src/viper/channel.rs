use super::command::{self, CommandKind};
use anyhow::Result;

/// A logical channel multiplexed over the intercom connection
#[derive(Clone, Debug)]
pub struct Channel {
    name: &'static str,
    control: [u8; 2],
}

impl Channel {
    pub fn new(control: [u8; 2], name: &'static str) -> Self {
        Self { name, control }
    }

    pub fn open(&self) -> Result<Vec<u8>> {
        command::open_channel(self.name, &self.control, None)
    }

    pub fn close(&self) -> Result<Vec<u8>> {
        command::close_channel(&self.control)
    }

    pub fn command(&self, kind: &CommandKind) -> Result<Vec<u8>> {
        command::for_kind(kind, &self.control)
    }
}
