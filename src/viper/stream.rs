use super::command::{HEADER_LEN, buffer_length};
use anyhow::{Context, Result};
use std::time::Duration;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    time::timeout,
};

/// Read and write deadline for a single frame
pub const IO_TIMEOUT: Duration = Duration::from_millis(1000);

/// Framed connection to the intercom
pub struct ViperStream {
    stream: TcpStream,
}

impl ViperStream {
    pub async fn connect(address: &str) -> Result<Self> {
        let stream = timeout(IO_TIMEOUT, TcpStream::connect(address))
            .await
            .with_context(|| format!("timed out connecting to doorbell at {address}"))?
            .with_context(|| format!("failed to connect to doorbell at {address}"))?;

        Ok(Self { stream })
    }

    /// Write a frame and read the reply
    pub async fn execute(&mut self, frame: &[u8]) -> Result<Vec<u8>> {
        self.write(frame).await?;
        self.read().await
    }

    pub async fn write(&mut self, frame: &[u8]) -> Result<()> {
        timeout(IO_TIMEOUT, self.stream.write_all(frame))
            .await
            .context("timed out writing frame")?
            .context("failed to write frame")
    }

    /// Read one frame and return its body
    pub async fn read(&mut self) -> Result<Vec<u8>> {
        let mut head = [0; HEADER_LEN];
        timeout(IO_TIMEOUT, self.stream.read_exact(&mut head))
            .await
            .context("timed out reading frame header")?
            .context("failed to read frame header")?;

        let mut body = vec![0; buffer_length(head[2], head[3])];
        timeout(IO_TIMEOUT, self.stream.read_exact(&mut body))
            .await
            .context("timed out reading frame body")?
            .context("failed to read frame body")?;

        Ok(body)
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        self.stream
            .shutdown()
            .await
            .context("failed to shut down doorbell connection")
    }
}
