use log::debug;
use std::time::Duration;
use tokio::{
    net::{TcpStream, lookup_host},
    time::timeout,
};

/// How long the intercom gets to accept a connection before it counts as gone
pub const PROBE_TIMEOUT: Duration = Duration::from_millis(100);

/// Check whether the intercom at `address` (`ip:port`) accepts TCP connections
///
/// Resolution failures, refusals and timeouts all report the device as unavailable.
pub async fn probe(address: &str, probe_timeout: Duration) -> bool {
    let addr = match lookup_host(address).await.map(|mut addrs| addrs.next()) {
        Ok(Some(addr)) => addr,
        Ok(None) => {
            debug!("probe {address}: no address resolved");
            return false;
        }
        Err(e) => {
            debug!("probe {address}: {e}");
            return false;
        }
    };

    match timeout(probe_timeout, TcpStream::connect(addr)).await {
        Ok(Ok(_stream)) => true,
        Ok(Err(e)) => {
            debug!("probe {address}: {e}");
            false
        }
        Err(_) => {
            debug!("probe {address}: timed out after {probe_timeout:?}");
            false
        }
    }
}
