use anyhow::{Context, Result};
use log::{debug, error, info};
use viper_web::{
    config::{WatchConfig, WatchSource},
    doorbell::ViperDoorbell,
    logging,
    poller::{LogIndicator, Poller},
    status_api::{HttpStatusApi, StatusApi},
};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = run().await {
        error!("application error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    logging::init();

    let config = WatchConfig::from_env().context("failed to load watcher configuration")?;

    match &config.source {
        WatchSource::Http(url) => {
            info!("watching status service at {url}");
            watch(HttpStatusApi::new(url.clone())?, &config).await
        }
        WatchSource::Direct(doorbell) => {
            info!("watching doorbell at {}", doorbell.address());
            watch(ViperDoorbell::new(doorbell), &config).await
        }
    }
}

async fn watch<Api>(api: Api, config: &WatchConfig) -> Result<()>
where
    Api: StatusApi + Send + Sync + 'static,
{
    let mut poller = Poller::new(api, LogIndicator::default(), config.interval);

    tokio::select! {
        _ = poller.start() => {},
        result = tokio::signal::ctrl_c() => {
            result.context("failed to listen for ctrl-c")?;
            debug!("ctrl-c received");
        }
    }

    info!("stopped watching");
    Ok(())
}
