//! Register a user on the intercom and print its token
//!
//! Usage: viper-sign-up <email>
//!
//! Put the intercom in sign-up mode first. The token goes into `TOKEN` for
//! the status service.

use anyhow::{Context, Result};
use log::{error, info};
use std::env;
use viper_web::{config::SignUpConfig, doorbell, logging};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() != 2 {
        eprintln!("Usage: {} <email>", args[0]);
        std::process::exit(1);
    }

    if let Err(e) = run(&args[1]).await {
        error!("application error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(email: &str) -> Result<()> {
    logging::init();

    let config = SignUpConfig::from_env().context("failed to load sign up configuration")?;
    let address = config.address();

    info!("waiting for doorbell at {address}");
    let token = doorbell::sign_up(&address, email, config.retry_interval).await?;

    println!("Your token is: {token}");
    Ok(())
}
