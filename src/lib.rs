pub mod api;
pub mod config;
pub mod device;
pub mod doorbell;
pub mod http_client;
pub mod logging;
pub mod poller;
pub mod status_api;
pub mod types;
pub mod viper;
