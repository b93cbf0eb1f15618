use anyhow::{Context, Result, bail};
use reqwest::Url;
use std::{env, sync::OnceLock, time::Duration};

/// Server configuration loaded and validated at startup
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// HTTP server configuration
    pub server: ServerConfig,

    /// Intercom connection configuration
    pub doorbell: DoorbellConfig,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct DoorbellConfig {
    pub ip: String,
    pub port: u16,
    pub token: String,
}

/// Sign-up tool configuration
///
/// Only needs to know where the intercom is, the token is what it obtains.
#[derive(Clone, Debug)]
pub struct SignUpConfig {
    pub ip: String,
    pub port: u16,
    pub retry_interval: Duration,
}

/// Watcher configuration
#[derive(Clone, Debug)]
pub struct WatchConfig {
    pub source: WatchSource,
    pub interval: Duration,
}

/// Where the watcher gets its availability information from
#[derive(Clone, Debug)]
pub enum WatchSource {
    /// Poll a running status service over HTTP
    Http(Url),
    /// Probe the intercom directly, without a status service in between
    Direct(DoorbellConfig),
}

type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

fn process_env(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn required(lookup: Lookup, key: &str) -> Result<String> {
    lookup(key).with_context(|| format!("failed to get {key}"))
}

impl AppConfig {
    /// Get or load the server configuration
    ///
    /// # Panics
    /// Panics if configuration loading fails. The server cannot do anything
    /// useful without knowing where the intercom is.
    pub fn get() -> &'static Self {
        static APP_CONFIG: OnceLock<AppConfig> = OnceLock::new();
        APP_CONFIG
            .get_or_init(|| Self::load(&process_env).expect("failed to load application configuration"))
    }

    pub fn load(lookup: Lookup) -> Result<Self> {
        let server = ServerConfig::load(lookup)?;
        let doorbell = DoorbellConfig::load(lookup)?;

        Ok(Self { server, doorbell })
    }
}

impl ServerConfig {
    fn load(lookup: Lookup) -> Result<Self> {
        let bind_address = lookup("BIND_ADDRESS").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = lookup("UI_PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse::<u16>()
            .context("failed to parse UI_PORT: invalid format")?;

        Ok(Self { bind_address, port })
    }
}

fn doorbell_location(lookup: Lookup) -> Result<(String, u16)> {
    let ip = required(lookup, "DOORBELL_IP")?;
    let port = required(lookup, "DOORBELL_PORT")?
        .parse::<u16>()
        .context("failed to parse DOORBELL_PORT: invalid format")?;

    Ok((ip, port))
}

fn interval_ms(lookup: Lookup, key: &str, default: u64) -> Result<Duration> {
    let ms = match lookup(key) {
        Some(value) => value
            .parse::<u64>()
            .with_context(|| format!("failed to parse {key}: invalid format"))?,
        None => default,
    };

    if ms == 0 {
        bail!("failed to parse {key}: must be greater than zero");
    }

    Ok(Duration::from_millis(ms))
}

impl DoorbellConfig {
    fn load(lookup: Lookup) -> Result<Self> {
        let (ip, port) = doorbell_location(lookup)?;
        let token = required(lookup, "TOKEN")?;

        Ok(Self { ip, port, token })
    }

    /// `ip:port` of the intercom
    pub fn address(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }
}

impl WatchConfig {
    const DEFAULT_URL: &str = "http://127.0.0.1:8080";
    const DEFAULT_INTERVAL_MS: u64 = 1000;

    /// Load the watcher configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::load(&process_env)
    }

    pub fn load(lookup: Lookup) -> Result<Self> {
        let source = match lookup("WATCH_SOURCE").as_deref() {
            None | Some("http") => {
                let url = lookup("VIPER_WEB_URL").unwrap_or_else(|| Self::DEFAULT_URL.to_string());
                WatchSource::Http(
                    Url::parse(&url).context("failed to parse VIPER_WEB_URL: invalid url")?,
                )
            }
            Some("direct") => WatchSource::Direct(DoorbellConfig::load(lookup)?),
            Some(other) => bail!("failed to parse WATCH_SOURCE: unknown source {other:?}"),
        };

        let interval = interval_ms(lookup, "POLL_INTERVAL_MS", Self::DEFAULT_INTERVAL_MS)?;

        Ok(Self { source, interval })
    }
}

impl SignUpConfig {
    const DEFAULT_RETRY_MS: u64 = 1000;

    pub fn from_env() -> Result<Self> {
        Self::load(&process_env)
    }

    pub fn load(lookup: Lookup) -> Result<Self> {
        let (ip, port) = doorbell_location(lookup)?;
        let retry_interval = interval_ms(lookup, "RETRY_INTERVAL_MS", Self::DEFAULT_RETRY_MS)?;

        Ok(Self {
            ip,
            port,
            retry_interval,
        })
    }

    /// `ip:port` of the intercom
    pub fn address(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }
}
