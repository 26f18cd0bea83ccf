use crate::error::{Error, Result};
use log::LevelFilter;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

static API_URL: Option<&'static str> = option_env!("DREAMNET_API_URL");
static LOG_LEVEL: Option<&'static str> = option_env!("DREAMNET_LOG");

pub const DEFAULT_API_URL: &str = "https://blog-node-km1z.onrender.com";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: Url,
    /// Period of the chat list / active chat refresh.
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    /// Delay before the verify and reset pages send the user home.
    pub redirect_delay: Duration,
    pub notice_ttl: Duration,
    /// localStorage key holding the bearer token.
    pub token_key: &'static str,
    pub log_level: LevelFilter,
}

impl Config {
    /// Configuration baked in at compile time through `DREAMNET_API_URL` and `DREAMNET_LOG`.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::with_api_url(API_URL.unwrap_or(DEFAULT_API_URL))?;
        if let Some(level) = LOG_LEVEL {
            config.log_level = LevelFilter::from_str(level)
                .map_err(|_| Error::Config(format!("unknown log level {level:?}")))?;
        }
        Ok(config)
    }

    pub fn with_api_url(api_url: &str) -> Result<Self> {
        let api_url =
            Url::parse(api_url).map_err(|err| Error::Config(format!("{api_url}: {err}")))?;
        if api_url.cannot_be_a_base() {
            return Err(Error::Config(format!("{api_url} cannot be used as a base url")));
        }
        Ok(Config {
            api_url,
            poll_interval: Duration::from_secs(3),
            request_timeout: Duration::from_secs(10),
            redirect_delay: Duration::from_secs(3),
            notice_ttl: Duration::from_secs(4),
            token_key: "token",
            log_level: LevelFilter::Info,
        })
    }
}
