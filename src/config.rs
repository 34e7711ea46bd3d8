use std::time::Duration;

use url::Url;

use crate::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.shapeways.com";
pub const DEFAULT_API_VERSION: &str = "v1";

pub const ENV_CONSUMER_KEY: &str = "SHAPEWAYS_CONSUMER_KEY";
pub const ENV_CONSUMER_SECRET: &str = "SHAPEWAYS_CONSUMER_SECRET";
pub const ENV_CALLBACK_URL: &str = "SHAPEWAYS_CALLBACK_URL";
pub const ENV_OAUTH_TOKEN: &str = "SHAPEWAYS_OAUTH_TOKEN";
pub const ENV_OAUTH_SECRET: &str = "SHAPEWAYS_OAUTH_SECRET";
pub const ENV_API_URL: &str = "SHAPEWAYS_API_URL";
pub const ENV_API_VERSION: &str = "SHAPEWAYS_API_VERSION";
pub const ENV_TIMEOUT_SECS: &str = "SHAPEWAYS_TIMEOUT_SECS";

/// Per-client settings that are not credentials.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub base_url: String,
    pub api_version: String,
    /// Used as `oauth_callback` of the request token step.
    pub callback_url: Option<String>,
    /// Applied by the reqwest transport; `None` keeps reqwest's default.
    pub timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            callback_url: None,
            timeout: None,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.base_url).map_err(|e| {
            Error::Configuration(format!("invalid base url {} : {}", self.base_url, e))
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(Error::Configuration(format!(
                "base url must be http(s), got {}",
                self.base_url
            )));
        }
        if self.api_version.trim_matches('/').is_empty() {
            return Err(Error::Configuration("api version is empty".into()));
        }
        Ok(())
    }
}

/// Everything `Client::from_env` needs.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvSettings {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub token: Option<(String, String)>,
    pub config: Config,
}

impl EnvSettings {
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`load`](Self::load) with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &'static str| {
            var(key).ok_or_else(|| Error::Configuration(format!("{} is not set", key)))
        };

        let consumer_key = required(ENV_CONSUMER_KEY)?;
        let consumer_secret = required(ENV_CONSUMER_SECRET)?;
        let token = match (var(ENV_OAUTH_TOKEN), var(ENV_OAUTH_SECRET)) {
            (Some(token), Some(secret)) => Some((token, secret)),
            (None, None) => None,
            _ => {
                return Err(Error::Configuration(format!(
                    "{} and {} must be set together",
                    ENV_OAUTH_TOKEN, ENV_OAUTH_SECRET
                )))
            }
        };
        let timeout = match var(ENV_TIMEOUT_SECS) {
            Some(secs) => Some(Duration::from_secs(secs.trim().parse().map_err(|_| {
                Error::Configuration(format!("{} is not a number : {}", ENV_TIMEOUT_SECS, secs))
            })?)),
            None => None,
        };

        let defaults = Config::default();
        let config = Config {
            base_url: var(ENV_API_URL).unwrap_or(defaults.base_url),
            api_version: var(ENV_API_VERSION).unwrap_or(defaults.api_version),
            callback_url: var(ENV_CALLBACK_URL),
            timeout,
        };
        config.validate()?;

        Ok(EnvSettings {
            consumer_key,
            consumer_secret,
            token,
            config,
        })
    }
}
