use harmony_http::{RatelimitMode, API_BASE};
use std::{
    env,
    error::Error as StdError,
    fmt::{Debug, Display, Formatter, Result as FmtResult},
    str::FromStr,
    time::Duration,
};

pub const CDN_BASE: &str = "https://cdn.discordapp.com";

/// Settings of one authenticated session
#[derive(Clone)]
pub struct Config {
    pub token: String,
    pub api_base: String,
    pub cdn_base: String,
    /// Default behaviour of the rate-limit gate, guilds can override it per handle
    pub ratelimit_mode: RatelimitMode,
    /// How many times a call rejected with 429 is retried in [`RatelimitMode::Wait`]
    pub max_retries: u32,
    /// Upper bound on the time a single admission may spend waiting for a bucket
    pub max_wait: Duration,
    pub request_timeout: Option<Duration>,
    pub bucket_capacity: u32,
    pub bucket_window: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_base: API_BASE.into(),
            cdn_base: CDN_BASE.into(),
            ratelimit_mode: RatelimitMode::Wait,
            max_retries: 3,
            max_wait: Duration::from_secs(30),
            request_timeout: Some(Duration::from_secs(30)),
            bucket_capacity: 5,
            bucket_window: Duration::from_secs(5),
        }
    }
}

impl Debug for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Config")
            .field("token", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("cdn_base", &self.cdn_base)
            .field("ratelimit_mode", &self.ratelimit_mode)
            .field("max_retries", &self.max_retries)
            .field("max_wait", &self.max_wait)
            .field("request_timeout", &self.request_timeout)
            .field("bucket_capacity", &self.bucket_capacity)
            .field("bucket_window", &self.bucket_window)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { var: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ConfigError::Missing(var) => write!(f, "Expected {} in the environment", var),
            ConfigError::Invalid { var, value } => write!(f, "Invalid value for {} - {}", var, value),
        }
    }
}

impl StdError for ConfigError {}

impl Config {
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    pub fn api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn cdn_base(mut self, cdn_base: impl Into<String>) -> Self {
        self.cdn_base = cdn_base.into();
        self
    }

    pub fn ratelimit_mode(mut self, mode: RatelimitMode) -> Self {
        self.ratelimit_mode = mode;
        self
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    pub fn request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn bucket(mut self, capacity: u32, window: Duration) -> Self {
        self.bucket_capacity = capacity;
        self.bucket_window = window;
        self
    }

    /// Reads the configuration from `HARMONY_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Config::default();
        let token = lookup("HARMONY_TOKEN").ok_or(ConfigError::Missing("HARMONY_TOKEN"))?;

        let ratelimit_mode = match lookup("HARMONY_RATELIMIT_MODE").as_deref() {
            None => defaults.ratelimit_mode,
            Some("wait") => RatelimitMode::Wait,
            Some("fail") => RatelimitMode::FailFast,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "HARMONY_RATELIMIT_MODE",
                    value: other.into(),
                })
            }
        };
        let request_timeout = match parse::<u64>(&lookup, "HARMONY_REQUEST_TIMEOUT_MS")? {
            None => defaults.request_timeout,
            Some(0) => None,
            Some(ms) => Some(Duration::from_millis(ms)),
        };

        let bucket_capacity = parse(&lookup, "HARMONY_BUCKET_CAPACITY")?
            .unwrap_or(defaults.bucket_capacity);
        if bucket_capacity == 0 {
            return Err(ConfigError::Invalid {
                var: "HARMONY_BUCKET_CAPACITY",
                value: bucket_capacity.to_string(),
            });
        }
        let bucket_window = parse::<u64>(&lookup, "HARMONY_BUCKET_WINDOW_MS")?
            .map_or(defaults.bucket_window, Duration::from_millis);
        if bucket_window.is_zero() {
            return Err(ConfigError::Invalid {
                var: "HARMONY_BUCKET_WINDOW_MS",
                value: "0".into(),
            });
        }

        Ok(Self {
            token,
            api_base: lookup("HARMONY_API_BASE").unwrap_or(defaults.api_base),
            cdn_base: lookup("HARMONY_CDN_BASE").unwrap_or(defaults.cdn_base),
            ratelimit_mode,
            max_retries: parse(&lookup, "HARMONY_MAX_RETRIES")?.unwrap_or(defaults.max_retries),
            max_wait: parse(&lookup, "HARMONY_MAX_WAIT_MS")?
                .map_or(defaults.max_wait, Duration::from_millis),
            request_timeout,
            bucket_capacity,
            bucket_window,
        })
    }
}

fn parse<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(var) {
        Some(value) => value
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { var, value }),
        None => Ok(None),
    }
}
