use crate::error::Error;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Collector endpoint used when the configuration does not name one.
pub const DEFAULT_ENDPOINT: &str = "https://api.cloudpelican.com/api/push/";
/// Debounce window between the first buffered event and its flush.
pub const DEFAULT_WRITE_INTERVAL_MS: u64 = 200;
/// Longest message (in characters) the collector accepts.
pub const DEFAULT_MAX_MSG_LENGTH: usize = 512;

/// Pipeline configuration.
///
/// Every field except `token` has a default, so a YAML document may be as
/// small as `token: abc123`.
///
/// ```
/// # use cloudpelican::Config;
/// let cfg = Config::from_yaml_str("token: abc123\nwrite_interval_ms: 50").unwrap();
/// assert_eq!(cfg.token, "abc123");
/// assert_eq!(cfg.write_interval_ms, 50);
/// assert!(cfg.compression);
/// ```
#[derive(Clone, Eq, PartialEq, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Authentication token sent with every request. Required.
    pub token: String,
    /// Debounce delay in milliseconds.
    pub write_interval_ms: u64,
    /// Drop a message identical to the previously accepted one.
    pub deduplication: bool,
    /// Messages longer than this many UTF-16 code units are rejected. Callers should leave it alone,
    /// the collector enforces the same limit.
    pub max_msg_length: usize,
    /// LZW-compress the field payload when that makes it shorter.
    pub compression: bool,
    /// Base URL of the collector.
    pub endpoint: String,
    /// Overrides the host name stamped on each event.
    ///
    /// Without it the host comes from `HOSTNAME`, then `COMPUTERNAME`, then
    /// `localhost`. Most shells keep `HOSTNAME` unexported, so services
    /// usually end up reporting `localhost` unless this is set.
    pub host: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            token: String::new(),
            write_interval_ms: DEFAULT_WRITE_INTERVAL_MS,
            deduplication: true,
            max_msg_length: DEFAULT_MAX_MSG_LENGTH,
            compression: true,
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            host: None,
        }
    }
}

impl Config {
    pub fn new<S: Into<String>>(token: S) -> Self {
        Self {
            token: token.into(),
            ..Default::default()
        }
    }

    pub fn from_yaml_str(s: &str) -> Result<Self, Error> {
        Ok(serde_yaml::from_str(s)?)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let s = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&s)
    }

    pub fn with_write_interval_ms(mut self, ms: u64) -> Self {
        self.write_interval_ms = ms;
        self
    }

    pub fn with_deduplication(mut self, enabled: bool) -> Self {
        self.deduplication = enabled;
        self
    }

    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.compression = enabled;
        self
    }

    pub fn with_max_msg_length(mut self, len: usize) -> Self {
        self.max_msg_length = len;
        self
    }

    pub fn with_endpoint<S: Into<String>>(mut self, endpoint: S) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_host<S: Into<String>>(mut self, host: S) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn write_interval(&self) -> Duration {
        Duration::from_millis(self.write_interval_ms)
    }

    /// Checks the settings a pipeline cannot run without.
    pub fn validate(&self) -> Result<(), Error> {
        if self.token.trim().is_empty() {
            return Err(Error::MissingToken);
        }
        if self.write_interval_ms == 0 {
            return Err(Error::InvalidInterval(self.write_interval_ms));
        }
        if self.max_msg_length == 0 {
            return Err(Error::InvalidMaxLength);
        }
        Ok(())
    }
}
