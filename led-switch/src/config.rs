//! Switch configuration: where the LED endpoints live and how often they are polled.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use reqwest::Url;

use crate::errors::{ConfigError, Error};

/// Default base url of the LED web server.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";
/// Default status endpoint.
pub const DEFAULT_STATUS_PATH: &str = "/ledstatus";
/// Default control endpoint (the button `href`).
pub const DEFAULT_CONTROL_PATH: &str = "/led";
/// Default id of the element bound to the button.
pub const DEFAULT_ELEMENT_ID: &str = "lightbulb";
/// Default delay between two status polls (in ms).
pub const DEFAULT_POLL_INTERVAL: u64 = 400;
/// Default overall request timeout (in ms).
pub const DEFAULT_REQUEST_TIMEOUT: u64 = 5_000;
/// Default connection timeout (in ms).
pub const DEFAULT_CONNECT_TIMEOUT: u64 = 2_000;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Base url relative endpoints are resolved against.
    pub base_url: String,
    /// Status endpoint polled by the [`StatusPoller`](crate::devices::StatusPoller).
    pub status_path: String,
    /// Control endpoint the [`ToggleButton`](crate::devices::ToggleButton) posts to.
    pub control_path: String,
    /// Id of the element bound to the button.
    pub element_id: String,
    /// Delay between two polls (in ms).
    pub poll_interval: u64,
    /// Overall request timeout (in ms).
    pub request_timeout: u64,
    /// Connection timeout (in ms).
    pub connect_timeout: u64,
    /// Asks for cache busting on every request.
    pub no_cache: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: String::from(DEFAULT_BASE_URL),
            status_path: String::from(DEFAULT_STATUS_PATH),
            control_path: String::from(DEFAULT_CONTROL_PATH),
            element_id: String::from(DEFAULT_ELEMENT_ID),
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            no_cache: true,
        }
    }
}

impl Config {
    /// Builds a configuration from environment variables, falling back to defaults.
    ///
    /// Optional:
    /// - `LED_BASE_URL`: default `http://127.0.0.1:8080`
    /// - `LED_STATUS_PATH`: default `/ledstatus`
    /// - `LED_CONTROL_PATH`: default `/led`
    /// - `LED_ELEMENT_ID`: default `lightbulb`
    /// - `LED_POLL_INTERVAL_MS`: default 400
    /// - `LED_REQUEST_TIMEOUT_MS`: default 5000
    /// - `LED_CONNECT_TIMEOUT_MS`: default 2000
    /// - `LED_NO_CACHE`: default true
    ///
    /// # Errors
    /// * `InvalidValue`: a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Self::from_env()`] but reads values through the given lookup function.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(base_url) = lookup("LED_BASE_URL") {
            Url::parse(&base_url).map_err(|err| ConfigError::InvalidValue {
                key: "LED_BASE_URL",
                value: base_url.clone(),
                info: err.to_string(),
            })?;
            config.base_url = base_url;
        }
        if let Some(path) = lookup("LED_STATUS_PATH") {
            config.status_path = path;
        }
        if let Some(path) = lookup("LED_CONTROL_PATH") {
            config.control_path = path;
        }
        if let Some(id) = lookup("LED_ELEMENT_ID") {
            config.element_id = id;
        }
        if let Some(value) = lookup("LED_POLL_INTERVAL_MS") {
            config.poll_interval = parse_value("LED_POLL_INTERVAL_MS", value)?;
        }
        if let Some(value) = lookup("LED_REQUEST_TIMEOUT_MS") {
            config.request_timeout = parse_value("LED_REQUEST_TIMEOUT_MS", value)?;
        }
        if let Some(value) = lookup("LED_CONNECT_TIMEOUT_MS") {
            config.connect_timeout = parse_value("LED_CONNECT_TIMEOUT_MS", value)?;
        }
        if let Some(value) = lookup("LED_NO_CACHE") {
            config.no_cache = parse_flag("LED_NO_CACHE", value)?;
        }

        Ok(config)
    }

    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_status_path<S: Into<String>>(mut self, path: S) -> Self {
        self.status_path = path.into();
        self
    }

    pub fn with_control_path<S: Into<String>>(mut self, path: S) -> Self {
        self.control_path = path.into();
        self
    }

    pub fn with_element_id<S: Into<String>>(mut self, id: S) -> Self {
        self.element_id = id.into();
        self
    }

    pub fn with_poll_interval(mut self, interval: u64) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_request_timeout(mut self, timeout: u64) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: u64) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_no_cache(mut self, no_cache: bool) -> Self {
        self.no_cache = no_cache;
        self
    }
}

impl Display for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Config [base_url={}, status={}, control={}, element={}, interval={}ms]",
            self.base_url, self.status_path, self.control_path, self.element_id, self.poll_interval,
        )
    }
}

fn parse_value<T>(key: &'static str, value: String) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|err| ConfigError::InvalidValue {
            key,
            value: value.clone(),
            info: err.to_string(),
        })
}

fn parse_flag(key: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value,
            info: String::from("expected a boolean"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.status_path, "/ledstatus");
        assert_eq!(config.element_id, "lightbulb");
        assert_eq!(config.poll_interval, 400);
        assert!(config.no_cache);
    }

    #[test]
    fn test_from_lookup() {
        let config = Config::from_lookup(lookup(&[
            ("LED_BASE_URL", "http://192.168.1.42"),
            ("LED_STATUS_PATH", "/status"),
            ("LED_CONTROL_PATH", "/toggle"),
            ("LED_ELEMENT_ID", "kitchen"),
            ("LED_POLL_INTERVAL_MS", " 1000 "),
            ("LED_REQUEST_TIMEOUT_MS", "300"),
            ("LED_CONNECT_TIMEOUT_MS", "100"),
            ("LED_NO_CACHE", "off"),
        ]))
        .unwrap();

        assert_eq!(config.base_url, "http://192.168.1.42");
        assert_eq!(config.status_path, "/status");
        assert_eq!(config.control_path, "/toggle");
        assert_eq!(config.element_id, "kitchen");
        assert_eq!(config.poll_interval, 1000);
        assert_eq!(config.request_timeout, 300);
        assert_eq!(config.connect_timeout, 100);
        assert!(!config.no_cache);
    }

    #[test]
    fn test_invalid_values() {
        let result = Config::from_lookup(lookup(&[("LED_POLL_INTERVAL_MS", "fast")]));
        assert!(matches!(
            result,
            Err(Error::Config {
                source: ConfigError::InvalidValue {
                    key: "LED_POLL_INTERVAL_MS",
                    ..
                }
            })
        ));

        let result = Config::from_lookup(lookup(&[("LED_BASE_URL", "nowhere")]));
        assert!(result.is_err());

        let result = Config::from_lookup(lookup(&[("LED_NO_CACHE", "maybe")]));
        assert_eq!(
            result.unwrap_err().to_string(),
            "Configuration error: Invalid value 'maybe' for LED_NO_CACHE - expected a boolean."
        );
    }

    #[test]
    fn test_builder() {
        let config = Config::default()
            .with_base_url("http://10.0.0.2")
            .with_status_path("/s")
            .with_control_path("/c")
            .with_element_id("porch")
            .with_poll_interval(50)
            .with_request_timeout(10)
            .with_connect_timeout(5)
            .with_no_cache(false);
        assert_eq!(
            format!("{}", config),
            "Config [base_url=http://10.0.0.2, status=/s, control=/c, element=porch, interval=50ms]"
        );
        assert_eq!(config.request_timeout, 10);
        assert_eq!(config.connect_timeout, 5);
        assert!(!config.no_cache);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_partial_config() {
        let config: Config =
            serde_json::from_str(r#"{"base_url": "http://10.0.0.3", "poll_interval": 250}"#)
                .unwrap();
        assert_eq!(config.base_url, "http://10.0.0.3");
        assert_eq!(config.poll_interval, 250);
        assert_eq!(config.status_path, DEFAULT_STATUS_PATH);

        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"element_id\":\"lightbulb\""));
    }
}
