//! # SOAP client configuration
//!
//! A [`SoapClientConfig`] is built either programmatically, with the builder
//! style setters, or from YAML:
//!
//! 1. the embedded default configuration (`pmosoap.yaml`) is loaded,
//! 2. the caller's YAML document is merged on top of it,
//! 3. `PMOSOAP_CONFIG__<KEY>` environment variables override single keys.
//!
//! ```no_run
//! use pmosoapclient::SoapClientConfig;
//!
//! let config = SoapClientConfig::load("soap.yaml")?;
//! println!("endpoint: {}", config.url);
//! # Ok::<(), anyhow::Error>(())
//! ```

use std::{env, fs, path::Path, time::Duration};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use tracing::{debug, info};

// Configuration par défaut intégrée
const DEFAULT_CONFIG: &str = include_str!("pmosoap.yaml");

pub const ENV_PREFIX: &str = "PMOSOAP_CONFIG__";

// Never parsed as YAML scalars when read from the environment
const STRING_KEYS: &[&str] = &["url", "user_agent"];

pub const DEFAULT_DIAL_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_MAX_RESPONSE_BYTES: u64 = 10 * 1024 * 1024;
pub const DEFAULT_USER_AGENT: &str = concat!("pmosoap/", env!("CARGO_PKG_VERSION"));

/// Immutable settings shared by every call made through a client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoapClientConfig {
    /// SOAP endpoint
    pub url: String,

    /// Skip TLS certificate verification (self-signed test endpoints)
    pub insecure_tls: bool,

    /// Bound on connection establishment, in milliseconds
    pub dial_timeout_ms: u64,

    /// Bound on a whole call, in milliseconds, unset by default
    pub request_timeout_ms: Option<u64>,

    pub user_agent: String,

    /// Larger response bodies fail the read
    pub max_response_bytes: u64,
}

impl Default for SoapClientConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            insecure_tls: false,
            dial_timeout_ms: DEFAULT_DIAL_TIMEOUT_MS,
            request_timeout_ms: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
        }
    }
}

impl SoapClientConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_insecure_tls(mut self, insecure_tls: bool) -> Self {
        self.insecure_tls = insecure_tls;
        self
    }

    pub fn with_dial_timeout(mut self, timeout: Duration) -> Self {
        self.dial_timeout_ms = millis(timeout);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout_ms = timeout.map(millis);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_max_response_bytes(mut self, max: u64) -> Self {
        self.max_response_bytes = max;
        self
    }

    pub fn dial_timeout(&self) -> Duration {
        Duration::from_millis(self.dial_timeout_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    /// Loads the configuration from a YAML file
    ///
    /// A missing file is not an error: the embedded defaults and the
    /// environment overrides are used instead.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = match fs::read_to_string(path) {
            Ok(yaml) => {
                info!(config_file = %path.display(), "Loaded SOAP client config file");
                yaml
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!(config_file = %path.display(), "Config file not found, using default embedded config");
                String::new()
            }
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("Cannot read config file {}", path.display()));
            }
        };

        Self::from_yaml(&yaml)
    }

    /// Builds the configuration from a YAML document merged over the defaults
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Self::resolve(yaml, env::vars())
    }

    fn resolve(yaml: &str, vars: impl IntoIterator<Item = (String, String)>) -> Result<Self> {
        let mut config: Value = serde_yaml::from_str(DEFAULT_CONFIG)?;

        if !yaml.trim().is_empty() {
            let external: Value =
                serde_yaml::from_str(yaml).context("Invalid SOAP client configuration")?;
            merge_yaml(&mut config, &lower_keys(external));
        }

        apply_env_overrides(&mut config, vars);

        let config: Self =
            serde_yaml::from_value(config).context("Invalid SOAP client configuration")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.url.is_empty() {
            return Err(anyhow!("SOAP endpoint url is not configured"));
        }
        if self.dial_timeout_ms == 0 {
            return Err(anyhow!("dial_timeout_ms must be greater than 0"));
        }
        if self.request_timeout_ms == Some(0) {
            return Err(anyhow!("request_timeout_ms must be greater than 0 when set"));
        }
        Ok(())
    }
}

fn apply_env_overrides(config: &mut Value, vars: impl IntoIterator<Item = (String, String)>) {
    let Value::Mapping(map) = config else {
        return;
    };

    for (key, value) in vars {
        if let Some(name) = key.strip_prefix(ENV_PREFIX) {
            let name = name.to_lowercase();
            debug!(key = %name, "Applying SOAP client config override from env");
            let value = if STRING_KEYS.contains(&name.as_str()) {
                Value::String(value)
            } else {
                convert_env_value(&value)
            };
            map.insert(Value::String(name), value);
        }
    }
}

/// Sub-millisecond durations round up so a timeout never becomes zero
fn millis(timeout: Duration) -> u64 {
    u64::try_from(timeout.as_millis())
        .unwrap_or(u64::MAX)
        .max(1)
}

fn convert_env_value(value: &str) -> Value {
    if let Ok(parsed) = serde_yaml::from_str::<Value>(value) {
        return parsed;
    }
    Value::String(value.to_string())
}

fn lower_keys(value: Value) -> Value {
    match value {
        Value::Mapping(map) => {
            let mut lowered = Mapping::new();
            for (k, v) in map {
                let k = match k {
                    Value::String(s) => Value::String(s.to_lowercase()),
                    other => other,
                };
                lowered.insert(k, lower_keys(v));
            }
            Value::Mapping(lowered)
        }
        _ => value,
    }
}

fn merge_yaml(default: &mut Value, external: &Value) {
    match (default, external) {
        (Value::Mapping(dmap), Value::Mapping(emap)) => {
            for (k, v) in emap {
                match dmap.get_mut(k) {
                    Some(dv) => merge_yaml(dv, v),
                    None => {
                        dmap.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        (d, e) => *d = e.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env() -> Vec<(String, String)> {
        Vec::new()
    }

    #[test]
    fn test_defaults_are_merged() {
        let config = SoapClientConfig::resolve("url: http://localhost/soap", no_env()).unwrap();

        assert_eq!(config.url, "http://localhost/soap");
        assert!(!config.insecure_tls);
        assert_eq!(config.dial_timeout(), Duration::from_secs(30));
        assert_eq!(config.request_timeout(), None);
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(config.max_response_bytes, DEFAULT_MAX_RESPONSE_BYTES);
    }

    #[test]
    fn test_keys_are_case_insensitive() {
        let yaml = "URL: https://example.com/ws\nInsecure_TLS: true\nrequest_timeout_ms: 5000\n";
        let config = SoapClientConfig::resolve(yaml, no_env()).unwrap();

        assert!(config.insecure_tls);
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_env_overrides() {
        let vars = vec![
            (
                "PMOSOAP_CONFIG__URL".to_string(),
                "http://override/soap".to_string(),
            ),
            ("PMOSOAP_CONFIG__DIAL_TIMEOUT_MS".to_string(), "3000".to_string()),
            ("OTHER_VAR".to_string(), "ignored".to_string()),
        ];
        let config = SoapClientConfig::resolve("url: http://localhost/soap", vars).unwrap();

        assert_eq!(config.url, "http://override/soap");
        assert_eq!(config.dial_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_string_keys_from_env_stay_strings() {
        let vars = vec![
            ("PMOSOAP_CONFIG__USER_AGENT".to_string(), "1.0".to_string()),
            ("PMOSOAP_CONFIG__URL".to_string(), "true".to_string()),
        ];
        let config = SoapClientConfig::resolve("", vars).unwrap();

        assert_eq!(config.user_agent, "1.0");
        assert_eq!(config.url, "true");
    }

    #[test]
    fn test_zero_timeouts_are_rejected() {
        let yaml = "url: http://localhost\ndial_timeout_ms: 0\n";
        assert!(SoapClientConfig::resolve(yaml, no_env()).is_err());

        let yaml = "url: http://localhost\nrequest_timeout_ms: 0\n";
        assert!(SoapClientConfig::resolve(yaml, no_env()).is_err());
    }

    #[test]
    fn test_sub_second_timeouts() {
        let config = SoapClientConfig::new("http://localhost")
            .with_dial_timeout(Duration::from_millis(500))
            .with_request_timeout(Some(Duration::from_micros(10)));

        assert_eq!(config.dial_timeout(), Duration::from_millis(500));
        assert_eq!(config.request_timeout(), Some(Duration::from_millis(1)));

        let config = SoapClientConfig::new("http://localhost").with_dial_timeout(Duration::ZERO);
        assert_eq!(config.dial_timeout(), Duration::from_millis(1));
    }

    #[test]
    fn test_missing_url_is_rejected() {
        assert!(SoapClientConfig::resolve("", no_env()).is_err());
    }

    #[test]
    fn test_invalid_value_is_rejected() {
        let yaml = "url: http://localhost\ndial_timeout_ms: soon\n";
        assert!(SoapClientConfig::resolve(yaml, no_env()).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("soap.yaml");
        fs::write(&path, "url: http://10.0.0.1:8080/ws\ninsecure_tls: true\n").unwrap();

        let config = SoapClientConfig::load(&path).unwrap();
        assert_eq!(config.url, "http://10.0.0.1:8080/ws");
        assert!(config.insecure_tls);
    }

    #[test]
    fn test_builder() {
        let config = SoapClientConfig::new("https://example.com")
            .with_insecure_tls(true)
            .with_dial_timeout(Duration::from_secs(5))
            .with_request_timeout(Some(Duration::from_secs(60)))
            .with_user_agent("test-agent")
            .with_max_response_bytes(1024);

        assert!(config.insecure_tls);
        assert_eq!(config.dial_timeout(), Duration::from_secs(5));
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(60)));
        assert_eq!(config.user_agent, "test-agent");
        assert_eq!(config.max_response_bytes, 1024);
    }
}
