use serde::{Deserialize, Serialize};

/// The conventional statsd port.
pub const DEFAULT_PORT: u16 = 8125;

/// Construction options for a client.
///
/// Every field has a serde default, so deployments can spell out only the
/// knobs they care about in their config file:
///
/// ```ignore
/// let options: StatsdOptions = serde_yaml::from_str("host: stats.internal")?;
/// let client = Client::from_options(&options)?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsdOptions {
    /// Destination hostname or IP.
    pub host: String,
    /// Destination port.
    pub port: u16,
    /// Prepended to every metric name with a `.` separator; empty means no
    /// prefix.
    pub prefix: String,
    /// Upper bound on a single datagram payload.
    pub max_payload_bytes: usize,
    /// Sample rate applied by operations that do not take an explicit one.
    pub default_rate: f64,
}

impl Default for StatsdOptions {
    fn default() -> StatsdOptions {
        StatsdOptions {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            prefix: String::new(),
            max_payload_bytes: 8192,
            default_rate: 1.0,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = StatsdOptions::default();
        assert_eq!(options.host, "localhost");
        assert_eq!(options.port, 8125);
        assert_eq!(options.prefix, "");
        assert_eq!(options.max_payload_bytes, 8192);
        assert_eq!(options.default_rate, 1.0);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let options: StatsdOptions =
            serde_json::from_str(r#"{"host": "stats.internal", "prefix": "myapp"}"#).unwrap();
        assert_eq!(options.host, "stats.internal");
        assert_eq!(options.prefix, "myapp");
        assert_eq!(options.port, DEFAULT_PORT);
        assert_eq!(options.max_payload_bytes, 8192);
        assert_eq!(options.default_rate, 1.0);
    }
}
