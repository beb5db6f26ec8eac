use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Invalid port override {0:?}")]
    InvalidPortOverride(String),

    #[error("Memory sink max_records cannot be 0")]
    InvalidMaxRecords,

    #[error("max_body_bytes cannot be 0")]
    InvalidMaxBodyBytes,

    #[error("summary_days must be between 1 and 366")]
    InvalidSummaryDays,
}

pub const MAX_SUMMARY_DAYS: u32 = 366;

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    pub host: String,
    pub port: u16,
}

impl Listener {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

/// Where normalized records go.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
#[serde(tag = "type")]
pub enum SinkConfig {
    /// Keep the most recent `max_records` records in process memory.
    Memory {
        #[serde(default = "default_max_records")]
        max_records: usize,
    },
    /// Only log every record.
    Log,
}

impl Default for SinkConfig {
    fn default() -> Self {
        SinkConfig::Memory {
            max_records: default_max_records(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Public listener for report submissions
    #[serde(default = "default_listener")]
    pub listener: Listener,
    /// Listener for health and readiness checks
    #[serde(default = "default_admin_listener")]
    pub admin_listener: Listener,
    /// Requests with larger bodies are rejected with 413
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Days covered by the per-service summary
    #[serde(default = "default_summary_days")]
    pub summary_days: u32,
    #[serde(default)]
    pub sink: SinkConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            listener: default_listener(),
            admin_listener: default_admin_listener(),
            max_body_bytes: default_max_body_bytes(),
            summary_days: default_summary_days(),
            sink: SinkConfig::default(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        self.admin_listener.validate()?;

        if self.max_body_bytes == 0 {
            return Err(ValidationError::InvalidMaxBodyBytes);
        }
        if self.summary_days == 0 || self.summary_days > MAX_SUMMARY_DAYS {
            return Err(ValidationError::InvalidSummaryDays);
        }
        if let SinkConfig::Memory { max_records: 0 } = self.sink {
            return Err(ValidationError::InvalidMaxRecords);
        }
        Ok(())
    }

    /// Applies the value of the `PORT` environment variable, if any, to the
    /// public listener.
    pub fn override_port(&mut self, port: Option<&str>) -> Result<(), ValidationError> {
        if let Some(port) = port {
            self.listener.port = port
                .trim()
                .parse()
                .map_err(|_| ValidationError::InvalidPortOverride(port.to_string()))?;
        }
        Ok(())
    }
}

fn default_listener() -> Listener {
    Listener {
        host: "0.0.0.0".into(),
        port: 8080,
    }
}

fn default_admin_listener() -> Listener {
    Listener {
        host: "127.0.0.1".into(),
        port: 8081,
    }
}

fn default_max_body_bytes() -> usize {
    64 * 1024
}

fn default_summary_days() -> u32 {
    7
}

fn default_max_records() -> usize {
    100_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.listener.port, 8080);
        assert_eq!(config.admin_listener.host, "127.0.0.1");
        assert_eq!(config.max_body_bytes, 65536);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_sink_config() {
        let yaml = r#"
listener:
  host: 127.0.0.1
  port: 9000
sink:
  type: memory
  max_records: 10
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.sink, SinkConfig::Memory { max_records: 10 });
        assert_eq!(config.listener.port, 9000);

        let config: Config = serde_yaml::from_str("sink:\n  type: log\n").unwrap();
        assert_eq!(config.sink, SinkConfig::Log);

        assert!(serde_yaml::from_str::<Config>("sink:\n  type: bigquery\n").is_err());
    }

    #[test]
    fn test_validate() {
        let mut config = Config::default();
        config.listener.port = 0;
        assert_eq!(config.validate(), Err(ValidationError::InvalidPort));

        let mut config = Config::default();
        config.admin_listener.port = 0;
        assert_eq!(config.validate(), Err(ValidationError::InvalidPort));

        let config = Config {
            sink: SinkConfig::Memory { max_records: 0 },
            ..Config::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidMaxRecords));

        let config = Config {
            summary_days: 0,
            ..Config::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidSummaryDays));

        let config = Config {
            summary_days: u32::MAX,
            ..Config::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidSummaryDays));

        let config = Config {
            summary_days: MAX_SUMMARY_DAYS,
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_port_override() {
        let mut config = Config::default();
        config.override_port(None).unwrap();
        assert_eq!(config.listener.port, 8080);

        config.override_port(Some("3000")).unwrap();
        assert_eq!(config.listener.port, 3000);

        assert_eq!(
            config.override_port(Some("http")),
            Err(ValidationError::InvalidPortOverride("http".into()))
        );
    }
}
