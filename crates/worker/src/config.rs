use std::path::PathBuf;

use ocap_storage::MemoryConfig;

/// Invalid recorder configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got {value:?}")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Subscriber output format for the binary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Recorder configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Directory artifacts are written to (default: `./recordings`).
    pub output_dir: PathBuf,
    /// Gzip artifacts (default: `true`).
    pub compress_output: bool,
    /// Stamped onto every mission and answered by `:VERSION:`.
    pub extension_version: String,
    /// Build identifier written to artifacts (default: `unknown`).
    pub extension_build: String,
    /// Queue depth for high-rate state streams (default: `4096`).
    pub state_queue_depth: usize,
    /// Queue depth for event streams (default: `1024`).
    pub event_queue_depth: usize,
    /// Queue depth for `:DELETE:MARKER:` (default: `64`).
    pub delete_queue_depth: usize,
    /// Drop `:FPS:` samples instead of blocking when its queue is full.
    pub drop_telemetry: bool,
    pub log_format: LogFormat,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./recordings"),
            compress_output: true,
            extension_version: env!("CARGO_PKG_VERSION").to_string(),
            extension_build: "unknown".to_string(),
            state_queue_depth: 4096,
            event_queue_depth: 1024,
            delete_queue_depth: 64,
            drop_telemetry: true,
            log_format: LogFormat::Text,
        }
    }
}

impl RecorderConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default         |
    /// |---------------------------|-----------------|
    /// | `OCAP_OUTPUT_DIR`         | `./recordings`  |
    /// | `OCAP_COMPRESS_OUTPUT`    | `true`          |
    /// | `OCAP_EXTENSION_VERSION`  | crate version   |
    /// | `OCAP_EXTENSION_BUILD`    | `unknown`       |
    /// | `OCAP_STATE_QUEUE_DEPTH`  | `4096`          |
    /// | `OCAP_EVENT_QUEUE_DEPTH`  | `1024`          |
    /// | `OCAP_DELETE_QUEUE_DEPTH` | `64`            |
    /// | `OCAP_DROP_TELEMETRY`     | `true`          |
    /// | `OCAP_LOG_FORMAT`         | `text`          |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let output_dir = lookup("OCAP_OUTPUT_DIR")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.output_dir);

        let extension_version = lookup("OCAP_EXTENSION_VERSION")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.extension_version);

        let extension_build = lookup("OCAP_EXTENSION_BUILD")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.extension_build);

        let log_format = match lookup("OCAP_LOG_FORMAT") {
            None => defaults.log_format,
            Some(v) => match v.trim().to_ascii_lowercase().as_str() {
                "text" | "" => LogFormat::Text,
                "json" => LogFormat::Json,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "OCAP_LOG_FORMAT",
                        expected: "`text` or `json`",
                        value: v,
                    })
                }
            },
        };

        Ok(Self {
            output_dir,
            compress_output: bool_var(&lookup, "OCAP_COMPRESS_OUTPUT", defaults.compress_output)?,
            extension_version,
            extension_build,
            state_queue_depth: depth_var(&lookup, "OCAP_STATE_QUEUE_DEPTH", defaults.state_queue_depth)?,
            event_queue_depth: depth_var(&lookup, "OCAP_EVENT_QUEUE_DEPTH", defaults.event_queue_depth)?,
            delete_queue_depth: depth_var(
                &lookup,
                "OCAP_DELETE_QUEUE_DEPTH",
                defaults.delete_queue_depth,
            )?,
            drop_telemetry: bool_var(&lookup, "OCAP_DROP_TELEMETRY", defaults.drop_telemetry)?,
            log_format,
        })
    }

    pub fn memory_config(&self) -> MemoryConfig {
        MemoryConfig {
            output_dir: self.output_dir.clone(),
            compress_output: self.compress_output,
        }
    }
}

fn bool_var(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: bool,
) -> Result<bool, ConfigError> {
    let Some(value) = lookup(var) else {
        return Ok(default);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            var,
            expected: "a boolean",
            value,
        }),
    }
}

fn depth_var(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: usize,
) -> Result<usize, ConfigError> {
    let Some(value) = lookup(var) else {
        return Ok(default);
    };
    match value.trim().parse::<usize>() {
        Ok(depth) if depth > 0 => Ok(depth),
        _ => Err(ConfigError::Invalid {
            var,
            expected: "a positive integer",
            value,
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<RecorderConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RecorderConfig::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = load(&[]).expect("defaults should load");
        assert_eq!(config.output_dir, PathBuf::from("./recordings"));
        assert!(config.compress_output);
        assert_eq!(config.extension_version, env!("CARGO_PKG_VERSION"));
        assert_eq!(config.extension_build, "unknown");
        assert_eq!(config.state_queue_depth, 4096);
        assert_eq!(config.event_queue_depth, 1024);
        assert_eq!(config.delete_queue_depth, 64);
        assert!(config.drop_telemetry);
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn overrides_are_read() {
        let config = load(&[
            ("OCAP_OUTPUT_DIR", "/tmp/replays"),
            ("OCAP_COMPRESS_OUTPUT", "false"),
            ("OCAP_EXTENSION_VERSION", "5.2.0"),
            ("OCAP_EXTENSION_BUILD", "2026-10-01"),
            ("OCAP_STATE_QUEUE_DEPTH", "10000"),
            ("OCAP_DROP_TELEMETRY", "0"),
            ("OCAP_LOG_FORMAT", "JSON"),
        ])
        .expect("overrides should load");
        assert_eq!(config.output_dir, PathBuf::from("/tmp/replays"));
        assert!(!config.compress_output);
        assert_eq!(config.extension_version, "5.2.0");
        assert_eq!(config.extension_build, "2026-10-01");
        assert_eq!(config.state_queue_depth, 10000);
        assert!(!config.drop_telemetry);
        assert_eq!(config.log_format, LogFormat::Json);

        let memory = config.memory_config();
        assert_eq!(memory.output_dir, PathBuf::from("/tmp/replays"));
        assert!(!memory.compress_output);
    }

    #[test]
    fn malformed_values_are_errors() {
        assert_matches!(
            load(&[("OCAP_STATE_QUEUE_DEPTH", "lots")]),
            Err(ConfigError::Invalid { var: "OCAP_STATE_QUEUE_DEPTH", .. })
        );
        assert_matches!(
            load(&[("OCAP_DELETE_QUEUE_DEPTH", "0")]),
            Err(ConfigError::Invalid { var: "OCAP_DELETE_QUEUE_DEPTH", .. })
        );
        assert_matches!(
            load(&[("OCAP_COMPRESS_OUTPUT", "maybe")]),
            Err(ConfigError::Invalid { var: "OCAP_COMPRESS_OUTPUT", .. })
        );
        assert_matches!(
            load(&[("OCAP_LOG_FORMAT", "xml")]),
            Err(ConfigError::Invalid { var: "OCAP_LOG_FORMAT", .. })
        );
    }
}
