use config::{
    builder::DefaultState, Config as ConfigLoader, ConfigBuilder, ConfigError, Environment, File,
    Map, Source,
};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Milliseconds between heartbeats on an idle stream
    pub heartbeat_interval_ms: u64,
    /// Chunks queued per client, and published events buffered per stream
    /// before a slow client starts losing them
    pub channel_capacity: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_ms: 15_000,
            channel_capacity: 256,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Environment variable prefix for each config section, e.g.
/// `STREAM_HEARTBEAT_INTERVAL_MS` sets `stream.heartbeat_interval_ms`.
const ENV_SECTIONS: [(&str, &str); 3] = [
    ("SERVER", "server"),
    ("STREAM", "stream"),
    ("LOG", "logging"),
];

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. Environment variables (with SERVER_, STREAM_, LOG_ prefixes)
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let builder = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false));

        Self::build(builder, None)
    }

    /// Apply environment overrides on top of `builder`, then deserialize and
    /// validate. `vars` replaces the process environment when given.
    fn build(
        mut builder: ConfigBuilder<DefaultState>,
        vars: Option<Map<String, String>>,
    ) -> Result<Self, ConfigError> {
        for (prefix, section) in ENV_SECTIONS {
            let overrides = ConfigLoader::builder()
                .add_source(
                    Environment::with_prefix(prefix)
                        .prefix_separator("_")
                        .try_parsing(true)
                        .source(vars.clone()),
                )
                .build()?
                .collect()?;

            for (key, value) in overrides {
                builder = builder.set_override(format!("{}.{}", section, key), value)?;
            }
        }

        let cfg: Config = builder.build()?.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = ConfigLoader::builder().add_source(File::from(path.as_ref()));

        let cfg: Config = builder.build()?.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stream.heartbeat_interval_ms == 0 {
            return Err(ConfigError::Message(
                "stream.heartbeat_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.stream.channel_capacity == 0 {
            return Err(ConfigError::Message(
                "stream.channel_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
