use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub engine: EngineConfigValues,
    pub schema_limits: SchemaLimitsConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfigValues {
    pub max_depth: u32,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchemaLimitsConfig {
    pub max_entities: usize,
    pub max_actions_per_entity: usize,
    pub max_rule_depth: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub format: LogFormat,
    pub level: String,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

impl Default for EngineConfigValues {
    fn default() -> Self {
        Self {
            max_depth: 6,
            timeout_ms: 5_000,
        }
    }
}

impl Default for SchemaLimitsConfig {
    fn default() -> Self {
        Self {
            max_entities: 50,
            max_actions_per_entity: 30,
            max_rule_depth: 8,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            level: "warn".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            let contents = std::fs::read_to_string(path)
                .map_err(|e| ConfigError::ReadFile(path.display().to_string(), e.to_string()))?;
            toml::from_str::<AppConfig>(&contents)
                .map_err(|e| ConfigError::ParseToml(e.to_string()))?
        } else {
            AppConfig::default()
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("KRAALCHECK_ENGINE_MAX_DEPTH")
            && let Ok(n) = v.parse()
        {
            self.engine.max_depth = n;
        }
        if let Ok(v) = std::env::var("KRAALCHECK_ENGINE_TIMEOUT_MS")
            && let Ok(n) = v.parse()
        {
            self.engine.timeout_ms = n;
        }
        if let Ok(v) = std::env::var("KRAALCHECK_LOG_LEVEL") {
            self.log.level = v;
        }
        if let Ok(v) = std::env::var("KRAALCHECK_LOG_FORMAT") {
            match v.as_str() {
                "json" => self.log.format = LogFormat::Json,
                "pretty" => self.log.format = LogFormat::Pretty,
                _ => {}
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.max_depth == 0 {
            return Err(ConfigError::Validation(
                "engine.max_depth must be non-zero".to_string(),
            ));
        }
        if self.engine.timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "engine.timeout_ms must be non-zero".to_string(),
            ));
        }
        if self.schema_limits.max_rule_depth == 0 {
            return Err(ConfigError::Validation(
                "schema_limits.max_rule_depth must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn to_engine_config(&self) -> kraalcheck_core::engine::EngineConfig {
        kraalcheck_core::engine::EngineConfig {
            max_depth: self.engine.max_depth,
            timeout: Some(Duration::from_millis(self.engine.timeout_ms)),
        }
    }

    pub fn to_schema_limits(&self) -> kraalcheck_core::schema::SchemaLimits {
        kraalcheck_core::schema::SchemaLimits {
            max_entities: self.schema_limits.max_entities,
            max_actions_per_entity: self.schema_limits.max_actions_per_entity,
            max_rule_depth: self.schema_limits.max_rule_depth,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file '{0}': {1}")]
    ReadFile(String, String),

    #[error("failed to parse TOML config: {0}")]
    ParseToml(String),

    #[error("config validation failed: {0}")]
    Validation(String),
}
