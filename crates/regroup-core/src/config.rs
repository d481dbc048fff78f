use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::Deserialize;

pub const DEFAULT_MIN_CONFIDENCE: f64 = 70.0;

/// Parameters for one scan/merge run.
#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    pub min_confidence: f64,
    pub dry_run: bool,
    pub log_file: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            dry_run: false,
            log_file: None,
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_confidence(self.min_confidence).map(|_| ())
    }
}

/// Load defaults, then an optional `Regroup.*` file, then `REGROUP_*` variables.
pub fn load_configuration() -> Result<RunConfig, ConfigError> {
    let builder = Config::builder()
        .set_default("min_confidence", DEFAULT_MIN_CONFIDENCE)?
        .set_default("dry_run", false)?
        .add_source(ConfigFile::with_name("Regroup").required(false))
        .add_source(Environment::with_prefix("REGROUP"))
        .build()?;
    let config = builder.try_deserialize::<RunConfig>()?;
    config.validate()?;
    Ok(config)
}

pub fn validate_confidence(value: f64) -> Result<f64, ConfigError> {
    if !(0.0..=100.0).contains(&value) {
        return Err(ConfigError::Message(format!(
            "min_confidence must be between 0 and 100, got {}",
            value
        )));
    }
    Ok(value)
}
