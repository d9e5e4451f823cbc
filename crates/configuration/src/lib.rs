use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use settings::{ExperimentSettings, Logging, Output, Reporting, Settings};

/// Prefix of the environment variables that override file settings,
/// e.g. `EMPIRIST__EXPERIMENT__RUNS=5`.
pub const ENV_PREFIX: &str = "EMPIRIST";

/// Loads the application configuration.
///
/// Built-in defaults are layered under the TOML file at `path` (which may be
/// absent) and `EMPIRIST__*` environment variables. The merged result is
/// deserialized into `Settings` and validated.
pub fn load_config(path: &Path) -> Result<Settings, ConfigError> {
    let builder = config::Config::builder()
        .set_default("output.directory", "data")?
        .set_default("output.separator", ";")?
        .set_default("reporting.window_capacity", 10)?
        .set_default("experiment.runs", 1)?
        .set_default("experiment.project", "Mess")?
        .set_default("logging.level", "info")?
        .add_source(config::File::from(path).required(false))
        .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()?;

    // Attempt to deserialize the entire configuration into our `Settings` struct
    let settings = builder.try_deserialize::<Settings>()?;
    settings.validate()?;

    tracing::debug!(path = %path.display(), "Configuration loaded");
    Ok(settings)
}
