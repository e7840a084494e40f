pub mod subjects;
pub mod verify;

use idc_core::config::{ConfigError, HarnessConfig};

/// Load config from the given path, or the default location when none is given.
pub fn load_config(path: Option<&str>) -> Result<HarnessConfig, ConfigError> {
    match path {
        Some(path) => HarnessConfig::load_from(path),
        None => HarnessConfig::load(),
    }
}
