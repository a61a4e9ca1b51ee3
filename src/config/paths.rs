use crate::config::ConfigError;
use std::path::PathBuf;

pub const GLOBAL_STATE_DIR: &str = ".jobgate";
pub const GLOBAL_SETTINGS_FILE_NAME: &str = "settings.yaml";
pub const SETTINGS_PATH_ENV: &str = "JOBGATE_SETTINGS_PATH";

pub fn default_state_root() -> Result<PathBuf, ConfigError> {
    let home = std::env::var_os("HOME").ok_or(ConfigError::HomeDirectoryUnavailable)?;
    Ok(PathBuf::from(home).join(GLOBAL_STATE_DIR))
}

pub fn default_settings_path() -> Result<PathBuf, ConfigError> {
    if let Some(path) = std::env::var_os(SETTINGS_PATH_ENV) {
        if !path.is_empty() {
            return Ok(PathBuf::from(path));
        }
    }
    Ok(default_state_root()?.join(GLOBAL_SETTINGS_FILE_NAME))
}
