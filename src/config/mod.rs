pub mod error;
pub mod load;
pub mod paths;
pub mod settings;

pub use crate::plan::ExtractionPolicy;
pub use error::ConfigError;
pub use load::{load_settings, load_settings_from};
pub use paths::{
    default_settings_path, default_state_root, GLOBAL_SETTINGS_FILE_NAME, GLOBAL_STATE_DIR,
    SETTINGS_PATH_ENV,
};
pub use settings::Settings;
