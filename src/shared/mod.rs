pub mod logging;

pub use logging::{append_session_log, session_log_path};
