use std::path::PathBuf;

/// Logging settings, resolved from `LOG_LEVEL`, `LOG_DIR` and `ENVIRONMENT`.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Level for this crate's own events when `RUST_LOG` is unset.
    pub level: String,
    /// Daily-rolling log files are written here when set.
    pub dir: Option<PathBuf>,
    /// JSON lines instead of the pretty console format.
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "debug".to_string(),
            dir: None,
            json: false,
        }
    }
}

impl LogConfig {
    pub fn filter_directive(&self) -> String {
        format!("hackerhire_backend={},tower_http=debug", self.level)
    }
}
