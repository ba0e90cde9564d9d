//! Store configuration.

/// Base directory used when none is given.
pub const DEFAULT_BASE_DIR: &str = "db";

/// Configuration for opening a store.
#[derive(Debug, Clone)]
pub struct Config {
    /// Whether to create the base directory if it doesn't exist.
    pub create_if_missing: bool,

    /// Whether to fsync staged files before they are registered.
    pub sync_on_stage: bool,

    /// File name suffix that marks staged files in the base directory.
    pub staged_suffix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            sync_on_stage: false,
            staged_suffix: ".tmp".to_string(),
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to create the base directory if missing.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets whether staged files are synced to disk.
    #[must_use]
    pub const fn sync_on_stage(mut self, value: bool) -> Self {
        self.sync_on_stage = value;
        self
    }

    /// Sets the staged file suffix.
    ///
    /// Must not be empty; [`Store`](crate::Store) refuses to open with an
    /// empty suffix.
    #[must_use]
    pub fn staged_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.staged_suffix = suffix.into();
        self
    }
}
