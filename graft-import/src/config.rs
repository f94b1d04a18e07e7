use graft_model::DEFAULT_IMPORT_DATE_FORMAT;
use serde::{Deserialize, Serialize};

/// Importer configuration, fixed when an [`Importer`](crate::Importer) is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Pattern for date attributes that declare no format of their own.
    pub default_date_format: String,
}

impl ImportConfig {
    #[must_use]
    pub fn with_default_date_format(mut self, pattern: &str) -> Self {
        self.default_date_format = pattern.to_string();
        self
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            default_date_format: DEFAULT_IMPORT_DATE_FORMAT.to_string(),
        }
    }
}
