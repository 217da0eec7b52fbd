//! Intent recognition configuration from TOML (`[nlp]` section)

use serde::{Deserialize, Serialize};

/// Raw NLP configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileNlpConfig {
    /// Matches below this confidence are reported as not understood.
    pub confidence_floor: f32,
}

impl Default for FileNlpConfig {
    fn default() -> Self {
        Self {
            confidence_floor: 0.5,
        }
    }
}
