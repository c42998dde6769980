/// Configuration for the tree engine
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Upper bound accepted for `max_depth`; anything deeper is a corrupted tree
const MAX_SUPPORTED_DEPTH: usize = 4096;

/// Runtime configuration for [`crate::explorer::FileExplorer`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExplorerConfig {
    /// Prefix that turns a folder id into its reparent drop-target identity
    /// (a folder is both a sortable item and a droppable body)
    pub folder_drop_prefix: String,

    /// Droppable id reported for the root drop zone; collisions with it are
    /// ignored because the zone is detected geometrically
    pub root_zone_id: String,

    /// Restore the pre-mutation state when persistence rejects a mutation
    pub rollback_on_failure: bool,

    /// Maximum folder nesting walked by recursive derivations
    pub max_depth: usize,

    /// Capacity of the tree event broadcast channel
    pub event_channel_capacity: usize,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            folder_drop_prefix: "folder-drop:".to_string(),
            root_zone_id: "root-drop-zone".to_string(),
            rollback_on_failure: true,
            max_depth: 256,
            event_channel_capacity: 128,
        }
    }
}

impl ExplorerConfig {
    /// Parse a JSON config; missing fields take their defaults
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.folder_drop_prefix.is_empty() {
            return Err(ConfigError::Invalid(
                "folder_drop_prefix cannot be empty".to_string(),
            ));
        }

        if self.root_zone_id.is_empty() {
            return Err(ConfigError::Invalid(
                "root_zone_id cannot be empty".to_string(),
            ));
        }

        if self.root_zone_id.starts_with(&self.folder_drop_prefix) {
            return Err(ConfigError::Invalid(
                "root_zone_id cannot live in the folder drop namespace".to_string(),
            ));
        }

        if self.max_depth == 0 || self.max_depth > MAX_SUPPORTED_DEPTH {
            return Err(ConfigError::Invalid(format!(
                "max_depth must be between 1 and {}",
                MAX_SUPPORTED_DEPTH
            )));
        }

        if self.event_channel_capacity == 0 {
            return Err(ConfigError::Invalid(
                "event_channel_capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
