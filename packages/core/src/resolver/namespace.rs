//! Droppable identity namespace
//!
//! A folder is both a sortable item (identity = its id) and a reparent drop
//! target (identity = prefix + id). The two spaces are kept apart by the
//! prefix and mapped back to plain ids before anything touches the model.

use crate::config::ExplorerConfig;

/// Parsed droppable identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DroppableId<'a> {
    FolderBody(&'a str),
    RootZone,
    Item(&'a str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppableNamespace {
    folder_prefix: String,
    root_zone_id: String,
}

impl Default for DroppableNamespace {
    fn default() -> Self {
        Self::from_config(&ExplorerConfig::default())
    }
}

impl DroppableNamespace {
    pub fn new(folder_prefix: impl Into<String>, root_zone_id: impl Into<String>) -> Self {
        Self {
            folder_prefix: folder_prefix.into(),
            root_zone_id: root_zone_id.into(),
        }
    }

    pub fn from_config(config: &ExplorerConfig) -> Self {
        Self::new(&config.folder_drop_prefix, &config.root_zone_id)
    }

    /// Drop-target identity for a folder body
    pub fn folder_drop_id(&self, folder_id: &str) -> String {
        format!("{}{}", self.folder_prefix, folder_id)
    }

    pub fn root_zone_id(&self) -> &str {
        &self.root_zone_id
    }

    pub fn parse<'a>(&self, droppable_id: &'a str) -> DroppableId<'a> {
        if droppable_id == self.root_zone_id {
            return DroppableId::RootZone;
        }
        match droppable_id.strip_prefix(self.folder_prefix.as_str()) {
            Some(folder_id) if !folder_id.is_empty() => DroppableId::FolderBody(folder_id),
            _ => DroppableId::Item(droppable_id),
        }
    }
}
