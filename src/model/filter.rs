use serde::{Deserialize, Serialize};

use crate::model::{
    ComponentCategory, ComponentKind, Id, ImageCategory, ImageStatus, LifecycleStatus,
};

/// Query-string filter for app listings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppFilter {
    /// Case-insensitive name-contains match
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_id: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<LifecycleStatus>,
}

/// Component listing filter; provided fields combine by AND
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screen_id: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_id: Option<Id>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<ComponentKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<LifecycleStatus>,
}

impl ComponentFilter {
    pub fn for_screen(screen_id: Id) -> Self {
        Self {
            screen_id: Some(screen_id),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentTypeFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<ComponentCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<ImageCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ImageStatus>,
    /// Case-insensitive contains over name, description and alt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    /// Comma-separated; matches images carrying any of the listed tags
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
}

impl ImageFilter {
    pub fn tag_list(&self) -> Vec<String> {
        self.tags
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}
