use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{generate_id, ComponentKind, Id, JsonMap};

/// Palette grouping for the builder sidebar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentCategory {
    Basic,
    Form,
    Layout,
    Media,
    Navigation,
    Data,
    Custom,
}

impl Default for ComponentCategory {
    fn default() -> Self {
        ComponentCategory::Basic
    }
}

/// Template/registry entry supplying per-kind defaults consumed at
/// component creation. Read-mostly; seeded once via the bootstrap catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentType {
    pub id: Id,
    #[serde(rename = "type")]
    pub kind: ComponentKind,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub category: ComponentCategory,
    #[serde(default)]
    pub default_styles: JsonMap,
    #[serde(default)]
    pub default_properties: JsonMap,
    #[serde(default)]
    pub default_data: JsonMap,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_visible() -> bool {
    true
}

impl ComponentType {
    /// A catalog entry with empty default templates
    pub fn builtin(
        kind: ComponentKind,
        name: &str,
        category: ComponentCategory,
        icon: &str,
        order: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: generate_id(),
            kind,
            name: name.to_string(),
            description: String::new(),
            icon: icon.to_string(),
            category,
            default_styles: JsonMap::new(),
            default_properties: JsonMap::new(),
            default_data: JsonMap::new(),
            visible: true,
            order,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComponentType {
    #[serde(rename = "type")]
    pub kind: Option<ComponentKind>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub category: Option<ComponentCategory>,
    pub default_styles: Option<JsonMap>,
    pub default_properties: Option<JsonMap>,
    pub default_data: Option<JsonMap>,
    pub visible: Option<bool>,
    pub order: Option<i64>,
}

impl NewComponentType {
    pub fn into_component_type(self, kind: ComponentKind, name: String) -> ComponentType {
        let now = Utc::now();
        ComponentType {
            id: generate_id(),
            kind,
            name,
            description: self.description.unwrap_or_default(),
            icon: self.icon.unwrap_or_default(),
            category: self.category.unwrap_or_default(),
            default_styles: self.default_styles.unwrap_or_default(),
            default_properties: self.default_properties.unwrap_or_default(),
            default_data: self.default_data.unwrap_or_default(),
            visible: self.visible.unwrap_or(true),
            order: self.order.unwrap_or(0),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial component-type update; absent fields keep their stored value
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentTypeUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub category: Option<ComponentCategory>,
    pub default_styles: Option<JsonMap>,
    pub default_properties: Option<JsonMap>,
    pub default_data: Option<JsonMap>,
    pub visible: Option<bool>,
    pub order: Option<i64>,
}
