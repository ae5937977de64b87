use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

pub type Id = String;

/// Free-form JSON object used for styles/properties/data payloads
pub type JsonMap = serde_json::Map<String, serde_json::Value>;

pub fn generate_id() -> Id {
    Uuid::new_v4().to_string()
}

/// Lifecycle status shared by screens and components
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleStatus {
    Draft,
    Published,
    Archived,
}

impl Default for LifecycleStatus {
    fn default() -> Self {
        LifecycleStatus::Draft
    }
}

/// Canvas position of a screen or component
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

impl Default for Position {
    fn default() -> Self {
        Self { x: 0.0, y: 0.0 }
    }
}

/// Partial position for PATCH updates; missing coordinates keep their stored value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
}

impl PositionPatch {
    pub fn apply_to(&self, current: Position) -> Position {
        Position {
            x: self.x.unwrap_or(current.x),
            y: self.y.unwrap_or(current.y),
        }
    }
}

/// Deserializes `Option<Option<T>>` so callers can distinguish an absent field
/// (outer None, no-op) from an explicit JSON null (Some(None), clears the field).
pub fn nullable_field<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
