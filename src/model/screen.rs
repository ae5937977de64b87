use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::model::{
    generate_id, Id, JsonMap, LifecycleStatus, Position, PositionPatch,
};

/// One page/view within an app, positioned on the builder canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Screen {
    pub id: Id,
    pub application_id: Id,
    /// Free-form label/type object shown in the canvas tree
    #[serde(default = "default_screen_data")]
    pub data: JsonMap,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub hidden: bool,
    /// Free-form nested component payload kept verbatim for the builder UI
    #[serde(default = "default_components")]
    pub components: serde_json::Value,
    #[serde(default)]
    pub status: LifecycleStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub fn default_screen_data() -> JsonMap {
    json!({"label": "Screen-1", "type": "screen"})
        .as_object()
        .cloned()
        .unwrap_or_default()
}

fn default_components() -> serde_json::Value {
    json!([])
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewScreen {
    pub application_id: Option<Id>,
    pub data: Option<JsonMap>,
    pub position: Option<Position>,
    pub hidden: Option<bool>,
    pub components: Option<serde_json::Value>,
}

impl NewScreen {
    pub fn into_screen(self, application_id: Id) -> Screen {
        let now = Utc::now();
        Screen {
            id: generate_id(),
            application_id,
            data: self.data.unwrap_or_else(default_screen_data),
            position: self.position.unwrap_or_default(),
            hidden: self.hidden.unwrap_or(false),
            components: self.components.unwrap_or_else(default_components),
            status: LifecycleStatus::Draft,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial screen update; `data` and `position` merge key-wise with the
/// stored values, every other supplied field replaces
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenUpdate {
    pub data: Option<JsonMap>,
    pub position: Option<PositionPatch>,
    pub hidden: Option<bool>,
    pub components: Option<serde_json::Value>,
    pub status: Option<LifecycleStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screen_defaults_match_builder_conventions() {
        let new_screen: NewScreen =
            serde_json::from_str(r#"{"applicationId": "app-1"}"#).unwrap();
        let screen = new_screen.into_screen("app-1".to_string());

        assert_eq!(screen.data["label"], "Screen-1");
        assert_eq!(screen.data["type"], "screen");
        assert_eq!(screen.position, Position::default());
        assert!(!screen.hidden);
        assert_eq!(screen.components, serde_json::json!([]));
        assert_eq!(screen.status, LifecycleStatus::Draft);
    }
}
