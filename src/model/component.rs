use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::model::{
    generate_id, merge, merge_layers, nullable_field, ComponentType, Id, JsonMap,
    LifecycleStatus, Position, PositionPatch,
};

/// The fixed set of component kinds the builder palette offers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    Button,
    Input,
    Textarea,
    Text,
    Image,
    Container,
    Div,
    Form,
    Label,
    Select,
    Checkbox,
    Radio,
    Link,
    Icon,
    Card,
    Header,
    Footer,
    Navbar,
    Sidebar,
    Modal,
    Dropdown,
    Table,
    List,
    Video,
    Audio,
    Map,
    Chart,
    Custom,
}

impl ComponentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Button => "button",
            ComponentKind::Input => "input",
            ComponentKind::Textarea => "textarea",
            ComponentKind::Text => "text",
            ComponentKind::Image => "image",
            ComponentKind::Container => "container",
            ComponentKind::Div => "div",
            ComponentKind::Form => "form",
            ComponentKind::Label => "label",
            ComponentKind::Select => "select",
            ComponentKind::Checkbox => "checkbox",
            ComponentKind::Radio => "radio",
            ComponentKind::Link => "link",
            ComponentKind::Icon => "icon",
            ComponentKind::Card => "card",
            ComponentKind::Header => "header",
            ComponentKind::Footer => "footer",
            ComponentKind::Navbar => "navbar",
            ComponentKind::Sidebar => "sidebar",
            ComponentKind::Modal => "modal",
            ComponentKind::Dropdown => "dropdown",
            ComponentKind::Table => "table",
            ComponentKind::List => "list",
            ComponentKind::Video => "video",
            ComponentKind::Audio => "audio",
            ComponentKind::Map => "map",
            ComponentKind::Chart => "chart",
            ComponentKind::Custom => "custom",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_value(serde_json::Value::String(s.to_string()))
            .map_err(|_| format!("unknown component kind: {}", s))
    }
}

/// Fixed CSS-like style schema every component carries. All values are kept
/// as strings so the builder can round-trip whatever units the user typed;
/// anything outside the schema goes into the `custom` bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Styles {
    // Layout
    pub margin: String,
    pub margin_top: String,
    pub margin_right: String,
    pub margin_bottom: String,
    pub margin_left: String,
    pub padding: String,
    pub padding_top: String,
    pub padding_right: String,
    pub padding_bottom: String,
    pub padding_left: String,

    // Size
    pub width: String,
    pub height: String,
    pub min_width: String,
    pub min_height: String,
    pub max_width: String,
    pub max_height: String,

    // Display
    pub display: String,
    pub flex_direction: String,
    pub justify_content: String,
    pub align_items: String,
    pub flex_wrap: String,
    pub gap: String,

    // Colors
    pub color: String,
    pub background_color: String,
    pub border_color: String,

    // Border
    pub border: String,
    pub border_width: String,
    pub border_style: String,
    pub border_radius: String,
    pub border_top_left_radius: String,
    pub border_top_right_radius: String,
    pub border_bottom_left_radius: String,
    pub border_bottom_right_radius: String,

    // Typography
    pub font_size: String,
    pub font_weight: String,
    pub font_family: String,
    pub line_height: String,
    pub text_align: String,
    pub text_decoration: String,
    pub text_transform: String,
    pub letter_spacing: String,

    // Effects
    pub opacity: String,
    pub box_shadow: String,
    pub transform: String,
    pub transition: String,

    // Position
    pub position: String,
    pub top: String,
    pub right: String,
    pub bottom: String,
    pub left: String,
    pub z_index: String,

    // Overflow
    pub overflow: String,
    pub overflow_x: String,
    pub overflow_y: String,

    /// Free-form bag for style properties outside the fixed schema
    pub custom: JsonMap,
}

impl Default for Styles {
    fn default() -> Self {
        let zero = || "0".to_string();
        let auto = || "auto".to_string();
        let none = || "none".to_string();
        let normal = || "normal".to_string();
        let visible = || "visible".to_string();
        Self {
            margin: zero(),
            margin_top: zero(),
            margin_right: zero(),
            margin_bottom: zero(),
            margin_left: zero(),
            padding: zero(),
            padding_top: zero(),
            padding_right: zero(),
            padding_bottom: zero(),
            padding_left: zero(),
            width: auto(),
            height: auto(),
            min_width: auto(),
            min_height: auto(),
            max_width: none(),
            max_height: none(),
            display: "block".to_string(),
            flex_direction: "row".to_string(),
            justify_content: "flex-start".to_string(),
            align_items: "stretch".to_string(),
            flex_wrap: "nowrap".to_string(),
            gap: zero(),
            color: "#000000".to_string(),
            background_color: "transparent".to_string(),
            border_color: "#000000".to_string(),
            border: none(),
            border_width: zero(),
            border_style: "solid".to_string(),
            border_radius: zero(),
            border_top_left_radius: zero(),
            border_top_right_radius: zero(),
            border_bottom_left_radius: zero(),
            border_bottom_right_radius: zero(),
            font_size: "16px".to_string(),
            font_weight: normal(),
            font_family: "inherit".to_string(),
            line_height: normal(),
            text_align: "left".to_string(),
            text_decoration: none(),
            text_transform: none(),
            letter_spacing: normal(),
            opacity: "1".to_string(),
            box_shadow: none(),
            transform: none(),
            transition: none(),
            position: "static".to_string(),
            top: auto(),
            right: auto(),
            bottom: auto(),
            left: auto(),
            z_index: auto(),
            overflow: visible(),
            overflow_x: visible(),
            overflow_y: visible(),
            custom: JsonMap::new(),
        }
    }
}

impl Styles {
    pub fn to_map(&self) -> JsonMap {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => JsonMap::new(),
        }
    }

    /// Rebuilds a `Styles` from a merged map. Keys outside the schema are
    /// dropped (the `custom` bag is the escape hatch), missing keys come
    /// back as their static defaults.
    pub fn from_map(map: JsonMap) -> Result<Styles, serde_json::Error> {
        serde_json::from_value(serde_json::Value::Object(map))
    }

    /// `{...self, ...overlay}` key-wise; the overlay must already be validated
    pub fn merged_with(&self, overlay: &JsonMap) -> Result<Styles, serde_json::Error> {
        Styles::from_map(merge(&self.to_map(), overlay))
    }

    /// Checks an incoming overlay against the schema: every named style must
    /// be a string, `custom` must be an object. Returns one entry per
    /// offending field, empty when the overlay is acceptable.
    pub fn validate_overlay(overlay: &JsonMap) -> BTreeMap<String, String> {
        let mut errors = BTreeMap::new();
        for (key, value) in overlay {
            if key == "custom" {
                if !value.is_object() {
                    errors.insert(key.clone(), "custom styles must be an object".to_string());
                }
            } else if !value.is_string() {
                errors.insert(key.clone(), format!("{} must be a string", key));
            }
        }
        errors
    }
}

/// A UI element instance on a screen, typed, styled, optionally nested
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    pub id: Id,
    pub screen_id: Id,
    pub application_id: Id,
    #[serde(rename = "type")]
    pub kind: ComponentKind,
    #[serde(default)]
    pub data: JsonMap,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub styles: Styles,
    #[serde(default)]
    pub properties: JsonMap,
    pub parent_id: Option<Id>,
    #[serde(default)]
    pub children: Vec<Id>,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub status: LifecycleStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Component creation payload. `styles`/`properties`/`data` are caller
/// overlays merged over the type template at creation time.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComponent {
    pub screen_id: Option<Id>,
    pub application_id: Option<Id>,
    #[serde(rename = "type")]
    pub kind: Option<ComponentKind>,
    pub data: Option<JsonMap>,
    pub position: Option<Position>,
    pub styles: Option<JsonMap>,
    pub properties: Option<JsonMap>,
    pub parent_id: Option<Id>,
    pub order: Option<i64>,
    pub hidden: Option<bool>,
}

impl NewComponent {
    /// Assembles the stored component: caller values win per key over the
    /// type template, which wins over the static defaults. An absent
    /// template contributes nothing.
    pub fn assemble(
        self,
        screen_id: Id,
        application_id: Id,
        kind: ComponentKind,
        template: Option<&ComponentType>,
    ) -> Result<Component, serde_json::Error> {
        let empty = JsonMap::new();
        let (default_styles, default_properties, default_data) = match template {
            Some(t) => (&t.default_styles, &t.default_properties, &t.default_data),
            None => (&empty, &empty, &empty),
        };

        let static_defaults = Styles::default().to_map();
        let styles = Styles::from_map(merge_layers([
            &static_defaults,
            default_styles,
            self.styles.as_ref().unwrap_or(&empty),
        ]))?;
        let properties = merge(default_properties, self.properties.as_ref().unwrap_or(&empty));
        let data = merge(default_data, self.data.as_ref().unwrap_or(&empty));

        let now = Utc::now();
        Ok(Component {
            id: generate_id(),
            screen_id,
            application_id,
            kind,
            data,
            position: self.position.unwrap_or_default(),
            styles,
            properties,
            parent_id: self.parent_id,
            children: Vec::new(),
            order: self.order.unwrap_or(0),
            // Components start invisible until the builder shows them
            hidden: self.hidden.unwrap_or(true),
            status: LifecycleStatus::Draft,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Partial component update. `styles`/`data`/`position` merge key-wise,
/// everything else replaces when present. `parentId` accepts an explicit
/// null to detach the component from its parent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentUpdate {
    #[serde(rename = "type")]
    pub kind: Option<ComponentKind>,
    pub data: Option<JsonMap>,
    pub position: Option<PositionPatch>,
    pub styles: Option<JsonMap>,
    pub properties: Option<JsonMap>,
    #[serde(default, deserialize_with = "nullable_field")]
    pub parent_id: Option<Option<Id>>,
    pub children: Option<Vec<Id>>,
    pub order: Option<i64>,
    pub hidden: Option<bool>,
    pub status: Option<LifecycleStatus>,
    pub application_id: Option<Id>,
}

/// Display summary used when resolving a component's immediate parent and
/// children; single-item reads also carry the styles
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSummary {
    pub id: Id,
    #[serde(rename = "type")]
    pub kind: ComponentKind,
    pub data: JsonMap,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub styles: Option<Styles>,
}

impl Component {
    pub fn summary(&self, with_styles: bool) -> ComponentSummary {
        ComponentSummary {
            id: self.id.clone(),
            kind: self.kind,
            data: self.data.clone(),
            styles: with_styles.then(|| self.styles.clone()),
        }
    }
}
