use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{generate_id, Id};

pub const MAX_APP_NAME_LENGTH: usize = 100;

/// Top-level project owning screens and a visual theme
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct App {
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub theme: Theme,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Named color/radius token set applied at the app level. Every field has a
/// literal default so a theme omitted at creation comes back fully populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    #[serde(default)]
    pub colors: ThemeColors,
    #[serde(default)]
    pub corner_radius: CornerRadius,
    #[serde(default = "default_theme_version")]
    pub version: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            colors: ThemeColors::default(),
            corner_radius: CornerRadius::default(),
            version: default_theme_version(),
        }
    }
}

fn default_theme_version() -> String {
    "1.0.0".to_string()
}

macro_rules! defaulted_strings {
    ($(#[$meta:meta])* $vis:vis struct $name:ident { $($field:ident => $default:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(rename_all = "camelCase", default)]
        $vis struct $name {
            $(pub $field: String,)+
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    $($field: $default.to_string(),)+
                }
            }
        }
    };
}

defaulted_strings! {
    /// The 19 named theme colors
    pub struct ThemeColors {
        primary => "#3b82f6",
        primary_light => "#93c5fd",
        primary_dark => "#1d4ed8",
        secondary => "#8b5cf6",
        secondary_light => "#c4b5fd",
        secondary_dark => "#6d28d9",
        accent => "#f59e0b",
        background => "#ffffff",
        surface => "#f8fafc",
        text_primary => "#0f172a",
        text_secondary => "#475569",
        text_disabled => "#94a3b8",
        border => "#e2e8f0",
        divider => "#cbd5e1",
        error => "#ef4444",
        warning => "#f97316",
        success => "#22c55e",
        info => "#0ea5e9",
        overlay => "rgba(15, 23, 42, 0.5)",
    }
}

defaulted_strings! {
    /// The 4 named corner-radius tokens
    pub struct CornerRadius {
        small => "4px",
        medium => "8px",
        large => "16px",
        full => "9999px",
    }
}

/// App creation payload; name is checked by the handler so a missing value
/// gets a named validation error instead of a deserialization failure
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewApp {
    pub name: Option<String>,
    pub theme: Option<Theme>,
}

impl NewApp {
    pub fn into_app(self, name: String) -> App {
        let now = Utc::now();
        App {
            id: generate_id(),
            name,
            theme: self.theme.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial app update: absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppUpdate {
    pub name: Option<String>,
    pub theme: Option<Theme>,
}
