use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{PgPool, Row};

use crate::model::{
    App, AppFilter, Component, ComponentFilter, ComponentKind, ComponentType,
    ComponentTypeFilter, Id, Image, ImageFilter, JsonMap, Position, Screen, ScreenFilter,
    Styles, Theme,
};
use crate::store::traits::{
    AppStore, ComponentStore, ComponentTypeStore, ImageStore, ScreenStore, Store,
};

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new PostgreSQL store with the given database URL
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("Failed to create PostgreSQL connection pool")?;

        Ok(Self { pool })
    }

    /// Create the entity tables and unique indexes if they do not exist yet.
    /// The unique index names are load-bearing: the envelope layer maps them
    /// back to wire field names on constraint violations.
    pub async fn migrate(&self) -> Result<()> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS apps (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                theme JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )
            "#,
            "CREATE UNIQUE INDEX IF NOT EXISTS apps_name_key ON apps (name)",
            r#"
            CREATE TABLE IF NOT EXISTS screens (
                id TEXT PRIMARY KEY,
                application_id TEXT NOT NULL,
                data JSONB NOT NULL,
                position JSONB NOT NULL,
                hidden BOOLEAN NOT NULL,
                components JSONB NOT NULL,
                status TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )
            "#,
            "CREATE INDEX IF NOT EXISTS screens_application_id_idx ON screens (application_id)",
            "CREATE INDEX IF NOT EXISTS screens_status_idx ON screens (status)",
            r#"
            CREATE TABLE IF NOT EXISTS components (
                id TEXT PRIMARY KEY,
                screen_id TEXT NOT NULL,
                application_id TEXT NOT NULL,
                kind TEXT NOT NULL,
                data JSONB NOT NULL,
                position JSONB NOT NULL,
                styles JSONB NOT NULL,
                properties JSONB NOT NULL,
                parent_id TEXT,
                children JSONB NOT NULL,
                order_index BIGINT NOT NULL,
                hidden BOOLEAN NOT NULL,
                status TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )
            "#,
            "CREATE INDEX IF NOT EXISTS components_screen_id_idx ON components (screen_id)",
            "CREATE INDEX IF NOT EXISTS components_parent_id_idx ON components (parent_id)",
            "CREATE INDEX IF NOT EXISTS components_screen_order_idx ON components (screen_id, order_index)",
            "CREATE INDEX IF NOT EXISTS components_kind_idx ON components (kind)",
            r#"
            CREATE TABLE IF NOT EXISTS component_types (
                id TEXT PRIMARY KEY,
                kind TEXT NOT NULL,
                name TEXT NOT NULL,
                description TEXT NOT NULL,
                icon TEXT NOT NULL,
                category TEXT NOT NULL,
                default_styles JSONB NOT NULL,
                default_properties JSONB NOT NULL,
                default_data JSONB NOT NULL,
                visible BOOLEAN NOT NULL,
                order_index BIGINT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )
            "#,
            "CREATE UNIQUE INDEX IF NOT EXISTS component_types_type_key ON component_types (kind)",
            r#"
            CREATE TABLE IF NOT EXISTS images (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                original_name TEXT NOT NULL,
                filename TEXT NOT NULL,
                url TEXT NOT NULL,
                cloudinary_public_id TEXT NOT NULL,
                cloudinary_secure_url TEXT NOT NULL,
                mime_type TEXT NOT NULL,
                size BIGINT NOT NULL,
                width BIGINT,
                height BIGINT,
                category TEXT NOT NULL,
                tags JSONB NOT NULL,
                description TEXT NOT NULL,
                alt TEXT NOT NULL,
                status TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )
            "#,
            "CREATE UNIQUE INDEX IF NOT EXISTS images_cloudinary_public_id_key ON images (cloudinary_public_id)",
            "CREATE INDEX IF NOT EXISTS images_category_idx ON images (category)",
            "CREATE INDEX IF NOT EXISTS images_created_at_idx ON images (created_at DESC)",
        ];

        for statement in statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .context("Failed to run schema migration")?;
        }

        Ok(())
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Unit enums travel as their wire string in TEXT columns
fn enum_to_str<T: Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(s)) => s,
        _ => String::new(),
    }
}

fn enum_from_str<T: DeserializeOwned>(raw: &str) -> Result<T> {
    serde_json::from_value(serde_json::Value::String(raw.to_string()))
        .with_context(|| format!("Unrecognized stored enum value: {}", raw))
}

fn app_from_row(row: &PgRow) -> Result<App> {
    Ok(App {
        id: row.get("id"),
        name: row.get("name"),
        theme: row.get::<Json<Theme>, _>("theme").0,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn screen_from_row(row: &PgRow) -> Result<Screen> {
    Ok(Screen {
        id: row.get("id"),
        application_id: row.get("application_id"),
        data: row.get::<Json<JsonMap>, _>("data").0,
        position: row.get::<Json<Position>, _>("position").0,
        hidden: row.get("hidden"),
        components: row.get::<Json<serde_json::Value>, _>("components").0,
        status: enum_from_str(row.get::<String, _>("status").as_str())?,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn component_from_row(row: &PgRow) -> Result<Component> {
    Ok(Component {
        id: row.get("id"),
        screen_id: row.get("screen_id"),
        application_id: row.get("application_id"),
        kind: enum_from_str(row.get::<String, _>("kind").as_str())?,
        data: row.get::<Json<JsonMap>, _>("data").0,
        position: row.get::<Json<Position>, _>("position").0,
        styles: row.get::<Json<Styles>, _>("styles").0,
        properties: row.get::<Json<JsonMap>, _>("properties").0,
        parent_id: row.get("parent_id"),
        children: row.get::<Json<Vec<Id>>, _>("children").0,
        order: row.get("order_index"),
        hidden: row.get("hidden"),
        status: enum_from_str(row.get::<String, _>("status").as_str())?,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn component_type_from_row(row: &PgRow) -> Result<ComponentType> {
    Ok(ComponentType {
        id: row.get("id"),
        kind: enum_from_str(row.get::<String, _>("kind").as_str())?,
        name: row.get("name"),
        description: row.get("description"),
        icon: row.get("icon"),
        category: enum_from_str(row.get::<String, _>("category").as_str())?,
        default_styles: row.get::<Json<JsonMap>, _>("default_styles").0,
        default_properties: row.get::<Json<JsonMap>, _>("default_properties").0,
        default_data: row.get::<Json<JsonMap>, _>("default_data").0,
        visible: row.get("visible"),
        order: row.get("order_index"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn image_from_row(row: &PgRow) -> Result<Image> {
    Ok(Image {
        id: row.get("id"),
        name: row.get("name"),
        original_name: row.get("original_name"),
        filename: row.get("filename"),
        url: row.get("url"),
        cloudinary_public_id: row.get("cloudinary_public_id"),
        cloudinary_secure_url: row.get("cloudinary_secure_url"),
        mime_type: row.get("mime_type"),
        size: row.get("size"),
        width: row.get("width"),
        height: row.get("height"),
        category: enum_from_str(row.get::<String, _>("category").as_str())?,
        tags: row.get::<Json<Vec<String>>, _>("tags").0,
        description: row.get("description"),
        alt: row.get("alt"),
        status: enum_from_str(row.get::<String, _>("status").as_str())?,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[async_trait::async_trait]
impl AppStore for PostgresStore {
    async fn get_app(&self, id: &Id) -> Result<Option<App>> {
        let row = sqlx::query("SELECT * FROM apps WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch app")?;

        row.as_ref().map(app_from_row).transpose()
    }

    async fn find_app_by_name(&self, name: &str) -> Result<Option<App>> {
        let row = sqlx::query("SELECT * FROM apps WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to look up app by name")?;

        row.as_ref().map(app_from_row).transpose()
    }

    async fn list_apps(&self, filter: &AppFilter) -> Result<Vec<App>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM apps
            WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%')
            ORDER BY created_at DESC
            "#,
        )
        .bind(filter.search.as_deref())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list apps")?;

        rows.iter().map(app_from_row).collect()
    }

    async fn upsert_app(&self, app: App) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO apps (id, name, theme, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                theme = EXCLUDED.theme,
                updated_at = NOW()
            "#,
        )
        .bind(&app.id)
        .bind(&app.name)
        .bind(Json(&app.theme))
        .bind(app.created_at)
        .bind(app.updated_at)
        .execute(&self.pool)
        .await
        .context("Failed to upsert app")?;

        Ok(())
    }

    async fn delete_app(&self, id: &Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM apps WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete app")?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait::async_trait]
impl ScreenStore for PostgresStore {
    async fn get_screen(&self, id: &Id) -> Result<Option<Screen>> {
        let row = sqlx::query("SELECT * FROM screens WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch screen")?;

        row.as_ref().map(screen_from_row).transpose()
    }

    async fn list_screens(&self, filter: &ScreenFilter) -> Result<Vec<Screen>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM screens
            WHERE ($1::text IS NULL OR application_id = $1)
              AND ($2::text IS NULL OR status = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(filter.application_id.as_deref())
        .bind(filter.status.as_ref().map(enum_to_str))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list screens")?;

        rows.iter().map(screen_from_row).collect()
    }

    async fn upsert_screen(&self, screen: Screen) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO screens (id, application_id, data, position, hidden, components, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO UPDATE SET
                application_id = EXCLUDED.application_id,
                data = EXCLUDED.data,
                position = EXCLUDED.position,
                hidden = EXCLUDED.hidden,
                components = EXCLUDED.components,
                status = EXCLUDED.status,
                updated_at = NOW()
            "#,
        )
        .bind(&screen.id)
        .bind(&screen.application_id)
        .bind(Json(&screen.data))
        .bind(Json(&screen.position))
        .bind(screen.hidden)
        .bind(Json(&screen.components))
        .bind(enum_to_str(&screen.status))
        .bind(screen.created_at)
        .bind(screen.updated_at)
        .execute(&self.pool)
        .await
        .context("Failed to upsert screen")?;

        Ok(())
    }

    async fn delete_screen(&self, id: &Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM screens WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete screen")?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait::async_trait]
impl ComponentStore for PostgresStore {
    async fn get_component(&self, id: &Id) -> Result<Option<Component>> {
        let row = sqlx::query("SELECT * FROM components WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch component")?;

        row.as_ref().map(component_from_row).transpose()
    }

    async fn list_components(&self, filter: &ComponentFilter) -> Result<Vec<Component>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM components
            WHERE ($1::text IS NULL OR screen_id = $1)
              AND ($2::text IS NULL OR application_id = $2)
              AND ($3::text IS NULL OR kind = $3)
              AND ($4::text IS NULL OR parent_id = $4)
              AND ($5::text IS NULL OR status = $5)
            ORDER BY order_index ASC, created_at DESC
            "#,
        )
        .bind(filter.screen_id.as_deref())
        .bind(filter.application_id.as_deref())
        .bind(filter.kind.map(|k| k.as_str()))
        .bind(filter.parent_id.as_deref())
        .bind(filter.status.as_ref().map(enum_to_str))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list components")?;

        rows.iter().map(component_from_row).collect()
    }

    async fn upsert_component(&self, component: Component) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO components (
                id, screen_id, application_id, kind, data, position, styles, properties,
                parent_id, children, order_index, hidden, status, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            ON CONFLICT (id) DO UPDATE SET
                screen_id = EXCLUDED.screen_id,
                application_id = EXCLUDED.application_id,
                kind = EXCLUDED.kind,
                data = EXCLUDED.data,
                position = EXCLUDED.position,
                styles = EXCLUDED.styles,
                properties = EXCLUDED.properties,
                parent_id = EXCLUDED.parent_id,
                children = EXCLUDED.children,
                order_index = EXCLUDED.order_index,
                hidden = EXCLUDED.hidden,
                status = EXCLUDED.status,
                updated_at = NOW()
            "#,
        )
        .bind(&component.id)
        .bind(&component.screen_id)
        .bind(&component.application_id)
        .bind(component.kind.as_str())
        .bind(Json(&component.data))
        .bind(Json(&component.position))
        .bind(Json(&component.styles))
        .bind(Json(&component.properties))
        .bind(component.parent_id.as_deref())
        .bind(Json(&component.children))
        .bind(component.order)
        .bind(component.hidden)
        .bind(enum_to_str(&component.status))
        .bind(component.created_at)
        .bind(component.updated_at)
        .execute(&self.pool)
        .await
        .context("Failed to upsert component")?;

        Ok(())
    }

    async fn delete_component(&self, id: &Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM components WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete component")?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_components_by_parent(&self, parent_id: &Id) -> Result<u64> {
        let result = sqlx::query("DELETE FROM components WHERE parent_id = $1")
            .bind(parent_id)
            .execute(&self.pool)
            .await
            .context("Failed to delete child components")?;

        Ok(result.rows_affected())
    }
}

#[async_trait::async_trait]
impl ComponentTypeStore for PostgresStore {
    async fn get_component_type(&self, id: &Id) -> Result<Option<ComponentType>> {
        let row = sqlx::query("SELECT * FROM component_types WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch component type")?;

        row.as_ref().map(component_type_from_row).transpose()
    }

    async fn find_component_type_by_kind(
        &self,
        kind: ComponentKind,
    ) -> Result<Option<ComponentType>> {
        let row = sqlx::query("SELECT * FROM component_types WHERE kind = $1")
            .bind(kind.as_str())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to look up component type by kind")?;

        row.as_ref().map(component_type_from_row).transpose()
    }

    async fn list_component_types(
        &self,
        filter: &ComponentTypeFilter,
    ) -> Result<Vec<ComponentType>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM component_types
            WHERE ($1::text IS NULL OR category = $1)
              AND ($2::boolean IS NULL OR visible = $2)
            ORDER BY order_index ASC, name ASC
            "#,
        )
        .bind(filter.category.as_ref().map(enum_to_str))
        .bind(filter.visible)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list component types")?;

        rows.iter().map(component_type_from_row).collect()
    }

    async fn upsert_component_type(&self, component_type: ComponentType) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO component_types (
                id, kind, name, description, icon, category, default_styles,
                default_properties, default_data, visible, order_index, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (id) DO UPDATE SET
                kind = EXCLUDED.kind,
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                icon = EXCLUDED.icon,
                category = EXCLUDED.category,
                default_styles = EXCLUDED.default_styles,
                default_properties = EXCLUDED.default_properties,
                default_data = EXCLUDED.default_data,
                visible = EXCLUDED.visible,
                order_index = EXCLUDED.order_index,
                updated_at = NOW()
            "#,
        )
        .bind(&component_type.id)
        .bind(component_type.kind.as_str())
        .bind(&component_type.name)
        .bind(&component_type.description)
        .bind(&component_type.icon)
        .bind(enum_to_str(&component_type.category))
        .bind(Json(&component_type.default_styles))
        .bind(Json(&component_type.default_properties))
        .bind(Json(&component_type.default_data))
        .bind(component_type.visible)
        .bind(component_type.order)
        .bind(component_type.created_at)
        .bind(component_type.updated_at)
        .execute(&self.pool)
        .await
        .context("Failed to upsert component type")?;

        Ok(())
    }

    async fn delete_component_type(&self, id: &Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM component_types WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete component type")?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait::async_trait]
impl ImageStore for PostgresStore {
    async fn get_image(&self, id: &Id) -> Result<Option<Image>> {
        let row = sqlx::query("SELECT * FROM images WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch image")?;

        row.as_ref().map(image_from_row).transpose()
    }

    async fn list_images(&self, filter: &ImageFilter) -> Result<Vec<Image>> {
        let tags = filter.tag_list();
        let rows = sqlx::query(
            r#"
            SELECT * FROM images
            WHERE ($1::text IS NULL OR category = $1)
              AND ($2::text IS NULL OR status = $2)
              AND ($3::text IS NULL
                   OR name ILIKE '%' || $3 || '%'
                   OR description ILIKE '%' || $3 || '%'
                   OR alt ILIKE '%' || $3 || '%')
              AND ($4::text[] IS NULL OR tags ?| $4)
            ORDER BY created_at DESC
            "#,
        )
        .bind(filter.category.as_ref().map(enum_to_str))
        .bind(filter.status.as_ref().map(enum_to_str))
        .bind(filter.search.as_deref())
        .bind(if tags.is_empty() { None } else { Some(tags) })
        .fetch_all(&self.pool)
        .await
        .context("Failed to list images")?;

        rows.iter().map(image_from_row).collect()
    }

    async fn find_images_by_ids(&self, ids: &[Id]) -> Result<Vec<Image>> {
        let rows = sqlx::query("SELECT * FROM images WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch images by id")?;

        rows.iter().map(image_from_row).collect()
    }

    async fn upsert_image(&self, image: Image) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO images (
                id, name, original_name, filename, url, cloudinary_public_id,
                cloudinary_secure_url, mime_type, size, width, height, category,
                tags, description, alt, status, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                category = EXCLUDED.category,
                tags = EXCLUDED.tags,
                description = EXCLUDED.description,
                alt = EXCLUDED.alt,
                status = EXCLUDED.status,
                updated_at = NOW()
            "#,
        )
        .bind(&image.id)
        .bind(&image.name)
        .bind(&image.original_name)
        .bind(&image.filename)
        .bind(&image.url)
        .bind(&image.cloudinary_public_id)
        .bind(&image.cloudinary_secure_url)
        .bind(&image.mime_type)
        .bind(image.size)
        .bind(image.width)
        .bind(image.height)
        .bind(enum_to_str(&image.category))
        .bind(Json(&image.tags))
        .bind(&image.description)
        .bind(&image.alt)
        .bind(enum_to_str(&image.status))
        .bind(image.created_at)
        .bind(image.updated_at)
        .execute(&self.pool)
        .await
        .context("Failed to upsert image")?;

        Ok(())
    }

    async fn delete_image(&self, id: &Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM images WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete image")?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_images(&self, ids: &[Id]) -> Result<u64> {
        let result = sqlx::query("DELETE FROM images WHERE id = ANY($1)")
            .bind(ids)
            .execute(&self.pool)
            .await
            .context("Failed to bulk delete images")?;

        Ok(result.rows_affected())
    }
}

impl Store for PostgresStore {}
