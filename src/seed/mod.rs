//! Bootstrap catalog for the builder palette. Seeding is idempotent: kinds
//! that already have a registry entry are skipped and counted as existing.

use anyhow::Result;
use serde::Serialize;

use crate::model::{ComponentCategory, ComponentKind, ComponentType};
use crate::store::ComponentTypeStore;

use ComponentCategory as Cat;
use ComponentKind as Kind;

/// The fixed palette: (kind, display name, category, icon, sidebar order)
pub fn builtin_component_types() -> Vec<ComponentType> {
    let catalog: [(Kind, &str, Cat, &str, i64); 28] = [
        (Kind::Button, "Button", Cat::Basic, "\u{1F518}", 1),
        (Kind::Input, "Input", Cat::Form, "\u{1F4DD}", 2),
        (Kind::Textarea, "Textarea", Cat::Form, "\u{1F4C4}", 3),
        (Kind::Text, "Text", Cat::Basic, "\u{1F4DD}", 4),
        (Kind::Image, "Image", Cat::Media, "\u{1F5BC}\u{FE0F}", 5),
        (Kind::Container, "Container", Cat::Layout, "\u{1F4E6}", 6),
        (Kind::Div, "Div", Cat::Layout, "\u{2B1C}", 7),
        (Kind::Form, "Form", Cat::Form, "\u{1F4CB}", 8),
        (Kind::Label, "Label", Cat::Form, "\u{1F3F7}\u{FE0F}", 9),
        (Kind::Select, "Select", Cat::Form, "\u{1F4D1}", 10),
        (Kind::Checkbox, "Checkbox", Cat::Form, "\u{2611}\u{FE0F}", 11),
        (Kind::Radio, "Radio", Cat::Form, "\u{1F518}", 12),
        (Kind::Link, "Link", Cat::Basic, "\u{1F517}", 13),
        (Kind::Icon, "Icon", Cat::Basic, "\u{2B50}", 14),
        (Kind::Card, "Card", Cat::Layout, "\u{1F0CF}", 15),
        (Kind::Header, "Header", Cat::Navigation, "\u{1F4CA}", 16),
        (Kind::Footer, "Footer", Cat::Navigation, "\u{1F4CA}", 17),
        (Kind::Navbar, "Navbar", Cat::Navigation, "\u{1F9ED}", 18),
        (Kind::Sidebar, "Sidebar", Cat::Navigation, "\u{1F4D1}", 19),
        (Kind::Modal, "Modal", Cat::Layout, "\u{1FA9F}", 20),
        (Kind::Dropdown, "Dropdown", Cat::Form, "\u{1F4CB}", 21),
        (Kind::Table, "Table", Cat::Data, "\u{1F4CA}", 22),
        (Kind::List, "List", Cat::Data, "\u{1F4CB}", 23),
        (Kind::Video, "Video", Cat::Media, "\u{1F3A5}", 24),
        (Kind::Audio, "Audio", Cat::Media, "\u{1F50A}", 25),
        (Kind::Map, "Map", Cat::Media, "\u{1F5FA}\u{FE0F}", 26),
        (Kind::Chart, "Chart", Cat::Data, "\u{1F4C8}", 27),
        (Kind::Custom, "Custom", Cat::Custom, "\u{2699}\u{FE0F}", 28),
    ];

    catalog
        .into_iter()
        .map(|(kind, name, category, icon, order)| {
            ComponentType::builtin(kind, name, category, icon, order)
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct SeedOutcome {
    pub created: usize,
    pub existing: usize,
    pub message: String,
}

/// Walks the catalog and creates every kind that has no registry entry yet.
/// Safe to invoke repeatedly: a second run creates nothing and reports the
/// full catalog as existing.
pub async fn initialize_component_types<S>(store: &S) -> Result<SeedOutcome>
where
    S: ComponentTypeStore + ?Sized,
{
    let mut created = 0;
    let mut existing = 0;

    for component_type in builtin_component_types() {
        match store.find_component_type_by_kind(component_type.kind).await? {
            Some(_) => existing += 1,
            None => {
                store.upsert_component_type(component_type).await?;
                created += 1;
            }
        }
    }

    Ok(SeedOutcome {
        created,
        existing,
        message: format!(
            "Initialized {} new component types. {} already existed.",
            created, existing
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::collections::HashSet;

    #[test]
    fn catalog_covers_every_kind_exactly_once() {
        let catalog = builtin_component_types();
        assert_eq!(catalog.len(), 28);

        let kinds: HashSet<&str> = catalog.iter().map(|t| t.kind.as_str()).collect();
        assert_eq!(kinds.len(), 28);
        assert!(catalog.iter().all(|t| t.visible));
        assert!(catalog.iter().all(|t| t.default_styles.is_empty()));
    }

    #[tokio::test]
    async fn seeding_twice_is_idempotent() {
        let store = MemoryStore::new();

        let first = initialize_component_types(&store).await.unwrap();
        assert_eq!(first.created, 28);
        assert_eq!(first.existing, 0);

        let second = initialize_component_types(&store).await.unwrap();
        assert_eq!(second.created, 0);
        assert_eq!(second.existing, 28);
    }
}
