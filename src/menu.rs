//! Menu aggregation: fetch the whole tree from the store, filter hidden
//! entities, classify sections into categories and sort everything with a
//! deterministic comparator.
//!
//! Failure semantics: a missing or unreadable settings document and any
//! failed sub-collection read degrade silently (defaults / empty lists); only
//! the top-level section list is fatal.

use std::cmp::Ordering;

use futures::future::join_all;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::error::AppError;
use crate::model::{Item, MenuSettings, Section, SectionChild, Topping};
use crate::store::{DocumentStore, StoreError};
use crate::text::{normalize, Category};

/// Everything the store holds, unfiltered and unsorted.
pub struct MenuTree {
    pub settings: MenuSettings,
    pub sections: Vec<Section>,
}

/// Aggregated output: sections sorted and grouped by category, categories in
/// navigation order. Both the public renderer and the admin listing read
/// from this shape.
#[derive(Debug, Serialize)]
pub struct MenuData {
    pub settings: MenuSettings,
    pub by_group: IndexMap<Category, Vec<Section>>,
}

pub async fn load_tree(store: &dyn DocumentStore) -> Result<MenuTree, AppError> {
    let settings = load_settings(store).await;

    let docs = store
        .list("sections")
        .await
        .map_err(AppError::MenuUnavailable)?;

    let loads = docs
        .into_iter()
        .filter_map(|(id, doc)| match serde_json::from_value::<Section>(doc) {
            Ok(mut section) => {
                section.id = id;
                Some(section)
            }
            Err(e) => {
                warn!("skipping unreadable section '{id}': {e}");
                None
            }
        })
        .map(|section| load_children(store, section));

    let sections = join_all(loads).await;
    Ok(MenuTree { settings, sections })
}

/// Settings are optional; their absence or an outright read failure must
/// never abort a menu load.
async fn load_settings(store: &dyn DocumentStore) -> MenuSettings {
    match store.get("settings", "menu").await {
        Ok(Some(doc)) => serde_json::from_value(doc).unwrap_or_else(|e| {
            warn!("settings/menu is unreadable, using defaults: {e}");
            MenuSettings::default()
        }),
        Ok(None) => MenuSettings::default(),
        Err(e) => {
            warn!("could not read settings/menu, using defaults: {e}");
            MenuSettings::default()
        }
    }
}

/// Items and toppings are fetched concurrently; either sub-collection
/// failing degrades to an empty list so one corrupt collection cannot blank
/// the section.
async fn load_children(store: &dyn DocumentStore, mut section: Section) -> Section {
    let items_path = format!("sections/{}/items", section.id);
    let toppings_path = format!("sections/{}/toppings", section.id);
    let (items, toppings) = futures::join!(store.list(&items_path), store.list(&toppings_path));

    section.items = collect_children(items, &items_path, |item: &mut Item, id| item.id = id);
    section.toppings = collect_children(toppings, &toppings_path, |top: &mut Topping, id| {
        top.id = id
    });
    section
}

fn collect_children<T, F>(
    result: Result<Vec<(String, Value)>, StoreError>,
    path: &str,
    set_id: F,
) -> Vec<T>
where
    T: serde::de::DeserializeOwned,
    F: Fn(&mut T, String),
{
    let docs = match result {
        Ok(docs) => docs,
        Err(e) => {
            warn!("could not load {path}, treating as empty: {e}");
            return Vec::new();
        }
    };
    docs.into_iter()
        .filter_map(|(id, doc)| match serde_json::from_value::<T>(doc) {
            Ok(mut child) => {
                set_id(&mut child, id);
                Some(child)
            }
            Err(e) => {
                warn!("skipping unreadable document in {path}: {e}");
                None
            }
        })
        .collect()
}

impl MenuTree {
    /// Public view: hidden sections, items and toppings removed, everything
    /// sorted and grouped.
    pub fn aggregate(mut self) -> MenuData {
        self.sections.retain(|s| !s.hidden);
        for section in &mut self.sections {
            section.items.retain(|i| !i.hidden);
            section.toppings.retain(|t| !t.hidden);
        }
        self.into_data()
    }

    /// Admin view: hidden entities kept for editing, same ordering.
    pub fn aggregate_all(self) -> MenuData {
        self.into_data()
    }

    fn into_data(mut self) -> MenuData {
        for section in &mut self.sections {
            section.items.sort_by(child_cmp);
            section.toppings.sort_by(child_cmp);
        }
        self.sections.sort_by(section_cmp);

        // sections are already in (rank, order, title) order, so first
        // insertion per category yields categories in navigation order
        let mut by_group: IndexMap<Category, Vec<Section>> = IndexMap::new();
        for section in self.sections {
            by_group.entry(section.category()).or_default().push(section);
        }

        MenuData {
            settings: self.settings,
            by_group,
        }
    }
}

impl MenuData {
    pub fn first_category(&self) -> Option<&Category> {
        self.by_group.keys().next()
    }
}

/// Three-level section comparator: category rank, then numeric order with
/// missing values last, then locale-folded title. Must stay exactly this
/// shape; it decides both tab membership order and in-category presentation.
fn section_cmp(a: &Section, b: &Section) -> Ordering {
    a.category()
        .rank()
        .cmp(&b.category().rank())
        .then_with(|| order_cmp(a.sort_order(), b.sort_order()))
        .then_with(|| name_cmp(&a.title, &b.title))
}

fn child_cmp<T: SectionChild>(a: &T, b: &T) -> Ordering {
    order_cmp(a.sort_order(), b.sort_order()).then_with(|| name_cmp(a.sort_name(), b.sort_name()))
}

fn order_cmp(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Locale-folded comparison: case and diacritics collapse together, raw
/// bytes break the remaining ties so the order is total.
pub fn name_cmp(a: &str, b: &str) -> Ordering {
    normalize(a).cmp(&normalize(b)).then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ORDER_LAST;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn section(id: &str, title: &str, group: &str, order: Option<f64>) -> Section {
        Section {
            id: id.to_string(),
            title: title.to_string(),
            group: Some(group.to_string()),
            order,
            ..Section::default()
        }
    }

    fn tree(sections: Vec<Section>) -> MenuTree {
        MenuTree {
            settings: MenuSettings::default(),
            sections,
        }
    }

    #[test]
    fn sections_sort_by_rank_order_title() {
        let data = tree(vec![
            section("b", "Cervezas", "Bebidas", Some(1.0)),
            section("a", "Tostas", "Desayunos", Some(2.0)),
            section("c", "Croissant", "Desayunos", Some(1.0)),
            section("d", "Mini Pancakes", "Poffertjes", None),
        ])
        .aggregate();

        let ids: Vec<&str> = data
            .by_group
            .values()
            .flatten()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(ids, ["d", "c", "a", "b"]);

        let categories: Vec<&str> = data.by_group.keys().map(Category::id).collect();
        assert_eq!(categories, ["poffertjes", "desayunos", "bebidas"]);
    }

    #[test]
    fn missing_order_sorts_last_and_names_break_ties() {
        let data = tree(vec![
            section("sin-orden", "Ándale", "Desayunos", None),
            section("z", "Zumos", "Desayunos", Some(5.0)),
            section("acai", "Açaí", "Desayunos", None),
        ])
        .aggregate();

        let ids: Vec<&str> = data.by_group[&Category::Desayunos]
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        // "Açaí" folds to "acai" and sorts before "Ándale" ("andale")
        assert_eq!(ids, ["z", "acai", "sin-orden"]);
    }

    #[test]
    fn custom_groups_come_after_fixed_ones() {
        let data = tree(vec![
            section("tapas", "Tapas variadas", "Tapas", Some(1.0)),
            section("cafe", "Café", "Café", Some(1.0)),
        ])
        .aggregate();

        let categories: Vec<&str> = data.by_group.keys().map(Category::id).collect();
        assert_eq!(categories, ["cafe", "tapas"]);
    }

    #[test]
    fn hidden_entities_are_filtered_from_public_view_only() {
        let mut visible = section("v", "Visible", "Café", Some(1.0));
        visible.items = vec![
            Item {
                name: "Shown".into(),
                ..Item::default()
            },
            Item {
                name: "Hidden".into(),
                hidden: true,
                order: Some(0.0),
                ..Item::default()
            },
        ];
        let mut hidden = section("h", "Oculta", "Café", Some(0.0));
        hidden.hidden = true;

        let public = tree(vec![visible.clone(), hidden.clone()]).aggregate();
        let sections = &public.by_group[&Category::Cafe];
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].items.len(), 1);
        assert_eq!(sections[0].items[0].name, "Shown");

        let admin = tree(vec![visible, hidden]).aggregate_all();
        assert_eq!(admin.by_group[&Category::Cafe].len(), 2);
        assert_eq!(admin.by_group[&Category::Cafe][0].id, "h");
    }

    #[test]
    fn items_and_toppings_sort_within_section() {
        let mut sec = section("s", "Sección", "Café", Some(1.0));
        sec.items = vec![
            Item {
                name: "Tarde".into(),
                ..Item::default()
            },
            Item {
                name: "".into(),
                name_en: Some("English only".into()),
                order: Some(1.0),
                ..Item::default()
            },
            Item {
                name: "Antes".into(),
                order: Some(1.0),
                ..Item::default()
            },
        ];
        let data = tree(vec![sec]).aggregate();
        let names: Vec<&str> = data.by_group[&Category::Cafe][0]
            .items
            .iter()
            .map(|i| i.sort_name())
            .collect();
        assert_eq!(names, ["Antes", "English only", "Tarde"]);
    }

    #[test]
    fn deterministic_under_input_reordering() {
        let a = vec![
            section("uno", "Uno", "Café", Some(2.0)),
            section("dos", "Dos", "Café", Some(2.0)),
            section("tres", "Tres", "Bebidas", None),
        ];
        let mut b = a.clone();
        b.reverse();

        let ids =
            |data: &MenuData| -> Vec<String> {
                data.by_group
                    .values()
                    .flatten()
                    .map(|s| s.id.clone())
                    .collect()
            };
        assert_eq!(ids(&tree(a).aggregate()), ids(&tree(b).aggregate()));
    }

    #[tokio::test]
    async fn load_tolerates_missing_settings_and_children() {
        let store = MemoryStore::new();
        store
            .put("sections", "cafe", json!({ "title": "Café", "group": "Café" }))
            .await
            .unwrap();

        let tree = load_tree(&store).await.unwrap();
        assert!(tree.settings.igic_note.is_none());
        assert_eq!(tree.sections.len(), 1);
        assert!(tree.sections[0].items.is_empty());
    }

    #[tokio::test]
    async fn sentinel_order_defaults() {
        let sec = section("x", "X", "Café", None);
        assert_eq!(sec.sort_order(), ORDER_LAST);
    }
}
