//! Menu documents as stored (sections, items, toppings, settings) and the
//! payload types the admin editor writes with.
//!
//! Policy for optional text: cleared or empty fields are stored *absent*,
//! never as `""`. Updates carry an explicit tri-state per field ([`Patch`])
//! so "leave alone", "set" and "delete" are distinct operations.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::price::Price;
use crate::text::{slugify, Category};

/// Sort sentinel for entities without a numeric order: they go last.
pub const ORDER_LAST: f64 = 9999.0;

/// Tri-state field edit. JSON mapping on update payloads: field absent keeps
/// the stored value, `null` deletes the field, anything else sets it.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Patch<T> {
    #[default]
    Keep,
    Set(T),
    Clear,
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(v) => Patch::Set(v),
            None => Patch::Clear,
        })
    }
}

/// Write one patch entry into a store field map. `Clear` becomes the store's
/// delete-field sentinel (`null`), `Keep` writes nothing.
fn put_patch<T: Serialize>(fields: &mut Map<String, Value>, key: &str, patch: &Patch<T>) {
    match patch {
        Patch::Keep => {}
        Patch::Clear => {
            fields.insert(key.to_string(), Value::Null);
        }
        Patch::Set(v) => {
            fields.insert(
                key.to_string(),
                serde_json::to_value(v).unwrap_or(Value::Null),
            );
        }
    }
}

fn is_false(v: &bool) -> bool {
    !*v
}

/// Trim and drop empty optional text.
pub fn clean_text(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn clean_price(v: Option<Price>) -> Option<Price> {
    v.filter(|p| !p.is_blank())
}

// ── Stored documents ──

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Section {
    /// Document id, slug of the title; lives in the store key, not the body.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_en: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle_en: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note_en: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<Base>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Child collections, attached by the aggregator.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<Item>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub toppings: Vec<Topping>,
}

impl Section {
    /// Category this section belongs to, inferred from its stored group label,
    /// falling back to the title and then the id.
    pub fn category(&self) -> Category {
        let label = self
            .group
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(if self.title.is_empty() { &self.id } else { &self.title });
        Category::classify(label)
    }

    pub fn sort_order(&self) -> f64 {
        self.order.unwrap_or(ORDER_LAST)
    }

    /// Body as written to the store: no id, no child collections.
    pub fn to_doc(&self) -> Value {
        let mut doc = serde_json::to_value(self).unwrap_or(Value::Null);
        if let Some(obj) = doc.as_object_mut() {
            obj.remove("id");
            obj.remove("items");
            obj.remove("toppings");
        }
        doc
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Base {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_en: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_en: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
}

impl Base {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.title_en.is_none()
            && self.description.is_none()
            && self.description_en.is_none()
            && self.price.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Item {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_en: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc_en: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<f64>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Topping {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_en: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<f64>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub hidden: bool,
    /// Price waived regardless of the stored price.
    #[serde(default, skip_serializing_if = "is_false")]
    pub free: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Either child kind sorts by (order, bilingual name).
pub trait SectionChild {
    fn sort_order(&self) -> f64;
    fn sort_name(&self) -> &str;
}

impl SectionChild for Item {
    fn sort_order(&self) -> f64 {
        self.order.unwrap_or(ORDER_LAST)
    }
    fn sort_name(&self) -> &str {
        if self.name.is_empty() {
            self.name_en.as_deref().unwrap_or("")
        } else {
            &self.name
        }
    }
}

impl SectionChild for Topping {
    fn sort_order(&self) -> f64 {
        self.order.unwrap_or(ORDER_LAST)
    }
    fn sort_name(&self) -> &str {
        if self.name.is_empty() {
            self.name_en.as_deref().unwrap_or("")
        } else {
            &self.name
        }
    }
}

// ── Settings singleton (settings/menu) ──

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MenuSettings {
    /// Per-category bilingual display-name overrides.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub nav_labels: IndexMap<String, NavLabel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub igic_note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub igic_note_en: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promo: Option<Promo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NavLabel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub es: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub en: Option<String>,
}

/// Promotional banner on the public site.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Promo {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_en: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_en: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_en: Option<String>,
}

// ── Create payloads ──

#[derive(Debug, Deserialize)]
pub struct SectionCreate {
    pub title: String,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub title_en: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub subtitle_en: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub note_en: Option<String>,
    #[serde(default)]
    pub order: Option<f64>,
    #[serde(default)]
    pub base: Option<BaseCreate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BaseCreate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub title_en: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub description_en: Option<String>,
    #[serde(default)]
    pub price: Option<Price>,
}

impl SectionCreate {
    /// Derived identifier for the section this payload would create.
    pub fn derived_id(&self) -> String {
        slugify(&self.title)
    }

    pub fn into_section(self, now: DateTime<Utc>) -> Section {
        let id = self.derived_id();
        let base = self.base.map(|b| Base {
            title: clean_text(b.title),
            title_en: clean_text(b.title_en),
            description: clean_text(b.description),
            description_en: clean_text(b.description_en),
            price: clean_price(b.price),
        });
        Section {
            id,
            title: self.title.trim().to_string(),
            title_en: clean_text(self.title_en),
            subtitle: clean_text(self.subtitle),
            subtitle_en: clean_text(self.subtitle_en),
            note: clean_text(self.note),
            note_en: clean_text(self.note_en),
            group: clean_text(self.group),
            order: Some(self.order.unwrap_or(ORDER_LAST)),
            base: base.filter(|b| !b.is_empty()),
            hidden: false,
            created_at: Some(now),
            updated_at: Some(now),
            items: Vec::new(),
            toppings: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ItemCreate {
    pub name: String,
    #[serde(default)]
    pub name_en: Option<String>,
    #[serde(default)]
    pub desc: Option<String>,
    #[serde(default)]
    pub desc_en: Option<String>,
    #[serde(default)]
    pub price: Option<Price>,
    #[serde(default)]
    pub order: Option<f64>,
}

impl ItemCreate {
    pub fn into_item(self, now: DateTime<Utc>) -> Item {
        Item {
            id: String::new(),
            name: self.name.trim().to_string(),
            name_en: clean_text(self.name_en),
            desc: clean_text(self.desc),
            desc_en: clean_text(self.desc_en),
            price: clean_price(self.price),
            order: Some(self.order.unwrap_or(ORDER_LAST)),
            hidden: false,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ToppingCreate {
    pub name: String,
    #[serde(default)]
    pub name_en: Option<String>,
    #[serde(default)]
    pub price: Option<Price>,
    #[serde(default)]
    pub order: Option<f64>,
    #[serde(default)]
    pub free: bool,
}

impl ToppingCreate {
    pub fn into_topping(self, now: DateTime<Utc>) -> Topping {
        Topping {
            id: String::new(),
            name: self.name.trim().to_string(),
            name_en: clean_text(self.name_en),
            price: clean_price(self.price),
            order: Some(self.order.unwrap_or(ORDER_LAST)),
            hidden: false,
            free: self.free,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }
}

// ── Update payloads (partial patches) ──

#[derive(Debug, Default, Deserialize)]
pub struct SectionUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub order: Option<f64>,
    #[serde(default)]
    pub hidden: Option<bool>,
    #[serde(default)]
    pub title_en: Patch<String>,
    #[serde(default)]
    pub subtitle: Patch<String>,
    #[serde(default)]
    pub subtitle_en: Patch<String>,
    #[serde(default)]
    pub note: Patch<String>,
    #[serde(default)]
    pub note_en: Patch<String>,
    #[serde(default)]
    pub base: Patch<BasePatch>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BasePatch {
    #[serde(default)]
    pub title: Patch<String>,
    #[serde(default)]
    pub title_en: Patch<String>,
    #[serde(default)]
    pub description: Patch<String>,
    #[serde(default)]
    pub description_en: Patch<String>,
    #[serde(default)]
    pub price: Patch<Price>,
}

impl SectionUpdate {
    pub fn into_fields(self, now: DateTime<Utc>) -> Map<String, Value> {
        let mut fields = Map::new();
        if let Some(title) = clean_text(self.title) {
            fields.insert("title".into(), Value::String(title));
        }
        if let Some(group) = clean_text(self.group) {
            fields.insert("group".into(), Value::String(group));
        }
        if let Some(order) = self.order {
            fields.insert("order".into(), order.into());
        }
        if let Some(hidden) = self.hidden {
            fields.insert("hidden".into(), Value::Bool(hidden));
        }
        put_patch(&mut fields, "title_en", &self.title_en);
        put_patch(&mut fields, "subtitle", &self.subtitle);
        put_patch(&mut fields, "subtitle_en", &self.subtitle_en);
        put_patch(&mut fields, "note", &self.note);
        put_patch(&mut fields, "note_en", &self.note_en);
        match &self.base {
            Patch::Keep => {}
            Patch::Clear => {
                fields.insert("base".into(), Value::Null);
            }
            Patch::Set(base) => {
                put_patch(&mut fields, "base.title", &base.title);
                put_patch(&mut fields, "base.title_en", &base.title_en);
                put_patch(&mut fields, "base.description", &base.description);
                put_patch(&mut fields, "base.description_en", &base.description_en);
                put_patch(&mut fields, "base.price", &base.price);
            }
        }
        fields.insert("updated_at".into(), timestamp(now));
        fields
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ItemUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub order: Option<f64>,
    #[serde(default)]
    pub hidden: Option<bool>,
    #[serde(default)]
    pub name_en: Patch<String>,
    #[serde(default)]
    pub desc: Patch<String>,
    #[serde(default)]
    pub desc_en: Patch<String>,
    #[serde(default)]
    pub price: Patch<Price>,
}

impl ItemUpdate {
    pub fn into_fields(self, now: DateTime<Utc>) -> Map<String, Value> {
        let mut fields = Map::new();
        if let Some(name) = clean_text(self.name) {
            fields.insert("name".into(), Value::String(name));
        }
        if let Some(order) = self.order {
            fields.insert("order".into(), order.into());
        }
        if let Some(hidden) = self.hidden {
            fields.insert("hidden".into(), Value::Bool(hidden));
        }
        put_patch(&mut fields, "name_en", &self.name_en);
        put_patch(&mut fields, "desc", &self.desc);
        put_patch(&mut fields, "desc_en", &self.desc_en);
        put_patch(&mut fields, "price", &self.price);
        fields.insert("updated_at".into(), timestamp(now));
        fields
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ToppingUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub order: Option<f64>,
    #[serde(default)]
    pub hidden: Option<bool>,
    #[serde(default)]
    pub free: Option<bool>,
    #[serde(default)]
    pub name_en: Patch<String>,
    #[serde(default)]
    pub price: Patch<Price>,
}

impl ToppingUpdate {
    pub fn into_fields(self, now: DateTime<Utc>) -> Map<String, Value> {
        let mut fields = Map::new();
        if let Some(name) = clean_text(self.name) {
            fields.insert("name".into(), Value::String(name));
        }
        if let Some(order) = self.order {
            fields.insert("order".into(), order.into());
        }
        if let Some(hidden) = self.hidden {
            fields.insert("hidden".into(), Value::Bool(hidden));
        }
        if let Some(free) = self.free {
            fields.insert("free".into(), Value::Bool(free));
        }
        put_patch(&mut fields, "name_en", &self.name_en);
        put_patch(&mut fields, "price", &self.price);
        fields.insert("updated_at".into(), timestamp(now));
        fields
    }
}

/// Order-only patch used by the reorder actions.
#[derive(Debug, Deserialize)]
pub struct Reorder {
    #[serde(default)]
    pub order: Option<f64>,
}

impl Reorder {
    pub fn into_fields(self, now: DateTime<Utc>) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("order".into(), self.order.unwrap_or(ORDER_LAST).into());
        fields.insert("updated_at".into(), timestamp(now));
        fields
    }
}

fn timestamp(now: DateTime<Utc>) -> Value {
    serde_json::to_value(now).unwrap_or(Value::Null)
}
