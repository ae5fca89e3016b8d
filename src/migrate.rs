//! One-shot maintenance: backfill empty English placeholder fields across the
//! whole tree so the editor shows every translatable field, even on documents
//! created before the menu went bilingual.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::info;

use crate::error::AppError;
use crate::store::DocumentStore;

/// How many documents each pass touched. Zeroes everywhere means the tree is
/// already fully backfilled; the operation is idempotent.
#[derive(Debug, Default, Serialize)]
pub struct BackfillReport {
    pub sections: usize,
    pub items: usize,
    pub toppings: usize,
}

pub async fn backfill_i18n(store: &dyn DocumentStore) -> Result<BackfillReport, AppError> {
    let op = "i18n backfill";
    let mut report = BackfillReport::default();

    let sections = store
        .list("sections")
        .await
        .map_err(AppError::mutation(op, "sections"))?;

    for (section_id, doc) in sections {
        let fields = section_placeholders(&doc);
        if !fields.is_empty() {
            store
                .patch("sections", &section_id, fields)
                .await
                .map_err(AppError::mutation(op, "section"))?;
            report.sections += 1;
        }

        let items_path = format!("sections/{section_id}/items");
        report.items += backfill_children(store, &items_path, &["name", "desc"]).await?;

        let toppings_path = format!("sections/{section_id}/toppings");
        report.toppings += backfill_children(store, &toppings_path, &["name"]).await?;
    }

    info!(
        "i18n backfill patched {} sections, {} items, {} toppings",
        report.sections, report.items, report.toppings
    );
    Ok(report)
}

async fn backfill_children(
    store: &dyn DocumentStore,
    path: &str,
    keys: &[&str],
) -> Result<usize, AppError> {
    let op = "i18n backfill";
    let docs = store.list(path).await.map_err(AppError::mutation(op, "section"))?;

    let mut patched = 0;
    for (id, doc) in docs {
        let mut fields = Map::new();
        for key in keys {
            placeholder(&doc, key, &mut fields);
        }
        if !fields.is_empty() {
            store
                .patch(path, &id, fields)
                .await
                .map_err(AppError::mutation(op, "document"))?;
            patched += 1;
        }
    }
    Ok(patched)
}

fn section_placeholders(doc: &Value) -> Map<String, Value> {
    let mut fields = Map::new();
    for key in ["title", "subtitle", "note"] {
        placeholder(doc, key, &mut fields);
    }
    if let Some(base) = doc.get("base").filter(|b| b.is_object()) {
        let mut base_fields = Map::new();
        for key in ["title", "description"] {
            placeholder(base, key, &mut base_fields);
        }
        for (key, value) in base_fields {
            fields.insert(format!("base.{key}"), value);
        }
    }
    fields
}

/// Add an empty `{key}_en` when the base-language field has text and the
/// English counterpart does not exist at all.
fn placeholder(doc: &Value, key: &str, fields: &mut Map<String, Value>) {
    let has_source = doc
        .get(key)
        .and_then(Value::as_str)
        .is_some_and(|s| !s.trim().is_empty());
    let en_key = format!("{key}_en");
    if has_source && doc.get(&en_key).is_none() {
        fields.insert(en_key, Value::String(String::new()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    #[tokio::test]
    async fn backfills_missing_english_fields() {
        let store = MemoryStore::new();
        store
            .put(
                "sections",
                "poffertjes",
                json!({
                    "title": "Mini Pancakes",
                    "note": "Hechos al momento",
                    "note_en": "Made to order",
                    "base": { "title": "1 · Comienza con la base", "description": "6 uds." }
                }),
            )
            .await
            .unwrap();
        store
            .put(
                "sections/poffertjes/items",
                "i1",
                json!({ "name": "Clásico", "desc": "Con azúcar glas" }),
            )
            .await
            .unwrap();
        store
            .put("sections/poffertjes/toppings", "t1", json!({ "name": "Nutella" }))
            .await
            .unwrap();

        let report = backfill_i18n(&store).await.unwrap();
        assert_eq!(report.sections, 1);
        assert_eq!(report.items, 1);
        assert_eq!(report.toppings, 1);

        let section = store.get("sections", "poffertjes").await.unwrap().unwrap();
        assert_eq!(section["title_en"], json!(""));
        // already translated, left alone
        assert_eq!(section["note_en"], json!("Made to order"));
        assert_eq!(section["base"]["title_en"], json!(""));
        assert_eq!(section["base"]["description_en"], json!(""));
        // no subtitle, so no placeholder
        assert!(section.get("subtitle_en").is_none());

        let item = store
            .get("sections/poffertjes/items", "i1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(item["name_en"], json!(""));
        assert_eq!(item["desc_en"], json!(""));
    }

    #[tokio::test]
    async fn second_run_is_a_no_op() {
        let store = MemoryStore::new();
        store
            .put("sections", "cafe", json!({ "title": "Café" }))
            .await
            .unwrap();

        backfill_i18n(&store).await.unwrap();
        let report = backfill_i18n(&store).await.unwrap();
        assert_eq!(report.sections, 0);
        assert_eq!(report.items, 0);
        assert_eq!(report.toppings, 0);
    }

    #[tokio::test]
    async fn empty_placeholder_counts_as_translated() {
        let store = MemoryStore::new();
        store
            .put("sections", "bebidas", json!({ "title": "Bebidas", "title_en": "" }))
            .await
            .unwrap();
        let report = backfill_i18n(&store).await.unwrap();
        assert_eq!(report.sections, 0);
    }
}
