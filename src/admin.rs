//! Admin handlers: CRUD over sections, items and toppings, navigation-label
//! editing, form schemas and the i18n backfill.
//!
//! Every mutation comes in as a modal-form submission: a `null` body is a
//! cancel and must not touch the store. Confirmed submissions are cleaned
//! against the field schema before they become typed payloads, so the store
//! only ever sees complete, validated writes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::info;

use crate::error::AppError;
use crate::form::{self, CleanMode, FormError, FormSchema, Submission};
use crate::menu::{load_tree, MenuData};
use crate::migrate::{backfill_i18n, BackfillReport};
use crate::model::{
    ItemCreate, ItemUpdate, Reorder, SectionCreate, SectionUpdate, ToppingCreate, ToppingUpdate,
};
use crate::state::AppState;
use crate::store::DocumentStore;

const CANCELLED: StatusCode = StatusCode::NO_CONTENT;

/// Full tree for the editor: hidden entities included, same ordering as the
/// public site so the operator sees what guests will see.
pub async fn list_menu(State(state): State<AppState>) -> Result<Json<MenuData>, AppError> {
    let tree = load_tree(state.store.as_ref()).await?;
    Ok(Json(tree.aggregate_all()))
}

// ── Sections ──

pub async fn create_section(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Response, AppError> {
    let Submission::Submitted(raw) = Submission::from_body(body)? else {
        return Ok(CANCELLED.into_response());
    };
    let mut values = form::clean(&form::schema("section")?, &raw, CleanMode::Create)?;
    form::lift_base(&mut values, CleanMode::Create);
    let create: SectionCreate = decode(values)?;

    let id = create.derived_id();
    if id.is_empty() {
        return Err(AppError::InvalidInput("title yields an empty id".into()));
    }

    let op = "create section";
    let store = state.store.as_ref();
    let existing = store
        .get("sections", &id)
        .await
        .map_err(AppError::mutation(op, "section"))?;
    if existing.is_some() {
        return Err(AppError::DuplicateSection(id));
    }

    let section = create.into_section(Utc::now());
    store
        .put("sections", &id, section.to_doc())
        .await
        .map_err(AppError::mutation(op, "section"))?;
    info!("created section '{id}'");
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))).into_response())
}

pub async fn update_section(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Response, AppError> {
    let Submission::Submitted(raw) = Submission::from_body(body)? else {
        return Ok(CANCELLED.into_response());
    };
    let mut values = form::clean(&form::schema("section")?, &raw, CleanMode::Edit)?;
    form::lift_base(&mut values, CleanMode::Edit);
    let update: SectionUpdate = decode(values)?;

    state
        .store
        .patch("sections", &id, update.into_fields(Utc::now()))
        .await
        .map_err(AppError::mutation("update section", "section"))?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub async fn reorder_section(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Response, AppError> {
    let Some(reorder) = reorder_submission(body)? else {
        return Ok(CANCELLED.into_response());
    };
    state
        .store
        .patch("sections", &id, reorder.into_fields(Utc::now()))
        .await
        .map_err(AppError::mutation("reorder section", "section"))?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

/// Deleting a section removes its sub-collections first; the store has no
/// notion of ownership, so orphaned children would linger forever otherwise.
pub async fn delete_section(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let op = "delete section";
    let store = state.store.as_ref();
    require_section(store, &id, op).await?;

    for sub in ["items", "toppings"] {
        let path = format!("sections/{id}/{sub}");
        let docs = store
            .list(&path)
            .await
            .map_err(AppError::mutation(op, "section"))?;
        for (child_id, _) in docs {
            store
                .delete(&path, &child_id)
                .await
                .map_err(AppError::mutation(op, "section"))?;
        }
    }

    store
        .delete("sections", &id)
        .await
        .map_err(AppError::mutation(op, "section"))?;
    info!("deleted section '{id}' and its children");
    Ok(StatusCode::NO_CONTENT)
}

// ── Items ──

pub async fn create_item(
    State(state): State<AppState>,
    Path(section_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Response, AppError> {
    let Submission::Submitted(raw) = Submission::from_body(body)? else {
        return Ok(CANCELLED.into_response());
    };
    let values = form::clean(&form::schema("item")?, &raw, CleanMode::Create)?;
    let create: ItemCreate = decode(values)?;

    let op = "create item";
    let store = state.store.as_ref();
    require_section(store, &section_id, op).await?;

    let item = create.into_item(Utc::now());
    let id = store
        .create(&format!("sections/{section_id}/items"), doc_without_id(&item))
        .await
        .map_err(AppError::mutation(op, "section"))?;
    info!("created item '{id}' in section '{section_id}'");
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))).into_response())
}

pub async fn update_item(
    State(state): State<AppState>,
    Path((section_id, item_id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<Response, AppError> {
    let Submission::Submitted(raw) = Submission::from_body(body)? else {
        return Ok(CANCELLED.into_response());
    };
    let values = form::clean(&form::schema("item")?, &raw, CleanMode::Edit)?;
    let update: ItemUpdate = decode(values)?;

    state
        .store
        .patch(
            &format!("sections/{section_id}/items"),
            &item_id,
            update.into_fields(Utc::now()),
        )
        .await
        .map_err(AppError::mutation("update item", "item"))?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub async fn reorder_item(
    State(state): State<AppState>,
    Path((section_id, item_id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<Response, AppError> {
    let Some(reorder) = reorder_submission(body)? else {
        return Ok(CANCELLED.into_response());
    };
    state
        .store
        .patch(
            &format!("sections/{section_id}/items"),
            &item_id,
            reorder.into_fields(Utc::now()),
        )
        .await
        .map_err(AppError::mutation("reorder item", "item"))?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub async fn delete_item(
    State(state): State<AppState>,
    Path((section_id, item_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    state
        .store
        .delete(&format!("sections/{section_id}/items"), &item_id)
        .await
        .map_err(AppError::mutation("delete item", "item"))?;
    Ok(StatusCode::NO_CONTENT)
}

// ── Toppings ──

pub async fn create_topping(
    State(state): State<AppState>,
    Path(section_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Response, AppError> {
    let Submission::Submitted(raw) = Submission::from_body(body)? else {
        return Ok(CANCELLED.into_response());
    };
    let values = form::clean(&form::schema("topping")?, &raw, CleanMode::Create)?;
    let create: ToppingCreate = decode(values)?;

    let op = "create topping";
    let store = state.store.as_ref();
    require_section(store, &section_id, op).await?;

    let topping = create.into_topping(Utc::now());
    let id = store
        .create(
            &format!("sections/{section_id}/toppings"),
            doc_without_id(&topping),
        )
        .await
        .map_err(AppError::mutation(op, "section"))?;
    info!("created topping '{id}' in section '{section_id}'");
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))).into_response())
}

pub async fn update_topping(
    State(state): State<AppState>,
    Path((section_id, topping_id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<Response, AppError> {
    let Submission::Submitted(raw) = Submission::from_body(body)? else {
        return Ok(CANCELLED.into_response());
    };
    let values = form::clean(&form::schema("topping")?, &raw, CleanMode::Edit)?;
    let update: ToppingUpdate = decode(values)?;

    state
        .store
        .patch(
            &format!("sections/{section_id}/toppings"),
            &topping_id,
            update.into_fields(Utc::now()),
        )
        .await
        .map_err(AppError::mutation("update topping", "topping"))?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub async fn reorder_topping(
    State(state): State<AppState>,
    Path((section_id, topping_id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<Response, AppError> {
    let Some(reorder) = reorder_submission(body)? else {
        return Ok(CANCELLED.into_response());
    };
    state
        .store
        .patch(
            &format!("sections/{section_id}/toppings"),
            &topping_id,
            reorder.into_fields(Utc::now()),
        )
        .await
        .map_err(AppError::mutation("reorder topping", "topping"))?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub async fn delete_topping(
    State(state): State<AppState>,
    Path((section_id, topping_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    state
        .store
        .delete(&format!("sections/{section_id}/toppings"), &topping_id)
        .await
        .map_err(AppError::mutation("delete topping", "topping"))?;
    Ok(StatusCode::NO_CONTENT)
}

// ── Settings ──

/// The label form always submits all four category pairs, so the stored map
/// is replaced wholesale rather than patched key by key.
pub async fn update_nav_labels(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Response, AppError> {
    let Submission::Submitted(raw) = Submission::from_body(body)? else {
        return Ok(CANCELLED.into_response());
    };
    let values = form::clean(&form::schema("nav_labels")?, &raw, CleanMode::Create)?;
    let label = |prefix: &str| -> Value {
        json!({
            "es": values.get(&format!("{prefix}_es")),
            "en": values.get(&format!("{prefix}_en")),
        })
    };

    let mut fields = Map::new();
    fields.insert(
        "nav_labels".into(),
        json!({
            "poffertjes": label("poff"),
            "cafe": label("cafe"),
            "desayunos": label("des"),
            "bebidas": label("beb"),
        }),
    );

    state
        .store
        .merge("settings", "menu", fields)
        .await
        .map_err(AppError::mutation("update nav labels", "settings"))?;
    info!("navigation labels updated");
    Ok(StatusCode::NO_CONTENT.into_response())
}

// ── Forms & maintenance ──

pub async fn form_schema(Path(kind): Path<String>) -> Result<Json<FormSchema>, AppError> {
    form::schema(&kind).map(Json).map_err(|e| match e {
        FormError::UnknownForm(_) => AppError::NotFound("form"),
        other => other.into(),
    })
}

pub async fn migrate_i18n(State(state): State<AppState>) -> Result<Json<BackfillReport>, AppError> {
    let report = backfill_i18n(state.store.as_ref()).await?;
    Ok(Json(report))
}

// ── Helpers ──

fn decode<T: DeserializeOwned>(values: Map<String, Value>) -> Result<T, AppError> {
    serde_json::from_value(Value::Object(values)).map_err(|e| AppError::InvalidInput(e.to_string()))
}

fn doc_without_id<T: Serialize>(entity: &T) -> Value {
    let mut doc = serde_json::to_value(entity).unwrap_or(Value::Null);
    if let Some(obj) = doc.as_object_mut() {
        obj.remove("id");
    }
    doc
}

fn reorder_submission(body: Value) -> Result<Option<Reorder>, AppError> {
    match Submission::from_body(body)? {
        Submission::Cancelled => Ok(None),
        Submission::Submitted(raw) => {
            let values = form::clean(&form::schema("order")?, &raw, CleanMode::Edit)?;
            Ok(Some(decode(values)?))
        }
    }
}

async fn require_section(
    store: &dyn DocumentStore,
    id: &str,
    op: &'static str,
) -> Result<(), AppError> {
    store
        .get("sections", id)
        .await
        .map_err(AppError::mutation(op, "section"))?
        .map(|_| ())
        .ok_or(AppError::NotFound("section"))
}
