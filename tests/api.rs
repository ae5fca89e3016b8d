//! End-to-end tests over the full router with the in-memory store backend.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use carta::config::Config;
use carta::routes::router;
use carta::state::State;
use carta::store::{DocumentStore, MemoryStore};

fn test_config() -> Config {
    Config {
        port: 0,
        redis_url: String::new(),
        admin_email: "admin@example.com".to_string(),
        admin_password: "secret".to_string(),
        menu_json: None,
    }
}

// Router clones share one state, so sessions opened through one clone are
// visible to the next request.
fn make_app(store: &Arc<MemoryStore>) -> Router {
    let store: Arc<dyn DocumentStore> = store.clone();
    router(State::new(test_config(), store))
}

async fn seed_menu(store: &MemoryStore) {
    store
        .put(
            "sections",
            "poffertjes-base",
            json!({ "title": "Mini Pancakes", "group": "Poffertjes", "order": 1,
                    "base": { "title": "1 · Comienza con la base", "price": 4.5 } }),
        )
        .await
        .unwrap();
    store
        .put(
            "sections/poffertjes-base/toppings",
            "t1",
            json!({ "name": "Nutella", "price": 1.0, "order": 1 }),
        )
        .await
        .unwrap();
    store
        .put(
            "sections",
            "cafe",
            json!({ "title": "Café", "group": "Café", "order": 2 }),
        )
        .await
        .unwrap();
    store
        .put(
            "sections/cafe/items",
            "i1",
            json!({ "name": "Cortado", "price": 1.3, "order": 1 }),
        )
        .await
        .unwrap();
    store
        .put(
            "sections/cafe/items",
            "i2",
            json!({ "name": "Fuera de carta", "price": 9.0, "order": 2, "hidden": true }),
        )
        .await
        .unwrap();
    store
        .put(
            "settings",
            "menu",
            json!({ "igic_note": "IGIC incluido", "igic_note_en": "IGIC included" }),
        )
        .await
        .unwrap();
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn with_json(method: Method, uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

async fn response_json(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn login(app: &Router) -> String {
    let (status, body) = response_json(
        app,
        with_json(
            Method::POST,
            "/admin/login",
            None,
            &json!({ "email": "admin@example.com", "password": "secret" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn public_menu_renders_active_tab() {
    let store = Arc::new(MemoryStore::new());
    seed_menu(&store).await;
    let app = make_app(&store);

    let (status, body) = response_json(&app, get("/menu?locale=es&tab=cafe", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tax_note"], json!("IGIC incluido"));

    let tabs = body["tabs"].as_array().unwrap();
    assert_eq!(tabs.len(), 2);
    assert_eq!(tabs[0]["id"], json!("poffertjes"));
    assert_eq!(tabs[1]["id"], json!("cafe"));
    assert_eq!(tabs[1]["active"], json!(true));

    let sections = body["sections"].as_array().unwrap();
    assert_eq!(sections.len(), 1);
    let items = sections[0]["items"].as_array().unwrap();
    // hidden items never reach the public view
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["name"], json!("Cortado"));
    assert_eq!(items[0]["price"], json!("1,30 €"));
}

#[tokio::test]
async fn public_menu_switches_locale() {
    let store = Arc::new(MemoryStore::new());
    seed_menu(&store).await;
    let app = make_app(&store);

    let (status, body) = response_json(&app, get("/menu?locale=en", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tax_note"], json!("IGIC included"));

    // default tab is the first category; its base block renders in English
    let sections = body["sections"].as_array().unwrap();
    assert_eq!(sections[0]["base"]["price"], json!("€4.50"));
    assert_eq!(
        sections[0]["toppings_hint"],
        json!("Choose as many as you like")
    );
}

#[tokio::test]
async fn admin_requires_a_session() {
    let store = Arc::new(MemoryStore::new());
    let app = make_app(&store);

    let (status, _) = response_json(
        &app,
        with_json(Method::POST, "/admin/sections", None, &json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = response_json(
        &app,
        with_json(
            Method::POST,
            "/admin/login",
            None,
            &json!({ "email": "admin@example.com", "password": "wrong" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_invalidates_the_token() {
    let store = Arc::new(MemoryStore::new());
    let app = make_app(&store);
    let token = login(&app).await;

    let (status, _) = response_json(
        &app,
        with_json(Method::POST, "/admin/logout", Some(&token), &json!(null)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = response_json(&app, get("/admin/menu", Some(&token))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn section_create_then_duplicate_conflict() {
    let store = Arc::new(MemoryStore::new());
    let app = make_app(&store);
    let token = login(&app).await;

    let payload = json!({ "group": "Desayunos", "title": "Tostas Especiales" });
    let (status, body) = response_json(
        &app,
        with_json(Method::POST, "/admin/sections", Some(&token), &payload),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], json!("tostas-especiales"));

    let doc = store
        .get("sections", "tostas-especiales")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(doc["group"], json!("Desayunos"));
    assert!(doc.get("subtitle").is_none());

    let (status, _) = response_json(
        &app,
        with_json(Method::POST, "/admin/sections", Some(&token), &payload),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn section_delete_cascades_to_children() {
    let store = Arc::new(MemoryStore::new());
    seed_menu(&store).await;
    let app = make_app(&store);
    let token = login(&app).await;

    let request = Request::builder()
        .method(Method::DELETE)
        .uri("/admin/sections/poffertjes-base")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let (status, _) = response_json(&app, request).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    assert!(store
        .get("sections", "poffertjes-base")
        .await
        .unwrap()
        .is_none());
    assert!(store
        .list("sections/poffertjes-base/toppings")
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn cancelled_submission_writes_nothing() {
    let store = Arc::new(MemoryStore::new());
    seed_menu(&store).await;
    let app = make_app(&store);
    let token = login(&app).await;

    let before = store.get("sections", "cafe").await.unwrap().unwrap();
    let (status, _) = response_json(
        &app,
        with_json(
            Method::PUT,
            "/admin/sections/cafe",
            Some(&token),
            &Value::Null,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let after = store.get("sections", "cafe").await.unwrap().unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn item_update_clears_fields_left_empty() {
    let store = Arc::new(MemoryStore::new());
    seed_menu(&store).await;
    let app = make_app(&store);
    let token = login(&app).await;

    // the edit form submits every field; an empty price means remove it
    let (status, _) = response_json(
        &app,
        with_json(
            Method::PUT,
            "/admin/sections/cafe/items/i1",
            Some(&token),
            &json!({ "name": "Cortado doble", "price": "" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let doc = store.get("sections/cafe/items", "i1").await.unwrap().unwrap();
    assert_eq!(doc["name"], json!("Cortado doble"));
    assert!(doc.get("price").is_none());
    assert!(doc.get("updated_at").is_some());
    // untouched fields stay
    assert_eq!(doc["order"], json!(1));
}

#[tokio::test]
async fn updating_a_missing_item_is_not_found() {
    let store = Arc::new(MemoryStore::new());
    seed_menu(&store).await;
    let app = make_app(&store);
    let token = login(&app).await;

    let (status, _) = response_json(
        &app,
        with_json(
            Method::PUT,
            "/admin/sections/cafe/items/nope",
            Some(&token),
            &json!({ "name": "Cortado" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn nav_labels_merge_into_settings() {
    let store = Arc::new(MemoryStore::new());
    seed_menu(&store).await;
    let app = make_app(&store);
    let token = login(&app).await;

    let (status, _) = response_json(
        &app,
        with_json(
            Method::PUT,
            "/admin/settings/nav-labels",
            Some(&token),
            &json!({
                "poff_es": "Poffertjes", "poff_en": "Mini Pancakes",
                "cafe_es": "Cafetería", "cafe_en": "Coffee",
                "des_es": "Desayunos", "des_en": "Breakfast",
                "beb_es": "Bebidas", "beb_en": "Drinks"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let settings = store.get("settings", "menu").await.unwrap().unwrap();
    assert_eq!(settings["nav_labels"]["cafe"]["es"], json!("Cafetería"));
    // merge keeps unrelated settings fields
    assert_eq!(settings["igic_note"], json!("IGIC incluido"));

    let (_, body) = response_json(&app, get("/menu?locale=es", None)).await;
    let tabs = body["tabs"].as_array().unwrap();
    assert_eq!(tabs[1]["label"], json!("Cafetería"));
}

#[tokio::test]
async fn form_schemas_and_backfill_endpoint() {
    let store = Arc::new(MemoryStore::new());
    seed_menu(&store).await;
    let app = make_app(&store);
    let token = login(&app).await;

    let (status, body) = response_json(&app, get("/admin/forms/section", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    let fields = body["fields"].as_array().unwrap();
    assert!(fields
        .iter()
        .any(|f| f["name"] == json!("base_title") && f["depends_on"] == json!("base_enable")));

    let (status, _) = response_json(&app, get("/admin/forms/zone", Some(&token))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = response_json(
        &app,
        with_json(Method::POST, "/admin/migrate/i18n", Some(&token), &json!(null)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sections"], json!(2));
    assert_eq!(body["items"], json!(2));
    assert_eq!(body["toppings"], json!(1));
}
