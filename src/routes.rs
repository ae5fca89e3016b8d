use axum::{
    extract::{Query, State},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};

use crate::admin;
use crate::auth;
use crate::error::AppError;
use crate::menu::{load_tree, MenuData};
use crate::render::{render_menu, MenuView};
use crate::state::AppState;
use crate::text::{Category, Locale};

#[derive(Debug, Deserialize)]
pub struct MenuQuery {
    #[serde(default)]
    pub locale: Option<Locale>,
    #[serde(default)]
    pub tab: Option<String>,
}

/// Public menu: one category tab rendered for one locale, hidden entities
/// stripped.
pub async fn public_menu(
    State(state): State<AppState>,
    Query(query): Query<MenuQuery>,
) -> Result<Json<MenuView>, AppError> {
    let data = load_tree(state.store.as_ref()).await?.aggregate();
    let locale = query.locale.unwrap_or(Locale::Es);
    let active = resolve_active(&data, query.tab.as_deref());
    Ok(Json(render_menu(&data, &active, locale)))
}

/// An unknown or absent tab falls back to the first populated category, and
/// an empty menu still renders the default first tab.
fn resolve_active(data: &MenuData, tab: Option<&str>) -> Category {
    tab.map(Category::from_id)
        .filter(|c| data.by_group.contains_key(c))
        .or_else(|| data.first_category().cloned())
        .unwrap_or(Category::Poffertjes)
}

pub fn router(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route("/menu", get(admin::list_menu))
        .route("/sections", post(admin::create_section))
        .route(
            "/sections/{id}",
            put(admin::update_section).delete(admin::delete_section),
        )
        .route("/sections/{id}/order", put(admin::reorder_section))
        .route("/sections/{id}/items", post(admin::create_item))
        .route(
            "/sections/{section_id}/items/{item_id}",
            put(admin::update_item).delete(admin::delete_item),
        )
        .route(
            "/sections/{section_id}/items/{item_id}/order",
            put(admin::reorder_item),
        )
        .route("/sections/{id}/toppings", post(admin::create_topping))
        .route(
            "/sections/{section_id}/toppings/{topping_id}",
            put(admin::update_topping).delete(admin::delete_topping),
        )
        .route(
            "/sections/{section_id}/toppings/{topping_id}/order",
            put(admin::reorder_topping),
        )
        .route("/settings/nav-labels", put(admin::update_nav_labels))
        .route("/forms/{kind}", get(admin::form_schema))
        .route("/migrate/i18n", post(admin::migrate_i18n))
        .route("/logout", post(auth::logout))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_session,
        ));

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_origin(Any);

    Router::new()
        .route("/menu", get(public_menu))
        .route("/admin/login", post(auth::login))
        .nest("/admin", admin_routes)
        .layer(cors)
        .with_state(state)
}
