use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use stockbook_core::ProductId;
use stockbook_inventory::ScanLine;
use stockbook_store::Store;

use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/scan", post(scan))
        .route("/clear", post(clear))
        .route(
            "/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
}

pub async fn list_products(
    Extension(store): Extension<Store>,
    Query(query): Query<dto::ListProductsQuery>,
) -> axum::response::Response {
    match store.list_products(query.code.as_deref()).await {
        Ok(products) => {
            let items = products.iter().map(dto::product_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(items)).into_response()
        }
        Err(e) => errors::domain_error_to_response(e, "Product"),
    }
}

pub async fn create_product(
    Extension(store): Extension<Store>,
    Json(body): Json<dto::ProductPayload>,
) -> axum::response::Response {
    let draft = match body.into_draft() {
        Ok(draft) => draft,
        Err(e) => return errors::domain_error_to_response(e, "Product"),
    };

    match store.create_product(&draft).await {
        Ok(product) => {
            (StatusCode::CREATED, Json(dto::product_to_json(&product))).into_response()
        }
        Err(e) => errors::domain_error_to_response(e, "Product"),
    }
}

pub async fn get_product(
    Extension(store): Extension<Store>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ProductId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_message(StatusCode::BAD_REQUEST, "Invalid product ID"),
    };

    let product = match store.fetch_product(id).await {
        Ok(product) => product,
        Err(e) => return errors::domain_error_to_response(e, "Product"),
    };
    let history = match store.fetch_product_history(id).await {
        Ok(history) => history,
        Err(e) => return errors::domain_error_to_response(e, "Product"),
    };

    (
        StatusCode::OK,
        Json(dto::product_detail_to_json(&product, &history)),
    )
        .into_response()
}

pub async fn update_product(
    Extension(store): Extension<Store>,
    Path(id): Path<String>,
    Json(body): Json<dto::ProductPayload>,
) -> axum::response::Response {
    let id: ProductId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_message(StatusCode::BAD_REQUEST, "Invalid product ID"),
    };

    let draft = match body.into_draft() {
        Ok(draft) => draft,
        Err(e) => return errors::domain_error_to_response(e, "Product"),
    };

    match store.update_product(id, &draft).await {
        Ok(product) => (StatusCode::OK, Json(dto::product_to_json(&product))).into_response(),
        Err(e) => errors::domain_error_to_response(e, "Product"),
    }
}

pub async fn delete_product(
    Extension(store): Extension<Store>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ProductId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_message(StatusCode::BAD_REQUEST, "Invalid product ID"),
    };

    match store.delete_product(id).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => errors::domain_error_to_response(e, "Product"),
    }
}

/// The reconciliation endpoint: a batch of scanned `{ id, quantity }` lines
/// is validated and applied atomically, producing one audit event.
pub async fn scan(
    Extension(store): Extension<Store>,
    Json(body): Json<Vec<dto::ScanEntry>>,
) -> axum::response::Response {
    let lines: Vec<ScanLine> = body.into_iter().map(dto::ScanEntry::into_line).collect();

    match store.reconcile(&lines).await {
        Ok(event) => (StatusCode::OK, Json(dto::update_event_to_json(&event))).into_response(),
        Err(e) => errors::domain_error_to_response(e, "Product"),
    }
}

/// Bulk reset: every quantity back to zero, no audit event.
pub async fn clear(Extension(store): Extension<Store>) -> axum::response::Response {
    match store.reset_quantities().await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => errors::domain_error_to_response(e, "Product"),
    }
}
