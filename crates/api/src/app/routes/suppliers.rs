use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use stockbook_core::PartyId;
use stockbook_parties::PartyKind;
use stockbook_store::Store;

use crate::app::{dto, errors};

const KIND: PartyKind = PartyKind::Supplier;

pub fn router() -> Router {
    Router::new().route("/", get(list_suppliers)).route(
        "/:id",
        get(get_supplier).put(rename_supplier).delete(delete_supplier),
    )
}

pub async fn list_suppliers(Extension(store): Extension<Store>) -> axum::response::Response {
    match store.list_parties(KIND).await {
        Ok(parties) => {
            let items = parties.iter().map(dto::party_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(items)).into_response()
        }
        Err(e) => errors::domain_error_to_response(e, KIND.noun()),
    }
}

pub async fn get_supplier(
    Extension(store): Extension<Store>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: PartyId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_message(StatusCode::BAD_REQUEST, "Invalid supplier ID"),
    };

    match store.get_party(KIND, id).await {
        Ok(party) => (StatusCode::OK, Json(dto::party_to_json(&party))).into_response(),
        Err(e) => errors::domain_error_to_response(e, KIND.noun()),
    }
}

pub async fn rename_supplier(
    Extension(store): Extension<Store>,
    Path(id): Path<String>,
    Json(body): Json<dto::RenameRequest>,
) -> axum::response::Response {
    let id: PartyId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_message(StatusCode::BAD_REQUEST, "Invalid supplier ID"),
    };

    match store
        .rename_party(KIND, id, body.name.as_deref().unwrap_or_default())
        .await
    {
        Ok(party) => (
            StatusCode::OK,
            Json(serde_json::json!({ "id": party.id, "name": party.name })),
        )
            .into_response(),
        Err(e) => errors::domain_error_to_response(e, KIND.noun()),
    }
}

pub async fn delete_supplier(
    Extension(store): Extension<Store>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: PartyId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_message(StatusCode::BAD_REQUEST, "Invalid supplier ID"),
    };

    // Products pointing at this supplier are detached, not deleted.
    match store.delete_party(KIND, id).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => errors::domain_error_to_response(e, KIND.noun()),
    }
}
