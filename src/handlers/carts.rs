use crate::handlers::common::{
    created_response, map_service_error, no_content_response, success_response,
};
use crate::{errors::ApiError, AppState};
use axum::{
    extract::{Json, Path, State},
    response::Response,
    routing::{delete, get, patch, post},
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// Creates the router for cart endpoints.
///
/// Carts are anonymous: no authentication applies, possession of the
/// cart UUID is the only credential.
pub fn carts_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_cart))
        .route("/:id", get(get_cart))
        .route("/:id", delete(delete_cart))
        .route("/:id/items", post(add_item))
        .route("/:id/items/:item_id", patch(update_item))
        .route("/:id/items/:item_id", delete(remove_item))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddCartItemInput {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCartItemInput {
    pub quantity: i32,
}

/// Create a new empty cart
#[utoipa::path(
    post,
    path = "/api/v1/carts",
    responses((status = 201, description = "Cart created")),
    tag = "carts"
)]
pub(crate) async fn create_cart(State(state): State<AppState>) -> Result<Response, ApiError> {
    let cart = state
        .services
        .cart
        .create_cart()
        .await
        .map_err(map_service_error)?;
    Ok(created_response(cart))
}

/// Get a cart with its items and computed total
#[utoipa::path(
    get,
    path = "/api/v1/carts/{id}",
    params(("id" = Uuid, Path, description = "Cart ID")),
    responses(
        (status = 200, description = "Cart with items and totals"),
        (status = 404, description = "Cart not found", body = crate::errors::ErrorResponse)
    ),
    tag = "carts"
)]
pub(crate) async fn get_cart(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let cart = state
        .services
        .cart
        .get_cart(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(cart))
}

async fn delete_cart(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    state
        .services
        .cart
        .delete_cart(id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}

/// Add a product to a cart; quantities merge when the product is already present
#[utoipa::path(
    post,
    path = "/api/v1/carts/{id}/items",
    params(("id" = Uuid, Path, description = "Cart ID")),
    request_body = AddCartItemInput,
    responses(
        (status = 201, description = "Item added or merged"),
        (status = 400, description = "Unknown product or invalid quantity", body = crate::errors::ErrorResponse),
        (status = 404, description = "Cart not found", body = crate::errors::ErrorResponse)
    ),
    tag = "carts"
)]
pub(crate) async fn add_item(
    State(state): State<AppState>,
    Path(cart_id): Path<Uuid>,
    Json(input): Json<AddCartItemInput>,
) -> Result<Response, ApiError> {
    let item = state
        .services
        .cart
        .add_item(cart_id, input.product_id, input.quantity)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(item))
}

async fn update_item(
    State(state): State<AppState>,
    Path((cart_id, item_id)): Path<(Uuid, Uuid)>,
    Json(input): Json<UpdateCartItemInput>,
) -> Result<Response, ApiError> {
    let item = state
        .services
        .cart
        .update_item_quantity(cart_id, item_id, input.quantity)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(item))
}

async fn remove_item(
    State(state): State<AppState>,
    Path((cart_id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<Response, ApiError> {
    state
        .services
        .cart
        .remove_item(cart_id, item_id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}
