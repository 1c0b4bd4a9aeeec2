use crate::auth::{AuthRouterExt, AuthService, AuthenticatedUser, ROLE_STAFF};
use crate::handlers::common::{
    created_response, map_service_error, no_content_response, success_response,
};
use crate::{entities::PaymentStatus, errors::ApiError, AppState};
use axum::{
    extract::{Json, Path, State},
    response::Response,
    routing::{delete, get, patch, post},
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// Creates the router for order endpoints.
///
/// Reads are viewer-scoped; placing an order checks out a cart on behalf
/// of the caller; status changes and deletion are back-office only.
pub fn orders_routes(auth: AuthService) -> Router<AppState> {
    let staff = Router::new()
        .route("/:id", patch(update_payment_status))
        .route("/:id", delete(delete_order))
        .with_role(auth.clone(), ROLE_STAFF);

    Router::new()
        .route("/", get(list_orders))
        .route("/", post(place_order))
        .route("/:id", get(get_order))
        .with_auth(auth.clone())
        .merge(staff)
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PlaceOrderInput {
    pub cart_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePaymentStatusInput {
    pub payment_status: PaymentStatus,
}

/// List orders visible to the caller
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    responses((status = 200, description = "Orders visible to the caller")),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub(crate) async fn list_orders(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Response, ApiError> {
    let orders = state
        .services
        .order
        .list_orders(&user)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(orders))
}

/// Place an order by checking out a cart.
///
/// The cart is consumed: its items become order lines priced at the
/// products' current prices, then the cart is deleted.
#[utoipa::path(
    post,
    path = "/api/v1/orders",
    request_body = PlaceOrderInput,
    responses(
        (status = 201, description = "Order placed"),
        (status = 400, description = "Unknown cart or missing customer profile", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub(crate) async fn place_order(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(input): Json<PlaceOrderInput>,
) -> Result<Response, ApiError> {
    let order = state
        .services
        .checkout
        .checkout(input.cart_id, user.account_id)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(order))
}

async fn get_order(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let order = state
        .services
        .order
        .get_order(id, &user)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(order))
}

async fn update_payment_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdatePaymentStatusInput>,
) -> Result<Response, ApiError> {
    let order = state
        .services
        .order
        .update_payment_status(id, input.payment_status)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(order))
}

async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    state
        .services
        .order
        .delete_order(id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}
