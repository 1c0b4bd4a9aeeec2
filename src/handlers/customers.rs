use crate::auth::{AuthRouterExt, AuthService, AuthenticatedUser, ROLE_STAFF};
use crate::handlers::common::{
    created_response, map_service_error, success_response, validate_input, PaginatedResponse,
    PaginationParams,
};
use crate::{
    errors::ApiError,
    services::customers::{CreateCustomerInput, UpdateCustomerInput, UpsertAddressInput},
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::Response,
    routing::{get, post, put},
    Router,
};
use uuid::Uuid;

/// Creates the router for customer endpoints.
///
/// `/me` paths serve the caller's own profile; the rest is back-office.
pub fn customers_routes(auth: AuthService) -> Router<AppState> {
    let staff = Router::new()
        .route("/", get(list_customers))
        .route("/", post(create_customer))
        .route("/:id", get(get_customer))
        .with_role(auth.clone(), ROLE_STAFF);

    let me = Router::new()
        .route("/me", get(get_me))
        .route("/me", put(update_me))
        .route("/me/address", put(upsert_my_address))
        .route("/me/address", get(get_my_address))
        .with_auth(auth);

    Router::new().merge(staff).merge(me)
}

async fn list_customers(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Response, ApiError> {
    let (items, total) = state
        .services
        .customer
        .list_customers(pagination.page, pagination.per_page)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(PaginatedResponse::new(
        items,
        pagination.page,
        pagination.per_page,
        total,
    )))
}

async fn create_customer(
    State(state): State<AppState>,
    Json(input): Json<CreateCustomerInput>,
) -> Result<Response, ApiError> {
    validate_input(&input)?;
    let customer = state
        .services
        .customer
        .create_customer(input)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(customer))
}

async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let customer = state
        .services
        .customer
        .get_customer(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(customer))
}

/// Get the caller's own customer profile
#[utoipa::path(
    get,
    path = "/api/v1/customers/me",
    responses(
        (status = 200, description = "The caller's profile"),
        (status = 404, description = "No profile exists yet", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "customers"
)]
pub(crate) async fn get_me(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Response, ApiError> {
    let customer = state
        .services
        .customer
        .get_by_account(user.account_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(customer))
}

async fn update_me(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(input): Json<UpdateCustomerInput>,
) -> Result<Response, ApiError> {
    validate_input(&input)?;
    let customer = state
        .services
        .customer
        .upsert_by_account(user.account_id, input)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(customer))
}

async fn get_my_address(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Response, ApiError> {
    let customer = state
        .services
        .customer
        .get_by_account(user.account_id)
        .await
        .map_err(map_service_error)?;
    let address = state
        .services
        .customer
        .get_address(customer.id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(address))
}

async fn upsert_my_address(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(input): Json<UpsertAddressInput>,
) -> Result<Response, ApiError> {
    validate_input(&input)?;
    let customer = state
        .services
        .customer
        .get_by_account(user.account_id)
        .await
        .map_err(map_service_error)?;
    let address = state
        .services
        .customer
        .upsert_address(customer.id, input)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(address))
}
