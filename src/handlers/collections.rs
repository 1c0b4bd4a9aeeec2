use crate::auth::{AuthRouterExt, AuthService, ROLE_STAFF};
use crate::handlers::common::{
    created_response, map_service_error, no_content_response, success_response, validate_input,
    PaginatedResponse, PaginationParams,
};
use crate::{errors::ApiError, services::catalog::CreateCollectionInput, AppState};
use axum::{
    extract::{Json, Path, Query, State},
    response::Response,
    routing::{delete, get, patch, post},
    Router,
};
use uuid::Uuid;

/// Creates the router for collection endpoints
pub fn collections_routes(auth: AuthService) -> Router<AppState> {
    let protected = Router::new()
        .route("/", post(create_collection))
        .route("/:id", patch(update_collection))
        .route("/:id", delete(delete_collection))
        .with_role(auth, ROLE_STAFF);

    Router::new()
        .route("/", get(list_collections))
        .route("/:id", get(get_collection))
        .merge(protected)
}

async fn list_collections(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Response, ApiError> {
    let (items, total) = state
        .services
        .catalog
        .list_collections(pagination.page, pagination.per_page)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(PaginatedResponse::new(
        items,
        pagination.page,
        pagination.per_page,
        total,
    )))
}

async fn get_collection(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let collection = state
        .services
        .catalog
        .get_collection(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(collection))
}

async fn create_collection(
    State(state): State<AppState>,
    Json(input): Json<CreateCollectionInput>,
) -> Result<Response, ApiError> {
    validate_input(&input)?;
    let collection = state
        .services
        .catalog
        .create_collection(input)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(collection))
}

async fn update_collection(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<CreateCollectionInput>,
) -> Result<Response, ApiError> {
    validate_input(&input)?;
    let collection = state
        .services
        .catalog
        .update_collection(id, input)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(collection))
}

/// Delete a collection. Blocked (405) while any product references it.
#[utoipa::path(
    delete,
    path = "/api/v1/collections/{id}",
    params(("id" = Uuid, Path, description = "Collection ID")),
    responses(
        (status = 204, description = "Collection deleted"),
        (status = 404, description = "Collection not found", body = crate::errors::ErrorResponse),
        (status = 405, description = "Collection still contains products", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "collections"
)]
pub(crate) async fn delete_collection(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    state
        .services
        .catalog
        .delete_collection(id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}
