use crate::auth::{AuthRouterExt, AuthService, ROLE_STAFF};
use crate::handlers::common::{
    created_response, map_service_error, success_response, validate_input,
};
use crate::{
    entities::EntityKind,
    errors::ApiError,
    services::tags::{CreateTagInput, TagEntityInput},
    AppState,
};
use axum::{
    extract::{Json, Path, State},
    response::Response,
    routing::{get, post},
    Router,
};
use uuid::Uuid;

/// Creates the router for tag endpoints
pub fn tags_routes(auth: AuthService) -> Router<AppState> {
    let protected = Router::new()
        .route("/", post(create_tag))
        .with_role(auth, ROLE_STAFF);

    Router::new()
        .route("/", get(list_tags))
        .route("/:kind/:entity_id", get(tags_for_entity))
        .merge(protected)
}

/// Creates the router for tag attachments
pub fn tagged_items_routes(auth: AuthService) -> Router<AppState> {
    Router::new()
        .route("/", post(tag_entity))
        .with_role(auth, ROLE_STAFF)
}

async fn list_tags(State(state): State<AppState>) -> Result<Response, ApiError> {
    let tags = state
        .services
        .tag
        .list_tags()
        .await
        .map_err(map_service_error)?;
    Ok(success_response(tags))
}

async fn create_tag(
    State(state): State<AppState>,
    Json(input): Json<CreateTagInput>,
) -> Result<Response, ApiError> {
    validate_input(&input)?;
    let tag = state
        .services
        .tag
        .create_tag(input)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(tag))
}

/// Attach a tag to a product, collection, or customer
#[utoipa::path(
    post,
    path = "/api/v1/tagged-items",
    request_body = TagEntityInput,
    responses(
        (status = 201, description = "Tag attached"),
        (status = 400, description = "Unknown tag or target entity", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "tags"
)]
pub(crate) async fn tag_entity(
    State(state): State<AppState>,
    Json(input): Json<TagEntityInput>,
) -> Result<Response, ApiError> {
    let tagged = state
        .services
        .tag
        .tag_entity(input)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(tagged))
}

async fn tags_for_entity(
    State(state): State<AppState>,
    Path((kind, entity_id)): Path<(String, Uuid)>,
) -> Result<Response, ApiError> {
    let kind: EntityKind = kind
        .parse()
        .map_err(|e: String| ApiError::BadRequest(e))?;
    let tags = state
        .services
        .tag
        .tags_for(kind, entity_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(tags))
}
