use crate::auth::{AuthRouterExt, AuthService, ROLE_STAFF};
use crate::handlers::common::{
    created_response, map_service_error, no_content_response, success_response, validate_input,
    PaginatedResponse,
};
use crate::{
    errors::ApiError,
    services::catalog::{
        AddImageInput, CreatePromotionInput, CreateProductInput, CreateReviewInput, ProductFilter,
        UpdateProductInput,
    },
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::Response,
    routing::{delete, get, patch, post},
    Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Creates the router for product endpoints
pub fn products_routes(auth: AuthService) -> Router<AppState> {
    let protected = Router::new()
        .route("/", post(create_product))
        .route("/:id", patch(update_product))
        .route("/:id", delete(delete_product))
        .route("/:id/promotions", post(attach_promotion))
        .route("/:id/images", post(add_image))
        .with_role(auth, ROLE_STAFF);

    Router::new()
        .route("/", get(list_products))
        .route("/:id", get(get_product))
        .route("/:id/reviews", get(list_reviews))
        .route("/:id/reviews", post(create_review))
        .route("/:id/images", get(list_images))
        .merge(protected)
}

/// Creates the router for promotion endpoints
pub fn promotions_routes(auth: AuthService) -> Router<AppState> {
    let protected = Router::new()
        .route("/", post(create_promotion))
        .with_role(auth, ROLE_STAFF);

    Router::new().route("/", get(list_promotions)).merge(protected)
}

/// Query parameters for product listing
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ProductListQuery {
    pub collection_id: Option<Uuid>,
    pub unit_price_min: Option<Decimal>,
    pub unit_price_max: Option<Decimal>,
    pub search: Option<String>,
    /// `unit_price`, `-unit_price`, `last_update`, or `-last_update`
    pub ordering: Option<String>,
    #[serde(default)]
    pub page: Option<u64>,
    #[serde(default)]
    pub per_page: Option<u64>,
}

/// List products with filtering, search, ordering, and pagination
#[utoipa::path(
    get,
    path = "/api/v1/products",
    params(ProductListQuery),
    responses(
        (status = 200, description = "Paginated product list"),
        (status = 400, description = "Invalid filter or ordering", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub(crate) async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<Response, ApiError> {
    let page = query.page.unwrap_or(1);
    let per_page = query.per_page.unwrap_or(20).min(100);
    let filter = ProductFilter {
        collection_id: query.collection_id,
        unit_price_min: query.unit_price_min,
        unit_price_max: query.unit_price_max,
        search: query.search,
        ordering: query.ordering,
    };

    let (items, total) = state
        .services
        .catalog
        .list_products(filter, page, per_page)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(PaginatedResponse::new(
        items, page, per_page, total,
    )))
}

/// Get a single product by ID
#[utoipa::path(
    get,
    path = "/api/v1/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product found"),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub(crate) async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let product = state
        .services
        .catalog
        .get_product(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(product))
}

/// Create a new product
#[utoipa::path(
    post,
    path = "/api/v1/products",
    request_body = CreateProductInput,
    responses(
        (status = 201, description = "Product created"),
        (status = 400, description = "Validation failed", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "products"
)]
pub(crate) async fn create_product(
    State(state): State<AppState>,
    Json(input): Json<CreateProductInput>,
) -> Result<Response, ApiError> {
    validate_input(&input)?;
    let product = state
        .services
        .catalog
        .create_product(input)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(product))
}

async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateProductInput>,
) -> Result<Response, ApiError> {
    validate_input(&input)?;
    let product = state
        .services
        .catalog
        .update_product(id, input)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(product))
}

/// Delete a product. Blocked (405) while any order line references it.
#[utoipa::path(
    delete,
    path = "/api/v1/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
        (status = 405, description = "Product is referenced by order items", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "products"
)]
pub(crate) async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    state
        .services
        .catalog
        .delete_product(id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}

// Reviews

async fn list_reviews(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let reviews = state
        .services
        .catalog
        .list_reviews(product_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(reviews))
}

async fn create_review(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(input): Json<CreateReviewInput>,
) -> Result<Response, ApiError> {
    validate_input(&input)?;
    let review = state
        .services
        .catalog
        .create_review(product_id, input)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(review))
}

// Images

async fn list_images(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let images = state
        .services
        .catalog
        .list_images(product_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(images))
}

async fn add_image(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(input): Json<AddImageInput>,
) -> Result<Response, ApiError> {
    validate_input(&input)?;
    let image = state
        .services
        .catalog
        .add_image(product_id, input)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(image))
}

// Promotions

#[derive(Debug, Deserialize, ToSchema)]
pub struct AttachPromotionInput {
    pub promotion_id: Uuid,
}

async fn attach_promotion(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(input): Json<AttachPromotionInput>,
) -> Result<Response, ApiError> {
    state
        .services
        .catalog
        .attach_promotion(product_id, input.promotion_id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}

async fn list_promotions(State(state): State<AppState>) -> Result<Response, ApiError> {
    let promotions = state
        .services
        .catalog
        .list_promotions()
        .await
        .map_err(map_service_error)?;
    Ok(success_response(promotions))
}

async fn create_promotion(
    State(state): State<AppState>,
    Json(input): Json<CreatePromotionInput>,
) -> Result<Response, ApiError> {
    validate_input(&input)?;
    let promotion = state
        .services
        .catalog
        .create_promotion(input)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(promotion))
}
