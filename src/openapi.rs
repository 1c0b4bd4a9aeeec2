use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storefront API",
        version = "0.1.0",
        description = r#"
# Storefront API

E-commerce backend for a storefront: product catalog, anonymous carts,
checkout, orders, customer profiles, and tagging.

## Authentication

Catalog reads and cart operations are anonymous. Orders and customer
profile endpoints require a JWT issued by the identity provider:

```
Authorization: Bearer <your-jwt-token>
```

Catalog writes and order administration additionally require the `staff` role.

## Error Handling

Errors use a consistent JSON shape with appropriate HTTP status codes:

```json
{
  "error": "Not Found",
  "message": "Cart 550e8400-e29b-41d4-a716-446655440000 not found",
  "timestamp": "2026-01-01T00:00:00Z"
}
```

Deleting a collection or product that other records still reference
fails with 405 Method Not Allowed.
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "products", description = "Product catalog"),
        (name = "collections", description = "Product collections"),
        (name = "carts", description = "Anonymous shopping carts"),
        (name = "orders", description = "Checkout and orders"),
        (name = "customers", description = "Customer profiles"),
        (name = "tags", description = "Generic tagging")
    ),
    paths(
        crate::handlers::products::list_products,
        crate::handlers::products::get_product,
        crate::handlers::products::create_product,
        crate::handlers::products::delete_product,
        crate::handlers::collections::delete_collection,
        crate::handlers::carts::create_cart,
        crate::handlers::carts::get_cart,
        crate::handlers::carts::add_item,
        crate::handlers::customers::get_me,
        crate::handlers::orders::list_orders,
        crate::handlers::orders::place_order,
        crate::handlers::tags::tag_entity,
    ),
    components(
        schemas(
            crate::errors::ErrorResponse,
            crate::entities::Membership,
            crate::entities::PaymentStatus,
            crate::entities::EntityKind,
            crate::services::catalog::CreateCollectionInput,
            crate::services::catalog::CollectionResponse,
            crate::services::catalog::CreateProductInput,
            crate::services::catalog::UpdateProductInput,
            crate::services::catalog::CreatePromotionInput,
            crate::services::catalog::CreateReviewInput,
            crate::services::catalog::AddImageInput,
            crate::services::carts::ProductSnapshot,
            crate::services::carts::CartItemResponse,
            crate::services::carts::CartResponse,
            crate::services::checkout::OrderItemResponse,
            crate::services::checkout::OrderResponse,
            crate::services::customers::CreateCustomerInput,
            crate::services::customers::UpdateCustomerInput,
            crate::services::customers::UpsertAddressInput,
            crate::services::tags::CreateTagInput,
            crate::services::tags::TagEntityInput,
            crate::handlers::carts::AddCartItemInput,
            crate::handlers::carts::UpdateCartItemInput,
            crate::handlers::orders::PlaceOrderInput,
            crate::handlers::orders::UpdatePaymentStatusInput,
            crate::handlers::products::AttachPromotionInput,
        )
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_generates() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/v1/products"));
        assert!(doc.paths.paths.contains_key("/api/v1/carts/{id}/items"));
    }
}
