mod common;

use axum::http::{Method, StatusCode};
use common::{body_json, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;
use storefront_api::services::catalog::{CreateCollectionInput, CreateProductInput};
use uuid::Uuid;

#[tokio::test]
async fn me_profile_roundtrip_and_address_upsert() {
    let app = TestApp::new().await;
    let account_id = Uuid::new_v4();
    let token = app.customer_token(account_id);

    // No profile yet
    let response = app
        .request(Method::GET, "/api/v1/customers/me", None, Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // First write creates the profile
    let response = app
        .request(
            Method::PUT,
            "/api/v1/customers/me",
            Some(json!({"phone": "555-0103", "membership": "Silver"})),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request(Method::GET, "/api/v1/customers/me", None, Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let profile = body_json(response).await;
    assert_eq!(profile["phone"], "555-0103");
    assert_eq!(profile["membership"], "Silver");

    // Address upsert: create, then replace
    let response = app
        .request(
            Method::PUT,
            "/api/v1/customers/me/address",
            Some(json!({"street": "1 Main St", "city": "Springfield"})),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request(
            Method::PUT,
            "/api/v1/customers/me/address",
            Some(json!({"street": "2 Oak Ave", "city": "Shelbyville"})),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request(Method::GET, "/api/v1/customers/me/address", None, Some(&token))
        .await;
    let address = body_json(response).await;
    assert_eq!(address["street"], "2 Oak Ave");
    assert_eq!(address["city"], "Shelbyville");
}

#[tokio::test]
async fn duplicate_profile_for_same_account_conflicts() {
    let app = TestApp::new().await;
    let staff = app.staff_token();
    let account_id = Uuid::new_v4();

    let payload = json!({"account_id": account_id, "phone": "555-0104"});

    let response = app
        .request(
            Method::POST,
            "/api/v1/customers",
            Some(payload.clone()),
            Some(&staff),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .request(Method::POST, "/api/v1/customers", Some(payload), Some(&staff))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn customer_listing_is_staff_only() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::GET,
            "/api/v1/customers",
            None,
            Some(&app.customer_token(Uuid::new_v4())),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .request(Method::GET, "/api/v1/customers", None, Some(&app.staff_token()))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn tags_attach_to_existing_entities_only() {
    let app = TestApp::new().await;
    let staff = app.staff_token();

    let tag = body_json(
        app.request(
            Method::POST,
            "/api/v1/tags",
            Some(json!({"label": "featured"})),
            Some(&staff),
        )
        .await,
    )
    .await;
    let tag_id = tag["id"].as_str().unwrap().to_string();

    // Target must exist
    let response = app
        .request(
            Method::POST,
            "/api/v1/tagged-items",
            Some(json!({
                "tag_id": tag_id,
                "entity_kind": "product",
                "entity_id": Uuid::new_v4(),
            })),
            Some(&staff),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let collection = app
        .state
        .services
        .catalog
        .create_collection(CreateCollectionInput {
            title: "Featured".to_string(),
        })
        .await
        .unwrap();
    let product = app
        .state
        .services
        .catalog
        .create_product(CreateProductInput {
            title: "Kettle".to_string(),
            slug: "kettle".to_string(),
            description: None,
            unit_price: dec!(25.00),
            inventory: 3,
            collection_id: collection.id,
        })
        .await
        .unwrap();

    let response = app
        .request(
            Method::POST,
            "/api/v1/tagged-items",
            Some(json!({
                "tag_id": tag_id,
                "entity_kind": "product",
                "entity_id": product.id,
            })),
            Some(&staff),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/tags/product/{}", product.id),
            None,
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let tags = body_json(response).await;
    assert_eq!(tags.as_array().unwrap().len(), 1);
    assert_eq!(tags.as_array().unwrap()[0]["label"], "featured");

    // Unknown kinds are rejected before touching the database
    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/tags/warehouse/{}", product.id),
            None,
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn tag_creation_is_staff_only() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/tags",
            Some(json!({"label": "new"})),
            Some(&app.customer_token(Uuid::new_v4())),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
