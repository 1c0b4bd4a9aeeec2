mod common;

use axum::http::{Method, StatusCode};
use common::{body_json, TestApp};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;
use storefront_api::services::{
    catalog::{CreateCollectionInput, CreateProductInput, UpdateProductInput},
    customers::CreateCustomerInput,
};
use uuid::Uuid;

async fn seed_product(app: &TestApp, title: &str, price: Decimal) -> Uuid {
    let collection = app
        .state
        .services
        .catalog
        .create_collection(CreateCollectionInput {
            title: format!("{} collection", title),
        })
        .await
        .expect("create collection");

    app.state
        .services
        .catalog
        .create_product(CreateProductInput {
            title: title.to_string(),
            slug: title.to_lowercase().replace(' ', "-"),
            description: None,
            unit_price: price,
            inventory: 10,
            collection_id: collection.id,
        })
        .await
        .expect("create product")
        .id
}

async fn seed_customer(app: &TestApp, account_id: Uuid) {
    app.state
        .services
        .customer
        .create_customer(CreateCustomerInput {
            account_id,
            phone: "555-0100".to_string(),
            birth_date: None,
            membership: None,
        })
        .await
        .expect("create customer profile");
}

fn as_decimal(v: &serde_json::Value) -> Decimal {
    v.as_str().map_or_else(
        || Decimal::try_from(v.as_f64().unwrap()).unwrap(),
        |s| s.parse().unwrap(),
    )
}

#[tokio::test]
async fn checkout_converts_cart_and_snapshots_prices() {
    let app = TestApp::new().await;
    let account_id = Uuid::new_v4();
    seed_customer(&app, account_id).await;
    let token = app.customer_token(account_id);

    let tea = seed_product(&app, "Green Tea", dec!(10.00)).await;
    let honey = seed_product(&app, "Honey", dec!(5.00)).await;

    let cart = body_json(app.request(Method::POST, "/api/v1/carts", None, None).await).await;
    let cart_id = cart["id"].as_str().unwrap().to_string();
    for (product, qty) in [(tea, 2), (honey, 1)] {
        app.request(
            Method::POST,
            &format!("/api/v1/carts/{}/items", cart_id),
            Some(json!({"product_id": product, "quantity": qty})),
            None,
        )
        .await;
    }

    let response = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({"cart_id": cart_id})),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let order = body_json(response).await;
    assert_eq!(order["payment_status"], "Pending");
    assert_eq!(order["items"].as_array().unwrap().len(), 2);

    // The cart is consumed by checkout
    let response = app
        .request(Method::GET, &format!("/api/v1/carts/{}", cart_id), None, None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Reprice the tea; the placed order must keep the old price
    app.state
        .services
        .catalog
        .update_product(
            tea,
            UpdateProductInput {
                unit_price: Some(dec!(99.00)),
                ..Default::default()
            },
        )
        .await
        .expect("reprice product");

    let order_id = order["id"].as_str().unwrap();
    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/orders/{}", order_id),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let reloaded = body_json(response).await;
    let tea_line = reloaded["items"]
        .as_array()
        .unwrap()
        .iter()
        .find(|i| i["product_id"].as_str() == Some(&tea.to_string()))
        .expect("tea line present");
    assert_eq!(as_decimal(&tea_line["unit_price"]), dec!(10.00));
}

#[tokio::test]
async fn checkout_of_unknown_cart_fails_validation() {
    let app = TestApp::new().await;
    let account_id = Uuid::new_v4();
    seed_customer(&app, account_id).await;
    let token = app.customer_token(account_id);

    let response = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({"cart_id": Uuid::new_v4()})),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("No cart with the given id was found"));
}

#[tokio::test]
async fn checkout_without_customer_profile_fails_validation() {
    let app = TestApp::new().await;
    let token = app.customer_token(Uuid::new_v4());

    let cart = body_json(app.request(Method::POST, "/api/v1/carts", None, None).await).await;
    let cart_id = cart["id"].as_str().unwrap().to_string();

    let response = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({"cart_id": cart_id})),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn empty_cart_checks_out_into_empty_order() {
    let app = TestApp::new().await;
    let account_id = Uuid::new_v4();
    seed_customer(&app, account_id).await;
    let token = app.customer_token(account_id);

    let cart = body_json(app.request(Method::POST, "/api/v1/carts", None, None).await).await;
    let cart_id = cart["id"].as_str().unwrap().to_string();

    let response = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({"cart_id": cart_id})),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let order = body_json(response).await;
    assert!(order["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn checkout_requires_authentication() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({"cart_id": Uuid::new_v4()})),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
