mod common;

use axum::http::{Method, StatusCode};
use common::{body_json, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;
use storefront_api::services::{
    catalog::{CreateCollectionInput, CreateProductInput},
    customers::CreateCustomerInput,
};
use uuid::Uuid;

/// Seeds a customer profile and one placed order, returning the order id.
async fn seed_order(app: &TestApp, account_id: Uuid) -> String {
    app.state
        .services
        .customer
        .create_customer(CreateCustomerInput {
            account_id,
            phone: "555-0102".to_string(),
            birth_date: None,
            membership: None,
        })
        .await
        .unwrap();

    let collection = app
        .state
        .services
        .catalog
        .create_collection(CreateCollectionInput {
            title: format!("c-{}", Uuid::new_v4()),
        })
        .await
        .unwrap();
    let product = app
        .state
        .services
        .catalog
        .create_product(CreateProductInput {
            title: format!("p-{}", Uuid::new_v4()),
            slug: format!("p-{}", Uuid::new_v4()),
            description: None,
            unit_price: dec!(7.00),
            inventory: 5,
            collection_id: collection.id,
        })
        .await
        .unwrap();

    let cart = app.state.services.cart.create_cart().await.unwrap();
    app.state
        .services
        .cart
        .add_item(cart.id, product.id, 1)
        .await
        .unwrap();
    let order = app
        .state
        .services
        .checkout
        .checkout(cart.id, account_id)
        .await
        .unwrap();
    order.id.to_string()
}

#[tokio::test]
async fn customers_only_see_their_own_orders() {
    let app = TestApp::new().await;
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let alice_order = seed_order(&app, alice).await;
    let _bob_order = seed_order(&app, bob).await;

    let response = app
        .request(
            Method::GET,
            "/api/v1/orders",
            None,
            Some(&app.customer_token(alice)),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let orders = body_json(response).await;
    let orders = orders.as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["id"].as_str().unwrap(), alice_order);

    // Staff sees everything
    let response = app
        .request(Method::GET, "/api/v1/orders", None, Some(&app.staff_token()))
        .await;
    let orders = body_json(response).await;
    assert_eq!(orders.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn reading_another_customers_order_is_forbidden() {
    let app = TestApp::new().await;
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let alice_order = seed_order(&app, alice).await;
    seed_order(&app, bob).await;

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/orders/{}", alice_order),
            None,
            Some(&app.customer_token(bob)),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/orders/{}", alice_order),
            None,
            Some(&app.staff_token()),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn payment_status_update_is_staff_only() {
    let app = TestApp::new().await;
    let alice = Uuid::new_v4();
    let order_id = seed_order(&app, alice).await;

    let payload = json!({"payment_status": "Completed"});

    let response = app
        .request(
            Method::PATCH,
            &format!("/api/v1/orders/{}", order_id),
            Some(payload.clone()),
            Some(&app.customer_token(alice)),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .request(
            Method::PATCH,
            &format!("/api/v1/orders/{}", order_id),
            Some(payload),
            Some(&app.staff_token()),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let order = body_json(response).await;
    assert_eq!(order["payment_status"], "Completed");
}

#[tokio::test]
async fn staff_can_delete_orders_with_their_items() {
    let app = TestApp::new().await;
    let alice = Uuid::new_v4();
    let order_id = seed_order(&app, alice).await;
    let staff = app.staff_token();

    let response = app
        .request(
            Method::DELETE,
            &format!("/api/v1/orders/{}", order_id),
            None,
            Some(&staff),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/orders/{}", order_id),
            None,
            Some(&staff),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listing_orders_without_token_is_unauthorized() {
    let app = TestApp::new().await;
    let response = app.request(Method::GET, "/api/v1/orders", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
