mod common;

use axum::http::{Method, StatusCode};
use common::{body_json, TestApp};
use rust_decimal_macros::dec;
use sea_orm::{EntityTrait, ModelTrait};
use serde_json::json;
use storefront_api::{
    entities::{Product, ProductPromotion, Promotion},
    services::{
        catalog::{CreateCollectionInput, CreateProductInput},
        customers::CreateCustomerInput,
    },
};
use uuid::Uuid;

#[tokio::test]
async fn collection_with_products_cannot_be_deleted() {
    let app = TestApp::new().await;
    let staff = app.staff_token();

    let collection = app
        .state
        .services
        .catalog
        .create_collection(CreateCollectionInput {
            title: "Beverages".to_string(),
        })
        .await
        .unwrap();

    app.state
        .services
        .catalog
        .create_product(CreateProductInput {
            title: "Green Tea".to_string(),
            slug: "green-tea".to_string(),
            description: None,
            unit_price: dec!(10.00),
            inventory: 5,
            collection_id: collection.id,
        })
        .await
        .unwrap();

    let response = app
        .request(
            Method::DELETE,
            &format!("/api/v1/collections/{}", collection.id),
            None,
            Some(&staff),
        )
        .await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

    // An empty collection deletes fine
    let empty = app
        .state
        .services
        .catalog
        .create_collection(CreateCollectionInput {
            title: "Empty".to_string(),
        })
        .await
        .unwrap();
    let response = app
        .request(
            Method::DELETE,
            &format!("/api/v1/collections/{}", empty.id),
            None,
            Some(&staff),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn ordered_product_cannot_be_deleted() {
    let app = TestApp::new().await;
    let staff = app.staff_token();
    let account_id = Uuid::new_v4();

    app.state
        .services
        .customer
        .create_customer(CreateCustomerInput {
            account_id,
            phone: "555-0101".to_string(),
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
            title: "Pantry".to_string(),
        })
        .await
        .unwrap();
    let product = app
        .state
        .services
        .catalog
        .create_product(CreateProductInput {
            title: "Honey".to_string(),
            slug: "honey".to_string(),
            description: None,
            unit_price: dec!(5.00),
            inventory: 5,
            collection_id: collection.id,
        })
        .await
        .unwrap();

    // Place an order containing the product
    let cart = app.state.services.cart.create_cart().await.unwrap();
    app.state
        .services
        .cart
        .add_item(cart.id, product.id, 1)
        .await
        .unwrap();
    app.state
        .services
        .checkout
        .checkout(cart.id, account_id)
        .await
        .unwrap();

    let response = app
        .request(
            Method::DELETE,
            &format!("/api/v1/products/{}", product.id),
            None,
            Some(&staff),
        )
        .await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn catalog_writes_require_staff_role() {
    let app = TestApp::new().await;
    let customer = app.customer_token(Uuid::new_v4());

    let payload = json!({"title": "Snacks"});

    let response = app
        .request(Method::POST, "/api/v1/collections", Some(payload.clone()), None)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .request(
            Method::POST,
            "/api/v1/collections",
            Some(payload),
            Some(&customer),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn product_listing_filters_and_orders() {
    let app = TestApp::new().await;

    let collection = app
        .state
        .services
        .catalog
        .create_collection(CreateCollectionInput {
            title: "Teas".to_string(),
        })
        .await
        .unwrap();
    for (title, price) in [("Green Tea", dec!(10.00)), ("Black Tea", dec!(4.00)), ("Oolong", dec!(20.00))] {
        app.state
            .services
            .catalog
            .create_product(CreateProductInput {
                title: title.to_string(),
                slug: title.to_lowercase().replace(' ', "-"),
                description: Some(format!("{} leaves", title)),
                unit_price: price,
                inventory: 5,
                collection_id: collection.id,
            })
            .await
            .unwrap();
    }

    // Price ceiling filter
    let response = app
        .request(
            Method::GET,
            "/api/v1/products?unit_price_max=10.00&ordering=unit_price",
            None,
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let titles: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Black Tea", "Green Tea"]);

    // Substring search over title/description
    let response = app
        .request(Method::GET, "/api/v1/products?search=Oolong", None, None)
        .await;
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    // Unknown ordering field is rejected
    let response = app
        .request(Method::GET, "/api/v1/products?ordering=price", None, None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn review_creation_validates_product() {
    let app = TestApp::new().await;

    let payload = json!({"name": "Ada", "description": "Lovely"});
    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/products/{}/reviews", Uuid::new_v4()),
            Some(payload.clone()),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let collection = app
        .state
        .services
        .catalog
        .create_collection(CreateCollectionInput {
            title: "Books".to_string(),
        })
        .await
        .unwrap();
    let product = app
        .state
        .services
        .catalog
        .create_product(CreateProductInput {
            title: "Notebook".to_string(),
            slug: "notebook".to_string(),
            description: None,
            unit_price: dec!(3.00),
            inventory: 5,
            collection_id: collection.id,
        })
        .await
        .unwrap();

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/products/{}/reviews", product.id),
            Some(payload),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/products/{}/reviews", product.id),
            None,
            None,
        )
        .await;
    let reviews = body_json(response).await;
    assert_eq!(reviews.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn unit_price_below_one_is_rejected() {
    let app = TestApp::new().await;
    let staff = app.staff_token();

    let collection = app
        .state
        .services
        .catalog
        .create_collection(CreateCollectionInput {
            title: "Cheap".to_string(),
        })
        .await
        .unwrap();

    let response = app
        .request(
            Method::POST,
            "/api/v1/products",
            Some(json!({
                "title": "Freebie",
                "slug": "freebie",
                "unit_price": "0.50",
                "inventory": 1,
                "collection_id": collection.id,
            })),
            Some(&staff),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn promotions_attach_to_products() {
    let app = TestApp::new().await;
    let staff = app.staff_token();

    let collection = app
        .state
        .services
        .catalog
        .create_collection(CreateCollectionInput {
            title: "Sale".to_string(),
        })
        .await
        .unwrap();
    let product = app
        .state
        .services
        .catalog
        .create_product(CreateProductInput {
            title: "Lamp".to_string(),
            slug: "lamp".to_string(),
            description: None,
            unit_price: dec!(30.00),
            inventory: 5,
            collection_id: collection.id,
        })
        .await
        .unwrap();

    let response = app
        .request(
            Method::POST,
            "/api/v1/promotions",
            Some(json!({"description": "Spring sale", "discount": 0.15})),
            Some(&staff),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let promotion = body_json(response).await;
    let promotion_id = promotion["id"].as_str().unwrap();

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/products/{}/promotions", product.id),
            Some(json!({"promotion_id": promotion_id})),
            Some(&staff),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // The link row resolves to both sides of the association
    let link = ProductPromotion::find_by_id((product.id, promotion_id.parse::<Uuid>().unwrap()))
        .one(&*app.state.db)
        .await
        .unwrap()
        .expect("link row exists");
    let attached = link
        .find_related(Promotion)
        .one(&*app.state.db)
        .await
        .unwrap()
        .expect("promotion reachable from link");
    assert_eq!(attached.description, "Spring sale");
    let linked_product = link
        .find_related(Product)
        .one(&*app.state.db)
        .await
        .unwrap()
        .expect("product reachable from link");
    assert_eq!(linked_product.id, product.id);

    // Attaching twice conflicts
    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/products/{}/promotions", product.id),
            Some(json!({"promotion_id": promotion_id})),
            Some(&staff),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}
