use crate::{
    entities::{cart, cart_item, Cart, CartItem, CartModel, Product},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

const NO_PRODUCT_MSG: &str = "No product with the given id was found";

/// Price-bearing product summary embedded in cart reads
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductSnapshot {
    pub id: Uuid,
    pub title: String,
    pub unit_price: Decimal,
}

/// One cart line with its derived line total
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CartItemResponse {
    pub id: Uuid,
    pub product: ProductSnapshot,
    pub quantity: i32,
    pub total_price: Decimal,
}

/// Full cart read model. `total_price` is recomputed from current product
/// prices on every read and is never persisted.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CartResponse {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub items: Vec<CartItemResponse>,
    pub total_price: Decimal,
}

/// Anonymous cart service.
///
/// Carts have no owner until checkout; anyone holding the cart's UUID can
/// read and mutate it. Adding a product already present in the cart merges
/// quantities into the existing line instead of creating a second one.
#[derive(Clone)]
pub struct CartService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl CartService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self))]
    pub async fn create_cart(&self) -> Result<CartModel, ServiceError> {
        let model = cart::ActiveModel {
            id: Set(Uuid::new_v4()),
            created_at: Set(Utc::now()),
        };
        let created = model.insert(&*self.db).await?;

        info!(cart_id = %created.id, "cart created");
        self.event_sender
            .send_or_log(Event::CartCreated(created.id))
            .await;
        Ok(created)
    }

    /// Loads a cart with its items, each priced at the product's current
    /// unit price.
    #[instrument(skip(self))]
    pub async fn get_cart(&self, id: Uuid) -> Result<CartResponse, ServiceError> {
        let cart = Cart::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Cart {} not found", id)))?;

        let rows = CartItem::find()
            .filter(cart_item::Column::CartId.eq(id))
            .find_also_related(Product)
            .all(&*self.db)
            .await?;

        let mut items = Vec::with_capacity(rows.len());
        let mut total_price = Decimal::ZERO;
        for (item, product) in rows {
            // The FK guarantees the product row exists
            let product = product.ok_or_else(|| {
                ServiceError::InternalError(format!(
                    "cart item {} references a missing product",
                    item.id
                ))
            })?;
            let line_total = product.unit_price * Decimal::from(item.quantity);
            total_price += line_total;
            items.push(CartItemResponse {
                id: item.id,
                product: ProductSnapshot {
                    id: product.id,
                    title: product.title,
                    unit_price: product.unit_price,
                },
                quantity: item.quantity,
                total_price: line_total,
            });
        }

        Ok(CartResponse {
            id: cart.id,
            created_at: cart.created_at,
            items,
            total_price,
        })
    }

    /// Adds a product to the cart, merging into an existing line when the
    /// product is already present. Exactly one line per (cart, product)
    /// pair exists afterwards.
    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        cart_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<CartItemResponse, ServiceError> {
        if quantity < 1 {
            return Err(ServiceError::ValidationError(
                "Quantity must be at least 1".to_string(),
            ));
        }

        let txn = self.db.begin().await?;

        Cart::find_by_id(cart_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Cart {} not found", cart_id)))?;

        let product = Product::find_by_id(product_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::ValidationError(NO_PRODUCT_MSG.to_string()))?;

        let existing = CartItem::find()
            .filter(cart_item::Column::CartId.eq(cart_id))
            .filter(cart_item::Column::ProductId.eq(product_id))
            .one(&txn)
            .await?;

        let saved = match existing {
            Some(item) => {
                let merged = item.quantity + quantity;
                let mut active: cart_item::ActiveModel = item.into();
                active.quantity = Set(merged);
                active.update(&txn).await?
            }
            None => {
                let model = cart_item::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    cart_id: Set(cart_id),
                    product_id: Set(product_id),
                    quantity: Set(quantity),
                };
                model.insert(&txn).await?
            }
        };

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CartItemAdded {
                cart_id,
                product_id,
            })
            .await;

        let line_total = product.unit_price * Decimal::from(saved.quantity);
        Ok(CartItemResponse {
            id: saved.id,
            product: ProductSnapshot {
                id: product.id,
                title: product.title,
                unit_price: product.unit_price,
            },
            quantity: saved.quantity,
            total_price: line_total,
        })
    }

    /// Overwrites a line's quantity. Removal has its own operation; a
    /// quantity below 1 is rejected rather than treated as a delete.
    #[instrument(skip(self))]
    pub async fn update_item_quantity(
        &self,
        cart_id: Uuid,
        item_id: Uuid,
        quantity: i32,
    ) -> Result<CartItemResponse, ServiceError> {
        if quantity < 1 {
            return Err(ServiceError::ValidationError(
                "Quantity must be at least 1".to_string(),
            ));
        }

        let item = CartItem::find_by_id(item_id)
            .filter(cart_item::Column::CartId.eq(cart_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Cart item {} not found", item_id)))?;

        let product = item
            .find_related(Product)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::InternalError(format!(
                    "cart item {} references a missing product",
                    item.id
                ))
            })?;

        let mut active: cart_item::ActiveModel = item.into();
        active.quantity = Set(quantity);
        let updated = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CartItemUpdated { cart_id, item_id })
            .await;

        let line_total = product.unit_price * Decimal::from(updated.quantity);
        Ok(CartItemResponse {
            id: updated.id,
            product: ProductSnapshot {
                id: product.id,
                title: product.title,
                unit_price: product.unit_price,
            },
            quantity: updated.quantity,
            total_price: line_total,
        })
    }

    #[instrument(skip(self))]
    pub async fn remove_item(&self, cart_id: Uuid, item_id: Uuid) -> Result<(), ServiceError> {
        let item = CartItem::find_by_id(item_id)
            .filter(cart_item::Column::CartId.eq(cart_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Cart item {} not found", item_id)))?;

        CartItem::delete_by_id(item.id).exec(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CartItemRemoved { cart_id, item_id })
            .await;
        Ok(())
    }

    /// Deletes the cart and all of its items.
    #[instrument(skip(self))]
    pub async fn delete_cart(&self, id: Uuid) -> Result<(), ServiceError> {
        Cart::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Cart {} not found", id)))?;

        let txn = self.db.begin().await?;
        CartItem::delete_many()
            .filter(cart_item::Column::CartId.eq(id))
            .exec(&txn)
            .await?;
        Cart::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        self.event_sender.send_or_log(Event::CartDeleted(id)).await;
        Ok(())
    }
}
