use crate::{
    entities::{
        cart_item, customer, order, order_item, Cart, CartItem, Customer, OrderItem,
        PaymentStatus, Product,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

const NO_CART_MSG: &str = "No cart with the given id was found";
const NO_CUSTOMER_MSG: &str = "No customer profile exists for the authenticated account";

/// Order line as returned from checkout and order reads
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    /// Price captured at checkout time
    pub unit_price: Decimal,
}

/// Order read model with its lines
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub placed_at: DateTime<Utc>,
    pub payment_status: PaymentStatus,
    pub items: Vec<OrderItemResponse>,
}

/// Converts carts into orders.
///
/// The whole conversion runs in one transaction: order creation, line
/// snapshotting, and cart destruction either all happen or none do.
#[derive(Clone)]
pub struct CheckoutService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl CheckoutService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Checks out a cart on behalf of the authenticated account.
    ///
    /// Each order line copies the product's current unit price; later
    /// product repricing does not touch placed orders. The cart and its
    /// items are destroyed in the same transaction. An empty cart produces
    /// an order with no lines.
    #[instrument(skip(self))]
    pub async fn checkout(
        &self,
        cart_id: Uuid,
        account_id: Uuid,
    ) -> Result<OrderResponse, ServiceError> {
        let txn = self.db.begin().await?;

        let customer = Customer::find()
            .filter(customer::Column::AccountId.eq(account_id))
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::ValidationError(NO_CUSTOMER_MSG.to_string()))?;

        Cart::find_by_id(cart_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::ValidationError(NO_CART_MSG.to_string()))?;

        let order_model = order::ActiveModel {
            id: Set(Uuid::new_v4()),
            customer_id: Set(customer.id),
            placed_at: Set(Utc::now()),
            payment_status: Set(PaymentStatus::Pending),
        };
        let placed = order_model.insert(&txn).await?;

        let cart_rows = CartItem::find()
            .filter(cart_item::Column::CartId.eq(cart_id))
            .find_also_related(Product)
            .all(&txn)
            .await?;

        let mut lines = Vec::with_capacity(cart_rows.len());
        let mut line_models = Vec::with_capacity(cart_rows.len());
        for (item, product) in cart_rows {
            let product = product.ok_or_else(|| {
                ServiceError::InternalError(format!(
                    "cart item {} references a missing product",
                    item.id
                ))
            })?;

            // No reservation or decrement happens here; the mismatch is
            // only surfaced in the logs.
            if item.quantity > product.inventory {
                warn!(
                    product_id = %product.id,
                    requested = item.quantity,
                    inventory = product.inventory,
                    "checkout quantity exceeds recorded inventory"
                );
            }

            let line_id = Uuid::new_v4();
            line_models.push(order_item::ActiveModel {
                id: Set(line_id),
                order_id: Set(placed.id),
                product_id: Set(product.id),
                quantity: Set(item.quantity),
                unit_price: Set(product.unit_price),
            });
            lines.push(OrderItemResponse {
                id: line_id,
                product_id: product.id,
                quantity: item.quantity,
                unit_price: product.unit_price,
            });
        }

        if !line_models.is_empty() {
            OrderItem::insert_many(line_models).exec(&txn).await?;
        }

        CartItem::delete_many()
            .filter(cart_item::Column::CartId.eq(cart_id))
            .exec(&txn)
            .await?;
        Cart::delete_by_id(cart_id).exec(&txn).await?;

        txn.commit().await?;

        info!(order_id = %placed.id, cart_id = %cart_id, "cart checked out");
        self.event_sender
            .send_or_log(Event::OrderPlaced {
                order_id: placed.id,
                cart_id,
            })
            .await;

        Ok(OrderResponse {
            id: placed.id,
            customer_id: placed.customer_id,
            placed_at: placed.placed_at,
            payment_status: placed.payment_status,
            items: lines,
        })
    }
}
