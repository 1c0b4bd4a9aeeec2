use crate::{
    auth::AuthUser,
    entities::{
        customer, order, order_item, Customer, Order, OrderItem, PaymentStatus,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::checkout::{OrderItemResponse, OrderResponse},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

/// Order reads and administration.
///
/// Listing and reads are viewer-scoped: staff sees every order, other
/// accounts only see orders belonging to their own customer profile.
/// Orders are immutable after placement except for the payment status.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl OrderService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    async fn with_items(&self, order: order::Model) -> Result<OrderResponse, ServiceError> {
        let items = OrderItem::find()
            .filter(order_item::Column::OrderId.eq(order.id))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|i| OrderItemResponse {
                id: i.id,
                product_id: i.product_id,
                quantity: i.quantity,
                unit_price: i.unit_price,
            })
            .collect();

        Ok(OrderResponse {
            id: order.id,
            customer_id: order.customer_id,
            placed_at: order.placed_at,
            payment_status: order.payment_status,
            items,
        })
    }

    async fn customer_id_for(&self, account_id: Uuid) -> Result<Option<Uuid>, ServiceError> {
        Ok(Customer::find()
            .filter(customer::Column::AccountId.eq(account_id))
            .one(&*self.db)
            .await?
            .map(|c| c.id))
    }

    #[instrument(skip(self, viewer))]
    pub async fn list_orders(&self, viewer: &AuthUser) -> Result<Vec<OrderResponse>, ServiceError> {
        let mut query = Order::find().order_by_desc(order::Column::PlacedAt);

        if !viewer.is_staff() {
            match self.customer_id_for(viewer.account_id).await? {
                Some(customer_id) => {
                    query = query.filter(order::Column::CustomerId.eq(customer_id));
                }
                // No profile yet means no orders to show
                None => return Ok(Vec::new()),
            }
        }

        let orders = query.all(&*self.db).await?;
        let mut out = Vec::with_capacity(orders.len());
        for o in orders {
            out.push(self.with_items(o).await?);
        }
        Ok(out)
    }

    #[instrument(skip(self, viewer))]
    pub async fn get_order(
        &self,
        id: Uuid,
        viewer: &AuthUser,
    ) -> Result<OrderResponse, ServiceError> {
        let order = Order::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", id)))?;

        if !viewer.is_staff() {
            let own = self.customer_id_for(viewer.account_id).await?;
            if own != Some(order.customer_id) {
                return Err(ServiceError::Forbidden(
                    "You do not have access to this order".to_string(),
                ));
            }
        }

        self.with_items(order).await
    }

    /// The only post-placement mutation an order supports.
    #[instrument(skip(self))]
    pub async fn update_payment_status(
        &self,
        id: Uuid,
        status: PaymentStatus,
    ) -> Result<OrderResponse, ServiceError> {
        let order = Order::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", id)))?;

        let mut active: order::ActiveModel = order.into();
        active.payment_status = Set(status);
        let updated = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::OrderPaymentStatusChanged {
                order_id: updated.id,
                new_status: format!("{:?}", status),
            })
            .await;

        self.with_items(updated).await
    }

    /// Removes the order and its lines atomically.
    #[instrument(skip(self))]
    pub async fn delete_order(&self, id: Uuid) -> Result<(), ServiceError> {
        Order::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", id)))?;

        let txn = self.db.begin().await?;
        OrderItem::delete_many()
            .filter(order_item::Column::OrderId.eq(id))
            .exec(&txn)
            .await?;
        Order::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        self.event_sender.send_or_log(Event::OrderDeleted(id)).await;
        Ok(())
    }
}
