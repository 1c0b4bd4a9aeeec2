use crate::{
    entities::{
        collection, product, product_image, product_promotion, promotion, review, CartItem,
        Collection, CollectionModel, OrderItem, Product, ProductImage, ProductImageModel,
        ProductModel, ProductPromotion, Promotion, PromotionModel, Review, ReviewModel,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

const NO_PRODUCT_MSG: &str = "No product with the given id was found";
const NO_COLLECTION_MSG: &str = "No collection with the given id was found";

fn validate_unit_price(price: &Decimal) -> Result<(), validator::ValidationError> {
    if *price < Decimal::ONE {
        return Err(validator::ValidationError::new("unit_price_below_minimum"));
    }
    Ok(())
}

/// Input for creating a collection
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateCollectionInput {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
}

/// Collection read model with its derived product count
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CollectionResponse {
    pub id: Uuid,
    pub title: String,
    pub products_count: u64,
}

/// Input for creating a product
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateProductInput {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(min = 1, max = 255))]
    pub slug: String,
    pub description: Option<String>,
    #[validate(custom = "validate_unit_price")]
    pub unit_price: Decimal,
    #[validate(range(min = 0))]
    pub inventory: i32,
    pub collection_id: Uuid,
}

/// Partial update of a product
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProductInput {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub slug: Option<String>,
    pub description: Option<String>,
    #[validate(custom = "validate_unit_price")]
    pub unit_price: Option<Decimal>,
    #[validate(range(min = 0))]
    pub inventory: Option<i32>,
    pub collection_id: Option<Uuid>,
}

/// Product list filter: collection, price bounds, text search, ordering
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ProductFilter {
    pub collection_id: Option<Uuid>,
    pub unit_price_min: Option<Decimal>,
    pub unit_price_max: Option<Decimal>,
    /// Substring match over title and description
    pub search: Option<String>,
    /// One of `unit_price`, `-unit_price`, `last_update`, `-last_update`
    pub ordering: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreatePromotionInput {
    #[validate(length(min = 1))]
    pub description: String,
    /// Discount fraction, e.g. 0.15 for 15% off
    #[validate(range(min = 0.0, max = 1.0))]
    pub discount: f64,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateReviewInput {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(min = 1))]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AddImageInput {
    #[validate(url)]
    pub url: String,
}

/// Catalog service: collections, products, promotions, reviews, and images.
///
/// Deletion of collections and products is guarded by reference checks so
/// that rows other records depend on cannot be removed (surfaced to HTTP
/// as 405 Method Not Allowed).
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl CatalogService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    // Collections

    #[instrument(skip(self))]
    pub async fn list_collections(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<CollectionResponse>, u64), ServiceError> {
        let paginator = Collection::find()
            .order_by_asc(collection::Column::Title)
            .paginate(&*self.db, per_page.max(1));
        let total = paginator.num_items().await?;
        let collections = paginator.fetch_page(page.saturating_sub(1)).await?;

        let mut out = Vec::with_capacity(collections.len());
        for c in collections {
            let products_count = Product::find()
                .filter(product::Column::CollectionId.eq(c.id))
                .count(&*self.db)
                .await?;
            out.push(CollectionResponse {
                id: c.id,
                title: c.title,
                products_count,
            });
        }
        Ok((out, total))
    }

    #[instrument(skip(self))]
    pub async fn get_collection(&self, id: Uuid) -> Result<CollectionResponse, ServiceError> {
        let c = Collection::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Collection {} not found", id)))?;
        let products_count = Product::find()
            .filter(product::Column::CollectionId.eq(id))
            .count(&*self.db)
            .await?;
        Ok(CollectionResponse {
            id: c.id,
            title: c.title,
            products_count,
        })
    }

    #[instrument(skip(self, input))]
    pub async fn create_collection(
        &self,
        input: CreateCollectionInput,
    ) -> Result<CollectionModel, ServiceError> {
        input.validate()?;

        let model = collection::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(input.title),
        };
        let created = model.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CollectionCreated(created.id))
            .await;
        Ok(created)
    }

    #[instrument(skip(self, input))]
    pub async fn update_collection(
        &self,
        id: Uuid,
        input: CreateCollectionInput,
    ) -> Result<CollectionModel, ServiceError> {
        input.validate()?;

        let existing = Collection::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Collection {} not found", id)))?;

        let mut active: collection::ActiveModel = existing.into();
        active.title = Set(input.title);
        Ok(active.update(&*self.db).await?)
    }

    /// Deletes a collection unless any product still references it.
    #[instrument(skip(self))]
    pub async fn delete_collection(&self, id: Uuid) -> Result<(), ServiceError> {
        Collection::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Collection {} not found", id)))?;

        let product_count = Product::find()
            .filter(product::Column::CollectionId.eq(id))
            .count(&*self.db)
            .await?;
        if product_count > 0 {
            return Err(ServiceError::DeletionBlocked(
                "Collection cannot be deleted because it includes one or more products."
                    .to_string(),
            ));
        }

        Collection::delete_by_id(id).exec(&*self.db).await?;
        self.event_sender
            .send_or_log(Event::CollectionDeleted(id))
            .await;
        Ok(())
    }

    // Products

    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        filter: ProductFilter,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<ProductModel>, u64), ServiceError> {
        let mut query = Product::find();

        if let Some(collection_id) = filter.collection_id {
            query = query.filter(product::Column::CollectionId.eq(collection_id));
        }
        if let Some(min) = filter.unit_price_min {
            query = query.filter(product::Column::UnitPrice.gte(min));
        }
        if let Some(max) = filter.unit_price_max {
            query = query.filter(product::Column::UnitPrice.lte(max));
        }
        if let Some(term) = filter.search.as_deref().filter(|t| !t.is_empty()) {
            let pattern = format!("%{}%", term);
            query = query.filter(
                Condition::any()
                    .add(product::Column::Title.like(pattern.clone()))
                    .add(product::Column::Description.like(pattern)),
            );
        }

        query = match filter.ordering.as_deref() {
            Some("unit_price") => query.order_by_asc(product::Column::UnitPrice),
            Some("-unit_price") => query.order_by_desc(product::Column::UnitPrice),
            Some("last_update") => query.order_by_asc(product::Column::LastUpdate),
            Some("-last_update") => query.order_by_desc(product::Column::LastUpdate),
            Some(other) => {
                return Err(ServiceError::ValidationError(format!(
                    "Invalid ordering field: {}",
                    other
                )))
            }
            None => query.order_by_asc(product::Column::Title),
        };

        let paginator = query.paginate(&*self.db, per_page.max(1));
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, id: Uuid) -> Result<ProductModel, ServiceError> {
        Product::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", id)))
    }

    #[instrument(skip(self, input))]
    pub async fn create_product(
        &self,
        input: CreateProductInput,
    ) -> Result<ProductModel, ServiceError> {
        input.validate()?;

        Collection::find_by_id(input.collection_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::ValidationError(NO_COLLECTION_MSG.to_string()))?;

        let model = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(input.title),
            slug: Set(input.slug),
            description: Set(input.description),
            unit_price: Set(input.unit_price),
            inventory: Set(input.inventory),
            last_update: Set(Utc::now()),
            collection_id: Set(input.collection_id),
        };
        let created = model.insert(&*self.db).await?;

        info!(product_id = %created.id, "product created");
        self.event_sender
            .send_or_log(Event::ProductCreated(created.id))
            .await;
        Ok(created)
    }

    /// Applies a partial update and refreshes `last_update`.
    #[instrument(skip(self, input))]
    pub async fn update_product(
        &self,
        id: Uuid,
        input: UpdateProductInput,
    ) -> Result<ProductModel, ServiceError> {
        input.validate()?;

        let existing = self.get_product(id).await?;
        let mut active: product::ActiveModel = existing.into();

        if let Some(title) = input.title {
            active.title = Set(title);
        }
        if let Some(slug) = input.slug {
            active.slug = Set(slug);
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description));
        }
        if let Some(unit_price) = input.unit_price {
            active.unit_price = Set(unit_price);
        }
        if let Some(inventory) = input.inventory {
            active.inventory = Set(inventory);
        }
        if let Some(collection_id) = input.collection_id {
            Collection::find_by_id(collection_id)
                .one(&*self.db)
                .await?
                .ok_or_else(|| ServiceError::ValidationError(NO_COLLECTION_MSG.to_string()))?;
            active.collection_id = Set(collection_id);
        }
        active.last_update = Set(Utc::now());

        let updated = active.update(&*self.db).await?;
        self.event_sender
            .send_or_log(Event::ProductUpdated(updated.id))
            .await;
        Ok(updated)
    }

    /// Deletes a product unless any order line references it.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: Uuid) -> Result<(), ServiceError> {
        self.get_product(id).await?;

        let referencing_order_items = OrderItem::find()
            .filter(crate::entities::order_item::Column::ProductId.eq(id))
            .count(&*self.db)
            .await?;
        if referencing_order_items > 0 {
            return Err(ServiceError::DeletionBlocked(
                "Product cannot be deleted because it is associated with an order item."
                    .to_string(),
            ));
        }

        // Cart lines pointing at the product go with it
        CartItem::delete_many()
            .filter(crate::entities::cart_item::Column::ProductId.eq(id))
            .exec(&*self.db)
            .await?;

        Product::delete_by_id(id).exec(&*self.db).await?;
        self.event_sender
            .send_or_log(Event::ProductDeleted(id))
            .await;
        Ok(())
    }

    // Promotions

    #[instrument(skip(self))]
    pub async fn list_promotions(&self) -> Result<Vec<PromotionModel>, ServiceError> {
        Ok(Promotion::find().all(&*self.db).await?)
    }

    #[instrument(skip(self, input))]
    pub async fn create_promotion(
        &self,
        input: CreatePromotionInput,
    ) -> Result<PromotionModel, ServiceError> {
        input.validate()?;

        let model = promotion::ActiveModel {
            id: Set(Uuid::new_v4()),
            description: Set(input.description),
            discount: Set(input.discount),
        };
        let created = model.insert(&*self.db).await?;
        self.event_sender
            .send_or_log(Event::PromotionCreated(created.id))
            .await;
        Ok(created)
    }

    /// Attaches an existing promotion to an existing product.
    #[instrument(skip(self))]
    pub async fn attach_promotion(
        &self,
        product_id: Uuid,
        promotion_id: Uuid,
    ) -> Result<(), ServiceError> {
        Product::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::ValidationError(NO_PRODUCT_MSG.to_string()))?;
        Promotion::find_by_id(promotion_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::ValidationError("No promotion with the given id was found".to_string())
            })?;

        let already = ProductPromotion::find_by_id((product_id, promotion_id))
            .one(&*self.db)
            .await?;
        if already.is_some() {
            return Err(ServiceError::Conflict(
                "Promotion is already attached to this product".to_string(),
            ));
        }

        let model = product_promotion::ActiveModel {
            product_id: Set(product_id),
            promotion_id: Set(promotion_id),
        };
        model.insert(&*self.db).await?;
        Ok(())
    }

    // Reviews

    #[instrument(skip(self))]
    pub async fn list_reviews(&self, product_id: Uuid) -> Result<Vec<ReviewModel>, ServiceError> {
        self.get_product(product_id).await?;
        Ok(Review::find()
            .filter(review::Column::ProductId.eq(product_id))
            .order_by_desc(review::Column::Date)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self, input))]
    pub async fn create_review(
        &self,
        product_id: Uuid,
        input: CreateReviewInput,
    ) -> Result<ReviewModel, ServiceError> {
        input.validate()?;

        Product::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::ValidationError(NO_PRODUCT_MSG.to_string()))?;

        let model = review::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(product_id),
            name: Set(input.name),
            description: Set(input.description),
            date: Set(Utc::now().date_naive()),
        };
        let created = model.insert(&*self.db).await?;
        self.event_sender
            .send_or_log(Event::ReviewCreated {
                product_id,
                review_id: created.id,
            })
            .await;
        Ok(created)
    }

    // Images

    #[instrument(skip(self))]
    pub async fn list_images(
        &self,
        product_id: Uuid,
    ) -> Result<Vec<ProductImageModel>, ServiceError> {
        self.get_product(product_id).await?;
        Ok(ProductImage::find()
            .filter(product_image::Column::ProductId.eq(product_id))
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self, input))]
    pub async fn add_image(
        &self,
        product_id: Uuid,
        input: AddImageInput,
    ) -> Result<ProductImageModel, ServiceError> {
        input.validate()?;

        Product::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::ValidationError(NO_PRODUCT_MSG.to_string()))?;

        let model = product_image::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(product_id),
            url: Set(input.url),
        };
        Ok(model.insert(&*self.db).await?)
    }
}
