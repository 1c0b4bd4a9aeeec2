use crate::{
    entities::{
        tag, tagged_item, Collection, Customer, EntityKind, Product, Tag, TagModel, TaggedItem,
        TaggedItemModel,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateTagInput {
    #[validate(length(min = 1, max = 255))]
    pub label: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct TagEntityInput {
    pub tag_id: Uuid,
    pub entity_kind: EntityKind,
    pub entity_id: Uuid,
}

/// Generic tagging over a closed set of entity kinds.
///
/// Attaching a tag first checks that the target row exists in the table
/// the kind names, so a tag can never point at nothing.
#[derive(Clone)]
pub struct TagService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl TagService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, input))]
    pub async fn create_tag(&self, input: CreateTagInput) -> Result<TagModel, ServiceError> {
        input.validate()?;

        let model = tag::ActiveModel {
            id: Set(Uuid::new_v4()),
            label: Set(input.label),
        };
        let created = model.insert(&*self.db).await?;
        self.event_sender
            .send_or_log(Event::TagCreated(created.id))
            .await;
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn list_tags(&self) -> Result<Vec<TagModel>, ServiceError> {
        Ok(Tag::find()
            .order_by_asc(tag::Column::Label)
            .all(&*self.db)
            .await?)
    }

    async fn entity_exists(&self, kind: EntityKind, id: Uuid) -> Result<bool, ServiceError> {
        let found = match kind {
            EntityKind::Product => Product::find_by_id(id).one(&*self.db).await?.is_some(),
            EntityKind::Collection => Collection::find_by_id(id).one(&*self.db).await?.is_some(),
            EntityKind::Customer => Customer::find_by_id(id).one(&*self.db).await?.is_some(),
        };
        Ok(found)
    }

    /// Attaches a tag to an entity after checking both sides exist.
    #[instrument(skip(self, input))]
    pub async fn tag_entity(&self, input: TagEntityInput) -> Result<TaggedItemModel, ServiceError> {
        Tag::find_by_id(input.tag_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::ValidationError("No tag with the given id was found".to_string())
            })?;

        if !self.entity_exists(input.entity_kind, input.entity_id).await? {
            return Err(ServiceError::ValidationError(format!(
                "No {:?} with the given id was found",
                input.entity_kind
            )));
        }

        let model = tagged_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            tag_id: Set(input.tag_id),
            entity_kind: Set(input.entity_kind),
            entity_id: Set(input.entity_id),
        };
        let created = model.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::EntityTagged {
                tag_id: created.tag_id,
                entity_id: created.entity_id,
            })
            .await;
        Ok(created)
    }

    /// All tags attached to one entity
    #[instrument(skip(self))]
    pub async fn tags_for(
        &self,
        kind: EntityKind,
        entity_id: Uuid,
    ) -> Result<Vec<TagModel>, ServiceError> {
        let tag_ids: Vec<Uuid> = TaggedItem::find()
            .filter(tagged_item::Column::EntityKind.eq(kind))
            .filter(tagged_item::Column::EntityId.eq(entity_id))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|t| t.tag_id)
            .collect();

        if tag_ids.is_empty() {
            return Ok(Vec::new());
        }

        Ok(Tag::find()
            .filter(tag::Column::Id.is_in(tag_ids))
            .order_by_asc(tag::Column::Label)
            .all(&*self.db)
            .await?)
    }
}
