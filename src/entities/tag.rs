use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tag entity
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tags")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub label: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::tagged_item::Entity")]
    TaggedItem,
}

impl Related<super::tagged_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TaggedItem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
