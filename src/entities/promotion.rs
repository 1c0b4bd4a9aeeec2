use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Promotion entity: a discount that can apply to many products
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "promotions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub description: String,
    /// Discount as a fraction, e.g. 0.15 for 15% off
    pub discount: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::product_promotion::Entity")]
    ProductPromotion,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        super::product_promotion::Relation::Product.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::product_promotion::Relation::Promotion.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
