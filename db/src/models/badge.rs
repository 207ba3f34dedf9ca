use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// An entry of the badge catalogue.
///
/// `condition_type` is stored as free text so the catalogue can be edited
/// without a migration; the evaluator maps it onto a closed set of conditions
/// and treats anything it does not know as never satisfied.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "badges")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub slug: String,
    pub name: String,
    pub description: String,
    pub rarity: BadgeRarity,
    pub condition_type: String,
    pub condition_value: i32,
    /// XP granted on unlock; zero for cosmetic badges.
    pub xp_reward: i32,
    pub created_at: DateTime<Utc>,
}

/// Backed by the `badge_rarity_type` enum in the database.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Display, EnumString,
    Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "badge_rarity_type")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum BadgeRarity {
    #[sea_orm(string_value = "common")]
    Common,
    #[sea_orm(string_value = "rare")]
    Rare,
    #[sea_orm(string_value = "epic")]
    Epic,
    #[sea_orm(string_value = "legendary")]
    Legendary,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user_badge::Entity")]
    UserBadges,
}

impl Related<super::user_badge::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserBadges.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Catalogue data for a badge, as written by seeders and tests.
#[derive(Debug, Clone)]
pub struct NewBadge<'a> {
    pub slug: &'a str,
    pub name: &'a str,
    pub description: &'a str,
    pub rarity: BadgeRarity,
    pub condition_type: &'a str,
    pub condition_value: i32,
    pub xp_reward: i32,
}

impl Model {
    pub async fn create<C: ConnectionTrait>(db: &C, badge: NewBadge<'_>) -> Result<Model, DbErr> {
        ActiveModel {
            slug: Set(badge.slug.to_owned()),
            name: Set(badge.name.to_owned()),
            description: Set(badge.description.to_owned()),
            rarity: Set(badge.rarity),
            condition_type: Set(badge.condition_type.to_owned()),
            condition_value: Set(badge.condition_value),
            xp_reward: Set(badge.xp_reward),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    /// The whole catalogue in a stable order.
    pub async fn all<C: ConnectionTrait>(db: &C) -> Result<Vec<Model>, DbErr> {
        Entity::find().order_by_asc(Column::Id).all(db).await
    }

    pub async fn find_by_slug<C: ConnectionTrait>(
        db: &C,
        slug: &str,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find().filter(Column::Slug.eq(slug)).one(db).await
    }
}
