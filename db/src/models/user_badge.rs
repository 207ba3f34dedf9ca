use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};

/// A badge unlocked by a user. Each (user, badge) pair exists at most once.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_badges")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub badge_id: i64,
    pub unlocked_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::profile::Entity",
        from = "Column::UserId",
        to = "super::profile::Column::Id"
    )]
    Profile,
    #[sea_orm(
        belongs_to = "super::badge::Entity",
        from = "Column::BadgeId",
        to = "super::badge::Column::Id"
    )]
    Badge,
}

impl Related<super::profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Profile.def()
    }
}

impl Related<super::badge::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Badge.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        user_id: i64,
        badge_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Model, DbErr> {
        ActiveModel {
            user_id: Set(user_id),
            badge_id: Set(badge_id),
            unlocked_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    pub async fn exists<C: ConnectionTrait>(
        db: &C,
        user_id: i64,
        badge_id: i64,
    ) -> Result<bool, DbErr> {
        let count = Entity::find()
            .filter(Column::UserId.eq(user_id))
            .filter(Column::BadgeId.eq(badge_id))
            .count(db)
            .await?;
        Ok(count > 0)
    }

    /// IDs of every badge the user has unlocked.
    pub async fn unlocked_ids<C: ConnectionTrait>(db: &C, user_id: i64) -> Result<Vec<i64>, DbErr> {
        Ok(Entity::find()
            .filter(Column::UserId.eq(user_id))
            .all(db)
            .await?
            .into_iter()
            .map(|row| row.badge_id)
            .collect())
    }

    pub async fn count_for_user<C: ConnectionTrait>(db: &C, user_id: i64) -> Result<u64, DbErr> {
        Entity::find()
            .filter(Column::UserId.eq(user_id))
            .count(db)
            .await
    }

    /// Unlocks of a user joined with their catalogue entry, most recent first.
    pub async fn with_badges_for_user<C: ConnectionTrait>(
        db: &C,
        user_id: i64,
    ) -> Result<Vec<(Model, super::badge::Model)>, DbErr> {
        let rows = Entity::find()
            .filter(Column::UserId.eq(user_id))
            .order_by_desc(Column::UnlockedAt)
            .order_by_desc(Column::Id)
            .find_also_related(super::badge::Entity)
            .all(db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(unlock, badge)| badge.map(|b| (unlock, b)))
            .collect())
    }
}
