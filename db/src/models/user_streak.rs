use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DbErr, EntityTrait, Set};
use serde::{Deserialize, Serialize};

/// Daily activity streak of one user. At most one row per user.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_streaks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i64,
    pub current_streak: i32,
    /// Never lower than `current_streak`.
    pub longest_streak: i32,
    /// UTC date of the last counted activity; `None` before the first one.
    pub last_activity_date: Option<NaiveDate>,
    /// Freezes available to bridge a single missed day.
    pub freeze_count: i32,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::profile::Entity",
        from = "Column::UserId",
        to = "super::profile::Column::Id"
    )]
    Profile,
}

impl Related<super::profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Profile.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn find<C: ConnectionTrait>(db: &C, user_id: i64) -> Result<Option<Model>, DbErr> {
        Entity::find_by_id(user_id).one(db).await
    }

    /// Inserts the row for a user's first streak state.
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        user_id: i64,
        current_streak: i32,
        last_activity_date: Option<NaiveDate>,
        freeze_count: i32,
        now: DateTime<Utc>,
    ) -> Result<Model, DbErr> {
        ActiveModel {
            user_id: Set(user_id),
            current_streak: Set(current_streak),
            longest_streak: Set(current_streak),
            last_activity_date: Set(last_activity_date),
            freeze_count: Set(freeze_count),
            updated_at: Set(now),
        }
        .insert(db)
        .await
    }

    /// Overwrites the mutable streak fields of an existing row.
    pub async fn save_state<C: ConnectionTrait>(
        db: &C,
        user_id: i64,
        current_streak: i32,
        longest_streak: i32,
        last_activity_date: Option<NaiveDate>,
        freeze_count: i32,
        now: DateTime<Utc>,
    ) -> Result<Model, DbErr> {
        ActiveModel {
            user_id: Set(user_id),
            current_streak: Set(current_streak),
            longest_streak: Set(longest_streak),
            last_activity_date: Set(last_activity_date),
            freeze_count: Set(freeze_count),
            updated_at: Set(now),
        }
        .update(db)
        .await
    }
}
