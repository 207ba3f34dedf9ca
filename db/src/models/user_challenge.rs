use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};

/// A user's progress on one challenge.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_challenges")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub challenge_id: i64,
    pub progress: i32,
    /// Set once and never cleared.
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
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
    #[sea_orm(
        belongs_to = "super::challenge::Entity",
        from = "Column::ChallengeId",
        to = "super::challenge::Column::Id"
    )]
    Challenge,
}

impl Related<super::challenge::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Challenge.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn find<C: ConnectionTrait>(
        db: &C,
        user_id: i64,
        challenge_id: i64,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::UserId.eq(user_id))
            .filter(Column::ChallengeId.eq(challenge_id))
            .one(db)
            .await
    }

    pub async fn for_user_and_challenges<C: ConnectionTrait>(
        db: &C,
        user_id: i64,
        challenge_ids: &[i64],
    ) -> Result<Vec<Model>, DbErr> {
        if challenge_ids.is_empty() {
            return Ok(Vec::new());
        }
        Entity::find()
            .filter(Column::UserId.eq(user_id))
            .filter(Column::ChallengeId.is_in(challenge_ids.iter().copied()))
            .all(db)
            .await
    }

    /// Writes the latest progress value, creating the row on first contact.
    ///
    /// `completed` is only ever raised; a row already completed keeps its
    /// original `completed_at`.
    pub async fn upsert_progress<C: ConnectionTrait>(
        db: &C,
        user_id: i64,
        challenge_id: i64,
        progress: i32,
        completed: bool,
        now: DateTime<Utc>,
    ) -> Result<Model, DbErr> {
        match Self::find(db, user_id, challenge_id).await? {
            Some(existing) => {
                let already = existing.completed;
                let mut active: ActiveModel = existing.into();
                active.progress = Set(progress);
                if completed && !already {
                    active.completed = Set(true);
                    active.completed_at = Set(Some(now));
                }
                active.updated_at = Set(now);
                active.update(db).await
            }
            None => {
                ActiveModel {
                    user_id: Set(user_id),
                    challenge_id: Set(challenge_id),
                    progress: Set(progress),
                    completed: Set(completed),
                    completed_at: Set(completed.then_some(now)),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .insert(db)
                .await
            }
        }
    }
}
