use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};

/// A time-boxed goal, active on every UTC date in `[start_date, end_date]`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "challenges")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub title: String,
    pub description: String,
    pub condition_type: String,
    pub condition_value: i32,
    pub xp_reward: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user_challenge::Entity")]
    UserChallenges,
}

impl Related<super::user_challenge::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserChallenges.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone)]
pub struct NewChallenge<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub condition_type: &'a str,
    pub condition_value: i32,
    pub xp_reward: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl Model {
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        challenge: NewChallenge<'_>,
    ) -> Result<Model, DbErr> {
        ActiveModel {
            title: Set(challenge.title.to_owned()),
            description: Set(challenge.description.to_owned()),
            condition_type: Set(challenge.condition_type.to_owned()),
            condition_value: Set(challenge.condition_value),
            xp_reward: Set(challenge.xp_reward),
            start_date: Set(challenge.start_date),
            end_date: Set(challenge.end_date),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    /// Challenges whose date range contains `today`.
    pub async fn active_on<C: ConnectionTrait>(
        db: &C,
        today: NaiveDate,
    ) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::StartDate.lte(today))
            .filter(Column::EndDate.gte(today))
            .order_by_asc(Column::EndDate)
            .order_by_asc(Column::Id)
            .all(db)
            .await
    }
}
