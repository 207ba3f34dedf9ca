use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// One certification exam sitting.
///
/// Created `in_progress` when the questions are handed out and moved exactly
/// once to `graded` or `expired` on submission.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "exam_attempts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub technology_id: i64,
    pub score: i32,
    /// Number of questions handed out.
    pub total: i32,
    pub passed: bool,
    pub status: ExamStatus,
    /// Start of the countdown.
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Backed by the `exam_status_type` enum in the database.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Display, EnumString,
    Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "exam_status_type")]
#[strum(serialize_all = "snake_case")]
pub enum ExamStatus {
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    #[sea_orm(string_value = "graded")]
    Graded,
    #[sea_orm(string_value = "expired")]
    Expired,
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
        belongs_to = "super::technology::Entity",
        from = "Column::TechnologyId",
        to = "super::technology::Column::Id"
    )]
    Technology,
    #[sea_orm(has_many = "super::exam_attempt_question::Entity")]
    Questions,
}

impl Related<super::exam_attempt_question::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Questions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Opens a new attempt with a zero score.
    pub async fn start<C: ConnectionTrait>(
        db: &C,
        user_id: i64,
        technology_id: i64,
        total: i32,
        now: DateTime<Utc>,
    ) -> Result<Model, DbErr> {
        ActiveModel {
            user_id: Set(user_id),
            technology_id: Set(technology_id),
            score: Set(0),
            total: Set(total),
            passed: Set(false),
            status: Set(ExamStatus::InProgress),
            started_at: Set(now),
            completed_at: Set(None),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    /// Looks up an attempt owned by `user_id`.
    pub async fn find_for_user<C: ConnectionTrait>(
        db: &C,
        id: i64,
        user_id: i64,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find_by_id(id)
            .filter(Column::UserId.eq(user_id))
            .one(db)
            .await
    }

    /// Attempts on a technology started at or after `since`, whatever their status.
    pub async fn count_started_since<C: ConnectionTrait>(
        db: &C,
        user_id: i64,
        technology_id: i64,
        since: DateTime<Utc>,
    ) -> Result<u64, DbErr> {
        Entity::find()
            .filter(Column::UserId.eq(user_id))
            .filter(Column::TechnologyId.eq(technology_id))
            .filter(Column::StartedAt.gte(since))
            .count(db)
            .await
    }

    /// Moves an attempt out of `in_progress`.
    ///
    /// The update is conditional on the current status, so of two concurrent
    /// submissions only one sees `true`.
    pub async fn close<C: ConnectionTrait>(
        db: &C,
        id: i64,
        status: ExamStatus,
        score: i32,
        passed: bool,
        now: DateTime<Utc>,
    ) -> Result<bool, DbErr> {
        let result = Entity::update_many()
            .col_expr(Column::Status, Expr::value(status))
            .col_expr(Column::Score, Expr::value(score))
            .col_expr(Column::Passed, Expr::value(passed))
            .col_expr(Column::CompletedAt, Expr::value(Some(now)))
            .filter(Column::Id.eq(id))
            .filter(Column::Status.eq(ExamStatus::InProgress))
            .exec(db)
            .await?;
        Ok(result.rows_affected == 1)
    }
}
