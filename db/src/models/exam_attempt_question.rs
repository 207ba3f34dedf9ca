use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};

/// Server-side snapshot of a question handed out in an exam attempt.
///
/// The snapshot keeps the answer key so grading does not depend on the live
/// question bank, which may be edited while the attempt is running.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "exam_attempt_questions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub attempt_id: i64,
    /// Zero-based slot in the order shown to the candidate.
    pub position: i32,
    pub chapter_id: i64,
    pub chapter_title: String,
    pub question: String,
    pub options: Json,
    pub correct_index: i32,
    pub explanation: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::exam_attempt::Entity",
        from = "Column::AttemptId",
        to = "super::exam_attempt::Column::Id"
    )]
    Attempt,
}

impl Related<super::exam_attempt::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attempt.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// A question to snapshot into an attempt.
#[derive(Debug, Clone)]
pub struct NewAttemptQuestion {
    pub chapter_id: i64,
    pub chapter_title: String,
    pub question: String,
    pub options: Json,
    pub correct_index: i32,
    pub explanation: String,
}

impl Model {
    /// Stores the selected questions in order, positions starting at zero.
    pub async fn store_all<C: ConnectionTrait>(
        db: &C,
        attempt_id: i64,
        questions: Vec<NewAttemptQuestion>,
    ) -> Result<(), DbErr> {
        if questions.is_empty() {
            return Ok(());
        }
        let rows = questions
            .into_iter()
            .enumerate()
            .map(|(position, q)| ActiveModel {
                attempt_id: Set(attempt_id),
                position: Set(position as i32),
                chapter_id: Set(q.chapter_id),
                chapter_title: Set(q.chapter_title),
                question: Set(q.question),
                options: Set(q.options),
                correct_index: Set(q.correct_index),
                explanation: Set(q.explanation),
                ..Default::default()
            });
        Entity::insert_many(rows).exec(db).await?;
        Ok(())
    }

    /// The snapshot of an attempt in presentation order.
    pub async fn for_attempt<C: ConnectionTrait>(
        db: &C,
        attempt_id: i64,
    ) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::AttemptId.eq(attempt_id))
            .order_by_asc(Column::Position)
            .all(db)
            .await
    }

    pub fn option_list(&self) -> Result<Vec<String>, serde_json::Error> {
        serde_json::from_value(self.options.clone())
    }
}
