use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};

/// A multiple-choice question belonging to a chapter quiz.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "quiz_questions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub chapter_id: i64,
    /// Order of the question inside its quiz, unique per chapter.
    pub position: i32,
    pub question: String,
    /// JSON array of the answer options (four strings).
    pub options: Json,
    /// Zero-based index of the correct option.
    pub correct_index: i32,
    pub explanation: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::chapter::Entity",
        from = "Column::ChapterId",
        to = "super::chapter::Column::Id"
    )]
    Chapter,
}

impl Related<super::chapter::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Chapter.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        chapter_id: i64,
        position: i32,
        question: &str,
        options: &[String],
        correct_index: i32,
        explanation: &str,
    ) -> Result<Model, DbErr> {
        if correct_index < 0 || correct_index as usize >= options.len() {
            return Err(DbErr::Custom(format!(
                "correct_index {correct_index} is outside the {} options",
                options.len()
            )));
        }

        ActiveModel {
            chapter_id: Set(chapter_id),
            position: Set(position),
            question: Set(question.to_owned()),
            options: Set(serde_json::json!(options)),
            correct_index: Set(correct_index),
            explanation: Set(explanation.to_owned()),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    /// Questions of the given chapters, grouped by chapter then position.
    pub async fn for_chapters<C: ConnectionTrait>(
        db: &C,
        chapter_ids: &[i64],
    ) -> Result<Vec<Model>, DbErr> {
        if chapter_ids.is_empty() {
            return Ok(Vec::new());
        }
        Entity::find()
            .filter(Column::ChapterId.is_in(chapter_ids.iter().copied()))
            .order_by_asc(Column::ChapterId)
            .order_by_asc(Column::Position)
            .all(db)
            .await
    }

    /// Decodes the stored option list.
    pub fn option_list(&self) -> Result<Vec<String>, serde_json::Error> {
        serde_json::from_value(self.options.clone())
    }
}
