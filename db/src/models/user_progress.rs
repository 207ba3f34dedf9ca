use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};

/// Question count assumed for rows written before `max_score` was tracked.
pub const DEFAULT_QUIZ_LENGTH: i32 = 5;

/// A user's progress through one chapter and its quiz.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_progress")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub chapter_id: i64,
    /// Latches to `true` the first time a quiz attempt passes.
    pub completed: bool,
    /// Score of the latest quiz attempt.
    pub score: Option<i32>,
    /// Best quiz score so far; `None` until the quiz has been taken.
    pub best_score: Option<i32>,
    /// Number of questions in the quiz when it was last taken.
    pub max_score: Option<i32>,
    pub attempts: i32,
    /// XP credited to this chapter by the gamification pipeline.
    pub xp_earned: i64,
    /// Fastest time, in seconds, of a perfect run.
    pub fastest_perfect_seconds: Option<i32>,
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

/// One graded quiz run, as recorded against a chapter.
#[derive(Debug, Clone, Copy)]
pub struct QuizAttempt {
    pub score: i32,
    pub total: i32,
    pub passed: bool,
    pub elapsed_seconds: Option<i32>,
}

impl Model {
    /// Whether the best score equals the maximum possible score.
    pub fn is_perfect(&self) -> bool {
        match self.best_score {
            Some(best) => best == self.max_score.unwrap_or(DEFAULT_QUIZ_LENGTH),
            None => false,
        }
    }

    pub async fn find<C: ConnectionTrait>(
        db: &C,
        user_id: i64,
        chapter_id: i64,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::UserId.eq(user_id))
            .filter(Column::ChapterId.eq(chapter_id))
            .one(db)
            .await
    }

    /// Every progress row of a user.
    pub async fn for_user<C: ConnectionTrait>(db: &C, user_id: i64) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::UserId.eq(user_id))
            .all(db)
            .await
    }

    /// Progress rows of a user restricted to the given chapters.
    pub async fn for_user_and_chapters<C: ConnectionTrait>(
        db: &C,
        user_id: i64,
        chapter_ids: &[i64],
    ) -> Result<Vec<Model>, DbErr> {
        if chapter_ids.is_empty() {
            return Ok(Vec::new());
        }
        Entity::find()
            .filter(Column::UserId.eq(user_id))
            .filter(Column::ChapterId.is_in(chapter_ids.iter().copied()))
            .all(db)
            .await
    }

    /// Upserts the chapter row for a graded quiz run.
    ///
    /// `completed` only ever moves from false to true, `best_score` keeps the
    /// maximum and `fastest_perfect_seconds` keeps the minimum over perfect runs.
    pub async fn record_quiz_attempt<C: ConnectionTrait>(
        db: &C,
        user_id: i64,
        chapter_id: i64,
        attempt: QuizAttempt,
        now: DateTime<Utc>,
    ) -> Result<Model, DbErr> {
        let perfect_time = match attempt.elapsed_seconds {
            Some(secs) if attempt.score == attempt.total => Some(secs.max(0)),
            _ => None,
        };

        match Self::find(db, user_id, chapter_id).await? {
            Some(existing) => {
                let fastest = match (existing.fastest_perfect_seconds, perfect_time) {
                    (Some(a), Some(b)) => Some(a.min(b)),
                    (a, b) => a.or(b),
                };
                let completed_at = if attempt.passed {
                    Some(now)
                } else {
                    existing.completed_at
                };

                let mut active: ActiveModel = existing.clone().into();
                active.completed = Set(existing.completed || attempt.passed);
                active.score = Set(Some(attempt.score));
                active.best_score = Set(Some(existing.best_score.unwrap_or(0).max(attempt.score)));
                active.max_score = Set(Some(attempt.total));
                active.attempts = Set(existing.attempts + 1);
                active.fastest_perfect_seconds = Set(fastest);
                active.completed_at = Set(completed_at);
                active.updated_at = Set(now);
                active.update(db).await
            }
            None => {
                ActiveModel {
                    user_id: Set(user_id),
                    chapter_id: Set(chapter_id),
                    completed: Set(attempt.passed),
                    score: Set(Some(attempt.score)),
                    best_score: Set(Some(attempt.score)),
                    max_score: Set(Some(attempt.total)),
                    attempts: Set(1),
                    xp_earned: Set(0),
                    fastest_perfect_seconds: Set(perfect_time),
                    completed_at: Set(attempt.passed.then_some(now)),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .insert(db)
                .await
            }
        }
    }

    /// Adds `amount` to the XP credited to this row.
    pub async fn add_xp_earned<C: ConnectionTrait>(
        db: &C,
        id: i64,
        amount: i64,
    ) -> Result<Model, DbErr> {
        let row = Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or(DbErr::RecordNotFound("User progress not found".to_string()))?;
        let mut active: ActiveModel = row.clone().into();
        active.xp_earned = Set(row.xp_earned + amount);
        active.update(db).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{chapter, profile, technology};
    use crate::test_utils::setup_test_db;

    async fn fixture(db: &DatabaseConnection) -> (i64, i64) {
        let user = profile::Model::create(db, "learner", None, Utc::now()).await.unwrap();
        let tech = technology::Model::create(db, "go", "Go", 1).await.unwrap();
        let ch = chapter::Model::create(db, tech.id, "Goroutines", 1).await.unwrap();
        (user.id, ch.id)
    }

    fn run(score: i32, passed: bool, secs: Option<i32>) -> QuizAttempt {
        QuizAttempt { score, total: 5, passed, elapsed_seconds: secs }
    }

    #[tokio::test]
    async fn test_completed_latches_and_best_score_keeps_max() {
        let db = setup_test_db().await;
        let (user, ch) = fixture(&db).await;

        let first = Model::record_quiz_attempt(&db, user, ch, run(4, true, None), Utc::now())
            .await
            .unwrap();
        assert!(first.completed);
        assert_eq!(first.attempts, 1);

        let second = Model::record_quiz_attempt(&db, user, ch, run(1, false, None), Utc::now())
            .await
            .unwrap();
        assert!(second.completed);
        assert_eq!(second.best_score, Some(4));
        assert_eq!(second.score, Some(1));
        assert_eq!(second.attempts, 2);
        assert!(!second.is_perfect());
    }

    #[tokio::test]
    async fn test_fastest_perfect_keeps_minimum() {
        let db = setup_test_db().await;
        let (user, ch) = fixture(&db).await;

        Model::record_quiz_attempt(&db, user, ch, run(5, true, Some(90)), Utc::now())
            .await
            .unwrap();
        Model::record_quiz_attempt(&db, user, ch, run(4, true, Some(10)), Utc::now())
            .await
            .unwrap();
        let row = Model::record_quiz_attempt(&db, user, ch, run(5, true, Some(45)), Utc::now())
            .await
            .unwrap();

        assert_eq!(row.fastest_perfect_seconds, Some(45));
        assert!(row.is_perfect());
    }

    #[tokio::test]
    async fn test_add_xp_earned_accumulates() {
        let db = setup_test_db().await;
        let (user, ch) = fixture(&db).await;
        let row = Model::record_quiz_attempt(&db, user, ch, run(3, true, None), Utc::now())
            .await
            .unwrap();

        Model::add_xp_earned(&db, row.id, 90).await.unwrap();
        let row = Model::add_xp_earned(&db, row.id, 10).await.unwrap();
        assert_eq!(row.xp_earned, 100);
    }
}
