use db::models::user_progress::{self, QuizAttempt};
use serde::Serialize;
use validator::Validate;

use crate::engine::{GamificationEngine, QuizCompletion};
use crate::error::GamificationResult;
use crate::events::{GamificationEvent, total_xp};

/// Result of recording a chapter quiz.
#[derive(Debug, Clone, Serialize)]
pub struct QuizProgressOutcome {
    /// Whether this run reached the chapter pass mark.
    pub passed: bool,
    /// XP from every `Xp` event the run produced, bonuses included.
    pub xp_gained: i64,
    pub best_score: i32,
    pub events: Vec<GamificationEvent>,
}

/// Whether `score / total` reaches `pass_percent`, without rounding.
pub fn reaches_percent(score: i32, total: i32, pass_percent: i32) -> bool {
    total > 0 && score as i64 * 100 >= pass_percent as i64 * total as i64
}

impl GamificationEngine {
    /// Records a graded quiz on the chapter's progress row, then runs the quiz
    /// pipeline and credits the XP it produced to that row.
    ///
    /// # Errors
    /// `InvalidInput` for a malformed score/total pair, `ChapterNotFound` for
    /// an unknown chapter.
    pub async fn save_quiz_progress(
        &self,
        quiz: &QuizCompletion,
    ) -> GamificationResult<QuizProgressOutcome> {
        quiz.validate()?;
        self.ensure_chapter(quiz.chapter_id).await?;

        let passed = reaches_percent(
            quiz.score,
            quiz.total_questions,
            self.config().chapter_pass_percent,
        );
        let attempt = QuizAttempt {
            score: quiz.score,
            total: quiz.total_questions,
            passed,
            elapsed_seconds: quiz.elapsed_seconds,
        };
        let row = user_progress::Model::record_quiz_attempt(
            self.db(),
            quiz.user_id,
            quiz.chapter_id,
            attempt,
            self.now(),
        )
        .await?;
        self.trace("progress_saved", quiz.user_id);

        let events = self.on_quiz_complete(quiz).await?;
        let xp_gained = total_xp(&events);
        if xp_gained > 0 {
            user_progress::Model::add_xp_earned(self.db(), row.id, xp_gained).await?;
        }

        Ok(QuizProgressOutcome {
            passed,
            xp_gained,
            best_score: row.best_score.unwrap_or(quiz.score),
            events,
        })
    }
}
