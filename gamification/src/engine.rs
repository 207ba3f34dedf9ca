//! Gamification orchestrator.
//!
//! Completion handlers run the same pipeline: XP grant (scaled by the streak
//! multiplier), streak update, badge evaluation, then challenge progress.
//! The returned events keep that order.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDate, Utc};
use db::models::{chapter, xp_event::XpSource};
use rand::SeedableRng;
use rand::rngs::StdRng;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use validator::{Validate, ValidationError};

use crate::badges;
use crate::challenges;
use crate::clock::{Clock, SystemClock};
use crate::config::{EngineConfig, XpRewards};
use crate::error::{GamificationError, GamificationResult};
use crate::events::GamificationEvent;
use crate::ledger::{self, XpGrant};
use crate::streak;

/// A graded chapter quiz.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_score_pair"))]
pub struct QuizCompletion {
    pub user_id: i64,
    pub chapter_id: i64,
    #[validate(range(min = 0, message = "Score cannot be negative"))]
    pub score: i32,
    #[validate(range(min = 1, message = "A quiz has at least one question"))]
    pub total_questions: i32,
    /// Time spent on the quiz, used for speed records.
    #[validate(range(min = 0, message = "Elapsed time cannot be negative"))]
    pub elapsed_seconds: Option<i32>,
}

fn validate_score_pair(quiz: &QuizCompletion) -> Result<(), ValidationError> {
    if quiz.score > quiz.total_questions {
        return Err(ValidationError::new("Score cannot exceed the number of questions"));
    }
    Ok(())
}

impl QuizCompletion {
    pub fn new(user_id: i64, chapter_id: i64, score: i32, total_questions: i32) -> Self {
        Self {
            user_id,
            chapter_id,
            score,
            total_questions,
            elapsed_seconds: None,
        }
    }

    pub fn with_elapsed_seconds(mut self, seconds: i32) -> Self {
        self.elapsed_seconds = Some(seconds);
        self
    }

    pub fn is_perfect(&self) -> bool {
        self.score == self.total_questions
    }
}

/// Base XP of a quiz before the streak multiplier.
pub fn quiz_base_xp(score: i32, total_questions: i32, rewards: &XpRewards) -> i64 {
    let mut xp = rewards.quiz_complete + score as i64 * rewards.quiz_per_correct;
    if score == total_questions {
        xp += rewards.quiz_perfect_bonus;
    }
    xp
}

/// Scales XP by a multiplier, rounding half away from zero.
pub fn apply_multiplier(base: i64, multiplier: f64) -> i64 {
    (base as f64 * multiplier).round() as i64
}

/// Entry point of the gamification core.
///
/// Owns the store connection, the tunables, the clock and the random source
/// used for exam question selection and certificate numbers.
pub struct GamificationEngine {
    db: DatabaseConnection,
    config: EngineConfig,
    clock: Arc<dyn Clock>,
    rng: Mutex<StdRng>,
}

impl GamificationEngine {
    /// Creates an engine on the wall clock.
    pub fn new(db: DatabaseConnection, config: EngineConfig) -> Self {
        Self::with_clock(db, config, Arc::new(SystemClock))
    }

    /// Creates an engine with default configuration.
    pub fn new_default(db: DatabaseConnection) -> Self {
        Self::new(db, EngineConfig::default())
    }

    pub fn with_clock(db: DatabaseConnection, config: EngineConfig, clock: Arc<dyn Clock>) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            db,
            config,
            clock,
            rng: Mutex::new(rng),
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Runs `f` with exclusive access to the engine's random source.
    pub(crate) fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut guard = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }

    pub(crate) fn trace(&self, step: &str, user_id: i64) {
        if self.config.debug_logging {
            debug!(user_id, step, "gamification pipeline");
        }
    }

    /// Credits XP through the ledger.
    pub async fn grant_xp(&self, grant: &XpGrant) -> GamificationResult<Vec<GamificationEvent>> {
        ledger::grant_xp(&self.db, grant, self.now()).await
    }

    /// Records today's activity on the user's streak.
    pub async fn update_streak(&self, user_id: i64) -> GamificationResult<Vec<GamificationEvent>> {
        streak::update_streak(&self.db, user_id, self.today(), self.now(), &self.config.rewards)
            .await
    }

    /// Unlocks any badge whose condition now holds.
    pub async fn check_badges(&self, user_id: i64) -> GamificationResult<Vec<GamificationEvent>> {
        badges::check_badges(&self.db, user_id, self.today(), self.now()).await
    }

    /// Refreshes progress on the challenges active today.
    pub async fn update_challenges(
        &self,
        user_id: i64,
    ) -> GamificationResult<Vec<GamificationEvent>> {
        challenges::update_challenges(&self.db, user_id, self.today(), self.now()).await
    }

    /// Credits streak freezes to a user.
    pub async fn add_freezes(
        &self,
        user_id: i64,
        count: i32,
    ) -> GamificationResult<db::models::user_streak::Model> {
        streak::add_freezes(&self.db, user_id, count, self.now()).await
    }

    /// Rebuilds a profile's cached XP, level and title from the ledger.
    pub async fn reconcile_profile(
        &self,
        user_id: i64,
    ) -> GamificationResult<db::models::profile::Model> {
        ledger::reconcile_profile(&self.db, user_id, self.now()).await
    }

    /// Current XP multiplier from the user's streak.
    pub async fn xp_multiplier(&self, user_id: i64) -> GamificationResult<f64> {
        streak::current_multiplier(&self.db, user_id).await
    }

    /// Pipeline for a finished course chapter.
    pub async fn on_course_complete(
        &self,
        user_id: i64,
        chapter_id: i64,
    ) -> GamificationResult<Vec<GamificationEvent>> {
        self.ensure_chapter(chapter_id).await?;

        let multiplier = self.xp_multiplier(user_id).await?;
        let xp = apply_multiplier(self.config.rewards.course_complete, multiplier);
        self.trace("course_xp", user_id);

        let grant = XpGrant::new(user_id, xp, XpSource::Course).with_ref(chapter_id.to_string());
        self.run_pipeline(user_id, &grant).await
    }

    /// Pipeline for a graded chapter quiz.
    ///
    /// # Errors
    /// `InvalidInput` when the score/total pair is malformed.
    pub async fn on_quiz_complete(
        &self,
        quiz: &QuizCompletion,
    ) -> GamificationResult<Vec<GamificationEvent>> {
        quiz.validate()?;
        self.ensure_chapter(quiz.chapter_id).await?;

        let multiplier = self.xp_multiplier(quiz.user_id).await?;
        let base = quiz_base_xp(quiz.score, quiz.total_questions, &self.config.rewards);
        let xp = apply_multiplier(base, multiplier);
        self.trace("quiz_xp", quiz.user_id);

        let grant =
            XpGrant::new(quiz.user_id, xp, XpSource::Quiz).with_ref(quiz.chapter_id.to_string());
        self.run_pipeline(quiz.user_id, &grant).await
    }

    /// Grant, then the post-activity steps.
    async fn run_pipeline(
        &self,
        user_id: i64,
        grant: &XpGrant,
    ) -> GamificationResult<Vec<GamificationEvent>> {
        let mut events = self.grant_xp(grant).await.inspect_err(|e| {
            error!(user_id, error = %e, "XP grant failed");
        })?;
        events.extend(self.after_activity(user_id).await?);
        Ok(events)
    }

    /// Streak, badges and challenges, in that order.
    pub(crate) async fn after_activity(
        &self,
        user_id: i64,
    ) -> GamificationResult<Vec<GamificationEvent>> {
        self.trace("streak", user_id);
        let mut events = self.update_streak(user_id).await?;
        self.trace("badges", user_id);
        events.extend(self.check_badges(user_id).await?);
        self.trace("challenges", user_id);
        events.extend(self.update_challenges(user_id).await?);
        Ok(events)
    }

    pub(crate) async fn ensure_chapter(&self, chapter_id: i64) -> GamificationResult<chapter::Model> {
        chapter::Model::find_by_id(&self.db, chapter_id)
            .await?
            .ok_or(GamificationError::ChapterNotFound(chapter_id))
    }
}
