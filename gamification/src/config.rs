use chrono::Duration;

/// XP amounts granted by the pipelines.
#[derive(Debug, Clone)]
pub struct XpRewards {
    pub course_complete: i64,
    pub quiz_complete: i64,
    pub quiz_per_correct: i64,
    pub quiz_perfect_bonus: i64,
    pub streak_7: i64,
    pub streak_30: i64,
    pub streak_100: i64,
}

impl Default for XpRewards {
    fn default() -> Self {
        Self {
            course_complete: 50,
            quiz_complete: 30,
            quiz_per_correct: 20,
            quiz_perfect_bonus: 100,
            streak_7: 50,
            streak_30: 200,
            streak_100: 500,
        }
    }
}

/// Rules of the certification exam.
#[derive(Debug, Clone)]
pub struct ExamPolicy {
    /// Questions per attempt.
    pub question_count: usize,
    pub duration: Duration,
    /// Extra time tolerated after `duration` before a submission is refused.
    pub grace: Duration,
    /// Attempts allowed per technology over the trailing `attempt_window`.
    pub max_attempts: u64,
    pub attempt_window: Duration,
    /// Minimum rounded percentage to pass.
    pub pass_percent: i32,
    /// Minimum rounded average of chapter best scores, as a percentage.
    pub required_average: i32,
    pub certification_bonus: i64,
    /// Rounded percentage from which the top mention is awarded.
    pub exceptional_percent: i32,
    /// Rounded percentage from which the middle mention is awarded.
    pub very_good_percent: i32,
}

impl Default for ExamPolicy {
    fn default() -> Self {
        Self {
            question_count: 15,
            duration: Duration::minutes(20),
            grace: Duration::seconds(30),
            max_attempts: 3,
            attempt_window: Duration::days(7),
            pass_percent: 70,
            required_average: 80,
            certification_bonus: 300,
            exceptional_percent: 95,
            very_good_percent: 85,
        }
    }
}

/// Configuration for the gamification engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Whether to log each pipeline step at debug level.
    pub debug_logging: bool,
    /// Seed for question selection and certificate numbers; entropy when `None`.
    pub rng_seed: Option<u64>,
    pub rewards: XpRewards,
    pub exam: ExamPolicy,
    /// Minimum quiz percentage that marks a chapter completed.
    pub chapter_pass_percent: i32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debug_logging: false,
            rng_seed: None,
            rewards: XpRewards::default(),
            exam: ExamPolicy::default(),
            chapter_pass_percent: 60,
        }
    }
}
