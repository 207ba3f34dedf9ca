//! Gamification and certification core.
//!
//! Computes XP, levels, streaks, badges and challenge progress from completion
//! events, and runs the certification exams. Every call returns the ordered list
//! of [`GamificationEvent`]s the caller should present.

pub mod badges;
pub mod challenges;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod exam;
pub mod ledger;
pub mod levels;
pub mod progress;
pub mod streak;
pub mod summary;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{EngineConfig, ExamPolicy, XpRewards};
pub use engine::{GamificationEngine, QuizCompletion};
pub use error::{GamificationError, GamificationResult};
pub use events::GamificationEvent;
pub use exam::{ExamPreparation, ExamResult, ExamSubmission, Prerequisites};
pub use ledger::XpGrant;
pub use levels::{LevelInfo, level_progress};
pub use progress::QuizProgressOutcome;
