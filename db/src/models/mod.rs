pub mod badge;
pub mod certification;
pub mod challenge;
pub mod chapter;
pub mod exam_attempt;
pub mod exam_attempt_question;
pub mod profile;
pub mod quiz_question;
pub mod technology;
pub mod user_badge;
pub mod user_challenge;
pub mod user_progress;
pub mod user_streak;
pub mod xp_event;

pub use badge::Entity as Badge;
pub use certification::Entity as Certification;
pub use challenge::Entity as Challenge;
pub use chapter::Entity as Chapter;
pub use exam_attempt::Entity as ExamAttempt;
pub use exam_attempt_question::Entity as ExamAttemptQuestion;
pub use profile::Entity as Profile;
pub use quiz_question::Entity as QuizQuestion;
pub use technology::Entity as Technology;
pub use user_badge::Entity as UserBadge;
pub use user_challenge::Entity as UserChallenge;
pub use user_progress::Entity as UserProgress;
pub use user_streak::Entity as UserStreak;
pub use xp_event::Entity as XpEvent;
