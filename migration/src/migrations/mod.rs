pub mod m202602010001_create_profiles;
pub mod m202602010002_create_technologies;
pub mod m202602010003_create_chapters;
pub mod m202602010004_create_quiz_questions;
pub mod m202602010005_create_user_progress;
pub mod m202602020001_create_xp_events;
pub mod m202602020002_create_user_streaks;
pub mod m202602020003_create_badges;
pub mod m202602020004_create_user_badges;
pub mod m202602020005_create_challenges;
pub mod m202602020006_create_user_challenges;
pub mod m202602030001_create_exam_attempts;
pub mod m202602030002_create_exam_attempt_questions;
pub mod m202602030003_create_certifications;
