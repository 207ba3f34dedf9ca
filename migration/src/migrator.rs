use sea_orm_migration::prelude::*;

use crate::migrations;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(migrations::m202602010001_create_profiles::Migration),
            Box::new(migrations::m202602010002_create_technologies::Migration),
            Box::new(migrations::m202602010003_create_chapters::Migration),
            Box::new(migrations::m202602010004_create_quiz_questions::Migration),
            Box::new(migrations::m202602010005_create_user_progress::Migration),
            Box::new(migrations::m202602020001_create_xp_events::Migration),
            Box::new(migrations::m202602020002_create_user_streaks::Migration),
            Box::new(migrations::m202602020003_create_badges::Migration),
            Box::new(migrations::m202602020004_create_user_badges::Migration),
            Box::new(migrations::m202602020005_create_challenges::Migration),
            Box::new(migrations::m202602020006_create_user_challenges::Migration),
            Box::new(migrations::m202602030001_create_exam_attempts::Migration),
            Box::new(migrations::m202602030002_create_exam_attempt_questions::Migration),
            Box::new(migrations::m202602030003_create_certifications::Migration),
        ]
    }
}
