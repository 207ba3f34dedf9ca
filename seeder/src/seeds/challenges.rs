use crate::seed::Seeder;
use chrono::{Datelike, Duration, Utc};
use db::models::challenge::{Model, NewChallenge};
use sea_orm::{DatabaseConnection, DbErr};

pub struct ChallengeSeeder;

#[async_trait::async_trait]
impl Seeder for ChallengeSeeder {
    async fn seed(&self, db: &DatabaseConnection) -> Result<(), DbErr> {
        let today = Utc::now().date_naive();
        let monday = today - Duration::days(today.weekday().num_days_from_monday() as i64);
        let sunday = monday + Duration::days(6);

        if !Model::active_on(db, today).await?.is_empty() {
            return Ok(());
        }

        Model::create(
            db,
            NewChallenge {
                title: "3 cours cette semaine",
                description: "Compléter 3 cours avant dimanche",
                condition_type: "courses_completed",
                condition_value: 3,
                xp_reward: 100,
                start_date: monday,
                end_date: sunday,
            },
        )
        .await?;
        Model::create(
            db,
            NewChallenge {
                title: "500 XP",
                description: "Gagner 500 XP cette semaine",
                condition_type: "xp_earned",
                condition_value: 500,
                xp_reward: 150,
                start_date: monday,
                end_date: sunday,
            },
        )
        .await?;
        Ok(())
    }
}
