use crate::seed::Seeder;
use chrono::{Duration, Utc};
use db::models::profile::Model;
use fake::{Fake, faker::internet::en::Username};
use sea_orm::{DatabaseConnection, DbErr};

pub struct ProfileSeeder;

#[async_trait::async_trait]
impl Seeder for ProfileSeeder {
    async fn seed(&self, db: &DatabaseConnection) -> Result<(), DbErr> {
        let now = Utc::now();

        // Fixed demo account
        let demo = match Model::find_by_username(db, "demo").await? {
            Some(existing) => existing,
            None => Model::create(db, "demo", None, now - Duration::days(30)).await?,
        };

        // Random learners, a few referred by the demo account
        for i in 0..10 {
            let username = format!("{}{}", Username().fake::<String>(), fastrand::u16(..1000));
            if Model::find_by_username(db, &username).await?.is_some() {
                continue;
            }
            let referred_by = (i % 3 == 0).then_some(demo.id);
            let joined = now - Duration::days(fastrand::i64(0..30));
            Model::create(db, &username, referred_by, joined).await?;
        }
        Ok(())
    }
}
