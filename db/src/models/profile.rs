use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelTrait, Condition, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};

/// A learner's profile in the `profiles` table.
///
/// `xp_total`, `current_level` and `current_title` are a cache of what the XP
/// ledger implies; they are rewritten by the ledger, never by callers.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "profiles")]
pub struct Model {
    /// Primary key ID (auto-incremented).
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Unique public handle.
    pub username: String,
    /// Cached sum of every XP event for this profile.
    pub xp_total: i64,
    /// Cached level derived from `xp_total`.
    pub current_level: i32,
    /// Cached title of `current_level`.
    pub current_title: String,
    /// Profile that referred this one, if any.
    pub referred_by: Option<i64>,
    /// Registration time; drives the early adopter rank.
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::xp_event::Entity")]
    XpEvents,
    #[sea_orm(has_one = "super::user_streak::Entity")]
    Streak,
    #[sea_orm(has_many = "super::user_badge::Entity")]
    UserBadges,
    #[sea_orm(has_many = "super::certification::Entity")]
    Certifications,
}

impl Related<super::xp_event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::XpEvents.def()
    }
}

impl Related<super::user_streak::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Streak.def()
    }
}

impl Related<super::user_badge::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserBadges.def()
    }
}

impl Related<super::certification::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Certifications.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Registers a new profile at level 1 with no XP.
    ///
    /// # Arguments
    /// * `db` - Connection or transaction.
    /// * `username` - Unique handle.
    /// * `referred_by` - Referrer's profile ID, if the user signed up through a referral.
    /// * `now` - Registration timestamp.
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        username: &str,
        referred_by: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<Model, DbErr> {
        ActiveModel {
            username: Set(username.to_owned()),
            xp_total: Set(0),
            current_level: Set(1),
            current_title: Set("Curieux".to_owned()),
            referred_by: Set(referred_by),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: i64) -> Result<Option<Model>, DbErr> {
        Entity::find_by_id(id).one(db).await
    }

    pub async fn find_by_username<C: ConnectionTrait>(
        db: &C,
        username: &str,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::Username.eq(username))
            .one(db)
            .await
    }

    /// Rewrites the cached XP total, level and title in a single update.
    pub async fn write_cache<C: ConnectionTrait>(
        db: &C,
        id: i64,
        xp_total: i64,
        level: i32,
        title: &str,
        now: DateTime<Utc>,
    ) -> Result<Model, DbErr> {
        ActiveModel {
            id: Set(id),
            xp_total: Set(xp_total),
            current_level: Set(level),
            current_title: Set(title.to_owned()),
            updated_at: Set(now),
            ..Default::default()
        }
        .update(db)
        .await
    }

    /// 1-based registration rank: how many profiles signed up no later than this one.
    ///
    /// Ties on `created_at` are broken by ID so ranks stay distinct.
    pub async fn registration_rank<C: ConnectionTrait>(
        db: &C,
        profile: &Model,
    ) -> Result<u64, DbErr> {
        Entity::find()
            .filter(
                Condition::any()
                    .add(Column::CreatedAt.lt(profile.created_at))
                    .add(
                        Condition::all()
                            .add(Column::CreatedAt.eq(profile.created_at))
                            .add(Column::Id.lte(profile.id)),
                    ),
            )
            .count(db)
            .await
    }

    /// Number of profiles that name `id` as their referrer.
    pub async fn count_referrals<C: ConnectionTrait>(db: &C, id: i64) -> Result<u64, DbErr> {
        Entity::find()
            .filter(Column::ReferredBy.eq(id))
            .count(db)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_test_db;
    use chrono::Duration;

    #[tokio::test]
    async fn test_create_starts_at_level_one() {
        let db = setup_test_db().await;
        let profile = Model::create(&db, "ada", None, Utc::now()).await.unwrap();

        assert_eq!(profile.xp_total, 0);
        assert_eq!(profile.current_level, 1);
        assert_eq!(profile.current_title, "Curieux");

        let found = Model::find_by_username(&db, "ada").await.unwrap();
        assert_eq!(found.map(|p| p.id), Some(profile.id));
    }

    #[tokio::test]
    async fn test_registration_rank_follows_signup_order() {
        let db = setup_test_db().await;
        let t0 = Utc::now();
        let first = Model::create(&db, "first", None, t0).await.unwrap();
        let second = Model::create(&db, "second", None, t0 + Duration::seconds(5)).await.unwrap();
        let tied = Model::create(&db, "tied", None, t0 + Duration::seconds(5)).await.unwrap();

        assert_eq!(Model::registration_rank(&db, &first).await.unwrap(), 1);
        assert_eq!(Model::registration_rank(&db, &second).await.unwrap(), 2);
        assert_eq!(Model::registration_rank(&db, &tied).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_count_referrals() {
        let db = setup_test_db().await;
        let now = Utc::now();
        let host = Model::create(&db, "host", None, now).await.unwrap();
        Model::create(&db, "guest1", Some(host.id), now).await.unwrap();
        Model::create(&db, "guest2", Some(host.id), now).await.unwrap();

        assert_eq!(Model::count_referrals(&db, host.id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_write_cache_updates_all_three_fields() {
        let db = setup_test_db().await;
        let profile = Model::create(&db, "cache", None, Utc::now()).await.unwrap();

        let updated = Model::write_cache(&db, profile.id, 600, 3, "Initié", Utc::now())
            .await
            .unwrap();
        assert_eq!(updated.xp_total, 600);
        assert_eq!(updated.current_level, 3);
        assert_eq!(updated.current_title, "Initié");
    }
}
