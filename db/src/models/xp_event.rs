use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    Set,
};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// An immutable entry of the XP ledger.
///
/// Rows are only ever inserted; the sum of `amount` per user is the
/// authoritative XP total.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "xp_events")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    /// Strictly positive amount granted.
    pub amount: i64,
    pub source: XpSource,
    /// Free-form reference to what produced the grant (chapter ID, badge slug, ...).
    pub source_ref: Option<String>,
    /// When present, unique per user; a repeated key means the grant already happened.
    pub idempotency_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// What produced an XP grant.
/// Backed by the `xp_source_type` enum in the database.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Display, EnumString,
    Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "xp_source_type")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum XpSource {
    #[sea_orm(string_value = "course")]
    Course,
    #[sea_orm(string_value = "quiz")]
    Quiz,
    #[sea_orm(string_value = "badge")]
    Badge,
    #[sea_orm(string_value = "streak")]
    Streak,
    #[sea_orm(string_value = "challenge")]
    Challenge,
    #[sea_orm(string_value = "certification")]
    Certification,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::profile::Entity",
        from = "Column::UserId",
        to = "super::profile::Column::Id"
    )]
    Profile,
}

impl Related<super::profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Profile.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Appends one ledger entry.
    pub async fn append<C: ConnectionTrait>(
        db: &C,
        user_id: i64,
        amount: i64,
        source: XpSource,
        source_ref: Option<&str>,
        idempotency_key: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Model, DbErr> {
        ActiveModel {
            user_id: Set(user_id),
            amount: Set(amount),
            source: Set(source),
            source_ref: Set(source_ref.map(str::to_owned)),
            idempotency_key: Set(idempotency_key.map(str::to_owned)),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    /// Whether a grant with this idempotency key was already recorded for the user.
    pub async fn key_exists<C: ConnectionTrait>(
        db: &C,
        user_id: i64,
        key: &str,
    ) -> Result<bool, DbErr> {
        let count = Entity::find()
            .filter(Column::UserId.eq(user_id))
            .filter(Column::IdempotencyKey.eq(key))
            .count(db)
            .await?;
        Ok(count > 0)
    }

    /// Ledger sum for a user; zero when the user has no entries.
    pub async fn total_for_user<C: ConnectionTrait>(db: &C, user_id: i64) -> Result<i64, DbErr> {
        let total: Option<Option<i64>> = Entity::find()
            .select_only()
            .column_as(Expr::col(Column::Amount).sum(), "total")
            .filter(Column::UserId.eq(user_id))
            .into_tuple()
            .one(db)
            .await?;
        Ok(total.flatten().unwrap_or(0))
    }

    /// Every entry of a user, newest first.
    pub async fn for_user<C: ConnectionTrait>(db: &C, user_id: i64) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::UserId.eq(user_id))
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .all(db)
            .await
    }

    /// The `limit` most recent entries of a user, newest first.
    pub async fn recent_for_user<C: ConnectionTrait>(
        db: &C,
        user_id: i64,
        limit: u64,
    ) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::UserId.eq(user_id))
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .limit(limit)
            .all(db)
            .await
    }

    /// Entries of a user created in `[from, to)`, oldest first. `None` leaves the
    /// range open-ended.
    pub async fn for_user_between<C: ConnectionTrait>(
        db: &C,
        user_id: i64,
        from: DateTime<Utc>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<Model>, DbErr> {
        let mut query = Entity::find()
            .filter(Column::UserId.eq(user_id))
            .filter(Column::CreatedAt.gte(from));
        if let Some(to) = to {
            query = query.filter(Column::CreatedAt.lt(to));
        }
        query
            .order_by_asc(Column::CreatedAt)
            .order_by_asc(Column::Id)
            .all(db)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile;
    use crate::test_utils::setup_test_db;
    use chrono::Duration;
    use std::str::FromStr;

    #[tokio::test]
    async fn test_total_is_zero_without_entries() {
        let db = setup_test_db().await;
        let user = profile::Model::create(&db, "empty", None, Utc::now()).await.unwrap();
        assert_eq!(Model::total_for_user(&db, user.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_total_sums_amounts() {
        let db = setup_test_db().await;
        let user = profile::Model::create(&db, "sum", None, Utc::now()).await.unwrap();
        let now = Utc::now();
        Model::append(&db, user.id, 50, XpSource::Course, Some("1"), None, now).await.unwrap();
        Model::append(&db, user.id, 230, XpSource::Quiz, Some("1"), None, now).await.unwrap();

        assert_eq!(Model::total_for_user(&db, user.id).await.unwrap(), 280);
    }

    #[tokio::test]
    async fn test_duplicate_idempotency_key_is_rejected() {
        let db = setup_test_db().await;
        let user = profile::Model::create(&db, "dup", None, Utc::now()).await.unwrap();
        let now = Utc::now();

        Model::append(&db, user.id, 20, XpSource::Badge, Some("first"), Some("badge:first"), now)
            .await
            .unwrap();
        assert!(Model::key_exists(&db, user.id, "badge:first").await.unwrap());

        let second =
            Model::append(&db, user.id, 20, XpSource::Badge, Some("first"), Some("badge:first"), now)
                .await;
        assert!(second.is_err());
    }

    #[tokio::test]
    async fn test_between_is_half_open() {
        let db = setup_test_db().await;
        let user = profile::Model::create(&db, "window", None, Utc::now()).await.unwrap();
        let t0 = Utc::now();
        Model::append(&db, user.id, 1, XpSource::Course, None, None, t0).await.unwrap();
        Model::append(&db, user.id, 2, XpSource::Course, None, None, t0 + Duration::hours(1))
            .await
            .unwrap();

        let rows = Model::for_user_between(&db, user.id, t0, Some(t0 + Duration::hours(1)))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].amount, 1);
    }

    #[test]
    fn test_source_string_forms() {
        assert_eq!(XpSource::Certification.to_string(), "certification");
        assert_eq!(XpSource::from_str("Quiz").unwrap(), XpSource::Quiz);
    }
}
