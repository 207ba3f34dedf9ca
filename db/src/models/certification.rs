use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// A certification held by a user for one technology.
///
/// At most one row per (user, technology); later passing attempts never
/// replace it.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "certifications")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub technology_id: i64,
    /// Attempt that earned the certification.
    pub exam_attempt_id: i64,
    /// Globally unique public number, e.g. `CERT-2026-7QX2`.
    #[sea_orm(unique)]
    pub cert_number: String,
    pub score: i32,
    pub total: i32,
    pub mention: Mention,
    /// Site-relative path of the public verification page.
    pub verification_path: String,
    pub certified_at: DateTime<Utc>,
}

/// Distinction awarded with a passing exam.
/// Backed by the `mention_type` enum in the database.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, EnumIter, DeriveActiveEnum, Display,
    EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "mention_type")]
pub enum Mention {
    #[sea_orm(string_value = "bien")]
    #[strum(serialize = "Bien")]
    Bien,
    #[sea_orm(string_value = "tres_bien")]
    #[strum(serialize = "Très Bien")]
    TresBien,
    #[sea_orm(string_value = "exceptionnelle")]
    #[strum(serialize = "Exceptionnelle")]
    Exceptionnelle,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::profile::Entity",
        from = "Column::UserId",
        to = "super::profile::Column::Id"
    )]
    Profile,
    #[sea_orm(
        belongs_to = "super::technology::Entity",
        from = "Column::TechnologyId",
        to = "super::technology::Column::Id"
    )]
    Technology,
}

impl Related<super::profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Profile.def()
    }
}

impl Related<super::technology::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Technology.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone)]
pub struct NewCertification {
    pub user_id: i64,
    pub technology_id: i64,
    pub exam_attempt_id: i64,
    pub cert_number: String,
    pub score: i32,
    pub total: i32,
    pub mention: Mention,
    pub verification_path: String,
}

impl Model {
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        cert: NewCertification,
        now: DateTime<Utc>,
    ) -> Result<Model, DbErr> {
        ActiveModel {
            user_id: Set(cert.user_id),
            technology_id: Set(cert.technology_id),
            exam_attempt_id: Set(cert.exam_attempt_id),
            cert_number: Set(cert.cert_number),
            score: Set(cert.score),
            total: Set(cert.total),
            mention: Set(cert.mention),
            verification_path: Set(cert.verification_path),
            certified_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    pub async fn find_for_user_and_technology<C: ConnectionTrait>(
        db: &C,
        user_id: i64,
        technology_id: i64,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::UserId.eq(user_id))
            .filter(Column::TechnologyId.eq(technology_id))
            .one(db)
            .await
    }

    pub async fn find_by_cert_number<C: ConnectionTrait>(
        db: &C,
        cert_number: &str,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::CertNumber.eq(cert_number))
            .one(db)
            .await
    }

    pub async fn count_for_user<C: ConnectionTrait>(db: &C, user_id: i64) -> Result<u64, DbErr> {
        Entity::find()
            .filter(Column::UserId.eq(user_id))
            .count(db)
            .await
    }

    /// Certifications of a user with their technology, newest first.
    pub async fn with_technology_for_user<C: ConnectionTrait>(
        db: &C,
        user_id: i64,
    ) -> Result<Vec<(Model, Option<super::technology::Model>)>, DbErr> {
        Entity::find()
            .filter(Column::UserId.eq(user_id))
            .order_by_desc(Column::CertifiedAt)
            .find_also_related(super::technology::Entity)
            .all(db)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_mention_labels() {
        assert_eq!(Mention::TresBien.to_string(), "Très Bien");
        assert_eq!(Mention::from_str("Exceptionnelle").unwrap(), Mention::Exceptionnelle);
        assert!(Mention::Bien < Mention::Exceptionnelle);
    }
}
