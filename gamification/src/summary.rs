//! Read-side views over a user's gamification state.
//!
//! Nothing here writes; levels are recomputed from the ledger rather than read
//! from the profile cache.

use chrono::{DateTime, NaiveDate, Utc};
use db::models::badge::BadgeRarity;
use db::models::certification::{self, Mention};
use db::models::{
    challenge, profile, technology, user_badge, user_challenge, user_streak, xp_event,
};
use sea_orm::ConnectionTrait;
use serde::Serialize;

use crate::badges;
use crate::error::{GamificationError, GamificationResult};
use crate::exam::grading;
use crate::levels::{LevelInfo, level_progress};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserStats {
    pub user_id: i64,
    pub username: String,
    pub xp_total: i64,
    pub level: LevelInfo,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub freeze_count: i32,
    pub badge_count: u64,
    pub courses_completed: i64,
    pub quizzes_completed: i64,
    pub perfect_quizzes: i64,
    pub certifications: u64,
}

pub async fn user_stats<C: ConnectionTrait>(
    db: &C,
    user_id: i64,
    today: NaiveDate,
) -> GamificationResult<UserStats> {
    let profile = profile::Model::find_by_id(db, user_id)
        .await?
        .ok_or(GamificationError::ProfileNotFound(user_id))?;

    let xp_total = xp_event::Model::total_for_user(db, user_id).await?;
    let streak = user_streak::Model::find(db, user_id).await?;
    let stats = badges::collect_stats(db, user_id, today).await?;

    Ok(UserStats {
        user_id,
        username: profile.username,
        xp_total,
        level: level_progress(xp_total),
        current_streak: streak.as_ref().map_or(0, |s| s.current_streak),
        longest_streak: streak.as_ref().map_or(0, |s| s.longest_streak),
        freeze_count: streak.as_ref().map_or(0, |s| s.freeze_count),
        badge_count: user_badge::Model::count_for_user(db, user_id).await?,
        courses_completed: stats.courses_completed,
        quizzes_completed: stats.quizzes_completed,
        perfect_quizzes: stats.perfect_quizzes,
        certifications: certification::Model::count_for_user(db, user_id).await?,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnlockedBadge {
    pub slug: String,
    pub name: String,
    pub description: String,
    pub rarity: BadgeRarity,
    pub unlocked_at: DateTime<Utc>,
}

/// Unlocked badges, most recent first.
pub async fn user_badges<C: ConnectionTrait>(
    db: &C,
    user_id: i64,
) -> GamificationResult<Vec<UnlockedBadge>> {
    let rows = user_badge::Model::with_badges_for_user(db, user_id).await?;
    Ok(rows
        .into_iter()
        .map(|(unlock, badge)| UnlockedBadge {
            slug: badge.slug,
            name: badge.name,
            description: badge.description,
            rarity: badge.rarity,
            unlocked_at: unlock.unlocked_at,
        })
        .collect())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChallengeProgress {
    pub challenge_id: i64,
    pub title: String,
    pub description: String,
    pub goal: String,
    pub target: i32,
    pub progress: i32,
    pub completed: bool,
    pub xp_reward: i32,
    pub ends_on: NaiveDate,
}

/// Challenges running on `today` with the user's stored progress.
pub async fn active_challenges<C: ConnectionTrait>(
    db: &C,
    user_id: i64,
    today: NaiveDate,
) -> GamificationResult<Vec<ChallengeProgress>> {
    let active = challenge::Model::active_on(db, today).await?;
    let ids: Vec<i64> = active.iter().map(|c| c.id).collect();
    let progress = user_challenge::Model::for_user_and_challenges(db, user_id, &ids).await?;

    Ok(active
        .into_iter()
        .map(|c| {
            let row = progress.iter().find(|p| p.challenge_id == c.id);
            ChallengeProgress {
                challenge_id: c.id,
                progress: row.map_or(0, |p| p.progress),
                completed: row.is_some_and(|p| p.completed),
                title: c.title,
                description: c.description,
                goal: c.condition_type,
                target: c.condition_value,
                xp_reward: c.xp_reward,
                ends_on: c.end_date,
            }
        })
        .collect())
}

/// Most recent ledger entries first.
pub async fn xp_history<C: ConnectionTrait>(
    db: &C,
    user_id: i64,
    limit: u64,
) -> GamificationResult<Vec<xp_event::Model>> {
    Ok(xp_event::Model::recent_for_user(db, user_id, limit).await?)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeldCertification {
    pub cert_number: String,
    pub technology_id: i64,
    pub technology_name: String,
    pub score: i32,
    pub total: i32,
    pub mention: Mention,
    pub verification_path: String,
    pub certified_at: DateTime<Utc>,
}

pub async fn certifications_for_user<C: ConnectionTrait>(
    db: &C,
    user_id: i64,
) -> GamificationResult<Vec<HeldCertification>> {
    let rows = certification::Model::with_technology_for_user(db, user_id).await?;
    Ok(rows
        .into_iter()
        .map(|(cert, tech)| HeldCertification {
            technology_name: tech.map(|t| t.name).unwrap_or_default(),
            cert_number: cert.cert_number,
            technology_id: cert.technology_id,
            score: cert.score,
            total: cert.total,
            mention: cert.mention,
            verification_path: cert.verification_path,
            certified_at: cert.certified_at,
        })
        .collect())
}

/// Public view of a certificate, as shown on its verification page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CertificateView {
    pub cert_number: String,
    pub holder: String,
    pub technology: String,
    pub score: i32,
    pub total: i32,
    pub percentage: i32,
    pub mention: Mention,
    pub certified_at: DateTime<Utc>,
    pub verification_url: String,
}

/// Looks a certificate up by number; `None` when it does not exist.
pub async fn verify_certificate<C: ConnectionTrait>(
    db: &C,
    cert_number: &str,
) -> GamificationResult<Option<CertificateView>> {
    let Some(cert) = certification::Model::find_by_cert_number(db, cert_number).await? else {
        return Ok(None);
    };

    let holder = profile::Model::find_by_id(db, cert.user_id)
        .await?
        .map(|p| p.username)
        .unwrap_or_default();
    let technology = technology::Model::find_by_id(db, cert.technology_id)
        .await?
        .map(|t| t.name)
        .unwrap_or_default();

    Ok(Some(CertificateView {
        verification_url: format!("{}{}", util::config::site_url(), cert.verification_path),
        percentage: grading::percentage(cert.score, cert.total),
        holder,
        technology,
        cert_number: cert.cert_number,
        score: cert.score,
        total: cert.total,
        mention: cert.mention,
        certified_at: cert.certified_at,
    }))
}

impl crate::engine::GamificationEngine {
    /// [`user_stats`] as of the engine's clock.
    pub async fn user_stats(&self, user_id: i64) -> GamificationResult<UserStats> {
        user_stats(self.db(), user_id, self.today()).await
    }

    /// [`active_challenges`] as of the engine's clock.
    pub async fn active_challenges(
        &self,
        user_id: i64,
    ) -> GamificationResult<Vec<ChallengeProgress>> {
        active_challenges(self.db(), user_id, self.today()).await
    }
}
