//! XP ledger writes.
//!
//! Every grant appends one immutable `xp_events` row and rewrites the
//! profile's cached total, level and title from the ledger sum inside the same
//! transaction, so the cache can never drift from the ledger through a grant.

use chrono::{DateTime, Utc};
use db::models::{profile, xp_event, xp_event::XpSource};
use sea_orm::TransactionTrait;
use tracing::{debug, info};

use crate::error::{GamificationError, GamificationResult, is_unique_violation};
use crate::events::GamificationEvent;
use crate::levels::level_progress;

/// A request to credit XP to a user.
#[derive(Debug, Clone, PartialEq)]
pub struct XpGrant {
    pub user_id: i64,
    pub amount: i64,
    pub source: XpSource,
    pub source_ref: Option<String>,
    /// Grants sharing a key with an earlier grant for the same user are dropped.
    pub idempotency_key: Option<String>,
}

impl XpGrant {
    pub fn new(user_id: i64, amount: i64, source: XpSource) -> Self {
        Self {
            user_id,
            amount,
            source,
            source_ref: None,
            idempotency_key: None,
        }
    }

    pub fn with_ref(mut self, source_ref: impl Into<String>) -> Self {
        self.source_ref = Some(source_ref.into());
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }
}

/// Credits XP and refreshes the profile cache atomically.
///
/// Returns an `Xp` event, followed by a `LevelUp` event when the recomputed
/// level is above the cached one. A non-positive amount or an idempotency key
/// already on the ledger yields no events and writes nothing.
///
/// # Errors
/// `ProfileNotFound` when the user has no profile; store failures roll the
/// whole grant back.
pub async fn grant_xp<C: TransactionTrait>(
    db: &C,
    grant: &XpGrant,
    now: DateTime<Utc>,
) -> GamificationResult<Vec<GamificationEvent>> {
    if grant.amount <= 0 {
        return Ok(Vec::new());
    }

    let txn = db.begin().await?;

    if let Some(key) = grant.idempotency_key.as_deref() {
        if xp_event::Model::key_exists(&txn, grant.user_id, key).await? {
            debug!(user_id = grant.user_id, key, "XP grant already recorded");
            txn.rollback().await?;
            return Ok(Vec::new());
        }
    }

    let profile = profile::Model::find_by_id(&txn, grant.user_id)
        .await?
        .ok_or(GamificationError::ProfileNotFound(grant.user_id))?;

    let appended = xp_event::Model::append(
        &txn,
        grant.user_id,
        grant.amount,
        grant.source,
        grant.source_ref.as_deref(),
        grant.idempotency_key.as_deref(),
        now,
    )
    .await;

    match appended {
        Ok(_) => {}
        Err(e) if is_unique_violation(&e) => {
            debug!(user_id = grant.user_id, "concurrent duplicate XP grant skipped");
            txn.rollback().await?;
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    }

    let total = xp_event::Model::total_for_user(&txn, grant.user_id).await?;
    let info = level_progress(total);
    profile::Model::write_cache(&txn, grant.user_id, total, info.level, info.title, now).await?;
    txn.commit().await?;

    let mut events = vec![GamificationEvent::Xp {
        amount: grant.amount,
    }];

    if info.level > profile.current_level {
        info!(
            user_id = grant.user_id,
            from = profile.current_level,
            to = info.level,
            "Level up"
        );
        events.push(GamificationEvent::LevelUp {
            new_level: info.level,
            new_title: info.title.to_string(),
        });
    }

    Ok(events)
}

/// Rebuilds the profile cache from the ledger.
///
/// This is the recovery path for a cache left stale by an interrupted
/// pipeline; it never emits events.
pub async fn reconcile_profile<C: TransactionTrait>(
    db: &C,
    user_id: i64,
    now: DateTime<Utc>,
) -> GamificationResult<profile::Model> {
    let txn = db.begin().await?;

    let cached = profile::Model::find_by_id(&txn, user_id)
        .await?
        .ok_or(GamificationError::ProfileNotFound(user_id))?;

    let total = xp_event::Model::total_for_user(&txn, user_id).await?;
    let info = level_progress(total);

    if cached.xp_total == total
        && cached.current_level == info.level
        && cached.current_title == info.title
    {
        txn.rollback().await?;
        return Ok(cached);
    }

    info!(
        user_id,
        cached_xp = cached.xp_total,
        ledger_xp = total,
        "Reconciled profile cache with ledger"
    );
    let updated =
        profile::Model::write_cache(&txn, user_id, total, info.level, info.title, now).await?;
    txn.commit().await?;
    Ok(updated)
}
