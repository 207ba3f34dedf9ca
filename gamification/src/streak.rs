//! Daily activity streaks.
//!
//! The transition for a new activity is decided by comparing today's date with
//! the stored last-activity date; every case is a variant of
//! [`StreakTransition`] so the freeze rules read as a table.

use chrono::{DateTime, NaiveDate, Utc};
use db::models::{user_streak, xp_event::XpSource};
use sea_orm::{ConnectionTrait, TransactionTrait};
use tracing::info;

use crate::config::XpRewards;
use crate::error::GamificationResult;
use crate::events::GamificationEvent;
use crate::ledger::{XpGrant, grant_xp};

/// In-memory view of a streak record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakState {
    pub current: i32,
    pub longest: i32,
    pub last_activity: Option<NaiveDate>,
    pub freezes: i32,
}

impl From<&user_streak::Model> for StreakState {
    fn from(row: &user_streak::Model) -> Self {
        Self {
            current: row.current_streak,
            longest: row.longest_streak,
            last_activity: row.last_activity_date,
            freezes: row.freeze_count,
        }
    }
}

/// What an activity on a given day does to a streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakTransition {
    /// First activity ever, or first one after freezes were credited to an empty record.
    Start,
    /// Activity already counted today (or the stored date is ahead of today).
    AlreadyCounted,
    /// Last activity was yesterday.
    Continue,
    /// Exactly one day was missed and a freeze covers it.
    Freeze,
    /// The gap is too long, or one day was missed with no freeze left.
    Reset,
}

/// Decides the transition for an activity on `today`.
pub fn classify(state: Option<&StreakState>, today: NaiveDate) -> StreakTransition {
    let Some(state) = state else {
        return StreakTransition::Start;
    };
    let Some(last) = state.last_activity else {
        return StreakTransition::Start;
    };

    match (today - last).num_days() {
        gap if gap <= 0 => StreakTransition::AlreadyCounted,
        1 => StreakTransition::Continue,
        2 if state.freezes > 0 => StreakTransition::Freeze,
        _ => StreakTransition::Reset,
    }
}

/// Applies a transition, returning the new state.
///
/// `AlreadyCounted` returns the state unchanged.
pub fn apply(
    transition: StreakTransition,
    state: Option<&StreakState>,
    today: NaiveDate,
) -> StreakState {
    let base = state.copied().unwrap_or(StreakState {
        current: 0,
        longest: 0,
        last_activity: None,
        freezes: 0,
    });

    let (current, freezes) = match transition {
        StreakTransition::AlreadyCounted => return base,
        StreakTransition::Start | StreakTransition::Reset => (1, base.freezes),
        StreakTransition::Continue => (base.current + 1, base.freezes),
        StreakTransition::Freeze => (base.current + 1, base.freezes - 1),
    };

    StreakState {
        current,
        longest: base.longest.max(current),
        last_activity: Some(today),
        freezes,
    }
}

/// Multiplier applied to course and quiz XP for a given streak length.
pub fn xp_multiplier(current_streak: i32) -> f64 {
    if current_streak >= 30 {
        2.0
    } else if current_streak >= 7 {
        1.5
    } else {
        1.0
    }
}

/// Bonus XP and its reference tag when a streak lands exactly on a milestone.
pub fn milestone_bonus(days: i32, rewards: &XpRewards) -> Option<(i64, &'static str)> {
    match days {
        7 => Some((rewards.streak_7, "streak_7")),
        30 => Some((rewards.streak_30, "streak_30")),
        100 => Some((rewards.streak_100, "streak_100")),
        _ => None,
    }
}

/// Current multiplier for a user; 1.0 without a streak record.
pub async fn current_multiplier<C: ConnectionTrait>(db: &C, user_id: i64) -> GamificationResult<f64> {
    let streak = user_streak::Model::find(db, user_id).await?;
    Ok(xp_multiplier(streak.map_or(0, |s| s.current_streak)))
}

/// Records an activity for `today`.
///
/// Emits a `Streak` event whenever the streak was written, followed by the
/// milestone XP grant's events when the new length is 7, 30 or 100. A second
/// activity on the same day emits nothing.
pub async fn update_streak<C: ConnectionTrait + TransactionTrait>(
    db: &C,
    user_id: i64,
    today: NaiveDate,
    now: DateTime<Utc>,
    rewards: &XpRewards,
) -> GamificationResult<Vec<GamificationEvent>> {
    let row = user_streak::Model::find(db, user_id).await?;
    let before = row.as_ref().map(StreakState::from);
    let transition = classify(before.as_ref(), today);

    if transition == StreakTransition::AlreadyCounted {
        return Ok(Vec::new());
    }

    let after = apply(transition, before.as_ref(), today);
    match row {
        None => {
            user_streak::Model::create(db, user_id, after.current, after.last_activity, after.freezes, now)
                .await?;
        }
        Some(_) => {
            user_streak::Model::save_state(
                db,
                user_id,
                after.current,
                after.longest,
                after.last_activity,
                after.freezes,
                now,
            )
            .await?;
        }
    }

    if transition == StreakTransition::Freeze {
        info!(user_id, remaining = after.freezes, "Streak freeze consumed");
    }

    let mut events = vec![GamificationEvent::Streak {
        streak_days: after.current,
    }];

    if let Some((bonus, tag)) = milestone_bonus(after.current, rewards) {
        info!(user_id, days = after.current, "Streak milestone reached");
        let grant = XpGrant::new(user_id, bonus, XpSource::Streak).with_ref(tag);
        events.extend(grant_xp(db, &grant, now).await?);
    }

    Ok(events)
}

/// Credits `count` streak freezes, creating an empty record if needed.
pub async fn add_freezes<C: ConnectionTrait>(
    db: &C,
    user_id: i64,
    count: i32,
    now: DateTime<Utc>,
) -> GamificationResult<user_streak::Model> {
    let count = count.max(0);
    let row = match user_streak::Model::find(db, user_id).await? {
        Some(existing) => {
            user_streak::Model::save_state(
                db,
                user_id,
                existing.current_streak,
                existing.longest_streak,
                existing.last_activity_date,
                existing.freeze_count + count,
                now,
            )
            .await?
        }
        None => user_streak::Model::create(db, user_id, 0, None, count, now).await?,
    };
    Ok(row)
}
