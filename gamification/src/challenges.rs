//! Time-boxed challenges.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use db::models::{challenge, user_challenge, user_streak, xp_event, xp_event::XpSource};
use sea_orm::{ConnectionTrait, TransactionTrait};
use strum::{Display, EnumString};
use tracing::{info, warn};

use crate::error::GamificationResult;
use crate::events::GamificationEvent;
use crate::ledger::{XpGrant, grant_xp};

/// What a challenge measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum ChallengeGoal {
    /// Course completions inside the challenge window.
    CoursesCompleted,
    /// Quiz completions inside the challenge window.
    QuizzesCompleted,
    /// XP earned inside the window, excluding challenge rewards.
    XpEarned,
    /// Current streak length.
    StreakDays,
}

/// `[start, end + 1 day)` in UTC. A challenge ending on the last representable
/// day has no upper bound.
pub fn window(start: NaiveDate, end: NaiveDate) -> (DateTime<Utc>, Option<DateTime<Utc>>) {
    let from = start.and_time(NaiveTime::MIN).and_utc();
    let to = end.succ_opt().map(|next| next.and_time(NaiveTime::MIN).and_utc());
    (from, to)
}

/// Progress value for a goal, from the ledger entries inside its window.
pub fn measure(goal: ChallengeGoal, events: &[xp_event::Model], current_streak: i32) -> i64 {
    match goal {
        ChallengeGoal::CoursesCompleted => {
            events.iter().filter(|e| e.source == XpSource::Course).count() as i64
        }
        ChallengeGoal::QuizzesCompleted => {
            events.iter().filter(|e| e.source == XpSource::Quiz).count() as i64
        }
        ChallengeGoal::XpEarned => events
            .iter()
            .filter(|e| e.source != XpSource::Challenge)
            .map(|e| e.amount)
            .sum(),
        ChallengeGoal::StreakDays => current_streak as i64,
    }
}

/// Refreshes the user's progress on every challenge active on `today`.
///
/// A challenge whose threshold is reached is marked completed once; that
/// first completion emits a `ChallengeCompleted` event and grants the reward
/// under the `challenge:<id>` idempotency key. Challenges with a goal this
/// engine does not know are left untouched.
pub async fn update_challenges<C: ConnectionTrait + TransactionTrait>(
    db: &C,
    user_id: i64,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> GamificationResult<Vec<GamificationEvent>> {
    let active = challenge::Model::active_on(db, today).await?;
    if active.is_empty() {
        return Ok(Vec::new());
    }

    let current_streak = user_streak::Model::find(db, user_id)
        .await?
        .map_or(0, |s| s.current_streak);
    let mut events = Vec::new();

    for ch in active {
        let Ok(goal) = ChallengeGoal::from_str(&ch.condition_type) else {
            warn!(challenge_id = ch.id, condition = %ch.condition_type, "Unknown challenge goal");
            continue;
        };

        let existing = user_challenge::Model::find(db, user_id, ch.id).await?;
        if existing.as_ref().is_some_and(|row| row.completed) {
            continue;
        }

        let (from, to) = window(ch.start_date, ch.end_date);
        let in_window = xp_event::Model::for_user_between(db, user_id, from, to).await?;
        let progress = measure(goal, &in_window, current_streak).min(i32::MAX as i64) as i32;
        let reached = progress >= ch.condition_value;

        if existing.as_ref().map(|row| row.progress) == Some(progress) && !reached {
            continue;
        }

        user_challenge::Model::upsert_progress(db, user_id, ch.id, progress, reached, now).await?;

        if reached {
            info!(user_id, challenge_id = ch.id, "Challenge completed");
            events.push(GamificationEvent::ChallengeCompleted {
                challenge_id: ch.id,
                title: ch.title.clone(),
                xp_reward: ch.xp_reward,
            });
            let grant = XpGrant::new(user_id, ch.xp_reward as i64, XpSource::Challenge)
                .with_ref(ch.id.to_string())
                .with_key(format!("challenge:{}", ch.id));
            events.extend(grant_xp(db, &grant, now).await?);
        }
    }

    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ev(amount: i64, source: XpSource) -> xp_event::Model {
        xp_event::Model {
            id: 0,
            user_id: 1,
            amount,
            source,
            source_ref: None,
            idempotency_key: None,
            created_at: Utc.with_ymd_and_hms(2026, 2, 3, 10, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_window_includes_the_whole_end_day() {
        let start = NaiveDate::from_ymd_opt(2026, 2, 2).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 2, 8).unwrap();
        let (from, to) = window(start, end);
        assert_eq!(from, Utc.with_ymd_and_hms(2026, 2, 2, 0, 0, 0).unwrap());
        assert_eq!(to, Some(Utc.with_ymd_and_hms(2026, 2, 9, 0, 0, 0).unwrap()));
    }

    #[test]
    fn test_window_ending_on_the_last_day_is_open() {
        let start = NaiveDate::from_ymd_opt(2026, 2, 2).unwrap();
        let (from, to) = window(start, NaiveDate::MAX);
        assert_eq!(from, Utc.with_ymd_and_hms(2026, 2, 2, 0, 0, 0).unwrap());
        assert_eq!(to, None);
    }

    #[test]
    fn test_xp_goal_excludes_challenge_rewards() {
        let events = vec![
            ev(50, XpSource::Course),
            ev(230, XpSource::Quiz),
            ev(500, XpSource::Challenge),
        ];
        assert_eq!(measure(ChallengeGoal::XpEarned, &events, 0), 280);
        assert_eq!(measure(ChallengeGoal::CoursesCompleted, &events, 0), 1);
        assert_eq!(measure(ChallengeGoal::StreakDays, &events, 4), 4);
    }
}
