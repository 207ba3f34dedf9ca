//! Badge unlock evaluation.
//!
//! Statistics are recomputed from the user's full history on every call, and
//! each catalogue entry is tested against the closed set of
//! [`BadgeCondition`]s. Condition tags that do not parse never unlock.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Timelike, Utc};
use db::models::{
    badge, chapter, profile, technology, user_badge, user_progress, user_streak, xp_event,
    xp_event::XpSource,
};
use sea_orm::{ConnectionTrait, TransactionTrait};
use strum::{Display, EnumString};
use tracing::{info, warn};

use crate::error::{GamificationError, GamificationResult, is_unique_violation};
use crate::events::GamificationEvent;
use crate::ledger::{XpGrant, grant_xp};
use crate::levels::level_for;

/// Night study counts activity whose UTC hour is below this value.
pub const NIGHT_END_HOUR: u32 = 5;
/// Minimum gap, in days, for a return to count as a comeback.
pub const COMEBACK_MIN_GAP_DAYS: i64 = 7;
/// A perfect quiz at or under this many seconds counts as a speed run.
pub const SPEED_PERFECT_SECONDS: i32 = 60;
/// Attempts from which a perfect score counts as a redemption.
pub const REDEMPTION_MIN_ATTEMPTS: i32 = 4;

/// Every condition a badge can be unlocked by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum BadgeCondition {
    CoursesCompleted,
    QuizzesCompleted,
    PerfectQuizzes,
    StreakDays,
    TechnologiesStarted,
    AllTechnologies,
    LevelReached,
    NightStudy,
    ComebackDays,
    TechnoCoursesComplete,
    TechnoAllPerfect,
    DailyCourses,
    RedemptionPerfect,
    EarlyAdopter,
    SpeedPerfect,
    Referrals,
}

/// Snapshot of the aggregates badge conditions are tested against.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionStats {
    pub courses_completed: i64,
    pub quizzes_completed: i64,
    pub perfect_quizzes: i64,
    pub streak_days: i64,
    pub technologies_started: i64,
    pub total_technologies: i64,
    pub level_reached: i64,
    pub night_study_days: i64,
    pub comeback_days: i64,
    pub techno_courses_complete: i64,
    pub techno_all_perfect: i64,
    pub daily_courses: i64,
    pub redemption_perfect: i64,
    pub early_adopter_rank: i64,
    pub speed_perfect: i64,
    pub referrals: i64,
}

impl BadgeCondition {
    /// Tests the condition against a statistics snapshot.
    pub fn is_met(self, threshold: i64, stats: &ConditionStats) -> bool {
        use BadgeCondition::*;
        match self {
            CoursesCompleted => stats.courses_completed >= threshold,
            QuizzesCompleted => stats.quizzes_completed >= threshold,
            PerfectQuizzes => stats.perfect_quizzes >= threshold,
            StreakDays => stats.streak_days >= threshold,
            TechnologiesStarted => stats.technologies_started >= threshold,
            AllTechnologies => {
                stats.total_technologies > 0
                    && stats.technologies_started >= stats.total_technologies
            }
            LevelReached => stats.level_reached >= threshold,
            NightStudy => stats.night_study_days >= threshold,
            ComebackDays => stats.comeback_days >= threshold,
            TechnoCoursesComplete => stats.techno_courses_complete >= threshold,
            TechnoAllPerfect => stats.techno_all_perfect >= threshold,
            DailyCourses => stats.daily_courses >= threshold,
            RedemptionPerfect => stats.redemption_perfect >= threshold,
            EarlyAdopter => stats.early_adopter_rank <= threshold,
            SpeedPerfect => stats.speed_perfect >= threshold,
            Referrals => stats.referrals >= threshold,
        }
    }
}

/// Evaluates a stored condition tag. Unknown tags are never met.
pub fn condition_met(condition_type: &str, threshold: i64, stats: &ConditionStats) -> bool {
    match BadgeCondition::from_str(condition_type) {
        Ok(condition) => condition.is_met(threshold, stats),
        Err(_) => {
            warn!(condition_type, "Unknown badge condition; treating as not met");
            false
        }
    }
}

/// Distinct UTC dates with at least one night-time ledger entry.
fn night_study_days(events: &[xp_event::Model]) -> i64 {
    events
        .iter()
        .filter(|e| e.created_at.hour() < NIGHT_END_HOUR)
        .map(|e| e.created_at.date_naive())
        .collect::<HashSet<_>>()
        .len() as i64
}

/// Gap between the two most recent distinct activity dates, when the streak
/// has just restarted after at least [`COMEBACK_MIN_GAP_DAYS`].
fn comeback_gap(events: &[xp_event::Model], current_streak: i32) -> i64 {
    if current_streak != 1 {
        return 0;
    }
    let days: BTreeSet<NaiveDate> = events.iter().map(|e| e.created_at.date_naive()).collect();
    let mut recent = days.iter().rev();
    match (recent.next(), recent.next()) {
        (Some(latest), Some(previous)) => {
            let gap = (*latest - *previous).num_days();
            if gap >= COMEBACK_MIN_GAP_DAYS { gap } else { 0 }
        }
        _ => 0,
    }
}

/// Aggregates a user's history into a [`ConditionStats`] snapshot.
pub async fn collect_stats<C: ConnectionTrait>(
    db: &C,
    user_id: i64,
    today: NaiveDate,
) -> GamificationResult<ConditionStats> {
    let profile = profile::Model::find_by_id(db, user_id)
        .await?
        .ok_or(GamificationError::ProfileNotFound(user_id))?;
    let progress = user_progress::Model::for_user(db, user_id).await?;
    let streak = user_streak::Model::find(db, user_id).await?;
    let events = xp_event::Model::for_user(db, user_id).await?;
    let chapters = chapter::Model::all(db).await?;
    let total_technologies = technology::Model::count_all(db).await? as i64;
    let xp_total: i64 = events.iter().map(|e| e.amount).sum();

    let tech_of: HashMap<i64, i64> = chapters.iter().map(|c| (c.id, c.technology_id)).collect();
    let mut chapters_per_tech: HashMap<i64, i64> = HashMap::new();
    for c in &chapters {
        *chapters_per_tech.entry(c.technology_id).or_default() += 1;
    }

    let mut started: HashSet<i64> = HashSet::new();
    let mut completed_per_tech: HashMap<i64, i64> = HashMap::new();
    let mut perfect_per_tech: HashMap<i64, i64> = HashMap::new();
    for row in &progress {
        let Some(&tech) = tech_of.get(&row.chapter_id) else {
            continue;
        };
        started.insert(tech);
        if row.completed {
            *completed_per_tech.entry(tech).or_default() += 1;
        }
        if row.is_perfect() {
            *perfect_per_tech.entry(tech).or_default() += 1;
        }
    }

    let fully = |per_tech: &HashMap<i64, i64>| {
        chapters_per_tech
            .iter()
            .filter(|&(tech, total)| per_tech.get(tech).copied().unwrap_or(0) >= *total)
            .count() as i64
    };

    let current_streak = streak.as_ref().map_or(0, |s| s.current_streak);

    Ok(ConditionStats {
        courses_completed: progress.iter().filter(|p| p.completed).count() as i64,
        quizzes_completed: progress.iter().filter(|p| p.best_score.is_some()).count() as i64,
        perfect_quizzes: progress.iter().filter(|p| p.is_perfect()).count() as i64,
        streak_days: current_streak as i64,
        technologies_started: started.len() as i64,
        total_technologies,
        level_reached: level_for(xp_total).level as i64,
        night_study_days: night_study_days(&events),
        comeback_days: comeback_gap(&events, current_streak),
        techno_courses_complete: fully(&completed_per_tech),
        techno_all_perfect: fully(&perfect_per_tech),
        daily_courses: events
            .iter()
            .filter(|e| e.source == XpSource::Course && e.created_at.date_naive() == today)
            .count() as i64,
        redemption_perfect: progress
            .iter()
            .filter(|p| p.is_perfect() && p.attempts >= REDEMPTION_MIN_ATTEMPTS)
            .count() as i64,
        early_adopter_rank: profile::Model::registration_rank(db, &profile).await? as i64,
        speed_perfect: progress
            .iter()
            .filter(|p| {
                p.fastest_perfect_seconds
                    .is_some_and(|secs| secs <= SPEED_PERFECT_SECONDS)
            })
            .count() as i64,
        referrals: profile::Model::count_referrals(db, user_id).await? as i64,
    })
}

/// Unlocks every badge whose condition now holds.
///
/// Already-unlocked badges are skipped up front and re-checked right before
/// the insert; a concurrent unlock that wins the race is skipped too. Badge
/// XP rewards go through the ledger with a `badge:<slug>` idempotency key.
/// Statistics are recomputed after each round that unlocked something, so a
/// reward that lifts the user's level is accounted for before returning and
/// an immediate second call has nothing left to do.
pub async fn check_badges<C: ConnectionTrait + TransactionTrait>(
    db: &C,
    user_id: i64,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> GamificationResult<Vec<GamificationEvent>> {
    let catalogue = badge::Model::all(db).await?;
    let unlocked: HashSet<i64> = user_badge::Model::unlocked_ids(db, user_id)
        .await?
        .into_iter()
        .collect();
    let mut pending: Vec<badge::Model> = catalogue
        .into_iter()
        .filter(|b| !unlocked.contains(&b.id))
        .collect();

    let mut events = Vec::new();

    while !pending.is_empty() {
        let stats = collect_stats(db, user_id, today).await?;
        let (earned, rest): (Vec<_>, Vec<_>) = pending
            .into_iter()
            .partition(|b| condition_met(&b.condition_type, b.condition_value as i64, &stats));
        pending = rest;

        if earned.is_empty() {
            break;
        }

        for badge in earned {
            if user_badge::Model::exists(db, user_id, badge.id).await? {
                continue;
            }
            match user_badge::Model::create(db, user_id, badge.id, now).await {
                Ok(_) => {}
                Err(e) if is_unique_violation(&e) => continue,
                Err(e) => return Err(e.into()),
            }

            info!(user_id, badge = %badge.slug, rarity = %badge.rarity, "Badge unlocked");
            events.push(GamificationEvent::Badge {
                slug: badge.slug.clone(),
                name: badge.name.clone(),
                rarity: badge.rarity,
                xp_reward: badge.xp_reward,
            });

            if badge.xp_reward > 0 {
                let grant = XpGrant::new(user_id, badge.xp_reward as i64, XpSource::Badge)
                    .with_ref(badge.slug.clone())
                    .with_key(format!("badge:{}", badge.slug));
                events.extend(grant_xp(db, &grant, now).await?);
            }
        }
    }

    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn event_at(at: DateTime<Utc>, source: XpSource) -> xp_event::Model {
        xp_event::Model {
            id: 0,
            user_id: 1,
            amount: 10,
            source,
            source_ref: None,
            idempotency_key: None,
            created_at: at,
        }
    }

    #[test]
    fn test_condition_tags_parse() {
        assert_eq!(
            BadgeCondition::from_str("techno_all_perfect").unwrap(),
            BadgeCondition::TechnoAllPerfect
        );
        assert_eq!(BadgeCondition::EarlyAdopter.to_string(), "early_adopter");
        assert!(BadgeCondition::from_str("moon_landing").is_err());
    }

    #[test]
    fn test_unknown_condition_fails_closed() {
        let stats = ConditionStats {
            courses_completed: 1_000,
            ..Default::default()
        };
        assert!(!condition_met("moon_landing", 0, &stats));
        assert!(condition_met("courses_completed", 1_000, &stats));
    }

    #[test]
    fn test_rank_condition_is_at_most() {
        let stats = ConditionStats {
            early_adopter_rank: 42,
            ..Default::default()
        };
        assert!(BadgeCondition::EarlyAdopter.is_met(100, &stats));
        assert!(BadgeCondition::EarlyAdopter.is_met(42, &stats));
        assert!(!BadgeCondition::EarlyAdopter.is_met(41, &stats));
    }

    #[test]
    fn test_all_technologies_needs_a_non_empty_catalogue() {
        let none = ConditionStats::default();
        assert!(!BadgeCondition::AllTechnologies.is_met(0, &none));

        let all = ConditionStats {
            technologies_started: 3,
            total_technologies: 3,
            ..Default::default()
        };
        assert!(BadgeCondition::AllTechnologies.is_met(0, &all));
    }

    #[test]
    fn test_night_study_counts_distinct_dates() {
        let d1 = Utc.with_ymd_and_hms(2026, 5, 1, 1, 0, 0).unwrap();
        let events = vec![
            event_at(d1, XpSource::Quiz),
            event_at(d1 + Duration::hours(2), XpSource::Course),
            event_at(d1 + Duration::hours(5), XpSource::Course),
            event_at(d1 + Duration::days(1), XpSource::Quiz),
        ];
        assert_eq!(night_study_days(&events), 2);
    }

    #[test]
    fn test_comeback_gap_requires_a_fresh_streak() {
        let start = Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap();
        let events = vec![
            event_at(start + Duration::days(10), XpSource::Course),
            event_at(start + Duration::days(10), XpSource::Quiz),
            event_at(start, XpSource::Course),
        ];
        assert_eq!(comeback_gap(&events, 1), 10);
        assert_eq!(comeback_gap(&events, 2), 0);

        let short = vec![
            event_at(start + Duration::days(6), XpSource::Course),
            event_at(start, XpSource::Course),
        ];
        assert_eq!(comeback_gap(&short, 1), 0);
    }
}
