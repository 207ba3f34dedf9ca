use db::models::badge::BadgeRarity;
use serde::{Deserialize, Serialize};

/// A user-facing outcome of a gamification pipeline.
///
/// Each operation returns these in presentation order: XP first, then the
/// streak, then badges and level-ups, then challenges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GamificationEvent {
    Xp {
        amount: i64,
    },
    LevelUp {
        new_level: i32,
        new_title: String,
    },
    Streak {
        streak_days: i32,
    },
    Badge {
        slug: String,
        name: String,
        rarity: BadgeRarity,
        xp_reward: i32,
    },
    ChallengeCompleted {
        challenge_id: i64,
        title: String,
        xp_reward: i32,
    },
}

impl GamificationEvent {
    /// XP carried by an `Xp` event, zero for every other kind.
    pub fn xp_amount(&self) -> i64 {
        match self {
            GamificationEvent::Xp { amount } => *amount,
            _ => 0,
        }
    }
}

/// Total XP granted across a list of events.
pub fn total_xp(events: &[GamificationEvent]) -> i64 {
    events.iter().map(GamificationEvent::xp_amount).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_serialize_with_type_tag() {
        let json = serde_json::to_value(GamificationEvent::LevelUp {
            new_level: 3,
            new_title: "Initié".into(),
        })
        .unwrap();
        assert_eq!(json["type"], "level_up");
        assert_eq!(json["new_level"], 3);
    }

    #[test]
    fn test_total_xp_ignores_other_events() {
        let events = vec![
            GamificationEvent::Xp { amount: 50 },
            GamificationEvent::Streak { streak_days: 7 },
            GamificationEvent::Xp { amount: 50 },
        ];
        assert_eq!(total_xp(&events), 100);
    }
}
