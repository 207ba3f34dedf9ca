use serde::Serialize;

/// One row of the level table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelDef {
    pub level: i32,
    pub title: &'static str,
    pub min_xp: i64,
}

/// Level thresholds in ascending order. The first row must start at zero.
pub const LEVELS: [LevelDef; 10] = [
    LevelDef { level: 1, title: "Curieux", min_xp: 0 },
    LevelDef { level: 2, title: "Apprenti", min_xp: 200 },
    LevelDef { level: 3, title: "Initié", min_xp: 500 },
    LevelDef { level: 4, title: "Pratiquant", min_xp: 1000 },
    LevelDef { level: 5, title: "Confirmé", min_xp: 2000 },
    LevelDef { level: 6, title: "Avancé", min_xp: 3500 },
    LevelDef { level: 7, title: "Expert", min_xp: 5500 },
    LevelDef { level: 8, title: "Maître", min_xp: 8000 },
    LevelDef { level: 9, title: "Sage", min_xp: 12000 },
    LevelDef { level: 10, title: "Légende", min_xp: 18000 },
];

/// Where a given XP total sits in the level table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelInfo {
    pub level: i32,
    pub title: &'static str,
    /// Threshold of the current level.
    pub min_xp: i64,
    /// Threshold of the next level, or `min_xp` at the top level.
    pub max_xp: i64,
    pub current_xp: i64,
    /// Fraction of the way to the next level, in `[0, 1]`.
    pub progress: f64,
}

/// Highest level whose threshold is at or below `total_xp`.
pub fn level_for(total_xp: i64) -> &'static LevelDef {
    let xp = total_xp.max(0);
    LEVELS
        .iter()
        .rev()
        .find(|def| xp >= def.min_xp)
        .unwrap_or(&LEVELS[0])
}

/// Computes the level, title and progress for an XP total.
///
/// Negative totals are treated as zero.
pub fn level_progress(total_xp: i64) -> LevelInfo {
    let xp = total_xp.max(0);
    let current = level_for(xp);
    let max_xp = LEVELS
        .iter()
        .find(|def| def.level == current.level + 1)
        .map_or(current.min_xp, |next| next.min_xp);

    let span = max_xp - current.min_xp;
    let progress = if span > 0 {
        ((xp - current.min_xp) as f64 / span as f64).clamp(0.0, 1.0)
    } else {
        1.0
    };

    LevelInfo {
        level: current.level,
        title: current.title,
        min_xp: current.min_xp,
        max_xp,
        current_xp: xp,
        progress,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds_are_inclusive() {
        assert_eq!(level_progress(0).level, 1);
        assert_eq!(level_progress(199).level, 1);
        assert_eq!(level_progress(200).level, 2);
        assert_eq!(level_progress(410).level, 2);
        assert_eq!(level_progress(499).level, 2);
        assert_eq!(level_progress(500).level, 3);
        assert_eq!(level_progress(17_999).level, 9);
        assert_eq!(level_progress(18_000).title, "Légende");
    }

    #[test]
    fn test_progress_within_level() {
        let info = level_progress(350);
        assert_eq!(info.min_xp, 200);
        assert_eq!(info.max_xp, 500);
        assert!((info.progress - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_top_level_is_clamped_to_full() {
        let info = level_progress(1_000_000);
        assert_eq!(info.level, 10);
        assert_eq!(info.max_xp, info.min_xp);
        assert_eq!(info.progress, 1.0);
    }

    #[test]
    fn test_negative_total_is_clamped_to_zero() {
        let info = level_progress(-40);
        assert_eq!(info.level, 1);
        assert_eq!(info.current_xp, 0);
        assert_eq!(info.progress, 0.0);
    }

    #[test]
    fn test_level_is_monotonic_and_progress_bounded() {
        let mut previous = 0;
        for xp in (0..20_000).step_by(7) {
            let info = level_progress(xp);
            assert!(info.level >= previous, "level dropped at {xp}");
            assert!((0.0..=1.0).contains(&info.progress), "progress out of range at {xp}");
            previous = info.level;
        }
    }
}
