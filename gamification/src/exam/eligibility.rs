//! Exam prerequisites.

use chrono::{DateTime, Utc};
use db::models::{chapter, exam_attempt, user_progress, user_progress::DEFAULT_QUIZ_LENGTH};
use sea_orm::ConnectionTrait;
use serde::Serialize;

use crate::config::ExamPolicy;
use crate::error::GamificationResult;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncompleteChapter {
    pub id: i64,
    pub title: String,
}

/// Itemised state of every exam prerequisite for one user and technology.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prerequisites {
    pub chapters_incomplete: Vec<IncompleteChapter>,
    /// Rounded mean of the best quiz percentages over chapters with a score.
    pub average_score: i32,
    pub required_average: i32,
    pub attempts_this_week: u64,
    pub max_attempts: u64,
}

impl Prerequisites {
    pub fn is_met(&self) -> bool {
        self.chapters_incomplete.is_empty()
            && self.average_score >= self.required_average
            && self.attempts_this_week < self.max_attempts
    }
}

/// Rounded mean percentage of the best scores among scored rows.
pub fn average_best_percent(rows: &[user_progress::Model]) -> i32 {
    let percents: Vec<f64> = rows
        .iter()
        .filter_map(|row| {
            let best = row.best_score?;
            let max = row.max_score.filter(|m| *m > 0).unwrap_or(DEFAULT_QUIZ_LENGTH);
            Some(best as f64 * 100.0 / max as f64)
        })
        .collect();

    if percents.is_empty() {
        return 0;
    }
    (percents.iter().sum::<f64>() / percents.len() as f64).round() as i32
}

/// Evaluates the prerequisites against the chapters of a technology.
pub async fn check_prerequisites<C: ConnectionTrait>(
    db: &C,
    user_id: i64,
    technology_id: i64,
    chapters: &[chapter::Model],
    now: DateTime<Utc>,
    policy: &ExamPolicy,
) -> GamificationResult<Prerequisites> {
    let chapter_ids: Vec<i64> = chapters.iter().map(|c| c.id).collect();
    let rows = user_progress::Model::for_user_and_chapters(db, user_id, &chapter_ids).await?;

    let chapters_incomplete = chapters
        .iter()
        .filter(|c| !rows.iter().any(|r| r.chapter_id == c.id && r.completed))
        .map(|c| IncompleteChapter {
            id: c.id,
            title: c.title.clone(),
        })
        .collect();

    let since = now - policy.attempt_window;
    let attempts_this_week =
        exam_attempt::Model::count_started_since(db, user_id, technology_id, since).await?;

    Ok(Prerequisites {
        chapters_incomplete,
        average_score: average_best_percent(&rows),
        required_average: policy.required_average,
        attempts_this_week,
        max_attempts: policy.max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(best: Option<i32>, max: Option<i32>) -> user_progress::Model {
        user_progress::Model {
            id: 0,
            user_id: 1,
            chapter_id: 1,
            completed: true,
            score: best,
            best_score: best,
            max_score: max,
            attempts: 1,
            xp_earned: 0,
            fastest_perfect_seconds: None,
            completed_at: None,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_average_skips_unscored_chapters() {
        let rows = vec![row(Some(5), Some(5)), row(Some(3), Some(5)), row(None, None)];
        assert_eq!(average_best_percent(&rows), 80);
    }

    #[test]
    fn test_average_defaults_to_five_questions() {
        assert_eq!(average_best_percent(&[row(Some(4), None)]), 80);
        assert_eq!(average_best_percent(&[]), 0);
    }

    #[test]
    fn test_each_condition_blocks() {
        let ok = Prerequisites {
            chapters_incomplete: vec![],
            average_score: 80,
            required_average: 80,
            attempts_this_week: 2,
            max_attempts: 3,
        };
        assert!(ok.is_met());
        assert!(!Prerequisites { average_score: 79, ..ok.clone() }.is_met());
        assert!(!Prerequisites { attempts_this_week: 3, ..ok.clone() }.is_met());
        assert!(
            !Prerequisites {
                chapters_incomplete: vec![IncompleteChapter { id: 1, title: "Intro".into() }],
                ..ok
            }
            .is_met()
        );
    }
}
