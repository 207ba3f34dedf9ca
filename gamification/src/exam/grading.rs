//! Exam grading rules.

use chrono::{DateTime, Utc};
use db::models::certification::Mention;

use crate::config::ExamPolicy;

/// Value a missing answer is recorded as; it never matches an option.
pub const NO_ANSWER: i32 = -1;

/// One answer per question: missing entries, trailing gaps and negative
/// indexes all become [`NO_ANSWER`]. Extra answers are dropped.
pub fn normalize_answers(answers: &[Option<i32>], question_count: usize) -> Vec<i32> {
    (0..question_count)
        .map(|i| match answers.get(i).copied().flatten() {
            Some(index) if index >= 0 => index,
            _ => NO_ANSWER,
        })
        .collect()
}

/// Whether `answer` picks the option at `key`. A missing answer is always wrong.
pub fn is_correct(answer: i32, key: i32) -> bool {
    answer != NO_ANSWER && answer == key
}

/// Number of answers equal to their key.
pub fn score(answers: &[i32], keys: &[i32]) -> i32 {
    answers
        .iter()
        .zip(keys)
        .filter(|&(&answer, &key)| is_correct(answer, key))
        .count() as i32
}

/// Rounded percentage of `score` over `total`; zero for an empty exam.
pub fn percentage(score: i32, total: i32) -> i32 {
    if total <= 0 {
        return 0;
    }
    (score as f64 * 100.0 / total as f64).round() as i32
}

pub fn is_passing(percent: i32, policy: &ExamPolicy) -> bool {
    percent >= policy.pass_percent
}

/// Mention for a passing percentage.
pub fn mention_for(percent: i32, policy: &ExamPolicy) -> Mention {
    if percent >= policy.exceptional_percent {
        Mention::Exceptionnelle
    } else if percent >= policy.very_good_percent {
        Mention::TresBien
    } else {
        Mention::Bien
    }
}

/// Last instant a submission is accepted, grace included.
pub fn submission_deadline(started_at: DateTime<Utc>, policy: &ExamPolicy) -> DateTime<Utc> {
    started_at + policy.duration + policy.grace
}

pub fn is_expired(started_at: DateTime<Utc>, now: DateTime<Utc>, policy: &ExamPolicy) -> bool {
    now > submission_deadline(started_at, policy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_score_counts_matches_and_ignores_missing() {
        let keys = vec![0, 1, 2, 3, 0, 1, 2, 3, 0, 1, 2, 3, 0, 1, 2];
        let mut submitted: Vec<Option<i32>> = keys.iter().map(|k| Some(*k)).collect();
        submitted[0] = None;
        submitted[5] = Some(3);
        submitted.truncate(13);

        let answers = normalize_answers(&submitted, keys.len());
        assert_eq!(answers.len(), 15);
        assert_eq!(answers[0], NO_ANSWER);
        assert_eq!(answers[14], NO_ANSWER);
        assert_eq!(score(&answers, &keys), 11);
    }

    #[test]
    fn test_negative_answers_never_match() {
        let answers = normalize_answers(&[Some(-1), Some(-7)], 2);
        assert_eq!(score(&answers, &[-1, -7]), 0);
        assert_eq!(score(&[NO_ANSWER, NO_ANSWER], &[NO_ANSWER, 2]), 0);
        assert!(!is_correct(NO_ANSWER, NO_ANSWER));
        assert!(is_correct(0, 0));
    }

    #[test]
    fn test_pass_mark_and_mentions() {
        let policy = ExamPolicy::default();
        assert_eq!(percentage(10, 15), 67);
        assert!(!is_passing(percentage(10, 15), &policy));
        assert!(is_passing(percentage(11, 15), &policy));

        assert_eq!(mention_for(percentage(11, 15), &policy), Mention::Bien);
        assert_eq!(mention_for(percentage(13, 15), &policy), Mention::TresBien);
        assert_eq!(mention_for(percentage(15, 15), &policy), Mention::Exceptionnelle);
        assert_eq!(mention_for(95, &policy), Mention::Exceptionnelle);
        assert_eq!(mention_for(85, &policy), Mention::TresBien);
    }

    #[test]
    fn test_deadline_includes_grace() {
        let policy = ExamPolicy::default();
        let start = Utc::now();
        assert!(!is_expired(start, start + Duration::minutes(20), &policy));
        assert!(!is_expired(start, start + Duration::seconds(20 * 60 + 30), &policy));
        assert!(is_expired(start, start + Duration::seconds(20 * 60 + 31), &policy));
        assert!(is_expired(start, start + Duration::minutes(21), &policy));
    }
}
