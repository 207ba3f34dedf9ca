//! Certification exams.
//!
//! An exam moves through eligibility, preparation (the attempt and its question
//! snapshot are stored before anything is shown), submission and grading. A
//! first passing grade per technology issues a certification.

pub mod certification;
pub mod eligibility;
pub mod grading;
pub mod selection;

use chrono::{DateTime, Utc};
use db::models::certification::Mention;
use db::models::exam_attempt::{self, ExamStatus};
use db::models::exam_attempt_question::{self, NewAttemptQuestion};
use db::models::xp_event::XpSource;
use db::models::{chapter, quiz_question, technology};
use sea_orm::{DatabaseTransaction, EntityTrait, TransactionTrait};
use serde::Serialize;
use tracing::{info, warn};

use crate::engine::GamificationEngine;
use crate::error::{GamificationError, GamificationResult};
use crate::events::GamificationEvent;
use crate::ledger::{self, XpGrant};

pub use certification::{Issuance, PassingAttempt, generate_cert_number, verification_path};
pub use eligibility::{IncompleteChapter, Prerequisites};

/// What the candidate sees of a question while the exam runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExamQuestionView {
    pub index: usize,
    pub question: String,
    pub options: Vec<String>,
    pub chapter_title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ExamPreparation {
    Ready {
        attempt_id: i64,
        questions: Vec<ExamQuestionView>,
        /// Deadline shown to the candidate, grace excluded.
        expires_at: DateTime<Utc>,
    },
    NotEligible(Prerequisites),
    InsufficientQuestions {
        available: usize,
        required: usize,
    },
}

/// A question disclosed after grading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradedQuestion {
    pub index: usize,
    pub question: String,
    pub options: Vec<String>,
    pub chapter_title: String,
    pub correct_index: i32,
    pub explanation: String,
    pub answer: i32,
    pub correct: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExamResult {
    pub attempt_id: i64,
    pub technology_id: i64,
    pub passed: bool,
    pub score: i32,
    pub total: i32,
    pub percentage: i32,
    pub mention: Option<Mention>,
    /// Set only when this submission issued the certification.
    pub cert_number: Option<String>,
    pub questions: Vec<GradedQuestion>,
    pub answers: Vec<i32>,
    pub attempts_this_week: u64,
    pub max_attempts: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ExamSubmission {
    Graded {
        result: ExamResult,
        events: Vec<GamificationEvent>,
    },
    /// Submitted after the deadline; the attempt is closed as expired.
    Expired {
        attempt_id: i64,
        deadline: DateTime<Utc>,
    },
    /// The attempt was already closed by an earlier submission.
    AlreadyGraded {
        attempt_id: i64,
        status: ExamStatus,
    },
}

/// What closing a graded attempt produced.
#[derive(Debug, Default)]
struct Closing {
    mention: Option<Mention>,
    cert_number: Option<String>,
    events: Vec<GamificationEvent>,
}

impl GamificationEngine {
    /// Itemised prerequisite state for a technology exam.
    pub async fn check_eligibility(
        &self,
        user_id: i64,
        technology_id: i64,
    ) -> GamificationResult<Prerequisites> {
        let chapters = chapter::Model::for_technology(self.db(), technology_id).await?;
        eligibility::check_prerequisites(
            self.db(),
            user_id,
            technology_id,
            &chapters,
            self.now(),
            &self.config().exam,
        )
        .await
    }

    /// Opens an exam attempt and returns the questions without their answers.
    pub async fn prepare_exam(
        &self,
        user_id: i64,
        technology_id: i64,
    ) -> GamificationResult<ExamPreparation> {
        technology::Model::find_by_id(self.db(), technology_id)
            .await?
            .ok_or(GamificationError::TechnologyNotFound(technology_id))?;

        let policy = &self.config().exam;
        let now = self.now();
        let chapters = chapter::Model::for_technology(self.db(), technology_id).await?;

        let prerequisites = eligibility::check_prerequisites(
            self.db(),
            user_id,
            technology_id,
            &chapters,
            now,
            policy,
        )
        .await?;
        if !prerequisites.is_met() {
            info!(user_id, technology_id, "Exam prerequisites not met");
            return Ok(ExamPreparation::NotEligible(prerequisites));
        }

        let chapter_ids: Vec<i64> = chapters.iter().map(|c| c.id).collect();
        let pool = quiz_question::Model::for_chapters(self.db(), &chapter_ids).await?;
        let available = pool.len();

        let Some(selected) = self.with_rng(|rng| {
            selection::select_questions(pool, |q| q.chapter_id, policy.question_count, rng)
        }) else {
            warn!(user_id, technology_id, available, "Not enough questions for an exam");
            return Ok(ExamPreparation::InsufficientQuestions {
                available,
                required: policy.question_count,
            });
        };

        let snapshot: Vec<NewAttemptQuestion> = selected
            .into_iter()
            .map(|q| NewAttemptQuestion {
                chapter_title: chapters
                    .iter()
                    .find(|c| c.id == q.chapter_id)
                    .map(|c| c.title.clone())
                    .unwrap_or_default(),
                chapter_id: q.chapter_id,
                question: q.question,
                options: q.options,
                correct_index: q.correct_index,
                explanation: q.explanation,
            })
            .collect();

        let questions = snapshot
            .iter()
            .enumerate()
            .map(|(index, q)| {
                Ok(ExamQuestionView {
                    index,
                    question: q.question.clone(),
                    options: serde_json::from_value(q.options.clone())?,
                    chapter_title: q.chapter_title.clone(),
                })
            })
            .collect::<Result<Vec<_>, serde_json::Error>>()?;

        let txn = self.db().begin().await?;
        let attempt =
            exam_attempt::Model::start(&txn, user_id, technology_id, snapshot.len() as i32, now)
                .await?;
        exam_attempt_question::Model::store_all(&txn, attempt.id, snapshot).await?;
        txn.commit().await?;

        info!(user_id, technology_id, attempt_id = attempt.id, "Exam attempt started");

        Ok(ExamPreparation::Ready {
            attempt_id: attempt.id,
            questions,
            expires_at: now + policy.duration,
        })
    }

    /// Grades a submitted attempt.
    ///
    /// `answers[i]` is the chosen option of question `i`; `None` means unanswered.
    pub async fn submit_exam(
        &self,
        user_id: i64,
        attempt_id: i64,
        answers: &[Option<i32>],
    ) -> GamificationResult<ExamSubmission> {
        let attempt = exam_attempt::Model::find_for_user(self.db(), attempt_id, user_id)
            .await?
            .ok_or(GamificationError::AttemptNotFound(attempt_id))?;

        if attempt.status != ExamStatus::InProgress {
            return Ok(ExamSubmission::AlreadyGraded {
                attempt_id,
                status: attempt.status,
            });
        }

        let policy = &self.config().exam;
        let now = self.now();

        if grading::is_expired(attempt.started_at, now, policy) {
            let closed =
                exam_attempt::Model::close(self.db(), attempt_id, ExamStatus::Expired, 0, false, now)
                    .await?;
            if !closed {
                return self.already_closed(attempt_id).await;
            }
            warn!(user_id, attempt_id, "Exam submitted after the deadline");
            return Ok(ExamSubmission::Expired {
                attempt_id,
                deadline: grading::submission_deadline(attempt.started_at, policy),
            });
        }

        let stored = exam_attempt_question::Model::for_attempt(self.db(), attempt_id).await?;
        let keys: Vec<i32> = stored.iter().map(|q| q.correct_index).collect();
        let normalized = grading::normalize_answers(answers, stored.len());
        let score = grading::score(&normalized, &keys);
        let total = stored.len() as i32;
        let percentage = grading::percentage(score, total);
        let passed = grading::is_passing(percentage, policy);

        let txn = self.db().begin().await?;
        let closing = match self
            .close_and_certify(&txn, &attempt, score, total, percentage, passed, now)
            .await
        {
            Ok(Some(closing)) => {
                txn.commit().await?;
                closing
            }
            Ok(None) => {
                txn.rollback().await?;
                return self.already_closed(attempt_id).await;
            }
            Err(e) => {
                txn.rollback().await?;
                warn!(user_id, attempt_id, error = %e, "Exam grading rolled back");
                return Err(e);
            }
        };

        info!(user_id, attempt_id, score, total, passed, "Exam graded");

        let Closing {
            mention,
            cert_number,
            mut events,
        } = closing;
        if passed {
            events.extend(self.after_activity(user_id).await?);
        }

        let questions = stored
            .into_iter()
            .zip(&normalized)
            .enumerate()
            .map(|(index, (q, &answer))| {
                Ok(GradedQuestion {
                    index,
                    options: q.option_list()?,
                    correct: grading::is_correct(answer, q.correct_index),
                    question: q.question,
                    chapter_title: q.chapter_title,
                    correct_index: q.correct_index,
                    explanation: q.explanation,
                    answer,
                })
            })
            .collect::<Result<Vec<_>, serde_json::Error>>()?;

        let attempts_this_week = exam_attempt::Model::count_started_since(
            self.db(),
            user_id,
            attempt.technology_id,
            now - policy.attempt_window,
        )
        .await?;

        Ok(ExamSubmission::Graded {
            result: ExamResult {
                attempt_id,
                technology_id: attempt.technology_id,
                passed,
                score,
                total,
                percentage,
                mention,
                cert_number,
                questions,
                answers: normalized,
                attempts_this_week,
                max_attempts: policy.max_attempts,
            },
            events,
        })
    }

    /// Closes a graded attempt and, on a pass, issues the certification with
    /// its bonus. Everything runs on `txn`, so a failed issuance leaves the
    /// attempt open. `None` when another submission closed it first.
    async fn close_and_certify(
        &self,
        txn: &DatabaseTransaction,
        attempt: &exam_attempt::Model,
        score: i32,
        total: i32,
        percentage: i32,
        passed: bool,
        now: DateTime<Utc>,
    ) -> GamificationResult<Option<Closing>> {
        let closed =
            exam_attempt::Model::close(txn, attempt.id, ExamStatus::Graded, score, passed, now)
                .await?;
        if !closed {
            return Ok(None);
        }

        let mut closing = Closing::default();
        if !passed {
            return Ok(Some(closing));
        }

        let policy = &self.config().exam;
        let tier = grading::mention_for(percentage, policy);
        closing.mention = Some(tier);

        let passing = PassingAttempt {
            user_id: attempt.user_id,
            technology_id: attempt.technology_id,
            attempt_id: attempt.id,
            score,
            total,
            mention: tier,
        };
        let issuance = certification::issue(txn, passing, now, |year| {
            self.with_rng(|rng| generate_cert_number(year, rng))
        })
        .await?;

        if let Issuance::Issued(cert) = issuance {
            let grant =
                XpGrant::new(attempt.user_id, policy.certification_bonus, XpSource::Certification)
                    .with_ref(cert.cert_number.clone())
                    .with_key(format!("certification:{}", attempt.technology_id));
            closing.events = ledger::grant_xp(txn, &grant, now).await?;
            closing.cert_number = Some(cert.cert_number);
        }

        Ok(Some(closing))
    }

    async fn already_closed(&self, attempt_id: i64) -> GamificationResult<ExamSubmission> {
        let status = exam_attempt::Entity::find_by_id(attempt_id)
            .one(self.db())
            .await?
            .map(|a| a.status)
            .unwrap_or(ExamStatus::Graded);
        Ok(ExamSubmission::AlreadyGraded { attempt_id, status })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_result() -> ExamResult {
        ExamResult {
            attempt_id: 7,
            technology_id: 2,
            passed: true,
            score: 12,
            total: 15,
            percentage: 80,
            mention: Some(Mention::Bien),
            cert_number: Some("CERT-2026-AB12".into()),
            questions: Vec::new(),
            answers: vec![0; 15],
            attempts_this_week: 1,
            max_attempts: 3,
        }
    }

    #[test]
    fn test_submissions_serialize_with_outcome_tag() {
        let graded = serde_json::to_value(ExamSubmission::Graded {
            result: sample_result(),
            events: vec![GamificationEvent::Xp { amount: 300 }],
        })
        .unwrap();
        assert_eq!(graded["outcome"], "graded");
        assert_eq!(graded["result"]["mention"], "bien");
        assert_eq!(graded["events"][0]["type"], "xp");

        let expired = serde_json::to_value(ExamSubmission::Expired {
            attempt_id: 7,
            deadline: Utc.with_ymd_and_hms(2026, 3, 2, 10, 20, 30).unwrap(),
        })
        .unwrap();
        assert_eq!(expired["outcome"], "expired");
        assert_eq!(expired["attempt_id"], 7);

        let closed = serde_json::to_value(ExamSubmission::AlreadyGraded {
            attempt_id: 7,
            status: ExamStatus::Expired,
        })
        .unwrap();
        assert_eq!(closed["outcome"], "already_graded");
        assert_eq!(closed["status"], "expired");
    }

    #[test]
    fn test_preparations_serialize_with_outcome_tag() {
        let ready = serde_json::to_value(ExamPreparation::Ready {
            attempt_id: 1,
            questions: vec![ExamQuestionView {
                index: 0,
                question: "Which?".into(),
                options: vec!["a".into(), "b".into()],
                chapter_title: "Ownership".into(),
            }],
            expires_at: Utc.with_ymd_and_hms(2026, 3, 2, 10, 20, 0).unwrap(),
        })
        .unwrap();
        assert_eq!(ready["outcome"], "ready");
        assert!(ready["questions"][0].get("correct_index").is_none());

        let not_eligible = serde_json::to_value(ExamPreparation::NotEligible(Prerequisites {
            chapters_incomplete: vec![IncompleteChapter {
                id: 3,
                title: "Traits".into(),
            }],
            average_score: 55,
            required_average: 70,
            attempts_this_week: 0,
            max_attempts: 3,
        }))
        .unwrap();
        assert_eq!(not_eligible["outcome"], "not_eligible");
        assert_eq!(not_eligible["chapters_incomplete"][0]["title"], "Traits");
        assert_eq!(not_eligible["average_score"], 55);

        let short = serde_json::to_value(ExamPreparation::InsufficientQuestions {
            available: 10,
            required: 15,
        })
        .unwrap();
        assert_eq!(short["outcome"], "insufficient_questions");
        assert_eq!(short["available"], 10);
    }
}
