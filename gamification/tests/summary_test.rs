mod helpers;

use chrono::Duration;
use db::models::badge::{self, BadgeRarity, NewBadge};
use db::models::certification::Mention;
use db::models::challenge::{self, NewChallenge};
use db::models::exam_attempt_question;
use db::models::xp_event::XpSource;
use gamification::summary;
use gamification::{ExamPreparation, ExamSubmission, QuizCompletion};
use helpers::{complete_chapters, make_engine, make_technology, make_user};

#[tokio::test]
async fn test_user_stats_reflect_activity() {
    let (engine, _clock) = make_engine().await;
    let user = make_user(&engine, "alice").await;
    let (_, chapters) = make_technology(&engine, "rust", 2, 5).await;

    engine
        .save_quiz_progress(&QuizCompletion::new(user.id, chapters[0].id, 5, 5))
        .await
        .unwrap();
    engine
        .save_quiz_progress(&QuizCompletion::new(user.id, chapters[1].id, 2, 5))
        .await
        .unwrap();

    let stats = engine.user_stats(user.id).await.unwrap();
    assert_eq!(stats.username, "alice");
    assert_eq!(stats.xp_total, 230 + 70);
    assert_eq!(stats.level.level, 2);
    assert_eq!(stats.current_streak, 1);
    assert_eq!(stats.courses_completed, 1);
    assert_eq!(stats.quizzes_completed, 2);
    assert_eq!(stats.perfect_quizzes, 1);
    assert_eq!(stats.badge_count, 0);
    assert_eq!(stats.certifications, 0);
}

#[tokio::test]
async fn test_badges_and_history_are_most_recent_first() {
    let (engine, clock) = make_engine().await;
    let user = make_user(&engine, "bob").await;
    let (_, chapters) = make_technology(&engine, "rust", 2, 5).await;

    for (slug, threshold) in [("one_course", 1), ("two_courses", 2)] {
        badge::Model::create(
            engine.db(),
            NewBadge {
                slug,
                name: slug,
                description: "Courses completed",
                rarity: BadgeRarity::Common,
                condition_type: "courses_completed",
                condition_value: threshold,
                xp_reward: 0,
            },
        )
        .await
        .unwrap();
    }

    engine
        .save_quiz_progress(&QuizCompletion::new(user.id, chapters[0].id, 4, 5))
        .await
        .unwrap();
    clock.advance(Duration::minutes(10));
    engine
        .save_quiz_progress(&QuizCompletion::new(user.id, chapters[1].id, 4, 5))
        .await
        .unwrap();

    let badges = summary::user_badges(engine.db(), user.id).await.unwrap();
    let slugs: Vec<&str> = badges.iter().map(|b| b.slug.as_str()).collect();
    assert_eq!(slugs, vec!["two_courses", "one_course"]);

    let history = summary::xp_history(engine.db(), user.id, 1).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].source, XpSource::Quiz);
    assert_eq!(history[0].created_at, engine.now());
}

#[tokio::test]
async fn test_active_challenges_show_progress() {
    let (engine, _clock) = make_engine().await;
    let user = make_user(&engine, "carol").await;
    let (_, chapters) = make_technology(&engine, "rust", 1, 5).await;
    let today = engine.today();

    challenge::Model::create(
        engine.db(),
        NewChallenge {
            title: "Cinq quiz",
            description: "Finish five quizzes",
            condition_type: "quizzes_completed",
            condition_value: 5,
            xp_reward: 100,
            start_date: today,
            end_date: today + Duration::days(6),
        },
    )
    .await
    .unwrap();
    challenge::Model::create(
        engine.db(),
        NewChallenge {
            title: "Finished",
            description: "Already over",
            condition_type: "quizzes_completed",
            condition_value: 1,
            xp_reward: 100,
            start_date: today - Duration::days(10),
            end_date: today - Duration::days(3),
        },
    )
    .await
    .unwrap();

    engine
        .on_quiz_complete(&QuizCompletion::new(user.id, chapters[0].id, 3, 5))
        .await
        .unwrap();

    let active = engine.active_challenges(user.id).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].title, "Cinq quiz");
    assert_eq!(active[0].progress, 1);
    assert_eq!(active[0].target, 5);
    assert!(!active[0].completed);
}

#[tokio::test]
async fn test_certificate_verification() {
    let (engine, _clock) = make_engine().await;
    let user = make_user(&engine, "dave").await;
    let (tech, chapters) = make_technology(&engine, "rust", 4, 5).await;
    complete_chapters(&engine, user.id, &chapters).await;

    let ExamPreparation::Ready { attempt_id, .. } =
        engine.prepare_exam(user.id, tech.id).await.unwrap()
    else {
        panic!("expected a ready exam");
    };
    let mut answers: Vec<Option<i32>> =
        exam_attempt_question::Model::for_attempt(engine.db(), attempt_id)
            .await
            .unwrap()
            .iter()
            .map(|q| Some(q.correct_index))
            .collect();
    answers[0] = Some(-1);
    answers[1] = None;
    answers[2] = Some(9);

    let ExamSubmission::Graded { result, .. } =
        engine.submit_exam(user.id, attempt_id, &answers).await.unwrap()
    else {
        panic!("expected a graded exam");
    };
    let cert_number = result.cert_number.unwrap();

    let view = summary::verify_certificate(engine.db(), &cert_number)
        .await
        .unwrap()
        .expect("issued certificates verify");
    assert_eq!(view.holder, "dave");
    assert_eq!(view.technology, "RUST");
    assert_eq!((view.score, view.total, view.percentage), (12, 15, 80));
    assert_eq!(view.mention, Mention::Bien);
    assert_eq!(
        view.verification_url,
        format!("{}/verify/{cert_number}", util::config::site_url())
    );

    let held = summary::certifications_for_user(engine.db(), user.id).await.unwrap();
    assert_eq!(held.len(), 1);
    assert_eq!(held[0].technology_name, "RUST");

    assert!(
        summary::verify_certificate(engine.db(), "CERT-1999-NOPE")
            .await
            .unwrap()
            .is_none()
    );
}
