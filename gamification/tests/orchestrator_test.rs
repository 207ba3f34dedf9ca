mod helpers;

use chrono::Duration;
use db::models::badge::{self, BadgeRarity, NewBadge};
use db::models::challenge::{self, NewChallenge};
use db::models::xp_event::{self, XpSource};
use db::models::{profile, user_progress, user_streak};
use gamification::{GamificationError, GamificationEvent, QuizCompletion, XpGrant};
use helpers::{complete_chapters, make_engine, make_technology, make_user};

#[tokio::test]
async fn test_first_course_grants_xp_then_starts_streak() {
    let (engine, _clock) = make_engine().await;
    let user = make_user(&engine, "alice").await;
    let (_, chapters) = make_technology(&engine, "rust", 1, 5).await;

    let events = engine.on_course_complete(user.id, chapters[0].id).await.unwrap();

    assert_eq!(
        events,
        vec![
            GamificationEvent::Xp { amount: 50 },
            GamificationEvent::Streak { streak_days: 1 },
        ]
    );
    let profile = profile::Model::find_by_id(engine.db(), user.id).await.unwrap().unwrap();
    assert_eq!(profile.xp_total, 50);
    assert_eq!(profile.current_level, 1);
}

#[tokio::test]
async fn test_perfect_quiz_crossing_a_threshold_levels_up() {
    let (engine, _clock) = make_engine().await;
    let user = make_user(&engine, "bob").await;
    let (_, chapters) = make_technology(&engine, "rust", 1, 5).await;

    engine
        .grant_xp(&XpGrant::new(user.id, 180, XpSource::Course))
        .await
        .unwrap();

    let quiz = QuizCompletion::new(user.id, chapters[0].id, 5, 5);
    let events = engine.on_quiz_complete(&quiz).await.unwrap();

    assert_eq!(
        events,
        vec![
            GamificationEvent::Xp { amount: 230 },
            GamificationEvent::LevelUp { new_level: 2, new_title: "Apprenti".into() },
            GamificationEvent::Streak { streak_days: 1 },
        ]
    );
    let profile = profile::Model::find_by_id(engine.db(), user.id).await.unwrap().unwrap();
    assert_eq!(profile.xp_total, 410);
    assert_eq!(profile.current_level, 2);
}

#[tokio::test]
async fn test_seventh_day_pays_the_milestone_bonus() {
    let (engine, _clock) = make_engine().await;
    let user = make_user(&engine, "carol").await;
    let (_, chapters) = make_technology(&engine, "rust", 1, 5).await;
    let yesterday = engine.today() - Duration::days(1);

    user_streak::Model::create(engine.db(), user.id, 6, Some(yesterday), 0, engine.now())
        .await
        .unwrap();

    let events = engine.on_course_complete(user.id, chapters[0].id).await.unwrap();

    assert_eq!(
        events,
        vec![
            GamificationEvent::Xp { amount: 50 },
            GamificationEvent::Streak { streak_days: 7 },
            GamificationEvent::Xp { amount: 50 },
        ]
    );
    let streak = user_streak::Model::find(engine.db(), user.id).await.unwrap().unwrap();
    assert_eq!(streak.current_streak, 7);
    assert_eq!(streak.longest_streak, 7);
}

#[tokio::test]
async fn test_second_activity_same_day_leaves_streak_alone() {
    let (engine, clock) = make_engine().await;
    let user = make_user(&engine, "dave").await;
    let (_, chapters) = make_technology(&engine, "rust", 1, 5).await;

    engine.on_course_complete(user.id, chapters[0].id).await.unwrap();
    clock.advance(Duration::hours(3));
    let events = engine.on_course_complete(user.id, chapters[0].id).await.unwrap();

    assert_eq!(events, vec![GamificationEvent::Xp { amount: 50 }]);
}

#[tokio::test]
async fn test_missed_day_consumes_a_freeze_then_resets_without_one() {
    let (engine, clock) = make_engine().await;
    let user = make_user(&engine, "erin").await;
    let (_, chapters) = make_technology(&engine, "rust", 1, 5).await;
    let two_days_ago = engine.today() - Duration::days(2);

    user_streak::Model::create(engine.db(), user.id, 10, Some(two_days_ago), 0, engine.now())
        .await
        .unwrap();
    engine.add_freezes(user.id, 1).await.unwrap();

    let events = engine.on_course_complete(user.id, chapters[0].id).await.unwrap();
    assert_eq!(
        events,
        vec![
            GamificationEvent::Xp { amount: 75 },
            GamificationEvent::Streak { streak_days: 11 },
        ]
    );
    let streak = user_streak::Model::find(engine.db(), user.id).await.unwrap().unwrap();
    assert_eq!(streak.freeze_count, 0);

    clock.advance(Duration::days(2));
    let events = engine.on_course_complete(user.id, chapters[0].id).await.unwrap();
    assert_eq!(
        events,
        vec![
            GamificationEvent::Xp { amount: 75 },
            GamificationEvent::Streak { streak_days: 1 },
        ]
    );
    let streak = user_streak::Model::find(engine.db(), user.id).await.unwrap().unwrap();
    assert_eq!(streak.current_streak, 1);
    assert_eq!(streak.longest_streak, 11);
}

#[tokio::test]
async fn test_badges_unlock_once_including_cascades() {
    let (engine, _clock) = make_engine().await;
    let user = make_user(&engine, "frank").await;
    let (_, chapters) = make_technology(&engine, "rust", 1, 5).await;

    badge::Model::create(
        engine.db(),
        NewBadge {
            slug: "first_quiz",
            name: "Premier quiz",
            description: "Finish a quiz",
            rarity: BadgeRarity::Common,
            condition_type: "quizzes_completed",
            condition_value: 1,
            xp_reward: 200,
        },
    )
    .await
    .unwrap();
    badge::Model::create(
        engine.db(),
        NewBadge {
            slug: "level_2",
            name: "Apprenti",
            description: "Reach level 2",
            rarity: BadgeRarity::Rare,
            condition_type: "level_reached",
            condition_value: 2,
            xp_reward: 0,
        },
    )
    .await
    .unwrap();

    let quiz = QuizCompletion::new(user.id, chapters[0].id, 3, 5);
    let outcome = engine.save_quiz_progress(&quiz).await.unwrap();

    let badges: Vec<&str> = outcome
        .events
        .iter()
        .filter_map(|e| match e {
            GamificationEvent::Badge { slug, .. } => Some(slug.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(badges, vec!["first_quiz", "level_2"]);
    assert!(outcome.events.contains(&GamificationEvent::LevelUp {
        new_level: 2,
        new_title: "Apprenti".into(),
    }));

    assert!(engine.check_badges(user.id).await.unwrap().is_empty());

    let again = engine.save_quiz_progress(&quiz).await.unwrap();
    assert!(
        !again
            .events
            .iter()
            .any(|e| matches!(e, GamificationEvent::Badge { .. }))
    );
}

#[tokio::test]
async fn test_unknown_badge_condition_never_unlocks() {
    let (engine, _clock) = make_engine().await;
    let user = make_user(&engine, "gina").await;
    let (_, chapters) = make_technology(&engine, "rust", 1, 5).await;

    badge::Model::create(
        engine.db(),
        NewBadge {
            slug: "mystery",
            name: "Mystery",
            description: "Unmapped condition",
            rarity: BadgeRarity::Legendary,
            condition_type: "moon_phase",
            condition_value: 0,
            xp_reward: 1000,
        },
    )
    .await
    .unwrap();

    let events = engine.on_course_complete(user.id, chapters[0].id).await.unwrap();
    assert!(!events.iter().any(|e| matches!(e, GamificationEvent::Badge { .. })));
}

#[tokio::test]
async fn test_challenge_completes_once_and_pays_its_reward() {
    let (engine, _clock) = make_engine().await;
    let user = make_user(&engine, "hugo").await;
    let (_, chapters) = make_technology(&engine, "rust", 2, 5).await;
    let today = engine.today();

    let weekly = challenge::Model::create(
        engine.db(),
        NewChallenge {
            title: "Deux cours",
            description: "Finish two courses this week",
            condition_type: "courses_completed",
            condition_value: 2,
            xp_reward: 60,
            start_date: today - Duration::days(1),
            end_date: today + Duration::days(5),
        },
    )
    .await
    .unwrap();

    let first = engine.on_course_complete(user.id, chapters[0].id).await.unwrap();
    assert!(!first.iter().any(|e| matches!(e, GamificationEvent::ChallengeCompleted { .. })));

    let second = engine.on_course_complete(user.id, chapters[1].id).await.unwrap();
    assert_eq!(
        second,
        vec![
            GamificationEvent::Xp { amount: 50 },
            GamificationEvent::ChallengeCompleted {
                challenge_id: weekly.id,
                title: "Deux cours".into(),
                xp_reward: 60,
            },
            GamificationEvent::Xp { amount: 60 },
        ]
    );

    let third = engine.on_course_complete(user.id, chapters[1].id).await.unwrap();
    assert!(!third.iter().any(|e| matches!(e, GamificationEvent::ChallengeCompleted { .. })));

    let challenge_xp: i64 = xp_event::Model::for_user(engine.db(), user.id)
        .await
        .unwrap()
        .iter()
        .filter(|e| e.source == XpSource::Challenge)
        .map(|e| e.amount)
        .sum();
    assert_eq!(challenge_xp, 60);
}

#[tokio::test]
async fn test_quiz_progress_latches_completion_and_tracks_xp() {
    let (engine, clock) = make_engine().await;
    let user = make_user(&engine, "iris").await;
    let (_, chapters) = make_technology(&engine, "rust", 1, 5).await;
    let chapter_id = chapters[0].id;

    let outcome = engine
        .save_quiz_progress(&QuizCompletion::new(user.id, chapter_id, 3, 5))
        .await
        .unwrap();
    assert!(outcome.passed);
    assert_eq!(outcome.xp_gained, 90);
    assert_eq!(outcome.best_score, 3);

    clock.advance(Duration::hours(1));
    let outcome = engine
        .save_quiz_progress(&QuizCompletion::new(user.id, chapter_id, 1, 5))
        .await
        .unwrap();
    assert!(!outcome.passed);
    assert_eq!(outcome.xp_gained, 50);
    assert_eq!(outcome.best_score, 3);

    let row = user_progress::Model::find(engine.db(), user.id, chapter_id)
        .await
        .unwrap()
        .unwrap();
    assert!(row.completed);
    assert_eq!(row.attempts, 2);
    assert_eq!(row.xp_earned, 140);
}

#[tokio::test]
async fn test_malformed_inputs_are_rejected() {
    let (engine, _clock) = make_engine().await;
    let user = make_user(&engine, "jack").await;
    let (_, chapters) = make_technology(&engine, "rust", 1, 5).await;

    let err = engine
        .on_quiz_complete(&QuizCompletion::new(user.id, chapters[0].id, 6, 5))
        .await
        .unwrap_err();
    assert!(matches!(err, GamificationError::InvalidInput(_)));

    let err = engine.on_course_complete(user.id, 9_999).await.unwrap_err();
    assert!(matches!(err, GamificationError::ChapterNotFound(9_999)));

    assert!(
        xp_event::Model::for_user(engine.db(), user.id)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_grant_for_missing_profile_fails_without_writing() {
    let (engine, _clock) = make_engine().await;

    let err = engine
        .grant_xp(&XpGrant::new(404, 10, XpSource::Quiz))
        .await
        .unwrap_err();
    assert!(matches!(err, GamificationError::ProfileNotFound(404)));
    assert_eq!(xp_event::Model::total_for_user(engine.db(), 404).await.unwrap(), 0);
}

#[tokio::test]
async fn test_reconcile_rebuilds_a_stale_cache() {
    let (engine, _clock) = make_engine().await;
    let user = make_user(&engine, "kate").await;
    let (_, chapters) = make_technology(&engine, "rust", 2, 5).await;

    complete_chapters(&engine, user.id, &chapters).await;
    engine
        .grant_xp(&XpGrant::new(user.id, 1_200, XpSource::Course))
        .await
        .unwrap();
    profile::Model::write_cache(engine.db(), user.id, 3, 1, "Curieux", engine.now())
        .await
        .unwrap();

    let fixed = engine.reconcile_profile(user.id).await.unwrap();
    assert_eq!(fixed.xp_total, 1_200);
    assert_eq!(fixed.current_level, 4);
    assert_eq!(fixed.current_title, "Pratiquant");
}
