//! Fixtures shared by the gamification integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use db::models::user_progress::{self, QuizAttempt};
use db::models::{chapter, profile, quiz_question, technology};
use db::test_utils::setup_test_db;
use gamification::{EngineConfig, GamificationEngine, ManualClock};

pub const SEED: u64 = 42;

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

/// Monday morning, outside the night window.
pub fn start_time() -> DateTime<Utc> {
    at(2026, 3, 2, 10, 0)
}

/// Engine over a fresh in-memory database, a manual clock and a seeded RNG.
pub async fn make_engine() -> (GamificationEngine, Arc<ManualClock>) {
    let db = setup_test_db().await;
    let clock = Arc::new(ManualClock::new(start_time()));
    let config = EngineConfig {
        rng_seed: Some(SEED),
        ..EngineConfig::default()
    };
    let engine = GamificationEngine::with_clock(db, config, clock.clone());
    (engine, clock)
}

pub async fn make_user(engine: &GamificationEngine, username: &str) -> profile::Model {
    profile::Model::create(engine.db(), username, None, engine.now())
        .await
        .unwrap()
}

/// A technology with `chapters` chapters of `per_chapter` questions each.
///
/// Question `p` of a chapter has its answer at `p % 4`.
pub async fn make_technology(
    engine: &GamificationEngine,
    slug: &str,
    chapters: usize,
    per_chapter: usize,
) -> (technology::Model, Vec<chapter::Model>) {
    let db = engine.db();
    let tech = technology::Model::create(db, slug, &slug.to_uppercase(), 1)
        .await
        .unwrap();

    let mut created = Vec::new();
    for c in 0..chapters {
        let ch = chapter::Model::create(db, tech.id, &format!("{slug} chapter {c}"), c as i32)
            .await
            .unwrap();
        for p in 0..per_chapter {
            let options: Vec<String> = (0..4).map(|o| format!("option {o}")).collect();
            quiz_question::Model::create(
                db,
                ch.id,
                p as i32,
                &format!("{slug} {c}.{p}?"),
                &options,
                (p % 4) as i32,
                "Because.",
            )
            .await
            .unwrap();
        }
        created.push(ch);
    }
    (tech, created)
}

/// Records a perfect passing quiz on every chapter.
pub async fn complete_chapters(
    engine: &GamificationEngine,
    user_id: i64,
    chapters: &[chapter::Model],
) {
    for ch in chapters {
        let attempt = QuizAttempt {
            score: 5,
            total: 5,
            passed: true,
            elapsed_seconds: None,
        };
        user_progress::Model::record_quiz_attempt(engine.db(), user_id, ch.id, attempt, engine.now())
            .await
            .unwrap();
    }
}
