//! Exam question selection.

use std::collections::BTreeMap;

use rand::Rng;
use rand::seq::SliceRandom;

/// Picks `target` questions from `pool`.
///
/// One question is drawn from every chapter first so each topic is covered,
/// the remaining slots are filled from what is left without replacement, and
/// the final order is shuffled. When there are more chapters than slots the
/// shuffled selection is truncated to `target`.
///
/// Returns `None` when the pool holds fewer than `target` questions.
pub fn select_questions<T, R, F>(pool: Vec<T>, chapter_of: F, target: usize, rng: &mut R) -> Option<Vec<T>>
where
    R: Rng + ?Sized,
    F: Fn(&T) -> i64,
{
    if pool.len() < target {
        return None;
    }

    let mut by_chapter: BTreeMap<i64, Vec<T>> = BTreeMap::new();
    for question in pool {
        by_chapter.entry(chapter_of(&question)).or_default().push(question);
    }

    let mut selected = Vec::with_capacity(target);
    let mut remaining = Vec::new();
    for (_, mut questions) in by_chapter {
        questions.shuffle(rng);
        let mut iter = questions.into_iter();
        if let Some(pick) = iter.next() {
            selected.push(pick);
        }
        remaining.extend(iter);
    }

    remaining.shuffle(rng);
    let missing = target.saturating_sub(selected.len());
    selected.extend(remaining.into_iter().take(missing));

    selected.shuffle(rng);
    selected.truncate(target);
    Some(selected)
}
