//! Proportional, quota-based sampling of questions across categories.

use std::cmp::Ordering;
use std::collections::HashMap;

use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};

use crate::model::Question;

/// Select `quota` questions from `questions`, keeping category proportions.
///
/// The per-category quota math is deterministic (largest-remainder
/// apportionment, ties broken by first-appearance order); only which items
/// are drawn within a category and the final ordering depend on `rng`.
///
/// Guarantees:
/// - never returns more than `min(quota, questions.len())` items
/// - never returns duplicates
/// - when `questions.len() >= quota`, every category contributes either the
///   floor or the ceiling of its ideal proportional share
///
/// When the pool is smaller than `quota` the whole pool is returned
/// shuffled; callers that require a full quota must validate the pool size
/// up front.
#[must_use]
pub fn select<R: Rng + ?Sized>(questions: &[Question], quota: usize, rng: &mut R) -> Vec<Question> {
    if quota == 0 || questions.is_empty() {
        return Vec::new();
    }
    if questions.len() <= quota {
        let mut all = questions.to_vec();
        all.shuffle(rng);
        return all;
    }

    let pools = group_by_category(questions);
    let counts: Vec<usize> = pools.iter().map(|(_, qs)| qs.len()).collect();
    let quotas = compute_quotas(&counts, quota);

    let mut selected: Vec<Question> = Vec::with_capacity(quota);
    for ((_, pool), &take) in pools.iter().zip(&quotas) {
        if take == 0 {
            continue;
        }
        selected.extend(pool.choose_multiple(rng, take).map(|q| (*q).clone()));
    }

    // Hide category grouping from the user.
    selected.shuffle(rng);
    selected.truncate(quota);
    selected
}

/// Group questions by category, preserving first-appearance order so the
/// remainder tie-break is reproducible.
fn group_by_category(questions: &[Question]) -> Vec<(&str, Vec<&Question>)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut pools: Vec<(&str, Vec<&Question>)> = Vec::new();

    for question in questions {
        match index.get(question.category()) {
            Some(&i) => pools[i].1.push(question),
            None => {
                index.insert(question.category(), pools.len());
                pools.push((question.category(), vec![question]));
            }
        }
    }
    pools
}

/// Largest-remainder apportionment of `quota` slots over category sizes.
///
/// Each quota starts at the floor of the category's ideal share; leftover
/// slots go to the largest fractional remainders (first appearance wins
/// ties). Quotas exceeding a category's size are capped and the shortfall
/// spread over categories with spare questions until absorbed or no spare
/// capacity remains.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn compute_quotas(counts: &[usize], quota: usize) -> Vec<usize> {
    let total: usize = counts.iter().sum();
    if total == 0 {
        return vec![0; counts.len()];
    }

    let mut quotas = vec![0_usize; counts.len()];
    let mut fractions = vec![0_f64; counts.len()];
    for (i, &count) in counts.iter().enumerate() {
        let raw = quota as f64 * (count as f64 / total as f64);
        quotas[i] = raw.floor() as usize;
        fractions[i] = raw - raw.floor();
    }

    let assigned: usize = quotas.iter().sum();
    let mut order: Vec<usize> = (0..counts.len()).collect();
    order.sort_by(|&a, &b| {
        fractions[b]
            .partial_cmp(&fractions[a])
            .unwrap_or(Ordering::Equal)
            .then(a.cmp(&b))
    });

    let mut remaining = quota.saturating_sub(assigned);
    let mut cursor = 0;
    while remaining > 0 && !order.is_empty() {
        quotas[order[cursor % order.len()]] += 1;
        remaining -= 1;
        cursor += 1;
    }

    // Cap quotas that overshoot their category and hand the shortfall to
    // categories that still have unselected questions.
    let mut excess = 0_usize;
    for (q, &count) in quotas.iter_mut().zip(counts) {
        if *q > count {
            excess += *q - count;
            *q = count;
        }
    }
    while excess > 0 {
        let spare: Vec<usize> = (0..counts.len()).filter(|&i| quotas[i] < counts[i]).collect();
        if spare.is_empty() {
            break;
        }
        let per = excess / spare.len();
        let extra = excess % spare.len();
        for (i, &idx) in spare.iter().enumerate() {
            let want = per + usize::from(i < extra);
            let add = want.min(counts[idx] - quotas[idx]);
            quotas[idx] += add;
            excess -= add;
        }
    }

    quotas
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
