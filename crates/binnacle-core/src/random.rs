//! Thread-local RNG with an optional process-wide seed override.
//!
//! Mirrors the teacher's `random_provider` module: a `SmallRng` seeded from the OS by
//! default, with `set_seed` available for deterministic tests.

use rand::rngs::SmallRng;
use rand::seq::{IndexedRandom, SliceRandom};
use rand::{Rng, SeedableRng};
use std::cell::RefCell;
use std::ops::Range;
use std::sync::{Arc, Mutex, OnceLock};

static SEED_OVERRIDE: OnceLock<Mutex<Option<u64>>> = OnceLock::new();

thread_local! {
    static TLS_RNG: RefCell<SmallRng> = RefCell::new(make_rng());
}

fn seed_slot() -> &'static Mutex<Option<u64>> {
    SEED_OVERRIDE.get_or_init(|| Mutex::new(None))
}

fn make_rng() -> SmallRng {
    match *seed_slot().lock().unwrap() {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_os_rng(),
    }
}

/// Fix the seed used by every new thread-local RNG created after this call.
/// Threads that have already drawn a number keep their existing stream.
pub fn set_seed(seed: u64) {
    *seed_slot().lock().unwrap() = Some(seed);
    TLS_RNG.with(|cell| *cell.borrow_mut() = SmallRng::seed_from_u64(seed));
}

/// Run `f` with the calling thread's RNG reseeded to `seed`, then restore the previous stream.
pub fn scoped_seed<R>(seed: u64, f: impl FnOnce() -> R) -> R {
    let previous = TLS_RNG.with(|cell| cell.replace(SmallRng::seed_from_u64(seed)));
    let result = f();
    TLS_RNG.with(|cell| *cell.borrow_mut() = previous);
    result
}

pub fn with_rng<R>(f: impl FnOnce(&mut SmallRng) -> R) -> R {
    TLS_RNG.with(|cell| f(&mut cell.borrow_mut()))
}

pub fn bool(prob: f64) -> bool {
    with_rng(|rng| rng.random_bool(prob.clamp(0.0, 1.0)))
}

pub fn range<T>(bounds: Range<T>) -> T
where
    T: rand::distr::uniform::SampleUniform + PartialOrd,
{
    with_rng(|rng| rng.random_range(bounds))
}

/// Inclusive real/integer range `[lo, hi]`.
pub fn range_inclusive<T>(lo: T, hi: T) -> T
where
    T: rand::distr::uniform::SampleUniform + PartialOrd + Copy,
{
    with_rng(|rng| rng.random_range(lo..=hi))
}

pub fn choose<'a, T>(items: &'a [T]) -> Option<&'a T> {
    with_rng(|rng| items.choose(rng))
}

pub fn shuffle<T>(items: &mut [T]) {
    with_rng(|rng| items.shuffle(rng));
}

/// `k` distinct indices into `0..n`, unweighted. Empty if `k == 0`; clamps `k` to `n`.
pub fn sample_indices(n: usize, k: usize) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..n).collect();
    shuffle(&mut idx);
    idx.truncate(k.min(n));
    idx
}

/// Weighted sample of `k` distinct indices from `weights` without replacement.
/// Falls back to uniform sampling of the remaining indices if the weighted pool
/// is exhausted before `k` picks are made.
pub fn weighted_sample_indices(weights: &[f64], k: usize) -> Vec<usize> {
    let mut remaining: Vec<(usize, f64)> = weights
        .iter()
        .enumerate()
        .map(|(i, &w)| (i, w.max(0.0)))
        .collect();
    let mut picked = Vec::with_capacity(k.min(remaining.len()));

    while picked.len() < k && !remaining.is_empty() {
        let total: f64 = remaining.iter().map(|(_, w)| w).sum();
        let pick_pos = if total > 0.0 {
            let mut target = with_rng(|rng| rng.random_range(0.0..total));
            let mut pos = remaining.len() - 1;
            for (i, (_, w)) in remaining.iter().enumerate() {
                if target < *w {
                    pos = i;
                    break;
                }
                target -= w;
            }
            pos
        } else {
            with_rng(|rng| rng.random_range(0..remaining.len()))
        };
        let (idx, _) = remaining.remove(pick_pos);
        picked.push(idx);
    }
    picked
}

/// Box-Muller normal sample with the given mean and standard deviation.
pub fn gaussian(mean: f64, std_dev: f64) -> f64 {
    with_rng(|rng| {
        let u1: f64 = rng.random_range(f64::EPSILON..1.0);
        let u2: f64 = rng.random_range(0.0..1.0);
        mean + std_dev * (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
    })
}

/// Weighted draw of one item from `items` paired 1:1 with `weights`.
pub fn weighted_choice<'a, T>(items: &'a [T], weights: &[f64]) -> Option<&'a T> {
    if items.is_empty() || items.len() != weights.len() {
        return None;
    }
    let total: f64 = weights.iter().map(|w| w.max(0.0)).sum();
    if total <= 0.0 {
        return choose(items);
    }
    let mut target = with_rng(|rng| rng.random_range(0.0..total));
    for (item, &w) in items.iter().zip(weights.iter()) {
        let w = w.max(0.0);
        if target < w {
            return Some(item);
        }
        target -= w;
    }
    items.last()
}

/// Shared handle type used where callers need `Arc`-owned randomness state (tests only).
pub type SharedRng = Arc<Mutex<SmallRng>>;
