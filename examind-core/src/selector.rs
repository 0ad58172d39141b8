//! Item selection
//!
//! Picks the unused item whose difficulty is closest to the current
//! ability estimate. Ties are broken by a pseudo-random draw from a
//! per-session seeded generator, so a session's selection sequence can
//! be replayed for audit without being globally deterministic.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::item::Item;

/// Difficulties closer than this are treated as tied
const TIE_EPSILON: f64 = 1e-9;

/// Per-session item selector
///
/// Owns the session's tie-break RNG. The seed is recorded on the
/// session record so an audit can reproduce the exact selection
/// sequence.
pub struct ItemSelector {
    rng: StdRng,
    seed: u64,
    /// Half-width of the allowed difficulty band around the prior for
    /// the first item; the band relaxes to "closest unused" afterwards
    start_band_width: f64,
}

impl ItemSelector {
    pub fn new(seed: u64, start_band_width: f64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed,
            start_band_width,
        }
    }

    /// The seed this selector was created with
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Select the next item to administer
    ///
    /// `first_item` applies the starting-band exposure constraint: the
    /// first item must fall within `start_band_width` of the ability
    /// prior so a cold session never opens at an extreme. If no unused
    /// item lies inside the band the constraint falls back to closest
    /// unused rather than refusing to start.
    ///
    /// Returns `None` when every item in the pool has been used; the
    /// caller treats that as pool exhaustion, not an error.
    pub fn select_next(
        &mut self,
        ability: f64,
        used: &HashSet<String>,
        pool: &[Item],
        first_item: bool,
    ) -> Option<Item> {
        let unused: Vec<&Item> = pool.iter().filter(|item| !used.contains(&item.id)).collect();
        if unused.is_empty() {
            return None;
        }

        let candidates: Vec<&Item> = if first_item {
            let banded: Vec<&Item> = unused
                .iter()
                .copied()
                .filter(|item| (item.difficulty - ability).abs() <= self.start_band_width)
                .collect();
            if banded.is_empty() { unused } else { banded }
        } else {
            unused
        };

        let best_distance = candidates
            .iter()
            .map(|item| (item.difficulty - ability).abs())
            .fold(f64::INFINITY, f64::min);

        let tied: Vec<&Item> = candidates
            .into_iter()
            .filter(|item| (item.difficulty - ability).abs() - best_distance <= TIE_EPSILON)
            .collect();

        let pick = if tied.len() == 1 {
            tied[0]
        } else {
            tied[self.rng.gen_range(0..tied.len())]
        };

        tracing::debug!(
            item_id = %pick.id,
            difficulty = pick.difficulty,
            ability,
            candidates = tied.len(),
            "selected next item"
        );

        Some(pick.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(difficulties: &[(&str, f64)]) -> Vec<Item> {
        difficulties
            .iter()
            .map(|(id, d)| Item::new(*id, *d))
            .collect()
    }

    #[test]
    fn picks_closest_difficulty() {
        let mut selector = ItemSelector::new(1, 2.0);
        let pool = pool(&[("q1", 2.0), ("q2", 5.2), ("q3", 8.0)]);

        let item = selector
            .select_next(5.0, &HashSet::new(), &pool, false)
            .unwrap();
        assert_eq!(item.id, "q2");
    }

    #[test]
    fn skips_used_items() {
        let mut selector = ItemSelector::new(1, 2.0);
        let pool = pool(&[("q1", 5.0), ("q2", 5.5)]);
        let used: HashSet<String> = ["q1".to_string()].into();

        let item = selector.select_next(5.0, &used, &pool, false).unwrap();
        assert_eq!(item.id, "q2");
    }

    #[test]
    fn exhausted_pool_returns_none() {
        let mut selector = ItemSelector::new(1, 2.0);
        let pool = pool(&[("q1", 5.0)]);
        let used: HashSet<String> = ["q1".to_string()].into();

        assert!(selector.select_next(5.0, &used, &pool, false).is_none());
    }

    #[test]
    fn empty_pool_returns_none() {
        let mut selector = ItemSelector::new(1, 2.0);
        assert!(selector
            .select_next(5.0, &HashSet::new(), &[], false)
            .is_none());
    }

    #[test]
    fn first_item_respects_starting_band() {
        let mut selector = ItemSelector::new(1, 1.5);
        // q-near is farther from ability 5.0 than q-extreme would be
        // allowed, but q-extreme sits outside the band.
        let pool = pool(&[("q-extreme", 9.9), ("q-near", 6.0)]);

        let item = selector
            .select_next(5.0, &HashSet::new(), &pool, true)
            .unwrap();
        assert_eq!(item.id, "q-near");
    }

    #[test]
    fn first_item_band_relaxes_when_empty() {
        let mut selector = ItemSelector::new(1, 0.5);
        let pool = pool(&[("q1", 9.0), ("q2", 8.0)]);

        // No item within 0.5 of 5.0; fall back to closest.
        let item = selector
            .select_next(5.0, &HashSet::new(), &pool, true)
            .unwrap();
        assert_eq!(item.id, "q2");
    }

    #[test]
    fn band_does_not_apply_after_first_item() {
        let mut selector = ItemSelector::new(1, 0.5);
        let pool = pool(&[("q1", 9.0)]);

        let item = selector
            .select_next(5.0, &HashSet::new(), &pool, false)
            .unwrap();
        assert_eq!(item.id, "q1");
    }

    #[test]
    fn tie_break_is_reproducible_per_seed() {
        let pool = pool(&[("a", 5.5), ("b", 4.5), ("c", 5.5), ("d", 4.5)]);

        let mut first = ItemSelector::new(42, 2.0);
        let mut second = ItemSelector::new(42, 2.0);
        for _ in 0..4 {
            let a = first.select_next(5.0, &HashSet::new(), &pool, false).unwrap();
            let b = second
                .select_next(5.0, &HashSet::new(), &pool, false)
                .unwrap();
            assert_eq!(a.id, b.id);
        }
    }

    #[test]
    fn tie_break_varies_across_seeds() {
        let pool: Vec<Item> = (0..32).map(|i| Item::new(format!("q{i}"), 5.0)).collect();
        let used = HashSet::new();

        let picks: HashSet<String> = (0..16)
            .map(|seed| {
                ItemSelector::new(seed, 2.0)
                    .select_next(5.0, &used, &pool, false)
                    .unwrap()
                    .id
            })
            .collect();

        // 16 seeds over 32 tied items should not all agree.
        assert!(picks.len() > 1);
    }
}
