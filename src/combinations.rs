//! Pair enumeration with an almost-sorted ordering hint
//!
//! The fitness evaluator compares every free color with every color that
//! follows it. Enumerating those pairs and sorting their scores happens once
//! per candidate, thousands of times per search, and the shape of the problem
//! never changes within a search. [`CombinationCache`] keeps the pair list
//! for the current shape and remembers the order the last scores were sorted
//! into, which is usually close to the order of the next ones.

/// Cached pair list for a `(total, free)` problem shape.
///
/// Each instance belongs to one worker; share nothing between threads.
#[derive(Debug, Default, Clone)]
pub struct CombinationCache {
    key: Option<(usize, usize)>,
    pairs: Vec<(usize, usize)>,
    hint: Vec<usize>,
}

/// Number of pairs enumerated for `total` colors of which the first `free`
/// are free. With no free colors, every pair is compared.
pub fn pair_count(total: usize, free: usize) -> usize {
    let free = if free == 0 { total } else { free.min(total) };
    // free * (2 * total - free - 1) / 2 without underflow for total == 0
    (0..free).map(|i| total - i - 1).sum()
}

impl CombinationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pairs `(i, j)` with `i` over the free colors and `j > i` over all
    /// colors, in row-major order. Rebuilt only when the shape changes.
    pub fn pairs(&mut self, total: usize, free: usize) -> &[(usize, usize)] {
        if self.key != Some((total, free)) {
            self.rebuild(total, free);
        }
        &self.pairs
    }

    fn rebuild(&mut self, total: usize, free: usize) {
        let rows = if free == 0 { total } else { free.min(total) };

        self.pairs.clear();
        self.pairs.reserve(pair_count(total, free));
        for i in 0..rows {
            for j in (i + 1)..total {
                self.pairs.push((i, j));
            }
        }
        self.hint = (0..self.pairs.len()).collect();
        self.key = Some((total, free));

        tracing::debug!(total, free, pairs = self.pairs.len(), "Rebuilt combination cache");
    }

    /// The permutation that sorted the previous scores.
    pub fn hint(&self) -> &[usize] {
        &self.hint
    }

    /// Sort `scores` descending and remember the permutation.
    ///
    /// The sort starts from the previous permutation, which makes it cheap
    /// when consecutive candidates rank their pairs similarly. The result is
    /// the same whatever the hint: the ordering is total and ties keep the
    /// pair order.
    pub fn sort_descending(&mut self, scores: &[f64]) -> Vec<f64> {
        if self.hint.len() != scores.len() {
            self.hint = (0..scores.len()).collect();
        }

        // Restore pair order for ties before the stable sort so the result
        // cannot depend on the hint
        let mut order = std::mem::take(&mut self.hint);
        order.sort_by(|&x, &y| scores[y].total_cmp(&scores[x]).then(x.cmp(&y)));

        let sorted = order.iter().map(|&k| scores[k]).collect();
        self.hint = order;
        sorted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_two_free_of_five() {
        let mut cache = CombinationCache::new();
        let first = cache.pairs(5, 2).to_vec();
        assert_eq!(
            first,
            vec![(0, 1), (0, 2), (0, 3), (0, 4), (1, 2), (1, 3), (1, 4)]
        );

        let second = cache.pairs(5, 2).to_vec();
        assert_eq!(first, second);
    }

    #[test]
    fn test_pair_count_matches_formula() {
        for total in 1..8 {
            for free in 1..=total {
                assert_eq!(pair_count(total, free), free * (2 * total - free - 1) / 2);
                assert_eq!(
                    CombinationCache::new().pairs(total, free).len(),
                    pair_count(total, free)
                );
            }
        }
        assert_eq!(pair_count(0, 0), 0);
    }

    #[test]
    fn test_all_free() {
        let mut cache = CombinationCache::new();
        assert_eq!(cache.pairs(3, 3), &[(0, 1), (0, 2), (1, 2)]);
    }

    #[test]
    fn test_no_free_enumerates_every_pair() {
        let mut cache = CombinationCache::new();
        assert_eq!(cache.pairs(3, 0), &[(0, 1), (0, 2), (1, 2)]);
        assert_eq!(pair_count(3, 0), 3);
    }

    #[test]
    fn test_shape_change_rebuilds() {
        let mut cache = CombinationCache::new();
        cache.pairs(4, 1);
        cache.sort_descending(&[1.0, 3.0, 2.0]);
        assert_eq!(cache.hint(), &[1, 2, 0]);

        assert_eq!(cache.pairs(3, 1), &[(0, 1), (0, 2)]);
        assert_eq!(cache.hint(), &[0, 1]);
    }

    #[test]
    fn test_reuse_keeps_hint() {
        let mut cache = CombinationCache::new();
        cache.pairs(3, 3);
        cache.sort_descending(&[1.0, 3.0, 2.0]);
        cache.pairs(3, 3);
        assert_eq!(cache.hint(), &[1, 2, 0]);
    }

    #[test]
    fn test_sort_descending() {
        let mut cache = CombinationCache::new();
        cache.pairs(3, 3);
        let sorted = cache.sort_descending(&[-5.0, 2.0, -1.0]);
        assert_eq!(sorted, vec![2.0, -1.0, -5.0]);
    }

    #[test]
    fn test_hint_does_not_change_result() {
        let scores = [4.0, -2.0, 4.0, 7.5, -2.0, 0.0, 1.0];

        let mut fresh = CombinationCache::new();
        fresh.pairs(5, 2);
        let expected = fresh.sort_descending(&scores);
        let expected_order = fresh.hint().to_vec();

        let mut warmed = CombinationCache::new();
        warmed.pairs(5, 2);
        warmed.sort_descending(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let sorted = warmed.sort_descending(&scores);

        assert_eq!(sorted, expected);
        assert_eq!(warmed.hint(), expected_order.as_slice());
    }
}
