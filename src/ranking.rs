//! Frequency counting and ranking of quantized colors.

use crate::{AboveMaxLen, MAX_PALETTE_COLORS};
use std::cmp::Reverse;
#[cfg(feature = "threads")]
use rayon::prelude::*;

/// Marks a key that does not occur in the input.
const ABSENT: u32 = u32::MAX;

/// How to order distinct keys that occur the same number of times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TieBreak {
    /// The key that first appears in raster order gets the lower rank.
    #[default]
    FirstSeen,
    /// The smaller key gets the lower rank.
    Key,
}

/// Distinct quantized colors (keys) ranked by descending frequency.
///
/// Rank `0` is the most frequent key.
/// Ranks form a dense range `0..num_colors` with exactly one rank per distinct key.
///
/// # Examples
/// ```
/// # use wta::{RankedColors, TieBreak, AboveMaxLen};
/// # fn main() -> Result<(), AboveMaxLen<u32>> {
/// let ranked = RankedColors::new(&[7, 3, 3, 9, 7, 3], TieBreak::FirstSeen)?;
/// assert_eq!(ranked.palette(), [3, 7, 9]);
/// assert_eq!(ranked.counts(), [3, 2, 1]);
/// assert_eq!(ranked.rank_of(9), Some(2));
/// assert_eq!(ranked.rank_of(4), None);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedColors {
    /// The distinct keys, indexed by rank.
    palette: Vec<u32>,
    /// The number of occurrences of each key, indexed by rank.
    counts: Vec<u32>,
    /// The rank of each possible key, or [`ABSENT`].
    rank_by_key: Vec<u32>,
    /// The total number of keys counted.
    total_count: u32,
}

impl RankedColors {
    /// Counts and ranks the given keys.
    ///
    /// The length of `keys` must not be greater than [`MAX_PIXELS`](crate::MAX_PIXELS).
    ///
    /// # Errors
    /// Returns an error if any key does not fit in a palette entry,
    /// i.e., is not below [`MAX_PALETTE_COLORS`].
    pub fn new(keys: &[u32], tie_break: TieBreak) -> Result<Self, AboveMaxLen<u32>> {
        let mut rank_by_key = vec![ABSENT; MAX_PALETTE_COLORS as usize];
        let mut distinct = Vec::new();
        let mut counts = Vec::<u32>::new();

        // slots are handed out in order of first appearance
        for &key in keys {
            let slot = rank_by_key
                .get_mut(key as usize)
                .ok_or(AboveMaxLen(MAX_PALETTE_COLORS))?;

            if *slot == ABSENT {
                #[allow(clippy::cast_possible_truncation)]
                {
                    *slot = distinct.len() as u32;
                }
                distinct.push(key);
                counts.push(0);
            }
            counts[*slot as usize] += 1;
        }

        let mut order = (0..distinct.len()).collect::<Vec<_>>();
        match tie_break {
            // stable, so ties stay in order of first appearance
            TieBreak::FirstSeen => order.sort_by_key(|&i| Reverse(counts[i])),
            TieBreak::Key => order.sort_unstable_by_key(|&i| (Reverse(counts[i]), distinct[i])),
        }

        let palette = order.iter().map(|&i| distinct[i]).collect::<Vec<_>>();
        let counts = order.iter().map(|&i| counts[i]).collect();

        for (rank, &key) in palette.iter().enumerate() {
            #[allow(clippy::cast_possible_truncation)]
            {
                rank_by_key[key as usize] = rank as u32;
            }
        }

        #[allow(clippy::cast_possible_truncation)]
        let total_count = keys.len() as u32;

        Ok(Self {
            palette,
            counts,
            rank_by_key,
            total_count,
        })
    }

    /// Returns the distinct keys in rank order, most frequent first.
    #[must_use]
    pub fn palette(&self) -> &[u32] {
        &self.palette
    }

    /// Returns the number of occurrences of each key in rank order.
    #[must_use]
    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    /// Returns the number of keys that were counted.
    ///
    /// This is equal to the sum of [`RankedColors::counts`].
    #[must_use]
    pub fn total_count(&self) -> u32 {
        self.total_count
    }

    /// Returns the number of distinct keys.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn num_colors(&self) -> u32 {
        self.palette.len() as u32
    }

    /// Returns the rank of `key`, or `None` if it was not counted.
    #[must_use]
    pub fn rank_of(&self, key: u32) -> Option<u32> {
        self.rank_by_key
            .get(key as usize)
            .copied()
            .filter(|&rank| rank != ABSENT)
    }

    /// Maps each key to its rank.
    ///
    /// # Panics
    /// Panics if a key was not counted by this [`RankedColors`].
    #[must_use]
    pub fn map_ranks(&self, keys: &[u32]) -> Vec<u32> {
        let rank_by_key = self.rank_by_key.as_slice();
        keys.iter()
            .map(|&key| {
                let rank = rank_by_key[key as usize];
                assert_ne!(rank, ABSENT, "key {key} was not counted");
                rank
            })
            .collect()
    }

    /// Maps each key to its rank in parallel.
    ///
    /// # Panics
    /// Panics if a key was not counted by this [`RankedColors`].
    #[cfg(feature = "threads")]
    #[must_use]
    pub fn map_ranks_par(&self, keys: &[u32]) -> Vec<u32> {
        let rank_by_key = self.rank_by_key.as_slice();
        keys.par_iter()
            .map(|&key| {
                let rank = rank_by_key[key as usize];
                assert_ne!(rank, ABSENT, "key {key} was not counted");
                rank
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{tests::*, Quantizer, Rgb666};
    use rand::{seq::SliceRandom, SeedableRng};
    use rand_xoshiro::Xoroshiro128PlusPlus;

    fn assert_valid_ranking(ranked: &RankedColors, keys: &[u32]) {
        assert_eq!(ranked.total_count() as usize, keys.len());
        assert_eq!(ranked.counts().iter().sum::<u32>(), ranked.total_count());

        for (rank, &key) in ranked.palette().iter().enumerate() {
            assert_eq!(ranked.rank_of(key), Some(rank as u32));
            let count = keys.iter().filter(|&&k| k == key).count();
            assert_eq!(ranked.counts()[rank] as usize, count);
        }

        for i in 1..ranked.counts().len() {
            assert!(ranked.counts()[i - 1] >= ranked.counts()[i]);
        }
    }

    fn test_keys() -> Vec<u32> {
        test_data_1024()
            .into_iter()
            .map(|color| Rgb666.quantize(color))
            .collect()
    }

    #[test]
    fn empty_input() {
        let ranked = RankedColors::new(&[], TieBreak::FirstSeen).unwrap();
        assert!(ranked.palette().is_empty() && ranked.counts().is_empty());
        assert_eq!(ranked.total_count(), 0);
        assert_eq!(ranked.num_colors(), 0);
        assert!(ranked.map_ranks(&[]).is_empty());
    }

    #[test]
    fn most_frequent_key_has_rank_zero() {
        let keys = test_keys();
        let ranked = RankedColors::new(&keys, TieBreak::FirstSeen).unwrap();
        assert_valid_ranking(&ranked, &keys);

        let max = ranked.counts()[0];
        let most_frequent = ranked.palette()[0];
        assert_eq!(keys.iter().filter(|&&k| k == most_frequent).count(), max as usize);
    }

    #[test]
    fn ranks_are_a_bijection() {
        let keys = test_keys();
        let ranked = RankedColors::new(&keys, TieBreak::Key).unwrap();
        let mut ranks = ranked.map_ranks(&keys);
        ranks.sort_unstable();
        ranks.dedup();
        assert_eq!(ranks, (0..ranked.num_colors()).collect::<Vec<_>>());
    }

    #[test]
    fn ties_follow_first_appearance() {
        let keys = [5, 9, 1, 9, 5, 1, 2];
        let ranked = RankedColors::new(&keys, TieBreak::FirstSeen).unwrap();
        assert_eq!(ranked.palette(), [5, 9, 1, 2]);
        assert_eq!(ranked.map_ranks(&keys), [0, 1, 2, 1, 0, 2, 3]);

        let ranked = RankedColors::new(&keys, TieBreak::Key).unwrap();
        assert_eq!(ranked.palette(), [1, 5, 9, 2]);
    }

    #[test]
    fn key_ties_do_not_depend_on_order() {
        let keys = test_keys();
        let mut shuffled = keys.clone();
        shuffled.shuffle(&mut Xoroshiro128PlusPlus::seed_from_u64(0));

        let expected = RankedColors::new(&keys, TieBreak::Key).unwrap();
        let actual = RankedColors::new(&shuffled, TieBreak::Key).unwrap();
        assert_valid_ranking(&actual, &shuffled);
        assert_eq!(actual, expected);
    }

    #[test]
    fn key_above_palette_width() {
        assert_eq!(
            RankedColors::new(&[0, MAX_PALETTE_COLORS], TieBreak::FirstSeen),
            Err(AboveMaxLen(MAX_PALETTE_COLORS))
        );
        assert!(RankedColors::new(&[MAX_PALETTE_COLORS - 1], TieBreak::FirstSeen).is_ok());
    }

    #[test]
    #[cfg(feature = "threads")]
    fn single_and_multi_threaded_match() {
        let keys = test_keys();
        let ranked = RankedColors::new(&keys, TieBreak::FirstSeen).unwrap();
        assert_eq!(ranked.map_ranks(&keys), ranked.map_ranks_par(&keys));
    }
}
