use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{MergeError, Result};
use crate::types::SplitSet;

/// Default stride for subsampling source B.
pub const DEFAULT_STRIDE: usize = 10;
/// Default seed for the partition shuffle.
pub const DEFAULT_SEED: u64 = 42;

/// Train and validation fractions; the test split takes the remainder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitRatios {
    pub train: f64,
    pub val: f64,
}

impl Default for SplitRatios {
    fn default() -> Self {
        Self {
            train: 0.7,
            val: 0.15,
        }
    }
}

impl SplitRatios {
    pub fn new(train: f64, val: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&train) || !(0.0..=1.0).contains(&val) {
            return Err(MergeError::Configuration(
                "split ratios must be between 0.0 and 1.0".to_string(),
            ));
        }
        if train + val > 1.0 + 1e-9 {
            return Err(MergeError::Configuration(format!(
                "train ({}) and val ({}) ratios exceed 1.0",
                train, val
            )));
        }
        Ok(Self { train, val })
    }

    pub fn test(&self) -> f64 {
        (1.0 - self.train - self.val).max(0.0)
    }

    /// Partition boundaries for `n` items, truncating toward zero.
    pub fn boundaries(&self, n: usize) -> (usize, usize) {
        let train_end = ((self.train * n as f64) as usize).min(n);
        let val_end = (((self.train + self.val) * n as f64) as usize).clamp(train_end, n);
        (train_end, val_end)
    }
}

/// Every `stride`-th element, starting with the first.
pub fn stride_sample<T: Clone>(items: &[T], stride: usize) -> Vec<T> {
    items.iter().step_by(stride.max(1)).cloned().collect()
}

/// Shuffle with a seeded generator and cut into train/val/test.
pub fn partition(mut ids: Vec<String>, ratios: SplitRatios, seed: u64) -> SplitSet {
    let mut rng = StdRng::seed_from_u64(seed);
    ids.shuffle(&mut rng);

    let (train_end, val_end) = ratios.boundaries(ids.len());
    let test = ids.split_off(val_end);
    let val = ids.split_off(train_end);

    SplitSet {
        train: ids,
        val,
        test,
    }
}

/// Select and split source B identifiers.
///
/// Identifiers are sorted before sampling, so the result depends only on
/// the set of valid identifiers, the stride and the seed.
pub fn select_source_b(
    valid_ids: &[String],
    stride: usize,
    ratios: SplitRatios,
    seed: u64,
) -> SplitSet {
    let mut ordered = valid_ids.to_vec();
    ordered.sort();
    let selected = stride_sample(&ordered, stride);
    partition(selected, ratios, seed)
}
