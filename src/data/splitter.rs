// ============================================================
// Layer 4 - Train/Test Splitter
// ============================================================
// Shuffles samples with a SEEDED generator and splits them into
//   - a training set: what the classifier is fitted on
//   - a test set:     held out to report accuracy
//
// The seed makes the split reproducible: the same corpus and the
// same seed always give the same partition, so retraining for QA
// produces identical artifacts. Both recommenders are split with
// the same seed over the same rows, so a record is held out for
// both targets or for neither.
//
// Uses a Fisher-Yates shuffle via rand::seq::SliceRandom over a
// StdRng seeded from the configured value.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Shuffle `samples` deterministically and split into (train, test).
///
/// # Arguments
/// * `samples`        - All available samples (consumed by this function)
/// * `train_fraction` - Proportion for training, e.g. 0.8 = 80%
/// * `seed`           - Shuffle seed
pub fn split_train_test<T>(mut samples: Vec<T>, train_fraction: f64, seed: u64) -> (Vec<T>, Vec<T>) {
    let mut rng = StdRng::seed_from_u64(seed);
    samples.shuffle(&mut rng);

    // e.g. 100 samples * 0.8 = 80 → first 80 are training
    let total    = samples.len();
    let split_at = ((total as f64) * train_fraction.clamp(0.0, 1.0)).round() as usize;
    let split_at = split_at.min(total);

    // After this: samples = [0..split_at], test = [split_at..total]
    let test = samples.split_off(split_at);

    tracing::debug!(
        "Dataset split: {} training, {} test ({}% / {}%)",
        samples.len(),
        test.len(),
        (samples.len() * 100) / total.max(1),
        (test.len()    * 100) / total.max(1),
    );

    (samples, test)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correct_split_sizes() {
        let items: Vec<usize> = (0..100).collect();
        let (train, test)     = split_train_test(items, 0.8, 42);
        assert_eq!(train.len(), 80);
        assert_eq!(test.len(),  20);
    }

    #[test]
    fn test_all_items_preserved() {
        let items: Vec<usize> = (0..50).collect();
        let (train, test)     = split_train_test(items, 0.7, 42);
        let mut all: Vec<usize> = train.into_iter().chain(test).collect();
        all.sort_unstable();
        assert_eq!(all, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_same_seed_same_partition() {
        let a = split_train_test((0..40).collect::<Vec<u32>>(), 0.8, 42);
        let b = split_train_test((0..40).collect::<Vec<u32>>(), 0.8, 42);
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seed_different_order() {
        let (a, _) = split_train_test((0..40).collect::<Vec<u32>>(), 1.0, 1);
        let (b, _) = split_train_test((0..40).collect::<Vec<u32>>(), 1.0, 2);
        assert_ne!(a, b);
    }

    #[test]
    fn test_empty_dataset() {
        let items: Vec<usize> = Vec::new();
        let (train, test)     = split_train_test(items, 0.8, 42);
        assert!(train.is_empty());
        assert!(test.is_empty());
    }

    #[test]
    fn test_full_training_split() {
        let items: Vec<usize> = (0..10).collect();
        let (train, test)     = split_train_test(items, 1.0, 42);
        assert_eq!(train.len(), 10);
        assert!(test.is_empty());
    }
}
