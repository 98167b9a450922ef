use crate::error::ConfigError;
use rand::seq::IndexedRandom;
use rand::Rng;
use serde::Deserialize;
use std::fmt;

pub const MAX_PERCENT: u8 = 100;

/// The score bands, `[low, high)`. Only their messages are configurable.
pub const BUCKET_RANGES: [(u8, u8); 10] = [
    (0, 10),
    (10, 30),
    (30, 40),
    (40, 50),
    (50, 60),
    (60, 70),
    (70, 80),
    (80, 90),
    (90, 95),
    (95, 100),
];

/// `[low, high)` in integer percent. The bucket whose `high` is 100 also
/// holds 100 itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PercentRange {
    pub low: u8,
    pub high: u8,
}

impl PercentRange {
    pub fn contains(&self, percent: u8) -> bool {
        percent >= self.low && (percent < self.high || (self.high == MAX_PERCENT && percent == MAX_PERCENT))
    }
}

impl fmt::Display for PercentRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.high == MAX_PERCENT {
            write!(f, "{}-{}", self.low, MAX_PERCENT)
        } else {
            write!(f, "{}-{}", self.low, self.high - 1)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CommentaryBucket {
    pub low: u8,
    pub high: u8,
    pub messages: Vec<String>,
}

impl CommentaryBucket {
    pub fn range(&self) -> PercentRange {
        PercentRange {
            low: self.low,
            high: self.high,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Commentary {
    /// `None` when the aggregate was not a valid probability.
    pub percent: Option<u8>,
    pub bucket: Option<PercentRange>,
    pub message: String,
}

/// Validated buckets plus a lookup from every percentage to its bucket.
#[derive(Debug, Clone)]
pub struct CommentaryTable {
    buckets: Vec<CommentaryBucket>,
    lookup: [usize; MAX_PERCENT as usize + 1],
    fallback: String,
}

impl CommentaryTable {
    pub fn new(buckets: Vec<CommentaryBucket>, fallback: String) -> Result<Self, ConfigError> {
        if fallback.trim().is_empty() {
            return Err(ConfigError::Commentary("fallback message is empty".to_string()));
        }
        if buckets.len() != BUCKET_RANGES.len() {
            return Err(ConfigError::Commentary(format!(
                "expected {} buckets, got {}",
                BUCKET_RANGES.len(),
                buckets.len()
            )));
        }
        for (bucket, &(low, high)) in buckets.iter().zip(BUCKET_RANGES.iter()) {
            if (bucket.low, bucket.high) != (low, high) {
                return Err(ConfigError::Commentary(format!(
                    "bucket [{}, {}) does not match the fixed range [{}, {})",
                    bucket.low, bucket.high, low, high
                )));
            }
            if bucket.messages.is_empty() {
                return Err(ConfigError::Commentary(format!(
                    "bucket {} has no messages",
                    bucket.range()
                )));
            }
        }

        let mut lookup = [0usize; MAX_PERCENT as usize + 1];
        for (percent, slot) in lookup.iter_mut().enumerate() {
            // Coverage was checked above, so every percent has a bucket.
            *slot = buckets
                .iter()
                .position(|b| b.range().contains(percent as u8))
                .unwrap_or(buckets.len() - 1);
        }

        Ok(Self {
            buckets,
            lookup,
            fallback,
        })
    }

    pub fn buckets(&self) -> &[CommentaryBucket] {
        &self.buckets
    }

    pub fn bucket_for(&self, percent: u8) -> Option<&CommentaryBucket> {
        self.lookup
            .get(percent as usize)
            .and_then(|&index| self.buckets.get(index))
    }

    /// Rounded percentage of a probability, or `None` if it is not one.
    pub fn percent_of(probability: f64) -> Option<u8> {
        if !probability.is_finite() {
            return None;
        }
        let percent = (probability * 100.0).round();
        if (0.0..=MAX_PERCENT as f64).contains(&percent) {
            Some(percent as u8)
        } else {
            None
        }
    }

    pub fn select<R: Rng + ?Sized>(&self, aggregate_probability: f64, rng: &mut R) -> Commentary {
        let chosen = Self::percent_of(aggregate_probability).and_then(|percent| {
            let bucket = self.bucket_for(percent)?;
            let message = bucket.messages.choose(rng)?;
            Some(Commentary {
                percent: Some(percent),
                bucket: Some(bucket.range()),
                message: message.clone(),
            })
        });

        chosen.unwrap_or_else(|| Commentary {
            percent: None,
            bucket: None,
            message: self.fallback.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commentary::messages::{default_buckets, DEFAULT_FALLBACK};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn table() -> CommentaryTable {
        CommentaryTable::new(default_buckets(), DEFAULT_FALLBACK.to_string()).unwrap()
    }

    fn buckets() -> Vec<CommentaryBucket> {
        BUCKET_RANGES
            .iter()
            .map(|&(low, high)| CommentaryBucket {
                low,
                high,
                messages: vec![format!("{}..{}", low, high)],
            })
            .collect()
    }

    #[test]
    fn test_every_percent_maps_to_exactly_one_bucket() {
        let table = table();

        for percent in 0..=MAX_PERCENT {
            let matching = table
                .buckets()
                .iter()
                .filter(|b| b.range().contains(percent))
                .count();
            assert_eq!(matching, 1, "percent {}", percent);
            assert!(table.bucket_for(percent).is_some());
        }
    }

    #[test]
    fn test_boundaries() {
        let table = table();
        let cases = [
            (0, "0-9"),
            (9, "0-9"),
            (10, "10-29"),
            (29, "10-29"),
            (30, "30-39"),
            (49, "40-49"),
            (50, "50-59"),
            (69, "60-69"),
            (70, "70-79"),
            (79, "70-79"),
            (80, "80-89"),
            (89, "80-89"),
            (90, "90-94"),
            (94, "90-94"),
            (95, "95-100"),
            (100, "95-100"),
        ];

        for (percent, expected) in cases {
            let range = table.bucket_for(percent).unwrap().range();
            assert_eq!(range.to_string(), expected, "percent {}", percent);
        }
    }

    #[test]
    fn test_select_rounds_probability() {
        let table = table();
        let mut rng = StdRng::seed_from_u64(1);

        assert_eq!(table.select(0.946, &mut rng).percent, Some(95));
        assert_eq!(table.select(0.944, &mut rng).percent, Some(94));
        assert_eq!(
            table.select(0.92, &mut rng).bucket.map(|b| b.to_string()),
            Some("90-94".to_string())
        );
    }

    #[test]
    fn test_select_is_reproducible_for_a_seed() {
        let table = table();

        let first = table.select(0.55, &mut StdRng::seed_from_u64(42));
        let second = table.select(0.55, &mut StdRng::seed_from_u64(42));

        assert_eq!(first, second);
        let bucket = table.bucket_for(55).unwrap();
        assert!(bucket.messages.contains(&first.message));
    }

    #[test]
    fn test_invalid_input_yields_fallback() {
        let table = table();
        let mut rng = StdRng::seed_from_u64(7);

        for value in [f64::NAN, f64::INFINITY, -0.2, 1.5] {
            let commentary = table.select(value, &mut rng);
            assert_eq!(commentary.message, DEFAULT_FALLBACK);
            assert_eq!(commentary.bucket, None);
        }
    }

    #[test]
    fn test_rejects_anything_but_the_fixed_ranges() {
        let fallback = "?".to_string();

        let mut gap = buckets();
        gap[1].low = 11;
        assert!(CommentaryTable::new(gap, fallback.clone()).is_err());

        let mut moved = buckets();
        moved[8].high = 96;
        moved[9].low = 96;
        assert!(CommentaryTable::new(moved, fallback.clone()).is_err());

        let two = vec![
            CommentaryBucket {
                low: 0,
                high: 50,
                messages: vec!["a".into()],
            },
            CommentaryBucket {
                low: 50,
                high: 100,
                messages: vec!["b".into()],
            },
        ];
        assert!(CommentaryTable::new(two, fallback.clone()).is_err());

        let mut empty = buckets();
        empty[4].messages.clear();
        assert!(CommentaryTable::new(empty, fallback.clone()).is_err());

        assert!(CommentaryTable::new(buckets(), String::new()).is_err());

        let table = CommentaryTable::new(buckets(), fallback).unwrap();
        assert_eq!(table.bucket_for(100).unwrap().low, 95);
    }
}
