// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use std::f64::consts::LN_2;

use super::BloomFilter;
use crate::error::Error;
use crate::hash::HashExpander;
use crate::hash::Murmur3Expander;
use crate::hash::DEFAULT_SEED;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Sizing {
    Accuracy {
        max_items: u64,
        fpp: f64,
    },
    Size {
        num_bits: u64,
        num_hashes: u64,
        max_items: u64,
    },
}

/// Builder for creating configured [`BloomFilter`] instances.
///
/// Provides two construction modes:
/// - [`with_accuracy()`](Self::with_accuracy): Specify target items and false positive rate
///   (recommended)
/// - [`with_size()`](Self::with_size): Specify bit count, hash count and target items (manual)
///
/// Parameters are validated by [`build()`](Self::build), which reports invalid input as an
/// [`Error`] rather than panicking.
#[derive(Debug, Clone)]
pub struct BloomFilterBuilder {
    sizing: Sizing,
    seed: u32,
}

impl BloomFilterBuilder {
    /// Creates a builder with optimal parameters for a target accuracy.
    ///
    /// The bit count and hash count are derived with [`suggest_num_bits()`] and
    /// [`suggest_num_hashes()`].
    ///
    /// # Examples
    ///
    /// ```
    /// # use bloomkit::bloom::BloomFilterBuilder;
    /// let filter = BloomFilterBuilder::with_accuracy(553, 0.002).build()?;
    /// assert_eq!(filter.bit_count(), 7153);
    /// assert_eq!(filter.hash_count(), 9);
    /// # Ok::<(), bloomkit::error::Error>(())
    /// ```
    ///
    /// [`suggest_num_bits()`]: Self::suggest_num_bits
    /// [`suggest_num_hashes()`]: Self::suggest_num_hashes
    pub fn with_accuracy(max_items: u64, fpp: f64) -> Self {
        BloomFilterBuilder {
            sizing: Sizing::Accuracy { max_items, fpp },
            seed: DEFAULT_SEED,
        }
    }

    /// Creates a builder with manual size specification.
    ///
    /// The false positive probability is derived from the three counts with
    /// [`false_positive_probability()`](Self::false_positive_probability).
    ///
    /// # Examples
    ///
    /// ```
    /// # use bloomkit::bloom::BloomFilterBuilder;
    /// let filter = BloomFilterBuilder::with_size(1024, 2, 3).build()?;
    /// assert_eq!(filter.size(), 128);
    /// # Ok::<(), bloomkit::error::Error>(())
    /// ```
    pub fn with_size(num_bits: u64, num_hashes: u64, max_items: u64) -> Self {
        BloomFilterBuilder {
            sizing: Sizing::Size {
                num_bits,
                num_hashes,
                max_items,
            },
            seed: DEFAULT_SEED,
        }
    }

    /// Sets the seed of the default hash expander (default: `0xbeefeebb`).
    ///
    /// **Important**: filters with different seeds map keys to different bits and must
    /// not be merged.
    pub fn seed(mut self, seed: u32) -> Self {
        self.seed = seed;
        self
    }

    /// Builds a filter hashing with [`Murmur3Expander`] and the configured seed.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidArgument`](crate::error::ErrorKind::InvalidArgument) if any
    /// count is zero or the false positive probability is outside `(0, 1)`.
    pub fn build(self) -> Result<BloomFilter, Error> {
        let hasher = Murmur3Expander::with_seed(self.seed);
        self.build_with_hasher(hasher)
    }

    /// Builds a filter that obtains its hash values from `hasher`.
    ///
    /// The builder's seed is not used; seeding is up to the supplied expander.
    pub fn build_with_hasher<H: HashExpander>(self, hasher: H) -> Result<BloomFilter<H>, Error> {
        let mut filter = BloomFilter::with_hasher(hasher);
        match self.sizing {
            Sizing::Accuracy { max_items, fpp } => filter.config_target(max_items, fpp)?,
            Sizing::Size {
                num_bits,
                num_hashes,
                max_items,
            } => filter.config_exact(num_bits, num_hashes, max_items)?,
        }
        Ok(filter)
    }

    /// Suggests the optimal number of bits given max items and target FPP.
    ///
    /// Formula: `m = ceil(n * ln(p) / ln(1 / 2^ln(2)))`, which equals
    /// `-n * ln(p) / ln(2)^2`. The result is at least 1.
    ///
    /// # Examples
    ///
    /// ```
    /// # use bloomkit::bloom::BloomFilterBuilder;
    /// assert_eq!(BloomFilterBuilder::suggest_num_bits(553, 0.002), 7153);
    /// ```
    pub fn suggest_num_bits(max_items: u64, fpp: f64) -> u64 {
        let n = max_items as f64;
        let bits = (n * fpp.ln() / (1.0 / 2f64.powf(LN_2)).ln()).ceil();
        (bits as u64).max(1)
    }

    /// Suggests the optimal number of hash functions given max items and bit count.
    ///
    /// Formula: `k = round((m / n) * ln(2))`. The result is at least 1, so very loose
    /// targets still touch one bit per key.
    ///
    /// # Examples
    ///
    /// ```
    /// # use bloomkit::bloom::BloomFilterBuilder;
    /// assert_eq!(BloomFilterBuilder::suggest_num_hashes(553, 7153), 9);
    /// ```
    pub fn suggest_num_hashes(max_items: u64, num_bits: u64) -> u64 {
        let m = num_bits as f64;
        let n = max_items as f64;
        ((m / n * LN_2).round() as u64).max(1)
    }

    /// Computes the false positive probability of a filter after `max_items` insertions.
    ///
    /// Formula: `p = (1 - e^(-k * n / m))^k`. No range check is applied; degenerate
    /// inputs can yield values at or near 0 or 1.
    pub fn false_positive_probability(num_bits: u64, num_hashes: u64, max_items: u64) -> f64 {
        let m = num_bits as f64;
        let k = num_hashes as f64;
        let n = max_items as f64;
        (1.0 - (-k * n / m).exp()).powf(k)
    }
}
