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

use super::murmurhash3_x64_128;
use super::DEFAULT_SEED;

/// A source of `k` hash values per key, used to pick the bit positions of a filter.
///
/// Implementations must be deterministic for a fixed key and `k`, must produce exactly
/// `k` values, and should yield different sequences for different seeds. A filter only
/// ever compares bit positions produced by its own expander, so two filters that share
/// data (merge, import) need equivalent expanders.
pub trait HashExpander {
    /// Appends exactly `k` hash values for `key` to `out`.
    fn expand_into(&self, key: &[u8], k: u64, out: &mut Vec<u64>);

    /// Returns `k` hash values for `key`.
    fn expand(&self, key: &[u8], k: u64) -> Vec<u64> {
        let mut out = Vec::new();
        self.expand_into(key, k, &mut out);
        out
    }
}

/// The default expander: one seeded 128-bit MurmurHash3 pass split into two 64-bit
/// halves, stretched to `k` values with the Kirsch-Mitzenmacher construction.
///
/// # Examples
///
/// ```
/// # use bloomkit::hash::HashExpander;
/// # use bloomkit::hash::Murmur3Expander;
/// let expander = Murmur3Expander::default();
/// let hashes = expander.expand(b"apple", 7);
/// assert_eq!(hashes.len(), 7);
/// assert_eq!(hashes, expander.expand(b"apple", 7));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Murmur3Expander {
    seed: u32,
}

impl Murmur3Expander {
    /// Creates an expander whose output is perturbed by `seed`.
    pub fn with_seed(seed: u32) -> Self {
        Murmur3Expander { seed }
    }

    /// Returns the seed of this expander.
    pub fn seed(&self) -> u32 {
        self.seed
    }
}

impl Default for Murmur3Expander {
    fn default() -> Self {
        Self::with_seed(DEFAULT_SEED)
    }
}

impl HashExpander for Murmur3Expander {
    fn expand_into(&self, key: &[u8], k: u64, out: &mut Vec<u64>) {
        if k == 0 {
            return;
        }

        let (mut h1, mut h2) = murmurhash3_x64_128(key, u64::from(self.seed));
        out.push(h1);
        if k == 1 {
            return;
        }
        out.push(h2);

        // Each new value is a linear combination of the previous two; the pair then
        // slides forward so the next value builds on the one just emitted.
        for i in 3..=k {
            let g = h1.wrapping_add(i.wrapping_mul(h2));
            out.push(g);
            h1 = h2;
            h2 = g;
        }
    }
}
