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

//! Bloom Filter implementation for probabilistic set membership testing.
//!
//! A Bloom filter is a space-efficient probabilistic data structure used to test whether
//! a key is a member of a set. False positive matches are possible, but false negatives
//! are not. In other words, a query returns either "possibly in set" or "definitely not in set".
//! Keys cannot be removed.
//!
//! # Properties
//!
//! - **No false negatives**: If a key was added, `contains()` will always return `true`
//! - **Possible false positives**: `contains()` may return `true` for keys never added
//! - **Fixed size**: The bit buffer is sized once, on configuration
//! - **Portable bits**: The buffer is plain bytes and can be exported with `raw()` and
//!   imported with `adopt()`
//!
//! # Usage
//!
//! ```rust
//! use bloomkit::bloom::BloomFilter;
//!
//! let mut filter = BloomFilter::new();
//!
//! // Size the filter for 1000 keys with a 1% false positive rate
//! filter.config_target(1000, 0.01)?;
//!
//! filter.add("apple")?;
//! filter.add(b"banana")?;
//!
//! assert!(filter.contains("apple")); // true - definitely added
//! assert!(!filter.contains("grape")); // false - never added (probably)
//!
//! println!("Bits: {}", filter.bit_count());
//! println!("Hashes: {}", filter.hash_count());
//! println!("Bytes: {}", filter.size());
//! # Ok::<(), bloomkit::error::Error>(())
//! ```
//!
//! # Configuring Filters
//!
//! A filter starts unconfigured; `add()` fails and `contains()` returns `false` until it is
//! configured in one of three ways:
//!
//! - [`BloomFilter::config_target()`]: expected keys and target false positive rate
//!   (recommended)
//! - [`BloomFilter::config_exact()`]: bit count, hash count and expected keys
//! - [`BloomFilter::adopt()`]: parameters and bits of a filter built elsewhere
//!
//! Reconfiguring discards all previous content. A failed configuration leaves the filter as
//! it was. [`BloomFilterBuilder`] wraps the first two with a seed option:
//!
//! ```rust
//! # use bloomkit::bloom::BloomFilterBuilder;
//! let filter = BloomFilterBuilder::with_accuracy(
//!     10_000, // Expected keys
//!     0.01,   // Target false positive probability (1%)
//! )
//! .seed(9001) // Optional: custom seed
//! .build()?;
//! # Ok::<(), bloomkit::error::Error>(())
//! ```
//!
//! # Exchanging Filters
//!
//! A configured filter is fully described by `(m, k, n, p, bytes)`:
//!
//! ```rust
//! # use bloomkit::bloom::BloomFilter;
//! let mut sender = BloomFilter::new();
//! sender.config_target(100, 0.01)?;
//! sender.add("a")?;
//!
//! let mut receiver = BloomFilter::new();
//! receiver.adopt(
//!     sender.bit_count(),
//!     sender.hash_count(),
//!     sender.expected_elements(),
//!     sender.false_positive(),
//!     sender.raw().unwrap_or_default(),
//! )?;
//! assert!(receiver.contains("a"));
//! # Ok::<(), bloomkit::error::Error>(())
//! ```
//!
//! [`BloomFilter::serialize()`] and [`BloomFilter::deserialize()`] pack the same five fields
//! into a single byte vector.
//!
//! # Implementation Details
//!
//! - Uses 128-bit MurmurHash3 (x64) for hashing, seeded with `0xbeefeebb` by default
//! - Expands the two 64-bit halves into k values with the Kirsch-Mitzenmacher method
//! - Bit `i` is stored in byte `i / 8`, least significant bit first
//!
//! # References
//!
//! - Bloom, Burton H. (1970). "Space/time trade-offs in hash coding with allowable errors"
//! - Kirsch and Mitzenmacher (2008). "Less Hashing, Same Performance: Building a Better Bloom
//!   Filter"

mod builder;
mod serialization;
mod sketch;

pub use self::builder::BloomFilterBuilder;
pub use self::sketch::BloomFilter;
