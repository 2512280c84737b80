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

//! Hashing primitives that turn a key into the bit positions of a filter.
//!
//! [`murmurhash3_x64_128`] provides the underlying 128-bit mix, and [`HashExpander`] is the
//! seam through which a [`BloomFilter`](crate::bloom::BloomFilter) obtains its `k` hash
//! values. [`Murmur3Expander`] is the default implementation.

mod expander;
mod murmurhash;

pub use self::expander::HashExpander;
pub use self::expander::Murmur3Expander;
pub use self::murmurhash::murmurhash3_x64_128;

/// The seed used by [`Murmur3Expander::default`].
///
/// Filters that exchange bits through merge or import must hash with the same seed,
/// otherwise the same key maps to different bit positions on each side.
pub const DEFAULT_SEED: u32 = 0xbeefeebb;
