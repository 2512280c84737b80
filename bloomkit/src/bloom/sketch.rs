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

use super::serialization::FLAGS_IS_EMPTY;
use super::serialization::HEADER_BYTES;
use super::serialization::PARAMS_BYTES;
use super::serialization::SERIAL_VERSION;
use super::BloomFilterBuilder;
use crate::codec::FilterBytes;
use crate::codec::FilterSlice;
use crate::error::Error;
use crate::error::ErrorKind;
use crate::hash::HashExpander;
use crate::hash::Murmur3Expander;

/// A Bloom filter for probabilistic set membership testing.
///
/// The filter is either *unconfigured* (all parameters zero, no bit buffer) or
/// *configured* with a bit count `m`, hash count `k`, expected item count `n`, false
/// positive probability `p` and a zero-initialized buffer of `ceil(m / 8)` bytes.
///
/// Bit `i` of the filter lives in byte `i / 8` at position `i % 8` (least significant bit
/// first), so [`raw()`](Self::raw) can be shipped to another process and restored with
/// [`adopt()`](Self::adopt).
///
/// Hash values come from an injected [`HashExpander`], [`Murmur3Expander`] by default.
///
/// The filter has no interior synchronization: concurrent readers are fine, but any
/// mutation (`add`, `merge`, reconfiguration) needs exclusive access, which `&mut self`
/// already enforces.
#[derive(Debug, Clone, PartialEq)]
pub struct BloomFilter<H = Murmur3Expander> {
    /// Total number of bits in the filter (m)
    num_bits: u64,
    /// Number of hash values per key (k)
    num_hashes: u64,
    /// Item count the filter was sized for (n)
    expected_items: u64,
    /// False positive probability (p)
    fpp: f64,
    /// Length = ceil(num_bits / 8), or 0 when unconfigured
    bits: Vec<u8>,
    hasher: H,
}

impl BloomFilter {
    /// Creates an unconfigured filter with the default hash expander.
    ///
    /// # Examples
    ///
    /// ```
    /// # use bloomkit::bloom::BloomFilter;
    /// let mut filter = BloomFilter::new();
    /// assert!(!filter.is_configured());
    /// assert!(filter.add("apple").is_err());
    /// assert!(!filter.contains("apple"));
    /// assert_eq!(filter.raw(), None);
    /// ```
    pub fn new() -> Self {
        Self::with_hasher(Murmur3Expander::default())
    }

    /// Deserializes a filter hashed with the default [`Murmur3Expander`].
    ///
    /// The serialized form does not carry the expander; filters built with a custom seed
    /// must be restored with [`deserialize_with_hasher()`](Self::deserialize_with_hasher).
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidData`](crate::error::ErrorKind::InvalidData) if the bytes
    /// are truncated, carry an unknown serial version, or describe an invalid filter.
    ///
    /// # Examples
    ///
    /// ```
    /// # use bloomkit::bloom::BloomFilter;
    /// # use bloomkit::bloom::BloomFilterBuilder;
    /// let mut filter = BloomFilterBuilder::with_accuracy(100, 0.01).build()?;
    /// filter.add("test")?;
    ///
    /// let restored = BloomFilter::deserialize(&filter.serialize())?;
    /// assert!(restored.contains("test"));
    /// assert_eq!(restored, filter);
    /// # Ok::<(), bloomkit::error::Error>(())
    /// ```
    pub fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
        Self::deserialize_with_hasher(bytes, Murmur3Expander::default())
    }
}

impl<H: HashExpander + Default> Default for BloomFilter<H> {
    fn default() -> Self {
        Self::with_hasher(H::default())
    }
}

impl<H: HashExpander> BloomFilter<H> {
    /// Creates an unconfigured filter that obtains its hash values from `hasher`.
    pub fn with_hasher(hasher: H) -> Self {
        BloomFilter {
            num_bits: 0,
            num_hashes: 0,
            expected_items: 0,
            fpp: 0.0,
            bits: Vec::new(),
            hasher,
        }
    }

    /// Configures the filter from an explicit bit count, hash count and item count.
    ///
    /// The false positive probability is derived as `(1 - e^(-k * n / m))^k` and is not
    /// range checked. Any previous configuration and content is discarded.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidArgument`](crate::error::ErrorKind::InvalidArgument) if
    /// any count is zero or the bit buffer cannot be allocated. The filter is left unchanged
    /// on error.
    ///
    /// # Examples
    ///
    /// ```
    /// # use bloomkit::bloom::BloomFilter;
    /// let mut filter = BloomFilter::new();
    /// filter.config_exact(1024, 2, 3)?;
    /// assert_eq!(filter.bit_count(), 1024);
    /// assert_eq!(filter.size(), 128);
    ///
    /// assert!(filter.config_exact(0, 2, 3).is_err());
    /// assert_eq!(filter.bit_count(), 1024);
    /// # Ok::<(), bloomkit::error::Error>(())
    /// ```
    pub fn config_exact(
        &mut self,
        num_bits: u64,
        num_hashes: u64,
        expected_items: u64,
    ) -> Result<(), Error> {
        if num_bits == 0 || num_hashes == 0 || expected_items == 0 {
            log::debug!(
                "rejected exact config: m={num_bits} k={num_hashes} n={expected_items}"
            );
            return Err(Error::invalid_argument(
                "bit count, hash count and expected elements must be nonzero",
            )
            .with_context("bit_count", num_bits)
            .with_context("hash_count", num_hashes)
            .with_context("expected_elements", expected_items));
        }

        let fpp =
            BloomFilterBuilder::false_positive_probability(num_bits, num_hashes, expected_items);
        let bits = zeroed_bits(num_bits)?;
        self.install(num_bits, num_hashes, expected_items, fpp, bits);
        Ok(())
    }

    /// Configures the filter for `expected_items` keys at a target false positive
    /// probability.
    ///
    /// The bit count and hash count are derived with
    /// [`BloomFilterBuilder::suggest_num_bits`] and
    /// [`BloomFilterBuilder::suggest_num_hashes`]; `fpp` is stored as given. Any previous
    /// configuration and content is discarded.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidArgument`](crate::error::ErrorKind::InvalidArgument) if
    /// `expected_items` is zero, `fpp` is not strictly inside `(0, 1)`, or the derived bit
    /// buffer cannot be allocated. The filter is left unchanged on error.
    pub fn config_target(&mut self, expected_items: u64, fpp: f64) -> Result<(), Error> {
        if expected_items == 0 || !(fpp > 0.0 && fpp < 1.0) {
            log::debug!("rejected target config: n={expected_items} p={fpp}");
            return Err(Error::invalid_argument(
                "expected elements must be nonzero and fpp must be in (0, 1)",
            )
            .with_context("expected_elements", expected_items)
            .with_context("fpp", fpp));
        }

        let num_bits = BloomFilterBuilder::suggest_num_bits(expected_items, fpp);
        let num_hashes = BloomFilterBuilder::suggest_num_hashes(expected_items, num_bits);
        let bits = zeroed_bits(num_bits)?;
        self.install(num_bits, num_hashes, expected_items, fpp, bits);
        Ok(())
    }

    /// Replaces this filter with one produced elsewhere, for example received over the
    /// network as `(m, k, n, p, raw)`.
    ///
    /// `raw` is copied into a buffer owned by the filter. It must be exactly
    /// `ceil(num_bits / 8)` bytes long; a mismatch usually means the bytes belong to a
    /// filter with different parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidData`](crate::error::ErrorKind::InvalidData) if `raw` is
    /// empty or has the wrong length, and
    /// [`ErrorKind::InvalidArgument`](crate::error::ErrorKind::InvalidArgument) if `fpp` is
    /// outside `(0, 1)` or `num_hashes` or `expected_items` is zero. The filter is left
    /// unchanged on error.
    ///
    /// # Examples
    ///
    /// ```
    /// # use bloomkit::bloom::BloomFilter;
    /// let raw = vec![0xA5; 4096];
    /// let mut filter = BloomFilter::new();
    /// filter.adopt(32768, 9, 1001, 0.000002679, &raw)?;
    /// assert_eq!(filter.raw(), Some(&raw[..]));
    ///
    /// assert!(filter.adopt(32768, 9, 1001, 0.000002679, &raw[1..]).is_err());
    /// # Ok::<(), bloomkit::error::Error>(())
    /// ```
    pub fn adopt(
        &mut self,
        num_bits: u64,
        num_hashes: u64,
        expected_items: u64,
        fpp: f64,
        raw: &[u8],
    ) -> Result<(), Error> {
        if expected_items == 0 || num_hashes == 0 || !(fpp > 0.0 && fpp < 1.0) {
            log::debug!("rejected adopt: k={num_hashes} n={expected_items} p={fpp}");
            return Err(Error::invalid_argument(
                "hash count and expected elements must be nonzero and fpp must be in (0, 1)",
            )
            .with_context("hash_count", num_hashes)
            .with_context("expected_elements", expected_items)
            .with_context("fpp", fpp));
        }

        let expected_len = num_bits.div_ceil(8);
        if raw.is_empty() || raw.len() as u64 != expected_len {
            log::debug!(
                "rejected adopt: m={num_bits} wants {expected_len} bytes, got {}",
                raw.len()
            );
            return Err(Error::invalid_data("raw buffer length mismatch")
                .with_context("expected", expected_len)
                .with_context("actual", raw.len()));
        }

        self.install(num_bits, num_hashes, expected_items, fpp, raw.to_vec());
        Ok(())
    }

    /// Inserts a key into the filter.
    ///
    /// After a successful insertion, `contains(key)` returns `true` until the filter is
    /// reset or reconfigured. Inserting the same key again changes nothing.
    ///
    /// Insertion is all-or-nothing: if the hash expander does not return exactly `k`
    /// values, no bit is written.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::NotConfigured`](crate::error::ErrorKind::NotConfigured) on an
    /// unconfigured filter,
    /// [`ErrorKind::InvalidArgument`](crate::error::ErrorKind::InvalidArgument) if `k` hash
    /// values cannot be held in memory, and
    /// [`ErrorKind::HashContractViolation`](crate::error::ErrorKind::HashContractViolation)
    /// if the expander misbehaves.
    ///
    /// # Examples
    ///
    /// ```
    /// # use bloomkit::bloom::BloomFilterBuilder;
    /// let mut filter = BloomFilterBuilder::with_accuracy(100, 0.01).build()?;
    ///
    /// filter.add("apple")?;
    /// filter.add(b"raw bytes")?;
    /// filter.add(42_u64.to_le_bytes())?;
    ///
    /// assert!(filter.contains("apple"));
    /// # Ok::<(), bloomkit::error::Error>(())
    /// ```
    pub fn add(&mut self, key: impl AsRef<[u8]>) -> Result<(), Error> {
        if !self.is_configured() {
            return Err(Error::not_configured("add to"));
        }

        let hashes = self.compute_hashes(key.as_ref())?;
        self.set_bits(&hashes);
        Ok(())
    }

    /// Tests whether a key is possibly in the set.
    ///
    /// Returns:
    /// - `true`: Key was **possibly** inserted (or false positive)
    /// - `false`: Key was **definitely not** inserted, the filter is unconfigured, or the
    ///   hash expander did not return exactly `k` values
    pub fn contains(&self, key: impl AsRef<[u8]>) -> bool {
        if !self.is_configured() {
            return false;
        }

        match self.compute_hashes(key.as_ref()) {
            Ok(hashes) => self.check_bits(&hashes),
            Err(_) => false,
        }
    }

    /// Tests and inserts a key using a single round of hashing.
    ///
    /// Returns whether the key was possibly present before this insertion.
    ///
    /// # Examples
    ///
    /// ```
    /// # use bloomkit::bloom::BloomFilterBuilder;
    /// let mut filter = BloomFilterBuilder::with_accuracy(100, 0.01).build()?;
    /// assert!(!filter.contains_and_add("apple")?);
    /// assert!(filter.contains_and_add("apple")?);
    /// # Ok::<(), bloomkit::error::Error>(())
    /// ```
    pub fn contains_and_add(&mut self, key: impl AsRef<[u8]>) -> Result<bool, Error> {
        if !self.is_configured() {
            return Err(Error::not_configured("add to"));
        }

        let hashes = self.compute_hashes(key.as_ref())?;
        let was_present = self.check_bits(&hashes);
        self.set_bits(&hashes);
        Ok(was_present)
    }

    /// Merges another filter into this one via bitwise OR (union).
    ///
    /// Afterwards this filter reports every key that was added to either filter. The false
    /// positive rate of the result is that of the combined bit pattern, which is usually
    /// worse than either input. `other` is not modified.
    ///
    /// Both filters must hash with equivalent expanders; only the bit count can be
    /// checked here.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::NotConfigured`](crate::error::ErrorKind::NotConfigured) if either
    /// filter is unconfigured and
    /// [`ErrorKind::IncompatibleFilters`](crate::error::ErrorKind::IncompatibleFilters) if the
    /// bit counts differ. This filter is left unchanged on error.
    ///
    /// # Examples
    ///
    /// ```
    /// # use bloomkit::bloom::BloomFilterBuilder;
    /// let mut f1 = BloomFilterBuilder::with_accuracy(100, 0.01).build()?;
    /// let mut f2 = BloomFilterBuilder::with_accuracy(100, 0.01).build()?;
    ///
    /// f1.add("a")?;
    /// f2.add("b")?;
    ///
    /// f1.merge(&f2)?;
    /// assert!(f1.contains("a"));
    /// assert!(f1.contains("b"));
    /// # Ok::<(), bloomkit::error::Error>(())
    /// ```
    pub fn merge(&mut self, other: &BloomFilter<H>) -> Result<(), Error> {
        if !self.is_configured() {
            return Err(Error::not_configured("merge into"));
        }
        if !other.is_configured() {
            return Err(Error::not_configured("merge from"));
        }
        if !self.is_compatible(other) || self.bits.len() != other.bits.len() {
            log::debug!(
                "rejected merge: m={} vs m={}",
                self.num_bits,
                other.num_bits
            );
            return Err(Error::incompatible_bit_count(
                self.num_bits,
                other.num_bits,
            ));
        }

        for (byte, other_byte) in self.bits.iter_mut().zip(&other.bits) {
            *byte |= *other_byte;
        }
        Ok(())
    }

    /// Clears all bits while keeping the configuration.
    pub fn reset(&mut self) {
        log::trace!("resetting bloom filter with {} bytes", self.bits.len());
        self.bits.fill(0);
    }

    /// Moves the configuration and bits out of this filter, leaving it unconfigured.
    ///
    /// The source keeps (a copy of) its hash expander, so it can be configured again.
    ///
    /// # Examples
    ///
    /// ```
    /// # use bloomkit::bloom::BloomFilter;
    /// let mut filter = BloomFilter::new();
    /// filter.config_exact(1024, 2, 3)?;
    ///
    /// let moved = filter.take();
    /// assert_eq!(moved.bit_count(), 1024);
    /// assert_eq!(filter.bit_count(), 0);
    /// assert_eq!(filter.raw(), None);
    /// # Ok::<(), bloomkit::error::Error>(())
    /// ```
    pub fn take(&mut self) -> BloomFilter<H>
    where
        H: Clone,
    {
        let empty = BloomFilter::with_hasher(self.hasher.clone());
        std::mem::replace(self, empty)
    }

    /// Returns whether the filter can accept keys.
    pub fn is_configured(&self) -> bool {
        self.num_bits != 0 && self.num_hashes != 0 && self.expected_items != 0 && self.fpp != 0.0
    }

    /// Returns the total number of bits in the filter (m).
    pub fn bit_count(&self) -> u64 {
        self.num_bits
    }

    /// Returns the number of hash values computed per key (k).
    pub fn hash_count(&self) -> u64 {
        self.num_hashes
    }

    /// Returns the item count the filter was sized for (n).
    pub fn expected_elements(&self) -> u64 {
        self.expected_items
    }

    /// Returns the configured or derived false positive probability (p).
    pub fn false_positive(&self) -> f64 {
        self.fpp
    }

    /// Returns the length of the bit buffer in bytes.
    pub fn size(&self) -> usize {
        self.bits.len()
    }

    /// Returns the bit buffer, or `None` when the filter is unconfigured.
    pub fn raw(&self) -> Option<&[u8]> {
        if self.bits.is_empty() {
            None
        } else {
            Some(&self.bits)
        }
    }

    /// Returns the hash expander of this filter.
    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// Returns the number of bits set to 1.
    pub fn bits_used(&self) -> u64 {
        self.bits.iter().map(|byte| u64::from(byte.count_ones())).sum()
    }

    /// Returns the fraction of bits set.
    ///
    /// Values near 0.5 indicate the filter has reached its design capacity.
    pub fn load_factor(&self) -> f64 {
        if self.num_bits == 0 {
            return 0.0;
        }
        self.bits_used() as f64 / self.num_bits as f64
    }

    /// Estimates the current false positive probability as `load_factor^k`.
    ///
    /// Unlike [`false_positive()`](Self::false_positive) this reflects what has actually
    /// been inserted.
    pub fn estimated_fpp(&self) -> f64 {
        self.load_factor().powf(self.num_hashes as f64)
    }

    /// Checks if two filters can be merged, i.e. have the same bit count.
    pub fn is_compatible(&self, other: &BloomFilter<H>) -> bool {
        self.num_bits == other.num_bits
    }

    /// Serializes the filter as `(m, k, n, p, bits)` behind a small header.
    ///
    /// An unconfigured filter serializes to the header alone.
    pub fn serialize(&self) -> Vec<u8> {
        let is_empty = self.bits.is_empty();
        let capacity = if is_empty {
            HEADER_BYTES
        } else {
            HEADER_BYTES + PARAMS_BYTES + self.bits.len()
        };
        let mut bytes = FilterBytes::with_capacity(capacity);

        bytes.write_u8(SERIAL_VERSION);
        bytes.write_u8(if is_empty { FLAGS_IS_EMPTY } else { 0 });
        bytes.write_u16_le(0); // unused
        bytes.write_u32_le(0); // unused

        if !is_empty {
            bytes.write_u64_le(self.num_bits);
            bytes.write_u64_le(self.num_hashes);
            bytes.write_u64_le(self.expected_items);
            bytes.write_f64_le(self.fpp);
            bytes.write(&self.bits);
        }

        bytes.into_bytes()
    }

    /// Deserializes a filter and attaches `hasher` to it.
    ///
    /// The decoded parameters go through [`adopt()`](Self::adopt), so the same validation
    /// applies.
    pub fn deserialize_with_hasher(bytes: &[u8], hasher: H) -> Result<Self, Error> {
        let mut cursor = FilterSlice::new(bytes);

        let serial_version = cursor
            .read_u8()
            .map_err(|_| Error::insufficient_data("serial_version"))?;
        let flags = cursor
            .read_u8()
            .map_err(|_| Error::insufficient_data("flags"))?;
        cursor
            .read_u16_le()
            .map_err(|_| Error::insufficient_data("header"))?;
        cursor
            .read_u32_le()
            .map_err(|_| Error::insufficient_data("header"))?;

        if serial_version != SERIAL_VERSION {
            return Err(Error::unsupported_serial_version(
                SERIAL_VERSION,
                serial_version,
            ));
        }

        let mut filter = BloomFilter::with_hasher(hasher);
        if flags & FLAGS_IS_EMPTY != 0 {
            if cursor.remaining() != 0 {
                return Err(Error::invalid_data("unexpected bytes after empty filter header")
                    .with_context("trailing", cursor.remaining()));
            }
            return Ok(filter);
        }

        let num_bits = cursor
            .read_u64_le()
            .map_err(|_| Error::insufficient_data("bit_count"))?;
        let num_hashes = cursor
            .read_u64_le()
            .map_err(|_| Error::insufficient_data("hash_count"))?;
        let expected_items = cursor
            .read_u64_le()
            .map_err(|_| Error::insufficient_data("expected_elements"))?;
        let fpp = cursor
            .read_f64_le()
            .map_err(|_| Error::insufficient_data("fpp"))?;
        let raw = cursor
            .read_slice(cursor.remaining())
            .map_err(|_| Error::insufficient_data("bit_array"))?;

        filter
            .adopt(num_bits, num_hashes, expected_items, fpp, raw)
            .map_err(|err| match err.kind() {
                ErrorKind::InvalidData => err,
                _ => Error::invalid_data(format!("invalid filter parameters: {err}")),
            })?;
        Ok(filter)
    }

    /// Replaces every field at once; callers validate before calling.
    fn install(
        &mut self,
        num_bits: u64,
        num_hashes: u64,
        expected_items: u64,
        fpp: f64,
        bits: Vec<u8>,
    ) {
        log::debug!(
            "configured bloom filter: m={num_bits} k={num_hashes} n={expected_items} p={fpp} bytes={}",
            bits.len()
        );
        self.num_bits = num_bits;
        self.num_hashes = num_hashes;
        self.expected_items = expected_items;
        self.fpp = fpp;
        self.bits = bits;
    }

    /// Obtains exactly `k` hash values for `key` from the expander.
    fn compute_hashes(&self, key: &[u8]) -> Result<Vec<u64>, Error> {
        let mut hashes = Vec::new();
        let reserved = usize::try_from(self.num_hashes)
            .is_ok_and(|k| hashes.try_reserve_exact(k).is_ok());
        if !reserved {
            return Err(
                Error::invalid_argument("hash count exceeds the addressable memory")
                    .with_context("hash_count", self.num_hashes),
            );
        }
        self.hasher.expand_into(key, self.num_hashes, &mut hashes);
        if hashes.len() as u64 != self.num_hashes {
            log::warn!(
                "hash expander returned {} values, expected {}",
                hashes.len(),
                self.num_hashes
            );
            return Err(Error::hash_count_mismatch(self.num_hashes, hashes.len()));
        }
        Ok(hashes)
    }

    /// Checks if all bits addressed by `hashes` are set.
    fn check_bits(&self, hashes: &[u64]) -> bool {
        hashes.iter().all(|&hash| self.get_bit(hash % self.num_bits))
    }

    /// Sets all bits addressed by `hashes`.
    fn set_bits(&mut self, hashes: &[u64]) {
        for &hash in hashes {
            self.set_bit(hash % self.num_bits);
        }
    }

    fn get_bit(&self, bit_index: u64) -> bool {
        let (byte_index, mask) = locate(bit_index);
        self.bits[byte_index] & mask != 0
    }

    fn set_bit(&mut self, bit_index: u64) {
        let (byte_index, mask) = locate(bit_index);
        self.bits[byte_index] |= mask;
    }
}

/// Maps a bit index to its byte index and the mask of the bit within that byte.
#[inline]
fn locate(bit_index: u64) -> (usize, u8) {
    ((bit_index >> 3) as usize, 1u8 << (bit_index & 7))
}

/// Allocates the zeroed buffer for `num_bits` bits, at least one byte long.
///
/// Allocation failure is reported instead of aborting the process.
fn zeroed_bits(num_bits: u64) -> Result<Vec<u8>, Error> {
    let too_large = || {
        Error::invalid_argument("bit count exceeds the addressable memory")
            .with_context("bit_count", num_bits)
    };

    let byte_count = usize::try_from(num_bits.div_ceil(8))
        .map_err(|_| too_large())?
        .max(1);
    let mut bits = Vec::new();
    bits.try_reserve_exact(byte_count).map_err(|_| too_large())?;
    bits.resize(byte_count, 0);
    Ok(bits)
}
