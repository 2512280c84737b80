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

use bloomkit::bloom::BloomFilter;
use bloomkit::bloom::BloomFilterBuilder;
use bloomkit::error::ErrorKind;
use googletest::assert_that;
use googletest::prelude::eq;
use googletest::prelude::near;

fn patterned_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 131 + 7) as u8).collect()
}

fn assert_unconfigured(filter: &BloomFilter) {
    assert_eq!(filter.bit_count(), 0);
    assert_eq!(filter.hash_count(), 0);
    assert_eq!(filter.expected_elements(), 0);
    assert_eq!(filter.false_positive(), 0.0);
    assert_eq!(filter.size(), 0);
    assert_eq!(filter.raw(), None);
    assert!(!filter.is_configured());
}

#[test]
fn test_empty_filter() {
    let mut filter = BloomFilter::new();
    assert_unconfigured(&filter);

    assert_eq!(
        filter.add("apple").unwrap_err().kind(),
        ErrorKind::NotConfigured
    );
    assert!(!filter.contains("apple"));
    assert!(!filter.contains(""));
    assert_unconfigured(&filter);
}

#[test]
fn test_ownership_transfer() {
    let mut bf = BloomFilter::new();
    bf.config_exact(1024, 2, 3).unwrap();
    bf.add("kept across moves").unwrap();
    assert_eq!(bf.size(), 128);

    let mut bf2 = bf.take();
    assert_unconfigured(&bf);
    assert_eq!(bf2.bit_count(), 1024);
    assert_eq!(bf2.hash_count(), 2);
    assert_eq!(bf2.expected_elements(), 3);
    assert!(bf2.false_positive() > 0.0);
    assert_eq!(bf2.size(), 128);
    assert!(bf2.raw().is_some());
    assert!(bf2.contains("kept across moves"));

    bf = bf2.take();
    assert_unconfigured(&bf2);
    assert_eq!(bf.bit_count(), 1024);
    assert_eq!(bf.hash_count(), 2);
    assert_eq!(bf.expected_elements(), 3);
    assert_eq!(bf.size(), 128);
    assert!(bf.contains("kept across moves"));

    // the emptied source can be configured again
    bf2.config_exact(64, 1, 1).unwrap();
    assert!(bf2.is_configured());
}

#[test]
fn test_clone_duplicates_the_buffer() {
    let mut original = BloomFilter::new();
    original.config_exact(256, 3, 10).unwrap();
    let copy = original.clone();

    original.add("only in original").unwrap();
    assert!(original.contains("only in original"));
    assert_eq!(copy.bits_used(), 0);
    assert_ne!(original.raw(), copy.raw());
}

#[test]
fn test_exact_parameters() {
    let mut bf = BloomFilter::new();
    bf.config_exact(1024, 10, 1024 * 2).unwrap();
    assert_eq!(bf.bit_count(), 1024);
    assert_eq!(bf.hash_count(), 10);
    assert_eq!(bf.expected_elements(), 1024 * 2);
    assert_that!(bf.false_positive(), near(0.999999979, 0.0000000009));
    assert_eq!(bf.size(), 128);
    assert!(bf.raw().is_some());
}

#[test]
fn test_exact_parameters_round_trip() {
    for (m, k, n) in [(1, 1, 1), (7, 3, 2), (8, 1, 100), (9, 4, 4), (100_003, 7, 10_000)] {
        let mut bf = BloomFilter::new();
        bf.config_exact(m, k, n).unwrap();
        assert_eq!(bf.bit_count(), m);
        assert_eq!(bf.hash_count(), k);
        assert_eq!(bf.expected_elements(), n);

        let expected = (1.0 - (-(k as f64) * n as f64 / m as f64).exp()).powf(k as f64);
        assert_that!(bf.false_positive(), near(expected, 1e-12));
        assert_eq!(bf.size() as u64, m.div_ceil(8).max(1));
        assert!(bf.raw().unwrap().iter().all(|&b| b == 0));
    }
}

#[test]
fn test_target_parameters() {
    let mut bf = BloomFilter::new();
    bf.config_target(553, 0.002).unwrap();
    assert_eq!(bf.bit_count(), 7153);
    assert_eq!(bf.hash_count(), 9);
    assert_eq!(bf.expected_elements(), 553);
    assert_that!(bf.false_positive(), near(0.002, 0.0009));
    assert_eq!(bf.size(), 895);

    bf.config_target(58123, 0.00000001).unwrap();
    assert_eq!(bf.bit_count(), 2228450);
    assert_eq!(bf.hash_count(), 27);
    assert_eq!(bf.expected_elements(), 58123);
    assert_eq!(bf.size(), 278557);
}

#[test]
fn test_target_parameters_round_trip() {
    for (n, p) in [(100, 0.1), (1000, 0.01), (553, 0.002), (10_000, 0.0001)] {
        let mut bf = BloomFilter::new();
        bf.config_target(n, p).unwrap();
        assert_eq!(bf.false_positive(), p);

        let derived =
            BloomFilterBuilder::false_positive_probability(bf.bit_count(), bf.hash_count(), n);
        assert_that!(derived, near(p, p * 0.25));
        assert_eq!(bf.size() as u64, bf.bit_count().div_ceil(8));
    }
}

#[test]
fn test_invalid_parameters_preserve_state() {
    let mut bf = BloomFilter::new();
    assert!(bf.config_target(0, 0.5).is_err());
    assert!(bf.config_target(0, 1.0).is_err());
    assert!(bf.config_target(0, 1.5).is_err());
    assert!(bf.config_target(256, 0.0).is_err());
    assert!(bf.config_target(256, 1.0).is_err());
    assert!(bf.config_target(256, -0.005).is_err());
    assert!(bf.config_target(256, f64::NAN).is_err());
    assert!(bf.config_target(0, 0.0).is_err());

    assert!(bf.config_exact(0, 256, 1024).is_err());
    assert!(bf.config_exact(256, 0, 1024).is_err());
    assert!(bf.config_exact(256, 1024, 0).is_err());
    assert!(bf.config_exact(0, 0, 0).is_err());
    assert_unconfigured(&bf);

    bf.config_exact(512, 4, 50).unwrap();
    bf.add("survivor").unwrap();
    let before = bf.clone();

    let err = bf.config_exact(0, 4, 50).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    let err = bf.config_target(50, 1.0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert_eq!(bf, before);
    assert!(bf.contains("survivor"));
}

#[test]
fn test_unallocatable_size_preserves_state() {
    let mut bf = BloomFilter::new();
    bf.config_exact(64, 2, 3).unwrap();
    bf.add("survivor").unwrap();
    let before = bf.clone();

    let err = bf.config_exact(u64::MAX, 1, 1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert_eq!(bf, before);

    // derived bit count saturates to u64::MAX
    let err = bf.config_target(u64::MAX / 2, 1e-300).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert_eq!(bf, before);
    assert!(bf.contains("survivor"));
}

#[test]
fn test_adopt_existing_data() {
    // as if received over the network
    const BYTE_COUNT: usize = 4096;
    const N: u64 = 1001;
    const M: u64 = 32768;
    const K: u64 = 9;
    const P: f64 = 0.000002679;
    let raw = patterned_bytes(BYTE_COUNT);

    let mut bf = BloomFilter::new();
    bf.adopt(M, K, N, P, &raw).unwrap();
    assert_eq!(bf.bit_count(), M);
    assert_eq!(bf.hash_count(), K);
    assert_eq!(bf.expected_elements(), N);
    assert_that!(bf.false_positive(), near(P, 0.0000000009));
    assert_eq!(bf.size(), BYTE_COUNT);
    let adopted = bf.raw().unwrap();
    assert_eq!(adopted, &raw[..]);
    assert_ne!(adopted.as_ptr(), raw.as_ptr());
}

#[test]
fn test_adopt_overrides_existing_configuration() {
    let raw = patterned_bytes(4096);

    let mut bf = BloomFilter::new();
    bf.config_target(58123, 0.00000001).unwrap();
    assert_eq!(bf.size(), 278557);

    bf.adopt(32768, 9, 1001, 0.000002679, &raw).unwrap();
    assert_eq!(bf.bit_count(), 32768);
    assert_eq!(bf.hash_count(), 9);
    assert_eq!(bf.expected_elements(), 1001);
    assert_eq!(bf.size(), 4096);
    assert_eq!(bf.raw().unwrap(), &raw[..]);
}

#[test]
fn test_adopt_rejects_malformed_input() {
    let raw = patterned_bytes(128);
    let mut bf = BloomFilter::new();
    bf.config_exact(64, 2, 8).unwrap();
    let before = bf.clone();
    let nothing: &[u8] = &[];

    let cases: [(u64, u64, u64, f64, &[u8], ErrorKind); 8] = [
        (1024, 2, 8, 0.0, &raw[..], ErrorKind::InvalidArgument),
        (1024, 2, 8, 1.0, &raw[..], ErrorKind::InvalidArgument),
        (1024, 2, 0, 0.5, &raw[..], ErrorKind::InvalidArgument),
        (1024, 0, 8, 0.5, &raw[..], ErrorKind::InvalidArgument),
        (1024, 2, 8, 0.5, nothing, ErrorKind::InvalidData),
        (1024, 2, 8, 0.5, &raw[..127], ErrorKind::InvalidData),
        (1023, 2, 8, 0.5, &raw[..127], ErrorKind::InvalidData),
        (0, 2, 8, 0.5, nothing, ErrorKind::InvalidData),
    ];
    for (m, k, n, p, bytes, kind) in cases {
        let err = bf.adopt(m, k, n, p, bytes).unwrap_err();
        assert_eq!(err.kind(), kind, "m={m} k={k} n={n} p={p} len={}", bytes.len());
        assert_eq!(bf, before);
    }

    // a partial last byte is fine as long as the length matches ceil(m / 8)
    bf.adopt(1023, 2, 8, 0.5, &raw).unwrap();
    assert_eq!(bf.size(), 128);
}

#[test]
fn test_membership_soundness() {
    let mut bf = BloomFilterBuilder::with_accuracy(500, 0.01).build().unwrap();
    let keys: Vec<String> = (0..500).map(|i| format!("member-{i}")).collect();
    for key in &keys {
        bf.add(key).unwrap();
        assert!(bf.contains(key));
    }
    // adding again changes nothing
    let snapshot = bf.raw().unwrap().to_vec();
    for key in &keys {
        bf.add(key).unwrap();
    }
    assert_eq!(bf.raw().unwrap(), &snapshot[..]);
    assert!(keys.iter().all(|key| bf.contains(key)));
}

#[test]
fn test_byte_keys_of_every_length() {
    let mut bf = BloomFilter::new();
    bf.config_target(64, 0.01).unwrap();
    let data = patterned_bytes(64);
    for len in 0..=data.len() {
        bf.add(&data[..len]).unwrap();
    }
    for len in 0..=data.len() {
        assert!(bf.contains(&data[..len]));
    }
}

#[test]
fn test_false_positive_rate() {
    for (n, p) in [(5_000, 0.05), (10_000, 0.01), (20_000, 0.001)] {
        let mut bf = BloomFilterBuilder::with_accuracy(n, p).build().unwrap();
        for i in 0..n {
            bf.add(format!("inserted-{i}")).unwrap();
        }

        let false_negatives = (0..n)
            .filter(|i| !bf.contains(format!("inserted-{i}")))
            .count();
        assert_that!(false_negatives, eq(0usize));

        let false_positives = (0..n)
            .filter(|i| bf.contains(format!("absent-{i}")))
            .count();
        let observed = false_positives as f64 / n as f64;
        assert_that!(observed, near(p, 0.02));
    }
}

#[test]
fn test_merge_is_bitwise_or() {
    let mut a = BloomFilter::new();
    a.adopt(1024, 3, 100, 0.01, &[0xAA; 128]).unwrap();
    let mut b = BloomFilter::new();
    b.adopt(1024, 3, 100, 0.01, &[0x55; 128]).unwrap();

    a.merge(&b).unwrap();
    assert!(a.raw().unwrap().iter().all(|&byte| byte == 0xFF));
    assert_eq!(a.size(), 128);
    assert!(b.raw().unwrap().iter().all(|&byte| byte == 0x55));
    assert_eq!(b.size(), 128);
}

#[test]
fn test_merge_recognizes_keys_of_both() {
    let mut left = BloomFilterBuilder::with_accuracy(100, 0.01)
        .seed(123)
        .build()
        .unwrap();
    let mut right = BloomFilterBuilder::with_accuracy(100, 0.01)
        .seed(123)
        .build()
        .unwrap();
    for i in 0..50 {
        left.add(format!("left-{i}")).unwrap();
        right.add(format!("right-{i}")).unwrap();
    }

    left.merge(&right).unwrap();
    for i in 0..50 {
        assert!(left.contains(format!("left-{i}")));
        assert!(left.contains(format!("right-{i}")));
    }
}

#[test]
fn test_merge_rejects_mismatch() {
    let mut small = BloomFilter::new();
    small.config_exact(1024, 3, 100).unwrap();
    small.add("k").unwrap();
    let before = small.clone();

    let mut large = BloomFilter::new();
    large.config_exact(2048, 3, 100).unwrap();
    let err = small.merge(&large).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IncompatibleFilters);
    assert!(!small.is_compatible(&large));

    // same byte length, different bit count
    let mut odd = BloomFilter::new();
    odd.config_exact(1023, 3, 100).unwrap();
    assert_eq!(odd.size(), small.size());
    let err = small.merge(&odd).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IncompatibleFilters);

    let empty = BloomFilter::new();
    let err = small.merge(&empty).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotConfigured);
    assert_eq!(small, before);

    let mut empty = BloomFilter::new();
    let err = empty.merge(&small).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotConfigured);
}

#[test]
fn test_contains_and_add() {
    let mut bf = BloomFilterBuilder::with_accuracy(100, 0.01).build().unwrap();
    assert!(!bf.contains_and_add(42_u64.to_le_bytes()).unwrap());
    assert!(bf.contains_and_add(42_u64.to_le_bytes()).unwrap());

    let mut empty = BloomFilter::new();
    assert_eq!(
        empty.contains_and_add("k").unwrap_err().kind(),
        ErrorKind::NotConfigured
    );
}
