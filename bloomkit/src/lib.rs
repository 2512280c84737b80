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

//! # bloomkit
//!
//! A Bloom filter over a plain byte buffer, with pluggable multi-hash expansion.
//!
//! The filter answers "definitely absent" or "possibly present" for byte keys, using far
//! less memory than an exact set. Its false positive rate is controlled by the parameters it
//! is configured with, and its bits can be exported and imported as raw bytes.
//!
//! This library is divided into modules that constitute distinct groups of functionality:
//!
//! - [`bloom`]: the filter, its builder and sizing math
//! - [`hash`]: the 128-bit mix and the [`HashExpander`](hash::HashExpander) seam
//! - [`error`]: the error type returned by fallible operations
//!
//! Diagnostics are emitted through the [`log`](https://docs.rs/log) facade; install any
//! logger to see them.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]

pub mod bloom;
pub mod error;
pub mod hash;

mod codec;
