// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! IP-version neutral prefixes and the longest-prefix-match trie used to
//! back a per-VRF, per-address-family route table.
//!
//! This crate knows nothing about routes, clients, or VRFs: it is the
//! generic C2 layer other crates build a RIB on top of.

pub mod prefix;
pub mod trie;

pub use prefix::Prefix;
pub use trie::{IpPrefixTrie, NetPrefix};
