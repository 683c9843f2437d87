// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! The OpenFlow Packet Engine.
//!
//! A packet is a byte buffer with head-room, a chain of typed header
//! views decoded from it, and the set of OXM match fields those
//! headers expose. The engine classifies raw frames and applies
//! OpenFlow actions to them in place.

#![allow(clippy::len_without_is_empty)]
#![deny(unreachable_patterns)]
#![deny(unused_must_use)]

pub use ofpe_api as api;

pub mod engine;
pub mod print;
pub mod provider;
