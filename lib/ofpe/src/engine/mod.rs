// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! The packet engine.
//!
//! Bottom up: [`buf`] owns the bytes, the per-protocol modules lay
//! headers over them, [`headers`] chains those views, [`parse`]
//! builds the chain and [`match_set`], and [`action`] edits all three
//! together.

pub mod action;
pub mod arp;
pub mod buf;
pub mod checksum;
pub mod ether;
pub mod headers;
pub mod icmp;
pub mod ip4;
pub mod match_set;
pub mod mpls;
pub mod packet;
pub(crate) mod parse;
pub mod ppp;
pub mod pppoe;
pub mod tcp;
pub mod udp;
pub mod vlan;

pub use buf::PktBuf;
pub use headers::HeaderChain;
pub use headers::HeaderKind;
pub use headers::HeaderType;
pub use headers::HeaderView;
pub use headers::SearchDir;
pub use match_set::MatchHits;
pub use match_set::MatchSet;
pub use packet::Packet;
pub use packet::PacketError;
pub use packet::PacketFlags;
pub use packet::PacketResult;
