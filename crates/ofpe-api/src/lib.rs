// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Types shared between the packet engine and its consumers: addresses,
//! OpenFlow Extensible Match (OXM) fields, action descriptors, and
//! packet configuration.

#![no_std]
#![deny(unreachable_patterns)]
#![deny(unused_must_use)]

#[cfg(any(feature = "std", test))]
#[macro_use]
extern crate std;

#[macro_use]
extern crate alloc;

pub mod action;
pub mod cfg;
pub mod ip;
pub mod mac;
pub mod oxm;

pub use action::*;
pub use cfg::*;
pub use ip::*;
pub use mac::*;
pub use oxm::*;

/// The OpenFlow port number reserved for the controller.
///
/// Packets which did not arrive on a datapath port (e.g. those built
/// by a controller for a Packet-Out) carry this as their ingress port.
pub const OFPP_CONTROLLER: u32 = 0xffff_fffd;

/// The OpenFlow port number meaning "no port".
pub const OFPP_ANY: u32 = 0xffff_ffff;
