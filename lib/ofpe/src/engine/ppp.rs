// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! PPP framing as carried inside a PPPoE session: just the protocol
//! field.

use super::headers::HeaderKind;
use super::headers::HeaderType;
use zerocopy::FromBytes;
use zerocopy::Immutable;
use zerocopy::IntoBytes;
use zerocopy::KnownLayout;
use zerocopy::Unaligned;
use zerocopy::byteorder::network_endian::U16;

pub const PPP_HDR_SZ: usize = core::mem::size_of::<PppHdr>();

pub mod proto {
    pub const IPV4: u16 = 0x0021;
    pub const IPV6: u16 = 0x0057;
    pub const IPCP: u16 = 0x8021;
    pub const LCP: u16 = 0xC021;
    pub const PAP: u16 = 0xC023;
    pub const CHAP: u16 = 0xC223;
}

#[repr(C)]
#[derive(
    Clone, Copy, Debug, FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
)]
pub struct PppHdr {
    protocol: U16,
}

impl HeaderType for PppHdr {
    const KIND: HeaderKind = HeaderKind::Ppp;
}

impl PppHdr {
    pub fn protocol(&self) -> u16 {
        self.protocol.get()
    }

    pub fn set_protocol(&mut self, proto: u16) {
        self.protocol.set(proto);
    }
}
