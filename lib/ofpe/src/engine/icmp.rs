// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! ICMPv4. Only the type, code, and checksum are decoded; the rest of
//! the message depends on the type and stays opaque.

use super::headers::HeaderKind;
use super::headers::HeaderType;
use zerocopy::FromBytes;
use zerocopy::Immutable;
use zerocopy::IntoBytes;
use zerocopy::KnownLayout;
use zerocopy::Unaligned;

pub const ICMP_HDR_SZ: usize = core::mem::size_of::<IcmpHdr>();
pub const ICMP_CSUM_OFF: usize = 2;

pub const ICMP_ECHO_REPLY: u8 = 0;
pub const ICMP_DEST_UNREACH: u8 = 3;
pub const ICMP_ECHO: u8 = 8;
pub const ICMP_TIME_EXCEEDED: u8 = 11;

#[repr(C)]
#[derive(
    Clone, Copy, Debug, FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
)]
pub struct IcmpHdr {
    msg_type: u8,
    code: u8,
    csum: [u8; 2],
}

impl HeaderType for IcmpHdr {
    const KIND: HeaderKind = HeaderKind::Icmp;
}

impl IcmpHdr {
    pub fn msg_type(&self) -> u8 {
        self.msg_type
    }

    pub fn set_msg_type(&mut self, ty: u8) {
        self.msg_type = ty;
    }

    pub fn code(&self) -> u8 {
        self.code
    }

    pub fn set_code(&mut self, code: u8) {
        self.code = code;
    }

    pub fn csum(&self) -> [u8; 2] {
        self.csum
    }
}
