// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

use super::headers::HeaderKind;
use super::headers::HeaderType;
use zerocopy::FromBytes;
use zerocopy::Immutable;
use zerocopy::IntoBytes;
use zerocopy::KnownLayout;
use zerocopy::Unaligned;
use zerocopy::byteorder::network_endian::U16;

pub const UDP_HDR_SZ: usize = core::mem::size_of::<UdpHdr>();
pub const UDP_CSUM_OFF: usize = 6;

#[repr(C)]
#[derive(
    Clone, Copy, Debug, FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
)]
pub struct UdpHdr {
    src_port: U16,
    dst_port: U16,
    len: U16,
    csum: [u8; 2],
}

impl HeaderType for UdpHdr {
    const KIND: HeaderKind = HeaderKind::Udp;
}

impl UdpHdr {
    pub fn src_port(&self) -> u16 {
        self.src_port.get()
    }

    pub fn set_src_port(&mut self, port: u16) {
        self.src_port.set(port);
    }

    pub fn dst_port(&self) -> u16 {
        self.dst_port.get()
    }

    pub fn set_dst_port(&mut self, port: u16) {
        self.dst_port.set(port);
    }

    /// The datagram length, header included.
    pub fn len(&self) -> u16 {
        self.len.get()
    }

    pub fn csum(&self) -> [u8; 2] {
        self.csum
    }
}
