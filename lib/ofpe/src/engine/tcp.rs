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
use zerocopy::byteorder::network_endian::U32;

/// The size of a TCP header without options.
pub const TCP_HDR_SZ: usize = core::mem::size_of::<TcpHdr>();
pub const TCP_CSUM_OFF: usize = 16;

pub mod flags {
    pub const FIN: u8 = 0x01;
    pub const SYN: u8 = 0x02;
    pub const RST: u8 = 0x04;
    pub const PSH: u8 = 0x08;
    pub const ACK: u8 = 0x10;
    pub const URG: u8 = 0x20;
}

#[repr(C)]
#[derive(
    Clone, Copy, Debug, FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
)]
pub struct TcpHdr {
    src_port: U16,
    dst_port: U16,
    seq: U32,
    ack: U32,
    offset: u8,
    flags: u8,
    window: U16,
    csum: [u8; 2],
    urg: U16,
}

impl HeaderType for TcpHdr {
    const KIND: HeaderKind = HeaderKind::Tcp;
}

impl TcpHdr {
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

    pub fn seq(&self) -> u32 {
        self.seq.get()
    }

    pub fn ack(&self) -> u32 {
        self.ack.get()
    }

    /// The header length in bytes, options included.
    pub fn hdr_len(&self) -> usize {
        usize::from(self.offset >> 4) * 4
    }

    pub fn flags(&self) -> u8 {
        self.flags
    }

    pub fn window(&self) -> u16 {
        self.window.get()
    }

    pub fn csum(&self) -> [u8; 2] {
        self.csum
    }

    pub fn urg(&self) -> u16 {
        self.urg.get()
    }
}
