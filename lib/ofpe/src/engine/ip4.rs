// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! IPv4.

use super::checksum::Checksum;
use super::checksum::HeaderChecksum;
use super::headers::HeaderKind;
use super::headers::HeaderType;
use crate::api::Ipv4Addr;
use zerocopy::FromBytes;
use zerocopy::Immutable;
use zerocopy::IntoBytes;
use zerocopy::KnownLayout;
use zerocopy::Unaligned;
use zerocopy::byteorder::network_endian::U16;

/// The size of an IPv4 header without options.
pub const IPV4_HDR_SZ: usize = core::mem::size_of::<Ipv4Hdr>();
pub const IPV4_VERSION: u8 = 4;

/// Offset of the checksum field within the header.
pub const IPV4_CSUM_OFF: usize = 10;

const MORE_FRAGS: u16 = 0x2000;
const DONT_FRAG: u16 = 0x4000;
const FRAG_OFF_MASK: u16 = 0x1FFF;

/// An IP protocol number.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Protocol(pub u8);

impl Protocol {
    pub const ICMP: Self = Self(1);
    pub const TCP: Self = Self(6);
    pub const UDP: Self = Self(17);
}

#[repr(C)]
#[derive(
    Clone, Copy, Debug, FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
)]
pub struct Ipv4Hdr {
    ver_hdr_len: u8,
    dscp_ecn: u8,
    total_len: U16,
    ident: U16,
    frag_and_flags: U16,
    ttl: u8,
    proto: u8,
    csum: [u8; 2],
    src: [u8; 4],
    dst: [u8; 4],
}

impl HeaderType for Ipv4Hdr {
    const KIND: HeaderKind = HeaderKind::Ipv4;
}

impl Ipv4Hdr {
    pub fn version(&self) -> u8 {
        self.ver_hdr_len >> 4
    }

    /// The header length in bytes, options included.
    pub fn hdr_len(&self) -> usize {
        usize::from(self.ver_hdr_len & 0x0F) * 4
    }

    pub fn dscp(&self) -> u8 {
        self.dscp_ecn >> 2
    }

    pub fn set_dscp(&mut self, dscp: u8) {
        self.dscp_ecn = (dscp << 2) | (self.dscp_ecn & 0x3);
    }

    pub fn ecn(&self) -> u8 {
        self.dscp_ecn & 0x3
    }

    pub fn set_ecn(&mut self, ecn: u8) {
        self.dscp_ecn = (self.dscp_ecn & !0x3) | (ecn & 0x3);
    }

    pub fn total_len(&self) -> u16 {
        self.total_len.get()
    }

    pub fn ident(&self) -> u16 {
        self.ident.get()
    }

    pub fn dont_frag(&self) -> bool {
        self.frag_and_flags.get() & DONT_FRAG != 0
    }

    pub fn more_frags(&self) -> bool {
        self.frag_and_flags.get() & MORE_FRAGS != 0
    }

    /// The fragment offset, in 8-byte units.
    pub fn frag_off(&self) -> u16 {
        self.frag_and_flags.get() & FRAG_OFF_MASK
    }

    /// Is this datagram a piece of a larger one?
    pub fn is_fragment(&self) -> bool {
        self.more_frags() || self.frag_off() != 0
    }

    pub fn ttl(&self) -> u8 {
        self.ttl
    }

    pub fn set_ttl(&mut self, ttl: u8) {
        self.ttl = ttl;
    }

    pub fn proto(&self) -> u8 {
        self.proto
    }

    pub fn set_proto(&mut self, proto: u8) {
        self.proto = proto;
    }

    pub fn csum(&self) -> [u8; 2] {
        self.csum
    }

    pub fn src(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.src)
    }

    pub fn set_src(&mut self, ip: Ipv4Addr) {
        self.src = ip.bytes();
    }

    pub fn dst(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.dst)
    }

    pub fn set_dst(&mut self, ip: Ipv4Addr) {
        self.dst = ip.bytes();
    }
}

/// Compute the header checksum over `hdr`, the full header with
/// options, treating the checksum field as zero.
pub fn compute_hdr_csum(hdr: &[u8]) -> HeaderChecksum {
    let (front, back) = hdr.split_at(IPV4_CSUM_OFF.min(hdr.len()));
    let mut csum = Checksum::compute(front);
    if let Some(rest) = back.get(2..) {
        csum.add_bytes(rest);
    }
    HeaderChecksum::from(csum)
}

#[cfg(test)]
mod test {
    use super::*;

    const HDR: [u8; 20] = [
        0x45, 0x00, 0x00, 0x73, 0x00, 0x00, 0x40, 0x00, 0x40, 0x11, 0xb8,
        0x61, 0xc0, 0xa8, 0x00, 0x01, 0xc0, 0xa8, 0x00, 0xc7,
    ];

    #[test]
    fn read_fields() {
        let hdr = Ipv4Hdr::ref_from_bytes(&HDR[..]).unwrap();
        assert_eq!(hdr.version(), IPV4_VERSION);
        assert_eq!(hdr.hdr_len(), 20);
        assert_eq!(hdr.total_len(), 0x73);
        assert!(hdr.dont_frag());
        assert!(!hdr.is_fragment());
        assert_eq!(hdr.ttl(), 64);
        assert_eq!(Protocol(hdr.proto()), Protocol::UDP);
        assert_eq!(hdr.src(), Ipv4Addr::from_const([192, 168, 0, 1]));
        assert_eq!(hdr.dst(), Ipv4Addr::from_const([192, 168, 0, 199]));
    }

    #[test]
    fn checksum_ignores_stored_value() {
        let mut bytes = HDR;
        assert_eq!(compute_hdr_csum(&bytes).bytes(), [0xb8, 0x61]);
        bytes[10] = 0x12;
        bytes[11] = 0x34;
        assert_eq!(compute_hdr_csum(&bytes).bytes(), [0xb8, 0x61]);
    }

    #[test]
    fn dscp_and_ecn_share_a_byte() {
        let mut bytes = HDR;
        let hdr = Ipv4Hdr::mut_from_bytes(&mut bytes[..]).unwrap();
        hdr.set_dscp(46);
        hdr.set_ecn(1);
        assert_eq!(hdr.dscp(), 46);
        assert_eq!(hdr.ecn(), 1);
        assert_eq!(bytes[1], 0xB9);
    }
}
