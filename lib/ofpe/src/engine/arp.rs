// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! ARP for IPv4 over Ethernet.

use super::headers::HeaderKind;
use super::headers::HeaderType;
use crate::api::Ipv4Addr;
use crate::api::MacAddr;
use zerocopy::FromBytes;
use zerocopy::Immutable;
use zerocopy::IntoBytes;
use zerocopy::KnownLayout;
use zerocopy::Unaligned;
use zerocopy::byteorder::network_endian::U16;

pub const ARP_HDR_SZ: usize = core::mem::size_of::<ArpHdr>();
pub const ARP_HTYPE_ETHERNET: u16 = 1;

pub const ARP_OP_REQUEST: u16 = 1;
pub const ARP_OP_REPLY: u16 = 2;

#[repr(C)]
#[derive(
    Clone, Copy, Debug, FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
)]
pub struct ArpHdr {
    htype: U16,
    ptype: U16,
    hlen: u8,
    plen: u8,
    op: U16,
    sha: [u8; 6],
    spa: [u8; 4],
    tha: [u8; 6],
    tpa: [u8; 4],
}

impl HeaderType for ArpHdr {
    const KIND: HeaderKind = HeaderKind::Arp;
}

impl ArpHdr {
    pub fn htype(&self) -> u16 {
        self.htype.get()
    }

    pub fn ptype(&self) -> u16 {
        self.ptype.get()
    }

    pub fn hlen(&self) -> u8 {
        self.hlen
    }

    pub fn plen(&self) -> u8 {
        self.plen
    }

    /// Does this message carry Ethernet and IPv4 addresses, i.e. is
    /// this layout the right one for it?
    pub fn is_ether_ipv4(&self) -> bool {
        self.hlen == 6 && self.plen == 4
    }

    pub fn op(&self) -> u16 {
        self.op.get()
    }

    pub fn set_op(&mut self, op: u16) {
        self.op.set(op);
    }

    pub fn sha(&self) -> MacAddr {
        MacAddr::from(self.sha)
    }

    pub fn set_sha(&mut self, mac: MacAddr) {
        self.sha = mac.bytes();
    }

    pub fn spa(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.spa)
    }

    pub fn set_spa(&mut self, ip: Ipv4Addr) {
        self.spa = ip.bytes();
    }

    pub fn tha(&self) -> MacAddr {
        MacAddr::from(self.tha)
    }

    pub fn set_tha(&mut self, mac: MacAddr) {
        self.tha = mac.bytes();
    }

    pub fn tpa(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.tpa)
    }

    pub fn set_tpa(&mut self, ip: Ipv4Addr) {
        self.tpa = ip.bytes();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn request_fields() {
        let mut bytes = [0u8; ARP_HDR_SZ];
        bytes[..8].copy_from_slice(&[0x00, 0x01, 0x08, 0x00, 6, 4, 0x00, 0x01]);
        bytes[8..14].copy_from_slice(&[2, 0, 0, 0, 0, 1]);
        bytes[14..18].copy_from_slice(&[10, 0, 0, 1]);
        bytes[24..28].copy_from_slice(&[10, 0, 0, 2]);

        let hdr = ArpHdr::mut_from_bytes(&mut bytes[..]).unwrap();
        assert!(hdr.is_ether_ipv4());
        assert_eq!(hdr.op(), ARP_OP_REQUEST);
        assert_eq!(hdr.sha(), MacAddr::from_const([2, 0, 0, 0, 0, 1]));
        assert_eq!(hdr.spa(), Ipv4Addr::from_const([10, 0, 0, 1]));
        assert_eq!(hdr.tha(), MacAddr::ZERO);
        assert_eq!(hdr.tpa(), Ipv4Addr::from_const([10, 0, 0, 2]));

        hdr.set_op(ARP_OP_REPLY);
        hdr.set_tha(MacAddr::BROADCAST);
        assert_eq!(bytes[6..8], [0x00, 0x02]);
        assert_eq!(bytes[18..24], [0xFF; 6]);

        bytes[4] = 8;
        let hdr = ArpHdr::ref_from_bytes(&bytes[..]).unwrap();
        assert!(!hdr.is_ether_ipv4());
    }
}
