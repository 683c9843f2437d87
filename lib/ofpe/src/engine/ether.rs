// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Ethernet II.

use super::headers::HeaderKind;
use super::headers::HeaderType;
use crate::api::MacAddr;
use core::fmt;
use core::fmt::Display;
use zerocopy::FromBytes;
use zerocopy::Immutable;
use zerocopy::IntoBytes;
use zerocopy::KnownLayout;
use zerocopy::Unaligned;
use zerocopy::byteorder::network_endian::U16;

pub const ETHER_HDR_SZ: usize = core::mem::size_of::<EtherHdr>();

/// An ethertype value.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct EtherType(pub u16);

impl EtherType {
    pub const IPV4: Self = Self(0x0800);
    pub const ARP: Self = Self(0x0806);
    pub const VLAN: Self = Self(0x8100);
    pub const IPV6: Self = Self(0x86DD);
    pub const MPLS: Self = Self(0x8847);
    pub const MPLS_UPSTREAM: Self = Self(0x8848);
    pub const PPPOE_DISCOVERY: Self = Self(0x8863);
    pub const PPPOE_SESSION: Self = Self(0x8864);
    pub const QINQ: Self = Self(0x88A8);

    pub fn is_vlan(self) -> bool {
        self == Self::VLAN || self == Self::QINQ
    }

    pub fn is_mpls(self) -> bool {
        self == Self::MPLS || self == Self::MPLS_UPSTREAM
    }

    pub fn is_pppoe(self) -> bool {
        self == Self::PPPOE_DISCOVERY || self == Self::PPPOE_SESSION
    }
}

impl Display for EtherType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}

#[repr(C)]
#[derive(
    Clone, Copy, Debug, FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
)]
pub struct EtherHdr {
    dst: [u8; 6],
    src: [u8; 6],
    ether_type: U16,
}

impl HeaderType for EtherHdr {
    const KIND: HeaderKind = HeaderKind::Ether;
}

impl EtherHdr {
    pub fn dst(&self) -> MacAddr {
        MacAddr::from(self.dst)
    }

    pub fn set_dst(&mut self, mac: MacAddr) {
        self.dst = mac.bytes();
    }

    pub fn src(&self) -> MacAddr {
        MacAddr::from(self.src)
    }

    pub fn set_src(&mut self, mac: MacAddr) {
        self.src = mac.bytes();
    }

    pub fn ether_type(&self) -> u16 {
        self.ether_type.get()
    }

    pub fn set_ether_type(&mut self, et: u16) {
        self.ether_type.set(et);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn read_in_place() {
        let mut bytes = [
            0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF, 0x11, 0x22, 0x33, 0x44, 0x55,
            0x66, 0x08, 0x00, 0xDE, 0xAD,
        ];

        let (hdr, rest) = EtherHdr::mut_from_prefix(&mut bytes[..]).unwrap();
        assert_eq!(hdr.dst().to_string(), "AA:BB:CC:DD:EE:FF");
        assert_eq!(hdr.src().to_string(), "11:22:33:44:55:66");
        assert_eq!(EtherType(hdr.ether_type()), EtherType::IPV4);
        assert_eq!(rest, &[0xDE, 0xAD]);

        hdr.set_ether_type(EtherType::VLAN.0);
        assert_eq!(&bytes[12..14], &[0x81, 0x00]);
        assert_eq!(ETHER_HDR_SZ, 14);
    }
}
