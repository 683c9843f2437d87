// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! IEEE 802.1Q tags.
//!
//! The tag sits where the Ethernet header's ethertype used to be: the
//! Ethernet header carries the tag protocol identifier (0x8100 or
//! 0x88a8) and the tag carries the ethertype of what follows.

use super::headers::HeaderKind;
use super::headers::HeaderType;
use zerocopy::FromBytes;
use zerocopy::Immutable;
use zerocopy::IntoBytes;
use zerocopy::KnownLayout;
use zerocopy::Unaligned;
use zerocopy::byteorder::network_endian::U16;

pub const VLAN_HDR_SZ: usize = core::mem::size_of::<VlanHdr>();

const VID_MASK: u16 = 0x0FFF;
const DEI_BIT: u16 = 0x1000;
const PCP_SHIFT: u16 = 13;

#[repr(C)]
#[derive(
    Clone, Copy, Debug, FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
)]
pub struct VlanHdr {
    tci: U16,
    inner_type: U16,
}

impl HeaderType for VlanHdr {
    const KIND: HeaderKind = HeaderKind::Vlan;
}

impl VlanHdr {
    pub fn vid(&self) -> u16 {
        self.tci.get() & VID_MASK
    }

    /// Set the VLAN ID. Only the low 12 bits are kept.
    pub fn set_vid(&mut self, vid: u16) {
        self.tci.set((self.tci.get() & !VID_MASK) | (vid & VID_MASK));
    }

    pub fn pcp(&self) -> u8 {
        (self.tci.get() >> PCP_SHIFT) as u8
    }

    /// Set the priority code point. Only the low 3 bits are kept.
    pub fn set_pcp(&mut self, pcp: u8) {
        let pcp = u16::from(pcp & 0x7) << PCP_SHIFT;
        self.tci.set((self.tci.get() & !(0x7 << PCP_SHIFT)) | pcp);
    }

    pub fn dei(&self) -> bool {
        self.tci.get() & DEI_BIT != 0
    }

    pub fn set_dei(&mut self, dei: bool) {
        let tci = self.tci.get() & !DEI_BIT;
        self.tci.set(if dei { tci | DEI_BIT } else { tci });
    }

    /// The ethertype of the header behind this tag.
    pub fn inner_type(&self) -> u16 {
        self.inner_type.get()
    }

    pub fn set_inner_type(&mut self, et: u16) {
        self.inner_type.set(et);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn tci_fields() {
        // PCP 5, DEI set, VID 0x123, inner IPv4.
        let mut bytes = [0xB1, 0x23, 0x08, 0x00];
        let hdr = VlanHdr::mut_from_bytes(&mut bytes[..]).unwrap();
        assert_eq!(hdr.pcp(), 5);
        assert!(hdr.dei());
        assert_eq!(hdr.vid(), 0x123);
        assert_eq!(hdr.inner_type(), 0x0800);

        hdr.set_vid(0xFFFF);
        assert_eq!(hdr.vid(), 0xFFF);
        assert_eq!(hdr.pcp(), 5);

        hdr.set_pcp(2);
        hdr.set_dei(false);
        assert_eq!(bytes[..2], [0x4F, 0xFF]);
    }
}
