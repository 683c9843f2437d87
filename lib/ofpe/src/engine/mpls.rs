// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! MPLS label stack entries (RFC 3032).
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                Label                  | TC  |S|       TTL     |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```

use super::headers::HeaderKind;
use super::headers::HeaderType;
use zerocopy::FromBytes;
use zerocopy::Immutable;
use zerocopy::IntoBytes;
use zerocopy::KnownLayout;
use zerocopy::Unaligned;
use zerocopy::byteorder::network_endian::U32;

pub const MPLS_HDR_SZ: usize = core::mem::size_of::<MplsHdr>();

/// The largest label value.
pub const MPLS_LABEL_MAX: u32 = 0xF_FFFF;

const LABEL_SHIFT: u32 = 12;
const TC_SHIFT: u32 = 9;
const TC_MASK: u32 = 0x7;
const BOS_BIT: u32 = 0x100;
const TTL_MASK: u32 = 0xFF;

#[repr(C)]
#[derive(
    Clone, Copy, Debug, FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
)]
pub struct MplsHdr {
    entry: U32,
}

impl HeaderType for MplsHdr {
    const KIND: HeaderKind = HeaderKind::Mpls;
}

impl MplsHdr {
    fn update(&mut self, mask: u32, val: u32) {
        self.entry.set((self.entry.get() & !mask) | (val & mask));
    }

    pub fn label(&self) -> u32 {
        self.entry.get() >> LABEL_SHIFT
    }

    /// Set the label. Only the low 20 bits are kept.
    pub fn set_label(&mut self, label: u32) {
        self.update(MPLS_LABEL_MAX << LABEL_SHIFT, label << LABEL_SHIFT);
    }

    pub fn tc(&self) -> u8 {
        ((self.entry.get() >> TC_SHIFT) & TC_MASK) as u8
    }

    pub fn set_tc(&mut self, tc: u8) {
        self.update(TC_MASK << TC_SHIFT, u32::from(tc) << TC_SHIFT);
    }

    /// Is this the bottom of the label stack?
    pub fn bos(&self) -> bool {
        self.entry.get() & BOS_BIT != 0
    }

    pub fn set_bos(&mut self, bos: bool) {
        self.update(BOS_BIT, if bos { BOS_BIT } else { 0 });
    }

    pub fn ttl(&self) -> u8 {
        (self.entry.get() & TTL_MASK) as u8
    }

    pub fn set_ttl(&mut self, ttl: u8) {
        self.update(TTL_MASK, u32::from(ttl));
    }
}
