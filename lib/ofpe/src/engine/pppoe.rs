// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! PPP over Ethernet (RFC 2516).
//!
//! Discovery frames (ethertype 0x8863) carry a list of tags behind
//! the header; session frames (0x8864) carry a PPP frame.

use super::headers::HeaderKind;
use super::headers::HeaderType;
use zerocopy::FromBytes;
use zerocopy::Immutable;
use zerocopy::IntoBytes;
use zerocopy::KnownLayout;
use zerocopy::Unaligned;
use zerocopy::byteorder::network_endian::U16;

pub const PPPOE_HDR_SZ: usize = core::mem::size_of::<PppoeHdr>();
pub const PPPOE_TAG_HDR_SZ: usize = 4;

/// The version and type every PPPoE header carries.
pub const PPPOE_VER: u8 = 1;
pub const PPPOE_TYPE: u8 = 1;

pub mod code {
    pub const SESSION: u8 = 0x00;
    pub const PADO: u8 = 0x07;
    pub const PADI: u8 = 0x09;
    pub const PADR: u8 = 0x19;
    pub const PADS: u8 = 0x65;
    pub const PADT: u8 = 0xA7;
}

pub mod tag {
    pub const END_OF_LIST: u16 = 0x0000;
    pub const SERVICE_NAME: u16 = 0x0101;
    pub const AC_NAME: u16 = 0x0102;
    pub const HOST_UNIQ: u16 = 0x0103;
    pub const AC_COOKIE: u16 = 0x0104;
    pub const VENDOR_SPECIFIC: u16 = 0x0105;
    pub const RELAY_SESSION_ID: u16 = 0x0110;
    pub const SERVICE_NAME_ERROR: u16 = 0x0201;
    pub const AC_SYSTEM_ERROR: u16 = 0x0202;
    pub const GENERIC_ERROR: u16 = 0x0203;
}

#[repr(C)]
#[derive(
    Clone, Copy, Debug, FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
)]
pub struct PppoeHdr {
    ver_type: u8,
    code: u8,
    session_id: U16,
    length: U16,
}

impl HeaderType for PppoeHdr {
    const KIND: HeaderKind = HeaderKind::Pppoe;
}

impl PppoeHdr {
    pub fn version(&self) -> u8 {
        self.ver_type >> 4
    }

    pub fn pppoe_type(&self) -> u8 {
        self.ver_type & 0x0F
    }

    pub fn set_version(&mut self, ver: u8) {
        self.ver_type = (ver << 4) | (self.ver_type & 0x0F);
    }

    pub fn set_pppoe_type(&mut self, ty: u8) {
        self.ver_type = (self.ver_type & 0xF0) | (ty & 0x0F);
    }

    pub fn code(&self) -> u8 {
        self.code
    }

    pub fn set_code(&mut self, code: u8) {
        self.code = code;
    }

    pub fn session_id(&self) -> u16 {
        self.session_id.get()
    }

    pub fn set_session_id(&mut self, sid: u16) {
        self.session_id.set(sid);
    }

    /// The payload length: bytes behind this header.
    pub fn length(&self) -> u16 {
        self.length.get()
    }

    pub fn set_length(&mut self, len: u16) {
        self.length.set(len);
    }
}

/// A discovery tag.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PppoeTag<'a> {
    pub tag_type: u16,
    pub value: &'a [u8],
}

/// Iterator over the tags in a discovery payload.
///
/// Iteration ends at the end of the payload, at an End-Of-List tag, or
/// at a tag whose declared length runs past the payload.
#[derive(Clone, Debug)]
pub struct PppoeTags<'a> {
    rest: &'a [u8],
}

impl<'a> PppoeTags<'a> {
    pub fn new(payload: &'a [u8]) -> Self {
        Self { rest: payload }
    }
}

impl<'a> Iterator for PppoeTags<'a> {
    type Item = PppoeTag<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let hdr = self.rest.get(..PPPOE_TAG_HDR_SZ)?;
        let tag_type = u16::from_be_bytes([hdr[0], hdr[1]]);
        let len = usize::from(u16::from_be_bytes([hdr[2], hdr[3]]));

        if tag_type == tag::END_OF_LIST {
            self.rest = &[];
            return None;
        }

        let end = PPPOE_TAG_HDR_SZ + len;
        let Some(value) = self.rest.get(PPPOE_TAG_HDR_SZ..end) else {
            self.rest = &[];
            return None;
        };
        self.rest = &self.rest[end..];
        Some(PppoeTag { tag_type, value })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn header_fields() {
        let mut bytes = [0x11, 0x09, 0x00, 0x00, 0x00, 0x04];
        let hdr = PppoeHdr::mut_from_bytes(&mut bytes[..]).unwrap();
        assert_eq!(hdr.version(), PPPOE_VER);
        assert_eq!(hdr.pppoe_type(), PPPOE_TYPE);
        assert_eq!(hdr.code(), code::PADI);
        assert_eq!(hdr.length(), 4);

        hdr.set_session_id(0xBEEF);
        hdr.set_code(code::SESSION);
        assert_eq!(bytes, [0x11, 0x00, 0xBE, 0xEF, 0x00, 0x04]);
    }

    #[test]
    fn tag_list() {
        let payload = [
            0x01, 0x01, 0x00, 0x00, // Service-Name, empty
            0x01, 0x03, 0x00, 0x02, 0xAB, 0xCD, // Host-Uniq
            0x00, 0x00, 0x00, 0x00, // End-Of-List
            0x01, 0x02, 0x00, 0x00, // never reached
        ];

        let tags: Vec<_> = PppoeTags::new(&payload).collect();
        assert_eq!(
            tags,
            vec![
                PppoeTag { tag_type: tag::SERVICE_NAME, value: &[] },
                PppoeTag { tag_type: tag::HOST_UNIQ, value: &[0xAB, 0xCD] },
            ]
        );
    }

    #[test]
    fn truncated_tag_ends_iteration() {
        let payload = [0x01, 0x02, 0x00, 0x08, 0x41];
        assert_eq!(PppoeTags::new(&payload).count(), 0);
    }
}
