// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! The internet checksum (RFC 1071).
//!
//! [`Checksum`] is a rolling one's complement sum which is finalized
//! into a [`HeaderChecksum`], the two bytes actually stored in an
//! IPv4, ICMPv4, UDP, or TCP header.
//!
//! # Checksums and Endianness
//!
//! The checksum is not a logical integer. It is a pair of bytes which
//! happens to be computed by treating every pair of summed bytes as a
//! 16-bit word. As long as the words are read and the result written
//! with the same byte order, the sum comes out right on either kind
//! of host (RFC 1071 §1.B). For that reason every conversion in this
//! module uses `{to,from}_ne_bytes()`, and no byte swapping is ever
//! done on a checksum field.

use crate::api::Ipv4Addr;

/// The checksum value, as it is contained in a network header.
///
/// This holds the header bytes, i.e. with one's complement already
/// applied.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct HeaderChecksum {
    inner: [u8; 2],
}

impl HeaderChecksum {
    /// Return the bytes of this header checksum.
    pub fn bytes(&self) -> [u8; 2] {
        self.inner
    }

    /// Wrap the checksum bytes of a header.
    pub fn wrap(hc: [u8; 2]) -> Self {
        Self { inner: hc }
    }
}

impl From<Checksum> for HeaderChecksum {
    /// Finalize the rolling checksum and put it into header form by
    /// performing one's complement.
    fn from(mut csum: Checksum) -> HeaderChecksum {
        Self { inner: (!csum.finalize()).to_ne_bytes() }
    }
}

/// A rolling one's complement checksum calculation.
///
/// Carries are accumulated in the upper half of a `u32` and folded
/// only when the sum is finalized.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Checksum {
    inner: u32,
}

impl Checksum {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new rolling checksum, starting with `bytes`.
    pub fn compute(bytes: &[u8]) -> Self {
        let mut csum = Self::new();
        csum.add_bytes(bytes);
        csum
    }

    /// Start a TCP or UDP checksum with the IPv4 pseudo-header.
    ///
    /// ```text
    /// +--------+--------+--------+--------+
    /// |           Source Address          |
    /// +--------+--------+--------+--------+
    /// |         Destination Address       |
    /// +--------+--------+--------+--------+
    /// |  zero  |  PTCL  |    ULP Length   |
    /// +--------+--------+--------+--------+
    /// ```
    pub fn pseudo_v4(
        src: Ipv4Addr,
        dst: Ipv4Addr,
        proto: u8,
        ulp_len: u16,
    ) -> Self {
        let mut csum = Self::compute(&src.bytes());
        csum.add_bytes(&dst.bytes());
        csum.add_bytes(&[0, proto]);
        csum.add_bytes(&ulp_len.to_be_bytes());
        csum
    }

    /// Add the contents of `bytes` to the sum.
    ///
    /// Every call is treated as starting on an even byte boundary, so
    /// only the final call may pass an odd number of bytes.
    pub fn add_bytes(&mut self, bytes: &[u8]) {
        let mut words = bytes.chunks_exact(2);
        for w in &mut words {
            self.inner += u32::from(u16::from_ne_bytes([w[0], w[1]]));
            self.fold_carries();
        }

        // An odd trailing byte is padded with zero on the right.
        if let [last] = words.remainder() {
            self.inner += u32::from(u16::from_ne_bytes([*last, 0]));
        }
    }

    /// Finalize the sum by adding up all the accumulated carries and
    /// returning the resulting value as a `u16`.
    pub fn finalize(&mut self) -> u16 {
        while (self.inner >> 16) != 0 {
            self.inner = (self.inner >> 16) + (self.inner & 0xFFFF);
        }

        (self.inner & 0xFFFF) as u16
    }

    // Keep the high half from ever overflowing on jumbo input.
    fn fold_carries(&mut self) {
        if self.inner >= 0xFFFF_0000 {
            self.finalize();
        }
    }
}

impl From<HeaderChecksum> for Checksum {
    // Convert a header's checksum bytes into a rolling checksum.
    fn from(hc: HeaderChecksum) -> Self {
        Self { inner: u32::from(!u16::from_ne_bytes(hc.bytes())) }
    }
}

impl core::ops::Add for Checksum {
    type Output = Self;

    fn add(mut self, mut other: Self) -> Self {
        self.inner = u32::from(self.finalize()) + u32::from(other.finalize());
        self
    }
}

/// Check a sum taken over a region with its stored checksum field
/// included. A correct region sums to all ones.
pub fn is_valid(csum: Checksum) -> bool {
    let mut csum = csum;
    csum.finalize() == 0xFFFF
}

#[cfg(test)]
mod test {
    use super::*;

    // The example from RFC 1071 §3.
    #[test]
    fn rfc1071_example() {
        let bytes = [0x00, 0x01, 0xf2, 0x03, 0xf4, 0xf5, 0xf6, 0xf7];
        let mut csum = Checksum::compute(&bytes);
        assert_eq!(csum.finalize(), u16::from_ne_bytes([0xdd, 0xf2]));
    }

    #[test]
    fn ipv4_header() {
        // A header taken off the wire, checksum 0xb861.
        let mut hdr = [
            0x45, 0x00, 0x00, 0x73, 0x00, 0x00, 0x40, 0x00, 0x40, 0x11,
            0xb8, 0x61, 0xc0, 0xa8, 0x00, 0x01, 0xc0, 0xa8, 0x00, 0xc7,
        ];
        assert!(is_valid(Checksum::compute(&hdr)));

        hdr[10] = 0;
        hdr[11] = 0;
        let hc = HeaderChecksum::from(Checksum::compute(&hdr));
        assert_eq!(hc.bytes(), [0xb8, 0x61]);
    }

    #[test]
    fn odd_length() {
        let mut a = Checksum::compute(&[0x12, 0x34, 0x56]);
        let mut b = Checksum::compute(&[0x12, 0x34, 0x56, 0x00]);
        assert_eq!(a.finalize(), b.finalize());
    }

    #[test]
    fn add_is_split_invariant() {
        let data: Vec<u8> = (0..=255).collect();
        let mut whole = Checksum::compute(&data);
        let mut split =
            Checksum::compute(&data[..100]) + Checksum::compute(&data[100..]);
        assert_eq!(whole.finalize(), split.finalize());
    }
}
