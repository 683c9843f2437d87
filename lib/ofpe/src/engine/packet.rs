// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Types for creating, reading, and writing network packets.
//!
//! A [`Packet`] is the aggregate of one [`PktBuf`], the
//! [`HeaderChain`] decoded from it, and the [`MatchSet`] mirroring
//! the chain's header values. The three are only ever changed
//! together: every public mutation either leaves the packet fully
//! classified or returns an error before touching any byte.
//!
//! A packet does no locking of its own. It is `Send`; callers who want
//! to share one between threads wrap it in their own lock.

use super::buf::PktBuf;
use super::checksum::Checksum;
use super::checksum::HeaderChecksum;
use super::headers::HeaderChain;
use super::headers::HeaderKind;
use super::headers::HeaderType;
use super::headers::HeaderView;
use super::headers::SearchDir;
use super::icmp::ICMP_CSUM_OFF;
use super::ip4::IPV4_CSUM_OFF;
use super::ip4::Ipv4Hdr;
use super::ip4::Protocol;
use super::ip4::compute_hdr_csum;
use super::match_set::MatchSet;
use super::parse::Classifier;
use super::parse::Next;
use super::ppp::PPP_HDR_SZ;
use super::pppoe::PPPOE_HDR_SZ;
use super::pppoe::PppoeHdr;
use super::pppoe::code;
use super::tcp::TCP_CSUM_OFF;
use super::udp::UDP_CSUM_OFF;
use crate::api::OFPP_CONTROLLER;
use crate::api::PacketCfg;
use crate::provider::LogLevel;
use crate::provider::LogProvider;
use crate::provider::default_log;
use bitflags::bitflags;
use core::ops::Range;
use serde::Deserialize;
use serde::Serialize;
use std::sync::Arc;
use std::time::SystemTime;

#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum PacketError {
    #[error("out of range: needed {needed} bytes, {available} available")]
    OutOfRange { needed: usize, available: usize },

    #[error("no {0} header")]
    NotFound(HeaderKind),

    #[error("invalid: {0}")]
    Invalid(&'static str),

    #[error("not implemented: {0}")]
    NotImplemented(&'static str),

    #[error("internal error: {0}")]
    InternalError(&'static str),
}

pub type PacketResult<T> = core::result::Result<T, PacketError>;

bitflags! {
    /// Per-packet state: which optional tags the classifier saw, and
    /// which derived header fields need recomputing.
    #[derive(
        Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize,
    )]
    pub struct PacketFlags: u16 {
        const VLAN_PRESENT = 1 << 0;
        const MPLS_PRESENT = 1 << 1;
        /// The packet must not be sent to the controller.
        const NO_PACKET_IN = 1 << 2;

        const TCP_CSUM = 1 << 8;
        const UDP_CSUM = 1 << 9;
        const IPV4_CSUM = 1 << 10;
        const ICMPV4_CSUM = 1 << 11;
        const PPPOE_LEN = 1 << 12;
    }
}

impl PacketFlags {
    /// The markers of fields awaiting recomputation.
    pub const DIRTY: Self = Self::TCP_CSUM
        .union(Self::UDP_CSUM)
        .union(Self::IPV4_CSUM)
        .union(Self::ICMPV4_CSUM)
        .union(Self::PPPOE_LEN);

    /// The markers the classifier owns.
    pub const PRESENT: Self = Self::VLAN_PRESENT.union(Self::MPLS_PRESENT);
}

/// A network packet: a frame, its decoded header chain, and its match
/// fields.
///
/// The chain is declared first so it is dropped before the buffer it
/// describes.
pub struct Packet {
    pub(crate) chain: HeaderChain,
    pub(crate) matches: MatchSet,
    pub(crate) buf: PktBuf,
    pub(crate) flags: PacketFlags,
    pub(crate) in_port: u32,
    pub(crate) in_phy_port: u32,
    pub(crate) out_port: u32,
    pub(crate) rx_time: SystemTime,
    pub(crate) log: Arc<dyn LogProvider>,
}

impl Packet {
    fn from_buf(buf: PktBuf, in_port: u32) -> Self {
        Self {
            chain: HeaderChain::new(),
            matches: MatchSet::new(),
            buf,
            flags: PacketFlags::empty(),
            in_port,
            in_phy_port: in_port,
            out_port: OFPP_CONTROLLER,
            rx_time: SystemTime::now(),
            log: default_log(),
        }
    }

    /// A zeroed frame of `len` bytes, not yet classified.
    pub fn new(len: usize) -> Self {
        Self::from_buf(PktBuf::new(len), OFPP_CONTROLLER)
    }

    /// Copy `src` into a new packet which arrived on `in_port`.
    pub fn from_bytes(
        src: impl AsRef<[u8]>,
        in_port: u32,
        classify_now: bool,
    ) -> Self {
        Self::with_cfg(&PacketCfg::default(), src, in_port, classify_now)
    }

    /// Copy the first `len` bytes of `src` into a new packet.
    pub fn from_existing_region(
        src: &[u8],
        len: usize,
        in_port: u32,
        classify_now: bool,
    ) -> PacketResult<Self> {
        let region = src.get(..len).ok_or(PacketError::OutOfRange {
            needed: len,
            available: src.len(),
        })?;
        Ok(Self::from_bytes(region, in_port, classify_now))
    }

    pub fn with_cfg(
        cfg: &PacketCfg,
        src: impl AsRef<[u8]>,
        in_port: u32,
        classify_now: bool,
    ) -> Self {
        let buf = PktBuf::copy_with_headroom(cfg.head_room, src);
        let mut pkt = Self::from_buf(buf, in_port);
        if classify_now {
            pkt.reclassify();
        }
        pkt
    }

    /// Replace the log provider.
    pub fn with_log(mut self, log: Arc<dyn LogProvider>) -> Self {
        self.log = log;
        self
    }

    pub fn set_log(&mut self, log: Arc<dyn LogProvider>) {
        self.log = log;
    }

    pub(crate) fn note(&self, msg: &str) {
        self.log.log(LogLevel::Note, msg);
    }

    pub(crate) fn warn(&self, msg: &str) {
        self.log.log(LogLevel::Warn, msg);
    }

    // An internal error means the chain no longer describes the
    // buffer. Say so loudly before handing it back.
    fn internal(&self, err: PacketError) -> PacketError {
        if let PacketError::InternalError(msg) = err {
            self.log.log(LogLevel::Error, msg);
        }
        err
    }

    // ================================================================
    // Queries
    // ================================================================

    /// The `index`-th header of type `H`, counting from the outermost.
    pub fn header<H: HeaderType>(&self, index: usize) -> Option<&H> {
        let idx = self.chain.find(H::KIND, SearchDir::Head, index)?;
        self.header_at(idx)
    }

    /// The `index`-th header of type `H`, counting from the innermost.
    pub fn header_rev<H: HeaderType>(&self, index: usize) -> Option<&H> {
        let idx = self.chain.find(H::KIND, SearchDir::Tail, index)?;
        self.header_at(idx)
    }

    fn header_at<H: HeaderType>(&self, idx: usize) -> Option<&H> {
        let view = self.chain.get(idx)?;
        let bytes = self.buf.abs(view.off, view.len)?;
        H::ref_from_prefix(bytes).ok().map(|(hdr, _)| hdr)
    }

    pub(crate) fn header_mut<H: HeaderType>(
        &mut self,
        index: usize,
    ) -> PacketResult<&mut H> {
        let idx = self
            .chain
            .find(H::KIND, SearchDir::Head, index)
            .ok_or(PacketError::NotFound(H::KIND))?;
        self.header_mut_at(idx)
    }

    pub(crate) fn header_mut_at<H: HeaderType>(
        &mut self,
        idx: usize,
    ) -> PacketResult<&mut H> {
        let view = *self.chain.get(idx).ok_or(PacketError::NotFound(H::KIND))?;
        let bytes = self
            .buf
            .abs_mut(view.off, view.len)
            .ok_or(PacketError::InternalError("view outside of frame"))?;
        H::mut_from_prefix(bytes)
            .map(|(hdr, _)| hdr)
            .map_err(|_| PacketError::InternalError("view shorter than header"))
    }

    /// The bytes under the view at chain index `idx`.
    pub fn header_bytes(&self, idx: usize) -> Option<&[u8]> {
        let view = self.chain.get(idx)?;
        self.buf.abs(view.off, view.len)
    }

    /// The trailing undecoded bytes, if the chain ends in any.
    pub fn payload(&self) -> &[u8] {
        match self.chain.tail() {
            Some(v) if v.kind == HeaderKind::Opaque => {
                self.buf.abs(v.off, v.len).unwrap_or(&[])
            }
            _ => &[],
        }
    }

    pub fn chain(&self) -> &HeaderChain {
        &self.chain
    }

    /// Each view's kind and byte range, relative to the frame start.
    pub fn layout(&self) -> Vec<(HeaderKind, Range<usize>)> {
        let start = self.buf.start();
        self.chain
            .iter()
            .map(|v| (v.kind, v.off - start..v.end() - start))
            .collect()
    }

    pub fn match_fields(&self) -> &MatchSet {
        &self.matches
    }

    /// The active frame.
    pub fn frame_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The head-room still available for tag insertion.
    pub fn head_capacity(&self) -> usize {
        self.buf.head_capacity()
    }

    pub fn buf(&self) -> &PktBuf {
        &self.buf
    }

    pub fn in_port(&self) -> u32 {
        self.in_port
    }

    pub fn in_phy_port(&self) -> u32 {
        self.in_phy_port
    }

    pub fn set_in_phy_port(&mut self, port: u32) {
        self.in_phy_port = port;
    }

    pub fn out_port(&self) -> u32 {
        self.out_port
    }

    pub fn set_out_port(&mut self, port: u32) {
        self.out_port = port;
    }

    pub fn rx_time(&self) -> SystemTime {
        self.rx_time
    }

    pub fn flags(&self) -> PacketFlags {
        self.flags
    }

    pub fn set_no_packet_in(&mut self, val: bool) {
        self.flags.set(PacketFlags::NO_PACKET_IN, val);
    }

    /// Check that the chain tiles the frame from its first byte.
    pub fn check_chain(&self) -> PacketResult<()> {
        if self.chain.is_empty() {
            return Ok(());
        }

        let end = self.chain.check_contiguous(self.buf.start())?;
        if end > self.buf.end() {
            return Err(PacketError::InternalError("chain runs past frame"));
        }
        Ok(())
    }

    // ================================================================
    // Serialization and classification
    // ================================================================

    /// Copy as much of the frame as fits into `dst`, returning the
    /// number of bytes copied.
    pub fn pack(&self, dst: &mut [u8]) -> usize {
        let n = self.buf.len().min(dst.len());
        dst[..n].copy_from_slice(&self.buf[..n]);
        n
    }

    pub fn pack_to_vec(&self) -> Vec<u8> {
        self.buf.to_vec()
    }

    /// Replace the frame with `src`, received on `in_port`, and
    /// classify it.
    pub fn unpack(&mut self, in_port: u32, src: &[u8]) {
        self.chain.clear();
        let moved = self.buf.head_capacity() != self.buf.head_room();
        if moved || src.len() != self.buf.len() {
            self.buf.resize(src.len());
        }
        self.buf.copy_from_slice(src);
        self.flags.remove(PacketFlags::DIRTY);
        self.rx_time = SystemTime::now();
        self.classify(in_port);
    }

    /// Decode the frame as received on `in_port`.
    pub fn classify(&mut self, in_port: u32) {
        self.in_port = in_port;
        self.in_phy_port = in_port;
        self.reclassify();
    }

    pub(crate) fn reclassify(&mut self) {
        Classifier::new(
            &self.buf,
            &mut self.chain,
            &mut self.matches,
            &mut self.flags,
            self.in_port,
            self.in_phy_port,
        )
        .classify();
    }

    /// Decode what follows the header at chain index `idx` afresh,
    /// dispatching on `next`. Views past `idx` are dropped first.
    pub(crate) fn redecode_after(&mut self, idx: usize, next: Next) {
        while self.chain.len() > idx + 1 {
            self.chain.pop(idx + 1);
        }

        let Some(pos) = self.chain.get(idx).map(|v| v.end()) else {
            return;
        };

        Classifier::new(
            &self.buf,
            &mut self.chain,
            &mut self.matches,
            &mut self.flags,
            self.in_port,
            self.in_phy_port,
        )
        .resume(pos, next);
    }

    /// Forget the decoded chain and match fields.
    pub fn reset(&mut self) {
        self.chain.clear();
        self.matches.clear();
        self.flags.remove(PacketFlags::PRESENT);
    }

    // ================================================================
    // Structural edits
    // ================================================================

    /// Open `len` zeroed bytes right behind the view at chain index
    /// `after` and describe them with a new view of `kind`.
    ///
    /// Returns the chain index of the new view. The head-room is
    /// checked before any byte moves.
    pub(crate) fn insert_view(
        &mut self,
        after: usize,
        kind: HeaderKind,
        len: usize,
    ) -> PacketResult<usize> {
        let at = self
            .chain
            .get(after)
            .map(|v| v.end())
            .ok_or(PacketError::InternalError("insert after missing view"))?;

        let off = self.buf.open_gap(at, len)?;
        self.chain
            .shift_front(after + 1, -(len as isize))
            .map_err(|e| self.internal(e))?;
        self.chain
            .insert_after(after, HeaderView::new(kind, off, len))
            .map_err(|e| self.internal(e))?;
        Ok(after + 1)
    }

    /// Cut the view at chain index `idx` out of the chain along with
    /// its bytes.
    pub(crate) fn remove_view(
        &mut self,
        idx: usize,
    ) -> PacketResult<HeaderView> {
        let view = *self
            .chain
            .get(idx)
            .ok_or(PacketError::InternalError("remove of missing view"))?;

        self.buf.close_gap(view.off, view.len).map_err(|e| self.internal(e))?;
        self.chain.pop(idx);
        self.chain
            .shift_front(idx, view.len as isize)
            .map_err(|e| self.internal(e))?;
        Ok(view)
    }

    // ================================================================
    // Checksums
    // ================================================================

    /// Mark derived fields for recomputation by the next
    /// [`Packet::calc_checksums`].
    pub fn mark_dirty(&mut self, flags: PacketFlags) {
        self.flags.insert(flags & PacketFlags::DIRTY);
    }

    /// Recompute every field marked dirty: the PPPoE length first,
    /// then the transport checksum, then the IPv4 header checksum.
    pub fn calc_checksums(&mut self) {
        let dirty = self.flags & PacketFlags::DIRTY;

        if dirty.contains(PacketFlags::PPPOE_LEN) {
            self.update_pppoe_len();
        }

        if dirty.intersects(
            PacketFlags::TCP_CSUM
                | PacketFlags::UDP_CSUM
                | PacketFlags::ICMPV4_CSUM,
        ) {
            self.update_ulp_csum();
        }

        if dirty.contains(PacketFlags::IPV4_CSUM) {
            self.update_ipv4_csum();
        }

        self.flags.remove(PacketFlags::DIRTY);
    }

    /// Do the stored IPv4 and transport checksums match the bytes
    /// they cover?
    ///
    /// A UDP checksum of zero means none was computed and always
    /// passes.
    pub fn verify_checksums(&self) -> bool {
        if let Some((off, csum)) = self.expected_ipv4_csum() {
            if self.buf.abs(off, 2) != Some(&csum[..]) {
                return false;
            }
        }

        if let Some(ulp) = self.expected_ulp_csum() {
            let stored = self.buf.abs(ulp.off, 2);
            let disabled =
                ulp.kind == HeaderKind::Udp && stored == Some(&[0, 0][..]);
            if !disabled && stored != Some(&ulp.csum[..]) {
                return false;
            }
        }

        true
    }

    fn update_ipv4_csum(&mut self) {
        if let Some((off, csum)) = self.expected_ipv4_csum() {
            self.write_abs(off, &csum);
        }
    }

    fn update_ulp_csum(&mut self) {
        let Some(ulp) = self.expected_ulp_csum() else {
            return;
        };

        // A zero UDP checksum says the sender did not compute one.
        if ulp.kind == HeaderKind::Udp
            && self.buf.abs(ulp.off, 2) == Some(&[0, 0][..])
        {
            return;
        }

        self.write_abs(ulp.off, &ulp.csum);
    }

    fn update_pppoe_len(&mut self) {
        let Some(idx) = self.chain.find(HeaderKind::Pppoe, SearchDir::Head, 0)
        else {
            return;
        };
        let Some(view) = self.chain.get(idx).copied() else {
            return;
        };

        let len = self.pppoe_payload_len(idx, view.off + PPPOE_HDR_SZ);
        if let Ok(pppoe) = self.header_mut_at::<PppoeHdr>(idx) {
            // Discovery lengths cover tags, which never move.
            if pppoe.code() == code::SESSION {
                pppoe.set_length(u16::try_from(len).unwrap_or(u16::MAX));
            }
        }
    }

    /// The PPPoE payload length for the header at chain index `idx`,
    /// whose payload starts at absolute offset `off`.
    ///
    /// When IPv4 follows, directly or behind PPP, the payload ends
    /// where IPv4 says it does, so Ethernet padding is not counted.
    pub(crate) fn pppoe_payload_len(&self, idx: usize, off: usize) -> usize {
        let avail = self.buf.end().saturating_sub(off);
        let kind = |i: usize| self.chain.get(i).map(|v| v.kind);
        let (ip_idx, ppp_len) = match (kind(idx + 1), kind(idx + 2)) {
            (Some(HeaderKind::Ipv4), _) => (idx + 1, 0),
            (Some(HeaderKind::Ppp), Some(HeaderKind::Ipv4)) => {
                (idx + 2, PPP_HDR_SZ)
            }
            _ => return avail,
        };

        self.header_at::<Ipv4Hdr>(ip_idx)
            .map(|ip| ppp_len + usize::from(ip.total_len()))
            .filter(|len| *len <= avail)
            .unwrap_or(avail)
    }

    fn write_abs(&mut self, off: usize, bytes: &[u8]) {
        if let Some(dst) = self.buf.abs_mut(off, bytes.len()) {
            dst.copy_from_slice(bytes);
        }
    }

    // The IPv4 header checksum, and where it goes.
    fn expected_ipv4_csum(&self) -> Option<(usize, [u8; 2])> {
        let idx = self.chain.find(HeaderKind::Ipv4, SearchDir::Head, 0)?;
        let view = self.chain.get(idx)?;
        let hdr = self.buf.abs(view.off, view.len)?;
        Some((view.off + IPV4_CSUM_OFF, compute_hdr_csum(hdr).bytes()))
    }

    // The checksum of the transport header directly inside the first
    // IPv4 header.
    fn expected_ulp_csum(&self) -> Option<UlpCsum> {
        let ip_idx = self.chain.find(HeaderKind::Ipv4, SearchDir::Head, 0)?;
        let ip_view = *self.chain.get(ip_idx)?;
        let ulp_view = *self.chain.get(ip_idx + 1)?;
        let ip = self.header_at::<Ipv4Hdr>(ip_idx)?;

        let (csum_off, proto) = match ulp_view.kind {
            HeaderKind::Tcp => (TCP_CSUM_OFF, Protocol::TCP),
            HeaderKind::Udp => (UDP_CSUM_OFF, Protocol::UDP),
            HeaderKind::Icmp => (ICMP_CSUM_OFF, Protocol::ICMP),
            _ => return None,
        };

        // The datagram ends where IPv4 says it does, unless that is
        // past the end of the frame.
        let avail = self.buf.end() - ulp_view.off;
        let ip_len = usize::from(ip.total_len());
        let ulp_len = match ip_len.checked_sub(ip_view.len) {
            Some(len) if len >= ulp_view.len && len <= avail => len,
            _ => avail,
        };
        let seg = self.buf.abs(ulp_view.off, ulp_len)?;

        let mut csum = if proto == Protocol::ICMP {
            Checksum::new()
        } else {
            Checksum::pseudo_v4(
                ip.src(),
                ip.dst(),
                proto.0,
                u16::try_from(ulp_len).ok()?,
            )
        };
        csum.add_bytes(&seg[..csum_off]);
        csum.add_bytes(&seg[csum_off + 2..]);

        let mut bytes = HeaderChecksum::from(csum).bytes();
        if proto == Protocol::UDP && bytes == [0, 0] {
            bytes = [0xFF, 0xFF];
        }

        Some(UlpCsum {
            kind: ulp_view.kind,
            off: ulp_view.off + csum_off,
            csum: bytes,
        })
    }
}

struct UlpCsum {
    kind: HeaderKind,
    off: usize,
    csum: [u8; 2],
}

impl Clone for Packet {
    /// Deep-copy the frame into a fresh buffer and classify the copy.
    /// Nothing decoded is shared.
    fn clone(&self) -> Self {
        let buf =
            PktBuf::copy_with_headroom(self.buf.head_room(), &self.buf[..]);
        let mut pkt = Self {
            chain: HeaderChain::new(),
            matches: MatchSet::new(),
            buf,
            flags: self.flags - PacketFlags::PRESENT,
            in_port: self.in_port,
            in_phy_port: self.in_phy_port,
            out_port: self.out_port,
            rx_time: self.rx_time,
            log: Arc::clone(&self.log),
        };
        pkt.reclassify();
        pkt
    }
}

impl PartialEq for Packet {
    fn eq(&self, other: &Self) -> bool {
        self.frame_bytes() == other.frame_bytes()
    }
}

impl core::fmt::Debug for Packet {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Packet")
            .field("len", &self.buf.len())
            .field("chain", &self.chain.kinds())
            .field("in_port", &self.in_port)
            .field("flags", &self.flags)
            .finish()
    }
}
