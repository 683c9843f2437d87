// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! The mutator: structural and field edits of a classified packet,
//! and the dispatch of decoded OpenFlow actions onto them.
//!
//! Tags are always pushed right behind the Ethernet header (PPP goes
//! behind PPPoE when there is one) and only ever popped from there.
//! Popping a tag that is absent, or that sits deeper in the chain, is
//! a noted no-op so that replaying an action list never fails halfway.

use super::arp::ArpHdr;
use super::ether::EtherHdr;
use super::ether::EtherType;
use super::headers::HeaderKind;
use super::headers::SearchDir;
use super::icmp::IcmpHdr;
use super::ip4::Ipv4Hdr;
use super::mpls::MPLS_HDR_SZ;
use super::mpls::MplsHdr;
use super::packet::Packet;
use super::packet::PacketError;
use super::packet::PacketFlags;
use super::packet::PacketResult;
use super::parse::Next;
use super::ppp::PPP_HDR_SZ;
use super::ppp::PppHdr;
use super::pppoe::PPPOE_HDR_SZ;
use super::pppoe::PPPOE_TYPE;
use super::pppoe::PPPOE_VER;
use super::pppoe::PppoeHdr;
use super::pppoe::code;
use super::tcp::TcpHdr;
use super::udp::UdpHdr;
use super::vlan::VLAN_HDR_SZ;
use super::vlan::VlanHdr;
use crate::api::Action;
use crate::api::Oxm;
use crate::api::OxmField;

impl Packet {
    // ================================================================
    // Low-level tag primitives
    // ================================================================

    /// Open a zeroed `len`-byte region right behind the Ethernet
    /// header, returning its offset from the start of the frame.
    ///
    /// The region is described by an opaque view until the caller
    /// re-classifies. Fails with `OutOfRange` when `len` exceeds the
    /// remaining head-room, in which case nothing changes.
    pub fn tag_insert(&mut self, len: usize) -> PacketResult<usize> {
        self.ether_idx()?;

        if len == 0 {
            return Ok(self.chain.get(0).map_or(0, |v| v.len));
        }

        let idx = self.insert_view(0, HeaderKind::Opaque, len)?;
        let off = self.chain.get(idx).map_or(0, |v| v.off);
        Ok(off - self.buf.start())
    }

    /// Cut the view at chain index `idx` and its bytes out of the
    /// frame, then classify what is left.
    pub fn tag_remove(&mut self, idx: usize) -> PacketResult<()> {
        if idx == 0 || idx >= self.chain.len() {
            return Err(PacketError::Invalid("no removable view at index"));
        }

        self.remove_view(idx)?;
        self.reclassify();
        Ok(())
    }

    fn ether_idx(&self) -> PacketResult<usize> {
        match self.chain.head() {
            Some(v) if v.kind == HeaderKind::Ether => Ok(0),
            _ => Err(PacketError::NotFound(HeaderKind::Ether)),
        }
    }

    fn ether_mut(&mut self) -> PacketResult<&mut EtherHdr> {
        let idx = self.ether_idx()?;
        self.header_mut_at::<EtherHdr>(idx)
    }

    fn set_ether_type(&mut self, et: u16) -> PacketResult<()> {
        self.ether_mut()?.set_ether_type(et);
        self.matches.set(Oxm::EthType(et));
        Ok(())
    }

    fn kind_at(&self, idx: usize) -> Option<HeaderKind> {
        self.chain.get(idx).map(|v| v.kind)
    }

    /// Find the poppable tag of `kind`: it must sit right behind
    /// Ethernet, or for PPP right behind a leading PPPoE header.
    fn outer_tag(&self, kind: HeaderKind, name: &str) -> Option<usize> {
        if self.kind_at(1) == Some(kind) {
            return Some(1);
        }

        if kind == HeaderKind::Ppp
            && self.kind_at(1) == Some(HeaderKind::Pppoe)
            && self.kind_at(2) == Some(HeaderKind::Ppp)
        {
            return Some(2);
        }

        if self.chain.find(kind, SearchDir::Head, 0).is_some() {
            self.note(&format!("pop_{name}: {kind} is not the outer tag"));
        } else {
            self.note(&format!("pop_{name}: no {kind} header"));
        }
        None
    }

    // Report the first header of each tag kind in the match set, the
    // same way the classifier does.

    fn sync_vlan_matches(&mut self) {
        let outer = self.header::<VlanHdr>(0).map(|v| (v.vid(), v.pcp()));
        match outer {
            Some((vid, pcp)) => {
                self.matches.set(Oxm::VlanVid(vid));
                self.matches.set(Oxm::VlanPcp(pcp));
            }
            None => {
                self.matches.remove(OxmField::VlanVid);
                self.matches.remove(OxmField::VlanPcp);
            }
        }
        self.flags.set(PacketFlags::VLAN_PRESENT, outer.is_some());
    }

    fn sync_mpls_matches(&mut self) {
        let outer = self.header::<MplsHdr>(0).map(|m| (m.label(), m.tc()));
        match outer {
            Some((label, tc)) => {
                self.matches.set(Oxm::MplsLabel(label));
                self.matches.set(Oxm::MplsTc(tc));
            }
            None => {
                self.matches.remove(OxmField::MplsLabel);
                self.matches.remove(OxmField::MplsTc);
            }
        }
        self.flags.set(PacketFlags::MPLS_PRESENT, outer.is_some());
    }

    fn sync_pppoe_matches(&mut self) {
        let outer = self
            .header::<PppoeHdr>(0)
            .map(|p| (p.code(), p.pppoe_type(), p.session_id()));
        match outer {
            Some((code, ty, sid)) => {
                self.matches.set(Oxm::PppoeCode(code));
                self.matches.set(Oxm::PppoeType(ty));
                self.matches.set(Oxm::PppoeSid(sid));
            }
            None => {
                self.matches.remove(OxmField::PppoeCode);
                self.matches.remove(OxmField::PppoeType);
                self.matches.remove(OxmField::PppoeSid);
            }
        }
    }

    fn sync_ppp_matches(&mut self) {
        match self.header::<PppHdr>(0).map(|p| p.protocol()) {
            Some(proto) => self.matches.set(Oxm::PppProt(proto)),
            None => {
                self.matches.remove(OxmField::PppProt);
            }
        }
    }

    // ================================================================
    // Push and pop
    // ================================================================

    /// Push a VLAN tag with TPID `ethertype`.
    ///
    /// The VID and PCP are copied from the outer VLAN tag if there is
    /// one, and are zero otherwise.
    pub fn push_vlan(&mut self, ethertype: u16) -> PacketResult<()> {
        if !EtherType(ethertype).is_vlan() {
            return Err(PacketError::Invalid("push_vlan: not a VLAN TPID"));
        }

        let ether = self.ether_idx()?;
        let inner_type = self
            .header::<EtherHdr>(0)
            .map(|e| e.ether_type())
            .ok_or(PacketError::NotFound(HeaderKind::Ether))?;
        let (vid, pcp) = match self.kind_at(1) {
            Some(HeaderKind::Vlan) => {
                let outer = self.header::<VlanHdr>(0);
                outer.map_or((0, 0), |v| (v.vid(), v.pcp()))
            }
            _ => (0, 0),
        };

        let idx = self.insert_view(ether, HeaderKind::Vlan, VLAN_HDR_SZ)?;
        let vlan = self.header_mut_at::<VlanHdr>(idx)?;
        vlan.set_vid(vid);
        vlan.set_pcp(pcp);
        vlan.set_inner_type(inner_type);

        self.set_ether_type(ethertype)?;
        self.sync_vlan_matches();
        Ok(())
    }

    /// Pop the outer VLAN tag, restoring its inner ethertype.
    pub fn pop_vlan(&mut self) -> PacketResult<()> {
        let Some(idx) = self.outer_tag(HeaderKind::Vlan, "vlan") else {
            return Ok(());
        };

        let inner_type = self.header_mut_at::<VlanHdr>(idx)?.inner_type();
        self.remove_view(idx)?;
        self.set_ether_type(inner_type)?;
        self.sync_vlan_matches();
        Ok(())
    }

    /// Push an MPLS label with ethertype `ethertype`.
    ///
    /// On an existing stack the label, TC, and TTL of the outer label
    /// are copied. Otherwise the label starts as the bottom of the
    /// stack with the IPv4 TTL, if any.
    pub fn push_mpls(&mut self, ethertype: u16) -> PacketResult<()> {
        if !EtherType(ethertype).is_mpls() {
            return Err(PacketError::Invalid(
                "push_mpls: not an MPLS ethertype",
            ));
        }

        let ether = self.ether_idx()?;
        let (label, tc, ttl, bos) = match self.header::<MplsHdr>(0) {
            Some(m) => (m.label(), m.tc(), m.ttl(), false),
            None => {
                let ttl = self.header::<Ipv4Hdr>(0).map_or(0, |ip| ip.ttl());
                (0, 0, ttl, true)
            }
        };

        let idx = self.insert_view(ether, HeaderKind::Mpls, MPLS_HDR_SZ)?;
        let mpls = self.header_mut_at::<MplsHdr>(idx)?;
        mpls.set_label(label);
        mpls.set_tc(tc);
        mpls.set_ttl(ttl);
        mpls.set_bos(bos);

        self.set_ether_type(ethertype)?;
        self.sync_mpls_matches();
        Ok(())
    }

    /// Pop the outer MPLS label, setting the Ethernet type to
    /// `ethertype`.
    ///
    /// When the last label goes, the bytes it carried are decoded
    /// afresh as `ethertype`.
    pub fn pop_mpls(&mut self, ethertype: u16) -> PacketResult<()> {
        let Some(idx) = self.outer_tag(HeaderKind::Mpls, "mpls") else {
            return Ok(());
        };

        self.remove_view(idx)?;
        self.set_ether_type(ethertype)?;
        self.sync_mpls_matches();
        self.redecode_payload(ethertype);
        Ok(())
    }

    /// Push a PPPoE header with ethertype `ethertype`.
    ///
    /// The code and session ID are copied from an outer PPPoE header;
    /// a fresh header is a session header with session ID 0.
    pub fn push_pppoe(&mut self, ethertype: u16) -> PacketResult<()> {
        if !EtherType(ethertype).is_pppoe() {
            return Err(PacketError::Invalid(
                "push_pppoe: not a PPPoE ethertype",
            ));
        }

        let ether = self.ether_idx()?;
        let (code, sid) = match self.kind_at(1) {
            Some(HeaderKind::Pppoe) => self
                .header::<PppoeHdr>(0)
                .map_or((code::SESSION, 0), |p| (p.code(), p.session_id())),
            _ => (code::SESSION, 0),
        };

        let idx = self.insert_view(ether, HeaderKind::Pppoe, PPPOE_HDR_SZ)?;
        let after = self
            .chain
            .get(idx)
            .map_or(0, |v| self.pppoe_payload_len(idx, v.end()));
        let pppoe = self.header_mut_at::<PppoeHdr>(idx)?;
        pppoe.set_version(PPPOE_VER);
        pppoe.set_pppoe_type(PPPOE_TYPE);
        pppoe.set_code(code);
        pppoe.set_session_id(sid);
        pppoe.set_length(u16::try_from(after).unwrap_or(u16::MAX));

        self.set_ether_type(ethertype)?;
        self.sync_pppoe_matches();
        Ok(())
    }

    /// Pop the outer PPPoE header, setting the Ethernet type to
    /// `ethertype`.
    ///
    /// A session's PPP header goes with it. The frame is classified
    /// afresh as `ethertype` afterwards.
    pub fn pop_pppoe(&mut self, ethertype: u16) -> PacketResult<()> {
        let Some(idx) = self.outer_tag(HeaderKind::Pppoe, "pppoe") else {
            return Ok(());
        };

        if self.kind_at(idx + 1) == Some(HeaderKind::Ppp) {
            self.remove_view(idx + 1)?;
        }
        self.remove_view(idx)?;
        self.ether_mut()?.set_ether_type(ethertype);
        self.reclassify();
        Ok(())
    }

    /// Push a PPP header carrying `protocol`, behind a leading PPPoE
    /// header if there is one.
    pub fn push_ppp(&mut self, protocol: u16) -> PacketResult<()> {
        let ether = self.ether_idx()?;
        let after = match self.kind_at(1) {
            Some(HeaderKind::Pppoe) => 1,
            _ => ether,
        };

        let idx = self.insert_view(after, HeaderKind::Ppp, PPP_HDR_SZ)?;
        self.header_mut_at::<PppHdr>(idx)?.set_protocol(protocol);
        self.sync_ppp_matches();

        self.mark_dirty(PacketFlags::PPPOE_LEN);
        self.calc_checksums();
        Ok(())
    }

    pub fn pop_ppp(&mut self) -> PacketResult<()> {
        let Some(idx) = self.outer_tag(HeaderKind::Ppp, "ppp") else {
            return Ok(());
        };

        self.remove_view(idx)?;
        self.sync_ppp_matches();

        self.mark_dirty(PacketFlags::PPPOE_LEN);
        self.calc_checksums();
        Ok(())
    }

    // With the outer tag gone, an opaque tail directly behind
    // Ethernet can now be read as `ethertype`.
    fn redecode_payload(&mut self, ethertype: u16) {
        if self.chain.len() == 2 && self.kind_at(1) == Some(HeaderKind::Opaque)
        {
            self.redecode_after(0, Next::EtherType(ethertype));
        }
    }

    // ================================================================
    // TTL
    // ================================================================

    pub fn set_mpls_ttl(&mut self, ttl: u8) -> PacketResult<()> {
        self.header_mut::<MplsHdr>(0)?.set_ttl(ttl);
        Ok(())
    }

    /// Decrement the outer MPLS TTL. A TTL already at zero is
    /// `Invalid` and left alone.
    pub fn dec_mpls_ttl(&mut self) -> PacketResult<()> {
        let mpls = self.header_mut::<MplsHdr>(0)?;
        match mpls.ttl().checked_sub(1) {
            Some(ttl) => {
                mpls.set_ttl(ttl);
                Ok(())
            }
            None => {
                self.warn("dec_mpls_ttl: TTL is already 0");
                Err(PacketError::Invalid("MPLS TTL is 0"))
            }
        }
    }

    pub fn set_nw_ttl(&mut self, ttl: u8) -> PacketResult<()> {
        self.header_mut::<Ipv4Hdr>(0)?.set_ttl(ttl);
        self.mark_dirty(PacketFlags::IPV4_CSUM);
        self.calc_checksums();
        Ok(())
    }

    /// Decrement the IPv4 TTL. A TTL already at zero is `Invalid` and
    /// left alone.
    pub fn dec_nw_ttl(&mut self) -> PacketResult<()> {
        let ip = self.header_mut::<Ipv4Hdr>(0)?;
        let Some(ttl) = ip.ttl().checked_sub(1) else {
            self.warn("dec_nw_ttl: TTL is already 0");
            return Err(PacketError::Invalid("IPv4 TTL is 0"));
        };

        ip.set_ttl(ttl);
        self.mark_dirty(PacketFlags::IPV4_CSUM);
        self.calc_checksums();
        Ok(())
    }

    pub fn copy_ttl_out(&mut self) -> PacketResult<()> {
        Err(PacketError::NotImplemented("copy_ttl_out"))
    }

    pub fn copy_ttl_in(&mut self) -> PacketResult<()> {
        Err(PacketError::NotImplemented("copy_ttl_in"))
    }

    // ================================================================
    // Set-Field
    // ================================================================

    /// Write one OXM value into the header it belongs to.
    ///
    /// The match set is updated with the value as read back from the
    /// header, so bits a header cannot hold (e.g. above 12 in a VID)
    /// are dropped. Affected checksums are recomputed before
    /// returning. Fields with no header to write to are warned about
    /// and ignored.
    pub fn set_field(&mut self, oxm: &Oxm) -> PacketResult<()> {
        match *oxm {
            Oxm::EthDst(mac) => {
                self.ether_mut()?.set_dst(mac);
                self.matches.set(Oxm::EthDst(mac));
            }

            Oxm::EthSrc(mac) => {
                self.ether_mut()?.set_src(mac);
                self.matches.set(Oxm::EthSrc(mac));
            }

            // What follows Ethernet now reads differently.
            Oxm::EthType(et) => {
                self.ether_mut()?.set_ether_type(et);
                self.reclassify();
            }

            Oxm::VlanVid(vid) => {
                let vlan = self.header_mut::<VlanHdr>(0)?;
                vlan.set_vid(vid);
                let vid = vlan.vid();
                self.matches.set(Oxm::VlanVid(vid));
            }

            Oxm::VlanPcp(pcp) => {
                let vlan = self.header_mut::<VlanHdr>(0)?;
                vlan.set_pcp(pcp);
                let pcp = vlan.pcp();
                self.matches.set(Oxm::VlanPcp(pcp));
            }

            Oxm::IpDscp(dscp) => {
                let ip = self.header_mut::<Ipv4Hdr>(0)?;
                ip.set_dscp(dscp & 0x3F);
                let dscp = ip.dscp();
                self.matches.set(Oxm::IpDscp(dscp));
                self.mark_dirty(PacketFlags::IPV4_CSUM);
            }

            Oxm::IpEcn(ecn) => {
                let ip = self.header_mut::<Ipv4Hdr>(0)?;
                ip.set_ecn(ecn);
                let ecn = ip.ecn();
                self.matches.set(Oxm::IpEcn(ecn));
                self.mark_dirty(PacketFlags::IPV4_CSUM);
            }

            // The transport header behind IPv4 changes with the
            // protocol, so decode it again.
            Oxm::IpProto(proto) => {
                let ip = self.header_mut::<Ipv4Hdr>(0)?;
                ip.set_proto(proto);
                // A fragment carries no transport header to decode.
                let next = if ip.is_fragment() {
                    Next::Rest
                } else {
                    Next::Proto(proto)
                };
                if let Some(idx) =
                    self.chain.find(HeaderKind::Ipv4, SearchDir::Head, 0)
                {
                    self.matches.set(Oxm::IpProto(proto));
                    self.clear_ulp_matches();
                    self.redecode_after(idx, next);
                }
                self.mark_dirty(ulp_dirty() | PacketFlags::IPV4_CSUM);
            }

            Oxm::Ipv4Src(ip) => {
                self.header_mut::<Ipv4Hdr>(0)?.set_src(ip);
                self.matches.set(Oxm::Ipv4Src(ip));
                self.mark_dirty(ulp_dirty() | PacketFlags::IPV4_CSUM);
            }

            Oxm::Ipv4Dst(ip) => {
                self.header_mut::<Ipv4Hdr>(0)?.set_dst(ip);
                self.matches.set(Oxm::Ipv4Dst(ip));
                self.mark_dirty(ulp_dirty() | PacketFlags::IPV4_CSUM);
            }

            Oxm::TcpSrc(port) => {
                self.header_mut::<TcpHdr>(0)?.set_src_port(port);
                self.matches.set(Oxm::TcpSrc(port));
                self.mark_dirty(PacketFlags::TCP_CSUM);
            }

            Oxm::TcpDst(port) => {
                self.header_mut::<TcpHdr>(0)?.set_dst_port(port);
                self.matches.set(Oxm::TcpDst(port));
                self.mark_dirty(PacketFlags::TCP_CSUM);
            }

            Oxm::UdpSrc(port) => {
                self.header_mut::<UdpHdr>(0)?.set_src_port(port);
                self.matches.set(Oxm::UdpSrc(port));
                self.mark_dirty(PacketFlags::UDP_CSUM);
            }

            Oxm::UdpDst(port) => {
                self.header_mut::<UdpHdr>(0)?.set_dst_port(port);
                self.matches.set(Oxm::UdpDst(port));
                self.mark_dirty(PacketFlags::UDP_CSUM);
            }

            Oxm::Icmpv4Type(ty) => {
                self.header_mut::<IcmpHdr>(0)?.set_msg_type(ty);
                self.matches.set(Oxm::Icmpv4Type(ty));
                self.mark_dirty(PacketFlags::ICMPV4_CSUM);
            }

            Oxm::Icmpv4Code(code) => {
                self.header_mut::<IcmpHdr>(0)?.set_code(code);
                self.matches.set(Oxm::Icmpv4Code(code));
                self.mark_dirty(PacketFlags::ICMPV4_CSUM);
            }

            Oxm::ArpOp(op) => {
                self.header_mut::<ArpHdr>(0)?.set_op(op);
                self.matches.set(Oxm::ArpOp(op));
            }

            Oxm::ArpSpa(ip) => {
                self.header_mut::<ArpHdr>(0)?.set_spa(ip);
                self.matches.set(Oxm::ArpSpa(ip));
            }

            Oxm::ArpTpa(ip) => {
                self.header_mut::<ArpHdr>(0)?.set_tpa(ip);
                self.matches.set(Oxm::ArpTpa(ip));
            }

            Oxm::ArpSha(mac) => {
                self.header_mut::<ArpHdr>(0)?.set_sha(mac);
                self.matches.set(Oxm::ArpSha(mac));
            }

            Oxm::ArpTha(mac) => {
                self.header_mut::<ArpHdr>(0)?.set_tha(mac);
                self.matches.set(Oxm::ArpTha(mac));
            }

            Oxm::MplsLabel(label) => {
                let mpls = self.header_mut::<MplsHdr>(0)?;
                mpls.set_label(label);
                let label = mpls.label();
                self.matches.set(Oxm::MplsLabel(label));
            }

            Oxm::MplsTc(tc) => {
                let mpls = self.header_mut::<MplsHdr>(0)?;
                mpls.set_tc(tc);
                let tc = mpls.tc();
                self.matches.set(Oxm::MplsTc(tc));
            }

            Oxm::PppoeCode(code) => {
                self.header_mut::<PppoeHdr>(0)?.set_code(code);
                self.matches.set(Oxm::PppoeCode(code));
            }

            Oxm::PppoeType(ty) => {
                let pppoe = self.header_mut::<PppoeHdr>(0)?;
                pppoe.set_pppoe_type(ty);
                let ty = pppoe.pppoe_type();
                self.matches.set(Oxm::PppoeType(ty));
            }

            Oxm::PppoeSid(sid) => {
                self.header_mut::<PppoeHdr>(0)?.set_session_id(sid);
                self.matches.set(Oxm::PppoeSid(sid));
            }

            Oxm::PppProt(proto) => {
                self.header_mut::<PppHdr>(0)?.set_protocol(proto);
                if let Some(idx) =
                    self.chain.find(HeaderKind::Ppp, SearchDir::Head, 0)
                {
                    self.matches.set(Oxm::PppProt(proto));
                    self.clear_l3_matches();
                    let next = match proto {
                        super::ppp::proto::IPV4 => Next::Ipv4,
                        _ => Next::Rest,
                    };
                    self.redecode_after(idx, next);
                }
            }

            Oxm::InPort(_)
            | Oxm::InPhyPort(_)
            | Oxm::Metadata(_)
            | Oxm::SctpSrc(_)
            | Oxm::SctpDst(_)
            | Oxm::Ipv6Src(_)
            | Oxm::Ipv6Dst(_)
            | Oxm::Ipv6Flabel(_)
            | Oxm::Icmpv6Type(_)
            | Oxm::Icmpv6Code(_)
            | Oxm::Ipv6NdTarget(_)
            | Oxm::Ipv6NdSll(_)
            | Oxm::Ipv6NdTll(_)
            | Oxm::MplsBos(_)
            | Oxm::PbbIsid(_)
            | Oxm::TunnelId(_)
            | Oxm::Ipv6Exthdr(_)
            | Oxm::Other { .. } => {
                self.warn(&format!("set_field: {oxm} is not supported"));
                return Ok(());
            }
        }

        self.calc_checksums();
        Ok(())
    }

    fn clear_ulp_matches(&mut self) {
        for f in [
            OxmField::TcpSrc,
            OxmField::TcpDst,
            OxmField::UdpSrc,
            OxmField::UdpDst,
            OxmField::Icmpv4Type,
            OxmField::Icmpv4Code,
        ] {
            self.matches.remove(f);
        }
    }

    fn clear_l3_matches(&mut self) {
        for f in [
            OxmField::IpProto,
            OxmField::Ipv4Src,
            OxmField::Ipv4Dst,
            OxmField::IpDscp,
            OxmField::IpEcn,
        ] {
            self.matches.remove(f);
        }
        self.clear_ulp_matches();
    }

    // ================================================================
    // Action dispatch
    // ================================================================

    /// Apply one decoded action.
    ///
    /// Actions which do not edit the packet (output, group, queue) and
    /// those this engine does not support are logged and skipped.
    pub fn handle_action(&mut self, action: &Action) -> PacketResult<()> {
        match action {
            Action::SetField(oxm) => self.set_field(oxm),
            Action::CopyTtlOut => self.copy_ttl_out(),
            Action::CopyTtlIn => self.copy_ttl_in(),
            Action::SetMplsTtl(ttl) => self.set_mpls_ttl(*ttl),
            Action::DecMplsTtl => self.dec_mpls_ttl(),
            Action::PushVlan(et) => self.push_vlan(*et),
            Action::PopVlan => self.pop_vlan(),
            Action::PushMpls(et) => self.push_mpls(*et),
            Action::PopMpls(et) => self.pop_mpls(*et),
            Action::SetNwTtl(ttl) => self.set_nw_ttl(*ttl),
            Action::DecNwTtl => self.dec_nw_ttl(),
            Action::PushPppoe(et) => self.push_pppoe(*et),
            Action::PopPppoe(et) => self.pop_pppoe(*et),
            Action::PushPpp(proto) => self.push_ppp(*proto),
            Action::PopPpp => self.pop_ppp(),

            Action::Output { .. }
            | Action::Group(_)
            | Action::SetQueue(_)
            | Action::PushPbb(_)
            | Action::PopPbb
            | Action::Experimenter { .. }
            | Action::Unknown { .. } => {
                self.warn(&format!("{action}: not handled by packet engine"));
                Ok(())
            }
        }
    }

    pub fn apply_action(&mut self, action: &Action) -> PacketResult<()> {
        self.handle_action(action)
    }
}

fn ulp_dirty() -> PacketFlags {
    PacketFlags::TCP_CSUM | PacketFlags::UDP_CSUM | PacketFlags::ICMPV4_CSUM
}
