// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! The classifier: decodes a frame into a header chain and match set.
//!
//! Decoding is a single forward pass driven by a small state machine.
//! Each state reads one header at the current position, records its
//! match fields, appends its view, and names the next state from the
//! header's type field. Input that cannot be decoded is never an
//! error: whatever is left of the frame becomes one trailing
//! [`HeaderKind::Opaque`] view and decoding stops.

use super::arp::ArpHdr;
use super::buf::PktBuf;
use super::ether::EtherHdr;
use super::ether::EtherType;
use super::headers::HeaderChain;
use super::headers::HeaderKind;
use super::headers::HeaderType;
use super::headers::HeaderView;
use super::icmp::IcmpHdr;
use super::ip4::IPV4_HDR_SZ;
use super::ip4::IPV4_VERSION;
use super::ip4::Ipv4Hdr;
use super::ip4::Protocol;
use super::match_set::MatchSet;
use super::mpls::MplsHdr;
use super::packet::PacketFlags;
use super::ppp;
use super::ppp::PppHdr;
use super::pppoe::PPPOE_HDR_SZ;
use super::pppoe::PppoeHdr;
use super::tcp::TCP_HDR_SZ;
use super::tcp::TcpHdr;
use super::udp::UdpHdr;
use super::vlan::VlanHdr;
use crate::api::Oxm;

/// Where the classifier is in the frame.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Next {
    Ether,
    /// Dispatch on an ethertype, from Ethernet or from a tag.
    EtherType(u16),
    /// The next label of an MPLS stack.
    Mpls,
    Ppp,
    Ipv4,
    /// Dispatch on an IPv4 protocol number.
    Proto(u8),
    /// Wrap whatever is left in an opaque view.
    Rest,
    Done,
}

/// The packet state a classification pass writes to.
pub(crate) struct Classifier<'a> {
    buf: &'a PktBuf,
    chain: &'a mut HeaderChain,
    matches: &'a mut MatchSet,
    flags: &'a mut PacketFlags,
    in_port: u32,
    in_phy_port: u32,
    pos: usize,
}

impl<'a> Classifier<'a> {
    pub(crate) fn new(
        buf: &'a PktBuf,
        chain: &'a mut HeaderChain,
        matches: &'a mut MatchSet,
        flags: &'a mut PacketFlags,
        in_port: u32,
        in_phy_port: u32,
    ) -> Self {
        let pos = buf.start();
        Self { buf, chain, matches, flags, in_port, in_phy_port, pos }
    }

    /// Decode the whole frame from scratch.
    pub(crate) fn classify(mut self) {
        self.chain.clear();
        self.matches.clear();
        self.flags.remove(PacketFlags::PRESENT);
        self.pos = self.buf.start();
        self.run(Next::Ether);
    }

    /// Continue decoding at absolute offset `pos` in state `next`,
    /// appending to the chain as it stands.
    pub(crate) fn resume(mut self, pos: usize, next: Next) {
        self.pos = pos;
        self.run(next);
    }

    fn run(&mut self, mut next: Next) {
        loop {
            next = match next {
                Next::Ether => self.ether(),
                Next::EtherType(et) => self.ether_type(EtherType(et)),
                Next::Mpls => self.mpls(),
                Next::Ppp => self.ppp(),
                Next::Ipv4 => self.ipv4(),
                Next::Proto(proto) => self.proto(Protocol(proto)),
                Next::Rest => self.rest(),
                Next::Done => return,
            };
        }
    }

    fn remaining(&self) -> usize {
        self.buf.end().saturating_sub(self.pos)
    }

    /// Read a `H` at the current position without consuming it.
    fn peek<H: HeaderType>(&self) -> Option<&'a H> {
        let bytes = self.buf.abs(self.pos, H::SIZE)?;
        H::ref_from_bytes(bytes).ok()
    }

    fn push(&mut self, kind: HeaderKind, len: usize) {
        self.chain.append(HeaderView::new(kind, self.pos, len));
        self.pos += len;
    }

    fn rest(&mut self) -> Next {
        let len = self.remaining();
        if len > 0 {
            self.push(HeaderKind::Opaque, len);
        }
        Next::Done
    }

    fn ether(&mut self) -> Next {
        // Too short for Ethernet: nothing at all is recorded.
        let Some(eth) = self.peek::<EtherHdr>() else {
            return Next::Done;
        };

        self.matches.set(Oxm::InPort(self.in_port));
        self.matches.set(Oxm::InPhyPort(self.in_phy_port));
        self.matches.set(Oxm::EthDst(eth.dst()));
        self.matches.set(Oxm::EthSrc(eth.src()));
        self.matches.set(Oxm::EthType(eth.ether_type()));
        self.push(HeaderKind::Ether, EtherHdr::SIZE);
        Next::EtherType(eth.ether_type())
    }

    fn ether_type(&mut self, et: EtherType) -> Next {
        match et {
            _ if et.is_vlan() => self.vlan(),
            _ if et.is_mpls() => self.mpls(),
            EtherType::PPPOE_DISCOVERY => self.pppoe(false),
            EtherType::PPPOE_SESSION => self.pppoe(true),
            EtherType::ARP => self.arp(),
            EtherType::IPV4 => Next::Ipv4,
            _ => Next::Rest,
        }
    }

    fn vlan(&mut self) -> Next {
        let Some(vlan) = self.peek::<VlanHdr>() else {
            return Next::Rest;
        };

        if !self.flags.contains(PacketFlags::VLAN_PRESENT) {
            self.flags.insert(PacketFlags::VLAN_PRESENT);
            self.matches.set(Oxm::VlanVid(vlan.vid()));
            self.matches.set(Oxm::VlanPcp(vlan.pcp()));
        }

        self.push(HeaderKind::Vlan, VlanHdr::SIZE);
        Next::EtherType(vlan.inner_type())
    }

    fn mpls(&mut self) -> Next {
        let Some(mpls) = self.peek::<MplsHdr>() else {
            return Next::Rest;
        };

        if !self.flags.contains(PacketFlags::MPLS_PRESENT) {
            self.flags.insert(PacketFlags::MPLS_PRESENT);
            self.matches.set(Oxm::MplsLabel(mpls.label()));
            self.matches.set(Oxm::MplsTc(mpls.tc()));
        }

        self.push(HeaderKind::Mpls, MplsHdr::SIZE);

        // The label stack does not say what it carries.
        if mpls.bos() { Next::Rest } else { Next::Mpls }
    }

    fn pppoe(&mut self, session: bool) -> Next {
        let Some(pppoe) = self.peek::<PppoeHdr>() else {
            return Next::Rest;
        };

        self.matches.set(Oxm::PppoeCode(pppoe.code()));
        self.matches.set(Oxm::PppoeType(pppoe.pppoe_type()));
        self.matches.set(Oxm::PppoeSid(pppoe.session_id()));

        if session {
            self.push(HeaderKind::Pppoe, PPPOE_HDR_SZ);
            return Next::Ppp;
        }

        // Discovery: the view holds the tags too, any Ethernet padding
        // after them stays opaque.
        let tags = usize::from(pppoe.length())
            .min(self.remaining() - PPPOE_HDR_SZ);
        self.push(HeaderKind::Pppoe, PPPOE_HDR_SZ + tags);
        Next::Rest
    }

    fn ppp(&mut self) -> Next {
        let Some(ppp) = self.peek::<PppHdr>() else {
            return Next::Rest;
        };

        self.matches.set(Oxm::PppProt(ppp.protocol()));
        self.push(HeaderKind::Ppp, PppHdr::SIZE);

        match ppp.protocol() {
            ppp::proto::IPV4 => Next::Ipv4,
            _ => Next::Rest,
        }
    }

    fn arp(&mut self) -> Next {
        let Some(arp) = self.peek::<ArpHdr>() else {
            return Next::Rest;
        };

        if !arp.is_ether_ipv4() {
            return Next::Rest;
        }

        self.matches.set(Oxm::ArpOp(arp.op()));
        self.matches.set(Oxm::ArpSpa(arp.spa()));
        self.matches.set(Oxm::ArpTpa(arp.tpa()));
        self.matches.set(Oxm::ArpSha(arp.sha()));
        self.matches.set(Oxm::ArpTha(arp.tha()));
        self.push(HeaderKind::Arp, ArpHdr::SIZE);
        Next::Rest
    }

    fn ipv4(&mut self) -> Next {
        let Some(ip) = self.peek::<Ipv4Hdr>() else {
            return Next::Rest;
        };

        let hdr_len = ip.hdr_len();
        if ip.version() != IPV4_VERSION
            || hdr_len < IPV4_HDR_SZ
            || hdr_len > self.remaining()
        {
            return Next::Rest;
        }

        self.matches.set(Oxm::IpProto(ip.proto()));
        self.matches.set(Oxm::Ipv4Src(ip.src()));
        self.matches.set(Oxm::Ipv4Dst(ip.dst()));
        self.matches.set(Oxm::IpDscp(ip.dscp()));
        self.matches.set(Oxm::IpEcn(ip.ecn()));
        self.push(HeaderKind::Ipv4, hdr_len);

        if ip.is_fragment() {
            return Next::Rest;
        }

        Next::Proto(ip.proto())
    }

    fn proto(&mut self, proto: Protocol) -> Next {
        match proto {
            Protocol::ICMP => {
                let Some(icmp) = self.peek::<IcmpHdr>() else {
                    return Next::Rest;
                };
                self.matches.set(Oxm::Icmpv4Type(icmp.msg_type()));
                self.matches.set(Oxm::Icmpv4Code(icmp.code()));
                self.push(HeaderKind::Icmp, IcmpHdr::SIZE);
            }

            Protocol::UDP => {
                let Some(udp) = self.peek::<UdpHdr>() else {
                    return Next::Rest;
                };
                self.matches.set(Oxm::UdpSrc(udp.src_port()));
                self.matches.set(Oxm::UdpDst(udp.dst_port()));
                self.push(HeaderKind::Udp, UdpHdr::SIZE);
            }

            Protocol::TCP => {
                let Some(tcp) = self.peek::<TcpHdr>() else {
                    return Next::Rest;
                };
                let hdr_len = tcp.hdr_len();
                if hdr_len < TCP_HDR_SZ || hdr_len > self.remaining() {
                    return Next::Rest;
                }
                self.matches.set(Oxm::TcpSrc(tcp.src_port()));
                self.matches.set(Oxm::TcpDst(tcp.dst_port()));
                self.push(HeaderKind::Tcp, hdr_len);
            }

            _ => {}
        }

        Next::Rest
    }
}
