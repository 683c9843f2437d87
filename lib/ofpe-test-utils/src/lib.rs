// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Common routines for integration tests.
//!
//! Frames are built with smoltcp rather than with the engine's own
//! header types, so that the engine is always checked against an
//! independent encoder.

// This type of pedantry is more trouble than it's worth here.
#![allow(dead_code)]

pub use ofpe_api::Ipv4Addr;
pub use ofpe_api::MacAddr;
use smoltcp::phy::ChecksumCapabilities;
use smoltcp::wire::ArpOperation;
use smoltcp::wire::ArpPacket;
use smoltcp::wire::ArpRepr;
use smoltcp::wire::EthernetAddress;
use smoltcp::wire::EthernetFrame;
use smoltcp::wire::EthernetProtocol;
use smoltcp::wire::Icmpv4Packet;
use smoltcp::wire::Icmpv4Repr;
use smoltcp::wire::IpAddress;
use smoltcp::wire::IpProtocol;
use smoltcp::wire::Ipv4Packet;
use smoltcp::wire::TcpPacket;
use smoltcp::wire::TcpSeqNumber;
use smoltcp::wire::UdpPacket;

pub const SRC_MAC: MacAddr =
    MacAddr::from_const([0x11, 0x22, 0x33, 0x44, 0x55, 0x66]);
pub const DST_MAC: MacAddr =
    MacAddr::from_const([0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]);
pub const BCAST_MAC: MacAddr = MacAddr::from_const([0xff; 6]);

pub const SRC_IP: Ipv4Addr = Ipv4Addr::from_const([10, 0, 0, 1]);
pub const DST_IP: Ipv4Addr = Ipv4Addr::from_const([10, 0, 0, 2]);

pub const ETHER_HDR_LEN: usize = 14;
pub const IPV4_HDR_LEN: usize = 20;
pub const TAG_LEN: usize = 4;
pub const PPPOE_LEN: usize = 6;
pub const PPP_LEN: usize = 2;

pub const ETYPE_IPV4: u16 = 0x0800;
pub const ETYPE_ARP: u16 = 0x0806;
pub const ETYPE_VLAN: u16 = 0x8100;
pub const ETYPE_MPLS: u16 = 0x8847;
pub const ETYPE_PPPOE_DISC: u16 = 0x8863;
pub const ETYPE_PPPOE_SESS: u16 = 0x8864;
pub const PPP_IPV4: u16 = 0x0021;

pub const IP_TTL: u8 = 64;

fn ip_addrs() -> (IpAddress, IpAddress) {
    (IpAddress::Ipv4(SRC_IP.into()), IpAddress::Ipv4(DST_IP.into()))
}

/// Wrap `payload` in an Ethernet II header.
pub fn ether(
    dst: MacAddr,
    src: MacAddr,
    ether_type: u16,
    payload: &[u8],
) -> Vec<u8> {
    let mut bytes = vec![0u8; ETHER_HDR_LEN + payload.len()];
    let mut frame = EthernetFrame::new_unchecked(&mut bytes[..]);
    frame.set_dst_addr(EthernetAddress::from(dst));
    frame.set_src_addr(EthernetAddress::from(src));
    frame.set_ethertype(EthernetProtocol::from(ether_type));
    frame.payload_mut().copy_from_slice(payload);
    bytes
}

/// Wrap `payload` in an option-less IPv4 header with a valid
/// checksum.
pub fn ipv4(
    src: Ipv4Addr,
    dst: Ipv4Addr,
    proto: IpProtocol,
    payload: &[u8],
) -> Vec<u8> {
    let total = IPV4_HDR_LEN + payload.len();
    let mut bytes = vec![0u8; total];
    let mut ip = Ipv4Packet::new_unchecked(&mut bytes[..]);
    ip.set_version(4);
    ip.set_header_len(IPV4_HDR_LEN as u8);
    ip.set_dscp(0);
    ip.set_ecn(0);
    ip.set_total_len(total as u16);
    ip.set_ident(0x2c1b);
    ip.clear_flags();
    ip.set_dont_frag(true);
    ip.set_frag_offset(0);
    ip.set_hop_limit(IP_TTL);
    ip.set_next_header(proto);
    ip.set_src_addr(src.into());
    ip.set_dst_addr(dst.into());
    ip.payload_mut().copy_from_slice(payload);
    ip.fill_checksum();
    bytes
}

/// A TCP segment from `SRC_IP` to `DST_IP` with a valid checksum.
pub fn tcp_segment(src_port: u16, dst_port: u16, payload: &[u8]) -> Vec<u8> {
    let (src, dst) = ip_addrs();
    let mut bytes = vec![0u8; 20 + payload.len()];
    let mut tcp = TcpPacket::new_unchecked(&mut bytes[..]);
    tcp.set_src_port(src_port);
    tcp.set_dst_port(dst_port);
    tcp.set_seq_number(TcpSeqNumber(0x0bad_f00d));
    tcp.set_ack_number(TcpSeqNumber(0));
    tcp.set_header_len(20);
    tcp.clear_flags();
    tcp.set_syn(true);
    tcp.set_window_len(64240);
    tcp.set_urgent_at(0);
    tcp.payload_mut().copy_from_slice(payload);
    tcp.fill_checksum(&src, &dst);
    bytes
}

/// A UDP datagram from `SRC_IP` to `DST_IP` with a valid checksum.
pub fn udp_datagram(src_port: u16, dst_port: u16, payload: &[u8]) -> Vec<u8> {
    let (src, dst) = ip_addrs();
    let mut bytes = vec![0u8; 8 + payload.len()];
    let mut udp = UdpPacket::new_unchecked(&mut bytes[..]);
    udp.set_src_port(src_port);
    udp.set_dst_port(dst_port);
    udp.set_len(bytes_len_u16(8 + payload.len()));
    udp.payload_mut().copy_from_slice(payload);
    udp.fill_checksum(&src, &dst);
    bytes
}

fn bytes_len_u16(len: usize) -> u16 {
    u16::try_from(len).unwrap()
}

/// Ethernet + IPv4 + TCP.
pub fn tcp4(src_port: u16, dst_port: u16, payload: &[u8]) -> Vec<u8> {
    let seg = tcp_segment(src_port, dst_port, payload);
    let ip = ipv4(SRC_IP, DST_IP, IpProtocol::Tcp, &seg);
    ether(DST_MAC, SRC_MAC, ETYPE_IPV4, &ip)
}

/// Ethernet + IPv4 + UDP.
pub fn udp4(src_port: u16, dst_port: u16, payload: &[u8]) -> Vec<u8> {
    let dgram = udp_datagram(src_port, dst_port, payload);
    let ip = ipv4(SRC_IP, DST_IP, IpProtocol::Udp, &dgram);
    ether(DST_MAC, SRC_MAC, ETYPE_IPV4, &ip)
}

/// Ethernet + IPv4 + ICMP Echo Request.
pub fn icmp4_echo(ident: u16, seq_no: u16, data: &[u8]) -> Vec<u8> {
    let icmp = Icmpv4Repr::EchoRequest { ident, seq_no, data };
    let mut body = vec![0u8; icmp.buffer_len()];
    let mut pkt = Icmpv4Packet::new_unchecked(&mut body);
    icmp.emit(&mut pkt, &ChecksumCapabilities::default());
    let ip = ipv4(SRC_IP, DST_IP, IpProtocol::Icmp, &body);
    ether(DST_MAC, SRC_MAC, ETYPE_IPV4, &ip)
}

/// A broadcast ARP request from `SRC_MAC`/`spa` asking for `tpa`.
pub fn arp_request(spa: Ipv4Addr, tpa: Ipv4Addr) -> Vec<u8> {
    let arp = ArpRepr::EthernetIpv4 {
        operation: ArpOperation::Request,
        source_hardware_addr: SRC_MAC.into(),
        source_protocol_addr: spa.into(),
        target_hardware_addr: EthernetAddress([0; 6]),
        target_protocol_addr: tpa.into(),
    };
    let mut body = vec![0u8; arp.buffer_len()];
    arp.emit(&mut ArpPacket::new_unchecked(&mut body[..]));
    ether(BCAST_MAC, SRC_MAC, ETYPE_ARP, &body)
}

/// Insert `tag` directly after the Ethernet header of `frame`, making
/// `ether_type` the outer EtherType. The tag's own last two bytes are
/// expected to carry the old EtherType where the encapsulation needs
/// one; see [`vlan_tag`].
fn insert_tag(frame: &[u8], ether_type: u16, tag: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(frame.len() + tag.len());
    out.extend_from_slice(&frame[..12]);
    out.extend_from_slice(&ether_type.to_be_bytes());
    out.extend_from_slice(tag);
    out.extend_from_slice(&frame[ETHER_HDR_LEN..]);
    out
}

fn ether_type_of(frame: &[u8]) -> u16 {
    u16::from_be_bytes([frame[12], frame[13]])
}

/// Add an 802.1Q tag to `frame`.
pub fn vlan_tag(frame: &[u8], tpid: u16, vid: u16, pcp: u8) -> Vec<u8> {
    let tci = (u16::from(pcp & 0x7) << 13) | (vid & 0x0fff);
    let mut tag = Vec::with_capacity(TAG_LEN);
    tag.extend_from_slice(&tci.to_be_bytes());
    tag.extend_from_slice(&ether_type_of(frame).to_be_bytes());
    insert_tag(frame, tpid, &tag)
}

/// Add an MPLS label stack entry to `frame`. The inner EtherType is
/// lost, as on the wire.
pub fn mpls_label(
    frame: &[u8],
    label: u32,
    tc: u8,
    bos: bool,
    ttl: u8,
) -> Vec<u8> {
    let lse = ((label & 0xf_ffff) << 12)
        | (u32::from(tc & 0x7) << 9)
        | (u32::from(bos) << 8)
        | u32::from(ttl);
    insert_tag(frame, ETYPE_MPLS, &lse.to_be_bytes())
}

/// Turn an Ethernet/IPv4 frame into a PPPoE session frame carrying
/// the same IPv4 packet over PPP.
pub fn pppoe_session(frame: &[u8], session_id: u16) -> Vec<u8> {
    let ip = &frame[ETHER_HDR_LEN..];
    let mut hdr = Vec::with_capacity(PPPOE_LEN + PPP_LEN);
    hdr.push(0x11);
    hdr.push(0x00);
    hdr.extend_from_slice(&session_id.to_be_bytes());
    hdr.extend_from_slice(&bytes_len_u16(PPP_LEN + ip.len()).to_be_bytes());
    hdr.extend_from_slice(&PPP_IPV4.to_be_bytes());
    insert_tag(frame, ETYPE_PPPOE_SESS, &hdr)
}

/// A PPPoE discovery frame with the given tags, followed by `pad`
/// trailing bytes which are not counted in the PPPoE length.
pub fn pppoe_discovery(
    code: u8,
    session_id: u16,
    tags: &[(u16, &[u8])],
    pad: usize,
) -> Vec<u8> {
    let mut tlvs = Vec::new();
    for (ty, val) in tags {
        tlvs.extend_from_slice(&ty.to_be_bytes());
        tlvs.extend_from_slice(&bytes_len_u16(val.len()).to_be_bytes());
        tlvs.extend_from_slice(val);
    }

    let mut body = vec![0x11, code];
    body.extend_from_slice(&session_id.to_be_bytes());
    body.extend_from_slice(&bytes_len_u16(tlvs.len()).to_be_bytes());
    body.extend_from_slice(&tlvs);
    body.resize(body.len() + pad, 0);
    ether(BCAST_MAC, SRC_MAC, ETYPE_PPPOE_DISC, &body)
}

/// Check the IPv4 header checksum of the packet at `ip_off`, and the
/// checksum of the TCP, UDP, or ICMP message it carries.
///
/// A UDP checksum of zero counts as valid.
pub fn ipv4_csums_ok(frame: &[u8], ip_off: usize) -> bool {
    let Some(bytes) = frame.get(ip_off..) else {
        return false;
    };
    let Ok(ip) = Ipv4Packet::new_checked(bytes) else {
        return false;
    };
    if !ip.verify_checksum() {
        return false;
    }

    let src = IpAddress::Ipv4(ip.src_addr());
    let dst = IpAddress::Ipv4(ip.dst_addr());
    let body = ip.payload();

    match ip.next_header() {
        IpProtocol::Tcp => TcpPacket::new_checked(body)
            .map(|tcp| tcp.verify_checksum(&src, &dst))
            .unwrap_or(false),
        IpProtocol::Udp => UdpPacket::new_checked(body)
            .map(|udp| udp.checksum() == 0 || udp.verify_checksum(&src, &dst))
            .unwrap_or(false),
        IpProtocol::Icmp => Icmpv4Packet::new_checked(body)
            .map(|icmp| icmp.verify_checksum())
            .unwrap_or(false),
        _ => true,
    }
}

/// The TTL of the IPv4 packet at `ip_off`.
pub fn ipv4_ttl(frame: &[u8], ip_off: usize) -> u8 {
    Ipv4Packet::new_unchecked(&frame[ip_off..]).hop_limit()
}

/// The length of an IPv4 frame, not counting any Ethernet padding.
pub fn ipv4_frame_len(frame: &[u8], ip_off: usize) -> usize {
    let ip = Ipv4Packet::new_unchecked(&frame[ip_off..]);
    ip_off + usize::from(ip.total_len())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn builders_produce_valid_frames() {
        let tcp = tcp4(1234, 80, b"hello");
        assert_eq!(tcp.len(), 14 + 20 + 20 + 5);
        assert!(ipv4_csums_ok(&tcp, 14));

        let udp = udp4(5353, 53, &[0u8; 3]);
        assert_eq!(udp.len(), 14 + 20 + 8 + 3);
        assert!(ipv4_csums_ok(&udp, 14));

        let icmp = icmp4_echo(7, 1, b"ping");
        assert!(ipv4_csums_ok(&icmp, 14));
    }

    #[test]
    fn tags_nest_after_ethernet() {
        let base = udp4(1, 2, &[]);
        let tagged = vlan_tag(&base, ETYPE_VLAN, 100, 3);
        assert_eq!(ether_type_of(&tagged), ETYPE_VLAN);
        assert_eq!(&tagged[14..18], &[0x60, 0x64, 0x08, 0x00]);
        assert_eq!(&tagged[18..], &base[14..]);

        let sess = pppoe_session(&base, 0x1234);
        assert_eq!(sess.len(), base.len() + 8);
        assert_eq!(&sess[14..22], &[0x11, 0, 0x12, 0x34, 0, 30, 0, 0x21]);
    }
}
