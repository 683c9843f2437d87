// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Structural and field edits, checked against an independent
//! encoder.

use itertools::Itertools;
use ofpe::api::Action;
use ofpe::api::Oxm;
use ofpe::api::OxmField;
use ofpe::api::PacketCfg;
use ofpe::engine::HeaderKind;
use ofpe::engine::Packet;
use ofpe::engine::PacketError;
use ofpe::engine::PacketFlags;
use ofpe::engine::ether::EtherHdr;
use ofpe::engine::vlan::VlanHdr;
use ofpe::provider::LogLevel;
use ofpe::provider::RecordLog;
use ofpe_test_utils as common;
use std::sync::Arc;

use common::*;

const IN_PORT: u32 = 1;

fn field(pkt: &Packet, f: OxmField) -> Option<Oxm> {
    pkt.match_fields().get(f).cloned()
}

fn ether_type(pkt: &Packet) -> u16 {
    pkt.header::<EtherHdr>(0).unwrap().ether_type()
}

fn with_log(frame: &[u8]) -> (Packet, Arc<RecordLog>) {
    let log = Arc::new(RecordLog::new());
    let pkt = Packet::from_bytes(frame, IN_PORT, true).with_log(log.clone());
    (pkt, log)
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Tag {
    Vlan,
    Mpls,
    /// A PPPoE session header and the PPP header behind it.
    Session,
}

const TAGS: [Tag; 3] = [Tag::Vlan, Tag::Mpls, Tag::Session];

impl Tag {
    fn len(self) -> usize {
        match self {
            Self::Vlan | Self::Mpls => TAG_LEN,
            Self::Session => PPPOE_LEN + PPP_LEN,
        }
    }

    fn push(self, pkt: &mut Packet) -> Result<(), PacketError> {
        match self {
            Self::Vlan => pkt.push_vlan(ETYPE_VLAN),
            Self::Mpls => pkt.push_mpls(ETYPE_MPLS),
            Self::Session => {
                pkt.push_pppoe(ETYPE_PPPOE_SESS)?;
                pkt.push_ppp(PPP_IPV4)
            }
        }
    }

    // The ethertype is only used by the tags which do not carry the
    // inner one themselves.
    fn pop(self, pkt: &mut Packet, ether_type: u16) {
        match self {
            Self::Vlan => pkt.pop_vlan(),
            Self::Mpls => pkt.pop_mpls(ether_type),
            Self::Session => pkt.pop_pppoe(ether_type),
        }
        .unwrap();
    }
}

// ================================================================
// Push and pop
// ================================================================

#[test]
fn push_vlan_on_tcp() {
    let frame = tcp4(1234, 80, &[]);
    let mut pkt = Packet::from_bytes(&frame, IN_PORT, true);
    pkt.push_vlan(ETYPE_VLAN).unwrap();

    assert_eq!(
        pkt.chain().kinds(),
        vec![
            HeaderKind::Ether,
            HeaderKind::Vlan,
            HeaderKind::Ipv4,
            HeaderKind::Tcp
        ]
    );
    assert_eq!(ether_type(&pkt), ETYPE_VLAN);
    let vlan = pkt.header::<VlanHdr>(0).unwrap();
    assert_eq!(vlan.inner_type(), ETYPE_IPV4);
    assert_eq!(vlan.vid(), 0);
    assert_eq!(vlan.pcp(), 0);

    assert_eq!(field(&pkt, OxmField::EthType), Some(Oxm::EthType(0x8100)));
    assert_eq!(field(&pkt, OxmField::VlanVid), Some(Oxm::VlanVid(0)));
    assert_eq!(field(&pkt, OxmField::VlanPcp), Some(Oxm::VlanPcp(0)));
    assert_eq!(field(&pkt, OxmField::TcpDst), Some(Oxm::TcpDst(80)));

    // The result is exactly what the encoder builds for a tagged
    // frame, and classifies the same.
    let expected = vlan_tag(&frame, ETYPE_VLAN, 0, 0);
    assert_eq!(pkt.frame_bytes(), &expected[..]);
    let fresh = Packet::from_bytes(&expected, IN_PORT, true);
    assert_eq!(fresh.layout(), pkt.layout());
    assert_eq!(fresh.match_fields(), pkt.match_fields());
    assert!(ipv4_csums_ok(pkt.frame_bytes(), ETHER_HDR_LEN + TAG_LEN));
}

#[test]
fn push_vlan_copies_outer_tag() {
    let frame = vlan_tag(&udp4(1, 2, &[]), ETYPE_VLAN, 42, 5);
    let mut pkt = Packet::from_bytes(&frame, IN_PORT, true);
    pkt.push_vlan(0x88a8).unwrap();

    let outer = pkt.header::<VlanHdr>(0).unwrap();
    assert_eq!((outer.vid(), outer.pcp()), (42, 5));
    assert_eq!(outer.inner_type(), ETYPE_VLAN);
    assert_eq!(ether_type(&pkt), 0x88a8);
    assert_eq!(
        pkt.frame_bytes(),
        &vlan_tag(&frame, 0x88a8, 42, 5)[..]
    );
}

#[test]
fn push_mpls_takes_ip_ttl() {
    let frame = udp4(1, 2, &[]);
    let mut pkt = Packet::from_bytes(&frame, IN_PORT, true);
    pkt.push_mpls(ETYPE_MPLS).unwrap();

    assert_eq!(
        pkt.frame_bytes(),
        &mpls_label(&frame, 0, 0, true, IP_TTL)[..]
    );
    assert_eq!(field(&pkt, OxmField::MplsLabel), Some(Oxm::MplsLabel(0)));
    assert!(pkt.flags().contains(PacketFlags::MPLS_PRESENT));

    // A second label copies the first and is not the bottom.
    pkt.set_field(&Oxm::MplsLabel(100)).unwrap();
    pkt.push_mpls(ETYPE_MPLS).unwrap();
    let mut labelled = mpls_label(&frame, 100, 0, true, IP_TTL);
    labelled = mpls_label(&labelled, 100, 0, false, IP_TTL);
    assert_eq!(pkt.frame_bytes(), &labelled[..]);
}

#[test]
fn pop_mpls_decodes_payload() {
    let frame = mpls_label(&udp4(5353, 53, &[]), 16, 0, true, 64);
    let mut pkt = Packet::from_bytes(&frame, IN_PORT, true);
    assert_eq!(
        pkt.chain().kinds(),
        vec![HeaderKind::Ether, HeaderKind::Mpls, HeaderKind::Opaque]
    );

    pkt.pop_mpls(ETYPE_IPV4).unwrap();
    assert_eq!(pkt.frame_bytes(), &udp4(5353, 53, &[])[..]);
    assert_eq!(
        pkt.chain().kinds(),
        vec![HeaderKind::Ether, HeaderKind::Ipv4, HeaderKind::Udp]
    );
    assert_eq!(field(&pkt, OxmField::UdpDst), Some(Oxm::UdpDst(53)));
    assert_eq!(field(&pkt, OxmField::MplsLabel), None);
    assert!(!pkt.flags().contains(PacketFlags::MPLS_PRESENT));
}

#[test]
fn pppoe_session_from_ipv4() {
    let frame = tcp4(1234, 80, &[]);
    let mut pkt = Packet::from_bytes(&frame, IN_PORT, true);
    pkt.push_pppoe(ETYPE_PPPOE_SESS).unwrap();
    pkt.push_ppp(PPP_IPV4).unwrap();

    // The PPPoE length is fixed up once PPP goes in.
    assert_eq!(pkt.frame_bytes(), &pppoe_session(&frame, 0)[..]);
    assert_eq!(
        pkt.chain().kinds(),
        vec![
            HeaderKind::Ether,
            HeaderKind::Pppoe,
            HeaderKind::Ppp,
            HeaderKind::Ipv4,
            HeaderKind::Tcp
        ]
    );
    assert_eq!(field(&pkt, OxmField::PppProt), Some(Oxm::PppProt(0x0021)));
    assert_eq!(field(&pkt, OxmField::PppoeSid), Some(Oxm::PppoeSid(0)));

    pkt.pop_ppp().unwrap();
    pkt.pop_pppoe(ETYPE_IPV4).unwrap();
    assert_eq!(pkt.frame_bytes(), &frame[..]);
    assert_eq!(field(&pkt, OxmField::PppoeCode), None);
}

#[test]
fn pop_pppoe_takes_ppp_along() {
    let frame = udp4(5353, 53, b"hi");
    let wire = pppoe_session(&frame, 7);
    let mut pkt = Packet::from_bytes(&wire, IN_PORT, true);
    assert_eq!(
        pkt.chain().kinds(),
        vec![
            HeaderKind::Ether,
            HeaderKind::Pppoe,
            HeaderKind::Ppp,
            HeaderKind::Ipv4,
            HeaderKind::Udp,
            HeaderKind::Opaque
        ]
    );

    pkt.pop_pppoe(ETYPE_IPV4).unwrap();

    let fresh = Packet::from_bytes(&frame, IN_PORT, true);
    assert_eq!(pkt.frame_bytes(), &frame[..]);
    assert_eq!(pkt.layout(), fresh.layout());
    assert_eq!(pkt.match_fields(), fresh.match_fields());
    assert_eq!(field(&pkt, OxmField::PppProt), None);
    assert_eq!(field(&pkt, OxmField::PppoeSid), None);
    assert!(pkt.check_chain().is_ok());
}

#[test]
fn pppoe_len_ignores_ethernet_padding() {
    let frame = udp4(1, 2, &[]);
    let mut padded = frame.clone();
    padded.resize(frame.len() + 10, 0);
    let mut pkt = Packet::from_bytes(&padded, IN_PORT, true);

    pkt.push_pppoe(ETYPE_PPPOE_SESS).unwrap();
    pkt.push_ppp(PPP_IPV4).unwrap();

    let mut expected = pppoe_session(&frame, 0);
    expected.resize(expected.len() + 10, 0);
    assert_eq!(pkt.frame_bytes(), &expected[..]);
}

// Pushing any sequence of tags and popping them in reverse gives back
// the original frame and match set.
#[test]
fn push_pop_inverse() {
    let frame = tcp4(1234, 80, b"abc");
    let orig = Packet::from_bytes(&frame, IN_PORT, true);

    for k in 1..=TAGS.len() {
        for order in TAGS.iter().copied().permutations(k) {
            let mut pkt = orig.clone();
            let mut saved = Vec::with_capacity(order.len());

            for tag in &order {
                saved.push(ether_type(&pkt));
                tag.push(&mut pkt).unwrap();
                assert!(pkt.check_chain().is_ok(), "{order:?}");
            }

            let pushed: usize = order.iter().map(|t| t.len()).sum();
            assert_eq!(pkt.len(), frame.len() + pushed, "{order:?}");

            for (tag, et) in order.iter().zip(saved).rev() {
                tag.pop(&mut pkt, et);
            }

            assert_eq!(pkt.frame_bytes(), &frame[..], "{order:?}");
            assert_eq!(pkt.layout(), orig.layout(), "{order:?}");
            assert_eq!(pkt.match_fields(), orig.match_fields(), "{order:?}");
            assert_eq!(
                pkt.flags() & PacketFlags::PRESENT,
                PacketFlags::empty(),
                "{order:?}"
            );
        }
    }
}

#[test]
fn pop_absent_tag_is_noop() {
    let frame = udp4(1, 2, &[]);
    let (mut pkt, log) = with_log(&frame);

    pkt.pop_vlan().unwrap();
    pkt.pop_vlan().unwrap();
    pkt.pop_mpls(ETYPE_IPV4).unwrap();
    pkt.pop_pppoe(ETYPE_IPV4).unwrap();
    pkt.pop_ppp().unwrap();

    assert_eq!(pkt.frame_bytes(), &frame[..]);
    assert_eq!(log.count(LogLevel::Note, "pop_vlan: no VLAN header"), 2);
    assert_eq!(log.count(LogLevel::Note, "no MPLS header"), 1);
    assert_eq!(log.count(LogLevel::Warn, ""), 0);
}

#[test]
fn pop_only_touches_outer_tag() {
    // VLAN behind MPLS is not the outer tag.
    let inner = vlan_tag(&udp4(1, 2, &[]), ETYPE_VLAN, 7, 0);
    let mut pkt = Packet::from_bytes(&inner, IN_PORT, true);
    pkt.push_mpls(ETYPE_MPLS).unwrap();
    let before = pkt.frame_bytes().to_vec();

    let log = Arc::new(RecordLog::new());
    pkt.set_log(log.clone());
    pkt.pop_vlan().unwrap();

    assert_eq!(pkt.frame_bytes(), &before[..]);
    assert_eq!(log.count(LogLevel::Note, "is not the outer tag"), 1);
}

#[test]
fn push_rejects_wrong_ethertype() {
    let frame = udp4(1, 2, &[]);
    let mut pkt = Packet::from_bytes(&frame, IN_PORT, true);

    assert!(matches!(pkt.push_vlan(0x0800), Err(PacketError::Invalid(_))));
    assert!(matches!(pkt.push_mpls(0x8100), Err(PacketError::Invalid(_))));
    assert!(matches!(pkt.push_pppoe(0x8847), Err(PacketError::Invalid(_))));
    assert_eq!(pkt.frame_bytes(), &frame[..]);
}

// ================================================================
// Head-room
// ================================================================

#[test]
fn head_room_is_never_exceeded() {
    let frame = udp4(1, 2, &[]);

    for head_room in 0..=24 {
        let cfg = PacketCfg { head_room };
        let mut pkt = Packet::with_cfg(&cfg, &frame, IN_PORT, true);

        for n in 0.. {
            let before = pkt.frame_bytes().to_vec();
            match pkt.push_vlan(ETYPE_VLAN) {
                Ok(()) => assert!((n + 1) * TAG_LEN <= head_room),
                Err(e) => {
                    assert!(
                        matches!(e, PacketError::OutOfRange { .. }),
                        "{e:?}"
                    );
                    assert_eq!(n, head_room / TAG_LEN);
                    assert_eq!(pkt.frame_bytes(), &before[..]);
                    assert!(pkt.check_chain().is_ok());
                    break;
                }
            }
        }

        assert!(pkt.head_capacity() < TAG_LEN);
    }
}

#[test]
fn tag_insert_and_remove() {
    let frame = udp4(1, 2, &[]);
    let mut pkt = Packet::from_bytes(&frame, IN_PORT, true);

    assert_eq!(pkt.tag_insert(8).unwrap(), ETHER_HDR_LEN);
    assert_eq!(pkt.len(), frame.len() + 8);
    assert_eq!(&pkt.frame_bytes()[14..22], &[0u8; 8]);
    assert_eq!(pkt.chain().get(1).map(|v| v.kind), Some(HeaderKind::Opaque));

    pkt.tag_remove(1).unwrap();
    assert_eq!(pkt.frame_bytes(), &frame[..]);
    assert!(pkt.tag_remove(0).is_err());

    let cfg = PacketCfg { head_room: 2 };
    let mut short = Packet::with_cfg(&cfg, &frame, IN_PORT, true);
    assert!(matches!(
        short.tag_insert(4),
        Err(PacketError::OutOfRange { .. })
    ));
}

// ================================================================
// TTL and checksums
// ================================================================

#[test]
fn nw_ttl_keeps_checksums_valid() {
    for (frame, ip_off) in [
        (tcp4(1234, 80, b"xyz"), ETHER_HDR_LEN),
        (udp4(1, 2, &[9; 9]), ETHER_HDR_LEN),
        (icmp4_echo(1, 1, &[]), ETHER_HDR_LEN),
        (
            vlan_tag(&tcp4(1, 2, &[]), ETYPE_VLAN, 1, 1),
            ETHER_HDR_LEN + TAG_LEN,
        ),
        (
            pppoe_session(&udp4(1, 2, &[]), 9),
            ETHER_HDR_LEN + PPPOE_LEN + PPP_LEN,
        ),
    ] {
        let mut pkt = Packet::from_bytes(&frame, IN_PORT, true);

        pkt.dec_nw_ttl().unwrap();
        assert_eq!(ipv4_ttl(pkt.frame_bytes(), ip_off), IP_TTL - 1);
        assert!(ipv4_csums_ok(pkt.frame_bytes(), ip_off));

        pkt.set_nw_ttl(1).unwrap();
        assert!(ipv4_csums_ok(pkt.frame_bytes(), ip_off));
        pkt.dec_nw_ttl().unwrap();
        assert_eq!(ipv4_ttl(pkt.frame_bytes(), ip_off), 0);

        let before = pkt.frame_bytes().to_vec();
        assert!(matches!(pkt.dec_nw_ttl(), Err(PacketError::Invalid(_))));
        assert_eq!(pkt.frame_bytes(), &before[..]);
        assert!(pkt.verify_checksums());
    }
}

#[test]
fn set_field_keeps_checksums_valid() {
    let new_ip = Ipv4Addr::from_const([192, 168, 1, 1]);

    let cases: Vec<(Vec<u8>, Vec<Oxm>)> = vec![
        (
            tcp4(1234, 80, b"hello"),
            vec![
                Oxm::TcpSrc(40000),
                Oxm::TcpDst(8080),
                Oxm::Ipv4Src(new_ip),
                Oxm::IpDscp(46),
                Oxm::IpEcn(1),
            ],
        ),
        (
            udp4(5353, 53, b"query"),
            vec![Oxm::UdpSrc(1000), Oxm::Ipv4Dst(new_ip), Oxm::UdpDst(5353)],
        ),
        (
            icmp4_echo(3, 4, b"ping"),
            vec![Oxm::Icmpv4Type(0), Oxm::Icmpv4Code(0), Oxm::Ipv4Src(new_ip)],
        ),
    ];

    for (frame, oxms) in cases {
        let mut pkt = Packet::from_bytes(&frame, IN_PORT, true);
        for oxm in &oxms {
            pkt.set_field(oxm).unwrap();
            assert!(ipv4_csums_ok(pkt.frame_bytes(), ETHER_HDR_LEN), "{oxm}");
            assert!(pkt.verify_checksums(), "{oxm}");
            assert_eq!(
                pkt.match_fields().get_id(oxm.id()),
                Some(oxm),
                "{oxm}"
            );
        }

        // The incremental match set agrees with a fresh look.
        let fresh = Packet::from_bytes(pkt.frame_bytes(), IN_PORT, true);
        assert_eq!(fresh.match_fields(), pkt.match_fields());
    }
}

#[test]
fn zero_udp_checksum_stays_zero() {
    let mut frame = udp4(1, 2, b"abcd");
    let csum_off = ETHER_HDR_LEN + IPV4_HDR_LEN + 6;
    frame[csum_off] = 0;
    frame[csum_off + 1] = 0;

    let mut pkt = Packet::from_bytes(&frame, IN_PORT, true);
    pkt.set_field(&Oxm::UdpDst(9999)).unwrap();
    pkt.dec_nw_ttl().unwrap();

    assert_eq!(&pkt.frame_bytes()[csum_off..csum_off + 2], &[0, 0]);
    assert!(ipv4_csums_ok(pkt.frame_bytes(), ETHER_HDR_LEN));
}

#[test]
fn mpls_ttl() {
    let frame = mpls_label(&udp4(1, 2, &[]), 16, 0, true, 1);
    let (mut pkt, log) = with_log(&frame);

    pkt.dec_mpls_ttl().unwrap();
    assert!(matches!(pkt.dec_mpls_ttl(), Err(PacketError::Invalid(_))));
    assert_eq!(log.count(LogLevel::Warn, "TTL is already 0"), 1);

    pkt.set_mpls_ttl(200).unwrap();
    assert_eq!(
        pkt.frame_bytes(),
        &mpls_label(&udp4(1, 2, &[]), 16, 0, true, 200)[..]
    );

    let mut plain = Packet::from_bytes(udp4(1, 2, &[]), IN_PORT, true);
    assert!(matches!(
        plain.dec_mpls_ttl(),
        Err(PacketError::NotFound(HeaderKind::Mpls))
    ));
}

// ================================================================
// Action lists
// ================================================================

#[test]
fn apply_action_list() {
    let frame = tcp4(1234, 80, &[]);
    let (mut pkt, log) = with_log(&frame);

    let actions = [
        Action::PushVlan(ETYPE_VLAN),
        Action::SetField(Oxm::VlanVid(300)),
        Action::SetField(Oxm::VlanPcp(3)),
        Action::DecNwTtl,
        Action::SetField(Oxm::TcpDst(443)),
        Action::SetField(Oxm::TunnelId(5)),
        Action::Output { port: 2, max_len: 0 },
    ];
    for a in &actions {
        pkt.apply_action(a).unwrap();
    }

    let mut expected = Packet::from_bytes(tcp4(1234, 443, &[]), IN_PORT, true);
    expected.dec_nw_ttl().unwrap();
    let expected = vlan_tag(expected.frame_bytes(), ETYPE_VLAN, 300, 3);

    assert_eq!(pkt.frame_bytes(), &expected[..]);
    assert!(ipv4_csums_ok(pkt.frame_bytes(), ETHER_HDR_LEN + TAG_LEN));
    assert_eq!(log.count(LogLevel::Warn, "is not supported"), 1);
    assert_eq!(log.count(LogLevel::Warn, "not handled by packet engine"), 1);
}

#[test]
fn set_eth_type_reclassifies() {
    let frame = udp4(1, 2, &[]);
    let mut pkt = Packet::from_bytes(&frame, IN_PORT, true);

    pkt.set_field(&Oxm::EthType(0x88b5)).unwrap();
    assert_eq!(
        pkt.chain().kinds(),
        vec![HeaderKind::Ether, HeaderKind::Opaque]
    );
    assert_eq!(field(&pkt, OxmField::IpProto), None);

    pkt.set_field(&Oxm::EthType(ETYPE_IPV4)).unwrap();
    assert_eq!(pkt.frame_bytes(), &frame[..]);
    assert_eq!(
        pkt.match_fields(),
        Packet::from_bytes(&frame, IN_PORT, true).match_fields()
    );
}

// A fragment has no transport header, whatever the protocol says.
#[test]
fn set_proto_on_fragment_keeps_payload_opaque() {
    let mut frame = udp4(5353, 53, b"data");
    // MF set, offset 0
    frame[ETHER_HDR_LEN + 6] = 0x20;
    let ulp_off = ETHER_HDR_LEN + IPV4_HDR_LEN;
    let tail = frame[ulp_off..].to_vec();

    let mut pkt = Packet::from_bytes(&frame, IN_PORT, true);
    let kinds = vec![HeaderKind::Ether, HeaderKind::Ipv4, HeaderKind::Opaque];
    assert_eq!(pkt.chain().kinds(), kinds);

    for proto in [17, 6, 1] {
        pkt.set_field(&Oxm::IpProto(proto)).unwrap();
        assert_eq!(pkt.chain().kinds(), kinds, "proto {proto}");
        assert_eq!(&pkt.frame_bytes()[ulp_off..], &tail[..], "proto {proto}");
        assert_eq!(field(&pkt, OxmField::IpProto), Some(Oxm::IpProto(proto)));
        assert_eq!(field(&pkt, OxmField::UdpSrc), None);
        assert_eq!(field(&pkt, OxmField::TcpSrc), None);

        let fresh = Packet::from_bytes(pkt.frame_bytes(), IN_PORT, true);
        assert_eq!(fresh.layout(), pkt.layout());
        assert_eq!(fresh.match_fields(), pkt.match_fields());
    }
}
