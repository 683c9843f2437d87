// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Print packets in a human-friendly manner.
//!
//! This is mostly just a place to hang printing routines so that they
//! can be used by both ofpeadm and integration tests.

use crate::engine::HeaderKind;
use crate::engine::HeaderType;
use crate::engine::Packet;
use crate::engine::arp::ArpHdr;
use crate::engine::ether::EtherHdr;
use crate::engine::icmp::IcmpHdr;
use crate::engine::ip4::Ipv4Hdr;
use crate::engine::mpls::MplsHdr;
use crate::engine::ppp::PppHdr;
use crate::engine::pppoe::PppoeHdr;
use crate::engine::tcp::TcpHdr;
use crate::engine::udp::UdpHdr;
use crate::engine::vlan::VlanHdr;
use std::io::Write;
use tabwriter::TabWriter;

/// Print a [`Packet`].
pub fn print_packet(pkt: &Packet) -> std::io::Result<()> {
    print_packet_into(&mut std::io::stdout(), pkt)
}

/// Print a [`Packet`] into a given writer: its headers, its match
/// fields, and a dump of the frame.
pub fn print_packet_into(
    writer: &mut impl Write,
    pkt: &Packet,
) -> std::io::Result<()> {
    let mut t = TabWriter::new(writer);

    writeln!(t, "Packet: {} bytes, in_port {}", pkt.len(), pkt.in_port())?;
    write_hrb(&mut t)?;
    writeln!(t, "Headers")?;
    write_hr(&mut t)?;
    writeln!(t, "IDX\tKIND\tOFFSET\tLEN\tSUMMARY")?;
    for (idx, (kind, range)) in pkt.layout().into_iter().enumerate() {
        let bytes = pkt.header_bytes(idx).unwrap_or(&[]);
        writeln!(
            t,
            "{idx}\t{kind}\t{}\t{}\t{}",
            range.start,
            range.len(),
            summary(kind, bytes),
        )?;
    }
    t.flush()?;

    writeln!(t, "\nMatch Fields")?;
    write_hr(&mut t)?;
    writeln!(t, "FIELD\tVALUE")?;
    for oxm in pkt.match_fields() {
        let s = oxm.to_string();
        match s.split_once('=') {
            Some((field, val)) => writeln!(t, "{field}\t{val}")?,
            None => writeln!(t, "{s}\t")?,
        }
    }
    t.flush()?;

    writeln!(t, "\nFrame")?;
    write_hr(&mut t)?;
    write_hex_dump(&mut t, pkt.frame_bytes())?;
    writeln!(t)?;
    t.flush()
}

fn summary(kind: HeaderKind, bytes: &[u8]) -> String {
    fn read<H: HeaderType>(bytes: &[u8]) -> Option<&H> {
        H::ref_from_prefix(bytes).ok().map(|(h, _)| h)
    }

    let s = match kind {
        HeaderKind::Ether => read::<EtherHdr>(bytes).map(|e| {
            format!("{} -> {} type {:#06x}", e.src(), e.dst(), e.ether_type())
        }),
        HeaderKind::Vlan => read::<VlanHdr>(bytes).map(|v| {
            format!(
                "vid {} pcp {} inner {:#06x}",
                v.vid(),
                v.pcp(),
                v.inner_type()
            )
        }),
        HeaderKind::Mpls => read::<MplsHdr>(bytes).map(|m| {
            format!(
                "label {} tc {} ttl {}{}",
                m.label(),
                m.tc(),
                m.ttl(),
                if m.bos() { " bos" } else { "" }
            )
        }),
        HeaderKind::Pppoe => read::<PppoeHdr>(bytes).map(|p| {
            format!(
                "code {:#04x} sid {} len {}",
                p.code(),
                p.session_id(),
                p.length()
            )
        }),
        HeaderKind::Ppp => {
            read::<PppHdr>(bytes)
                .map(|p| format!("proto {:#06x}", p.protocol()))
        }
        HeaderKind::Arp => read::<ArpHdr>(bytes).map(|a| {
            format!("op {} {} ({}) -> {}", a.op(), a.spa(), a.sha(), a.tpa())
        }),
        HeaderKind::Ipv4 => read::<Ipv4Hdr>(bytes).map(|ip| {
            format!(
                "{} -> {} proto {} ttl {}",
                ip.src(),
                ip.dst(),
                ip.proto(),
                ip.ttl()
            )
        }),
        HeaderKind::Icmp => read::<IcmpHdr>(bytes)
            .map(|i| format!("type {} code {}", i.msg_type(), i.code())),
        HeaderKind::Udp => read::<UdpHdr>(bytes)
            .map(|u| format!("{} -> {}", u.src_port(), u.dst_port())),
        HeaderKind::Tcp => read::<TcpHdr>(bytes).map(|tcp| {
            format!(
                "{} -> {} flags {:#04x}",
                tcp.src_port(),
                tcp.dst_port(),
                tcp.flags()
            )
        }),
        HeaderKind::Opaque => None,
    };

    s.unwrap_or_default()
}

fn write_hex_dump(t: &mut impl Write, bytes: &[u8]) -> std::io::Result<()> {
    for (i, line) in bytes.chunks(16).enumerate() {
        write!(t, "{:04x}\t", i * 16)?;
        for b in line {
            write!(t, "{b:02x} ")?;
        }
        writeln!(t)?;
    }
    Ok(())
}

/// Print a horizontal rule in bold.
pub fn write_hrb(t: &mut impl Write) -> std::io::Result<()> {
    writeln!(t, "{:=<70}", "=")
}

/// Print a horizontal rule.
pub fn write_hr(t: &mut impl Write) -> std::io::Result<()> {
    writeln!(t, "{:-<70}", "-")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn prints_every_section() {
        let mut frame = vec![0xFF; 6];
        frame.extend_from_slice(&[0x02, 0, 0, 0, 0, 1, 0x08, 0x06]);
        frame.extend_from_slice(&[
            0, 1, 8, 0, 6, 4, 0, 1, 2, 0, 0, 0, 0, 1, 10, 0, 0, 1, 0, 0, 0,
            0, 0, 0, 10, 0, 0, 2,
        ]);
        let pkt = Packet::from_bytes(frame, 4, true);

        let mut out = Vec::new();
        print_packet_into(&mut out, &pkt).unwrap();
        let out = String::from_utf8(out).unwrap();

        assert!(out.contains("Packet: 42 bytes, in_port 4"));
        assert!(out.contains("ARPv4"));
        assert!(out.contains("op 1 10.0.0.1 (02:00:00:00:00:01) -> 10.0.0.2"));
        assert!(out.contains("ARP_TPA"));
        assert!(out.contains("0000"));
    }
}
