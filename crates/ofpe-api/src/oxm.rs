// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! OpenFlow Extensible Match (OXM) fields.
//!
//! An OXM is a (class, field) identified value. Values of the
//! `OPENFLOW_BASIC` class are carried as typed [`Oxm`] variants so the
//! engine never has to reinterpret raw bytes; values of any other
//! class are carried verbatim in [`Oxm::Other`].
//!
//! On the wire every OXM is a TLV:
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-------------------------------+-------------+-+---------------+
//! |           oxm_class           |  oxm_field  |M|  oxm_length   |
//! +-------------------------------+-------------+-+---------------+
//! |                   value (and mask if M) ...                   |
//! +---------------------------------------------------------------+
//! ```

use crate::ip::Ipv4Addr;
use crate::mac::MacAddr;
use alloc::vec::Vec;
use core::fmt;
use core::fmt::Display;
use serde::Deserialize;
use serde::Serialize;

/// The OXM class of the standard OpenFlow match fields.
pub const OFPXMC_OPENFLOW_BASIC: u16 = 0x8000;

/// The OXM class reserved for experimenter fields.
pub const OFPXMC_EXPERIMENTER: u16 = 0xFFFF;

/// The size of the OXM TLV header.
pub const OXM_HDR_SZ: usize = 4;

/// The largest value (or value plus mask) an OXM TLV can carry.
pub const OXM_MAX_LEN: usize = 255;

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum OxmError {
    #[error("truncated OXM: needed {needed} bytes, {available} available")]
    Truncated { needed: usize, available: usize },

    #[error("bad length for {field}: expected {expected}, got {actual}")]
    BadLength { field: OxmField, expected: usize, actual: usize },
}

/// The fields of the `OPENFLOW_BASIC` class.
///
/// Fields 0-39 are the OpenFlow 1.3 assignments. Fields 41-44 are the
/// PPPoE/PPP extension fields.
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[repr(u8)]
pub enum OxmField {
    InPort = 0,
    InPhyPort = 1,
    Metadata = 2,
    EthDst = 3,
    EthSrc = 4,
    EthType = 5,
    VlanVid = 6,
    VlanPcp = 7,
    IpDscp = 8,
    IpEcn = 9,
    IpProto = 10,
    Ipv4Src = 11,
    Ipv4Dst = 12,
    TcpSrc = 13,
    TcpDst = 14,
    UdpSrc = 15,
    UdpDst = 16,
    SctpSrc = 17,
    SctpDst = 18,
    Icmpv4Type = 19,
    Icmpv4Code = 20,
    ArpOp = 21,
    ArpSpa = 22,
    ArpTpa = 23,
    ArpSha = 24,
    ArpTha = 25,
    Ipv6Src = 26,
    Ipv6Dst = 27,
    Ipv6Flabel = 28,
    Icmpv6Type = 29,
    Icmpv6Code = 30,
    Ipv6NdTarget = 31,
    Ipv6NdSll = 32,
    Ipv6NdTll = 33,
    MplsLabel = 34,
    MplsTc = 35,
    MplsBos = 36,
    PbbIsid = 37,
    TunnelId = 38,
    Ipv6Exthdr = 39,
    PppoeCode = 41,
    PppoeType = 42,
    PppoeSid = 43,
    PppProt = 44,
}

impl OxmField {
    pub fn from_u8(val: u8) -> Option<Self> {
        use OxmField::*;

        let field = match val {
            0 => InPort,
            1 => InPhyPort,
            2 => Metadata,
            3 => EthDst,
            4 => EthSrc,
            5 => EthType,
            6 => VlanVid,
            7 => VlanPcp,
            8 => IpDscp,
            9 => IpEcn,
            10 => IpProto,
            11 => Ipv4Src,
            12 => Ipv4Dst,
            13 => TcpSrc,
            14 => TcpDst,
            15 => UdpSrc,
            16 => UdpDst,
            17 => SctpSrc,
            18 => SctpDst,
            19 => Icmpv4Type,
            20 => Icmpv4Code,
            21 => ArpOp,
            22 => ArpSpa,
            23 => ArpTpa,
            24 => ArpSha,
            25 => ArpTha,
            26 => Ipv6Src,
            27 => Ipv6Dst,
            28 => Ipv6Flabel,
            29 => Icmpv6Type,
            30 => Icmpv6Code,
            31 => Ipv6NdTarget,
            32 => Ipv6NdSll,
            33 => Ipv6NdTll,
            34 => MplsLabel,
            35 => MplsTc,
            36 => MplsBos,
            37 => PbbIsid,
            38 => TunnelId,
            39 => Ipv6Exthdr,
            41 => PppoeCode,
            42 => PppoeType,
            43 => PppoeSid,
            44 => PppProt,
            _ => return None,
        };

        Some(field)
    }

    /// The size of the field's value on the wire.
    pub const fn width(self) -> usize {
        use OxmField::*;

        match self {
            VlanPcp | IpDscp | IpEcn | IpProto | Icmpv4Type | Icmpv4Code
            | Icmpv6Type | Icmpv6Code | MplsTc | MplsBos | PppoeCode
            | PppoeType => 1,

            EthType | VlanVid | TcpSrc | TcpDst | UdpSrc | UdpDst
            | SctpSrc | SctpDst | ArpOp | Ipv6Exthdr | PppoeSid | PppProt => 2,

            PbbIsid => 3,

            InPort | InPhyPort | Ipv4Src | Ipv4Dst | ArpSpa | ArpTpa
            | Ipv6Flabel | MplsLabel => 4,

            EthDst | EthSrc | ArpSha | ArpTha | Ipv6NdSll | Ipv6NdTll => 6,

            Metadata | TunnelId => 8,

            Ipv6Src | Ipv6Dst | Ipv6NdTarget => 16,
        }
    }

    pub const fn name(self) -> &'static str {
        use OxmField::*;

        match self {
            InPort => "IN_PORT",
            InPhyPort => "IN_PHY_PORT",
            Metadata => "METADATA",
            EthDst => "ETH_DST",
            EthSrc => "ETH_SRC",
            EthType => "ETH_TYPE",
            VlanVid => "VLAN_VID",
            VlanPcp => "VLAN_PCP",
            IpDscp => "IP_DSCP",
            IpEcn => "IP_ECN",
            IpProto => "IP_PROTO",
            Ipv4Src => "IPV4_SRC",
            Ipv4Dst => "IPV4_DST",
            TcpSrc => "TCP_SRC",
            TcpDst => "TCP_DST",
            UdpSrc => "UDP_SRC",
            UdpDst => "UDP_DST",
            SctpSrc => "SCTP_SRC",
            SctpDst => "SCTP_DST",
            Icmpv4Type => "ICMPV4_TYPE",
            Icmpv4Code => "ICMPV4_CODE",
            ArpOp => "ARP_OP",
            ArpSpa => "ARP_SPA",
            ArpTpa => "ARP_TPA",
            ArpSha => "ARP_SHA",
            ArpTha => "ARP_THA",
            Ipv6Src => "IPV6_SRC",
            Ipv6Dst => "IPV6_DST",
            Ipv6Flabel => "IPV6_FLABEL",
            Icmpv6Type => "ICMPV6_TYPE",
            Icmpv6Code => "ICMPV6_CODE",
            Ipv6NdTarget => "IPV6_ND_TARGET",
            Ipv6NdSll => "IPV6_ND_SLL",
            Ipv6NdTll => "IPV6_ND_TLL",
            MplsLabel => "MPLS_LABEL",
            MplsTc => "MPLS_TC",
            MplsBos => "MPLS_BOS",
            PbbIsid => "PBB_ISID",
            TunnelId => "TUNNEL_ID",
            Ipv6Exthdr => "IPV6_EXTHDR",
            PppoeCode => "PPPOE_CODE",
            PppoeType => "PPPOE_TYPE",
            PppoeSid => "PPPOE_SID",
            PppProt => "PPP_PROT",
        }
    }
}

impl Display for OxmField {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The identity of an OXM: its class and field number.
///
/// A match set holds at most one value per identity.
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
pub struct OxmId {
    pub class: u16,
    pub field: u8,
}

impl OxmId {
    pub const fn basic(field: OxmField) -> Self {
        Self { class: OFPXMC_OPENFLOW_BASIC, field: field as u8 }
    }
}

impl From<OxmField> for OxmId {
    fn from(field: OxmField) -> Self {
        Self::basic(field)
    }
}

/// A typed OXM value.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Oxm {
    InPort(u32),
    InPhyPort(u32),
    Metadata(u64),
    EthDst(MacAddr),
    EthSrc(MacAddr),
    EthType(u16),
    VlanVid(u16),
    VlanPcp(u8),
    IpDscp(u8),
    IpEcn(u8),
    IpProto(u8),
    Ipv4Src(Ipv4Addr),
    Ipv4Dst(Ipv4Addr),
    TcpSrc(u16),
    TcpDst(u16),
    UdpSrc(u16),
    UdpDst(u16),
    SctpSrc(u16),
    SctpDst(u16),
    Icmpv4Type(u8),
    Icmpv4Code(u8),
    ArpOp(u16),
    ArpSpa(Ipv4Addr),
    ArpTpa(Ipv4Addr),
    ArpSha(MacAddr),
    ArpTha(MacAddr),
    Ipv6Src([u8; 16]),
    Ipv6Dst([u8; 16]),
    Ipv6Flabel(u32),
    Icmpv6Type(u8),
    Icmpv6Code(u8),
    Ipv6NdTarget([u8; 16]),
    Ipv6NdSll(MacAddr),
    Ipv6NdTll(MacAddr),
    MplsLabel(u32),
    MplsTc(u8),
    MplsBos(u8),
    PbbIsid(u32),
    TunnelId(u64),
    Ipv6Exthdr(u16),
    PppoeCode(u8),
    PppoeType(u8),
    PppoeSid(u16),
    PppProt(u16),
    /// A field outside the `OPENFLOW_BASIC` class, or one this crate
    /// does not know about.
    Other { class: u16, field: u8, value: Vec<u8> },
}

impl Oxm {
    /// The basic-class field of this value, if it is one.
    pub fn field(&self) -> Option<OxmField> {
        use OxmField as F;

        let field = match self {
            Self::InPort(_) => F::InPort,
            Self::InPhyPort(_) => F::InPhyPort,
            Self::Metadata(_) => F::Metadata,
            Self::EthDst(_) => F::EthDst,
            Self::EthSrc(_) => F::EthSrc,
            Self::EthType(_) => F::EthType,
            Self::VlanVid(_) => F::VlanVid,
            Self::VlanPcp(_) => F::VlanPcp,
            Self::IpDscp(_) => F::IpDscp,
            Self::IpEcn(_) => F::IpEcn,
            Self::IpProto(_) => F::IpProto,
            Self::Ipv4Src(_) => F::Ipv4Src,
            Self::Ipv4Dst(_) => F::Ipv4Dst,
            Self::TcpSrc(_) => F::TcpSrc,
            Self::TcpDst(_) => F::TcpDst,
            Self::UdpSrc(_) => F::UdpSrc,
            Self::UdpDst(_) => F::UdpDst,
            Self::SctpSrc(_) => F::SctpSrc,
            Self::SctpDst(_) => F::SctpDst,
            Self::Icmpv4Type(_) => F::Icmpv4Type,
            Self::Icmpv4Code(_) => F::Icmpv4Code,
            Self::ArpOp(_) => F::ArpOp,
            Self::ArpSpa(_) => F::ArpSpa,
            Self::ArpTpa(_) => F::ArpTpa,
            Self::ArpSha(_) => F::ArpSha,
            Self::ArpTha(_) => F::ArpTha,
            Self::Ipv6Src(_) => F::Ipv6Src,
            Self::Ipv6Dst(_) => F::Ipv6Dst,
            Self::Ipv6Flabel(_) => F::Ipv6Flabel,
            Self::Icmpv6Type(_) => F::Icmpv6Type,
            Self::Icmpv6Code(_) => F::Icmpv6Code,
            Self::Ipv6NdTarget(_) => F::Ipv6NdTarget,
            Self::Ipv6NdSll(_) => F::Ipv6NdSll,
            Self::Ipv6NdTll(_) => F::Ipv6NdTll,
            Self::MplsLabel(_) => F::MplsLabel,
            Self::MplsTc(_) => F::MplsTc,
            Self::MplsBos(_) => F::MplsBos,
            Self::PbbIsid(_) => F::PbbIsid,
            Self::TunnelId(_) => F::TunnelId,
            Self::Ipv6Exthdr(_) => F::Ipv6Exthdr,
            Self::PppoeCode(_) => F::PppoeCode,
            Self::PppoeType(_) => F::PppoeType,
            Self::PppoeSid(_) => F::PppoeSid,
            Self::PppProt(_) => F::PppProt,
            Self::Other { .. } => return None,
        };

        Some(field)
    }

    pub fn id(&self) -> OxmId {
        match (self, self.field()) {
            (Self::Other { class, field, .. }, _) => {
                OxmId { class: *class, field: *field }
            }
            (_, Some(field)) => OxmId::basic(field),
            // Every variant but `Other` maps to a basic field.
            (_, None) => OxmId { class: OFPXMC_EXPERIMENTER, field: 0 },
        }
    }

    /// The value as it appears on the wire.
    pub fn value_bytes(&self) -> Vec<u8> {
        match self {
            Self::InPort(v)
            | Self::InPhyPort(v)
            | Self::Ipv6Flabel(v)
            | Self::MplsLabel(v) => v.to_be_bytes().to_vec(),

            Self::Metadata(v) | Self::TunnelId(v) => v.to_be_bytes().to_vec(),

            Self::EthDst(mac)
            | Self::EthSrc(mac)
            | Self::ArpSha(mac)
            | Self::ArpTha(mac)
            | Self::Ipv6NdSll(mac)
            | Self::Ipv6NdTll(mac) => mac.bytes().to_vec(),

            Self::EthType(v)
            | Self::VlanVid(v)
            | Self::TcpSrc(v)
            | Self::TcpDst(v)
            | Self::UdpSrc(v)
            | Self::UdpDst(v)
            | Self::SctpSrc(v)
            | Self::SctpDst(v)
            | Self::ArpOp(v)
            | Self::Ipv6Exthdr(v)
            | Self::PppoeSid(v)
            | Self::PppProt(v) => v.to_be_bytes().to_vec(),

            Self::VlanPcp(v)
            | Self::IpDscp(v)
            | Self::IpEcn(v)
            | Self::IpProto(v)
            | Self::Icmpv4Type(v)
            | Self::Icmpv4Code(v)
            | Self::Icmpv6Type(v)
            | Self::Icmpv6Code(v)
            | Self::MplsTc(v)
            | Self::MplsBos(v)
            | Self::PppoeCode(v)
            | Self::PppoeType(v) => vec![*v],

            Self::Ipv4Src(ip)
            | Self::Ipv4Dst(ip)
            | Self::ArpSpa(ip)
            | Self::ArpTpa(ip) => ip.bytes().to_vec(),

            Self::Ipv6Src(ip) | Self::Ipv6Dst(ip) | Self::Ipv6NdTarget(ip) => {
                ip.to_vec()
            }

            Self::PbbIsid(v) => v.to_be_bytes()[1..].to_vec(),

            Self::Other { value, .. } => value.clone(),
        }
    }

    /// Build a typed value from its wire form.
    pub fn decode(
        class: u16,
        field: u8,
        value: &[u8],
    ) -> Result<Self, OxmError> {
        let known = match OxmField::from_u8(field) {
            Some(f) if class == OFPXMC_OPENFLOW_BASIC => f,
            _ => {
                return Ok(Self::Other { class, field, value: value.to_vec() });
            }
        };

        if value.len() != known.width() {
            return Err(OxmError::BadLength {
                field: known,
                expected: known.width(),
                actual: value.len(),
            });
        }

        let u8v = || value[0];
        let u16v = || u16::from_be_bytes([value[0], value[1]]);
        let u32v =
            || u32::from_be_bytes([value[0], value[1], value[2], value[3]]);
        let u64v = || {
            let mut b = [0u8; 8];
            b.copy_from_slice(value);
            u64::from_be_bytes(b)
        };
        let mac = || {
            let mut b = [0u8; 6];
            b.copy_from_slice(value);
            MacAddr::from(b)
        };
        let ip4 =
            || Ipv4Addr::from_const([value[0], value[1], value[2], value[3]]);
        let ip6 = || {
            let mut b = [0u8; 16];
            b.copy_from_slice(value);
            b
        };

        use OxmField as F;
        let oxm = match known {
            F::InPort => Self::InPort(u32v()),
            F::InPhyPort => Self::InPhyPort(u32v()),
            F::Metadata => Self::Metadata(u64v()),
            F::EthDst => Self::EthDst(mac()),
            F::EthSrc => Self::EthSrc(mac()),
            F::EthType => Self::EthType(u16v()),
            F::VlanVid => Self::VlanVid(u16v()),
            F::VlanPcp => Self::VlanPcp(u8v()),
            F::IpDscp => Self::IpDscp(u8v()),
            F::IpEcn => Self::IpEcn(u8v()),
            F::IpProto => Self::IpProto(u8v()),
            F::Ipv4Src => Self::Ipv4Src(ip4()),
            F::Ipv4Dst => Self::Ipv4Dst(ip4()),
            F::TcpSrc => Self::TcpSrc(u16v()),
            F::TcpDst => Self::TcpDst(u16v()),
            F::UdpSrc => Self::UdpSrc(u16v()),
            F::UdpDst => Self::UdpDst(u16v()),
            F::SctpSrc => Self::SctpSrc(u16v()),
            F::SctpDst => Self::SctpDst(u16v()),
            F::Icmpv4Type => Self::Icmpv4Type(u8v()),
            F::Icmpv4Code => Self::Icmpv4Code(u8v()),
            F::ArpOp => Self::ArpOp(u16v()),
            F::ArpSpa => Self::ArpSpa(ip4()),
            F::ArpTpa => Self::ArpTpa(ip4()),
            F::ArpSha => Self::ArpSha(mac()),
            F::ArpTha => Self::ArpTha(mac()),
            F::Ipv6Src => Self::Ipv6Src(ip6()),
            F::Ipv6Dst => Self::Ipv6Dst(ip6()),
            F::Ipv6Flabel => Self::Ipv6Flabel(u32v()),
            F::Icmpv6Type => Self::Icmpv6Type(u8v()),
            F::Icmpv6Code => Self::Icmpv6Code(u8v()),
            F::Ipv6NdTarget => Self::Ipv6NdTarget(ip6()),
            F::Ipv6NdSll => Self::Ipv6NdSll(mac()),
            F::Ipv6NdTll => Self::Ipv6NdTll(mac()),
            F::MplsLabel => Self::MplsLabel(u32v()),
            F::MplsTc => Self::MplsTc(u8v()),
            F::MplsBos => Self::MplsBos(u8v()),
            F::PbbIsid => {
                Self::PbbIsid(u32::from_be_bytes([
                    0, value[0], value[1], value[2],
                ]))
            }
            F::TunnelId => Self::TunnelId(u64v()),
            F::Ipv6Exthdr => Self::Ipv6Exthdr(u16v()),
            F::PppoeCode => Self::PppoeCode(u8v()),
            F::PppoeType => Self::PppoeType(u8v()),
            F::PppoeSid => Self::PppoeSid(u16v()),
            F::PppProt => Self::PppProt(u16v()),
        };

        Ok(oxm)
    }

    /// Append the TLV form of this value to `dst`.
    ///
    /// An `Other` value longer than [`OXM_MAX_LEN`] is truncated.
    pub fn emit(&self, dst: &mut Vec<u8>) {
        let mut value = self.value_bytes();
        value.truncate(OXM_MAX_LEN);
        emit_tlv(dst, self.id(), false, &value);
    }
}

fn emit_tlv(dst: &mut Vec<u8>, id: OxmId, has_mask: bool, body: &[u8]) {
    dst.extend_from_slice(&id.class.to_be_bytes());
    dst.push((id.field << 1) | u8::from(has_mask));
    dst.push(body.len() as u8);
    dst.extend_from_slice(body);
}

fn write_hex(f: &mut fmt::Formatter, bytes: &[u8]) -> fmt::Result {
    write!(f, "0x")?;
    for b in bytes {
        write!(f, "{b:02x}")?;
    }
    Ok(())
}

impl Display for Oxm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let Some(field) = self.field() else {
            let id = self.id();
            write!(f, "OXM({:#06x},{})=", id.class, id.field)?;
            return write_hex(f, &self.value_bytes());
        };

        write!(f, "{field}=")?;
        match self {
            Self::EthDst(mac)
            | Self::EthSrc(mac)
            | Self::ArpSha(mac)
            | Self::ArpTha(mac)
            | Self::Ipv6NdSll(mac)
            | Self::Ipv6NdTll(mac) => write!(f, "{mac}"),

            Self::Ipv4Src(ip)
            | Self::Ipv4Dst(ip)
            | Self::ArpSpa(ip)
            | Self::ArpTpa(ip) => write!(f, "{ip}"),

            Self::EthType(v) | Self::PppProt(v) => write!(f, "{v:#06x}"),

            Self::InPort(v)
            | Self::InPhyPort(v)
            | Self::MplsLabel(v)
            | Self::Ipv6Flabel(v)
            | Self::PbbIsid(v) => write!(f, "{v}"),

            Self::VlanVid(v)
            | Self::TcpSrc(v)
            | Self::TcpDst(v)
            | Self::UdpSrc(v)
            | Self::UdpDst(v)
            | Self::SctpSrc(v)
            | Self::SctpDst(v)
            | Self::ArpOp(v)
            | Self::Ipv6Exthdr(v)
            | Self::PppoeSid(v) => write!(f, "{v}"),

            Self::VlanPcp(v)
            | Self::IpDscp(v)
            | Self::IpEcn(v)
            | Self::IpProto(v)
            | Self::Icmpv4Type(v)
            | Self::Icmpv4Code(v)
            | Self::Icmpv6Type(v)
            | Self::Icmpv6Code(v)
            | Self::MplsTc(v)
            | Self::MplsBos(v)
            | Self::PppoeCode(v)
            | Self::PppoeType(v) => write!(f, "{v}"),

            _ => write_hex(f, &self.value_bytes()),
        }
    }
}

/// An OXM as it appears in a flow match: a value and an optional
/// bit mask of the same width.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct OxmMasked {
    pub oxm: Oxm,
    pub mask: Option<Vec<u8>>,
}

impl OxmMasked {
    pub fn exact(oxm: Oxm) -> Self {
        Self { oxm, mask: None }
    }

    pub fn masked(oxm: Oxm, mask: Vec<u8>) -> Self {
        Self { oxm, mask: Some(mask) }
    }

    /// Append the TLV form to `dst`.
    pub fn emit(&self, dst: &mut Vec<u8>) {
        let Some(mask) = &self.mask else {
            return self.oxm.emit(dst);
        };

        let mut body = self.oxm.value_bytes();
        body.extend_from_slice(mask);
        body.truncate(OXM_MAX_LEN);
        emit_tlv(dst, self.oxm.id(), true, &body);
    }

    /// Parse one TLV from the front of `src`, returning it along with
    /// the number of bytes consumed.
    pub fn parse(src: &[u8]) -> Result<(Self, usize), OxmError> {
        if src.len() < OXM_HDR_SZ {
            return Err(OxmError::Truncated {
                needed: OXM_HDR_SZ,
                available: src.len(),
            });
        }

        let class = u16::from_be_bytes([src[0], src[1]]);
        let field = src[2] >> 1;
        let has_mask = src[2] & 0x1 == 1;
        let len = usize::from(src[3]);
        let total = OXM_HDR_SZ + len;

        let Some(body) = src.get(OXM_HDR_SZ..total) else {
            return Err(OxmError::Truncated {
                needed: total,
                available: src.len(),
            });
        };

        let (value, mask) = if has_mask {
            let (v, m) = body.split_at(len / 2);
            (v, Some(m.to_vec()))
        } else {
            (body, None)
        };

        let oxm = Oxm::decode(class, field, value)?;
        Ok((Self { oxm, mask }, total))
    }

    /// Parse a run of back-to-back TLVs.
    pub fn parse_all(mut src: &[u8]) -> Result<Vec<Self>, OxmError> {
        let mut out = Vec::new();
        while !src.is_empty() {
            let (oxm, used) = Self::parse(src)?;
            out.push(oxm);
            src = &src[used..];
        }
        Ok(out)
    }
}

impl From<Oxm> for OxmMasked {
    fn from(oxm: Oxm) -> Self {
        Self::exact(oxm)
    }
}
