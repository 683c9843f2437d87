// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Decoded OpenFlow actions, as handed to the packet engine one at a
//! time by the action-processing layer.

use crate::oxm::Oxm;
use alloc::vec::Vec;
use core::fmt;
use core::fmt::Display;
use serde::Deserialize;
use serde::Serialize;

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Action {
    Output { port: u32, max_len: u16 },
    CopyTtlOut,
    CopyTtlIn,
    SetMplsTtl(u8),
    DecMplsTtl,
    PushVlan(u16),
    PopVlan,
    PushMpls(u16),
    /// Pop the outer MPLS label; the argument becomes the new ethertype.
    PopMpls(u16),
    SetQueue(u32),
    Group(u32),
    SetNwTtl(u8),
    DecNwTtl,
    SetField(Oxm),
    PushPbb(u16),
    PopPbb,
    PushPppoe(u16),
    /// Pop the PPPoE (and PPP) header; the argument becomes the new
    /// ethertype.
    PopPppoe(u16),
    /// Push a PPP header carrying the given protocol number.
    PushPpp(u16),
    PopPpp,
    Experimenter { id: u32, body: Vec<u8> },
    /// An action type the decoder did not recognize.
    Unknown { kind: u16 },
}

impl Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Output { port, max_len } => {
                write!(f, "output({port}, max_len={max_len})")
            }
            Self::CopyTtlOut => write!(f, "copy_ttl_out"),
            Self::CopyTtlIn => write!(f, "copy_ttl_in"),
            Self::SetMplsTtl(ttl) => write!(f, "set_mpls_ttl({ttl})"),
            Self::DecMplsTtl => write!(f, "dec_mpls_ttl"),
            Self::PushVlan(et) => write!(f, "push_vlan({et:#06x})"),
            Self::PopVlan => write!(f, "pop_vlan"),
            Self::PushMpls(et) => write!(f, "push_mpls({et:#06x})"),
            Self::PopMpls(et) => write!(f, "pop_mpls({et:#06x})"),
            Self::SetQueue(q) => write!(f, "set_queue({q})"),
            Self::Group(g) => write!(f, "group({g})"),
            Self::SetNwTtl(ttl) => write!(f, "set_nw_ttl({ttl})"),
            Self::DecNwTtl => write!(f, "dec_nw_ttl"),
            Self::SetField(oxm) => write!(f, "set_field({oxm})"),
            Self::PushPbb(et) => write!(f, "push_pbb({et:#06x})"),
            Self::PopPbb => write!(f, "pop_pbb"),
            Self::PushPppoe(et) => write!(f, "push_pppoe({et:#06x})"),
            Self::PopPppoe(et) => write!(f, "pop_pppoe({et:#06x})"),
            Self::PushPpp(proto) => write!(f, "push_ppp({proto:#06x})"),
            Self::PopPpp => write!(f, "pop_ppp"),
            Self::Experimenter { id, body } => {
                write!(f, "experimenter({id:#010x}, {} bytes)", body.len())
            }
            Self::Unknown { kind } => write!(f, "unknown({kind})"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn display() {
        assert_eq!(Action::PushVlan(0x8100).to_string(), "push_vlan(0x8100)");
        assert_eq!(
            Action::SetField(Oxm::TcpDst(80)).to_string(),
            "set_field(TCP_DST=80)"
        );
        assert_eq!(Action::Unknown { kind: 99 }.to_string(), "unknown(99)");
    }

    #[test]
    fn json_shape() {
        let acts: Vec<Action> =
            serde_json::from_str(r#"[{"PushVlan":33024},"PopVlan"]"#).unwrap();
        assert_eq!(acts, vec![Action::PushVlan(0x8100), Action::PopVlan]);
    }
}
