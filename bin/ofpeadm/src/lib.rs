// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Packet engine administration library

use anyhow::Context;
use anyhow::bail;
use ofpe::api::Action;
use ofpe::api::OxmMasked;
use ofpe::api::PacketCfg;
use ofpe::engine::Packet;
use ofpe::provider::NullLog;
use std::sync::Arc;

/// Read a frame written as hex. Whitespace and `:` separators are
/// ignored.
pub fn parse_hex(src: &str) -> anyhow::Result<Vec<u8>> {
    let digits: Vec<u8> = src
        .bytes()
        .filter(|b| !b.is_ascii_whitespace() && *b != b':')
        .collect();

    if digits.len() % 2 != 0 {
        bail!("odd number of hex digits: {}", digits.len());
    }

    digits
        .chunks(2)
        .map(|pair| Ok((nibble(pair[0])? << 4) | nibble(pair[1])?))
        .collect()
}

fn nibble(c: u8) -> anyhow::Result<u8> {
    match c {
        b'0'..=b'9' => Ok(c - b'0'),
        b'a'..=b'f' => Ok(c - b'a' + 10),
        b'A'..=b'F' => Ok(c - b'A' + 10),
        _ => bail!("invalid hex digit: {:?}", c as char),
    }
}

pub fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Parse a JSON list of actions, e.g.
/// `[{"PushVlan": 33024}, {"SetField": {"TcpDst": 443}}, "DecNwTtl"]`.
pub fn parse_actions(json: &str) -> anyhow::Result<Vec<Action>> {
    serde_json::from_str(json).context("invalid action list")
}

/// Parse a JSON list of match entries.
pub fn parse_flow(json: &str) -> anyhow::Result<Vec<OxmMasked>> {
    serde_json::from_str(json).context("invalid flow match")
}

/// Options for building a packet from the command line.
#[derive(Clone, Copy, Debug)]
pub struct LoadOpts {
    pub in_port: u32,
    pub head_room: usize,
    pub quiet: bool,
}

/// Build a classified packet from a hex frame.
pub fn load_packet(hex: &str, opts: LoadOpts) -> anyhow::Result<Packet> {
    let bytes = parse_hex(hex)?;
    let cfg = PacketCfg { head_room: opts.head_room };
    let mut pkt = Packet::with_cfg(&cfg, bytes, opts.in_port, true);
    if opts.quiet {
        pkt.set_log(Arc::new(NullLog));
    }
    Ok(pkt)
}

/// Apply each action in turn, stopping at the first one that fails.
pub fn apply_actions(
    pkt: &mut Packet,
    actions: &[Action],
) -> anyhow::Result<()> {
    for (i, action) in actions.iter().enumerate() {
        pkt.apply_action(action)
            .with_context(|| format!("action #{i} ({action})"))?;
    }
    Ok(())
}
