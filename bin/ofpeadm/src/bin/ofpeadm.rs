// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

use clap::Args;
use clap::Parser;

use ofpe::api::DEFAULT_HEAD_ROOM;
use ofpe::api::OFPP_CONTROLLER;
use ofpe::engine::Packet;
use ofpe::print::print_packet;
use ofpeadm::LoadOpts;
use ofpeadm::apply_actions;
use ofpeadm::load_packet;
use ofpeadm::parse_actions;
use ofpeadm::parse_flow;
use ofpeadm::to_hex;

/// Classify and edit frames with the OpenFlow packet engine
#[derive(Debug, Parser)]
#[command(version)]
enum Command {
    /// Decode a frame and print its headers and match fields.
    Classify {
        #[command(flatten)]
        frame: FrameArgs,
    },

    /// Apply a JSON list of actions to a frame and print the result.
    Apply {
        #[command(flatten)]
        frame: FrameArgs,

        /// e.g. '[{"PushVlan": 33024}, "DecNwTtl"]'
        #[arg(long)]
        actions: String,
    },

    /// Score a JSON list of match entries against a frame.
    Hits {
        #[command(flatten)]
        frame: FrameArgs,

        /// e.g. '[{"oxm": {"TcpDst": 80}, "mask": null}]'
        #[arg(long)]
        flow: String,
    },
}

#[derive(Args, Debug)]
struct FrameArgs {
    /// The port the frame arrived on.
    #[arg(long, default_value_t = OFPP_CONTROLLER)]
    in_port: u32,

    /// Bytes reserved in front of the frame for pushed tags.
    #[arg(long, default_value_t = DEFAULT_HEAD_ROOM)]
    head_room: usize,

    /// Do not log engine notices and warnings.
    #[arg(short, long)]
    quiet: bool,

    /// The frame as hex, starting at the Ethernet header.
    frame: String,
}

impl FrameArgs {
    fn load(&self) -> anyhow::Result<Packet> {
        let opts = LoadOpts {
            in_port: self.in_port,
            head_room: self.head_room,
            quiet: self.quiet,
        };
        load_packet(&self.frame, opts)
    }
}

fn main() -> anyhow::Result<()> {
    let cmd = Command::parse();
    match cmd {
        Command::Classify { frame } => {
            print_packet(&frame.load()?)?;
        }

        Command::Apply { frame, actions } => {
            let actions = parse_actions(&actions)?;
            let mut pkt = frame.load()?;
            apply_actions(&mut pkt, &actions)?;
            print_packet(&pkt)?;
            println!("{}", to_hex(pkt.frame_bytes()));
        }

        Command::Hits { frame, flow } => {
            let flow = parse_flow(&flow)?;
            let pkt = frame.load()?;
            let hits = pkt.match_fields().calc_hits(&flow);
            println!("{hits}");
            println!("match: {}", hits.is_match());
        }
    }

    Ok(())
}
