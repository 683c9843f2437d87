// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

use serde::Deserialize;
use serde::Serialize;

/// The head-room reserved in front of a frame when none is given.
///
/// This is enough for a stack of VLAN, MPLS, and PPPoE/PPP tags to be
/// pushed without reallocating the buffer.
pub const DEFAULT_HEAD_ROOM: usize = 64;

/// Configuration applied when a packet buffer is built.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PacketCfg {
    /// Bytes reserved in front of the frame for tag insertion.
    pub head_room: usize,
}

impl Default for PacketCfg {
    fn default() -> Self {
        Self { head_room: DEFAULT_HEAD_ROOM }
    }
}
