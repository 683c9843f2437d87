// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Header views and the header chain.
//!
//! A [`HeaderView`] names a sub-range of a packet's buffer and the
//! protocol header found there. It owns no bytes; typed access goes
//! through the [`HeaderType`] implementors, which are zerocopy
//! layouts read straight out of the buffer.
//!
//! The [`HeaderChain`] is the ordered list of views decoded from a
//! frame. Chains are short, so every lookup is a linear scan.

use super::packet::PacketError;
use super::packet::PacketResult;
use core::fmt;
use core::fmt::Display;
use serde::Deserialize;
use serde::Serialize;
use zerocopy::FromBytes;
use zerocopy::Immutable;
use zerocopy::IntoBytes;
use zerocopy::KnownLayout;
use zerocopy::Unaligned;

#[derive(
    Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize,
)]
pub enum HeaderKind {
    Ether,
    Vlan,
    Mpls,
    Pppoe,
    Ppp,
    Arp,
    Ipv4,
    Icmp,
    Udp,
    Tcp,
    /// Undecoded bytes.
    Opaque,
}

impl Display for HeaderKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Self::Ether => "Ethernet",
            Self::Vlan => "VLAN",
            Self::Mpls => "MPLS",
            Self::Pppoe => "PPPoE",
            Self::Ppp => "PPP",
            Self::Arp => "ARPv4",
            Self::Ipv4 => "IPv4",
            Self::Icmp => "ICMPv4",
            Self::Udp => "UDP",
            Self::Tcp => "TCP",
            Self::Opaque => "Opaque",
        };
        write!(f, "{s}")
    }
}

/// A header layout which can be read in place from a buffer.
///
/// The layout covers the fixed part of the header; a view over a
/// header with options is longer than `size_of::<Self>()`.
pub trait HeaderType:
    FromBytes + IntoBytes + KnownLayout + Immutable + Unaligned + Sized
{
    const KIND: HeaderKind;

    /// The size of the fixed part of the header.
    const SIZE: usize = core::mem::size_of::<Self>();
}

/// Which end of the chain a lookup starts from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SearchDir {
    /// Outermost first.
    Head,
    /// Innermost first.
    Tail,
}

/// One header's window into the packet buffer.
///
/// `off` is absolute within the buffer's allocation, not relative to
/// the frame start.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct HeaderView {
    pub kind: HeaderKind,
    pub(crate) off: usize,
    pub len: usize,
}

impl HeaderView {
    pub(crate) fn new(kind: HeaderKind, off: usize, len: usize) -> Self {
        Self { kind, off, len }
    }

    pub(crate) fn end(&self) -> usize {
        self.off + self.len
    }
}

#[derive(Clone, Debug, Default)]
pub struct HeaderChain {
    views: Vec<HeaderView>,
}

impl HeaderChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&HeaderView> {
        self.views.get(idx)
    }

    pub fn head(&self) -> Option<&HeaderView> {
        self.views.first()
    }

    pub fn tail(&self) -> Option<&HeaderView> {
        self.views.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HeaderView> {
        self.views.iter()
    }

    pub fn kinds(&self) -> Vec<HeaderKind> {
        self.views.iter().map(|v| v.kind).collect()
    }

    /// Add a view after the current tail.
    pub fn append(&mut self, view: HeaderView) {
        self.views.push(view);
    }

    /// Insert a view right after the head; on an empty chain the view
    /// becomes the head.
    pub fn push_after_head(&mut self, view: HeaderView) {
        if self.views.is_empty() {
            self.views.push(view);
        } else {
            self.views.insert(1, view);
        }
    }

    /// Insert a view right after the view at `idx`.
    pub fn insert_after(
        &mut self,
        idx: usize,
        view: HeaderView,
    ) -> PacketResult<()> {
        if idx >= self.views.len() {
            return Err(PacketError::InternalError("insert past chain tail"));
        }
        self.views.insert(idx + 1, view);
        Ok(())
    }

    /// Unlink the view at `idx`, handing it back to the caller.
    pub fn pop(&mut self, idx: usize) -> Option<HeaderView> {
        if idx < self.views.len() {
            Some(self.views.remove(idx))
        } else {
            None
        }
    }

    /// Return the chain index of the `index`-th view of `kind`,
    /// counting from the end named by `dir`.
    pub fn find(
        &self,
        kind: HeaderKind,
        dir: SearchDir,
        index: usize,
    ) -> Option<usize> {
        let matching = |(_, v): &(usize, &HeaderView)| v.kind == kind;

        match dir {
            SearchDir::Head => self
                .views
                .iter()
                .enumerate()
                .filter(matching)
                .nth(index)
                .map(|(i, _)| i),

            SearchDir::Tail => self
                .views
                .iter()
                .enumerate()
                .rev()
                .filter(matching)
                .nth(index)
                .map(|(i, _)| i),
        }
    }

    pub fn clear(&mut self) {
        self.views.clear();
    }

    /// Move the first `count` views by `delta` bytes, following the
    /// bytes a buffer gap operation slid.
    pub(crate) fn shift_front(
        &mut self,
        count: usize,
        delta: isize,
    ) -> PacketResult<()> {
        for v in self.views.iter_mut().take(count) {
            v.off = v
                .off
                .checked_add_signed(delta)
                .ok_or(PacketError::InternalError("view offset underflow"))?;
        }
        Ok(())
    }

    /// Check that the views tile `[start, ..)` back to back, returning
    /// the offset where the last one ends.
    pub(crate) fn check_contiguous(&self, start: usize) -> PacketResult<usize> {
        let mut pos = start;
        for v in &self.views {
            if v.off != pos || v.len == 0 {
                return Err(PacketError::InternalError(
                    "chain is not contiguous",
                ));
            }
            pos = v.end();
        }
        Ok(pos)
    }
}
