// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! The packet byte buffer.
//!
//! A [`PktBuf`] owns one contiguous allocation laid out as
//!
//! ```text
//! +-----------------+-------------------------------+
//! |    head-room    |          active frame         |
//! +-----------------+-------------------------------+
//! ^ 0               ^ start                         ^ start + len
//! ```
//!
//! Tag insertion borrows bytes from the head-room by sliding the
//! bytes in front of the insertion point backwards; tag removal gives
//! them back. Bytes behind the edit point never move, which is what
//! lets header views keep absolute offsets into the allocation.

use super::packet::PacketError;
use super::packet::PacketResult;
use crate::api::DEFAULT_HEAD_ROOM;
use core::ops::Deref;
use core::ops::DerefMut;

pub struct PktBuf {
    mem: Vec<u8>,
    head_room: usize,
    start: usize,
    len: usize,
}

impl PktBuf {
    /// Allocate a zeroed frame of `len` bytes with the default
    /// head-room.
    pub fn new(len: usize) -> Self {
        Self::with_headroom(DEFAULT_HEAD_ROOM, len)
    }

    /// Allocate a zeroed frame of `len` bytes, reserving `head_room`
    /// bytes in front of it.
    pub fn with_headroom(head_room: usize, len: usize) -> Self {
        Self { mem: vec![0; head_room + len], head_room, start: head_room, len }
    }

    /// Copy `src` into a new buffer with the default head-room.
    pub fn copy(src: impl AsRef<[u8]>) -> Self {
        Self::copy_with_headroom(DEFAULT_HEAD_ROOM, src)
    }

    pub fn copy_with_headroom(head_room: usize, src: impl AsRef<[u8]>) -> Self {
        let src = src.as_ref();
        let mut buf = Self::with_headroom(head_room, src.len());
        buf.copy_from_slice(src);
        buf
    }

    /// The head-room this buffer was built with.
    pub fn head_room(&self) -> usize {
        self.head_room
    }

    /// Returns the number of bytes available for writing ahead of the
    /// frame.
    ///
    /// This starts out as [`Self::head_room`] and shrinks as tags are
    /// inserted.
    pub fn head_capacity(&self) -> usize {
        self.start
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Absolute offset of the first frame byte.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Absolute offset one past the last frame byte.
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    /// Pointer to the first byte of the frame, for handing the frame
    /// to code which wants a raw pointer and a length.
    pub fn as_ptr(&self) -> *const u8 {
        self.deref().as_ptr()
    }

    pub fn get(&self, idx: usize) -> PacketResult<u8> {
        self.deref()
            .get(idx)
            .copied()
            .ok_or(PacketError::OutOfRange {
                needed: idx + 1,
                available: self.len,
            })
    }

    pub fn set(&mut self, idx: usize, val: u8) -> PacketResult<()> {
        let available = self.len;
        let byte = self
            .deref_mut()
            .get_mut(idx)
            .ok_or(PacketError::OutOfRange { needed: idx + 1, available })?;
        *byte = val;
        Ok(())
    }

    /// Copy `dst.len()` frame bytes starting at `offset` into `dst`.
    pub fn copy_out(&self, offset: usize, dst: &mut [u8]) -> PacketResult<()> {
        let end = offset + dst.len();
        let src = self.deref().get(offset..end).ok_or(
            PacketError::OutOfRange { needed: end, available: self.len },
        )?;
        dst.copy_from_slice(src);
        Ok(())
    }

    /// Reallocate the frame as `new_len` bytes.
    ///
    /// The first `min(len, new_len)` frame bytes are preserved, any
    /// growth is zeroed, and the full head-room is restored. Offsets
    /// previously taken from this buffer are invalid afterwards.
    pub fn resize(&mut self, new_len: usize) {
        let keep = self.len.min(new_len);
        let mut mem = vec![0; self.head_room + new_len];
        mem[self.head_room..self.head_room + keep]
            .copy_from_slice(&self.mem[self.start..self.start + keep]);
        self.mem = mem;
        self.start = self.head_room;
        self.len = new_len;
    }

    /// The frame bytes `[off, off + len)`, addressed absolutely.
    pub(crate) fn abs(&self, off: usize, len: usize) -> Option<&[u8]> {
        if off < self.start || off + len > self.end() {
            return None;
        }
        Some(&self.mem[off..off + len])
    }

    pub(crate) fn abs_mut(
        &mut self,
        off: usize,
        len: usize,
    ) -> Option<&mut [u8]> {
        if off < self.start || off + len > self.end() {
            return None;
        }
        Some(&mut self.mem[off..off + len])
    }

    /// Open `n` zeroed bytes ending at absolute offset `at` by sliding
    /// the frame bytes in front of `at` back into the head-room.
    ///
    /// Returns the absolute offset of the new bytes. Nothing is
    /// touched when the head-room cannot hold `n` more bytes.
    pub(crate) fn open_gap(
        &mut self,
        at: usize,
        n: usize,
    ) -> PacketResult<usize> {
        if at < self.start || at > self.end() {
            return Err(PacketError::InternalError("gap outside of frame"));
        }

        if n > self.start {
            return Err(PacketError::OutOfRange {
                needed: n,
                available: self.start,
            });
        }

        let new_start = self.start - n;
        self.mem.copy_within(self.start..at, new_start);
        self.mem[at - n..at].fill(0);
        self.start = new_start;
        self.len += n;
        Ok(at - n)
    }

    /// Remove the `n` bytes at absolute offset `at` by sliding the
    /// frame bytes in front of them forward.
    pub(crate) fn close_gap(
        &mut self,
        at: usize,
        n: usize,
    ) -> PacketResult<()> {
        if at < self.start || at + n > self.end() {
            return Err(PacketError::InternalError("gap outside of frame"));
        }

        self.mem.copy_within(self.start..at, self.start + n);
        self.start += n;
        self.len -= n;
        Ok(())
    }
}

impl Deref for PktBuf {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.mem[self.start..self.start + self.len]
    }
}

impl DerefMut for PktBuf {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.mem[self.start..self.start + self.len]
    }
}

impl core::fmt::Debug for PktBuf {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PktBuf")
            .field("head_room", &self.head_room)
            .field("start", &self.start)
            .field("len", &self.len)
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn zero_byte_buffer() {
        let buf = PktBuf::new(0);
        assert_eq!(buf.len(), 0);
        assert!(buf.is_empty());
        assert_eq!(buf.head_capacity(), DEFAULT_HEAD_ROOM);
        assert_eq!(
            buf.get(0),
            Err(PacketError::OutOfRange { needed: 1, available: 0 })
        );
    }

    #[test]
    fn indexed_access() {
        let mut buf = PktBuf::copy([1, 2, 3, 4]);
        assert_eq!(buf.get(3), Ok(4));
        buf.set(0, 9).unwrap();
        assert_eq!(&buf[..], &[9, 2, 3, 4]);
        assert!(buf.set(4, 0).is_err());

        let mut out = [0u8; 2];
        buf.copy_out(1, &mut out).unwrap();
        assert_eq!(out, [2, 3]);
        assert_eq!(
            buf.copy_out(3, &mut out),
            Err(PacketError::OutOfRange { needed: 5, available: 4 })
        );
    }

    #[test]
    fn resize_preserves_prefix() {
        let mut buf = PktBuf::copy_with_headroom(8, [1, 2, 3, 4, 5]);
        buf.resize(3);
        assert_eq!(&buf[..], &[1, 2, 3]);
        buf.resize(6);
        assert_eq!(&buf[..], &[1, 2, 3, 0, 0, 0]);
        assert_eq!(buf.head_capacity(), 8);
    }

    #[test]
    fn open_and_close_gap() {
        let mut buf = PktBuf::copy_with_headroom(4, [1, 2, 3, 4, 5, 6]);
        let start = buf.start();

        // Open two bytes between the second and third byte.
        let gap = buf.open_gap(start + 2, 2).unwrap();
        assert_eq!(gap, start);
        assert_eq!(&buf[..], &[1, 2, 0, 0, 3, 4, 5, 6]);
        assert_eq!(buf.head_capacity(), 2);

        // Not enough head-room left: nothing changes.
        assert_eq!(
            buf.open_gap(buf.start() + 2, 3),
            Err(PacketError::OutOfRange { needed: 3, available: 2 })
        );
        assert_eq!(&buf[..], &[1, 2, 0, 0, 3, 4, 5, 6]);

        buf.close_gap(gap, 2).unwrap();
        assert_eq!(&buf[..], &[1, 2, 3, 4, 5, 6]);
        assert_eq!(buf.head_capacity(), 4);
    }

    #[test]
    fn head_room_can_be_exhausted_exactly() {
        let mut buf = PktBuf::copy_with_headroom(4, [1, 2]);
        let at = buf.start() + 1;
        buf.open_gap(at, 4).unwrap();
        assert_eq!(&buf[..], &[1, 0, 0, 0, 0, 2]);
        assert_eq!(buf.head_capacity(), 0);
    }
}
