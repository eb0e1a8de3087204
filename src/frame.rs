//! Opaque frame storage.
//!
//! The core never parses or builds 802.15.4 frames (spec Non-goal); a
//! [`Frame`] is just an owned, bounded byte buffer handed to and from
//! the radio driver and the upper layer.

use heapless::Vec;

/// Maximum encoded frame length this core will carry. 127 is the
/// IEEE 802.15.4 aMaxPHYPacketSize; callers building larger upper-layer
/// frames need fragmentation above this core, which is out of scope.
pub const MAX_FRAME_LEN: usize = 127;

/// An opaque, owned link-layer frame.
pub type Frame = Vec<u8, MAX_FRAME_LEN>;

/// Build a [`Frame`] from a byte slice, for callers assembling one to hand to [`crate::api`].
pub fn frame_from_slice(data: &[u8]) -> Result<Frame, ()> {
    Frame::from_slice(data)
}
