
use crate::frame::Frame;

/// Errors the core can return to a caller.
///
/// Disposition follows spec.md §7: overflow is surfaced to the caller
/// (who retains the frame), transient TX failures never reach here
/// (absorbed by the retry/CSMA adapter), terminal TX failures are not
/// surfaced at all (the frame is simply dropped from the queue), and
/// driver `set`/`get` errors are passed through verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum CoreError<E> {
    /// The TX queue is full; the caller retains ownership of `frame`.
    Overflow(Frame),

    /// A `set`/`get` option is not recognized by this core or the
    /// underlying device.
    InvalidOption,

    /// Wrapper for an unhandled/underlying radio driver error.
    Device(E),
}

impl<E> From<E> for CoreError<E> {
    fn from(e: E) -> Self {
        CoreError::Device(e)
    }
}
