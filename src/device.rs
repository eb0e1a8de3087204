//! The radio driver contract this core consumes.
//!
//! The physical driver itself is out of scope here (no register
//! access, no PHY timing) — this module only names the shape a driver
//! must expose so the duty-cycle core can drive it. It mirrors the
//! `Radio<I, E>` trait alias this crate family composes from `radio::*`,
//! narrowed to the specific calls the leaf core makes.

use crate::config::{DeviceOption, OptionValue};
use crate::frame::Frame;

/// Events the driver's `isr()` can report back after an interrupt.
///
/// `TxMediumBusy` and `TxNoAck` are kept distinct even though the
/// original folds the medium-busy case into its no-ack handling: the
/// retry/CSMA adapter (`crate::retry`) needs to tell the two apart to
/// decide whether to re-arm CSMA backoff or move straight to a
/// retransmit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetDeviceEvent {
    /// The radio signalled that the parent has queued downlink data;
    /// consumed by the following `RxComplete`.
    RxPending,
    RxComplete,
    TxComplete,
    TxCompletePending,
    TxMediumBusy,
    TxNoAck,
}

/// The driver contract consumed by [`crate::duty::LeafDutyCycle`].
///
/// Implementations are expected to be non-blocking: `send_*` and
/// `send_beacon` hand a frame to the radio and return immediately, with
/// completion reported later through [`NetDevice::isr`].
pub trait NetDevice {
    /// Driver-specific error type.
    type Error;

    /// One-time driver bring-up. Must leave the radio in
    /// [`crate::config::RadioPowerState::Idle`] or better.
    fn init(&mut self) -> Result<(), Self::Error>;

    /// Apply a device option.
    fn set(&mut self, option: DeviceOption, value: OptionValue) -> Result<(), Self::Error>;

    /// Read a device option back.
    fn get(&mut self, option: DeviceOption) -> Result<OptionValue, Self::Error>;

    /// Service a pending hardware interrupt, returning the event it
    /// represents, if any.
    fn isr(&mut self) -> Result<Option<NetDeviceEvent>, Self::Error>;

    /// Hand `frame` to the radio for transmission without releasing
    /// ownership back to the caller (the caller keeps it queued in
    /// case a retry is needed).
    fn send_without_release(&mut self, frame: &Frame) -> Result<(), Self::Error>;

    /// Re-submit the most recently sent frame (retry path).
    fn resend_without_release(&mut self, frame: &Frame) -> Result<(), Self::Error>;

    /// Transmit a beacon frame. Distinct from `send_without_release`
    /// because a beacon TX is only attempted when the channel is
    /// observed clear (see [`NetDevice::is_receiving`]).
    fn send_beacon(&mut self, frame: &Frame) -> Result<(), Self::Error>;

    /// Pull the most recently received frame out of the driver, if any
    /// is buffered.
    fn recv(&mut self) -> Result<Option<Frame>, Self::Error>;

    /// Poll whether the radio is mid-reception right now. Used to
    /// guard beacon transmission against colliding with an in-flight
    /// receive.
    fn is_receiving(&mut self) -> Result<bool, Self::Error>;
}

#[cfg(any(test, feature = "mocks"))]
pub mod mock {
    use super::*;
    use heapless::Vec;

    /// One scripted step a [`MockDevice`] will play back.
    #[derive(Debug, Clone, PartialEq)]
    pub enum Transaction {
        Init,
        Set(DeviceOption, OptionValue),
        Get(DeviceOption, OptionValue),
        Isr(Option<NetDeviceEvent>),
        Send(Frame),
        Resend(Frame),
        Beacon(Frame),
        Recv(Option<Frame>),
        IsReceiving(bool),
    }

    /// A scripted [`NetDevice`] double: each call consumes the next
    /// expected [`Transaction`] and panics on a mismatch, the same
    /// expectation-queue pattern this crate family's `radio::mock`
    /// uses.
    pub struct MockDevice {
        expected: Vec<Transaction, 64>,
        index: usize,
    }

    impl MockDevice {
        pub fn new(expected: &[Transaction]) -> Self {
            let mut v = Vec::new();
            for t in expected {
                v.push(t.clone()).ok();
            }
            Self { expected: v, index: 0 }
        }

        pub fn done(&self) -> bool {
            self.index == self.expected.len()
        }

        fn next(&mut self) -> Transaction {
            let t = self
                .expected
                .get(self.index)
                .cloned()
                .expect("MockDevice: no more expected transactions");
            self.index += 1;
            t
        }
    }

    impl NetDevice for MockDevice {
        type Error = ();

        fn init(&mut self) -> Result<(), ()> {
            assert_eq!(self.next(), Transaction::Init);
            Ok(())
        }

        fn set(&mut self, option: DeviceOption, value: OptionValue) -> Result<(), ()> {
            assert_eq!(self.next(), Transaction::Set(option, value));
            Ok(())
        }

        fn get(&mut self, option: DeviceOption) -> Result<OptionValue, ()> {
            match self.next() {
                Transaction::Get(o, v) if o == option => Ok(v),
                other => panic!("unexpected transaction, got get but expected {:?}", other),
            }
        }

        fn isr(&mut self) -> Result<Option<NetDeviceEvent>, ()> {
            match self.next() {
                Transaction::Isr(e) => Ok(e),
                other => panic!("unexpected transaction, got isr but expected {:?}", other),
            }
        }

        fn send_without_release(&mut self, frame: &Frame) -> Result<(), ()> {
            assert_eq!(self.next(), Transaction::Send(frame.clone()));
            Ok(())
        }

        fn resend_without_release(&mut self, frame: &Frame) -> Result<(), ()> {
            assert_eq!(self.next(), Transaction::Resend(frame.clone()));
            Ok(())
        }

        fn send_beacon(&mut self, frame: &Frame) -> Result<(), ()> {
            assert_eq!(self.next(), Transaction::Beacon(frame.clone()));
            Ok(())
        }

        fn recv(&mut self) -> Result<Option<Frame>, ()> {
            match self.next() {
                Transaction::Recv(f) => Ok(f),
                other => panic!("unexpected transaction, got recv but expected {:?}", other),
            }
        }

        fn is_receiving(&mut self) -> Result<bool, ()> {
            match self.next() {
                Transaction::IsReceiving(b) => Ok(b),
                other => panic!(
                    "unexpected transaction, got is_receiving but expected {:?}",
                    other
                ),
            }
        }
    }
}
