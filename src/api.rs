//! Upper-layer API surface (§6): `NETAPI_SEND`/`SET`/`GET`, plus
//! received-frame dispatch to type-registered listeners.
//!
//! The core itself never parses a frame (Non-goal), so "by type" here
//! is resolved by a classifier function supplied at construction
//! time — the caller's choice of how to recognise its own upper-layer
//! protocols from an opaque byte buffer, mirroring how RIOT's GNRC
//! netreg table dispatches received packets to registered threads by
//! protocol number pulled out of the packet snip.

use heapless::Vec;

use crate::config::{DeviceOption, OptionValue};
use crate::device::NetDevice;
use crate::duty::{LeafDutyCycle, Outcome};
use crate::error::CoreError;
use crate::frame::Frame;
use crate::log::debug;
use crate::retry::RetryCsma;
use crate::timer::DutyTimer;
use rand_core::RngCore;

/// Caller-defined tag identifying an upper-layer frame type.
pub type FrameType = u16;

/// Network identity passed through to the driver at bring-up. Not
/// otherwise interpreted by the core (frame format is a Non-goal).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NetConfig {
    pub pan_id: u16,
    pub short_addr: u16,
    pub long_addr: u64,
}

/// Wraps a [`LeafDutyCycle`] with the upper-layer listener table spec.md
/// §6 describes: "Received frames are dispatched to registered
/// listeners by type; when no listener is registered, the frame is
/// released."
pub struct NetApi<D, T, C, F, const QUEUE_CAP: usize, const MAILBOX_CAP: usize, const LISTENERS: usize>
where
    D: NetDevice,
    T: DutyTimer,
    C: RetryCsma<F>,
    F: RngCore,
{
    core: LeafDutyCycle<D, T, C, F, QUEUE_CAP, MAILBOX_CAP>,
    classify: fn(&Frame) -> FrameType,
    listeners: Vec<(FrameType, fn(Frame)), LISTENERS>,
}

impl<D, T, C, F, const QUEUE_CAP: usize, const MAILBOX_CAP: usize, const LISTENERS: usize>
    NetApi<D, T, C, F, QUEUE_CAP, MAILBOX_CAP, LISTENERS>
where
    D: NetDevice,
    T: DutyTimer,
    C: RetryCsma<F>,
    F: RngCore,
{
    /// `classify` extracts a [`FrameType`] from a received frame so it
    /// can be matched against a registered listener; a caller with no
    /// notion of frame types can pass `|_| 0` and register a single
    /// catch-all listener.
    pub fn new(
        core: LeafDutyCycle<D, T, C, F, QUEUE_CAP, MAILBOX_CAP>,
        classify: fn(&Frame) -> FrameType,
    ) -> Self {
        Self {
            core,
            classify,
            listeners: Vec::new(),
        }
    }

    pub fn core(&self) -> &LeafDutyCycle<D, T, C, F, QUEUE_CAP, MAILBOX_CAP> {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut LeafDutyCycle<D, T, C, F, QUEUE_CAP, MAILBOX_CAP> {
        &mut self.core
    }

    /// Register a listener for `ty`. Replaces any existing registration
    /// for the same type. Returns the evicted `(ty, handler)` pair back
    /// if the table is full and `ty` was not already registered.
    pub fn register(&mut self, ty: FrameType, handler: fn(Frame)) -> Result<(), (FrameType, fn(Frame))> {
        if let Some(slot) = self.listeners.iter_mut().find(|(t, _)| *t == ty) {
            slot.1 = handler;
            return Ok(());
        }
        self.listeners.push((ty, handler))
    }

    /// Drop any listener registered for `ty`.
    pub fn unregister(&mut self, ty: FrameType) {
        if let Some(pos) = self.listeners.iter().position(|(t, _)| *t == ty) {
            self.listeners.swap_remove(pos);
        }
    }

    /// `SEND(frame)` — enqueue for opportunistic transmission.
    pub fn send(&mut self, frame: Frame) -> Result<(), CoreError<D::Error>> {
        self.core.send(frame)
    }

    /// `SET(option, value)`.
    pub fn set(&mut self, option: DeviceOption, value: OptionValue) -> Result<(), CoreError<D::Error>> {
        self.core.set(option, value)
    }

    /// `GET(option)`.
    pub fn get(&mut self, option: DeviceOption) -> Result<OptionValue, CoreError<D::Error>> {
        self.core.get(option)
    }

    /// One-time driver bring-up, passing `config`'s identity through to
    /// the device (the core itself never interprets these fields).
    pub fn init(&mut self, config: &NetConfig) -> Result<(), D::Error> {
        self.core.init()?;
        self.core.set(
            DeviceOption::PanId,
            OptionValue::U16(config.pan_id),
        )?;
        self.core.set(
            DeviceOption::ShortAddr,
            OptionValue::U16(config.short_addr),
        )?;
        self.core.set(
            DeviceOption::ExtAddr,
            OptionValue::U64(config.long_addr),
        )?;
        Ok(())
    }

    /// Drain one mailbox message, dispatching a received frame to its
    /// registered listener (if any) before returning the outcome.
    pub fn poll(&mut self) -> Option<Outcome<D::Error>> {
        let outcome = self.core.poll()?;
        if let Outcome::Received(ref frame) = outcome {
            self.dispatch_received(frame);
        }
        Some(outcome)
    }

    fn dispatch_received(&mut self, frame: &Frame) {
        let ty = (self.classify)(frame);
        match self.listeners.iter().find(|(t, _)| *t == ty) {
            Some((_, handler)) => handler(frame.clone()),
            None => debug!("no listener for frame type, releasing"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::DutyCycleConfig;
    use crate::device::mock::{MockDevice, Transaction};
    use crate::duty::LeafDutyCycle;
    use crate::retry::SimpleRetry;
    use crate::timer::mock::MockTimer;
    use core::sync::atomic::{AtomicU16, Ordering};
    use rand::rngs::mock::StepRng;

    static LAST_SEEN: AtomicU16 = AtomicU16::new(0);

    fn record(frame: Frame) {
        LAST_SEEN.store(frame.first().copied().unwrap_or(0) as u16, Ordering::SeqCst);
    }

    #[test]
    fn dispatches_to_registered_listener() {
        let device = MockDevice::new(&[
            Transaction::Isr(Some(crate::device::NetDeviceEvent::RxComplete)),
            Transaction::Recv(Some(Frame::from_slice(&[7]).unwrap())),
            Transaction::Isr(None),
        ]);
        let timer = MockTimer::new();
        let retry = SimpleRetry::new(10);
        let rng = StepRng::new(0, 1);
        let core: LeafDutyCycle<MockDevice, MockTimer, SimpleRetry, StepRng, 4, 8> =
            LeafDutyCycle::new(device, timer, retry, rng, DutyCycleConfig::default());
        let mut api = NetApi::<_, _, _, _, 4, 8, 4>::new(core, |_| 1);
        api.register(1, record).unwrap();

        api.core_mut().on_radio_isr();
        let outcome = api.poll();
        assert!(matches!(outcome, Some(Outcome::Received(_))));
        assert_eq!(LAST_SEEN.load(Ordering::SeqCst), 7);
    }

    #[test]
    fn unregistered_type_is_released_without_panic() {
        let device = MockDevice::new(&[
            Transaction::Isr(Some(crate::device::NetDeviceEvent::RxComplete)),
            Transaction::Recv(Some(Frame::from_slice(&[7]).unwrap())),
            Transaction::Isr(None),
        ]);
        let timer = MockTimer::new();
        let retry = SimpleRetry::new(10);
        let rng = StepRng::new(0, 1);
        let core: LeafDutyCycle<MockDevice, MockTimer, SimpleRetry, StepRng, 4, 8> =
            LeafDutyCycle::new(device, timer, retry, rng, DutyCycleConfig::default());
        let mut api = NetApi::<_, _, _, _, 4, 8, 4>::new(core, |_| 2);

        api.core_mut().on_radio_isr();
        let outcome = api.poll();
        assert!(matches!(outcome, Some(Outcome::Received(_))));
    }
}
