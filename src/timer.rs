//! Timer traits: monotonic time and the single-shot wake-up the
//! duty-cycle core uses to schedule its next state transition.

/// Timer trait provides mechanisms for accessing monotonic times
/// to assist with protocol implementations.
///
/// All methods are monotonic and relative to the same unknown epoch.
pub trait Timer {
    /// Returns the number of millisecond ticks since some unknown epoch.
    fn ticks_ms(&self) -> u32;

    /// Returns the microsecond ticks since some unknown epoch.
    fn time_us(&self) -> u32;
}

/// Single-shot wake-up scheduling, owned exclusively by the duty-cycle
/// core (the `Timer` entity of `{deadline, armed}`).
///
/// `arm_ms` re-arms the timer for `delay_ms` from now, replacing any
/// previous deadline. The timer driver's expiry callback runs in an
/// ISR-like context and must do nothing but deliver a tick into the
/// core's mailbox — it never touches core state directly.
pub trait DutyTimer: Timer {
    /// Arm the timer to fire `delay_ms` milliseconds from now.
    fn arm_ms(&mut self, delay_ms: u32);

    /// Cancel any pending arm. A no-op if not armed.
    fn disarm(&mut self);

    /// Whether the timer currently has an outstanding arm.
    fn is_armed(&self) -> bool;
}

#[cfg(any(test, feature = "mocks"))]
pub mod mock {
    use super::{DutyTimer, Timer};

    /// A timer double for tests: time is advanced manually with
    /// `inc_ms`/`set_ms`; arm/disarm just record the deadline.
    #[derive(Clone, Debug, Default)]
    pub struct MockTimer {
        now_us: u64,
        armed: bool,
        deadline_ms: u32,
    }

    impl MockTimer {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_ms(&mut self, ms: u32) {
            self.now_us = (ms as u64) * 1000;
        }

        pub fn inc_ms(&mut self, ms: u32) {
            self.now_us += (ms as u64) * 1000;
        }

        /// Whether the current arm's deadline has passed.
        pub fn expired(&self) -> bool {
            self.armed && self.ticks_ms() >= self.deadline_ms
        }
    }

    impl Timer for MockTimer {
        fn ticks_ms(&self) -> u32 {
            (self.now_us / 1000) as u32
        }

        fn time_us(&self) -> u32 {
            self.now_us as u32
        }
    }

    impl DutyTimer for MockTimer {
        fn arm_ms(&mut self, delay_ms: u32) {
            self.armed = true;
            self.deadline_ms = self.ticks_ms().saturating_add(delay_ms);
        }

        fn disarm(&mut self) {
            self.armed = false;
        }

        fn is_armed(&self) -> bool {
            self.armed
        }
    }

    #[test]
    fn arm_and_expire() {
        let mut t = MockTimer::new();
        t.arm_ms(100);
        assert!(t.is_armed());
        assert!(!t.expired());
        t.inc_ms(100);
        assert!(t.expired());
        t.disarm();
        assert!(!t.is_armed());
    }
}
