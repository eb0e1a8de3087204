//! The retry/CSMA adapter contract this core consumes.
//!
//! Channel access and retransmission policy are out of scope here —
//! this module only names the shape of the collaborator the
//! duty-cycle core drives after a `send_without_release`, and a best
//! effort default so the crate is exercisable end to end without a
//! real CSMA implementation plugged in.

use rand_core::RngCore;

/// Outcome the core needs from the adapter after it has finished
/// acting on the result of a prior attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
    /// The adapter wants the core to attempt the send/resend again.
    Retry,
    /// The adapter has given up; the frame should be dropped from the
    /// queue without surfacing an error to the caller.
    GiveUp,
    /// The frame was delivered; drop it from the queue as a success.
    Done,
}

/// Consumed retry/CSMA contract (spec Non-goal: the algorithm itself).
///
/// The core calls `csma_send_*`/`retry_send_*` to report what
/// `NetDevice::isr` told it, and the adapter replies with what the
/// core should do next. `F` is the caller's RNG or clock closure type
/// used for backoff jitter, left generic so a real CSMA adapter isn't
/// forced through this trait's concrete types.
pub trait RetryCsma<F> {
    /// Begin (or continue) a CSMA channel-access attempt for the head
    /// of the queue. Returns `true` if the core should proceed to
    /// `send_without_release` now, `false` if the adapter wants to
    /// wait (it will have armed its own backoff).
    fn send_with_csma(&mut self, ctx: &mut F) -> bool;

    /// The device reported medium busy during CSMA.
    fn csma_send_failed(&mut self, ctx: &mut F) -> RetryOutcome;

    /// The device reported the frame got clear of the channel.
    fn csma_send_succeeded(&mut self) -> RetryOutcome;

    /// The device reported a completed transmission but no ack was
    /// observed (`NetDeviceEvent::TxNoAck`).
    fn retry_send_failed(&mut self, ctx: &mut F) -> RetryOutcome;

    /// The device confirmed the ack (or this is an unacked frame type).
    fn retry_send_succeeded(&mut self) -> RetryOutcome;
}

/// Number of CSMA/retry attempts before [`SimpleRetry`] gives up on a
/// frame.
const MAX_ATTEMPTS: u8 = 4;

/// A minimal best-effort retry/CSMA adapter: fixed attempt budget,
/// jittered linear backoff. Not a specified channel-access algorithm —
/// just enough policy to drive the core's tests and a quick-start
/// deployment.
pub struct SimpleRetry {
    attempts: u8,
    backoff_base_ms: u32,
}

impl SimpleRetry {
    pub fn new(backoff_base_ms: u32) -> Self {
        Self {
            attempts: 0,
            backoff_base_ms,
        }
    }

    fn jitter_ms<R: RngCore>(&self, rng: &mut R) -> u32 {
        self.backoff_base_ms + (rng.next_u32() % self.backoff_base_ms.max(1))
    }
}

impl<R: RngCore> RetryCsma<R> for SimpleRetry {
    fn send_with_csma(&mut self, _ctx: &mut R) -> bool {
        true
    }

    fn csma_send_failed(&mut self, ctx: &mut R) -> RetryOutcome {
        self.attempts += 1;
        if self.attempts >= MAX_ATTEMPTS {
            self.attempts = 0;
            RetryOutcome::GiveUp
        } else {
            let _ = self.jitter_ms(ctx);
            RetryOutcome::Retry
        }
    }

    fn csma_send_succeeded(&mut self) -> RetryOutcome {
        self.attempts = 0;
        RetryOutcome::Done
    }

    fn retry_send_failed(&mut self, ctx: &mut R) -> RetryOutcome {
        self.csma_send_failed(ctx)
    }

    fn retry_send_succeeded(&mut self) -> RetryOutcome {
        self.csma_send_succeeded()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::rngs::mock::StepRng;

    #[test]
    fn gives_up_after_max_attempts() {
        let mut r = SimpleRetry::new(10);
        let mut rng = StepRng::new(0, 1);
        for _ in 0..MAX_ATTEMPTS - 1 {
            assert_eq!(r.csma_send_failed(&mut rng), RetryOutcome::Retry);
        }
        assert_eq!(r.csma_send_failed(&mut rng), RetryOutcome::GiveUp);
    }

    #[test]
    fn success_resets_attempts() {
        let mut r = SimpleRetry::new(10);
        let mut rng = StepRng::new(0, 1);
        r.csma_send_failed(&mut rng);
        assert_eq!(r.csma_send_succeeded(), RetryOutcome::Done);
        assert_eq!(r.attempts, 0);
    }
}
