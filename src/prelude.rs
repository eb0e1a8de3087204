//! Common imports for an embedder wiring up a [`crate::duty::LeafDutyCycle`].

pub use crate::api::{FrameType, NetApi, NetConfig};
pub use crate::config::{DeviceOption, DutyCycleConfig, OptionValue, RadioPowerState};
pub use crate::device::{NetDevice, NetDeviceEvent};
pub use crate::duty::{DutyState, LeafDutyCycle, Outcome};
pub use crate::error::CoreError;
pub use crate::frame::{frame_from_slice, Frame};
pub use crate::mailbox::{Mailbox, Msg};
pub use crate::queue::TxQueue;
pub use crate::retry::{RetryCsma, RetryOutcome, SimpleRetry};
pub use crate::timer::{DutyTimer, Timer};
