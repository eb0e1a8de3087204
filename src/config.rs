//! Runtime-tunable configuration for the duty-cycle core.
//!
//! Timing constants are kept as fields of a `Default`-able struct
//! rather than `const` items, matching `CoreConfig`/`BasicMacConfig`
//! elsewhere in this crate family — a deployment picks its own
//! intervals without a recompile.

/// Options settable/gettable through [`crate::api`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceOption {
    /// Radio channel.
    Channel,
    /// Transmit power.
    TxPower,
    /// Short (16-bit) source address.
    ShortAddr,
    /// Extended (64-bit) source address.
    ExtAddr,
    /// PAN ID.
    PanId,
    /// Current radio power state.
    PowerState,
    /// Short-address length advertised to the driver; set on init and
    /// whenever duty-cycling is enabled.
    SrcAddrLen,
}

/// A value carried alongside a [`DeviceOption`] in a `set`/`get` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionValue {
    U16(u16),
    U64(u64),
    I8(i8),
    PowerState(RadioPowerState),
}

/// Coarse radio power state, as reported by the device driver on
/// `NetDeviceEvent` transitions and surfaced through GET(PowerState).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioPowerState {
    Sleep,
    Idle,
    Rx,
    Tx,
}

/// Tunables for the sleep/wake duty cycle.
///
/// `min_interval_ms`/`max_interval_ms` bound the adaptive sleep
/// interval (see `SleepShift`); `wakeup_interval_ms` is the fixed
/// window the core stays awake listening after each beacon/queue
/// drain before returning to sleep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DutyCycleConfig {
    pub min_interval_ms: u32,
    pub max_interval_ms: u32,
    pub wakeup_interval_ms: u32,
    /// Short-address length (bytes), passed to the driver as
    /// `DeviceOption::SrcAddrLen` on init and on enable.
    pub short_addr_len: u16,
}

impl Default for DutyCycleConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: 1_000,
            max_interval_ms: 32_000,
            wakeup_interval_ms: 100,
            short_addr_len: 2,
        }
    }
}
