//! Logging facade.
//!
//! Forwards to the `log` crate by default, or to `defmt` when the
//! `defmt` feature is enabled. Every other module logs through this
//! rather than `log`/`defmt` directly so the backend stays a single
//! feature switch.

#[cfg(not(feature = "defmt"))]
pub use log::{debug, error, info, trace, warn};

#[cfg(feature = "defmt")]
pub use defmt::{debug, error, info, trace, warn};
