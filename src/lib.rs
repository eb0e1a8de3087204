#![no_std]

#[cfg(test)]
extern crate std;

pub mod api;
pub mod config;
pub mod device;
pub mod duty;
pub mod error;
pub mod frame;
pub mod log;
pub mod mailbox;
pub mod queue;
pub mod retry;
pub mod timer;

pub mod prelude;
