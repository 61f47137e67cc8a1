//! Protocol core for a single-key-at-a-time USB HID keyboard.
//!
//! Everything with protocol semantics lives here and builds for the host:
//! sampling the key lines, encoding reports, idle-rate pacing, HID class
//! control requests, and the report scheduler.  Hardware and the USB engine
//! are reached only through the traits in [`keys`], [`idle`], [`control`]
//! and [`scheduler`].
//!
//! Usage: `cargo test` runs everything on the host.
//!
//! Note: The embedded binary uses main.rs with #![no_std] and #![no_main]
//! and binds these traits to nRF52840 peripherals.

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod config;
pub mod control;
pub mod error;
pub mod hid;
pub mod idle;
pub mod keys;
pub mod scheduler;

pub use control::{ControlHandler, ControlResponse, SetupRequest};
pub use error::Error;
pub use hid::HidReport;
pub use idle::TickSource;
pub use keys::{KeyLines, LogicalKey};
pub use scheduler::{Keyboard, UsbTransport, Watchdog};
