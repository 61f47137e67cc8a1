//! Application-wide constants and compile-time configuration.
//!
//! All key-line, timing, and USB protocol constants live here so they
//! can be tuned in one place.  Changing the key count or the report
//! shape also requires updating `hid::descriptor` in lockstep.

// Key lines

/// Number of physical key lines sampled each poll.
pub const KEY_LINES: usize = 8;

/// Number of logical keys (1..=KEY_COUNT); 0 means "no key pressed".
pub const KEY_COUNT: u8 = 8;

// HID report

/// Size of the interrupt-IN report: modifier byte + keycode byte.
pub const REPORT_SIZE: usize = 2;

// Idle timer

/// Period of the hardware tick that drives idle retransmission (ms).
pub const TICK_PERIOD_MS: u64 = 22;

/// Unit of the host-configured idle rate (ms).
pub const IDLE_UNIT_MS: u64 = 4;

/// Idle-rate units consumed by one tick (22 ms ≈ 5 × 4 ms).
pub const IDLE_UNITS_PER_TICK: u8 = 5;

// Watchdog

/// Watchdog timeout; the main loop must feed the dog within this window.
pub const WATCHDOG_TIMEOUT_MS: u32 = 2000;

// USB

/// USB VID/PID - the shared V-USB keyboard pair from obdev.
/// Replace with your own allocated VID/PID for production.
pub const USB_VID: u16 = 0x16C0;
pub const USB_PID: u16 = 0x27DB;

/// USB device strings.
pub const USB_MANUFACTURER: &str = "hidkey";
pub const USB_PRODUCT: &str = "Eight-Key HID Keyboard";
pub const USB_SERIAL_NUMBER: &str = "000001";

/// Interrupt-IN polling interval requested from the host (ms).
pub const USB_HID_POLL_MS: u8 = 10;

/// Max packet size for the interrupt endpoint and EP0.
pub const USB_MAX_PACKET_SIZE: u8 = 8;

/// Bus power draw declared in the configuration descriptor (mA).
pub const USB_MAX_POWER_MA: u16 = 100;

// Key-line pin assignments (nRF52840-DK header)
//
// These are logical names; the actual `embassy_nrf::peripherals::*`
// pins are selected in `board.rs`.  Line n maps to bit n of the raw
// bitmask; all lines use the internal pull-up and read low when pressed.
//
//   Line 0 (A) → P1.01      Line 4 (E) → P1.05
//   Line 1 (B) → P1.02      Line 5 (F) → P1.06
//   Line 2 (C) → P1.03      Line 6 (G) → P1.07
//   Line 3 (D) → P1.04      Line 7 (H) → P1.08
