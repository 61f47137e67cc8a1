//! USB device subsystem - presents the keyboard to the host.
//!
//! The nRF52840's built-in USB 2.0 Full-Speed controller is driven by
//! `embassy-usb`.  One HID interface carries a single interrupt-IN
//! endpoint; class requests on it are answered by the keyboard core.

pub mod hid_device;
