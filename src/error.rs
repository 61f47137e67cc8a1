//! Unified error type for hidkey.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` for efficient on-target logging when the
//! `defmt` feature is enabled.

use core::fmt;

/// Top-level error type used across the firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    // Keys
    /// A logical key index outside `0..=KEY_COUNT`.
    KeyOutOfRange(u8),

    // Control transfers
    /// A setup packet shorter than the 8 bytes USB mandates.
    ShortSetupPacket(usize),

    // USB
    /// The interrupt endpoint refused a report.
    Usb(UsbError),

    // Watchdog
    /// The watchdog could not be configured (already running with
    /// an incompatible configuration).
    Watchdog,
}

/// Subset of endpoint errors we propagate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UsbError {
    /// The endpoint is disabled (bus reset or not yet configured).
    Disabled,
    /// The report did not fit the endpoint's max packet size.
    BufferOverflow,
}

// Convenience conversions

impl From<UsbError> for Error {
    fn from(e: UsbError) -> Self {
        Error::Usb(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::KeyOutOfRange(index) => write!(f, "logical key {index} out of range"),
            Error::ShortSetupPacket(len) => write!(f, "setup packet of {len} bytes, need 8"),
            Error::Usb(UsbError::Disabled) => f.write_str("interrupt endpoint disabled"),
            Error::Usb(UsbError::BufferOverflow) => f.write_str("report exceeds endpoint size"),
            Error::Watchdog => f.write_str("watchdog configuration rejected"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_errors_lift_into_error() {
        assert_eq!(Error::from(UsbError::Disabled), Error::Usb(UsbError::Disabled));
        let e: Error = UsbError::BufferOverflow.into();
        assert_eq!(e, Error::Usb(UsbError::BufferOverflow));
    }

    #[test]
    fn display_names_the_failure() {
        assert_eq!(Error::Usb(UsbError::Disabled).to_string(), "interrupt endpoint disabled");
        assert_eq!(Error::ShortSetupPacket(3).to_string(), "setup packet of 3 bytes, need 8");
        assert_eq!(Error::KeyOutOfRange(9).to_string(), "logical key 9 out of range");
    }
}
