//! USB HID keyboard report and the logical-key → report table.
//!
//! Layout (2 bytes):
//! ```text
//! Byte 0: Modifier keys (bitfield) - always 0, no modifiers on this keymap
//! Byte 1: Key code (USB HID keyboard usage ID, 0 = no key)
//! ```

use crate::config::{KEY_COUNT, REPORT_SIZE};
use crate::keys::LogicalKey;

/// Keyboard/Keypad page usage IDs used by the key table.
pub mod usage {
    pub const KEY_NONE: u8 = 0x00;
    pub const KEY_A: u8 = 0x04;
    pub const KEY_B: u8 = 0x05;
    pub const KEY_C: u8 = 0x06;
    pub const KEY_D: u8 = 0x07;
    pub const KEY_E: u8 = 0x08;
    pub const KEY_F: u8 = 0x09;
    pub const KEY_G: u8 = 0x0A;
    pub const KEY_H: u8 = 0x0B;
}

/// The 2-byte input report described by `REPORT_DESCRIPTOR`.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HidReport {
    /// Modifier key bitfield.
    pub modifier: u8,
    /// Pressed key's usage ID, or 0.
    pub keycode: u8,
}

impl HidReport {
    /// The all-keys-released report.
    pub const fn empty() -> Self {
        Self {
            modifier: 0,
            keycode: usage::KEY_NONE,
        }
    }

    const fn key(keycode: u8) -> Self {
        Self {
            modifier: 0,
            keycode,
        }
    }

    pub const fn to_bytes(self) -> [u8; REPORT_SIZE] {
        [self.modifier, self.keycode]
    }

    /// Serialise into a byte slice for USB HID transmission.
    /// Returns the number of bytes written (always 2), or 0 if `buf` is
    /// too small.
    pub fn serialize(&self, buf: &mut [u8]) -> usize {
        if buf.len() < REPORT_SIZE {
            return 0;
        }
        buf[..REPORT_SIZE].copy_from_slice(&self.to_bytes());
        REPORT_SIZE
    }

    pub fn is_empty(&self) -> bool {
        self.modifier == 0 && self.keycode == usage::KEY_NONE
    }
}

/// Logical key → report, indexed by `LogicalKey::index()`.
pub static KEY_REPORT_TABLE: [HidReport; KEY_COUNT as usize + 1] = [
    HidReport::empty(),
    HidReport::key(usage::KEY_A),
    HidReport::key(usage::KEY_B),
    HidReport::key(usage::KEY_C),
    HidReport::key(usage::KEY_D),
    HidReport::key(usage::KEY_E),
    HidReport::key(usage::KEY_F),
    HidReport::key(usage::KEY_G),
    HidReport::key(usage::KEY_H),
];

/// Look up the report for `key`.
///
/// `LogicalKey` cannot hold an index past `KEY_COUNT`, so the lookup
/// never misses.
pub fn encode(key: LogicalKey) -> HidReport {
    KEY_REPORT_TABLE[usize::from(key.index())]
}
