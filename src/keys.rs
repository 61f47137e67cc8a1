//! Key sampler - reduces the raw key-line bitmask to one logical key.
//!
//! Lines are active-low (internal pull-ups): a line reads `0` while its
//! key is held.  When several lines are asserted at once the lowest
//! line wins, so the device only ever reports one key.

use crate::config::{KEY_COUNT, KEY_LINES};
use crate::error::Error;
use embedded_hal::digital::InputPin;

/// Bitmask read when every line is released.
pub const ALL_RELEASED: u8 = 0xFF;

/// A single logical key: `0` = none, `1..=KEY_COUNT` = line index + 1.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LogicalKey(u8);

impl LogicalKey {
    /// No key pressed.
    pub const NONE: Self = Self(0);

    /// Key for a 0-based line index, if that line exists.
    pub const fn from_line(line: usize) -> Option<Self> {
        if line < KEY_LINES {
            Some(Self(line as u8 + 1))
        } else {
            None
        }
    }

    /// Reduce a raw bitmask: 1-based index of the lowest asserted line,
    /// or [`LogicalKey::NONE`].
    pub fn from_raw_lines(raw: u8) -> Self {
        (0..KEY_LINES)
            .find(|&line| raw & (1 << line) == 0)
            .map_or(Self::NONE, |line| Self(line as u8 + 1))
    }

    pub const fn index(self) -> u8 {
        self.0
    }

    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl TryFrom<u8> for LogicalKey {
    type Error = Error;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        if index <= KEY_COUNT {
            Ok(Self(index))
        } else {
            Err(Error::KeyOutOfRange(index))
        }
    }
}

impl From<LogicalKey> for u8 {
    fn from(key: LogicalKey) -> Self {
        key.0
    }
}

/// Source of the raw key-line bitmask (bit n = line n, 0 = pressed).
pub trait KeyLines {
    fn read_raw(&mut self) -> u8;
}

/// Sample the lines once.  No debouncing: the main loop re-samples on
/// every iteration and only the latest value is ever reported.
pub fn sample<L: KeyLines + ?Sized>(lines: &mut L) -> LogicalKey {
    LogicalKey::from_raw_lines(lines.read_raw())
}

/// Key lines backed by `embedded-hal` input pins; pin n drives bit n.
///
/// Bits past `N` and pins whose read fails report as released.
pub struct KeyPins<P, const N: usize> {
    pins: [P; N],
}

impl<P: InputPin, const N: usize> KeyPins<P, N> {
    const FITS_BITMASK: () = assert!(N <= KEY_LINES, "more pins than key lines");

    pub fn new(pins: [P; N]) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::FITS_BITMASK;
        Self { pins }
    }
}

impl<P: InputPin, const N: usize> KeyLines for KeyPins<P, N> {
    fn read_raw(&mut self) -> u8 {
        let mut raw = ALL_RELEASED;
        for (line, pin) in self.pins.iter_mut().enumerate() {
            match pin.is_low() {
                Ok(true) => raw &= !(1 << line),
                Ok(false) => {}
                Err(_) => warn!("key line {} read failed", line),
            }
        }
        raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal::digital::{ErrorKind, ErrorType};

    struct Raw(u8);

    impl KeyLines for Raw {
        fn read_raw(&mut self) -> u8 {
            self.0
        }
    }

    #[test]
    fn no_line_asserted_is_none() {
        assert_eq!(sample(&mut Raw(0b1111_1111)), LogicalKey::NONE);
        assert!(sample(&mut Raw(ALL_RELEASED)).is_none());
    }

    #[test]
    fn line_zero_is_key_one() {
        assert_eq!(sample(&mut Raw(0b1111_1110)).index(), 1);
    }

    #[test]
    fn each_single_line_maps_to_its_index() {
        for line in 0..KEY_LINES {
            let raw = !(1u8 << line);
            assert_eq!(sample(&mut Raw(raw)).index(), line as u8 + 1);
        }
    }

    #[test]
    fn lowest_asserted_line_wins() {
        // Lines 2, 5 and 7 low.
        assert_eq!(sample(&mut Raw(0b0101_1011)).index(), 3);
        // Every line low.
        assert_eq!(sample(&mut Raw(0x00)).index(), 1);
        // Only the two highest lines low.
        assert_eq!(sample(&mut Raw(0b0011_1111)).index(), 7);
    }

    #[test]
    fn exhaustive_priority() {
        for raw in 0..=u8::MAX {
            let expected = if raw == ALL_RELEASED {
                0
            } else {
                raw.trailing_ones() as u8 + 1
            };
            assert_eq!(LogicalKey::from_raw_lines(raw).index(), expected, "raw {raw:#010b}");
        }
    }

    #[test]
    fn try_from_rejects_out_of_range() {
        assert_eq!(LogicalKey::try_from(0), Ok(LogicalKey::NONE));
        assert_eq!(LogicalKey::try_from(KEY_COUNT).map(u8::from), Ok(KEY_COUNT));
        assert_eq!(
            LogicalKey::try_from(KEY_COUNT + 1),
            Err(Error::KeyOutOfRange(KEY_COUNT + 1))
        );
    }

    #[test]
    fn from_line_bounds() {
        assert_eq!(LogicalKey::from_line(0).map(LogicalKey::index), Some(1));
        assert_eq!(LogicalKey::from_line(KEY_LINES - 1).map(LogicalKey::index), Some(8));
        assert_eq!(LogicalKey::from_line(KEY_LINES), None);
    }

    struct Pin(bool);

    impl ErrorType for Pin {
        type Error = Infallible;
    }

    impl InputPin for Pin {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            Ok(self.0)
        }

        fn is_low(&mut self) -> Result<bool, Self::Error> {
            Ok(!self.0)
        }
    }

    struct BrokenPin;

    impl ErrorType for BrokenPin {
        type Error = ErrorKind;
    }

    impl InputPin for BrokenPin {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            Err(ErrorKind::Other)
        }

        fn is_low(&mut self) -> Result<bool, Self::Error> {
            Err(ErrorKind::Other)
        }
    }

    #[test]
    fn key_pins_build_active_low_mask() {
        let mut pins = KeyPins::new([Pin(true), Pin(true), Pin(false), Pin(true)]);
        assert_eq!(pins.read_raw(), 0b1111_1011);
        assert_eq!(sample(&mut pins).index(), 3);
    }

    #[test]
    fn key_pins_missing_lines_read_released() {
        let mut pins = KeyPins::new([Pin(true), Pin(true)]);
        assert_eq!(pins.read_raw(), ALL_RELEASED);
        assert!(sample(&mut pins).is_none());
    }

    #[test]
    fn key_pins_read_error_counts_as_released() {
        let mut pins = KeyPins::new([BrokenPin, BrokenPin]);
        assert_eq!(pins.read_raw(), ALL_RELEASED);
    }
}
