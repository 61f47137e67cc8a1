//! HID report descriptor, HID class descriptor, and a layout checker.
//!
//! The report descriptor declares exactly the 2-byte [`HidReport`]:
//! eight 1-bit modifier inputs followed by one 8-bit keycode array
//! (usages 0..=101).  Any change to the key table or report shape must
//! be mirrored here; [`ReportLayout::parse`] lets the tests enforce it.
//!
//! ## HID Report Descriptor Structure
//!
//! A Report Descriptor is a sequence of short items.  Each item starts
//! with a prefix byte:
//! - bits 0-1: data size (0, 1, 2 or 4 bytes)
//! - bits 2-3: item type (Main, Global, Local)
//! - bits 4-7: tag
//!
//! [`HidReport`]: super::report::HidReport

/// Descriptor type of the HID class descriptor.
pub const HID_DESCRIPTOR_TYPE: u8 = 0x21;

/// Descriptor type of the report descriptor.
pub const REPORT_DESCRIPTOR_TYPE: u8 = 0x22;

/// USB HID Report Descriptor for the single-key keyboard.
pub const REPORT_DESCRIPTOR: [u8; 35] = [
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x06, // Usage (Keyboard)
    0xA1, 0x01, // Collection (Application)
    //
    //   - Modifier keys (8 bits) -
    0x05, 0x07, //   Usage Page (Keyboard/Keypad)
    0x19, 0xE0, //   Usage Minimum (Left Control)
    0x29, 0xE7, //   Usage Maximum (Right GUI)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x01, //   Logical Maximum (1)
    0x75, 0x01, //   Report Size (1)
    0x95, 0x08, //   Report Count (8)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    //
    //   - Key code (1 byte) -
    0x95, 0x01, //   Report Count (1)
    0x75, 0x08, //   Report Size (8)
    0x25, 0x65, //   Logical Maximum (101)
    0x19, 0x00, //   Usage Minimum (Reserved, no event)
    0x29, 0x65, //   Usage Maximum (Keyboard Application)
    0x81, 0x00, //   Input (Data, Array, Absolute)
    //
    0xC0, // End Collection
];

/// HID class descriptor (bLength through wDescriptorLength), placed in
/// the configuration descriptor right after the interface descriptor.
pub const HID_DESCRIPTOR: [u8; 9] = [
    0x09,                                  // bLength
    HID_DESCRIPTOR_TYPE,                   // bDescriptorType (HID)
    0x01,                                  // bcdHID 1.01 (LSB)
    0x01,                                  // bcdHID 1.01 (MSB)
    0x00,                                  // bCountryCode (not localized)
    0x01,                                  // bNumDescriptors
    REPORT_DESCRIPTOR_TYPE,                // bDescriptorType (Report)
    (REPORT_DESCRIPTOR.len() & 0xFF) as u8, // wDescriptorLength (LSB)
    (REPORT_DESCRIPTOR.len() >> 8) as u8,  // wDescriptorLength (MSB)
];

/// What the input side of a report descriptor adds up to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReportLayout {
    /// Total bits across all Input items.
    pub input_bits: u16,
    /// Logical Maximum in force at the last array-style Input item
    /// (the keycode field), if any.
    pub keycode_max: Option<u32>,
    /// Does the descriptor open with the Generic Desktop / Keyboard usage?
    pub is_keyboard: bool,
}

impl ReportLayout {
    /// Walk a report descriptor's short items.
    ///
    /// Returns `None` if an item runs past the end of `data`, or if Report
    /// Size, Report Count or the input bit total does not fit in 16 bits.
    /// Long items, Push/Pop, and report IDs are not used by this device and
    /// are treated as opaque.
    pub fn parse(data: &[u8]) -> Option<Self> {
        let mut layout = ReportLayout {
            input_bits: 0,
            keycode_max: None,
            is_keyboard: false,
        };

        // Parser state.
        let mut usage_page: u32 = 0;
        let mut logical_max: u32 = 0;
        let mut report_size: u16 = 0;
        let mut report_count: u16 = 0;

        let mut i = 0;
        while i < data.len() {
            let prefix = data[i];
            let tag = (prefix >> 4) & 0x0F;
            let item_type = (prefix >> 2) & 0x03;
            let size = match prefix & 0x03 {
                3 => 4,
                n => usize::from(n),
            };

            if i + 1 + size > data.len() {
                return None;
            }

            let value: u32 = match size {
                0 => 0,
                1 => u32::from(data[i + 1]),
                2 => u32::from(u16::from_le_bytes([data[i + 1], data[i + 2]])),
                _ => u32::from_le_bytes([data[i + 1], data[i + 2], data[i + 3], data[i + 4]]),
            };

            match item_type {
                // Main items
                0 => {
                    // Input
                    if tag == 0x08 {
                        layout.input_bits = report_size
                            .checked_mul(report_count)
                            .and_then(|bits| layout.input_bits.checked_add(bits))?;
                        let is_array = value & 0x02 == 0;
                        if is_array {
                            layout.keycode_max = Some(logical_max);
                        }
                    }
                }
                // Global items
                1 => match tag {
                    // Usage Page
                    0x00 => usage_page = value,
                    // Logical Maximum
                    0x02 => logical_max = value,
                    // Report Size
                    0x07 => report_size = u16::try_from(value).ok()?,
                    // Report Count
                    0x09 => report_count = u16::try_from(value).ok()?,
                    _ => {}
                },
                // Local items
                2 => {
                    // Usage (Keyboard) on the Generic Desktop page
                    if tag == 0x00 && usage_page == 0x01 && value == 0x06 {
                        layout.is_keyboard = true;
                    }
                }
                _ => {}
            }

            i += 1 + size;
        }

        Some(layout)
    }

    /// Input report length in whole bytes.
    pub fn input_len(&self) -> usize {
        usize::from(self.input_bits).div_ceil(8)
    }
}
