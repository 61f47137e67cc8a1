//! Unit tests for the key table, report serialization, and descriptors.
//!
//! These tests run on the host (not embedded) and check that the report
//! layout and the descriptor stay in lockstep.

use super::descriptor::{ReportLayout, HID_DESCRIPTOR, REPORT_DESCRIPTOR};
use super::report::{encode, usage, HidReport, KEY_REPORT_TABLE};
use crate::config::{KEY_COUNT, REPORT_SIZE};
use crate::keys::LogicalKey;

// ═══════════════════════════════════════════════════════════════════════════
// Report Encoder Tests
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn encode_none_is_empty_report() {
    let report = encode(LogicalKey::NONE);
    assert!(report.is_empty());
    assert_eq!(report.to_bytes(), [0x00, 0x00]);
}

#[test]
fn encode_line_zero_is_key_a() {
    let key = LogicalKey::from_raw_lines(0b1111_1110);
    assert_eq!(
        encode(key),
        HidReport {
            modifier: 0,
            keycode: usage::KEY_A,
        }
    );
}

#[test]
fn encode_maps_every_key_in_order() {
    let expected = [
        usage::KEY_NONE,
        usage::KEY_A,
        usage::KEY_B,
        usage::KEY_C,
        usage::KEY_D,
        usage::KEY_E,
        usage::KEY_F,
        usage::KEY_G,
        usage::KEY_H,
    ];
    for (index, keycode) in (0..=KEY_COUNT).zip(expected) {
        let key = LogicalKey::try_from(index).unwrap();
        assert_eq!(encode(key).to_bytes(), [0x00, keycode]);
    }
}

#[test]
fn encode_is_pure() {
    for index in 0..=KEY_COUNT {
        let key = LogicalKey::try_from(index).unwrap();
        assert_eq!(encode(key).to_bytes(), encode(key).to_bytes());
    }
}

#[test]
fn table_never_sets_modifiers() {
    assert!(KEY_REPORT_TABLE.iter().all(|r| r.modifier == 0));
    assert_eq!(KEY_REPORT_TABLE.len(), usize::from(KEY_COUNT) + 1);
}

#[test]
fn report_serialize_writes_two_bytes() {
    let report = encode(LogicalKey::try_from(4).unwrap());
    let mut buf = [0xAAu8; 4];
    assert_eq!(report.serialize(&mut buf), REPORT_SIZE);
    assert_eq!(buf, [0x00, usage::KEY_D, 0xAA, 0xAA]);
}

#[test]
fn report_serialize_buffer_too_small() {
    let report = HidReport::empty();
    let mut small_buf = [0u8; 1];
    assert_eq!(report.serialize(&mut small_buf), 0); // Should fail gracefully
}

// ═══════════════════════════════════════════════════════════════════════════
// Descriptor Tests
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn report_descriptor_is_35_bytes() {
    assert_eq!(REPORT_DESCRIPTOR.len(), 35);
    assert_eq!(REPORT_DESCRIPTOR[0..4], [0x05, 0x01, 0x09, 0x06]);
    assert_eq!(REPORT_DESCRIPTOR[34], 0xC0);
}

#[test]
fn descriptor_matches_report_size() {
    let layout = ReportLayout::parse(&REPORT_DESCRIPTOR).unwrap();
    assert!(layout.is_keyboard);
    assert_eq!(layout.input_bits, 16);
    assert_eq!(layout.input_len(), REPORT_SIZE);
}

#[test]
fn descriptor_covers_every_table_keycode() {
    let layout = ReportLayout::parse(&REPORT_DESCRIPTOR).unwrap();
    let max = layout.keycode_max.unwrap();
    assert_eq!(max, 101);
    assert!(KEY_REPORT_TABLE
        .iter()
        .all(|r| u32::from(r.keycode) <= max));
}

#[test]
fn hid_descriptor_points_at_report_descriptor() {
    assert_eq!(HID_DESCRIPTOR[0] as usize, HID_DESCRIPTOR.len());
    assert_eq!(HID_DESCRIPTOR[1], 0x21);
    assert_eq!(HID_DESCRIPTOR[6], 0x22);
    let len = u16::from_le_bytes([HID_DESCRIPTOR[7], HID_DESCRIPTOR[8]]);
    assert_eq!(usize::from(len), REPORT_DESCRIPTOR.len());
}

#[test]
fn layout_rejects_truncated_item() {
    // Report Count item missing its data byte.
    assert!(ReportLayout::parse(&[0x05, 0x01, 0x95]).is_none());
}

#[test]
fn layout_rejects_oversized_fields() {
    // Report Size 0xFFFF x Report Count 2 overflows the bit total.
    assert!(ReportLayout::parse(&[0x76, 0xFF, 0xFF, 0x95, 0x02, 0x81, 0x02]).is_none());
    // Report Count 0x10000 does not fit in 16 bits.
    assert!(ReportLayout::parse(&[0x75, 0x01, 0x97, 0x00, 0x00, 0x01, 0x00]).is_none());
    // Report Size 0x10000 does not fit either.
    assert!(ReportLayout::parse(&[0x77, 0x00, 0x00, 0x01, 0x00]).is_none());
}

#[test]
fn layout_rejects_input_total_overflow() {
    // Two 32768-bit Input items: each fits, the sum does not.
    let desc = [0x76, 0x00, 0x80, 0x95, 0x01, 0x81, 0x02, 0x81, 0x02];
    assert!(ReportLayout::parse(&desc).is_none());
    assert_eq!(ReportLayout::parse(&desc[..7]).map(|l| l.input_bits), Some(0x8000));
}

#[test]
fn layout_of_wider_report() {
    // Modifier byte + 6-key array, no LEDs.
    let desc = [
        0x05, 0x01, 0x09, 0x06, 0xA1, 0x01, //
        0x05, 0x07, 0x75, 0x01, 0x95, 0x08, 0x81, 0x02, //
        0x95, 0x06, 0x75, 0x08, 0x26, 0xFF, 0x00, 0x81, 0x00, //
        0xC0,
    ];
    let layout = ReportLayout::parse(&desc).unwrap();
    assert_eq!(layout.input_len(), 7);
    assert_eq!(layout.keycode_max, Some(0xFF));
}
