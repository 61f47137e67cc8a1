//! HID report types, key table, and descriptors.

pub mod descriptor;
pub mod report;

#[cfg(test)]
mod tests;

pub use descriptor::{ReportLayout, HID_DESCRIPTOR, REPORT_DESCRIPTOR};
pub use report::{encode, HidReport, KEY_REPORT_TABLE};
