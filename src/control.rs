//! USB setup packets and the HID-class control-request contract.
//!
//! The transport hands every setup packet it does not service itself to a
//! [`ControlHandler`] and transmits whatever the handler points it at.
//! Handlers run in the transport's request path: they must not block,
//! allocate, or loop unboundedly.

use crate::error::Error;
use crate::hid::descriptor::{HID_DESCRIPTOR_TYPE, REPORT_DESCRIPTOR_TYPE};
use crate::hid::{HID_DESCRIPTOR, REPORT_DESCRIPTOR};

/// Length of a USB setup packet.
pub const SETUP_PACKET_LEN: usize = 8;

/// Standard GET_DESCRIPTOR request code.
pub const GET_DESCRIPTOR: u8 = 0x06;

/// HID class request codes (HID 1.11, §7.2).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum HidRequest {
    GetReport = 0x01,
    GetIdle = 0x02,
    GetProtocol = 0x03,
    SetReport = 0x09,
    SetIdle = 0x0A,
    SetProtocol = 0x0B,
}

impl HidRequest {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x01 => Some(HidRequest::GetReport),
            0x02 => Some(HidRequest::GetIdle),
            0x03 => Some(HidRequest::GetProtocol),
            0x09 => Some(HidRequest::SetReport),
            0x0A => Some(HidRequest::SetIdle),
            0x0B => Some(HidRequest::SetProtocol),
            _ => None,
        }
    }
}

/// bmRequestType bits 5..6.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RequestKind {
    Standard,
    Class,
    Vendor,
    Reserved,
}

impl RequestKind {
    /// The two-bit type field, unshifted.
    pub const fn bits(self) -> u8 {
        match self {
            RequestKind::Standard => 0,
            RequestKind::Class => 1,
            RequestKind::Vendor => 2,
            RequestKind::Reserved => 3,
        }
    }
}

/// A parsed setup packet.  Read-only input; never retained.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SetupRequest {
    /// bmRequestType
    pub request_type: u8,
    /// bRequest
    pub request: u8,
    /// wValue
    pub value: u16,
    /// wIndex
    pub index: u16,
    /// wLength
    pub length: u16,
}

impl SetupRequest {
    pub const DIR_IN: u8 = 0x80;
    pub const TYPE_CLASS: u8 = 0x20;
    pub const RECIPIENT_INTERFACE: u8 = 0x01;
    pub const RECIPIENT_MASK: u8 = 0x1F;

    /// Parse the 8-byte little-endian setup packet.  Extra bytes are ignored.
    pub fn parse(packet: &[u8]) -> Result<Self, Error> {
        if packet.len() < SETUP_PACKET_LEN {
            return Err(Error::ShortSetupPacket(packet.len()));
        }
        Ok(Self {
            request_type: packet[0],
            request: packet[1],
            value: u16::from_le_bytes([packet[2], packet[3]]),
            index: u16::from_le_bytes([packet[4], packet[5]]),
            length: u16::from_le_bytes([packet[6], packet[7]]),
        })
    }

    /// Assemble bmRequestType from its decoded fields.
    pub const fn new(
        direction_in: bool,
        kind: RequestKind,
        recipient: u8,
        request: u8,
        value: u16,
        index: u16,
        length: u16,
    ) -> Self {
        let dir = if direction_in { Self::DIR_IN } else { 0 };
        Self {
            request_type: dir | (kind.bits() << 5) | (recipient & Self::RECIPIENT_MASK),
            request,
            value,
            index,
            length,
        }
    }

    /// A class request to interface `interface`.
    pub const fn class(direction_in: bool, request: HidRequest, value: u16, interface: u16, length: u16) -> Self {
        Self::new(
            direction_in,
            RequestKind::Class,
            Self::RECIPIENT_INTERFACE,
            request as u8,
            value,
            interface,
            length,
        )
    }

    pub const fn kind(&self) -> RequestKind {
        match (self.request_type >> 5) & 0x03 {
            0 => RequestKind::Standard,
            1 => RequestKind::Class,
            2 => RequestKind::Vendor,
            _ => RequestKind::Reserved,
        }
    }

    /// bmRequestType bits 0..4.
    pub const fn recipient(&self) -> u8 {
        self.request_type & Self::RECIPIENT_MASK
    }

    /// Addressed to interface number `interface`?
    pub const fn is_for_interface(&self, interface: u8) -> bool {
        self.recipient() == Self::RECIPIENT_INTERFACE && self.index == interface as u16
    }

    pub const fn is_device_to_host(&self) -> bool {
        self.request_type & Self::DIR_IN != 0
    }

    pub const fn value_high(&self) -> u8 {
        (self.value >> 8) as u8
    }

    pub const fn value_low(&self) -> u8 {
        (self.value & 0xFF) as u8
    }

    /// The HID request this packet carries, if it is a known class request.
    pub fn hid_request(&self) -> Option<HidRequest> {
        match self.kind() {
            RequestKind::Class => HidRequest::from_code(self.request),
            _ => None,
        }
    }
}

/// What the transport should send back in the data stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlResponse<'a> {
    /// Transmit these bytes (the transport truncates to wLength).
    Data(&'a [u8]),
    /// Zero-length response.
    NoData,
}

impl<'a> ControlResponse<'a> {
    pub fn len(&self) -> usize {
        match self {
            ControlResponse::Data(data) => data.len(),
            ControlResponse::NoData => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The bytes to send once clipped to the host's wLength.
    pub fn clipped(&self, length: u16) -> &'a [u8] {
        match *self {
            ControlResponse::Data(data) => &data[..data.len().min(usize::from(length))],
            ControlResponse::NoData => &[],
        }
    }
}

/// Receives setup packets from the transport.
pub trait ControlHandler {
    fn setup(&mut self, request: &SetupRequest) -> ControlResponse<'_>;
}

/// What a USB stack with its own standard-request handling should do with
/// a setup packet offered to the HID interface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlAnswer<'a> {
    /// Complete the transfer with these bytes, already clipped to wLength.
    /// Empty means a zero-length data stage.
    Accept(&'a [u8]),
    /// STALL.
    Reject,
    /// Not addressed to this interface; the stack decides.
    Pass,
}

/// Answer `request` for the HID interface numbered `interface`.
///
/// Vendor and reserved-type requests are answered whatever their recipient,
/// so the host always gets at least a zero-length response.  Class requests
/// must target `interface`.  Of the standard requests only the interface
/// GET_DESCRIPTOR for the HID and report descriptors is served here.
pub fn answer<'a, H: ControlHandler + ?Sized>(
    handler: &'a mut H,
    request: &SetupRequest,
    interface: u8,
) -> ControlAnswer<'a> {
    let kind = request.kind();
    if matches!(kind, RequestKind::Vendor | RequestKind::Reserved) {
        return ControlAnswer::Accept(handler.setup(request).clipped(request.length));
    }
    if !request.is_for_interface(interface) {
        return ControlAnswer::Pass;
    }

    match kind {
        RequestKind::Class => ControlAnswer::Accept(handler.setup(request).clipped(request.length)),
        _ if request.request == GET_DESCRIPTOR && request.is_device_to_host() => {
            let descriptor: &'static [u8] = match request.value_high() {
                HID_DESCRIPTOR_TYPE => &HID_DESCRIPTOR,
                REPORT_DESCRIPTOR_TYPE => &REPORT_DESCRIPTOR,
                other => {
                    debug!("unknown HID descriptor type {:#x}", other);
                    return ControlAnswer::Reject;
                }
            };
            ControlAnswer::Accept(ControlResponse::Data(descriptor).clipped(request.length))
        }
        _ => ControlAnswer::Pass,
    }
}
