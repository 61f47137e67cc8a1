//! USB HID keyboard device on the nRF52840 USB peripheral.
//!
//! Initialises the Embassy USB stack and exposes one HID interface with a
//! single interrupt-IN endpoint.  The HID class is hand-built rather than
//! taken from `embassy_usb::class::hid` so that every class request reaches
//! the keyboard core as a raw setup packet, untouched.

use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, Ordering};

use crate::board::{SharedKeyboard, UsbDriver};
use defmt::{info, warn};
use embassy_nrf::usb::vbus_detect::HardwareVbusDetect;
use embassy_nrf::usb::Driver;
use embassy_nrf::{self, bind_interrupts, peripherals};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_usb::control::{InResponse, OutResponse, Recipient, Request, RequestType};
use embassy_usb::driver::{Direction, Endpoint, EndpointError, EndpointIn};
use embassy_usb::types::InterfaceNumber;
use embassy_usb::{Builder, Config, Handler, UsbDevice};
use hidkey::config::{
    self, REPORT_SIZE, USB_HID_POLL_MS, USB_MAX_PACKET_SIZE, USB_MAX_POWER_MA,
};
use hidkey::error::{Error, UsbError};
use hidkey::control::{self, ControlAnswer, RequestKind};
use hidkey::hid::descriptor::HID_DESCRIPTOR_TYPE;
use hidkey::hid::HID_DESCRIPTOR;
use hidkey::{ControlHandler, SetupRequest, UsbTransport};
use static_cell::StaticCell;

bind_interrupts!(struct Irqs {
    USBD => embassy_nrf::usb::InterruptHandler<peripherals::USBD>;
    CLOCK_POWER => embassy_nrf::usb::vbus_detect::InterruptHandler;
});

/// Interrupt-IN endpoint type of the nRF52840 driver.
pub type ReportEndpoint = <UsbDriver as embassy_usb::driver::Driver<'static>>::EndpointIn;

const USB_CLASS_HID: u8 = 0x03;

static CONTROL: StaticCell<KeyboardControl> = StaticCell::new();
static USB_CONFIG_DESC: StaticCell<[u8; 128]> = StaticCell::new();
static USB_BOS_DESC: StaticCell<[u8; 64]> = StaticCell::new();
static USB_MSOS_DESC: StaticCell<[u8; 64]> = StaticCell::new();
static USB_CTRL_BUF: StaticCell<[u8; 64]> = StaticCell::new();

/// Next report for the writer task.
static REPORT_SIGNAL: Signal<CriticalSectionRawMutex, [u8; REPORT_SIZE]> = Signal::new();
/// Set on submit, cleared once the host has collected the report.
static IN_FLIGHT: AtomicBool = AtomicBool::new(false);

/// Build result containing the USB device runner and the report endpoint.
pub struct UsbHidDevice {
    pub device: UsbDevice<'static, UsbDriver>,
    pub endpoint: ReportEndpoint,
}

/// Initialise the USB stack and create the HID keyboard interface.
///
/// Must be called exactly once.  All static buffers are consumed here.
pub fn init(usbd: peripherals::USBD, keyboard: &'static SharedKeyboard) -> UsbHidDevice {
    // Create the low-level USB driver with hardware VBUS detection.
    let driver = Driver::new(usbd, Irqs, HardwareVbusDetect::new(Irqs));

    // USB device-level configuration.
    let mut usb_config = Config::new(config::USB_VID, config::USB_PID);
    usb_config.manufacturer = Some(config::USB_MANUFACTURER);
    usb_config.product = Some(config::USB_PRODUCT);
    usb_config.serial_number = Some(config::USB_SERIAL_NUMBER);
    usb_config.max_power = USB_MAX_POWER_MA;
    usb_config.max_packet_size_0 = USB_MAX_PACKET_SIZE;

    // Allocate static descriptor buffers.
    let config_desc = USB_CONFIG_DESC.init([0u8; 128]);
    let bos_desc = USB_BOS_DESC.init([0u8; 64]);
    let msos_desc = USB_MSOS_DESC.init([0u8; 64]);
    let ctrl_buf = USB_CTRL_BUF.init([0u8; 64]);

    // Build the USB device.
    let mut builder = Builder::new(
        driver,
        usb_config,
        config_desc,
        bos_desc,
        msos_desc,
        ctrl_buf,
    );

    // HID interface: no boot subclass, the 2-byte report is not boot layout.
    let mut func = builder.function(USB_CLASS_HID, 0x00, 0x00);
    let mut iface = func.interface();
    let interface = iface.interface_number();
    let mut alt = iface.alt_setting(USB_CLASS_HID, 0x00, 0x00, None);
    // bLength and bDescriptorType are written by the builder.
    alt.descriptor(HID_DESCRIPTOR_TYPE, &HID_DESCRIPTOR[2..]);
    let endpoint = alt.endpoint_interrupt_in(u16::from(USB_MAX_PACKET_SIZE), USB_HID_POLL_MS);
    drop(func);

    let control = CONTROL.init(KeyboardControl {
        keyboard,
        interface,
    });
    builder.handler(control);

    let device = builder.build();

    info!("USB HID keyboard initialised (interface {})", u8::from(interface));

    UsbHidDevice { device, endpoint }
}

/// Run the USB device stack - must be spawned as a dedicated Embassy task.
///
/// This handles USB enumeration, suspend/resume, and control transfers.
/// It runs forever (or until the USB cable is disconnected).
pub async fn run_usb_device(mut device: UsbDevice<'static, UsbDriver>) -> ! {
    info!("USB device task started");
    device.run().await
}

/// Report writer task - waits for a submitted report and pushes it out the
/// interrupt-IN endpoint, then frees the slot.
///
/// A report that hits a disabled endpoint (bus reset, not yet configured)
/// is held and resent once the host enables the endpoint again.
pub async fn report_writer_task(mut endpoint: ReportEndpoint) -> ! {
    info!("HID report writer started - waiting for reports");

    loop {
        let report = REPORT_SIGNAL.wait().await;

        loop {
            endpoint.wait_enabled().await;
            match endpoint.write(&report).await.map_err(usb_error) {
                Ok(()) => break,
                Err(Error::Usb(UsbError::Disabled)) => {
                    warn!("USB keyboard endpoint disabled, holding report");
                }
                Err(e) => {
                    warn!("USB keyboard write failed: {}", e);
                    break;
                }
            }
        }

        IN_FLIGHT.store(false, Ordering::Release);
    }
}

fn usb_error(e: EndpointError) -> Error {
    match e {
        EndpointError::Disabled => UsbError::Disabled.into(),
        EndpointError::BufferOverflow => UsbError::BufferOverflow.into(),
    }
}

/// Interrupt-IN side of the transport contract.
///
/// Bus servicing and setup packets are handled by the USB device task and
/// [`KeyboardControl`], so `poll` has nothing to do here.
pub struct InterruptSlot;

impl UsbTransport for InterruptSlot {
    fn poll<H: ControlHandler>(&mut self, _control: &mut H) {}

    fn interrupt_ready(&self) -> bool {
        !IN_FLIGHT.load(Ordering::Acquire)
    }

    fn submit_interrupt(&mut self, report: &[u8]) {
        let mut buf = [0u8; REPORT_SIZE];
        let n = report.len().min(REPORT_SIZE);
        buf[..n].copy_from_slice(&report[..n]);
        IN_FLIGHT.store(true, Ordering::Release);
        REPORT_SIGNAL.signal(buf);
    }
}

/// Routes control requests into the keyboard core.
///
/// Runs inside the USB device task's control pipe: it only takes the
/// keyboard lock for the duration of one request.
struct KeyboardControl {
    keyboard: &'static SharedKeyboard,
    interface: InterfaceNumber,
}

impl KeyboardControl {
    /// Answer `req` and copy any data into `buf`.  `None` leaves the
    /// request to embassy-usb, `Some(None)` rejects it.
    fn dispatch(&self, req: &Request, buf: &mut [u8]) -> Option<Option<usize>> {
        let setup = setup_request(req);
        let interface = u8::from(self.interface);
        self.keyboard.lock(|cell: &RefCell<_>| {
            let mut keyboard = cell.borrow_mut();
            match control::answer(&mut *keyboard, &setup, interface) {
                ControlAnswer::Accept(data) => {
                    let n = data.len().min(buf.len());
                    buf[..n].copy_from_slice(&data[..n]);
                    Some(Some(n))
                }
                ControlAnswer::Reject => Some(None),
                ControlAnswer::Pass => None,
            }
        })
    }
}

impl Handler for KeyboardControl {
    fn reset(&mut self) {
        info!("USB bus reset");
    }

    fn configured(&mut self, configured: bool) {
        if configured {
            info!("USB device configured");
        } else {
            info!("USB device deconfigured");
        }
    }

    fn control_out(&mut self, req: Request, _data: &[u8]) -> Option<OutResponse> {
        // SET_IDLE and friends carry everything in the setup packet.
        match self.dispatch(&req, &mut [])? {
            Some(_) => Some(OutResponse::Accepted),
            None => Some(OutResponse::Rejected),
        }
    }

    fn control_in<'a>(&'a mut self, req: Request, buf: &'a mut [u8]) -> Option<InResponse<'a>> {
        match self.dispatch(&req, buf)? {
            Some(n) => Some(InResponse::Accepted(&buf[..n])),
            None => Some(InResponse::Rejected),
        }
    }
}

/// Rebuild the raw setup packet from embassy's parsed request.
fn setup_request(req: &Request) -> SetupRequest {
    let kind = match req.request_type {
        RequestType::Standard => RequestKind::Standard,
        RequestType::Class => RequestKind::Class,
        RequestType::Vendor => RequestKind::Vendor,
        RequestType::Reserved => RequestKind::Reserved,
    };
    let recipient = match req.recipient {
        Recipient::Device => 0,
        Recipient::Interface => SetupRequest::RECIPIENT_INTERFACE,
        Recipient::Endpoint => 2,
        Recipient::Other => 3,
        Recipient::Reserved => SetupRequest::RECIPIENT_MASK,
    };

    SetupRequest::new(
        req.direction == Direction::In,
        kind,
        recipient,
        req.request,
        req.value,
        req.index,
        req.length,
    )
}
