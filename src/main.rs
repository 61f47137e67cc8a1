//! hidkey firmware entry point.
//!
//! Brings up the clocks, watchdog, key lines and USB stack, then runs the
//! keyboard main loop.  The USB device and the report writer run as their
//! own tasks; the main loop never blocks and yields to them between
//! iterations.

#![no_std]
#![no_main]

mod board;
mod usb;

use core::cell::RefCell;

use board::{HardwareWatchdog, KeyLinePins, PeriodicTick, SharedKeyboard};
use defmt::{info, unwrap};
use embassy_executor::Spawner;
use embassy_nrf::config::{Config, HfclkSource};
use embassy_sync::blocking_mutex::Mutex;
use hidkey::{Keyboard, Watchdog};
use static_cell::StaticCell;
use usb::hid_device::{self, InterruptSlot, ReportEndpoint};
use {defmt_rtt as _, panic_probe as _};

static KEYBOARD: StaticCell<SharedKeyboard> = StaticCell::new();

#[embassy_executor::task]
async fn usb_task(device: embassy_usb::UsbDevice<'static, board::UsbDriver>) -> ! {
    hid_device::run_usb_device(device).await
}

#[embassy_executor::task]
async fn report_task(endpoint: ReportEndpoint) -> ! {
    hid_device::report_writer_task(endpoint).await
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("hidkey starting");

    // USB needs the crystal oscillator.
    let mut config = Config::default();
    config.hfclk_source = HfclkSource::ExternalXtal;
    let p = embassy_nrf::init(config);

    let mut watchdog = unwrap!(HardwareWatchdog::start(p.WDT));

    let keys = board::key_lines(KeyLinePins {
        p1_01: p.P1_01,
        p1_02: p.P1_02,
        p1_03: p.P1_03,
        p1_04: p.P1_04,
        p1_05: p.P1_05,
        p1_06: p.P1_06,
        p1_07: p.P1_07,
        p1_08: p.P1_08,
    });
    let keyboard: &'static SharedKeyboard =
        KEYBOARD.init(Mutex::new(RefCell::new(Keyboard::new(keys))));

    let hid = hid_device::init(p.USBD, keyboard);
    unwrap!(spawner.spawn(usb_task(hid.device)));
    unwrap!(spawner.spawn(report_task(hid.endpoint)));

    let mut tick = PeriodicTick::new();
    let mut slot = InterruptSlot;

    info!("main loop running");
    loop {
        watchdog.feed();
        keyboard.lock(|cell| cell.borrow_mut().poll(&mut slot, &mut tick));
        embassy_futures::yield_now().await;
    }
}
