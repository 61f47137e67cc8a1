//! nRF52840 bindings for the keyboard core.
//!
//! Pin assignment (active-low, internal pull-ups):
//!   line 0..7 -> P1.01..P1.08
//!
//! The tick is derived from `embassy-time` and the watchdog is the on-chip
//! WDT, so nothing here owns an interrupt of its own.

use core::cell::RefCell;

use defmt::{info, warn};
use embassy_nrf::gpio::{Input, Pull};
use embassy_nrf::usb::vbus_detect::HardwareVbusDetect;
use embassy_nrf::wdt::{self, WatchdogHandle};
use embassy_nrf::peripherals;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_time::{Duration, Instant};
use hidkey::config::{KEY_LINES, TICK_PERIOD_MS, WATCHDOG_TIMEOUT_MS};
use hidkey::keys::KeyPins;
use hidkey::{Error, Keyboard, TickSource, Watchdog};

/// USB driver type for the on-chip USBD peripheral.
pub type UsbDriver = embassy_nrf::usb::Driver<'static, peripherals::USBD, HardwareVbusDetect>;

/// The eight key lines as seen by the core.
pub type Keys = KeyPins<Input<'static>, KEY_LINES>;

/// Keyboard state shared by the main loop and the USB control handler.
pub type SharedKeyboard = Mutex<CriticalSectionRawMutex, RefCell<Keyboard<Keys>>>;

/// WDT counts the 32.768 kHz LFCLK.
const WDT_TICKS_PER_SECOND: u32 = 32_768;

/// Key-line pins, in line order.
pub struct KeyLinePins {
    pub p1_01: peripherals::P1_01,
    pub p1_02: peripherals::P1_02,
    pub p1_03: peripherals::P1_03,
    pub p1_04: peripherals::P1_04,
    pub p1_05: peripherals::P1_05,
    pub p1_06: peripherals::P1_06,
    pub p1_07: peripherals::P1_07,
    pub p1_08: peripherals::P1_08,
}

/// Configure the key lines as pulled-up inputs, line 0 first.
pub fn key_lines(pins: KeyLinePins) -> Keys {
    KeyPins::new([
        Input::new(pins.p1_01, Pull::Up),
        Input::new(pins.p1_02, Pull::Up),
        Input::new(pins.p1_03, Pull::Up),
        Input::new(pins.p1_04, Pull::Up),
        Input::new(pins.p1_05, Pull::Up),
        Input::new(pins.p1_06, Pull::Up),
        Input::new(pins.p1_07, Pull::Up),
        Input::new(pins.p1_08, Pull::Up),
    ])
}

/// Free-running ~22 ms period, checked and cleared by the main loop.
pub struct PeriodicTick {
    next: Instant,
}

impl PeriodicTick {
    const PERIOD: Duration = Duration::from_millis(TICK_PERIOD_MS);

    pub fn new() -> Self {
        Self {
            next: Instant::now() + Self::PERIOD,
        }
    }
}

impl TickSource for PeriodicTick {
    fn take_elapsed(&mut self) -> bool {
        let now = Instant::now();
        if now < self.next {
            return false;
        }
        self.next += Self::PERIOD;
        if self.next <= now {
            // Fell more than a period behind; one tick, then resync.
            self.next = now + Self::PERIOD;
        }
        true
    }
}

/// The single WDT channel fed by the main loop.
pub struct HardwareWatchdog {
    handle: WatchdogHandle,
}

impl HardwareWatchdog {
    /// Start the WDT.  Fails if a previous boot already left it running
    /// with a configuration we cannot change.
    pub fn start(wdt: peripherals::WDT) -> Result<Self, Error> {
        let mut config = wdt::Config::default();
        config.timeout_ticks = WDT_TICKS_PER_SECOND * WATCHDOG_TIMEOUT_MS / 1000;
        config.run_during_debug_halt = false;

        match wdt::Watchdog::try_new::<1>(wdt, config) {
            Ok((_wdt, [handle])) => {
                info!("watchdog armed, {} ms", WATCHDOG_TIMEOUT_MS);
                Ok(Self { handle })
            }
            Err(_) => {
                warn!("watchdog already running with a foreign configuration");
                Err(Error::Watchdog)
            }
        }
    }
}

impl Watchdog for HardwareWatchdog {
    fn feed(&mut self) {
        self.handle.pet();
    }
}
