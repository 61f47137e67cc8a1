//! Main loop / report scheduler.
//!
//! [`Keyboard`] owns every piece of mutable protocol state: the outgoing
//! report buffer, the last reported key, the "report pending" flag, and the
//! idle timer.  The main loop calls [`Keyboard::poll`] once per iteration;
//! the transport reaches the same object through [`ControlHandler`] while
//! servicing the bus.
//!
//! Nothing here blocks.  A report that cannot be submitted because the
//! interrupt slot is busy stays pending and is retried on the next
//! iteration, carrying whatever key was sampled last.

use crate::config::REPORT_SIZE;
use crate::control::{ControlHandler, ControlResponse, HidRequest, RequestKind, SetupRequest};
use crate::hid::report::encode;
use crate::idle::{IdleTimer, TickSource};
use crate::keys::{sample, KeyLines, LogicalKey};

/// The four operations the core needs from the USB engine.
pub trait UsbTransport {
    /// Service pending bus activity.  Setup packets are passed to
    /// `control` synchronously; the transport sends back the returned
    /// bytes.  Transports that service the bus from their own task or
    /// interrupt leave this empty.
    fn poll<H: ControlHandler>(&mut self, control: &mut H);

    /// Can the interrupt-IN endpoint take another report?
    fn interrupt_ready(&self) -> bool;

    /// Queue `report` as the next interrupt-IN transfer.  The transport
    /// copies the bytes; the caller's buffer is free on return.
    fn submit_interrupt(&mut self, report: &[u8]);
}

/// The watchdog-reset primitive.
pub trait Watchdog {
    fn feed(&mut self);
}

/// Device-side HID keyboard state machine.
pub struct Keyboard<L> {
    lines: L,
    /// Outgoing report buffer, shared by GET_REPORT and the interrupt path.
    report: [u8; REPORT_SIZE],
    /// Most recently reported key, as opposed to most recently sampled.
    last_key: LogicalKey,
    /// A report is owed to the host.
    pending: bool,
    idle: IdleTimer,
}

impl<L: KeyLines> Keyboard<L> {
    pub const fn new(lines: L) -> Self {
        Self {
            lines,
            report: [0; REPORT_SIZE],
            last_key: LogicalKey::NONE,
            pending: false,
            idle: IdleTimer::new(),
        }
    }

    /// One main-loop iteration.
    pub fn poll<T: UsbTransport, C: TickSource>(&mut self, usb: &mut T, tick: &mut C) {
        usb.poll(self);
        self.scan();
        if tick.take_elapsed() {
            self.on_tick();
        }
        self.flush(usb);
    }

    /// Re-sample and latch a change.  Always compares against the latest
    /// sample so a press and release between two reports still leaves the
    /// final state pending.
    pub fn scan(&mut self) {
        let key = sample(&mut self.lines);
        if key != self.last_key {
            self.last_key = key;
            self.pending = true;
        }
    }

    /// Feed one hardware tick to the idle timer.
    pub fn on_tick(&mut self) {
        if self.idle.tick() {
            trace!("idle period elapsed, forcing report");
            self.pending = true;
        }
    }

    /// Submit the pending report if the transport has room.  Returns
    /// whether a report went out.
    pub fn flush<T: UsbTransport>(&mut self, usb: &mut T) -> bool {
        if !self.pending {
            return false;
        }
        if !usb.interrupt_ready() {
            trace!("interrupt slot busy, report deferred");
            return false;
        }
        self.pending = false;
        self.build_report(self.last_key);
        trace!("report {}", self.report);
        usb.submit_interrupt(&self.report);
        true
    }

    fn build_report(&mut self, key: LogicalKey) {
        encode(key).serialize(&mut self.report);
    }

    pub fn last_key(&self) -> LogicalKey {
        self.last_key
    }

    pub fn report_pending(&self) -> bool {
        self.pending
    }

    pub fn idle_rate(&self) -> u8 {
        self.idle.rate()
    }

    pub fn report_buffer(&self) -> &[u8; REPORT_SIZE] {
        &self.report
    }

    pub fn lines_mut(&mut self) -> &mut L {
        &mut self.lines
    }
}

impl<L: KeyLines> ControlHandler for Keyboard<L> {
    fn setup(&mut self, request: &SetupRequest) -> ControlResponse<'_> {
        if request.kind() != RequestKind::Class {
            // No vendor requests; standard ones belong to the transport.
            return ControlResponse::NoData;
        }

        match HidRequest::from_code(request.request) {
            Some(HidRequest::GetReport) => {
                // Fresh sample, not the latched key.  There is only one
                // report type, so wValue is ignored.
                let key = sample(&mut self.lines);
                self.build_report(key);
                ControlResponse::Data(&self.report)
            }
            Some(HidRequest::GetIdle) => {
                ControlResponse::Data(core::slice::from_ref(self.idle.rate_ref()))
            }
            Some(HidRequest::SetIdle) => {
                let rate = request.value_high();
                info!("SET_IDLE: {} x 4ms", rate);
                self.idle.set_rate(rate);
                ControlResponse::NoData
            }
            _ => {
                debug!("unhandled class request {:#x}", request.request);
                ControlResponse::NoData
            }
        }
    }
}
