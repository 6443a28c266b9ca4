//! Shared mocks for the integration tests.
//!
//! Transport, hardware I/O and delay all append to one ordered [`Trace`], so
//! tests can assert on cross-component ordering (e.g. rail off before send).

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use embedded_hal::delay::DelayNs;

use rust_espnow_relay::hal::{
    AdcChannel, HardwareIo, Interface, IoError, Level, PinDirection, PinId, Pull, RadioTransport,
    SendOutcome, TransportError,
};
use rust_espnow_relay::logging::{LogLevel, LogStream};
use rust_espnow_relay::peer::{Channel, PeerAddress};
use rust_espnow_relay::EventQueue;

/// One recorded call.
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Init {
        channel: u8,
        station_address: Option<PeerAddress>,
    },
    RegisterSendCallback,
    RegisterReceiveCallback,
    AddPeer {
        address: PeerAddress,
        channel: u8,
        interface: Interface,
    },
    Send {
        address: PeerAddress,
        payload: Vec<u8>,
    },
    ConfigurePin {
        pin: PinId,
        direction: PinDirection,
        pull: Pull,
    },
    SetLevel {
        pin: PinId,
        level: Level,
    },
    ReadLevel {
        pin: PinId,
    },
    SampleAnalog {
        channel: AdcChannel,
    },
    DelayMs(u32),
    DelayNs(u32),
}

impl Call {
    pub fn is_radio(&self) -> bool {
        matches!(
            self,
            Call::Init { .. }
                | Call::RegisterSendCallback
                | Call::RegisterReceiveCallback
                | Call::AddPeer { .. }
                | Call::Send { .. }
        )
    }

    pub fn is_io(&self) -> bool {
        matches!(
            self,
            Call::ConfigurePin { .. }
                | Call::SetLevel { .. }
                | Call::ReadLevel { .. }
                | Call::SampleAnalog { .. }
        )
    }
}

/// Ordered call log shared by all mocks of one test.
pub type Trace = Rc<RefCell<Vec<Call>>>;

pub fn new_trace() -> Trace {
    Rc::new(RefCell::new(Vec::new()))
}

/// Position of the first call matching `pred`.
pub fn position(trace: &Trace, pred: impl Fn(&Call) -> bool) -> Option<usize> {
    trace.borrow().iter().position(pred)
}

/// Number of calls matching `pred`.
pub fn count(trace: &Trace, pred: impl Fn(&Call) -> bool) -> usize {
    trace.borrow().iter().filter(|c| pred(c)).count()
}

/// Leak a fresh event queue (callbacks need `'static`).
pub fn leak_queue() -> &'static EventQueue {
    Box::leak(Box::new(EventQueue::new()))
}

/// Leak a fresh log stream.
pub fn leak_log() -> &'static LogStream {
    Box::leak(Box::new(LogStream::new()))
}

/// Drain every entry as (level, message).
pub fn drain_log(log: &LogStream) -> Vec<(LogLevel, String)> {
    let mut out = Vec::new();
    while let Some(entry) = log.drain() {
        out.push((entry.level, entry.message().to_string()));
    }
    out
}

pub const TEST_CHANNEL: Channel = Channel::from_const(1);

pub fn station(last: u8) -> PeerAddress {
    PeerAddress::new([0x24, 0x6f, 0x28, 0x00, 0x00, last]).unwrap()
}

// ---------------------------------------------------------------------------
// Radio transport
// ---------------------------------------------------------------------------

type SendCallback = Box<dyn FnMut(PeerAddress, SendOutcome) + Send>;
type ReceiveCallback = Box<dyn FnMut(PeerAddress, &[u8]) + Send>;

#[derive(Default)]
struct RadioState {
    send_cb: Option<SendCallback>,
    recv_cb: Option<ReceiveCallback>,
    initialized: bool,
    fail_init: Option<TransportError>,
    fail_add_peer: Option<TransportError>,
    fail_send: Option<TransportError>,
}

/// Recording transport.
pub struct MockTransport {
    state: Rc<RefCell<RadioState>>,
    trace: Trace,
}

/// Test-side control over a [`MockTransport`] after it moved into a session.
#[derive(Clone)]
pub struct RadioHandle {
    state: Rc<RefCell<RadioState>>,
}

impl MockTransport {
    pub fn new(trace: &Trace) -> (Self, RadioHandle) {
        let state = Rc::new(RefCell::new(RadioState::default()));
        (
            Self {
                state: state.clone(),
                trace: trace.clone(),
            },
            RadioHandle { state },
        )
    }

    fn record(&self, call: Call) {
        self.trace.borrow_mut().push(call);
    }
}

impl RadioHandle {
    pub fn fail_init(&self, error: TransportError) {
        self.state.borrow_mut().fail_init = Some(error);
    }

    pub fn fail_add_peer(&self, error: TransportError) {
        self.state.borrow_mut().fail_add_peer = Some(error);
    }

    /// Reject every send request from now on.
    pub fn fail_send(&self, error: TransportError) {
        self.state.borrow_mut().fail_send = Some(error);
    }

    pub fn accept_sends(&self) {
        self.state.borrow_mut().fail_send = None;
    }

    pub fn has_send_callback(&self) -> bool {
        self.state.borrow().send_cb.is_some()
    }

    pub fn has_receive_callback(&self) -> bool {
        self.state.borrow().recv_cb.is_some()
    }

    /// Fire the send callback as the driver would. Returns `false` if none
    /// is registered.
    pub fn complete_send(&self, peer: PeerAddress, outcome: SendOutcome) -> bool {
        let cb = self.state.borrow_mut().send_cb.take();
        match cb {
            Some(mut cb) => {
                cb(peer, outcome);
                self.state.borrow_mut().send_cb = Some(cb);
                true
            }
            None => false,
        }
    }

    /// Fire the receive callback as the driver would.
    pub fn deliver(&self, source: PeerAddress, frame: &[u8]) -> bool {
        let cb = self.state.borrow_mut().recv_cb.take();
        match cb {
            Some(mut cb) => {
                cb(source, frame);
                self.state.borrow_mut().recv_cb = Some(cb);
                true
            }
            None => false,
        }
    }
}

impl RadioTransport for MockTransport {
    fn init(
        &mut self,
        channel: Channel,
        station_address: Option<PeerAddress>,
    ) -> Result<(), TransportError> {
        self.record(Call::Init {
            channel: channel.get(),
            station_address,
        });
        let mut state = self.state.borrow_mut();
        if let Some(e) = state.fail_init {
            return Err(e);
        }
        if state.initialized {
            return Err(TransportError::AlreadyInitialized);
        }
        state.initialized = true;
        Ok(())
    }

    fn register_send_callback<F>(&mut self, callback: F) -> Result<(), TransportError>
    where
        F: FnMut(PeerAddress, SendOutcome) + Send + 'static,
    {
        self.record(Call::RegisterSendCallback);
        self.state.borrow_mut().send_cb = Some(Box::new(callback));
        Ok(())
    }

    fn register_receive_callback<F>(&mut self, callback: F) -> Result<(), TransportError>
    where
        F: FnMut(PeerAddress, &[u8]) + Send + 'static,
    {
        self.record(Call::RegisterReceiveCallback);
        self.state.borrow_mut().recv_cb = Some(Box::new(callback));
        Ok(())
    }

    fn add_peer(
        &mut self,
        address: PeerAddress,
        channel: Channel,
        interface: Interface,
    ) -> Result<(), TransportError> {
        self.record(Call::AddPeer {
            address,
            channel: channel.get(),
            interface,
        });
        match self.state.borrow().fail_add_peer {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn send(&mut self, address: PeerAddress, payload: &[u8]) -> Result<(), TransportError> {
        self.record(Call::Send {
            address,
            payload: payload.to_vec(),
        });
        match self.state.borrow().fail_send {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Hardware I/O
// ---------------------------------------------------------------------------

/// Recording GPIO/ADC.
pub struct MockIo {
    trace: Trace,
    /// Scripted input levels, consumed one per read.
    reads: VecDeque<Level>,
    /// Level returned once the script runs out.
    idle_level: Level,
    adc: HashMap<AdcChannel, u16>,
    fail_read: Option<IoError>,
    fail_sample: Option<AdcChannel>,
}

impl MockIo {
    pub fn new(trace: &Trace) -> Self {
        Self {
            trace: trace.clone(),
            reads: VecDeque::new(),
            idle_level: Level::High,
            adc: HashMap::new(),
            fail_read: None,
            fail_sample: None,
        }
    }

    /// Queue input levels returned by successive reads.
    pub fn with_reads(mut self, levels: &[Level]) -> Self {
        self.reads.extend(levels.iter().copied());
        self
    }

    pub fn with_idle_level(mut self, level: Level) -> Self {
        self.idle_level = level;
        self
    }

    pub fn with_adc(mut self, channel: AdcChannel, raw: u16) -> Self {
        self.adc.insert(channel, raw);
        self
    }

    pub fn with_read_failure(mut self, error: IoError) -> Self {
        self.fail_read = Some(error);
        self
    }

    pub fn with_sample_failure(mut self, channel: AdcChannel) -> Self {
        self.fail_sample = Some(channel);
        self
    }

    fn record(&self, call: Call) {
        self.trace.borrow_mut().push(call);
    }
}

impl HardwareIo for MockIo {
    fn configure_pin(
        &mut self,
        pin: PinId,
        direction: PinDirection,
        pull: Pull,
    ) -> Result<(), IoError> {
        self.record(Call::ConfigurePin {
            pin,
            direction,
            pull,
        });
        Ok(())
    }

    fn set_level(&mut self, pin: PinId, level: Level) -> Result<(), IoError> {
        self.record(Call::SetLevel { pin, level });
        Ok(())
    }

    fn read_level(&mut self, pin: PinId) -> Result<Level, IoError> {
        self.record(Call::ReadLevel { pin });
        if let Some(e) = self.fail_read {
            return Err(e);
        }
        Ok(self.reads.pop_front().unwrap_or(self.idle_level))
    }

    fn sample_analog(&mut self, channel: AdcChannel) -> Result<u16, IoError> {
        self.record(Call::SampleAnalog { channel });
        if self.fail_sample == Some(channel) {
            return Err(IoError::InvalidChannel(channel));
        }
        Ok(self.adc.get(&channel).copied().unwrap_or(0))
    }
}

// ---------------------------------------------------------------------------
// Delay
// ---------------------------------------------------------------------------

/// Recording delay; never sleeps.
pub struct MockDelay {
    trace: Trace,
}

impl MockDelay {
    pub fn new(trace: &Trace) -> Self {
        Self {
            trace: trace.clone(),
        }
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.trace.borrow_mut().push(Call::DelayNs(ns));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.trace.borrow_mut().push(Call::DelayMs(ms));
    }
}
