//! One-shot power sequencer.
//!
//! Pure ordering logic over [`HardwareIo`] and [`RadioSession`]. Runs to
//! completion without suspension points:
//!
//! ```text
//! Idle ─▶ RailOn ─▶ Sampling ─▶ RailOff ─▶ Sent ─▶ RailFinalOff
//! ```
//!
//! `RailOff` (shutdown indicator) always precedes the send: the sampling path
//! must not draw current while the radio transmits.

use heapless::Vec;

use crate::config::SendErrorPolicy;
use crate::error::NodeError;
use crate::hal::{AdcChannel, HardwareIo, Level, PinDirection, PinId, Pull, RadioTransport};
use crate::logging::LogStream;
use crate::peer::{Channel, PeerAddress};
use crate::protocol::Command;
use crate::session::RadioSession;
use crate::{node_error, node_info, node_warn};

/// Maximum ADC channels sampled per cycle.
pub const MAX_SAMPLE_CHANNELS: usize = 8;

/// Sequencer phases, strictly linear.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum SequencerState {
    Idle,
    RailOn,
    Sampling,
    RailOff,
    Sent,
    RailFinalOff,
}

impl SequencerState {
    /// The only state allowed after this one.
    pub const fn next(self) -> Option<Self> {
        match self {
            SequencerState::Idle => Some(SequencerState::RailOn),
            SequencerState::RailOn => Some(SequencerState::Sampling),
            SequencerState::Sampling => Some(SequencerState::RailOff),
            SequencerState::RailOff => Some(SequencerState::Sent),
            SequencerState::Sent => Some(SequencerState::RailFinalOff),
            SequencerState::RailFinalOff => None,
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, SequencerState::RailFinalOff)
    }
}

/// State of the switched rail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PowerState {
    Off,
    On,
}

/// One ADC reading.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    /// Position in the configured channel list.
    pub index: u8,
    pub channel: AdcChannel,
    pub raw: u16,
    pub voltage: f32,
}

/// Readings from one power-on cycle. Logged, never transmitted.
pub type SampleSet = Vec<Sample, MAX_SAMPLE_CHANNELS>;

/// Convert a raw ADC reading to volts.
///
/// `voltage = raw * reference / resolution`
#[inline]
pub fn raw_to_voltage(raw: u16, reference_voltage: f32, resolution: u16) -> f32 {
    if resolution == 0 {
        return 0.0;
    }
    raw as f32 * reference_voltage / resolution as f32
}

/// Power sequencer configuration.
#[derive(Clone, Copy, Debug)]
pub struct SequencerConfig {
    /// Rail power-control output.
    pub power_pin: PinId,
    /// Level that switches the rail on.
    pub power_enabled_level: Level,
    /// Downstream load gate, driven once before the send.
    pub shutdown_pin: PinId,
    /// Level that signals shutdown on `shutdown_pin`.
    pub shutdown_level: Level,
    /// ADC channels sampled in order.
    pub adc_channels: &'static [AdcChannel],
    /// Full-scale reference voltage (V).
    pub reference_voltage: f32,
    /// ADC resolution (counts).
    pub resolution: u16,
    /// Command sent in `Sent`.
    pub command: Command,
}

/// What one completed cycle produced.
#[derive(Clone, Debug)]
pub struct SequenceReport {
    pub samples: SampleSet,
    /// Send request error absorbed by a log-and-continue policy.
    pub send_error: Option<NodeError>,
}

/// One-shot trigger: rail on, sample, gate load off, send, rail off.
pub struct PowerSequencer {
    config: SequencerConfig,
    peer: PeerAddress,
    channel: Channel,
    policy: SendErrorPolicy,
    state: SequencerState,
    power: PowerState,
    samples: SampleSet,
}

impl PowerSequencer {
    pub fn new(
        config: SequencerConfig,
        peer: PeerAddress,
        channel: Channel,
        policy: SendErrorPolicy,
    ) -> Self {
        Self {
            config,
            peer,
            channel,
            policy,
            state: SequencerState::Idle,
            power: PowerState::Off,
            samples: SampleSet::new(),
        }
    }

    #[inline]
    pub fn state(&self) -> SequencerState {
        self.state
    }

    #[inline]
    pub fn power(&self) -> PowerState {
        self.power
    }

    /// Samples taken so far this cycle.
    #[inline]
    pub fn samples(&self) -> &SampleSet {
        &self.samples
    }

    /// Run the full cycle.
    ///
    /// Each call starts a fresh cycle from `Idle`.
    ///
    /// # Errors
    ///
    /// - [`NodeError::Hardware`]: stops immediately, no retry; one attempt is
    ///   made to switch the rail off before returning
    /// - [`NodeError::PeerTable`]: no send; the rail is still switched off
    /// - [`NodeError::SendRequest`]: only under [`SendErrorPolicy::Fatal`]
    pub fn run<T, IO>(
        &mut self,
        session: &mut RadioSession<T>,
        io: &mut IO,
    ) -> Result<SequenceReport, NodeError>
    where
        T: RadioTransport,
        IO: HardwareIo,
    {
        self.state = SequencerState::Idle;
        self.samples.clear();

        match self.cycle(session, io) {
            Err(e @ NodeError::Hardware(_)) if self.power == PowerState::On => {
                self.release_rail(session.log(), io);
                Err(e)
            }
            result => result,
        }
    }

    fn cycle<T, IO>(
        &mut self,
        session: &mut RadioSession<T>,
        io: &mut IO,
    ) -> Result<SequenceReport, NodeError>
    where
        T: RadioTransport,
        IO: HardwareIo,
    {
        let log = session.log();

        self.advance(SequencerState::RailOn);
        io.configure_pin(self.config.power_pin, PinDirection::Output, Pull::None)?;
        io.set_level(self.config.power_pin, self.config.power_enabled_level)?;
        self.power = PowerState::On;

        self.advance(SequencerState::Sampling);
        for (index, &channel) in self.config.adc_channels.iter().enumerate() {
            let raw = io.sample_analog(channel)?;
            let voltage =
                raw_to_voltage(raw, self.config.reference_voltage, self.config.resolution);
            node_info!(log, "ADC Channel {}: {}, Voltage: {:.2}V", index, raw, voltage);

            let sample = Sample {
                index: index as u8,
                channel,
                raw,
                voltage,
            };
            if self.samples.push(sample).is_err() {
                node_warn!(log, "sample set full, channel {} not kept", channel);
            }
        }

        self.advance(SequencerState::RailOff);
        io.configure_pin(self.config.shutdown_pin, PinDirection::Output, Pull::None)?;
        io.set_level(self.config.shutdown_pin, self.config.shutdown_level)?;

        self.advance(SequencerState::Sent);
        let send_error = match self.send(session) {
            Ok(()) => None,
            Err(e @ NodeError::PeerTable(_)) => {
                // Nothing was sent; still leave the rail off
                self.finish(io)?;
                return Err(e);
            }
            Err(e @ NodeError::SendRequest(_)) => match self.policy {
                SendErrorPolicy::Fatal => {
                    self.finish(io)?;
                    return Err(e);
                }
                SendErrorPolicy::LogAndContinue => {
                    node_error!(log, "{}, continuing", e);
                    Some(e)
                }
            },
            Err(e) => return Err(e),
        };

        self.finish(io)?;
        node_info!(log, "Power Off.");

        Ok(SequenceReport {
            samples: self.samples.clone(),
            send_error,
        })
    }

    /// Single best-effort rail release after a hardware fault. The state
    /// stays where the fault happened.
    fn release_rail<IO: HardwareIo>(&mut self, log: &LogStream, io: &mut IO) {
        match io.set_level(self.config.power_pin, !self.config.power_enabled_level) {
            Ok(()) => {
                self.power = PowerState::Off;
                node_warn!(log, "rail released after fault in {:?}", self.state);
            }
            Err(e) => node_error!(log, "rail release failed: {}", e),
        }
    }

    fn send<T: RadioTransport>(&mut self, session: &mut RadioSession<T>) -> Result<(), NodeError> {
        session.register_peer(self.peer, self.channel)?;
        session.send_command(self.peer, &self.config.command)
    }

    fn finish<IO: HardwareIo>(&mut self, io: &mut IO) -> Result<(), NodeError> {
        self.advance(SequencerState::RailFinalOff);
        io.set_level(self.config.power_pin, !self.config.power_enabled_level)?;
        self.power = PowerState::Off;
        Ok(())
    }

    fn advance(&mut self, to: SequencerState) {
        debug_assert_eq!(self.state.next(), Some(to), "sequencer skipped a state");
        self.state = to;
    }
}
