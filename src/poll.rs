//! Continuous trigger: cooperative polling of a digital input.
//!
//! No latching, no edge detection. Each tick re-derives [`TriggerState`] from
//! the raw pin level; while the input stays asserted the command is re-sent
//! once per debounce interval.
//!
//! # Timing
//!
//! ```text
//! asserted:     read ─▶ send ─▶ sleep(debounce_ms)
//! not asserted: read ─────────▶ sleep(idle_tick_ms)
//! ```
//!
//! The idle tick keeps the not-asserted branch from spinning a core.

use core::convert::Infallible;

use embedded_hal::delay::DelayNs;

use crate::config::SendErrorPolicy;
use crate::error::NodeError;
use crate::hal::{HardwareIo, Level, PinId, Pull, RadioTransport};
use crate::peer::PeerAddress;
use crate::protocol::Command;
use crate::receiver::{self, ActionHandler};
use crate::session::RadioSession;
use crate::{node_debug, node_error};

/// Debounced trigger input state for the current tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerState {
    Idle,
    Active,
}

impl TriggerState {
    /// Derive from a raw pin level.
    #[inline]
    pub fn from_level(level: Level, active_level: Level) -> Self {
        if level == active_level {
            TriggerState::Active
        } else {
            TriggerState::Idle
        }
    }
}

/// Poll loop configuration.
#[derive(Clone, Copy, Debug)]
pub struct PollConfig {
    /// Trigger input pin.
    pub trigger_pin: PinId,
    /// Level meaning "asserted" (active-low by default).
    pub active_level: Level,
    /// Pull applied to the trigger pin.
    pub pull: Pull,
    /// Sleep after each send (ms).
    pub debounce_ms: u32,
    /// Sleep after a tick without send (ms).
    pub idle_tick_ms: u32,
    /// Command sent while asserted.
    pub command: Command,
}

/// What one tick did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Input asserted, command accepted by the transport.
    Sent,
    /// Input asserted, request rejected and absorbed by the send policy.
    SendRejected,
    /// Input not asserted.
    Idle,
}

/// Continuous trigger loop.
pub struct InputPollLoop {
    config: PollConfig,
    peer: PeerAddress,
    policy: SendErrorPolicy,
    ticks: u32,
    sends: u32,
}

impl InputPollLoop {
    pub fn new(config: PollConfig, peer: PeerAddress, policy: SendErrorPolicy) -> Self {
        Self {
            config,
            peer,
            policy,
            ticks: 0,
            sends: 0,
        }
    }

    #[inline]
    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Ticks run so far.
    #[inline]
    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    /// Commands accepted so far.
    #[inline]
    pub fn sends(&self) -> u32 {
        self.sends
    }

    /// Run one tick: service radio events, read the input, maybe send, sleep.
    ///
    /// # Errors
    ///
    /// - [`NodeError::Hardware`] if the input cannot be read
    /// - [`NodeError::SendRequest`] under [`SendErrorPolicy::Fatal`]
    pub fn tick<T, IO, D, H>(
        &mut self,
        session: &mut RadioSession<T>,
        io: &mut IO,
        delay: &mut D,
        handler: &mut H,
    ) -> Result<TickOutcome, NodeError>
    where
        T: RadioTransport,
        IO: HardwareIo,
        D: DelayNs,
        H: ActionHandler,
    {
        self.ticks = self.ticks.wrapping_add(1);
        let log = session.log();

        session.service(
            |_, _| {},
            |source, payload| {
                receiver::dispatch(log, source, payload.as_bytes(), &mut *handler);
            },
        );

        let level = io.read_level(self.config.trigger_pin)?;
        if TriggerState::from_level(level, self.config.active_level) == TriggerState::Idle {
            delay.delay_ms(self.config.idle_tick_ms);
            return Ok(TickOutcome::Idle);
        }

        node_debug!(log, "trigger asserted on GPIO{}", self.config.trigger_pin);
        let outcome = match session.send_command(self.peer, &self.config.command) {
            Ok(()) => {
                self.sends = self.sends.wrapping_add(1);
                TickOutcome::Sent
            }
            Err(e) => match self.policy {
                SendErrorPolicy::Fatal => return Err(e),
                SendErrorPolicy::LogAndContinue => {
                    node_error!(log, "{}, retrying next tick", e);
                    TickOutcome::SendRejected
                }
            },
        };

        delay.delay_ms(self.config.debounce_ms);
        Ok(outcome)
    }

    /// Poll forever. Returns only on a fatal error.
    pub fn run<T, IO, D, H>(
        &mut self,
        session: &mut RadioSession<T>,
        io: &mut IO,
        delay: &mut D,
        handler: &mut H,
    ) -> Result<Infallible, NodeError>
    where
        T: RadioTransport,
        IO: HardwareIo,
        D: DelayNs,
        H: ActionHandler,
    {
        loop {
            self.tick(session, io, delay, handler)?;
        }
    }
}
