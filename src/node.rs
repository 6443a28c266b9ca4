//! Role-configurable node: one entry sequence for every build.
//!
//! ```text
//! start:  session init ─▶ role setup (trigger pin, peer)
//! run:    OneShotTrigger    ─▶ PowerSequencer once ─▶ report
//!         ContinuousTrigger ─▶ InputPollLoop ticks until fatal
//!         Receiver          ─▶ service + dispatch + idle tick until fatal
//! ```

use embedded_hal::delay::DelayNs;

use crate::config::{NodeConfig, NodeRole};
use crate::error::NodeError;
use crate::event::EventQueue;
use crate::hal::{HardwareIo, PinDirection, RadioTransport};
use crate::logging::LogStream;
use crate::node_info;
use crate::poll::{InputPollLoop, TickOutcome};
use crate::receiver::{self, ActionHandler};
use crate::sequencer::{PowerSequencer, SequenceReport};
use crate::session::{RadioSession, SessionRole};

impl NodeRole {
    /// Callbacks the role's radio session needs.
    pub const fn session_role(self) -> SessionRole {
        match self {
            NodeRole::ContinuousTrigger => SessionRole::Transceiver,
            NodeRole::OneShotTrigger => SessionRole::Sender,
            NodeRole::Receiver => SessionRole::Receiver,
        }
    }
}

/// Result of one [`Node::step`].
#[derive(Clone, Debug)]
pub enum StepOutcome {
    /// Continuous trigger tick.
    Poll(TickOutcome),
    /// Receiver pass; number of radio events handled.
    Serviced(usize),
    /// One-shot cycle finished.
    Cycle(SequenceReport),
    /// One-shot cycle already ran; nothing left to do.
    Finished,
}

/// Why [`Node::run`] returned without error.
#[derive(Clone, Debug)]
pub enum NodeExit {
    /// The one-shot trigger completed its cycle.
    OneShotComplete(SequenceReport),
    /// `run` was called after the one-shot cycle already completed.
    AlreadyComplete,
}

/// A started node.
pub struct Node<T, IO, D, H>
where
    T: RadioTransport,
    IO: HardwareIo,
    D: DelayNs,
    H: ActionHandler,
{
    config: NodeConfig,
    session: RadioSession<T>,
    io: IO,
    delay: D,
    handler: H,
    poll: InputPollLoop,
    sequencer: Option<PowerSequencer>,
}

impl<T, IO, D, H> Node<T, IO, D, H>
where
    T: RadioTransport,
    IO: HardwareIo,
    D: DelayNs,
    H: ActionHandler,
{
    /// Bring the radio session up and prepare the role.
    ///
    /// Session initialization comes first; when it fails no pin is touched.
    ///
    /// # Errors
    ///
    /// - [`NodeError::TransportInit`] from session bring-up
    /// - [`NodeError::Hardware`] if the trigger pin cannot be configured
    /// - [`NodeError::PeerTable`] if the broadcast peer is rejected
    pub fn start(
        config: NodeConfig,
        transport: T,
        mut io: IO,
        delay: D,
        handler: H,
        events: &'static EventQueue,
        log: &'static LogStream,
    ) -> Result<Self, NodeError> {
        let mut session = RadioSession::initialize(
            transport,
            config.role.session_role(),
            config.channel,
            config.station_address,
            events,
            log,
        )?;

        let mut sequencer = None;
        match config.role {
            NodeRole::ContinuousTrigger => {
                let poll = &config.poll;
                io.configure_pin(poll.trigger_pin, PinDirection::Input, poll.pull)?;
                session.register_peer(config.peer, config.channel)?;
            }
            NodeRole::Receiver => {
                session.register_peer(config.peer, config.channel)?;
            }
            NodeRole::OneShotTrigger => {
                // Peer is registered inside the cycle, after the rail is off
                sequencer = Some(PowerSequencer::new(
                    config.sequencer,
                    config.peer,
                    config.channel,
                    config.send_policy,
                ));
            }
        }

        node_info!(log, "node started as {:?}", config.role);

        Ok(Self {
            poll: InputPollLoop::new(config.poll, config.peer, config.send_policy),
            config,
            session,
            io,
            delay,
            handler,
            sequencer,
        })
    }

    /// Run one unit of work for the role.
    pub fn step(&mut self) -> Result<StepOutcome, NodeError> {
        match self.config.role {
            NodeRole::ContinuousTrigger => self
                .poll
                .tick(&mut self.session, &mut self.io, &mut self.delay, &mut self.handler)
                .map(StepOutcome::Poll),
            NodeRole::Receiver => Ok(StepOutcome::Serviced(self.receive())),
            NodeRole::OneShotTrigger => match self.sequencer.take() {
                Some(mut sequencer) => sequencer
                    .run(&mut self.session, &mut self.io)
                    .map(StepOutcome::Cycle),
                None => Ok(StepOutcome::Finished),
            },
        }
    }

    /// Run the role to completion.
    ///
    /// Only the one-shot trigger returns `Ok`; the looping roles return only
    /// on a fatal error.
    pub fn run(&mut self) -> Result<NodeExit, NodeError> {
        loop {
            match self.step()? {
                StepOutcome::Cycle(report) => return Ok(NodeExit::OneShotComplete(report)),
                StepOutcome::Finished => return Ok(NodeExit::AlreadyComplete),
                StepOutcome::Poll(_) | StepOutcome::Serviced(_) => {}
            }
        }
    }

    fn receive(&mut self) -> usize {
        let log = self.session.log();
        let handler = &mut self.handler;

        let handled = self.session.service(
            |_, _| {},
            |source, payload| {
                receiver::dispatch(log, source, payload.as_bytes(), &mut *handler);
            },
        );

        self.delay.delay_ms(self.config.receiver_tick_ms);
        handled
    }

    #[inline]
    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    #[inline]
    pub fn session(&self) -> &RadioSession<T> {
        &self.session
    }

    /// Mutable session access, for servicing events between runs.
    #[inline]
    pub fn session_mut(&mut self) -> &mut RadioSession<T> {
        &mut self.session
    }

    #[inline]
    pub fn poll_loop(&self) -> &InputPollLoop {
        &self.poll
    }

    #[inline]
    pub fn handler(&self) -> &H {
        &self.handler
    }
}
