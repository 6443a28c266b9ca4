//! Radio session: brings the transport up and mediates every send/receive.
//!
//! # Contract
//!
//! - `initialize` runs once per transport and installs callbacks that only
//!   enqueue [`RadioEvent`]s (they never touch session state)
//! - `send` is request-only: `Ok` means accepted, the outcome arrives later
//! - `service` drains queued events on the app thread, updates the outcome
//!   tracker and invokes the caller's handlers exactly once per event
//!
//! No retries anywhere. A failed send is logged and surfaced; the caller
//! decides whether to send again.

use crate::error::NodeError;
use crate::event::{EventQueue, RadioEvent};
use crate::hal::{Interface, RadioTransport, SendOutcome, TransportError};
use crate::logging::LogStream;
use crate::peer::{Channel, PeerAddress};
use crate::protocol::{self, Command, Payload, MAX_PAYLOAD_LEN};
use crate::{node_debug, node_error, node_info, node_warn};

/// Which callbacks the session installs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionRole {
    /// Send-result callback only.
    Sender,
    /// Receive callback only.
    Receiver,
    /// Both callbacks.
    Transceiver,
}

impl SessionRole {
    #[inline]
    pub const fn sends(self) -> bool {
        matches!(self, SessionRole::Sender | SessionRole::Transceiver)
    }

    #[inline]
    pub const fn listens(self) -> bool {
        matches!(self, SessionRole::Receiver | SessionRole::Transceiver)
    }
}

/// Send counters since the session came up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SendStats {
    /// Requests accepted by the transport.
    pub accepted: u32,
    /// Outcomes reported as success.
    pub succeeded: u32,
    /// Outcomes reported as failure.
    pub failed: u32,
    /// Requests accepted while an earlier outcome was still pending.
    pub overlapped: u32,
}

/// Radio session over a [`RadioTransport`].
pub struct RadioSession<T: RadioTransport> {
    transport: T,
    role: SessionRole,
    channel: Channel,
    peer: Option<PeerAddress>,
    events: &'static EventQueue,
    log: &'static LogStream,
    outcome_pending: bool,
    last_outcome: Option<SendOutcome>,
    stats: SendStats,
}

impl<T: RadioTransport> RadioSession<T> {
    /// Bring the transport up on `channel` and install the role's callbacks.
    ///
    /// Consumes the transport, so a session cannot be initialized twice.
    ///
    /// # Errors
    ///
    /// [`NodeError::TransportInit`] if any bring-up step fails.
    pub fn initialize(
        mut transport: T,
        role: SessionRole,
        channel: Channel,
        station_address: Option<PeerAddress>,
        events: &'static EventQueue,
        log: &'static LogStream,
    ) -> Result<Self, NodeError> {
        if let Err(e) = transport.init(channel, station_address) {
            node_error!(log, "radio init failed: {}", e);
            return Err(NodeError::TransportInit(e));
        }

        if role.sends() {
            transport
                .register_send_callback(move |peer, outcome| {
                    if !events.push(RadioEvent::SendResult { peer, outcome }) {
                        node_warn!(log, "event queue full, outcome from {} lost", peer);
                    }
                })
                .map_err(NodeError::TransportInit)?;
        }

        if role.listens() {
            transport
                .register_receive_callback(move |source, data| {
                    if data.len() > MAX_PAYLOAD_LEN {
                        node_warn!(log, "{} byte frame from {} cut to {}", data.len(), source, MAX_PAYLOAD_LEN);
                    }
                    let payload = Payload::truncated(data);
                    if !events.push(RadioEvent::Received { source, payload }) {
                        node_warn!(log, "event queue full, frame from {} lost", source);
                    }
                })
                .map_err(NodeError::TransportInit)?;
        }

        node_info!(log, "radio session up on {} ({:?})", channel, role);

        Ok(Self {
            transport,
            role,
            channel,
            peer: None,
            events,
            log,
            outcome_pending: false,
            last_outcome: None,
            stats: SendStats::default(),
        })
    }

    /// Add the session's peer to the transport's peer table (station
    /// interface).
    ///
    /// Registering the same peer again is a no-op. The session holds one peer:
    /// a different address, or a channel other than the session's, is
    /// rejected.
    ///
    /// # Errors
    ///
    /// [`NodeError::PeerTable`] if the entry is rejected.
    pub fn register_peer(&mut self, address: PeerAddress, channel: Channel) -> Result<(), NodeError> {
        if channel != self.channel {
            node_error!(self.log, "peer {} on {} outside session {}", address, channel, self.channel);
            return Err(NodeError::PeerTable(TransportError::InvalidPeer));
        }

        match self.peer {
            Some(existing) if existing == address => return Ok(()),
            Some(existing) => {
                node_error!(self.log, "peer slot taken by {}", existing);
                return Err(NodeError::PeerTable(TransportError::PeerTableFull));
            }
            None => {}
        }

        if let Err(e) = self.transport.add_peer(address, channel, Interface::Station) {
            node_error!(self.log, "add peer {} failed: {}", address, e);
            return Err(NodeError::PeerTable(e));
        }

        self.peer = Some(address);
        node_info!(self.log, "peer {} registered on {}", address, channel);
        Ok(())
    }

    /// Submit one payload. Request only: the outcome is delivered through
    /// [`RadioSession::service`].
    ///
    /// # Errors
    ///
    /// [`NodeError::SendRequest`] if the payload is oversized, the address is
    /// not the registered peer, or the transport rejects the request.
    pub fn send(&mut self, address: PeerAddress, payload: &[u8]) -> Result<(), NodeError> {
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(NodeError::SendRequest(TransportError::PayloadTooLarge));
        }
        if self.peer != Some(address) {
            return Err(NodeError::SendRequest(TransportError::PeerNotFound));
        }

        if let Err(e) = self.transport.send(address, payload) {
            node_error!(self.log, "send to {} rejected: {}", address, e);
            return Err(NodeError::SendRequest(e));
        }

        if self.outcome_pending {
            // No watchdog: the earlier outcome may still arrive, or never
            self.stats.overlapped = self.stats.overlapped.wrapping_add(1);
            node_warn!(self.log, "send accepted while previous outcome pending");
        }
        self.outcome_pending = true;
        self.stats.accepted = self.stats.accepted.wrapping_add(1);
        node_debug!(self.log, "{} bytes queued for {}", payload.len(), address);
        Ok(())
    }

    /// Encode `command` and send it.
    pub fn send_command(&mut self, address: PeerAddress, command: &Command) -> Result<(), NodeError> {
        let payload = protocol::encode(command);
        self.send(address, payload.as_bytes())?;
        node_info!(self.log, "sent {} to {}", command, address);
        Ok(())
    }

    /// Drain pending radio events.
    ///
    /// `on_send_result` runs once per send outcome, `on_receive` once per
    /// inbound frame, both on the calling thread. Returns the number of
    /// events handled.
    pub fn service<S, R>(&mut self, mut on_send_result: S, mut on_receive: R) -> usize
    where
        S: FnMut(PeerAddress, SendOutcome),
        R: FnMut(PeerAddress, &Payload),
    {
        let mut handled = 0;

        while let Some(event) = self.events.pop() {
            match event {
                RadioEvent::SendResult { peer, outcome } => {
                    self.record_outcome(peer, outcome);
                    on_send_result(peer, outcome);
                }
                RadioEvent::Received { source, payload } => {
                    node_debug!(self.log, "{} bytes from {}", payload.len(), source);
                    on_receive(source, &payload);
                }
            }
            handled += 1;
        }

        handled
    }

    fn record_outcome(&mut self, peer: PeerAddress, outcome: SendOutcome) {
        self.outcome_pending = false;
        self.last_outcome = Some(outcome);

        match outcome {
            SendOutcome::Success => {
                self.stats.succeeded = self.stats.succeeded.wrapping_add(1);
                node_info!(self.log, "send to {} succeeded", peer);
            }
            SendOutcome::Failure => {
                self.stats.failed = self.stats.failed.wrapping_add(1);
                node_warn!(self.log, "send to {} failed", peer);
            }
        }
    }

    #[inline]
    pub fn role(&self) -> SessionRole {
        self.role
    }

    #[inline]
    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Registered peer, if any.
    #[inline]
    pub fn peer(&self) -> Option<PeerAddress> {
        self.peer
    }

    /// Outcome of the most recent completed send.
    #[inline]
    pub fn last_outcome(&self) -> Option<SendOutcome> {
        self.last_outcome
    }

    /// True between an accepted send and its outcome being serviced.
    #[inline]
    pub fn outcome_pending(&self) -> bool {
        self.outcome_pending
    }

    #[inline]
    pub fn stats(&self) -> SendStats {
        self.stats
    }

    /// Log stream shared with the callbacks.
    #[inline]
    pub fn log(&self) -> &'static LogStream {
        self.log
    }

    /// Events lost because the queue was full.
    #[inline]
    pub fn dropped_events(&self) -> u32 {
        self.events.dropped()
    }
}
