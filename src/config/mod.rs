//! Module: config
//!
//! Purpose: Compile-time configuration for RustEspNowRelay.
//!
//! Architecture:
//! - board.rs: pin and ADC wiring
//! - NodeConfig: role, addressing, timing and per-role send policy
//! - Role chosen by Cargo feature (`oneshot-trigger`, `receiver`),
//!   continuous trigger otherwise
//!
//! Nothing here changes at runtime and nothing is persisted.

pub mod board;

use crate::hal::Pull;
use crate::peer::{Channel, PeerAddress};
use crate::poll::PollConfig;
use crate::protocol::Command;
use crate::sequencer::SequencerConfig;

/// What this node does after the radio session is up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeRole {
    /// Poll the trigger input and re-send while it is held.
    ContinuousTrigger,
    /// Power up, sample, send once, power down.
    OneShotTrigger,
    /// Listen and dispatch actions.
    Receiver,
}

impl NodeRole {
    /// Send-failure handling when the role does not override it.
    pub const fn default_send_policy(self) -> SendErrorPolicy {
        match self {
            NodeRole::OneShotTrigger => SendErrorPolicy::LogAndContinue,
            NodeRole::ContinuousTrigger | NodeRole::Receiver => SendErrorPolicy::Fatal,
        }
    }
}

/// What to do when the transport rejects a send request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendErrorPolicy {
    /// Stop the node (fail loud).
    Fatal,
    /// Log at error level and carry on.
    LogAndContinue,
}

/// Complete node configuration.
#[derive(Clone, Copy, Debug)]
pub struct NodeConfig {
    pub role: NodeRole,
    /// Channel shared by every node in the deployment.
    pub channel: Channel,
    /// Destination of triggers (broadcast) and accepted receive peer.
    pub peer: PeerAddress,
    /// Station MAC override, `None` keeps the factory MAC.
    pub station_address: Option<PeerAddress>,
    pub send_policy: SendErrorPolicy,
    pub sequencer: SequencerConfig,
    pub poll: PollConfig,
    /// Receiver loop sleep between event drains (ms).
    pub receiver_tick_ms: u32,
}

/// Role selected at build time.
pub const ROLE: NodeRole = if cfg!(feature = "receiver") {
    NodeRole::Receiver
} else if cfg!(feature = "oneshot-trigger") {
    NodeRole::OneShotTrigger
} else {
    NodeRole::ContinuousTrigger
};

/// Radio channel for the deployment.
pub const CHANNEL: Channel = Channel::from_const(1);

/// Re-send period while the trigger is held.
pub const DEBOUNCE_MS: u32 = 200;

/// Minimum poll period while the trigger is released.
pub const IDLE_TICK_MS: u32 = 10;

/// Build-time node configuration.
pub const CONFIG: NodeConfig = NodeConfig::for_role(ROLE);

impl NodeConfig {
    /// Default configuration for `role` on this board.
    pub const fn for_role(role: NodeRole) -> Self {
        Self {
            role,
            channel: CHANNEL,
            peer: PeerAddress::BROADCAST,
            station_address: None,
            send_policy: role.default_send_policy(),
            sequencer: SequencerConfig {
                power_pin: board::POWER_PIN,
                power_enabled_level: board::POWER_ENABLED_LEVEL,
                shutdown_pin: board::SHUTDOWN_PIN,
                shutdown_level: board::SHUTDOWN_LEVEL,
                adc_channels: &board::ADC_CHANNELS,
                reference_voltage: board::ADC_REFERENCE_VOLTAGE,
                resolution: board::ADC_RESOLUTION,
                command: Command::Open,
            },
            poll: PollConfig {
                trigger_pin: board::TRIGGER_PIN,
                active_level: board::TRIGGER_ACTIVE_LEVEL,
                pull: Pull::Up,
                debounce_ms: DEBOUNCE_MS,
                idle_tick_ms: IDLE_TICK_MS,
                command: Command::Open,
            },
            receiver_tick_ms: IDLE_TICK_MS,
        }
    }
}
