//! Receive direction: decode inbound frames and dispatch actions.

use crate::logging::LogStream;
use crate::peer::PeerAddress;
use crate::protocol::{self, Command};
use crate::{node_error, node_info};

/// Downstream consumer of recognized commands.
///
/// Only ever called with `Open`, `Close` or `Alarm`; unrecognized frames are
/// logged and dropped before reaching the handler.
pub trait ActionHandler {
    fn handle(&mut self, source: PeerAddress, command: Command);
}

impl<F> ActionHandler for F
where
    F: FnMut(PeerAddress, Command),
{
    fn handle(&mut self, source: PeerAddress, command: Command) {
        self(source, command)
    }
}

/// Handler that only logs the command name.
pub struct LoggingActionHandler {
    log: &'static LogStream,
}

impl LoggingActionHandler {
    pub const fn new(log: &'static LogStream) -> Self {
        Self { log }
    }
}

impl ActionHandler for LoggingActionHandler {
    fn handle(&mut self, _source: PeerAddress, command: Command) {
        node_info!(self.log, "{}", command);
    }
}

/// Decode one frame and dispatch it.
///
/// Returns the decoded command. `Unrecognized` is logged at error level and
/// never reaches `handler`.
pub fn dispatch<H: ActionHandler + ?Sized>(
    log: &LogStream,
    source: PeerAddress,
    frame: &[u8],
    handler: &mut H,
) -> Command {
    let command = protocol::decode(frame);

    if command.is_recognized() {
        node_info!(log, "Data received: {} {}", source, command);
        handler.handle(source, command);
    } else {
        node_error!(log, "DATA is not OK: {} from {}", frame.escape_ascii(), source);
    }

    command
}
