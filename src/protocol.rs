//! Module: protocol
//!
//! Purpose: Wire representation of relay commands. Encodes the three command
//! literals and decodes inbound frames back into [`Command`].
//!
//! Wire format (one frame per radio packet, no header, no checksum):
//!
//! ```text
//! [ 'O' 'p' 'e' 'n' 0x00 ]
//! [ 'C' 'l' 'o' 's' 'e' 0x00 ]
//! [ 'A' 'l' 'a' 'r' 'm' 0x00 ]
//! ```
//!
//! The sender always appends one NUL terminator. The decoder strips at most
//! one trailing NUL, then requires a case-sensitive exact match, so frames
//! from senders that omit the terminator are still understood.
//!
//! Safety: Safe. Pure functions, Copy types only.

use core::fmt;

/// Maximum frame payload (ESP-NOW data limit).
pub const MAX_PAYLOAD_LEN: usize = 250;

/// Frame terminator appended by [`encode`].
pub const TERMINATOR: u8 = 0x00;

/// Fixed-capacity frame buffer.
///
/// Copy type so it can travel through the lock-free event ring.
#[derive(Clone, Copy)]
pub struct Payload {
    len: u8,
    bytes: [u8; MAX_PAYLOAD_LEN],
}

impl Payload {
    /// Empty payload.
    pub const EMPTY: Self = Self {
        len: 0,
        bytes: [0; MAX_PAYLOAD_LEN],
    };

    /// Copy `data` into a payload. Returns `None` if it exceeds
    /// [`MAX_PAYLOAD_LEN`].
    pub fn from_slice(data: &[u8]) -> Option<Self> {
        if data.len() > MAX_PAYLOAD_LEN {
            return None;
        }
        Some(Self::truncated(data))
    }

    /// Copy at most [`MAX_PAYLOAD_LEN`] bytes of `data`. Longer input is cut
    /// silently; callers that care check the length first.
    pub fn truncated(data: &[u8]) -> Self {
        let len = data.len().min(MAX_PAYLOAD_LEN);
        let mut payload = Self::EMPTY;
        payload.bytes[..len].copy_from_slice(&data[..len]);
        payload.len = len as u8;
        payload
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl PartialEq for Payload {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for Payload {}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Payload(\"{}\")", self.as_bytes().escape_ascii())
    }
}

/// Relay command carried by one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Open,
    Close,
    Alarm,
    /// Frame that matched no literal. Carries the raw bytes as received, cut
    /// to [`MAX_PAYLOAD_LEN`]; longer ESP-NOW v2 frames arrive lossy.
    Unrecognized(Payload),
}

impl Command {
    /// Canonical ASCII literal, `None` for [`Command::Unrecognized`].
    pub const fn literal(&self) -> Option<&'static str> {
        match self {
            Command::Open => Some("Open"),
            Command::Close => Some("Close"),
            Command::Alarm => Some("Alarm"),
            Command::Unrecognized(_) => None,
        }
    }

    /// Check if this is one of the three named commands.
    pub const fn is_recognized(&self) -> bool {
        !matches!(self, Command::Unrecognized(_))
    }

    fn encoded_len(&self) -> usize {
        match self {
            Command::Unrecognized(raw) => raw.len(),
            named => named.literal().map_or(0, |l| l.len() + 1),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.literal() {
            Some(literal) => f.write_str(literal),
            None => write!(f, "<unrecognized {} bytes>", self.encoded_len()),
        }
    }
}

/// Encode a command into its wire frame.
///
/// Named commands become literal + NUL. `Unrecognized` re-emits its raw bytes.
pub fn encode(command: &Command) -> Payload {
    match command {
        Command::Unrecognized(raw) => *raw,
        named => {
            let literal = named.literal().unwrap_or_default().as_bytes();
            let mut payload = Payload::truncated(literal);
            // Literals are at most 5 bytes: the terminator always fits
            payload.bytes[literal.len()] = TERMINATOR;
            payload.len += 1;
            payload
        }
    }
}

/// Decode a wire frame. Never fails.
///
/// Anything that is not exactly a literal (optionally followed by a single
/// NUL) becomes [`Command::Unrecognized`] carrying the raw input.
pub fn decode(frame: &[u8]) -> Command {
    let body = match frame.split_last() {
        Some((&TERMINATOR, rest)) => rest,
        _ => frame,
    };

    match body {
        b"Open" => Command::Open,
        b"Close" => Command::Close,
        b"Alarm" => Command::Alarm,
        _ => Command::Unrecognized(Payload::truncated(frame)),
    }
}
