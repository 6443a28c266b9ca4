//! Link-layer addressing: peer MAC addresses and radio channels.

use core::fmt;

/// Length of a link-layer address.
pub const ADDRESS_LEN: usize = 6;

/// 6-byte link-layer (MAC) address of a radio peer.
///
/// All-zero is not a valid address. [`PeerAddress::BROADCAST`] reaches every
/// listener on the channel.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeerAddress([u8; ADDRESS_LEN]);

impl PeerAddress {
    /// Broadcast address (`ff:ff:ff:ff:ff:ff`).
    pub const BROADCAST: Self = Self([0xff; ADDRESS_LEN]);

    /// Create from raw octets. Returns `None` for the all-zero address.
    pub const fn new(octets: [u8; ADDRESS_LEN]) -> Option<Self> {
        let mut i = 0;
        while i < ADDRESS_LEN {
            if octets[i] != 0 {
                return Some(Self(octets));
            }
            i += 1;
        }
        None
    }

    /// Create from a slice (e.g. a MAC handed over by the radio driver).
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let octets: [u8; ADDRESS_LEN] = bytes.try_into().ok()?;
        Self::new(octets)
    }

    /// Raw octets.
    #[inline]
    pub const fn octets(&self) -> [u8; ADDRESS_LEN] {
        self.0
    }

    /// Check if this is the broadcast address.
    #[inline]
    pub const fn is_broadcast(&self) -> bool {
        let mut i = 0;
        while i < ADDRESS_LEN {
            if self.0[i] != 0xff {
                return false;
            }
            i += 1;
        }
        true
    }
}

impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl fmt::Debug for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PeerAddress({})", self)
    }
}

/// Radio channel shared by both nodes (2.4 GHz Wi-Fi channels 1-14).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Channel(u8);

impl Channel {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 14;

    /// Create a channel. Returns `None` outside 1-14.
    pub const fn new(number: u8) -> Option<Self> {
        if number >= Self::MIN && number <= Self::MAX {
            Some(Self(number))
        } else {
            None
        }
    }

    /// Create a channel in const context. Fails compilation when out of range.
    pub const fn from_const(number: u8) -> Self {
        match Self::new(number) {
            Some(channel) => channel,
            None => panic!("radio channel out of range"),
        }
    }

    #[inline]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ch{}", self.0)
    }
}
