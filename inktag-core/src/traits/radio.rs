//! Transceiver trait

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 32-bit radio address
///
/// Used both as the tag's own receive filter and as the destination filter
/// when transmitting. The transceiver holds one filter at a time, so every
/// transaction sets it explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RadioAddress(pub u32);

impl RadioAddress {
    /// Byte order the transceiver's ID register expects
    pub fn to_register_bytes(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }
}

/// Errors surfaced by a transceiver transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RadioError {
    /// Busy line never cleared within the poll bound
    Timeout,
    /// CRC or FEC error flagged on a received packet
    CorruptedReceive,
    /// Calibration failed at init; the radio must not be used this boot
    NotReady,
    /// Payload empty or larger than the hardware FIFO
    InvalidLength,
    /// Underlying bus error
    Bus,
}

/// Bounded-time packet transceiver
///
/// Every call wakes the radio first if needed; callers never manage power
/// around a transaction. Calls return with the radio idle.
pub trait Radio {
    /// Send `payload` to `dest`
    ///
    /// A busy line that never clears is [`RadioError::Timeout`]. No internal
    /// retry.
    fn transmit(&mut self, dest: RadioAddress, payload: &[u8]) -> Result<(), RadioError>;

    /// Wait up to `timeout` polls for a packet addressed to `own`
    ///
    /// Packets are fixed length: `buf.len()` is the length listened for.
    /// `timeout` bounds every busy-line poll of the transaction, including
    /// the wait for the chip to start. `Ok(None)` means nothing arrived, an
    /// expected outcome. On success `buf` is filled completely and its
    /// length returned.
    fn receive(
        &mut self,
        own: RadioAddress,
        buf: &mut [u8],
        timeout: u32,
    ) -> Result<Option<usize>, RadioError>;

    /// Enter the lowest-power state that keeps configuration
    fn sleep(&mut self) -> Result<(), RadioError>;
}
