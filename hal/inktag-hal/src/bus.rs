//! Half-duplex three-wire bus
//!
//! Register-programmed radio ICs such as the A7106 expose a synchronous
//! serial port with a chip select, a clock and a single bidirectional data
//! line. A transaction is always: select, clock out bytes, optionally turn
//! the data line around and clock in bytes, deselect. Both directions are
//! never active at once.

use core::convert::Infallible;

use crate::gpio::{FlexPin, OutputPin};

/// Half-duplex synchronous bus master
pub trait ThreeWireBus {
    /// Error type for bus operations
    type Error;

    /// Assert chip select
    fn select(&mut self);

    /// Release chip select, ending the transaction
    fn deselect(&mut self);

    /// Clock bytes out on the data line, MSB first
    fn write(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Turn the data line around and clock bytes in, MSB first
    ///
    /// The line is driven again on the next [`write`](Self::write).
    fn read(&mut self, buf: &mut [u8]) -> Result<(), Self::Error>;
}

/// Bit-banged three-wire bus over plain GPIO
///
/// Clock idles low. Outgoing bits are presented while SCK is low and
/// latched by the peripheral on the rising edge; incoming bits are sampled
/// while SCK is high.
pub struct BitBangBus<CS, SCK, SDIO> {
    cs: CS,
    sck: SCK,
    sdio: SDIO,
    driving: bool,
}

impl<CS, SCK, SDIO> BitBangBus<CS, SCK, SDIO>
where
    CS: OutputPin,
    SCK: OutputPin,
    SDIO: FlexPin,
{
    /// Create a new bus, leaving the device deselected and SDIO driven low
    pub fn new(mut cs: CS, mut sck: SCK, mut sdio: SDIO) -> Self {
        cs.set_high();
        sck.set_low();
        sdio.set_as_output();
        sdio.set_low();
        Self {
            cs,
            sck,
            sdio,
            driving: true,
        }
    }

    /// Release the pins
    pub fn release(self) -> (CS, SCK, SDIO) {
        (self.cs, self.sck, self.sdio)
    }

    fn drive(&mut self) {
        if !self.driving {
            self.sdio.set_as_output();
            self.driving = true;
        }
    }

    fn listen(&mut self) {
        if self.driving {
            self.sdio.set_as_input();
            self.driving = false;
        }
    }

    fn shift_out(&mut self, byte: u8) {
        for bit in (0..8).rev() {
            self.sck.set_low();
            self.sdio.set_state(byte & (1 << bit) != 0);
            self.sck.set_high();
        }
        self.sck.set_low();
    }

    fn shift_in(&mut self) -> u8 {
        let mut byte = 0u8;
        for _ in 0..8 {
            self.sck.set_high();
            byte = (byte << 1) | self.sdio.is_high() as u8;
            self.sck.set_low();
        }
        byte
    }
}

impl<CS, SCK, SDIO> ThreeWireBus for BitBangBus<CS, SCK, SDIO>
where
    CS: OutputPin,
    SCK: OutputPin,
    SDIO: FlexPin,
{
    type Error = Infallible;

    fn select(&mut self) {
        self.sck.set_low();
        self.cs.set_low();
    }

    fn deselect(&mut self) {
        self.cs.set_high();
        self.drive();
    }

    fn write(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.drive();
        for &byte in data {
            self.shift_out(byte);
        }
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.listen();
        for slot in buf.iter_mut() {
            *slot = self.shift_in();
        }
        Ok(())
    }
}
