//! AMICCOM A7106 2.4GHz transceiver driver
//!
//! The A7106 is a register-programmed GFSK transceiver with a 64-byte
//! packet FIFO. It is wired in three-wire mode: chip select, clock and a
//! single bidirectional data line, plus GIO2 configured as WTR, which stays
//! high while a transmit or receive is in flight.
//!
//! # Transactions
//!
//! Every transaction follows the same shape:
//! - Wake from sleep if needed (standby strobe + crystal settle)
//! - Program the ID register with the address filter for this transfer
//! - Program the FIFO end pointer, strobe TX or RX
//! - Poll WTR with a fixed bound; on expiry force standby and give up
//!
//! # Calibration
//!
//! IF filter bank, VCO current and VCO band calibration must all pass
//! before the radio can be used. Each attempt polls the CALC busy bits a
//! bounded number of times; after the configured number of attempts the
//! driver enters [`TransceiverState::Failed`] and refuses transactions.

use embedded_hal::delay::DelayNs;
use inktag_core::config::RadioConfig;
use inktag_core::poll::{poll_until, try_poll_until, PollError};
use inktag_core::state::{Event, TransceiverState};
use inktag_core::traits::{Radio, RadioAddress, RadioError};
use inktag_hal::{InputPin, ThreeWireBus};

use super::regs::{self, reg, strobe};

/// Polls allowed for WTR to rise after a TX/RX strobe
///
/// Taken out of the transaction budget, never added to it.
const WTR_RISE_POLLS: u32 = 64;

/// Written to the ID register and read back during init
const BUS_CHECK_PATTERN: [u8; 4] = [0xA5, 0x5A, 0xC3, 0x3C];

/// A7106 driver configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct A7106Config {
    /// RF channel
    pub channel: u8,
    /// Calibration attempts before giving up
    pub calibration_attempts: u8,
    /// CALC polls per attempt
    pub calibration_poll_limit: u32,
    /// WTR polls before a transmit is declared timed out
    pub tx_poll_limit: u32,
    /// Crystal settle time after leaving sleep (µs)
    pub wake_settle_us: u32,
}

impl From<&RadioConfig> for A7106Config {
    fn from(config: &RadioConfig) -> Self {
        Self {
            channel: config.channel,
            calibration_attempts: config.calibration_attempts,
            calibration_poll_limit: config.calibration_poll_limit,
            tx_poll_limit: config.tx_poll_limit,
            wake_settle_us: config.wake_settle_us,
        }
    }
}

impl Default for A7106Config {
    fn default() -> Self {
        Self::from(&RadioConfig::default())
    }
}

/// Reasons init can leave the radio unusable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InitError {
    /// Every calibration attempt failed or timed out
    Calibration,
    /// ID register did not read back what was written
    BusCheck,
    /// Bus error while programming registers
    Bus,
}

impl From<RadioError> for InitError {
    fn from(_: RadioError) -> Self {
        InitError::Bus
    }
}

/// Transaction counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RadioStats {
    pub tx_ok: u32,
    pub tx_timeouts: u32,
    pub rx_ok: u32,
    pub rx_timeouts: u32,
    pub rx_corrupted: u32,
    pub calibration_failures: u32,
}

/// A7106 transceiver
pub struct A7106<B, W, D> {
    bus: B,
    wtr: W,
    delay: D,
    config: A7106Config,
    state: TransceiverState,
    stats: RadioStats,
}

impl<B, W, D> A7106<B, W, D>
where
    B: ThreeWireBus,
    W: InputPin,
    D: DelayNs,
{
    /// Create a driver; the chip is untouched until [`init`](Self::init)
    pub fn new(bus: B, wtr: W, delay: D, config: A7106Config) -> Self {
        Self {
            bus,
            wtr,
            delay,
            config,
            state: TransceiverState::Uninitialized,
            stats: RadioStats::default(),
        }
    }

    pub fn state(&self) -> TransceiverState {
        self.state
    }

    pub fn stats(&self) -> &RadioStats {
        &self.stats
    }

    pub fn config(&self) -> &A7106Config {
        &self.config
    }

    /// Release the bus, WTR pin and delay
    pub fn release(self) -> (B, W, D) {
        (self.bus, self.wtr, self.delay)
    }

    /// Reset, program and calibrate the chip
    ///
    /// On success the radio is in standby on the configured channel. On
    /// failure it is put to sleep and stays unusable until the next boot.
    pub fn init(&mut self) -> Result<(), InitError> {
        self.state = self.state.transition(Event::InitStarted);
        if self.state.is_terminal() {
            return Err(InitError::Calibration);
        }

        match self.configure() {
            Ok(()) => {
                self.state = self.state.transition(Event::CalibrationPassed);
                Ok(())
            }
            Err(e) => {
                self.state = self.state.transition(Event::InitFailed);
                // Best effort, the chip may be unreachable
                let _ = self.strobe(strobe::SLEEP);
                Err(e)
            }
        }
    }

    fn configure(&mut self) -> Result<(), InitError> {
        self.write_reg(reg::MODE, &[0x00])?;
        for &(register, value) in regs::INIT_TABLE {
            self.write_reg(register, &[value])?;
        }

        let mut calibrated = false;
        for _ in 0..self.config.calibration_attempts {
            if self.calibrate()? {
                calibrated = true;
                break;
            }
            self.stats.calibration_failures += 1;
        }
        if !calibrated {
            return Err(InitError::Calibration);
        }

        self.check_bus()?;
        self.write_reg(reg::PLL1, &[self.config.channel])?;
        self.strobe(strobe::STANDBY)?;
        Ok(())
    }

    /// One calibration attempt; `Ok(false)` on timeout or a failed stage
    fn calibrate(&mut self) -> Result<bool, InitError> {
        self.write_reg(reg::IF_CAL, &[0x00])?;
        self.write_reg(reg::VCO_CURRENT_CAL, &[0x00])?;
        self.write_reg(reg::VCO_BAND_CAL, &[0x00])?;
        self.strobe(strobe::PLL)?;
        self.write_reg(reg::CALC, &[regs::CALC_FBC | regs::CALC_VCC | regs::CALC_VBC])?;

        let limit = self.config.calibration_poll_limit;
        match try_poll_until(limit, || {
            self.read_byte(reg::CALC)
                .map(|calc| calc & regs::CALC_BUSY_MASK == 0)
        }) {
            Ok(_) => {}
            Err(PollError::Timeout) => return Ok(false),
            Err(PollError::Io(e)) => return Err(e.into()),
        }

        let if_cal = self.read_byte(reg::IF_CAL)?;
        let vco_current = self.read_byte(reg::VCO_CURRENT_CAL)?;
        let vco_band = self.read_byte(reg::VCO_BAND_CAL)?;
        Ok(if_cal & regs::IF_CAL_FAIL == 0
            && vco_current & regs::VCO_CURRENT_FAIL == 0
            && vco_band & regs::VCO_BAND_FAIL == 0)
    }

    fn check_bus(&mut self) -> Result<(), InitError> {
        self.write_reg(reg::ID, &BUS_CHECK_PATTERN)?;
        let mut readback = [0u8; 4];
        self.read_reg(reg::ID, &mut readback)?;
        if readback != BUS_CHECK_PATTERN {
            return Err(InitError::BusCheck);
        }
        Ok(())
    }

    /// Leave sleep and wait for the crystal to settle
    ///
    /// No-op when already awake.
    pub fn wake(&mut self) -> Result<(), RadioError> {
        match self.state {
            TransceiverState::Idle | TransceiverState::Busy => Ok(()),
            TransceiverState::Sleeping => {
                self.strobe(strobe::STANDBY)?;
                self.delay.delay_us(self.config.wake_settle_us);
                self.state = self.state.transition(Event::WakeRequested);
                Ok(())
            }
            _ => Err(RadioError::NotReady),
        }
    }

    /// Strobe TX/RX and wait for WTR to rise and fall again
    ///
    /// At most `limit` WTR polls in total. Returns `Ok(false)` if the bound
    /// expired; the chip is forced back to standby in that case.
    fn run_transaction(&mut self, start: u8, limit: u32) -> Result<bool, RadioError> {
        self.strobe(start)?;
        self.state = self.state.transition(Event::TransactionStarted);

        let wtr = &self.wtr;
        let finished = match poll_until(WTR_RISE_POLLS.min(limit), || wtr.is_high()) {
            Ok(rise_polls) => poll_until(limit - rise_polls, || wtr.is_low()).is_ok(),
            Err(_) => false,
        };

        let cancelled = if finished {
            Ok(())
        } else {
            self.strobe(strobe::STANDBY)
        };
        self.state = self.state.transition(Event::TransactionEnded);
        cancelled.map(|()| finished)
    }

    fn command(&mut self, cmd: u8, data: &[u8]) -> Result<(), RadioError> {
        self.bus.select();
        let result = self.bus.write(&[cmd]).and_then(|()| self.bus.write(data));
        self.bus.deselect();
        result.map_err(|_| RadioError::Bus)
    }

    fn strobe(&mut self, cmd: u8) -> Result<(), RadioError> {
        self.command(cmd, &[])
    }

    fn write_reg(&mut self, register: u8, data: &[u8]) -> Result<(), RadioError> {
        self.command(regs::write_cmd(register), data)
    }

    fn read_reg(&mut self, register: u8, buf: &mut [u8]) -> Result<(), RadioError> {
        self.bus.select();
        let result = self
            .bus
            .write(&[regs::read_cmd(register)])
            .and_then(|()| self.bus.read(buf));
        self.bus.deselect();
        result.map_err(|_| RadioError::Bus)
    }

    fn read_byte(&mut self, register: u8) -> Result<u8, RadioError> {
        let mut value = [0u8; 1];
        self.read_reg(register, &mut value)?;
        Ok(value[0])
    }
}

impl<B, W, D> Radio for A7106<B, W, D>
where
    B: ThreeWireBus,
    W: InputPin,
    D: DelayNs,
{
    fn transmit(&mut self, dest: RadioAddress, payload: &[u8]) -> Result<(), RadioError> {
        if payload.is_empty() || payload.len() > regs::FIFO_LEN {
            return Err(RadioError::InvalidLength);
        }
        self.wake()?;

        self.write_reg(reg::ID, &dest.to_register_bytes())?;
        self.write_reg(reg::FIFO1, &[(payload.len() - 1) as u8])?;
        self.strobe(strobe::FIFO_WRITE_RESET)?;
        self.write_reg(reg::FIFO_DATA, payload)?;

        if self.run_transaction(strobe::TX, self.config.tx_poll_limit)? {
            self.stats.tx_ok += 1;
            Ok(())
        } else {
            self.stats.tx_timeouts += 1;
            Err(RadioError::Timeout)
        }
    }

    fn receive(
        &mut self,
        own: RadioAddress,
        buf: &mut [u8],
        timeout: u32,
    ) -> Result<Option<usize>, RadioError> {
        // Fixed-length FIFO mode: the caller's buffer is the packet length
        let len = buf.len();
        if len == 0 || len > regs::FIFO_LEN {
            return Err(RadioError::InvalidLength);
        }
        self.wake()?;

        self.write_reg(reg::ID, &own.to_register_bytes())?;
        self.write_reg(reg::FIFO1, &[(len - 1) as u8])?;

        if !self.run_transaction(strobe::RX, timeout)? {
            self.stats.rx_timeouts += 1;
            return Ok(None);
        }

        let status = self.read_byte(reg::MODE)?;
        if status & (regs::MODE_CRC_ERROR | regs::MODE_FEC_ERROR) != 0 {
            self.stats.rx_corrupted += 1;
            return Err(RadioError::CorruptedReceive);
        }

        self.strobe(strobe::FIFO_READ_RESET)?;
        self.read_reg(reg::FIFO_DATA, buf)?;
        self.stats.rx_ok += 1;
        Ok(Some(len))
    }

    fn sleep(&mut self) -> Result<(), RadioError> {
        if self.state == TransceiverState::Sleeping {
            return Ok(());
        }
        self.strobe(strobe::SLEEP)?;
        self.state = self.state.transition(Event::SleepRequested);
        Ok(())
    }
}
