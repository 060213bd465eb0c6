//! 2.13" e-paper panel (122×250, SSD1675-class controller)
//!
//! The panel sits on its own bit-banged 4-wire SPI (CS, D/C, SCK, MOSI)
//! with a BUSY input and a P-FET on its supply, low = powered.

use embedded_hal::delay::DelayNs;
use inktag_core::poll::poll_until;
use inktag_core::traits::{EpdPanel, RenderError};
use inktag_hal::{InputPin, OutputPin};

/// Panel width in pixels (gate lines)
pub const WIDTH: u32 = 122;
/// Panel height in pixels (source lines)
pub const HEIGHT: u32 = 250;
/// Bytes per row, width rounded up to a whole byte
pub const ROW_BYTES: u32 = (WIDTH + 7) / 8;
/// Bytes in one full frame
pub const FRAME_LEN: u32 = ROW_BYTES * HEIGHT;

/// BUSY polls before giving up, one per millisecond
const BUSY_POLL_LIMIT: u32 = 5_000;

/// Controller commands
mod cmd {
    pub const DRIVER_OUTPUT: u8 = 0x01;
    pub const DEEP_SLEEP: u8 = 0x10;
    pub const DATA_ENTRY_MODE: u8 = 0x11;
    pub const SW_RESET: u8 = 0x12;
    pub const MASTER_ACTIVATE: u8 = 0x20;
    pub const DISPLAY_UPDATE_1: u8 = 0x21;
    pub const DISPLAY_UPDATE_2: u8 = 0x22;
    pub const WRITE_RAM: u8 = 0x24;
    pub const VCOM: u8 = 0x2C;
    pub const WRITE_LUT: u8 = 0x32;
    pub const DUMMY_LINE: u8 = 0x3A;
    pub const GATE_LINE_WIDTH: u8 = 0x3B;
    pub const BORDER: u8 = 0x3C;
    pub const BOOSTER_SOFT_START: u8 = 0x0C;
    pub const RAM_X_WINDOW: u8 = 0x44;
    pub const RAM_Y_WINDOW: u8 = 0x45;
    pub const RAM_X_COUNTER: u8 = 0x4E;
    pub const RAM_Y_COUNTER: u8 = 0x4F;
}

/// Full-refresh waveform
const LUT_FULL: [u8; 32] = [
    0xAA, 0x65, 0x55, 0x8A, 0x16, 0x66, 0x65, 0x18, 0x88, 0x99, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x14, 0x14, 0x14, 0x14, 0x14, 0x14, 0x14, 0x14, 0x14, 0x14, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00,
];

/// Panel pins
pub struct EpdPins<OUT, IN> {
    pub power: OUT,
    pub cs: OUT,
    pub dc: OUT,
    pub reset: OUT,
    pub sck: OUT,
    pub mosi: OUT,
    pub busy: IN,
}

/// Bit-banged panel driver
pub struct Epd<OUT, IN, D> {
    pins: EpdPins<OUT, IN>,
    delay: D,
}

impl<OUT, IN, D> Epd<OUT, IN, D>
where
    OUT: OutputPin,
    IN: InputPin,
    D: DelayNs,
{
    /// Create the driver with the panel unpowered
    pub fn new(mut pins: EpdPins<OUT, IN>, delay: D) -> Self {
        pins.power.set_high();
        pins.cs.set_high();
        pins.sck.set_low();
        Self { pins, delay }
    }

    fn write_byte(&mut self, byte: u8) {
        self.pins.cs.set_low();
        for bit in (0..8).rev() {
            self.pins.mosi.set_state(byte & (1 << bit) != 0);
            self.pins.sck.set_high();
            self.pins.sck.set_low();
        }
        self.pins.cs.set_high();
    }

    fn command(&mut self, command: u8) {
        self.pins.dc.set_low();
        self.write_byte(command);
        self.pins.dc.set_high();
    }

    fn command_with(&mut self, command: u8, args: &[u8]) {
        self.command(command);
        for &arg in args {
            self.write_byte(arg);
        }
    }

    fn wait_busy(&mut self) -> Result<(), RenderError> {
        let Self { pins, delay } = self;
        poll_until(BUSY_POLL_LIMIT, || {
            if pins.busy.is_low() {
                return true;
            }
            delay.delay_ms(1);
            false
        })
        .map(|_| ())
        .map_err(|_| RenderError::PanelTimeout)
    }
}

impl<OUT, IN, D> EpdPanel for Epd<OUT, IN, D>
where
    OUT: OutputPin,
    IN: InputPin,
    D: DelayNs,
{
    fn setup(&mut self) {
        self.pins.cs.set_high();
        self.pins.dc.set_high();
        self.pins.sck.set_low();
        self.pins.mosi.set_low();
        self.pins.reset.set_high();
    }

    fn reset(&mut self) -> Result<(), RenderError> {
        self.pins.power.set_low();
        self.delay.delay_ms(10);

        self.pins.reset.set_low();
        self.delay.delay_ms(1);
        self.pins.reset.set_high();
        self.delay.delay_ms(10);

        self.command(cmd::SW_RESET);
        self.wait_busy()
    }

    fn init(&mut self) -> Result<(), RenderError> {
        let [lines_lo, lines_hi] = ((HEIGHT - 1) as u16).to_le_bytes();
        self.command_with(cmd::DRIVER_OUTPUT, &[lines_lo, lines_hi]);
        self.command_with(cmd::DUMMY_LINE, &[0x1A]);
        self.command_with(cmd::GATE_LINE_WIDTH, &[0x04]);
        // X increment, Y decrement
        self.command_with(cmd::DATA_ENTRY_MODE, &[0x01]);
        self.command_with(cmd::VCOM, &[0x79]);
        self.command_with(cmd::BOOSTER_SOFT_START, &[0xD7, 0xD6, 0x9D]);
        self.command_with(cmd::BORDER, &[0x33]);
        self.command_with(cmd::WRITE_LUT, &LUT_FULL);
        self.command_with(cmd::DISPLAY_UPDATE_1, &[0x83]);
        self.wait_busy()
    }

    fn draw_start(&mut self) {
        let [y_lo, y_hi] = ((HEIGHT - 1) as u16).to_le_bytes();
        let x_end = (ROW_BYTES - 1) as u8;

        self.command_with(cmd::RAM_X_WINDOW, &[0x00, x_end]);
        self.command_with(cmd::RAM_Y_WINDOW, &[y_lo, y_hi, 0x00, 0x00]);
        self.command_with(cmd::RAM_X_COUNTER, &[0x00]);
        self.command_with(cmd::RAM_Y_COUNTER, &[y_lo, y_hi]);
        self.command(cmd::WRITE_RAM);
    }

    fn data(&mut self, byte: u8) {
        self.write_byte(byte);
    }

    fn display(&mut self) -> Result<(), RenderError> {
        self.command_with(cmd::DISPLAY_UPDATE_2, &[0xC4]);
        self.command(cmd::MASTER_ACTIVATE);
        self.wait_busy()
    }

    fn shutdown(&mut self) {
        self.command_with(cmd::DEEP_SLEEP, &[0x01]);
        self.delay.delay_ms(1);
        self.pins.power.set_high();
    }

    fn frame_len(&self) -> u32 {
        FRAME_LEN
    }
}
