//! GPIO wrappers
//!
//! Thin newtypes so embassy-rp pins can implement the `inktag-hal` pin
//! traits.

use embassy_rp::gpio::{Flex, Input, Output};
use inktag_hal::{FlexPin, InputPin, OutputPin};

/// Push-pull output
pub struct RpOutput<'d>(pub Output<'d>);

impl OutputPin for RpOutput<'_> {
    fn set_high(&mut self) {
        self.0.set_high();
    }

    fn set_low(&mut self) {
        self.0.set_low();
    }

    fn is_set_high(&self) -> bool {
        self.0.is_set_high()
    }
}

/// Plain input
pub struct RpInput<'d>(pub Input<'d>);

impl InputPin for RpInput<'_> {
    fn is_high(&self) -> bool {
        self.0.is_high()
    }
}

/// Bidirectional pin, used for the radio's SDIO line
pub struct RpFlex<'d>(pub Flex<'d>);

impl OutputPin for RpFlex<'_> {
    fn set_high(&mut self) {
        self.0.set_high();
    }

    fn set_low(&mut self) {
        self.0.set_low();
    }

    fn is_set_high(&self) -> bool {
        self.0.is_set_high()
    }
}

impl InputPin for RpFlex<'_> {
    fn is_high(&self) -> bool {
        self.0.is_high()
    }
}

impl FlexPin for RpFlex<'_> {
    fn set_as_input(&mut self) {
        self.0.set_as_input();
    }

    fn set_as_output(&mut self) {
        self.0.set_as_output();
    }
}
