//! GPIO pin abstractions
//!
//! Provides traits for digital pins that can be implemented by
//! chip-specific HALs. The bit-banged radio bus needs one pin whose
//! direction can be swapped mid-transaction, hence [`FlexPin`].

/// Digital output pin
pub trait OutputPin {
    /// Set the pin high (logic 1)
    fn set_high(&mut self);

    /// Set the pin low (logic 0)
    fn set_low(&mut self);

    /// Set the pin to a specific state
    fn set_state(&mut self, high: bool) {
        if high {
            self.set_high();
        } else {
            self.set_low();
        }
    }

    /// Check if the pin is currently driven high
    fn is_set_high(&self) -> bool;
}

/// Digital input pin
pub trait InputPin {
    /// Check if the pin reads high (logic 1)
    fn is_high(&self) -> bool;

    /// Check if the pin reads low (logic 0)
    fn is_low(&self) -> bool {
        !self.is_high()
    }
}

/// Pin whose direction can be switched at runtime
///
/// Used for the shared data line of a three-wire bus: it is driven while
/// clocking out command and data bytes, then released to the peripheral
/// before clocking in a register read.
pub trait FlexPin: OutputPin + InputPin {
    /// Release the line and sample it as an input
    fn set_as_input(&mut self);

    /// Drive the line as an output
    fn set_as_output(&mut self);
}
