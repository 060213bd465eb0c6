//! Battery voltage via the RP2040 ADC
//!
//! The battery is read through a resistor divider on one of GPIO26-29.
//! The ADC is 12-bit against a 3.3V reference.

use embassy_rp::adc::{Adc, Blocking, Channel};
use inktag_core::traits::BatteryMonitor;

/// ADC reference voltage in millivolts
const VREF_MV: u32 = 3300;
/// Full-scale ADC reading
const ADC_MAX: u32 = 4096;

/// Convert a raw reading to battery millivolts
///
/// `divider` is (top + bottom) / bottom of the resistor divider, as a
/// numerator/denominator pair.
pub fn raw_to_millivolts(raw: u16, divider: (u32, u32)) -> u16 {
    let (num, den) = divider;
    let mv = u32::from(raw) * VREF_MV * num / (ADC_MAX * den.max(1));
    mv.min(u32::from(u16::MAX)) as u16
}

/// Battery gauge on an ADC channel
pub struct AdcBattery<'d> {
    adc: Adc<'d, Blocking>,
    channel: Channel<'d>,
    divider: (u32, u32),
    last_mv: u16,
}

impl<'d> AdcBattery<'d> {
    /// Create a gauge; `divider` as for [`raw_to_millivolts`]
    pub fn new(adc: Adc<'d, Blocking>, channel: Channel<'d>, divider: (u32, u32)) -> Self {
        Self {
            adc,
            channel,
            divider,
            last_mv: 0,
        }
    }
}

impl BatteryMonitor for AdcBattery<'_> {
    /// Falls back to the previous reading if a conversion fails
    fn read_millivolts(&mut self) -> u16 {
        if let Ok(raw) = self.adc.blocking_read(&mut self.channel) {
            self.last_mv = raw_to_millivolts(raw, self.divider);
        }
        self.last_mv
    }
}
