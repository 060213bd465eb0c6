//! Battery gauge trait

/// Source of the supply voltage reported in every Hello
pub trait BatteryMonitor {
    /// Supply voltage in millivolts
    ///
    /// Takes `&mut self` because ADC reads typically require mutable access.
    fn read_millivolts(&mut self) -> u16;
}

/// Fixed reading, for boards without a gauge
impl BatteryMonitor for u16 {
    fn read_millivolts(&mut self) -> u16 {
        *self
    }
}
