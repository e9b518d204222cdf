//! Raw ADC reading conversions.
//!
//! The power-monitoring board samples its rails with a 10-bit ADC referenced
//! to 3.3 V. Rail voltages pass through a resistor divider; the auxiliary
//! current goes through a hall-effect sensor centred on half the reference.

/// Largest raw ADC count.
pub const ADC_MAX: f64 = 1023.0;
/// ADC reference voltage.
pub const ADC_REFERENCE_VOLTS: f64 = 3.3;
/// Ratio of the rail voltage divider.
pub const VOLTAGE_DIVIDER_RATIO: f64 = 5.7;
/// Hall sensor output at zero current.
pub const CURRENT_ZERO_VOLTS: f64 = 1.65;
/// Hall sensor sensitivity, volts per ampere.
pub const CURRENT_VOLTS_PER_AMP: f64 = 0.066;
/// Readings below this magnitude are sensor noise.
pub const CURRENT_NOISE_AMPS: f64 = 0.1;

/// Voltage seen at the ADC pin.
#[must_use]
pub fn adc_volts(raw: f64) -> f64 {
    raw.clamp(0.0, ADC_MAX) / ADC_MAX * ADC_REFERENCE_VOLTS
}

/// Rail voltage in volts, rounded to two decimals.
#[must_use]
pub fn rail_voltage(raw: f64) -> f64 {
    round2(adc_volts(raw) * VOLTAGE_DIVIDER_RATIO)
}

/// Rail current in amperes, rounded to two decimals. Small readings around
/// the zero point are reported as exactly zero.
#[must_use]
pub fn rail_current(raw: f64) -> f64 {
    let amps = (adc_volts(raw) - CURRENT_ZERO_VOLTS) / CURRENT_VOLTS_PER_AMP;
    if amps.abs() < CURRENT_NOISE_AMPS {
        0.0
    } else {
        round2(amps)
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn should_map_full_scale_to_divider_maximum() {
        assert!(close(rail_voltage(1023.0), 18.81));
    }

    #[test]
    fn should_map_zero_to_zero_volts() {
        assert!(close(rail_voltage(0.0), 0.0));
    }

    #[test]
    fn should_clamp_out_of_range_readings() {
        assert!(close(rail_voltage(5000.0), rail_voltage(1023.0)));
        assert!(close(rail_voltage(-3.0), 0.0));
    }

    #[test]
    fn should_report_zero_current_near_midpoint() {
        assert!(close(rail_current(511.5), 0.0));
        assert!(close(rail_current(513.0), 0.0));
    }

    #[test]
    fn should_report_positive_current_above_midpoint() {
        let amps = rail_current(700.0);
        assert!(amps > 9.0 && amps < 10.0, "got {amps}");
    }

    #[test]
    fn should_report_negative_current_below_midpoint() {
        assert!(rail_current(300.0) < 0.0);
    }
}
