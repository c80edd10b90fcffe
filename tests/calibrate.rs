use approx::assert_abs_diff_eq;
use proptest::prelude::*;

use bmp280_calibration::bmp280::{calibrate, calibrate_fixed, CalibrationData};

const RAW_TEMPERATURE: i32 = 519888;
const RAW_PRESSURE: i32 = 415148;

fn datasheet_calibration() -> CalibrationData {
    CalibrationData {
        dig_t1: 27504, dig_t2: 26435, dig_t3: -1000,
        dig_p1: 36477, dig_p2: -10685, dig_p3: 3024, dig_p4: 2855, dig_p5: 140,
        dig_p6: -7, dig_p7: 15500, dig_p8: -14600, dig_p9: 6000,
    }
}

fn has_at_most_two_decimals(value: f64) -> bool {
    let text = format!("{value}");
    match text.split_once('.') {
        Some((_, decimals)) => decimals.len() <= 2,
        None => true,
    }
}

#[test]
fn reproduces_datasheet_vector() {
    let calibration = datasheet_calibration();
    assert_eq!(calibrate(RAW_TEMPERATURE, RAW_PRESSURE, &calibration), (25.08, 100653.27));
}

#[test]
fn fixed_reproduces_datasheet_vector() {
    let calibration = datasheet_calibration();
    assert_eq!(calibrate_fixed(RAW_TEMPERATURE, RAW_PRESSURE, &calibration), (25.08, 100653.25));
}

#[test]
fn fixed_and_float_agree() {
    let calibration = datasheet_calibration();
    let (temperature, pressure) = calibrate(RAW_TEMPERATURE, RAW_PRESSURE, &calibration);
    let (temperature_fixed, pressure_fixed) = calibrate_fixed(RAW_TEMPERATURE, RAW_PRESSURE, &calibration);
    assert_abs_diff_eq!(temperature, temperature_fixed, epsilon = 0.1);
    assert_abs_diff_eq!(pressure, pressure_fixed, epsilon = 1.0);
}

#[test]
fn zero_pressure_divisor_is_not_finite() {
    let calibration = CalibrationData { dig_p1: 0, ..datasheet_calibration() };
    let (temperature, pressure) = calibrate(RAW_TEMPERATURE, RAW_PRESSURE, &calibration);
    assert_eq!(temperature, 25.08);
    assert!(!pressure.is_finite());
}

#[test]
fn zero_pressure_divisor_fixed_is_nan() {
    let calibration = CalibrationData { dig_p1: 0, ..datasheet_calibration() };
    let (temperature, pressure) = calibrate_fixed(RAW_TEMPERATURE, RAW_PRESSURE, &calibration);
    assert_eq!(temperature, 25.08);
    assert!(pressure.is_nan());
}

#[test]
fn all_zero_calibration_is_computed_through() {
    let (temperature, pressure) = calibrate(RAW_TEMPERATURE, RAW_PRESSURE, &CalibrationData::default());
    assert_eq!(temperature, 0.0);
    assert!(!pressure.is_finite());
}

#[test]
fn temperature_coefficients_move_pressure() {
    let calibration = CalibrationData { dig_t2: 26000, ..datasheet_calibration() };
    let (temperature, pressure) = calibrate(RAW_TEMPERATURE, RAW_PRESSURE, &calibration);
    assert_ne!(temperature, 25.08);
    assert_ne!(pressure, 100653.27);
}

#[test]
fn rising_raw_temperature_warms() {
    let calibration = datasheet_calibration();
    let mut temperature_last = f64::MIN;
    for raw_temperature in (400000..600000).step_by(1000) {
        let (temperature, _) = calibrate(raw_temperature, RAW_PRESSURE, &calibration);
        assert!(temperature >= temperature_last, "{temperature} < {temperature_last} at {raw_temperature}");
        temperature_last = temperature;
    }
}

prop_compose! {
    fn pressure_coefficients()(dig_p1 in 1u16..=u16::MAX, dig_p2 in any::<i16>(),
        dig_p3 in any::<i16>(), dig_p4 in any::<i16>(), dig_p5 in any::<i16>(), dig_p6 in any::<i16>(),
        dig_p7 in any::<i16>(), dig_p8 in any::<i16>(), dig_p9 in any::<i16>()) -> CalibrationData {
        CalibrationData { dig_p1, dig_p2, dig_p3, dig_p4, dig_p5, dig_p6, dig_p7, dig_p8, dig_p9,
            ..datasheet_calibration() }
    }
}

proptest! {
    #[test]
    fn calibrate_is_deterministic(raw_temperature: i32, raw_pressure: i32, dig_t1: u16, dig_t2: i16, dig_t3: i16) {
        let calibration = CalibrationData { dig_t1, dig_t2, dig_t3, ..datasheet_calibration() };
        let first = calibrate(raw_temperature, raw_pressure, &calibration);
        let second = calibrate(raw_temperature, raw_pressure, &calibration);
        // -- compare bit patterns so that NaN results count as equal
        prop_assert_eq!(first.0.to_bits(), second.0.to_bits());
        prop_assert_eq!(first.1.to_bits(), second.1.to_bits());
    }

    #[test]
    fn pressure_coefficients_leave_temperature_alone(raw_temperature in 0i32..1 << 20,
        raw_pressure in 0i32..1 << 20, calibration in pressure_coefficients()) {
        let (temperature, _) = calibrate(raw_temperature, raw_pressure, &calibration);
        let (expected, _) = calibrate(raw_temperature, raw_pressure, &datasheet_calibration());
        prop_assert_eq!(temperature, expected);
    }

    #[test]
    fn results_have_two_decimals(raw_temperature in 300000i32..700000, raw_pressure in 200000i32..600000) {
        let (temperature, pressure) = calibrate(raw_temperature, raw_pressure, &datasheet_calibration());
        prop_assert!(has_at_most_two_decimals(temperature), "temperature {}", temperature);
        prop_assert!(has_at_most_two_decimals(pressure), "pressure {}", pressure);
    }

    #[test]
    fn fixed_stays_total(raw_temperature: i32, raw_pressure: i32, calibration in pressure_coefficients()) {
        let _ = calibrate_fixed(raw_temperature, raw_pressure, &calibration);
    }
}
