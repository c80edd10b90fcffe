use log::{debug, warn};
use std::fmt;

// -- scale of the fine temperature relative to degrees Celsius
const BMP280_FINE_TEMPERATURE_SCALE: f64 = 5120.0;
// -- offset of the raw pressure reading (2^20)
const BMP280_PRESSURE_RAW_OFFSET: f64 = 1048576.0;
// -- number of decimal places of the calibrated values
const BMP280_DECIMAL_PLACES: i32 = 2;

/// Factory trim coefficients of a BMP280 style temperature/pressure sensor.
///
/// The record is handed over fully decoded by whoever owns the sensor bus;
/// nothing in this module reads, validates or changes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CalibrationData
{
    // -- Calibration coefficients for the temperature sensor
    pub dig_t1: u16,
    pub dig_t2: i16,
    pub dig_t3: i16,
    // -- Calibration coefficients for the pressure sensor
    pub dig_p1: u16,
    pub dig_p2: i16,
    pub dig_p3: i16,
    pub dig_p4: i16,
    pub dig_p5: i16,
    pub dig_p6: i16,
    pub dig_p7: i16,
    pub dig_p8: i16,
    pub dig_p9: i16,
}

impl fmt::Display for CalibrationData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "T1={} T2={} T3={} P1={} P2={} P3={} P4={} P5={} P6={} P7={} P8={} P9={}",
            self.dig_t1, self.dig_t2, self.dig_t3,
            self.dig_p1, self.dig_p2, self.dig_p3, self.dig_p4, self.dig_p5,
            self.dig_p6, self.dig_p7, self.dig_p8, self.dig_p9)
    }
}

// -- couples temperature and pressure compensation of one reading
#[derive(Debug, Clone, Copy)]
struct FineTemperature(f64);

#[derive(Debug, Clone, Copy)]
struct FineTemperatureFixed(i32);

fn round_to_decimals(value: f64) -> f64 {
    let factor = 10f64.powi(BMP280_DECIMAL_PLACES);
    (value * factor).round() / factor
}

fn compensate_temperature(raw_temperature: i32, calib_data: &CalibrationData) -> (f64, FineTemperature) {
    let var1: f64 = ((raw_temperature as f64) / 16384.0) - ((calib_data.dig_t1 as f64) / 1024.0);
    let var1: f64 = var1 * (calib_data.dig_t2 as f64);
    let var2: f64 = ((raw_temperature as f64) / 131072.0) - ((calib_data.dig_t1 as f64) / 8192.0);
    let var2: f64 = (var2 * var2) * (calib_data.dig_t3 as f64);
    let temperature = (var1 + var2) / BMP280_FINE_TEMPERATURE_SCALE;
    // -- the fine temperature is derived from the unrounded temperature
    let t_fine = FineTemperature(temperature * BMP280_FINE_TEMPERATURE_SCALE);
    (temperature, t_fine)
}

fn compensate_pressure(raw_pressure: i32, t_fine: FineTemperature, calib_data: &CalibrationData) -> f64 {
    let var1 = (t_fine.0 / 2.0) - 64000.0;
    let var2 = var1 * var1 * (calib_data.dig_p6 as f64) / 32768.0;
    let var2 = var2 + var1 * (calib_data.dig_p5 as f64) * 2.0;
    let var2 = (var2 / 4.0) + (calib_data.dig_p4 as f64) * 65536.0;
    let var3 = (calib_data.dig_p3 as f64) * var1 * var1 / 524288.0;
    let var1 = (var3 + (calib_data.dig_p2 as f64) * var1) / 524288.0;
    let var1 = (1.0 + var1 / 32768.0) * (calib_data.dig_p1 as f64);
    // -- var1 == 0.0 is not caught, the division yields +/-inf or NaN
    let pressure = BMP280_PRESSURE_RAW_OFFSET - (raw_pressure as f64);
    let pressure = (pressure - (var2 / 4096.0)) * 6250.0 / var1;
    let var1 = (calib_data.dig_p9 as f64) * pressure * pressure / 2147483648.0;
    let var2 = pressure * (calib_data.dig_p8 as f64) / 32768.0;
    pressure + (var1 + var2 + (calib_data.dig_p7 as f64)) / 16.0
}

/// Converts a raw temperature and a raw pressure reading into degrees Celsius
/// and Pascals, both rounded to two decimal places.
///
/// Evaluation order follows the floating point reference code of the
/// datasheet. Degenerate pressure coefficients that zero the pressure
/// divisor produce a non-finite pressure (IEEE-754 infinity or NaN).
pub fn calibrate(raw_temperature: i32, raw_pressure: i32, calibration: &CalibrationData) -> (f64, f64) {
    let (temperature, t_fine) = compensate_temperature(raw_temperature, calibration);
    debug!("Raw temperature {raw_temperature} gives fine temperature {}", t_fine.0);
    let pressure = compensate_pressure(raw_pressure, t_fine, calibration);
    if !pressure.is_finite() {
        warn!("Pressure compensation of raw pressure {raw_pressure} is not finite: {pressure}");
    }
    (round_to_decimals(temperature), round_to_decimals(pressure))
}

fn compensate_temperature_fixed(raw_temperature: i32, calib_data: &CalibrationData) -> (i32, FineTemperatureFixed) {
    let raw_temperature = raw_temperature as i64;
    let var1a: i64 = (raw_temperature >> 3) - ((calib_data.dig_t1 as i64) << 1);
    let var1: i64 = var1a.wrapping_mul(calib_data.dig_t2 as i64) >> 11;
    let var2a: i64 = (raw_temperature >> 4) - (calib_data.dig_t1 as i64);
    let var2: i64 = (var2a.wrapping_mul(var2a) >> 12).wrapping_mul(calib_data.dig_t3 as i64) >> 14;
    let t_fine = var1.wrapping_add(var2) as i32;
    // -- temperature in 1/100 degree Celsius
    let temperature = (t_fine.wrapping_mul(5).wrapping_add(128)) >> 8;
    (temperature, FineTemperatureFixed(t_fine))
}

// -- returns the pressure in Q24.8 Pascal, None if the divisor is zero
fn compensate_pressure_fixed(raw_pressure: i32, t_fine: FineTemperatureFixed, calib_data: &CalibrationData) -> Option<i64> {
    let var1: i64 = (t_fine.0 as i64) - 128000;
    let var2: i64 = var1.wrapping_mul(var1).wrapping_mul(calib_data.dig_p6 as i64);
    let var2 = var2.wrapping_add(var1.wrapping_mul(calib_data.dig_p5 as i64) << 17);
    let var2 = var2.wrapping_add((calib_data.dig_p4 as i64) << 35);
    let var1 = (var1.wrapping_mul(var1).wrapping_mul(calib_data.dig_p3 as i64) >> 8)
        .wrapping_add(var1.wrapping_mul(calib_data.dig_p2 as i64) << 12);
    let var1 = ((1i64 << 47).wrapping_add(var1)).wrapping_mul(calib_data.dig_p1 as i64) >> 33;
    if var1 == 0 {
        return None;
    }
    let pressure: i64 = 1048576 - (raw_pressure as i64);
    let pressure = ((pressure << 31).wrapping_sub(var2)).wrapping_mul(3125).wrapping_div(var1);
    let var1 = (calib_data.dig_p9 as i64).wrapping_mul(pressure >> 13).wrapping_mul(pressure >> 13) >> 25;
    let var2 = (calib_data.dig_p8 as i64).wrapping_mul(pressure) >> 19;
    Some((pressure.wrapping_add(var1).wrapping_add(var2) >> 8).wrapping_add((calib_data.dig_p7 as i64) << 4))
}

/// Integer variant of [`calibrate`] following the 32-bit temperature and
/// 64-bit pressure reference code of the datasheet.
///
/// The integer code has no infinity, so a zero pressure divisor is reported
/// as a NaN pressure.
pub fn calibrate_fixed(raw_temperature: i32, raw_pressure: i32, calibration: &CalibrationData) -> (f64, f64) {
    let (temperature, t_fine) = compensate_temperature_fixed(raw_temperature, calibration);
    debug!("Raw temperature {raw_temperature} gives fixed fine temperature {}", t_fine.0);
    let temperature = temperature as f64 / 100.0;
    let pressure = match compensate_pressure_fixed(raw_pressure, t_fine, calibration) {
        Some(pressure) => pressure as f64 / 256.0,
        None => {
            warn!("Pressure compensation of raw pressure {raw_pressure} divides by zero");
            f64::NAN
        }
    };
    (round_to_decimals(temperature), round_to_decimals(pressure))
}
