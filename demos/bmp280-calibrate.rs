use chrono::Local;
use clap::{Args, Parser, Subcommand};
use log::{error, info, warn};
use std::io::{self, BufRead};
use std::process::ExitCode;

use bmp280_calibration::bmp280::{calibrate, calibrate_fixed, CalibrationData};

const EXIT_CODE_SET_CTR_C_HNDLR_FAILED: u8 = 0x02;
const EXIT_CODE_READ_STDIN_FAILED: u8 = 0x51;

#[derive(Args)]
struct CalibArgs {
    #[arg(long, env = "BMP280_DIG_T1")]
    dig_t1: u16,
    #[arg(long, env = "BMP280_DIG_T2", allow_negative_numbers = true)]
    dig_t2: i16,
    #[arg(long, env = "BMP280_DIG_T3", allow_negative_numbers = true)]
    dig_t3: i16,
    #[arg(long, env = "BMP280_DIG_P1")]
    dig_p1: u16,
    #[arg(long, env = "BMP280_DIG_P2", allow_negative_numbers = true)]
    dig_p2: i16,
    #[arg(long, env = "BMP280_DIG_P3", allow_negative_numbers = true)]
    dig_p3: i16,
    #[arg(long, env = "BMP280_DIG_P4", allow_negative_numbers = true)]
    dig_p4: i16,
    #[arg(long, env = "BMP280_DIG_P5", allow_negative_numbers = true)]
    dig_p5: i16,
    #[arg(long, env = "BMP280_DIG_P6", allow_negative_numbers = true)]
    dig_p6: i16,
    #[arg(long, env = "BMP280_DIG_P7", allow_negative_numbers = true)]
    dig_p7: i16,
    #[arg(long, env = "BMP280_DIG_P8", allow_negative_numbers = true)]
    dig_p8: i16,
    #[arg(long, env = "BMP280_DIG_P9", allow_negative_numbers = true)]
    dig_p9: i16,
}

impl From<CalibArgs> for CalibrationData {
    fn from(args: CalibArgs) -> Self {
        CalibrationData {
            dig_t1: args.dig_t1, dig_t2: args.dig_t2, dig_t3: args.dig_t3,
            dig_p1: args.dig_p1, dig_p2: args.dig_p2, dig_p3: args.dig_p3,
            dig_p4: args.dig_p4, dig_p5: args.dig_p5, dig_p6: args.dig_p6,
            dig_p7: args.dig_p7, dig_p8: args.dig_p8, dig_p9: args.dig_p9,
        }
    }
}

#[derive(Subcommand)]
enum Mode {
    /// Calibrate a single reading
    Once {
        #[arg(allow_negative_numbers = true)]
        raw_temperature: i32,
        #[arg(allow_negative_numbers = true)]
        raw_pressure: i32,
    },
    /// Calibrate "raw_temperature raw_pressure" lines read from stdin
    Stream,
}

#[derive(Parser)]
struct Cli {
    // -- use the integer compensation instead of the floating point one
    #[arg(long, global = true)]
    fixed: bool,
    #[command(flatten)]
    calib: CalibArgs,
    #[command(subcommand)]
    mode: Mode,
}

fn parse_reading(line: &str) -> Option<(i32, i32)> {
    let mut fields = line.split_whitespace();
    let raw_temperature = fields.next()?.parse().ok()?;
    let raw_pressure = fields.next()?.parse().ok()?;
    if fields.next().is_some() {
        return None;
    }
    Some((raw_temperature, raw_pressure))
}

fn main() -> ExitCode {

    // -- read .env file
    dotenv::dotenv().ok();
    // -- setup logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let now = Local::now();
    info!("Starting up: {now}");

    let cli = Cli::parse();
    let compensate: fn(i32, i32, &CalibrationData) -> (f64, f64) = if cli.fixed { calibrate_fixed } else { calibrate };
    let calib_data = CalibrationData::from(cli.calib);
    info!("Using calibration data {calib_data}");

    match cli.mode {
        Mode::Once { raw_temperature, raw_pressure } => {
            let (temperature, pressure) = compensate(raw_temperature, raw_pressure, &calib_data);
            info!("pressure: {pressure}, temperature: {temperature}");
        },
        Mode::Stream => {
            // -- set handler for Ctrl-C
            if let Err(err) = ctrlc::set_handler(move || {
                info!("Received Ctrl+C, terminating...");
                std::process::exit(0);
            }) {
                error!("ERROR - Failed to set Ctrl-C handler: {err}");
                return ExitCode::from(EXIT_CODE_SET_CTR_C_HNDLR_FAILED);
            }
            for line in io::stdin().lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(err) => {
                        error!("ERROR - Failed to read from stdin: {err}");
                        return ExitCode::from(EXIT_CODE_READ_STDIN_FAILED);
                    }
                };
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                let Some((raw_temperature, raw_pressure)) = parse_reading(line) else {
                    warn!("Skipping malformed reading '{line}'");
                    continue;
                };
                let (temperature, pressure) = compensate(raw_temperature, raw_pressure, &calib_data);
                let now = Local::now();
                info!("{now}: pressure: {pressure}, temperature: {temperature}");
            }
            info!("End of input, terminating...");
        }
    }
    ExitCode::SUCCESS
}
