//! Run the compass heading engine over recorded or simulated sensor data.
//!
//! Prints one JSON line per published output and per feedback event.
//!
//! Usage:
//!   cargo run --bin compass_replay -- [OPTIONS]
//!
//! Options:
//!   --trace <FILE>       Replay a JSON-lines sensor trace
//!   --spin <DEG_PER_S>   Simulate a device spinning clockwise (default: 30)
//!   --duration <S>       Simulated duration in seconds (default: 5)
//!   --seed <N>           RNG seed for the simulation (default: 1)
//!   --no-gyro            Magnetometer only
//!   --lat <DEG>          Device latitude (default: 5.36)
//!   --lon <DEG>          Device longitude (default: -4.0083)
//!   --every <N>          Print every Nth output (default: 1)
//!
//! Set RUST_LOG=debug for session diagnostics on stderr.

use std::cell::RefCell;
use std::env;
use std::fs;
use std::process;
use std::rc::Rc;

use qibla_compass::core::StdTime;
use qibla_compass::simulation::{
    parse_trace, SensorKind, SimulatedDevice, SimulationConfig, TraceRecord,
};
use qibla_compass::{log_info, CompassError, CompassSession, SensorProvider};
use qibla_compass_core::feedback::{DispatchedEvent, FeedbackEvent};
use qibla_compass_core::navigation::{
    haversine_distance_km, GeoPoint, HeadingSourceType, SensorCapabilities, KAABA,
};
use qibla_compass_core::parameters::ParameterStore;
use qibla_compass_core::CompassOutput;
use serde::Serialize;

enum Input {
    Trace(String),
    Spin(f32),
}

struct Args {
    input: Input,
    duration_s: f32,
    seed: u64,
    gyro: bool,
    lat: f64,
    lon: f64,
    every: usize,
}

fn parse_args() -> Args {
    let mut args = Args {
        input: Input::Spin(30.0),
        duration_s: 5.0,
        seed: 1,
        gyro: true,
        lat: 5.36,
        lon: -4.0083,
        every: 1,
    };

    let raw: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < raw.len() {
        match raw[i].as_str() {
            "--trace" => {
                i += 1;
                args.input = Input::Trace(arg_value(&raw, i, "trace").to_string());
            }
            "--spin" => {
                i += 1;
                args.input = Input::Spin(parse_arg(&raw, i, "spin"));
            }
            "--duration" => {
                i += 1;
                args.duration_s = parse_arg(&raw, i, "duration");
            }
            "--seed" => {
                i += 1;
                args.seed = parse_arg(&raw, i, "seed");
            }
            "--no-gyro" => args.gyro = false,
            "--lat" => {
                i += 1;
                args.lat = parse_arg(&raw, i, "lat");
            }
            "--lon" => {
                i += 1;
                args.lon = parse_arg(&raw, i, "lon");
            }
            "--every" => {
                i += 1;
                args.every = parse_arg::<usize>(&raw, i, "every").max(1);
            }
            "-h" | "--help" => {
                print_usage();
                process::exit(0);
            }
            other => {
                eprintln!("Unknown option: {other}");
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    args
}

fn arg_value<'a>(raw: &'a [String], i: usize, name: &str) -> &'a str {
    match raw.get(i) {
        Some(value) => value,
        None => {
            eprintln!("Error: --{name} requires a value");
            process::exit(1);
        }
    }
}

fn parse_arg<V: std::str::FromStr>(raw: &[String], i: usize, name: &str) -> V {
    let value = arg_value(raw, i, name);
    value.parse().unwrap_or_else(|_| {
        eprintln!("Error: invalid value for --{name}: {value}");
        process::exit(1);
    })
}

fn print_usage() {
    eprintln!(
        "Usage: compass_replay [--trace FILE | --spin DEG_PER_S] [--duration S] [--seed N] \
         [--no-gyro] [--lat DEG] [--lon DEG] [--every N]"
    );
}

/// Provider for replayed data: capabilities are fixed up front
struct ReplayProvider {
    capabilities: SensorCapabilities,
}

impl SensorProvider for ReplayProvider {
    fn capabilities(&self) -> SensorCapabilities {
        self.capabilities
    }

    fn subscribe(&mut self, source: HeadingSourceType) -> Result<(), CompassError> {
        log_info!("Replaying with source {}", source.as_str());
        Ok(())
    }

    fn unsubscribe(&mut self) {}
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Line<'a> {
    Output {
        t: u64,
        heading: Option<f32>,
        rotation: f32,
        zone: &'a str,
        calibration: &'a str,
    },
    Event {
        t: u64,
        event: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        cardinal: Option<&'a str>,
    },
}

fn print_line(line: &Line) {
    match serde_json::to_string(line) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Error: {e}"),
    }
}

fn print_output(output: &CompassOutput) {
    print_line(&Line::Output {
        t: output.timestamp_ms,
        heading: output.heading,
        rotation: output.cumulative_rotation,
        zone: output.zone.as_str(),
        calibration: output.calibration.as_str(),
    });
}

fn print_event(event: &DispatchedEvent) {
    let cardinal = match event.event {
        FeedbackEvent::CardinalCrossed(c) => Some(c.as_str()),
        _ => None,
    };
    print_line(&Line::Event {
        t: event.timestamp_ms,
        event: event.event.as_str(),
        cardinal,
    });
}

fn load_records(args: &Args) -> Result<Vec<TraceRecord>, CompassError> {
    match &args.input {
        Input::Trace(path) => parse_trace(&fs::read_to_string(path)?),
        Input::Spin(rate) => {
            let mut device = SimulatedDevice::new(SimulationConfig {
                rotation_rate_deg_s: *rate,
                seed: Some(args.seed),
                ..Default::default()
            });
            let steps = (args.duration_s * 1000.0 / device.config().sample_interval_ms as f32)
                .max(0.0) as usize;
            let mut records = Vec::with_capacity(steps * 2);
            for _ in 0..steps {
                let samples = device.step();
                records.push(TraceRecord::new(SensorKind::Mag, &samples.magnetometer));
                if args.gyro {
                    records.push(TraceRecord::new(SensorKind::Gyro, &samples.gyroscope));
                }
            }
            Ok(records)
        }
    }
}

fn run(args: Args) -> Result<(), CompassError> {
    let records = load_records(&args)?;

    let has_gyro = records.iter().any(|r| r.kind == SensorKind::Gyro);
    let mut capabilities = SensorCapabilities::MAGNETOMETER;
    if has_gyro && args.gyro {
        capabilities |= SensorCapabilities::GYROSCOPE;
    }

    // Events are printed as they are dispatched, interleaved with outputs
    let events: Rc<RefCell<Vec<DispatchedEvent>>> = Rc::new(RefCell::new(Vec::new()));
    let sink_events = Rc::clone(&events);
    let sink = move |event: &DispatchedEvent| sink_events.borrow_mut().push(*event);

    let mut session = CompassSession::start(
        ReplayProvider { capabilities },
        sink,
        StdTime::new(),
        ParameterStore::new(),
    )?;

    let location = GeoPoint::new(args.lat, args.lon);
    if let Some(bearing) = session.on_location(location) {
        eprintln!(
            "Target bearing {:.2}°, distance {:.1} km",
            bearing.degrees(),
            haversine_distance_km(location, KAABA)
        );
    }

    let mut published = 0usize;
    for record in &records {
        let output = match record.kind {
            SensorKind::Mag => session.on_magnetometer(record.sample()),
            SensorKind::Gyro => session.on_gyroscope(record.sample()),
        };
        if let Some(output) = output {
            if published % args.every == 0 {
                print_output(&output);
            }
            published += 1;
        }
        for event in events.borrow_mut().drain(..) {
            print_event(&event);
        }
    }

    session.stop();
    eprintln!(
        "{} samples, {} outputs published, final rotation {:.1}°",
        records.len(),
        published,
        session.output().cumulative_rotation
    );
    Ok(())
}

fn main() {
    env_logger::init();
    let args = parse_args();
    if let Err(e) = run(args) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
