//! Simulated orientation sensors and sensor traces
//!
//! `SimulatedDevice` turns a device spinning at a constant rate into the
//! magnetometer and gyroscope samples a phone would report, with configurable
//! Gaussian noise. A fixed seed makes the stream reproducible for tests.
//!
//! `TraceRecord` is the JSON-lines format read by `compass_replay`:
//!
//! ```text
//! {"kind":"mag","x":-12.1,"y":38.4,"z":-20.0,"t":16}
//! {"kind":"gyro","x":0.0,"y":0.0,"z":-0.52,"t":16}
//! ```

use qibla_compass_core::heading::RawSample;
use qibla_compass_core::navigation::wrap_360;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::CompassError;

/// Configuration for the simulated device
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Heading at t = 0 (degrees)
    pub initial_heading_deg: f32,
    /// Clockwise rotation rate (degrees per second)
    pub rotation_rate_deg_s: f32,
    /// Horizontal field strength (µT)
    pub field_strength_ut: f32,
    /// Vertical field component (µT)
    pub vertical_field_ut: f32,
    /// Magnetometer noise standard deviation per axis (µT)
    pub mag_noise_ut: f32,
    /// Gyroscope noise standard deviation (rad/s)
    pub gyro_noise_rads: f32,
    /// Constant gyroscope z bias (rad/s)
    pub gyro_bias_rads: f32,
    /// Time between samples (ms)
    pub sample_interval_ms: u64,
    /// RNG seed for deterministic mode. None = random.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            initial_heading_deg: 0.0,
            rotation_rate_deg_s: 0.0,
            field_strength_ut: 40.0,
            vertical_field_ut: -20.0,
            mag_noise_ut: 0.3,
            gyro_noise_rads: 0.002,
            gyro_bias_rads: 0.0,
            sample_interval_ms: 16,
            seed: None,
        }
    }
}

/// One simulation step: both sensors sampled at the same instant
#[derive(Debug, Clone, Copy)]
pub struct SimulatedSamples {
    pub magnetometer: RawSample,
    pub gyroscope: RawSample,
    /// Noise-free heading at this instant (degrees)
    pub true_heading_deg: f32,
}

/// Deterministic rotating-device sensor source
pub struct SimulatedDevice {
    config: SimulationConfig,
    rng: StdRng,
    timestamp_ms: u64,
    heading_deg: f64,
}

impl SimulatedDevice {
    pub fn new(config: SimulationConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            heading_deg: config.initial_heading_deg as f64,
            config,
            rng,
            timestamp_ms: 0,
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Noise-free heading in `[0, 360)`
    pub fn true_heading(&self) -> f32 {
        wrap_360(self.heading_deg as f32)
    }

    pub fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }

    /// Change the rotation rate from the next step on
    pub fn set_rotation_rate(&mut self, deg_per_s: f32) {
        self.config.rotation_rate_deg_s = deg_per_s;
    }

    /// Sample both sensors at the current instant, then advance one interval
    pub fn step(&mut self) -> SimulatedSamples {
        let heading = self.true_heading();
        let t = self.timestamp_ms;

        let ideal = RawSample::from_heading(heading, self.config.field_strength_ut, t);
        let magnetometer = RawSample::new(
            ideal.x + self.gaussian_noise(self.config.mag_noise_ut),
            ideal.y + self.gaussian_noise(self.config.mag_noise_ut),
            self.config.vertical_field_ut + self.gaussian_noise(self.config.mag_noise_ut),
            t,
        );

        // Clockwise heading change is a negative z rate
        let rate_z = -self.config.rotation_rate_deg_s.to_radians()
            + self.config.gyro_bias_rads
            + self.gaussian_noise(self.config.gyro_noise_rads);
        let gyroscope = RawSample::new(
            self.gaussian_noise(self.config.gyro_noise_rads),
            self.gaussian_noise(self.config.gyro_noise_rads),
            rate_z,
            t,
        );

        let dt_s = self.config.sample_interval_ms as f64 / 1000.0;
        self.heading_deg += self.config.rotation_rate_deg_s as f64 * dt_s;
        self.timestamp_ms += self.config.sample_interval_ms;

        SimulatedSamples {
            magnetometer,
            gyroscope,
            true_heading_deg: heading,
        }
    }

    /// Generate Gaussian noise using Box-Muller transform.
    fn gaussian_noise(&mut self, stddev: f32) -> f32 {
        if stddev == 0.0 {
            return 0.0;
        }
        let u1: f32 = self.rng.gen::<f32>().max(f32::EPSILON);
        let u2: f32 = self.rng.gen();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f32::consts::PI * u2).cos();
        z * stddev
    }
}

/// Sensor that produced a trace record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    Mag,
    Gyro,
}

/// One line of a JSON-lines sensor trace
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraceRecord {
    pub kind: SensorKind,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Timestamp (ms)
    pub t: u64,
}

impl TraceRecord {
    pub fn new(kind: SensorKind, sample: &RawSample) -> Self {
        Self {
            kind,
            x: sample.x,
            y: sample.y,
            z: sample.z,
            t: sample.timestamp_ms,
        }
    }

    pub fn sample(&self) -> RawSample {
        RawSample::new(self.x, self.y, self.z, self.t)
    }
}

/// Parse a JSON-lines trace. Blank lines are skipped; `line` in errors is 1-based.
pub fn parse_trace(text: &str) -> Result<Vec<TraceRecord>, CompassError> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).map_err(|source| CompassError::Trace {
                line: i + 1,
                source,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use qibla_compass_core::heading::magnetometer_heading;
    use qibla_compass_core::navigation::circular_delta;

    fn seeded(rate: f32) -> SimulatedDevice {
        SimulatedDevice::new(SimulationConfig {
            rotation_rate_deg_s: rate,
            seed: Some(42),
            ..Default::default()
        })
    }

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = seeded(30.0);
        let mut b = seeded(30.0);
        for _ in 0..50 {
            let sa = a.step();
            let sb = b.step();
            assert_eq!(sa.magnetometer, sb.magnetometer);
            assert_eq!(sa.gyroscope, sb.gyroscope);
        }
    }

    #[test]
    fn test_heading_advances_with_rate() {
        let mut device = seeded(90.0);
        for _ in 0..125 {
            device.step();
        }
        // 125 * 16 ms = 2 s at 90°/s
        assert!((device.true_heading() - 180.0).abs() < 0.01);
        assert_eq!(device.timestamp_ms(), 2000);
    }

    #[test]
    fn test_magnetometer_matches_true_heading() {
        let mut device = seeded(45.0);
        for _ in 0..100 {
            let s = device.step();
            let measured = magnetometer_heading(s.magnetometer.x, s.magnetometer.y);
            let error = circular_delta(measured, s.true_heading_deg).abs();
            assert!(error < 5.0, "error {} at {}", error, s.true_heading_deg);
        }
    }

    #[test]
    fn test_gyro_sign_matches_clockwise_rotation() {
        let mut device = SimulatedDevice::new(SimulationConfig {
            rotation_rate_deg_s: 90.0,
            gyro_noise_rads: 0.0,
            seed: Some(1),
            ..Default::default()
        });
        let s = device.step();
        assert!((s.gyroscope.z + 90f32.to_radians()).abs() < 1e-6);
    }

    #[test]
    fn test_parse_trace() {
        let text = "{\"kind\":\"mag\",\"x\":-1.0,\"y\":40.0,\"z\":-20.0,\"t\":0}\n\n\
                    {\"kind\":\"gyro\",\"x\":0.0,\"y\":0.0,\"z\":0.5,\"t\":16}\n";
        let records = parse_trace(text).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].kind, SensorKind::Mag);
        assert_eq!(records[1].kind, SensorKind::Gyro);
        assert_eq!(records[1].sample().timestamp_ms, 16);
    }

    #[test]
    fn test_parse_trace_reports_line() {
        let text = "{\"kind\":\"mag\",\"x\":0,\"y\":1,\"z\":0,\"t\":0}\nnot json\n";
        match parse_trace(text) {
            Err(CompassError::Trace { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected trace error, got {:?}", other),
        }
    }

    #[test]
    fn test_trace_record_serializes_lowercase_kind() {
        let record = TraceRecord::new(SensorKind::Gyro, &RawSample::new(0.0, 0.0, 1.0, 5));
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"kind\":\"gyro\""));
    }
}
