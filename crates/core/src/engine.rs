//! Composed heading pipeline
//!
//! One engine serves every sensor strategy. The [`HeadingSourceType`] chosen
//! at startup decides which inputs are accepted and whether the fused
//! gyroscope heading or the smoothed magnetometer heading is authoritative:
//!
//! ```text
//! raw sample -> calibration -> HeadingFilter -> [GyroFusion] -> AlignmentTracker -> FeedbackDispatcher
//! ```

use crate::alignment::{AlignmentConfig, AlignmentTracker, Zone};
use crate::feedback::{EventBuffer, FeedbackConfig, FeedbackDispatcher, FeedbackInput};
use crate::heading::{
    CalibrationState, FusionConfig, GyroFusion, HeadingFilter, HeadingFilterConfig, RawSample,
    SampleRejection, SensorCalibration,
};
use crate::navigation::{
    checked_bearing, Bearing, GeoError, GeoPoint, HeadingSource, HeadingSourceType, KAABA,
};

/// Tuning for every stage of the pipeline
#[derive(Debug, Clone, Copy, Default)]
pub struct CompassConfig {
    pub filter: HeadingFilterConfig,
    pub fusion: FusionConfig,
    pub alignment: AlignmentConfig,
    pub feedback: FeedbackConfig,
}

/// Published engine output, sampled by the renderer every frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompassOutput {
    /// Unbounded needle rotation toward the target (degrees)
    pub cumulative_rotation: f32,
    /// Authoritative heading in `[0, 360)`, `None` before the first sample
    pub heading: Option<f32>,
    pub calibration: CalibrationState,
    pub zone: Zone,
    /// Timestamp of the sample that produced this output (ms)
    pub timestamp_ms: u64,
}

impl Default for CompassOutput {
    fn default() -> Self {
        Self {
            cumulative_rotation: 0.0,
            heading: None,
            calibration: CalibrationState::Uncalibrated,
            zone: Zone::Off,
            timestamp_ms: 0,
        }
    }
}

/// Heading engine for one compass session.
///
/// Single writer: the caller delivering sensor callbacks owns the engine.
pub struct CompassEngine {
    source: HeadingSourceType,
    filter: HeadingFilter,
    fusion: Option<GyroFusion>,
    tracker: AlignmentTracker,
    dispatcher: FeedbackDispatcher,
    calibration: SensorCalibration,
    destination: GeoPoint,
    target: Option<Bearing>,
    output: CompassOutput,
}

impl CompassEngine {
    /// Create an engine for the selected heading source, targeting the Kaaba
    pub fn new(config: CompassConfig, source: HeadingSourceType) -> Self {
        let filter = match source {
            HeadingSourceType::Unavailable => HeadingFilter::unavailable(config.filter),
            _ => HeadingFilter::new(config.filter),
        };
        let fusion = if source.uses_gyroscope() {
            Some(GyroFusion::new(config.fusion))
        } else {
            None
        };
        let output = CompassOutput {
            calibration: filter.state().calibration(),
            ..CompassOutput::default()
        };

        Self {
            source,
            filter,
            fusion,
            tracker: AlignmentTracker::new(config.alignment),
            dispatcher: FeedbackDispatcher::new(config.feedback),
            calibration: SensorCalibration::default(),
            destination: KAABA,
            target: None,
            output,
        }
    }

    /// Point the compass at another destination
    pub fn with_destination(mut self, destination: GeoPoint) -> Self {
        self.destination = destination;
        self
    }

    /// Latest published output
    pub fn output(&self) -> CompassOutput {
        self.output
    }

    /// Current target bearing, `None` until a location fix or explicit target
    pub fn target_bearing(&self) -> Option<Bearing> {
        self.target
    }

    pub fn destination(&self) -> GeoPoint {
        self.destination
    }

    /// Heading filter (state and counters)
    pub fn filter(&self) -> &HeadingFilter {
        &self.filter
    }

    /// Gyroscope fusion, present only for [`HeadingSourceType::MagnetometerPlusGyro`]
    pub fn fusion(&self) -> Option<&GyroFusion> {
        self.fusion.as_ref()
    }

    /// Active sensor calibration
    pub fn calibration(&self) -> &SensorCalibration {
        &self.calibration
    }

    /// Replace the sensor calibration applied to subsequent samples
    pub fn set_calibration(&mut self, calibration: SensorCalibration) {
        self.calibration = calibration;
    }

    /// Recompute the target bearing from a location fix.
    ///
    /// The new bearing applies from the next heading update; accumulated
    /// rotation is kept. On `Err` the previous target stays in effect.
    pub fn set_location(&mut self, location: GeoPoint) -> Result<Bearing, GeoError> {
        let bearing = checked_bearing(location, self.destination)?;
        self.target = Some(bearing);
        Ok(bearing)
    }

    /// Set the target bearing directly
    pub fn set_target_bearing(&mut self, bearing: Bearing) {
        self.target = Some(bearing);
    }

    /// Apply new tuning values without resetting any state
    pub fn apply_config(&mut self, config: CompassConfig) {
        self.filter.set_config(config.filter);
        if let Some(fusion) = self.fusion.as_mut() {
            fusion.set_config(config.fusion);
        }
        self.tracker.set_config(config.alignment);
        self.dispatcher.set_config(config.feedback);
    }

    /// Start a new calibration cycle
    pub fn recalibrate(&mut self) {
        self.filter.recalibrate();
        self.output.calibration = self.filter.state().calibration();
    }

    /// Feed one magnetometer sample (µT).
    ///
    /// `Err` means the published output did not change. With gyroscope
    /// fusion, a jitter-gated sample still pulls the fused heading toward the
    /// smoothed magnetometer heading and therefore publishes.
    pub fn ingest_magnetometer(
        &mut self,
        sample: &RawSample,
        events: &mut EventBuffer,
    ) -> Result<CompassOutput, SampleRejection> {
        if self.source == HeadingSourceType::PlatformHeading {
            return Err(SampleRejection::Unavailable);
        }
        let sample = self.calibration.apply_mag(sample);
        let was_calibrated = self.filter.state().is_calibrated();

        let smoothed = match self.filter.ingest_magnetometer(&sample) {
            Ok(state) => state.smoothed_heading(),
            Err(SampleRejection::Jitter) if self.fusion.is_some() => {
                self.filter.state().smoothed_heading()
            }
            Err(rejection) => return Err(rejection),
        };
        let calibration_achieved = !was_calibrated && self.filter.state().is_calibrated();

        let heading = match self.fusion.as_mut() {
            Some(fusion) => fusion.correct(smoothed),
            None => smoothed,
        };
        Ok(self.publish(heading, sample.timestamp_ms, calibration_achieved, events))
    }

    /// Feed one gyroscope sample (rad/s)
    pub fn ingest_gyroscope(
        &mut self,
        sample: &RawSample,
        events: &mut EventBuffer,
    ) -> Result<CompassOutput, SampleRejection> {
        let sample = self.calibration.apply_gyro(sample);
        let fusion = self.fusion.as_mut().ok_or(SampleRejection::Unavailable)?;
        let heading = fusion.ingest_gyroscope(&sample)?;
        Ok(self.publish(heading, sample.timestamp_ms, false, events))
    }

    /// Feed a heading from the platform heading API (degrees)
    pub fn ingest_platform_heading(
        &mut self,
        heading_deg: f32,
        timestamp_ms: u64,
        events: &mut EventBuffer,
    ) -> Result<CompassOutput, SampleRejection> {
        if self.source != HeadingSourceType::PlatformHeading {
            return Err(SampleRejection::Unavailable);
        }
        let was_calibrated = self.filter.state().is_calibrated();
        let state = self.filter.ingest_heading(heading_deg)?;
        let calibration_achieved = !was_calibrated && state.is_calibrated();
        Ok(self.publish(
            state.smoothed_heading(),
            timestamp_ms,
            calibration_achieved,
            events,
        ))
    }

    fn publish(
        &mut self,
        heading: f32,
        timestamp_ms: u64,
        calibration_achieved: bool,
        events: &mut EventBuffer,
    ) -> CompassOutput {
        self.output.heading = Some(heading);
        self.output.timestamp_ms = timestamp_ms;
        self.output.calibration = self.filter.state().calibration();

        let (rotation, transition) = match self.target {
            Some(target) => {
                let update = self.tracker.update(heading, target, timestamp_ms);
                self.output.cumulative_rotation = update.state.cumulative_relative_angle;
                self.output.zone = update.state.current_zone;
                (Some(self.output.cumulative_rotation), update.transition)
            }
            None => (None, None),
        };

        self.dispatcher.process(
            &FeedbackInput {
                timestamp_ms,
                heading,
                cumulative_rotation: rotation,
                transition,
                calibration_achieved,
            },
            events,
        );
        self.output
    }
}

impl HeadingSource for CompassEngine {
    fn get_heading(&self) -> Option<f32> {
        self.output.heading
    }

    fn is_valid(&self) -> bool {
        self.source != HeadingSourceType::Unavailable && self.output.heading.is_some()
    }

    fn source_type(&self) -> HeadingSourceType {
        self.source
    }
}
