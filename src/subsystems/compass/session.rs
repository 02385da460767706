//! Compass session lifecycle
//!
//! A session lives while the compass view is active. It selects the heading
//! source from the device capabilities, owns the engine, publishes every
//! output to [`SharedCompassState`] and forwards debounced events to the
//! [`FeedbackSink`]. Nothing survives the session.

use std::sync::Arc;

use qibla_compass_core::feedback::EventBuffer;
use qibla_compass_core::heading::{
    estimate_gyro_bias, estimate_hard_iron, CalibrationState, RawSample, SampleRejection,
    SensorCalibration,
};
use qibla_compass_core::navigation::{Bearing, GeoPoint, HeadingSource, HeadingSourceType};
use qibla_compass_core::parameters::{
    CompassParams, ParamFlags, ParamValue, ParameterStore, CAL_COUNT_PARAM,
};
use qibla_compass_core::traits::TimeSource;
use qibla_compass_core::{CompassEngine, CompassOutput};

use super::provider::{FeedbackSink, SensorProvider};
use super::state::SharedCompassState;
use crate::error::CompassError;
use crate::{log_debug, log_error, log_info, log_trace, log_warn};

/// One active compass view
pub struct CompassSession<P: SensorProvider, S: FeedbackSink, T: TimeSource> {
    provider: P,
    sink: S,
    time: T,
    engine: CompassEngine,
    params: ParameterStore,
    shared: Arc<SharedCompassState>,
    active: bool,
}

impl<P: SensorProvider, S: FeedbackSink, T: TimeSource> CompassSession<P, S, T> {
    /// Start a session.
    ///
    /// Registers missing compass parameters in `params`, selects the heading
    /// source and subscribes to the sensors it needs.
    ///
    /// # Errors
    ///
    /// - `SensorUnavailable` if the device has no usable orientation sensor;
    ///   the caller shows its static fallback
    /// - `InvalidParameters` if the stored parameters are inconsistent
    /// - `Subscription` if the provider fails to start delivery
    pub fn start(
        mut provider: P,
        sink: S,
        time: T,
        mut params: ParameterStore,
    ) -> Result<Self, CompassError> {
        CompassParams::register_defaults(&mut params)?;
        let compass_params = CompassParams::from_store(&params);
        if !compass_params.is_valid() {
            log_error!("Compass parameters invalid: {:?}", compass_params);
            return Err(CompassError::InvalidParameters);
        }

        let capabilities = provider.capabilities();
        let source = HeadingSourceType::select(capabilities);
        if source == HeadingSourceType::Unavailable {
            log_warn!(
                "No orientation sensor available (capabilities={:?})",
                capabilities
            );
            return Err(CompassError::SensorUnavailable);
        }

        params.set_flags(CAL_COUNT_PARAM, ParamFlags::READ_ONLY)?;

        if let Err(e) = provider.subscribe(source) {
            log_error!("Sensor subscription failed for {}: {}", source.as_str(), e);
            return Err(e);
        }

        let engine = CompassEngine::new(compass_params.to_config(), source);
        let shared = Arc::new(SharedCompassState::new());
        shared.write(engine.output());

        log_info!("Compass session started: source={}", source.as_str());

        Ok(Self {
            provider,
            sink,
            time,
            engine,
            params,
            shared,
            active: true,
        })
    }

    /// Handle for renderers reading the published output
    pub fn shared_state(&self) -> Arc<SharedCompassState> {
        Arc::clone(&self.shared)
    }

    /// Latest published output
    pub fn output(&self) -> CompassOutput {
        self.engine.output()
    }

    pub fn source_type(&self) -> HeadingSourceType {
        self.engine.source_type()
    }

    pub fn target_bearing(&self) -> Option<Bearing> {
        self.engine.target_bearing()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn engine(&self) -> &CompassEngine {
        &self.engine
    }

    pub fn params(&self) -> &ParameterStore {
        &self.params
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn time(&self) -> &T {
        &self.time
    }

    /// Magnetometer callback. Returns the published output, or `None` if the
    /// sample was dropped.
    pub fn on_magnetometer(&mut self, sample: RawSample) -> Option<CompassOutput> {
        if !self.active {
            return None;
        }
        let mut events = EventBuffer::new();
        let result = self.engine.ingest_magnetometer(&sample, &mut events);
        self.finish_update(result, &events, "magnetometer")
    }

    /// Gyroscope callback
    pub fn on_gyroscope(&mut self, sample: RawSample) -> Option<CompassOutput> {
        if !self.active {
            return None;
        }
        let mut events = EventBuffer::new();
        let result = self.engine.ingest_gyroscope(&sample, &mut events);
        self.finish_update(result, &events, "gyroscope")
    }

    /// Platform heading callback; stamped with the session clock
    pub fn on_platform_heading(&mut self, heading_deg: f32) -> Option<CompassOutput> {
        if !self.active {
            return None;
        }
        let now = self.time.now_ms();
        let mut events = EventBuffer::new();
        let result = self
            .engine
            .ingest_platform_heading(heading_deg, now, &mut events);
        self.finish_update(result, &events, "platform heading")
    }

    /// Location fix callback. Re-targets without resetting the needle rotation.
    pub fn on_location(&mut self, location: GeoPoint) -> Option<Bearing> {
        match self.engine.set_location(location) {
            Ok(bearing) => {
                log_debug!(
                    "Location ({:.4}, {:.4}) -> target bearing {:.2}",
                    location.latitude,
                    location.longitude,
                    bearing.degrees()
                );
                Some(bearing)
            }
            Err(e) => {
                log_warn!(
                    "Location ({:.4}, {:.4}): {}; keeping previous target",
                    location.latitude,
                    location.longitude,
                    e
                );
                None
            }
        }
    }

    /// Start a new calibration cycle
    pub fn recalibrate(&mut self) {
        self.engine.recalibrate();
        self.shared.write(self.engine.output());
        log_info!("Compass recalibration requested");
    }

    /// Replace the sensor calibration
    pub fn set_calibration(&mut self, calibration: SensorCalibration) {
        self.engine.set_calibration(calibration);
        if calibration.is_calibrated() {
            log_info!(
                "Sensor calibration updated: mag offset {:?}, gyro bias {:?}",
                calibration.mag_offset,
                calibration.gyro_bias
            );
        } else {
            log_info!("Sensor calibration reset to identity");
        }
    }

    /// Estimate and apply the magnetometer hard-iron offset from samples
    /// collected while the device is turned through a full circle
    pub fn calibrate_hard_iron(&mut self, rotation_samples: &[RawSample]) {
        let calibration = SensorCalibration {
            mag_offset: estimate_hard_iron(rotation_samples),
            ..*self.engine.calibration()
        };
        self.set_calibration(calibration);
    }

    /// Estimate and apply gyroscope bias from samples taken at rest
    pub fn calibrate_gyro_bias(&mut self, static_samples: &[RawSample]) {
        let calibration = SensorCalibration {
            gyro_bias: estimate_gyro_bias(static_samples),
            ..*self.engine.calibration()
        };
        self.set_calibration(calibration);
    }

    /// Set one parameter in the session store. Takes effect on `apply_params`.
    pub fn set_param(&mut self, name: &str, value: ParamValue) -> Result<(), CompassError> {
        self.params.set(name, value)?;
        Ok(())
    }

    /// Reload parameters from the store and apply them to the running engine
    pub fn apply_params(&mut self) -> Result<(), CompassError> {
        let compass_params = CompassParams::from_store(&self.params);
        if !compass_params.is_valid() {
            log_warn!("Rejected compass parameters: {:?}", compass_params);
            return Err(CompassError::InvalidParameters);
        }
        self.engine.apply_config(compass_params.to_config());
        log_info!("Compass parameters applied");
        Ok(())
    }

    /// Unsubscribe from sensors. Idempotent; also run on drop.
    pub fn stop(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        self.provider.unsubscribe();
        if let Err(e) = self.params.set_flags(CAL_COUNT_PARAM, ParamFlags::empty()) {
            log_warn!("Failed to unlock {}: {}", CAL_COUNT_PARAM, e);
        }
        log_info!("Compass session stopped");
    }

    fn finish_update(
        &mut self,
        result: Result<CompassOutput, SampleRejection>,
        events: &EventBuffer,
        sensor: &str,
    ) -> Option<CompassOutput> {
        match result {
            Ok(output) => {
                let previous = self.shared.read();
                if output.calibration == CalibrationState::Calibrated
                    && previous.calibration != CalibrationState::Calibrated
                {
                    log_debug!("Heading calibrated at {} ms", output.timestamp_ms);
                }
                self.shared.write(output);
                for event in events.iter() {
                    log_debug!(
                        "Feedback {} at {} ms",
                        event.event.as_str(),
                        event.timestamp_ms
                    );
                    self.sink.emit(event);
                }
                Some(output)
            }
            Err(rejection) => {
                log_trace!("Dropped {} sample: {}", sensor, rejection);
                None
            }
        }
    }
}

impl<P: SensorProvider, S: FeedbackSink, T: TimeSource> Drop for CompassSession<P, S, T> {
    fn drop(&mut self) {
        self.stop();
    }
}
