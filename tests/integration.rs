//! End-to-end tests: a compass session driven by a mock platform.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use qibla_compass::core::logging::init_test_logger;
use qibla_compass::simulation::{SimulatedDevice, SimulationConfig};
use qibla_compass::{CompassError, CompassSession, FeedbackSink, SensorProvider};
use qibla_compass_core::alignment::Zone;
use qibla_compass_core::feedback::{DispatchedEvent, FeedbackEvent};
use qibla_compass_core::heading::{CalibrationState, RawSample};
use qibla_compass_core::navigation::{
    circular_delta, wrap_180, GeoPoint, HeadingSourceType, SensorCapabilities, KAABA,
};
use qibla_compass_core::parameters::{
    ParamValue, ParameterError, ParameterStore, CAL_COUNT_PARAM,
};
use qibla_compass_core::traits::{MockTime, TimeSource};

const ABIDJAN: GeoPoint = GeoPoint::new(5.36, -4.0083);
const LONDON: GeoPoint = GeoPoint::new(51.5074, -0.1278);
const NEW_YORK: GeoPoint = GeoPoint::new(40.7128, -74.0060);

#[derive(Debug, Default)]
struct ProviderLog {
    subscribed: Option<HeadingSourceType>,
    unsubscribe_calls: u32,
}

struct MockProvider {
    capabilities: SensorCapabilities,
    fail_subscribe: bool,
    log: Rc<RefCell<ProviderLog>>,
}

impl SensorProvider for MockProvider {
    fn capabilities(&self) -> SensorCapabilities {
        self.capabilities
    }

    fn subscribe(&mut self, source: HeadingSourceType) -> Result<(), CompassError> {
        if self.fail_subscribe {
            return Err(CompassError::Subscription("permission denied".into()));
        }
        self.log.borrow_mut().subscribed = Some(source);
        Ok(())
    }

    fn unsubscribe(&mut self) {
        self.log.borrow_mut().unsubscribe_calls += 1;
    }
}

#[derive(Default)]
struct RecordingSink {
    events: Vec<DispatchedEvent>,
}

impl FeedbackSink for RecordingSink {
    fn emit(&mut self, event: &DispatchedEvent) {
        self.events.push(*event);
    }
}

type Session = CompassSession<MockProvider, RecordingSink, MockTime>;

fn start_with(
    capabilities: SensorCapabilities,
    params: ParameterStore,
) -> (Result<Session, CompassError>, Rc<RefCell<ProviderLog>>) {
    init_test_logger();
    let log = Rc::new(RefCell::new(ProviderLog::default()));
    let provider = MockProvider {
        capabilities,
        fail_subscribe: false,
        log: Rc::clone(&log),
    };
    let session = CompassSession::start(
        provider,
        RecordingSink::default(),
        MockTime::new(),
        params,
    );
    (session, log)
}

fn start(capabilities: SensorCapabilities) -> (Session, Rc<RefCell<ProviderLog>>) {
    let (session, log) = start_with(capabilities, ParameterStore::new());
    match session {
        Ok(session) => (session, log),
        Err(e) => panic!("session failed to start: {}", e),
    }
}

fn mag(heading: f32, t: u64) -> RawSample {
    RawSample::from_heading(heading, 40.0, t)
}

fn count(events: &[DispatchedEvent], kind: FeedbackEvent) -> usize {
    events.iter().filter(|e| e.event == kind).count()
}

fn assert_cooldown_respected(events: &[DispatchedEvent], cooldown_ms: u64) {
    for pair in events.windows(2) {
        assert!(
            pair[1].timestamp_ms - pair[0].timestamp_ms >= cooldown_ms,
            "{:?} then {:?}",
            pair[0],
            pair[1]
        );
    }
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn test_source_selected_from_capabilities() {
    let (session, log) = start(SensorCapabilities::MAGNETOMETER | SensorCapabilities::GYROSCOPE);
    assert_eq!(session.source_type(), HeadingSourceType::MagnetometerPlusGyro);
    assert_eq!(
        log.borrow().subscribed,
        Some(HeadingSourceType::MagnetometerPlusGyro)
    );

    let (session, _) = start(SensorCapabilities::MAGNETOMETER);
    assert_eq!(session.source_type(), HeadingSourceType::MagnetometerOnly);

    let (session, _) = start(SensorCapabilities::PLATFORM_HEADING);
    assert_eq!(session.source_type(), HeadingSourceType::PlatformHeading);
}

#[test]
fn test_no_sensor_is_unavailable() {
    let (session, log) = start_with(SensorCapabilities::empty(), ParameterStore::new());
    assert!(matches!(session, Err(CompassError::SensorUnavailable)));
    assert_eq!(log.borrow().subscribed, None);
    assert_eq!(log.borrow().unsubscribe_calls, 0);
}

#[test]
fn test_gyroscope_alone_is_unavailable() {
    let (session, _) = start_with(SensorCapabilities::GYROSCOPE, ParameterStore::new());
    assert!(matches!(session, Err(CompassError::SensorUnavailable)));
}

#[test]
fn test_subscription_failure_propagates() {
    init_test_logger();
    let provider = MockProvider {
        capabilities: SensorCapabilities::MAGNETOMETER,
        fail_subscribe: true,
        log: Rc::new(RefCell::new(ProviderLog::default())),
    };
    let result = CompassSession::start(
        provider,
        RecordingSink::default(),
        MockTime::new(),
        ParameterStore::new(),
    );
    match result {
        Err(CompassError::Subscription(reason)) => assert_eq!(reason, "permission denied"),
        Err(e) => panic!("unexpected error: {}", e),
        Ok(_) => panic!("session should not start"),
    }
}

#[test]
fn test_inconsistent_params_rejected_at_start() {
    let mut params = ParameterStore::new();
    qibla_compass_core::parameters::CompassParams::register_defaults(&mut params).unwrap();
    params.set("CMP_ZONE_ALIGN", ParamValue::Float(30.0)).unwrap();

    let (session, log) = start_with(SensorCapabilities::MAGNETOMETER, params);
    assert!(matches!(session, Err(CompassError::InvalidParameters)));
    assert_eq!(log.borrow().subscribed, None);
}

#[test]
fn test_stop_is_idempotent_and_runs_on_drop() {
    let (mut session, log) = start(SensorCapabilities::MAGNETOMETER);
    session.stop();
    session.stop();
    assert!(!session.is_active());
    assert_eq!(log.borrow().unsubscribe_calls, 1);

    // Callbacks after stop are ignored
    assert!(session.on_magnetometer(mag(10.0, 0)).is_none());
    drop(session);
    assert_eq!(log.borrow().unsubscribe_calls, 1);

    let (session, log) = start(SensorCapabilities::MAGNETOMETER);
    drop(session);
    assert_eq!(log.borrow().unsubscribe_calls, 1);
}

#[test]
fn test_calibration_threshold_locked_while_running() {
    let (mut session, _) = start(SensorCapabilities::MAGNETOMETER);
    assert!(session.params().is_read_only(CAL_COUNT_PARAM));
    assert!(matches!(
        session.set_param(CAL_COUNT_PARAM, ParamValue::Int(10)),
        Err(CompassError::Parameter(ParameterError::ReadOnly))
    ));
    assert!(matches!(
        session.set_param("CMP_NOPE", ParamValue::Int(10)),
        Err(CompassError::Parameter(ParameterError::UnknownParameter))
    ));
    assert!(matches!(
        session.set_param("CMP_ZONE_ALIGN", ParamValue::Int(3)),
        Err(CompassError::Parameter(ParameterError::TypeMismatch))
    ));

    session.stop();
    assert!(!session.params().is_read_only(CAL_COUNT_PARAM));
}

// ============================================================================
// Heading pipeline
// ============================================================================

#[test]
fn test_spin_with_gyro_accumulates_rotation() {
    let (mut session, _) = start(SensorCapabilities::MAGNETOMETER | SensorCapabilities::GYROSCOPE);
    let target = session.on_location(LONDON).unwrap();
    assert!((target.degrees() - 118.99).abs() < 0.1);

    let mut device = SimulatedDevice::new(SimulationConfig {
        initial_heading_deg: 10.0,
        rotation_rate_deg_s: 180.0,
        seed: Some(7),
        ..Default::default()
    });
    let shared = session.shared_state();

    let mut first_rotation = None;
    let mut prev_rotation: Option<f32> = None;
    let steps = 250;
    for _ in 0..steps {
        let samples = device.step();
        session.on_magnetometer(samples.magnetometer);
        session.on_gyroscope(samples.gyroscope);

        let rotation = shared.cumulative_rotation();
        if let Some(prev) = prev_rotation {
            assert!(
                (rotation - prev).abs() < 180.0,
                "needle jumped from {} to {}",
                prev,
                rotation
            );
        }
        first_rotation.get_or_insert(rotation);
        prev_rotation = Some(rotation);
    }

    // Clockwise device rotation turns the needle counter-clockwise
    let spun = 180.0 * 0.016 * (steps - 1) as f32;
    let expected = first_rotation.unwrap() - spun;
    let actual = shared.cumulative_rotation();
    assert!(
        (actual - expected).abs() < 8.0,
        "Expected ~{}, got {}",
        expected,
        actual
    );
    assert!(actual < -500.0);

    let events = &session.sink().events;
    assert!(count(events, FeedbackEvent::RotationTick) > 0);
    assert_cooldown_respected(events, 90);
}

#[test]
fn test_magnetometer_only_reaches_alignment() {
    let (mut session, _) = start(SensorCapabilities::MAGNETOMETER);
    let target = session.on_location(ABIDJAN).unwrap();
    assert!((target.degrees() - 64.98).abs() < 0.1);

    // Sweep toward the target in 1.5° steps, then hold
    let mut t = 0;
    let mut heading = target.degrees() - 60.0;
    while heading < target.degrees() {
        session.on_magnetometer(mag(heading, t));
        heading += 1.5;
        t += 16;
    }
    for i in 0..10 {
        let wobble = if i % 2 == 0 { 0.5 } else { -0.5 };
        session.on_magnetometer(mag(target.degrees() + wobble, t));
        t += 16;
    }

    let output = session.output();
    assert_eq!(output.zone, Zone::Aligned);
    assert!(output.cumulative_rotation.abs() < 5.0);
    assert_eq!(
        count(&session.sink().events, FeedbackEvent::AlignedEntered),
        1
    );
    assert_eq!(session.shared_state().read(), output);
}

#[test]
fn test_calibration_achieved_once_per_cycle() {
    let (mut session, _) = start(SensorCapabilities::MAGNETOMETER);
    let mut t = 0;
    let mut heading = 100.0f32;
    let mut feed = |session: &mut Session, n: usize| {
        for _ in 0..n {
            session.on_magnetometer(mag(heading, t));
            heading += 1.0;
            t += 200;
        }
    };

    feed(&mut session, 29);
    assert_eq!(session.output().calibration, CalibrationState::Calibrating);
    feed(&mut session, 20);
    assert_eq!(session.output().calibration, CalibrationState::Calibrated);
    assert_eq!(
        count(&session.sink().events, FeedbackEvent::CalibrationAchieved),
        1
    );

    session.recalibrate();
    assert_eq!(
        session.shared_state().read().calibration,
        CalibrationState::Calibrating
    );
    feed(&mut session, 30);
    assert_eq!(session.output().calibration, CalibrationState::Calibrated);
    assert_eq!(
        count(&session.sink().events, FeedbackEvent::CalibrationAchieved),
        2
    );
}

#[test]
fn test_jitter_does_not_move_heading() {
    let (mut session, _) = start(SensorCapabilities::MAGNETOMETER);
    let first = session.on_magnetometer(mag(10.0, 0)).unwrap();
    assert!(session.on_magnetometer(mag(10.2, 16)).is_none());
    assert!(session.on_magnetometer(mag(10.1, 32)).is_none());
    assert_eq!(session.output(), first);

    let out = session.on_magnetometer(mag(40.0, 48)).unwrap();
    assert!((out.heading.unwrap() - 26.5).abs() < 0.05);
}

#[test]
fn test_aligned_boundary_chatter_is_debounced() {
    let (mut session, _) = start(SensorCapabilities::PLATFORM_HEADING);
    let target = session.on_location(ABIDJAN).unwrap();

    // Relative angle alternates 4° / 6° around the 5° boundary every 8 ms
    for i in 0..250 {
        let offset = if i % 2 == 0 { 4.0 } else { 6.0 };
        session.time().advance_ms(8);
        session.on_platform_heading(target.degrees() - offset);
    }

    let events = &session.sink().events;
    let aligned: Vec<_> = events
        .iter()
        .filter(|e| {
            matches!(
                e.event,
                FeedbackEvent::AlignedEntered | FeedbackEvent::AlignedExited
            )
        })
        .collect();
    assert!(aligned.len() >= 2, "events: {:?}", events);
    assert_eq!(aligned[0].event, FeedbackEvent::AlignedEntered);
    for pair in aligned.windows(2) {
        assert_ne!(pair[0].event, pair[1].event);
    }
    // 2 s of chatter at a 90 ms cooldown
    assert!(events.len() <= 23, "{} events", events.len());
    assert_cooldown_respected(events, 90);
}

#[test]
fn test_platform_heading_stamped_by_clock() {
    let (mut session, _) = start(SensorCapabilities::PLATFORM_HEADING);
    session.time().set_ms(12_345);
    let out = session.on_platform_heading(-90.0).unwrap();
    assert_eq!(out.timestamp_ms, 12_345);
    assert!((out.heading.unwrap() - 270.0).abs() < 0.001);
    assert_eq!(session.time().now_ms(), 12_345);
}

#[test]
fn test_relocation_keeps_needle_history() {
    let (mut session, _) = start(SensorCapabilities::MAGNETOMETER);
    let london = session.on_location(LONDON).unwrap();
    let mut t = 0;
    for i in 0..40 {
        session.on_magnetometer(mag(100.0 + i as f32 * 8.0, t));
        t += 16;
    }
    let before = session.output();

    let nyc = session.on_location(NEW_YORK).unwrap();
    assert!((nyc.degrees() - 58.48).abs() < 0.1);
    let after = session.on_magnetometer(mag(100.0 + 40.0 * 8.0, t)).unwrap();

    let old_relative = london.degrees() - before.heading.unwrap();
    let new_relative = nyc.degrees() - after.heading.unwrap();
    let expected = before.cumulative_rotation + circular_delta(new_relative, old_relative);
    assert!(
        (after.cumulative_rotation - expected).abs() < 0.01,
        "Expected ~{}, got {}",
        expected,
        after.cumulative_rotation
    );
}

#[test]
fn test_location_at_destination_keeps_target() {
    let (mut session, _) = start(SensorCapabilities::MAGNETOMETER);
    let target = session.on_location(ABIDJAN).unwrap();
    assert!(session.on_location(KAABA).is_none());
    assert_eq!(session.target_bearing(), Some(target));
}

#[test]
fn test_apply_params_at_runtime() {
    let (mut session, _) = start(SensorCapabilities::MAGNETOMETER);
    let target = session.on_location(ABIDJAN).unwrap();

    let out = session.on_magnetometer(mag(target.degrees() - 8.0, 0)).unwrap();
    assert_eq!(out.zone, Zone::Close);

    session
        .set_param("CMP_ZONE_ALIGN", ParamValue::Float(10.0))
        .unwrap();
    session.apply_params().unwrap();
    let out = session
        .on_magnetometer(mag(target.degrees() - 8.5, 16))
        .unwrap();
    assert_eq!(out.zone, Zone::Aligned);

    // Aligned zone wider than the close zone is rejected
    session
        .set_param("CMP_ZONE_ALIGN", ParamValue::Float(40.0))
        .unwrap();
    assert!(matches!(
        session.apply_params(),
        Err(CompassError::InvalidParameters)
    ));
}

#[test]
fn test_gyro_bias_calibration_stops_drift() {
    let (mut session, _) = start(SensorCapabilities::MAGNETOMETER | SensorCapabilities::GYROSCOPE);
    let bias = 0.2;
    let at_rest: Vec<RawSample> = (0..50)
        .map(|i| RawSample::new(0.0, 0.0, bias, i * 16))
        .collect();
    session.calibrate_gyro_bias(&at_rest);

    session.on_magnetometer(mag(45.0, 1000));
    session.on_gyroscope(RawSample::new(0.0, 0.0, bias, 1000));
    let mut t = 1000;
    for _ in 0..60 {
        t += 16;
        session.on_gyroscope(RawSample::new(0.0, 0.0, bias, t));
    }
    let heading = session.output().heading.unwrap();
    assert!((heading - 45.0).abs() < 0.01, "drifted to {}", heading);
}

#[test]
fn test_hard_iron_calibration_removes_offset() {
    let (mut session, _) = start(SensorCapabilities::MAGNETOMETER);
    let with_offset = |heading: f32, t: u64| {
        let s = mag(heading, t);
        RawSample::new(s.x + 6.0, s.y - 4.0, s.z, t)
    };

    let turn: Vec<RawSample> = (0..36)
        .map(|i| with_offset(i as f32 * 10.0, i as u64 * 16))
        .collect();
    session.calibrate_hard_iron(&turn);
    let offset = session.engine().calibration().mag_offset;
    assert!((offset.x - 6.0).abs() < 0.01 && (offset.y + 4.0).abs() < 0.01);
    assert!(session.engine().calibration().is_calibrated());

    let out = session.on_magnetometer(with_offset(90.0, 1000)).unwrap();
    assert!((out.heading.unwrap() - 90.0).abs() < 0.05, "{:?}", out);
}

#[test]
fn test_renderer_thread_reads_consistent_snapshots() {
    let (mut session, _) = start(SensorCapabilities::MAGNETOMETER | SensorCapabilities::GYROSCOPE);
    let target = session.on_location(LONDON).unwrap().degrees();
    let shared = session.shared_state();
    let done = Arc::new(AtomicBool::new(false));
    let ready = Arc::new(Barrier::new(2));

    let reader = {
        let shared = Arc::clone(&shared);
        let done = Arc::clone(&done);
        let ready = Arc::clone(&ready);
        thread::spawn(move || {
            ready.wait();
            let mut reads = 0u32;
            loop {
                let finished = done.load(Ordering::Acquire);
                let snapshot = shared.read();
                if let Some(heading) = snapshot.heading {
                    assert!((0.0..360.0).contains(&heading));

                    // Rotation, heading and zone must come from the same update
                    let relative = wrap_180(target - heading);
                    let drift = circular_delta(snapshot.cumulative_rotation, relative);
                    assert!(drift.abs() < 0.1, "torn snapshot {:?}", snapshot);

                    let abs = relative.abs();
                    let near_boundary = (abs - 5.0).abs() < 0.01 || (abs - 15.0).abs() < 0.01;
                    if !near_boundary {
                        let zone = if abs < 5.0 {
                            Zone::Aligned
                        } else if abs < 15.0 {
                            Zone::Close
                        } else {
                            Zone::Off
                        };
                        assert_eq!(snapshot.zone, zone, "torn snapshot {:?}", snapshot);
                    }
                }
                reads += 1;
                if finished {
                    break;
                }
            }
            reads
        })
    };

    let mut device = SimulatedDevice::new(SimulationConfig {
        rotation_rate_deg_s: 90.0,
        seed: Some(3),
        ..Default::default()
    });
    ready.wait();
    for _ in 0..500 {
        let samples = device.step();
        session.on_magnetometer(samples.magnetometer);
        session.on_gyroscope(samples.gyroscope);
    }
    done.store(true, Ordering::Release);
    assert!(reader.join().unwrap() > 0);
    assert_eq!(shared.read(), session.output());
}
