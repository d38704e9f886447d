//! Integration tests for the simulation loop.
//!
//! # Purpose
//!
//! These tests drive a `SimulationLoop` through its public API with the real
//! channels and a `RecordingEngine`, the same way `main.rs` wires it.  They
//! verify:
//!
//! - Registration: ids, kind isolation, and the end-to-end ordering of mixed
//!   kinect and beamer requests.
//! - Rejection: bad kinds and bad states leave the registry untouched and do
//!   not stop the loop.
//! - Calibration: the start-up order reaching the engine, and updates queued
//!   from the control side.
//! - Frames: a slow consumer only ever sees the newest frame.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use sandbox_core::{decode_request, CalibrationState, CalibrationUpdate, ClientKind, Command, Frame};
use sandbox_master::application::simulation_loop::{LoopState, SimulationLoop};
use sandbox_master::infrastructure::channel::{
    command_channel, frame_channel, ChannelError, CommandSender, FrameReceiver,
};
use sandbox_master::infrastructure::engine::{EngineCall, HeightMapEngine, RecordingEngine};
use serde_json::json;

fn start(
    engine: RecordingEngine,
    initial: CalibrationState,
) -> (SimulationLoop<RecordingEngine>, CommandSender, FrameReceiver) {
    let (cmd_tx, cmd_rx) = command_channel();
    let (frame_tx, frame_rx) = frame_channel();
    let frame = Frame::new(16, 9).expect("valid dimensions");
    let sim = SimulationLoop::new(engine, initial, frame, cmd_rx, frame_tx);
    (sim, cmd_tx, frame_rx)
}

fn drain(sim: &mut SimulationLoop<RecordingEngine>) {
    while sim.step().expect("channels open") == LoopState::Dispatching {}
}

// ── Registration ─────────────────────────────────────────────────────────────

#[test]
fn test_mixed_registrations_end_to_end() {
    // Arrange
    let (mut sim, tx, _frames) = start(RecordingEngine::default(), CalibrationState::default());
    let p1 = json!({ "serial": "K-001" });
    let p2 = json!({ "width": 1280, "height": 800 });
    let p3 = json!({ "serial": "K-002" });

    // Act
    tx.send(Command::register("kinect", p1.clone())).unwrap();
    tx.send(Command::register("beamer", p2.clone())).unwrap();
    tx.send(Command::register("kinect", p3.clone())).unwrap();
    drain(&mut sim);

    // Assert
    let kinects = sim.registry().list(ClientKind::Kinect);
    assert_eq!(kinects.len(), 2);
    assert_eq!(kinects[0].id, 0);
    assert_eq!(json!(kinects[0].payload), p1);
    assert_eq!(kinects[1].id, 1);
    assert_eq!(json!(kinects[1].payload), p3);

    let beamers = sim.registry().list(ClientKind::Beamer);
    assert_eq!(beamers.len(), 1);
    assert_eq!(beamers[0].id, 0);
    assert_eq!(json!(beamers[0].payload), p2);
}

#[test]
fn test_registering_one_kind_never_touches_the_other() {
    let (mut sim, tx, _frames) = start(RecordingEngine::default(), CalibrationState::default());

    for _ in 0..5 {
        tx.send(Command::register("beamer", json!({}))).unwrap();
    }
    drain(&mut sim);

    assert_eq!(sim.registry().len(ClientKind::Beamer), 5);
    assert!(sim.registry().list(ClientKind::Kinect).is_empty());
    assert_eq!(sim.registry().list(ClientKind::Beamer)[4].id, 4);
}

#[test]
fn test_wire_requests_flow_through_to_registry() {
    // Arrange – the same lines a control-plane session would decode
    let (mut sim, tx, _frames) = start(RecordingEngine::default(), CalibrationState::default());
    let lines = [
        r#"{"state":"init","type":"kinect","payload":{"n":1}}"#,
        r#"{"state":"init","kind":"projector","payload":{}}"#,
        r#"{"state":"update","kind":"kinect","payload":{}}"#,
        r#"{"state":"init","kind":"beamer"}"#,
    ];

    // Act
    for line in lines {
        tx.send(decode_request(line).expect("well-formed")).unwrap();
    }
    drain(&mut sim);

    // Assert
    assert_eq!(sim.registry().len(ClientKind::Kinect), 1);
    assert_eq!(sim.registry().len(ClientKind::Beamer), 1);
    assert_eq!(sim.stats().commands_rejected, 2);
    assert_eq!(sim.stats().commands_applied, 2);
}

// ── Calibration ──────────────────────────────────────────────────────────────

#[test]
fn test_startup_calibration_order_reaches_engine() {
    // Arrange
    let engine = RecordingEngine::default();
    let initial = CalibrationState {
        height_shift: -0.1,
        height_scale: 2.0,
        drag_offset_x: 0.0,
        drag_offset_y: 0.0,
        zoom: 1.0,
    };

    // Act
    let (_sim, _tx, _frames) = start(engine.clone(), initial);

    // Assert
    assert_eq!(
        engine.calibration_calls(),
        vec![
            EngineCall::SetHeightConfig {
                shift: -0.1,
                scale: 2.0
            },
            EngineCall::ResetDrag,
            EngineCall::ApplyDrag { dx: 0.0, dy: 0.0 },
        ]
    );
}

#[test]
fn test_queued_calibration_updates_apply_in_order() {
    // Arrange
    let engine = RecordingEngine::default();
    let (mut sim, tx, _frames) = start(engine.clone(), CalibrationState::default());
    let startup_calls = engine.calibration_calls().len();

    // Act
    tx.send(Command::UpdateCalibration(CalibrationUpdate::DragBy {
        dx: 3.0,
        dy: 1.0,
    }))
    .unwrap();
    tx.send(Command::UpdateCalibration(CalibrationUpdate::SetDrag {
        x: -2.0,
        y: 0.5,
    }))
    .unwrap();
    drain(&mut sim);

    // Assert
    assert_eq!(
        engine.calibration_calls()[startup_calls..],
        [
            EngineCall::ApplyDrag { dx: 3.0, dy: 1.0 },
            EngineCall::ResetDrag,
            EngineCall::ApplyDrag { dx: -2.0, dy: 0.5 },
        ]
    );
    assert_eq!(sim.calibration().drag_offset_x, -2.0);
    assert_eq!(sim.calibration().drag_offset_y, 0.5);
}

#[test]
fn test_huge_wire_drags_keep_the_height_map_loop_running() {
    // Arrange
    let (cmd_tx, cmd_rx) = command_channel();
    let (frame_tx, frame_rx) = frame_channel();
    let frame = Frame::new(8, 4).expect("valid dimensions");
    let mut sim = SimulationLoop::new(
        HeightMapEngine::new(8, 4),
        CalibrationState::default(),
        frame,
        cmd_rx,
        frame_tx,
    );
    let line = r#"{"calibrate":{"op":"drag_by","dx":1e300,"dy":-1e300}}"#;

    // Act
    for _ in 0..3 {
        cmd_tx.send(decode_request(line).expect("well-formed")).unwrap();
    }
    while sim.step().expect("channels open") == LoopState::Dispatching {}

    // Assert
    assert_eq!(sim.stats().commands_applied, 3);
    assert_eq!(sim.calibration().drag_offset_x, 3e300);
    let rendered = frame_rx.try_take().unwrap().expect("rendered frame");
    assert!(rendered.pixels().iter().all(|&p| p == 0));
}

// ── Frames ───────────────────────────────────────────────────────────────────

#[test]
fn test_every_iteration_renders_once() {
    let engine = RecordingEngine::default();
    let (mut sim, tx, _frames) = start(engine.clone(), CalibrationState::default());
    tx.send(Command::register("kinect", json!({}))).unwrap();

    sim.step().unwrap();
    sim.step().unwrap();

    assert_eq!(engine.render_count(), 2);
}

#[test]
fn test_slow_consumer_sees_only_the_newest_frame() {
    // Arrange
    let (mut sim, _tx, frames) = start(RecordingEngine::new(200), CalibrationState::default());

    // Act – three frames offered, none consumed
    for _ in 0..3 {
        sim.step().unwrap();
    }

    // Assert
    let frame = frames.try_take().unwrap().expect("newest frame");
    assert_eq!((frame.width(), frame.height()), (16, 9));
    assert_eq!(frame.get(15, 8), Some(200));
    assert_eq!(frames.try_take(), Ok(None));
    assert_eq!(sim.stats().frames_replaced, 2);
}

// ── Lifecycle ────────────────────────────────────────────────────────────────

#[test]
fn test_run_on_thread_processes_commands_until_stopped() {
    // Arrange
    let (sim, tx, frames) = start(RecordingEngine::default(), CalibrationState::default());
    let mut sim = sim.with_poll_interval(Duration::from_millis(10));
    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);
    tx.send(Command::register("kinect", json!({}))).unwrap();
    tx.send(Command::register("beamer", json!({}))).unwrap();

    // Act
    let handle = std::thread::spawn(move || {
        let result = sim.run(&flag);
        (result, sim)
    });
    std::thread::sleep(Duration::from_millis(150));
    running.store(false, Ordering::Relaxed);
    let (result, sim) = handle.join().expect("loop thread");

    // Assert
    assert_eq!(result, Ok(()));
    assert_eq!(sim.registry().len(ClientKind::Kinect), 1);
    assert_eq!(sim.registry().len(ClientKind::Beamer), 1);
    assert!(frames.try_take().unwrap().is_some());
}

#[test]
fn test_run_ends_with_closed_when_all_senders_dropped() {
    let (sim, tx, _frames) = start(RecordingEngine::default(), CalibrationState::default());
    let mut sim = sim.with_poll_interval(Duration::from_millis(5));
    let running = AtomicBool::new(true);
    tx.send(Command::register("kinect", json!({}))).unwrap();
    drop(tx);

    let result = sim.run(&running);

    assert_eq!(result, Err(ChannelError::Closed));
    assert_eq!(sim.registry().len(ClientKind::Kinect), 1);
}
