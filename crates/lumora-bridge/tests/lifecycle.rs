//! Host lifecycle sequences driven through the bridge against the mock driver.

mod common;

use common::{Harness, presented};
use lumora_bridge::{
    BridgeError, ErrorKind, SchedulerAction, SchedulerError, SchedulerState, Session, TickOutcome,
};
use lumora_core::PhysicalSize;
use lumora_core::config::Config;
use lumora_render::SurfaceDescriptor;
use lumora_test_utils::{DriverCall, DriverError, MockOp};

#[test]
fn test_resize_destroy_recreate_keeps_device() {
    let mut h = Harness::new(Config::default());
    let window = h.create_surface(800, 600);

    let outcomes = h.tick_n(3);
    assert!(outcomes.iter().copied().all(presented));
    assert_eq!(h.mock.count_presents(), 3);
    assert_eq!(h.mock.last_swapchain_size(), Some((800, 600)));

    h.bridge
        .on_surface_changed(SurfaceDescriptor::new(window, (1200, 800)))
        .unwrap();
    h.mock.clear_calls();
    assert_eq!(h.tick(), TickOutcome::Presented { frame_index: 3 });

    // Exactly one rebind, in place, before the draw
    let calls = h.mock.calls();
    let configures: Vec<_> = calls
        .iter()
        .filter(|call| matches!(call, DriverCall::ConfigureSwapchain { .. }))
        .collect();
    assert_eq!(configures.len(), 1);
    assert!(matches!(
        calls.first(),
        Some(DriverCall::ConfigureSwapchain {
            width: 1200,
            height: 800,
            ..
        })
    ));
    assert_eq!(h.mock.count_swapchain_creates(), 0);
    assert_eq!(
        h.bridge.status().surface_size,
        Some(PhysicalSize::new(1200, 800))
    );

    h.bridge.on_surface_destroyed().unwrap();
    assert_eq!(h.tick(), TickOutcome::Idle);
    assert_eq!(h.worker.state(), SchedulerState::Paused);
    assert!(!h.worker.binding().unwrap().is_valid());
    assert_eq!(h.mock.live_swapchains(), 0);
    assert!(!h.bridge.windows().is_alive(window));
    assert_eq!(h.worker.session(), Session::Dormant);

    h.create_surface(1200, 800);
    assert!(presented(h.tick()));
    assert_eq!(h.worker.state(), SchedulerState::Running);
    assert_eq!(h.mock.attempts(MockOp::RequestDevice), 1);
    assert_eq!(h.mock.count_swapchain_creates(), 1);
    assert_eq!(h.worker.device_generation(), 1);
    assert!(h.mock.violations().is_empty());

    let log = h.scene.log();
    assert_eq!(
        log.resized,
        vec![
            PhysicalSize::new(800, 600),
            PhysicalSize::new(1200, 800),
            PhysicalSize::new(1200, 800),
        ]
    );
    assert_eq!(log.paused, 1);
    assert_eq!(log.resumed, 1);
    assert_eq!(log.recorded, 5);
}

#[test]
fn test_zero_sized_resize_is_ignored() {
    let mut h = Harness::new(Config::default());
    let window = h.create_surface(800, 600);
    assert!(presented(h.tick()));

    h.bridge
        .on_surface_changed(SurfaceDescriptor::new(window, (0, 600)))
        .unwrap();
    assert!(presented(h.tick()));
    assert_eq!(h.mock.count_configures(), 0);
    assert_eq!(h.mock.last_swapchain_size(), Some((800, 600)));
}

#[test]
fn test_identical_resize_does_not_touch_swapchain() {
    let mut h = Harness::new(Config::default());
    let window = h.create_surface(800, 600);
    assert!(presented(h.tick()));

    h.bridge
        .on_surface_changed(SurfaceDescriptor::new(window, (800, 600)))
        .unwrap();
    assert!(presented(h.tick()));
    assert_eq!(h.mock.count_configures(), 0);
    assert_eq!(h.mock.count_swapchain_creates(), 1);
}

#[test]
fn test_host_pause_and_resume() {
    let mut h = Harness::new(Config::default());
    h.create_surface(640, 480);
    assert!(presented(h.tick()));

    h.bridge.on_pause().unwrap();
    assert_eq!(h.tick(), TickOutcome::Idle);
    assert_eq!(h.mock.count_presents(), 1);

    // A second pause is an illegal transition and changes nothing
    h.bridge.on_pause().unwrap();
    assert_eq!(h.tick(), TickOutcome::Idle);

    h.bridge.on_resume().unwrap();
    assert!(presented(h.tick()));
    assert_eq!(h.mock.count_presents(), 2);
    assert_eq!(h.mock.count_swapchain_creates(), 1);
}

#[test]
fn test_resume_without_surface_waits() {
    let mut h = Harness::new(Config::default());
    h.create_surface(640, 480);
    assert!(presented(h.tick()));

    h.bridge.on_pause().unwrap();
    h.bridge.on_surface_destroyed().unwrap();
    h.bridge.on_resume().unwrap();
    assert_eq!(h.tick(), TickOutcome::Idle);
    assert_eq!(h.worker.state(), SchedulerState::Paused);

    h.create_surface(640, 480);
    assert!(presented(h.tick()));
}

#[test]
fn test_surface_creation_failure_is_recoverable() {
    let mut h = Harness::new(Config::default());
    h.mock.fail_next(MockOp::CreateSwapchain, DriverError::WindowUnavailable);
    h.create_surface(800, 600);
    assert_eq!(h.tick(), TickOutcome::Idle);
    assert_eq!(h.worker.state(), SchedulerState::Idle);
    assert_eq!(
        h.callbacks.recoverable(),
        vec![ErrorKind::SurfaceCreationFailed]
    );
    assert!(h.callbacks.fatal().is_empty());

    h.create_surface(800, 600);
    assert!(presented(h.tick()));
}

#[test]
fn test_destroy_releases_everything() {
    let mut h = Harness::new(Config::default());
    h.create_surface(800, 600);
    h.tick_n(2);
    assert_eq!(h.mock.live_devices(), 1);

    h.bridge.on_destroy().unwrap();
    assert_eq!(h.tick(), TickOutcome::Stopped);
    assert_eq!(h.worker.session(), Session::Stopped);
    assert_eq!(h.mock.live_devices(), 0);
    assert_eq!(h.mock.live_swapchains(), 0);
    assert_eq!(h.mock.live_pipelines(), 0);
    assert!(h.mock.violations().is_empty());

    // Further host calls are rejected, repeated destroys are not
    assert!(matches!(
        h.bridge.on_pause(),
        Err(BridgeError::Disconnected)
    ));
    assert!(h.bridge.on_destroy().is_ok());
}

#[test]
fn test_worker_rejects_transitions_after_stop() {
    let mut h = Harness::new(Config::default());
    let window = h.create_surface(800, 600);
    assert!(presented(h.tick()));

    h.worker.stop().unwrap();
    let creates = h.mock.count_device_creates();

    assert_eq!(
        h.worker.start(),
        Err(SchedulerError::IllegalTransition {
            from: SchedulerState::Stopped,
            action: SchedulerAction::Start,
        })
    );
    assert_eq!(
        h.worker
            .resume(Some(SurfaceDescriptor::new(window, (800, 600)))),
        Err(SchedulerError::IllegalTransition {
            from: SchedulerState::Stopped,
            action: SchedulerAction::Resume,
        })
    );
    assert_eq!(
        h.worker.pause(),
        Err(SchedulerError::IllegalTransition {
            from: SchedulerState::Stopped,
            action: SchedulerAction::Pause,
        })
    );

    assert_eq!(h.tick(), TickOutcome::Stopped);
    assert_eq!(h.mock.count_device_creates(), creates);
    assert_eq!(h.mock.live_devices(), 0);
    assert!(h.mock.violations().is_empty());
}

#[test]
fn test_frame_statistics_are_reported_when_enabled() {
    let mut h = Harness::new(Config::default().with_frame_statistics(true));
    h.create_surface(320, 240);
    h.tick_n(3);
    assert_eq!(h.callbacks.frames(), vec![0, 1, 2]);
    assert_eq!(h.bridge.status().frames_presented, 3);
}

#[test]
fn test_frame_statistics_are_off_by_default() {
    let mut h = Harness::new(Config::default());
    h.create_surface(320, 240);
    h.tick_n(3);
    assert!(h.callbacks.frames().is_empty());
}

#[test]
fn test_swapchain_uses_configured_frame_latency() {
    let mut h = Harness::new(Config::default().with_max_frame_latency(3));
    h.create_surface(320, 240);
    assert!(presented(h.tick()));
    assert_eq!(
        h.worker.binding().unwrap().descriptor().max_frame_latency,
        3
    );
}
