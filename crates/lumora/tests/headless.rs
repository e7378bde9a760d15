//! The public surface used headlessly, the way a host test harness would.

use lumora::driver::MockGpuDriver;
use lumora::prelude::*;
use lumora::{Session, TickOutcome};

#[test]
fn test_headless_session() {
    let mock = MockGpuDriver::new();
    let (bridge, mut worker) = BridgeBuilder::new(mock.clone())
        .scene(ClearScene::default().with_triangle(true))
        .build();

    let window = bridge.windows().register_headless();
    bridge
        .on_surface_created(SurfaceDescriptor::new(window, (640, 480)))
        .unwrap();

    for expected in 0..3 {
        assert_eq!(
            worker.run_once(),
            TickOutcome::Presented {
                frame_index: expected
            }
        );
    }
    assert!(matches!(bridge.status().session, Session::Active { .. }));
    assert_eq!(mock.count_pipeline_creates(), 1);

    // Toggle the triangle off with a click
    bridge.on_input_event(InputEvent::PointerButton {
        button: PointerButton::Primary,
        pressed: true,
    });
    mock.clear_calls();
    worker.run_once();
    assert_eq!(
        mock.calls()
            .iter()
            .filter(|call| matches!(call, lumora::driver::DriverCall::Submit { draw_calls: 0 }))
            .count(),
        1
    );

    bridge.on_destroy().unwrap();
    assert_eq!(worker.run_once(), TickOutcome::Stopped);
    assert_eq!(mock.live_devices(), 0);
}
