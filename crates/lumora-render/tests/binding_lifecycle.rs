//! Device, binding and render core working together against the mock driver.

use lumora_render::{
    ClearScene, DeviceRequest, DeviceSlot, FrameState, GpuDriver, RebindOutcome, RenderCore,
    RenderError, SurfaceBinding, SurfaceDescriptor, WindowRegistry,
};
use lumora_test_utils::{DriverCall, MockGpuDriver};

fn render_frame(
    driver: &mut MockGpuDriver,
    slot: &mut DeviceSlot,
    binding: &mut SurfaceBinding,
    core: &mut RenderCore,
    windows: &WindowRegistry,
    frame: &mut FrameState,
) -> Result<(), RenderError> {
    let device = slot.acquire(driver)?;
    let target = binding.acquire(device, driver, windows)?;
    let mut scene = ClearScene::default().with_triangle(true);
    let result = core.draw(driver, device, &target, frame, &mut scene)?;
    driver.submit(device.device(), result.commands)?;
    binding.present(target, driver, windows)?;
    frame.mark_presented(std::time::Instant::now());
    Ok(())
}

#[test]
fn test_device_loss_invalidates_dependents() {
    let mock = MockGpuDriver::new();
    let mut driver = mock.clone();
    let windows = WindowRegistry::new();
    let window = windows.register_headless();

    let mut slot = DeviceSlot::new(DeviceRequest::default());
    let device = slot.acquire(&mut driver).unwrap();
    let mut binding = SurfaceBinding::bind(
        SurfaceDescriptor::new(window, (800, 600)),
        device,
        &mut driver,
        &windows,
    )
    .unwrap();
    let mut core = RenderCore::new();
    let mut frame = FrameState::new();

    render_frame(
        &mut driver,
        &mut slot,
        &mut binding,
        &mut core,
        &windows,
        &mut frame,
    )
    .unwrap();
    assert_eq!(core.state().generation(), Some(1));

    // Loss is observed on the next poll
    mock.lose_device();
    assert_eq!(slot.check(&mut driver), Err(RenderError::DeviceLost));

    // Dependents go first, then the device is replaced
    binding.invalidate(&mut driver);
    core.release(&mut driver);
    let device = slot.acquire(&mut driver).unwrap();
    assert_eq!(device.generation(), 2);

    let descriptor = *binding.descriptor();
    let outcome = binding
        .rebind(descriptor, device, &mut driver, &windows)
        .unwrap();
    assert_eq!(outcome, RebindOutcome::Recreated);

    render_frame(
        &mut driver,
        &mut slot,
        &mut binding,
        &mut core,
        &windows,
        &mut frame,
    )
    .unwrap();
    assert_eq!(core.state().generation(), Some(2));
    assert_eq!(frame.frame_index(), 2);

    binding.release(&mut driver);
    core.release(&mut driver);
    slot.release(&mut driver);
    assert_eq!(mock.live_devices(), 0);
    assert_eq!(mock.live_swapchains(), 0);
    assert!(mock.violations().is_empty(), "{:?}", mock.violations());
}

#[test]
fn test_no_draw_after_invalidate() {
    let mock = MockGpuDriver::new();
    let mut driver = mock.clone();
    let windows = WindowRegistry::new();
    let window = windows.register_headless();

    let mut slot = DeviceSlot::new(DeviceRequest::default());
    let device = slot.acquire(&mut driver).unwrap();
    let mut binding = SurfaceBinding::bind(
        SurfaceDescriptor::new(window, (640, 480)),
        device,
        &mut driver,
        &windows,
    )
    .unwrap();
    binding.invalidate(&mut driver);
    mock.clear_calls();

    let result = render_frame(
        &mut driver,
        &mut slot,
        &mut binding,
        &mut RenderCore::new(),
        &windows,
        &mut FrameState::new(),
    );
    assert_eq!(result, Err(RenderError::SurfaceInvalid));
    assert!(
        !mock
            .calls()
            .iter()
            .any(|call| matches!(call, DriverCall::Encode { .. } | DriverCall::Present { .. }))
    );
}
