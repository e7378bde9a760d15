use ahash::AHashMap;
use lumora_core::profiling::{profile_function, profile_scope};
use lumora_test_utils::{DrawCall, GpuCommands, GpuDriver, GpuPipeline, PassDesc};

use crate::device::DeviceContext;
use crate::error::RenderError;
use crate::frame::{FrameState, FrameStats};
use crate::pipeline::PipelineKind;
use crate::scene::{DrawList, Scene};
use crate::surface::PresentableTarget;

/// Surface-independent GPU resources.
///
/// Pipelines are keyed by kind and target format and tagged with the device generation that
/// created them, so they survive swapchain re-creation but not device loss.
#[derive(Debug, Default)]
pub struct RenderCoreState {
    pipelines: AHashMap<(PipelineKind, wgpu::TextureFormat), GpuPipeline>,
    generation: Option<u64>,
}

impl RenderCoreState {
    pub fn pipeline_count(&self) -> usize {
        self.pipelines.len()
    }

    /// Device generation the cached resources belong to.
    pub fn generation(&self) -> Option<u64> {
        self.generation
    }

    fn ensure_pipeline(
        &mut self,
        kind: PipelineKind,
        format: wgpu::TextureFormat,
        device: &DeviceContext,
        driver: &mut dyn GpuDriver,
    ) -> Result<(), RenderError> {
        if self.pipelines.contains_key(&(kind, format)) {
            return Ok(());
        }

        profile_scope!("create_pipeline");
        let pipeline = driver.create_pipeline(device.device(), &kind.desc(format))?;
        tracing::debug!("Created {:?} pipeline for {:?}", kind, format);
        self.pipelines.insert((kind, format), pipeline);
        Ok(())
    }

    fn release(&mut self, driver: &mut dyn GpuDriver) {
        for (_, pipeline) in self.pipelines.drain() {
            driver.release_pipeline(pipeline);
        }
        self.generation = None;
    }
}

/// Output of one [`RenderCore::draw`]: encoded work ready for submission.
#[derive(Debug)]
pub struct DrawResult {
    pub commands: GpuCommands,
    pub stats: FrameStats,
}

/// Records a scene into a presentable target.
///
/// Holds no reference to any surface; every call receives its target and gives it back
/// untouched once encoding is done.
#[derive(Debug, Default)]
pub struct RenderCore {
    state: RenderCoreState,
    draws: DrawList,
}

impl RenderCore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &RenderCoreState {
        &self.state
    }

    /// Record `scene` and encode it for `target`.
    ///
    /// Submission and presentation are left to the caller.
    pub fn draw(
        &mut self,
        driver: &mut dyn GpuDriver,
        device: &DeviceContext,
        target: &PresentableTarget,
        frame: &FrameState,
        scene: &mut dyn Scene,
    ) -> Result<DrawResult, RenderError> {
        profile_function!();

        if self.state.generation != Some(device.generation()) {
            if self.state.generation.is_some() {
                tracing::debug!("Dropping render resources from a previous device");
            }
            self.state.release(driver);
            self.state.generation = Some(device.generation());
        }

        self.draws.reset();
        {
            profile_scope!("record_scene");
            scene.record(frame, &mut self.draws);
        }

        let format = target.format();
        for command in self.draws.commands() {
            self.state
                .ensure_pipeline(command.pipeline, format, device, driver)?;
        }

        let mut calls = Vec::with_capacity(self.draws.commands().len());
        for command in self.draws.commands() {
            let pipeline = self
                .state
                .pipelines
                .get(&(command.pipeline, format))
                .ok_or(RenderError::DeviceLost)?;
            calls.push(DrawCall {
                pipeline,
                vertices: command.vertices.clone(),
                instances: command.instances.clone(),
            });
        }

        let commands = {
            profile_scope!("encode");
            driver.encode(
                device.device(),
                target.frame(),
                &PassDesc {
                    label: "lumora-frame",
                    clear: self.draws.clear_color(),
                    draws: &calls,
                },
            )?
        };

        Ok(DrawResult {
            commands,
            stats: FrameStats {
                passes: 1,
                draw_calls: calls.len(),
            },
        })
    }

    /// Drop every cached resource. Call when the device is lost or torn down.
    pub fn release(&mut self, driver: &mut dyn GpuDriver) {
        if self.state.pipeline_count() > 0 {
            tracing::debug!("Releasing {} pipelines", self.state.pipeline_count());
        }
        self.state.release(driver);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceSlot;
    use crate::scene::ClearScene;
    use crate::surface::{SurfaceBinding, SurfaceDescriptor};
    use crate::window::WindowRegistry;
    use lumora_test_utils::{DeviceRequest, DriverError, MockGpuDriver, MockOp};

    #[test]
    fn test_pipelines_cached_across_frames() {
        let mock = MockGpuDriver::new();
        let mut driver = mock.clone();
        let windows = WindowRegistry::new();
        let window = windows.register_headless();
        let mut slot = DeviceSlot::new(DeviceRequest::default());
        let device = slot.acquire(&mut driver).unwrap();
        let mut binding = SurfaceBinding::bind(
            SurfaceDescriptor::new(window, (320, 240)),
            device,
            &mut driver,
            &windows,
        )
        .unwrap();

        let mut core = RenderCore::new();
        let mut scene = ClearScene::default().with_triangle(true);
        let frame = FrameState::new();

        for _ in 0..3 {
            let target = binding.acquire(device, &mut driver, &windows).unwrap();
            let result = core
                .draw(&mut driver, device, &target, &frame, &mut scene)
                .unwrap();
            assert_eq!(result.stats.draw_calls, 1);
            driver.submit(device.device(), result.commands).unwrap();
            binding.present(target, &mut driver, &windows).unwrap();
        }

        assert_eq!(mock.count_pipeline_creates(), 1);
        assert_eq!(core.state().pipeline_count(), 1);

        core.release(&mut driver);
        assert_eq!(mock.live_pipelines(), 0);
    }

    #[test]
    fn test_out_of_memory_during_encode() {
        let mock = MockGpuDriver::new();
        let mut driver = mock.clone();
        let windows = WindowRegistry::new();
        let window = windows.register_headless();
        let mut slot = DeviceSlot::new(DeviceRequest::default());
        let device = slot.acquire(&mut driver).unwrap();
        let mut binding = SurfaceBinding::bind(
            SurfaceDescriptor::new(window, (320, 240)),
            device,
            &mut driver,
            &windows,
        )
        .unwrap();

        mock.fail_next(MockOp::Encode, DriverError::OutOfMemory);
        let mut core = RenderCore::new();
        let target = binding.acquire(device, &mut driver, &windows).unwrap();
        let err = core
            .draw(
                &mut driver,
                device,
                &target,
                &FrameState::new(),
                &mut ClearScene::default(),
            )
            .unwrap_err();
        assert_eq!(err, RenderError::OutOfMemory);
        assert!(err.is_frame_local());
    }
}
