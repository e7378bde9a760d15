use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use lumora_core::profiling::{profile_function, profile_scope};
use lumora_test_utils::{
    AdapterCapabilities, DeviceBundle, DeviceRequest, DriverError, GpuCommands, GpuDevice,
    GpuDriver, GpuFrame, GpuPipeline, GpuSwapchain, PassDesc, PipelineDesc, SurfaceSource,
    SwapchainConfig,
};

/// Formats the bridge is willing to present in, most preferred first.
const CANDIDATE_FORMATS: [wgpu::TextureFormat; 4] = [
    wgpu::TextureFormat::Bgra8UnormSrgb,
    wgpu::TextureFormat::Rgba8UnormSrgb,
    wgpu::TextureFormat::Bgra8Unorm,
    wgpu::TextureFormat::Rgba8Unorm,
];

const CANDIDATE_PRESENT_MODES: [wgpu::PresentMode; 4] = [
    wgpu::PresentMode::Fifo,
    wgpu::PresentMode::FifoRelaxed,
    wgpu::PresentMode::Mailbox,
    wgpu::PresentMode::Immediate,
];

/// [`GpuDriver`] backed by wgpu.
///
/// The adapter is requested without a compatible surface so the device can outlive every
/// window; each swapchain validates its format and present mode against the real surface.
/// Adapter-level capabilities are therefore a superset of what any one surface accepts.
pub struct WgpuDriver {
    instance: Option<wgpu::Instance>,
    lost: Option<Arc<AtomicBool>>,
}

impl WgpuDriver {
    pub fn new() -> Self {
        Self {
            instance: None,
            lost: None,
        }
    }

    /// Use an existing instance instead of creating one from the device request.
    pub fn with_instance(instance: wgpu::Instance) -> Self {
        Self {
            instance: Some(instance),
            lost: None,
        }
    }

    fn is_lost(&self) -> bool {
        self.lost
            .as_ref()
            .is_some_and(|lost| lost.load(Ordering::Acquire))
    }

    fn check_lost(&self) -> Result<(), DriverError> {
        if self.is_lost() {
            Err(DriverError::DeviceLost)
        } else {
            Ok(())
        }
    }

    fn surface_config(
        surface: &wgpu::Surface<'static>,
        adapter: &wgpu::Adapter,
        config: &SwapchainConfig,
    ) -> Result<wgpu::SurfaceConfiguration, DriverError> {
        let caps = surface.get_capabilities(adapter);
        if caps.formats.is_empty() {
            return Err(DriverError::Unsupported(
                "surface is not compatible with the adapter".to_string(),
            ));
        }

        let format = match config.format {
            Some(format) if caps.formats.contains(&format) => format,
            Some(format) => {
                return Err(DriverError::Unsupported(format!(
                    "surface does not support {:?}",
                    format
                )));
            }
            None => caps
                .formats
                .iter()
                .copied()
                .find(|format| format.is_srgb())
                .unwrap_or(caps.formats[0]),
        };

        let auto = matches!(
            config.present_mode,
            wgpu::PresentMode::AutoVsync | wgpu::PresentMode::AutoNoVsync
        );
        if !auto && !caps.present_modes.contains(&config.present_mode) {
            return Err(DriverError::Unsupported(format!(
                "surface does not support {:?}",
                config.present_mode
            )));
        }

        Ok(wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: config.width,
            height: config.height,
            present_mode: config.present_mode,
            desired_maximum_frame_latency: config.max_frame_latency,
            alpha_mode: wgpu::CompositeAlphaMode::Auto,
            view_formats: vec![],
        })
    }
}

impl Default for WgpuDriver {
    fn default() -> Self {
        Self::new()
    }
}

fn classify(error: wgpu::Error) -> DriverError {
    match error {
        wgpu::Error::OutOfMemory { .. } => DriverError::OutOfMemory,
        other => DriverError::Other(other.to_string()),
    }
}

impl GpuDriver for WgpuDriver {
    fn request_device(&mut self, request: &DeviceRequest) -> Result<DeviceBundle, DriverError> {
        profile_function!();

        let instance = self.instance.get_or_insert_with(|| {
            wgpu::Instance::new(&wgpu::InstanceDescriptor {
                backends: request.backends,
                ..Default::default()
            })
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: request.power_preference,
            compatible_surface: None,
            force_fallback_adapter: request.force_fallback_adapter,
        }))
        .map_err(|e| {
            tracing::error!("No suitable GPU adapter: {}", e);
            DriverError::NoAdapter
        })?;

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: request.label,
            required_features: request.required_features,
            required_limits: request.limits.clone(),
            ..Default::default()
        }))
        .map_err(|e| DriverError::Other(e.to_string()))?;

        let lost = Arc::new(AtomicBool::new(false));
        let flag = lost.clone();
        device.set_device_lost_callback(move |reason, message| {
            if matches!(reason, wgpu::DeviceLostReason::Destroyed) {
                return;
            }
            tracing::error!("GPU device lost ({:?}): {}", reason, message);
            flag.store(true, Ordering::Release);
        });
        self.lost = Some(lost);

        let formats = CANDIDATE_FORMATS
            .into_iter()
            .filter(|format| {
                adapter
                    .get_texture_format_features(*format)
                    .allowed_usages
                    .contains(wgpu::TextureUsages::RENDER_ATTACHMENT)
            })
            .collect();
        let info = adapter.get_info();
        let capabilities = AdapterCapabilities {
            adapter_name: info.name.clone(),
            formats,
            present_modes: CANDIDATE_PRESENT_MODES.to_vec(),
            max_texture_dimension: device.limits().max_texture_dimension_2d,
        };
        tracing::info!("Using adapter '{}' ({:?})", info.name, info.backend);

        Ok(DeviceBundle {
            device: GpuDevice::from_wgpu(adapter, device, queue),
            capabilities,
        })
    }

    fn release_device(&mut self, device: GpuDevice) {
        if let Some(real) = device.real() {
            let _ = real.device.poll(wgpu::PollType::Wait {
                submission_index: None,
                timeout: None,
            });
        }
        self.lost = None;
        drop(device);
    }

    fn poll_device(&mut self, device: &GpuDevice) -> Result<(), DriverError> {
        let real = device.real().ok_or(DriverError::ForeignHandle)?;
        let _ = real.device.poll(wgpu::PollType::Poll);
        self.check_lost()
    }

    fn create_swapchain(
        &mut self,
        device: &GpuDevice,
        source: &SurfaceSource,
        config: &SwapchainConfig,
    ) -> Result<GpuSwapchain, DriverError> {
        profile_function!();
        self.check_lost()?;

        let real = device.real().ok_or(DriverError::ForeignHandle)?;
        let target = source.target.clone().ok_or(DriverError::WindowUnavailable)?;
        let instance = self
            .instance
            .as_ref()
            .ok_or_else(|| DriverError::Other("no instance".to_string()))?;

        let surface = instance
            .create_surface(target)
            .map_err(|e| DriverError::Other(e.to_string()))?;
        let surface_config = Self::surface_config(&surface, real.adapter, config)?;

        real.device.push_error_scope(wgpu::ErrorFilter::Validation);
        surface.configure(real.device, &surface_config);
        if let Some(error) = pollster::block_on(real.device.pop_error_scope()) {
            return Err(DriverError::Unsupported(error.to_string()));
        }

        Ok(GpuSwapchain::from_wgpu(surface, surface_config))
    }

    fn configure_swapchain(
        &mut self,
        device: &GpuDevice,
        swapchain: &mut GpuSwapchain,
        config: &SwapchainConfig,
    ) -> Result<(), DriverError> {
        profile_function!();
        self.check_lost()?;

        let real = device.real().ok_or(DriverError::ForeignHandle)?;
        let (surface, current) = swapchain.real_mut().ok_or(DriverError::ForeignHandle)?;
        let updated = Self::surface_config(surface, real.adapter, config)?;

        // Frames still in flight reference the old swapchain images
        if let Err(e) = real.device.poll(wgpu::PollType::Wait {
            submission_index: None,
            timeout: None,
        }) {
            tracing::warn!("Waiting for in-flight work before reconfigure failed: {}", e);
        }

        real.device.push_error_scope(wgpu::ErrorFilter::Validation);
        surface.configure(real.device, &updated);
        if let Some(error) = pollster::block_on(real.device.pop_error_scope()) {
            tracing::warn!("Surface reconfiguration rejected: {}", error);
            return Err(DriverError::SurfaceOutdated);
        }
        *current = updated;
        Ok(())
    }

    fn release_swapchain(&mut self, swapchain: GpuSwapchain) {
        drop(swapchain);
    }

    fn create_pipeline(
        &mut self,
        device: &GpuDevice,
        desc: &PipelineDesc<'_>,
    ) -> Result<GpuPipeline, DriverError> {
        profile_function!();
        self.check_lost()?;

        let real = device.real().ok_or(DriverError::ForeignHandle)?;
        real.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let shader = real
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(desc.label),
                source: wgpu::ShaderSource::Wgsl(desc.shader_source.into()),
            });

        let pipeline = real
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(desc.label),
                layout: None,
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some(desc.vertex_entry),
                    buffers: &[],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some(desc.fragment_entry),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: desc.target_format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState {
                    count: 1,
                    mask: !0,
                    alpha_to_coverage_enabled: false,
                },
                multiview: None,
                cache: None,
            });

        match pollster::block_on(real.device.pop_error_scope()) {
            Some(error) => Err(classify(error)),
            None => Ok(GpuPipeline::from_wgpu(pipeline)),
        }
    }

    fn release_pipeline(&mut self, pipeline: GpuPipeline) {
        drop(pipeline);
    }

    fn acquire_frame(
        &mut self,
        _device: &GpuDevice,
        swapchain: &GpuSwapchain,
    ) -> Result<GpuFrame, DriverError> {
        profile_function!();
        self.check_lost()?;

        let (surface, _) = swapchain.real().ok_or(DriverError::ForeignHandle)?;
        let texture = surface.get_current_texture().map_err(|e| match e {
            wgpu::SurfaceError::Timeout => DriverError::Timeout,
            wgpu::SurfaceError::Outdated => DriverError::SurfaceOutdated,
            wgpu::SurfaceError::Lost => DriverError::SurfaceLost,
            wgpu::SurfaceError::OutOfMemory => DriverError::OutOfMemory,
            _ => DriverError::SurfaceLost,
        })?;

        if texture.suboptimal {
            tracing::debug!("Acquired a suboptimal surface texture");
        }
        let view = texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        Ok(GpuFrame::from_wgpu(texture, view))
    }

    fn encode(
        &mut self,
        device: &GpuDevice,
        frame: &GpuFrame,
        pass: &PassDesc<'_>,
    ) -> Result<GpuCommands, DriverError> {
        profile_function!();
        self.check_lost()?;

        let real = device.real().ok_or(DriverError::ForeignHandle)?;
        let view = frame.view().ok_or(DriverError::ForeignHandle)?;
        let pipelines = pass
            .draws
            .iter()
            .map(|draw| draw.pipeline.as_wgpu().ok_or(DriverError::ForeignHandle))
            .collect::<Result<Vec<_>, _>>()?;

        real.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let mut encoder = real
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some(pass.label),
            });
        {
            let load = match pass.clear {
                Some(color) => wgpu::LoadOp::Clear(color),
                None => wgpu::LoadOp::Load,
            };
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(pass.label),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            for (draw, pipeline) in pass.draws.iter().zip(pipelines) {
                render_pass.set_pipeline(pipeline);
                render_pass.draw(draw.vertices.clone(), draw.instances.clone());
            }
        }
        let commands = encoder.finish();

        match pollster::block_on(real.device.pop_error_scope()) {
            Some(error) => Err(classify(error)),
            None => Ok(GpuCommands::from_wgpu(commands)),
        }
    }

    fn submit(&mut self, device: &GpuDevice, commands: GpuCommands) -> Result<(), DriverError> {
        profile_scope!("submit_commands");
        self.check_lost()?;

        let real = device.real().ok_or(DriverError::ForeignHandle)?;
        let commands = commands.into_wgpu().ok_or(DriverError::ForeignHandle)?;
        real.queue.submit(std::iter::once(commands));
        Ok(())
    }

    fn present(&mut self, frame: GpuFrame) -> Result<(), DriverError> {
        profile_scope!("present_surface");
        self.check_lost()?;

        let texture = frame.into_wgpu().ok_or(DriverError::ForeignHandle)?;
        texture.present();
        Ok(())
    }
}
