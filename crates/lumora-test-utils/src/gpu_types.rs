//! GPU handle wrappers that can be real or mock.
//!
//! The bridge only ever sees these opaque wrappers. A real driver stores wgpu objects in
//! them; the mock driver stores plain ids so tests can assert on what was created.

/// Wrapper around an adapter, logical device and queue.
///
/// # Design Pattern: Opaque Wrapper
///
/// This type hides whether it contains real wgpu objects or a mock id. Real variants are
/// reference counted by wgpu itself, so moving the wrapper between owners is cheap.
#[derive(Debug)]
pub struct GpuDevice {
    inner: GpuDeviceInner,
}

#[derive(Debug)]
enum GpuDeviceInner {
    Real {
        adapter: wgpu::Adapter,
        device: wgpu::Device,
        queue: wgpu::Queue,
    },
    #[cfg(feature = "mock")]
    Mock { id: usize },
}

/// Borrowed view of the wgpu objects inside a real [`GpuDevice`].
pub struct RealDevice<'a> {
    pub adapter: &'a wgpu::Adapter,
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
}

impl GpuDevice {
    pub fn from_wgpu(adapter: wgpu::Adapter, device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self {
            inner: GpuDeviceInner::Real {
                adapter,
                device,
                queue,
            },
        }
    }

    #[cfg(feature = "mock")]
    pub fn mock(id: usize) -> Self {
        Self {
            inner: GpuDeviceInner::Mock { id },
        }
    }

    /// The wgpu objects, or `None` for a mock device.
    pub fn real(&self) -> Option<RealDevice<'_>> {
        match &self.inner {
            GpuDeviceInner::Real {
                adapter,
                device,
                queue,
            } => Some(RealDevice {
                adapter,
                device,
                queue,
            }),
            #[cfg(feature = "mock")]
            GpuDeviceInner::Mock { .. } => None,
        }
    }

    #[cfg(feature = "mock")]
    pub fn mock_id(&self) -> Option<usize> {
        match &self.inner {
            GpuDeviceInner::Mock { id } => Some(*id),
            _ => None,
        }
    }
}

/// Wrapper around a configured presentation surface.
#[derive(Debug)]
pub struct GpuSwapchain {
    inner: GpuSwapchainInner,
}

#[derive(Debug)]
enum GpuSwapchainInner {
    Real {
        surface: wgpu::Surface<'static>,
        config: wgpu::SurfaceConfiguration,
    },
    #[cfg(feature = "mock")]
    Mock {
        id: usize,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
    },
}

impl GpuSwapchain {
    pub fn from_wgpu(surface: wgpu::Surface<'static>, config: wgpu::SurfaceConfiguration) -> Self {
        Self {
            inner: GpuSwapchainInner::Real { surface, config },
        }
    }

    #[cfg(feature = "mock")]
    pub fn mock(id: usize, width: u32, height: u32, format: wgpu::TextureFormat) -> Self {
        Self {
            inner: GpuSwapchainInner::Mock {
                id,
                width,
                height,
                format,
            },
        }
    }

    pub fn real(&self) -> Option<(&wgpu::Surface<'static>, &wgpu::SurfaceConfiguration)> {
        match &self.inner {
            GpuSwapchainInner::Real { surface, config } => Some((surface, config)),
            #[cfg(feature = "mock")]
            GpuSwapchainInner::Mock { .. } => None,
        }
    }

    pub fn real_mut(
        &mut self,
    ) -> Option<(&wgpu::Surface<'static>, &mut wgpu::SurfaceConfiguration)> {
        match &mut self.inner {
            GpuSwapchainInner::Real { surface, config } => Some((surface, config)),
            #[cfg(feature = "mock")]
            GpuSwapchainInner::Mock { .. } => None,
        }
    }

    /// Current (width, height) of the swapchain images.
    pub fn size(&self) -> (u32, u32) {
        match &self.inner {
            GpuSwapchainInner::Real { config, .. } => (config.width, config.height),
            #[cfg(feature = "mock")]
            GpuSwapchainInner::Mock { width, height, .. } => (*width, *height),
        }
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        match &self.inner {
            GpuSwapchainInner::Real { config, .. } => config.format,
            #[cfg(feature = "mock")]
            GpuSwapchainInner::Mock { format, .. } => *format,
        }
    }

    #[cfg(feature = "mock")]
    pub fn mock_id(&self) -> Option<usize> {
        match &self.inner {
            GpuSwapchainInner::Mock { id, .. } => Some(*id),
            _ => None,
        }
    }

    #[cfg(feature = "mock")]
    pub(crate) fn set_mock_extent(&mut self, new_width: u32, new_height: u32, new_format: wgpu::TextureFormat) {
        if let GpuSwapchainInner::Mock {
            width,
            height,
            format,
            ..
        } = &mut self.inner
        {
            *width = new_width;
            *height = new_height;
            *format = new_format;
        }
    }
}

/// One presentable image acquired from a swapchain.
#[derive(Debug)]
pub struct GpuFrame {
    inner: GpuFrameInner,
}

#[derive(Debug)]
enum GpuFrameInner {
    Real {
        texture: wgpu::SurfaceTexture,
        view: wgpu::TextureView,
    },
    #[cfg(feature = "mock")]
    Mock {
        id: usize,
        swapchain: usize,
        width: u32,
        height: u32,
    },
}

impl GpuFrame {
    pub fn from_wgpu(texture: wgpu::SurfaceTexture, view: wgpu::TextureView) -> Self {
        Self {
            inner: GpuFrameInner::Real { texture, view },
        }
    }

    #[cfg(feature = "mock")]
    pub fn mock(id: usize, swapchain: usize, width: u32, height: u32) -> Self {
        Self {
            inner: GpuFrameInner::Mock {
                id,
                swapchain,
                width,
                height,
            },
        }
    }

    pub fn view(&self) -> Option<&wgpu::TextureView> {
        match &self.inner {
            GpuFrameInner::Real { view, .. } => Some(view),
            #[cfg(feature = "mock")]
            GpuFrameInner::Mock { .. } => None,
        }
    }

    /// Consumes the frame, returning the surface texture to present.
    pub fn into_wgpu(self) -> Option<wgpu::SurfaceTexture> {
        match self.inner {
            GpuFrameInner::Real { texture, .. } => Some(texture),
            #[cfg(feature = "mock")]
            GpuFrameInner::Mock { .. } => None,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        match &self.inner {
            GpuFrameInner::Real { texture, .. } => {
                (texture.texture.width(), texture.texture.height())
            }
            #[cfg(feature = "mock")]
            GpuFrameInner::Mock { width, height, .. } => (*width, *height),
        }
    }

    /// (frame id, swapchain id) for mock frames.
    #[cfg(feature = "mock")]
    pub fn mock_ids(&self) -> Option<(usize, usize)> {
        match &self.inner {
            GpuFrameInner::Mock { id, swapchain, .. } => Some((*id, *swapchain)),
            _ => None,
        }
    }
}

/// Wrapper around a render pipeline.
#[derive(Clone, Debug)]
pub struct GpuPipeline {
    inner: GpuPipelineInner,
}

#[derive(Clone, Debug)]
enum GpuPipelineInner {
    Real(wgpu::RenderPipeline),
    #[cfg(feature = "mock")]
    Mock { id: usize },
}

impl GpuPipeline {
    pub fn from_wgpu(pipeline: wgpu::RenderPipeline) -> Self {
        Self {
            inner: GpuPipelineInner::Real(pipeline),
        }
    }

    #[cfg(feature = "mock")]
    pub fn mock(id: usize) -> Self {
        Self {
            inner: GpuPipelineInner::Mock { id },
        }
    }

    pub fn as_wgpu(&self) -> Option<&wgpu::RenderPipeline> {
        match &self.inner {
            GpuPipelineInner::Real(pipeline) => Some(pipeline),
            #[cfg(feature = "mock")]
            GpuPipelineInner::Mock { .. } => None,
        }
    }

    #[cfg(feature = "mock")]
    pub fn mock_id(&self) -> Option<usize> {
        match &self.inner {
            GpuPipelineInner::Mock { id } => Some(*id),
            _ => None,
        }
    }
}

/// Encoded commands ready for submission.
#[derive(Debug)]
pub struct GpuCommands {
    inner: GpuCommandsInner,
}

#[derive(Debug)]
enum GpuCommandsInner {
    Real(wgpu::CommandBuffer),
    #[cfg(feature = "mock")]
    Mock { id: usize, draw_calls: usize },
}

impl GpuCommands {
    pub fn from_wgpu(commands: wgpu::CommandBuffer) -> Self {
        Self {
            inner: GpuCommandsInner::Real(commands),
        }
    }

    #[cfg(feature = "mock")]
    pub fn mock(id: usize, draw_calls: usize) -> Self {
        Self {
            inner: GpuCommandsInner::Mock { id, draw_calls },
        }
    }

    pub fn into_wgpu(self) -> Option<wgpu::CommandBuffer> {
        match self.inner {
            GpuCommandsInner::Real(commands) => Some(commands),
            #[cfg(feature = "mock")]
            GpuCommandsInner::Mock { .. } => None,
        }
    }

    #[cfg(feature = "mock")]
    pub fn mock_draw_calls(&self) -> Option<usize> {
        match &self.inner {
            GpuCommandsInner::Mock { draw_calls, .. } => Some(*draw_calls),
            _ => None,
        }
    }
}
