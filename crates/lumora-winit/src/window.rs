use std::sync::Arc;

use lumora_core::PhysicalSize;
use lumora_render::{HostWindowId, SurfaceDescriptor, WindowRegistry, wgpu};
use winit::error::OsError;
use winit::event_loop::ActiveEventLoop;

pub use winit::window::Window as WinitWindow;

/// How the host window is created.
#[derive(Debug, Clone)]
pub struct WindowDescriptor {
    pub title: String,
    pub resizable: bool,
    pub size: Option<PhysicalSize<u32>>,
    pub present_mode: wgpu::PresentMode,
    pub format: Option<wgpu::TextureFormat>,
}

impl Default for WindowDescriptor {
    fn default() -> Self {
        Self {
            title: "Lumora".to_string(),
            resizable: true,
            size: None,
            present_mode: wgpu::PresentMode::AutoVsync,
            format: None,
        }
    }
}

impl WindowDescriptor {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = Some(PhysicalSize::new(width, height));
        self
    }

    pub fn with_present_mode(mut self, mode: wgpu::PresentMode) -> Self {
        self.present_mode = mode;
        self
    }
}

/// A winit window registered with the bridge.
///
/// The registry entry shares the window through an `Arc`. The bridge retires the entry when
/// the surface is destroyed, after which the render thread never touches the window again.
pub struct HostWindow {
    window: Arc<WinitWindow>,
    id: HostWindowId,
    present_mode: wgpu::PresentMode,
    format: Option<wgpu::TextureFormat>,
}

impl HostWindow {
    pub(crate) fn create(
        event_loop: &ActiveEventLoop,
        descriptor: &WindowDescriptor,
        windows: &WindowRegistry,
    ) -> Result<Self, OsError> {
        let mut attributes = WinitWindow::default_attributes()
            .with_title(descriptor.title.clone())
            .with_resizable(descriptor.resizable);
        if let Some(size) = descriptor.size {
            attributes =
                attributes.with_inner_size(winit::dpi::PhysicalSize::new(size.width, size.height));
        }

        let window = Arc::new(event_loop.create_window(attributes)?);
        let id = windows.register(window.clone());
        let notify = Arc::clone(&window);
        windows.set_pre_present(id, Arc::new(move || notify.pre_present_notify()));
        tracing::info!("Created host window {} ({:?})", id, window.id());

        Ok(Self {
            window,
            id,
            present_mode: descriptor.present_mode,
            format: descriptor.format,
        })
    }

    pub fn id(&self) -> HostWindowId {
        self.id
    }

    pub fn winit_id(&self) -> winit::window::WindowId {
        self.window.id()
    }

    pub fn window(&self) -> &WinitWindow {
        &self.window
    }

    pub fn physical_size(&self) -> PhysicalSize<u32> {
        to_physical_size(self.window.inner_size())
    }

    /// Surface descriptor for the window at its current size.
    pub fn surface(&self) -> SurfaceDescriptor {
        self.surface_at(self.physical_size())
    }

    pub fn surface_at(&self, size: PhysicalSize<u32>) -> SurfaceDescriptor {
        let descriptor =
            SurfaceDescriptor::new(self.id, size).with_present_mode(self.present_mode);
        match self.format {
            Some(format) => descriptor.with_format(format),
            None => descriptor,
        }
    }
}

impl std::fmt::Debug for HostWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostWindow")
            .field("id", &self.id)
            .field("winit_id", &self.window.id())
            .finish()
    }
}

pub fn to_physical_size(size: winit::dpi::PhysicalSize<u32>) -> PhysicalSize<u32> {
    PhysicalSize::new(size.width, size.height)
}
