use lumora_bridge::{Bridge, BridgeBuilder, BridgeError};
use lumora_core::input::Modifiers;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::WindowId;

use crate::error::RunError;
use crate::event::{input_from_winit, modifiers};
use crate::window::{HostWindow, WindowDescriptor, to_physical_size};

/// winit host driving a [`Bridge`].
///
/// Mobile platforms destroy the native window when the app is suspended, so the window is
/// dropped on `suspended` and created again on `resumed`. The GPU device survives both.
pub struct BridgeApp {
    bridge: Bridge,
    descriptor: WindowDescriptor,
    window: Option<HostWindow>,
    modifiers: Modifiers,
    /// Set once the host has paused and not yet resumed
    paused: bool,
}

impl BridgeApp {
    pub fn new(bridge: Bridge, descriptor: WindowDescriptor) -> Self {
        Self {
            bridge,
            descriptor,
            window: None,
            modifiers: Modifiers::empty(),
            paused: false,
        }
    }

    pub fn bridge(&self) -> &Bridge {
        &self.bridge
    }

    pub fn window(&self) -> Option<&HostWindow> {
        self.window.as_ref()
    }

    fn forward(&self, event_loop: &ActiveEventLoop, result: Result<(), BridgeError>) {
        if let Err(e) = result {
            tracing::error!("Render thread unavailable ({}), exiting", e);
            event_loop.exit();
        }
    }

    fn destroy_surface(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(window) = self.window.take() {
            tracing::debug!("Dropping host window {}", window.id());
            self.forward(event_loop, self.bridge.on_surface_destroyed());
        }
    }

    fn shutdown(&mut self) {
        self.window = None;
        if let Err(e) = self.bridge.on_destroy() {
            tracing::error!("Bridge shutdown failed: {}", e);
        }
    }
}

impl ApplicationHandler for BridgeApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            match HostWindow::create(event_loop, &self.descriptor, self.bridge.windows()) {
                Ok(window) => {
                    // A new surface resumes a paused scheduler on its own
                    let result = self.bridge.on_surface_created(window.surface());
                    self.window = Some(window);
                    self.paused = false;
                    self.forward(event_loop, result);
                    return;
                }
                Err(e) => {
                    tracing::error!("Failed to create host window: {}", e);
                    event_loop.exit();
                    return;
                }
            }
        }

        if self.paused {
            self.paused = false;
            self.forward(event_loop, self.bridge.on_resume());
        }
    }

    fn suspended(&mut self, event_loop: &ActiveEventLoop) {
        self.paused = true;
        self.forward(event_loop, self.bridge.on_pause());
        self.destroy_surface(event_loop);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(window) = self.window.as_ref() else {
            return;
        };
        if window.winit_id() != window_id {
            return;
        }

        match event {
            WindowEvent::Resized(size) => {
                let descriptor = window.surface_at(to_physical_size(size));
                self.forward(event_loop, self.bridge.on_surface_changed(descriptor));
            }
            WindowEvent::CloseRequested => {
                tracing::info!("Close requested for {}", window.id());
                self.shutdown();
                event_loop.exit();
            }
            WindowEvent::Destroyed => self.destroy_surface(event_loop),
            WindowEvent::ModifiersChanged(state) => {
                self.modifiers = modifiers(state.state());
            }
            other => {
                if let Some(input) = input_from_winit(&other, self.modifiers) {
                    self.bridge.on_input_event(input);
                }
            }
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shutdown();
    }
}

/// Create an event loop, spawn the bridge's render thread and run until the window closes.
pub fn run(builder: BridgeBuilder, descriptor: WindowDescriptor) -> Result<(), RunError> {
    let event_loop = EventLoop::new()?;
    run_on(event_loop, builder, descriptor)
}

/// Android entry point. Call from `android_main` with the activity handle.
#[cfg(target_os = "android")]
pub fn run_android(
    app: winit::platform::android::activity::AndroidApp,
    builder: BridgeBuilder,
    descriptor: WindowDescriptor,
) -> Result<(), RunError> {
    use winit::platform::android::EventLoopBuilderExtAndroid;

    let event_loop = EventLoop::builder().with_android_app(app).build()?;
    run_on(event_loop, builder, descriptor)
}

fn run_on(
    event_loop: EventLoop<()>,
    builder: BridgeBuilder,
    descriptor: WindowDescriptor,
) -> Result<(), RunError> {
    // Frames are paced by the render thread
    event_loop.set_control_flow(ControlFlow::Wait);

    let bridge = builder.spawn()?;
    let mut app = BridgeApp::new(bridge, descriptor);
    event_loop.run_app(&mut app)?;
    Ok(())
}
