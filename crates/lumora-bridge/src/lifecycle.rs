use std::sync::mpsc;

use lumora_render::SurfaceDescriptor;

/// Host lifecycle transitions, delivered to the render thread in order.
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleEvent {
    SurfaceCreated(SurfaceDescriptor),
    SurfaceChanged(SurfaceDescriptor),
    SurfaceDestroyed,
    Paused,
    Resumed,
    Destroy,
}

impl LifecycleEvent {
    pub fn name(&self) -> &'static str {
        match self {
            LifecycleEvent::SurfaceCreated(_) => "surface_created",
            LifecycleEvent::SurfaceChanged(_) => "surface_changed",
            LifecycleEvent::SurfaceDestroyed => "surface_destroyed",
            LifecycleEvent::Paused => "paused",
            LifecycleEvent::Resumed => "resumed",
            LifecycleEvent::Destroy => "destroy",
        }
    }
}

pub(crate) type LifecycleSender = mpsc::Sender<LifecycleEvent>;
pub(crate) type LifecycleReceiver = mpsc::Receiver<LifecycleEvent>;

/// Unbounded, so lifecycle events are never dropped and the host never blocks.
pub(crate) fn channel() -> (LifecycleSender, LifecycleReceiver) {
    mpsc::channel()
}
