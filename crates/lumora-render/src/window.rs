use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use ahash::AHashMap;
use lumora_test_utils::{HostWindowId, SurfaceSource};
use parking_lot::RwLock;

/// Runs on the render thread right before a frame for its window is presented.
pub type PrePresentHook = Arc<dyn Fn() + Send + Sync>;

struct HostWindow {
    target: Option<Arc<dyn wgpu::WindowHandle>>,
    pre_present: Option<PrePresentHook>,
}

/// Non-owning directory of host windows.
///
/// The host registers a window when it hands it to the bridge and retires it the moment the
/// window is destroyed, before the render thread hears about it. The render thread checks
/// liveness here before every swapchain operation.
///
/// Cloning shares the same registry.
#[derive(Clone, Default)]
pub struct WindowRegistry {
    windows: Arc<RwLock<AHashMap<HostWindowId, HostWindow>>>,
    next_id: Arc<AtomicU64>,
}

impl WindowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&self) -> HostWindowId {
        HostWindowId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Register a window that surfaces can be created for.
    pub fn register(&self, target: Arc<dyn wgpu::WindowHandle>) -> HostWindowId {
        let id = self.allocate();
        self.windows.write().insert(
            id,
            HostWindow {
                target: Some(target),
                pre_present: None,
            },
        );
        tracing::debug!("Registered host {}", id);
        id
    }

    /// Register a window without native handles (mock drivers, offscreen hosts).
    pub fn register_headless(&self) -> HostWindowId {
        let id = self.allocate();
        self.windows.write().insert(
            id,
            HostWindow {
                target: None,
                pre_present: None,
            },
        );
        id
    }

    /// Install a hook the render thread calls before every present to this window, such as
    /// winit's `pre_present_notify`. Returns `false` if the window is not registered.
    pub fn set_pre_present(&self, id: HostWindowId, hook: PrePresentHook) -> bool {
        match self.windows.write().get_mut(&id) {
            Some(window) => {
                window.pre_present = Some(hook);
                true
            }
            None => false,
        }
    }

    /// Run the window's pre-present hook, if it is alive and has one.
    pub fn notify_pre_present(&self, id: HostWindowId) {
        let hook = self
            .windows
            .read()
            .get(&id)
            .and_then(|window| window.pre_present.clone());
        if let Some(hook) = hook {
            hook();
        }
    }

    /// Mark the window as gone. Returns `false` if it was not registered.
    pub fn retire(&self, id: HostWindowId) -> bool {
        let removed = self.windows.write().remove(&id).is_some();
        if removed {
            tracing::debug!("Retired host {}", id);
        }
        removed
    }

    pub fn is_alive(&self, id: HostWindowId) -> bool {
        self.windows.read().contains_key(&id)
    }

    /// Surface source for a live window.
    pub fn source(&self, id: HostWindowId) -> Option<SurfaceSource> {
        self.windows.read().get(&id).map(|window| SurfaceSource {
            window: id,
            target: window.target.clone(),
        })
    }

    pub fn len(&self) -> usize {
        self.windows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.read().is_empty()
    }
}

impl std::fmt::Debug for WindowRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowRegistry")
            .field("live", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_retire() {
        let registry = WindowRegistry::new();
        let a = registry.register_headless();
        let b = registry.register_headless();
        assert_ne!(a, b);
        assert!(registry.is_alive(a));

        assert!(registry.retire(a));
        assert!(!registry.is_alive(a));
        assert!(registry.source(a).is_none());
        assert!(!registry.retire(a));

        let source = registry.source(b).unwrap();
        assert_eq!(source.window, b);
        assert!(source.target.is_none());
    }

    #[test]
    fn test_pre_present_hook_dropped_with_window() {
        use std::sync::atomic::AtomicUsize;

        let registry = WindowRegistry::new();
        let id = registry.register_headless();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        assert!(registry.set_pre_present(
            id,
            Arc::new(move || {
                counter.fetch_add(1, Ordering::Relaxed);
            })
        ));

        registry.notify_pre_present(id);
        assert_eq!(calls.load(Ordering::Relaxed), 1);

        registry.retire(id);
        registry.notify_pre_present(id);
        assert_eq!(calls.load(Ordering::Relaxed), 1);
        assert!(!registry.set_pre_present(id, Arc::new(|| {})));
    }

    #[test]
    fn test_clones_share_state() {
        let registry = WindowRegistry::new();
        let host_side = registry.clone();
        let id = host_side.register_headless();
        assert!(registry.is_alive(id));
        host_side.retire(id);
        assert!(registry.is_empty());
    }
}
