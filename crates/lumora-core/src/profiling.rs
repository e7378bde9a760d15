//! Profiling utilities based on the `puffin` crate.

#[cfg(feature = "profiling-server")]
use std::sync::OnceLock;

pub use puffin::{GlobalProfiler, profile_function, profile_scope};

use crate::config::ProfilingMode;

/// Address the puffin HTTP server binds to.
pub const PUFFIN_ADDRESS: &str = "0.0.0.0:8585";

#[cfg(feature = "profiling-server")]
static PROFILING_SERVER: OnceLock<puffin_http::Server> = OnceLock::new();

/// Enables profiling scopes according to `mode`.
///
/// `ProfilingMode::WithServer` additionally starts a puffin HTTP server when the
/// `profiling-server` feature is enabled; without the feature it behaves like `On`.
pub fn init_profiling(mode: ProfilingMode) {
    match mode {
        ProfilingMode::Off => puffin::set_scopes_on(false),
        ProfilingMode::On => puffin::set_scopes_on(true),
        ProfilingMode::WithServer => {
            puffin::set_scopes_on(true);
            start_server();
        }
    }
}

#[cfg(feature = "profiling-server")]
fn start_server() {
    if PROFILING_SERVER.get().is_some() {
        return;
    }

    match puffin_http::Server::new(PUFFIN_ADDRESS) {
        Ok(server) => {
            tracing::info!("Puffin profiler server started on http://{}", PUFFIN_ADDRESS);
            let _ = PROFILING_SERVER.set(server);
        }
        Err(e) => {
            tracing::error!("Failed to start puffin server: {}", e);
        }
    }
}

#[cfg(not(feature = "profiling-server"))]
fn start_server() {
    tracing::warn!("profiling server requested but the `profiling-server` feature is disabled");
}

/// Marks a frame boundary. The render thread calls this once per tick.
#[inline]
pub fn new_frame() {
    puffin::GlobalProfiler::lock().new_frame();
}
