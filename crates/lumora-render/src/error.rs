use lumora_test_utils::DriverError;

/// Error category reported across the bridge boundary.
///
/// Fieldless so hosts can match on it without depending on driver details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    DeviceUnavailable,
    DeviceLost,
    SurfaceCreationFailed,
    SurfaceInvalid,
    OutOfMemory,
    /// Only produced by [`RenderError::kind`]. A timed-out acquire skips the frame without
    /// reaching the host.
    Timeout,
    InputQueueOverflow,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::DeviceUnavailable => "device unavailable",
            ErrorKind::DeviceLost => "device lost",
            ErrorKind::SurfaceCreationFailed => "surface creation failed",
            ErrorKind::SurfaceInvalid => "surface invalid",
            ErrorKind::OutOfMemory => "out of memory",
            ErrorKind::Timeout => "timeout",
            ErrorKind::InputQueueOverflow => "input queue overflow",
        };
        f.write_str(name)
    }
}

/// Errors produced by the device, surface and render core layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// No compatible adapter, or device creation failed outright
    DeviceUnavailable(String),
    DeviceLost,
    SurfaceCreationFailed(String),
    /// The binding was invalidated or its host window is gone
    SurfaceInvalid,
    /// The swapchain no longer matches its window and must be rebound
    SurfaceOutdated,
    OutOfMemory,
    Timeout,
}

impl RenderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RenderError::DeviceUnavailable(_) => ErrorKind::DeviceUnavailable,
            RenderError::DeviceLost => ErrorKind::DeviceLost,
            RenderError::SurfaceCreationFailed(_) => ErrorKind::SurfaceCreationFailed,
            RenderError::SurfaceInvalid | RenderError::SurfaceOutdated => {
                ErrorKind::SurfaceInvalid
            }
            RenderError::OutOfMemory => ErrorKind::OutOfMemory,
            RenderError::Timeout => ErrorKind::Timeout,
        }
    }

    /// Errors that end the session without any recovery path.
    ///
    /// `DeviceLost` is not listed: it becomes fatal only once recovery is exhausted.
    pub fn is_session_fatal(&self) -> bool {
        matches!(self, RenderError::DeviceUnavailable(_))
    }

    /// Errors that skip the current frame and leave the session untouched.
    pub fn is_frame_local(&self) -> bool {
        matches!(self, RenderError::OutOfMemory | RenderError::Timeout)
    }
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::DeviceUnavailable(msg) => write!(f, "GPU device unavailable: {}", msg),
            RenderError::DeviceLost => write!(f, "GPU device lost"),
            RenderError::SurfaceCreationFailed(msg) => {
                write!(f, "Failed to create surface: {}", msg)
            }
            RenderError::SurfaceInvalid => write!(f, "Surface binding is invalid"),
            RenderError::SurfaceOutdated => write!(f, "Surface is outdated"),
            RenderError::OutOfMemory => write!(f, "GPU out of memory"),
            RenderError::Timeout => write!(f, "Timed out waiting for the next surface image"),
        }
    }
}

impl std::error::Error for RenderError {}

impl From<DriverError> for RenderError {
    fn from(error: DriverError) -> Self {
        match error {
            DriverError::NoAdapter => {
                RenderError::DeviceUnavailable("no compatible GPU adapter".to_string())
            }
            DriverError::DeviceLost => RenderError::DeviceLost,
            DriverError::OutOfMemory => RenderError::OutOfMemory,
            DriverError::SurfaceLost | DriverError::SurfaceOutdated => RenderError::SurfaceOutdated,
            DriverError::Timeout => RenderError::Timeout,
            DriverError::WindowUnavailable => RenderError::SurfaceInvalid,
            DriverError::Unsupported(msg) => RenderError::SurfaceCreationFailed(msg),
            DriverError::ForeignHandle | DriverError::Other(_) => {
                RenderError::DeviceUnavailable(error.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_error_mapping() {
        assert_eq!(
            RenderError::from(DriverError::SurfaceLost),
            RenderError::SurfaceOutdated
        );
        assert_eq!(
            RenderError::from(DriverError::DeviceLost),
            RenderError::DeviceLost
        );
        assert_eq!(
            RenderError::from(DriverError::NoAdapter).kind(),
            ErrorKind::DeviceUnavailable
        );
    }

    #[test]
    fn test_fatality() {
        assert!(RenderError::DeviceUnavailable(String::new()).is_session_fatal());
        assert!(!RenderError::DeviceLost.is_session_fatal());
        assert!(!RenderError::SurfaceInvalid.is_session_fatal());
        assert!(RenderError::OutOfMemory.is_frame_local());
        assert!(RenderError::Timeout.is_frame_local());
        assert_eq!(RenderError::Timeout.kind(), ErrorKind::Timeout);
        assert_eq!(RenderError::SurfaceOutdated.kind(), ErrorKind::SurfaceInvalid);
    }
}
