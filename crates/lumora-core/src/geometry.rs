/// A size in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PhysicalSize<T> {
    pub width: T,
    pub height: T,
}

impl<T> PhysicalSize<T> {
    pub const fn new(width: T, height: T) -> Self {
        PhysicalSize { width, height }
    }

    pub fn cast<U: From<T>>(self) -> PhysicalSize<U> {
        PhysicalSize {
            width: U::from(self.width),
            height: U::from(self.height),
        }
    }
}

impl PhysicalSize<u32> {
    /// True when either dimension is zero. Swapchains cannot be configured at this size.
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            return 0.0;
        }
        self.width as f32 / self.height as f32
    }
}

impl From<(u32, u32)> for PhysicalSize<u32> {
    fn from((width, height): (u32, u32)) -> Self {
        Self::new(width, height)
    }
}

impl std::fmt::Display for PhysicalSize<u32> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_sizes() {
        assert!(PhysicalSize::new(0, 600).is_empty());
        assert!(PhysicalSize::new(800, 0).is_empty());
        assert!(!PhysicalSize::new(800, 600).is_empty());
    }

    #[test]
    fn test_display_and_aspect() {
        let size = PhysicalSize::new(1200u32, 800u32);
        assert_eq!(size.to_string(), "1200x800");
        assert!((size.aspect_ratio() - 1.5).abs() < f32::EPSILON);
        assert_eq!(PhysicalSize::new(10u32, 0).aspect_ratio(), 0.0);
    }
}
