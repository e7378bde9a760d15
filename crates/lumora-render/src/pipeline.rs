use lumora_test_utils::PipelineDesc;

const TRIANGLE_SHADER: &str = include_str!("shaders/triangle.wgsl");
const FULLSCREEN_SHADER: &str = include_str!("shaders/fullscreen.wgsl");

/// Built-in pipelines a scene can draw with.
///
/// Both generate their vertices from `vertex_index`, so no vertex buffers are bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineKind {
    /// A single vertex-coloured triangle, 3 vertices
    Triangle,
    /// A gradient covering the viewport, 3 vertices
    Fullscreen,
}

impl PipelineKind {
    pub const ALL: [PipelineKind; 2] = [PipelineKind::Triangle, PipelineKind::Fullscreen];

    pub fn label(&self) -> &'static str {
        match self {
            PipelineKind::Triangle => "lumora-triangle",
            PipelineKind::Fullscreen => "lumora-fullscreen",
        }
    }

    pub fn shader_source(&self) -> &'static str {
        match self {
            PipelineKind::Triangle => TRIANGLE_SHADER,
            PipelineKind::Fullscreen => FULLSCREEN_SHADER,
        }
    }

    /// Vertex count of one instance.
    pub fn vertex_count(&self) -> u32 {
        3
    }

    pub fn desc(&self, target_format: wgpu::TextureFormat) -> PipelineDesc<'static> {
        PipelineDesc {
            label: self.label(),
            shader_source: self.shader_source(),
            vertex_entry: "vs_main",
            fragment_entry: "fs_main",
            target_format,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shaders_are_embedded() {
        for kind in PipelineKind::ALL {
            let source = kind.shader_source();
            assert!(source.contains("fn vs_main"));
            assert!(source.contains("fn fs_main"));
        }
    }

    #[test]
    fn test_desc_carries_format() {
        let desc = PipelineKind::Triangle.desc(wgpu::TextureFormat::Rgba8Unorm);
        assert_eq!(desc.target_format, wgpu::TextureFormat::Rgba8Unorm);
        assert_eq!(desc.label, "lumora-triangle");
    }
}
