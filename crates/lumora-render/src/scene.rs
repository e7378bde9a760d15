use std::ops::Range;

use lumora_core::input::{InputEvent, InputState, PointerButton, TouchPhase};
use lumora_core::PhysicalSize;

use crate::frame::FrameState;
use crate::pipeline::PipelineKind;

/// One draw recorded by a scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawCommand {
    pub pipeline: PipelineKind,
    pub vertices: Range<u32>,
    pub instances: Range<u32>,
}

/// The single render pass a scene records each frame.
#[derive(Debug, Default)]
pub struct DrawList {
    clear: Option<wgpu::Color>,
    commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear the target before drawing. Without a clear the previous contents are loaded.
    pub fn clear(&mut self, color: wgpu::Color) -> &mut Self {
        self.clear = Some(color);
        self
    }

    pub fn draw(&mut self, pipeline: PipelineKind) -> &mut Self {
        self.draw_instanced(pipeline, 0..1)
    }

    pub fn draw_instanced(&mut self, pipeline: PipelineKind, instances: Range<u32>) -> &mut Self {
        self.commands.push(DrawCommand {
            pipeline,
            vertices: 0..pipeline.vertex_count(),
            instances,
        });
        self
    }

    pub fn clear_color(&self) -> Option<wgpu::Color> {
        self.clear
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.clear.is_none() && self.commands.is_empty()
    }

    pub fn reset(&mut self) {
        self.clear = None;
        self.commands.clear();
    }
}

/// Application content driven by the render thread.
///
/// Hooks run on the render thread in lifecycle order. `record` is called once per frame
/// with a fresh [`DrawList`]; it must not assume the surface size is unchanged between frames.
pub trait Scene: Send {
    fn on_input(&mut self, _event: &InputEvent) {}

    /// The surface was (re)bound at a new size.
    fn on_resized(&mut self, _size: PhysicalSize<u32>) {}

    fn on_paused(&mut self) {}

    fn on_resumed(&mut self) {}

    /// Called once per tick before `record`.
    fn update(&mut self, _frame: &FrameState, _input: &InputState) {}

    fn record(&mut self, frame: &FrameState, draws: &mut DrawList);
}

/// Clears to a colour and optionally draws a triangle on top.
///
/// A primary press or touch toggles the triangle.
#[derive(Debug, Clone)]
pub struct ClearScene {
    color: wgpu::Color,
    show_triangle: bool,
    size: PhysicalSize<u32>,
    paused: bool,
}

impl ClearScene {
    pub fn new(color: wgpu::Color) -> Self {
        Self {
            color,
            show_triangle: false,
            size: PhysicalSize::default(),
            paused: false,
        }
    }

    pub fn with_triangle(mut self, show: bool) -> Self {
        self.show_triangle = show;
        self
    }

    pub fn color(&self) -> wgpu::Color {
        self.color
    }

    pub fn shows_triangle(&self) -> bool {
        self.show_triangle
    }

    /// Last size reported through `on_resized`.
    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }
}

impl Default for ClearScene {
    fn default() -> Self {
        Self::new(wgpu::Color {
            r: 0.1,
            g: 0.2,
            b: 0.3,
            a: 1.0,
        })
    }
}

impl Scene for ClearScene {
    fn on_input(&mut self, event: &InputEvent) {
        match event {
            InputEvent::PointerButton {
                button: PointerButton::Primary,
                pressed: true,
            }
            | InputEvent::Touch {
                phase: TouchPhase::Started,
                ..
            } => self.show_triangle = !self.show_triangle,
            _ => {}
        }
    }

    fn on_resized(&mut self, size: PhysicalSize<u32>) {
        self.size = size;
    }

    fn on_paused(&mut self) {
        self.paused = true;
    }

    fn on_resumed(&mut self) {
        self.paused = false;
    }

    fn record(&mut self, _frame: &FrameState, draws: &mut DrawList) {
        draws.clear(self.color);
        if self.show_triangle {
            draws.draw(PipelineKind::Triangle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_scene_records_clear() {
        let mut scene = ClearScene::default();
        let mut draws = DrawList::new();
        scene.record(&FrameState::new(), &mut draws);
        assert!(draws.clear_color().is_some());
        assert!(draws.commands().is_empty());
    }

    #[test]
    fn test_press_toggles_triangle() {
        let mut scene = ClearScene::default();
        scene.on_input(&InputEvent::PointerButton {
            button: PointerButton::Primary,
            pressed: true,
        });

        let mut draws = DrawList::new();
        scene.record(&FrameState::new(), &mut draws);
        assert_eq!(
            draws.commands(),
            &[DrawCommand {
                pipeline: PipelineKind::Triangle,
                vertices: 0..3,
                instances: 0..1,
            }]
        );

        // Releases are ignored
        scene.on_input(&InputEvent::PointerButton {
            button: PointerButton::Primary,
            pressed: false,
        });
        assert!(scene.shows_triangle());
    }

    #[test]
    fn test_draw_list_reset() {
        let mut draws = DrawList::new();
        draws.clear(wgpu::Color::RED).draw(PipelineKind::Fullscreen);
        assert!(!draws.is_empty());
        draws.reset();
        assert!(draws.is_empty());
    }
}
