use std::collections::{HashMap, HashSet};

use glam::Vec2;

bitflags::bitflags! {
    /// Modifier keys held while an input event was produced.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const CONTROL = 0b0010;
        const ALT = 0b0100;
        const SUPER = 0b1000;
    }
}

/// Host input delivered to the render thread.
///
/// Positions are in physical pixels relative to the surface origin.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Touch {
        id: u64,
        phase: TouchPhase,
        position: Vec2,
    },
    PointerMoved {
        position: Vec2,
    },
    PointerButton {
        button: PointerButton,
        pressed: bool,
    },
    PointerLeft,
    Scroll {
        delta: Vec2,
    },
    Key {
        key: Key,
        pressed: bool,
        repeat: bool,
        modifiers: Modifiers,
    },
    Text(String),
    Focus(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TouchPhase {
    Started,
    Moved,
    Ended,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
    Other(u16),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Character(String),
    Named(NamedKey),
    Unidentified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedKey {
    Escape,
    Enter,
    Space,
    Tab,
    Backspace,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    /// The system back button on mobile hosts.
    Back,
}

/// Pixels scrolled per line for hosts that report line deltas.
pub const LINE_SCROLL_DELTA: f32 = 10.0;

/// Accumulated input state, fed one event at a time on the render thread.
#[derive(Debug, Default)]
pub struct InputState {
    keys_pressed: HashSet<Key>,
    touches: HashMap<u64, Vec2>,
    pointer_pos: Vec2,
    pointer_delta: Vec2,
    scroll_delta: Vec2,
    buttons: HashSet<PointerButton>,
    focused: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self {
            focused: true,
            ..Default::default()
        }
    }

    /// Clears per-frame deltas. Call once per tick before feeding events.
    pub fn new_frame(&mut self) {
        self.pointer_delta = Vec2::ZERO;
        self.scroll_delta = Vec2::ZERO;
    }

    pub fn on_event(&mut self, event: &InputEvent) {
        match event {
            InputEvent::Key {
                key,
                pressed,
                repeat: false,
                ..
            } => {
                if *pressed {
                    self.keys_pressed.insert(key.clone());
                } else {
                    self.keys_pressed.remove(key);
                }
            }
            InputEvent::PointerMoved { position } => {
                self.pointer_delta += *position - self.pointer_pos;
                self.pointer_pos = *position;
            }
            InputEvent::PointerButton { button, pressed } => {
                if *pressed {
                    self.buttons.insert(*button);
                } else {
                    self.buttons.remove(button);
                }
            }
            InputEvent::Scroll { delta } => self.scroll_delta += *delta,
            InputEvent::Touch {
                id,
                phase,
                position,
            } => match phase {
                TouchPhase::Started | TouchPhase::Moved => {
                    self.touches.insert(*id, *position);
                }
                TouchPhase::Ended | TouchPhase::Cancelled => {
                    self.touches.remove(id);
                }
            },
            InputEvent::Focus(focused) => {
                self.focused = *focused;
                if !focused {
                    // Releases are not delivered while unfocused
                    self.keys_pressed.clear();
                    self.buttons.clear();
                }
            }
            _ => {}
        }
    }

    pub fn is_key_pressed(&self, key: &Key) -> bool {
        self.keys_pressed.contains(key)
    }

    pub fn is_button_pressed(&self, button: PointerButton) -> bool {
        self.buttons.contains(&button)
    }

    pub fn pointer_pos(&self) -> Vec2 {
        self.pointer_pos
    }

    pub fn pointer_delta(&self) -> Vec2 {
        self.pointer_delta
    }

    pub fn scroll_delta(&self) -> Vec2 {
        self.scroll_delta
    }

    pub fn touch(&self, id: u64) -> Option<Vec2> {
        self.touches.get(&id).copied()
    }

    pub fn touch_count(&self) -> usize {
        self.touches.len()
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(pressed: bool, repeat: bool) -> InputEvent {
        InputEvent::Key {
            key: Key::Named(NamedKey::Space),
            pressed,
            repeat,
            modifiers: Modifiers::empty(),
        }
    }

    #[test]
    fn test_key_press_and_release() {
        let mut state = InputState::new();
        state.on_event(&key(true, false));
        assert!(state.is_key_pressed(&Key::Named(NamedKey::Space)));

        // Repeats never change held state
        state.on_event(&key(false, true));
        assert!(state.is_key_pressed(&Key::Named(NamedKey::Space)));

        state.on_event(&key(false, false));
        assert!(!state.is_key_pressed(&Key::Named(NamedKey::Space)));
    }

    #[test]
    fn test_pointer_delta_resets_per_frame() {
        let mut state = InputState::new();
        state.on_event(&InputEvent::PointerMoved {
            position: Vec2::new(10.0, 5.0),
        });
        state.on_event(&InputEvent::PointerMoved {
            position: Vec2::new(15.0, 5.0),
        });
        assert_eq!(state.pointer_pos(), Vec2::new(15.0, 5.0));
        assert_eq!(state.pointer_delta(), Vec2::new(15.0, 5.0));

        state.new_frame();
        assert_eq!(state.pointer_delta(), Vec2::ZERO);
        assert_eq!(state.pointer_pos(), Vec2::new(15.0, 5.0));
    }

    #[test]
    fn test_touch_tracking() {
        let mut state = InputState::new();
        state.on_event(&InputEvent::Touch {
            id: 7,
            phase: TouchPhase::Started,
            position: Vec2::new(1.0, 2.0),
        });
        state.on_event(&InputEvent::Touch {
            id: 7,
            phase: TouchPhase::Moved,
            position: Vec2::new(3.0, 4.0),
        });
        assert_eq!(state.touch(7), Some(Vec2::new(3.0, 4.0)));

        state.on_event(&InputEvent::Touch {
            id: 7,
            phase: TouchPhase::Cancelled,
            position: Vec2::new(3.0, 4.0),
        });
        assert_eq!(state.touch_count(), 0);
    }

    #[test]
    fn test_focus_loss_clears_held_state() {
        let mut state = InputState::new();
        state.on_event(&key(true, false));
        state.on_event(&InputEvent::PointerButton {
            button: PointerButton::Primary,
            pressed: true,
        });

        state.on_event(&InputEvent::Focus(false));
        assert!(!state.is_focused());
        assert!(!state.is_key_pressed(&Key::Named(NamedKey::Space)));
        assert!(!state.is_button_pressed(PointerButton::Primary));
    }
}
