//! Conversion from winit window events to bridge input events.

use glam::Vec2;
use lumora_core::InputEvent;
use lumora_core::input::{
    Key, LINE_SCROLL_DELTA, Modifiers, NamedKey, PointerButton, TouchPhase,
};
use winit::event::{ElementState, Ime, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{self, ModifiersState};

/// Convert an input-carrying window event. Lifecycle events and anything the bridge does not
/// model return `None`.
pub fn input_from_winit(event: &WindowEvent, modifiers: Modifiers) -> Option<InputEvent> {
    match event {
        WindowEvent::CursorMoved { position, .. } => Some(InputEvent::PointerMoved {
            position: Vec2::new(position.x as f32, position.y as f32),
        }),
        WindowEvent::CursorLeft { .. } => Some(InputEvent::PointerLeft),
        WindowEvent::MouseInput { state, button, .. } => Some(InputEvent::PointerButton {
            button: pointer_button(*button),
            pressed: *state == ElementState::Pressed,
        }),
        WindowEvent::MouseWheel { delta, .. } => Some(InputEvent::Scroll {
            delta: scroll_delta(*delta),
        }),
        WindowEvent::Touch(touch) => Some(InputEvent::Touch {
            id: touch.id,
            phase: touch_phase(touch.phase),
            position: Vec2::new(touch.location.x as f32, touch.location.y as f32),
        }),
        WindowEvent::KeyboardInput { event, .. } => Some(InputEvent::Key {
            key: key(&event.logical_key),
            pressed: event.state == ElementState::Pressed,
            repeat: event.repeat,
            modifiers,
        }),
        WindowEvent::Ime(Ime::Commit(text)) => Some(InputEvent::Text(text.clone())),
        WindowEvent::Focused(focused) => Some(InputEvent::Focus(*focused)),
        _ => None,
    }
}

pub fn modifiers(state: ModifiersState) -> Modifiers {
    let mut modifiers = Modifiers::empty();
    modifiers.set(Modifiers::SHIFT, state.shift_key());
    modifiers.set(Modifiers::CONTROL, state.control_key());
    modifiers.set(Modifiers::ALT, state.alt_key());
    modifiers.set(Modifiers::SUPER, state.super_key());
    modifiers
}

pub fn pointer_button(button: MouseButton) -> PointerButton {
    match button {
        MouseButton::Left => PointerButton::Primary,
        MouseButton::Right => PointerButton::Secondary,
        MouseButton::Middle => PointerButton::Middle,
        MouseButton::Back => PointerButton::Other(3),
        MouseButton::Forward => PointerButton::Other(4),
        MouseButton::Other(code) => PointerButton::Other(code),
    }
}

/// Line deltas are scaled to pixels.
pub fn scroll_delta(delta: MouseScrollDelta) -> Vec2 {
    match delta {
        MouseScrollDelta::LineDelta(x, y) => Vec2::new(x, y) * LINE_SCROLL_DELTA,
        MouseScrollDelta::PixelDelta(position) => Vec2::new(position.x as f32, position.y as f32),
    }
}

pub fn touch_phase(phase: winit::event::TouchPhase) -> TouchPhase {
    match phase {
        winit::event::TouchPhase::Started => TouchPhase::Started,
        winit::event::TouchPhase::Moved => TouchPhase::Moved,
        winit::event::TouchPhase::Ended => TouchPhase::Ended,
        winit::event::TouchPhase::Cancelled => TouchPhase::Cancelled,
    }
}

pub fn key(key: &keyboard::Key) -> Key {
    use keyboard::NamedKey as Winit;

    match key {
        keyboard::Key::Character(text) => Key::Character(text.to_string()),
        keyboard::Key::Named(named) => match named {
            Winit::Escape => Key::Named(NamedKey::Escape),
            Winit::Enter => Key::Named(NamedKey::Enter),
            Winit::Space => Key::Named(NamedKey::Space),
            Winit::Tab => Key::Named(NamedKey::Tab),
            Winit::Backspace => Key::Named(NamedKey::Backspace),
            Winit::ArrowUp => Key::Named(NamedKey::ArrowUp),
            Winit::ArrowDown => Key::Named(NamedKey::ArrowDown),
            Winit::ArrowLeft => Key::Named(NamedKey::ArrowLeft),
            Winit::ArrowRight => Key::Named(NamedKey::ArrowRight),
            // Android reports its system back button as a browser key
            Winit::BrowserBack | Winit::GoBack => Key::Named(NamedKey::Back),
            _ => Key::Unidentified,
        },
        _ => Key::Unidentified,
    }
}
