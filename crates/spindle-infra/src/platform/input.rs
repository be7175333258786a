// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Translation from `winit` window events to the harness's input events.
//!
//! Frame drivers consume [`InputEvent`], never raw `winit` types, so the
//! windowing backend stays swappable.

use winit::event::{ElementState, MouseButton as WinitMouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// A user input action, decoupled from the windowing backend.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// A keyboard key was pressed.
    KeyPressed {
        /// String form of the physical key code (e.g. `"KeyW"`, `"F11"`).
        key_code: String,
        /// Whether an Alt modifier was held, for chords like Alt+Enter.
        alt: bool,
    },
    /// A keyboard key was released.
    KeyReleased {
        /// String form of the physical key code.
        key_code: String,
    },
    /// A mouse button was pressed.
    MouseButtonPressed {
        /// Which button.
        button: MouseButton,
    },
    /// A mouse button was released.
    MouseButtonReleased {
        /// Which button.
        button: MouseButton,
    },
    /// The cursor moved, in window coordinates.
    MouseMoved {
        /// New x position.
        x: f32,
        /// New y position.
        y: f32,
    },
    /// The mouse wheel was scrolled.
    MouseWheelScrolled {
        /// Horizontal delta, in lines.
        delta_x: f32,
        /// Vertical delta, in lines.
        delta_y: f32,
    },
}

/// A mouse button, decoupled from the windowing backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Left button.
    Left,
    /// Right button.
    Right,
    /// Middle button.
    Middle,
    /// Side back button.
    Back,
    /// Side forward button.
    Forward,
    /// Any other button, by numeric code.
    Other(u16),
}

/// Translates a `winit` window event into an [`InputEvent`].
///
/// `alt_held` is the runtime's current modifier state; winit reports it
/// through separate `ModifiersChanged` events rather than on the key event.
/// Non-input events (resize, focus, close) return `None`.
pub fn translate_winit_input(event: &WindowEvent, alt_held: bool) -> Option<InputEvent> {
    match event {
        WindowEvent::KeyboardInput {
            event: key_event, ..
        } => {
            if let PhysicalKey::Code(keycode) = key_event.physical_key {
                let key_code = keycode_name(keycode);
                match key_event.state {
                    ElementState::Pressed if !key_event.repeat => Some(InputEvent::KeyPressed {
                        key_code,
                        alt: alt_held,
                    }),
                    ElementState::Released => Some(InputEvent::KeyReleased { key_code }),
                    _ => None,
                }
            } else {
                None
            }
        }
        WindowEvent::CursorMoved { position, .. } => Some(InputEvent::MouseMoved {
            x: position.x as f32,
            y: position.y as f32,
        }),
        WindowEvent::MouseInput { state, button, .. } => {
            let button = map_mouse_button(*button);
            match state {
                ElementState::Pressed => Some(InputEvent::MouseButtonPressed { button }),
                ElementState::Released => Some(InputEvent::MouseButtonReleased { button }),
            }
        }
        WindowEvent::MouseWheel { delta, .. } => {
            let (delta_x, delta_y): (f32, f32) = match delta {
                MouseScrollDelta::LineDelta(x, y) => (*x, *y),
                MouseScrollDelta::PixelDelta(pos) => (pos.x as f32, pos.y as f32),
            };
            if delta_x != 0.0 || delta_y != 0.0 {
                Some(InputEvent::MouseWheelScrolled { delta_x, delta_y })
            } else {
                None
            }
        }
        _ => None,
    }
}

fn keycode_name(keycode: KeyCode) -> String {
    format!("{keycode:?}")
}

fn map_mouse_button(button: WinitMouseButton) -> MouseButton {
    match button {
        WinitMouseButton::Left => MouseButton::Left,
        WinitMouseButton::Right => MouseButton::Right,
        WinitMouseButton::Middle => MouseButton::Middle,
        WinitMouseButton::Back => MouseButton::Back,
        WinitMouseButton::Forward => MouseButton::Forward,
        WinitMouseButton::Other(id) => MouseButton::Other(id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::{dpi::PhysicalPosition, event::WindowEvent, keyboard::KeyCode};

    #[test]
    fn keycode_names_are_stable() {
        assert_eq!(keycode_name(KeyCode::KeyW), "KeyW");
        assert_eq!(keycode_name(KeyCode::F11), "F11");
        assert_eq!(keycode_name(KeyCode::Escape), "Escape");
        assert_eq!(keycode_name(KeyCode::Enter), "Enter");
    }

    #[test]
    fn mouse_buttons_map_across() {
        assert_eq!(map_mouse_button(WinitMouseButton::Left), MouseButton::Left);
        assert_eq!(
            map_mouse_button(WinitMouseButton::Middle),
            MouseButton::Middle
        );
        assert_eq!(
            map_mouse_button(WinitMouseButton::Other(8)),
            MouseButton::Other(8)
        );
    }

    #[test]
    fn mouse_press_translates() {
        let event = WindowEvent::MouseInput {
            device_id: winit::event::DeviceId::dummy(),
            state: ElementState::Pressed,
            button: WinitMouseButton::Left,
        };
        assert_eq!(
            translate_winit_input(&event, false),
            Some(InputEvent::MouseButtonPressed {
                button: MouseButton::Left
            })
        );
    }

    #[test]
    fn cursor_motion_translates() {
        let event = WindowEvent::CursorMoved {
            device_id: winit::event::DeviceId::dummy(),
            position: PhysicalPosition::new(100.5, 200.75),
        };
        assert_eq!(
            translate_winit_input(&event, false),
            Some(InputEvent::MouseMoved {
                x: 100.5,
                y: 200.75
            })
        );
    }

    #[test]
    fn wheel_translates_in_lines_and_pixels() {
        let lines = WindowEvent::MouseWheel {
            device_id: winit::event::DeviceId::dummy(),
            delta: MouseScrollDelta::LineDelta(-1.0, 2.0),
            phase: winit::event::TouchPhase::Moved,
        };
        assert_eq!(
            translate_winit_input(&lines, false),
            Some(InputEvent::MouseWheelScrolled {
                delta_x: -1.0,
                delta_y: 2.0
            })
        );

        let pixels = WindowEvent::MouseWheel {
            device_id: winit::event::DeviceId::dummy(),
            delta: MouseScrollDelta::PixelDelta(PhysicalPosition::new(5.5, -10.0)),
            phase: winit::event::TouchPhase::Moved,
        };
        assert_eq!(
            translate_winit_input(&pixels, false),
            Some(InputEvent::MouseWheelScrolled {
                delta_x: 5.5,
                delta_y: -10.0
            })
        );
    }

    #[test]
    fn non_input_events_return_none() {
        let resize = WindowEvent::Resized(winit::dpi::PhysicalSize::new(100, 100));
        let focus = WindowEvent::Focused(true);
        let close = WindowEvent::CloseRequested;
        assert_eq!(translate_winit_input(&resize, false), None);
        assert_eq!(translate_winit_input(&focus, false), None);
        assert_eq!(translate_winit_input(&close, false), None);
    }
}
