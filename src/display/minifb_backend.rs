use log::debug;
use minifb::{KeyRepeat, MouseMode, ScaleMode, Window, WindowOptions};

use crate::core::input::{InputEvent, MouseButton};
use crate::display::backend::WindowBackend;
use crate::error::DisplayError;

const BUTTONS: [(MouseButton, minifb::MouseButton); 3] = [
    (MouseButton::Left, minifb::MouseButton::Left),
    (MouseButton::Middle, minifb::MouseButton::Middle),
    (MouseButton::Right, minifb::MouseButton::Right),
];

/// A real window through `minifb`.
///
/// minifb pumps window events inside `update_with_buffer`, so input is only
/// as fresh as the last presented frame. It can neither hide nor center a
/// window: hiding is ignored and the platform picks the position.
pub struct MinifbBackend {
    window: Option<Window>,
    buttons_down: [bool; 3],
    cursor: Option<(i32, i32)>,
}

impl MinifbBackend {
    pub fn new() -> Self {
        Self {
            window: None,
            buttons_down: [false; 3],
            cursor: None,
        }
    }
}

impl Default for MinifbBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowBackend for MinifbBackend {
    fn open(
        &mut self,
        title: &str,
        width: usize,
        height: usize,
        resizable: bool,
    ) -> Result<(), DisplayError> {
        // re-preparing replaces the old window
        self.window = None;
        let mut window = Window::new(
            title,
            width,
            height,
            WindowOptions {
                resize: resizable,
                scale_mode: ScaleMode::Stretch,
                ..WindowOptions::default()
            },
        )
        .map_err(|e| DisplayError::Window(e.to_string()))?;
        // pacing is done by the render loop
        window.set_target_fps(0);
        self.window = Some(window);
        self.buttons_down = [false; 3];
        self.cursor = None;
        Ok(())
    }

    fn set_title(&mut self, title: &str) {
        if let Some(window) = self.window.as_mut() {
            window.set_title(title);
        }
    }

    fn set_visible(&mut self, visible: bool) {
        if !visible {
            debug!("minifb windows cannot be hidden, ignoring");
        }
    }

    fn content_size(&self) -> Option<(usize, usize)> {
        self.window.as_ref().map(Window::get_size)
    }

    fn present(
        &mut self,
        buffer: &[u32],
        width: usize,
        height: usize,
    ) -> Result<(), DisplayError> {
        let window = self.window.as_mut().ok_or(DisplayError::NotPrepared)?;
        window
            .update_with_buffer(buffer, width, height)
            .map_err(|e| DisplayError::Window(e.to_string()))
    }

    fn poll_events(&mut self) -> Vec<InputEvent> {
        let Some(window) = self.window.as_ref() else {
            return Vec::new();
        };
        let mut events = Vec::new();

        for key in window.get_keys_pressed(KeyRepeat::No) {
            events.push(InputEvent::KeyPressed(key));
        }
        for key in window.get_keys_released() {
            events.push(InputEvent::KeyReleased(key));
        }

        // Cursor first, so a press in the same frame records the new position
        // as its drag origin.
        if let Some((x, y)) = window.get_mouse_pos(MouseMode::Discard) {
            let pos = (x as i32, y as i32);
            if self.cursor != Some(pos) {
                self.cursor = Some(pos);
                events.push(InputEvent::CursorMoved { x: pos.0, y: pos.1 });
            }
        }

        for (i, (button, raw)) in BUTTONS.iter().enumerate() {
            let down = window.get_mouse_down(*raw);
            if down != self.buttons_down[i] {
                self.buttons_down[i] = down;
                events.push(if down {
                    InputEvent::ButtonPressed(*button)
                } else {
                    InputEvent::ButtonReleased(*button)
                });
            }
        }

        if let Some((_, dy)) = window.get_scroll_wheel() {
            if let Some(notches) = wheel_notches(dy) {
                events.push(InputEvent::WheelMoved(notches));
            }
        }

        events
    }

    fn close_requested(&self) -> bool {
        self.window.as_ref().is_some_and(|w| !w.is_open())
    }

    fn close(&mut self) {
        // dropping the minifb window destroys it
        self.window = None;
    }
}

/// minifb reports scrolling away from the user as positive, notches count
/// towards the user as positive. Fractional scrolls (touchpads) count as one
/// notch.
fn wheel_notches(dy: f32) -> Option<i32> {
    if dy == 0.0 {
        return None;
    }
    let notches = (-dy).round() as i32;
    Some(if notches == 0 { -(dy.signum() as i32) } else { notches })
}
