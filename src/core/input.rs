//! Keyboard/mouse snapshot shared between event capture and the update loop.
//!
//! Every field is an atomic with relaxed ordering. Writers are the window
//! backend's event capture (one write per event, last write wins), the reader is
//! the update loop. Nothing here spans two fields atomically; a tick may see a
//! cursor position one event newer than the button flags, which only ever costs
//! a frame of input lag.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

pub use minifb::Key;

/// Number of keyboard flags, indexed by `Key as usize`.
pub const KEY_SLOTS: usize = 512;
/// Number of mouse button flags.
pub const BUTTON_SLOTS: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

impl MouseButton {
    // Buttons are numbered from 1, slot 0 stays unused.
    fn slot(self) -> usize {
        match self {
            MouseButton::Left => 1,
            MouseButton::Middle => 2,
            MouseButton::Right => 3,
        }
    }
}

/// A single input event as delivered by the window backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    KeyPressed(Key),
    KeyReleased(Key),
    ButtonPressed(MouseButton),
    ButtonReleased(MouseButton),
    CursorMoved { x: i32, y: i32 },
    /// Wheel notches of the latest wheel event, positive towards the user.
    WheelMoved(i32),
}

pub struct InputState {
    keys: [AtomicBool; KEY_SLOTS],
    buttons: [AtomicBool; BUTTON_SLOTS],
    mouse_x: AtomicI32,
    mouse_y: AtomicI32,
    wheel_delta: AtomicI32,
    drag_start_x: AtomicI32,
    drag_start_y: AtomicI32,
    drag_delta_x: AtomicI32,
    drag_delta_y: AtomicI32,
}

impl InputState {
    pub fn new() -> Self {
        Self {
            keys: std::array::from_fn(|_| AtomicBool::new(false)),
            buttons: std::array::from_fn(|_| AtomicBool::new(false)),
            mouse_x: AtomicI32::new(0),
            mouse_y: AtomicI32::new(0),
            wheel_delta: AtomicI32::new(0),
            drag_start_x: AtomicI32::new(0),
            drag_start_y: AtomicI32::new(0),
            drag_delta_x: AtomicI32::new(0),
            drag_delta_y: AtomicI32::new(0),
        }
    }

    pub fn is_key_down(&self, key: Key) -> bool {
        self.keys
            .get(key as usize)
            .map(|flag| flag.load(Ordering::Relaxed))
            .unwrap_or(false)
    }

    pub fn is_button_down(&self, button: MouseButton) -> bool {
        self.buttons[button.slot()].load(Ordering::Relaxed)
    }

    pub fn mouse_x(&self) -> i32 {
        self.mouse_x.load(Ordering::Relaxed)
    }

    pub fn mouse_y(&self) -> i32 {
        self.mouse_y.load(Ordering::Relaxed)
    }

    pub fn mouse_position(&self) -> (i32, i32) {
        (self.mouse_x(), self.mouse_y())
    }

    /// Notch count of the most recent wheel event. Not accumulated, and not
    /// cleared between ticks.
    pub fn mouse_wheel_delta(&self) -> i32 {
        self.wheel_delta.load(Ordering::Relaxed)
    }

    /// Pixels moved since the left button went down, `(0, 0)` once released.
    pub fn drag_delta(&self) -> (i32, i32) {
        (
            self.drag_delta_x.load(Ordering::Relaxed),
            self.drag_delta_y.load(Ordering::Relaxed),
        )
    }

    /// Applies one event. Called by event capture only.
    pub fn apply(&self, event: InputEvent) {
        match event {
            InputEvent::KeyPressed(key) => self.set_key(key, true),
            InputEvent::KeyReleased(key) => self.set_key(key, false),
            InputEvent::ButtonPressed(button) => {
                self.buttons[button.slot()].store(true, Ordering::Relaxed);
                if button == MouseButton::Left {
                    self.drag_start_x.store(self.mouse_x(), Ordering::Relaxed);
                    self.drag_start_y.store(self.mouse_y(), Ordering::Relaxed);
                }
            }
            InputEvent::ButtonReleased(button) => {
                self.buttons[button.slot()].store(false, Ordering::Relaxed);
                if button == MouseButton::Left {
                    self.drag_start_x.store(0, Ordering::Relaxed);
                    self.drag_start_y.store(0, Ordering::Relaxed);
                    self.drag_delta_x.store(0, Ordering::Relaxed);
                    self.drag_delta_y.store(0, Ordering::Relaxed);
                }
            }
            InputEvent::CursorMoved { x, y } => {
                self.mouse_x.store(x, Ordering::Relaxed);
                self.mouse_y.store(y, Ordering::Relaxed);
                if self.is_button_down(MouseButton::Left) {
                    let dx = x - self.drag_start_x.load(Ordering::Relaxed);
                    let dy = y - self.drag_start_y.load(Ordering::Relaxed);
                    self.drag_delta_x.store(dx, Ordering::Relaxed);
                    self.drag_delta_y.store(dy, Ordering::Relaxed);
                }
            }
            InputEvent::WheelMoved(notches) => self.wheel_delta.store(notches, Ordering::Relaxed),
        }
    }

    fn set_key(&self, key: Key, down: bool) {
        if let Some(flag) = self.keys.get(key as usize) {
            flag.store(down, Ordering::Relaxed);
        }
    }

    fn pressed_keys(&self) -> Vec<usize> {
        self.keys
            .iter()
            .enumerate()
            .filter(|(_, flag)| flag.load(Ordering::Relaxed))
            .map(|(code, _)| code)
            .collect()
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for InputState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputState")
            .field("mouse", &self.mouse_position())
            .field("wheel", &self.mouse_wheel_delta())
            .field("drag", &self.drag_delta())
            .field("pressed_keys", &self.pressed_keys())
            .finish()
    }
}
