pub mod backend;
pub mod buffer;
pub mod graphics;
pub mod minifb_backend;

pub use backend::{HeadlessBackend, HeadlessControl, WindowBackend};
pub use buffer::FrameBuffer;
pub use graphics::{load_font, Font, Graphics, GraphicsState, RenderQuality};
pub use minifb_backend::MinifbBackend;

use log::{debug, info};

use crate::core::input::InputState;
use crate::error::DisplayError;

pub const DEFAULT_TITLE: &str = "simple2d";
pub const DEFAULT_WIDTH: usize = 800;
pub const DEFAULT_HEIGHT: usize = 600;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowConfig {
    pub title: String,
    pub width: usize,
    pub height: usize,
    pub resizable: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            resizable: false,
        }
    }
}

/// The game window plus its off-screen buffer.
///
/// The buffer is allocated by [`prepare`](Self::prepare) at the realised
/// content size and keeps that size until the next `prepare`, whatever
/// happens to the window in between. Presenting stretches it to fit.
pub struct DisplaySurface {
    backend: Box<dyn WindowBackend>,
    config: WindowConfig,
    buffer: Option<FrameBuffer>,
    closed: bool,
    torn_down: bool,
}

impl DisplaySurface {
    pub fn new(config: WindowConfig, backend: Box<dyn WindowBackend>) -> Self {
        Self {
            backend,
            config,
            buffer: None,
            closed: false,
            torn_down: false,
        }
    }

    pub fn title(&self) -> &str {
        &self.config.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.config.title = title.into();
        self.backend.set_title(&self.config.title);
    }

    pub fn is_resizable(&self) -> bool {
        self.config.resizable
    }

    /// Takes effect on the next `prepare`.
    pub fn set_resizable(&mut self, resizable: bool) {
        self.config.resizable = resizable;
    }

    /// Content width: measured once prepared, configured before.
    pub fn width(&self) -> usize {
        self.backend
            .content_size()
            .map(|(w, _)| w)
            .unwrap_or(self.config.width)
    }

    pub fn height(&self) -> usize {
        self.backend
            .content_size()
            .map(|(_, h)| h)
            .unwrap_or(self.config.height)
    }

    /// Size the window opens with on the next `prepare`.
    pub fn preferred_size(&self) -> (usize, usize) {
        (self.config.width, self.config.height)
    }

    pub fn set_size(&mut self, width: usize, height: usize) {
        self.config.width = width;
        self.config.height = height;
    }

    pub fn set_width(&mut self, width: usize) {
        self.config.width = width;
    }

    pub fn set_height(&mut self, height: usize) {
        self.config.height = height;
    }

    pub fn is_prepared(&self) -> bool {
        self.buffer.is_some()
    }

    /// Opens the window, centers it and allocates the buffer at the realised
    /// content size. Calling it again re-opens and re-allocates.
    pub fn prepare(&mut self) -> Result<(), DisplayError> {
        if self.torn_down {
            return Err(DisplayError::Closed);
        }
        self.backend.open(
            &self.config.title,
            self.config.width,
            self.config.height,
            self.config.resizable,
        )?;
        self.backend.center();

        let (width, height) = self
            .backend
            .content_size()
            .unwrap_or((self.config.width, self.config.height));
        self.buffer = Some(FrameBuffer::new(width, height));
        info!("Prepared display {}x{} \"{}\"", width, height, self.config.title);
        Ok(())
    }

    pub fn set_visible(&mut self, visible: bool) -> Result<(), DisplayError> {
        if self.buffer.is_none() {
            return Err(DisplayError::NotPrepared);
        }
        self.backend.set_visible(visible);
        Ok(())
    }

    /// Presents the off-screen buffer.
    pub fn swap_buffers(&mut self) -> Result<(), DisplayError> {
        let buffer = self.buffer.as_ref().ok_or(DisplayError::NotPrepared)?;
        self.backend
            .present(&buffer.data, buffer.width, buffer.height)
    }

    /// Moves pending window input into `input` and latches the close signal.
    pub fn capture_input(&mut self, input: &InputState) {
        for event in self.backend.poll_events() {
            input.apply(event);
        }
        if !self.closed && self.backend.close_requested() {
            debug!("Window close requested");
            self.closed = true;
        }
    }

    /// True once the window was asked to close. Never resets.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Hides and closes the window and drops the buffer. The surface cannot
    /// be prepared again afterwards.
    pub fn clean_up(&mut self) {
        if self.torn_down {
            return;
        }
        self.backend.set_visible(false);
        self.backend.close();
        self.buffer = None;
        self.torn_down = true;
        debug!("Display cleaned up");
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn buffer(&self) -> Option<&FrameBuffer> {
        self.buffer.as_ref()
    }

    pub fn buffer_mut(&mut self) -> Option<&mut FrameBuffer> {
        self.buffer.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::input::{InputEvent, Key};

    fn headless() -> (DisplaySurface, std::sync::Arc<HeadlessControl>) {
        let backend = HeadlessBackend::new();
        let control = backend.control();
        (
            DisplaySurface::new(WindowConfig::default(), Box::new(backend)),
            control,
        )
    }

    #[test]
    fn resize_before_prepare_sizes_the_buffer() {
        let (mut display, control) = headless();
        assert_eq!((display.width(), display.height()), (800, 600));

        display.set_size(320, 240);
        display.prepare().unwrap();

        let buffer = display.buffer().unwrap();
        assert_eq!((buffer.width, buffer.height), (320, 240));
        assert_eq!(buffer.data.len(), 320 * 240);
        assert!(control.was_centered());
    }

    #[test]
    fn resize_after_prepare_keeps_buffer_until_reprepared() {
        let (mut display, control) = headless();
        display.prepare().unwrap();
        display.set_width(1024);

        let buffer = display.buffer().unwrap();
        assert_eq!((buffer.width, buffer.height), (800, 600));
        assert_eq!(display.preferred_size(), (1024, 600));

        display.prepare().unwrap();
        assert_eq!(display.buffer().unwrap().width, 1024);
        assert_eq!(control.times_opened(), 2);
    }

    #[test]
    fn visibility_requires_prepare() {
        let (mut display, control) = headless();
        assert!(matches!(display.set_visible(true), Err(DisplayError::NotPrepared)));
        assert!(matches!(display.swap_buffers(), Err(DisplayError::NotPrepared)));

        display.prepare().unwrap();
        display.set_visible(true).unwrap();
        assert!(control.is_visible());
    }

    #[test]
    fn close_signal_latches() {
        let (mut display, control) = headless();
        let input = InputState::new();
        display.prepare().unwrap();
        display.capture_input(&input);
        assert!(!display.is_closed());

        control.request_close();
        display.capture_input(&input);
        assert!(display.is_closed());
        display.capture_input(&input);
        assert!(display.is_closed());
    }

    #[test]
    fn captured_events_reach_input_state() {
        let (mut display, control) = headless();
        let input = InputState::new();
        display.prepare().unwrap();
        control.push_event(InputEvent::KeyPressed(Key::W));
        control.push_event(InputEvent::CursorMoved { x: 12, y: 34 });

        display.capture_input(&input);
        assert!(input.is_key_down(Key::W));
        assert_eq!(input.mouse_position(), (12, 34));
    }

    #[test]
    fn clean_up_releases_everything_once() {
        let (mut display, control) = headless();
        display.prepare().unwrap();
        display.set_visible(true).unwrap();
        display.swap_buffers().unwrap();
        assert_eq!(control.frames_presented(), 1);

        display.clean_up();
        display.clean_up();
        assert!(display.buffer().is_none());
        assert!(!control.is_open());
        assert!(!control.is_visible());
        assert!(matches!(display.prepare(), Err(DisplayError::Closed)));
    }
}
