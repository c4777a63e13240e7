use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::core::input::InputEvent;
use crate::error::DisplayError;

/// The windowing collaborator behind a [`DisplaySurface`](super::DisplaySurface).
///
/// All methods are called from the render thread.
pub trait WindowBackend {
    /// Opens (or re-opens) the window with a content area of `width` x `height`.
    fn open(
        &mut self,
        title: &str,
        width: usize,
        height: usize,
        resizable: bool,
    ) -> Result<(), DisplayError>;

    /// Centers the window on screen. Backends that cannot position windows
    /// leave it where the platform put it.
    fn center(&mut self) {}

    fn set_title(&mut self, title: &str);

    fn set_visible(&mut self, visible: bool);

    /// Current content size. `None` while no window is open.
    fn content_size(&self) -> Option<(usize, usize)>;

    /// Presents an ARGB buffer of `width` x `height`, scaled to the content area.
    fn present(&mut self, buffer: &[u32], width: usize, height: usize)
        -> Result<(), DisplayError>;

    /// Input events gathered since the previous call.
    fn poll_events(&mut self) -> Vec<InputEvent>;

    /// True once the user asked to close the window.
    fn close_requested(&self) -> bool;

    fn close(&mut self);
}

//--- HeadlessBackend -------------------------------------------------------

/// What a [`HeadlessBackend`] has been asked to do, readable from another thread.
#[derive(Debug, Default)]
pub struct HeadlessControl {
    frames: AtomicUsize,
    opens: AtomicUsize,
    visible: AtomicBool,
    open: AtomicBool,
    centered: AtomicBool,
    close: AtomicBool,
    last_frame: Mutex<Option<(usize, usize, Vec<u32>)>>,
    events: Mutex<VecDeque<InputEvent>>,
}

impl HeadlessControl {
    pub fn frames_presented(&self) -> usize {
        self.frames.load(Ordering::SeqCst)
    }

    pub fn times_opened(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    pub fn was_centered(&self) -> bool {
        self.centered.load(Ordering::SeqCst)
    }

    /// Copy of the most recently presented frame.
    pub fn last_frame(&self) -> Option<(usize, usize, Vec<u32>)> {
        self.last_frame
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Simulates the user closing the window.
    pub fn request_close(&self) {
        self.close.store(true, Ordering::SeqCst);
    }

    /// Queues an event delivered on the next poll.
    pub fn push_event(&self, event: InputEvent) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(event);
    }
}

/// Window-less backend. Presented frames are counted and the last one kept;
/// closing and input are scripted through its [`HeadlessControl`].
#[derive(Debug)]
pub struct HeadlessBackend {
    control: Arc<HeadlessControl>,
    size: Option<(usize, usize)>,
    close_after_frames: Option<usize>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self {
            control: Arc::new(HeadlessControl::default()),
            size: None,
            close_after_frames: None,
        }
    }

    /// Requests a close once `frames` frames have been presented.
    pub fn close_after_frames(mut self, frames: usize) -> Self {
        self.close_after_frames = Some(frames);
        self
    }

    pub fn control(&self) -> Arc<HeadlessControl> {
        Arc::clone(&self.control)
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowBackend for HeadlessBackend {
    fn open(
        &mut self,
        _title: &str,
        width: usize,
        height: usize,
        _resizable: bool,
    ) -> Result<(), DisplayError> {
        if width == 0 || height == 0 {
            return Err(DisplayError::Window(format!(
                "invalid window size {}x{}",
                width, height
            )));
        }
        self.size = Some((width, height));
        self.control.opens.fetch_add(1, Ordering::SeqCst);
        self.control.open.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn center(&mut self) {
        self.control.centered.store(true, Ordering::SeqCst);
    }

    fn set_title(&mut self, _title: &str) {}

    fn set_visible(&mut self, visible: bool) {
        self.control.visible.store(visible, Ordering::SeqCst);
    }

    fn content_size(&self) -> Option<(usize, usize)> {
        self.size
    }

    fn present(
        &mut self,
        buffer: &[u32],
        width: usize,
        height: usize,
    ) -> Result<(), DisplayError> {
        if self.size.is_none() {
            return Err(DisplayError::NotPrepared);
        }
        *self
            .control
            .last_frame
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some((width, height, buffer.to_vec()));
        let presented = self.control.frames.fetch_add(1, Ordering::SeqCst) + 1;
        if self.close_after_frames.is_some_and(|n| presented >= n) {
            self.control.request_close();
        }
        Ok(())
    }

    fn poll_events(&mut self) -> Vec<InputEvent> {
        self.control
            .events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .drain(..)
            .collect()
    }

    fn close_requested(&self) -> bool {
        self.control.close.load(Ordering::SeqCst)
    }

    fn close(&mut self) {
        self.size = None;
        self.control.open.store(false, Ordering::SeqCst);
        self.control.visible.store(false, Ordering::SeqCst);
    }
}
