use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{error, info, warn};

use crate::core::input::InputState;
use crate::core::scene::{Scene, SceneId, SceneRef, SceneRegistry};
use crate::core::timing::{AtomicF64, LoopClock, SleepInterrupt, Tick};
use crate::core::update_loop;
use crate::core::Color;
use crate::display::graphics::{Font, Graphics, GraphicsState, RenderQuality, DEFAULT_FONT_SIZE};
use crate::display::{DisplaySurface, MinifbBackend, WindowBackend, WindowConfig};
use crate::error::{DisplayError, EngineError, SceneError};

pub const DEFAULT_TPS: f64 = 60.0;
pub const DEFAULT_FPS: f64 = 60.0;

/// Debug overlay line positions, baseline-anchored.
const OVERLAY_TPS_POS: (f64, f64) = (5.0, 15.0);
const OVERLAY_FPS_POS: (f64, f64) = (5.0, 25.0);

//--- EngineConfig ----------------------------------------------------------

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub target_tps: f64,
    pub target_fps: f64,
    pub debug_overlay: bool,
    /// Font for the overlay; the built-in font when unset.
    pub debug_font: Option<Font>,
    pub quality: RenderQuality,
    pub window: WindowConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            target_tps: DEFAULT_TPS,
            target_fps: DEFAULT_FPS,
            debug_overlay: false,
            debug_font: None,
            quality: RenderQuality::Default,
            window: WindowConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tps(mut self, tps: f64) -> Self {
        assert!(tps > 0.0, "Ticks per second must be positive");
        self.target_tps = tps;
        self
    }

    pub fn with_fps(mut self, fps: f64) -> Self {
        assert!(fps > 0.0, "Frames per second must be positive");
        self.target_fps = fps;
        self
    }

    pub fn with_debug_overlay(mut self, enabled: bool) -> Self {
        self.debug_overlay = enabled;
        self
    }

    pub fn with_debug_font(mut self, font: Option<Font>) -> Self {
        self.debug_font = font;
        self
    }

    pub fn with_quality(mut self, quality: RenderQuality) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_window(mut self, window: WindowConfig) -> Self {
        self.window = window;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.window.title = title.into();
        self
    }

    pub fn with_size(mut self, width: usize, height: usize) -> Self {
        self.window.width = width;
        self.window.height = height;
        self
    }

    pub fn with_resizable(mut self, resizable: bool) -> Self {
        self.window.resizable = resizable;
        self
    }
}

//--- Shared state ----------------------------------------------------------

/// State both loops touch. Everything is either atomic or locked for a single
/// dispatch only.
#[derive(Debug)]
pub(crate) struct EngineShared {
    pub(crate) running: AtomicBool,
    pub(crate) target_tps: AtomicF64,
    pub(crate) target_fps: AtomicF64,
    pub(crate) tps: AtomicF64,
    pub(crate) fps: AtomicF64,
    pub(crate) debug_overlay: AtomicBool,
    pub(crate) scenes: SceneRegistry,
    pub(crate) input: InputState,
    pub(crate) interrupt: SleepInterrupt,
    pub(crate) update_restarts: AtomicUsize,
}

impl EngineShared {
    fn new(config: &EngineConfig) -> Self {
        Self {
            running: AtomicBool::new(false),
            target_tps: AtomicF64::new(config.target_tps),
            target_fps: AtomicF64::new(config.target_fps),
            tps: AtomicF64::new(0.0),
            fps: AtomicF64::new(0.0),
            debug_overlay: AtomicBool::new(config.debug_overlay),
            scenes: SceneRegistry::new(),
            input: InputState::new(),
            interrupt: SleepInterrupt::new(),
            update_restarts: AtomicUsize::new(0),
        }
    }
}

/// Cheap, cloneable access to a running engine, handed to every
/// `Scene::update` call.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    pub(crate) shared: Arc<EngineShared>,
}

impl EngineHandle {
    /// A handle with no engine behind it, for driving scenes by hand.
    pub fn detached() -> Self {
        Self {
            shared: Arc::new(EngineShared::new(&EngineConfig::default())),
        }
    }

    pub fn scenes(&self) -> &SceneRegistry {
        &self.shared.scenes
    }

    pub fn input(&self) -> &InputState {
        &self.shared.input
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Asks both loops to finish. Shutdown itself happens on the render thread
    /// once its loop exits.
    pub fn stop(&self) {
        if self.shared.running.swap(false, Ordering::SeqCst) {
            info!("Stop requested");
        }
    }

    /// Measured ticks per second.
    pub fn tps(&self) -> f64 {
        self.shared.tps.load()
    }

    /// Measured frames per second.
    pub fn fps(&self) -> f64 {
        self.shared.fps.load()
    }

    pub fn target_tps(&self) -> f64 {
        self.shared.target_tps.load()
    }

    /// Picked up by the update loop on its next tick. Non-positive rates are
    /// ignored.
    pub fn set_target_tps(&self, tps: f64) {
        if tps > 0.0 {
            self.shared.target_tps.store(tps);
        } else {
            warn!("Ignoring non-positive target tps {}", tps);
        }
    }

    pub fn target_fps(&self) -> f64 {
        self.shared.target_fps.load()
    }

    pub fn set_target_fps(&self, fps: f64) {
        if fps > 0.0 {
            self.shared.target_fps.store(fps);
        } else {
            warn!("Ignoring non-positive target fps {}", fps);
        }
    }

    pub fn debug_overlay(&self) -> bool {
        self.shared.debug_overlay.load(Ordering::Relaxed)
    }

    pub fn set_debug_overlay(&self, enabled: bool) {
        self.shared.debug_overlay.store(enabled, Ordering::Relaxed);
    }

    /// Cuts the update loop's current sleep short. The loop logs it and
    /// restarts with fresh timing state.
    pub fn interrupt_update(&self) {
        self.shared.interrupt.interrupt();
    }

    /// How often the update loop has been restarted after an interrupt.
    pub fn update_restarts(&self) -> usize {
        self.shared.update_restarts.load(Ordering::Relaxed)
    }
}

//--- Engine ----------------------------------------------------------------

/// Owns the display and runs the game.
///
/// [`start`](Engine::start) blocks: the render loop runs on the calling
/// thread, the update loop on a thread of its own. When either the window is
/// closed or [`EngineHandle::stop`] is called, both loops wind down and the
/// engine shuts down for good.
pub struct Engine {
    shared: Arc<EngineShared>,
    display: DisplaySurface,
    graphics: GraphicsState,
    debug_font: Option<Font>,
    update_thread: Option<JoinHandle<()>>,
    started: bool,
    shut_down: bool,
}

impl Engine {
    /// Engine with a real window, opened by `start`.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_backend(config, Box::new(MinifbBackend::new()))
    }

    pub fn with_backend(config: EngineConfig, backend: Box<dyn WindowBackend>) -> Self {
        let shared = Arc::new(EngineShared::new(&config));
        let builtin = match Font::builtin(DEFAULT_FONT_SIZE) {
            Ok(font) => Some(font),
            Err(e) => {
                error!("Built-in font unavailable, text will not be drawn: {}", e);
                None
            }
        };
        let mut graphics = GraphicsState::new();
        graphics.quality = config.quality;
        graphics.font = builtin.clone();
        Self {
            shared,
            display: DisplaySurface::new(config.window, backend),
            graphics,
            debug_font: config.debug_font.or(builtin),
            update_thread: None,
            started: false,
            shut_down: false,
        }
    }

    pub fn handle(&self) -> EngineHandle {
        EngineHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn scenes(&self) -> &SceneRegistry {
        &self.shared.scenes
    }

    pub fn input(&self) -> &InputState {
        &self.shared.input
    }

    pub fn register_scene(&self, scene: Box<dyn Scene>) -> Result<SceneRef, SceneError> {
        self.shared.scenes.register(scene)
    }

    pub fn enter_scene(&self, id: SceneId) -> Result<(), SceneError> {
        self.shared.scenes.enter_scene(id)
    }

    pub fn display(&self) -> &DisplaySurface {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut DisplaySurface {
        &mut self.display
    }

    /// Drawing state carried from frame to frame (color, font, scale).
    pub fn graphics_state_mut(&mut self) -> &mut GraphicsState {
        &mut self.graphics
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    pub fn tps(&self) -> f64 {
        self.shared.tps.load()
    }

    pub fn fps(&self) -> f64 {
        self.shared.fps.load()
    }

    pub fn set_target_tps(&self, tps: f64) {
        self.handle().set_target_tps(tps);
    }

    pub fn set_target_fps(&self, fps: f64) {
        self.handle().set_target_fps(fps);
    }

    pub fn set_debug_overlay(&self, enabled: bool) {
        self.handle().set_debug_overlay(enabled);
    }

    /// Runs the game until the window closes or a stop is requested, then
    /// shuts down. An engine can only be started once.
    pub fn start(&mut self) -> Result<(), EngineError> {
        if self.shut_down {
            return Err(EngineError::ShutDown);
        }
        if self.started {
            return Err(EngineError::AlreadyRunning);
        }
        self.started = true;

        info!("Starting game");
        self.shared.running.store(true, Ordering::SeqCst);

        if let Err(e) = self.display.prepare().and_then(|_| self.display.set_visible(true)) {
            error!("Could not prepare display: {}", e);
            self.stop();
            return Err(e.into());
        }

        match update_loop::spawn(self.handle()) {
            Ok(thread) => self.update_thread = Some(thread),
            Err(e) => {
                error!("Could not spawn update thread: {}", e);
                self.stop();
                return Err(EngineError::Spawn(e));
            }
        }
        info!("Game started");

        let result = self.render_loop();
        if let Err(e) = &result {
            error!("Render loop failed: {}", e);
        }
        self.stop();
        result.map_err(EngineError::from)
    }

    fn render_loop(&mut self) -> Result<(), DisplayError> {
        let mut clock = LoopClock::start();

        while self.is_running() {
            let tick = Tick::new(clock.lap(), self.shared.target_fps.load());
            if let Some(duration) = tick.sleep_request() {
                thread::sleep(duration);
            }
            self.shared.fps.store(tick.measured_rate());

            self.render_frame()?;
        }
        Ok(())
    }

    /// One render iteration: draw, overlay, present, capture input, clear.
    fn render_frame(&mut self) -> Result<(), DisplayError> {
        {
            let buffer = self.display.buffer_mut().ok_or(DisplayError::NotPrepared)?;
            let mut graphics = Graphics::new(buffer, &mut self.graphics);
            self.shared.scenes.render_active(&mut graphics);

            if self.shared.debug_overlay.load(Ordering::Relaxed) {
                draw_debug_overlay(
                    &mut graphics,
                    self.debug_font.as_ref(),
                    self.shared.tps.load(),
                    self.shared.fps.load(),
                );
            }
        }

        self.display.swap_buffers()?;
        self.display.capture_input(&self.shared.input);

        if let Some(buffer) = self.display.buffer_mut() {
            Graphics::new(buffer, &mut self.graphics).reset_buffer();
        }

        if self.display.is_closed() {
            self.shared.running.store(false, Ordering::SeqCst);
        }
        Ok(())
    }

    /// Shuts the engine down: stops both loops, runs every scene's
    /// `exit_scene`, releases the display and empties the scene registry.
    /// Calling it again does nothing.
    pub fn stop(&mut self) {
        if self.shut_down {
            return;
        }
        info!("Stopping game");
        self.shared.running.store(false, Ordering::SeqCst);
        self.shared.interrupt.interrupt();

        if let Some(thread) = self.update_thread.take() {
            if thread.join().is_err() {
                error!("Update thread panicked");
            }
        }

        self.shared.scenes.exit_all();
        self.display.clean_up();
        self.shared.scenes.clear();
        self.shut_down = true;
        info!("Game stopped");
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if self.started && !self.shut_down {
            self.stop();
        }
    }
}

/// Draws the TPS/FPS lines in red. Leaves the caller's font and color as
/// they were.
pub(crate) fn draw_debug_overlay(
    graphics: &mut Graphics<'_>,
    debug_font: Option<&Font>,
    tps: f64,
    fps: f64,
) {
    let old_font = graphics.font().cloned();
    let old_color = graphics.color();

    if let Some(font) = debug_font {
        graphics.set_font(Some(font.clone()));
    }
    graphics.set_color(Color::DEBUG_RED);
    graphics.draw_string(&format!("TPS: {:.1}", tps), OVERLAY_TPS_POS.0, OVERLAY_TPS_POS.1);
    graphics.draw_string(&format!("FPS: {:.1}", fps), OVERLAY_FPS_POS.0, OVERLAY_FPS_POS.1);

    graphics.set_font(old_font);
    graphics.set_color(old_color);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entity::{EntityBehavior, Player};
    use crate::core::input::{InputEvent, Key};
    use crate::core::scene::tests::{new_log, Call, CallLog, Recorder};
    use crate::display::{FrameBuffer, HeadlessBackend};
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    fn headless_engine(frames: usize) -> (Engine, Arc<crate::display::HeadlessControl>) {
        let backend = HeadlessBackend::new().close_after_frames(frames);
        let control = backend.control();
        let config = EngineConfig::new().with_tps(500.0).with_fps(500.0).with_size(64, 48);
        (Engine::with_backend(config, Box::new(backend)), control)
    }

    fn exits(log: &CallLog, id: SceneId) -> usize {
        log.lock()
            .unwrap()
            .iter()
            .filter(|c| **c == Call::Exit(id))
            .count()
    }

    #[test]
    fn window_close_runs_full_shutdown() {
        let log = new_log();
        let (mut engine, control) = headless_engine(5);
        engine.register_scene(Recorder::boxed(1, &log)).unwrap();
        engine.register_scene(Recorder::boxed(2, &log)).unwrap();
        engine.enter_scene(1).unwrap();

        engine.start().unwrap();

        assert_eq!(control.frames_presented(), 5);
        assert!(!engine.is_running());
        assert!(engine.is_shut_down());
        assert_eq!(exits(&log, 1), 1);
        assert_eq!(exits(&log, 2), 1);
        assert!(engine.scenes().is_empty());
        assert_eq!(engine.scenes().active_id(), None);
        assert!(!control.is_open());
        assert!(engine.display().buffer().is_none());

        let calls = log.lock().unwrap().clone();
        assert!(calls.contains(&Call::Render(1)));
        assert!(!calls.contains(&Call::Render(2)));

        assert!(matches!(engine.start(), Err(EngineError::ShutDown)));
    }

    #[test]
    fn stop_is_idempotent() {
        let log = new_log();
        let (mut engine, _control) = headless_engine(1);
        engine.register_scene(Recorder::boxed(1, &log)).unwrap();
        engine.register_scene(Recorder::boxed(2, &log)).unwrap();

        engine.stop();
        engine.stop();

        assert_eq!(exits(&log, 1), 1);
        assert_eq!(exits(&log, 2), 1);
        assert!(engine.scenes().is_empty());
    }

    #[test]
    fn presented_frame_is_rendered_before_reset() {
        struct Painter;
        impl Scene for Painter {
            fn id(&self) -> SceneId {
                1
            }
            fn update(&self, _dt: f64, _input: &InputState, _engine: &EngineHandle) {}
            fn render(&self, graphics: &mut Graphics<'_>) {
                graphics.set_color(Color::BLUE);
                graphics.fill_rect(0.0, 0.0, 4.0, 4.0);
            }
        }

        let (mut engine, control) = headless_engine(1);
        engine.register_scene(Box::new(Painter)).unwrap();
        engine.enter_scene(1).unwrap();
        engine.start().unwrap();

        let (w, h, pixels) = control.last_frame().unwrap();
        assert_eq!((w, h), (64, 48));
        assert_eq!(pixels[0], 0xFF00_00FF);
        assert_eq!(pixels[10], 0xFFFF_FFFF);
    }

    #[test]
    fn failed_prepare_is_reported() {
        let config = EngineConfig::new().with_size(0, 0);
        let mut engine = Engine::with_backend(config, Box::new(HeadlessBackend::new()));
        assert!(matches!(
            engine.start(),
            Err(EngineError::Display(DisplayError::Window(_)))
        ));
        assert!(!engine.is_running());
    }

    #[test]
    fn overlay_restores_font_and_color() {
        let mut buffer = FrameBuffer::new(40, 40);
        let mut state = GraphicsState::new();
        let mut graphics = Graphics::new(&mut buffer, &mut state);
        graphics.set_color(Color::GREEN);

        draw_debug_overlay(&mut graphics, None, 60.0, 59.94);

        assert_eq!(graphics.color(), Color::GREEN);
        assert!(graphics.font().is_none());
    }

    #[test]
    fn overlay_uses_builtin_font_by_default() {
        let backend = HeadlessBackend::new().close_after_frames(1);
        let control = backend.control();
        let config = EngineConfig::new().with_size(120, 40).with_debug_overlay(true);
        let mut engine = Engine::with_backend(config, Box::new(backend));
        engine.start().unwrap();

        let (w, _h, pixels) = control.last_frame().unwrap();
        let red_pixels = pixels
            .iter()
            .enumerate()
            .filter(|(i, _)| i % w < 60 && i / w < 30)
            .filter(|(_, p)| {
                let (r, g) = ((**p >> 16) & 0xFF, (**p >> 8) & 0xFF);
                r > 0xC0 && g < 0x80
            })
            .count();
        assert!(red_pixels > 10, "only {} overlay pixels", red_pixels);
    }

    #[test]
    fn slow_render_does_not_hold_back_updates() {
        struct SlowRender {
            updates: Arc<AtomicUsize>,
        }
        impl Scene for SlowRender {
            fn id(&self) -> SceneId {
                1
            }
            fn update(&self, _dt: f64, _input: &InputState, _engine: &EngineHandle) {
                self.updates.fetch_add(1, Ordering::SeqCst);
            }
            fn render(&self, _graphics: &mut Graphics<'_>) {
                thread::sleep(Duration::from_millis(40));
            }
        }

        let updates = Arc::new(AtomicUsize::new(0));
        let backend = HeadlessBackend::new().close_after_frames(10);
        let control = backend.control();
        let config = EngineConfig::new().with_tps(200.0).with_fps(500.0).with_size(8, 8);
        let mut engine = Engine::with_backend(config, Box::new(backend));
        engine
            .register_scene(Box::new(SlowRender {
                updates: Arc::clone(&updates),
            }))
            .unwrap();
        engine.enter_scene(1).unwrap();

        let started = Instant::now();
        engine.start().unwrap();
        let ran = started.elapsed().as_secs_f64();

        assert_eq!(control.frames_presented(), 10);
        // around 80 ticks at 200 tps over 0.4s; lockstep with render would give 10
        let updates = updates.load(Ordering::SeqCst);
        assert!(updates >= 40, "{} updates in {:.3}s", updates, ran);
    }

    #[test]
    #[should_panic(expected = "Ticks per second must be positive")]
    fn zero_tps_is_rejected() {
        let _ = EngineConfig::new().with_tps(0.0);
    }

    #[test]
    fn handle_ignores_non_positive_rates() {
        let handle = EngineHandle::detached();
        handle.set_target_fps(-1.0);
        handle.set_target_tps(0.0);
        assert_eq!(handle.target_fps(), DEFAULT_FPS);
        assert_eq!(handle.target_tps(), DEFAULT_TPS);
        handle.set_target_tps(30.0);
        assert_eq!(handle.target_tps(), 30.0);
    }

    /// Moves a player with W held and hands over to scene 2 once it has
    /// travelled 50 pixels.
    struct Walk {
        player: Mutex<Player>,
        position: Arc<Mutex<(f64, f64)>>,
        log: CallLog,
    }

    impl Scene for Walk {
        fn id(&self) -> SceneId {
            1
        }
        fn update(&self, dt: f64, input: &InputState, engine: &EngineHandle) {
            let mut player = self.player.lock().unwrap();
            player.update(dt, input);
            let pos = player.entity.position;
            *self.position.lock().unwrap() = (pos.x, pos.y);
            if pos.y <= -50.0 {
                engine.scenes().request_scene(2).unwrap();
            }
        }
        fn render(&self, graphics: &mut Graphics<'_>) {
            self.player.lock().unwrap().render(graphics);
        }
        fn leave_scene(&self) {
            self.log.lock().unwrap().push(Call::Leave(1));
        }
    }

    /// Stops the engine from its first update.
    struct Finish {
        log: CallLog,
    }

    impl Scene for Finish {
        fn id(&self) -> SceneId {
            2
        }
        fn update(&self, _dt: f64, _input: &InputState, engine: &EngineHandle) {
            self.log.lock().unwrap().push(Call::Update(2));
            engine.stop();
        }
        fn render(&self, _graphics: &mut Graphics<'_>) {}
        fn enter_scene(&self) {
            self.log.lock().unwrap().push(Call::Enter(2));
        }
        fn exit_scene(&self) {
            self.log.lock().unwrap().push(Call::Exit(2));
        }
    }

    #[test]
    fn player_walks_up_and_hands_over_to_next_scene() {
        let handle = EngineHandle::detached();
        let log = new_log();
        let position = Arc::new(Mutex::new((0.0, 0.0)));
        handle
            .scenes()
            .register(Box::new(Walk {
                player: Mutex::new(Player::new(0.0, 0.0, 10.0, 10.0, 100.0)),
                position: Arc::clone(&position),
                log: Arc::clone(&log),
            }))
            .unwrap();
        handle
            .scenes()
            .register(Box::new(Finish { log: Arc::clone(&log) }))
            .unwrap();
        handle.scenes().enter_scene(1).unwrap();

        handle.input().apply(InputEvent::KeyPressed(Key::W));
        handle.scenes().update_active(0.5, handle.input(), &handle);
        assert_eq!(*position.lock().unwrap(), (0.0, -50.0));

        handle.scenes().apply_pending();
        assert_eq!(handle.scenes().active_id(), Some(2));
        assert_eq!(*log.lock().unwrap(), vec![Call::Leave(1), Call::Enter(2)]);

        // only scene 2 sees further ticks
        handle.scenes().update_active(0.5, handle.input(), &handle);
        assert_eq!(*position.lock().unwrap(), (0.0, -50.0));
        assert_eq!(log.lock().unwrap().last(), Some(&Call::Update(2)));
    }

    #[test]
    fn running_engine_switches_scenes_and_stops_from_inside() {
        let log = new_log();
        let position = Arc::new(Mutex::new((0.0, 0.0)));
        let (mut engine, control) = headless_engine(100_000);
        engine
            .register_scene(Box::new(Walk {
                player: Mutex::new(Player::new(0.0, 0.0, 10.0, 10.0, 2_000.0)),
                position: Arc::clone(&position),
                log: Arc::clone(&log),
            }))
            .unwrap();
        engine
            .register_scene(Box::new(Finish { log: Arc::clone(&log) }))
            .unwrap();
        engine.enter_scene(1).unwrap();
        control.push_event(InputEvent::KeyPressed(Key::W));

        engine.start().unwrap();

        assert!(position.lock().unwrap().1 <= -50.0);
        let calls = log.lock().unwrap().clone();
        assert_eq!(&calls[..2], &[Call::Leave(1), Call::Enter(2)]);
        assert!(calls.contains(&Call::Update(2)));
        assert_eq!(calls.last(), Some(&Call::Exit(2)));
        assert!(control.frames_presented() < 100_000);
        assert!(engine.is_shut_down());
    }
}
