use std::error::Error;
use std::sync::{Mutex, MutexGuard};

use log::{info, warn};
use simple2d::cli::{create_clap_command, handle_clap_matches};
use simple2d::core::input::InputState;
use simple2d::display::graphics::{load_font, DEFAULT_FONT_SIZE};
use simple2d::{
    logging, Button, Color, Engine, EngineHandle, Entity, EntityBehavior, Graphics, Key, Label,
    MouseButton, Player, Scene, SceneId,
};

const MENU: SceneId = 1;
const PLAY: SceneId = 2;

/// Turns a held key into a single press.
#[derive(Debug, Default)]
struct KeyLatch {
    was_down: bool,
}

impl KeyLatch {
    fn pressed(&mut self, input: &InputState, key: Key) -> bool {
        let down = input.is_key_down(key);
        let pressed = down && !self.was_down;
        self.was_down = down;
        pressed
    }
}

/// Handles the keys every demo scene shares: Escape quits, F3 toggles the
/// debug overlay.
#[derive(Debug, Default)]
struct CommonKeys {
    overlay: KeyLatch,
}

impl CommonKeys {
    fn update(&mut self, input: &InputState, engine: &EngineHandle) {
        if input.is_key_down(Key::Escape) {
            engine.stop();
        }
        if self.overlay.pressed(input, Key::F3) {
            engine.set_debug_overlay(!engine.debug_overlay());
        }
    }
}

//--- Menu --------------------------------------------------------------------

struct MenuState {
    common: CommonKeys,
    enter: KeyLatch,
    blink: f64,
    title: Label,
    start: Button,
}

struct MenuScene {
    state: Mutex<MenuState>,
}

impl MenuScene {
    fn new(engine: EngineHandle) -> Self {
        let mut title = Label::new(0.0, 0.0, 0.0, 40.0, "simple2d");
        title.ui.foreground = Color::WHITE;

        let mut start = Button::new(0.0, 0.0, 160.0, 40.0, "start").with_action(move || {
            if let Err(e) = engine.scenes().request_scene(PLAY) {
                warn!("{}", e);
            }
        });
        start.corner_rounding = 12.0;
        start.ui.foreground = Color::WHITE;
        start.ui.background = Color::LIGHT_GRAY;

        Self {
            state: Mutex::new(MenuState {
                common: CommonKeys::default(),
                enter: KeyLatch::default(),
                blink: 0.0,
                title,
                start,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, MenuState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Scene for MenuScene {
    fn id(&self) -> SceneId {
        MENU
    }

    fn update(&self, dt: f64, input: &InputState, engine: &EngineHandle) {
        let mut state = self.state();
        state.common.update(input, engine);
        state.blink = (state.blink + dt) % 1.0;
        state.title.update(dt, input);
        state.start.update(dt, input);
        if state.enter.pressed(input, Key::Enter) {
            if let Err(e) = engine.scenes().request_scene(PLAY) {
                warn!("{}", e);
            }
        }
    }

    fn render(&self, g: &mut Graphics<'_>) {
        let mut state = self.state();
        let (w, h) = (g.width() as f64, g.height() as f64);
        g.set_color(Color::NAVY);
        g.fill_rect(0.0, 0.0, w, h);

        // widgets follow the window size
        state.title.entity_mut().set_location(0.0, h / 3.0);
        state.title.entity_mut().set_size(w, 40.0);
        state.start.entity_mut().set_location(w / 2.0 - 80.0, h / 2.0);
        state.title.render(g);
        state.start.render(g);

        if state.blink < 0.5 {
            g.set_color(Color::LIGHT_GRAY);
            g.draw_string_centered("or press enter", 0.0, h / 2.0 + 50.0, w, 40.0);
        }

        // keep the overlay readable
        g.set_color(Color::WHITE);
        g.fill_rect(0.0, 0.0, 90.0, 30.0);
    }

    fn enter_scene(&self) {
        self.state().blink = 0.0;
        info!("Menu");
    }
}

//--- Play --------------------------------------------------------------------

struct PlayState {
    common: CommonKeys,
    back: KeyLatch,
    player: Player,
    goal: Entity,
    drag: Option<(i32, i32, i32, i32)>,
    reached: u32,
}

struct PlayScene {
    state: Mutex<PlayState>,
}

impl PlayScene {
    fn new() -> Self {
        Self {
            state: Mutex::new(PlayState {
                common: CommonKeys::default(),
                back: KeyLatch::default(),
                player: Player::new(40.0, 40.0, 24.0, 24.0, 180.0),
                goal: Entity::new(300.0, 220.0, 120.0, 120.0),
                drag: None,
                reached: 0,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, PlayState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Scene for PlayScene {
    fn id(&self) -> SceneId {
        PLAY
    }

    fn update(&self, dt: f64, input: &InputState, engine: &EngineHandle) {
        let mut state = self.state();
        state.common.update(input, engine);
        if state.back.pressed(input, Key::Enter) {
            if let Err(e) = engine.scenes().request_scene(MENU) {
                warn!("{}", e);
            }
            return;
        }

        state.player.update(dt, input);
        if state.goal.collides(&state.player.entity) {
            state.reached += 1;
            state.player.entity.set_location(40.0, 40.0);
            info!("Goal reached ({} total)", state.reached);
        }

        state.drag = if input.is_button_down(MouseButton::Left) {
            let (mx, my) = input.mouse_position();
            let (dx, dy) = input.drag_delta();
            Some((mx - dx, my - dy, dx, dy))
        } else {
            None
        };
    }

    fn render(&self, g: &mut Graphics<'_>) {
        let state = self.state();
        let goal = &state.goal;
        g.set_color(Color::GREEN);
        g.fill_round_rect(goal.x(), goal.y(), goal.width(), goal.height(), 24.0, 24.0);
        g.set_color(Color::DARK_GRAY);
        g.draw_round_rect(goal.x(), goal.y(), goal.width(), goal.height(), 24.0, 24.0);

        g.set_color(Color::ORANGE);
        state.player.render(g);

        if let Some((x, y, dx, dy)) = state.drag {
            let (x0, x1) = (x.min(x + dx), x.max(x + dx));
            let (y0, y1) = (y.min(y + dy), y.max(y + dy));
            g.set_color(Color::with_alpha(0.0, 0.0, 1.0, 0.25));
            g.fill_rect(x0 as f64, y0 as f64, (x1 - x0) as f64, (y1 - y0) as f64);
            g.set_color(Color::BLUE);
            g.draw_rect(x0 as f64, y0 as f64, (x1 - x0) as f64, (y1 - y0) as f64);
        }

        g.set_color(Color::BLACK);
        let label = format!("goals: {}", state.reached);
        let x = g.width() as f64 - g.text_width(&label) - 10.0;
        g.draw_string(&label, x, 20.0);
    }

    fn leave_scene(&self) {
        self.state().drag = None;
    }

    fn exit_scene(&self) {
        info!("Reached the goal {} times", self.state().reached);
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let matches = create_clap_command().get_matches();
    let options = handle_clap_matches(&matches);

    if let Err(e) = logging::init(&options.log) {
        eprintln!("Logging disabled: {}", e);
    }

    // without --font the built-in font is used
    let font = options
        .font
        .as_ref()
        .and_then(|path| load_font(path, DEFAULT_FONT_SIZE));

    let mut engine = Engine::new(options.engine.with_debug_font(font.clone()));
    if font.is_some() {
        engine.graphics_state_mut().font = font;
    }

    engine.register_scene(Box::new(MenuScene::new(engine.handle())))?;
    engine.register_scene(Box::new(PlayScene::new()))?;
    engine.enter_scene(MENU)?;

    engine.start()?;
    Ok(())
}
