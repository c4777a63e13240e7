use glam::DVec2;

use crate::core::input::{InputState, Key};
use crate::core::texture::Texture;
use crate::display::graphics::Graphics;

/// An axis-aligned box in screen pixels with an optional texture.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub position: DVec2,
    pub size: DVec2,
    pub texture: Option<Texture>,
}

impl Entity {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self {
            position: DVec2::new(x, y),
            size: DVec2::new(w, h),
            texture: None,
        }
    }

    /// Sized to the texture.
    pub fn from_texture(x: f64, y: f64, texture: Texture) -> Self {
        Self {
            position: DVec2::new(x, y),
            size: DVec2::new(texture.width as f64, texture.height as f64),
            texture: Some(texture),
        }
    }

    pub fn with_texture(mut self, texture: Texture) -> Self {
        self.texture = Some(texture);
        self
    }

    pub fn x(&self) -> f64 {
        self.position.x
    }

    pub fn y(&self) -> f64 {
        self.position.y
    }

    pub fn width(&self) -> f64 {
        self.size.x
    }

    pub fn height(&self) -> f64 {
        self.size.y
    }

    pub fn set_location(&mut self, x: f64, y: f64) {
        self.position = DVec2::new(x, y);
    }

    pub fn move_by(&mut self, dx: f64, dy: f64) {
        self.position += DVec2::new(dx, dy);
    }

    pub fn set_size(&mut self, w: f64, h: f64) {
        self.size = DVec2::new(w, h);
    }

    /// Multiplies the size by the given factors.
    pub fn resize(&mut self, sx: f64, sy: f64) {
        self.size *= DVec2::new(sx, sy);
    }

    /// Edges count as inside.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        let max = self.position + self.size;
        x >= self.position.x && x <= max.x && y >= self.position.y && y <= max.y
    }

    /// True when all four corners of `other` lie inside this entity, i.e.
    /// `other` is contained, not merely overlapping.
    pub fn collides(&self, other: &Entity) -> bool {
        let min = other.position;
        let max = other.position + other.size;
        self.contains_point(min.x, min.y)
            && self.contains_point(max.x, min.y)
            && self.contains_point(max.x, max.y)
            && self.contains_point(min.x, max.y)
    }

    /// Draws the texture stretched over the box, or fills the box in the
    /// current color when there is no texture.
    pub fn draw(&self, graphics: &mut Graphics<'_>) {
        let (x, y, w, h) = (self.position.x, self.position.y, self.size.x, self.size.y);
        match &self.texture {
            Some(texture) => graphics.draw_texture_sized(texture, x, y, w, h),
            None => graphics.fill_rect(x, y, w, h),
        }
    }
}

/// Per-tick behavior shared by entities, players and UI components, so a
/// scene can keep them together as `Vec<Box<dyn EntityBehavior>>`.
pub trait EntityBehavior: Send {
    fn entity(&self) -> &Entity;

    fn entity_mut(&mut self) -> &mut Entity;

    fn update(&mut self, _dt: f64, _input: &InputState) {}

    fn render(&self, graphics: &mut Graphics<'_>) {
        self.entity().draw(graphics);
    }
}

impl EntityBehavior for Entity {
    fn entity(&self) -> &Entity {
        self
    }

    fn entity_mut(&mut self) -> &mut Entity {
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlKeys {
    pub up: Key,
    pub down: Key,
    pub left: Key,
    pub right: Key,
}

impl Default for ControlKeys {
    fn default() -> Self {
        Self {
            up: Key::W,
            down: Key::S,
            left: Key::A,
            right: Key::D,
        }
    }
}

/// Keyboard-steered entity. Moves `speed` pixels per second along each axis
/// whose key is held.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub entity: Entity,
    pub speed: f64,
    pub controls: ControlKeys,
}

impl Player {
    pub fn new(x: f64, y: f64, w: f64, h: f64, speed: f64) -> Self {
        Self {
            entity: Entity::new(x, y, w, h),
            speed,
            controls: ControlKeys::default(),
        }
    }

    pub fn from_texture(x: f64, y: f64, texture: Texture, speed: f64) -> Self {
        Self {
            entity: Entity::from_texture(x, y, texture),
            speed,
            controls: ControlKeys::default(),
        }
    }

    pub fn set_control_keys(&mut self, up: Key, down: Key, left: Key, right: Key) {
        self.controls = ControlKeys {
            up,
            down,
            left,
            right,
        };
    }
}

impl EntityBehavior for Player {
    fn entity(&self) -> &Entity {
        &self.entity
    }

    fn entity_mut(&mut self) -> &mut Entity {
        &mut self.entity
    }

    fn update(&mut self, dt: f64, input: &InputState) {
        let step = self.speed * dt;
        let c = self.controls;
        if input.is_key_down(c.up) {
            self.entity.position.y -= step;
        }
        if input.is_key_down(c.down) {
            self.entity.position.y += step;
        }
        if input.is_key_down(c.left) {
            self.entity.position.x -= step;
        }
        if input.is_key_down(c.right) {
            self.entity.position.x += step;
        }
    }
}
