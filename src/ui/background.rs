use crate::core::entity::{Entity, EntityBehavior};
use crate::core::input::InputState;
use crate::core::texture::Texture;
use crate::display::graphics::Graphics;
use crate::ui::UiComponent;

/// A texture tile that scrolls horizontally and wraps around.
///
/// A second copy of the tile is drawn next to the first to fill the gap the
/// scrolling opens up. The x position stays within one tile width of zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Background {
    pub ui: UiComponent,
    /// Pixels per second, negative scrolls to the left.
    pub speed_x: f64,
    texture: Texture,
}

impl Background {
    pub fn new(x: f64, y: f64, w: f64, h: f64, texture: Texture) -> Self {
        Self::scrolling(x, y, w, h, texture, 0.0)
    }

    pub fn scrolling(x: f64, y: f64, w: f64, h: f64, texture: Texture, speed_x: f64) -> Self {
        Self {
            ui: UiComponent::new(x, y, w, h),
            speed_x,
            texture,
        }
    }

    pub fn texture(&self) -> &Texture {
        &self.texture
    }
}

impl EntityBehavior for Background {
    fn entity(&self) -> &Entity {
        &self.ui.entity
    }

    fn entity_mut(&mut self) -> &mut Entity {
        &mut self.ui.entity
    }

    fn update(&mut self, dt: f64, _input: &InputState) {
        let e = &mut self.ui.entity;
        e.position.x += self.speed_x * dt;
        if e.size.x > 0.0 {
            e.position.x %= e.size.x;
        }
    }

    fn render(&self, graphics: &mut Graphics<'_>) {
        let e = &self.ui.entity;
        let (x, y, w, h) = (e.x(), e.y(), e.width(), e.height());
        let view_width = graphics.width() as f64 / graphics.scale();

        graphics.draw_texture_sized(&self.texture, x, y, w, h);
        if x + w < view_width {
            graphics.draw_texture_sized(&self.texture, x + w, y, w, h);
        } else if x > 0.0 {
            graphics.draw_texture_sized(&self.texture, x - w, y, w, h);
        }
    }
}
