//! Simple widgets built on [`Entity`]: labels, buttons and scrolling
//! backgrounds. Widgets are updated and drawn by the scene that owns them.

mod background;
mod button;
mod label;

pub use background::Background;
pub use button::Button;
pub use label::Label;

use crate::core::entity::{Entity, EntityBehavior};
use crate::core::input::InputState;
use crate::core::Color;
use crate::display::graphics::{Font, Graphics};

/// State every widget shares: its box, colors, an optional font and whether
/// the cursor is over it.
#[derive(Debug, Clone, PartialEq)]
pub struct UiComponent {
    pub entity: Entity,
    pub foreground: Color,
    pub background: Color,
    /// Replaces the current font while the widget draws. The change is left
    /// in place afterwards, like any other font change.
    pub font: Option<Font>,
    highlighted: bool,
}

impl UiComponent {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self {
            entity: Entity::new(x, y, w, h),
            foreground: Color::BLACK,
            background: Color::BLACK,
            font: None,
            highlighted: false,
        }
    }

    pub fn is_highlighted(&self) -> bool {
        self.highlighted
    }

    /// Highlighted while the cursor is inside the box, edges included.
    pub fn update_hover(&mut self, input: &InputState) {
        let (x, y) = input.mouse_position();
        self.highlighted = self.entity.contains_point(x as f64, y as f64);
    }

    pub(crate) fn apply_font(&self, graphics: &mut Graphics<'_>) {
        if let Some(font) = &self.font {
            graphics.set_font(Some(font.clone()));
        }
    }
}

impl EntityBehavior for UiComponent {
    fn entity(&self) -> &Entity {
        &self.entity
    }

    fn entity_mut(&mut self) -> &mut Entity {
        &mut self.entity
    }

    fn update(&mut self, _dt: f64, input: &InputState) {
        self.update_hover(input);
    }

    fn render(&self, graphics: &mut Graphics<'_>) {
        self.apply_font(graphics);
    }
}
