use crate::core::entity::{Entity, EntityBehavior};
use crate::core::input::InputState;
use crate::display::graphics::Graphics;
use crate::ui::UiComponent;

/// Text centered in a box.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub ui: UiComponent,
    text: String,
}

impl Label {
    pub fn new(x: f64, y: f64, w: f64, h: f64, text: impl Into<String>) -> Self {
        Self {
            ui: UiComponent::new(x, y, w, h),
            text: text.into(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }
}

impl EntityBehavior for Label {
    fn entity(&self) -> &Entity {
        &self.ui.entity
    }

    fn entity_mut(&mut self) -> &mut Entity {
        &mut self.ui.entity
    }

    fn update(&mut self, _dt: f64, input: &InputState) {
        self.ui.update_hover(input);
    }

    fn render(&self, graphics: &mut Graphics<'_>) {
        self.ui.apply_font(graphics);
        graphics.set_color(self.ui.foreground);
        let e = &self.ui.entity;
        graphics.draw_string_centered(&self.text, e.x(), e.y(), e.width(), e.height());
    }
}
