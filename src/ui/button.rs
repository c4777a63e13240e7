use std::fmt;

use crate::core::entity::{Entity, EntityBehavior};
use crate::core::input::{InputState, MouseButton};
use crate::display::graphics::Graphics;
use crate::ui::UiComponent;

type Action = Box<dyn FnMut() + Send>;

/// A rounded, outlined box with centered text.
///
/// The outline grows by a pixel while hovered and shrinks by a pixel while
/// pressed. The action fires when the left button goes down over the button.
pub struct Button {
    pub ui: UiComponent,
    pub corner_rounding: f64,
    text: String,
    pressed: bool,
    action: Option<Action>,
}

impl Button {
    pub fn new(x: f64, y: f64, w: f64, h: f64, text: impl Into<String>) -> Self {
        Self {
            ui: UiComponent::new(x, y, w, h),
            corner_rounding: 0.0,
            text: text.into(),
            pressed: false,
            action: None,
        }
    }

    pub fn with_action(mut self, action: impl FnMut() + Send + 'static) -> Self {
        self.set_action(action);
        self
    }

    /// Replaces the current action.
    pub fn set_action(&mut self, action: impl FnMut() + Send + 'static) {
        self.action = Some(Box::new(action));
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Left button held, wherever the cursor is.
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    pub fn is_highlighted(&self) -> bool {
        self.ui.is_highlighted()
    }
}

impl EntityBehavior for Button {
    fn entity(&self) -> &Entity {
        &self.ui.entity
    }

    fn entity_mut(&mut self) -> &mut Entity {
        &mut self.ui.entity
    }

    fn update(&mut self, _dt: f64, input: &InputState) {
        self.ui.update_hover(input);
        let down = input.is_button_down(MouseButton::Left);
        let clicked = down && !self.pressed && self.ui.is_highlighted();
        self.pressed = down;
        if clicked {
            if let Some(action) = self.action.as_mut() {
                action();
            }
        }
    }

    fn render(&self, graphics: &mut Graphics<'_>) {
        self.ui.apply_font(graphics);
        let e = &self.ui.entity;
        let (x, y, w, h) = (e.x(), e.y(), e.width(), e.height());
        let arc = self.corner_rounding;

        graphics.set_color(self.ui.background);
        match (self.ui.is_highlighted(), self.pressed) {
            (true, true) => graphics.draw_round_rect(x + 1.0, y + 1.0, w - 2.0, h - 2.0, arc, arc),
            (true, false) => graphics.draw_round_rect(x - 1.0, y - 1.0, w + 2.0, h + 2.0, arc, arc),
            _ => graphics.draw_round_rect(x, y, w, h, arc, arc),
        }

        graphics.set_color(self.ui.foreground);
        graphics.draw_string_centered(&self.text, x, y, w, h);
    }
}

impl fmt::Debug for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Button")
            .field("ui", &self.ui)
            .field("text", &self.text)
            .field("pressed", &self.pressed)
            .field("has_action", &self.action.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::input::InputEvent;
    use crate::core::Color;
    use crate::display::{FrameBuffer, GraphicsState};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_button(clicks: &Arc<AtomicUsize>) -> Button {
        let clicks = Arc::clone(clicks);
        Button::new(10.0, 10.0, 20.0, 10.0, "ok").with_action(move || {
            clicks.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn action_fires_once_per_press_over_the_button() {
        let clicks = Arc::new(AtomicUsize::new(0));
        let mut button = counting_button(&clicks);
        let input = InputState::new();

        // pressed away from the button
        input.apply(InputEvent::ButtonPressed(MouseButton::Left));
        button.update(0.016, &input);
        assert!(button.is_pressed());
        assert!(!button.is_highlighted());
        input.apply(InputEvent::ButtonReleased(MouseButton::Left));
        button.update(0.016, &input);

        input.apply(InputEvent::CursorMoved { x: 15, y: 15 });
        button.update(0.016, &input);
        assert!(button.is_highlighted());
        assert_eq!(clicks.load(Ordering::SeqCst), 0);

        input.apply(InputEvent::ButtonPressed(MouseButton::Left));
        for _ in 0..5 {
            button.update(0.016, &input);
        }
        assert_eq!(clicks.load(Ordering::SeqCst), 1);

        input.apply(InputEvent::ButtonReleased(MouseButton::Left));
        button.update(0.016, &input);
        input.apply(InputEvent::ButtonPressed(MouseButton::Left));
        button.update(0.016, &input);
        assert_eq!(clicks.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn holding_the_button_while_moving_onto_it_does_not_click() {
        let clicks = Arc::new(AtomicUsize::new(0));
        let mut button = counting_button(&clicks);
        let input = InputState::new();

        input.apply(InputEvent::ButtonPressed(MouseButton::Left));
        button.update(0.016, &input);
        input.apply(InputEvent::CursorMoved { x: 15, y: 15 });
        button.update(0.016, &input);

        assert_eq!(clicks.load(Ordering::SeqCst), 0);
    }

    fn outline_row(button: &Button) -> Vec<usize> {
        let mut buffer = FrameBuffer::new(40, 30);
        let mut state = GraphicsState::new();
        button.render(&mut Graphics::new(&mut buffer, &mut state));
        (0..buffer.width)
            .filter(|&x| buffer.get_pixel(x as i32, 15) == Some(Color::RED.to_argb()))
            .collect()
    }

    #[test]
    fn outline_grows_on_hover_and_shrinks_on_press() {
        let input = InputState::new();
        let mut button = Button::new(10.0, 10.0, 20.0, 10.0, "");
        button.ui.background = Color::RED;

        assert_eq!(outline_row(&button), vec![10, 30]);

        input.apply(InputEvent::CursorMoved { x: 15, y: 15 });
        button.update(0.016, &input);
        assert_eq!(outline_row(&button), vec![9, 31]);

        input.apply(InputEvent::ButtonPressed(MouseButton::Left));
        button.update(0.016, &input);
        assert_eq!(outline_row(&button), vec![11, 29]);
    }
}
