//! Plain container element

use uc_core::{Color, RenderContext};

use crate::element::{Element, ElementCore};

/// Container with an optional background and border
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Panel {
    pub background: Option<Color>,
    pub border_color: Option<Color>,
    pub corner_radius: f32,
}

impl Panel {
    /// Draws nothing; children only
    pub fn transparent() -> Self {
        Self::default()
    }

    pub fn filled(background: Color) -> Self {
        Self {
            background: Some(background),
            ..Default::default()
        }
    }

    pub fn with_border(mut self, color: Color) -> Self {
        self.border_color = Some(color);
        self
    }

    pub fn with_corner_radius(mut self, radius: f32) -> Self {
        self.corner_radius = radius;
        self
    }
}

impl Element for Panel {
    fn render(&mut self, core: &ElementCore, ctx: &mut dyn RenderContext) {
        let rect = core.local_bounds().to_float();
        if let Some(background) = self.background {
            ctx.set_fill_color(background);
            if self.corner_radius > 0.0 {
                ctx.fill_rounded_rectangle(rect, self.corner_radius);
            } else {
                ctx.fill_rectangle(rect);
            }
        }
        let border = core.container().map_or(0.0, |c| c.border_width);
        if let (Some(color), true) = (self.border_color, border > 0.0) {
            ctx.set_stroke_color(color);
            ctx.set_stroke_width(border);
            let half = border / 2.0;
            let inner = uc_core::Rect2Df::new(
                rect.x + half,
                rect.y + half,
                (rect.width - border).max(0.0),
                (rect.height - border).max(0.0),
            );
            if self.corner_radius > 0.0 {
                ctx.draw_rounded_rectangle(inner, self.corner_radius);
            } else {
                ctx.draw_rectangle(inner);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ContainerData, ElementOptions};
    use uc_core::{DrawCommand, RecordingContext, Rect2Di};

    #[test]
    fn test_transparent_panel_draws_nothing() {
        let core = ElementCore::new(Rect2Di::new(0, 0, 10, 10), ElementOptions::default());
        let mut ctx = RecordingContext::new(20, 20);
        Panel::transparent().render(&core, &mut ctx);
        assert!(ctx.commands().is_empty());
    }

    #[test]
    fn test_border_inset_by_half_width() {
        let core = ElementCore::new(
            Rect2Di::new(5, 5, 40, 20),
            ElementOptions::default().container(ContainerData::new().with_border(2.0)),
        );
        let mut ctx = RecordingContext::new(100, 100);
        Panel::filled(Color::WHITE)
            .with_border(Color::BLACK)
            .render(&core, &mut ctx);
        let commands = ctx.commands();
        assert_eq!(commands.len(), 2);
        assert!(matches!(commands[0].command, DrawCommand::FillRect(_)));
        match &commands[1].command {
            DrawCommand::StrokeRect(rect) => {
                assert_eq!(*rect, uc_core::Rect2Df::new(1.0, 1.0, 38.0, 18.0));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
