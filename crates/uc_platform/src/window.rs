//! Window configuration, lifecycle states and the backend window contract

use uc_core::{Color, Rect2Di, WindowId};

use crate::error::{PlatformError, Result};

/// Largest accepted window width or height
pub const MAX_WINDOW_DIMENSION: i32 = 4096;

/// Position or size limit meaning "let the OS decide" / "unbounded"
pub const UNSET: i32 = -1;

/// Kind of top-level window
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum WindowType {
    #[default]
    Standard,
    Dialog,
    Popup,
    Tool,
    Splash,
    Fullscreen,
    Borderless,
    Overlay,
}

impl WindowType {
    /// Whether the OS draws a title bar and borders
    pub fn has_decorations(self) -> bool {
        matches!(self, WindowType::Standard | WindowType::Dialog | WindowType::Tool)
    }
}

/// Window configuration
///
/// Fixed once the window is created; the window API changes the live
/// size, position and title.
#[derive(Clone, Debug, PartialEq)]
pub struct WindowConfig {
    /// Window title
    pub title: String,
    /// Initial width in pixels, 1..=4096
    pub width: i32,
    /// Initial height in pixels, 1..=4096
    pub height: i32,
    /// Initial position; -1 lets the OS choose
    pub x: i32,
    pub y: i32,
    pub window_type: WindowType,
    pub resizable: bool,
    pub minimizable: bool,
    pub maximizable: bool,
    pub closable: bool,
    pub always_on_top: bool,
    pub background: Color,
    /// Size limits; -1 is unbounded
    pub min_width: i32,
    pub min_height: i32,
    pub max_width: i32,
    pub max_height: i32,
    /// Window opacity in [0, 1]
    pub opacity: f32,
    pub parent: Option<WindowId>,
    pub modal: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "UltraCanvas Window".to_string(),
            width: 800,
            height: 600,
            x: UNSET,
            y: UNSET,
            window_type: WindowType::Standard,
            resizable: true,
            minimizable: true,
            maximizable: true,
            closable: true,
            always_on_top: false,
            background: Color::WHITE,
            min_width: UNSET,
            min_height: UNSET,
            max_width: UNSET,
            max_height: UNSET,
            opacity: 1.0,
            parent: None,
            modal: false,
        }
    }
}

impl WindowConfig {
    /// Create a new window configuration with a title
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: i32, height: i32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn position(mut self, x: i32, y: i32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn window_type(mut self, window_type: WindowType) -> Self {
        self.window_type = window_type;
        self
    }

    pub fn resizable(mut self, resizable: bool) -> Self {
        self.resizable = resizable;
        self
    }

    pub fn minimizable(mut self, minimizable: bool) -> Self {
        self.minimizable = minimizable;
        self
    }

    pub fn maximizable(mut self, maximizable: bool) -> Self {
        self.maximizable = maximizable;
        self
    }

    pub fn closable(mut self, closable: bool) -> Self {
        self.closable = closable;
        self
    }

    pub fn always_on_top(mut self, always_on_top: bool) -> Self {
        self.always_on_top = always_on_top;
        self
    }

    pub fn background(mut self, color: Color) -> Self {
        self.background = color;
        self
    }

    pub fn min_size(mut self, width: i32, height: i32) -> Self {
        self.min_width = width;
        self.min_height = height;
        self
    }

    pub fn max_size(mut self, width: i32, height: i32) -> Self {
        self.max_width = width;
        self.max_height = height;
        self
    }

    pub fn opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn parent(mut self, parent: WindowId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn modal(mut self, modal: bool) -> Self {
        self.modal = modal;
        self
    }

    /// Check every field against its allowed range
    pub fn validate(&self) -> Result<()> {
        let dimension = |name: &str, value: i32| {
            if (1..=MAX_WINDOW_DIMENSION).contains(&value) {
                Ok(())
            } else {
                Err(PlatformError::InvalidConfig(format!(
                    "{} {} outside 1..={}",
                    name, value, MAX_WINDOW_DIMENSION
                )))
            }
        };
        dimension("width", self.width)?;
        dimension("height", self.height)?;

        let limit = |name: &str, value: i32| {
            if value == UNSET || value > 0 {
                Ok(())
            } else {
                Err(PlatformError::InvalidConfig(format!(
                    "{} must be positive or -1, got {}",
                    name, value
                )))
            }
        };
        limit("min_width", self.min_width)?;
        limit("min_height", self.min_height)?;
        limit("max_width", self.max_width)?;
        limit("max_height", self.max_height)?;

        if self.min_width != UNSET && self.max_width != UNSET && self.min_width > self.max_width {
            return Err(PlatformError::InvalidConfig(
                "min_width exceeds max_width".to_string(),
            ));
        }
        if self.min_height != UNSET && self.max_height != UNSET && self.min_height > self.max_height
        {
            return Err(PlatformError::InvalidConfig(
                "min_height exceeds max_height".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(PlatformError::InvalidConfig(format!(
                "opacity {} outside [0, 1]",
                self.opacity
            )));
        }
        Ok(())
    }

    /// Apply the min/max limits and the global maximum to a requested size
    pub fn clamp_size(&self, width: i32, height: i32) -> (i32, i32) {
        let clamp = |value: i32, min: i32, max: i32| {
            let mut v = value.clamp(1, MAX_WINDOW_DIMENSION);
            if min != UNSET {
                v = v.max(min);
            }
            if max != UNSET {
                v = v.min(max);
            }
            v
        };
        (
            clamp(width, self.min_width, self.max_width),
            clamp(height, self.min_height, self.max_height),
        )
    }
}

/// Window lifecycle state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum WindowState {
    #[default]
    Normal,
    Minimized,
    Maximized,
    Fullscreen,
    Hidden,
    /// Terminal; destruction follows
    Closing,
}

impl WindowState {
    pub fn can_transition_to(self, next: WindowState) -> bool {
        use WindowState::*;
        match (self, next) {
            (Closing, _) => false,
            (_, Closing) => true,
            (a, b) if a == b => true,
            (Normal, _) => true,
            // a hidden window is shown before anything else
            (Hidden, Normal) => true,
            (Hidden, _) => false,
            (_, Normal) | (_, Hidden) => true,
            (Minimized, Maximized) | (Maximized, Minimized) => true,
            (Maximized, Fullscreen) | (Fullscreen, Maximized) => true,
            _ => false,
        }
    }

    pub fn is_visible(self) -> bool {
        matches!(
            self,
            WindowState::Normal | WindowState::Maximized | WindowState::Fullscreen
        )
    }
}

/// Cursor icons
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Cursor {
    /// Default arrow cursor
    #[default]
    Default,
    /// Pointer/hand cursor (for clickable elements)
    Pointer,
    /// Text/I-beam cursor (for text input)
    Text,
    Crosshair,
    Move,
    NotAllowed,
    /// North-South resize cursor
    ResizeNS,
    /// East-West resize cursor
    ResizeEW,
    ResizeNESW,
    ResizeNWSE,
    /// Open hand
    Grab,
    /// Closed hand
    Grabbing,
    Wait,
    Progress,
    /// Hidden cursor
    None,
}

/// Native window operations the core relies on
///
/// Calls after `close` are ignored by implementations.
pub trait BackendWindow: Send {
    /// Handle used to route native events back to this window
    fn native_handle(&self) -> u64;

    fn show(&mut self);

    fn hide(&mut self);

    fn close(&mut self);

    fn minimize(&mut self);

    fn maximize(&mut self);

    fn restore(&mut self);

    fn set_fullscreen(&mut self, fullscreen: bool);

    fn set_title(&mut self, title: &str);

    fn set_position(&mut self, x: i32, y: i32);

    fn set_size(&mut self, width: i32, height: i32);

    fn set_resizable(&mut self, resizable: bool);

    /// Ask for an expose of `rect`, or the whole window
    fn invalidate(&mut self, rect: Option<Rect2Di>);

    /// Present the rendered frame
    fn swap_buffers(&mut self);

    /// Route all pointer events to this window; false if refused
    fn grab_pointer(&mut self) -> bool;

    fn ungrab_pointer(&mut self);

    fn set_cursor(&mut self, cursor: Cursor);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(WindowConfig::default().validate().is_ok());
        assert!(WindowConfig::new("Editor")
            .size(4096, 1)
            .min_size(1, UNSET)
            .opacity(0.0)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_config_range_checks() {
        let bad = [
            WindowConfig::default().size(0, 100),
            WindowConfig::default().size(100, 4097),
            WindowConfig::default().opacity(1.5),
            WindowConfig::default().min_size(0, UNSET),
            WindowConfig::default().min_size(500, UNSET).max_size(400, UNSET),
        ];
        for config in bad {
            assert!(
                matches!(config.validate(), Err(PlatformError::InvalidConfig(_))),
                "{:?} should be rejected",
                config
            );
        }
    }

    #[test]
    fn test_clamp_size_respects_limits() {
        let config = WindowConfig::default()
            .min_size(200, UNSET)
            .max_size(UNSET, 300);
        assert_eq!(config.clamp_size(100, 1000), (200, 300));
        assert_eq!(config.clamp_size(9000, -5), (4096, 1));
    }

    #[test]
    fn test_closing_is_terminal() {
        for state in [
            WindowState::Normal,
            WindowState::Minimized,
            WindowState::Maximized,
            WindowState::Fullscreen,
            WindowState::Hidden,
        ] {
            assert!(WindowState::Normal.can_transition_to(state));
            assert!(state.can_transition_to(WindowState::Closing));
            assert!(!WindowState::Closing.can_transition_to(state));
        }
        assert!(!WindowState::Hidden.can_transition_to(WindowState::Maximized));
        assert!(WindowState::Minimized.can_transition_to(WindowState::Normal));
    }
}
