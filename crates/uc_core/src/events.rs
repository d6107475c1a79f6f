//! Neutral event record
//!
//! Backends translate native input into [`UcEvent`] values. Events are plain
//! cloneable data; positions are window-relative unless a handler has mapped
//! them into element coordinates.

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::geometry::Point2Di;

/// Identifier of a top-level window
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(pub u64);

impl WindowId {
    /// Allocate a process-unique id
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        WindowId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Event type enumeration
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EventType {
    // Mouse
    MouseDown,
    MouseUp,
    MouseMove,
    MouseEnter,
    MouseLeave,
    MouseWheel,
    MouseWheelHorizontal,
    MouseDoubleClick,
    MouseDrag,
    DragStart,
    DragEnd,

    // Keyboard
    KeyDown,
    KeyUp,
    KeyChar,
    TextInput,
    Shortcut,

    // Window
    WindowResize,
    WindowMove,
    WindowClose,
    WindowMinimize,
    WindowFocus,
    WindowBlur,
    WindowRepaint,

    // Focus
    FocusGained,
    FocusLost,

    // Drag and drop
    DragEnter,
    DragOver,
    Drop,

    // Peripheral
    Clipboard,
    Selection,
    Timer,
    Custom,
    #[default]
    Unknown,
}

impl EventType {
    /// Events carrying a pointer position
    pub fn is_mouse(self) -> bool {
        matches!(
            self,
            EventType::MouseDown
                | EventType::MouseUp
                | EventType::MouseMove
                | EventType::MouseEnter
                | EventType::MouseLeave
                | EventType::MouseWheel
                | EventType::MouseWheelHorizontal
                | EventType::MouseDoubleClick
                | EventType::MouseDrag
                | EventType::DragStart
                | EventType::DragEnd
                | EventType::DragEnter
                | EventType::DragOver
                | EventType::Drop
        )
    }

    pub fn is_keyboard(self) -> bool {
        matches!(
            self,
            EventType::KeyDown
                | EventType::KeyUp
                | EventType::KeyChar
                | EventType::TextInput
                | EventType::Shortcut
        )
    }

    pub fn is_window(self) -> bool {
        matches!(
            self,
            EventType::WindowResize
                | EventType::WindowMove
                | EventType::WindowClose
                | EventType::WindowMinimize
                | EventType::WindowFocus
                | EventType::WindowBlur
                | EventType::WindowRepaint
        )
    }

    pub fn is_wheel(self) -> bool {
        matches!(self, EventType::MouseWheel | EventType::MouseWheelHorizontal)
    }
}

/// Mouse buttons
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MouseButton {
    #[default]
    None,
    Left,
    Middle,
    Right,
    /// Back side button
    X1,
    /// Forward side button
    X2,
}

/// Modifier key state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    /// Command on macOS, Windows key on Windows
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub fn is_empty(&self) -> bool {
        !self.shift && !self.ctrl && !self.alt && !self.meta
    }

    /// Ctrl, alt or meta held (shortcut candidates)
    pub fn has_command(&self) -> bool {
        self.ctrl || self.alt || self.meta
    }
}

/// Key code aligned with X11 keysym values
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyCode(pub u32);

impl KeyCode {
    pub const UNKNOWN: KeyCode = KeyCode(0);

    // ASCII range maps to itself (lowercase letters)
    pub const SPACE: KeyCode = KeyCode(0x0020);
    pub const DIGIT_0: KeyCode = KeyCode(0x0030);
    pub const DIGIT_9: KeyCode = KeyCode(0x0039);
    pub const A: KeyCode = KeyCode(0x0061);
    pub const C: KeyCode = KeyCode(0x0063);
    pub const V: KeyCode = KeyCode(0x0076);
    pub const X: KeyCode = KeyCode(0x0078);
    pub const Z: KeyCode = KeyCode(0x007a);

    // Editing
    pub const BACKSPACE: KeyCode = KeyCode(0xff08);
    pub const TAB: KeyCode = KeyCode(0xff09);
    pub const RETURN: KeyCode = KeyCode(0xff0d);
    pub const PAUSE: KeyCode = KeyCode(0xff13);
    pub const SCROLL_LOCK: KeyCode = KeyCode(0xff14);
    pub const ESCAPE: KeyCode = KeyCode(0xff1b);
    pub const DELETE: KeyCode = KeyCode(0xffff);
    pub const INSERT: KeyCode = KeyCode(0xff63);
    pub const PRINT: KeyCode = KeyCode(0xff61);
    pub const MENU: KeyCode = KeyCode(0xff67);

    // Navigation
    pub const HOME: KeyCode = KeyCode(0xff50);
    pub const LEFT: KeyCode = KeyCode(0xff51);
    pub const UP: KeyCode = KeyCode(0xff52);
    pub const RIGHT: KeyCode = KeyCode(0xff53);
    pub const DOWN: KeyCode = KeyCode(0xff54);
    pub const PAGE_UP: KeyCode = KeyCode(0xff55);
    pub const PAGE_DOWN: KeyCode = KeyCode(0xff56);
    pub const END: KeyCode = KeyCode(0xff57);

    // Numpad
    pub const NUM_LOCK: KeyCode = KeyCode(0xff7f);
    pub const KP_ENTER: KeyCode = KeyCode(0xff8d);
    pub const KP_MULTIPLY: KeyCode = KeyCode(0xffaa);
    pub const KP_ADD: KeyCode = KeyCode(0xffab);
    pub const KP_SUBTRACT: KeyCode = KeyCode(0xffad);
    pub const KP_DECIMAL: KeyCode = KeyCode(0xffae);
    pub const KP_DIVIDE: KeyCode = KeyCode(0xffaf);
    pub const KP_0: KeyCode = KeyCode(0xffb0);
    pub const KP_9: KeyCode = KeyCode(0xffb9);

    // Function keys F1 to F24 are contiguous
    pub const F1: KeyCode = KeyCode(0xffbe);
    pub const F12: KeyCode = KeyCode(0xffc9);
    pub const F24: KeyCode = KeyCode(0xffd5);

    // Modifiers
    pub const SHIFT_L: KeyCode = KeyCode(0xffe1);
    pub const SHIFT_R: KeyCode = KeyCode(0xffe2);
    pub const CONTROL_L: KeyCode = KeyCode(0xffe3);
    pub const CONTROL_R: KeyCode = KeyCode(0xffe4);
    pub const CAPS_LOCK: KeyCode = KeyCode(0xffe5);
    pub const META_L: KeyCode = KeyCode(0xffe7);
    pub const META_R: KeyCode = KeyCode(0xffe8);
    pub const ALT_L: KeyCode = KeyCode(0xffe9);
    pub const ALT_R: KeyCode = KeyCode(0xffea);
    pub const SUPER_L: KeyCode = KeyCode(0xffeb);
    pub const SUPER_R: KeyCode = KeyCode(0xffec);

    // Media (XF86)
    pub const AUDIO_LOWER_VOLUME: KeyCode = KeyCode(0x1008ff11);
    pub const AUDIO_MUTE: KeyCode = KeyCode(0x1008ff12);
    pub const AUDIO_RAISE_VOLUME: KeyCode = KeyCode(0x1008ff13);
    pub const AUDIO_PLAY: KeyCode = KeyCode(0x1008ff14);
    pub const AUDIO_STOP: KeyCode = KeyCode(0x1008ff15);
    pub const AUDIO_PREV: KeyCode = KeyCode(0x1008ff16);
    pub const AUDIO_NEXT: KeyCode = KeyCode(0x1008ff17);
    pub const AUDIO_PAUSE: KeyCode = KeyCode(0x1008ff31);

    // Browser (XF86)
    pub const BROWSER_HOME: KeyCode = KeyCode(0x1008ff18);
    pub const BROWSER_SEARCH: KeyCode = KeyCode(0x1008ff1b);
    pub const BROWSER_BACK: KeyCode = KeyCode(0x1008ff26);
    pub const BROWSER_FORWARD: KeyCode = KeyCode(0x1008ff27);
    pub const BROWSER_STOP: KeyCode = KeyCode(0x1008ff28);
    pub const BROWSER_REFRESH: KeyCode = KeyCode(0x1008ff29);
    pub const BROWSER_FAVORITES: KeyCode = KeyCode(0x1008ff30);

    /// Function key `F<n>` for n in 1..=24
    pub fn function(n: u8) -> Option<KeyCode> {
        (1..=24)
            .contains(&n)
            .then(|| KeyCode(Self::F1.0 + n as u32 - 1))
    }

    /// Key code for an ASCII character (letters fold to lowercase)
    pub fn from_char(c: char) -> Option<KeyCode> {
        c.is_ascii()
            .then(|| KeyCode(c.to_ascii_lowercase() as u32))
    }

    /// Printable ASCII character for this key, if any
    pub fn to_char(self) -> Option<char> {
        (0x20..0x7f)
            .contains(&self.0)
            .then(|| char::from_u32(self.0))
            .flatten()
    }

    pub fn is_function(self) -> bool {
        (Self::F1.0..=Self::F24.0).contains(&self.0)
    }

    pub fn is_modifier(self) -> bool {
        (Self::SHIFT_L.0..=Self::SUPER_R.0).contains(&self.0)
    }

    pub fn is_navigation(self) -> bool {
        (Self::HOME.0..=Self::END.0).contains(&self.0)
    }

    pub fn is_numpad(self) -> bool {
        self == Self::NUM_LOCK || (Self::KP_ENTER.0..=Self::KP_9.0).contains(&self.0)
    }
}

/// Payload carried by drag-and-drop events
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DragDropData {
    pub mime_type: String,
    pub text: String,
    pub bytes: Vec<u8>,
    pub file_path: Option<String>,
}

impl DragDropData {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            mime_type: "text/plain".to_string(),
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn file(path: impl Into<String>) -> Self {
        Self {
            mime_type: "text/uri-list".to_string(),
            file_path: Some(path.into()),
            ..Default::default()
        }
    }
}

/// Opaque application payload attached to custom events
#[derive(Clone)]
pub struct UserPayload(pub Arc<dyn Any + Send + Sync>);

impl UserPayload {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        UserPayload(Arc::new(value))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl fmt::Debug for UserPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("UserPayload(..)")
    }
}

/// Neutral event record
#[derive(Clone, Debug)]
pub struct UcEvent {
    pub event_type: EventType,
    /// Position in the receiver's coordinate space
    pub x: i32,
    pub y: i32,
    /// Position on screen
    pub global_x: i32,
    pub global_y: i32,
    pub button: MouseButton,
    /// Wheel steps, positive away from the user / to the right
    pub wheel_delta: i32,
    /// Motion since the previous move (drag events)
    pub delta_x: i32,
    pub delta_y: i32,
    /// Size carried by resize events
    pub width: i32,
    pub height: i32,
    /// Backend key code before translation
    pub native_key_code: u32,
    pub key: KeyCode,
    pub character: Option<char>,
    /// Composed text for text input events
    pub text: String,
    pub modifiers: Modifiers,
    pub timestamp: Instant,
    pub drag_data: Option<DragDropData>,
    /// Set on `DragEnd` when no target accepted the drop
    pub drag_canceled: bool,
    /// Timer id for `Timer` events
    pub timer_id: u64,
    pub target_window: Option<WindowId>,
    pub native_window: u64,
    pub user_data: Option<UserPayload>,
}

impl Default for UcEvent {
    fn default() -> Self {
        Self {
            event_type: EventType::Unknown,
            x: 0,
            y: 0,
            global_x: 0,
            global_y: 0,
            button: MouseButton::None,
            wheel_delta: 0,
            delta_x: 0,
            delta_y: 0,
            width: 0,
            height: 0,
            native_key_code: 0,
            key: KeyCode::UNKNOWN,
            character: None,
            text: String::new(),
            modifiers: Modifiers::NONE,
            timestamp: Instant::now(),
            drag_data: None,
            drag_canceled: false,
            timer_id: 0,
            target_window: None,
            native_window: 0,
            user_data: None,
        }
    }
}

impl UcEvent {
    pub fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            ..Default::default()
        }
    }

    /// Mouse event at a window-relative position
    pub fn mouse(event_type: EventType, x: i32, y: i32, button: MouseButton) -> Self {
        Self {
            event_type,
            x,
            y,
            global_x: x,
            global_y: y,
            button,
            ..Default::default()
        }
    }

    pub fn key(event_type: EventType, key: KeyCode, modifiers: Modifiers) -> Self {
        Self {
            event_type,
            key,
            native_key_code: key.0,
            character: key.to_char(),
            modifiers,
            ..Default::default()
        }
    }

    pub fn text_input(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            event_type: EventType::TextInput,
            character: text.chars().next(),
            text,
            ..Default::default()
        }
    }

    pub fn resize(width: i32, height: i32) -> Self {
        Self {
            event_type: EventType::WindowResize,
            width,
            height,
            ..Default::default()
        }
    }

    pub fn timer(timer_id: u64) -> Self {
        Self {
            event_type: EventType::Timer,
            timer_id,
            ..Default::default()
        }
    }

    pub fn custom(payload: UserPayload) -> Self {
        Self {
            event_type: EventType::Custom,
            user_data: Some(payload),
            ..Default::default()
        }
    }

    pub fn position(&self) -> Point2Di {
        Point2Di::new(self.x, self.y)
    }

    pub fn is_mouse(&self) -> bool {
        self.event_type.is_mouse()
    }

    pub fn is_keyboard(&self) -> bool {
        self.event_type.is_keyboard()
    }

    /// Copy with the position shifted into another coordinate space
    pub fn with_offset(&self, dx: i32, dy: i32) -> Self {
        let mut event = self.clone();
        event.x += dx;
        event.y += dy;
        event
    }

    /// Copy with a different type, keeping position and modifiers
    pub fn retyped(&self, event_type: EventType) -> Self {
        let mut event = self.clone();
        event.event_type = event_type;
        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_categories() {
        assert!(EventType::MouseDown.is_mouse());
        assert!(EventType::Drop.is_mouse());
        assert!(!EventType::KeyDown.is_mouse());
        assert!(EventType::TextInput.is_keyboard());
        assert!(EventType::WindowResize.is_window());
        assert!(!EventType::Timer.is_window());
    }

    #[test]
    fn test_key_codes_match_x11_keysyms() {
        assert_eq!(KeyCode::ESCAPE.0, 0xff1b);
        assert_eq!(KeyCode::function(1), Some(KeyCode::F1));
        assert_eq!(KeyCode::function(12), Some(KeyCode::F12));
        assert_eq!(KeyCode::function(24), Some(KeyCode::F24));
        assert_eq!(KeyCode::function(25), None);
        assert_eq!(KeyCode::from_char('A'), Some(KeyCode::A));
        assert_eq!(KeyCode::A.to_char(), Some('a'));
        assert!(KeyCode::SHIFT_L.is_modifier());
        assert!(KeyCode::PAGE_DOWN.is_navigation());
        assert!(KeyCode(0xffb5).is_numpad());
        assert!(!KeyCode::F1.is_numpad());
    }

    #[test]
    fn test_user_payload_downcast() {
        let event = UcEvent::custom(UserPayload::new(42u32));
        let payload = event.user_data.as_ref().unwrap();
        assert_eq!(payload.downcast_ref::<u32>(), Some(&42));
        assert_eq!(payload.downcast_ref::<i64>(), None);
    }

    #[test]
    fn test_window_ids_are_unique() {
        let a = WindowId::next();
        let b = WindowId::next();
        assert_ne!(a, b);
    }

    #[test]
    fn test_with_offset() {
        let event = UcEvent::mouse(EventType::MouseMove, 10, 20, MouseButton::None);
        let local = event.with_offset(-5, -5);
        assert_eq!(local.position(), Point2Di::new(5, 15));
        assert_eq!(local.global_x, 10);
    }
}
