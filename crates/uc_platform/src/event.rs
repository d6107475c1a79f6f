//! Native events as delivered by a backend
//!
//! The vocabulary follows X11: numbered pointer buttons, a modifier bit mask
//! and keysyms. Backends for other systems translate into it; the
//! application turns these into neutral events.

/// Pointer button numbers
pub mod button {
    pub const LEFT: u32 = 1;
    pub const MIDDLE: u32 = 2;
    pub const RIGHT: u32 = 3;
    pub const WHEEL_UP: u32 = 4;
    pub const WHEEL_DOWN: u32 = 5;
    pub const WHEEL_LEFT: u32 = 6;
    pub const WHEEL_RIGHT: u32 = 7;
    pub const BACK: u32 = 8;
    pub const FORWARD: u32 = 9;
}

/// Modifier state bits
pub mod mask {
    pub const SHIFT: u32 = 1 << 0;
    pub const LOCK: u32 = 1 << 1;
    pub const CONTROL: u32 = 1 << 2;
    /// Alt
    pub const MOD1: u32 = 1 << 3;
    /// Super / command
    pub const MOD4: u32 = 1 << 6;
    pub const BUTTON1: u32 = 1 << 8;
    pub const BUTTON2: u32 = 1 << 9;
    pub const BUTTON3: u32 = 1 << 10;
}

/// Payload of a native event
#[derive(Clone, Debug, PartialEq)]
pub enum NativeEventKind {
    ButtonPress {
        button: u32,
        x: i32,
        y: i32,
        root_x: i32,
        root_y: i32,
        state: u32,
    },
    ButtonRelease {
        button: u32,
        x: i32,
        y: i32,
        root_x: i32,
        root_y: i32,
        state: u32,
    },
    Motion {
        x: i32,
        y: i32,
        root_x: i32,
        root_y: i32,
        state: u32,
    },
    Enter {
        x: i32,
        y: i32,
    },
    Leave {
        x: i32,
        y: i32,
    },
    /// Smooth scrolling in wheel steps
    Scroll {
        x: i32,
        y: i32,
        dx: f32,
        dy: f32,
        state: u32,
    },
    KeyPress {
        /// Hardware code
        keycode: u32,
        keysym: u32,
        /// Characters produced, possibly empty
        text: String,
        state: u32,
    },
    KeyRelease {
        keycode: u32,
        keysym: u32,
        state: u32,
    },
    /// Committed input-method text
    TextCommit(String),
    Configure {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    },
    Expose {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    },
    FocusIn,
    FocusOut,
    Iconify,
    Deiconify,
    CloseRequested,
    /// External drag entered the window
    DndEnter {
        x: i32,
        y: i32,
    },
    DndPosition {
        x: i32,
        y: i32,
    },
    DndDrop {
        x: i32,
        y: i32,
        mime_type: String,
        data: Vec<u8>,
    },
    ClipboardChanged,
    /// Posted to break a blocking poll
    Wakeup,
}

/// A native event addressed to a window by native handle
#[derive(Clone, Debug, PartialEq)]
pub struct NativeEvent {
    /// Native handle of the target window; 0 for application-wide events
    pub window: u64,
    /// Backend timestamp in milliseconds
    pub time_ms: u64,
    pub kind: NativeEventKind,
}

impl NativeEvent {
    pub fn new(window: u64, kind: NativeEventKind) -> Self {
        Self {
            window,
            time_ms: 0,
            kind,
        }
    }

    pub fn at(mut self, time_ms: u64) -> Self {
        self.time_ms = time_ms;
        self
    }

    pub fn button_press(window: u64, button: u32, x: i32, y: i32) -> Self {
        Self::new(
            window,
            NativeEventKind::ButtonPress {
                button,
                x,
                y,
                root_x: x,
                root_y: y,
                state: 0,
            },
        )
    }

    pub fn button_release(window: u64, button: u32, x: i32, y: i32) -> Self {
        Self::new(
            window,
            NativeEventKind::ButtonRelease {
                button,
                x,
                y,
                root_x: x,
                root_y: y,
                state: 0,
            },
        )
    }

    pub fn motion(window: u64, x: i32, y: i32, state: u32) -> Self {
        Self::new(
            window,
            NativeEventKind::Motion {
                x,
                y,
                root_x: x,
                root_y: y,
                state,
            },
        )
    }

    pub fn key_press(window: u64, keysym: u32, text: impl Into<String>, state: u32) -> Self {
        Self::new(
            window,
            NativeEventKind::KeyPress {
                keycode: 0,
                keysym,
                text: text.into(),
                state,
            },
        )
    }

    pub fn key_release(window: u64, keysym: u32, state: u32) -> Self {
        Self::new(
            window,
            NativeEventKind::KeyRelease {
                keycode: 0,
                keysym,
                state,
            },
        )
    }
}
