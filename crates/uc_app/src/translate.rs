//! Native event translation
//!
//! Turns backend [`NativeEvent`]s into neutral [`UcEvent`]s. One native event
//! may yield several neutral ones (a configure both moves and resizes) or
//! none (wheel button releases, wakeups).

use uc_core::{DragDropData, EventType, KeyCode, Modifiers, MouseButton, UcEvent};
use uc_platform::{button, mask, NativeEvent, NativeEventKind};

/// Map an X11-style button number to a mouse button
pub fn mouse_button(number: u32) -> MouseButton {
    match number {
        button::LEFT => MouseButton::Left,
        button::MIDDLE => MouseButton::Middle,
        button::RIGHT => MouseButton::Right,
        button::BACK => MouseButton::X1,
        button::FORWARD => MouseButton::X2,
        _ => MouseButton::None,
    }
}

pub fn modifiers(state: u32) -> Modifiers {
    Modifiers {
        shift: state & mask::SHIFT != 0,
        ctrl: state & mask::CONTROL != 0,
        alt: state & mask::MOD1 != 0,
        meta: state & mask::MOD4 != 0,
    }
}

/// Button held during a motion, from the state mask
fn held_button(state: u32) -> MouseButton {
    if state & mask::BUTTON1 != 0 {
        MouseButton::Left
    } else if state & mask::BUTTON2 != 0 {
        MouseButton::Middle
    } else if state & mask::BUTTON3 != 0 {
        MouseButton::Right
    } else {
        MouseButton::None
    }
}

fn is_wheel_button(number: u32) -> bool {
    (button::WHEEL_UP..=button::WHEEL_RIGHT).contains(&number)
}

fn wheel_event(number: u32, x: i32, y: i32, state: u32) -> UcEvent {
    let (kind, delta) = match number {
        button::WHEEL_UP => (EventType::MouseWheel, 1),
        button::WHEEL_DOWN => (EventType::MouseWheel, -1),
        button::WHEEL_LEFT => (EventType::MouseWheelHorizontal, -1),
        _ => (EventType::MouseWheelHorizontal, 1),
    };
    let mut event = UcEvent::mouse(kind, x, y, MouseButton::None);
    event.wheel_delta = delta;
    event.modifiers = modifiers(state);
    event
}

fn pointer(kind: EventType, x: i32, y: i32, root: (i32, i32), button: MouseButton, state: u32) -> UcEvent {
    let mut event = UcEvent::mouse(kind, x, y, button);
    event.global_x = root.0;
    event.global_y = root.1;
    event.modifiers = modifiers(state);
    event
}

fn drop_payload(mime_type: &str, data: &[u8]) -> DragDropData {
    let text = String::from_utf8_lossy(data).into_owned();
    if mime_type == "text/uri-list" {
        let first = text
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty() && !line.starts_with('#'))
            .unwrap_or_default();
        let path = first.strip_prefix("file://").unwrap_or(first);
        let mut payload = DragDropData::file(path);
        payload.text = text;
        payload.bytes = data.to_vec();
        return payload;
    }
    DragDropData {
        mime_type: mime_type.to_string(),
        text: if mime_type.starts_with("text/") {
            text
        } else {
            String::new()
        },
        bytes: data.to_vec(),
        file_path: None,
    }
}

/// Translate one native event
pub fn translate(native: &NativeEvent) -> Vec<UcEvent> {
    let mut events = match &native.kind {
        NativeEventKind::ButtonPress {
            button,
            x,
            y,
            root_x,
            root_y,
            state,
        } => {
            if is_wheel_button(*button) {
                vec![wheel_event(*button, *x, *y, *state)]
            } else {
                vec![pointer(
                    EventType::MouseDown,
                    *x,
                    *y,
                    (*root_x, *root_y),
                    mouse_button(*button),
                    *state,
                )]
            }
        }
        NativeEventKind::ButtonRelease {
            button,
            x,
            y,
            root_x,
            root_y,
            state,
        } => {
            if is_wheel_button(*button) {
                Vec::new()
            } else {
                vec![pointer(
                    EventType::MouseUp,
                    *x,
                    *y,
                    (*root_x, *root_y),
                    mouse_button(*button),
                    *state,
                )]
            }
        }
        NativeEventKind::Motion {
            x,
            y,
            root_x,
            root_y,
            state,
        } => vec![pointer(
            EventType::MouseMove,
            *x,
            *y,
            (*root_x, *root_y),
            held_button(*state),
            *state,
        )],
        NativeEventKind::Enter { x, y } => {
            vec![UcEvent::mouse(EventType::MouseEnter, *x, *y, MouseButton::None)]
        }
        NativeEventKind::Leave { x, y } => {
            vec![UcEvent::mouse(EventType::MouseLeave, *x, *y, MouseButton::None)]
        }
        NativeEventKind::Scroll { x, y, dx, dy, state } => {
            let mut out = Vec::new();
            // positive dy scrolls toward the user
            let vertical = (-dy).round() as i32;
            if vertical != 0 {
                let mut event = UcEvent::mouse(EventType::MouseWheel, *x, *y, MouseButton::None);
                event.wheel_delta = vertical;
                event.modifiers = modifiers(*state);
                out.push(event);
            }
            let horizontal = dx.round() as i32;
            if horizontal != 0 {
                let mut event =
                    UcEvent::mouse(EventType::MouseWheelHorizontal, *x, *y, MouseButton::None);
                event.wheel_delta = horizontal;
                event.modifiers = modifiers(*state);
                out.push(event);
            }
            out
        }
        NativeEventKind::KeyPress {
            keycode,
            keysym,
            text,
            state,
        } => {
            let mut event = UcEvent::key(EventType::KeyDown, KeyCode(*keysym), modifiers(*state));
            event.native_key_code = *keycode;
            if !text.is_empty() {
                event.text = text.clone();
                event.character = text.chars().next();
            }
            vec![event]
        }
        NativeEventKind::KeyRelease {
            keycode,
            keysym,
            state,
        } => {
            let mut event = UcEvent::key(EventType::KeyUp, KeyCode(*keysym), modifiers(*state));
            event.native_key_code = *keycode;
            vec![event]
        }
        NativeEventKind::TextCommit(text) => vec![UcEvent::text_input(text.clone())],
        NativeEventKind::Configure {
            x,
            y,
            width,
            height,
        } => {
            let mut moved = UcEvent::new(EventType::WindowMove);
            moved.x = *x;
            moved.y = *y;
            vec![moved, UcEvent::resize(*width, *height)]
        }
        NativeEventKind::Expose {
            x,
            y,
            width,
            height,
        } => {
            let mut event = UcEvent::new(EventType::WindowRepaint);
            event.x = *x;
            event.y = *y;
            event.width = *width;
            event.height = *height;
            vec![event]
        }
        NativeEventKind::FocusIn => vec![UcEvent::new(EventType::WindowFocus)],
        NativeEventKind::FocusOut => vec![UcEvent::new(EventType::WindowBlur)],
        NativeEventKind::Iconify => vec![UcEvent::new(EventType::WindowMinimize)],
        // restored windows are synced by the application, then repainted
        NativeEventKind::Deiconify => vec![UcEvent::new(EventType::WindowRepaint)],
        NativeEventKind::CloseRequested => vec![UcEvent::new(EventType::WindowClose)],
        NativeEventKind::DndEnter { x, y } => {
            vec![UcEvent::mouse(EventType::DragEnter, *x, *y, MouseButton::None)]
        }
        NativeEventKind::DndPosition { x, y } => {
            vec![UcEvent::mouse(EventType::DragOver, *x, *y, MouseButton::None)]
        }
        NativeEventKind::DndDrop {
            x,
            y,
            mime_type,
            data,
        } => {
            let mut event = UcEvent::mouse(EventType::Drop, *x, *y, MouseButton::None);
            event.drag_data = Some(drop_payload(mime_type, data));
            vec![event]
        }
        NativeEventKind::ClipboardChanged => vec![UcEvent::new(EventType::Clipboard)],
        NativeEventKind::Wakeup => Vec::new(),
    };
    for event in &mut events {
        event.native_window = native.window;
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_press_and_wheel() {
        let press = translate(&NativeEvent::button_press(7, button::RIGHT, 10, 20));
        assert_eq!(press.len(), 1);
        assert_eq!(press[0].event_type, EventType::MouseDown);
        assert_eq!(press[0].button, MouseButton::Right);
        assert_eq!(press[0].native_window, 7);

        let wheel = translate(&NativeEvent::button_press(7, button::WHEEL_DOWN, 1, 1));
        assert_eq!(wheel[0].event_type, EventType::MouseWheel);
        assert_eq!(wheel[0].wheel_delta, -1);
        assert!(translate(&NativeEvent::button_release(7, button::WHEEL_DOWN, 1, 1)).is_empty());
    }

    #[test]
    fn test_motion_carries_held_button_and_modifiers() {
        let motion = translate(&NativeEvent::motion(1, 5, 6, mask::BUTTON1 | mask::SHIFT));
        assert_eq!(motion[0].button, MouseButton::Left);
        assert!(motion[0].modifiers.shift);
        assert!(!motion[0].modifiers.ctrl);
    }

    #[test]
    fn test_key_press_keeps_keysym_and_text() {
        let key = translate(&NativeEvent::key_press(1, KeyCode::A.0, "a", mask::CONTROL));
        assert_eq!(key[0].event_type, EventType::KeyDown);
        assert_eq!(key[0].key, KeyCode::A);
        assert_eq!(key[0].text, "a");
        assert!(key[0].modifiers.ctrl);
    }

    #[test]
    fn test_configure_moves_and_resizes() {
        let events = translate(&NativeEvent::new(
            1,
            NativeEventKind::Configure {
                x: 10,
                y: 20,
                width: 640,
                height: 480,
            },
        ));
        let kinds: Vec<_> = events.iter().map(|e| e.event_type).collect();
        assert_eq!(kinds, vec![EventType::WindowMove, EventType::WindowResize]);
        assert_eq!((events[1].width, events[1].height), (640, 480));
    }

    #[test]
    fn test_file_drop_payload() {
        let events = translate(&NativeEvent::new(
            1,
            NativeEventKind::DndDrop {
                x: 3,
                y: 4,
                mime_type: "text/uri-list".to_string(),
                data: b"file:///tmp/photo.png\r\n".to_vec(),
            },
        ));
        let data = events[0].drag_data.as_ref().unwrap();
        assert_eq!(data.file_path.as_deref(), Some("/tmp/photo.png"));
        assert_eq!(events[0].event_type, EventType::Drop);
    }

    #[test]
    fn test_smooth_scroll_splits_axes() {
        let events = translate(&NativeEvent::new(
            1,
            NativeEventKind::Scroll {
                x: 0,
                y: 0,
                dx: 1.0,
                dy: 2.0,
                state: 0,
            },
        ));
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].wheel_delta, -2);
        assert_eq!(events[1].event_type, EventType::MouseWheelHorizontal);
    }
}
