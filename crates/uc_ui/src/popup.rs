//! Popup stack
//!
//! Popups are detached element roots positioned in window coordinates. They
//! are painted after the main tree and hit-tested before it, topmost first.

use crate::element::ElementId;

/// Open popups, bottom to top
#[derive(Clone, Debug, Default)]
pub struct PopupStack {
    stack: Vec<ElementId>,
    /// Opened since the last frame; their background is snapshotted
    opened: Vec<ElementId>,
    /// Closed since the last frame; their snapshot is restored
    closed: Vec<ElementId>,
}

impl PopupStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a popup on top; reopening moves it to the top
    pub fn open(&mut self, popup: ElementId) {
        let reopened = self.remove(popup);
        self.stack.push(popup);
        if !reopened {
            self.closed.retain(|&p| p != popup);
            self.opened.push(popup);
        }
    }

    /// Remove a popup; false if it was not open
    pub fn close(&mut self, popup: ElementId) -> bool {
        if !self.remove(popup) {
            return false;
        }
        if self.opened.contains(&popup) {
            // never painted, nothing to restore
            self.opened.retain(|&p| p != popup);
        } else {
            self.closed.push(popup);
        }
        true
    }

    fn remove(&mut self, popup: ElementId) -> bool {
        let before = self.stack.len();
        self.stack.retain(|&p| p != popup);
        self.stack.len() != before
    }

    pub fn contains(&self, popup: ElementId) -> bool {
        self.stack.contains(&popup)
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn top(&self) -> Option<ElementId> {
        self.stack.last().copied()
    }

    /// Bottom to top
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = ElementId> + '_ {
        self.stack.iter().copied()
    }

    pub(crate) fn take_opened(&mut self) -> Vec<ElementId> {
        std::mem::take(&mut self.opened)
    }

    pub(crate) fn take_closed(&mut self) -> Vec<ElementId> {
        std::mem::take(&mut self.closed)
    }
}
