//! Element tree
//!
//! A slotmap arena of elements. Each node stores the tree-owned
//! [`ElementCore`] next to its boxed [`Element`] behavior; parents are keys
//! and container child lists own their children.
//!
//! Coordinates: an element's bounds are relative to its parent's content
//! area, shifted by the parent's scroll offset. The root and popups are
//! positioned in window coordinates.
//!
//! Every mutator records the affected window rectangles in the tree's
//! [`DirtyRegionList`].

use slotmap::SlotMap;
use tracing::{debug, trace};
use uc_core::{Point2Di, Rect2Di, RenderContext, UcEvent};
use uc_platform::Cursor;

use crate::dirty::DirtyRegionList;
use crate::element::{
    ContainerData, Element, ElementCore, ElementId, ElementOptions, EventContext,
};
use crate::error::{Result, UiError};
use crate::panel::Panel;
use crate::popup::PopupStack;

struct Node {
    core: ElementCore,
    behavior: Option<Box<dyn Element>>,
}

/// Element arena of one window
pub struct ElementTree {
    nodes: SlotMap<ElementId, Node>,
    root: ElementId,
    next_seq: u64,
    dirty: DirtyRegionList,
    popups: PopupStack,
}

impl std::fmt::Debug for ElementTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementTree")
            .field("elements", &self.nodes.len())
            .field("popups", &self.popups.len())
            .field("dirty", &self.dirty.len())
            .finish()
    }
}

impl ElementTree {
    /// Create a tree whose root container covers a `width` x `height` window
    pub fn new(width: i32, height: i32) -> Self {
        let mut nodes = SlotMap::with_key();
        let mut core = ElementCore::new(
            Rect2Di::new(0, 0, width, height),
            ElementOptions::new("root").container(ContainerData::new()),
        );
        core.seq = 0;
        let root = nodes.insert(Node {
            core,
            behavior: Some(Box::new(Panel::transparent())),
        });
        let mut dirty = DirtyRegionList::new(width, height);
        dirty.mark_full_redraw();
        Self {
            nodes,
            root,
            next_seq: 1,
            dirty,
            popups: PopupStack::new(),
        }
    }

    pub fn root(&self) -> ElementId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn core(&self, id: ElementId) -> Option<&ElementCore> {
        self.nodes.get(id).map(|n| &n.core)
    }

    fn core_mut(&mut self, id: ElementId) -> Result<&mut ElementCore> {
        self.nodes
            .get_mut(id)
            .map(|n| &mut n.core)
            .ok_or(UiError::UnknownElement(id))
    }

    fn container_mut(&mut self, id: ElementId) -> Result<&mut ContainerData> {
        self.core_mut(id)?
            .container
            .as_mut()
            .ok_or(UiError::NotAContainer(id))
    }

    /// Behavior of an element, downcast to its concrete type
    pub fn element<T: Element>(&self, id: ElementId) -> Option<&T> {
        self.nodes
            .get(id)?
            .behavior
            .as_deref()?
            .as_any()
            .downcast_ref::<T>()
    }

    /// Mutable behavior without redraw tracking; see [`ElementTree::update_element`]
    pub fn element_mut<T: Element>(&mut self, id: ElementId) -> Option<&mut T> {
        self.nodes
            .get_mut(id)?
            .behavior
            .as_deref_mut()?
            .as_any_mut()
            .downcast_mut::<T>()
    }

    /// Change an element's behavior state and schedule its repaint
    pub fn update_element<T: Element, R>(
        &mut self,
        id: ElementId,
        f: impl FnOnce(&mut T) -> R,
    ) -> Option<R> {
        let result = f(self.element_mut::<T>(id)?);
        self.request_redraw(id);
        Some(result)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Structure
    // ─────────────────────────────────────────────────────────────────────

    /// Insert a detached element
    pub fn insert(
        &mut self,
        element: impl Element,
        bounds: Rect2Di,
        options: ElementOptions,
    ) -> ElementId {
        let mut core = ElementCore::new(bounds, options);
        core.seq = self.next_seq;
        self.next_seq += 1;
        self.nodes.insert(Node {
            core,
            behavior: Some(Box::new(element)),
        })
    }

    /// Insert an element and attach it to `parent`
    pub fn create_child(
        &mut self,
        parent: ElementId,
        element: impl Element,
        bounds: Rect2Di,
        options: ElementOptions,
    ) -> Result<ElementId> {
        let id = self.insert(element, bounds, options);
        if let Err(err) = self.add_child(parent, id) {
            self.nodes.remove(id);
            return Err(err);
        }
        Ok(id)
    }

    /// Attach a detached element as the last child of `parent`
    pub fn add_child(&mut self, parent: ElementId, child: ElementId) -> Result<()> {
        if !self.nodes.contains_key(child) {
            return Err(UiError::UnknownElement(child));
        }
        if child == self.root || self.popups.contains(child) {
            return Err(UiError::InvalidHierarchy(
                "root and popups cannot be children".to_string(),
            ));
        }
        if self.core(child).and_then(|c| c.parent).is_some() {
            return Err(UiError::InvalidHierarchy(format!(
                "{:?} already has a parent",
                child
            )));
        }
        if self.is_ancestor(child, parent) || child == parent {
            return Err(UiError::InvalidHierarchy(
                "element cannot contain itself".to_string(),
            ));
        }
        let seq = self.next_seq;
        self.container_mut(parent)?.children.push(child);
        self.next_seq += 1;
        let core = self.core_mut(child)?;
        core.parent = Some(parent);
        core.seq = seq;
        trace!(?parent, ?child, "child added");
        self.mark_dirty(child);
        self.perform_layout(parent);
        Ok(())
    }

    /// Detach `child` from `parent`; the element stays alive
    pub fn remove_child(&mut self, parent: ElementId, child: ElementId) -> Result<()> {
        if self.core(child).and_then(|c| c.parent) != Some(parent) {
            return Err(UiError::InvalidHierarchy(format!(
                "{:?} is not a child of {:?}",
                child, parent
            )));
        }
        self.mark_dirty_background(child);
        self.container_mut(parent)?.children.retain(|&c| c != child);
        self.core_mut(child)?.parent = None;
        Ok(())
    }

    /// Remove an element and its subtree, returning every removed key
    ///
    /// Windows go through [`UcWindow::destroy_element`](crate::UcWindow::destroy_element)
    /// so capture, focus and timers forget the removed elements.
    pub(crate) fn destroy(&mut self, id: ElementId) -> Result<Vec<ElementId>> {
        if id == self.root {
            return Err(UiError::InvalidHierarchy(
                "the root cannot be destroyed".to_string(),
            ));
        }
        let parent = self
            .core(id)
            .ok_or(UiError::UnknownElement(id))?
            .parent;
        match parent {
            Some(parent) => self.remove_child(parent, id)?,
            None => {
                self.close_popup(id);
            }
        }
        let mut removed = Vec::new();
        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            if let Some(node) = self.nodes.remove(next) {
                if let Some(container) = node.core.container {
                    pending.extend(container.children);
                }
                removed.push(next);
            }
        }
        debug!(count = removed.len(), "elements destroyed");
        Ok(removed)
    }

    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.core(id)?.parent
    }

    pub fn children(&self, id: ElementId) -> &[ElementId] {
        self.core(id)
            .and_then(|c| c.container.as_ref())
            .map_or(&[], |c| c.children.as_slice())
    }

    /// Children sorted by ascending z, then insertion order
    pub fn children_in_paint_order(&self, id: ElementId) -> Vec<ElementId> {
        let mut children = self.children(id).to_vec();
        children.sort_by_key(|&c| self.core(c).map(|c| c.order_key()).unwrap_or_default());
        children
    }

    /// True if `ancestor` is a strict ancestor of `id`
    pub fn is_ancestor(&self, ancestor: ElementId, id: ElementId) -> bool {
        let mut current = self.parent(id);
        while let Some(p) = current {
            if p == ancestor {
                return true;
            }
            current = self.parent(p);
        }
        false
    }

    /// Outermost ancestor (the root, a popup, or a detached element)
    pub fn top_ancestor(&self, id: ElementId) -> ElementId {
        let mut current = id;
        while let Some(p) = self.parent(current) {
            current = p;
        }
        current
    }

    /// Part of the painted tree: under the root or an open popup
    pub fn is_attached(&self, id: ElementId) -> bool {
        let top = self.top_ancestor(id);
        self.contains(id) && (top == self.root || self.popups.contains(top))
    }

    pub fn is_in_popup(&self, id: ElementId) -> bool {
        self.popups.contains(self.top_ancestor(id))
    }

    /// Visible along the whole parent chain
    pub fn is_effectively_visible(&self, id: ElementId) -> bool {
        let mut current = Some(id);
        while let Some(e) = current {
            match self.core(e) {
                Some(core) if core.visible => current = core.parent,
                _ => return false,
            }
        }
        true
    }

    /// Search the subtree below `from` by string identifier
    pub fn find_child_by_id(&self, from: ElementId, identifier: &str) -> Option<ElementId> {
        for &child in self.children(from) {
            if self.core(child).is_some_and(|c| c.identifier() == identifier) {
                return Some(child);
            }
            if let Some(found) = self.find_child_by_id(child, identifier) {
                return Some(found);
            }
        }
        None
    }

    /// Raise above every sibling
    pub fn bring_to_front(&mut self, id: ElementId) -> Result<()> {
        let Some(parent) = self.parent(id) else {
            return Ok(());
        };
        let max = self
            .children(parent)
            .iter()
            .filter(|&&c| c != id)
            .filter_map(|&c| self.core(c).map(|c| c.z_index))
            .max();
        match max {
            Some(max) => self.set_z_index(id, max + 1),
            None => Ok(()),
        }
    }

    /// Lower beneath every sibling
    pub fn send_to_back(&mut self, id: ElementId) -> Result<()> {
        let Some(parent) = self.parent(id) else {
            return Ok(());
        };
        let min = self
            .children(parent)
            .iter()
            .filter(|&&c| c != id)
            .filter_map(|&c| self.core(c).map(|c| c.z_index))
            .min();
        match min {
            Some(min) => self.set_z_index(id, min - 1),
            None => Ok(()),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Geometry
    // ─────────────────────────────────────────────────────────────────────

    /// Scroll offset clamped to `[0, content - viewport]`
    pub fn effective_scroll(&self, id: ElementId) -> (i32, i32) {
        let Some(core) = self.core(id) else {
            return (0, 0);
        };
        let Some(container) = core.container.as_ref() else {
            return (0, 0);
        };
        let viewport = container.content_area(&core.bounds);
        let (content_w, content_h) = container.content_size.unwrap_or_else(|| {
            container
                .children
                .iter()
                .filter_map(|&c| self.core(c))
                .filter(|c| c.visible)
                .fold((0, 0), |(w, h), c| {
                    (w.max(c.bounds.right()), h.max(c.bounds.bottom()))
                })
        });
        let max_x = (content_w - viewport.width).max(0);
        let max_y = (content_h - viewport.height).max(0);
        (
            container.scroll_x.clamp(0, max_x),
            container.scroll_y.clamp(0, max_y),
        )
    }

    /// Offset from a container's top-left to its children's coordinate origin
    fn child_origin(&self, id: ElementId) -> Point2Di {
        let Some(core) = self.core(id) else {
            return Point2Di::default();
        };
        let Some(container) = core.container.as_ref() else {
            return Point2Di::default();
        };
        let content = container.content_area(&core.bounds);
        let (sx, sy) = self.effective_scroll(id);
        Point2Di::new(content.x - sx, content.y - sy)
    }

    /// Bounds in window coordinates
    pub fn actual_bounds_in_window(&self, id: ElementId) -> Option<Rect2Di> {
        let core = self.core(id)?;
        let mut x = core.bounds.x;
        let mut y = core.bounds.y;
        let mut parent = core.parent;
        while let Some(p) = parent {
            let pc = self.core(p)?;
            let origin = self.child_origin(p);
            x += pc.bounds.x + origin.x;
            y += pc.bounds.y + origin.y;
            parent = pc.parent;
        }
        Some(Rect2Di::new(x, y, core.bounds.width, core.bounds.height))
    }

    /// Content area of a container in window coordinates
    pub fn content_area_in_window(&self, id: ElementId) -> Option<Rect2Di> {
        let bounds = self.actual_bounds_in_window(id)?;
        let content = self.core(id)?.container.as_ref()?.content_area(&bounds);
        Some(content.offset(bounds.x, bounds.y))
    }

    /// Deepest visible element of the main tree under a window point
    pub fn hit_test(&self, point: Point2Di) -> Option<ElementId> {
        self.hit_test_from(self.root, point.x, point.y)
    }

    /// Deepest element of the topmost popup under a window point
    pub fn hit_test_popups(&self, point: Point2Di) -> Option<ElementId> {
        self.popups
            .iter()
            .rev()
            .find_map(|popup| self.hit_test_from(popup, point.x, point.y))
    }

    /// `x`, `y` are in the parent's child coordinates
    fn hit_test_from(&self, id: ElementId, x: i32, y: i32) -> Option<ElementId> {
        let node = self.nodes.get(id)?;
        let core = &node.core;
        if !core.visible {
            return None;
        }
        let inside = match node.behavior.as_deref() {
            Some(behavior) => behavior.contains(core, x, y),
            None => core.bounds.contains_xy(x, y),
        };
        if !inside {
            return None;
        }
        let local = Point2Di::new(x - core.bounds.x, y - core.bounds.y);
        if let Some(container) = core.container.as_ref() {
            if container.content_area(&core.bounds).contains(local) {
                let origin = self.child_origin(id);
                let (cx, cy) = (local.x - origin.x, local.y - origin.y);
                for child in self.children_in_paint_order(id).into_iter().rev() {
                    if let Some(hit) = self.hit_test_from(child, cx, cy) {
                        return Some(hit);
                    }
                }
            }
        }
        Some(id)
    }

    /// Lay out the root and every container below it
    pub fn resize(&mut self, width: i32, height: i32) {
        if let Some(node) = self.nodes.get_mut(self.root) {
            node.core.bounds = Rect2Di::new(0, 0, width, height);
        }
        self.dirty.set_window_size(width, height);
        self.dirty.mark_full_redraw();
        self.layout_all();
    }

    /// Run `perform_layout` on every container, parents first
    pub fn layout_all(&mut self) {
        let mut pending = vec![self.root];
        pending.extend(self.popups.iter());
        while let Some(id) = pending.pop() {
            if self.core(id).is_some_and(|c| c.is_container()) {
                self.perform_layout(id);
                pending.extend(self.children(id).iter().copied());
            }
        }
    }

    pub fn perform_layout(&mut self, id: ElementId) {
        let Some(mut behavior) = self.nodes.get_mut(id).and_then(|n| n.behavior.take()) else {
            return;
        };
        behavior.perform_layout(id, self);
        if let Some(node) = self.nodes.get_mut(id) {
            node.behavior = Some(behavior);
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // State mutators
    // ─────────────────────────────────────────────────────────────────────

    pub fn set_bounds(&mut self, id: ElementId, bounds: Rect2Di) -> Result<()> {
        if self.core_mut(id)?.bounds == bounds {
            return Ok(());
        }
        self.mark_dirty_background(id);
        let resized = {
            let core = self.core_mut(id)?;
            let resized = core.bounds.width != bounds.width || core.bounds.height != bounds.height;
            core.bounds = bounds;
            resized
        };
        self.mark_dirty(id);
        if resized {
            self.perform_layout(id);
        }
        Ok(())
    }

    pub fn set_visible(&mut self, id: ElementId, visible: bool) -> Result<()> {
        if self.core_mut(id)?.visible == visible {
            return Ok(());
        }
        if visible {
            self.core_mut(id)?.visible = true;
            self.mark_dirty(id);
        } else {
            self.mark_dirty_background(id);
            self.core_mut(id)?.visible = false;
        }
        Ok(())
    }

    pub fn set_z_index(&mut self, id: ElementId, z: i32) -> Result<()> {
        if self.core_mut(id)?.z_index == z {
            return Ok(());
        }
        self.core_mut(id)?.z_index = z;
        self.mark_dirty(id);
        Ok(())
    }

    pub fn set_active(&mut self, id: ElementId, active: bool) -> Result<()> {
        if self.core_mut(id)?.active == active {
            return Ok(());
        }
        self.core_mut(id)?.active = active;
        self.mark_dirty(id);
        Ok(())
    }

    pub fn set_focusable(&mut self, id: ElementId, focusable: bool) -> Result<()> {
        self.core_mut(id)?.focusable = focusable;
        Ok(())
    }

    pub fn set_cursor(&mut self, id: ElementId, cursor: Cursor) -> Result<()> {
        self.core_mut(id)?.cursor = cursor;
        Ok(())
    }

    pub(crate) fn set_focused(&mut self, id: ElementId, focused: bool) -> Result<()> {
        if self.core_mut(id)?.focused == focused {
            return Ok(());
        }
        self.core_mut(id)?.focused = focused;
        self.mark_dirty(id);
        Ok(())
    }

    pub(crate) fn set_hovered(&mut self, id: ElementId, hovered: bool) -> Result<()> {
        if self.core_mut(id)?.hovered == hovered {
            return Ok(());
        }
        self.core_mut(id)?.hovered = hovered;
        self.mark_dirty(id);
        Ok(())
    }

    pub fn set_pressed(&mut self, id: ElementId, pressed: bool) -> Result<()> {
        if self.core_mut(id)?.pressed == pressed {
            return Ok(());
        }
        self.core_mut(id)?.pressed = pressed;
        self.mark_dirty(id);
        Ok(())
    }

    /// Set a container's scroll offset, clamped to its content
    pub fn set_scroll(&mut self, id: ElementId, x: i32, y: i32) -> Result<()> {
        let before = self.effective_scroll(id);
        {
            let container = self.container_mut(id)?;
            container.scroll_x = x;
            container.scroll_y = y;
        }
        let after = self.effective_scroll(id);
        let container = self.container_mut(id)?;
        container.scroll_x = after.0;
        container.scroll_y = after.1;
        if before != after {
            self.mark_dirty(id);
        }
        Ok(())
    }

    /// Scroll by a delta; false if the offset did not change
    pub fn scroll_by(&mut self, id: ElementId, dx: i32, dy: i32) -> Result<bool> {
        let (x, y) = self.effective_scroll(id);
        self.set_scroll(id, x + dx, y + dy)?;
        Ok(self.effective_scroll(id) != (x, y))
    }

    /// Schedule a repaint after a text or style change
    pub fn request_redraw(&mut self, id: ElementId) {
        self.mark_dirty(id);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Popups
    // ─────────────────────────────────────────────────────────────────────

    pub fn popups(&self) -> &PopupStack {
        &self.popups
    }

    pub(crate) fn popups_mut(&mut self) -> &mut PopupStack {
        &mut self.popups
    }

    /// Show a detached element as a popup on top of everything
    pub fn open_popup(&mut self, id: ElementId) -> Result<()> {
        if !self.contains(id) {
            return Err(UiError::UnknownElement(id));
        }
        if id == self.root || self.parent(id).is_some() {
            return Err(UiError::InvalidHierarchy(
                "only detached elements can be popups".to_string(),
            ));
        }
        self.popups.open(id);
        debug!(popup = ?id, "popup opened");
        self.mark_dirty(id);
        Ok(())
    }

    /// Hide a popup; the area it covered is repainted
    pub fn close_popup(&mut self, id: ElementId) -> bool {
        let Some(bounds) = self.actual_bounds_in_window(id) else {
            return false;
        };
        if !self.popups.close(id) {
            return false;
        }
        debug!(popup = ?id, "popup closed");
        self.dirty.add(bounds, false);
        true
    }

    pub fn close_all_popups(&mut self) {
        let open: Vec<_> = self.popups.iter().collect();
        for popup in open.into_iter().rev() {
            self.close_popup(popup);
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Dirty tracking
    // ─────────────────────────────────────────────────────────────────────

    pub fn dirty(&self) -> &DirtyRegionList {
        &self.dirty
    }

    pub fn dirty_mut(&mut self) -> &mut DirtyRegionList {
        &mut self.dirty
    }

    pub fn mark_full_redraw(&mut self) {
        self.dirty.mark_full_redraw();
    }

    /// Mark the element's current window rect
    pub fn mark_dirty(&mut self, id: ElementId) {
        if !self.is_attached(id) {
            return;
        }
        let overlay = self.is_in_popup(id);
        if let Some(bounds) = self.actual_bounds_in_window(id) {
            self.dirty.add(bounds, overlay);
        }
        if let Some(node) = self.nodes.get_mut(id) {
            node.core.needs_redraw = true;
        }
    }

    /// Mark the element's current rect for a repaint of what lies beneath
    fn mark_dirty_background(&mut self, id: ElementId) {
        if !self.is_attached(id) {
            return;
        }
        if let Some(bounds) = self.actual_bounds_in_window(id) {
            self.dirty.add(bounds, false);
        }
    }

    pub(crate) fn clear_needs_redraw(&mut self, id: ElementId) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.core.needs_redraw = false;
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Behavior calls
    // ─────────────────────────────────────────────────────────────────────

    pub(crate) fn render_element(&mut self, id: ElementId, ctx: &mut dyn RenderContext) -> bool {
        let Some(node) = self.nodes.get_mut(id) else {
            return false;
        };
        let Some(behavior) = node.behavior.as_mut() else {
            return false;
        };
        behavior.render(&node.core, ctx);
        true
    }

    pub(crate) fn dispatch_to(
        &mut self,
        id: ElementId,
        event: &UcEvent,
        cx: &mut EventContext,
    ) -> Option<bool> {
        let node = self.nodes.get_mut(id)?;
        let behavior = node.behavior.as_mut()?;
        Some(behavior.on_event(&node.core, event, cx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementOptions;
    use uc_core::Insets;

    struct Block;

    impl Element for Block {
        fn render(&mut self, _core: &ElementCore, _ctx: &mut dyn RenderContext) {}
    }

    /// Stacks its children vertically
    struct Column;

    impl Element for Column {
        fn render(&mut self, _core: &ElementCore, _ctx: &mut dyn RenderContext) {}

        fn perform_layout(&mut self, id: ElementId, tree: &mut ElementTree) {
            let mut y = 0;
            for child in tree.children(id).to_vec() {
                if let Some(bounds) = tree.core(child).map(|c| c.bounds()) {
                    let _ = tree.set_bounds(child, Rect2Di::new(0, y, bounds.width, bounds.height));
                    y += bounds.height;
                }
            }
        }
    }

    fn container() -> ElementOptions {
        ElementOptions::default().container(ContainerData::new())
    }

    #[test]
    fn test_actual_bounds_accumulate_content_offset_and_scroll() {
        let mut tree = ElementTree::new(800, 600);
        let outer = tree
            .create_child(
                tree.root(),
                Panel::transparent(),
                Rect2Di::new(10, 20, 300, 200),
                ElementOptions::default().container(
                    ContainerData::new()
                        .with_border(1.0)
                        .with_padding(Insets::uniform(4.0))
                        .with_content_size(1000, 1000),
                ),
            )
            .unwrap();
        let child = tree
            .create_child(outer, Block, Rect2Di::new(30, 40, 50, 50), ElementOptions::default())
            .unwrap();
        assert_eq!(
            tree.actual_bounds_in_window(child),
            Some(Rect2Di::new(10 + 5 + 30, 20 + 5 + 40, 50, 50))
        );

        tree.set_scroll(outer, 0, 25).unwrap();
        assert_eq!(
            tree.actual_bounds_in_window(child),
            Some(Rect2Di::new(45, 65 - 25, 50, 50))
        );
    }

    #[test]
    fn test_scroll_clamped_to_content() {
        let mut tree = ElementTree::new(400, 400);
        let list = tree
            .create_child(tree.root(), Panel::transparent(), Rect2Di::new(0, 0, 100, 100), container())
            .unwrap();
        tree.create_child(list, Block, Rect2Di::new(0, 0, 100, 250), ElementOptions::default())
            .unwrap();

        tree.set_scroll(list, 0, 500).unwrap();
        assert_eq!(tree.effective_scroll(list), (0, 150));
        tree.set_scroll(list, -5, -5).unwrap();
        assert_eq!(tree.effective_scroll(list), (0, 0));
        assert!(!tree.scroll_by(list, 30, 0).unwrap());
        assert!(tree.scroll_by(list, 0, 30).unwrap());
    }

    #[test]
    fn test_single_parent() {
        let mut tree = ElementTree::new(100, 100);
        let a = tree
            .create_child(tree.root(), Panel::transparent(), Rect2Di::new(0, 0, 50, 50), container())
            .unwrap();
        let b = tree
            .create_child(tree.root(), Panel::transparent(), Rect2Di::new(50, 0, 50, 50), container())
            .unwrap();
        let leaf = tree
            .create_child(a, Block, Rect2Di::new(0, 0, 5, 5), ElementOptions::default())
            .unwrap();

        assert!(matches!(tree.add_child(b, leaf), Err(UiError::InvalidHierarchy(_))));
        tree.remove_child(a, leaf).unwrap();
        tree.add_child(b, leaf).unwrap();
        assert_eq!(tree.parent(leaf), Some(b));
        assert!(tree.children(a).is_empty());

        tree.remove_child(tree.root(), a).unwrap();
        assert!(matches!(tree.add_child(leaf, a), Err(UiError::NotAContainer(_))));
        assert!(matches!(
            tree.add_child(b, tree.root()),
            Err(UiError::InvalidHierarchy(_))
        ));
    }

    #[test]
    fn test_hit_test_prefers_higher_z_then_later_insertion() {
        let mut tree = ElementTree::new(200, 200);
        let root = tree.root();
        let first = tree
            .create_child(root, Block, Rect2Di::new(0, 0, 100, 100), ElementOptions::new("first"))
            .unwrap();
        let second = tree
            .create_child(root, Block, Rect2Di::new(50, 50, 100, 100), ElementOptions::new("second"))
            .unwrap();

        assert_eq!(tree.hit_test(Point2Di::new(60, 60)), Some(second));
        tree.bring_to_front(first).unwrap();
        assert_eq!(tree.hit_test(Point2Di::new(60, 60)), Some(first));
        tree.send_to_back(first).unwrap();
        assert_eq!(tree.hit_test(Point2Di::new(60, 60)), Some(second));
        assert_eq!(tree.hit_test(Point2Di::new(190, 10)), Some(root));
        assert_eq!(tree.hit_test(Point2Di::new(250, 10)), None);

        tree.set_visible(second, false).unwrap();
        assert_eq!(tree.hit_test(Point2Di::new(60, 60)), Some(first));
    }

    #[test]
    fn test_hit_test_respects_scroll() {
        let mut tree = ElementTree::new(200, 200);
        let list = tree
            .create_child(
                tree.root(),
                Panel::transparent(),
                Rect2Di::new(0, 0, 100, 100),
                ElementOptions::default()
                    .container(ContainerData::new().with_content_size(100, 400)),
            )
            .unwrap();
        let row = tree
            .create_child(list, Block, Rect2Di::new(0, 120, 100, 20), ElementOptions::default())
            .unwrap();
        assert_eq!(tree.hit_test(Point2Di::new(10, 10)), Some(list));
        tree.set_scroll(list, 0, 110).unwrap();
        assert_eq!(tree.hit_test(Point2Di::new(10, 15)), Some(row));
    }

    #[test]
    fn test_find_child_by_id_recursive() {
        let mut tree = ElementTree::new(100, 100);
        let panel = tree
            .create_child(tree.root(), Panel::transparent(), Rect2Di::new(0, 0, 50, 50), container())
            .unwrap();
        let ok = tree
            .create_child(panel, Block, Rect2Di::new(0, 0, 10, 10), ElementOptions::new("ok"))
            .unwrap();
        assert_eq!(tree.find_child_by_id(tree.root(), "ok"), Some(ok));
        assert_eq!(tree.find_child_by_id(ok, "ok"), None);
        assert_eq!(tree.find_child_by_id(tree.root(), "missing"), None);
    }

    #[test]
    fn test_mutators_mark_old_and_new_rects() {
        let mut tree = ElementTree::new(500, 500);
        let block = tree
            .create_child(tree.root(), Block, Rect2Di::new(0, 0, 10, 10), ElementOptions::default())
            .unwrap();
        tree.dirty_mut().clear();

        tree.set_bounds(block, Rect2Di::new(100, 100, 10, 10)).unwrap();
        let regions: Vec<_> = tree.dirty().regions().iter().map(|r| r.bounds).collect();
        assert_eq!(
            regions,
            vec![Rect2Di::new(0, 0, 10, 10), Rect2Di::new(100, 100, 10, 10)]
        );

        tree.dirty_mut().clear();
        tree.set_bounds(block, Rect2Di::new(100, 100, 10, 10)).unwrap();
        assert!(tree.dirty().is_empty());

        // detached elements are not painted
        let loose = tree.insert(Block, Rect2Di::new(0, 0, 5, 5), ElementOptions::default());
        tree.set_bounds(loose, Rect2Di::new(1, 1, 5, 5)).unwrap();
        assert!(tree.dirty().is_empty());
    }

    #[test]
    fn test_popup_regions_are_overlays() {
        let mut tree = ElementTree::new(300, 300);
        tree.dirty_mut().clear();
        let popup = tree.insert(Block, Rect2Di::new(50, 20, 200, 150), ElementOptions::default());
        tree.open_popup(popup).unwrap();
        assert_eq!(tree.dirty().regions()[0].bounds, Rect2Di::new(50, 20, 200, 150));
        assert!(tree.dirty().regions()[0].is_overlay);

        tree.dirty_mut().clear();
        assert!(tree.close_popup(popup));
        assert!(!tree.dirty().regions()[0].is_overlay);
        assert!(!tree.close_popup(popup));
    }

    #[test]
    fn test_layout_runs_on_child_addition() {
        let mut tree = ElementTree::new(300, 300);
        let column = tree
            .create_child(tree.root(), Column, Rect2Di::new(0, 0, 100, 300), container())
            .unwrap();
        let a = tree
            .create_child(column, Block, Rect2Di::new(7, 7, 100, 30), ElementOptions::default())
            .unwrap();
        let b = tree
            .create_child(column, Block, Rect2Di::new(7, 7, 100, 40), ElementOptions::default())
            .unwrap();
        assert_eq!(tree.core(a).unwrap().bounds(), Rect2Di::new(0, 0, 100, 30));
        assert_eq!(tree.core(b).unwrap().bounds(), Rect2Di::new(0, 30, 100, 40));
    }

    #[test]
    fn test_destroy_removes_subtree() {
        let mut tree = ElementTree::new(100, 100);
        let panel = tree
            .create_child(tree.root(), Panel::transparent(), Rect2Di::new(0, 0, 50, 50), container())
            .unwrap();
        let leaf = tree
            .create_child(panel, Block, Rect2Di::new(0, 0, 10, 10), ElementOptions::default())
            .unwrap();
        let removed = tree.destroy(panel).unwrap();
        assert_eq!(removed.len(), 2);
        assert!(!tree.contains(leaf));
        assert!(tree.children(tree.root()).is_empty());
        assert!(tree.destroy(tree.root()).is_err());
    }

    #[test]
    fn test_update_element_downcasts_and_marks() {
        let mut tree = ElementTree::new(100, 100);
        let panel = tree
            .create_child(tree.root(), Panel::transparent(), Rect2Di::new(0, 0, 50, 50), container())
            .unwrap();
        tree.dirty_mut().clear();
        let changed = tree.update_element::<Panel, _>(panel, |p| {
            p.background = Some(uc_core::Color::RED);
        });
        assert!(changed.is_some());
        assert_eq!(tree.dirty().len(), 1);
        assert!(tree.element::<Block>(panel).is_none());
    }
}
