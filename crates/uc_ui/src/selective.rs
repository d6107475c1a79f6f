//! Selective renderer
//!
//! Repaints only the window's dirty regions. Per frame:
//!
//! 1. restore snapshots of popups closed since the last frame and snapshot
//!    the background under newly opened ones
//! 2. merge the dirty regions
//! 3. per region: clip, repaint the background and every visible element of
//!    the main tree intersecting it in paint order, then the popups over it
//!    (overlay regions repaint popups only)
//! 4. clear the region list

use rustc_hash::FxHashMap;
use tracing::{debug, trace};
use uc_core::{Color, PixelSnapshot, Rect2Di, RenderContext};

use crate::context_manager::RenderStateGuard;
use crate::dirty::DirtyRegion;
use crate::element::ElementId;
use crate::tree::ElementTree;

/// What the last frame did
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderStats {
    pub regions: usize,
    pub overlay_regions: usize,
    pub element_renders: usize,
    pub popup_renders: usize,
    /// Elements rendered, in paint order
    pub rendered: Vec<ElementId>,
    pub full_redraw: bool,
    pub snapshots_taken: usize,
    pub snapshots_restored: usize,
}

#[derive(Clone, Copy, Debug)]
struct PaintItem {
    id: ElementId,
    bounds: Rect2Di,
    /// Set when the element overflows its ancestors' content areas
    clip: Option<Rect2Di>,
}

/// Dirty-region renderer of one window
#[derive(Debug, Default)]
pub struct SelectiveRenderer {
    snapshots: FxHashMap<ElementId, PixelSnapshot>,
    stats: RenderStats,
    frames: u64,
}

impl SelectiveRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> &RenderStats {
        &self.stats
    }

    /// Frames that repainted anything
    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    pub fn has_snapshot(&self, popup: ElementId) -> bool {
        self.snapshots.contains_key(&popup)
    }

    /// Repaint the dirty regions; false if nothing was dirty
    pub fn render(
        &mut self,
        tree: &mut ElementTree,
        ctx: &mut dyn RenderContext,
        background: Color,
    ) -> bool {
        self.stats = RenderStats::default();
        self.sync_snapshots(tree, ctx);
        if tree.dirty().is_empty() {
            return false;
        }

        self.stats.full_redraw = tree.dirty().is_full_redraw();
        tree.dirty_mut().optimize();
        let regions = tree.dirty_mut().take();
        for region in &regions {
            self.render_region(tree, ctx, region, background);
        }
        self.stats.regions = regions.len();
        ctx.flush();
        self.frames += 1;
        debug!(
            regions = self.stats.regions,
            elements = self.stats.element_renders,
            popups = self.stats.popup_renders,
            "frame rendered"
        );
        true
    }

    fn sync_snapshots(&mut self, tree: &mut ElementTree, ctx: &mut dyn RenderContext) {
        for popup in tree.popups_mut().take_closed() {
            if let Some(snapshot) = self.snapshots.remove(&popup) {
                ctx.restore_snapshot(&snapshot);
                self.stats.snapshots_restored += 1;
            }
        }
        self.snapshots
            .retain(|popup, _| tree.popups().contains(*popup));
        for popup in tree.popups_mut().take_opened() {
            let Some(bounds) = tree.actual_bounds_in_window(popup) else {
                continue;
            };
            if let Some(snapshot) = ctx.snapshot_region(bounds) {
                self.snapshots.insert(popup, snapshot);
                self.stats.snapshots_taken += 1;
            }
        }
    }

    fn render_region(
        &mut self,
        tree: &mut ElementTree,
        ctx: &mut dyn RenderContext,
        region: &DirtyRegion,
        background: Color,
    ) {
        trace!(bounds = ?region.bounds, overlay = region.is_overlay, "rendering region");
        let window = tree.dirty().window_bounds();
        let mut guard = RenderStateGuard::new(ctx);
        guard.set_clip_rect(region.bounds.to_float());

        if region.is_overlay {
            self.stats.overlay_regions += 1;
        } else {
            guard.set_fill_color(background);
            guard.fill_rectangle(region.bounds.to_float());
            let mut items = Vec::new();
            collect(tree, tree.root(), region.bounds, window, &mut items);
            for item in items {
                self.paint(tree, &mut *guard, item);
            }
        }

        let popups: Vec<ElementId> = tree.popups().iter().collect();
        for popup in popups {
            let mut items = Vec::new();
            collect(tree, popup, region.bounds, window, &mut items);
            if !items.is_empty() {
                self.stats.popup_renders += 1;
            }
            for item in items {
                self.paint(tree, &mut *guard, item);
            }
        }

        guard.clear_clip_rect();
    }

    fn paint(&mut self, tree: &mut ElementTree, ctx: &mut dyn RenderContext, item: PaintItem) {
        let mut guard = RenderStateGuard::new(ctx);
        if let Some(clip) = item.clip {
            guard.intersect_clip_rect(clip.to_float());
        }
        guard.translate(item.bounds.x as f32, item.bounds.y as f32);
        if tree.render_element(item.id, &mut *guard) {
            self.stats.element_renders += 1;
            self.stats.rendered.push(item.id);
        }
        tree.clear_needs_redraw(item.id);
    }
}

/// Visible elements under `id` intersecting `region`, in paint order
///
/// `clip` is the window area left visible by the ancestors.
fn collect(
    tree: &ElementTree,
    id: ElementId,
    region: Rect2Di,
    clip: Rect2Di,
    out: &mut Vec<PaintItem>,
) {
    let Some(core) = tree.core(id) else {
        return;
    };
    if !core.is_visible() {
        return;
    }
    let Some(bounds) = tree.actual_bounds_in_window(id) else {
        return;
    };
    let Some(visible) = bounds.intersection(&clip) else {
        return;
    };
    if !visible.intersects(&region) {
        return;
    }
    out.push(PaintItem {
        id,
        bounds,
        clip: (!clip.contains_rect(&bounds)).then_some(visible),
    });
    if !core.is_container() {
        return;
    }
    let Some(child_clip) = tree
        .content_area_in_window(id)
        .and_then(|content| content.intersection(&visible))
    else {
        return;
    };
    for child in tree.children_in_paint_order(id) {
        collect(tree, child, region, child_clip, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ContainerData, Element, ElementCore, ElementOptions};
    use crate::panel::Panel;
    use uc_core::{DrawCommand, Point2Df, Rect2Df, RecordingContext};

    struct Label(String);

    impl Element for Label {
        fn render(&mut self, _core: &ElementCore, ctx: &mut dyn RenderContext) {
            ctx.draw_text(&self.0, Point2Df::new(0.0, 10.0));
        }
    }

    fn label(tree: &mut ElementTree, text: &str, bounds: Rect2Di) -> ElementId {
        tree.create_child(tree.root(), Label(text.to_string()), bounds, ElementOptions::new(text))
            .unwrap()
    }

    #[test]
    fn test_first_frame_is_full_redraw() {
        let mut tree = ElementTree::new(200, 100);
        label(&mut tree, "a", Rect2Di::new(0, 0, 50, 20));
        let mut ctx = RecordingContext::new(200, 100);
        let mut renderer = SelectiveRenderer::new();

        assert!(renderer.render(&mut tree, &mut ctx, Color::WHITE));
        assert!(renderer.stats().full_redraw);
        assert_eq!(renderer.stats().regions, 1);
        assert_eq!(ctx.text_count("a"), 1);

        ctx.clear_commands();
        assert!(!renderer.render(&mut tree, &mut ctx, Color::WHITE));
        assert!(ctx.commands().is_empty());
    }

    #[test]
    fn test_only_dirty_elements_repainted() {
        let mut tree = ElementTree::new(400, 100);
        let a = label(&mut tree, "left", Rect2Di::new(0, 0, 100, 30));
        label(&mut tree, "right", Rect2Di::new(200, 0, 100, 30));
        let mut ctx = RecordingContext::new(400, 100);
        let mut renderer = SelectiveRenderer::new();
        renderer.render(&mut tree, &mut ctx, Color::WHITE);
        ctx.clear_commands();

        tree.update_element::<Label, _>(a, |l| l.0 = "LEFT".to_string());
        renderer.render(&mut tree, &mut ctx, Color::WHITE);
        assert_eq!(ctx.text_count("LEFT"), 1);
        assert_eq!(ctx.text_count("right"), 0);
        assert_eq!(renderer.stats().rendered, vec![tree.root(), a]);
        assert_eq!(
            ctx.clip_changes(),
            vec![Some(Rect2Df::new(0.0, 0.0, 100.0, 30.0)), None]
        );
    }

    #[test]
    fn test_element_drawn_at_window_position_under_scroll() {
        let mut tree = ElementTree::new(300, 300);
        let list = tree
            .create_child(
                tree.root(),
                Panel::transparent(),
                Rect2Di::new(10, 10, 100, 100),
                ElementOptions::default()
                    .container(ContainerData::new().with_content_size(100, 500)),
            )
            .unwrap();
        tree.create_child(list, Label("row".into()), Rect2Di::new(0, 50, 100, 20), ElementOptions::default())
            .unwrap();
        tree.set_scroll(list, 0, 40).unwrap();

        let mut ctx = RecordingContext::new(300, 300);
        SelectiveRenderer::new().render(&mut tree, &mut ctx, Color::WHITE);
        let text = ctx
            .commands()
            .iter()
            .find(|c| matches!(c.command, DrawCommand::Text { .. }))
            .unwrap();
        let origin = text.transform.transform_point(Point2Df::new(0.0, 0.0));
        assert_eq!(origin, Point2Df::new(10.0, 20.0));
    }

    #[test]
    fn test_children_clipped_to_container() {
        let mut tree = ElementTree::new(300, 300);
        let panel = tree
            .create_child(
                tree.root(),
                Panel::transparent(),
                Rect2Di::new(0, 0, 50, 50),
                ElementOptions::default().container(ContainerData::new()),
            )
            .unwrap();
        tree.create_child(panel, Label("wide".into()), Rect2Di::new(0, 0, 80, 10), ElementOptions::default())
            .unwrap();
        tree.create_child(panel, Label("outside".into()), Rect2Di::new(60, 60, 10, 10), ElementOptions::default())
            .unwrap();

        let mut ctx = RecordingContext::new(300, 300);
        SelectiveRenderer::new().render(&mut tree, &mut ctx, Color::WHITE);
        assert_eq!(ctx.text_count("outside"), 0);
        let wide = ctx
            .commands()
            .iter()
            .find(|c| matches!(&c.command, DrawCommand::Text { text, .. } if text == "wide"))
            .unwrap();
        assert_eq!(wide.clip, Some(Rect2Df::new(0.0, 0.0, 50.0, 10.0)));
    }

    #[test]
    fn test_overlay_region_repaints_popups_only() {
        let mut tree = ElementTree::new(300, 300);
        label(&mut tree, "under", Rect2Di::new(0, 0, 300, 300));
        let popup = tree.insert(Label("menu".into()), Rect2Di::new(50, 50, 100, 100), ElementOptions::default());
        let mut ctx = RecordingContext::new(300, 300);
        let mut renderer = SelectiveRenderer::new();
        renderer.render(&mut tree, &mut ctx, Color::WHITE);
        ctx.clear_commands();

        tree.open_popup(popup).unwrap();
        renderer.render(&mut tree, &mut ctx, Color::WHITE);
        assert_eq!(renderer.stats().overlay_regions, 1);
        assert_eq!(ctx.text_count("menu"), 1);
        assert_eq!(ctx.text_count("under"), 0);

        ctx.clear_commands();
        tree.close_popup(popup);
        renderer.render(&mut tree, &mut ctx, Color::WHITE);
        assert_eq!(ctx.text_count("menu"), 0);
        assert_eq!(ctx.text_count("under"), 1);
    }

    #[test]
    fn test_popup_stays_on_top_of_repainted_background() {
        let mut tree = ElementTree::new(300, 300);
        let under = label(&mut tree, "under", Rect2Di::new(0, 0, 300, 300));
        let popup = tree.insert(Label("menu".into()), Rect2Di::new(50, 50, 100, 100), ElementOptions::default());
        tree.open_popup(popup).unwrap();
        let mut ctx = RecordingContext::new(300, 300);
        let mut renderer = SelectiveRenderer::new();
        renderer.render(&mut tree, &mut ctx, Color::WHITE);
        ctx.clear_commands();

        tree.request_redraw(under);
        renderer.render(&mut tree, &mut ctx, Color::WHITE);
        assert_eq!(ctx.texts(), vec!["under", "menu"]);
    }
}
