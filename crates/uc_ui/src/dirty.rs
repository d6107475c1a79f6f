//! Dirty region tracking
//!
//! Regions accumulate while events are processed and are consumed once per
//! frame. Before rendering, intersecting regions are merged when the merge
//! is efficient: `(area(A) + area(B)) / area(A ∪ B) >= 0.5`.

use tracing::trace;
use uc_core::Rect2Di;

/// Minimum merge efficiency for two regions to be combined
pub const MERGE_EFFICIENCY_THRESHOLD: f64 = 0.5;

/// A rectangle scheduled for redraw
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DirtyRegion {
    /// Window coordinates
    pub bounds: Rect2Di,
    /// Only popups need repainting
    pub is_overlay: bool,
}

impl DirtyRegion {
    pub fn new(bounds: Rect2Di, is_overlay: bool) -> Self {
        Self { bounds, is_overlay }
    }
}

/// Ratio of covered area to the area of the union
pub fn merge_efficiency(a: &Rect2Di, b: &Rect2Di) -> f64 {
    let union = a.union(b).area();
    if union <= 0.0 {
        return 0.0;
    }
    (a.area() + b.area()) / union
}

/// Whether two regions should be merged
pub fn should_merge(a: &Rect2Di, b: &Rect2Di) -> bool {
    a.intersects(b) && merge_efficiency(a, b) >= MERGE_EFFICIENCY_THRESHOLD
}

/// Pending dirty regions of one window
#[derive(Clone, Debug, Default)]
pub struct DirtyRegionList {
    regions: Vec<DirtyRegion>,
    window: Rect2Di,
    full_redraw: bool,
}

impl DirtyRegionList {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            regions: Vec::new(),
            window: Rect2Di::new(0, 0, width, height),
            full_redraw: false,
        }
    }

    pub fn set_window_size(&mut self, width: i32, height: i32) {
        self.window = Rect2Di::new(0, 0, width, height);
    }

    pub fn window_bounds(&self) -> Rect2Di {
        self.window
    }

    /// Add a region, clipped to the window
    pub fn add(&mut self, bounds: Rect2Di, is_overlay: bool) {
        if self.full_redraw {
            return;
        }
        let Some(bounds) = bounds.intersection(&self.window) else {
            return;
        };
        if bounds.is_empty() {
            return;
        }
        let covered = self.regions.iter().any(|r| {
            r.bounds.contains_rect(&bounds) && (!r.is_overlay || is_overlay)
        });
        if covered {
            return;
        }
        trace!(?bounds, is_overlay, "dirty region added");
        self.regions.push(DirtyRegion::new(bounds, is_overlay));
    }

    /// Replace everything with one region covering the window
    pub fn mark_full_redraw(&mut self) {
        self.regions.clear();
        self.regions.push(DirtyRegion::new(self.window, false));
        self.full_redraw = true;
    }

    pub fn is_full_redraw(&self) -> bool {
        self.full_redraw
    }

    /// Merge pairs until no intersecting pair is worth merging
    pub fn optimize(&mut self) {
        'scan: loop {
            for i in 0..self.regions.len() {
                for j in (i + 1)..self.regions.len() {
                    let (a, b) = (self.regions[i], self.regions[j]);
                    if should_merge(&a.bounds, &b.bounds) {
                        self.regions[i] = DirtyRegion::new(
                            a.bounds.union(&b.bounds),
                            a.is_overlay && b.is_overlay,
                        );
                        self.regions.remove(j);
                        continue 'scan;
                    }
                }
            }
            break;
        }
    }

    pub fn regions(&self) -> &[DirtyRegion] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Take all regions, leaving the list empty
    pub fn take(&mut self) -> Vec<DirtyRegion> {
        self.full_redraw = false;
        std::mem::take(&mut self.regions)
    }

    pub fn clear(&mut self) {
        self.regions.clear();
        self.full_redraw = false;
    }
}
