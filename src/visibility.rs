use serde::Deserialize;

use crate::catalog::{Catalog, NavigationTarget};
use crate::query::FilterResult;

#[derive(Debug, Clone, PartialEq)]
pub struct SectionExtent {
    pub target: NavigationTarget,
    pub top: f64,
    pub bottom: f64,
}

impl SectionExtent {
    pub fn new(target: NavigationTarget, top: f64, bottom: f64) -> Self {
        Self { target, top, bottom }
    }

    /// Half-open: a point on a shared boundary belongs to the later section.
    pub fn contains(&self, y: f64) -> bool {
        self.top <= y && y < self.bottom
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawExtent {
    pub id: String,
    pub top: f64,
    pub bottom: f64,
}

impl RawExtent {
    pub fn resolve(&self, catalog: &Catalog) -> Option<SectionExtent> {
        let target = catalog.parse_anchor(&self.id)?;
        Some(SectionExtent::new(target, self.top, self.bottom))
    }
}

/// Last extent containing `center`. Later sections win so that overlapping
/// spans resolve toward the bottom of the page.
pub fn section_at(center: f64, extents: &[SectionExtent]) -> Option<&NavigationTarget> {
    extents
        .iter()
        .filter(|extent| extent.contains(center))
        .map(|extent| &extent.target)
        .last()
}

#[derive(Debug, Clone, Default)]
pub struct VisibilityTracker {
    last: Option<NavigationTarget>,
    fallback: Option<NavigationTarget>,
}

impl VisibilityTracker {
    pub fn new(catalog: &Catalog) -> Self {
        Self {
            last: None,
            fallback: catalog.first_category().map(|c| c.target()),
        }
    }

    pub fn last(&self) -> Option<&NavigationTarget> {
        self.last.as_ref()
    }

    pub fn compute_active_section(
        &mut self,
        scroll_offset: f64,
        viewport_height: f64,
        extents: &[SectionExtent],
    ) -> Option<NavigationTarget> {
        let center = scroll_offset + viewport_height / 2.0;
        if let Some(target) = section_at(center, extents) {
            self.last = Some(target.clone());
        }
        self.last.clone().or_else(|| self.fallback.clone())
    }

    pub fn observe(&mut self, target: &NavigationTarget) {
        self.last = Some(target.clone());
    }

    /// Replaces a remembered target that the current view hides with the
    /// first visible one. With nothing visible the old value is kept, the
    /// same way the navigator keeps its active target.
    pub fn reconcile(&mut self, catalog: &Catalog, view: &FilterResult) {
        let hidden = self.last.as_ref().is_some_and(|last| !view.contains(last));
        if !hidden {
            return;
        }
        if let Some(first) = view.first_match(catalog) {
            self.last = Some(first);
        }
    }
}
