use tracing::{debug, info};

use crate::catalog::{Catalog, NavigationTarget};
use crate::expansion::ExpansionState;
use crate::navigation::{ActivationOrigin, NavigationEvent, Navigator, ScrollRequest, SubscriptionId};
use crate::query::{FilterResult, filter, normalize_query};
use crate::visibility::{SectionExtent, VisibilityTracker};

#[derive(Debug)]
pub struct Portal {
    navigator: Navigator,
    tracker: VisibilityTracker,
}

impl Portal {
    pub fn new(catalog: Catalog) -> Self {
        let tracker = VisibilityTracker::new(&catalog);
        Self {
            navigator: Navigator::new(catalog),
            tracker,
        }
    }

    pub fn with_header_offset(mut self, offset: f64) -> Self {
        self.navigator = self.navigator.with_header_offset(offset);
        self
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn catalog(&self) -> &Catalog {
        self.navigator.catalog()
    }

    pub fn view(&self) -> &FilterResult {
        self.navigator.view()
    }

    pub fn expansion(&self) -> &ExpansionState {
        self.navigator.expansion()
    }

    pub fn active(&self) -> Option<&NavigationTarget> {
        self.navigator.active()
    }

    pub fn subscribe(&mut self, subscriber: impl FnMut(&NavigationEvent) + 'static) -> SubscriptionId {
        self.navigator.subscribe(subscriber)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.navigator.unsubscribe(id)
    }

    pub fn start(&mut self) -> Option<&NavigationTarget> {
        let first = self.catalog().first_category().map(|c| c.target())?;
        info!(categories = self.catalog().len(), "portal started");
        self.activate(first, ActivationOrigin::Tracker);
        self.active()
    }

    /// Runs a query and returns where the page should scroll: the first
    /// result, or the top when nothing matched. Repeating the current query
    /// changes nothing.
    pub fn search(&mut self, query: &str) -> Option<ScrollRequest> {
        if normalize_query(query) == self.view().query() {
            return None;
        }

        let view = filter(self.catalog(), query);
        let scroll_to = if view.is_unfiltered() {
            None
        } else if view.has_any_match() {
            view.first_match(self.catalog())
                .map(|target| ScrollRequest::Anchor {
                    target,
                    offset: self.navigator.header_offset(),
                })
        } else {
            Some(ScrollRequest::Top)
        };
        debug!(query = %view.query(), matches = view.match_count(), "search");

        self.tracker.reconcile(self.navigator.catalog(), &view);
        self.navigator.apply_filter(view);
        if let Some(active) = self.navigator.active() {
            self.tracker.observe(active);
        }
        scroll_to
    }

    pub fn on_scroll(
        &mut self,
        scroll_offset: f64,
        viewport_height: f64,
        extents: &[SectionExtent],
    ) -> Option<NavigationTarget> {
        let visible: Vec<SectionExtent> = extents
            .iter()
            .filter(|extent| self.view().contains(&extent.target))
            .cloned()
            .collect();

        let target = self
            .tracker
            .compute_active_section(scroll_offset, viewport_height, &visible)?;
        if self.navigator.set_active(target, ActivationOrigin::Tracker) {
            self.active().cloned()
        } else {
            None
        }
    }

    pub fn click(&mut self, target: NavigationTarget) -> bool {
        self.activate(target, ActivationOrigin::UserClick)
    }

    pub fn click_anchor(&mut self, anchor: &str) -> bool {
        match self.catalog().parse_anchor(anchor) {
            Some(target) => self.click(target),
            None => {
                debug!(anchor, "click on unknown anchor");
                false
            }
        }
    }

    pub fn toggle(&mut self, category_id: &str) -> bool {
        self.navigator.toggle(category_id)
    }

    fn activate(&mut self, target: NavigationTarget, origin: ActivationOrigin) -> bool {
        let changed = self.navigator.set_active(target, origin);
        if let Some(active) = self.navigator.active() {
            self.tracker.observe(active);
        }
        changed
    }
}
