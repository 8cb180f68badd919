use serde::Serialize;
use std::fmt;
use tracing::debug;

use crate::catalog::{Catalog, NavigationTarget};
use crate::expansion::ExpansionState;
use crate::query::FilterResult;

pub const DEFAULT_HEADER_OFFSET: f64 = 80.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationOrigin {
    UserClick,
    Tracker,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScrollRequest {
    Top,
    Anchor { target: NavigationTarget, offset: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum NavigationEvent {
    ActiveChanged {
        previous: Option<NavigationTarget>,
        current: NavigationTarget,
        origin: ActivationOrigin,
        scroll_to: Option<ScrollRequest>,
    },
    ExpansionChanged {
        category: String,
        expanded: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&NavigationEvent)>;

/// Owns the catalog, the current filtered view, the sidebar expansion state
/// and the active target. Every change goes through `&mut self`, and
/// subscribers only run once a transition is complete.
pub struct Navigator {
    catalog: Catalog,
    view: FilterResult,
    expansion: ExpansionState,
    active: Option<NavigationTarget>,
    header_offset: f64,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
}

impl fmt::Debug for Navigator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Navigator")
            .field("active", &self.active)
            .field("query", &self.view.query())
            .field("expansion", &self.expansion)
            .field("subscribers", &self.subscribers.len())
            .finish_non_exhaustive()
    }
}

impl Navigator {
    pub fn new(catalog: Catalog) -> Self {
        let view = FilterResult::unfiltered(&catalog);
        let expansion = ExpansionState::new(&catalog);
        Self {
            catalog,
            view,
            expansion,
            active: None,
            header_offset: DEFAULT_HEADER_OFFSET,
            subscribers: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn with_header_offset(mut self, offset: f64) -> Self {
        self.header_offset = offset;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn view(&self) -> &FilterResult {
        &self.view
    }

    pub fn expansion(&self) -> &ExpansionState {
        &self.expansion
    }

    pub fn active(&self) -> Option<&NavigationTarget> {
        self.active.as_ref()
    }

    pub fn header_offset(&self) -> f64 {
        self.header_offset
    }

    pub fn subscribe(&mut self, subscriber: impl FnMut(&NavigationEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(existing, _)| *existing != id);
        self.subscribers.len() != before
    }

    pub fn resolve(&self, target: &NavigationTarget) -> Option<NavigationTarget> {
        self.catalog
            .canonical(target)
            .filter(|canonical| self.view.contains(canonical))
    }

    /// Single entry point for clicks and scroll-driven updates. Returns
    /// whether the active target changed. Targets the current view does not
    /// show are ignored.
    pub fn set_active(&mut self, target: NavigationTarget, origin: ActivationOrigin) -> bool {
        let Some(target) = self.resolve(&target) else {
            debug!(target = %target, "ignoring activation of hidden or unknown target");
            return false;
        };
        if self.active.as_ref() == Some(&target) {
            return false;
        }

        let mut events = Vec::new();
        self.open_group_of(target.category_id(), &mut events);

        let previous = self.active.replace(target.clone());
        let scroll_to = match origin {
            ActivationOrigin::UserClick => Some(ScrollRequest::Anchor {
                target: target.clone(),
                offset: self.header_offset,
            }),
            ActivationOrigin::Tracker => None,
        };
        debug!(
            ?previous,
            current = %target,
            ?origin,
            "active target changed"
        );
        events.push(NavigationEvent::ActiveChanged {
            previous,
            current: target,
            origin,
            scroll_to,
        });

        self.emit(&events);
        true
    }

    fn open_group_of(&mut self, category_id: &str, events: &mut Vec<NavigationEvent>) {
        if !self.expansion.force_expand(category_id) {
            return;
        }
        events.push(NavigationEvent::ExpansionChanged {
            category: category_id.to_string(),
            expanded: true,
        });

        let others: Vec<String> = self
            .expansion
            .expanded()
            .filter(|id| *id != category_id)
            .map(str::to_string)
            .collect();
        for other in others {
            if self.expansion.force_collapse(&other) {
                events.push(NavigationEvent::ExpansionChanged {
                    category: other,
                    expanded: false,
                });
            }
        }
    }

    pub fn toggle(&mut self, category_id: &str) -> bool {
        if !self.expansion.is_expandable(category_id) {
            return false;
        }
        let expanded = self.expansion.toggle(category_id);
        self.emit(&[NavigationEvent::ExpansionChanged {
            category: category_id.to_string(),
            expanded,
        }]);
        expanded
    }

    /// Installs a new filtered view. When it hides the active target, the
    /// first visible target takes over; with nothing visible the old target
    /// is kept until a later view shows it again.
    pub fn apply_filter(&mut self, view: FilterResult) {
        if self.view == view {
            return;
        }
        self.view = view;

        let hidden = self.active.as_ref().is_some_and(|active| !self.view.contains(active));
        if !hidden {
            return;
        }
        if let Some(first) = self.view.first_match(&self.catalog) {
            self.set_active(first, ActivationOrigin::Tracker);
        }
    }

    fn emit(&mut self, events: &[NavigationEvent]) {
        for event in events {
            for (_, subscriber) in self.subscribers.iter_mut() {
                subscriber(event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::filter;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn catalog() -> Catalog {
        Catalog::build(json!([
            { "id": "home", "name": "Home", "sections": [
                { "websites": [ { "name": "Portal", "url": "https://home", "description": "start page" } ] }
            ]},
            { "id": "a", "name": "A", "sections": [
                { "name": "A1", "websites": [ { "name": "Alpha", "url": "https://a1" } ] },
                { "name": "A2", "websites": [ { "name": "Apex", "url": "https://a2" } ] }
            ]},
            { "id": "b", "name": "B", "sections": [
                { "name": "B1", "websites": [ { "name": "Beta", "url": "https://b1" } ] },
                { "name": "B2", "websites": [ { "name": "Bravo", "url": "https://b2" } ] }
            ]}
        ]))
        .unwrap()
    }

    fn recording(navigator: &mut Navigator) -> Rc<RefCell<Vec<NavigationEvent>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        navigator.subscribe(move |event| sink.borrow_mut().push(event.clone()));
        log
    }

    fn active_changes(log: &[NavigationEvent]) -> usize {
        log.iter()
            .filter(|e| matches!(e, NavigationEvent::ActiveChanged { .. }))
            .count()
    }

    #[test]
    fn accordion_moves_expansion_to_the_active_group() {
        let mut nav = Navigator::new(catalog());
        assert!(nav.expansion().is_expanded("a"));

        assert!(nav.set_active(NavigationTarget::section("b", 0), ActivationOrigin::Tracker));
        assert!(nav.expansion().is_expanded("b"));
        assert!(!nav.expansion().is_expanded("a"));

        let log = recording(&mut nav);
        assert!(nav.set_active(NavigationTarget::section("b", 1), ActivationOrigin::Tracker));
        assert!(nav.expansion().is_expanded("b"));
        assert!(!nav.expansion().is_expanded("a"));
        assert!(
            log.borrow()
                .iter()
                .all(|e| !matches!(e, NavigationEvent::ExpansionChanged { .. }))
        );
    }

    #[test]
    fn expansion_changes_are_reported_before_activation() {
        let mut nav = Navigator::new(catalog());
        let log = recording(&mut nav);
        nav.set_active(NavigationTarget::section("b", 0), ActivationOrigin::Tracker);
        assert_eq!(
            log.borrow().as_slice(),
            &[
                NavigationEvent::ExpansionChanged { category: "b".into(), expanded: true },
                NavigationEvent::ExpansionChanged { category: "a".into(), expanded: false },
                NavigationEvent::ActiveChanged {
                    previous: None,
                    current: NavigationTarget::section("b", 0),
                    origin: ActivationOrigin::Tracker,
                    scroll_to: None,
                },
            ]
        );
    }

    #[test]
    fn open_group_is_left_alone_even_with_siblings_open() {
        let mut nav = Navigator::new(catalog());
        assert!(nav.toggle("b"));
        nav.set_active(NavigationTarget::section("b", 0), ActivationOrigin::Tracker);
        assert!(nav.expansion().is_expanded("a"));
        assert!(nav.expansion().is_expanded("b"));
    }

    #[test]
    fn repeated_activation_notifies_once() {
        let mut nav = Navigator::new(catalog());
        let log = recording(&mut nav);
        assert!(nav.set_active(NavigationTarget::section("a", 1), ActivationOrigin::Tracker));
        assert!(!nav.set_active(NavigationTarget::section("a", 1), ActivationOrigin::Tracker));
        assert_eq!(active_changes(&log.borrow()), 1);
    }

    #[test]
    fn clicks_request_a_scroll_with_header_offset() {
        let mut nav = Navigator::new(catalog()).with_header_offset(64.0);
        let log = recording(&mut nav);
        nav.set_active(NavigationTarget::section("a", 0), ActivationOrigin::UserClick);
        assert_eq!(
            log.borrow().last(),
            Some(&NavigationEvent::ActiveChanged {
                previous: None,
                current: NavigationTarget::section("a", 0),
                origin: ActivationOrigin::UserClick,
                scroll_to: Some(ScrollRequest::Anchor {
                    target: NavigationTarget::section("a", 0),
                    offset: 64.0,
                }),
            })
        );
    }

    #[test]
    fn flat_category_sections_activate_the_category_link() {
        let mut nav = Navigator::new(catalog());
        nav.set_active(NavigationTarget::section("home", 0), ActivationOrigin::Tracker);
        assert_eq!(nav.active(), Some(&NavigationTarget::category("home")));
        // flat categories leave the sidebar groups alone
        assert!(nav.expansion().is_expanded("a"));
        assert!(!nav.set_active(NavigationTarget::category("home"), ActivationOrigin::Tracker));
    }

    #[test]
    fn hidden_or_unknown_targets_are_ignored() {
        let mut nav = Navigator::new(catalog());
        nav.set_active(NavigationTarget::section("a", 0), ActivationOrigin::Tracker);
        nav.apply_filter(filter(nav.catalog(), "alpha"));

        let log = recording(&mut nav);
        assert!(!nav.set_active(NavigationTarget::section("b", 0), ActivationOrigin::UserClick));
        assert!(!nav.set_active(NavigationTarget::section("a", 9), ActivationOrigin::UserClick));
        assert!(!nav.set_active(NavigationTarget::category("nope"), ActivationOrigin::UserClick));
        assert_eq!(nav.active(), Some(&NavigationTarget::section("a", 0)));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn filtering_away_the_active_target_moves_to_first_match() {
        let mut nav = Navigator::new(catalog());
        nav.set_active(NavigationTarget::section("a", 0), ActivationOrigin::Tracker);

        let log = recording(&mut nav);
        nav.apply_filter(filter(nav.catalog(), "bravo"));
        assert_eq!(nav.active(), Some(&NavigationTarget::section("b", 1)));
        assert!(nav.expansion().is_expanded("b"));
        assert!(log.borrow().iter().all(|e| match e {
            NavigationEvent::ActiveChanged { scroll_to, .. } => scroll_to.is_none(),
            NavigationEvent::ExpansionChanged { .. } => true,
        }));

        nav.apply_filter(filter(nav.catalog(), "zzz"));
        assert_eq!(nav.active(), Some(&NavigationTarget::section("b", 1)));
    }

    #[test]
    fn toggle_reports_new_state_and_notifies() {
        let mut nav = Navigator::new(catalog());
        let log = recording(&mut nav);
        assert!(!nav.toggle("a"));
        assert!(nav.toggle("a"));
        assert!(!nav.toggle("home"));
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn unsubscribed_callbacks_stop_receiving() {
        let mut nav = Navigator::new(catalog());
        let count = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&count);
        let id = nav.subscribe(move |_| *sink.borrow_mut() += 1);
        nav.toggle("b");
        assert!(nav.unsubscribe(id));
        assert!(!nav.unsubscribe(id));
        nav.toggle("b");
        assert_eq!(*count.borrow(), 1);
    }
}
