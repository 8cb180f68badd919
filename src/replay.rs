use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::catalog::NavigationTarget;
use crate::navigation::{NavigationEvent, ScrollRequest};
use crate::pacing::{Debounce, Pacing, Throttle};
use crate::portal::Portal;
use crate::visibility::{RawExtent, SectionExtent};

/// One stimulus in a scripted session. Searches and scrolls stamped with
/// `at_ms` go through the search debounce and scroll throttle; unstamped
/// ones apply immediately.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    Start,
    Search {
        query: String,
        #[serde(default)]
        at_ms: Option<u64>,
    },
    /// Replaces the section extents used by later scroll steps.
    Layout {
        extents: Vec<RawExtent>,
    },
    Scroll {
        offset: f64,
        viewport: f64,
        #[serde(default)]
        at_ms: Option<u64>,
    },
    Click {
        target: String,
    },
    Toggle {
        category: String,
    },
}

impl Step {
    fn label(&self) -> String {
        match self {
            Step::Start => "start".to_string(),
            Step::Search { query, .. } => format!("search {:?}", query),
            Step::Layout { extents } => format!("layout ({} sections)", extents.len()),
            Step::Scroll {
                offset, viewport, ..
            } => format!("scroll {} (+{})", offset, viewport),
            Step::Click { target } => format!("click {}", target),
            Step::Toggle { category } => format!("toggle {}", category),
        }
    }

    fn at_ms(&self) -> Option<u64> {
        match self {
            Step::Search { at_ms, .. } | Step::Scroll { at_ms, .. } => *at_ms,
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub step: usize,
    pub action: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub held: bool,
    pub events: Vec<NavigationEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scroll_to: Option<ScrollRequest>,
    pub active: Option<NavigationTarget>,
}

struct Pacers {
    origin: Instant,
    now: Instant,
    search: Debounce<String>,
    scroll: Throttle<(f64, f64)>,
}

impl Pacers {
    fn new(pacing: Pacing) -> Self {
        let origin = Instant::now();
        Self {
            origin,
            now: origin,
            search: Debounce::new(pacing.search_debounce),
            scroll: Throttle::new(pacing.scroll_throttle),
        }
    }

    fn advance(&mut self, at_ms: u64) {
        let at = self.origin + Duration::from_millis(at_ms);
        if at > self.now {
            self.now = at;
        }
    }

    fn release(&mut self, portal: &mut Portal, layout: &[SectionExtent]) -> Option<ScrollRequest> {
        let scroll_to = self.search.poll(self.now).and_then(|query| {
            debug!(query = %query, "debounced search released");
            portal.search(&query)
        });
        if let Some((offset, viewport)) = self.scroll.poll(self.now) {
            portal.on_scroll(offset, viewport, layout);
        }
        scroll_to
    }

    fn flush(&mut self, portal: &mut Portal, layout: &[SectionExtent]) -> Option<Option<ScrollRequest>> {
        let query = self.search.flush();
        let scroll = self.scroll.flush();
        if query.is_none() && scroll.is_none() {
            return None;
        }
        let scroll_to = query.and_then(|query| portal.search(&query));
        if let Some((offset, viewport)) = scroll {
            portal.on_scroll(offset, viewport, layout);
        }
        Some(scroll_to)
    }
}

pub fn replay(portal: &mut Portal, steps: &[Step], pacing: Pacing) -> Vec<StepRecord> {
    let log: Rc<RefCell<Vec<NavigationEvent>>> = Rc::default();
    let sink = Rc::clone(&log);
    let subscription = portal.subscribe(move |event| sink.borrow_mut().push(event.clone()));

    let mut pacers = Pacers::new(pacing);
    let mut layout: Vec<SectionExtent> = Vec::new();
    let mut records = Vec::with_capacity(steps.len() + 1);

    for (index, step) in steps.iter().enumerate() {
        if let Some(at_ms) = step.at_ms() {
            pacers.advance(at_ms);
        }
        let mut scroll_to = pacers.release(portal, &layout);
        let mut held = false;

        match step {
            Step::Start => {
                portal.start();
            }
            Step::Search { query, at_ms } => match at_ms {
                Some(_) => {
                    pacers.search.push(query.clone(), pacers.now);
                    held = true;
                }
                None => scroll_to = portal.search(query).or(scroll_to),
            },
            Step::Layout { extents } => {
                layout = extents
                    .iter()
                    .filter_map(|raw| {
                        let resolved = raw.resolve(portal.catalog());
                        if resolved.is_none() {
                            warn!(anchor = %raw.id, "layout names an unknown section");
                        }
                        resolved
                    })
                    .collect();
            }
            Step::Scroll {
                offset,
                viewport,
                at_ms,
            } => {
                let sample = match at_ms {
                    Some(_) => pacers.scroll.offer((*offset, *viewport), pacers.now),
                    None => Some((*offset, *viewport)),
                };
                match sample {
                    Some((offset, viewport)) => {
                        portal.on_scroll(offset, viewport, &layout);
                    }
                    None => held = true,
                }
            }
            Step::Click { target } => {
                portal.click_anchor(target);
            }
            Step::Toggle { category } => {
                portal.toggle(category);
            }
        }

        records.push(StepRecord {
            step: index + 1,
            action: step.label(),
            held,
            events: log.borrow_mut().drain(..).collect(),
            scroll_to,
            active: portal.active().cloned(),
        });
    }

    if let Some(scroll_to) = pacers.flush(portal, &layout) {
        records.push(StepRecord {
            step: steps.len() + 1,
            action: "flush".to_string(),
            held: false,
            events: log.borrow_mut().drain(..).collect(),
            scroll_to,
            active: portal.active().cloned(),
        });
    }

    portal.unsubscribe(subscription);
    records
}
