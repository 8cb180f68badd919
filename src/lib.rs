//! Search, filter and navigation-synchronization engine for link portals.
//!
//! A [`Catalog`] is built once from a loaded document. Queries run through
//! [`query::filter`], scroll samples through the [`VisibilityTracker`], and
//! both feed one [`Navigator`] that owns the active target and the sidebar
//! expansion state. [`Portal`] ties them together for a host UI.

pub mod catalog;
pub mod config;
pub mod expansion;
pub mod import;
pub mod navigation;
pub mod pacing;
pub mod portal;
pub mod query;
pub mod replay;
pub mod source;
pub mod visibility;

pub use catalog::{Catalog, CatalogError, Category, Entry, NavigationTarget, Section};
pub use expansion::ExpansionState;
pub use navigation::{ActivationOrigin, NavigationEvent, Navigator, ScrollRequest, SubscriptionId};
pub use portal::Portal;
pub use query::{FilterResult, filter};
pub use visibility::{SectionExtent, VisibilityTracker};
