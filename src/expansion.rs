use std::collections::BTreeSet;

use crate::catalog::Catalog;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionState {
    expandable: BTreeSet<String>,
    expanded: BTreeSet<String>,
}

impl ExpansionState {
    /// Initial state: only the first category with subgroups is open.
    pub fn new(catalog: &Catalog) -> Self {
        let expandable: BTreeSet<String> = catalog
            .categories()
            .iter()
            .filter(|c| c.has_subgroups())
            .map(|c| c.id.clone())
            .collect();
        let expanded = catalog
            .first_expandable()
            .map(|c| c.id.clone())
            .into_iter()
            .collect();

        Self {
            expandable,
            expanded,
        }
    }

    pub fn is_expandable(&self, category_id: &str) -> bool {
        self.expandable.contains(category_id)
    }

    pub fn is_expanded(&self, category_id: &str) -> bool {
        self.expanded.contains(category_id)
    }

    /// Flips a group and returns its new state. Flat or unknown categories
    /// stay closed.
    pub fn toggle(&mut self, category_id: &str) -> bool {
        if !self.is_expandable(category_id) {
            return false;
        }
        if self.expanded.remove(category_id) {
            false
        } else {
            self.expanded.insert(category_id.to_string());
            true
        }
    }

    pub fn force_expand(&mut self, category_id: &str) -> bool {
        self.is_expandable(category_id) && self.expanded.insert(category_id.to_string())
    }

    pub fn force_collapse(&mut self, category_id: &str) -> bool {
        self.expanded.remove(category_id)
    }

    pub fn expanded(&self) -> impl Iterator<Item = &str> {
        self.expanded.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn catalog() -> Catalog {
        Catalog::build(json!([
            { "id": "flat", "name": "Flat", "sections": [ { "websites": [] } ] },
            { "id": "a", "name": "A", "sections": [ { "name": "A1", "websites": [] } ] },
            { "id": "b", "name": "B", "sections": [ { "name": "B1", "websites": [] } ] }
        ]))
        .unwrap()
    }

    #[test]
    fn first_expandable_category_starts_open() {
        let state = ExpansionState::new(&catalog());
        assert!(!state.is_expanded("flat"));
        assert!(state.is_expanded("a"));
        assert!(!state.is_expanded("b"));
        assert_eq!(state.expanded().collect::<Vec<_>>(), vec!["a"]);
    }

    #[test]
    fn toggle_flips_independently() {
        let mut state = ExpansionState::new(&catalog());
        assert!(state.toggle("b"));
        assert!(state.is_expanded("a"));
        assert!(!state.toggle("a"));
        assert!(!state.is_expanded("a"));
        assert!(state.toggle("a"));
    }

    #[test]
    fn flat_and_unknown_categories_never_open() {
        let mut state = ExpansionState::new(&catalog());
        assert!(!state.toggle("flat"));
        assert!(!state.toggle("missing"));
        assert!(!state.force_expand("flat"));
        assert!(!state.is_expanded("flat"));
    }

    #[test]
    fn forced_setters_are_idempotent() {
        let mut state = ExpansionState::new(&catalog());
        assert!(state.force_expand("b"));
        assert!(!state.force_expand("b"));
        assert!(state.force_collapse("b"));
        assert!(!state.force_collapse("b"));
    }
}
