use serde::Serialize;
use tracing::debug;

use crate::catalog::{Catalog, Category, Entry, NavigationTarget, Section};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionMatch {
    pub index: usize,
    pub entries: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryMatch {
    pub position: usize,
    pub id: String,
    pub sections: Vec<SectionMatch>,
}

impl CategoryMatch {
    fn section(&self, index: usize) -> Option<&SectionMatch> {
        self.sections.iter().find(|s| s.index == index)
    }
}

/// The part of a catalog that survives a query. Positions always refer to
/// the unfiltered catalog, so anchors stay valid while searching.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterResult {
    query: String,
    has_any_match: bool,
    categories: Vec<CategoryMatch>,
}

impl FilterResult {
    pub fn unfiltered(catalog: &Catalog) -> Self {
        let categories = catalog
            .categories()
            .iter()
            .enumerate()
            .map(|(position, category)| CategoryMatch {
                position,
                id: category.id.clone(),
                sections: category
                    .sections
                    .iter()
                    .enumerate()
                    .map(|(index, section)| SectionMatch {
                        index,
                        entries: (0..section.entries.len()).collect(),
                    })
                    .collect(),
            })
            .collect();

        Self {
            query: String::new(),
            has_any_match: true,
            categories,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn is_unfiltered(&self) -> bool {
        self.query.is_empty()
    }

    pub fn has_any_match(&self) -> bool {
        self.has_any_match
    }

    pub fn categories(&self) -> &[CategoryMatch] {
        &self.categories
    }

    pub fn match_count(&self) -> usize {
        self.categories
            .iter()
            .flat_map(|c| &c.sections)
            .map(|s| s.entries.len())
            .sum()
    }

    pub fn contains_category(&self, id: &str) -> bool {
        self.categories.iter().any(|c| c.id == id)
    }

    pub fn contains_section(&self, category_id: &str, index: usize) -> bool {
        self.categories
            .iter()
            .find(|c| c.id == category_id)
            .is_some_and(|c| c.section(index).is_some())
    }

    pub fn contains(&self, target: &NavigationTarget) -> bool {
        match target {
            NavigationTarget::Category(id) => self.contains_category(id),
            NavigationTarget::Section { category, index } => self.contains_section(category, *index),
        }
    }

    /// Sidebar targets of every visible section, in document order, without
    /// repeats (flat categories contribute their single link once).
    pub fn visible_targets(&self, catalog: &Catalog) -> Vec<NavigationTarget> {
        let mut targets: Vec<NavigationTarget> = Vec::new();
        for (category, section_match) in self.sections(catalog) {
            let target = category.section_target(section_match.index);
            if targets.last() != Some(&target) {
                targets.push(target);
            }
        }
        targets
    }

    pub fn first_match(&self, catalog: &Catalog) -> Option<NavigationTarget> {
        self.sections(catalog)
            .next()
            .map(|(category, section_match)| category.section_target(section_match.index))
    }

    fn sections<'a>(
        &'a self,
        catalog: &'a Catalog,
    ) -> impl Iterator<Item = (&'a Category, &'a SectionMatch)> + 'a {
        self.categories
            .iter()
            .filter_map(move |category_match| {
                catalog
                    .categories()
                    .get(category_match.position)
                    .filter(|category| category.id == category_match.id)
                    .map(|category| (category, category_match))
            })
            .flat_map(|(category, category_match)| {
                category_match
                    .sections
                    .iter()
                    .filter(move |s| s.index < category.sections.len())
                    .map(move |s| (category, s))
            })
    }

    pub fn entries<'a>(
        &'a self,
        catalog: &'a Catalog,
    ) -> impl Iterator<Item = (&'a Category, usize, &'a Section, &'a Entry)> + 'a {
        self.sections(catalog).flat_map(|(category, section_match)| {
            let section = &category.sections[section_match.index];
            section_match.entries.iter().filter_map(move |&entry| {
                let entry = section.entries.get(entry)?;
                Some((category, section_match.index, section, entry))
            })
        })
    }
}

pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Literal containment against name and description; urls and icons are
/// never searched.
pub fn entry_matches(entry: &Entry, needle: &str) -> bool {
    entry.name.to_lowercase().contains(needle) || entry.description.to_lowercase().contains(needle)
}

pub fn filter(catalog: &Catalog, query: &str) -> FilterResult {
    let needle = normalize_query(query);
    if needle.is_empty() {
        return FilterResult::unfiltered(catalog);
    }

    let categories: Vec<CategoryMatch> = catalog
        .categories()
        .iter()
        .enumerate()
        .filter_map(|(position, category)| {
            let sections: Vec<SectionMatch> = category
                .sections
                .iter()
                .enumerate()
                .filter_map(|(index, section)| {
                    let entries: Vec<usize> = section
                        .entries
                        .iter()
                        .enumerate()
                        .filter(|(_, entry)| entry_matches(entry, &needle))
                        .map(|(i, _)| i)
                        .collect();
                    (!entries.is_empty()).then_some(SectionMatch { index, entries })
                })
                .collect();

            (!sections.is_empty()).then(|| CategoryMatch {
                position,
                id: category.id.clone(),
                sections,
            })
        })
        .collect();

    let has_any_match = !categories.is_empty();
    debug!(query = %needle, categories = categories.len(), has_any_match, "filter applied");

    FilterResult {
        query: needle,
        has_any_match,
        categories,
    }
}
