use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("catalog must be a sequence of categories, found {0}")]
    NotASequence(&'static str),

    #[error("category #{index} is malformed: {source}")]
    MalformedCategory {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("category #{index} has an empty id")]
    EmptyId { index: usize },

    #[error("duplicate category id '{id}' (categories #{first} and #{second})")]
    DuplicateId {
        id: String,
        first: usize,
        second: usize,
    },
}

fn default_entry_icon() -> String {
    "link".to_string()
}

fn default_category_icon() -> String {
    "folder".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_entry_icon")]
    pub icon: String,
}

impl Entry {
    /// Icons are either a remote image or the name of an icon-font glyph.
    pub fn icon_is_url(&self) -> bool {
        self.icon.starts_with("http") || self.icon.starts_with("//")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, rename = "websites")]
    pub entries: Vec<Entry>,
}

impl Section {
    pub fn title(&self) -> Option<&str> {
        self.name.as_deref().filter(|name| !name.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default = "default_category_icon")]
    pub icon: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub sections: Vec<Section>,
}

impl Category {
    pub fn has_subgroups(&self) -> bool {
        self.sections.iter().any(|section| section.title().is_some())
    }

    pub fn entry_count(&self) -> usize {
        self.sections.iter().map(|section| section.entries.len()).sum()
    }

    pub fn target(&self) -> NavigationTarget {
        NavigationTarget::Category(self.id.clone())
    }

    /// Sidebar target for the section at `index`. Flat categories only have
    /// the category link, so their sections collapse onto it.
    pub fn section_target(&self, index: usize) -> NavigationTarget {
        if self.has_subgroups() {
            NavigationTarget::section(&self.id, index)
        } else {
            self.target()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NavigationTarget {
    Category(String),
    Section { category: String, index: usize },
}

impl NavigationTarget {
    pub fn category(id: impl Into<String>) -> Self {
        NavigationTarget::Category(id.into())
    }

    pub fn section(category: impl Into<String>, index: usize) -> Self {
        NavigationTarget::Section {
            category: category.into(),
            index,
        }
    }

    pub fn category_id(&self) -> &str {
        match self {
            NavigationTarget::Category(id) => id,
            NavigationTarget::Section { category, .. } => category,
        }
    }

    pub fn section_index(&self) -> Option<usize> {
        match self {
            NavigationTarget::Category(_) => None,
            NavigationTarget::Section { index, .. } => Some(*index),
        }
    }

    pub fn anchor(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for NavigationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavigationTarget::Category(id) => write!(f, "{}", id),
            NavigationTarget::Section { category, index } => write!(f, "{}-{}", category, index),
        }
    }
}

impl Serialize for NavigationTarget {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    categories: Vec<Category>,
    by_id: HashMap<String, usize>,
}

impl Catalog {
    pub fn build(raw: Value) -> Result<Self, CatalogError> {
        let items = match raw {
            Value::Array(items) => items,
            other => return Err(CatalogError::NotASequence(value_kind(&other))),
        };

        let categories = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                serde_json::from_value::<Category>(item)
                    .map_err(|source| CatalogError::MalformedCategory { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::from_categories(categories)
    }

    pub fn from_categories(categories: Vec<Category>) -> Result<Self, CatalogError> {
        let mut by_id = HashMap::with_capacity(categories.len());

        for (index, category) in categories.iter().enumerate() {
            if category.id.trim().is_empty() {
                return Err(CatalogError::EmptyId { index });
            }
            if let Some(&first) = by_id.get(&category.id) {
                return Err(CatalogError::DuplicateId {
                    id: category.id.clone(),
                    first,
                    second: index,
                });
            }
            by_id.insert(category.id.clone(), index);
            warn_duplicate_entries(category);
        }

        let catalog = Self { categories, by_id };
        debug!(
            categories = catalog.len(),
            sections = catalog.section_count(),
            entries = catalog.entry_count(),
            "catalog built"
        );
        Ok(catalog)
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn section_count(&self) -> usize {
        self.categories.iter().map(|c| c.sections.len()).sum()
    }

    pub fn entry_count(&self) -> usize {
        self.categories.iter().map(Category::entry_count).sum()
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.position(id).map(|index| &self.categories[index])
    }

    pub fn section(&self, category_id: &str, index: usize) -> Option<&Section> {
        self.category(category_id)?.sections.get(index)
    }

    pub fn first_category(&self) -> Option<&Category> {
        self.categories.first()
    }

    pub fn first_expandable(&self) -> Option<&Category> {
        self.categories.iter().find(|c| c.has_subgroups())
    }

    /// Maps `target` onto the link the sidebar actually shows for it, or
    /// `None` when it names something outside the catalog.
    pub fn canonical(&self, target: &NavigationTarget) -> Option<NavigationTarget> {
        let category = self.category(target.category_id())?;
        match target.section_index() {
            None => Some(category.target()),
            Some(index) if index < category.sections.len() => Some(category.section_target(index)),
            Some(_) => None,
        }
    }

    /// Resolves an anchor string (`"tools"` or `"tools-2"`). Category ids may
    /// contain dashes themselves, so an exact id match wins.
    pub fn parse_anchor(&self, anchor: &str) -> Option<NavigationTarget> {
        let anchor = anchor.trim().trim_start_matches('#');
        if self.category(anchor).is_some() {
            return Some(NavigationTarget::category(anchor));
        }

        let (id, index) = anchor.rsplit_once('-')?;
        let index: usize = index.parse().ok()?;
        self.section(id, index)?;
        Some(NavigationTarget::section(id, index))
    }
}

fn warn_duplicate_entries(category: &Category) {
    for (index, section) in category.sections.iter().enumerate() {
        let mut seen = HashSet::new();
        for entry in &section.entries {
            if !seen.insert(entry.name.as_str()) {
                warn!(
                    category = %category.id,
                    section = index,
                    entry = %entry.name,
                    "duplicate entry name in section"
                );
            }
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "nothing",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}
