//! Conversion of browser bookmark exports (the Netscape HTML format written
//! by Chrome and Edge) into catalog categories.
//!
//! Top-level folders become categories, their sub-folders become named
//! sections, and anything nested deeper is folded into the enclosing
//! folder. Icons are guessed from the link's domain without any network
//! access.

use regex::Regex;
use std::collections::HashSet;
use tracing::{debug, warn};
use url::Url;

use crate::catalog::{Category, Entry, Section};

pub const DEFAULT_SECTION_NAME: &str = "Bookmarks";

const WRAPPER_FOLDERS: &[&str] = &["favorites bar", "收藏夹栏"];

const DOMAIN_ICONS: &[(&str, &str)] = &[
    ("github", "github"),
    ("gitlab", "gitlab"),
    ("bitbucket", "bitbucket"),
    ("react", "react"),
    ("vuejs", "vuejs"),
    ("angular", "angular"),
    ("figma", "figma"),
    ("youtube", "youtube"),
    ("stackoverflow", "stack-overflow"),
    ("twitter", "twitter"),
    ("facebook", "facebook"),
    ("linkedin", "linkedin"),
];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookmarkImport {
    pub categories: Vec<Category>,
    pub orphaned: usize,
}

impl BookmarkImport {
    pub fn entry_count(&self) -> usize {
        self.categories.iter().map(Category::entry_count).sum()
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&self.categories)
    }
}

#[derive(Debug, Clone, Copy)]
enum Folder {
    Category(usize),
    Section { category: usize, section: usize },
}

struct Patterns {
    folder_start: Regex,
    folder_end: Regex,
    bookmark: Regex,
}

impl Patterns {
    fn new() -> Self {
        Self {
            folder_start: Regex::new(r"(?i)<DT><H3[^>]*>(.*?)</H3>").expect("valid pattern"),
            folder_end: Regex::new(r"(?i)</DL><p>").expect("valid pattern"),
            bookmark: Regex::new(r#"(?i)<DT><A HREF="(.*?)"[^>]*>(.*?)</A>"#).expect("valid pattern"),
        }
    }
}

pub fn parse_bookmarks(html: &str) -> BookmarkImport {
    parse_bookmarks_with_progress(html, |_, _| {})
}

/// Same as [`parse_bookmarks`], reporting `(lines_done, total_lines)` after
/// each line.
pub fn parse_bookmarks_with_progress(
    html: &str,
    mut progress: impl FnMut(usize, usize),
) -> BookmarkImport {
    let patterns = Patterns::new();
    let lines: Vec<&str> = html.lines().collect();
    let total = lines.len();

    let mut result = BookmarkImport::default();
    let mut ids = HashSet::new();
    let mut stack: Vec<Folder> = Vec::new();

    for (index, line) in lines.iter().enumerate() {
        progress(index + 1, total);

        if let Some(captures) = patterns.folder_start.captures(line) {
            let name = captures[1].trim();
            if stack.is_empty() && is_wrapper_folder(name) {
                debug!(folder = name, "skipping wrapper folder");
                continue;
            }
            let folder = open_folder(&mut result.categories, &mut ids, &stack, name);
            stack.push(folder);
        }

        if patterns.folder_end.is_match(line) {
            stack.pop();
        }

        if let Some(captures) = patterns.bookmark.captures(line) {
            let entry = bookmark_entry(&captures[1], captures[2].trim());
            match stack.last() {
                Some(&folder) => file_entry(&mut result.categories, folder, entry),
                None => {
                    warn!(url = %entry.url, "bookmark outside any folder dropped");
                    result.orphaned += 1;
                }
            }
        }
    }

    debug!(
        categories = result.categories.len(),
        entries = result.entry_count(),
        "bookmarks parsed"
    );
    result
}

fn is_wrapper_folder(name: &str) -> bool {
    let name = name.to_lowercase();
    WRAPPER_FOLDERS.contains(&name.as_str())
}

fn open_folder(
    categories: &mut Vec<Category>,
    ids: &mut HashSet<String>,
    stack: &[Folder],
    name: &str,
) -> Folder {
    match stack {
        [] => {
            categories.push(Category {
                id: unique_id(ids, name),
                name: name.to_string(),
                icon: "folder".to_string(),
                description: None,
                sections: Vec::new(),
            });
            Folder::Category(categories.len() - 1)
        }
        [Folder::Category(category)] => {
            let sections = &mut categories[*category].sections;
            sections.push(Section {
                name: Some(name.to_string()),
                entries: Vec::new(),
            });
            Folder::Section {
                category: *category,
                section: sections.len() - 1,
            }
        }
        [.., parent] => *parent,
    }
}

fn file_entry(categories: &mut [Category], folder: Folder, entry: Entry) {
    let (category, section) = match folder {
        Folder::Section { category, section } => (category, section),
        Folder::Category(category) => {
            let sections = &mut categories[category].sections;
            if sections.is_empty() {
                sections.push(Section {
                    name: Some(DEFAULT_SECTION_NAME.to_string()),
                    entries: Vec::new(),
                });
            }
            (category, 0)
        }
    };
    categories[category].sections[section].entries.push(entry);
}

/// Lower-case, spaces to dashes, numbered on collision so the output always
/// builds into a catalog.
fn unique_id(ids: &mut HashSet<String>, name: &str) -> String {
    let mut base = name.to_lowercase().replace(' ', "-");
    if base.is_empty() {
        base = "folder".to_string();
    }

    let mut id = base.clone();
    let mut counter = 2;
    while ids.contains(&id) {
        id = format!("{}-{}", base, counter);
        counter += 1;
    }
    ids.insert(id.clone());
    id
}

fn bookmark_entry(url: &str, name: &str) -> Entry {
    let domain = domain_of(url);
    Entry {
        name: name.to_string(),
        url: url.to_string(),
        description: format!(
            "{} - {}",
            name,
            domain.as_deref().unwrap_or("unknown domain")
        ),
        icon: guess_icon(domain.as_deref()).to_string(),
    }
}

pub fn domain_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_string))
        .filter(|host| !host.is_empty())
}

/// Well-known icon-font glyph for a domain, `link` otherwise.
pub fn guess_icon(domain: Option<&str>) -> &'static str {
    let Some(domain) = domain else {
        return "link";
    };
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return "link";
    }
    let name = labels[labels.len() - 2].to_lowercase();
    DOMAIN_ICONS
        .iter()
        .find(|(label, _)| *label == name)
        .map(|(_, icon)| *icon)
        .unwrap_or("link")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use pretty_assertions::assert_eq;

    const CHROME: &str = r#"<!DOCTYPE NETSCAPE-Bookmark-file-1>
<TITLE>Bookmarks</TITLE>
<H1>Bookmarks</H1>
<DL><p>
    <DT><H3 ADD_DATE="1" PERSONAL_TOOLBAR_FOLDER="true">Dev Tools</H3>
    <DL><p>
        <DT><A HREF="https://github.com/rust-lang" ADD_DATE="1">Rust on GitHub</A>
        <DT><H3 ADD_DATE="1">Docs</H3>
        <DL><p>
            <DT><A HREF="https://doc.rust-lang.org/std/" ADD_DATE="1">std</A>
            <DT><H3 ADD_DATE="1">Deep</H3>
            <DL><p>
                <DT><A HREF="https://stackoverflow.com/q/1" ADD_DATE="1">Question</A>
            </DL><p>
        </DL><p>
    </DL><p>
    <DT><H3 ADD_DATE="1">Dev Tools</H3>
    <DL><p>
        <DT><A HREF="https://www.youtube.com/" ADD_DATE="1">Videos</A>
    </DL><p>
</DL><p>
"#;

    #[test]
    fn folders_map_to_categories_and_sections() {
        let import = parse_bookmarks(CHROME);
        let ids: Vec<_> = import.categories.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["dev-tools", "dev-tools-2"]);

        let dev = &import.categories[0];
        let sections: Vec<_> = dev.sections.iter().map(|s| s.title()).collect();
        // the loose bookmark arrived before any sub-folder existed
        assert_eq!(sections, vec![Some(DEFAULT_SECTION_NAME), Some("Docs")]);

        let docs: Vec<_> = dev.sections[1].entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(docs, vec!["std", "Question"]);
        assert_eq!(import.orphaned, 0);
    }

    #[test]
    fn entries_get_description_and_icon() {
        let import = parse_bookmarks(CHROME);
        let entry = &import.categories[0].sections[0].entries[0];
        assert_eq!(entry.url, "https://github.com/rust-lang");
        assert_eq!(entry.description, "Rust on GitHub - github.com");
        assert_eq!(entry.icon, "github");

        let question = &import.categories[0].sections[1].entries[1];
        assert_eq!(question.icon, "stack-overflow");
        assert_eq!(import.categories[1].sections[0].entries[0].icon, "youtube");
    }

    #[test]
    fn edge_wrapper_folder_is_skipped() {
        let edge = r#"<DL><p>
<DT><H3 ADD_DATE="1">Favorites bar</H3>
<DL><p>
<DT><H3 ADD_DATE="1">News</H3>
<DL><p>
<DT><A HREF="https://news.ycombinator.com/">HN</A>
</DL><p>
</DL><p>
</DL><p>"#;
        let import = parse_bookmarks(edge);
        assert_eq!(import.categories.len(), 1);
        assert_eq!(import.categories[0].id, "news");
        assert_eq!(import.categories[0].sections[0].entries[0].name, "HN");
    }

    #[test]
    fn loose_bookmarks_are_counted() {
        let import = parse_bookmarks(r#"<DT><A HREF="https://example.com/">Loose</A>"#);
        assert!(import.categories.is_empty());
        assert_eq!(import.orphaned, 1);
    }

    #[test]
    fn output_builds_into_a_catalog() {
        let import = parse_bookmarks(CHROME);
        let yaml = import.to_yaml().unwrap();
        let raw: serde_json::Value = serde_yaml::from_str(&yaml).unwrap();
        let catalog = Catalog::build(raw).unwrap();
        assert_eq!(catalog.entry_count(), import.entry_count());
        assert!(catalog.category("dev-tools").unwrap().has_subgroups());
    }

    #[test]
    fn icon_guessing() {
        assert_eq!(guess_icon(Some("gitlab.com")), "gitlab");
        assert_eq!(guess_icon(Some("www.linkedin.com")), "linkedin");
        assert_eq!(guess_icon(Some("localhost")), "link");
        assert_eq!(guess_icon(None), "link");
        assert_eq!(domain_of("not a url"), None);
        assert_eq!(domain_of("https://figma.com/file/1").as_deref(), Some("figma.com"));
    }

    #[test]
    fn reports_progress_per_line() {
        let mut seen = Vec::new();
        parse_bookmarks_with_progress("<DL><p>\n</DL><p>\n", |done, total| seen.push((done, total)));
        assert_eq!(seen, vec![(1, 2), (2, 2)]);
    }
}
