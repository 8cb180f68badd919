use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use linkdeck::config::Config;
use linkdeck::import::parse_bookmarks_with_progress;
use linkdeck::navigation::{ActivationOrigin, NavigationEvent, ScrollRequest};
use linkdeck::replay::{Step, StepRecord, replay as run_replay};
use linkdeck::source::{load_catalog, load_document};
use linkdeck::{Catalog, Entry, NavigationTarget, Portal, filter};

async fn open_catalog(path: &Path) -> Result<Catalog> {
    load_catalog(path)
        .await
        .with_context(|| format!("Failed to load catalog {}", path.display()))
}

async fn emit(buffer: &[u8]) -> Result<()> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(buffer).await?;
    stdout.flush().await?;
    Ok(())
}

pub async fn check(path: &Path) -> Result<()> {
    let catalog = open_catalog(path).await?;
    let mut buffer = Vec::with_capacity(4 * 1024);

    writeln!(
        buffer,
        "{}: {} categories, {} sections, {} entries",
        path.display(),
        catalog.len(),
        catalog.section_count(),
        catalog.entry_count()
    )?;
    for category in catalog.categories() {
        let kind = if category.has_subgroups() { "grouped" } else { "flat" };
        writeln!(
            buffer,
            "  {} ({}, {} sections, {} entries)",
            category.id,
            kind,
            category.sections.len(),
            category.entry_count()
        )?;
    }

    emit(&buffer).await
}

#[derive(Serialize)]
struct SearchReport<'a> {
    query: &'a str,
    has_any_match: bool,
    matches: usize,
    categories: Vec<CategoryReport<'a>>,
}

#[derive(Serialize)]
struct CategoryReport<'a> {
    id: &'a str,
    name: &'a str,
    sections: Vec<SectionReport<'a>>,
}

#[derive(Serialize)]
struct SectionReport<'a> {
    anchor: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    entries: Vec<&'a Entry>,
}

pub async fn search(path: &Path, query: &str, json: bool) -> Result<()> {
    let catalog = open_catalog(path).await?;
    let view = filter(&catalog, query);

    let categories: Vec<CategoryReport> = view
        .categories()
        .iter()
        .map(|category_match| {
            let category = &catalog.categories()[category_match.position];
            CategoryReport {
                id: &category.id,
                name: &category.name,
                sections: category_match
                    .sections
                    .iter()
                    .map(|section_match| {
                        let section = &category.sections[section_match.index];
                        SectionReport {
                            anchor: NavigationTarget::section(category.id.clone(), section_match.index)
                                .anchor(),
                            name: section.title(),
                            entries: section_match
                                .entries
                                .iter()
                                .map(|&entry| &section.entries[entry])
                                .collect(),
                        }
                    })
                    .collect(),
            }
        })
        .collect();

    let report = SearchReport {
        query: view.query(),
        has_any_match: view.has_any_match(),
        matches: view.match_count(),
        categories,
    };

    let mut buffer = Vec::with_capacity(16 * 1024);
    if json {
        serde_json::to_writer_pretty(&mut buffer, &report)?;
        writeln!(buffer)?;
        return emit(&buffer).await;
    }

    if !report.has_any_match {
        writeln!(buffer, "No results for: {}", report.query)?;
        return emit(&buffer).await;
    }

    if !view.is_unfiltered() {
        writeln!(buffer, "{} matches for \"{}\"", report.matches, report.query)?;
        writeln!(buffer)?;
    }
    for category in &report.categories {
        writeln!(buffer, "{} [{}]", category.name, category.id)?;
        for section in &category.sections {
            let indent = match section.name {
                Some(name) => {
                    writeln!(buffer, "  {} [{}]", name, section.anchor)?;
                    "    "
                }
                None => "  ",
            };
            for entry in &section.entries {
                writeln!(buffer, "{}{}  {}", indent, entry.name, entry.url)?;
                if !entry.description.is_empty() {
                    writeln!(buffer, "{}  {}", indent, entry.description)?;
                }
            }
        }
    }

    emit(&buffer).await
}

pub async fn outline(
    path: &Path,
    config: &Config,
    query: Option<&str>,
    active: Option<&str>,
) -> Result<()> {
    let catalog = open_catalog(path).await?;
    let mut portal = Portal::new(catalog).with_header_offset(config.scroll.header_offset);
    portal.start();

    if let Some(query) = query {
        portal.search(query);
    }
    if let Some(anchor) = active {
        if !portal.click_anchor(anchor) {
            eprintln!("Ignoring --active {}: not a visible target", anchor);
        }
    }

    let mut buffer = Vec::with_capacity(4 * 1024);
    if !portal.view().has_any_match() {
        writeln!(buffer, "No results for: {}", portal.view().query())?;
    }

    let active = portal.active().cloned();
    let marker = |target: &NavigationTarget| {
        if active.as_ref() == Some(target) { "*" } else { " " }
    };

    for category_match in portal.view().categories() {
        let category = &portal.catalog().categories()[category_match.position];
        if !category.has_subgroups() {
            let target = category.target();
            writeln!(buffer, "{}    {} [{}]", marker(&target), category.name, target)?;
            continue;
        }

        let expanded = portal.expansion().is_expanded(&category.id);
        let fold = if expanded { "[-]" } else { "[+]" };
        writeln!(buffer, "  {} {} [{}]", fold, category.name, category.id)?;
        if !expanded {
            continue;
        }
        for section_match in &category_match.sections {
            let section = &category.sections[section_match.index];
            let Some(title) = section.title() else {
                continue;
            };
            let target = category.section_target(section_match.index);
            writeln!(buffer, "{}       {} [{}]", marker(&target), title, target)?;
        }
    }

    emit(&buffer).await
}

pub async fn replay(path: &Path, config: &Config, script: &Path, json: bool) -> Result<()> {
    let catalog = open_catalog(path).await?;
    let steps: Vec<Step> = load_document(script)
        .await
        .with_context(|| format!("Failed to load script {}", script.display()))?;

    let mut portal = Portal::new(catalog).with_header_offset(config.scroll.header_offset);
    let records = run_replay(&mut portal, &steps, config.pacing());

    let mut buffer = Vec::with_capacity(16 * 1024);
    if json {
        serde_json::to_writer_pretty(&mut buffer, &records)?;
        writeln!(buffer)?;
    } else {
        for record in &records {
            write_record(&mut buffer, record)?;
        }
    }

    emit(&buffer).await
}

fn write_record(buffer: &mut Vec<u8>, record: &StepRecord) -> Result<()> {
    let active = record
        .active
        .as_ref()
        .map(NavigationTarget::anchor)
        .unwrap_or_else(|| "-".to_string());
    let held = if record.held { " (held)" } else { "" };
    writeln!(
        buffer,
        "#{} {}{} => active {}",
        record.step, record.action, held, active
    )?;

    for event in &record.events {
        match event {
            NavigationEvent::ExpansionChanged { category, expanded } => {
                let verb = if *expanded { "expand" } else { "collapse" };
                writeln!(buffer, "    {} {}", verb, category)?;
            }
            NavigationEvent::ActiveChanged {
                previous,
                current,
                origin,
                scroll_to,
            } => {
                let previous = previous
                    .as_ref()
                    .map(NavigationTarget::anchor)
                    .unwrap_or_else(|| "-".to_string());
                let origin = match origin {
                    ActivationOrigin::UserClick => "click",
                    ActivationOrigin::Tracker => "tracker",
                };
                write!(buffer, "    active {} -> {} ({})", previous, current, origin)?;
                if let Some(request) = scroll_to {
                    write!(buffer, " {}", describe_scroll(request))?;
                }
                writeln!(buffer)?;
            }
        }
    }

    if let Some(request) = &record.scroll_to {
        writeln!(buffer, "    {}", describe_scroll(request))?;
    }
    Ok(())
}

fn describe_scroll(request: &ScrollRequest) -> String {
    match request {
        ScrollRequest::Top => "scroll to top".to_string(),
        ScrollRequest::Anchor { target, offset } => {
            format!("scroll to #{} (offset {})", target, offset)
        }
    }
}

pub async fn import(input: &Path, output: &Path) -> Result<()> {
    let html = fs::read_to_string(input)
        .await
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let pb = ProgressBar::new(html.lines().count() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            )
            .expect("valid template")
            .progress_chars("#>-"),
    );

    let result = parse_bookmarks_with_progress(&html, |done, _| pb.set_position(done as u64));
    pb.finish_and_clear();

    if result.categories.is_empty() {
        eprintln!("No bookmark folders found in {}", input.display());
        std::process::exit(1);
    }

    let yaml = result.to_yaml()?;
    fs::write(output, yaml)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;

    if result.orphaned > 0 {
        eprintln!("Skipped {} bookmarks outside any folder", result.orphaned);
    }

    let mut buffer = Vec::with_capacity(1024);
    writeln!(
        buffer,
        "Imported {} bookmarks in {} categories -> {}",
        result.entry_count(),
        result.categories.len(),
        output.display()
    )?;
    for category in &result.categories {
        writeln!(
            buffer,
            "  {} ({} sections, {} entries)",
            category.id,
            category.sections.len(),
            category.entry_count()
        )?;
    }

    emit(&buffer).await
}
