use super::core::{Category, TrainingList};
use crate::error::Result;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Category used when the text carries no `Header:` lines at all
pub const DEFAULT_CATEGORY: &str = "General";

struct Group {
    header: Option<String>,
    items: Vec<String>,
}

/// Parse a user-authored list from free text.
///
/// Blank lines separate groups. A line ending in `:` names the group it
/// starts. Without any header, every subject lands in [`DEFAULT_CATEGORY`].
pub fn parse_list(id: &str, name: &str, text: &str) -> TrainingList {
    let groups = split_groups(text);
    let has_headers = groups.iter().any(|g| g.header.is_some());

    let mut seen: HashSet<String> = HashSet::new();
    let mut categories: Vec<Category> = Vec::new();

    for (idx, group) in groups.into_iter().enumerate() {
        let category_name = match (&group.header, has_headers) {
            (Some(header), _) => header.clone(),
            (None, true) => format!("Category {}", idx + 1),
            (None, false) => DEFAULT_CATEGORY.to_string(),
        };

        let items: Vec<String> = group
            .items
            .into_iter()
            .filter(|item| {
                let fresh = seen.insert(item.clone());
                if !fresh {
                    debug!(subject = %item, "dropping duplicate subject");
                }
                fresh
            })
            .collect();

        if items.is_empty() {
            continue;
        }

        match categories.iter_mut().find(|c| c.name == category_name) {
            Some(existing) => existing.items.extend(items),
            None => categories.push(Category::new(category_name, items)),
        }
    }

    TrainingList::new(id, name, categories)
}

/// Load a list file: `.json` files hold a serialized list, anything else is free text
pub fn load_list_file<P: AsRef<Path>>(path: P) -> Result<TrainingList> {
    let path = path.as_ref();
    if path.extension().and_then(|e| e.to_str()) == Some("json") {
        return TrainingList::from_json_file(path);
    }
    let id = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("custom")
        .to_string();
    let text = fs::read_to_string(path)?;
    let list = parse_list(&id, &id, &text);
    debug!(
        list = %id,
        categories = list.categories.len(),
        subjects = list.subject_count(),
        "parsed custom list"
    );
    Ok(list)
}

fn split_groups(text: &str) -> Vec<Group> {
    let mut groups = Vec::new();
    let mut current = Group {
        header: None,
        items: Vec::new(),
    };

    for raw in text.lines() {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            if current.header.is_some() || !current.items.is_empty() {
                groups.push(std::mem::replace(
                    &mut current,
                    Group {
                        header: None,
                        items: Vec::new(),
                    },
                ));
            }
            continue;
        }

        // A bare bullet is neither a subject nor a separator
        let line = strip_bullet(trimmed);
        if line.is_empty() {
            continue;
        }

        if let Some(header) = line.strip_suffix(':') {
            // A header in the middle of a group starts a new one
            if current.header.is_some() || !current.items.is_empty() {
                groups.push(std::mem::replace(
                    &mut current,
                    Group {
                        header: None,
                        items: Vec::new(),
                    },
                ));
            }
            let header = header.trim();
            if !header.is_empty() {
                current.header = Some(header.to_string());
            }
            continue;
        }

        current.items.push(line.to_string());
    }

    if current.header.is_some() || !current.items.is_empty() {
        groups.push(current);
    }
    groups
}

/// Drop one leading `-`, `*` or `•`, with or without a following space
fn strip_bullet(line: &str) -> &str {
    line.strip_prefix(['-', '*', '•']).map_or(line, str::trim_start)
}
