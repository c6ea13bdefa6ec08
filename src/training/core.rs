use crate::error::{DrillError, Result};
use include_dir::{include_dir, Dir};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

static LISTS_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/lists");

/// A named group of subjects within a training list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub items: Vec<String>,
}

impl Category {
    pub fn new(name: impl Into<String>, items: Vec<String>) -> Self {
        Self {
            name: name.into(),
            items,
        }
    }
}

/// A named collection of categories, each holding an ordered list of subjects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingList {
    pub id: String,
    pub name: String,
    pub categories: Vec<Category>,
}

impl TrainingList {
    pub fn new(id: impl Into<String>, name: impl Into<String>, categories: Vec<Category>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            categories,
        }
    }

    /// Load one of the lists bundled into the binary
    pub fn builtin(id: &str) -> Result<Self> {
        let file = LISTS_DIR
            .get_file(format!("{id}.json"))
            .ok_or_else(|| DrillError::UnknownList(id.to_string()))?;
        let contents = file
            .contents_utf8()
            .ok_or_else(|| DrillError::UnknownList(id.to_string()))?;
        Ok(serde_json::from_str(contents)?)
    }

    /// Ids of the bundled lists, sorted
    pub fn builtin_ids() -> Vec<String> {
        let mut ids: Vec<String> = LISTS_DIR
            .files()
            .filter_map(|f| {
                let path = f.path();
                match path.extension().and_then(|e| e.to_str()) {
                    Some("json") => path.file_stem()?.to_str().map(str::to_string),
                    _ => None,
                }
            })
            .collect();
        ids.sort();
        ids
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Ensure the list can be used for selection
    pub fn validate(&self) -> Result<()> {
        if self.categories.is_empty() {
            return Err(DrillError::EmptyList(self.id.clone()));
        }
        if let Some(empty) = self.categories.iter().find(|c| c.items.is_empty()) {
            return Err(DrillError::EmptyCategory {
                list: self.id.clone(),
                category: empty.name.clone(),
            });
        }
        Ok(())
    }

    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    pub fn contains(&self, item: &str, category: &str) -> bool {
        self.category(category)
            .is_some_and(|c| c.items.iter().any(|i| i == item))
    }

    /// `(category, subject)` pairs in category-then-list order
    pub fn subjects(&self) -> impl Iterator<Item = (&str, &str)> {
        self.categories
            .iter()
            .flat_map(|c| c.items.iter().map(move |i| (c.name.as_str(), i.as_str())))
    }

    pub fn subject_count(&self) -> usize {
        self.categories.iter().map(|c| c.items.len()).sum()
    }
}
